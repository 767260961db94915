/// Distance kept between the menu and the container edges.
pub const MENU_MARGIN: f64 = 8.0;

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Point {
	pub x: f64,
	pub y: f64,
}

impl Point {
	pub fn new(x: f64, y: f64) -> Self {
		Self { x, y }
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Size {
	pub width: f64,
	pub height: f64,
}

impl Size {
	pub fn new(width: f64, height: f64) -> Self {
		Self { width, height }
	}
}

/// Places the menu at the pointer, pushed back inside `container` so that it
/// keeps [`MENU_MARGIN`] on every side. When the container is too small the
/// top-left margin wins.
pub fn clamp_anchor(pointer: Point, container: Size, menu: Size) -> Point {
	let max_left = container.width - menu.width - MENU_MARGIN;
	let max_top = container.height - menu.height - MENU_MARGIN;
	Point {
		x: pointer.x.min(max_left).max(MENU_MARGIN),
		y: pointer.y.min(max_top).max(MENU_MARGIN),
	}
}

/// Entries of the contextual menu. The DOM names them through `data-action`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MenuAction {
	Hide,
	Expand,
}

impl MenuAction {
	pub fn as_str(self) -> &'static str {
		match self {
			MenuAction::Hide => "remove",
			MenuAction::Expand => "expand",
		}
	}
}

/// The single open contextual menu, if any. `closed → open(target) → closed`.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ContextMenu {
	open: Option<OpenMenu>,
}

#[derive(Clone, Debug, PartialEq)]
struct OpenMenu {
	target: String,
	anchor: Point,
}

impl ContextMenu {
	pub fn open(&mut self, target: impl Into<String>, anchor: Point) {
		self.open = Some(OpenMenu {
			target: target.into(),
			anchor,
		});
	}

	pub fn close(&mut self) {
		self.open = None;
	}

	pub fn target(&self) -> Option<&str> {
		self.open.as_ref().map(|m| m.target.as_str())
	}

	/// Position relative to the container, while open.
	pub fn anchor(&self) -> Option<Point> {
		self.open.as_ref().map(|m| m.anchor)
	}

	pub fn is_open(&self) -> bool {
		self.open.is_some()
	}
}
