use std::collections::{HashMap, HashSet};
use std::f64::consts::PI;

use force_graph::{DefaultNodeIdx, EdgeData, ForceGraph, NodeData, SimulationParameters};

use crate::diagram::storage::{Position, Positions};
use crate::diagram::{EdgeFields, ElementData, Explorer, NodeFields};

const DEFAULT_NODE_COLOR: &str = "#c9e7b7";
const DEFAULT_EDGE_COLOR: &str = "#666666";

pub const NODE_WIDTH: f64 = 110.0;
pub const NODE_HEIGHT: f64 = 80.0;
pub const MIN_ZOOM: f64 = 0.2;
pub const MAX_ZOOM: f64 = 3.0;
pub const ZOOM_IN_STEP: f64 = 1.2;
pub const ZOOM_OUT_STEP: f64 = 0.8;
pub const FIT_PADDING: f64 = 50.0;
/// Pointer travel (screen px) below which a press counts as a tap.
pub const TAP_SLOP: f64 = 4.0;

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum NodeShape {
	#[default]
	Rectangle,
	RoundRectangle,
	Ellipse,
	Diamond,
}

impl NodeShape {
	fn from_name(name: Option<&str>) -> Self {
		match name {
			Some("round-rectangle" | "roundrectangle") => NodeShape::RoundRectangle,
			Some("ellipse") => NodeShape::Ellipse,
			Some("diamond") => NodeShape::Diamond,
			_ => NodeShape::Rectangle,
		}
	}
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum LineStyle {
	#[default]
	Solid,
	Dashed,
	Dotted,
}

impl LineStyle {
	fn from_name(name: Option<&str>) -> Self {
		match name {
			Some("dashed") => LineStyle::Dashed,
			Some("dotted") => LineStyle::Dotted,
			_ => LineStyle::Solid,
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct NodeInfo {
	pub id: String,
	pub label: String,
	pub color: String,
	pub shape: NodeShape,
}

impl NodeInfo {
	fn from_fields(fields: &NodeFields) -> Self {
		Self {
			id: fields.id.clone(),
			label: fields.label.clone(),
			color: fields
				.color
				.clone()
				.unwrap_or_else(|| DEFAULT_NODE_COLOR.into()),
			shape: NodeShape::from_name(fields.shape.as_deref()),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct EdgeInfo {
	pub id: String,
	pub label: String,
	pub color: String,
	pub width: f64,
	pub style: LineStyle,
	pub arrow: bool,
}

impl EdgeInfo {
	fn from_fields(fields: &EdgeFields) -> Self {
		Self {
			id: fields.id.clone(),
			label: fields.label.clone(),
			color: fields
				.color
				.clone()
				.unwrap_or_else(|| DEFAULT_EDGE_COLOR.into()),
			width: fields.line_width.unwrap_or(1.5),
			style: LineStyle::from_name(fields.line_style.as_deref()),
			arrow: fields.arrow_type.as_deref() != Some("none"),
		}
	}
}

#[derive(Clone, Debug, Default)]
pub struct ViewTransform {
	pub x: f64,
	pub y: f64,
	pub k: f64,
}

#[derive(Clone, Debug, Default)]
pub struct DragState {
	pub active: bool,
	pub node_idx: Option<DefaultNodeIdx>,
	pub start_x: f64,
	pub start_y: f64,
	pub node_start_x: f32,
	pub node_start_y: f32,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct PanState {
	pub active: bool,
	pub start_x: f64,
	pub start_y: f64,
	pub transform_start_x: f64,
	pub transform_start_y: f64,
	pub moved: bool,
}

#[derive(Clone, Debug, Default)]
pub struct HoverState {
	pub node: Option<DefaultNodeIdx>,
	pub neighbors: HashSet<DefaultNodeIdx>,
	pub highlight_t: f64,
	pub prev_node: Option<DefaultNodeIdx>,
	pub prev_neighbors: HashSet<DefaultNodeIdx>,
	delay_t: f64,
}

/// Everything the canvas needs: the explorer holding the graph core, plus the
/// layout simulation and view state mirroring it.
pub struct DiagramState {
	pub explorer: Explorer,
	pub graph: ForceGraph<NodeInfo, EdgeInfo>,
	pub transform: ViewTransform,
	pub drag: DragState,
	pub pan: PanState,
	pub hover: HoverState,
	pub width: f64,
	pub height: f64,
	pub animation_running: bool,
	node_index: HashMap<String, DefaultNodeIdx>,
	node_ids: HashMap<DefaultNodeIdx, String>,
	edges: Vec<(DefaultNodeIdx, DefaultNodeIdx, String)>,
}

impl DiagramState {
	pub fn new(explorer: Explorer, width: f64, height: f64) -> Self {
		let graph = ForceGraph::new(SimulationParameters {
			force_charge: 12000.0,
			force_spring: 0.05,
			force_max: 200.0,
			node_speed: 3000.0,
			damping_factor: 0.9,
		});
		let mut state = Self {
			explorer,
			graph,
			transform: ViewTransform {
				x: width / 2.0,
				y: height / 2.0,
				k: 1.0,
			},
			drag: DragState::default(),
			pan: PanState::default(),
			hover: HoverState::default(),
			width,
			height,
			animation_running: true,
			node_index: HashMap::new(),
			node_ids: HashMap::new(),
			edges: Vec::new(),
		};
		let ids: Vec<String> = state
			.explorer
			.graph()
			.iter()
			.map(|e| e.id().to_string())
			.collect();
		state.sync_layout(&ids, None);
		state
	}

	/// Mirrors newly merged elements into the layout. New nodes are seeded in a
	/// ring around `around` (the expanded node) or around the origin.
	pub fn sync_layout(&mut self, added: &[String], around: Option<&str>) {
		let mut new_nodes = Vec::new();
		let mut new_edges = Vec::new();
		for id in added {
			let Some(element) = self.explorer.graph().get(id) else {
				continue;
			};
			match &element.data {
				ElementData::Node(fields) if !self.node_index.contains_key(id) => {
					new_nodes.push(NodeInfo::from_fields(fields));
				}
				ElementData::Edge(fields) => new_edges.push(EdgeInfo::from_fields(fields)),
				ElementData::Node(_) => {}
			}
		}

		let (cx, cy, radius) = match around.and_then(|id| self.node_position(id)) {
			Some((x, y)) => (x, y, NODE_WIDTH as f32 * 1.5),
			None => (0.0, 0.0, 100.0 + 25.0 * new_nodes.len() as f32),
		};
		let count = new_nodes.len().max(1);
		for (i, info) in new_nodes.into_iter().enumerate() {
			let angle = (i as f64) * 2.0 * PI / count as f64;
			let id = info.id.clone();
			let idx = self.graph.add_node(NodeData {
				x: cx + radius * angle.cos() as f32,
				y: cy + radius * angle.sin() as f32,
				mass: 10.0,
				is_anchor: false,
				user_data: info,
			});
			self.node_index.insert(id.clone(), idx);
			self.node_ids.insert(idx, id);
		}

		for info in new_edges {
			let Some((source, target)) = self
				.explorer
				.graph()
				.get(&info.id)
				.and_then(|e| e.endpoints())
				.map(|(s, t)| (s.to_string(), t.to_string()))
			else {
				continue;
			};
			if let (Some(&src), Some(&tgt)) =
				(self.node_index.get(&source), self.node_index.get(&target))
			{
				let id = info.id.clone();
				self.graph.add_edge(src, tgt, EdgeData { user_data: info });
				self.edges.push((src, tgt, id));
			}
		}
		self.animation_running = true;
	}

	pub fn node_id(&self, idx: DefaultNodeIdx) -> Option<&str> {
		self.node_ids.get(&idx).map(String::as_str)
	}

	pub fn is_displayed(&self, id: &str) -> bool {
		self.explorer.graph().is_displayed(id)
	}

	fn node_position(&self, id: &str) -> Option<(f32, f32)> {
		let idx = *self.node_index.get(id)?;
		let mut found = None;
		self.graph.visit_nodes(|node| {
			if node.index() == idx {
				found = Some((node.x(), node.y()));
			}
		});
		found
	}

	pub fn screen_to_graph(&self, sx: f64, sy: f64) -> (f64, f64) {
		(
			(sx - self.transform.x) / self.transform.k,
			(sy - self.transform.y) / self.transform.k,
		)
	}

	/// Topmost displayed node under a screen position. Hidden nodes are not
	/// hit-testable.
	pub fn node_at_position(&self, sx: f64, sy: f64) -> Option<DefaultNodeIdx> {
		let (gx, gy) = self.screen_to_graph(sx, sy);
		let mut found = None;
		self.graph.visit_nodes(|node| {
			let (dx, dy) = ((node.x() as f64 - gx).abs(), (node.y() as f64 - gy).abs());
			if dx <= NODE_WIDTH / 2.0
				&& dy <= NODE_HEIGHT / 2.0
				&& self.is_displayed(&node.data.user_data.id)
			{
				found = Some(node.index());
			}
		});
		found
	}

	pub fn set_hover(&mut self, node: Option<DefaultNodeIdx>) {
		if self.hover.node == node {
			return;
		}
		let was_hovering = self.hover.node.is_some();

		// Save previous state for fade-out
		if was_hovering && node.is_none() {
			self.hover.prev_node = self.hover.node.take();
			self.hover.prev_neighbors = std::mem::take(&mut self.hover.neighbors);
		} else {
			self.hover.prev_node = None;
			self.hover.prev_neighbors.clear();
		}

		self.hover.node = node;
		if node.is_some() && !was_hovering {
			self.hover.delay_t = 0.0;
		}
		self.collect_hover_neighbors();
	}

	/// Re-reads the hovered node's neighbors after the graph or its display
	/// state changed. A hovered node that got hidden stops being hovered.
	pub fn refresh_hover(&mut self) {
		let Some(idx) = self.hover.node else {
			return;
		};
		if self.node_id(idx).is_some_and(|id| !self.is_displayed(id)) {
			self.set_hover(None);
		} else {
			self.collect_hover_neighbors();
		}
	}

	fn collect_hover_neighbors(&mut self) {
		self.hover.neighbors.clear();
		let Some(idx) = self.hover.node else {
			return;
		};
		for (src, tgt, id) in &self.edges {
			if !self.explorer.graph().is_displayed(id) {
				continue;
			}
			if *src == idx {
				self.hover.neighbors.insert(*tgt);
			} else if *tgt == idx {
				self.hover.neighbors.insert(*src);
			}
		}
	}

	pub fn is_highlighted(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx)
			|| self.hover.neighbors.contains(&idx)
			|| self.hover.prev_node == Some(idx)
			|| self.hover.prev_neighbors.contains(&idx)
	}

	pub fn is_hovered(&self, idx: DefaultNodeIdx) -> bool {
		self.hover.node == Some(idx) || self.hover.prev_node == Some(idx)
	}

	pub fn has_active_highlight(&self) -> bool {
		self.hover.node.is_some() || self.hover.prev_node.is_some()
	}

	/// Zooms by `factor` keeping the screen point `(sx, sy)` fixed.
	pub fn zoom_at(&mut self, factor: f64, sx: f64, sy: f64) {
		let new_k = (self.transform.k * factor).clamp(MIN_ZOOM, MAX_ZOOM);
		let ratio = new_k / self.transform.k;
		self.transform.x = sx - (sx - self.transform.x) * ratio;
		self.transform.y = sy - (sy - self.transform.y) * ratio;
		self.transform.k = new_k;
	}

	/// Zooms around the canvas center.
	pub fn zoom_by(&mut self, factor: f64) {
		self.zoom_at(factor, self.width / 2.0, self.height / 2.0);
	}

	/// Frames every displayed node with `FIT_PADDING` screen pixels around.
	pub fn fit_view(&mut self) {
		let mut bounds: Option<(f64, f64, f64, f64)> = None;
		self.graph.visit_nodes(|node| {
			if !self.is_displayed(&node.data.user_data.id) {
				return;
			}
			let (x, y) = (node.x() as f64, node.y() as f64);
			let (x0, y0, x1, y1) = (
				x - NODE_WIDTH / 2.0,
				y - NODE_HEIGHT / 2.0,
				x + NODE_WIDTH / 2.0,
				y + NODE_HEIGHT / 2.0,
			);
			bounds = Some(match bounds {
				Some((a, b, c, d)) => (a.min(x0), b.min(y0), c.max(x1), d.max(y1)),
				None => (x0, y0, x1, y1),
			});
		});
		let Some((x0, y0, x1, y1)) = bounds else {
			return;
		};
		let (bw, bh) = (x1 - x0, y1 - y0);
		let k = ((self.width - 2.0 * FIT_PADDING) / bw)
			.min((self.height - 2.0 * FIT_PADDING) / bh)
			.clamp(MIN_ZOOM, MAX_ZOOM);
		self.transform = ViewTransform {
			x: self.width / 2.0 - (x0 + bw / 2.0) * k,
			y: self.height / 2.0 - (y0 + bh / 2.0) * k,
			k,
		};
	}

	pub fn positions(&self) -> Positions {
		let mut out = Positions::new();
		self.graph.visit_nodes(|node| {
			out.insert(
				node.data.user_data.id.clone(),
				Position {
					x: node.x(),
					y: node.y(),
				},
			);
		});
		out
	}

	/// Moves and pins every node that has a saved position.
	pub fn apply_positions(&mut self, positions: &Positions) {
		self.graph.visit_nodes_mut(|node| {
			if let Some(p) = positions.get(&node.data.user_data.id) {
				node.data.x = p.x;
				node.data.y = p.y;
				node.data.is_anchor = true;
			}
		});
	}

	/// Unpins every node and lets the simulation lay them out again.
	pub fn release_anchors(&mut self) {
		self.graph.visit_nodes_mut(|node| {
			node.data.is_anchor = false;
		});
		self.animation_running = true;
	}

	pub fn tick(&mut self, dt: f32) {
		self.graph.update(dt);

		let (target, delay, speed) = if self.hover.node.is_some() {
			(1.0, 0.08, 1.8)
		} else {
			(0.0, 0.0, 1.26)
		};

		if self.hover.node.is_some() {
			self.hover.delay_t = (self.hover.delay_t + dt as f64).min(delay);
			if self.hover.delay_t >= delay {
				self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			}
		} else {
			self.hover.highlight_t += (target - self.hover.highlight_t) * speed * dt as f64;
			if self.hover.highlight_t < 0.01 {
				self.hover.highlight_t = 0.0;
				self.hover.prev_node = None;
				self.hover.prev_neighbors.clear();
			}
		}
	}

	pub fn resize(&mut self, width: f64, height: f64) {
		self.width = width;
		self.height = height;
	}
}
