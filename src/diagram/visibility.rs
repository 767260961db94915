//! Effective display state of an element.
//!
//! Two independent axes decide whether an element is drawn: the per-element
//! user-hidden flag and the page-wide group toggles. [`resolve`] is the only
//! place where they are combined.

use std::fmt;

/// Semantic groups the server tags elements with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Group {
	/// Architecture elements and relationships.
	Architecture,
	/// Governance documents and their links.
	Governance,
}

impl Group {
	/// Every group, in toolbar order.
	pub const ALL: [Group; 2] = [Group::Architecture, Group::Governance];

	/// Maps a wire class such as `arch-node` or `governance-edge` to its group.
	pub fn from_class(class: &str) -> Option<Self> {
		match class {
			"arch-node" | "arch-edge" => Some(Group::Architecture),
			"governance-node" | "governance-edge" => Some(Group::Governance),
			_ => None,
		}
	}

	/// Human readable name used for the toggle switches.
	pub fn label(self) -> &'static str {
		match self {
			Group::Architecture => "Architecture",
			Group::Governance => "Governance",
		}
	}

	fn bit(self) -> u8 {
		match self {
			Group::Architecture => 1,
			Group::Governance => 1 << 1,
		}
	}
}

impl fmt::Display for Group {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// The groups a single element belongs to.
#[derive(Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct GroupSet(u8);

impl GroupSet {
	/// An element in no tracked group.
	pub const EMPTY: GroupSet = GroupSet(0);

	/// Collects the groups named by a list of wire classes, ignoring unknown ones.
	pub fn from_classes<'a>(classes: impl IntoIterator<Item = &'a str>) -> Self {
		classes
			.into_iter()
			.filter_map(Group::from_class)
			.fold(Self::EMPTY, |set, g| set.with(g))
	}

	pub fn with(mut self, group: Group) -> Self {
		self.0 |= group.bit();
		self
	}

	pub fn contains(self, group: Group) -> bool {
		self.0 & group.bit() != 0
	}

	pub fn is_empty(self) -> bool {
		self.0 == 0
	}

	pub fn iter(self) -> impl Iterator<Item = Group> {
		Group::ALL.into_iter().filter(move |g| self.contains(*g))
	}
}

impl fmt::Debug for GroupSet {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_set().entries(self.iter()).finish()
	}
}

/// Page-wide "group enabled" switches. Every group starts enabled.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GroupToggles {
	architecture: bool,
	governance: bool,
}

impl Default for GroupToggles {
	fn default() -> Self {
		Self {
			architecture: true,
			governance: true,
		}
	}
}

impl GroupToggles {
	pub fn is_enabled(&self, group: Group) -> bool {
		match group {
			Group::Architecture => self.architecture,
			Group::Governance => self.governance,
		}
	}

	/// Flips a switch; returns whether the value actually changed.
	pub fn set(&mut self, group: Group, enabled: bool) -> bool {
		let slot = match group {
			Group::Architecture => &mut self.architecture,
			Group::Governance => &mut self.governance,
		};
		let changed = *slot != enabled;
		*slot = enabled;
		changed
	}

	/// True when nothing in `groups` holds the element back: it is untagged or
	/// at least one of its groups is enabled.
	pub fn admits(&self, groups: GroupSet) -> bool {
		groups.is_empty() || groups.iter().any(|g| self.is_enabled(g))
	}
}

/// What the renderer should do with an element.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Display {
	#[default]
	Visible,
	Hidden,
}

impl Display {
	pub fn is_visible(self) -> bool {
		self == Display::Visible
	}
}

/// Resolves the effective display state. An explicit user hide always wins
/// over the group toggles.
pub fn resolve(groups: GroupSet, user_hidden: bool, toggles: &GroupToggles) -> Display {
	if user_hidden || !toggles.admits(groups) {
		Display::Hidden
	} else {
		Display::Visible
	}
}
