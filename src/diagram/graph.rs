use std::collections::HashMap;

use super::types::{EdgeFields, NodeFields};
use super::visibility::{self, Display, GroupSet, GroupToggles};

/// Domain tag of a node, decides where a tap navigates to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeKind {
	Element,
	Governance,
}

impl NodeKind {
	fn from_tag(tag: Option<&str>) -> Self {
		match tag {
			Some("governance") => NodeKind::Governance,
			_ => NodeKind::Element,
		}
	}
}

#[derive(Clone, Debug, PartialEq)]
pub enum ElementData {
	Node(NodeFields),
	Edge(EdgeFields),
}

/// A node or edge of the materialized graph.
#[derive(Clone, Debug, PartialEq)]
pub struct Element {
	pub data: ElementData,
	pub groups: GroupSet,
	pub user_hidden: bool,
	display: Display,
}

impl Element {
	pub fn node(fields: NodeFields, groups: GroupSet) -> Self {
		Self {
			data: ElementData::Node(fields),
			groups,
			user_hidden: false,
			display: Display::Visible,
		}
	}

	pub fn edge(fields: EdgeFields, groups: GroupSet) -> Self {
		Self {
			data: ElementData::Edge(fields),
			groups,
			user_hidden: false,
			display: Display::Visible,
		}
	}

	pub fn id(&self) -> &str {
		match &self.data {
			ElementData::Node(n) => &n.id,
			ElementData::Edge(e) => &e.id,
		}
	}

	pub fn is_node(&self) -> bool {
		matches!(self.data, ElementData::Node(_))
	}

	pub fn kind(&self) -> Option<NodeKind> {
		match &self.data {
			ElementData::Node(n) => Some(NodeKind::from_tag(n.kind.as_deref())),
			ElementData::Edge(_) => None,
		}
	}

	/// Source and target ids, for edges.
	pub fn endpoints(&self) -> Option<(&str, &str)> {
		match &self.data {
			ElementData::Edge(e) => Some((&e.source, &e.target)),
			ElementData::Node(_) => None,
		}
	}

	pub fn is_displayed(&self) -> bool {
		self.display.is_visible()
	}

	/// Recomputes the display state; returns whether it changed, so a second call
	/// with the same inputs is a no-op.
	pub fn apply_policy(&mut self, toggles: &GroupToggles) -> bool {
		let next = visibility::resolve(self.groups, self.user_hidden, toggles);
		let changed = next != self.display;
		self.display = next;
		changed
	}
}

/// The elements currently known to the client. It only ever grows; elements
/// are hidden, never removed.
#[derive(Clone, Debug, Default)]
pub struct MaterializedGraph {
	elements: Vec<Element>,
	by_id: HashMap<String, usize>,
	// node id -> indices of its connected edges
	incident: HashMap<String, Vec<usize>>,
}

impl MaterializedGraph {
	pub fn len(&self) -> usize {
		self.elements.len()
	}

	pub fn is_empty(&self) -> bool {
		self.elements.is_empty()
	}

	pub fn contains(&self, id: &str) -> bool {
		self.by_id.contains_key(id)
	}

	pub fn get(&self, id: &str) -> Option<&Element> {
		self.by_id.get(id).map(|&i| &self.elements[i])
	}

	pub(crate) fn get_mut(&mut self, id: &str) -> Option<&mut Element> {
		self.by_id.get(id).map(|&i| &mut self.elements[i])
	}

	pub fn iter(&self) -> impl Iterator<Item = &Element> {
		self.elements.iter()
	}

	pub(crate) fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
		self.elements.iter_mut()
	}

	/// Display state of `id`; unknown ids count as not displayed.
	pub fn is_displayed(&self, id: &str) -> bool {
		self.get(id).is_some_and(Element::is_displayed)
	}

	/// Ids of every edge with `id` as source or target.
	pub fn connected_edges(&self, id: &str) -> Vec<String> {
		self.incident
			.get(id)
			.map(|edges| {
				edges
					.iter()
					.map(|&i| self.elements[i].id().to_string())
					.collect()
			})
			.unwrap_or_default()
	}

	/// Ids of the nodes sharing an edge with `id`, hidden ones included, each once.
	pub fn neighbors(&self, id: &str) -> Vec<String> {
		let mut out: Vec<String> = Vec::new();
		for &i in self.incident.get(id).into_iter().flatten() {
			let Some((source, target)) = self.elements[i].endpoints() else {
				continue;
			};
			let other = if source == id { target } else { source };
			if other != id && !out.iter().any(|n| n == other) {
				out.push(other.to_string());
			}
		}
		out
	}

	/// Appends a batch whose ids are new and whose edges only reference nodes
	/// already present or contained in the batch. Callers check both.
	pub(crate) fn extend(&mut self, batch: Vec<Element>) {
		for element in batch {
			let idx = self.elements.len();
			debug_assert!(!self.by_id.contains_key(element.id()));
			self.by_id.insert(element.id().to_string(), idx);
			if let Some((source, target)) = element.endpoints() {
				debug_assert!(self.by_id.contains_key(source) && self.by_id.contains_key(target));
				self.incident.entry(source.to_string()).or_default().push(idx);
				if target != source {
					self.incident.entry(target.to_string()).or_default().push(idx);
				}
			}
			self.elements.push(element);
		}
	}
}
