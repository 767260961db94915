//! Element builders shared by the unit tests.

use super::types::{Classes, EdgeElement, EdgeFields, GraphData, NodeElement, NodeFields};

pub fn node(id: &str, class: &str) -> NodeElement {
	NodeElement {
		data: NodeFields {
			id: id.into(),
			label: id.to_uppercase(),
			..Default::default()
		},
		classes: Classes::Joined(class.into()),
	}
}

pub fn edge(id: &str, source: &str, target: &str, class: &str) -> EdgeElement {
	EdgeElement {
		data: EdgeFields {
			id: id.into(),
			source: source.into(),
			target: target.into(),
			..Default::default()
		},
		classes: Classes::Joined(class.into()),
	}
}

/// Nodes `a`, `b` and edge `a-b`, all tagged architecture.
pub fn arch_pair() -> GraphData {
	GraphData {
		nodes: vec![node("a", "arch-node"), node("b", "arch-node")],
		edges: vec![edge("a-b", "a", "b", "arch-edge")],
	}
}
