//! Reconciles a fetched fragment with the materialized graph.

use std::collections::HashSet;

use log::debug;

use super::graph::{Element, MaterializedGraph};
use super::types::GraphData;
use super::visibility::GroupToggles;

/// What a merge changed.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct MergeOutcome {
	/// Ids of the inserted elements, nodes first, in fragment order.
	pub added: Vec<String>,
	/// Edges dropped because an endpoint was neither known nor in the fragment.
	pub dangling: Vec<String>,
}

/// Adds the elements of `fragment` that the graph does not know yet.
///
/// Nodes are collected before edges so an edge may point at a node introduced
/// by the same fragment. The whole batch is inserted at once, then the policy
/// is applied to each new element exactly once. Elements already present are
/// left untouched, which makes re-merging the same fragment a no-op.
pub fn merge(
	graph: &mut MaterializedGraph,
	fragment: GraphData,
	toggles: &GroupToggles,
) -> MergeOutcome {
	let mut outcome = MergeOutcome::default();
	if fragment.is_empty() {
		return outcome;
	}

	let mut batch: Vec<Element> = Vec::new();
	let mut batch_ids: HashSet<String> = HashSet::new();

	for node in fragment.nodes {
		if graph.contains(&node.data.id) || batch_ids.contains(&node.data.id) {
			continue;
		}
		let groups = node.groups();
		batch_ids.insert(node.data.id.clone());
		batch.push(Element::node(node.data, groups));
	}
	let new_nodes = batch_ids.clone();

	let endpoint_known = |id: &str| {
		graph.get(id).is_some_and(Element::is_node) || new_nodes.contains(id)
	};
	for edge in fragment.edges {
		if graph.contains(&edge.data.id) || batch_ids.contains(&edge.data.id) {
			continue;
		}
		if !endpoint_known(&edge.data.source) || !endpoint_known(&edge.data.target) {
			outcome.dangling.push(edge.data.id);
			continue;
		}
		let groups = edge.groups();
		batch_ids.insert(edge.data.id.clone());
		batch.push(Element::edge(edge.data, groups));
	}

	if batch.is_empty() {
		if !outcome.dangling.is_empty() {
			debug!("merge: dropped dangling edges {:?}", outcome.dangling);
		}
		return outcome;
	}

	for element in &mut batch {
		// freshly fetched elements are never user-hidden
		element.user_hidden = false;
		element.apply_policy(toggles);
	}
	outcome.added = batch.iter().map(|e| e.id().to_string()).collect();
	graph.extend(batch);

	debug!(
		"merge: added {} elements, dropped {} dangling edges",
		outcome.added.len(),
		outcome.dangling.len()
	);
	outcome
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::diagram::fixtures::{edge, node};
	use crate::diagram::types::{EdgeElement, NodeElement};
	use crate::diagram::visibility::Group;

	fn fragment(nodes: Vec<NodeElement>, edges: Vec<EdgeElement>) -> GraphData {
		GraphData { nodes, edges }
	}

	#[test]
	fn adds_new_elements_with_edges_to_same_fragment_nodes() {
		let mut graph = MaterializedGraph::default();
		let toggles = GroupToggles::default();
		merge(&mut graph, fragment(vec![node("a", "")], vec![]), &toggles);

		let outcome = merge(
			&mut graph,
			fragment(vec![node("b", "arch-node")], vec![edge("a-b", "a", "b", "")]),
			&toggles,
		);

		assert_eq!(outcome.added, vec!["b".to_string(), "a-b".to_string()]);
		assert!(outcome.dangling.is_empty());
		assert_eq!(graph.len(), 3);
		assert!(graph.is_displayed("b"));
		assert!(graph.is_displayed("a-b"));
		assert_eq!(graph.neighbors("a"), vec!["b".to_string()]);
	}

	#[test]
	fn merging_twice_changes_nothing() {
		let mut graph = MaterializedGraph::default();
		let toggles = GroupToggles::default();
		let data = fragment(
			vec![node("a", ""), node("b", "")],
			vec![edge("a-b", "a", "b", "")],
		);

		merge(&mut graph, data.clone(), &toggles);
		let second = merge(&mut graph, data, &toggles);

		assert!(second.added.is_empty());
		assert_eq!(graph.len(), 3);
		assert_eq!(graph.connected_edges("a").len(), 1);
	}

	#[test]
	fn pre_existing_elements_keep_their_state() {
		let mut graph = MaterializedGraph::default();
		let toggles = GroupToggles::default();
		merge(&mut graph, fragment(vec![node("a", "")], vec![]), &toggles);
		let a = graph.get_mut("a").unwrap();
		a.user_hidden = true;
		a.apply_policy(&toggles);

		merge(&mut graph, fragment(vec![node("a", "")], vec![]), &toggles);

		assert!(graph.get("a").unwrap().user_hidden);
		assert!(!graph.is_displayed("a"));
	}

	#[test]
	fn dangling_edges_are_not_applied() {
		let mut graph = MaterializedGraph::default();
		let outcome = merge(
			&mut graph,
			fragment(vec![node("a", "")], vec![edge("a-x", "a", "x", "")]),
			&GroupToggles::default(),
		);

		assert_eq!(outcome.added, vec!["a".to_string()]);
		assert_eq!(outcome.dangling, vec!["a-x".to_string()]);
		assert!(!graph.contains("a-x"));
		assert!(graph.connected_edges("a").is_empty());
	}

	#[test]
	fn edges_cannot_use_other_edges_as_endpoints() {
		let mut graph = MaterializedGraph::default();
		let toggles = GroupToggles::default();
		merge(
			&mut graph,
			fragment(vec![node("a", ""), node("b", "")], vec![edge("e1", "a", "b", "")]),
			&toggles,
		);
		let outcome = merge(
			&mut graph,
			fragment(vec![], vec![edge("e2", "e1", "a", "")]),
			&toggles,
		);
		assert_eq!(outcome.dangling, vec!["e2".to_string()]);
	}

	#[test]
	fn duplicate_ids_inside_a_fragment_keep_the_first() {
		let mut graph = MaterializedGraph::default();
		let mut first = node("a", "");
		first.data.label = "first".into();
		let mut second = node("a", "");
		second.data.label = "second".into();

		merge(&mut graph, fragment(vec![first, second], vec![]), &GroupToggles::default());

		assert_eq!(graph.len(), 1);
		match &graph.get("a").unwrap().data {
			crate::diagram::graph::ElementData::Node(n) => assert_eq!(n.label, "first"),
			other => panic!("unexpected {other:?}"),
		}
	}

	#[test]
	fn new_elements_follow_current_toggles() {
		let mut graph = MaterializedGraph::default();
		let mut toggles = GroupToggles::default();
		toggles.set(Group::Governance, false);

		merge(
			&mut graph,
			fragment(
				vec![node("a", "arch-node"), node("g", "governance-node")],
				vec![edge("a-g", "a", "g", "governance-edge")],
			),
			&toggles,
		);

		assert!(graph.is_displayed("a"));
		assert!(!graph.is_displayed("g"));
		assert!(!graph.is_displayed("a-g"));
		assert!(!graph.get("g").unwrap().user_hidden);
	}

	#[test]
	fn empty_fragment_is_a_noop() {
		let mut graph = MaterializedGraph::default();
		let outcome = merge(&mut graph, GraphData::default(), &GroupToggles::default());
		assert!(outcome.added.is_empty());
		assert!(graph.is_empty());
	}
}
