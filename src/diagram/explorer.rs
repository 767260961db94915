//! User gestures against the materialized graph: hide, expand, group toggles
//! and the contextual menu that fronts the first two.

use log::{debug, warn};

use super::error::DiagramError;
use super::graph::{ElementData, MaterializedGraph, NodeKind};
use super::menu::{ContextMenu, MenuAction, Point, Size, clamp_anchor};
use super::merge::{MergeOutcome, merge};
use super::types::GraphData;
use super::visibility::{Group, GroupToggles};

/// Default base path of the neighborhood endpoint.
pub const EXPAND_ENDPOINT: &str = "/api/diagrams/expand";

/// A neighborhood fetch the page has to perform for an expand gesture.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ExpandRequest {
	pub id: String,
}

impl ExpandRequest {
	/// `{endpoint}/{id}` with the id percent-encoded.
	pub fn url(&self, endpoint: &str) -> String {
		format!(
			"{}/{}",
			endpoint.trim_end_matches('/'),
			urlencoding::encode(&self.id)
		)
	}
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ExpandOutcome {
	pub merged: MergeOutcome,
	/// Previously user-hidden neighbors and edges that were un-hidden.
	pub revealed: Vec<String>,
}

/// Owns the materialized graph, the group switches and the contextual menu.
#[derive(Clone, Debug, Default)]
pub struct Explorer {
	graph: MaterializedGraph,
	toggles: GroupToggles,
	menu: ContextMenu,
}

impl Explorer {
	/// Seeds the graph from the data embedded in the page.
	pub fn new(initial: GraphData) -> Self {
		let mut explorer = Self::default();
		let seeded = merge(&mut explorer.graph, initial, &explorer.toggles);
		if !seeded.dangling.is_empty() {
			warn!(
				"initial graph: ignored {} edges with unknown endpoints",
				seeded.dangling.len()
			);
		}
		explorer
	}

	pub fn graph(&self) -> &MaterializedGraph {
		&self.graph
	}

	pub fn menu(&self) -> &ContextMenu {
		&self.menu
	}

	/// Opens the menu on a displayed node. Returns the clamped anchor, relative
	/// to the container, or `None` (menu closed) for anything else.
	pub fn open_menu(
		&mut self,
		target: &str,
		pointer: Point,
		container: Size,
		menu: Size,
	) -> Option<Point> {
		let is_shown_node = self
			.graph
			.get(target)
			.is_some_and(|e| e.is_node() && e.is_displayed());
		if !is_shown_node {
			self.menu.close();
			return None;
		}
		let anchor = clamp_anchor(pointer, container, menu);
		self.menu.open(target, anchor);
		Some(anchor)
	}

	/// Tap, pan and zoom all land here.
	pub fn dismiss_menu(&mut self) {
		self.menu.close();
	}

	/// Runs a menu entry against the menu target. Hide completes immediately;
	/// expand hands back the fetch to perform and finishes in
	/// [`Explorer::complete_expand`].
	pub fn dispatch(&mut self, action: MenuAction) -> Option<ExpandRequest> {
		let target = self.menu.target()?.to_string();
		match action {
			MenuAction::Hide => {
				self.hide(&target);
				None
			}
			MenuAction::Expand => Some(ExpandRequest { id: target }),
		}
	}

	/// Hides `id` and the edges directly connected to it, then closes the menu.
	/// Returns the ids whose display state changed.
	pub fn hide(&mut self, id: &str) -> Vec<String> {
		let mut affected = vec![id.to_string()];
		affected.extend(self.graph.connected_edges(id));

		let mut changed = Vec::new();
		for element_id in affected {
			let Some(element) = self.graph.get_mut(&element_id) else {
				continue;
			};
			element.user_hidden = true;
			if element.apply_policy(&self.toggles) {
				changed.push(element_id);
			}
		}
		self.menu.close();
		changed
	}

	/// Finishes an expand whatever the fetch produced: merges a fragment when
	/// there is one, runs the reveal pass and closes the menu. Failures are
	/// only logged.
	pub fn complete_expand(
		&mut self,
		request: &ExpandRequest,
		fetched: Result<GraphData, DiagramError>,
	) -> ExpandOutcome {
		let merged = match fetched {
			Ok(fragment) => merge(&mut self.graph, fragment, &self.toggles),
			Err(err) => {
				warn!("expand {}: {err}", request.id);
				MergeOutcome::default()
			}
		};
		let revealed = self.reveal_neighborhood(&request.id);
		self.menu.close();
		debug!(
			"expand {}: {} added, {} revealed",
			request.id,
			merged.added.len(),
			revealed.len()
		);
		ExpandOutcome { merged, revealed }
	}

	/// Un-hides the user-hidden neighbors of `id`, then the user-hidden edges
	/// of `id` whose endpoints are both displayed.
	pub fn reveal_neighborhood(&mut self, id: &str) -> Vec<String> {
		let mut revealed = Vec::new();

		for neighbor in self.graph.neighbors(id) {
			let Some(node) = self.graph.get_mut(&neighbor) else {
				continue;
			};
			if !node.user_hidden {
				continue;
			}
			node.user_hidden = false;
			node.apply_policy(&self.toggles);
			revealed.push(neighbor);
		}

		for edge_id in self.graph.connected_edges(id) {
			let Some(edge) = self.graph.get(&edge_id) else {
				continue;
			};
			if !edge.user_hidden {
				continue;
			}
			let Some((source, target)) = edge.endpoints() else {
				continue;
			};
			if !(self.graph.is_displayed(source) && self.graph.is_displayed(target)) {
				continue;
			}
			if let Some(edge) = self.graph.get_mut(&edge_id) {
				edge.user_hidden = false;
				edge.apply_policy(&self.toggles);
				revealed.push(edge_id);
			}
		}

		revealed
	}

	/// Flips a group switch and re-evaluates every element tagged with it.
	/// User-hidden elements stay hidden. Returns the ids whose display changed.
	pub fn set_group_enabled(&mut self, group: Group, enabled: bool) -> Vec<String> {
		self.toggles.set(group, enabled);
		let toggles = &self.toggles;
		self.graph
			.iter_mut()
			.filter(|e| e.groups.contains(group))
			.filter_map(|e| e.apply_policy(toggles).then(|| e.id().to_string()))
			.collect()
	}

	/// Where a primary tap on node `id` should take the browser.
	pub fn navigation_target(&self, id: &str) -> Option<String> {
		let element = self.graph.get(id)?;
		let ElementData::Node(node) = &element.data else {
			return None;
		};
		Some(match element.kind() {
			Some(NodeKind::Governance) => {
				format!("/governance/{}", node.slug.as_deref().unwrap_or(&node.id))
			}
			_ => format!("/elements/{}", node.id),
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::diagram::fixtures::{arch_pair, edge, node};

	const CONTAINER: Size = Size {
		width: 800.0,
		height: 600.0,
	};
	const MENU: Size = Size {
		width: 120.0,
		height: 60.0,
	};

	fn open(explorer: &mut Explorer, id: &str) {
		explorer
			.open_menu(id, Point::new(10.0, 10.0), CONTAINER, MENU)
			.expect("menu should open");
	}

	#[test]
	fn hiding_a_node_hides_its_edges_only() {
		let mut ex = Explorer::new(arch_pair());
		open(&mut ex, "a");

		assert_eq!(ex.dispatch(MenuAction::Hide), None);

		assert!(!ex.graph().is_displayed("a"));
		assert!(!ex.graph().is_displayed("a-b"));
		assert!(ex.graph().is_displayed("b"));
		assert!(ex.graph().get("a-b").unwrap().user_hidden);
		assert!(!ex.menu().is_open());
	}

	#[test]
	fn hiding_twice_reports_no_further_changes() {
		let mut ex = Explorer::new(arch_pair());
		assert_eq!(ex.hide("a").len(), 2);
		assert!(ex.hide("a").is_empty());
	}

	#[test]
	fn toggling_a_group_respects_user_hides() {
		let mut ex = Explorer::new(arch_pair());
		ex.hide("a");

		let changed = ex.set_group_enabled(Group::Architecture, false);
		assert_eq!(changed, vec!["b".to_string()]);
		assert!(!ex.graph().is_displayed("b"));

		ex.set_group_enabled(Group::Architecture, true);
		assert!(ex.graph().is_displayed("b"));
		assert!(!ex.graph().is_displayed("a"));
		assert!(!ex.graph().is_displayed("a-b"));
	}

	#[test]
	fn toggles_leave_other_groups_alone() {
		let mut ex = Explorer::new(GraphData {
			nodes: vec![node("a", "arch-node"), node("g", "governance-node"), node("u", "")],
			edges: vec![],
		});
		ex.set_group_enabled(Group::Governance, false);
		assert!(ex.graph().is_displayed("a"));
		assert!(ex.graph().is_displayed("u"));
		assert!(!ex.graph().is_displayed("g"));
	}

	#[test]
	fn toggling_does_not_touch_the_menu() {
		let mut ex = Explorer::new(arch_pair());
		open(&mut ex, "a");
		ex.set_group_enabled(Group::Governance, false);
		assert_eq!(ex.menu().target(), Some("a"));
	}

	#[test]
	fn expand_merges_new_neighbors() {
		let mut ex = Explorer::new(GraphData {
			nodes: vec![node("a", "arch-node")],
			edges: vec![],
		});
		open(&mut ex, "a");
		let request = ex.dispatch(MenuAction::Expand).unwrap();
		assert_eq!(request.id, "a");
		assert!(ex.menu().is_open());

		let outcome = ex.complete_expand(
			&request,
			Ok(GraphData {
				nodes: vec![node("b", "arch-node")],
				edges: vec![edge("a-b", "a", "b", "arch-edge")],
			}),
		);

		assert_eq!(outcome.merged.added.len(), 2);
		assert!(ex.graph().is_displayed("b"));
		assert!(ex.graph().is_displayed("a-b"));
		assert!(!ex.menu().is_open());
	}

	#[test]
	fn expand_reveals_known_hidden_neighbors() {
		let mut ex = Explorer::new(GraphData {
			nodes: vec![node("a", ""), node("c", "arch-node")],
			edges: vec![edge("a-c", "a", "c", "")],
		});
		ex.hide("c");
		assert!(!ex.graph().is_displayed("c"));
		assert!(!ex.graph().is_displayed("a-c"));

		let request = ExpandRequest { id: "a".into() };
		let outcome = ex.complete_expand(&request, Ok(GraphData::default()));

		assert_eq!(outcome.revealed, vec!["c".to_string(), "a-c".to_string()]);
		assert!(!ex.graph().get("c").unwrap().user_hidden);
		assert!(ex.graph().is_displayed("c"));
		assert!(ex.graph().is_displayed("a-c"));
	}

	#[test]
	fn failed_fetch_still_runs_the_reveal_pass() {
		let mut ex = Explorer::new(arch_pair());
		ex.hide("b");
		open(&mut ex, "a");
		let request = ex.dispatch(MenuAction::Expand).unwrap();
		let before = ex.graph().len();

		ex.complete_expand(&request, Err(DiagramError::Network("503".into())));

		assert_eq!(ex.graph().len(), before);
		assert!(ex.graph().is_displayed("b"));
		assert!(ex.graph().is_displayed("a-b"));
		assert!(!ex.menu().is_open());
	}

	#[test]
	fn malformed_fragment_is_a_noop_merge() {
		let mut ex = Explorer::new(arch_pair());
		ex.hide("b");
		let fetched = GraphData::from_json(r#"{"nodes": [{"data": {"id": "z"}}]}"#);
		assert!(fetched.is_err());

		let outcome = ex.complete_expand(&ExpandRequest { id: "a".into() }, fetched);

		assert!(outcome.merged.added.is_empty());
		assert!(!ex.graph().contains("z"));
		assert!(ex.graph().is_displayed("b"));
	}

	#[test]
	fn edges_stay_hidden_while_an_endpoint_is_hidden() {
		// a - b - c, with b hidden by its group and a-b hidden by the user
		let mut ex = Explorer::new(GraphData {
			nodes: vec![node("a", ""), node("b", "governance-node"), node("c", "")],
			edges: vec![edge("a-b", "a", "b", ""), edge("b-c", "b", "c", "")],
		});
		ex.hide("c");
		ex.set_group_enabled(Group::Governance, false);
		ex.hide("a");

		// expanding c: b is a neighbor but stays hidden by its group
		let outcome = ex.complete_expand(&ExpandRequest { id: "c".into() }, Ok(GraphData::default()));

		assert!(outcome.revealed.is_empty());
		assert!(!ex.graph().is_displayed("b"));
		assert!(ex.graph().get("b-c").unwrap().user_hidden);
	}

	#[test]
	fn reveal_clears_the_flag_even_when_the_group_is_off() {
		let mut ex = Explorer::new(GraphData {
			nodes: vec![node("a", ""), node("g", "governance-node")],
			edges: vec![edge("a-g", "a", "g", "")],
		});
		ex.hide("g");
		ex.set_group_enabled(Group::Governance, false);

		ex.complete_expand(&ExpandRequest { id: "a".into() }, Ok(GraphData::default()));
		assert!(!ex.graph().get("g").unwrap().user_hidden);
		assert!(!ex.graph().is_displayed("g"));
		// a-g has a hidden endpoint, so it stays user-hidden
		assert!(ex.graph().get("a-g").unwrap().user_hidden);

		ex.set_group_enabled(Group::Governance, true);
		assert!(ex.graph().is_displayed("g"));
	}

	#[test]
	fn menu_only_opens_on_displayed_nodes() {
		let mut ex = Explorer::new(arch_pair());
		assert!(ex.open_menu("a-b", Point::default(), CONTAINER, MENU).is_none());
		assert!(ex.open_menu("missing", Point::default(), CONTAINER, MENU).is_none());

		open(&mut ex, "a");
		ex.hide("b");
		assert!(ex.open_menu("b", Point::default(), CONTAINER, MENU).is_none());
		assert!(!ex.menu().is_open());
	}

	#[test]
	fn menu_anchor_is_clamped() {
		let mut ex = Explorer::new(arch_pair());
		let anchor = ex
			.open_menu("a", Point::new(795.0, 3.0), CONTAINER, MENU)
			.unwrap();
		assert_eq!(anchor, Point::new(672.0, 8.0));
		assert_eq!(ex.menu().anchor(), Some(anchor));
	}

	#[test]
	fn dismissing_clears_the_target() {
		let mut ex = Explorer::new(arch_pair());
		open(&mut ex, "a");
		ex.dismiss_menu();
		assert_eq!(ex.dispatch(MenuAction::Hide), None);
		assert!(ex.graph().is_displayed("a"));
	}

	#[test]
	fn navigation_targets_depend_on_kind() {
		let mut gov = node("g", "governance-node");
		gov.data.kind = Some("governance".into());
		gov.data.slug = Some("data-policy".into());
		let ex = Explorer::new(GraphData {
			nodes: vec![node("app 1", "arch-node"), gov],
			edges: vec![],
		});

		assert_eq!(ex.navigation_target("app 1").as_deref(), Some("/elements/app 1"));
		assert_eq!(
			ex.navigation_target("g").as_deref(),
			Some("/governance/data-policy")
		);
		assert_eq!(ex.navigation_target("nope"), None);
	}

	#[test]
	fn expand_urls_are_percent_encoded() {
		let request = ExpandRequest {
			id: "app/1 x".into(),
		};
		assert_eq!(
			request.url(EXPAND_ENDPOINT),
			"/api/diagrams/expand/app%2F1%20x"
		);
		assert_eq!(request.url("/expand/"), "/expand/app%2F1%20x");
	}

	#[test]
	fn initial_dangling_edges_are_dropped() {
		let ex = Explorer::new(
			GraphData::from_json(
				r#"{"nodes": [{"data": {"id": "a"}}],
				    "edges": [{"data": {"id": "e", "source": "a", "target": "ghost"}}]}"#,
			)
			.unwrap(),
		);
		assert_eq!(ex.graph().len(), 1);
	}
}
