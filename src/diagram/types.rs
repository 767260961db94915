use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use super::error::DiagramError;
use super::visibility::GroupSet;

/// Class list as the server writes it: either `"arch-node badge-label"` or
/// `["arch-node", "badge-label"]`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Classes {
	Joined(String),
	List(Vec<String>),
}

impl Default for Classes {
	fn default() -> Self {
		Classes::Joined(String::new())
	}
}

impl Classes {
	pub fn iter(&self) -> Box<dyn Iterator<Item = &str> + '_> {
		match self {
			Classes::Joined(s) => Box::new(s.split_whitespace()),
			Classes::List(v) => Box::new(v.iter().map(String::as_str)),
		}
	}
}

/// Presentation fields never reject a payload: `null` or a value of the wrong
/// type reads as the default.
fn lenient<'de, D, T>(de: D) -> Result<T, D::Error>
where
	D: Deserializer<'de>,
	T: DeserializeOwned + Default,
{
	let value = Value::deserialize(de)?;
	Ok(serde_json::from_value(value).unwrap_or_default())
}

/// Widths arrive as numbers or numeric strings.
fn lenient_number<'de, D>(de: D) -> Result<Option<f64>, D::Error>
where
	D: Deserializer<'de>,
{
	Ok(match Value::deserialize(de)? {
		Value::Number(n) => n.as_f64(),
		Value::String(s) => s.trim().parse().ok(),
		_ => None,
	})
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeFields {
	pub id: String,
	#[serde(default, deserialize_with = "lenient")]
	pub label: String,
	#[serde(default, deserialize_with = "lenient")]
	pub color: Option<String>,
	#[serde(default, deserialize_with = "lenient")]
	pub shape: Option<String>,
	#[serde(default, deserialize_with = "lenient")]
	pub kind: Option<String>,
	#[serde(default, deserialize_with = "lenient")]
	pub slug: Option<String>,
	#[serde(
		default,
		deserialize_with = "lenient",
		skip_serializing_if = "Option::is_none"
	)]
	pub classes: Option<Classes>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeFields {
	pub id: String,
	pub source: String,
	pub target: String,
	#[serde(default, deserialize_with = "lenient")]
	pub label: String,
	#[serde(default, deserialize_with = "lenient")]
	pub color: Option<String>,
	#[serde(default, deserialize_with = "lenient_number")]
	pub line_width: Option<f64>,
	#[serde(default, deserialize_with = "lenient")]
	pub arrow_type: Option<String>,
	#[serde(default, deserialize_with = "lenient")]
	pub line_style: Option<String>,
	#[serde(
		default,
		deserialize_with = "lenient",
		skip_serializing_if = "Option::is_none"
	)]
	pub classes: Option<Classes>,
}

/// A node as embedded in the page or returned by the expand endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct NodeElement {
	pub data: NodeFields,
	#[serde(default, deserialize_with = "lenient")]
	pub classes: Classes,
}

/// An edge as embedded in the page or returned by the expand endpoint.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct EdgeElement {
	pub data: EdgeFields,
	#[serde(default, deserialize_with = "lenient")]
	pub classes: Classes,
}

fn groups_of<'a>(outer: &'a Classes, inner: Option<&'a Classes>) -> GroupSet {
	GroupSet::from_classes(outer.iter().chain(inner.into_iter().flat_map(Classes::iter)))
}

impl NodeElement {
	pub fn groups(&self) -> GroupSet {
		groups_of(&self.classes, self.data.classes.as_ref())
	}
}

impl EdgeElement {
	/// Groups come from the edge's own classes, never from its endpoints.
	pub fn groups(&self) -> GroupSet {
		groups_of(&self.classes, self.data.classes.as_ref())
	}
}

/// A whole graph or a fragment of one. Both keys are required: a body without
/// them is malformed rather than empty.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct GraphData {
	pub nodes: Vec<NodeElement>,
	pub edges: Vec<EdgeElement>,
}

impl GraphData {
	pub fn from_json(text: &str) -> Result<Self, DiagramError> {
		Ok(serde_json::from_str(text)?)
	}

	pub fn is_empty(&self) -> bool {
		self.nodes.is_empty() && self.edges.is_empty()
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::diagram::visibility::Group;

	#[test]
	fn parses_wire_shape() {
		let data = GraphData::from_json(
			r##"{
				"nodes": [
					{"data": {"id": "app-1", "label": "App", "color": "#fff", "shape": "rectangle"},
					 "classes": "arch-node badge-label"},
					{"data": {"id": "gov-1", "label": "Policy", "kind": "governance", "slug": "policy"},
					 "classes": ["governance-node"]}
				],
				"edges": [
					{"data": {"id": "e1", "source": "app-1", "target": "gov-1",
					          "lineWidth": 2, "arrowType": "triangle", "lineStyle": "dashed"}}
				]
			}"##,
		)
		.unwrap();

		assert_eq!(data.nodes.len(), 2);
		assert!(data.nodes[0].groups().contains(Group::Architecture));
		assert!(data.nodes[1].groups().contains(Group::Governance));
		assert_eq!(data.nodes[1].data.slug.as_deref(), Some("policy"));

		let edge = &data.edges[0];
		assert_eq!(edge.data.line_width, Some(2.0));
		assert_eq!(edge.data.arrow_type.as_deref(), Some("triangle"));
		assert!(edge.groups().is_empty());
	}

	#[test]
	fn classes_inside_data_count_too() {
		let data = GraphData::from_json(
			r#"{"nodes": [], "edges": [
				{"data": {"id": "e", "source": "a", "target": "b", "classes": "governance-edge"}}
			]}"#,
		)
		.unwrap();
		assert!(data.edges[0].groups().contains(Group::Governance));
	}

	#[test]
	fn missing_keys_are_malformed() {
		assert!(matches!(
			GraphData::from_json(r#"{"nodes": []}"#),
			Err(DiagramError::MalformedInput(_))
		));
		assert!(matches!(
			GraphData::from_json("null"),
			Err(DiagramError::MalformedInput(_))
		));
	}

	#[test]
	fn stray_presentation_values_do_not_reject_the_graph() {
		let data = GraphData::from_json(
			r#"{
				"nodes": [
					{"data": {"id": "a", "label": null, "color": 7}, "classes": null},
					{"data": {"id": "b", "label": "B", "classes": null}, "classes": "arch-node"}
				],
				"edges": [
					{"data": {"id": "a-b", "source": "a", "target": "b", "lineWidth": "2"}},
					{"data": {"id": "b-a", "source": "b", "target": "a", "lineWidth": "wide",
					          "label": null, "arrowType": false}}
				]
			}"#,
		)
		.unwrap();

		assert_eq!(data.nodes[0].data.label, "");
		assert_eq!(data.nodes[0].data.color, None);
		assert!(data.nodes[0].groups().is_empty());
		assert!(data.nodes[1].groups().contains(Group::Architecture));
		assert_eq!(data.edges[0].data.line_width, Some(2.0));
		assert_eq!(data.edges[1].data.line_width, None);
		assert_eq!(data.edges[1].data.arrow_type, None);
	}

	#[test]
	fn identity_fields_stay_required() {
		assert!(matches!(
			GraphData::from_json(r#"{"nodes": [{"data": {"label": "x"}}], "edges": []}"#),
			Err(DiagramError::MalformedInput(_))
		));
		assert!(matches!(
			GraphData::from_json(
				r#"{"nodes": [], "edges": [{"data": {"id": "e", "source": "a", "target": null}}]}"#
			),
			Err(DiagramError::MalformedInput(_))
		));
	}

	#[test]
	fn garbage_is_a_parse_error() {
		assert!(matches!(
			GraphData::from_json("<html>502</html>"),
			Err(DiagramError::Parse(_))
		));
	}
}
