use leptos::prelude::*;
use log::error;

use crate::components::diagram_canvas::DiagramCanvas;
use crate::diagram::{DiagramError, DiagramSettings, GraphData};

/// JSON of the graph the server embedded in the page: a
/// `<script id="graph-data">` block, or a `graphData` global.
fn embedded_graph_json() -> Result<String, DiagramError> {
	let missing = || DiagramError::MalformedInput("graph data is not defined".into());
	let window = web_sys::window().ok_or_else(missing)?;
	if let Some(element) = window
		.document()
		.and_then(|d| d.get_element_by_id("graph-data"))
	{
		return element.text_content().ok_or_else(missing);
	}
	let value = js_sys::Reflect::get(&window, &"graphData".into()).map_err(|_| missing())?;
	if value.is_undefined() {
		return Err(missing());
	}
	js_sys::JSON::stringify(&value)
		.ok()
		.and_then(|s| s.as_string())
		.ok_or_else(missing)
}

fn load_initial_graph() -> Result<GraphData, DiagramError> {
	GraphData::from_json(&embedded_graph_json()?)
}

/// The diagram page. Nothing is drawn when the embedded data is missing or
/// malformed.
#[component]
pub fn DiagramPage() -> impl IntoView {
	let settings = web_sys::window()
		.and_then(|w| w.document())
		.map(|d| DiagramSettings::from_document(&d))
		.unwrap_or_default();

	match load_initial_graph() {
		Ok(data) => view! {
			<div class="fullscreen-graph">
				<DiagramCanvas data=data settings=settings fullscreen=true />
			</div>
		}
		.into_any(),
		Err(err) => {
			error!("diagram not rendered: {err}");
			view! { <div class="fullscreen-graph"></div> }.into_any()
		}
	}
}
