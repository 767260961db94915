use thiserror::Error;
use wasm_bindgen::JsValue;

/// Everything that can go wrong between the page, the server and the graph core.
///
/// None of these are fatal: callers log them (or alert, for user-initiated
/// actions) and the diagram stays interactive.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DiagramError {
	/// Structured data with the wrong shape, e.g. a fragment without `edges`.
	#[error("malformed graph data: {0}")]
	MalformedInput(String),
	/// The request was rejected or came back with a non-2xx status.
	#[error("network error: {0}")]
	Network(String),
	/// The body was not valid JSON.
	#[error("could not parse response: {0}")]
	Parse(String),
	/// Local storage is unavailable or holds something unreadable.
	#[error("storage error: {0}")]
	Storage(String),
}

impl DiagramError {
	/// Maps a JS exception into a network error, keeping its message when it has one.
	pub fn network(err: JsValue) -> Self {
		Self::Network(js_message(&err))
	}

	/// Same as [`DiagramError::network`], for `localStorage` failures.
	pub fn storage(err: JsValue) -> Self {
		Self::Storage(js_message(&err))
	}
}

impl From<serde_json::Error> for DiagramError {
	fn from(err: serde_json::Error) -> Self {
		use serde_json::error::Category;
		match err.classify() {
			Category::Data => Self::MalformedInput(err.to_string()),
			Category::Io | Category::Syntax | Category::Eof => Self::Parse(err.to_string()),
		}
	}
}

fn js_message(err: &JsValue) -> String {
	err.as_string()
		.or_else(|| {
			js_sys::Reflect::get(err, &JsValue::from_str("message"))
				.ok()
				.and_then(|m| m.as_string())
		})
		.unwrap_or_else(|| format!("{err:?}"))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn syntax_errors_are_parse_errors() {
		let err = serde_json::from_str::<serde_json::Value>("{nodes: ").unwrap_err();
		assert!(matches!(DiagramError::from(err), DiagramError::Parse(_)));
	}

	#[test]
	fn shape_errors_are_malformed_input() {
		#[derive(Debug, serde::Deserialize)]
		#[allow(dead_code)]
		struct Needs {
			nodes: Vec<u32>,
		}
		let err = serde_json::from_str::<Needs>("{}").unwrap_err();
		assert!(matches!(
			DiagramError::from(err),
			DiagramError::MalformedInput(_)
		));
	}
}
