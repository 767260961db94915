//! Node positions kept in `localStorage`, one entry per diagram page.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use web_sys::Storage;

use super::error::DiagramError;

const KEY_PREFIX: &str = "cytoscape_positions_";

#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
	pub x: f32,
	pub y: f32,
}

pub type Positions = HashMap<String, Position>;

/// Storage key for a page titled `title`.
pub fn storage_key(title: &str) -> String {
	format!("{KEY_PREFIX}{title}")
}

pub fn encode(positions: &Positions) -> Result<String, DiagramError> {
	serde_json::to_string(positions).map_err(|e| DiagramError::Storage(e.to_string()))
}

pub fn decode(text: &str) -> Result<Positions, DiagramError> {
	serde_json::from_str(text).map_err(|e| DiagramError::Storage(e.to_string()))
}

/// Handle on the saved layout of the current page.
pub struct PositionStore {
	storage: Storage,
	key: String,
}

impl PositionStore {
	/// Opens the store keyed by the document title.
	pub fn open() -> Result<Self, DiagramError> {
		let window =
			web_sys::window().ok_or_else(|| DiagramError::Storage("no window".into()))?;
		let storage = window
			.local_storage()
			.map_err(DiagramError::storage)?
			.ok_or_else(|| DiagramError::Storage("localStorage unavailable".into()))?;
		let title = window.document().map(|d| d.title()).unwrap_or_default();
		Ok(Self {
			storage,
			key: storage_key(&title),
		})
	}

	/// Saved positions, empty when nothing was saved yet.
	pub fn load(&self) -> Result<Positions, DiagramError> {
		match self.storage.get_item(&self.key).map_err(DiagramError::storage)? {
			Some(text) => decode(&text),
			None => Ok(Positions::new()),
		}
	}

	pub fn save(&self, positions: &Positions) -> Result<(), DiagramError> {
		self.storage
			.set_item(&self.key, &encode(positions)?)
			.map_err(DiagramError::storage)
	}

	pub fn clear(&self) -> Result<(), DiagramError> {
		self.storage
			.remove_item(&self.key)
			.map_err(DiagramError::storage)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn key_is_derived_from_the_title() {
		assert_eq!(storage_key("Context View"), "cytoscape_positions_Context View");
	}

	#[test]
	fn reads_the_saved_layout_format() {
		let positions = decode(r#"{"app-1": {"x": 12.5, "y": -4}}"#).unwrap();
		assert_eq!(positions["app-1"], Position { x: 12.5, y: -4.0 });
	}

	#[test]
	fn garbage_is_a_storage_error() {
		assert!(matches!(decode("[1, 2"), Err(DiagramError::Storage(_))));
	}
}
