use web_sys::Document;

use super::explorer::EXPAND_ENDPOINT;

/// Page-level switches, read from `data-*` attributes on `<body>`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DiagramSettings {
	/// `data-enable-save="true"`: persist node positions, show "Reset Layout".
	pub enable_save: bool,
	/// `data-expand-endpoint`: base path of the neighborhood endpoint.
	pub expand_endpoint: String,
}

impl Default for DiagramSettings {
	fn default() -> Self {
		Self {
			enable_save: false,
			expand_endpoint: EXPAND_ENDPOINT.to_string(),
		}
	}
}

impl DiagramSettings {
	pub fn from_attributes(enable_save: Option<&str>, expand_endpoint: Option<&str>) -> Self {
		let defaults = Self::default();
		Self {
			enable_save: enable_save == Some("true"),
			expand_endpoint: expand_endpoint
				.filter(|e| !e.trim().is_empty())
				.map(str::to_string)
				.unwrap_or(defaults.expand_endpoint),
		}
	}

	pub fn from_document(document: &Document) -> Self {
		let Some(body) = document.body() else {
			return Self::default();
		};
		let dataset = body.dataset();
		Self::from_attributes(
			dataset.get("enableSave").as_deref(),
			dataset.get("expandEndpoint").as_deref(),
		)
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn saving_needs_an_explicit_true() {
		assert!(DiagramSettings::from_attributes(Some("true"), None).enable_save);
		assert!(!DiagramSettings::from_attributes(Some("yes"), None).enable_save);
		assert!(!DiagramSettings::from_attributes(None, None).enable_save);
	}

	#[test]
	fn blank_endpoint_falls_back_to_default() {
		let s = DiagramSettings::from_attributes(None, Some("  "));
		assert_eq!(s.expand_endpoint, EXPAND_ENDPOINT);
		let s = DiagramSettings::from_attributes(None, Some("/v2/expand"));
		assert_eq!(s.expand_endpoint, "/v2/expand");
	}
}
