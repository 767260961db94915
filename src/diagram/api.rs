//! HTTP calls made from the page.

use serde::Deserialize;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Request, RequestInit, Response};

use super::error::DiagramError;
use super::explorer::ExpandRequest;
use super::types::GraphData;

const REVALIDATE_ENDPOINT: &str = "/api/validation/revalidate";

/// A response whose body has been read, whatever its status.
struct Reply {
	url: String,
	status: u16,
	body: String,
}

impl Reply {
	fn is_success(&self) -> bool {
		(200..300).contains(&self.status)
	}

	fn status_error(&self) -> DiagramError {
		DiagramError::Network(format!("{} returned {}", self.url, self.status))
	}

	/// The body of a 2xx reply.
	fn into_body(self) -> Result<String, DiagramError> {
		if self.is_success() {
			Ok(self.body)
		} else {
			Err(self.status_error())
		}
	}
}

async fn send(request: &Request) -> Result<Reply, DiagramError> {
	let window = web_sys::window().ok_or_else(|| DiagramError::Network("no window".into()))?;
	let response: Response = JsFuture::from(window.fetch_with_request(request))
		.await
		.map_err(DiagramError::network)?
		.dyn_into()
		.map_err(DiagramError::network)?;
	let body = JsFuture::from(response.text().map_err(DiagramError::network)?)
		.await
		.map_err(DiagramError::network)?
		.as_string()
		.ok_or_else(|| DiagramError::Parse("response body is not text".into()))?;
	Ok(Reply {
		url: response.url(),
		status: response.status(),
		body,
	})
}

/// `GET {endpoint}/{id}`; the fragment around the requested node.
pub async fn fetch_neighborhood(
	request: &ExpandRequest,
	endpoint: &str,
) -> Result<GraphData, DiagramError> {
	let http = Request::new_with_str(&request.url(endpoint)).map_err(DiagramError::network)?;
	let body = send(&http).await?.into_body()?;
	GraphData::from_json(&body)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevalidationReport {
	pub error_count: u64,
}

pub fn revalidate_url(file_path: &str) -> String {
	format!("{REVALIDATE_ENDPOINT}/{}", urlencoding::encode(file_path))
}

/// `POST /api/validation/revalidate/{filePath}`.
pub async fn revalidate(file_path: &str) -> Result<RevalidationReport, DiagramError> {
	let init = RequestInit::new();
	init.set_method("POST");
	let http = Request::new_with_str_and_init(&revalidate_url(file_path), &init)
		.map_err(DiagramError::network)?;
	read_report(send(&http).await?)
}

/// The server answers failed revalidations with a report too, so the body is
/// read before the status is looked at.
fn read_report(reply: Reply) -> Result<RevalidationReport, DiagramError> {
	match serde_json::from_str(&reply.body) {
		Ok(report) => Ok(report),
		Err(_) if !reply.is_success() => Err(reply.status_error()),
		Err(err) => Err(err.into()),
	}
}

/// Page-script entry point behind the validation page's "Reload" buttons.
/// The user asked for this explicitly, so both outcomes are shown in a
/// blocking alert; success also reloads the page.
#[wasm_bindgen(js_name = reloadFile)]
#[cfg_attr(not(target_arch = "wasm32"), allow(dead_code))]
pub fn reload_file(file_path: String) {
	wasm_bindgen_futures::spawn_local(async move {
		let Some(window) = web_sys::window() else {
			return;
		};
		match revalidate(&file_path).await {
			Ok(report) => {
				let _ = window.alert_with_message(&format!(
					"File reloaded: {} errors found",
					report.error_count
				));
				let _ = window.location().reload();
			}
			Err(err) => {
				log::warn!("revalidate {file_path}: {err}");
				let _ = window.alert_with_message(&format!("Error: {err}"));
			}
		}
	});
}
