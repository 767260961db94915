use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use log::{debug, warn};
use wasm_bindgen::prelude::*;
use web_sys::{
	CanvasRenderingContext2d, HtmlAnchorElement, HtmlCanvasElement, HtmlElement, MouseEvent,
	WheelEvent,
};

use super::render;
use super::state::{DiagramState, TAP_SLOP, ZOOM_IN_STEP, ZOOM_OUT_STEP};
use crate::diagram::storage::PositionStore;
use crate::diagram::{DiagramSettings, Explorer, GraphData, Group, MenuAction, Point, Size, api};

type SharedState = Rc<RefCell<Option<DiagramState>>>;

fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Positions the menu element from the explorer's menu state.
fn sync_menu(state: &DiagramState, menu: &HtmlElement, canvas: &HtmlCanvasElement) {
	let style = menu.style();
	match state.explorer.menu().anchor() {
		Some(anchor) => {
			let rect = canvas.get_bounding_client_rect();
			let _ = style.set_property("left", &format!("{}px", rect.left() + anchor.x));
			let _ = style.set_property("top", &format!("{}px", rect.top() + anchor.y));
			let _ = style.set_property("display", "block");
			let _ = style.set_property("visibility", "visible");
		}
		None => {
			let _ = style.set_property("display", "none");
		}
	}
}

/// Shows the menu invisibly so it can be measured before it is placed.
fn measure_menu(menu: &HtmlElement) -> Size {
	let style = menu.style();
	let _ = style.set_property("display", "block");
	let _ = style.set_property("visibility", "hidden");
	Size::new(menu.offset_width() as f64, menu.offset_height() as f64)
}

fn save_positions(state: &DiagramState, store: &Option<PositionStore>) {
	if let Some(store) = store {
		if let Err(err) = store.save(&state.positions()) {
			warn!("saving positions: {err}");
		}
	}
}

fn navigate(url: &str) {
	if let Some(window) = web_sys::window() {
		if let Err(err) = window.location().set_href(url) {
			warn!("navigation to {url} failed: {err:?}");
		}
	}
}

fn export_png(canvas: &HtmlCanvasElement) -> Result<(), JsValue> {
	let url = canvas.to_data_url()?;
	let document = web_sys::window()
		.and_then(|w| w.document())
		.ok_or_else(|| JsValue::from_str("no document"))?;
	let link: HtmlAnchorElement = document.create_element("a")?.dyn_into()?;
	link.set_download("diagram.png");
	link.set_href(&url);
	link.click();
	Ok(())
}

#[component]
pub fn DiagramCanvas(
	data: GraphData,
	#[prop(optional)] settings: DiagramSettings,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let menu_ref = NodeRef::<leptos::html::Div>::new();
	let state: SharedState = Rc::new(RefCell::new(None));
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (state_init, animate_init, resize_cb_init) =
		(state.clone(), animate.clone(), resize_cb.clone());

	let store: Rc<Option<PositionStore>> = Rc::new(if settings.enable_save {
		PositionStore::open()
			.map_err(|err| warn!("position storage disabled: {err}"))
			.ok()
	} else {
		None
	});
	let store_init = store.clone();
	let enable_save = settings.enable_save;
	let endpoint = settings.expand_endpoint.clone();

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let Some(window) = web_sys::window() else {
			return;
		};

		let (w, h) = if fullscreen {
			(
				window.inner_width().ok().and_then(|v| v.as_f64()).unwrap_or(800.0),
				window.inner_height().ok().and_then(|v| v.as_f64()).unwrap_or(600.0),
			)
		} else {
			(
				width.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_width() as f64)
						.unwrap_or(800.0)
				}),
				height.unwrap_or_else(|| {
					canvas
						.parent_element()
						.map(|p| p.client_height() as f64)
						.unwrap_or(600.0)
				}),
			)
		};
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);

		let ctx: CanvasRenderingContext2d = match canvas
			.get_context("2d")
			.ok()
			.flatten()
			.and_then(|c| c.dyn_into().ok())
		{
			Some(ctx) => ctx,
			None => {
				warn!("canvas 2d context unavailable");
				return;
			}
		};

		let mut diagram = DiagramState::new(Explorer::new(data.clone()), w, h);
		if let Some(store) = store_init.as_ref() {
			match store.load() {
				Ok(saved) => diagram.apply_positions(&saved),
				Err(err) => warn!("ignoring saved positions: {err}"),
			}
		}
		debug!("diagram ready with {} elements", diagram.explorer.graph().len());
		*state_init.borrow_mut() = Some(diagram);

		if fullscreen {
			let (state_resize, canvas_resize) = (state_init.clone(), canvas.clone());
			*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
				let Some(win) = web_sys::window() else {
					return;
				};
				let (Some(nw), Some(nh)) = (
					win.inner_width().ok().and_then(|v| v.as_f64()),
					win.inner_height().ok().and_then(|v| v.as_f64()),
				) else {
					return;
				};
				canvas_resize.set_width(nw as u32);
				canvas_resize.set_height(nh as u32);
				if let Some(ref mut s) = *state_resize.borrow_mut() {
					s.resize(nw, nh);
				}
			}));
			if let Some(ref cb) = *resize_cb_init.borrow() {
				let _ =
					window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
			}
		}

		let (state_anim, animate_inner) = (state_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if let Some(ref mut s) = *state_anim.borrow_mut() {
				if s.animation_running {
					s.tick(0.016);
				}
				render::render(s, &ctx);
			}
			if let (Some(cb), Some(win)) = (&*animate_inner.borrow(), web_sys::window()) {
				let _ = win.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let refresh_menu = move |s: &DiagramState| {
		if let (Some(menu), Some(canvas)) = (menu_ref.get(), canvas_ref.get()) {
			sync_menu(s, &menu, &canvas);
		}
	};

	let state_md = state.clone();
	let on_mousedown = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);

		if let Some(ref mut s) = *state_md.borrow_mut() {
			if let Some(idx) = s.node_at_position(x, y) {
				s.drag.active = true;
				s.drag.moved = false;
				s.drag.node_idx = Some(idx);
				s.drag.start_x = x;
				s.drag.start_y = y;
				s.graph.visit_nodes(|node| {
					if node.index() == idx {
						s.drag.node_start_x = node.x();
						s.drag.node_start_y = node.y();
					}
				});
			} else {
				s.pan.active = true;
				s.pan.moved = false;
				s.pan.start_x = x;
				s.pan.start_y = y;
				s.pan.transform_start_x = s.transform.x;
				s.pan.transform_start_y = s.transform.y;
			}
		}
	};

	let state_mm = state.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);

		if let Some(ref mut s) = *state_mm.borrow_mut() {
			// Update hover state when not dragging
			if !s.drag.active {
				let hovered = s.node_at_position(x, y);
				s.set_hover(hovered);
			}

			if s.drag.active {
				if (x - s.drag.start_x).hypot(y - s.drag.start_y) > TAP_SLOP {
					s.drag.moved = true;
				}
				if let (Some(idx), true) = (s.drag.node_idx, s.drag.moved) {
					let (dx, dy) = (
						(x - s.drag.start_x) / s.transform.k,
						(y - s.drag.start_y) / s.transform.k,
					);
					let (nx, ny) = (
						s.drag.node_start_x + dx as f32,
						s.drag.node_start_y + dy as f32,
					);
					s.graph.visit_nodes_mut(|node| {
						if node.index() == idx {
							node.data.x = nx;
							node.data.y = ny;
							node.data.is_anchor = true;
						}
					});
				}
			} else if s.pan.active {
				if !s.pan.moved && (x - s.pan.start_x).hypot(y - s.pan.start_y) > TAP_SLOP {
					s.pan.moved = true;
					s.explorer.dismiss_menu();
					refresh_menu(s);
				}
				if s.pan.moved {
					s.transform.x = s.pan.transform_start_x + (x - s.pan.start_x);
					s.transform.y = s.pan.transform_start_y + (y - s.pan.start_y);
				}
			}
		}
	};

	let (state_mu, store_mu) = (state.clone(), store.clone());
	let on_mouseup = move |ev: MouseEvent| {
		if ev.button() != 0 {
			return;
		}
		let mut target = None;
		if let Some(ref mut s) = *state_mu.borrow_mut() {
			let tapped = (s.drag.active && !s.drag.moved) || (s.pan.active && !s.pan.moved);
			if enable_save && s.drag.active && s.drag.moved {
				save_positions(s, &store_mu);
			}
			if tapped {
				s.explorer.dismiss_menu();
				refresh_menu(s);
				if s.drag.active {
					target = s
						.drag
						.node_idx
						.and_then(|idx| s.node_id(idx))
						.and_then(|id| s.explorer.navigation_target(id));
				}
			}
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
		}
		if let Some(url) = target {
			navigate(&url);
		}
	};

	let state_ml = state.clone();
	let on_mouseleave = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_ml.borrow_mut() {
			s.drag.active = false;
			s.drag.node_idx = None;
			s.pan.active = false;
			s.set_hover(None);
		}
	};

	let state_wh = state.clone();
	let on_wheel = move |ev: WheelEvent| {
		ev.prevent_default();
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);

		if let Some(ref mut s) = *state_wh.borrow_mut() {
			let factor = if ev.delta_y() > 0.0 { 0.9 } else { 1.1 };
			s.zoom_at(factor, x, y);
			if s.explorer.menu().is_open() {
				s.explorer.dismiss_menu();
				refresh_menu(s);
			}
		}
	};

	let state_cm = state.clone();
	let on_contextmenu = move |ev: MouseEvent| {
		ev.prevent_default();
		let (Some(canvas), Some(menu)) = (canvas_ref.get(), menu_ref.get()) else {
			return;
		};
		let (x, y) = local_point(&canvas, &ev);

		if let Some(ref mut s) = *state_cm.borrow_mut() {
			let target = s
				.node_at_position(x, y)
				.and_then(|idx| s.node_id(idx))
				.map(str::to_string);
			match target {
				Some(id) => {
					let rect = canvas.get_bounding_client_rect();
					let menu_size = measure_menu(&menu);
					s.explorer.open_menu(
						&id,
						Point::new(x, y),
						Size::new(rect.width(), rect.height()),
						menu_size,
					);
				}
				None => s.explorer.dismiss_menu(),
			}
			sync_menu(s, &menu, &canvas);
		}
	};

	let state_act = state.clone();
	let on_action = Rc::new(move |action: MenuAction| {
		let request = match *state_act.borrow_mut() {
			Some(ref mut s) => {
				let request = s.explorer.dispatch(action);
				s.refresh_hover();
				refresh_menu(s);
				request
			}
			None => None,
		};
		let Some(request) = request else {
			return;
		};
		let (state_fetch, endpoint) = (state_act.clone(), endpoint.clone());
		wasm_bindgen_futures::spawn_local(async move {
			let fetched = api::fetch_neighborhood(&request, &endpoint).await;
			if let Some(ref mut s) = *state_fetch.borrow_mut() {
				let outcome = s.explorer.complete_expand(&request, fetched);
				s.sync_layout(&outcome.merged.added, Some(&request.id));
				if !outcome.merged.added.is_empty() || !outcome.revealed.is_empty() {
					s.refresh_hover();
				}
				refresh_menu(s);
			}
		});
	});
	let (on_expand, on_hide) = (on_action.clone(), on_action);

	let toggles = Group::ALL
		.into_iter()
		.map(|group| {
			let state_tg = state.clone();
			let on_change = move |ev: web_sys::Event| {
				let enabled = event_target_checked(&ev);
				if let Some(ref mut s) = *state_tg.borrow_mut() {
					let changed = s.explorer.set_group_enabled(group, enabled);
					debug!("{group} toggled to {enabled}: {} elements changed", changed.len());
					if !changed.is_empty() {
						s.refresh_hover();
					}
				}
			};
			view! {
				<label class="group-toggle">
					<input
						type="checkbox"
						id=format!("toggle-{}", group.label().to_lowercase())
						prop:checked=true
						on:change=on_change
					/>
					{group.label()}
				</label>
			}
		})
		.collect_view();

	let state_fit = state.clone();
	let on_fit = move |_: MouseEvent| {
		if let Some(ref mut s) = *state_fit.borrow_mut() {
			s.fit_view();
			s.explorer.dismiss_menu();
			refresh_menu(s);
		}
	};
	let zoom_button = {
		let state = state.clone();
		move |factor: f64| {
			let state = state.clone();
			move |_: MouseEvent| {
				if let Some(ref mut s) = *state.borrow_mut() {
					s.zoom_by(factor);
					s.explorer.dismiss_menu();
					refresh_menu(s);
				}
			}
		}
	};
	let (on_zoom_in, on_zoom_out) = (zoom_button(ZOOM_IN_STEP), zoom_button(ZOOM_OUT_STEP));
	let on_export = move |_: MouseEvent| {
		if let Some(canvas) = canvas_ref.get() {
			if let Err(err) = export_png(&canvas) {
				warn!("PNG export failed: {err:?}");
			}
		}
	};
	let (state_reset, store_reset) = (state.clone(), store.clone());
	let on_reset = move |_: MouseEvent| {
		if let Some(store) = &*store_reset {
			if let Err(err) = store.clear() {
				warn!("clearing positions: {err}");
			}
		}
		if let Some(ref mut s) = *state_reset.borrow_mut() {
			s.release_anchors();
		}
	};

	view! {
		<div class="diagram">
			<canvas
				node_ref=canvas_ref
				class="diagram-canvas"
				on:mousedown=on_mousedown
				on:mousemove=on_mousemove
				on:mouseup=on_mouseup
				on:mouseleave=on_mouseleave
				on:wheel=on_wheel
				on:contextmenu=on_contextmenu
				style="display: block; cursor: grab;"
			/>
			<div class="controls">
				<button on:click=on_fit>"Fit to View"</button>
				<button on:click=on_zoom_in>"Zoom In"</button>
				<button on:click=on_zoom_out>"Zoom Out"</button>
				{enable_save.then(|| view! { <button on:click=on_reset>"Reset Layout"</button> })}
				<button on:click=on_export>"Export PNG"</button>
			</div>
			<div class="group-toggles">{toggles}</div>
			<div
				node_ref=menu_ref
				class="diagram-context-menu"
				style="position: fixed; display: none; z-index: 10;"
			>
				<button
					data-action=MenuAction::Expand.as_str()
					on:click=move |_| on_expand(MenuAction::Expand)
				>
					"Expand"
				</button>
				<button
					data-action=MenuAction::Hide.as_str()
					on:click=move |_| on_hide(MenuAction::Hide)
				>
					"Hide"
				</button>
			</div>
		</div>
	}
}
