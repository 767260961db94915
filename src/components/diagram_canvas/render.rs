use std::f64::consts::PI;

use wasm_bindgen::JsValue;
use web_sys::CanvasRenderingContext2d;

use super::state::{DiagramState, EdgeInfo, LineStyle, NODE_HEIGHT, NODE_WIDTH, NodeInfo, NodeShape};

const BACKGROUND: &str = "#1a1a2e";
const LABEL_MAX_WIDTH: f64 = 90.0;
const LABEL_LINE_HEIGHT: f64 = 12.0;

fn ease_out_cubic(t: f64) -> f64 {
	1.0 - (1.0 - t).powi(3)
}

pub fn render(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	ctx.set_fill_style_str(BACKGROUND);
	ctx.fill_rect(0.0, 0.0, state.width, state.height);
	ctx.save();
	let _ = ctx.translate(state.transform.x, state.transform.y);
	let _ = ctx.scale(state.transform.k, state.transform.k);
	draw_edges(state, ctx);
	draw_nodes(state, ctx);
	ctx.restore();
}

/// Distance from a box center to its border along the unit vector `(ux, uy)`.
fn box_exit(ux: f64, uy: f64) -> f64 {
	let tx = if ux.abs() > 1e-9 { (NODE_WIDTH / 2.0) / ux.abs() } else { f64::INFINITY };
	let ty = if uy.abs() > 1e-9 { (NODE_HEIGHT / 2.0) / uy.abs() } else { f64::INFINITY };
	tx.min(ty)
}

fn set_dash(ctx: &CanvasRenderingContext2d, style: LineStyle) {
	let pattern = match style {
		LineStyle::Solid => js_sys::Array::new(),
		LineStyle::Dashed => js_sys::Array::of2(&JsValue::from_f64(5.0), &JsValue::from_f64(5.0)),
		LineStyle::Dotted => js_sys::Array::of2(&JsValue::from_f64(1.5), &JsValue::from_f64(3.0)),
	};
	let _ = ctx.set_line_dash(&pattern);
}

fn draw_edges(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let t = ease_out_cubic(state.hover.highlight_t);
	let has_highlight = state.has_active_highlight();

	state.graph.visit_edges(|n1, n2, edge| {
		let info: &EdgeInfo = &edge.user_data;
		if !state.is_displayed(&info.id) {
			return;
		}
		let (x1, y1, x2, y2) = (n1.x() as f64, n1.y() as f64, n2.x() as f64, n2.y() as f64);
		let (dx, dy) = (x2 - x1, y2 - y1);
		let dist = (dx * dx + dy * dy).sqrt();
		if dist < 0.001 {
			return;
		}

		let is_highlighted = state.is_highlighted(n1.index()) && state.is_highlighted(n2.index());
		let alpha = match (has_highlight, is_highlighted) {
			(false, _) => 1.0,
			(true, true) => 1.0,
			(true, false) => 1.0 - 0.7 * t,
		};
		let arrow_size = 6.0 + info.width * 2.0;

		let (ux, uy) = (dx / dist, dy / dist);
		let exit = box_exit(ux, uy);
		if dist <= 2.0 * exit {
			return;
		}
		let (sx, sy) = (x1 + ux * exit, y1 + uy * exit);
		let (tip_x, tip_y) = (x2 - ux * exit, y2 - uy * exit);
		let line_end = if info.arrow { arrow_size } else { 0.0 };

		ctx.set_global_alpha(alpha);
		ctx.set_stroke_style_str(&info.color);
		ctx.set_line_width(if is_highlighted && has_highlight {
			info.width * (1.0 + 0.3 * t)
		} else {
			info.width
		});
		set_dash(ctx, info.style);
		ctx.begin_path();
		ctx.move_to(sx, sy);
		ctx.line_to(tip_x - ux * line_end, tip_y - uy * line_end);
		ctx.stroke();
		let _ = ctx.set_line_dash(&js_sys::Array::new());

		if info.arrow {
			ctx.set_fill_style_str(&info.color);
			let (back_x, back_y) = (tip_x - ux * arrow_size, tip_y - uy * arrow_size);
			let (px, py) = (-uy * arrow_size * 0.5, ux * arrow_size * 0.5);
			ctx.begin_path();
			ctx.move_to(tip_x, tip_y);
			ctx.line_to(back_x + px, back_y + py);
			ctx.line_to(back_x - px, back_y - py);
			ctx.close_path();
			ctx.fill();
		}

		if !info.label.is_empty() {
			ctx.set_fill_style_str("#dddddd");
			ctx.set_font("9px sans-serif");
			ctx.set_text_align("center");
			let _ = ctx.fill_text(&info.label, (sx + tip_x) / 2.0, (sy + tip_y) / 2.0 - 6.0);
		}
		ctx.set_global_alpha(1.0);
	});
	let _ = ctx.set_line_dash(&js_sys::Array::new());
}

fn shape_path(ctx: &CanvasRenderingContext2d, shape: NodeShape, x: f64, y: f64, scale: f64) {
	let (w, h) = (NODE_WIDTH * scale, NODE_HEIGHT * scale);
	let (left, top) = (x - w / 2.0, y - h / 2.0);
	ctx.begin_path();
	match shape {
		NodeShape::Rectangle => ctx.rect(left, top, w, h),
		NodeShape::RoundRectangle => {
			let r = 10.0 * scale;
			ctx.move_to(left + r, top);
			let _ = ctx.arc_to(left + w, top, left + w, top + h, r);
			let _ = ctx.arc_to(left + w, top + h, left, top + h, r);
			let _ = ctx.arc_to(left, top + h, left, top, r);
			let _ = ctx.arc_to(left, top, left + w, top, r);
			ctx.close_path();
		}
		NodeShape::Ellipse => {
			let _ = ctx.ellipse(x, y, w / 2.0, h / 2.0, 0.0, 0.0, 2.0 * PI);
		}
		NodeShape::Diamond => {
			ctx.move_to(x, top);
			ctx.line_to(left + w, y);
			ctx.line_to(x, top + h);
			ctx.line_to(left, y);
			ctx.close_path();
		}
	}
}

/// Greedy word wrap against the current font.
fn wrap_label(ctx: &CanvasRenderingContext2d, label: &str) -> Vec<String> {
	let fits = |s: &str| {
		ctx.measure_text(s)
			.map(|m| m.width() <= LABEL_MAX_WIDTH)
			.unwrap_or(true)
	};
	let mut lines: Vec<String> = Vec::new();
	let mut current = String::new();
	for word in label.split_whitespace() {
		let candidate = if current.is_empty() {
			word.to_string()
		} else {
			format!("{current} {word}")
		};
		if fits(&candidate) || current.is_empty() {
			current = candidate;
		} else {
			lines.push(std::mem::replace(&mut current, word.to_string()));
		}
	}
	if !current.is_empty() {
		lines.push(current);
	}
	lines
}

fn draw_node(ctx: &CanvasRenderingContext2d, info: &NodeInfo, x: f64, y: f64, scale: f64) {
	shape_path(ctx, info.shape, x, y, scale);
	ctx.set_fill_style_str(&info.color);
	ctx.fill();
	ctx.set_stroke_style_str("#333333");
	ctx.set_line_width(2.0);
	ctx.stroke();

	ctx.set_fill_style_str("#111111");
	ctx.set_font("10px Segoe UI, Tahoma, Geneva, Verdana, sans-serif");
	ctx.set_text_align("center");
	ctx.set_text_baseline("middle");
	let lines = wrap_label(ctx, &info.label);
	let first = y - (lines.len().saturating_sub(1) as f64) * LABEL_LINE_HEIGHT / 2.0;
	for (i, line) in lines.iter().enumerate() {
		let _ = ctx.fill_text(line, x, first + i as f64 * LABEL_LINE_HEIGHT);
	}
	ctx.set_text_baseline("alphabetic");
}

fn draw_nodes(state: &DiagramState, ctx: &CanvasRenderingContext2d) {
	let (has_highlight, t, k) = (
		state.has_active_highlight(),
		ease_out_cubic(state.hover.highlight_t),
		state.transform.k,
	);

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let info = &node.data.user_data;
		if !state.is_displayed(&info.id) || (has_highlight && state.is_highlighted(idx)) {
			return;
		}
		let alpha = if has_highlight { 1.0 - 0.7 * t } else { 1.0 };
		ctx.set_global_alpha(alpha);
		draw_node(ctx, info, node.x() as f64, node.y() as f64, 1.0);
		ctx.set_global_alpha(1.0);
	});

	if !has_highlight {
		return;
	}

	state.graph.visit_nodes(|node| {
		let idx = node.index();
		let info = &node.data.user_data;
		if !state.is_displayed(&info.id) || !state.is_highlighted(idx) {
			return;
		}
		let (x, y) = (node.x() as f64, node.y() as f64);
		let is_hovered = state.is_hovered(idx);
		let scale = if is_hovered { 1.0 + 0.08 * t } else { 1.0 };

		if is_hovered && t > 0.01 {
			let glow = NODE_WIDTH * (0.7 + 0.3 * t);
			if let Ok(gradient) = ctx.create_radial_gradient(x, y, NODE_HEIGHT * 0.3, x, y, glow) {
				let _ = gradient.add_color_stop(0.0, &format!("rgba(255, 255, 255, {})", 0.35 * t));
				let _ = gradient.add_color_stop(1.0, "rgba(255, 255, 255, 0)");
				ctx.begin_path();
				let _ = ctx.arc(x, y, glow, 0.0, 2.0 * PI);
				#[allow(deprecated)]
				ctx.set_fill_style(&gradient);
				ctx.fill();
			}
		}

		draw_node(ctx, info, x, y, scale);

		if is_hovered && t > 0.01 {
			shape_path(ctx, info.shape, x, y, scale + 4.0 / (NODE_WIDTH * k));
			ctx.set_stroke_style_str(&format!("rgba(255, 255, 255, {})", 0.7 * t));
			ctx.set_line_width(1.5 / k);
			ctx.stroke();
		}
	});
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn box_exit_hits_the_nearest_side() {
		assert_eq!(box_exit(1.0, 0.0), NODE_WIDTH / 2.0);
		assert_eq!(box_exit(0.0, -1.0), NODE_HEIGHT / 2.0);
		let d = std::f64::consts::FRAC_1_SQRT_2;
		assert!((box_exit(d, d) - (NODE_HEIGHT / 2.0) / d).abs() < 1e-9);
	}
}
