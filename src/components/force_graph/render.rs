//! Canvas rendering of a [`Frame`].
//!
//! Draw order: background, edges (line, arrowhead, relation label), nodes
//! (disc, hover ring, name), then the tooltip on top in screen space.
//! Dimmed items are drawn with the theme's reduced global alpha.

use std::f64::consts::PI;

use web_sys::CanvasRenderingContext2d;

use super::state::{EdgeDrawSpec, Frame, NodeDrawSpec, Tooltip};
use super::theme::Theme;

const ARROW_SIZE: f64 = 9.0;
const TOOLTIP_PADDING: f64 = 8.0;
const TOOLTIP_LINE_HEIGHT: f64 = 16.0;

/// Draw a whole frame.
pub fn render(frame: &Frame, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	draw_background(frame, ctx, theme);

	for edge in &frame.edges {
		draw_edge(ctx, theme, edge);
	}
	for node in &frame.nodes {
		draw_node(ctx, theme, node);
	}
	if let Some(tooltip) = &frame.tooltip {
		draw_tooltip(frame, ctx, theme, tooltip);
	}
	ctx.set_global_alpha(1.0);
}

fn draw_background(frame: &Frame, ctx: &CanvasRenderingContext2d, theme: &Theme) {
	let (w, h) = (frame.viewport.width, frame.viewport.height);
	match ctx.create_radial_gradient(w / 2.0, h / 2.0, 0.0, w / 2.0, h / 2.0, w.max(h) * 0.8) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &theme.background_glow.to_css());
			let _ = gradient.add_color_stop(1.0, &theme.background.to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&theme.background.to_css()),
	}
	ctx.fill_rect(0.0, 0.0, w, h);
}

fn alpha_for(theme: &Theme, dimmed: bool) -> f64 {
	if dimmed { theme.dimmed_alpha } else { 1.0 }
}

fn draw_edge(ctx: &CanvasRenderingContext2d, theme: &Theme, edge: &EdgeDrawSpec) {
	let ((x1, y1), (x2, y2)) = (edge.source, edge.target);
	let (dx, dy) = (x2 - x1, y2 - y1);
	let dist = (dx * dx + dy * dy).sqrt();
	if dist < 0.001 {
		return;
	}
	let (ux, uy) = (dx / dist, dy / dist);
	let color = if edge.hovered {
		theme.edge.lighten(0.4).with_alpha(1.0)
	} else {
		theme.edge
	};

	ctx.set_global_alpha(alpha_for(theme, edge.dimmed));
	ctx.set_stroke_style_str(&color.to_css());
	ctx.set_line_width(if edge.hovered { 2.5 } else { 1.5 });

	let (tip_x, tip_y) = (x2 - ux * edge.target_radius, y2 - uy * edge.target_radius);
	let (back_x, back_y) = (tip_x - ux * ARROW_SIZE, tip_y - uy * ARROW_SIZE);

	ctx.begin_path();
	ctx.move_to(x1, y1);
	ctx.line_to(back_x, back_y);
	ctx.stroke();

	let (px, py) = (-uy * ARROW_SIZE * 0.5, ux * ARROW_SIZE * 0.5);
	ctx.set_fill_style_str(&color.to_css());
	ctx.begin_path();
	ctx.move_to(tip_x, tip_y);
	ctx.line_to(back_x + px, back_y + py);
	ctx.line_to(back_x - px, back_y - py);
	ctx.close_path();
	ctx.fill();

	if !edge.label.is_empty() {
		ctx.set_font(theme.edge_label_font);
		ctx.set_text_align("center");
		ctx.set_fill_style_str(&theme.edge_label.to_css());
		let _ = ctx.fill_text(&edge.label, (x1 + x2) / 2.0, (y1 + y2) / 2.0 - 4.0);
		ctx.set_text_align("start");
	}
}

fn draw_node(ctx: &CanvasRenderingContext2d, theme: &Theme, node: &NodeDrawSpec) {
	let (x, y, radius) = (node.x, node.y, node.radius);
	ctx.set_global_alpha(alpha_for(theme, node.dimmed));

	ctx.begin_path();
	let _ = ctx.arc(x, y, radius, 0.0, 2.0 * PI);
	match ctx.create_radial_gradient(x - radius * 0.3, y - radius * 0.3, 0.0, x, y, radius) {
		Ok(gradient) => {
			let _ = gradient.add_color_stop(0.0, &node.fill.lighten(0.4).to_css());
			let _ = gradient.add_color_stop(0.7, &node.fill.to_css());
			let _ = gradient.add_color_stop(1.0, &node.fill.darken(0.2).to_css());
			#[allow(deprecated)]
			ctx.set_fill_style(&gradient);
		}
		Err(_) => ctx.set_fill_style_str(&node.fill.to_css()),
	}
	ctx.fill();

	if node.hovered {
		ctx.begin_path();
		let _ = ctx.arc(x, y, radius + 3.0, 0.0, 2.0 * PI);
		ctx.set_stroke_style_str("rgba(255, 255, 255, 0.8)");
		ctx.set_line_width(2.0);
		ctx.stroke();
	}

	ctx.set_font(theme.label_font);
	ctx.set_fill_style_str(&theme.node_label.to_css());
	let _ = ctx.fill_text(&node.label, x + radius + 4.0, y + 4.0);
}

fn draw_tooltip(frame: &Frame, ctx: &CanvasRenderingContext2d, theme: &Theme, tooltip: &Tooltip) {
	if tooltip.lines.is_empty() {
		return;
	}
	ctx.set_global_alpha(1.0);
	ctx.set_font(theme.tooltip_font);

	let text_width = tooltip
		.lines
		.iter()
		.filter_map(|line| ctx.measure_text(line).ok())
		.map(|m| m.width())
		.fold(0.0, f64::max);
	let width = text_width + TOOLTIP_PADDING * 2.0;
	let height = tooltip.lines.len() as f64 * TOOLTIP_LINE_HEIGHT + TOOLTIP_PADDING * 2.0;

	// Keep the box on screen, flipping to the other side of the pointer.
	let mut bx = tooltip.x + 14.0;
	let mut by = tooltip.y + 14.0;
	if bx + width > frame.viewport.width {
		bx = (tooltip.x - 14.0 - width).max(0.0);
	}
	if by + height > frame.viewport.height {
		by = (tooltip.y - 14.0 - height).max(0.0);
	}

	ctx.set_fill_style_str(&theme.tooltip_background.to_css());
	ctx.fill_rect(bx, by, width, height);
	ctx.set_stroke_style_str(&theme.tooltip_border.to_css());
	ctx.set_line_width(1.0);
	ctx.stroke_rect(bx, by, width, height);

	ctx.set_fill_style_str(&theme.tooltip_text.to_css());
	for (i, line) in tooltip.lines.iter().enumerate() {
		let _ = ctx.fill_text(
			line,
			bx + TOOLTIP_PADDING,
			by + TOOLTIP_PADDING + (i as f64 + 0.75) * TOOLTIP_LINE_HEIGHT,
		);
	}
}
