//! Leptos component hosting the graph canvas.
//!
//! The component creates the canvas, forwards mouse events to the shared
//! [`GraphSession`](super::state::GraphSession) and drives it from a
//! `requestAnimationFrame` loop. A frame is only drawn when the session says
//! something changed, so a settled or static layout costs nothing per frame.

use std::cell::RefCell;
use std::rc::Rc;

use leptos::prelude::*;
use wasm_bindgen::prelude::*;
use web_sys::{CanvasRenderingContext2d, HtmlCanvasElement, MouseEvent, Window};

use super::layout::Viewport;
use super::render;
use super::state::SharedSession;
use super::theme::Theme;

/// Size the canvas should take: the window, explicit sizes, or the parent.
fn measure(
	canvas: &HtmlCanvasElement,
	fullscreen: bool,
	width: Option<f64>,
	height: Option<f64>,
) -> (f64, f64) {
	if fullscreen {
		let window: Window = web_sys::window().unwrap();
		return (
			window.inner_width().unwrap().as_f64().unwrap(),
			window.inner_height().unwrap().as_f64().unwrap(),
		);
	}
	let parent = canvas.parent_element();
	(
		width.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_width() as f64)
				.unwrap_or(800.0)
		}),
		height.unwrap_or_else(|| {
			parent
				.as_ref()
				.map(|p| p.client_height() as f64)
				.unwrap_or(600.0)
		}),
	)
}

/// Pointer position relative to the canvas.
fn local_point(canvas: &HtmlCanvasElement, ev: &MouseEvent) -> (f64, f64) {
	let rect = canvas.get_bounding_client_rect();
	(
		ev.client_x() as f64 - rect.left(),
		ev.client_y() as f64 - rect.top(),
	)
}

/// Renders the session's graph on a canvas and routes pointer input to it.
///
/// The canvas sizes itself to its parent by default; `fullscreen = true`
/// fills the window. Both follow window resizes. Explicit `width`/`height`
/// override automatic sizing.
#[component]
pub fn ForceGraphCanvas(
	session: SharedSession,
	#[prop(default = false)] fullscreen: bool,
	#[prop(default = None)] width: Option<f64>,
	#[prop(default = None)] height: Option<f64>,
) -> impl IntoView {
	let canvas_ref = NodeRef::<leptos::html::Canvas>::new();
	let animate: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let resize_cb: Rc<RefCell<Option<Closure<dyn FnMut()>>>> = Rc::new(RefCell::new(None));
	let (session_init, animate_init, resize_cb_init) =
		(session.clone(), animate.clone(), resize_cb.clone());

	Effect::new(move |_| {
		let Some(canvas) = canvas_ref.get() else {
			return;
		};
		let canvas: HtmlCanvasElement = canvas.into();
		let window: Window = web_sys::window().unwrap();

		let (w, h) = measure(&canvas, fullscreen, width, height);
		canvas.set_width(w as u32);
		canvas.set_height(h as u32);
		session_init.borrow_mut().resize(Viewport::new(w, h));

		let ctx: CanvasRenderingContext2d = canvas
			.get_context("2d")
			.unwrap()
			.unwrap()
			.dyn_into()
			.unwrap();

		let (session_resize, canvas_resize) = (session_init.clone(), canvas.clone());
		*resize_cb_init.borrow_mut() = Some(Closure::new(move || {
			let (nw, nh) = measure(&canvas_resize, fullscreen, width, height);
			canvas_resize.set_width(nw as u32);
			canvas_resize.set_height(nh as u32);
			session_resize.borrow_mut().resize(Viewport::new(nw, nh));
		}));
		if let Some(ref cb) = *resize_cb_init.borrow() {
			let _ = window.add_event_listener_with_callback("resize", cb.as_ref().unchecked_ref());
		}

		let theme = Theme::default();
		let (session_anim, animate_inner) = (session_init.clone(), animate_init.clone());
		*animate_init.borrow_mut() = Some(Closure::new(move || {
			if session_anim.borrow_mut().tick() {
				let frame = session_anim.borrow().frame();
				render::render(&frame, &ctx, &theme);
			}
			if let Some(ref cb) = *animate_inner.borrow() {
				let _ = web_sys::window()
					.unwrap()
					.request_animation_frame(cb.as_ref().unchecked_ref());
			}
		}));
		if let Some(ref cb) = *animate_init.borrow() {
			let _ = window.request_animation_frame(cb.as_ref().unchecked_ref());
		}
	});

	let set_cursor = move |cursor: &str| {
		if let Some(canvas) = canvas_ref.get() {
			let canvas: HtmlCanvasElement = canvas.into();
			let _ = web_sys::HtmlElement::style(&canvas).set_property("cursor", cursor);
		}
	};

	let session_md = session.clone();
	let on_mousedown = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let (x, y) = local_point(&canvas, &ev);
		if session_md.borrow_mut().pointer_down(x, y) {
			set_cursor("grabbing");
		}
	};

	let session_mm = session.clone();
	let on_mousemove = move |ev: MouseEvent| {
		let canvas: HtmlCanvasElement = canvas_ref.get().unwrap().into();
		let (x, y) = local_point(&canvas, &ev);
		let mut s = session_mm.borrow_mut();
		s.pointer_move(x, y);
		if !s.is_dragging() {
			let over_node = s.node_at(x, y).is_some();
			set_cursor(if over_node { "grab" } else { "default" });
		}
	};

	let session_mu = session.clone();
	let on_mouseup = move |_: MouseEvent| {
		session_mu.borrow_mut().pointer_up();
		set_cursor("grab");
	};

	let session_ml = session;
	let on_mouseleave = move |_: MouseEvent| {
		session_ml.borrow_mut().pointer_leave();
		set_cursor("default");
	};

	view! {
		<canvas
			node_ref=canvas_ref
			class="graph-canvas"
			on:mousedown=on_mousedown
			on:mousemove=on_mousemove
			on:mouseup=on_mouseup
			on:mouseleave=on_mouseleave
			style="display: block;"
		/>
	}
}
