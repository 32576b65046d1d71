//! graph-weave: merge JSON graph fragments and explore them on a canvas.
//!
//! Fragments are validated, merged with deduplication, enriched with
//! centrality metrics and laid out with a force, circular or hierarchical
//! strategy. The browser app adds file upload, metric overlays, dragging and
//! hover tooltips on top of the DOM-free core in [`graph`] and
//! [`components::force_graph`].

use leptos::prelude::*;
use leptos::task::spawn_local;
use leptos_meta::*;
use log::{Level, info, warn};
use wasm_bindgen::JsCast;
use wasm_bindgen_futures::JsFuture;
use web_sys::{Event, HtmlInputElement, HtmlScriptElement, MouseEvent, Window};

pub mod components;
pub mod error;
pub mod graph;

pub use components::force_graph::{
	ForceGraphCanvas, GraphSession, LayoutMode, SharedSession, Viewport,
};
pub use error::{GraphError, ReadError, SchemaError};
pub use graph::{FragmentSource, Graph, MetricKey};

/// Initialize logging and panic hooks for the WASM target.
pub fn init_logging() {
	let _ = console_log::init_with_level(Level::Debug);
	console_error_panic_hook::set_once();
	info!("graph-weave: logging initialized");
}

/// Read every `<script data-graph-fragment="label">` element on the page.
fn load_page_fragments() -> Vec<FragmentSource> {
	let Some(document) = web_sys::window().and_then(|w: Window| w.document()) else {
		return Vec::new();
	};
	let Ok(list) = document.query_selector_all("script[data-graph-fragment]") else {
		return Vec::new();
	};

	let sources: Vec<FragmentSource> = (0..list.length())
		.filter_map(|i| {
			let script: HtmlScriptElement = list.get(i)?.dyn_into().ok()?;
			let label = script
				.get_attribute("data-graph-fragment")
				.filter(|l| !l.is_empty())
				.unwrap_or_else(|| format!("page fragment {}", i + 1));
			let content = script.text().map_err(|e| ReadError {
				label: label.clone(),
				message: js_error_message(&e),
			});
			Some(FragmentSource { label, content })
		})
		.collect();
	info!("graph-weave: found {} page fragment(s)", sources.len());
	sources
}

fn js_error_message(value: &wasm_bindgen::JsValue) -> String {
	value
		.dyn_ref::<js_sys::Error>()
		.map(|e| String::from(e.message()))
		.or_else(|| value.as_string())
		.unwrap_or_else(|| "unknown error".to_string())
}

/// Read every selected file together and load them as one batch.
fn load_files(input: HtmlInputElement, session: SharedSession, done: impl Fn() + 'static) {
	let Some(files) = input.files() else {
		return;
	};
	let reads: Vec<_> = (0..files.length())
		.filter_map(|i| files.get(i))
		.map(|file| {
			let label = file.name();
			let read = async move {
				JsFuture::from(file.text())
					.await
					.map(|v| v.as_string().unwrap_or_default())
					.map_err(|e| js_error_message(&e))
			};
			(label, read)
		})
		.collect();
	if reads.is_empty() {
		return;
	}

	spawn_local(async move {
		let sources = graph::read_batch(reads).await;
		if let Err(e) = session.borrow_mut().load_batch(sources) {
			warn!("graph-weave: upload rejected: {}", e);
		}
		input.set_value("");
		done();
	});
}

/// Main application component: controls, status line and the canvas.
#[component]
pub fn App() -> impl IntoView {
	provide_meta_context();

	let session = GraphSession::new(Viewport::default()).shared();
	let initial = load_page_fragments();
	if !initial.is_empty() {
		if let Err(e) = session.borrow_mut().load_batch(initial) {
			warn!("graph-weave: page fragments rejected: {}", e);
		}
	}

	let status = RwSignal::new(session.borrow().status().summary());
	let mode = RwSignal::new(session.borrow().layout().mode());
	let refresh = {
		let session = session.clone();
		move || status.set(session.borrow().status().summary())
	};

	let on_mode = {
		let (session, refresh) = (session.clone(), refresh.clone());
		move |ev: Event| {
			if let Some(m) = LayoutMode::parse(&event_target_value(&ev)) {
				session.borrow_mut().set_layout_mode(m);
				mode.set(m);
				refresh();
			}
		}
	};

	let on_strength = {
		let session = session.clone();
		move |ev: Event| {
			if let Ok(v) = event_target_value(&ev).parse::<f64>() {
				session.borrow_mut().set_force_strength(v);
			}
		}
	};

	let on_metric = {
		let session = session.clone();
		move |ev: Event| {
			if let Some(m) = MetricKey::parse(&event_target_value(&ev)) {
				session.borrow_mut().set_metric(m);
			}
		}
	};

	let on_threshold = {
		let session = session.clone();
		move |ev: Event| {
			if let Ok(v) = event_target_value(&ev).parse::<f64>() {
				session.borrow_mut().set_threshold_percent(v);
			}
		}
	};

	let on_color = {
		let session = session.clone();
		move |ev: Event| session.borrow_mut().set_color_by_metric(event_target_checked(&ev))
	};

	let on_size = {
		let session = session.clone();
		move |ev: Event| session.borrow_mut().set_size_by_metric(event_target_checked(&ev))
	};

	let on_files = {
		let (session, refresh) = (session.clone(), refresh.clone());
		move |ev: Event| {
			let Some(input) = ev
				.target()
				.and_then(|t| t.dyn_into::<HtmlInputElement>().ok())
			else {
				return;
			};
			load_files(input, session.clone(), refresh.clone());
		}
	};

	let on_clear = {
		let session = session.clone();
		move |_: MouseEvent| {
			session.borrow_mut().clear();
			refresh();
		}
	};

	let default_strength = session.borrow().layout().force_strength().to_string();

	view! {
		<Html attr:lang="en" attr:dir="ltr" attr:data-theme="dark" />
		<Title text="Graph Weave" />
		<Meta charset="UTF-8" />
		<Meta name="viewport" content="width=device-width, initial-scale=1.0" />

		<div class="fullscreen-graph">
			<ForceGraphCanvas session=session fullscreen=true />
			<div class="graph-overlay">
				<h1>"Graph Weave"</h1>
				<div class="controls">
					<label>
						"Layout "
						<select on:change=on_mode>
							{LayoutMode::ALL
								.into_iter()
								.map(|m| view! { <option value=m.as_str()>{m.label()}</option> })
								.collect_view()}
						</select>
					</label>
					<label>
						"Force strength "
						<input
							type="number"
							step="50"
							value=default_strength
							disabled=move || mode.get() != LayoutMode::Force
							on:input=on_strength
						/>
					</label>
					<label>
						"Metric "
						<select on:change=on_metric>
							{MetricKey::ALL
								.into_iter()
								.map(|m| view! { <option value=m.as_str()>{m.label()}</option> })
								.collect_view()}
						</select>
					</label>
					<label>
						"Threshold "
						<input type="range" min="0" max="100" value="0" on:input=on_threshold />
					</label>
					<label>
						<input type="checkbox" on:change=on_color />
						" Color by metric"
					</label>
					<label>
						<input type="checkbox" on:change=on_size />
						" Size by metric"
					</label>
					<input type="file" accept=".json,application/json" multiple=true on:change=on_files />
					<button on:click=on_clear>"Clear"</button>
				</div>
				<p class="status">{move || status.get()}</p>
				<p class="subtitle">"Drag nodes to reposition. Hover nodes and edges for details."</p>
			</div>
		</div>
	}
}
