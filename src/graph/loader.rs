//! Turning a batch of file reads into validated fragments.
//!
//! Reads for one user action are awaited together; nothing is parsed until
//! every read has finished. Parsing then stops at the first bad file, so a
//! batch either yields every fragment or an error naming the culprit.

use std::future::Future;

use futures::future::join_all;
use log::{info, warn};
use serde_json::Value;

use super::types::Graph;
use super::validate::validate;
use crate::error::{GraphError, ReadError};

/// Outcome of reading one file of a batch.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FragmentSource {
	/// File name shown in error messages.
	pub label: String,
	/// File text, or why it could not be read.
	pub content: Result<String, ReadError>,
}

impl FragmentSource {
	/// A successfully read document.
	pub fn text(label: impl Into<String>, content: impl Into<String>) -> Self {
		Self {
			label: label.into(),
			content: Ok(content.into()),
		}
	}
}

/// Await every read of a batch. Completes once all reads completed or failed.
pub async fn read_batch<I, F>(reads: I) -> Vec<FragmentSource>
where
	I: IntoIterator<Item = (String, F)>,
	F: Future<Output = Result<String, String>>,
{
	let (labels, pending): (Vec<String>, Vec<F>) = reads.into_iter().unzip();
	let results = join_all(pending).await;
	labels
		.into_iter()
		.zip(results)
		.map(|(label, result)| FragmentSource {
			content: result.map_err(|message| ReadError {
				label: label.clone(),
				message,
			}),
			label,
		})
		.collect()
}

/// Parse and validate one document.
pub fn parse_fragment(label: &str, text: &str) -> Result<Graph, GraphError> {
	let value: Value = serde_json::from_str(text).map_err(|source| GraphError::Parse {
		label: label.to_string(),
		source,
	})?;
	Ok(validate(&value, label)?)
}

/// Parse a whole batch, all or nothing.
pub fn parse_batch(sources: Vec<FragmentSource>) -> Result<Vec<Graph>, GraphError> {
	let count = sources.len();
	let fragments = sources
		.into_iter()
		.map(|source| {
			let text = source.content?;
			parse_fragment(&source.label, &text)
		})
		.collect::<Result<Vec<_>, _>>()
		.inspect_err(|e| warn!("graph-weave: batch rejected: {}", e))?;
	info!("graph-weave: parsed {} fragment(s)", count);
	Ok(fragments)
}

#[cfg(test)]
mod tests {
	use futures::executor::block_on;
	use futures::future::{BoxFuture, FutureExt, ready};

	use super::*;
	use crate::error::SchemaError;

	#[test]
	fn test_read_batch_waits_for_all_reads() {
		let reads: Vec<(String, BoxFuture<'static, Result<String, String>>)> = vec![
			("a.json".into(), ready(Ok("{}".to_string())).boxed()),
			(
				"b.json".into(),
				async { Err::<String, _>("permission denied".to_string()) }.boxed(),
			),
		];
		let sources = block_on(read_batch(reads));
		assert_eq!(sources.len(), 2);
		assert_eq!(sources[0], FragmentSource::text("a.json", "{}"));
		assert_eq!(
			sources[1].content,
			Err(ReadError {
				label: "b.json".into(),
				message: "permission denied".into()
			})
		);
	}

	#[test]
	fn test_parse_batch_accepts_valid_documents() {
		let fragments = parse_batch(vec![
			FragmentSource::text("a", r#"{"nodes":[{"id":"x"}],"edges":[]}"#),
			FragmentSource::text("b", r#"{"nodes":[],"edges":[{"source":"x","target":"y"}]}"#),
		])
		.unwrap();
		assert_eq!(fragments.len(), 2);
		assert_eq!(fragments[1].edges[0].target, "y");
	}

	#[test]
	fn test_read_failure_aborts_batch() {
		let err = parse_batch(vec![
			FragmentSource::text("a", r#"{"nodes":[],"edges":[]}"#),
			FragmentSource {
				label: "b".into(),
				content: Err(ReadError {
					label: "b".into(),
					message: "gone".into(),
				}),
			},
		])
		.unwrap_err();
		assert!(matches!(err, GraphError::Read(ReadError { ref label, .. }) if label == "b"));
	}

	#[test]
	fn test_parse_failure_names_the_file() {
		let err = parse_batch(vec![FragmentSource::text("broken.json", "{nodes:")]).unwrap_err();
		assert!(matches!(err, GraphError::Parse { ref label, .. } if label == "broken.json"));
	}

	#[test]
	fn test_schema_failure_aborts_batch() {
		let err = parse_batch(vec![FragmentSource::text("x.json", r#"{"nodes":[{}],"edges":[]}"#)])
			.unwrap_err();
		assert!(matches!(
			err,
			GraphError::Schema(SchemaError::NodeMissingId { index: 0, .. })
		));
	}
}
