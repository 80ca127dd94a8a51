use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::{RawHit, search::SearchResult};
use quarry_config::ScoreBlend;
use quarry_domain::chunk;
use quarry_storage::qdrant::{COLLECTION_KEY, DOC_ID_KEY};

const CHUNK_SEPARATOR: &str = "\n\n";

/// Folds a hit's lexical and vector scores into one.
pub trait ScoreCombiner {
	fn combine(&self, lexical: f64, vector: f64) -> f64;
}
impl<F> ScoreCombiner for F
where
	F: Fn(f64, f64) -> f64,
{
	fn combine(&self, lexical: f64, vector: f64) -> f64 {
		self(lexical, vector)
	}
}

/// Weighted mean of the two scores.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinearBlend {
	pub lexical_weight: f64,
	pub vector_weight: f64,
}
impl Default for LinearBlend {
	fn default() -> Self {
		Self { lexical_weight: 0.5, vector_weight: 0.5 }
	}
}
impl From<ScoreBlend> for LinearBlend {
	fn from(blend: ScoreBlend) -> Self {
		Self { lexical_weight: blend.lexical_weight, vector_weight: blend.vector_weight }
	}
}
impl ScoreCombiner for LinearBlend {
	fn combine(&self, lexical: f64, vector: f64) -> f64 {
		let total = self.lexical_weight + self.vector_weight;

		if total <= 0.0 {
			return 0.0;
		}

		(self.lexical_weight * lexical + self.vector_weight * vector) / total
	}
}

/// Converts raw hits into results sorted by combined score.
///
/// Hits without a stable id are dropped.
pub fn parse<C>(hits: &[RawHit], combiner: &C) -> Vec<SearchResult>
where
	C: ScoreCombiner + ?Sized,
{
	let mut results: Vec<SearchResult> = hits
		.iter()
		.filter_map(|hit| {
			let Some(raw_id) = text_field(&hit.fields, DOC_ID_KEY)
				.or_else(|| text_field(&hit.fields, "id"))
				.filter(|id| !id.trim().is_empty())
			else {
				tracing::warn!("Skipping search hit without a document id.");

				return None;
			};

			Some(SearchResult {
				id: chunk::logical_id(raw_id.trim()).to_string(),
				title: text_field(&hit.fields, "title").unwrap_or_default().to_string(),
				content: text_field(&hit.fields, "content").unwrap_or_default().to_string(),
				path: text_field(&hit.fields, "path").unwrap_or_default().to_string(),
				collection: text_field(&hit.fields, COLLECTION_KEY).map(str::to_string),
				score: combiner.combine(hit.lexical_score, hit.vector_score),
				keywords: keywords_field(&hit.fields),
				explain: None,
			})
		})
		.collect();

	results.sort_by(|a, b| super::cmp_f64_desc(a.score, b.score));

	results
}

/// Merges results sharing a logical id.
///
/// Contents are joined in first-seen order, the best score is kept and everything else comes from
/// the first occurrence.
pub fn deduplicate(results: Vec<SearchResult>) -> Vec<SearchResult> {
	let mut merged: Vec<SearchResult> = Vec::with_capacity(results.len());
	let mut by_id: HashMap<String, usize> = HashMap::new();

	for result in results {
		let id = chunk::logical_id(&result.id).to_string();

		match by_id.get(&id) {
			Some(&slot) => {
				let kept = &mut merged[slot];

				if !result.content.is_empty() {
					if !kept.content.is_empty() {
						kept.content.push_str(CHUNK_SEPARATOR);
					}

					kept.content.push_str(&result.content);
				}

				kept.score = kept.score.max(result.score);
			},
			None => {
				by_id.insert(id.clone(), merged.len());
				merged.push(SearchResult { id, ..result });
			},
		}
	}

	merged.sort_by(|a, b| super::cmp_f64_desc(a.score, b.score));

	merged
}

fn text_field<'a>(fields: &'a Map<String, Value>, key: &str) -> Option<&'a str> {
	fields.get(key).and_then(Value::as_str)
}

fn keywords_field(fields: &Map<String, Value>) -> Option<Vec<String>> {
	let keywords: Vec<String> = match fields.get("keywords")? {
		Value::Array(items) => items
			.iter()
			.filter_map(Value::as_str)
			.map(str::trim)
			.filter(|item| !item.is_empty())
			.map(str::to_string)
			.collect(),
		Value::String(joined) => joined
			.split(',')
			.map(str::trim)
			.filter(|item| !item.is_empty())
			.map(str::to_string)
			.collect(),
		_ => return None,
	};

	Some(keywords)
}
