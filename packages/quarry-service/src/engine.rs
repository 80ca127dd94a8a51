//! Hybrid search against the Qdrant document collection.
//!
//! Each [`HybridQuery`] fans out into one BM25 sub-query per weighted field plus an optional dense
//! sub-query. All sub-queries of a batch travel in a single `query_batch` call and are merged back
//! per document before being returned.

use std::collections::HashMap;

use qdrant_client::qdrant::{
	Condition, Document, Filter, PointId, Query, QueryBatchPointsBuilder, QueryPoints,
	QueryPointsBuilder, ScoredPoint, Value, point_id::PointIdOptions, value::Kind,
};
use serde_json::{Map, Number, Value as JsonValue};

use crate::{
	BoxFuture, Error, Result, SearchEngine,
	search::{LinearBlend, ScoreCombiner, cmp_f64_desc},
};
use quarry_domain::criteria::DocumentField;
use quarry_storage::qdrant::{
	BM25_MODEL, DENSE_VECTOR_NAME, DOC_ID_KEY, QdrantStore, bm25_vector_name,
};

/// Exact-match restriction on a payload field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldFilter {
	pub key: String,
	pub value: String,
}
impl FieldFilter {
	pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
		Self { key: key.into(), value: value.into() }
	}
}

#[derive(Clone, Debug)]
pub struct HybridQuery {
	pub text: String,
	/// Dense query vector. Empty means lexical-only.
	pub vector: Vec<f32>,
	pub field_weights: &'static [(DocumentField, f32)],
	pub filters: Vec<FieldFilter>,
	/// Ranks merged hits before the cap applies; the same blend later scores them in parsing.
	pub blend: LinearBlend,
	pub limit: u32,
}

/// One engine hit before parsing. Scores are in `[0, 1]`.
#[derive(Clone, Debug, Default)]
pub struct RawHit {
	pub fields: Map<String, JsonValue>,
	pub lexical_score: f64,
	pub vector_score: f64,
}

#[derive(Clone, Debug, Default)]
pub struct HybridQueryResult {
	pub hits: Vec<RawHit>,
}

#[derive(Clone, Copy, Debug)]
enum SubQuery {
	Lexical { weight: f64 },
	Dense,
}

struct HitMerger {
	lexical_weight_total: f64,
	blend: LinearBlend,
	hits: Vec<RawHit>,
	by_doc: HashMap<String, usize>,
}
impl HitMerger {
	fn new(query: &HybridQuery) -> Self {
		let lexical_weight_total = query
			.field_weights
			.iter()
			.map(|(_, weight)| f64::from(*weight))
			.filter(|weight| *weight > 0.0)
			.sum();

		Self {
			lexical_weight_total,
			blend: query.blend,
			hits: Vec::new(),
			by_doc: HashMap::new(),
		}
	}

	fn absorb(&mut self, sub: SubQuery, points: Vec<ScoredPoint>) {
		let top = points.iter().map(|point| f64::from(point.score)).fold(0.0_f64, f64::max);

		for point in points {
			let score = f64::from(point.score);
			let Some(key) = hit_key(&point) else {
				tracing::warn!("Dropping Qdrant point without id.");

				continue;
			};
			let slot = match self.by_doc.get(&key) {
				Some(slot) => *slot,
				None => {
					let mut fields = payload_to_json(&point.payload);

					fields.entry(DOC_ID_KEY).or_insert_with(|| JsonValue::String(key.clone()));

					self.hits.push(RawHit { fields, lexical_score: 0.0, vector_score: 0.0 });
					self.by_doc.insert(key, self.hits.len() - 1);

					self.hits.len() - 1
				},
			};
			let hit = &mut self.hits[slot];

			match sub {
				SubQuery::Lexical { weight } => {
					if top > 0.0 && self.lexical_weight_total > 0.0 {
						hit.lexical_score += weight * (score / top) / self.lexical_weight_total;
					}
				},
				SubQuery::Dense => {
					hit.vector_score = hit.vector_score.max(score.clamp(0.0, 1.0));
				},
			}
		}
	}

	fn finish(mut self, limit: u32) -> HybridQueryResult {
		for hit in &mut self.hits {
			hit.lexical_score = hit.lexical_score.clamp(0.0, 1.0);
		}

		let blend = self.blend;

		self.hits.sort_by(|a, b| {
			cmp_f64_desc(
				blend.combine(a.lexical_score, a.vector_score),
				blend.combine(b.lexical_score, b.vector_score),
			)
		});
		self.hits.truncate(limit as usize);

		HybridQueryResult { hits: self.hits }
	}
}

impl SearchEngine for QdrantStore {
	fn batch_hybrid_search<'a>(
		&'a self,
		queries: &'a [HybridQuery],
	) -> BoxFuture<'a, Result<Vec<HybridQueryResult>>> {
		Box::pin(run_batch(self, queries))
	}
}

async fn run_batch(store: &QdrantStore, queries: &[HybridQuery]) -> Result<Vec<HybridQueryResult>> {
	if queries.is_empty() {
		return Ok(Vec::new());
	}

	let (requests, plan) = plan_batch(&store.collection, queries);
	let response = store
		.client
		.query_batch(QueryBatchPointsBuilder::new(store.collection.clone(), requests))
		.await
		.map_err(|err| Error::Qdrant { message: err.to_string() })?;

	if response.result.len() != plan.len() {
		return Err(Error::Sequencing {
			message: format!(
				"Qdrant answered {} sub-queries, expected {}.",
				response.result.len(),
				plan.len()
			),
		});
	}

	let mut mergers: Vec<HitMerger> = queries.iter().map(HitMerger::new).collect();

	for ((query_idx, sub), batch) in plan.into_iter().zip(response.result) {
		mergers[query_idx].absorb(sub, batch.result);
	}

	Ok(mergers
		.into_iter()
		.zip(queries)
		.map(|(merger, query)| merger.finish(query.limit))
		.collect())
}

fn plan_batch(
	collection: &str,
	queries: &[HybridQuery],
) -> (Vec<QueryPoints>, Vec<(usize, SubQuery)>) {
	let mut requests = Vec::new();
	let mut plan = Vec::new();

	for (query_idx, query) in queries.iter().enumerate() {
		let filter = build_filter(&query.filters);
		let limit = u64::from(query.limit.max(1));

		for &(field, weight) in query.field_weights {
			if weight <= 0.0 {
				continue;
			}

			let mut builder = QueryPointsBuilder::new(collection)
				.query(Query::new_nearest(Document::new(query.text.clone(), BM25_MODEL)))
				.using(bm25_vector_name(field))
				.limit(limit)
				.with_payload(true);

			if let Some(filter) = filter.clone() {
				builder = builder.filter(filter);
			}

			requests.push(builder.build());
			plan.push((query_idx, SubQuery::Lexical { weight: f64::from(weight) }));
		}

		if !query.vector.is_empty() {
			let mut builder = QueryPointsBuilder::new(collection)
				.query(Query::new_nearest(query.vector.clone()))
				.using(DENSE_VECTOR_NAME)
				.limit(limit)
				.with_payload(true);

			if let Some(filter) = filter {
				builder = builder.filter(filter);
			}

			requests.push(builder.build());
			plan.push((query_idx, SubQuery::Dense));
		}
	}

	(requests, plan)
}

fn build_filter(filters: &[FieldFilter]) -> Option<Filter> {
	if filters.is_empty() {
		return None;
	}

	let conditions =
		filters.iter().map(|filter| Condition::matches(filter.key.clone(), filter.value.clone()));

	Some(Filter::must(conditions))
}

fn hit_key(point: &ScoredPoint) -> Option<String> {
	if let Some(Kind::StringValue(doc_id)) =
		point.payload.get(DOC_ID_KEY).and_then(|value| value.kind.as_ref())
	{
		return Some(doc_id.clone());
	}

	point_id_string(point.id.as_ref()?)
}

fn point_id_string(id: &PointId) -> Option<String> {
	match id.point_id_options.as_ref()? {
		PointIdOptions::Num(num) => Some(num.to_string()),
		PointIdOptions::Uuid(uuid) => Some(uuid.clone()),
	}
}

fn payload_to_json(payload: &HashMap<String, Value>) -> Map<String, JsonValue> {
	payload.iter().map(|(key, value)| (key.clone(), value_to_json(value))).collect()
}

fn value_to_json(value: &Value) -> JsonValue {
	match value.kind.as_ref() {
		None | Some(Kind::NullValue(_)) => JsonValue::Null,
		Some(Kind::BoolValue(flag)) => JsonValue::Bool(*flag),
		Some(Kind::IntegerValue(num)) => JsonValue::from(*num),
		Some(Kind::DoubleValue(num)) =>
			Number::from_f64(*num).map_or(JsonValue::Null, JsonValue::Number),
		Some(Kind::StringValue(text)) => JsonValue::String(text.clone()),
		Some(Kind::ListValue(list)) =>
			JsonValue::Array(list.values.iter().map(value_to_json).collect()),
		Some(Kind::StructValue(inner)) => JsonValue::Object(
			inner.fields.iter().map(|(key, value)| (key.clone(), value_to_json(value))).collect(),
		),
	}
}

#[cfg(test)]
mod tests {
	use qdrant_client::qdrant::ListValue;

	use super::*;
	use quarry_domain::criteria::CriterionKind;

	fn text(value: &str) -> Value {
		Value { kind: Some(Kind::StringValue(value.to_string())) }
	}

	fn point(doc_id: &str, score: f32) -> ScoredPoint {
		let mut payload = HashMap::new();

		payload.insert(DOC_ID_KEY.to_string(), text(doc_id));
		payload.insert("title".to_string(), text(&format!("Title {doc_id}")));

		ScoredPoint { payload, score, ..Default::default() }
	}

	fn query(kind: CriterionKind, vector: Vec<f32>) -> HybridQuery {
		HybridQuery {
			text: "pricing".to_string(),
			vector,
			field_weights: kind.field_weights(),
			filters: vec![FieldFilter::new("category", "knowledge")],
			blend: LinearBlend::default(),
			limit: 10,
		}
	}

	#[test]
	fn plan_emits_one_sparse_query_per_field_and_dense_when_vector_present() {
		let queries = vec![
			query(CriterionKind::Keyword, Vec::new()),
			query(CriterionKind::Content, vec![0.1; 4]),
		];
		let (requests, plan) = plan_batch("docs", &queries);
		let lexical_for_keyword = CriterionKind::Keyword.field_weights().len();
		let lexical_for_content = CriterionKind::Content.field_weights().len();

		assert_eq!(requests.len(), lexical_for_keyword + lexical_for_content + 1);
		assert_eq!(plan.len(), requests.len());
		assert!(matches!(plan.last(), Some((1, SubQuery::Dense))));
		assert!(requests.iter().all(|request| request.filter.is_some()));
		assert_eq!(requests[0].using.as_deref(), Some("keywords_bm25"));
	}

	#[test]
	fn merger_normalizes_lexical_scores_per_list() {
		let base = query(CriterionKind::Title, Vec::new());
		let mut merger = HitMerger::new(&base);

		// Title profile: title 3, keywords 1.
		merger.absorb(SubQuery::Lexical { weight: 3.0 }, vec![point("a", 8.0), point("b", 4.0)]);
		merger.absorb(SubQuery::Lexical { weight: 1.0 }, vec![point("b", 2.0)]);

		let result = merger.finish(10);
		let ids: Vec<_> = result.hits.iter().map(|hit| hit.fields["doc_id"].clone()).collect();

		assert_eq!(ids, vec![JsonValue::from("a"), JsonValue::from("b")]);
		assert!((result.hits[0].lexical_score - 0.75).abs() < 1e-9);
		assert!((result.hits[1].lexical_score - 0.625).abs() < 1e-9);
	}

	#[test]
	fn merger_clamps_dense_scores_and_truncates() {
		let base = query(CriterionKind::Content, vec![0.5; 4]);
		let mut merger = HitMerger::new(&base);

		merger.absorb(SubQuery::Dense, vec![point("a", 1.2), point("b", -0.3), point("c", 0.4)]);

		let result = merger.finish(2);

		assert_eq!(result.hits.len(), 2);
		assert_eq!(result.hits[0].vector_score, 1.0);
		assert_eq!(result.hits[1].vector_score, 0.4_f32 as f64);
	}

	#[test]
	fn cap_applies_after_ranking_with_the_query_blend() {
		let mut base = query(CriterionKind::Content, vec![0.5; 4]);

		base.blend = LinearBlend { lexical_weight: 0.0, vector_weight: 1.0 };

		let mut merger = HitMerger::new(&base);

		// Content profile: content 3, title 1.
		merger.absorb(
			SubQuery::Lexical { weight: 3.0 },
			vec![point("lexical_doc", 9.0), point("vector_doc", 1.0)],
		);
		merger.absorb(SubQuery::Lexical { weight: 1.0 }, vec![point("lexical_doc", 4.0)]);
		merger.absorb(SubQuery::Dense, vec![point("vector_doc", 0.9), point("lexical_doc", 0.1)]);

		let result = merger.finish(1);

		assert_eq!(result.hits.len(), 1);
		assert_eq!(result.hits[0].fields["doc_id"], JsonValue::from("vector_doc"));
		assert!((result.hits[0].vector_score - f64::from(0.9_f32)).abs() < 1e-12);
	}

	#[test]
	fn equal_blended_scores_keep_discovery_order() {
		let mut merger = HitMerger::new(&query(CriterionKind::Content, vec![0.5; 4]));

		merger.absorb(SubQuery::Dense, vec![point("first", 0.5), point("second", 0.5)]);

		let ids: Vec<_> =
			merger.finish(10).hits.into_iter().map(|hit| hit.fields["doc_id"].clone()).collect();

		assert_eq!(ids, vec![JsonValue::from("first"), JsonValue::from("second")]);
	}

	#[test]
	fn payload_values_convert_to_json() {
		let list = Value {
			kind: Some(Kind::ListValue(ListValue { values: vec![text("a"), text("b")] })),
		};
		let mut payload = HashMap::new();

		payload.insert("keywords".to_string(), list);
		payload.insert("rank".to_string(), Value { kind: Some(Kind::IntegerValue(3)) });
		payload.insert("missing".to_string(), Value { kind: None });

		let json = payload_to_json(&payload);

		assert_eq!(json["keywords"], serde_json::json!(["a", "b"]));
		assert_eq!(json["rank"], serde_json::json!(3));
		assert_eq!(json["missing"], JsonValue::Null);
	}
}
