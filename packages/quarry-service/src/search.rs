mod filter;
mod fusion;
mod parse;

pub use filter::filter;
pub use fusion::{BoostInputs, FusionPolicy, RankExplain, RankSource, fuse};
pub use parse::{LinearBlend, ScoreCombiner, deduplicate, parse};

use std::{
	cmp::Ordering,
	collections::{BTreeMap, HashSet},
};

use serde::{Deserialize, Serialize};

use crate::{Error, HybridQuery, QuarryService, RawHit, Result, engine::FieldFilter};
use quarry_config::ScoreBlend;
use quarry_domain::criteria::{CriterionKind, QueryFacets, SearchCriterion};
use quarry_storage::qdrant::CATEGORY_KEY;

/// Per-type lists keyed by criterion kind, iterated in fusion order.
pub type PerKind<T> = BTreeMap<CriterionKind, Vec<T>>;

/// A parsed document, carrying a stage-dependent score.
///
/// After parsing the score is the blended lexical/vector score; after fusion it is the boosted RRF
/// score.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
	pub id: String,
	pub title: String,
	pub content: String,
	pub path: String,
	pub collection: Option<String>,
	pub score: f64,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub keywords: Option<Vec<String>>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub explain: Option<RankExplain>,
}

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RetrieveRequest {
	pub user_id: String,
	#[serde(default)]
	pub facets: QueryFacets,
	pub top_k: Option<u32>,
}

#[derive(Clone, Debug, Serialize)]
pub struct RetrieveResponse {
	pub items: Vec<SearchResult>,
}

impl QuarryService {
	/// Runs every non-empty criterion against the engine in one batch.
	pub async fn execute(
		&self,
		criteria: &[SearchCriterion],
		top_k: u32,
	) -> Result<PerKind<RawHit>> {
		let active = active_criteria(criteria)?;

		if active.is_empty() {
			tracing::debug!("No active criteria; skipping search.");

			return Ok(PerKind::new());
		}

		let vector = self.embed_content(&active).await?;
		let limit = top_k.max(1);
		let filters = vec![FieldFilter::new(CATEGORY_KEY, self.cfg.search.category.clone())];
		let queries: Vec<HybridQuery> = active
			.iter()
			.map(|criterion| HybridQuery {
				text: criterion.to_query(),
				vector: vector.clone(),
				field_weights: criterion.kind().field_weights(),
				filters: filters.clone(),
				blend: self.blend_for(criterion.kind()),
				limit,
			})
			.collect();

		tracing::info!(
			criteria = queries.len(),
			hybrid = !vector.is_empty(),
			limit,
			"Issuing batched hybrid search."
		);

		let results = self.backends.engine.batch_hybrid_search(&queries).await?;

		if results.len() != queries.len() {
			return Err(Error::Sequencing {
				message: format!(
					"Search engine returned {} result sets for {} queries.",
					results.len(),
					queries.len()
				),
			});
		}

		Ok(active
			.iter()
			.map(|criterion| criterion.kind())
			.zip(results.into_iter().map(|result| result.hits))
			.collect())
	}

	/// Searches and parses each criterion type, merging chunks of the same document.
	pub async fn multi_search(
		&self,
		criteria: &[SearchCriterion],
		top_k: u32,
	) -> Result<PerKind<SearchResult>> {
		let raw = self.execute(criteria, top_k).await?;

		Ok(raw
			.into_iter()
			.map(|(kind, hits)| {
				let combiner = self.blend_for(kind);

				(kind, deduplicate(parse(&hits, &combiner)))
			})
			.collect())
	}

	pub fn fuse_and_rank(
		&self,
		per_kind: &PerKind<SearchResult>,
		date_keywords: &[String],
		path_keywords: &[String],
	) -> Vec<SearchResult> {
		let policy = FusionPolicy::from_config(&self.cfg.fusion);
		let ranking = fuse(per_kind, &BoostInputs { date_keywords, path_keywords }, &policy);

		tracing::debug!(lists = per_kind.len(), fused = ranking.len(), "Fused rankings.");

		ranking
	}

	/// Keeps the documents `user_id` may read. A store failure is an error, never a pass-through.
	pub async fn filter_for_user(
		&self,
		ranking: Vec<SearchResult>,
		user_id: &str,
	) -> Result<Vec<SearchResult>> {
		let user_id = user_id.trim();

		if user_id.is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}
		if ranking.is_empty() {
			return Ok(ranking);
		}

		let grants = self.backends.permissions.find_grants_for_user(user_id).await?;
		let before = ranking.len();
		let kept = filter(ranking, &grants);

		tracing::info!(
			user_id,
			grants = grants.len(),
			before,
			after = kept.len(),
			"Applied permission filter."
		);

		Ok(kept)
	}

	pub async fn retrieve(&self, req: RetrieveRequest) -> Result<RetrieveResponse> {
		if req.user_id.trim().is_empty() {
			return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
		}

		let top_k = req.top_k.unwrap_or(self.cfg.search.top_k).max(1);
		let candidate_k = self.cfg.search.candidate_k.max(top_k);
		let criteria = req.facets.criteria();
		let per_kind = self.multi_search(&criteria, candidate_k).await?;
		let ranking = self.fuse_and_rank(&per_kind, &req.facets.dates, &req.facets.keywords);
		let mut items = self.filter_for_user(ranking, &req.user_id).await?;

		items.truncate(top_k as usize);

		Ok(RetrieveResponse { items })
	}

	fn blend_for(&self, kind: CriterionKind) -> LinearBlend {
		LinearBlend::from(score_blend(&self.cfg.search.scoring, kind))
	}

	async fn embed_content(&self, active: &[&SearchCriterion]) -> Result<Vec<f32>> {
		let Some(content) = active.iter().find(|criterion| criterion.kind().is_embedding_source())
		else {
			return Ok(Vec::new());
		};
		let cfg = &self.cfg.providers.embedding;
		let texts = vec![content.to_query()];
		let mut vectors = self.providers.embedding.embed(cfg, &texts).await?;

		if vectors.len() != 1 {
			return Err(Error::Provider {
				message: format!(
					"Embedding provider returned {} vectors for 1 text.",
					vectors.len()
				),
			});
		}

		let vector = vectors.remove(0);
		let expected = self.cfg.storage.qdrant.vector_dim as usize;

		if vector.len() != expected {
			return Err(Error::Provider {
				message: format!(
					"Embedding has {} dimensions, collection expects {expected}.",
					vector.len()
				),
			});
		}

		Ok(vector)
	}
}

pub(crate) fn cmp_f64_desc(a: f64, b: f64) -> Ordering {
	match (a.is_nan(), b.is_nan()) {
		(true, true) => Ordering::Equal,
		(true, false) => Ordering::Greater,
		(false, true) => Ordering::Less,
		(false, false) => b.partial_cmp(&a).unwrap_or(Ordering::Equal),
	}
}

fn active_criteria(criteria: &[SearchCriterion]) -> Result<Vec<&SearchCriterion>> {
	let mut seen = HashSet::new();
	let mut active = Vec::new();

	for criterion in criteria.iter().filter(|criterion| !criterion.is_empty()) {
		if !seen.insert(criterion.kind()) {
			return Err(Error::InvalidRequest {
				message: format!("Criterion type {} appears more than once.", criterion.kind()),
			});
		}

		active.push(criterion);
	}

	Ok(active)
}

fn score_blend(scoring: &quarry_config::SearchScoring, kind: CriterionKind) -> ScoreBlend {
	match kind {
		CriterionKind::Keyword => scoring.keyword,
		CriterionKind::Title => scoring.title,
		CriterionKind::Content => scoring.content,
		CriterionKind::Path => scoring.path,
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn nan_sorts_last() {
		let mut scores = vec![0.2, f64::NAN, 0.9];

		scores.sort_by(|a, b| cmp_f64_desc(*a, *b));

		assert_eq!(scores[0], 0.9);
		assert_eq!(scores[1], 0.2);
		assert!(scores[2].is_nan());
	}

	#[test]
	fn duplicate_kinds_are_rejected() {
		let criteria = vec![SearchCriterion::title(["a"]), SearchCriterion::title(["b"])];

		assert!(matches!(active_criteria(&criteria), Err(Error::InvalidRequest { .. })));
	}

	#[test]
	fn empty_criteria_are_skipped_before_duplicate_check() {
		let criteria = vec![
			SearchCriterion::title(["  "]),
			SearchCriterion::title(["q3 report"]),
			SearchCriterion::path(Vec::<String>::new()),
		];
		let active = active_criteria(&criteria).expect("criteria should be accepted");

		assert_eq!(active.len(), 1);
		assert_eq!(active[0].kind(), CriterionKind::Title);
	}
}
