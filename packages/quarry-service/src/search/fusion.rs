use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::search::{PerKind, SearchResult};
use quarry_config::{Fusion, FusionWeights};
use quarry_domain::{chunk, criteria::CriterionKind, path};

/// Immutable fusion parameters shared by every request.
#[derive(Clone, Copy, Debug)]
pub struct FusionPolicy {
	pub rrf_k: f64,
	pub weights: FusionWeights,
	pub date_boost: f64,
	pub path_boost: f64,
}
impl FusionPolicy {
	pub fn from_config(cfg: &Fusion) -> Self {
		Self {
			rrf_k: cfg.rrf_k,
			weights: cfg.weights,
			date_boost: cfg.date_boost,
			path_boost: cfg.path_boost,
		}
	}

	pub fn weight(&self, kind: CriterionKind) -> f64 {
		match kind {
			CriterionKind::Keyword => self.weights.keyword,
			CriterionKind::Title => self.weights.title,
			CriterionKind::Content => self.weights.content,
			CriterionKind::Path => self.weights.path,
		}
	}
}
impl Default for FusionPolicy {
	fn default() -> Self {
		Self::from_config(&Fusion::default())
	}
}

/// Request hints used for contextual boosting.
#[derive(Clone, Copy, Debug, Default)]
pub struct BoostInputs<'a> {
	/// Matched case-insensitively as substrings of the title.
	pub date_keywords: &'a [String],
	/// Matched exactly against path segments.
	pub path_keywords: &'a [String],
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankExplain {
	pub rrf_score: f64,
	pub multiplier: f64,
	pub sources: Vec<RankSource>,
	pub boosts: Vec<String>,
}

/// Zero-based position of a document in one type list.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankSource {
	pub kind: CriterionKind,
	pub rank: usize,
}

struct FusionAccumulator {
	rrf_score: f64,
	representative: SearchResult,
	sources: Vec<RankSource>,
}

/// Weighted reciprocal rank fusion followed by multiplicative boosts.
///
/// The returned list is sorted by final score and never truncated.
pub fn fuse(
	per_kind: &PerKind<SearchResult>,
	boosts: &BoostInputs<'_>,
	policy: &FusionPolicy,
) -> Vec<SearchResult> {
	let mut accumulators: Vec<FusionAccumulator> = Vec::new();
	let mut by_id: HashMap<&str, usize> = HashMap::new();

	for (kind, results) in per_kind {
		let weight = policy.weight(*kind);

		for (rank, result) in results.iter().enumerate() {
			let contribution = weight / (rank as f64 + policy.rrf_k);
			let id = chunk::logical_id(&result.id);
			let slot = *by_id.entry(id).or_insert_with(|| {
				accumulators.push(FusionAccumulator {
					rrf_score: 0.0,
					representative: result.clone(),
					sources: Vec::new(),
				});

				accumulators.len() - 1
			});
			let acc = &mut accumulators[slot];

			acc.rrf_score += contribution;
			acc.sources.push(RankSource { kind: *kind, rank });
		}
	}

	let mut fused: Vec<SearchResult> = accumulators
		.into_iter()
		.map(|acc| {
			let (multiplier, applied) = boost_multiplier(&acc.representative, boosts, policy);
			let mut result = acc.representative;

			result.id = chunk::logical_id(&result.id).to_string();
			result.score = acc.rrf_score * multiplier;
			result.explain = Some(RankExplain {
				rrf_score: acc.rrf_score,
				multiplier,
				sources: acc.sources,
				boosts: applied,
			});

			result
		})
		.collect();

	fused.sort_by(|a, b| super::cmp_f64_desc(a.score, b.score));

	fused
}

fn boost_multiplier(
	result: &SearchResult,
	boosts: &BoostInputs<'_>,
	policy: &FusionPolicy,
) -> (f64, Vec<String>) {
	let mut multiplier = 1.0;
	let mut applied = Vec::new();

	if matches_date(&result.title, boosts.date_keywords) {
		multiplier *= policy.date_boost;

		applied.push("date".to_string());
	}
	if matches_path(&result.path, boosts.path_keywords) {
		multiplier *= policy.path_boost;

		applied.push("path".to_string());
	}

	(multiplier, applied)
}

fn matches_date(title: &str, date_keywords: &[String]) -> bool {
	let title = title.to_lowercase();

	date_keywords
		.iter()
		.map(|keyword| keyword.trim())
		.filter(|keyword| !keyword.is_empty())
		.any(|keyword| title.contains(&keyword.to_lowercase()))
}

fn matches_path(document_path: &str, keywords: &[String]) -> bool {
	path::segments(document_path).any(|segment| {
		keywords
			.iter()
			.map(|keyword| keyword.trim())
			.any(|keyword| !keyword.is_empty() && keyword == segment)
	})
}
