use serde::Deserialize;
use serde_json::{Map, Value};

#[derive(Debug, Deserialize)]
pub struct Config {
	pub service: Service,
	pub storage: Storage,
	pub providers: Providers,
	pub search: Search,
	#[serde(default)]
	pub fusion: Fusion,
}

#[derive(Debug, Deserialize)]
pub struct Service {
	pub log_level: String,
}

#[derive(Debug, Deserialize)]
pub struct Storage {
	pub postgres: Postgres,
	pub qdrant: Qdrant,
}

#[derive(Debug, Deserialize)]
pub struct Postgres {
	pub dsn: String,
	pub pool_max_conns: u32,
}

#[derive(Debug, Deserialize)]
pub struct Qdrant {
	pub url: String,
	pub collection: String,
	pub vector_dim: u32,
}

#[derive(Debug, Deserialize)]
pub struct Providers {
	pub embedding: EmbeddingProviderConfig,
}

#[derive(Debug, Deserialize)]
pub struct EmbeddingProviderConfig {
	pub provider_id: String,
	pub api_base: String,
	pub api_key: String,
	pub path: String,
	pub model: String,
	pub dimensions: u32,
	pub timeout_ms: u64,
	#[serde(default)]
	pub default_headers: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub struct Search {
	/// Number of documents handed back to the caller after permission filtering.
	pub top_k: u32,
	/// Per-type result cap sent to the search engine.
	pub candidate_k: u32,
	/// Value of the `category` payload field every query is restricted to.
	pub category: String,
	#[serde(default)]
	pub scoring: SearchScoring,
}

/// Lexical/vector blend used when parsing raw hits, one per criterion type.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct SearchScoring {
	pub keyword: ScoreBlend,
	pub title: ScoreBlend,
	pub content: ScoreBlend,
	pub path: ScoreBlend,
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct ScoreBlend {
	pub lexical_weight: f64,
	pub vector_weight: f64,
}
impl Default for ScoreBlend {
	fn default() -> Self {
		Self { lexical_weight: 0.5, vector_weight: 0.5 }
	}
}

#[derive(Debug, Deserialize)]
#[serde(default)]
pub struct Fusion {
	/// Smoothing constant `k` of reciprocal rank fusion.
	pub rrf_k: f64,
	pub weights: FusionWeights,
	/// Multiplier applied when a date hint occurs in the title.
	pub date_boost: f64,
	/// Multiplier applied when a keyword names one of the path segments.
	pub path_boost: f64,
}
impl Default for Fusion {
	fn default() -> Self {
		Self {
			rrf_k: 60.0,
			weights: FusionWeights::default(),
			date_boost: 1.5,
			path_boost: 1.3,
		}
	}
}

#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(default)]
pub struct FusionWeights {
	pub keyword: f64,
	pub title: f64,
	pub content: f64,
	pub path: f64,
}
impl Default for FusionWeights {
	fn default() -> Self {
		Self { keyword: 1.0, title: 1.0, content: 1.0, path: 1.0 }
	}
}
