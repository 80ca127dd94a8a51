mod error;
mod types;

pub use error::{Error, Result};
pub use types::{
	Config, EmbeddingProviderConfig, Fusion, FusionWeights, Postgres, Providers, Qdrant,
	ScoreBlend, Search, SearchScoring, Service, Storage,
};

use std::{fs, path::Path};

pub fn load(path: &Path) -> Result<Config> {
	let raw = fs::read_to_string(path)
		.map_err(|err| Error::ReadConfig { path: path.to_path_buf(), source: err })?;

	let mut cfg: Config = toml::from_str(&raw)
		.map_err(|err| Error::ParseConfig { path: path.to_path_buf(), source: err })?;

	normalize(&mut cfg);

	validate(&cfg)?;

	Ok(cfg)
}

pub fn validate(cfg: &Config) -> Result<()> {
	if cfg.providers.embedding.dimensions == 0 {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must be greater than zero.".to_string(),
		});
	}
	if cfg.providers.embedding.dimensions != cfg.storage.qdrant.vector_dim {
		return Err(Error::Validation {
			message: "providers.embedding.dimensions must match storage.qdrant.vector_dim."
				.to_string(),
		});
	}
	if cfg.providers.embedding.api_key.trim().is_empty() {
		return Err(Error::Validation {
			message: "Provider embedding api_key must be non-empty.".to_string(),
		});
	}
	if cfg.storage.qdrant.collection.is_empty() {
		return Err(Error::Validation {
			message: "storage.qdrant.collection must be non-empty.".to_string(),
		});
	}
	if cfg.search.category.is_empty() {
		return Err(Error::Validation {
			message: "search.category must be non-empty.".to_string(),
		});
	}
	if cfg.search.top_k == 0 {
		return Err(Error::Validation {
			message: "search.top_k must be greater than zero.".to_string(),
		});
	}
	if cfg.search.candidate_k < cfg.search.top_k {
		return Err(Error::Validation {
			message: "search.candidate_k must be greater than or equal to search.top_k."
				.to_string(),
		});
	}

	for (label, blend) in [
		("keyword", &cfg.search.scoring.keyword),
		("title", &cfg.search.scoring.title),
		("content", &cfg.search.scoring.content),
		("path", &cfg.search.scoring.path),
	] {
		for (field, value) in
			[("lexical_weight", blend.lexical_weight), ("vector_weight", blend.vector_weight)]
		{
			if !value.is_finite() || value < 0.0 {
				return Err(Error::Validation {
					message: format!(
						"search.scoring.{label}.{field} must be a finite number, zero or greater."
					),
				});
			}
		}

		if blend.lexical_weight + blend.vector_weight <= 0.0 {
			return Err(Error::Validation {
				message: format!("search.scoring.{label} weights must not both be zero."),
			});
		}
	}

	if !cfg.fusion.rrf_k.is_finite() || cfg.fusion.rrf_k <= 0.0 {
		return Err(Error::Validation {
			message: "fusion.rrf_k must be a finite number greater than zero.".to_string(),
		});
	}

	for (label, weight) in [
		("keyword", cfg.fusion.weights.keyword),
		("title", cfg.fusion.weights.title),
		("content", cfg.fusion.weights.content),
		("path", cfg.fusion.weights.path),
	] {
		if !weight.is_finite() || weight < 0.0 {
			return Err(Error::Validation {
				message: format!(
					"fusion.weights.{label} must be a finite number, zero or greater."
				),
			});
		}
	}
	for (label, boost) in
		[("fusion.date_boost", cfg.fusion.date_boost), ("fusion.path_boost", cfg.fusion.path_boost)]
	{
		if !boost.is_finite() || boost < 1.0 {
			return Err(Error::Validation {
				message: format!("{label} must be a finite number of at least 1.0."),
			});
		}
	}

	Ok(())
}

fn normalize(cfg: &mut Config) {
	cfg.search.category = cfg.search.category.trim().to_string();
	cfg.storage.qdrant.collection = cfg.storage.qdrant.collection.trim().to_string();

	if cfg.service.log_level.trim().is_empty() {
		cfg.service.log_level = "info".to_string();
	}
}
