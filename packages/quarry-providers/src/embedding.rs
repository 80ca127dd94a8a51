use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::{Error, Result};

/// Embeds `texts` through an OpenAI-compatible `/embeddings` endpoint.
///
/// The returned vectors follow the order of `texts`.
pub async fn embed(
	cfg: &quarry_config::EmbeddingProviderConfig,
	texts: &[String],
) -> Result<Vec<Vec<f32>>> {
	if texts.is_empty() {
		return Ok(Vec::new());
	}

	let client = Client::builder().timeout(Duration::from_millis(cfg.timeout_ms)).build()?;
	let url = format!("{}{}", cfg.api_base, cfg.path);
	let body = serde_json::json!({
		"model": cfg.model,
		"input": texts,
		"dimensions": cfg.dimensions,
	});
	let response = client
		.post(url)
		.headers(crate::auth_headers(&cfg.api_key, &cfg.default_headers)?)
		.json(&body)
		.send()
		.await?
		.error_for_status()?;
	let vectors = parse_embedding_response(response.json().await?)?;

	if vectors.len() != texts.len() {
		return Err(Error::InvalidResponse {
			message: format!(
				"Embedding response returned {} vectors for {} inputs.",
				vectors.len(),
				texts.len()
			),
		});
	}

	Ok(vectors)
}

/// Reads `data[].embedding`, ordered by each item's `index` (position when absent).
fn parse_embedding_response(json: Value) -> Result<Vec<Vec<f32>>> {
	let items = json.get("data").and_then(Value::as_array).ok_or_else(|| {
		Error::InvalidResponse { message: "Embedding response is missing data array.".to_string() }
	})?;
	let mut ordered = items
		.iter()
		.enumerate()
		.map(|(position, item)| {
			let index = item
				.get("index")
				.and_then(Value::as_u64)
				.map_or(position, |index| index as usize);
			let values = item.get("embedding").and_then(Value::as_array).ok_or_else(|| {
				Error::InvalidResponse {
					message: "Embedding item missing embedding array.".to_string(),
				}
			})?;
			let vector = values
				.iter()
				.map(|value| {
					value.as_f64().map(|number| number as f32).ok_or_else(|| {
						Error::InvalidResponse {
							message: "Embedding value must be numeric.".to_string(),
						}
					})
				})
				.collect::<Result<Vec<f32>>>()?;

			Ok((index, vector))
		})
		.collect::<Result<Vec<(usize, Vec<f32>)>>>()?;

	ordered.sort_by_key(|(index, _)| *index);

	Ok(ordered.into_iter().map(|(_, vector)| vector).collect())
}
