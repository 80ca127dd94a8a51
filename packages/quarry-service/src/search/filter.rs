use quarry_domain::{
	access::{self, Grant},
	path,
};

use crate::search::SearchResult;

/// Keeps the results whose path resolves to READ under `grants`, preserving order.
///
/// Result paths are normalized the way grant paths are before matching; a path that does not
/// normalize is dropped. Paths no grant covers are dropped, so an empty grant list drops
/// everything.
pub fn filter(ranking: Vec<SearchResult>, grants: &[Grant]) -> Vec<SearchResult> {
	if grants.is_empty() {
		return Vec::new();
	}

	ranking
		.into_iter()
		.filter(|result| match path::normalize(&result.path) {
			Some(normalized) => access::can_read(&normalized, grants),
			None => false,
		})
		.collect()
}

#[cfg(test)]
mod tests {
	use quarry_domain::access::AccessLevel;

	use super::*;

	fn at(id: &str, path: &str) -> SearchResult {
		SearchResult {
			id: id.to_string(),
			title: String::new(),
			content: String::new(),
			path: path.to_string(),
			collection: None,
			score: 1.0,
			keywords: None,
			explain: None,
		}
	}

	fn ids(results: &[SearchResult]) -> Vec<&str> {
		results.iter().map(|result| result.id.as_str()).collect()
	}

	#[test]
	fn child_read_overrides_parent_deny() {
		let grants = vec![
			Grant::new("u1", "docs", AccessLevel::Deny),
			Grant::new("u1", "docs > sub", AccessLevel::Read),
		];
		let kept =
			filter(vec![at("page", "docs > sub > page"), at("other", "docs > other")], &grants);

		assert_eq!(ids(&kept), vec!["page"]);
	}

	#[test]
	fn child_deny_overrides_parent_read() {
		let grants = vec![
			Grant::new("u1", "docs", AccessLevel::Read),
			Grant::new("u1", "docs > secret", AccessLevel::Deny),
		];
		let kept = filter(
			vec![at("a", "docs > secret > plan"), at("b", "docs > public"), at("c", "docs")],
			&grants,
		);

		assert_eq!(ids(&kept), vec!["b", "c"]);
	}

	#[test]
	fn no_grants_is_fail_closed() {
		assert!(filter(vec![at("a", "docs"), at("b", "root")], &[]).is_empty());
	}

	#[test]
	fn sibling_prefix_is_not_an_ancestor() {
		let grants = vec![Grant::new("u1", "doc", AccessLevel::Read)];

		assert!(filter(vec![at("a", "docs > x")], &grants).is_empty());
	}

	#[test]
	fn result_paths_match_after_normalization() {
		let grants = vec![Grant::new("u1", "docs", AccessLevel::Read)];
		let kept = filter(
			vec![
				at("tight", "docs>sub"),
				at("padded", "  docs  >  sub  "),
				at("gap", "docs >  > x"),
			],
			&grants,
		);

		assert_eq!(ids(&kept), vec!["tight", "padded"]);
	}

	#[test]
	fn order_is_preserved() {
		let grants = vec![Grant::new("u1", "root", AccessLevel::Read)];
		let kept = filter(
			vec![at("z", "root > z"), at("skip", "elsewhere"), at("a", "root > a")],
			&grants,
		);

		assert_eq!(ids(&kept), vec!["z", "a"]);
	}
}
