const CHUNK_MARKER: &str = "_chunk_";

/// Logical document id of a possibly chunked id: `doc_chunk_3` belongs to `doc`.
///
/// Ids without a numeric chunk suffix are returned unchanged. Nested suffixes are all stripped, so
/// the result is itself a logical id.
pub fn logical_id(id: &str) -> &str {
	let mut current = id;

	while let Some((logical, _)) = split_chunk_id(current) {
		current = logical;
	}

	current
}

pub fn chunk_index(id: &str) -> Option<u32> {
	split_chunk_id(id).map(|(_, index)| index)
}

fn split_chunk_id(id: &str) -> Option<(&str, u32)> {
	let marker = id.rfind(CHUNK_MARKER)?;
	let (logical, rest) = id.split_at(marker);
	let digits = &rest[CHUNK_MARKER.len()..];

	if logical.is_empty() || digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
		return None;
	}

	Some((logical, digits.parse().ok()?))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn strips_numeric_chunk_suffix() {
		assert_eq!(logical_id("p1_chunk_0"), "p1");
		assert_eq!(logical_id("guide_chunk_12"), "guide");
		assert_eq!(chunk_index("guide_chunk_12"), Some(12));
	}

	#[test]
	fn keeps_ids_without_a_valid_suffix() {
		assert_eq!(logical_id("p1"), "p1");
		assert_eq!(logical_id("p1_chunk_"), "p1_chunk_");
		assert_eq!(logical_id("p1_chunk_x"), "p1_chunk_x");
		assert_eq!(logical_id("_chunk_4"), "_chunk_4");
		assert_eq!(chunk_index("p1"), None);
	}

	#[test]
	fn nested_suffixes_strip_to_a_fixed_point() {
		assert_eq!(logical_id("a_chunk_1_chunk_2"), "a");
		assert_eq!(chunk_index("a_chunk_1_chunk_2"), Some(2));
		assert_eq!(logical_id(logical_id("a_chunk_1_chunk_2")), "a");
	}
}
