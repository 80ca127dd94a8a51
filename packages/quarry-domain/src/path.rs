/// Separator between hierarchy levels of a document path, e.g. `docs > sub > page`.
pub const PATH_SEPARATOR: &str = " > ";

pub fn segments(path: &str) -> impl Iterator<Item = &str> {
	path.split(PATH_SEPARATOR).map(str::trim).filter(|segment| !segment.is_empty())
}

/// True when `path` is `ancestor` itself or lies strictly below it.
pub fn is_within(path: &str, ancestor: &str) -> bool {
	match path.strip_prefix(ancestor) {
		Some("") => true,
		Some(rest) => rest.starts_with(PATH_SEPARATOR),
		None => false,
	}
}

/// Canonical form of a user supplied path: segments trimmed and rejoined.
///
/// Returns `None` for paths with an empty segment.
pub fn normalize(path: &str) -> Option<String> {
	let mut out = Vec::new();

	for segment in path.split(PATH_SEPARATOR.trim()) {
		let segment = segment.trim();

		if segment.is_empty() {
			return None;
		}

		out.push(segment);
	}

	Some(out.join(PATH_SEPARATOR))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn within_requires_a_segment_boundary() {
		assert!(is_within("docs", "docs"));
		assert!(is_within("docs > sub > page", "docs"));
		assert!(is_within("docs > sub > page", "docs > sub"));
		assert!(!is_within("docs2 > page", "docs"));
		assert!(!is_within("docsub", "docs"));
		assert!(!is_within("docs", "docs > sub"));
	}

	#[test]
	fn segments_split_on_separator() {
		let parts: Vec<_> = segments("root > team > notes").collect();

		assert_eq!(parts, vec!["root", "team", "notes"]);
	}

	#[test]
	fn normalize_tightens_spacing() {
		assert_eq!(normalize(" docs>sub  >  page ").as_deref(), Some("docs > sub > page"));
		assert_eq!(normalize("docs"), Some("docs".to_string()));
		assert_eq!(normalize("docs > > page"), None);
		assert_eq!(normalize("   "), None);
	}
}
