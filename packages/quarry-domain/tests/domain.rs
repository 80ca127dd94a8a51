use quarry_domain::{
	access::{self, AccessLevel, Grant},
	criteria::{CriterionKind, QueryFacets, SearchCriterion},
};

fn grant(path: &str, level: AccessLevel) -> Grant {
	Grant::new("u1", path, level)
}

#[test]
fn child_read_overrides_parent_deny() {
	let grants = vec![grant("docs", AccessLevel::Deny), grant("docs > sub", AccessLevel::Read)];

	assert!(access::can_read("docs > sub > page", &grants));
	assert!(access::can_read("docs > sub", &grants));
	assert!(!access::can_read("docs > other", &grants));
	assert!(!access::can_read("docs", &grants));
}

#[test]
fn child_deny_overrides_parent_read() {
	let grants = vec![grant("root", AccessLevel::Read), grant("root > hr", AccessLevel::Deny)];

	assert!(access::can_read("root > eng > design", &grants));
	assert!(!access::can_read("root > hr > salaries", &grants));
}

#[test]
fn uncovered_paths_resolve_to_nothing() {
	let grants = vec![grant("root", AccessLevel::Read)];

	assert_eq!(access::resolve("rooted > page", &grants), None);
	assert!(!access::can_read("elsewhere", &grants));
	assert!(!access::can_read("root > page", &Vec::<Grant>::new()));
}

#[test]
fn deny_wins_an_equal_length_tie() {
	let grants = vec![grant("docs", AccessLevel::Read), grant("docs", AccessLevel::Deny)];

	assert_eq!(access::resolve("docs > page", &grants), Some(AccessLevel::Deny));
}

#[test]
fn read_supersedes_deeper_reads_only() {
	let new = grant("docs", AccessLevel::Read);

	assert!(access::superseded_by(&grant("docs > sub", AccessLevel::Read), &new));
	assert!(!access::superseded_by(&grant("docs > sub", AccessLevel::Deny), &new));
	assert!(!access::superseded_by(&grant("docs", AccessLevel::Read), &new));
	assert!(!access::superseded_by(&grant("docsub", AccessLevel::Read), &new));
	assert!(!access::superseded_by(
		&Grant::new("u2", "docs > sub", AccessLevel::Read),
		&new
	));
	assert!(!access::superseded_by(
		&grant("docs > sub", AccessLevel::Read),
		&grant("docs", AccessLevel::Deny)
	));
}

#[test]
fn access_level_round_trips_through_text() {
	assert_eq!("READ".parse::<AccessLevel>(), Ok(AccessLevel::Read));
	assert_eq!("DENY".parse::<AccessLevel>(), Ok(AccessLevel::Deny));
	assert!("read".parse::<AccessLevel>().is_err());
	assert_eq!(
		serde_json::to_string(&AccessLevel::Deny).expect("Failed to serialize level."),
		"\"DENY\""
	);
}

#[test]
fn facets_expand_to_criteria_in_fusion_order() {
	let facets: QueryFacets = serde_json::from_value(serde_json::json!({
		"keywords": ["alpha"],
		"content": ["alpha detail"],
		"dates": ["2024"]
	}))
	.expect("Failed to parse facets.");
	let criteria = facets.criteria();
	let kinds: Vec<_> = criteria.iter().map(SearchCriterion::kind).collect();

	assert_eq!(kinds, CriterionKind::ALL.to_vec());

	let active: Vec<_> = criteria.iter().filter(|criterion| !criterion.is_empty()).collect();

	assert_eq!(active.len(), 2);
	assert_eq!(active[0].to_query(), "alpha");
	assert_eq!(active[1].to_query(), "alpha detail");
}
