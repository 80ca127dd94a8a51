use std::fmt::{Display, Formatter};

use serde::{Deserialize, Serialize};

/// Searchable fields of an indexed document.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentField {
	Title,
	Content,
	Path,
	Keywords,
}
impl DocumentField {
	pub const ALL: [Self; 4] = [Self::Title, Self::Content, Self::Path, Self::Keywords];

	/// Payload key holding the field's text.
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Title => "title",
			Self::Content => "content",
			Self::Path => "path",
			Self::Keywords => "keywords",
		}
	}
}

/// The closed set of retrieval strategies a query can be split into.
///
/// The variant order is the order in which per-kind rankings are visited during fusion.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CriterionKind {
	Keyword,
	Title,
	Content,
	Path,
}
impl CriterionKind {
	pub const ALL: [Self; 4] = [Self::Keyword, Self::Title, Self::Content, Self::Path];

	pub fn as_str(self) -> &'static str {
		match self {
			Self::Keyword => "keyword",
			Self::Title => "title",
			Self::Content => "content",
			Self::Path => "path",
		}
	}

	/// Static lexical field weighting used when this kind is queried.
	pub fn field_weights(self) -> &'static [(DocumentField, f32)] {
		match self {
			Self::Keyword => &[
				(DocumentField::Keywords, 3.0),
				(DocumentField::Title, 2.0),
				(DocumentField::Content, 1.0),
			],
			Self::Title => &[(DocumentField::Title, 3.0), (DocumentField::Keywords, 1.0)],
			Self::Content => &[(DocumentField::Content, 3.0), (DocumentField::Title, 1.0)],
			Self::Path => &[(DocumentField::Path, 3.0), (DocumentField::Title, 1.0)],
		}
	}

	/// Whether the query text of this kind may be embedded.
	///
	/// Indexed vectors are document body embeddings, so only content text lives in the same space.
	pub fn is_embedding_source(self) -> bool {
		matches!(self, Self::Content)
	}
}

impl Display for CriterionKind {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

/// One typed facet of a search request.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SearchCriterion {
	kind: CriterionKind,
	terms: Vec<String>,
}
impl SearchCriterion {
	/// Builds a criterion, dropping blank terms and trimming the rest.
	pub fn new<I, S>(kind: CriterionKind, terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		let terms = terms
			.into_iter()
			.map(|term| term.as_ref().trim().to_string())
			.filter(|term| !term.is_empty())
			.collect();

		Self { kind, terms }
	}

	pub fn keyword<I, S>(terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::new(CriterionKind::Keyword, terms)
	}

	pub fn title<I, S>(terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::new(CriterionKind::Title, terms)
	}

	pub fn content<I, S>(terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::new(CriterionKind::Content, terms)
	}

	pub fn path<I, S>(terms: I) -> Self
	where
		I: IntoIterator<Item = S>,
		S: AsRef<str>,
	{
		Self::new(CriterionKind::Path, terms)
	}

	pub fn kind(&self) -> CriterionKind {
		self.kind
	}

	pub fn terms(&self) -> &[String] {
		&self.terms
	}

	pub fn is_empty(&self) -> bool {
		self.terms.is_empty()
	}

	pub fn to_query(&self) -> String {
		self.terms.join(" ")
	}
}

/// Facets extracted from a user query before retrieval.
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct QueryFacets {
	pub keywords: Vec<String>,
	pub title: Vec<String>,
	pub content: Vec<String>,
	pub path: Vec<String>,
	/// Date hints such as "2024" or "March", matched against titles during ranking.
	pub dates: Vec<String>,
}
impl QueryFacets {
	/// Criteria in fusion order; empty facets yield empty criteria.
	pub fn criteria(&self) -> Vec<SearchCriterion> {
		vec![
			SearchCriterion::keyword(&self.keywords),
			SearchCriterion::title(&self.title),
			SearchCriterion::content(&self.content),
			SearchCriterion::path(&self.path),
		]
	}
}
