use std::{
	fmt::{Display, Formatter},
	str::FromStr,
};

use serde::{Deserialize, Serialize};

use crate::path;

#[derive(Clone, Copy, Debug, Deserialize, Eq, Hash, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AccessLevel {
	Read,
	Deny,
}
impl AccessLevel {
	pub fn as_str(self) -> &'static str {
		match self {
			Self::Read => "READ",
			Self::Deny => "DENY",
		}
	}
}

impl Display for AccessLevel {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		self.as_str().fmt(f)
	}
}

impl FromStr for AccessLevel {
	type Err = UnknownAccessLevel;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s {
			"READ" => Ok(Self::Read),
			"DENY" => Ok(Self::Deny),
			other => Err(UnknownAccessLevel(other.to_string())),
		}
	}
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownAccessLevel(pub String);

impl Display for UnknownAccessLevel {
	fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
		write!(f, "Unknown access level {:?}.", self.0)
	}
}

impl std::error::Error for UnknownAccessLevel {}

/// A user's access rule for a document path and everything below it.
#[derive(Clone, Debug, Deserialize, Eq, PartialEq, Serialize)]
pub struct Grant {
	pub user_id: String,
	pub document_path: String,
	pub level: AccessLevel,
}
impl Grant {
	pub fn new(
		user_id: impl Into<String>,
		document_path: impl Into<String>,
		level: AccessLevel,
	) -> Self {
		Self { user_id: user_id.into(), document_path: document_path.into(), level }
	}

	pub fn covers(&self, document_path: &str) -> bool {
		path::is_within(document_path, &self.document_path)
	}
}

/// Resolves the effective access level for `document_path`.
///
/// The covering grant with the longest path decides; a DENY wins a tie. `None` means no grant
/// covers the path, which callers must treat as denial.
pub fn resolve<'a, I>(document_path: &str, grants: I) -> Option<AccessLevel>
where
	I: IntoIterator<Item = &'a Grant>,
{
	let mut best: Option<&Grant> = None;

	for grant in grants.into_iter().filter(|grant| grant.covers(document_path)) {
		let replace = match best {
			None => true,
			Some(current) => {
				let (len, current_len) = (grant.document_path.len(), current.document_path.len());

				len > current_len || (len == current_len && grant.level == AccessLevel::Deny)
			},
		};

		if replace {
			best = Some(grant);
		}
	}

	best.map(|grant| grant.level)
}

pub fn can_read<'a, I>(document_path: &str, grants: I) -> bool
where
	I: IntoIterator<Item = &'a Grant>,
{
	resolve(document_path, grants) == Some(AccessLevel::Read)
}

/// True when granting `new` must delete `existing`: a READ grant supersedes the same user's READ
/// grants on strictly deeper paths. DENY grants are never pruned.
pub fn superseded_by(existing: &Grant, new: &Grant) -> bool {
	new.level == AccessLevel::Read
		&& existing.level == AccessLevel::Read
		&& existing.user_id == new.user_id
		&& existing.document_path != new.document_path
		&& path::is_within(&existing.document_path, &new.document_path)
}
