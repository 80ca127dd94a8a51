use time::OffsetDateTime;
use uuid::Uuid;

use quarry_domain::access::{AccessLevel, Grant};

use crate::{Error, Result};

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct DocumentGrant {
	pub grant_id: Uuid,
	pub user_id: String,
	pub document_path: String,
	pub level: String,
	pub granted_by: Option<String>,
	pub granted_at: OffsetDateTime,
}
impl DocumentGrant {
	pub fn access_level(&self) -> Result<AccessLevel> {
		self.level.parse().map_err(|err| {
			Error::CorruptRow(format!("document_permissions.{}: {err}", self.grant_id))
		})
	}

	pub fn to_grant(&self) -> Result<Grant> {
		Ok(Grant::new(self.user_id.clone(), self.document_path.clone(), self.access_level()?))
	}
}
