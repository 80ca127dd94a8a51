use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{BoxFuture, Error, PermissionStore, QuarryService, Result};
use quarry_domain::{
	access::{self, AccessLevel, Grant},
	path,
};
use quarry_storage::{
	db::Db,
	grants::{self, UpsertGrantArgs},
};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrantRequest {
	pub user_id: String,
	pub document_path: String,
	pub level: AccessLevel,
	#[serde(default)]
	pub granted_by: Option<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct GrantResponse {
	pub grant: Grant,
	/// Child READ grants removed because the new READ grant covers them.
	pub superseded_paths: Vec<String>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevokeRequest {
	pub user_id: String,
	pub document_path: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RevokeResponse {
	pub revoked: bool,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListGrantsRequest {
	pub user_id: String,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListGrantsResponse {
	pub grants: Vec<Grant>,
}

impl QuarryService {
	pub async fn grant_access(&self, req: GrantRequest) -> Result<GrantResponse> {
		let user_id = require_user(&req.user_id)?;
		let document_path = require_path(&req.document_path)?;
		let granted_by =
			req.granted_by.as_deref().map(str::trim).filter(|granted_by| !granted_by.is_empty());
		let grant = Grant::new(user_id, document_path, req.level);
		let superseded_paths = self.backends.permissions.put_grant(&grant, granted_by).await?;

		tracing::info!(
			user_id = %grant.user_id,
			document_path = %grant.document_path,
			level = %grant.level,
			superseded = superseded_paths.len(),
			"Granted document access."
		);

		Ok(GrantResponse { grant, superseded_paths })
	}

	pub async fn revoke_access(&self, req: RevokeRequest) -> Result<RevokeResponse> {
		let user_id = require_user(&req.user_id)?;
		let document_path = require_path(&req.document_path)?;
		let revoked = self.backends.permissions.remove_grant(user_id, &document_path).await?;

		tracing::info!(
			user_id,
			document_path = %document_path,
			revoked,
			"Revoked document access."
		);

		Ok(RevokeResponse { revoked })
	}

	pub async fn list_grants(&self, req: ListGrantsRequest) -> Result<ListGrantsResponse> {
		let user_id = require_user(&req.user_id)?;
		let grants = self.backends.permissions.find_grants_for_user(user_id).await?;

		Ok(ListGrantsResponse { grants })
	}
}

impl PermissionStore for Db {
	fn find_grants_for_user<'a>(&'a self, user_id: &'a str) -> BoxFuture<'a, Result<Vec<Grant>>> {
		Box::pin(async move {
			let rows = grants::list_grants_for_user(&self.pool, user_id).await?;

			rows.iter().map(|row| row.to_grant().map_err(Error::from)).collect()
		})
	}

	fn put_grant<'a>(
		&'a self,
		grant: &'a Grant,
		granted_by: Option<&'a str>,
	) -> BoxFuture<'a, Result<Vec<String>>> {
		Box::pin(put_grant_tx(self, grant, granted_by))
	}

	fn remove_grant<'a>(
		&'a self,
		user_id: &'a str,
		document_path: &'a str,
	) -> BoxFuture<'a, Result<bool>> {
		Box::pin(async move { Ok(grants::delete_grant(&self.pool, user_id, document_path).await?) })
	}
}

async fn put_grant_tx(db: &Db, grant: &Grant, granted_by: Option<&str>) -> Result<Vec<String>> {
	let mut tx = db.pool.begin().await?;
	let existing = grants::lock_grants_for_user(&mut *tx, &grant.user_id).await?;
	let mut superseded_ids = Vec::new();
	let mut superseded_paths = Vec::new();

	for row in &existing {
		if access::superseded_by(&row.to_grant()?, grant) {
			superseded_ids.push(row.grant_id);
			superseded_paths.push(row.document_path.clone());
		}
	}

	grants::delete_grants_by_id(&mut *tx, &superseded_ids).await?;
	grants::upsert_grant(
		&mut *tx,
		UpsertGrantArgs {
			user_id: &grant.user_id,
			document_path: &grant.document_path,
			level: grant.level,
			granted_by,
			now: OffsetDateTime::now_utc(),
		},
	)
	.await?;
	tx.commit().await?;

	Ok(superseded_paths)
}

fn require_user(user_id: &str) -> Result<&str> {
	let user_id = user_id.trim();

	if user_id.is_empty() {
		return Err(Error::InvalidRequest { message: "user_id must be non-empty.".to_string() });
	}

	Ok(user_id)
}

fn require_path(document_path: &str) -> Result<String> {
	path::normalize(document_path).ok_or_else(|| Error::InvalidRequest {
		message: format!("document_path {document_path:?} has an empty segment."),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn paths_are_normalized() {
		assert_eq!(require_path(" docs >sub > page ").ok().as_deref(), Some("docs > sub > page"));
		assert!(matches!(require_path("docs >  > page"), Err(Error::InvalidRequest { .. })));
		assert!(matches!(require_path("   "), Err(Error::InvalidRequest { .. })));
	}

	#[test]
	fn blank_user_is_rejected() {
		assert!(matches!(require_user("  "), Err(Error::InvalidRequest { .. })));
		assert_eq!(require_user(" u1 ").ok(), Some("u1"));
	}
}
