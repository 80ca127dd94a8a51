use sqlx::PgExecutor;
use time::OffsetDateTime;
use uuid::Uuid;

use quarry_domain::access::AccessLevel;

use crate::{Error, Result, models::DocumentGrant};

const GRANT_UPSERT_SQL: &str = "\
INSERT INTO document_permissions (
\tgrant_id,
\tuser_id,
\tdocument_path,
\tlevel,
\tgranted_by,
\tgranted_at
)
VALUES ($1, $2, $3, $4, $5, $6)
ON CONFLICT (user_id, document_path)
DO UPDATE
SET
\tlevel = EXCLUDED.level,
\tgranted_by = EXCLUDED.granted_by,
\tgranted_at = EXCLUDED.granted_at
RETURNING grant_id, user_id, document_path, level, granted_by, granted_at";

pub struct UpsertGrantArgs<'a> {
	pub user_id: &'a str,
	pub document_path: &'a str,
	pub level: AccessLevel,
	pub granted_by: Option<&'a str>,
	pub now: OffsetDateTime,
}

pub async fn list_grants_for_user<'e, E>(executor: E, user_id: &str) -> Result<Vec<DocumentGrant>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DocumentGrant>(
		"\
SELECT grant_id, user_id, document_path, level, granted_by, granted_at
FROM document_permissions
WHERE user_id = $1
ORDER BY document_path ASC",
	)
	.bind(user_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Same as [`list_grants_for_user`] but row-locks the grants for the rest of the transaction.
pub async fn lock_grants_for_user<'e, E>(executor: E, user_id: &str) -> Result<Vec<DocumentGrant>>
where
	E: PgExecutor<'e>,
{
	let rows = sqlx::query_as::<_, DocumentGrant>(
		"\
SELECT grant_id, user_id, document_path, level, granted_by, granted_at
FROM document_permissions
WHERE user_id = $1
ORDER BY document_path ASC
FOR UPDATE",
	)
	.bind(user_id)
	.fetch_all(executor)
	.await?;

	Ok(rows)
}

/// Inserts the grant for `(user_id, document_path)` or overwrites the existing one.
pub async fn upsert_grant<'e, E>(executor: E, args: UpsertGrantArgs<'_>) -> Result<DocumentGrant>
where
	E: PgExecutor<'e>,
{
	let UpsertGrantArgs { user_id, document_path, level, granted_by, now } = args;

	if user_id.trim().is_empty() || document_path.trim().is_empty() {
		return Err(Error::InvalidArgument(
			"user_id and document_path must be non-empty.".to_string(),
		));
	}

	let row = sqlx::query_as::<_, DocumentGrant>(GRANT_UPSERT_SQL)
		.bind(Uuid::new_v4())
		.bind(user_id)
		.bind(document_path)
		.bind(level.as_str())
		.bind(granted_by)
		.bind(now)
		.fetch_one(executor)
		.await?;

	Ok(row)
}

pub async fn delete_grants_by_id<'e, E>(executor: E, grant_ids: &[Uuid]) -> Result<u64>
where
	E: PgExecutor<'e>,
{
	if grant_ids.is_empty() {
		return Ok(0);
	}

	let result = sqlx::query("DELETE FROM document_permissions WHERE grant_id = ANY($1)")
		.bind(grant_ids)
		.execute(executor)
		.await?;

	Ok(result.rows_affected())
}

pub async fn delete_grant<'e, E>(executor: E, user_id: &str, document_path: &str) -> Result<bool>
where
	E: PgExecutor<'e>,
{
	let result = sqlx::query(
		"DELETE FROM document_permissions WHERE user_id = $1 AND document_path = $2",
	)
	.bind(user_id)
	.bind(document_path)
	.execute(executor)
	.await?;

	Ok(result.rows_affected() > 0)
}
