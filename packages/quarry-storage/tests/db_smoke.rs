use time::OffsetDateTime;

use quarry_config::Postgres;
use quarry_domain::access::AccessLevel;
use quarry_storage::{
	db::Db,
	grants::{self, UpsertGrantArgs},
};

async fn bootstrapped_db(dsn: &str) -> Db {
	let cfg = Postgres { dsn: dsn.to_string(), pool_max_conns: 1 };
	let db = Db::connect(&cfg).await.expect("Failed to connect to Postgres.");

	db.ensure_schema().await.expect("Failed to ensure schema.");

	db
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QUARRY_PG_DSN to run."]
async fn schema_bootstrap_is_repeatable() {
	let Some(sandbox) = quarry_testkit::sandbox().await else {
		eprintln!("Skipping schema_bootstrap_is_repeatable; set QUARRY_PG_DSN to run this test.");

		return;
	};
	let db = bootstrapped_db(sandbox.dsn()).await;

	db.ensure_schema().await.expect("Second bootstrap must succeed.");

	let count: i64 = sqlx::query_scalar(
		"SELECT count(*) FROM information_schema.tables WHERE table_name = 'document_permissions'",
	)
	.fetch_one(&db.pool)
	.await
	.expect("Failed to query schema tables.");

	assert_eq!(count, 1);

	db.pool.close().await;
	sandbox.cleanup().await.expect("Failed to cleanup sandbox.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QUARRY_PG_DSN to run."]
async fn grant_upsert_is_last_write_wins() {
	let Some(sandbox) = quarry_testkit::sandbox().await else {
		eprintln!("Skipping grant_upsert_is_last_write_wins; set QUARRY_PG_DSN to run this test.");

		return;
	};
	let db = bootstrapped_db(sandbox.dsn()).await;
	let now = OffsetDateTime::now_utc();

	for level in [AccessLevel::Read, AccessLevel::Deny] {
		grants::upsert_grant(
			&db.pool,
			UpsertGrantArgs {
				user_id: "u1",
				document_path: "docs > sub",
				level,
				granted_by: Some("admin"),
				now,
			},
		)
		.await
		.expect("Failed to upsert grant.");
	}

	let rows = grants::list_grants_for_user(&db.pool, "u1").await.expect("Failed to list grants.");

	assert_eq!(rows.len(), 1);
	assert_eq!(rows[0].access_level().expect("Stored level must parse."), AccessLevel::Deny);
	assert!(grants::list_grants_for_user(&db.pool, "u2").await.expect("List failed.").is_empty());

	assert!(grants::delete_grant(&db.pool, "u1", "docs > sub").await.expect("Delete failed."));
	assert!(!grants::delete_grant(&db.pool, "u1", "docs > sub").await.expect("Delete failed."));

	db.pool.close().await;
	sandbox.cleanup().await.expect("Failed to cleanup sandbox.");
}

#[tokio::test]
#[ignore = "Requires external Postgres. Set QUARRY_PG_DSN to run."]
async fn unknown_levels_are_rejected_by_the_schema() {
	let Some(sandbox) = quarry_testkit::sandbox().await else {
		eprintln!("Skipping unknown_levels_are_rejected_by_the_schema; set QUARRY_PG_DSN to run.");

		return;
	};
	let db = bootstrapped_db(sandbox.dsn()).await;
	let result = sqlx::query(
		"\
INSERT INTO document_permissions (grant_id, user_id, document_path, level, granted_at)
VALUES (gen_random_uuid(), 'u1', 'docs', 'WRITE', now())",
	)
	.execute(&db.pool)
	.await;

	assert!(result.is_err());

	db.pool.close().await;
	sandbox.cleanup().await.expect("Failed to cleanup sandbox.");
}
