use sqlx::{PgPool, postgres::PgPoolOptions};

use crate::{Result, schema};

/// Advisory lock key serializing concurrent schema bootstraps.
const SCHEMA_LOCK_KEY: i64 = 7_120_115;

pub struct Db {
	pub pool: PgPool,
}
impl Db {
	pub async fn connect(cfg: &quarry_config::Postgres) -> Result<Self> {
		let pool = PgPoolOptions::new()
			.max_connections(cfg.pool_max_conns.max(1))
			.connect(&cfg.dsn)
			.await?;

		Ok(Self { pool })
	}

	/// Applies the idempotent schema under a transaction-scoped advisory lock.
	pub async fn ensure_schema(&self) -> Result<()> {
		let sql = schema::render_schema();
		let mut tx = self.pool.begin().await?;

		sqlx::query("SELECT pg_advisory_xact_lock($1)")
			.bind(SCHEMA_LOCK_KEY)
			.execute(&mut *tx)
			.await?;

		for statement in schema::statements(&sql) {
			sqlx::query(statement).execute(&mut *tx).await?;
		}

		tx.commit().await?;

		tracing::debug!("Permission schema is up to date.");

		Ok(())
	}
}
