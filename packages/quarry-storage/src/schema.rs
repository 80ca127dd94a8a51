const DOCUMENT_PERMISSIONS: &str = "\
CREATE TABLE IF NOT EXISTS document_permissions (
	grant_id uuid PRIMARY KEY,
	user_id text NOT NULL,
	document_path text NOT NULL,
	level text NOT NULL CHECK (level IN ('READ', 'DENY')),
	granted_by text NULL,
	granted_at timestamptz NOT NULL,
	CONSTRAINT document_permissions_user_path_key UNIQUE (user_id, document_path)
);
CREATE INDEX IF NOT EXISTS idx_document_permissions_user
	ON document_permissions (user_id)";

pub fn render_schema() -> String {
	[DOCUMENT_PERMISSIONS].join(";\n")
}

/// Splits rendered schema text into executable statements.
pub fn statements(sql: &str) -> impl Iterator<Item = &str> {
	sql.split(';').map(str::trim).filter(|statement| !statement.is_empty())
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn schema_splits_into_table_and_index() {
		let sql = render_schema();
		let statements: Vec<_> = statements(&sql).collect();

		assert_eq!(statements.len(), 2);
		assert!(statements[0].starts_with("CREATE TABLE IF NOT EXISTS document_permissions"));
		assert!(statements[1].starts_with("CREATE INDEX IF NOT EXISTS"));
	}
}
