//! Database schema definitions

/// SQL to create the regdata table: one row per (test unit, dependency)
pub const CREATE_REGDATA_TABLE: &str = r#"
CREATE TABLE IF NOT EXISTS regdata (
    id INTEGER PRIMARY KEY AUTOINCREMENT,
    fullname TEXT NOT NULL,
    url TEXT NOT NULL,
    hash TEXT NOT NULL
)
"#;

/// SQL to create indexes
pub const CREATE_INDEXES: &[&str] = &[
    "CREATE INDEX IF NOT EXISTS idx_regdata_fullname ON regdata(fullname)",
];

/// All schema creation statements
pub fn all_schema_statements() -> Vec<&'static str> {
    let mut stmts = vec![CREATE_REGDATA_TABLE];
    stmts.extend(CREATE_INDEXES.iter().copied());
    stmts
}
