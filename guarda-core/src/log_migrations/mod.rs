//! Event log schema, kept apart from the account store
//!
//! Applied by `LoggingService` against logs.duckdb with the same
//! bootstrap-then-pending scheme as the main migrations.

/// Log migrations in application order: (filename, sql_content)
pub const LOG_MIGRATIONS: &[(&str, &str)] = &[
    ("000_migrations.sql", include_str!("000_migrations.sql")),
    ("001_initial_schema.sql", include_str!("001_initial_schema.sql")),
];
