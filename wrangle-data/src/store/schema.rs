#![forbid(unsafe_code)]

use rusqlite::{Connection, Transaction};
use wrangle_core::RecordKind;

use super::StoreError;

/// Drop and recreate the five map tables.
///
/// Foreign keys are switched on for the connection first, so later inserts
/// must arrive parents first: nodes, then ways, then their children.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use wrangle_data::store::recreate_tables;
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// recreate_tables(&mut conn).expect("create map tables");
///
/// let tables: i64 = conn
///     .query_row(
///         "SELECT COUNT(*) FROM sqlite_master WHERE type = 'table'",
///         [],
///         |row| row.get(0),
///     )
///     .expect("count tables");
/// assert_eq!(tables, 5);
/// ```
pub fn recreate_tables(connection: &mut Connection) -> Result<(), StoreError> {
    connection
        .pragma_update(None, "foreign_keys", true)
        .map_err(|source| StoreError::ForeignKeys { source })?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Migration {
            step: "begin schema transaction",
            source,
        })?;

    drop_tables(&transaction)?;
    create_tables(&transaction)?;

    transaction
        .commit()
        .map_err(|source| StoreError::Migration {
            step: "commit schema transaction",
            source,
        })
}

// Children go first so the drops never trip a foreign key.
fn drop_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(transaction, "drop ways_nodes", "DROP TABLE IF EXISTS ways_nodes")?;
    run_migration_step(transaction, "drop ways_tags", "DROP TABLE IF EXISTS ways_tags")?;
    run_migration_step(transaction, "drop nodes_tags", "DROP TABLE IF EXISTS nodes_tags")?;
    run_migration_step(transaction, "drop ways", "DROP TABLE IF EXISTS ways")?;
    run_migration_step(transaction, "drop nodes", "DROP TABLE IF EXISTS nodes")
}

fn create_tables(transaction: &Transaction<'_>) -> Result<(), StoreError> {
    run_migration_step(
        transaction,
        "create nodes",
        "CREATE TABLE nodes (
            id INTEGER PRIMARY KEY NOT NULL,
            lat REAL,
            lon REAL,
            user TEXT,
            uid INTEGER,
            version INTEGER,
            changeset INTEGER,
            timestamp TEXT
        )",
    )?;
    run_migration_step(
        transaction,
        "create nodes_tags",
        "CREATE TABLE nodes_tags (
            id INTEGER,
            key TEXT,
            value TEXT,
            type TEXT,
            FOREIGN KEY (id) REFERENCES nodes(id)
        )",
    )?;
    run_migration_step(
        transaction,
        "create ways",
        "CREATE TABLE ways (
            id INTEGER PRIMARY KEY NOT NULL,
            user TEXT,
            uid INTEGER,
            version TEXT,
            changeset INTEGER,
            timestamp TEXT
        )",
    )?;
    run_migration_step(
        transaction,
        "create ways_tags",
        "CREATE TABLE ways_tags (
            id INTEGER NOT NULL,
            key TEXT NOT NULL,
            value TEXT NOT NULL,
            type TEXT,
            FOREIGN KEY (id) REFERENCES ways(id)
        )",
    )?;
    run_migration_step(
        transaction,
        "create ways_nodes",
        "CREATE TABLE ways_nodes (
            id INTEGER NOT NULL,
            node_id INTEGER NOT NULL,
            position INTEGER NOT NULL,
            FOREIGN KEY (id) REFERENCES ways(id),
            FOREIGN KEY (node_id) REFERENCES nodes(id)
        )",
    )
}

fn run_migration_step(
    transaction: &Transaction<'_>,
    step: &'static str,
    sql: &str,
) -> Result<(), StoreError> {
    transaction
        .execute(sql, [])
        .map(|_| ())
        .map_err(|source| StoreError::Migration { step, source })
}

/// `INSERT` statement for the table backing `kind`, columns in CSV order.
///
/// Way nodes are only inserted when the referenced node exists; the
/// statement then changes no rows instead of tripping the foreign key.
pub(super) fn insert_sql(kind: RecordKind) -> String {
    let columns = kind.columns();
    let placeholders = (1..=columns.len())
        .map(|index| format!("?{index}"))
        .collect::<Vec<_>>()
        .join(", ");
    let target = format!("INSERT INTO {} ({})", kind.table(), columns.join(", "));
    match kind {
        RecordKind::WayNode => format!(
            "{target} SELECT {placeholders} \
             WHERE EXISTS (SELECT 1 FROM nodes WHERE id = CAST(?2 AS INTEGER))"
        ),
        _ => format!("{target} VALUES ({placeholders})"),
    }
}

// Text columns keep empty strings; everything else stores them as NULL.
pub(super) fn is_text_column(column: &str) -> bool {
    matches!(column, "user" | "key" | "value" | "type" | "timestamp")
}
