#![forbid(unsafe_code)]

use camino::Utf8Path;
use rusqlite::{Connection, OpenFlags, OptionalExtension, Row};
use serde::Serialize;

use super::StoreError;

/// A contributor and the number of nodes and ways they last edited.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserContribution {
    /// Display name from the `user` column.
    pub user: String,
    /// Nodes plus ways attributed to `user`.
    pub contributions: u64,
}

/// Summary statistics over a loaded map database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct MapReport {
    /// Distinct `uid` values across nodes and ways.
    pub unique_users: u64,
    /// Rows in `nodes`.
    pub nodes: u64,
    /// Rows in `ways`.
    pub ways: u64,
    /// Node tags valued `cafe` or `coffee_shop`.
    pub cafes: u64,
    /// The ten most prolific users, busiest first.
    pub top_users: Vec<UserContribution>,
    /// Most common `religion` among places of worship, if any are tagged.
    pub most_popular_religion: Option<String>,
    /// Node tags naming a school, college, kindergarten or university.
    pub schools: u64,
    /// Way tags naming a casino or other gambling venue.
    pub casinos: u64,
}

const UNIQUE_USERS: &str = "SELECT COUNT(DISTINCT uid)
    FROM (SELECT uid FROM nodes UNION SELECT uid FROM ways)";

const NODES: &str = "SELECT COUNT(*) FROM nodes";

const WAYS: &str = "SELECT COUNT(*) FROM ways";

const CAFES: &str = "SELECT COUNT(*) FROM nodes_tags
    WHERE value IN ('cafe', 'coffee_shop')";

const TOP_USERS: &str = "SELECT user, COUNT(*) AS num
    FROM (SELECT user FROM nodes UNION ALL SELECT user FROM ways)
    WHERE user IS NOT NULL
    GROUP BY user
    ORDER BY num DESC, user ASC
    LIMIT 10";

const RELIGION: &str = "SELECT tags.value, COUNT(*) AS num
    FROM nodes_tags AS tags
    JOIN (SELECT DISTINCT id FROM nodes_tags WHERE value = 'place_of_worship') AS worship
        ON tags.id = worship.id
    WHERE tags.key = 'religion'
    GROUP BY tags.value
    ORDER BY num DESC, tags.value ASC
    LIMIT 1";

// `kindergarden` is a common misspelling in the source data.
const SCHOOLS: &str = "SELECT COUNT(*) FROM nodes_tags
    WHERE value IN ('school', 'college', 'kindergarten', 'kindergarden', 'university')";

const CASINOS: &str = "SELECT COUNT(*) FROM ways_tags
    WHERE value IN ('casino', 'adult_gaming_centre', 'amusement_arcade', 'gambling')";

/// Run every report query against `connection`.
///
/// # Examples
/// ```
/// use rusqlite::Connection;
/// use wrangle_data::store::{recreate_tables, run_report};
///
/// let mut conn = Connection::open_in_memory().expect("create in-memory database");
/// recreate_tables(&mut conn).expect("create map tables");
/// conn.execute("INSERT INTO nodes (id, user, uid) VALUES (1, 'a', 7)", [])
///     .expect("insert node");
/// conn.execute("INSERT INTO nodes_tags (id, key, value) VALUES (1, 'amenity', 'cafe')", [])
///     .expect("insert tag");
///
/// let report = run_report(&conn).expect("run report");
/// assert_eq!(report.nodes, 1);
/// assert_eq!(report.cafes, 1);
/// assert_eq!(report.most_popular_religion, None);
/// ```
pub fn run_report(connection: &Connection) -> Result<MapReport, StoreError> {
    Ok(MapReport {
        unique_users: count(connection, "unique users", UNIQUE_USERS)?,
        nodes: count(connection, "node count", NODES)?,
        ways: count(connection, "way count", WAYS)?,
        cafes: count(connection, "cafe count", CAFES)?,
        top_users: top_users(connection)?,
        most_popular_religion: most_popular_religion(connection)?,
        schools: count(connection, "school count", SCHOOLS)?,
        casinos: count(connection, "casino count", CASINOS)?,
    })
}

/// Open the database at `database` read-only and run the report.
pub fn report_for_path(database: &Utf8Path) -> Result<MapReport, StoreError> {
    let connection = Connection::open_with_flags(database, OpenFlags::SQLITE_OPEN_READ_ONLY)
        .map_err(|source| StoreError::Open {
            path: database.to_owned(),
            source,
        })?;
    run_report(&connection)
}

fn count(connection: &Connection, query: &'static str, sql: &str) -> Result<u64, StoreError> {
    connection
        .query_row(sql, [], |row| non_negative(row, 0))
        .map_err(|source| StoreError::Query { query, source })
}

fn top_users(connection: &Connection) -> Result<Vec<UserContribution>, StoreError> {
    let query = "top users";
    let mut statement = connection
        .prepare(TOP_USERS)
        .map_err(|source| StoreError::Query { query, source })?;
    let rows = statement
        .query_map([], |row| {
            Ok(UserContribution {
                user: row.get(0)?,
                contributions: non_negative(row, 1)?,
            })
        })
        .map_err(|source| StoreError::Query { query, source })?;
    rows.collect::<Result<_, _>>()
        .map_err(|source| StoreError::Query { query, source })
}

fn most_popular_religion(connection: &Connection) -> Result<Option<String>, StoreError> {
    connection
        .query_row(RELIGION, [], |row| row.get(0))
        .optional()
        .map_err(|source| StoreError::Query {
            query: "most popular religion",
            source,
        })
}

fn non_negative(row: &Row<'_>, index: usize) -> rusqlite::Result<u64> {
    let value: i64 = row.get(index)?;
    Ok(u64::try_from(value).unwrap_or_default())
}
