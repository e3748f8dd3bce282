#![forbid(unsafe_code)]

use std::io::BufReader;

use camino::Utf8Path;
use log::{debug, info, warn};
use rusqlite::{Connection, Transaction, params_from_iter};
use serde::Serialize;
use wrangle_core::RecordKind;

use super::StoreError;
use super::schema::{insert_sql, is_text_column, recreate_tables};
use crate::sink::csv_file_name;

/// Rows inserted per table.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct LoadSummary {
    /// Rows in `nodes`.
    pub nodes: u64,
    /// Rows in `nodes_tags`.
    pub nodes_tags: u64,
    /// Rows in `ways`.
    pub ways: u64,
    /// Rows in `ways_tags`.
    pub ways_tags: u64,
    /// Rows in `ways_nodes`.
    pub ways_nodes: u64,
    /// `ways_nodes` rows skipped because the referenced node is not in the
    /// extract, as happens for ways crossing the edge of a clipped export.
    pub dangling_way_nodes: u64,
}

impl LoadSummary {
    fn slot(&mut self, kind: RecordKind) -> &mut u64 {
        match kind {
            RecordKind::Node => &mut self.nodes,
            RecordKind::NodeTag => &mut self.nodes_tags,
            RecordKind::Way => &mut self.ways,
            RecordKind::WayTag => &mut self.ways_tags,
            RecordKind::WayNode => &mut self.ways_nodes,
        }
    }

    /// Rows inserted into the table backing `kind`.
    #[must_use]
    pub const fn rows(&self, kind: RecordKind) -> u64 {
        match kind {
            RecordKind::Node => self.nodes,
            RecordKind::NodeTag => self.nodes_tags,
            RecordKind::Way => self.ways,
            RecordKind::WayTag => self.ways_tags,
            RecordKind::WayNode => self.ways_nodes,
        }
    }
}

/// Recreate the map tables and fill them from the CSV files in `csv_dir`.
///
/// Every file must be present and carry the expected header row. Rows are
/// inserted in one transaction, parents first; any failure rolls the whole
/// load back and leaves the freshly created tables empty. Way nodes that
/// reference a node missing from `nodes` are skipped with a warning and
/// counted in [`LoadSummary::dangling_way_nodes`].
pub fn load_csv_dir(
    connection: &mut Connection,
    csv_dir: &Utf8Path,
) -> Result<LoadSummary, StoreError> {
    recreate_tables(connection)?;

    let transaction = connection
        .transaction()
        .map_err(|source| StoreError::Sqlite {
            operation: "begin load transaction",
            source,
        })?;

    let mut summary = LoadSummary::default();
    for kind in RecordKind::ALL {
        let loaded = load_table(&transaction, csv_dir, kind)?;
        debug!("loaded {} rows into {kind}", loaded.inserted);
        *summary.slot(kind) = loaded.inserted;
        summary.dangling_way_nodes += loaded.skipped;
    }

    transaction
        .commit()
        .map_err(|source| StoreError::Sqlite {
            operation: "commit load transaction",
            source,
        })?;

    Ok(summary)
}

/// Open (or create) the database at `database` and load `csv_dir` into it.
///
/// # Examples
/// ```
/// use camino::Utf8PathBuf;
/// use wrangle_core::RecordKind;
/// use wrangle_data::csv_file_name;
/// use wrangle_data::store::load_csv_dir_to_path;
///
/// let temp = tempfile::tempdir().expect("create temp dir");
/// let root = Utf8PathBuf::from_path_buf(temp.path().to_path_buf()).expect("UTF-8 path");
/// for kind in RecordKind::ALL {
///     let mut contents = format!("{}\n", kind.columns().join(","));
///     if kind == RecordKind::Node {
///         contents.push_str("1,36.1,-115.1,a,7,1,2,2016-01-01T00:00:00Z\n");
///     }
///     std::fs::write(root.join(csv_file_name(kind)), contents).expect("write CSV");
/// }
///
/// let summary = load_csv_dir_to_path(&root, &root.join("db/map.db")).expect("load CSVs");
/// assert_eq!(summary.nodes, 1);
/// assert_eq!(summary.ways, 0);
/// ```
pub fn load_csv_dir_to_path(
    csv_dir: &Utf8Path,
    database: &Utf8Path,
) -> Result<LoadSummary, StoreError> {
    wrangle_fs::ensure_parent_dir(database).map_err(|source| StoreError::CreateDir {
        path: database.to_owned(),
        source,
    })?;
    let mut connection = Connection::open(database).map_err(|source| StoreError::Open {
        path: database.to_owned(),
        source,
    })?;
    info!("loading {csv_dir} into {database}");
    let summary = load_csv_dir(&mut connection, csv_dir)?;
    info!(
        "loaded {} nodes and {} ways into {database}",
        summary.nodes, summary.ways
    );
    Ok(summary)
}

#[derive(Debug, Clone, Copy, Default)]
struct TableLoad {
    inserted: u64,
    skipped: u64,
}

fn load_table(
    transaction: &Transaction<'_>,
    csv_dir: &Utf8Path,
    kind: RecordKind,
) -> Result<TableLoad, StoreError> {
    let path = csv_dir.join(csv_file_name(kind));
    let file = wrangle_fs::open_input(&path).map_err(|source| StoreError::OpenCsv {
        path,
        source,
    })?;
    let mut reader = csv::Reader::from_reader(BufReader::new(file));

    let headers = reader
        .headers()
        .map_err(|source| StoreError::Csv { table: kind, source })?;
    let columns = kind.columns();
    if headers.iter().ne(columns.iter().copied()) {
        return Err(StoreError::UnexpectedHeader {
            table: kind,
            found: headers.iter().collect::<Vec<_>>().join(","),
        });
    }

    let mut insert = transaction
        .prepare_cached(&insert_sql(kind))
        .map_err(|source| StoreError::Sqlite {
            operation: "prepare insert",
            source,
        })?;

    let mut record = csv::StringRecord::new();
    let mut row = 0_u64;
    let mut loaded = TableLoad::default();
    while reader
        .read_record(&mut record)
        .map_err(|source| StoreError::Csv { table: kind, source })?
    {
        row += 1;
        let values = record.iter().zip(columns).map(|(value, column)| {
            if value.is_empty() && !is_text_column(column) {
                None
            } else {
                Some(value)
            }
        });
        let changed = insert
            .execute(params_from_iter(values))
            .map_err(|source| StoreError::Insert {
                table: kind,
                row,
                source,
            })?;
        if changed == 0 {
            warn!(
                "skipping {kind} row {row}: node {} is not in the extract",
                record.get(1).unwrap_or_default()
            );
            loaded.skipped += 1;
        } else {
            loaded.inserted += 1;
        }
    }
    Ok(loaded)
}
