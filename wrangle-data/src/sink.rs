//! CSV sinks, one per output table.

use std::io::{self, Write};

use camino::Utf8PathBuf;
use cap_std::fs_utf8;
use thiserror::Error;
use wrangle_core::{Record, RecordKind, ShapedElement};
use wrangle_fs::OutputDir;

/// Errors raised by [`CsvSinks`]. Every variant names the table involved.
#[derive(Debug, Error)]
pub enum SinkError {
    /// The CSV file backing a sink could not be created.
    #[error("failed to create {path}")]
    Create {
        /// Table the file was created for.
        sink: RecordKind,
        /// Destination path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
    /// A row (or the header row) could not be written.
    #[error("failed to write a row to the {sink} sink")]
    Write {
        /// Table being written.
        sink: RecordKind,
        /// Source error produced by `csv`.
        #[source]
        source: csv::Error,
    },
    /// Buffered rows could not be flushed.
    #[error("failed to flush the {sink} sink")]
    Flush {
        /// Table being flushed.
        sink: RecordKind,
        /// Underlying I/O error.
        #[source]
        source: io::Error,
    },
}

impl SinkError {
    /// The table the failure relates to.
    #[must_use]
    pub const fn sink(&self) -> RecordKind {
        match self {
            Self::Create { sink, .. } | Self::Write { sink, .. } | Self::Flush { sink, .. } => {
                *sink
            }
        }
    }
}

/// File name of the CSV table for `kind`.
#[must_use]
pub fn csv_file_name(kind: RecordKind) -> String {
    format!("{}.csv", kind.table())
}

/// The five tabular outputs. Headers are written when the sinks are opened.
///
/// # Examples
/// ```
/// use wrangle_core::{CleaningRules, ElementKind, RecordKind, Shaper, SourceElement};
/// use wrangle_data::CsvSinks;
///
/// let mut sinks = CsvSinks::open(|_| Ok(Vec::<u8>::new()))?;
/// let rules = CleaningRules::default();
/// let node = SourceElement::new(ElementKind::Node).with_attribute("id", "1");
/// let shaped = Shaper::new(&rules).shape(&node).expect("nodes are shaped");
/// sinks.write(&shaped)?;
///
/// let outputs = sinks.into_inner()?;
/// let (kind, nodes) = &outputs[0];
/// assert_eq!(*kind, RecordKind::Node);
/// assert_eq!(
///     String::from_utf8_lossy(nodes),
///     "id,lat,lon,user,uid,version,changeset,timestamp\n1,,,,,,,\n"
/// );
/// # Ok::<(), wrangle_data::SinkError>(())
/// ```
#[derive(Debug)]
pub struct CsvSinks<W: Write> {
    nodes: csv::Writer<W>,
    node_tags: csv::Writer<W>,
    ways: csv::Writer<W>,
    way_tags: csv::Writer<W>,
    way_nodes: csv::Writer<W>,
}

impl<W: Write> CsvSinks<W> {
    /// Open one writer per table through `make` and write the header rows.
    pub fn open<F>(mut make: F) -> Result<Self, SinkError>
    where
        F: FnMut(RecordKind) -> Result<W, SinkError>,
    {
        let mut writer = |kind: RecordKind| -> Result<csv::Writer<W>, SinkError> {
            let mut writer = csv::Writer::from_writer(make(kind)?);
            writer
                .write_record(kind.columns())
                .map_err(|source| SinkError::Write { sink: kind, source })?;
            Ok(writer)
        };
        Ok(Self {
            nodes: writer(RecordKind::Node)?,
            node_tags: writer(RecordKind::NodeTag)?,
            ways: writer(RecordKind::Way)?,
            way_tags: writer(RecordKind::WayTag)?,
            way_nodes: writer(RecordKind::WayNode)?,
        })
    }

    /// Append every record of a shaped element, in document order.
    pub fn write(&mut self, shaped: &ShapedElement) -> Result<(), SinkError> {
        for (kind, record) in shaped.records() {
            self.write_record(kind, record)?;
        }
        Ok(())
    }

    /// Append a single record to the sink for `kind`.
    pub fn write_record(&mut self, kind: RecordKind, record: &dyn Record) -> Result<(), SinkError> {
        self.writer_mut(kind)
            .write_record(record.row(kind.columns()).iter().map(AsRef::<str>::as_ref))
            .map_err(|source| SinkError::Write { sink: kind, source })
    }

    /// Flush buffered rows to the underlying writers.
    pub fn flush(&mut self) -> Result<(), SinkError> {
        for kind in RecordKind::ALL {
            self.writer_mut(kind)
                .flush()
                .map_err(|source| SinkError::Flush { sink: kind, source })?;
        }
        Ok(())
    }

    /// Flush and return the underlying writers in table order.
    pub fn into_inner(self) -> Result<Vec<(RecordKind, W)>, SinkError> {
        let Self {
            nodes,
            node_tags,
            ways,
            way_tags,
            way_nodes,
        } = self;
        [nodes, node_tags, ways, way_tags, way_nodes]
            .into_iter()
            .zip(RecordKind::ALL)
            .map(|(writer, kind)| {
                writer.into_inner().map(|inner| (kind, inner)).map_err(|err| {
                    SinkError::Flush {
                        sink: kind,
                        source: err.into_error(),
                    }
                })
            })
            .collect()
    }

    fn writer_mut(&mut self, kind: RecordKind) -> &mut csv::Writer<W> {
        match kind {
            RecordKind::Node => &mut self.nodes,
            RecordKind::NodeTag => &mut self.node_tags,
            RecordKind::Way => &mut self.ways,
            RecordKind::WayTag => &mut self.way_tags,
            RecordKind::WayNode => &mut self.way_nodes,
        }
    }
}

impl CsvSinks<fs_utf8::File> {
    /// Create (or truncate) `nodes.csv`, `nodes_tags.csv`, `ways.csv`,
    /// `ways_tags.csv` and `ways_nodes.csv` inside `dir`.
    pub fn create_in(dir: &OutputDir) -> Result<Self, SinkError> {
        Self::open(|kind| {
            let name = csv_file_name(kind);
            dir.create_file(&name).map_err(|source| SinkError::Create {
                sink: kind,
                path: dir.join(&name),
                source,
            })
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use wrangle_core::{REGULAR_TAG_TYPE, TagRecord};

    fn outputs(sinks: CsvSinks<Vec<u8>>) -> Vec<(RecordKind, String)> {
        sinks
            .into_inner()
            .expect("flush sinks")
            .into_iter()
            .map(|(kind, bytes)| (kind, String::from_utf8(bytes).expect("UTF-8 output")))
            .collect()
    }

    #[rstest]
    fn headers_follow_table_columns() {
        let sinks = CsvSinks::open(|_| Ok(Vec::new())).expect("open sinks");
        let headers: Vec<_> = outputs(sinks)
            .into_iter()
            .map(|(kind, text)| (kind.table(), text))
            .collect();
        assert_eq!(
            headers,
            [
                (
                    "nodes",
                    "id,lat,lon,user,uid,version,changeset,timestamp\n".to_owned()
                ),
                ("nodes_tags", "id,key,value,type\n".to_owned()),
                ("ways", "id,user,uid,version,changeset,timestamp\n".to_owned()),
                ("ways_tags", "id,key,value,type\n".to_owned()),
                ("ways_nodes", "id,node_id,position\n".to_owned()),
            ]
        );
    }

    #[rstest]
    fn quotes_values_and_keeps_non_ascii_text() {
        let mut sinks = CsvSinks::open(|_| Ok(Vec::new())).expect("open sinks");
        let tag = TagRecord {
            id: "1".into(),
            key: "name".into(),
            value: "Café \"Zoë\", Las Vegas".into(),
            tag_type: REGULAR_TAG_TYPE.into(),
        };
        sinks
            .write_record(RecordKind::NodeTag, &tag)
            .expect("write tag");
        let (_, text) = outputs(sinks).swap_remove(1);
        assert_eq!(
            text,
            "id,key,value,type\n1,name,\"Café \"\"Zoë\"\", Las Vegas\",regular\n"
        );
    }

    struct FailingWriter;

    impl Write for FailingWriter {
        fn write(&mut self, _buf: &[u8]) -> io::Result<usize> {
            Err(io::Error::other("disk full"))
        }

        fn flush(&mut self) -> io::Result<()> {
            Err(io::Error::other("disk full"))
        }
    }

    #[rstest]
    fn failures_name_the_sink() {
        let mut sinks = CsvSinks::open(|_| Ok(FailingWriter)).expect("headers are buffered");
        let err = sinks.flush().expect_err("flush should fail");
        assert_eq!(err.sink(), RecordKind::Node);
        assert_eq!(err.to_string(), "failed to flush the nodes sink");
    }
}
