//! Streaming driver: read, shape, optionally validate, write.

use std::io::{BufRead, BufReader, Write};

use camino::{Utf8Path, Utf8PathBuf};
use log::{debug, info};
use serde::Serialize;
use thiserror::Error;
use wrangle_core::{
    CleaningRules, ElementKind, RecordKind, Schema, ShapedElement, Shaper, ValidationError,
};
use wrangle_fs::OutputDir;

use crate::osm_xml::{OsmElements, XmlReadError};
use crate::sink::{CsvSinks, SinkError};

/// Settings for one pipeline run.
#[derive(Debug, Clone, Default)]
pub struct ProcessOptions {
    /// Tables used to clean address values.
    pub rules: CleaningRules,
    /// Check every shaped element against `schema` before writing it.
    pub validate: bool,
    /// Schema applied when `validate` is set.
    pub schema: Schema,
}

impl ProcessOptions {
    /// Enable or disable validation.
    #[must_use]
    pub fn with_validation(mut self, validate: bool) -> Self {
        self.validate = validate;
        self
    }

    /// Replace the cleaning rules.
    #[must_use]
    pub fn with_rules(mut self, rules: CleaningRules) -> Self {
        self.rules = rules;
        self
    }
}

/// Tallies reported after a successful run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct ProcessSummary {
    /// Nodes written to `nodes.csv`.
    pub nodes: u64,
    /// Ways written to `ways.csv`.
    pub ways: u64,
    /// Relations read and skipped.
    pub relations_skipped: u64,
    /// Rows written to the two tag tables.
    pub tag_rows: u64,
    /// Rows written to `ways_nodes.csv`.
    pub way_node_rows: u64,
    /// Tags dropped because their key contained problem characters.
    pub dropped_tags: u64,
}

impl ProcessSummary {
    fn record(&mut self, shaped: &ShapedElement) {
        match shaped {
            ShapedElement::Node { .. } => self.nodes += 1,
            ShapedElement::Way { .. } => self.ways += 1,
        }
        self.tag_rows += count(shaped.tags().len());
        self.way_node_rows += count(shaped.way_nodes().len());
        self.dropped_tags += count(shaped.skipped_tags());
    }
}

fn count(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Errors that abort a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The OSM input could not be opened.
    #[error("failed to open OSM input at {path}")]
    OpenInput {
        /// Input path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The output directory could not be created.
    #[error("failed to prepare output directory {path}")]
    OutputDir {
        /// Directory path.
        path: Utf8PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
    /// The OSM input is malformed.
    #[error("failed to read OSM input")]
    Read(#[from] XmlReadError),
    /// A shaped element violated the schema.
    #[error("{element} {id} failed validation")]
    Validation {
        /// Kind of the offending element.
        element: ElementKind,
        /// Its `id` attribute, or an empty string.
        id: String,
        /// The first violation found.
        #[source]
        source: ValidationError,
    },
    /// Writing to one of the sinks failed.
    #[error("failed to write the {sink} table")]
    Sink {
        /// Table that failed.
        sink: RecordKind,
        /// Source error from the sink.
        #[source]
        source: SinkError,
    },
}

impl From<SinkError> for PipelineError {
    fn from(source: SinkError) -> Self {
        Self::Sink {
            sink: source.sink(),
            source,
        }
    }
}

/// Stream `source` into `sinks`.
///
/// Elements are processed in document order and dropped as soon as their
/// records are written. Sinks are flushed on success; on error the caller
/// owns whatever rows were already written.
///
/// # Examples
/// ```
/// use wrangle_data::{CsvSinks, ProcessOptions, process_map};
///
/// let xml = r#"<osm>
///   <node id="1" lat="36.1" lon="-115.1"><tag k="addr:state" v="nv"/></node>
///   <relation id="3"/>
/// </osm>"#;
/// let mut sinks = CsvSinks::open(|_| Ok(Vec::<u8>::new()))?;
/// let summary = process_map(xml.as_bytes(), &mut sinks, &ProcessOptions::default())?;
///
/// assert_eq!(summary.nodes, 1);
/// assert_eq!(summary.relations_skipped, 1);
/// let outputs = sinks.into_inner()?;
/// let (_, tags) = &outputs[1];
/// assert_eq!(String::from_utf8_lossy(tags), "id,key,value,type\n1,state,NV,addr\n");
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
pub fn process_map<R, W>(
    source: R,
    sinks: &mut CsvSinks<W>,
    options: &ProcessOptions,
) -> Result<ProcessSummary, PipelineError>
where
    R: BufRead,
    W: Write,
{
    let shaper = Shaper::new(&options.rules);
    let mut summary = ProcessSummary::default();

    for element in OsmElements::new(source) {
        let element = element?;
        let Some(shaped) = shaper.shape(&element) else {
            if element.kind() == &ElementKind::Relation {
                summary.relations_skipped += 1;
            }
            continue;
        };
        if options.validate {
            options
                .schema
                .validate(&shaped)
                .map_err(|source| PipelineError::Validation {
                    element: element.kind().clone(),
                    id: element.attribute("id").unwrap_or_default().to_owned(),
                    source,
                })?;
        }
        sinks.write(&shaped)?;
        summary.record(&shaped);
    }

    sinks.flush()?;
    debug!("processed {summary:?}");
    Ok(summary)
}

/// Stream the OSM file at `input` into the five CSV files under `output_dir`.
pub fn process_map_to_dir(
    input: &Utf8Path,
    output_dir: &Utf8Path,
    options: &ProcessOptions,
) -> Result<ProcessSummary, PipelineError> {
    let file = wrangle_fs::open_input(input).map_err(|source| PipelineError::OpenInput {
        path: input.to_owned(),
        source,
    })?;
    let dir = OutputDir::create(output_dir).map_err(|source| PipelineError::OutputDir {
        path: output_dir.to_owned(),
        source,
    })?;
    let mut sinks = CsvSinks::create_in(&dir)?;

    info!("shaping {input} into {}", dir.path());
    let summary = process_map(BufReader::new(file), &mut sinks, options)?;
    info!(
        "wrote {} nodes, {} ways, {} tags and {} way nodes",
        summary.nodes, summary.ways, summary.tag_rows, summary.way_node_rows
    );
    Ok(summary)
}
