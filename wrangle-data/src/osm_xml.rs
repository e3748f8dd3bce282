//! Streaming reader for OSM XML documents.
//!
//! [`OsmElements`] walks the document with `quick-xml` and yields one
//! top-level `node`, `way` or `relation` at a time, with its `tag`, `nd` and
//! `member` children attached. Nothing outside the element currently being
//! assembled is retained, so peak memory tracks the largest single element.

use std::collections::BTreeMap;
use std::io::{self, BufRead};
use std::sync::Arc;

use quick_xml::events::{BytesStart, Event};
use quick_xml::reader::Reader;
use quick_xml::Decoder;
use thiserror::Error;
use wrangle_core::{ElementKind, SourceElement};

/// Errors raised while reading an OSM XML document.
#[derive(Debug, Error)]
pub enum XmlReadError {
    /// The document is not well-formed XML.
    #[error("malformed OSM XML near byte {position}")]
    Syntax {
        /// Reader position when the error surfaced.
        position: u64,
        /// Source error produced by `quick-xml`.
        #[source]
        source: quick_xml::Error,
    },
    /// Reading from the underlying source failed.
    #[error("failed to read OSM XML input near byte {position}")]
    Io {
        /// Reader position when the error surfaced.
        position: u64,
        /// Underlying I/O error.
        #[source]
        source: Arc<io::Error>,
    },
    /// The document ended while an element was still open.
    #[error("OSM XML ended inside an unterminated <{element}> element")]
    UnexpectedEof {
        /// Name of the innermost open element.
        element: String,
    },
}

/// Iterator over the top-level entities of an OSM XML document.
///
/// # Examples
/// ```
/// use wrangle_core::ElementKind;
/// use wrangle_data::OsmElements;
///
/// let xml = r#"<osm><bounds minlat="36.0"/>
///   <node id="1" lat="36.1" lon="-115.1"><tag k="amenity" v="cafe"/></node>
///   <way id="2"><nd ref="1"/></way>
/// </osm>"#;
/// let mut elements = OsmElements::new(xml.as_bytes());
/// let kinds: Vec<_> = elements
///     .by_ref()
///     .map(|element| element.map(|e| e.kind().clone()))
///     .collect::<Result<_, _>>()?;
///
/// assert_eq!(kinds, [ElementKind::Node, ElementKind::Way]);
/// assert_eq!(elements.element_counts()["tag"], 1);
/// assert_eq!(elements.element_counts()["bounds"], 1);
/// # Ok::<(), wrangle_data::XmlReadError>(())
/// ```
#[derive(Debug)]
pub struct OsmElements<R> {
    reader: Reader<R>,
    buf: Vec<u8>,
    open: Vec<SourceElement>,
    counts: BTreeMap<String, u64>,
    finished: bool,
}

impl<R: BufRead> OsmElements<R> {
    /// Start reading `source` from the beginning.
    pub fn new(source: R) -> Self {
        Self {
            reader: Reader::from_reader(source),
            buf: Vec::new(),
            open: Vec::new(),
            counts: BTreeMap::new(),
            finished: false,
        }
    }

    /// Occurrences of every element name read so far, including the root and
    /// any non-entity elements such as `bounds`.
    #[must_use]
    pub const fn element_counts(&self) -> &BTreeMap<String, u64> {
        &self.counts
    }

    fn read_entity(&mut self) -> Result<Option<SourceElement>, XmlReadError> {
        loop {
            self.buf.clear();
            let decoder = self.reader.decoder();
            let event = match self.reader.read_event_into(&mut self.buf) {
                Ok(event) => event,
                Err(source) => return Err(read_error(&self.reader, source)),
            };
            match event {
                Event::Start(start) => {
                    let element = decode_element(&start, decoder)
                        .map_err(|source| read_error(&self.reader, source))?;
                    tally(&mut self.counts, element.kind());
                    if !self.open.is_empty() || element.kind().is_entity() {
                        self.open.push(element);
                    }
                }
                Event::Empty(start) => {
                    let element = decode_element(&start, decoder)
                        .map_err(|source| read_error(&self.reader, source))?;
                    tally(&mut self.counts, element.kind());
                    if let Some(parent) = self.open.last_mut() {
                        parent.push_child(element);
                    } else if element.kind().is_entity() {
                        return Ok(Some(element));
                    }
                }
                Event::End(_) => {
                    if let Some(done) = self.open.pop() {
                        match self.open.last_mut() {
                            Some(parent) => parent.push_child(done),
                            None => return Ok(Some(done)),
                        }
                    }
                }
                Event::Eof => {
                    return match self.open.last() {
                        Some(element) => Err(XmlReadError::UnexpectedEof {
                            element: element.kind().to_string(),
                        }),
                        None => Ok(None),
                    };
                }
                _ => {}
            }
        }
    }
}

impl<R: BufRead> Iterator for OsmElements<R> {
    type Item = Result<SourceElement, XmlReadError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let next = self.read_entity();
        if !matches!(next, Ok(Some(_))) {
            self.finished = true;
        }
        next.transpose()
    }
}

fn read_error<R>(reader: &Reader<R>, source: quick_xml::Error) -> XmlReadError {
    let position = u64::try_from(reader.buffer_position()).unwrap_or(u64::MAX);
    match source {
        quick_xml::Error::Io(source) => XmlReadError::Io { position, source },
        source => XmlReadError::Syntax { position, source },
    }
}

fn tally(counts: &mut BTreeMap<String, u64>, kind: &ElementKind) {
    if let Some(count) = counts.get_mut(kind.as_str()) {
        *count += 1;
    } else {
        counts.insert(kind.as_str().to_owned(), 1);
    }
}

fn decode_element(start: &BytesStart<'_>, decoder: Decoder) -> quick_xml::Result<SourceElement> {
    let qname = start.name();
    let name = decoder.decode(qname.as_ref())?;
    let mut element = SourceElement::new(ElementKind::from_name(&name));
    for attribute in start.attributes() {
        let attribute = attribute?;
        let key = decoder.decode(attribute.key.as_ref())?;
        let value = attribute.decode_and_unescape_value(decoder)?;
        element.set_attribute(key.into_owned(), value.into_owned());
    }
    Ok(element)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    fn collect(xml: &str) -> Result<Vec<SourceElement>, XmlReadError> {
        OsmElements::new(xml.as_bytes()).collect()
    }

    #[rstest]
    fn yields_entities_with_children_in_order() {
        let elements = collect(
            r#"<?xml version="1.0" encoding="UTF-8"?>
            <osm version="0.6">
              <way id="5" uid="7"><nd ref="1"/><tag k="highway" v="service"/><nd ref="2"/></way>
              <relation id="9"><member type="way" ref="5" role="outer"/></relation>
            </osm>"#,
        )
        .expect("well-formed document");

        assert_eq!(elements.len(), 2);
        let way = elements.first().expect("way");
        assert_eq!(way.kind(), &ElementKind::Way);
        let child_kinds: Vec<_> = way.children().iter().map(|c| c.kind().as_str()).collect();
        assert_eq!(child_kinds, ["nd", "tag", "nd"]);
        assert_eq!(elements.get(1).map(SourceElement::kind), Some(&ElementKind::Relation));
    }

    #[rstest]
    fn self_closing_nodes_are_yielded() {
        let elements = collect(r#"<osm><node id="1" lat="1" lon="2"/></osm>"#)
            .expect("well-formed document");
        assert_eq!(elements.len(), 1);
        assert_eq!(elements.first().and_then(|n| n.attribute("lat")), Some("1"));
    }

    #[rstest]
    fn unescapes_attribute_values() {
        let elements = collect(
            r#"<osm><node id="1"><tag k="name" v="Caf&#233; &amp; Bar &quot;Ré&quot;"/></node></osm>"#,
        )
        .expect("well-formed document");
        let tags: Vec<_> = elements.first().expect("node").tags().collect();
        assert_eq!(tags, [("name", "Café & Bar \"Ré\"")]);
    }

    #[rstest]
    fn counts_every_element_name() {
        let mut elements = OsmElements::new(
            r#"<osm><bounds/><node id="1"><tag k="a" v="b"/></node><node id="2"/></osm>"#
                .as_bytes(),
        );
        assert_eq!(elements.by_ref().count(), 2);
        let counts: Vec<_> = elements
            .element_counts()
            .iter()
            .map(|(name, count)| (name.as_str(), *count))
            .collect();
        assert_eq!(counts, [("bounds", 1), ("node", 2), ("osm", 1), ("tag", 1)]);
    }

    #[rstest]
    fn reports_truncated_documents() {
        let err = collect(r#"<osm><way id="1"><nd ref="1"/>"#).expect_err("truncated document");
        assert!(
            matches!(&err, XmlReadError::UnexpectedEof { element } if element == "way"),
            "unexpected error {err:?}"
        );
    }

    #[rstest]
    fn reports_mismatched_tags() {
        let err = collect(r#"<osm><node id="1"></way></osm>"#).expect_err("mismatched tags");
        assert!(matches!(err, XmlReadError::Syntax { .. }));
    }

    struct DisconnectedSource;

    impl io::Read for DisconnectedSource {
        fn read(&mut self, _buf: &mut [u8]) -> io::Result<usize> {
            Err(io::Error::new(io::ErrorKind::ConnectionReset, "source went away"))
        }
    }

    #[rstest]
    fn source_failures_are_io_errors() {
        let mut elements = OsmElements::new(io::BufReader::new(DisconnectedSource));
        match elements.next() {
            Some(Err(XmlReadError::Io { source, .. })) => {
                assert_eq!(source.kind(), io::ErrorKind::ConnectionReset);
            }
            other => panic!("expected an I/O error, got {other:?}"),
        }
    }

    #[rstest]
    fn decodes_names_and_attributes_of_self_closing_tags() {
        let elements = collect(r#"<osm><way id="8"><nd ref="4"/></way></osm>"#)
            .expect("well-formed document");
        let way = elements.first().expect("way");
        let nd = way.children().first().expect("nd child");
        assert_eq!(nd.kind(), &ElementKind::Nd);
        assert_eq!(nd.attribute("ref"), Some("4"));
    }

    #[rstest]
    fn stops_after_the_first_error() {
        let mut elements = OsmElements::new(r#"<osm><node id="1"></way>"#.as_bytes());
        assert!(matches!(elements.next(), Some(Err(_))));
        assert!(elements.next().is_none());
    }
}
