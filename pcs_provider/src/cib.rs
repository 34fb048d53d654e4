//! Extraction of location constraints from `pcs cluster cib` output.
//!
//! Every `rsc_location` element, at any depth, becomes one
//! [`LocationConstraint`], in document order. The first `rule` child of an
//! element is flattened into `name -> value` pairs taken from the rule's own
//! child elements; an element without a rule gets an empty rule mapping.

use location_shared_types::{Ensure, LocationConstraint, LocationError, Rule, RuleValue, Score};
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use tracing::warn;

#[derive(Debug, thiserror::Error)]
pub enum CibParseError {
    #[error("Malformed CIB at byte {position}: {message}")]
    Xml { position: u64, message: String },

    #[error("CIB ended inside <{0}>")]
    Truncated(String),
}

impl From<CibParseError> for LocationError {
    fn from(err: CibParseError) -> Self {
        LocationError::Discovery(err.to_string())
    }
}

/// A `rsc_location` element being read.
struct OpenLocation {
    depth: usize,
    id: Option<String>,
    rsc: Option<String>,
    node: Option<String>,
    score: Option<String>,
    rule: Rule,
    rule_seen: bool,
    /// Depth of the `rule` element whose children are being collected.
    rule_depth: Option<usize>,
}

impl OpenLocation {
    fn finish(self) -> Option<LocationConstraint> {
        let Some(name) = self.id else {
            warn!("Skipping rsc_location without id (rsc={:?})", self.rsc);
            return None;
        };
        Some(LocationConstraint {
            name,
            primitive: self.rsc,
            node_name: self.node,
            score: self.score.map(Score::from),
            rule: Some(self.rule),
            cib: None,
            ensure: Ensure::Present,
        })
    }
}

fn xml_error(reader: &Reader<&[u8]>, err: impl std::fmt::Display) -> CibParseError {
    CibParseError::Xml {
        position: reader.buffer_position() as u64,
        message: err.to_string(),
    }
}

fn attribute(
    reader: &Reader<&[u8]>,
    element: &BytesStart<'_>,
    name: &str,
) -> Result<Option<String>, CibParseError> {
    match element
        .try_get_attribute(name)
        .map_err(|e| xml_error(reader, e))?
    {
        Some(attr) => {
            let value = attr.unescape_value().map_err(|e| xml_error(reader, e))?;
            Ok(Some(value.into_owned()))
        }
        None => Ok(None),
    }
}

/// Handles an opening (or self-closing) tag at `depth`.
fn open_element(
    reader: &Reader<&[u8]>,
    element: &BytesStart<'_>,
    depth: usize,
    current: &mut Option<OpenLocation>,
) -> Result<(), CibParseError> {
    let name = element.name();
    if current.is_none() {
        if name.as_ref() == b"rsc_location" {
            *current = Some(OpenLocation {
                depth,
                id: attribute(reader, element, "id")?,
                rsc: attribute(reader, element, "rsc")?,
                node: attribute(reader, element, "node")?,
                score: attribute(reader, element, "score")?,
                rule: Rule::new(),
                rule_seen: false,
                rule_depth: None,
            });
        }
        return Ok(());
    }
    let Some(loc) = current.as_mut() else {
        return Ok(());
    };

    if depth == loc.depth + 1 && name.as_ref() == b"rule" && !loc.rule_seen {
        loc.rule_seen = true;
        loc.rule_depth = Some(depth);
    } else if loc.rule_depth.is_some_and(|d| depth == d + 1) {
        let key = attribute(reader, element, "name")?.unwrap_or_default();
        let value = attribute(reader, element, "value")?.unwrap_or_default();
        loc.rule.insert(key, RuleValue::Text(value));
    }
    Ok(())
}

/// Handles the close of the element that was opened at `depth`.
fn close_element(
    depth: usize,
    current: &mut Option<OpenLocation>,
    constraints: &mut Vec<LocationConstraint>,
) {
    let Some(loc) = current.as_mut() else { return };
    if loc.rule_depth == Some(depth) {
        loc.rule_depth = None;
    }
    let closes_location = loc.depth == depth;
    if closes_location {
        if let Some(constraint) = current.take().and_then(OpenLocation::finish) {
            constraints.push(constraint);
        }
    }
}

/// Parse every `rsc_location` in a CIB document.
pub fn parse_locations(xml: &str) -> Result<Vec<LocationConstraint>, CibParseError> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut constraints = Vec::new();
    let mut current: Option<OpenLocation> = None;
    let mut stack: Vec<String> = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                open_element(&reader, &e, stack.len(), &mut current)?;
                stack.push(String::from_utf8_lossy(e.name().as_ref()).into_owned());
            }
            Ok(Event::Empty(e)) => {
                let depth = stack.len();
                open_element(&reader, &e, depth, &mut current)?;
                close_element(depth, &mut current, &mut constraints);
            }
            Ok(Event::End(_)) => {
                stack.pop();
                close_element(stack.len(), &mut current, &mut constraints);
            }
            Ok(Event::Eof) => break,
            Err(e) => return Err(xml_error(&reader, e)),
            _ => {}
        }
    }

    if let Some(open) = stack.pop() {
        return Err(CibParseError::Truncated(open));
    }

    Ok(constraints)
}
