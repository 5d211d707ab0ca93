//! Schema text tokenizer
//!
//! Drives a quick-xml [`NsReader`] over schema text and feeds the resulting
//! events to a [`TreeBuilder`]. This is where RelaxNG annotations are dropped:
//! foreign-namespace elements nested inside RelaxNG elements are skipped with
//! their whole subtree, and namespace-qualified attributes are removed except
//! for `xml:base`. Namespace declarations are kept as attributes so that
//! QName prefixes can be resolved later.
//!
//! `xml:base` values are made absolute while reading, and the document URL is
//! recorded as `xml:base` on the document element. Each `value` element gets a
//! copy of the prefixed declarations in scope in its own document, since it
//! may later be moved into another document's tree.

use crate::error::{Error, Result};
use crate::limits::Limits;
use crate::namespaces::{RELAXNG_NAMESPACE, XML_NAMESPACE};
use crate::parser::TreeBuilder;
use crate::tree::Tree;
use quick_xml::events::{BytesStart, Event};
use quick_xml::name::ResolveResult;
use quick_xml::reader::NsReader;
use url::Url;

/// Parse schema text with default limits
pub fn parse_str(text: &str, base: Option<&Url>) -> Result<Tree> {
    parse_with_limits(text, base, &Limits::default())
}

/// Parse schema text into a grammar tree
pub fn parse_with_limits(text: &str, base: Option<&Url>, limits: &Limits) -> Result<Tree> {
    limits.check_schema_size(text.len())?;

    let mut reader = NsReader::from_str(text);
    let mut builder = TreeBuilder::with_limits(limits.clone());
    // Base URL in scope for each open RelaxNG element
    let mut bases: Vec<Option<Url>> = Vec::new();
    // Prefixed namespace declarations made by each open RelaxNG element
    let mut scopes: Vec<Vec<(String, String)>> = Vec::new();
    // Depth inside a skipped annotation subtree
    let mut skipping = 0usize;

    loop {
        let position = reader.buffer_position();
        let (namespace, event) = match reader.read_resolved_event() {
            Ok((ns, event)) => (namespace_of(&ns), event),
            Err(e) => {
                return Err(Error::Xml(format!(
                    "Error parsing XML at position {}: {}",
                    position, e
                )))
            }
        };

        match event {
            Event::Start(_) if skipping > 0 => skipping += 1,
            Event::Empty(_) if skipping > 0 => {}
            Event::Start(ref e) | Event::Empty(ref e) => {
                let empty = matches!(event, Event::Empty(_));
                if namespace != RELAXNG_NAMESPACE && !bases.is_empty() {
                    if !empty {
                        skipping = 1;
                    }
                    continue;
                }

                let inherited = bases.last().cloned().flatten().or_else(|| base.cloned());
                let (mut attributes, element_base) =
                    read_attributes(&reader, e, inherited.as_ref())?;
                let local_name = std::str::from_utf8(e.local_name().as_ref())
                    .map_err(|e| Error::Xml(format!("Invalid element name: {}", e)))?
                    .to_string();

                let declared: Vec<(String, String)> = attributes
                    .iter()
                    .filter(|(k, _)| k.starts_with("xmlns:"))
                    .cloned()
                    .collect();
                if local_name == "value" {
                    pin_declarations(&mut attributes, &scopes);
                }

                if bases.is_empty() {
                    if let Some(url) = element_base.as_ref() {
                        if !attributes.iter().any(|(k, _)| k == "xml:base") {
                            attributes.push(("xml:base".to_string(), url.to_string()));
                        }
                    }
                }

                builder.start_element(
                    &namespace,
                    &local_name,
                    attributes.iter().map(|(k, v)| (k.as_str(), v.as_str())),
                )?;
                if empty {
                    builder.end_element()?;
                } else {
                    bases.push(element_base);
                    scopes.push(declared);
                }
            }
            Event::End(_) if skipping > 0 => skipping -= 1,
            Event::End(_) => {
                bases.pop();
                scopes.pop();
                builder.end_element()?;
            }
            Event::Text(e) if skipping == 0 => {
                let text = e
                    .unescape()
                    .map_err(|e| Error::Xml(format!("Failed to unescape text: {}", e)))?;
                builder.text(&text);
            }
            Event::CData(e) if skipping == 0 => {
                let bytes = e.into_inner();
                let text = std::str::from_utf8(&bytes)
                    .map_err(|e| Error::Xml(format!("Invalid CDATA content: {}", e)))?;
                builder.text(text);
            }
            Event::Eof => break,
            _ => {} // Comments, processing instructions, doctype, annotation text
        }
    }

    builder.finish()
}

/// Add the declarations of enclosing elements that `attributes` does not
/// already redeclare, innermost first
fn pin_declarations(attributes: &mut Vec<(String, String)>, scopes: &[Vec<(String, String)>]) {
    for (key, value) in scopes.iter().rev().flatten() {
        if !attributes.iter().any(|(k, _)| k == key) {
            attributes.push((key.clone(), value.clone()));
        }
    }
}

fn namespace_of(ns: &ResolveResult) -> String {
    match ns {
        ResolveResult::Bound(ns) => String::from_utf8_lossy(ns.as_ref()).into_owned(),
        _ => String::new(),
    }
}

/// Collect the attributes kept on a RelaxNG element, and its base URL
fn read_attributes(
    reader: &NsReader<&[u8]>,
    start: &BytesStart,
    inherited: Option<&Url>,
) -> Result<(Vec<(String, String)>, Option<Url>)> {
    let mut attributes = Vec::new();
    let mut base = inherited.cloned();

    for attr in start.attributes() {
        let attr = attr.map_err(|e| Error::Xml(format!("Failed to parse attribute: {}", e)))?;
        let raw_name = std::str::from_utf8(attr.key.as_ref())
            .map_err(|e| Error::Xml(format!("Invalid attribute name: {}", e)))?
            .to_string();
        let value = attr
            .unescape_value()
            .map_err(|e| Error::Xml(format!("Failed to unescape attribute value: {}", e)))?
            .into_owned();

        if raw_name == "xmlns" || raw_name.starts_with("xmlns:") {
            attributes.push((raw_name, value));
            continue;
        }

        let (ns, local) = reader.resolve_attribute(attr.key);
        let local = String::from_utf8_lossy(local.as_ref()).into_owned();
        match ns {
            ResolveResult::Unbound => attributes.push((local, value)),
            ResolveResult::Bound(ns) if ns.as_ref() == XML_NAMESPACE.as_bytes() => {
                if local == "base" {
                    let resolved = match inherited {
                        Some(parent) => parent.join(&value)?,
                        None => Url::parse(&value)?,
                    };
                    attributes.push(("xml:base".to_string(), resolved.to_string()));
                    base = Some(resolved);
                }
            }
            // Annotation attributes
            _ => {}
        }
    }

    Ok((attributes, base))
}
