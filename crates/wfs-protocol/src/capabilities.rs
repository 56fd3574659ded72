//! Feature type discovery from a GetCapabilities document.

use std::collections::HashSet;

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// Collect the feature type names advertised in a capabilities document.
///
/// Only unprefixed `<Name>` elements are considered, and names containing a
/// namespace separator are skipped. Returns `None` for an empty document so
/// callers can tell "nothing fetched" apart from "no types advertised".
/// Parsing stops quietly at the first malformed construct, keeping the
/// names found so far.
pub fn parse_type_names(xml: &str) -> Option<HashSet<String>> {
    if xml.trim().is_empty() {
        return None;
    }

    let mut reader = Reader::from_str(xml);
    reader.check_end_names(false);

    let mut names = HashSet::new();
    let mut in_name = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => in_name = e.name().as_ref() == b"Name",
            Ok(Event::Text(t)) if in_name => {
                if let Ok(text) = t.unescape() {
                    let name = text.trim();
                    if !name.is_empty()
                        && !name.contains(':')
                        && !name.contains(char::is_whitespace)
                    {
                        names.insert(name.to_string());
                    }
                }
            }
            Ok(Event::End(_)) => in_name = false,
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::debug!(error = %e, "Capabilities document is malformed");
                break;
            }
            _ => {}
        }
    }

    Some(names)
}
