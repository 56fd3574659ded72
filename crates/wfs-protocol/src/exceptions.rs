//! Best-effort extraction of error text from service responses.
//!
//! Services sometimes answer a JSON request with an XML exception report
//! and a 200 status. These helpers pull a readable message out of such
//! bodies without requiring them to be well-formed.

use quick_xml::events::Event;
use quick_xml::reader::Reader;

/// First `max_chars` characters of a body (character, not byte, count).
pub fn preview(body: &str, max_chars: usize) -> String {
    body.chars().take(max_chars).collect()
}

/// Collapse runs of whitespace into single spaces and trim the ends.
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Text of the first element whose name ends in "Exception".
///
/// Text is gathered from the opening tag up to the first closing tag of any
/// element, trimmed and whitespace-collapsed. Returns `None` when no such
/// element exists or it carries no text.
pub fn extract_exception_text(body: &str) -> Option<String> {
    let mut reader = Reader::from_str(body);
    reader.check_end_names(false);

    let mut inside = false;
    let mut text = String::new();

    loop {
        match reader.read_event() {
            Ok(Event::Start(e)) => {
                if !inside && is_exception_name(e.local_name().as_ref()) {
                    inside = true;
                }
            }
            Ok(Event::Text(t)) if inside => match t.unescape() {
                Ok(s) => text.push_str(&s),
                Err(_) => text.push_str(&String::from_utf8_lossy(&t)),
            },
            Ok(Event::CData(c)) if inside => {
                text.push_str(&String::from_utf8_lossy(&c.into_inner()));
            }
            Ok(Event::End(_)) if inside => break,
            Ok(Event::Eof) => break,
            Err(e) => {
                tracing::trace!(error = %e, "Stopped scanning body for exception text");
                break;
            }
            _ => {}
        }
    }

    let collapsed = collapse_whitespace(&text);
    if collapsed.is_empty() {
        None
    } else {
        Some(collapsed)
    }
}

fn is_exception_name(local_name: &[u8]) -> bool {
    let suffix = b"exception";
    local_name.len() >= suffix.len()
        && local_name[local_name.len() - suffix.len()..].eq_ignore_ascii_case(suffix)
}
