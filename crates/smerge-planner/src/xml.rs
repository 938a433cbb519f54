//! The descriptor's XML form.
//!
//! ```xml
//! <fields>
//!   <field>
//!     <name>k</name>
//!     <ascending>Y</ascending>
//!   </field>
//! </fields>
//! ```
//!
//! The `<fields>` block may sit anywhere inside an enclosing document (e.g. a
//! host's `<transform>` node). A document without one describes zero keys.
//! `<case_insensitive>Y</case_insensitive>` is optional per field.

use quick_xml::escape::escape;
use quick_xml::events::Event;
use quick_xml::Reader;

use smerge_core::key::SortKey;

use crate::error::{DescriptorError, Result};

/// Render keys as a `<fields>` block. Directions are written as `Y`/`N`.
pub fn write_fields(keys: &[SortKey]) -> String {
    let mut out = String::from("<fields>\n");
    for key in keys {
        out.push_str("  <field>\n");
        out.push_str(&format!("    <name>{}</name>\n", escape(key.name.as_str())));
        out.push_str(&format!("    <ascending>{}</ascending>\n", yes_no(key.ascending)));
        if key.case_insensitive {
            out.push_str("    <case_insensitive>Y</case_insensitive>\n");
        }
        out.push_str("  </field>\n");
    }
    out.push_str("</fields>\n");
    out
}

fn yes_no(b: bool) -> &'static str {
    if b {
        "Y"
    } else {
        "N"
    }
}

#[derive(Default)]
struct PendingField {
    name: Option<String>,
    ascending: Option<String>,
    case_insensitive: Option<String>,
}

/// Parse the `<fields>` block of `xml`, preserving field order.
///
/// `ascending` is read as ascending for `Y` (any case). In lenient mode any
/// other token means descending; in strict mode only `N` does.
pub fn read_fields(xml: &str, strict: bool) -> Result<Vec<SortKey>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<Vec<u8>> = Vec::new();
    let mut pending: Option<PendingField> = None;
    let mut text = String::new();
    let mut keys = Vec::new();

    loop {
        match reader.read_event()? {
            Event::Start(e) => {
                let name = e.local_name().as_ref().to_vec();
                open(&name, &stack, &mut pending);
                text.clear();
                stack.push(name);
            }
            Event::Empty(e) => {
                let name = e.local_name().as_ref().to_vec();
                open(&name, &stack, &mut pending);
                text.clear();
                close(&name, &stack, &mut pending, &text, &mut keys, strict)?;
            }
            Event::End(_) => {
                if let Some(name) = stack.pop() {
                    close(&name, &stack, &mut pending, &text, &mut keys, strict)?;
                }
                text.clear();
            }
            Event::Text(e) => text.push_str(&e.unescape()?),
            Event::CData(e) => text.push_str(&String::from_utf8_lossy(&e.into_inner())),
            Event::Eof => break,
            _ => {}
        }
    }
    Ok(keys)
}

fn in_fields(stack: &[Vec<u8>]) -> bool {
    stack.last().is_some_and(|n| n == b"fields")
}

fn in_field(stack: &[Vec<u8>]) -> bool {
    let n = stack.len();
    n >= 2 && stack[n - 1] == b"field" && stack[n - 2] == b"fields"
}

fn open(name: &[u8], stack: &[Vec<u8>], pending: &mut Option<PendingField>) {
    if name == b"field" && in_fields(stack) {
        *pending = Some(PendingField::default());
    }
}

/// `stack` no longer contains `name` when this runs.
fn close(
    name: &[u8],
    stack: &[Vec<u8>],
    pending: &mut Option<PendingField>,
    text: &str,
    keys: &mut Vec<SortKey>,
    strict: bool,
) -> Result<()> {
    if name == b"field" && in_fields(stack) {
        if let Some(field) = pending.take() {
            keys.push(finish(field, keys.len(), strict)?);
        }
        return Ok(());
    }
    if !in_field(stack) {
        return Ok(());
    }
    if let Some(field) = pending.as_mut() {
        match name {
            b"name" => field.name = Some(text.to_string()),
            b"ascending" => field.ascending = Some(text.to_string()),
            b"case_insensitive" => field.case_insensitive = Some(text.to_string()),
            _ => {}
        }
    }
    Ok(())
}

fn finish(field: PendingField, idx: usize, strict: bool) -> Result<SortKey> {
    let name = field
        .name
        .filter(|n| !n.is_empty())
        .ok_or_else(|| DescriptorError::Malformed(format!("field #{} has no name", idx + 1)))?;
    let token = field
        .ascending
        .filter(|t| !t.trim().is_empty())
        .ok_or_else(|| {
            DescriptorError::Malformed(format!("field '{name}' has no ascending value"))
        })?;
    let ascending = parse_ascending(&token, strict).ok_or_else(|| {
        DescriptorError::Malformed(format!(
            "field '{name}': ascending must be Y or N, got '{token}'"
        ))
    })?;
    let case_insensitive = field
        .case_insensitive
        .is_some_and(|t| t.trim().eq_ignore_ascii_case("Y"));

    Ok(SortKey::new(name, ascending).with_case_insensitive(case_insensitive))
}

/// `None` only in strict mode, for tokens other than `Y`/`N`. The token is
/// matched as written: surrounding whitespace makes it unrecognised.
pub fn parse_ascending(token: &str, strict: bool) -> Option<bool> {
    if token.eq_ignore_ascii_case("Y") {
        Some(true)
    } else if token.eq_ignore_ascii_case("N") {
        Some(false)
    } else if strict {
        None
    } else {
        tracing::warn!(token, "unrecognised ascending token, reading as descending");
        Some(false)
    }
}
