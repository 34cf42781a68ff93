//! Reconstructed response head for `--include-headers`.

use http::response::Parts;
use http::HeaderMap;
use std::collections::BTreeMap;
use std::io::{self, Write};

/// `Content-Type` style name for a lowercase wire name.
pub fn canonical_name(name: &str) -> String {
    name.split('-')
        .map(|part| {
            let mut chars = part.chars();
            match chars.next() {
                Some(first) => first.to_ascii_uppercase().to_string() + &chars.as_str().to_ascii_lowercase(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join("-")
}

/// Status line, then headers sorted by canonical name (values in received
/// order), then a blank line.
pub fn write_response_head<W: Write>(w: &mut W, head: &Parts) -> io::Result<()> {
    writeln!(w, "{:?} {}", head.version, status_text(head))?;
    write_headers(w, &head.headers)?;
    writeln!(w)
}

/// `200 OK`; the server's own reason phrase when it sent a non-standard one.
pub fn status_text(head: &Parts) -> String {
    let reason = head
        .extensions
        .get::<hyper::ext::ReasonPhrase>()
        .map(|r| String::from_utf8_lossy(r.as_bytes()).into_owned())
        .or_else(|| head.status.canonical_reason().map(str::to_string));
    match reason {
        Some(r) => format!("{} {}", head.status.as_u16(), r),
        None => head.status.as_u16().to_string(),
    }
}

fn write_headers<W: Write>(w: &mut W, headers: &HeaderMap) -> io::Result<()> {
    let mut sorted: BTreeMap<String, Vec<&[u8]>> = BTreeMap::new();
    for (name, value) in headers {
        sorted
            .entry(canonical_name(name.as_str()))
            .or_default()
            .push(value.as_bytes());
    }
    for (name, values) in sorted {
        for v in values {
            write!(w, "{}: ", name)?;
            w.write_all(v)?;
            writeln!(w)?;
        }
    }
    Ok(())
}
