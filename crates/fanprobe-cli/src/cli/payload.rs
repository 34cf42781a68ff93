//! `-d` payload: literal data, `@file`, or `@-` for stdin.

use anyhow::{Context, Result};
use std::io::Read;
use std::path::Path;

pub fn load_payload(data: &str) -> Result<Vec<u8>> {
    match data.strip_prefix('@') {
        Some("-") => {
            let mut buf = Vec::new();
            std::io::stdin()
                .read_to_end(&mut buf)
                .context("reading payload from stdin")?;
            Ok(buf)
        }
        Some(path) => std::fs::read(Path::new(path))
            .with_context(|| format!("reading payload file {}", path)),
        None => Ok(data.as_bytes().to_vec()),
    }
}
