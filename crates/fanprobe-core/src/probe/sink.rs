//! Where a probe writes the response (optionally headers, then body).

use super::ProbeFailure;
use crate::config::OutputTarget;
use std::fs::File;
use std::io::{self, BufWriter, Stdout, Write};
use std::net::IpAddr;
use std::path::{Path, PathBuf};

pub enum Sink {
    Stdout(BufWriter<Stdout>),
    Discard(io::Sink),
    File { path: PathBuf, out: BufWriter<File> },
}

impl Sink {
    /// Opens the sink for `ip`. A per-address file is created (truncated) here.
    pub fn open(target: &OutputTarget, ip: IpAddr) -> Result<Self, ProbeFailure> {
        if let Some(path) = target.filename(ip) {
            return match File::create(&path) {
                Ok(f) => Ok(Sink::File {
                    path,
                    out: BufWriter::new(f),
                }),
                Err(source) => Err(ProbeFailure::OutputFile { path, source }),
            };
        }
        match target {
            OutputTarget::Stdout => Ok(Sink::Stdout(BufWriter::new(io::stdout()))),
            _ => Ok(Sink::Discard(io::sink())),
        }
    }

    /// Path of the output file, if this sink is one.
    pub fn path(&self) -> Option<&Path> {
        match self {
            Sink::File { path, .. } => Some(path),
            _ => None,
        }
    }
}

impl Write for Sink {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self {
            Sink::Stdout(w) => w.write(buf),
            Sink::Discard(w) => w.write(buf),
            Sink::File { out, .. } => out.write(buf),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self {
            Sink::Stdout(w) => w.flush(),
            Sink::Discard(w) => w.flush(),
            Sink::File { out, .. } => out.flush(),
        }
    }
}
