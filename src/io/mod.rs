//! Text I/O for hashes and video fingerprints.
//!
//! Two line-oriented formats travel between the tools in this family:
//!
//! - **Hash lines**: one 64-hex-char hash per line, optionally followed by
//!   whitespace-separated metadata (typically a filename). Blank lines and
//!   lines starting with `#` are skipped.
//! - **Video feature lines**: `frameNumber hexHash quality timestamp`,
//!   whitespace-separated, one frame per line, timestamp in decimal
//!   seconds.
//!
//! Readers surface malformed hex as [`Error::MalformedHash`] with the line
//! number in the message, and incomplete records as [`Error::Truncated`].
//! The hashing and index cores never touch these paths.

use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use tracing::debug;

use crate::hash::Hash256;
use crate::video::VideoFeature;
use crate::{Error, Result};

// ============================================================================
// Hash lines
// ============================================================================

/// Read bare hashes, one per line. Trailing metadata is ignored.
pub fn read_hashes<R: BufRead>(reader: R) -> Result<Vec<Hash256>> {
    let lines = read_hashes_with_metadata(reader)?;
    Ok(lines.into_iter().map(|(hash, _)| hash).collect())
}

/// Read `(hash, metadata)` pairs, one per line. Metadata is the rest of the
/// line after the hash, trimmed; absent metadata comes back as `None`.
pub fn read_hashes_with_metadata<R: BufRead>(reader: R) -> Result<Vec<(Hash256, Option<String>)>> {
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        let (token, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((token, rest)) => (token, rest.trim()),
            None => (trimmed, ""),
        };
        let hash: Hash256 = token.parse().map_err(|e| at_line(lineno + 1, e))?;
        let metadata = (!rest.is_empty()).then(|| rest.to_string());
        out.push((hash, metadata));
    }
    debug!(count = out.len(), "read hash lines");
    Ok(out)
}

/// Write hashes one per line, metadata (when present) after a single space.
pub fn write_hashes_with_metadata<W: Write, S: AsRef<str>>(
    mut writer: W,
    entries: &[(Hash256, Option<S>)],
) -> Result<()> {
    for (hash, metadata) in entries {
        match metadata {
            Some(m) => writeln!(writer, "{hash} {}", m.as_ref())?,
            None => writeln!(writer, "{hash}")?,
        }
    }
    debug!(count = entries.len(), "wrote hash lines");
    Ok(())
}

/// [`read_hashes_with_metadata`] over a file path.
pub fn read_hashes_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<(Hash256, Option<String>)>> {
    read_hashes_with_metadata(BufReader::new(File::open(path)?))
}

// ============================================================================
// Video feature lines
// ============================================================================

/// Read per-frame fingerprints: `frameNumber hexHash quality timestamp`.
pub fn read_video_features<R: BufRead>(reader: R) -> Result<Vec<VideoFeature>> {
    let mut out = Vec::new();
    for (lineno, line) in reader.lines().enumerate() {
        let line = line?;
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') {
            continue;
        }
        out.push(parse_video_feature_line(trimmed, lineno + 1)?);
    }
    debug!(count = out.len(), "read video features");
    Ok(out)
}

/// Write per-frame fingerprints in the line format `read_video_features`
/// accepts.
pub fn write_video_features<W: Write>(mut writer: W, features: &[VideoFeature]) -> Result<()> {
    for f in features {
        writeln!(writer, "{} {} {} {}", f.frame_number, f.hash, f.quality, f.timestamp)?;
    }
    debug!(count = features.len(), "wrote video features");
    Ok(())
}

/// [`read_video_features`] over a file path.
pub fn read_video_features_from_path<P: AsRef<Path>>(path: P) -> Result<Vec<VideoFeature>> {
    read_video_features(BufReader::new(File::open(path)?))
}

/// [`write_video_features`] over a file path.
pub fn write_video_features_to_path<P: AsRef<Path>>(
    path: P,
    features: &[VideoFeature],
) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    write_video_features(&mut writer, features)?;
    writer.flush()?;
    Ok(())
}

fn parse_video_feature_line(line: &str, lineno: usize) -> Result<VideoFeature> {
    let mut fields = line.split_whitespace();
    let mut next = |name: &str| {
        fields.next().ok_or_else(|| Error::Truncated {
            line: lineno,
            message: format!("missing {name}"),
        })
    };

    let frame_number = next("frame number")?
        .parse::<u64>()
        .map_err(|e| bad_field(lineno, "frame number", e))?;
    let hash: Hash256 = next("hash")?.parse().map_err(|e| at_line(lineno, e))?;
    let quality = next("quality")?
        .parse::<u32>()
        .map_err(|e| bad_field(lineno, "quality", e))?;
    let timestamp = next("timestamp")?
        .parse::<f64>()
        .map_err(|e| bad_field(lineno, "timestamp", e))?;

    Ok(VideoFeature { frame_number, hash, quality, timestamp })
}

fn at_line(line: usize, err: Error) -> Error {
    match err {
        Error::MalformedHash { message } => Error::MalformedHash {
            message: format!("line {line}: {message}"),
        },
        other => other,
    }
}

fn bad_field(line: usize, name: &str, err: impl std::fmt::Display) -> Error {
    Error::Truncated { line, message: format!("bad {name}: {err}") }
}
