//! Output formatting and persistence for the published views.
//!
//! Views are written as pretty-printed JSON files, optionally gzip-compressed.

use anyhow::{Context, Result};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Serializes `value` as pretty JSON with a trailing newline.
pub fn to_json_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    let mut bytes = serde_json::to_vec_pretty(value)?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Path of a view file: `<root>/<view>/<campus>/<term>.json[.gz]`.
pub fn view_path(root: &Path, view: &str, campus: &str, term: &str, gzip: bool) -> PathBuf {
    let extension = if gzip { "json.gz" } else { "json" };
    root.join(view)
        .join(campus)
        .join(format!("{term}.{extension}"))
}

/// Writes `value` as JSON to `path`, creating parent directories as needed.
pub fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T, gzip: bool) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("creating {}", parent.display()))?;
    }

    let body = to_json_bytes(value)?;
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut writer = BufWriter::new(file);

    if gzip {
        let mut encoder = GzEncoder::new(&mut writer, Compression::default());
        encoder.write_all(&body)?;
        encoder.finish()?;
    } else {
        writer.write_all(&body)?;
    }
    writer.flush()?;

    debug!(path = %path.display(), bytes = body.len(), gzip, "View written");
    Ok(())
}
