use crate::error::{Error, Result};
use crate::source::Comment;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Mode of a freshly written output file, matching a plain create under umask 022
#[cfg(unix)]
const OUTPUT_FILE_MODE: u32 = 0o644;

/// Where the filtered comments go
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Destination {
    Stdout,
    File(PathBuf),
}

impl Destination {
    /// Empty or `-` selects stdout, anything else is a file path
    pub fn parse(value: Option<&str>) -> Self {
        match value.map(str::trim) {
            None | Some("") | Some("-") => Destination::Stdout,
            Some(path) => Destination::File(PathBuf::from(path)),
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Destination::Stdout => write!(f, "stdout"),
            Destination::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Output ordering; fetch completion order is not stable between runs
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Id,
    None,
}

impl std::str::FromStr for SortOrder {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "id" => Ok(SortOrder::Id),
            "none" => Ok(SortOrder::None),
            other => Err(format!("sort must be 'id' or 'none', got: {}", other)),
        }
    }
}

pub fn sort_comments(comments: &mut [Comment], order: SortOrder) {
    if order == SortOrder::Id {
        comments.sort_by_key(|c| c.id);
    }
}

/// Notice for a run with nothing to write, worded by whether keywords were applied
pub fn empty_result_notice(keywords_applied: bool) -> &'static str {
    if keywords_applied {
        "no comments matched the supplied keywords, not writing output"
    } else {
        "thread has no comments, not writing output"
    }
}

/// Serialize comments as one JSON array followed by a newline
pub fn write_comments<W: Write>(mut writer: W, comments: &[Comment], pretty: bool) -> io::Result<()> {
    if pretty {
        serde_json::to_writer_pretty(&mut writer, comments)?;
    } else {
        serde_json::to_writer(&mut writer, comments)?;
    }
    writeln!(writer)?;
    writer.flush()
}

/// Write filtered comments to stdout or a file
///
/// Returns `false` without touching the destination when there is nothing
/// to write, so no empty output file is ever created. File output uses
/// temp file + rename to avoid partial writes.
pub fn write_json(comments: &[Comment], destination: &Destination, pretty: bool) -> Result<bool> {
    if comments.is_empty() {
        debug!(%destination, "nothing to write, leaving destination untouched");
        return Ok(false);
    }

    let output_err = |source: io::Error| Error::Output {
        destination: destination.to_string(),
        source,
    };

    match destination {
        Destination::Stdout => {
            let stdout = io::stdout();
            write_comments(stdout.lock(), comments, pretty).map_err(output_err)?;
        }
        Destination::File(path) => write_to_file(comments, path, pretty).map_err(output_err)?,
    }

    Ok(true)
}

fn write_to_file(comments: &[Comment], path: &Path, pretty: bool) -> io::Result<()> {
    // Temp file lives next to the target so the rename stays on one filesystem
    let parent_dir = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));

    let mut temp_file = tempfile::NamedTempFile::new_in(parent_dir)?;
    write_comments(&mut temp_file, comments, pretty)?;

    // NamedTempFile is created 0600
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;
        temp_file
            .as_file()
            .set_permissions(std::fs::Permissions::from_mode(OUTPUT_FILE_MODE))?;
    }

    temp_file.as_file().sync_all()?;
    temp_file.persist(path).map_err(|e| e.error)?;

    Ok(())
}
