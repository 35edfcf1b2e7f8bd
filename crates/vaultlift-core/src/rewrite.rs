//! Document rewriting
//!
//! Streams a document line by line and replaces every line that holds at
//! least one successfully uploaded reference with a single inline image
//! pointing at the remote location. All other lines are copied byte for
//! byte, line terminators included.
//!
//! Output always goes to a temporary file in the destination directory
//! first and is renamed into place once complete, so a failed run never
//! leaves a truncated document behind.

use crate::error::{RewriteError, RewriteResult};
use crate::upload::{RemoteLocation, UploadResult};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use tracing::{debug, info};

/// Where the rewritten document goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RewriteTarget {
    /// Write to this path; the source is left untouched
    OutputFile(PathBuf),
    /// Replace the source document in place
    Overwrite,
}

impl RewriteTarget {
    /// Build a target from an output path and the overwrite flag
    ///
    /// `overwrite` takes precedence over `output_path`.
    pub fn from_flag(output_path: &Path, overwrite: bool) -> Self {
        if overwrite {
            Self::Overwrite
        } else {
            Self::OutputFile(output_path.to_path_buf())
        }
    }
}

/// Result of rewriting one document
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RewriteSummary {
    /// File the rewritten content ended up in
    pub written_to: PathBuf,
    /// Lines read from the source
    pub lines_total: usize,
    /// Lines replaced by a remote reference
    pub lines_rewritten: usize,
    /// Successful uploads whose line was rewritten with a later reference
    pub superseded: usize,
    /// Whether the destination file was (re)written
    pub file_written: bool,
}

/// Format the line that replaces a migrated reference
pub fn format_remote_line(caption: &str, remote: &RemoteLocation) -> String {
    format!("![{}]({})", caption, remote)
}

/// Pick the replacement for each line
///
/// Only successful uploads participate. When several share a line, the
/// one extracted last (highest ordinal) wins.
pub fn plan_line_replacements(results: &[UploadResult]) -> BTreeMap<usize, &UploadResult> {
    let mut plan: BTreeMap<usize, &UploadResult> = BTreeMap::new();

    for result in results.iter().filter(|r| r.is_success()) {
        let line = result.reference.line_number();
        let newer = plan.get(&line).map_or(true, |current| {
            current.reference.reference.ordinal < result.reference.reference.ordinal
        });
        if newer {
            plan.insert(line, result);
        }
    }

    plan
}

/// Rewrite `document_path` according to `results`
///
/// With `overwrite` the source is replaced, otherwise the rewritten text
/// goes to `output_path`.
pub fn rewrite(
    document_path: &Path,
    output_path: &Path,
    results: &[UploadResult],
    overwrite: bool,
) -> RewriteResult<RewriteSummary> {
    rewrite_document(
        document_path,
        &RewriteTarget::from_flag(output_path, overwrite),
        results,
    )
}

/// Rewrite a document into `target`
///
/// In [`RewriteTarget::Overwrite`] mode the source is left untouched when no
/// line changes. In output mode the destination is always written, so every
/// processed document has a counterpart in the output directory.
pub fn rewrite_document(
    source: &Path,
    target: &RewriteTarget,
    results: &[UploadResult],
) -> RewriteResult<RewriteSummary> {
    let plan = plan_line_replacements(results);
    let successful = results.iter().filter(|r| r.is_success()).count();

    let destination = match target {
        RewriteTarget::OutputFile(path) => path.clone(),
        RewriteTarget::Overwrite => source.to_path_buf(),
    };

    let reader = File::open(source).map_err(|e| RewriteError::ReadSource {
        path: source.to_path_buf(),
        source: e,
    })?;
    let permissions = reader.metadata().map(|m| m.permissions()).ok();

    let dir = match destination.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
        _ => PathBuf::from("."),
    };
    if matches!(target, RewriteTarget::OutputFile(_)) {
        std::fs::create_dir_all(&dir).map_err(|e| RewriteError::WriteOutput {
            path: dir.clone(),
            source: e,
        })?;
    }

    let write_err = |e: std::io::Error| RewriteError::WriteOutput {
        path: destination.clone(),
        source: e,
    };

    let mut temp = NamedTempFile::new_in(&dir).map_err(write_err)?;
    let (lines_total, lines_rewritten) = {
        let mut writer = BufWriter::new(temp.as_file_mut());
        let counts = copy_with_replacements(source, BufReader::new(reader), &mut writer, &plan)
            .map_err(|e| match e {
                CopyError::Read(e) => RewriteError::ReadSource {
                    path: source.to_path_buf(),
                    source: e,
                },
                CopyError::Write(e) => write_err(e),
            })?;
        writer.flush().map_err(write_err)?;
        counts
    };

    let summary = |file_written: bool| RewriteSummary {
        written_to: destination.clone(),
        lines_total,
        lines_rewritten,
        superseded: successful - lines_rewritten,
        file_written,
    };

    if *target == RewriteTarget::Overwrite && lines_rewritten == 0 {
        debug!("No lines to rewrite in {}, leaving it untouched", source.display());
        return Ok(summary(false));
    }

    temp.as_file().sync_all().map_err(write_err)?;
    if let Some(permissions) = permissions {
        std::fs::set_permissions(temp.path(), permissions).map_err(write_err)?;
    }
    temp.persist(&destination)
        .map_err(|e| RewriteError::Persist {
            path: destination.clone(),
            source: e.error,
        })?;

    info!(
        "Rewrote {}/{} lines of {} into {}",
        lines_rewritten,
        lines_total,
        source.display(),
        destination.display()
    );

    Ok(summary(true))
}

enum CopyError {
    Read(std::io::Error),
    Write(std::io::Error),
}

fn copy_with_replacements<R: BufRead, W: Write>(
    source: &Path,
    mut reader: R,
    writer: &mut W,
    plan: &BTreeMap<usize, &UploadResult>,
) -> Result<(usize, usize), CopyError> {
    let mut line = Vec::new();
    let mut index = 0;
    let mut rewritten = 0;

    loop {
        line.clear();
        if reader.read_until(b'\n', &mut line).map_err(CopyError::Read)? == 0 {
            break;
        }

        let replacement = plan
            .get(&index)
            .and_then(|result| result.remote_location().map(|loc| (result, loc)));

        match replacement {
            Some((result, location)) => {
                let formatted = format_remote_line(&result.reference.reference.caption, location);
                debug!(
                    "{}:{}: {} -> {}",
                    source.display(),
                    index + 1,
                    result.reference.name(),
                    location
                );
                writer.write_all(formatted.as_bytes()).map_err(CopyError::Write)?;
                writer
                    .write_all(line_terminator(&line))
                    .map_err(CopyError::Write)?;
                rewritten += 1;
            }
            None => writer.write_all(&line).map_err(CopyError::Write)?,
        }

        index += 1;
    }

    Ok((index, rewritten))
}

fn line_terminator(line: &[u8]) -> &'static [u8] {
    if line.ends_with(b"\r\n") {
        b"\r\n"
    } else if line.ends_with(b"\n") {
        b"\n"
    } else {
        b""
    }
}
