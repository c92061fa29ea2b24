// rsdeploy/src/utils/report_files.rs
use anyhow::{Context, Result};
use std::fs::File;
use std::io::Read;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

use crate::errors::AppError;

/// File extension of report definition files, matched ignoring ASCII case.
pub const REPORT_EXTENSION: &str = "rdl";

/// A report definition found in the source directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportFile {
    /// File stem, used as the report name on the server.
    pub name: String,
    /// Path of the file as listed, with its original extension casing.
    pub path: PathBuf,
}

fn has_report_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case(REPORT_EXTENSION))
}

/// Lists the `*.rdl` files directly inside `source_dir`, sorted by file name.
///
/// Anything that is not a directory is listed, so a dangling link shows up
/// here and fails later at read time, where the failure is per report.
pub fn list_report_files(source_dir: &Path) -> Result<Vec<ReportFile>> {
    if !source_dir.is_dir() {
        anyhow::bail!(
            "Report source directory does not exist or is not a directory: {}",
            source_dir.display()
        );
    }

    let mut reports = Vec::new();
    for entry in WalkDir::new(source_dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry
            .with_context(|| format!("Failed to list report directory: {}", source_dir.display()))?;
        if entry.file_type().is_dir() || !has_report_extension(entry.path()) {
            continue;
        }
        match entry.path().file_stem().and_then(|s| s.to_str()) {
            Some(stem) => reports.push(ReportFile {
                name: stem.to_string(),
                path: entry.path().to_path_buf(),
            }),
            None => eprintln!(
                "⚠️ Skipping report file with a non UTF-8 name: {}",
                entry.path().display()
            ),
        }
    }

    Ok(reports)
}

/// Reads a report definition into a buffer sized exactly to the file length.
/// A short read is an error.
pub fn read_report_definition(path: &Path) -> crate::errors::Result<Vec<u8>> {
    let read_error = |e: std::io::Error| AppError::ReportRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    };

    let mut file = File::open(path).map_err(read_error)?;
    let len = file.metadata().map_err(read_error)?.len();
    let len = usize::try_from(len).map_err(|_| AppError::ReportRead {
        path: path.display().to_string(),
        reason: format!("file of {} bytes is too large to load", len),
    })?;

    let mut definition = vec![0u8; len];
    file.read_exact(&mut definition).map_err(read_error)?;
    Ok(definition)
}
