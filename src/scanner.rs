//! File and directory scanning.
//!
//! [`scan_file`] reads and extracts one file; [`scan_all_files`] walks a
//! directory tree and extracts every file with the wanted extension, in
//! parallel across files.
//!
//! The walk deliberately does not honour `.gitignore`: the code worth
//! indexing (framework sources under `vendor/`) is usually ignored by the
//! project.  Hidden entries are skipped, and a `.codeintelignore` file in
//! gitignore syntax can prune the tree.

use std::path::{Path, PathBuf};

use ignore::WalkBuilder;
use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::error::{Error, Result};
use crate::extractor;
use crate::lexer::Lexer;
use crate::types::Declaration;

/// Per-directory ignore file understood by the walker.
pub const IGNORE_FILE: &str = ".codeintelignore";

/// Declarations found in one file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileDeclarations {
    /// Absolute path of the file.
    pub path: PathBuf,
    pub declarations: Vec<Declaration>,
}

impl FileDeclarations {
    /// Class of the first declaration, which is taken to be the file's
    /// class.
    pub fn class_name(&self) -> Option<&str> {
        self.declarations.first().map(|d| d.class.as_str())
    }
}

/// Whether `path` has extension `extension` (given with or without the
/// leading dot).
pub fn has_extension(path: &Path, extension: &str) -> bool {
    let wanted = extension.trim_start_matches('.');
    path.extension().is_some_and(|e| e == wanted)
}

/// Extract the declarations of one file.
///
/// Returns `Ok(None)` when the file does not carry `extension`.
pub fn scan_file(
    lexer: &impl Lexer,
    path: &Path,
    extension: &str,
) -> Result<Option<FileDeclarations>> {
    if !has_extension(path, extension) {
        return Ok(None);
    }
    let bytes = std::fs::read(path).map_err(|e| Error::io(path, e))?;
    // PHP files are not required to be UTF-8.
    let source = String::from_utf8_lossy(&bytes);
    let declarations = extractor::extract_source(lexer, &source)?;
    debug!(path = %path.display(), count = declarations.len(), "scanned file");

    let path = std::path::absolute(path).map_err(|e| Error::io(path, e))?;
    Ok(Some(FileDeclarations { path, declarations }))
}

/// Paths under `root` carrying `extension`, in walk order.
pub fn collect_files(root: &Path, extension: &str) -> Result<Vec<PathBuf>> {
    let mut builder = WalkBuilder::new(root);
    builder
        .standard_filters(false)
        .hidden(true)
        .add_custom_ignore_filename(IGNORE_FILE);

    let mut files = Vec::new();
    for entry in builder.build() {
        let entry = entry?;
        if entry.file_type().is_some_and(|ft| ft.is_file())
            && has_extension(entry.path(), extension)
        {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

/// Extract every file under `root` carrying `extension`.
///
/// Files that cannot be read or tokenized are logged and skipped so that
/// one bad file does not sink a whole workspace.  Results are sorted by
/// path.
pub fn scan_all_files(
    lexer: &impl Lexer,
    root: &Path,
    extension: &str,
) -> Result<Vec<FileDeclarations>> {
    let files = collect_files(root, extension)?;
    let scanned: Vec<FileDeclarations> = files
        .par_iter()
        .filter_map(|path| match scan_file(lexer, path, extension) {
            Ok(found) => found,
            Err(e) => {
                warn!(path = %path.display(), error = %e, "skipping file");
                None
            }
        })
        .collect();

    info!(
        root = %root.display(),
        files = scanned.len(),
        declarations = scanned.iter().map(|f| f.declarations.len()).sum::<usize>(),
        "workspace scan finished"
    );
    Ok(scanned)
}
