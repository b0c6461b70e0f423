//! Document loader: every case document in one model directory, parsed fresh per request.
use std::{
    fs::read_to_string,
    path::{Path, PathBuf},
    time::Instant,
};
use walkdir::{DirEntry, WalkDir};

use crate::{case::Case, codec::CodecMap, config::EngineConfig, error::AssuranceError};

/// Case documents directly inside `dir` (no recursion), sorted by file name so document order
/// is stable across platforms.
pub fn case_files(dir: &Path, extension: &str) -> Vec<PathBuf> {
    fn is_hidden(entry: &DirEntry) -> bool {
        entry
            .file_name()
            .to_str()
            .map(|s| s.starts_with('.'))
            .unwrap_or(false)
    }
    let mut files = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .into_iter()
        .filter_entry(|e| !is_hidden(e))
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|p| p.extension().and_then(|ext| ext.to_str()) == Some(extension))
        .collect::<Vec<PathBuf>>();
    files.sort();
    files
}

/// Load the case rooted at `dir`. Fails with [AssuranceError::Argument] when `dir` does not
/// exist or is not a directory; any document that fails to parse fails the load.
#[tracing::instrument(skip(config, codecs))]
pub fn load(dir: &Path, config: &EngineConfig, codecs: &CodecMap) -> Result<Case, AssuranceError> {
    if !dir.exists() {
        return Err(AssuranceError::Argument(format!(
            "{} does not exist",
            dir.display()
        )));
    }
    if !dir.is_dir() {
        return Err(AssuranceError::Argument(format!(
            "{} is not a directory",
            dir.display()
        )));
    }
    let start = Instant::now();
    let mut documents = Vec::new();
    for path in case_files(dir, &config.extension) {
        let codec = codecs.for_path(&path)?;
        let content = read_to_string(&path)?;
        let doc = codec.parse(&content, &path)?;
        tracing::debug!(
            "parsed {} ({} definition(s))",
            path.display(),
            doc.definitions.len()
        );
        documents.push(doc);
    }
    let case = Case::new(dir, documents);
    tracing::info!(
        "Loaded {} document(s), {} node(s) in {} ms",
        case.documents.len(),
        case.node_count(),
        start.elapsed().as_millis()
    );
    Ok(case)
}
