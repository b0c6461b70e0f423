//! Writing a case back to its source files.
//!
//! [save] is two-phase. Every document is first serialized to memory and staged next to its
//! original; only when all documents staged cleanly are the staged files renamed over the
//! originals, in document order. A serialization or staging failure therefore leaves every
//! document on disk untouched. A failure during the rename phase is reported together with the
//! documents that were already replaced.
use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};
use uuid::Uuid;

use crate::{
    case::{resolve, Case, Index},
    codec::CodecMap,
    error::AssuranceError,
    event::CaseEvent,
};

/// Storage the persistence writer stages and commits documents through.
pub trait DocumentStore {
    /// Write `text` to a staging location for `path`, returning that location.
    fn stage(&mut self, path: &Path, text: &str) -> Result<PathBuf, AssuranceError>;

    /// Replace `path` with the staged file.
    fn commit(&mut self, staged: &Path, path: &Path) -> Result<(), AssuranceError>;

    /// Drop a staged file that will not be committed. Best effort.
    fn discard(&mut self, staged: &Path);
}

/// Stages to a hidden sibling file and commits with a rename, so a committed document is
/// always either the old or the new text.
#[derive(Debug, Default, Clone, Copy)]
pub struct FsStore;

impl FsStore {
    fn staging_path(path: &Path) -> PathBuf {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        path.with_file_name(format!(".{name}.staged"))
    }
}

impl DocumentStore for FsStore {
    fn stage(&mut self, path: &Path, text: &str) -> Result<PathBuf, AssuranceError> {
        let staged = FsStore::staging_path(path);
        fs::write(&staged, text)?;
        Ok(staged)
    }

    fn commit(&mut self, staged: &Path, path: &Path) -> Result<(), AssuranceError> {
        fs::rename(staged, path)?;
        Ok(())
    }

    fn discard(&mut self, staged: &Path) {
        if let Err(e) = fs::remove_file(staged) {
            tracing::warn!("could not remove staged file {}: {e}", staged.display());
        }
    }
}

/// Check references before writing. Problems are logged per document and never stop the save.
fn resolve_pass(case: &Case) {
    let index = match Index::build(case) {
        Ok(index) => index,
        Err(e) => {
            tracing::warn!("skipping reference check before save: {e}");
            return;
        }
    };
    for doc_idx in 0..case.documents.len() {
        for diagnostic in resolve::resolve_document(case, &index, doc_idx) {
            tracing::warn!("{diagnostic}");
        }
    }
}

/// Serialize and write every document of `case`. Returns the paths written, in order.
#[tracing::instrument(skip_all, fields(root = %case.root.display()))]
pub fn save(
    case: &Case,
    codecs: &CodecMap,
    store: &mut dyn DocumentStore,
) -> Result<Vec<PathBuf>, AssuranceError> {
    let start = Instant::now();
    resolve_pass(case);
    tracing::debug!("save (resolve): {} ms", start.elapsed().as_millis());

    let start = Instant::now();
    let mut texts = Vec::with_capacity(case.documents.len());
    for doc in case.documents.iter() {
        let text = codecs
            .for_path(&doc.path)
            .and_then(|codec| codec.generate_source(doc))
            .map_err(|e| AssuranceError::Persistence(format!("{}: {e}", doc.path.display())))?;
        texts.push((doc.path.as_path(), text));
    }
    tracing::debug!("save (serialize): {} ms", start.elapsed().as_millis());

    let start = Instant::now();
    let mut staged = Vec::with_capacity(texts.len());
    for (path, text) in texts.iter() {
        match store.stage(path, text) {
            Ok(staged_path) => staged.push(staged_path),
            Err(e) => {
                for staged_path in staged.iter() {
                    store.discard(staged_path);
                }
                return Err(AssuranceError::Persistence(format!(
                    "{}: {e}; no documents were changed",
                    path.display()
                )));
            }
        }
    }
    tracing::debug!("save (stage): {} ms", start.elapsed().as_millis());

    let start = Instant::now();
    let mut committed = Vec::with_capacity(staged.len());
    for (idx, ((path, _), staged_path)) in texts.iter().zip(staged.iter()).enumerate() {
        if let Err(e) = store.commit(staged_path, path) {
            for pending in staged[idx..].iter() {
                store.discard(pending);
            }
            let done = committed
                .iter()
                .map(|p: &PathBuf| p.display().to_string())
                .collect::<Vec<String>>();
            return Err(AssuranceError::Persistence(format!(
                "{}: {e}; already written: [{}]",
                path.display(),
                done.join(", ")
            )));
        }
        committed.push(path.to_path_buf());
    }
    tracing::info!(
        "Saved {} document(s) in {} ms",
        committed.len(),
        start.elapsed().as_millis()
    );
    Ok(committed)
}

/// Give every node without a persisted uuid a fresh random one.
pub fn assign_uuids(case: &mut Case) -> Vec<CaseEvent> {
    let mut events = Vec::new();
    case.visit_mut(&mut |id, node| {
        if node.uuid.is_none() {
            let uuid = Uuid::new_v4().to_string();
            node.uuid = Some(uuid.clone());
            events.push(CaseEvent::UuidAssigned(id.clone(), uuid));
        }
    });
    tracing::debug!("assigned {} uuid(s)", events.len());
    events
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::case_from;

    #[test]
    fn assigns_only_missing_uuids() {
        let uuid = "0f5b4d0c-6a36-4a1e-8a4e-0c2b8a8c1d11";
        let mut case = case_from(&[(
            "a.gsn",
            &format!("GOALS a {{ goal G1 {{ uuid:\"{uuid}\"; strategy S1 {{ }} }} }}"),
        )]);
        let events = assign_uuids(&mut case);
        assert_eq!(events.len(), 1);
        assert!(matches!(&events[0], CaseEvent::UuidAssigned(id, _) if id.as_str() == "a/G1/S1"));
        let index = Index::build(&case).unwrap();
        assert_eq!(index.resolve(uuid).unwrap().0.as_str(), "a/G1");
        assert!(assign_uuids(&mut case).is_empty());
    }

    #[test]
    fn unserializable_document_aborts_before_staging() {
        struct Panicky;
        impl DocumentStore for Panicky {
            fn stage(&mut self, _: &Path, _: &str) -> Result<PathBuf, AssuranceError> {
                panic!("nothing should be staged")
            }
            fn commit(&mut self, _: &Path, _: &Path) -> Result<(), AssuranceError> {
                panic!("nothing should be committed")
            }
            fn discard(&mut self, _: &Path) {}
        }
        let mut case = case_from(&[("a.gsn", "GOALS a { goal G1 { } }"), ("b.gsn", "GOALS b { }")]);
        case.documents[0].definitions[0].nodes[0].summary = Some("bad ''' text".to_string());
        let err = save(&case, &CodecMap::create("    "), &mut Panicky).unwrap_err();
        assert!(matches!(err, AssuranceError::Persistence(_)));
    }

    #[test]
    fn fs_store_commits_by_rename() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("a.gsn");
        fs::write(&path, "old").unwrap();
        let mut store = FsStore;
        let staged = store.stage(&path, "new").unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "old");
        store.commit(&staged, &path).unwrap();
        assert_eq!(fs::read_to_string(&path).unwrap(), "new");
        assert!(!staged.exists());
    }
}
