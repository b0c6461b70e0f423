//! The request surface the editor talks to.
//!
//! # Module Organization
//!
//! - [`Op`]: the five editor operations
//! - [`Engine`]: runs one request end to end (load, interpret, project, save) and turns every
//!   outcome into a single string
//! - [`CancelToken`]: cooperative cancellation, polled between pipeline stages
//!
//! No case survives a request: every request reloads its directory from disk. Requests for the
//! same directory are serialized by a per-directory lock, so two concurrent updates cannot
//! overwrite each other's save; requests for different directories run independently.
//!
//! ```rust,no_run
//! use assurance_core::service::Engine;
//!
//! let engine = Engine::new();
//! let json = engine.execute("gsn.GET_MODEL_JSON", Some(r#"{"modelDir": "/work/case"}"#));
//! println!("{json}");
//! ```
use parking_lot::Mutex;
use serde::Deserialize;
use serde_json::Value;
use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
    fs,
    path::{Path, PathBuf},
    str::FromStr,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use crate::{
    case::{Case, Index},
    codec::{gsn::GsnCodec, CodecMap, DocCodec},
    commands::CommandInterpreter,
    config::EngineConfig,
    error::AssuranceError,
    loader, origin, persist,
    persist::{DocumentStore, FsStore},
    projection,
};

const COMMAND_PREFIX: &str = "gsn.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Op {
    /// Project the case and return the JSON.
    GetModelJson,
    /// Project the case and write the JSON to the model file.
    GenerateModelJson,
    /// Apply a command list, save, and return the new projection.
    ModelUpdate,
    /// Source file and line of one node.
    RevealOrigin,
    /// Persist a uuid on every node lacking one.
    AssignUuids,
}

impl Op {
    pub fn all() -> &'static [Op] {
        &[
            Op::GetModelJson,
            Op::GenerateModelJson,
            Op::ModelUpdate,
            Op::RevealOrigin,
            Op::AssignUuids,
        ]
    }

    pub fn name(&self) -> &'static str {
        match self {
            Op::GetModelJson => "GET_MODEL_JSON",
            Op::GenerateModelJson => "GENERATE_MODEL_JSON",
            Op::ModelUpdate => "MODEL_UPDATE",
            Op::RevealOrigin => "REVEAL_ORIGIN",
            Op::AssignUuids => "ASSIGN_UUIDS",
        }
    }

    /// Names as registered with the editor.
    pub fn commands() -> Vec<String> {
        Op::all()
            .iter()
            .map(|op| format!("{COMMAND_PREFIX}{}", op.name()))
            .collect()
    }
}

impl Display for Op {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "{COMMAND_PREFIX}{}", self.name())
    }
}

impl FromStr for Op {
    type Err = AssuranceError;

    /// Accepts `GET_MODEL_JSON` and `gsn.GET_MODEL_JSON` alike.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let name = s.strip_prefix(COMMAND_PREFIX).unwrap_or(s);
        Op::all()
            .iter()
            .copied()
            .find(|op| op.name() == name)
            .ok_or_else(|| AssuranceError::UnknownCommand(s.to_string()))
    }
}

/// Arguments of every operation. Only `modelDir` is always required.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Request {
    pub model_dir: String,
    #[serde(default)]
    pub command_list: Option<Vec<Value>>,
    #[serde(default)]
    pub node_id: Option<String>,
}

impl Request {
    /// The directory to load. A `"file://` prefix and trailing quote are stripped; a path to a
    /// file means the directory containing it.
    pub fn directory(&self) -> Result<PathBuf, AssuranceError> {
        let mut raw = self.model_dir.trim();
        if let Some(stripped) = raw.strip_prefix("\"file://") {
            raw = stripped;
        } else if let Some(stripped) = raw.strip_prefix("file://") {
            raw = stripped;
        }
        if let Some(end) = raw.find('"') {
            raw = &raw[..end];
        }
        if raw.is_empty() {
            return Err(AssuranceError::Argument(self.model_dir.clone()));
        }
        let path = PathBuf::from(raw);
        if !path.exists() {
            return Err(AssuranceError::Argument(raw.to_string()));
        }
        if path.is_file() {
            return path
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| AssuranceError::Argument(raw.to_string()));
        }
        Ok(path)
    }
}

/// Set from any thread; the engine checks it between load, interpret, project and save.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub fn check(&self) -> Result<(), AssuranceError> {
        if self.is_cancelled() {
            Err(AssuranceError::Cancelled)
        } else {
            Ok(())
        }
    }
}

type StoreFactory = Box<dyn Fn() -> Box<dyn DocumentStore> + Send + Sync>;

pub struct Engine {
    /// Codecs registered on top of the built-in one.
    codecs: CodecMap,
    locks: Mutex<HashMap<PathBuf, Arc<Mutex<()>>>>,
    store: StoreFactory,
}

impl Default for Engine {
    fn default() -> Self {
        Engine::new()
    }
}

impl Engine {
    pub fn new() -> Self {
        Engine {
            codecs: CodecMap::default(),
            locks: Mutex::new(HashMap::new()),
            store: Box::new(|| Box::new(FsStore)),
        }
    }

    /// Use `factory` for every save instead of writing straight to the file system.
    pub fn with_store<F>(mut self, factory: F) -> Self
    where
        F: Fn() -> Box<dyn DocumentStore> + Send + Sync + 'static,
    {
        self.store = Box::new(factory);
        self
    }

    /// Register a codec for another extension, or replace the built-in one.
    pub fn register_codec(&self, extension: &str, codec: Arc<dyn DocCodec>) {
        self.codecs.insert(extension, codec);
    }

    fn codecs_for(&self, config: &EngineConfig) -> CodecMap {
        let codecs = CodecMap::create(&config.indent);
        for ext in self.codecs.extensions() {
            if let Some(codec) = self.codecs.get(&ext) {
                codecs.insert(&ext, codec);
            }
        }
        if codecs.get(&config.extension).is_none() {
            codecs.insert(&config.extension, Arc::new(GsnCodec::new(&config.indent)));
        }
        codecs
    }

    fn dir_lock(&self, dir: &Path) -> (PathBuf, Arc<Mutex<()>>) {
        let key = fs::canonicalize(dir).unwrap_or_else(|_| dir.to_path_buf());
        let lock = self.locks.lock().entry(key.clone()).or_default().clone();
        (key, lock)
    }

    /// Drop the lock entry for `key` once no other request holds or waits on it.
    fn release_dir_lock(&self, key: &Path, lock: Arc<Mutex<()>>) {
        let mut locks = self.locks.lock();
        drop(lock);
        if locks.get(key).is_some_and(|l| Arc::strong_count(l) == 1) {
            locks.remove(key);
        }
    }

    /// Run one editor command. Always returns a string: the success payload, or the error message.
    pub fn execute(&self, command: &str, payload: Option<&str>) -> String {
        self.execute_with(command, payload, &CancelToken::default())
    }

    pub fn execute_with(&self, command: &str, payload: Option<&str>, cancel: &CancelToken) -> String {
        let payload = match payload.map(str::trim).filter(|p| !p.is_empty()) {
            Some(payload) => payload,
            None => return "Missing arguments".to_string(),
        };
        let start = Instant::now();
        let result = serde_json::from_str::<Request>(payload)
            .map_err(AssuranceError::from)
            .and_then(|request| {
                let dir = request.directory()?;
                match command.parse::<Op>() {
                    Ok(op) => self.run(op, &request, &dir, cancel),
                    Err(_) => Ok("Bad Command".to_string()),
                }
            });
        match result {
            Ok(out) => {
                tracing::info!("{command}: {} ms", start.elapsed().as_millis());
                out
            }
            Err(e) => {
                tracing::warn!("{command} failed after {} ms: {e}", start.elapsed().as_millis());
                e.to_string()
            }
        }
    }

    /// Run `op` for `dir`, holding the directory's lock throughout.
    #[tracing::instrument(skip(self, request, cancel), fields(dir = %dir.display()))]
    pub fn run(
        &self,
        op: Op,
        request: &Request,
        dir: &Path,
        cancel: &CancelToken,
    ) -> Result<String, AssuranceError> {
        let (key, lock) = self.dir_lock(dir);
        let result = {
            let _guard = lock.lock();
            self.run_locked(op, request, dir, cancel)
        };
        self.release_dir_lock(&key, lock);
        result
    }

    fn run_locked(
        &self,
        op: Op,
        request: &Request,
        dir: &Path,
        cancel: &CancelToken,
    ) -> Result<String, AssuranceError> {
        let config = EngineConfig::load(dir)?;
        let codecs = self.codecs_for(&config);

        match op {
            Op::GetModelJson => {
                let case = self.load(dir, &config, &codecs, cancel)?;
                Index::build(&case)?;
                cancel.check()?;
                projection::to_json(&projection::project(&case))
            }
            Op::GenerateModelJson => {
                let case = self.load(dir, &config, &codecs, cancel)?;
                Index::build(&case)?;
                cancel.check()?;
                let json = projection::to_pretty_json(&projection::project(&case), config.json_indent)?;
                cancel.check()?;
                let out = dir.join(&config.model_json_file);
                fs::write(&out, json)?;
                tracing::info!("wrote {}", out.display());
                Ok(String::new())
            }
            Op::ModelUpdate => {
                let commands = request.command_list.clone().ok_or_else(|| {
                    AssuranceError::Parse("Unable to Parse CommandList".to_string())
                })?;
                let case = self.load(dir, &config, &codecs, cancel)?;
                let mut interpreter = CommandInterpreter::new(case)?;
                interpreter.apply_all(commands)?;
                tracing::debug!("applied {} command(s)", interpreter.applied().len());
                cancel.check()?;
                let json = projection::to_json(&projection::project(interpreter.case()))?;
                cancel.check()?;
                self.save(interpreter.case(), &codecs).map_err(|e| {
                    AssuranceError::Persistence(format!("Could not save resources due to errors: {e}"))
                })?;
                Ok(json)
            }
            Op::RevealOrigin => {
                let node_id = request.node_id.as_deref().ok_or_else(|| {
                    AssuranceError::Parse("Unable to get object path - nodeId".to_string())
                })?;
                let case = self.load(dir, &config, &codecs, cancel)?;
                let index = Index::build(&case)?;
                Ok(serde_json::to_string(&origin::locate(&case, &index, node_id)?)?)
            }
            Op::AssignUuids => {
                let mut case = self.load(dir, &config, &codecs, cancel)?;
                Index::build(&case)?;
                let events = persist::assign_uuids(&mut case);
                tracing::info!("assigned {} uuid(s)", events.len());
                cancel.check()?;
                self.save(&case, &codecs).map_err(|e| {
                    AssuranceError::Persistence(format!(
                        "Failed to save model after assigning UUIDs: {e}"
                    ))
                })?;
                Ok(String::new())
            }
        }
    }

    fn load(
        &self,
        dir: &Path,
        config: &EngineConfig,
        codecs: &CodecMap,
        cancel: &CancelToken,
    ) -> Result<Case, AssuranceError> {
        cancel.check()?;
        let case = loader::load(dir, config, codecs)?;
        cancel.check()?;
        Ok(case)
    }

    fn save(&self, case: &Case, codecs: &CodecMap) -> Result<(), AssuranceError> {
        let mut store = (self.store)();
        persist::save(case, codecs, store.as_mut())?;
        Ok(())
    }
}
