use std::fs::{self, File, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};

use fd_lock::RwLock;
use tracing::debug;

use super::domain::{
    Activation, ActivationReceipt, DraftVersion, RuleSetId, RuleSetVersion, RunId, RunPin,
    VersionId, VersionStatus,
};
use super::repository::{RepositoryError, RuleSetVersionRepository, ScoreRunRepository};
use super::state::StoreState;

/// Single-file JSON store.
///
/// Every operation takes an OS lock on a sibling `<path>.lock` file (shared for reads, exclusive
/// for writes) and works on the state read from disk under that lock, so any number of handles
/// and processes may share one store file. A mutation is written to `<path>.tmp`, synced and
/// renamed over the store file before the lock is released.
#[derive(Debug)]
pub struct JsonFileRuleSetStore {
    path: PathBuf,
    lock_path: PathBuf,
    tmp_path: PathBuf,
}

impl JsonFileRuleSetStore {
    /// Opens the store at `path`, creating its directory. A missing file is an empty store; an
    /// unreadable one fails here rather than on first use.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self, RepositoryError> {
        let path = path.into();
        if let Some(parent) = parent_dir(&path) {
            fs::create_dir_all(parent).map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "failed to create {}: {err}",
                    parent.display()
                ))
            })?;
        }

        let store = Self {
            lock_path: sibling(&path, ".lock"),
            tmp_path: sibling(&path, ".tmp"),
            path,
        };
        store.read(|_| ())?;
        Ok(store)
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_file(&self) -> Result<RwLock<File>, RepositoryError> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&self.lock_path)
            .map_err(|err| {
                RepositoryError::Unavailable(format!(
                    "failed to open {}: {err}",
                    self.lock_path.display()
                ))
            })?;
        Ok(RwLock::new(file))
    }

    fn read<T>(&self, read: impl FnOnce(&StoreState) -> T) -> Result<T, RepositoryError> {
        let lock = self.lock_file()?;
        let _guard = lock.read().map_err(|err| {
            RepositoryError::Unavailable(format!("failed to lock rule set store: {err}"))
        })?;
        let state = self.load()?;
        Ok(read(&state))
    }

    fn write<T>(
        &self,
        mutate: impl FnOnce(&mut StoreState) -> Result<T, RepositoryError>,
    ) -> Result<T, RepositoryError> {
        let mut lock = self.lock_file()?;
        let _guard = lock.write().map_err(|err| {
            RepositoryError::Unavailable(format!("failed to lock rule set store: {err}"))
        })?;
        let mut state = self.load()?;
        let value = mutate(&mut state)?;
        self.persist(&state)?;
        Ok(value)
    }

    fn load(&self) -> Result<StoreState, RepositoryError> {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => return Ok(StoreState::default()),
            Err(err) => {
                return Err(RepositoryError::Unavailable(format!(
                    "failed to read {}: {err}",
                    self.path.display()
                )))
            }
        };
        serde_json::from_str::<StoreState>(&raw)
            .map_err(|err| RepositoryError::Corrupt(format!("{}: {err}", self.path.display())))
    }

    fn persist(&self, state: &StoreState) -> Result<(), RepositoryError> {
        let payload = serde_json::to_vec_pretty(state)
            .map_err(|err| RepositoryError::Corrupt(err.to_string()))?;

        let mut file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(&self.tmp_path)
            .map_err(|err| unavailable("create", &self.tmp_path, err))?;
        file.write_all(&payload)
            .map_err(|err| unavailable("write", &self.tmp_path, err))?;
        file.sync_all()
            .map_err(|err| unavailable("sync", &self.tmp_path, err))?;

        fs::rename(&self.tmp_path, &self.path)
            .map_err(|err| unavailable("replace", &self.path, err))?;

        // Best effort: not every platform can open a directory for syncing.
        if let Some(parent) = parent_dir(&self.path) {
            if let Ok(dir) = File::open(parent) {
                let _ = dir.sync_all();
            }
        }

        debug!(path = %self.path.display(), "rule set store persisted");
        Ok(())
    }
}

fn unavailable(action: &str, path: &Path, err: std::io::Error) -> RepositoryError {
    RepositoryError::Unavailable(format!("failed to {action} {}: {err}", path.display()))
}

fn parent_dir(path: &Path) -> Option<&Path> {
    path.parent().filter(|parent| !parent.as_os_str().is_empty())
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_owned();
    name.push(suffix);
    PathBuf::from(name)
}

impl RuleSetVersionRepository for JsonFileRuleSetStore {
    fn insert_draft(&self, draft: DraftVersion) -> Result<RuleSetVersion, RepositoryError> {
        self.write(|state| state.insert_draft(draft))
    }

    fn fetch(&self, id: &VersionId) -> Result<Option<RuleSetVersion>, RepositoryError> {
        self.read(|state| state.fetch(id))
    }

    fn active(&self, rule_set_id: &RuleSetId) -> Result<Option<RuleSetVersion>, RepositoryError> {
        self.read(|state| state.active(rule_set_id))
    }

    fn list(
        &self,
        rule_set_id: &RuleSetId,
        status: Option<VersionStatus>,
        limit: usize,
        offset: usize,
    ) -> Result<Vec<RuleSetVersion>, RepositoryError> {
        self.read(|state| state.list(rule_set_id, status, limit, offset))
    }

    fn activate(
        &self,
        rule_set_id: &RuleSetId,
        id: &VersionId,
        activation: Activation,
    ) -> Result<ActivationReceipt, RepositoryError> {
        self.write(|state| state.activate(rule_set_id, id, activation))
    }
}

impl ScoreRunRepository for JsonFileRuleSetStore {
    fn pin_rule_set_version(
        &self,
        run_id: &RunId,
        version_id: Option<&VersionId>,
    ) -> Result<(), RepositoryError> {
        self.write(|state| {
            state.pin_run(run_id, version_id);
            Ok(())
        })
    }

    fn rule_set_pin(&self, run_id: &RunId) -> Result<RunPin, RepositoryError> {
        self.read(|state| state.run_pin(run_id))
    }
}
