use crate::app::AppState;
use crate::error::StorageError;
use std::fs;
use std::path::{Path, PathBuf};

/// Owns the application state and writes it back to disk on shutdown
pub struct StateStore {
    state: AppState,
    path: PathBuf,
    dirty: bool,
}

impl StateStore {
    pub fn new(state: AppState, path: impl Into<PathBuf>) -> Self {
        StateStore {
            state,
            path: path.into(),
            dirty: false,
        }
    }

    /// Load the state file. Anything unreadable is replaced by a fresh
    /// default state that gets written on the next flush.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();

        match fs::read(&path)
            .map_err(StorageError::from)
            .and_then(|data| AppState::from_json(&data))
        {
            Ok(state) => {
                tracing::info!(path = %path.display(), items = state.collection.len(), "Loaded state");
                StateStore::new(state, path)
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "Starting from default state");
                let mut store = StateStore::new(AppState::new(), path);
                store.set_dirty();
                store
            }
        }
    }

    pub fn get(&self) -> &AppState {
        &self.state
    }

    pub fn get_mut(&mut self) -> &mut AppState {
        &mut self.state
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn set_dirty(&mut self) {
        self.dirty = true;
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Re-establish the active and selected pointers
    pub fn ensure_default_items(&mut self) {
        if self.state.ensure_default_items() {
            self.set_dirty();
        }
    }

    /// Ensure the state file's directory exists
    fn ensure_dir(&self) -> Result<(), StorageError> {
        if let Some(dir) = self.path.parent().filter(|d| !d.as_os_str().is_empty()) {
            if !dir.exists() {
                fs::create_dir_all(dir)?;
            }
        }
        Ok(())
    }

    /// Write the state if anything changed since the last flush
    pub fn shutdown(&mut self) -> Result<(), StorageError> {
        if !self.dirty {
            return Ok(());
        }

        self.ensure_dir()?;
        let content = self.state.to_json()?;
        fs::write(&self.path, content)?;
        self.dirty = false;

        tracing::info!(path = %self.path.display(), "Saved state");
        Ok(())
    }
}
