//! Durable mirror of the in-progress session, one slot per workout.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::PersistError;
use crate::session::SessionState;
use crate::util::slot_key;

pub const SLOT_VERSION: u32 = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredSession {
    pub version: u32,
    pub saved_at: DateTime<Utc>,
    pub state: SessionState,
}

/// Key/value storage for serialized sessions.
pub trait SlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError>;
    fn write(&self, key: &str, contents: &str) -> Result<(), PersistError>;
    fn remove(&self, key: &str) -> Result<(), PersistError>;

    fn save(&self, state: &SessionState) -> Result<(), PersistError> {
        let stored = StoredSession {
            version: SLOT_VERSION,
            saved_at: Utc::now(),
            state: state.clone(),
        };
        let json = serde_json::to_string(&stored)?;
        self.write(&slot_key(&state.workout_id), &json)
    }

    fn load(&self, workout_id: &str) -> Result<Option<SessionState>, PersistError> {
        let Some(json) = self.read(&slot_key(workout_id))? else {
            return Ok(None);
        };
        let stored: StoredSession = serde_json::from_str(&json)?;
        if stored.version != SLOT_VERSION {
            return Err(PersistError::Version {
                found: stored.version,
                expected: SLOT_VERSION,
            });
        }
        Ok(Some(stored.state))
    }

    fn clear(&self, workout_id: &str) -> Result<(), PersistError> {
        self.remove(&slot_key(workout_id))
    }
}

impl<T: SlotStore + ?Sized> SlotStore for &T {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        (**self).read(key)
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), PersistError> {
        (**self).write(key, contents)
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        (**self).remove(key)
    }
}

/// Loads a saved session, discarding (and clearing) anything unreadable.
pub fn restore<S: SlotStore + ?Sized>(store: &S, workout_id: &str) -> Option<SessionState> {
    match store.load(workout_id) {
        Ok(Some(state)) if state.workout_id == workout_id => Some(state),
        Ok(Some(state)) => {
            warn!(expected = workout_id, found = %state.workout_id, "slot holds another workout");
            discard(store, workout_id);
            None
        }
        Ok(None) => None,
        Err(err) => {
            warn!(workout = workout_id, %err, "discarding unreadable session slot");
            discard(store, workout_id);
            None
        }
    }
}

pub(crate) fn discard<S: SlotStore + ?Sized>(store: &S, workout_id: &str) {
    if let Err(err) = store.clear(workout_id) {
        warn!(workout = workout_id, %err, "failed to clear session slot");
    }
}

/// One JSON file per slot.
#[derive(Debug, Clone)]
pub struct FileSlotStore {
    dir: PathBuf,
}

impl FileSlotStore {
    pub fn new<P: AsRef<Path>>(dir: P) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
        }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(format!("{key}.json"))
    }
}

impl SlotStore for FileSlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        match fs::read_to_string(self.path(key)) {
            Ok(contents) => Ok(Some(contents)),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(None),
            Err(err) => Err(err.into()),
        }
    }

    /// Writes through a temp file so a crash never leaves half a slot.
    fn write(&self, key: &str, contents: &str) -> Result<(), PersistError> {
        fs::create_dir_all(&self.dir)?;
        let path = self.path(key);
        let tmp = self.dir.join(format!("{key}.json.tmp"));
        fs::write(&tmp, contents)?;
        fs::rename(&tmp, &path)?;
        debug!(path = %path.display(), "session slot saved");
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        match fs::remove_file(self.path(key)) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err.into()),
        }
    }
}

#[derive(Debug, Default)]
pub struct MemorySlotStore {
    slots: RefCell<HashMap<String, String>>,
}

impl MemorySlotStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores raw contents under the slot for `workout_id`.
    pub fn insert_raw(&self, workout_id: &str, contents: &str) {
        self.slots
            .borrow_mut()
            .insert(slot_key(workout_id), contents.to_string());
    }

    pub fn contains(&self, workout_id: &str) -> bool {
        self.slots.borrow().contains_key(&slot_key(workout_id))
    }
}

impl SlotStore for MemorySlotStore {
    fn read(&self, key: &str) -> Result<Option<String>, PersistError> {
        Ok(self.slots.borrow().get(key).cloned())
    }

    fn write(&self, key: &str, contents: &str) -> Result<(), PersistError> {
        self.slots
            .borrow_mut()
            .insert(key.to_string(), contents.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<(), PersistError> {
        self.slots.borrow_mut().remove(key);
        Ok(())
    }
}
