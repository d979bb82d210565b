use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::backend::atomic;
use crate::backend::transfer::ImportMode;
use crate::error::{Error, Result};
use crate::model::{Profile, ProfileCollection};

/// Owns the in-memory profile collection and its `launches.json` file.
/// Every mutation is persisted before it returns.
pub struct ProfileStore {
    path: PathBuf,
    profiles: ProfileCollection,
}

impl ProfileStore {
    /// Open the store at `path`. A missing file is an empty store; a malformed
    /// one is `Error::CorruptData`.
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let mut store = Self::empty(path);
        store.profiles = store.load()?;
        Ok(store)
    }

    /// A store with nothing loaded. Nothing is written until the first mutation.
    pub fn empty(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            profiles: ProfileCollection::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn profiles(&self) -> &ProfileCollection {
        &self.profiles
    }

    pub fn get(&self, name: &str) -> Option<&Profile> {
        self.profiles.get(name)
    }

    pub fn load(&self) -> Result<ProfileCollection> {
        read_collection(&self.path)
    }

    /// Replace both the file and the in-memory collection with `collection`.
    pub fn save(&mut self, collection: &ProfileCollection) -> Result<()> {
        self.commit(collection.clone())
    }

    /// Write `next` to disk, then adopt it. Memory is untouched if the write fails.
    fn commit(&mut self, next: ProfileCollection) -> Result<()> {
        atomic::write_json(&self.path, &next)?;
        log::debug!("Saved {} profile(s) to {}", next.len(), self.path.display());
        self.profiles = next;
        Ok(())
    }

    pub fn add_or_update(&mut self, profile: Profile) -> Result<()> {
        profile.validate()?;

        let mut next = self.profiles.clone();
        let name = profile.name.clone();
        let replaced = next.upsert(profile).is_some();
        self.commit(next)?;

        log::info!(
            "{} profile '{}'",
            if replaced { "Updated" } else { "Added" },
            name
        );
        Ok(())
    }

    /// Removing a name that does not exist succeeds without touching the file.
    pub fn remove(&mut self, name: &str) -> Result<()> {
        if !self.profiles.contains(name) {
            log::debug!("Remove of unknown profile '{}' ignored", name);
            return Ok(());
        }

        let mut next = self.profiles.clone();
        next.remove(name);
        self.commit(next)?;

        log::info!("Removed profile '{}'", name);
        Ok(())
    }

    /// Apply an imported collection. Invalid profiles are skipped.
    /// Returns how many profiles were taken from `incoming`.
    pub fn import(&mut self, incoming: ProfileCollection, mode: ImportMode) -> Result<usize> {
        let mut valid = ProfileCollection::new();
        for profile in incoming.iter() {
            match profile.validate() {
                Ok(()) => {
                    valid.upsert(profile.clone());
                }
                Err(e) => log::warn!("Skipping imported profile: {}", e),
            }
        }

        let (next, taken) = match mode {
            ImportMode::Replace => {
                let n = valid.len();
                (valid, n)
            }
            ImportMode::Merge => {
                let mut merged = self.profiles.clone();
                let n = merged.merge(valid);
                (merged, n)
            }
        };
        self.commit(next)?;

        log::info!("Imported {} profile(s) ({:?})", taken, mode);
        Ok(taken)
    }

    /// Move the current file aside to `<file>.bak` and start from an empty
    /// collection. Used to recover from `Error::CorruptData`.
    pub fn backup_and_reset(&mut self) -> Result<PathBuf> {
        let mut backup = self.path.clone().into_os_string();
        backup.push(".bak");
        let backup = PathBuf::from(backup);

        match fs::rename(&self.path, &backup) {
            Ok(()) => log::warn!(
                "Moved unreadable {} to {}",
                self.path.display(),
                backup.display()
            ),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => return Err(Error::io(&self.path, e)),
        }

        let empty = ProfileCollection::new();
        self.commit(empty)?;
        Ok(backup)
    }
}

/// Read a JSON array of profiles. Missing file is an empty collection.
pub(crate) fn read_collection(path: &Path) -> Result<ProfileCollection> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) if e.kind() == ErrorKind::NotFound => {
            log::debug!("{} not found, starting empty", path.display());
            return Ok(ProfileCollection::new());
        }
        Err(e) => return Err(Error::io(path, e)),
    };

    serde_json::from_str(&data).map_err(|source| Error::CorruptData {
        path: path.to_path_buf(),
        source,
    })
}
