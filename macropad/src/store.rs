use crate::{ActionType, Binding, DEFAULT_PROFILE, Error, ProfileSet, default_profile_set};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

/// JSON-backed set of named profiles.
///
/// The whole set is rewritten to disk after every update.
#[derive(Debug)]
pub struct ProfileStore {
    path: PathBuf,
    current: String,
    profiles: RwLock<ProfileSet>,
}

impl ProfileStore {
    /// Loads the profile set at `path`, falling back to the built-in default
    /// set if the file is missing, unparsable or has no default profile.
    pub fn load(path: impl AsRef<Path>) -> Self {
        let path = path.as_ref().to_path_buf();
        let profiles = match Self::read(&path) {
            Ok(profiles) => {
                tracing::info!(path = %path.display(), profiles = profiles.len(), "loaded");
                profiles
            }
            Err(Error::Io(e)) if e.kind() == io::ErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "not found, using defaults");
                default_profile_set()
            }
            Err(e) => {
                tracing::warn!(path = %path.display(), "{e}, using defaults");
                default_profile_set()
            }
        };
        Self {
            path,
            current: DEFAULT_PROFILE.to_owned(),
            profiles: RwLock::new(profiles),
        }
    }

    fn read(path: &Path) -> Result<ProfileSet, Error> {
        let contents = fs::read_to_string(path)?;
        let profiles: ProfileSet = serde_json::from_str(&contents)?;
        if !profiles.contains_key(DEFAULT_PROFILE) {
            return Err(Error::MissingDefaultProfile);
        }
        Ok(profiles)
    }

    pub fn with_current(mut self, profile: impl Into<String>) -> Self {
        self.current = profile.into();
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Name of the profile the dispatcher resolves bindings in.
    pub fn current(&self) -> &str {
        &self.current
    }

    pub fn profiles(&self) -> ProfileSet {
        self.read_lock().clone()
    }

    /// Returns the binding for `key_id`, or [`Binding::default`] if either the
    /// profile or the key is absent.
    pub fn get_binding(&self, profile: &str, key_id: &str) -> Binding {
        self.read_lock()
            .get(profile)
            .and_then(|bindings| bindings.get(key_id))
            .cloned()
            .unwrap_or_default()
    }

    /// Creates or replaces the binding for `key_id`, creating the profile if
    /// needed, then persists the whole set.
    #[tracing::instrument(err, skip(self, value))]
    pub fn update_binding(
        &self,
        profile: &str,
        key_id: &str,
        type_: ActionType,
        value: &str,
        color: &str,
    ) -> Result<(), Error> {
        let mut profiles = self.write_lock();
        profiles
            .entry(profile.to_owned())
            .or_default()
            .insert(key_id.to_owned(), Binding::new(type_, value, color));
        self.save(&profiles)
    }

    fn save(&self, profiles: &ProfileSet) -> Result<(), Error> {
        let json = serde_json::to_string_pretty(profiles)?;
        fs::write(&self.path, json)?;
        tracing::info!(path = %self.path.display(), "saved");
        Ok(())
    }

    // A poisoned lock still holds a complete set: every mutation is a single insert.
    fn read_lock(&self) -> RwLockReadGuard<'_, ProfileSet> {
        self.profiles.read().unwrap_or_else(|e| e.into_inner())
    }

    fn write_lock(&self) -> RwLockWriteGuard<'_, ProfileSet> {
        self.profiles.write().unwrap_or_else(|e| e.into_inner())
    }
}
