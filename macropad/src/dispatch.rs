use crate::{ActionType, Combo, Hotkey, MediaKey, ProfileStore, is_encoder};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

/// OS input-injection capabilities.
pub trait Injector {
    type Error: std::error::Error;

    fn combo(&mut self, combo: &Combo) -> Result<(), Self::Error>;
    fn media(&mut self, key: MediaKey) -> Result<(), Self::Error>;
    fn text(&mut self, text: &str) -> Result<(), Self::Error>;
    fn open(&mut self, path: &Path) -> Result<(), Self::Error>;
}

/// What a single dispatch did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Performed,
    /// Encoder event while the encoder lock is set.
    Locked,
    /// Unbound key or empty value.
    Unbound,
    /// `open` binding whose path does not exist.
    MissingPath,
    /// `hotkey` value that is not a valid combination.
    Invalid,
    /// The injector reported an error.
    Failed,
}

pub struct Dispatcher<I> {
    store: Arc<ProfileStore>,
    injector: Mutex<I>,
    locked: AtomicBool,
}

impl<I> Dispatcher<I>
where
    I: Injector,
{
    pub fn new(store: Arc<ProfileStore>, injector: I) -> Self {
        Self {
            store,
            injector: Mutex::new(injector),
            locked: AtomicBool::new(false),
        }
    }

    pub fn store(&self) -> &Arc<ProfileStore> {
        &self.store
    }

    pub fn set_lock(&self, locked: bool) {
        self.locked.store(locked, Ordering::Relaxed);
        tracing::info!(locked, "encoder lock");
    }

    pub fn is_locked(&self) -> bool {
        self.locked.load(Ordering::Relaxed)
    }

    /// Performs the action bound to `key_id` in the current profile. Never
    /// fails: every problem is logged and reported through [`Outcome`].
    #[tracing::instrument(ret, skip(self))]
    pub fn dispatch(&self, key_id: &str) -> Outcome {
        if self.is_locked() && is_encoder(key_id) {
            tracing::info!("ignored (encoders locked)");
            return Outcome::Locked;
        }

        let binding = self.store.get_binding(self.store.current(), key_id);
        if binding.is_noop() {
            return Outcome::Unbound;
        }

        let mut injector = self.injector.lock().unwrap_or_else(|e| e.into_inner());
        let result = match binding.type_ {
            ActionType::Hotkey => match Hotkey::parse(&binding.value) {
                Ok(Hotkey::Media(key)) => injector.media(key),
                Ok(Hotkey::Combo(combo)) => injector.combo(&combo),
                Err(e) => {
                    tracing::warn!(value = %binding.value, "{e}");
                    return Outcome::Invalid;
                }
            },
            ActionType::Write => injector.text(&binding.value),
            ActionType::Open => {
                let path = Path::new(&binding.value);
                if !path.exists() {
                    tracing::warn!(path = %binding.value, "no such file");
                    return Outcome::MissingPath;
                }
                injector.open(path)
            }
        };
        match result {
            Ok(()) => Outcome::Performed,
            Err(e) => {
                tracing::error!(type_ = %binding.type_, "{e}");
                Outcome::Failed
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Dispatcher, Injector, Outcome};
    use crate::{ActionType, Combo, DEFAULT_PROFILE, Key, MediaKey, Modifiers, ProfileStore};
    use std::io;
    use std::path::{Path, PathBuf};
    use std::sync::{Arc, Mutex};

    #[derive(Clone, Debug, PartialEq)]
    pub enum Call {
        Combo(Combo),
        Media(MediaKey),
        Text(String),
        Open(PathBuf),
    }

    #[derive(Clone, Default)]
    pub struct Recorder {
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub fail: bool,
    }

    impl Recorder {
        fn push(&mut self, call: Call) -> io::Result<()> {
            self.calls.lock().unwrap().push(call);
            if self.fail {
                Err(io::Error::other("injection failed"))
            } else {
                Ok(())
            }
        }

        pub fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    impl Injector for Recorder {
        type Error = io::Error;

        fn combo(&mut self, combo: &Combo) -> io::Result<()> {
            self.push(Call::Combo(combo.clone()))
        }

        fn media(&mut self, key: MediaKey) -> io::Result<()> {
            self.push(Call::Media(key))
        }

        fn text(&mut self, text: &str) -> io::Result<()> {
            self.push(Call::Text(text.to_owned()))
        }

        fn open(&mut self, path: &Path) -> io::Result<()> {
            self.push(Call::Open(path.to_path_buf()))
        }
    }

    fn dispatcher(dir: &Path) -> (Dispatcher<Recorder>, Recorder) {
        let store = Arc::new(ProfileStore::load(dir.join("profiles.json")));
        let recorder = Recorder::default();
        (Dispatcher::new(store, recorder.clone()), recorder)
    }

    fn bind(dispatcher: &Dispatcher<Recorder>, key_id: &str, type_: ActionType, value: &str) {
        dispatcher
            .store()
            .update_binding(DEFAULT_PROFILE, key_id, type_, value, "#FFFFFF")
            .unwrap();
    }

    #[test]
    fn test_dispatch_combo() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recorder) = dispatcher(dir.path());

        assert_eq!(dispatcher.dispatch("KEY_1"), Outcome::Performed);
        assert_eq!(
            recorder.calls(),
            [Call::Combo(Combo {
                modifiers: Modifiers::CTRL,
                keys: vec![Key::Char('c')],
            })]
        );
    }

    #[test]
    fn test_dispatch_media() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recorder) = dispatcher(dir.path());

        assert_eq!(dispatcher.dispatch("ENC_A_DER"), Outcome::Performed);
        assert_eq!(recorder.calls(), [Call::Media(MediaKey::VolumeUp)]);
    }

    #[test]
    fn test_dispatch_write() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recorder) = dispatcher(dir.path());

        assert_eq!(dispatcher.dispatch("KEY_3"), Outcome::Performed);
        assert_eq!(recorder.calls(), [Call::Text("Hola Mundo".to_owned())]);
    }

    #[test]
    fn test_dispatch_open() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recorder) = dispatcher(dir.path());
        let target = dir.path().join("notes.txt");
        std::fs::write(&target, "").unwrap();

        bind(&dispatcher, "KEY_5", ActionType::Open, target.to_str().unwrap());
        assert_eq!(dispatcher.dispatch("KEY_5"), Outcome::Performed);

        let missing = dir.path().join("missing.txt");
        bind(&dispatcher, "KEY_6", ActionType::Open, missing.to_str().unwrap());
        assert_eq!(dispatcher.dispatch("KEY_6"), Outcome::MissingPath);

        assert_eq!(recorder.calls(), [Call::Open(target)]);
    }

    #[test]
    fn test_dispatch_unbound() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recorder) = dispatcher(dir.path());

        assert_eq!(dispatcher.dispatch("KEY_9"), Outcome::Unbound);
        for type_ in [ActionType::Hotkey, ActionType::Write, ActionType::Open] {
            bind(&dispatcher, "KEY_7", type_, "");
            assert_eq!(dispatcher.dispatch("KEY_7"), Outcome::Unbound);
        }
        assert!(recorder.calls().is_empty());
    }

    #[test]
    fn test_dispatch_locked() {
        let dir = tempfile::tempdir().unwrap();
        let (dispatcher, recorder) = dispatcher(dir.path());

        dispatcher.set_lock(true);
        assert_eq!(dispatcher.dispatch("ENC_A_DER"), Outcome::Locked);
        assert_eq!(dispatcher.dispatch("ENC_A_IZQ"), Outcome::Locked);
        assert_eq!(dispatcher.dispatch("KEY_3"), Outcome::Performed);
        assert_eq!(recorder.calls(), [Call::Text("Hola Mundo".to_owned())]);

        dispatcher.set_lock(false);
        assert_eq!(dispatcher.dispatch("ENC_A_DER"), Outcome::Performed);
    }

    #[test]
    fn test_dispatch_invalid_and_failed() {
        let dir = tempfile::tempdir().unwrap();
        let store = Arc::new(ProfileStore::load(dir.path().join("profiles.json")));
        let recorder = Recorder {
            fail: true,
            ..Default::default()
        };
        let dispatcher = Dispatcher::new(store, recorder.clone());

        bind(&dispatcher, "KEY_8", ActionType::Hotkey, "ctrl+nope");
        assert_eq!(dispatcher.dispatch("KEY_8"), Outcome::Invalid);
        assert_eq!(dispatcher.dispatch("KEY_2"), Outcome::Failed);
        assert_eq!(recorder.calls().len(), 1);
    }
}
