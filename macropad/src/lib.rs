use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::io;
use std::str::FromStr;

mod dispatch;
mod key_code;
pub mod protocol;
mod store;

pub use dispatch::{Dispatcher, Injector, Outcome};
pub use key_code::{Combo, Hotkey, Key, MediaKey, Modifiers};
pub use store::ProfileStore;

pub const DEFAULT_PROFILE: &str = "default";

/// Key identifiers starting with this prefix are rotary-encoder events.
pub const ENCODER_PREFIX: &str = "ENC_";

/// Physical layout of the keypad: a 4x3 key matrix followed by two encoders.
pub const KEY_LAYOUT: [&str; 18] = [
    "KEY_1", "KEY_2", "KEY_3", "KEY_4", //
    "KEY_5", "KEY_6", "KEY_7", "KEY_8", //
    "KEY_*", "KEY_9", "KEY_0", "KEY_#", //
    "ENC_A_IZQ", "ENC_A_DER", "BTN_A_PRESS", //
    "ENC_B_IZQ", "ENC_B_DER", "BTN_B_PRESS",
];

pub const PRESETS: [(&str, &str); 17] = [
    ("Copy", "ctrl+c"),
    ("Paste", "ctrl+v"),
    ("Cut", "ctrl+x"),
    ("Save", "ctrl+s"),
    ("Undo", "ctrl+z"),
    ("Select all", "ctrl+a"),
    ("Close window", "alt+f4"),
    ("Task manager", "ctrl+shift+esc"),
    ("Volume up", "volumeup"),
    ("Volume down", "volumedown"),
    ("Mute", "volumemute"),
    ("Play/Pause", "playpause"),
    ("Next track", "nexttrack"),
    ("Previous track", "prevtrack"),
    ("Windows key", "win"),
    ("Enter", "enter"),
    ("Screenshot", "win+shift+s"),
];

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error("unknown action type '{0}'")]
    UnknownActionType(String),
    #[error("unknown key '{0}'")]
    UnknownKey(String),
    #[error("empty key combination")]
    EmptyCombo,
    #[error("no 'default' profile")]
    MissingDefaultProfile,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Hotkey,
    Write,
    Open,
}

impl ActionType {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Hotkey => "hotkey",
            Self::Write => "write",
            Self::Open => "open",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hotkey" => Ok(Self::Hotkey),
            "write" => Ok(Self::Write),
            "open" => Ok(Self::Open),
            _ => Err(Error::UnknownActionType(s.to_owned())),
        }
    }
}

/// The action attached to one key identifier.
///
/// `value` is a key combination for [`ActionType::Hotkey`], literal text for
/// [`ActionType::Write`] and a filesystem path for [`ActionType::Open`].
/// `color` is a `#RRGGBB` display hint and never affects dispatch.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Binding {
    #[serde(rename = "type")]
    pub type_: ActionType,
    pub value: String,
    pub color: String,
}

impl Binding {
    pub fn new(type_: ActionType, value: impl Into<String>, color: impl Into<String>) -> Self {
        Self {
            type_,
            value: value.into(),
            color: color.into(),
        }
    }

    /// A binding with an empty value does nothing, whatever its type.
    pub fn is_noop(&self) -> bool {
        self.value.is_empty()
    }
}

impl Default for Binding {
    fn default() -> Self {
        Self::new(ActionType::Hotkey, "", "#333")
    }
}

pub type Profile = BTreeMap<String, Binding>;
pub type ProfileSet = BTreeMap<String, Profile>;

pub fn default_profile_set() -> ProfileSet {
    let profile = [
        ("KEY_1", Binding::new(ActionType::Hotkey, "ctrl+c", "#4CAF50")),
        ("KEY_2", Binding::new(ActionType::Hotkey, "ctrl+v", "#2196F3")),
        ("KEY_3", Binding::new(ActionType::Write, "Hola Mundo", "#FF9800")),
        ("ENC_A_DER", Binding::new(ActionType::Hotkey, "volumeup", "#E91E63")),
        ("ENC_A_IZQ", Binding::new(ActionType::Hotkey, "volumedown", "#E91E63")),
    ]
    .into_iter()
    .map(|(key_id, binding)| (key_id.to_owned(), binding))
    .collect();
    ProfileSet::from([(DEFAULT_PROFILE.to_owned(), profile)])
}

pub fn is_encoder(key_id: &str) -> bool {
    key_id.starts_with(ENCODER_PREFIX)
}

/// Human-readable form of a key identifier, e.g. `KEY_3` -> `KEY 3`,
/// `ENC_A_DER` -> `A DER`.
pub fn display_name(key_id: &str) -> String {
    key_id
        .strip_prefix(ENCODER_PREFIX)
        .unwrap_or(key_id)
        .replace('_', " ")
}
