// Hotkey grammar: '+'-separated, case-insensitive tokens such as "ctrl+shift+esc".

use crate::Error;
use std::fmt;

bitflags::bitflags! {
    #[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
    pub struct Modifiers: u8 {
        const CTRL = 1 << 0;
        const SHIFT = 1 << 1;
        const ALT = 1 << 2;
        const META = 1 << 3;
    }
}

impl Modifiers {
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "ctrl" | "control" => Some(Self::CTRL),
            "shift" => Some(Self::SHIFT),
            "alt" => Some(Self::ALT),
            "win" | "windows" | "super" | "meta" | "cmd" | "command" => Some(Self::META),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
pub enum Key {
    Return,
    Escape,
    Tab,
    Space,
    Backspace,
    Delete,
    Home,
    End,
    PageUp,
    PageDown,
    Up,
    Down,
    Left,
    Right,
    CapsLock,
    F(u8),
    Char(char),
}

impl fmt::Debug for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_tuple("Key");
        match self {
            Self::F(n) => d.field(&format_args!("F{n}")),
            Self::Char(c) => d.field(&format_args!("{}", c.escape_debug())),
            _ => d.field(&format_args!("{}", self.name())),
        };
        d.finish()
    }
}

impl Key {
    const fn name(self) -> &'static str {
        match self {
            Self::Return => "Return",
            Self::Escape => "Escape",
            Self::Tab => "Tab",
            Self::Space => "Space",
            Self::Backspace => "Backspace",
            Self::Delete => "Delete",
            Self::Home => "Home",
            Self::End => "End",
            Self::PageUp => "PageUp",
            Self::PageDown => "PageDown",
            Self::Up => "Up",
            Self::Down => "Down",
            Self::Left => "Left",
            Self::Right => "Right",
            Self::CapsLock => "CapsLock",
            Self::F(_) | Self::Char(_) => "",
        }
    }

    pub fn from_token(token: &str) -> Option<Self> {
        let key = match token {
            "enter" | "return" => Self::Return,
            "esc" | "escape" => Self::Escape,
            "tab" => Self::Tab,
            "space" => Self::Space,
            "plus" => Self::Char('+'),
            "backspace" => Self::Backspace,
            "delete" | "del" => Self::Delete,
            "home" => Self::Home,
            "end" => Self::End,
            "pageup" | "page up" => Self::PageUp,
            "pagedown" | "page down" => Self::PageDown,
            "up" => Self::Up,
            "down" => Self::Down,
            "left" => Self::Left,
            "right" => Self::Right,
            "capslock" | "caps lock" => Self::CapsLock,
            _ => {
                let mut chars = token.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Self::Char(c),
                    (Some('f'), Some(_)) => match token[1..].parse() {
                        Ok(n @ 1..=20) => Self::F(n),
                        _ => return None,
                    },
                    _ => return None,
                }
            }
        };
        Some(key)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKey {
    VolumeUp,
    VolumeDown,
    VolumeMute,
    PlayPause,
    NextTrack,
    PrevTrack,
}

impl MediaKey {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "volumeup" => Some(Self::VolumeUp),
            "volumedown" => Some(Self::VolumeDown),
            "volumemute" => Some(Self::VolumeMute),
            "playpause" => Some(Self::PlayPause),
            "nexttrack" => Some(Self::NextTrack),
            "prevtrack" => Some(Self::PrevTrack),
            _ => None,
        }
    }
}

/// Modifiers held down while `keys` are tapped in order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Combo {
    pub modifiers: Modifiers,
    pub keys: Vec<Key>,
}

impl Combo {
    pub fn parse(value: &str) -> Result<Self, Error> {
        let mut combo = Self::default();
        for token in value.split('+') {
            let token = token.trim().to_lowercase();
            if token.is_empty() {
                return Err(Error::EmptyCombo);
            }
            if let Some(modifier) = Modifiers::from_token(&token) {
                combo.modifiers |= modifier;
            } else if let Some(key) = Key::from_token(&token) {
                combo.keys.push(key);
            } else {
                return Err(Error::UnknownKey(token));
            }
        }
        Ok(combo)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Hotkey {
    Media(MediaKey),
    Combo(Combo),
}

impl Hotkey {
    /// Media-key names are matched exactly; anything else is a combination.
    pub fn parse(value: &str) -> Result<Self, Error> {
        match MediaKey::from_name(value) {
            Some(key) => Ok(Self::Media(key)),
            None => Combo::parse(value).map(Self::Combo),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{Combo, Hotkey, Key, MediaKey, Modifiers};

    #[test]
    fn test_parse_combo() {
        assert_eq!(
            Combo::parse("ctrl+c").unwrap(),
            Combo {
                modifiers: Modifiers::CTRL,
                keys: vec![Key::Char('c')],
            }
        );
        assert_eq!(
            Combo::parse("Ctrl + Shift + Esc").unwrap(),
            Combo {
                modifiers: Modifiers::CTRL | Modifiers::SHIFT,
                keys: vec![Key::Escape],
            }
        );
        assert_eq!(
            Combo::parse("alt+f4").unwrap(),
            Combo {
                modifiers: Modifiers::ALT,
                keys: vec![Key::F(4)],
            }
        );
        assert_eq!(
            Combo::parse("win").unwrap(),
            Combo {
                modifiers: Modifiers::META,
                keys: vec![],
            }
        );
        assert_eq!(Combo::parse("enter").unwrap().keys, [Key::Return]);
        assert_eq!(
            Combo::parse("ctrl+plus").unwrap(),
            Combo {
                modifiers: Modifiers::CTRL,
                keys: vec![Key::Char('+')],
            }
        );
    }

    #[test]
    fn test_parse_combo_errors() {
        assert!(matches!(Combo::parse(""), Err(crate::Error::EmptyCombo)));
        assert!(matches!(Combo::parse("ctrl+"), Err(crate::Error::EmptyCombo)));
        assert!(matches!(
            Combo::parse("ctrl+banana"),
            Err(crate::Error::UnknownKey(token)) if token == "banana"
        ));
        assert!(matches!(Combo::parse("f25"), Err(crate::Error::UnknownKey(_))));
    }

    #[test]
    fn test_parse_hotkey() {
        assert_eq!(
            Hotkey::parse("volumeup").unwrap(),
            Hotkey::Media(MediaKey::VolumeUp)
        );
        assert_eq!(
            Hotkey::parse("prevtrack").unwrap(),
            Hotkey::Media(MediaKey::PrevTrack)
        );
        assert!(matches!(Hotkey::parse("ctrl+c").unwrap(), Hotkey::Combo(_)));
    }

    #[test]
    fn test_key_debug() {
        assert_eq!(format!("{:?}", Key::F(12)), "Key(F12)");
        assert_eq!(format!("{:?}", Key::Char('a')), "Key(a)");
        assert_eq!(format!("{:?}", Key::PageUp), "Key(PageUp)");
    }
}
