use enigo::{Direction, Enigo, Keyboard, Settings};
use macropad::{Combo, Injector, Key, MediaKey, Modifiers};
use std::io;
use std::path::Path;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Connection(#[from] enigo::NewConError),
    #[error(transparent)]
    Input(#[from] enigo::InputError),
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error("unsupported key {0:?}")]
    UnsupportedKey(Key),
}

/// Injects input through the OS with `enigo` and launches files with `open`.
///
/// `Enigo` is not `Send` on every platform, so a connection is made per action.
#[derive(Clone, Copy, Debug, Default)]
pub struct EnigoInjector;

impl EnigoInjector {
    fn connect() -> Result<Enigo, Error> {
        Ok(Enigo::new(&Settings::default())?)
    }
}

impl Injector for EnigoInjector {
    type Error = Error;

    fn combo(&mut self, combo: &Combo) -> Result<(), Error> {
        let mut enigo = Self::connect()?;

        let mut pressed = Vec::new();
        let mut result: Result<(), Error> = Ok(());
        for modifier in modifier_keys(combo.modifiers) {
            if let Err(e) = enigo.key(modifier, Direction::Press) {
                result = Err(e.into());
                break;
            }
            pressed.push(modifier);
        }
        if result.is_ok() {
            result = combo.keys.iter().try_for_each(|&key| -> Result<(), Error> {
                enigo.key(enigo_key(key)?, Direction::Click)?;
                Ok(())
            });
        }
        for modifier in pressed.into_iter().rev() {
            enigo.key(modifier, Direction::Release)?;
        }
        result
    }

    fn media(&mut self, key: MediaKey) -> Result<(), Error> {
        let key = match key {
            MediaKey::VolumeUp => enigo::Key::VolumeUp,
            MediaKey::VolumeDown => enigo::Key::VolumeDown,
            MediaKey::VolumeMute => enigo::Key::VolumeMute,
            MediaKey::PlayPause => enigo::Key::MediaPlayPause,
            MediaKey::NextTrack => enigo::Key::MediaNextTrack,
            MediaKey::PrevTrack => enigo::Key::MediaPrevTrack,
        };
        Self::connect()?.key(key, Direction::Click)?;
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Error> {
        Self::connect()?.text(text)?;
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<(), Error> {
        open::that(path)?;
        Ok(())
    }
}

fn modifier_keys(modifiers: Modifiers) -> Vec<enigo::Key> {
    [
        (Modifiers::CTRL, enigo::Key::Control),
        (Modifiers::SHIFT, enigo::Key::Shift),
        (Modifiers::ALT, enigo::Key::Alt),
        (Modifiers::META, enigo::Key::Meta),
    ]
    .into_iter()
    .filter(|&(modifier, _)| modifiers.contains(modifier))
    .map(|(_, key)| key)
    .collect()
}

fn enigo_key(key: Key) -> Result<enigo::Key, Error> {
    let key = match key {
        Key::Return => enigo::Key::Return,
        Key::Escape => enigo::Key::Escape,
        Key::Tab => enigo::Key::Tab,
        Key::Space => enigo::Key::Space,
        Key::Backspace => enigo::Key::Backspace,
        Key::Delete => enigo::Key::Delete,
        Key::Home => enigo::Key::Home,
        Key::End => enigo::Key::End,
        Key::PageUp => enigo::Key::PageUp,
        Key::PageDown => enigo::Key::PageDown,
        Key::Up => enigo::Key::UpArrow,
        Key::Down => enigo::Key::DownArrow,
        Key::Left => enigo::Key::LeftArrow,
        Key::Right => enigo::Key::RightArrow,
        Key::CapsLock => enigo::Key::CapsLock,
        Key::F(n) => match n {
            1 => enigo::Key::F1,
            2 => enigo::Key::F2,
            3 => enigo::Key::F3,
            4 => enigo::Key::F4,
            5 => enigo::Key::F5,
            6 => enigo::Key::F6,
            7 => enigo::Key::F7,
            8 => enigo::Key::F8,
            9 => enigo::Key::F9,
            10 => enigo::Key::F10,
            11 => enigo::Key::F11,
            12 => enigo::Key::F12,
            13 => enigo::Key::F13,
            14 => enigo::Key::F14,
            15 => enigo::Key::F15,
            16 => enigo::Key::F16,
            17 => enigo::Key::F17,
            18 => enigo::Key::F18,
            19 => enigo::Key::F19,
            20 => enigo::Key::F20,
            _ => return Err(Error::UnsupportedKey(key)),
        },
        Key::Char(c) => enigo::Key::Unicode(c),
    };
    Ok(key)
}
