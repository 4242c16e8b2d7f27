// Logs key identifiers and would-be actions without touching the OS.
//
//     cargo run --example monitor -- /dev/ttyUSB0

use macropad::{Combo, Dispatcher, Injector, MediaKey, ProfileStore};
use std::convert::Infallible;
use std::io::{self, BufRead};
use std::path::Path;
use std::sync::Arc;

struct DryRun;

impl Injector for DryRun {
    type Error = Infallible;

    fn combo(&mut self, combo: &Combo) -> Result<(), Infallible> {
        tracing::info!(?combo, "combo");
        Ok(())
    }

    fn media(&mut self, key: MediaKey) -> Result<(), Infallible> {
        tracing::info!(?key, "media");
        Ok(())
    }

    fn text(&mut self, text: &str) -> Result<(), Infallible> {
        tracing::info!(text, "text");
        Ok(())
    }

    fn open(&mut self, path: &Path) -> Result<(), Infallible> {
        tracing::info!(path = %path.display(), "open");
        Ok(())
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "/dev/ttyUSB0".to_owned());

    for port_info in macropad_serialport::available_ports()? {
        dbg!(port_info);
    }

    let store = Arc::new(ProfileStore::load("profiles.json"));
    let dispatcher = Arc::new(Dispatcher::new(store, DryRun));
    let mut session = macropad_serialport::Session::new(dispatcher);
    session.set_observer(|line| println!("{}", macropad::display_name(line)));
    session.try_connect(&port, macropad_serialport::DEFAULT_BAUD_RATE)?;

    // Runs until stdin is closed.
    for line in io::stdin().lock().lines() {
        line?;
    }
    session.disconnect();

    Ok(())
}
