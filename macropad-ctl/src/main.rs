use clap::{Parser, Subcommand};
use macropad::{ActionType, Binding, Dispatcher, ProfileStore};
use macropad_serialport::{SerialPortType, Session};
use std::io::{self, BufRead};
use std::path::PathBuf;
use std::sync::Arc;

mod injector;

#[derive(Parser)]
#[command(version, about = "Bind and run a serial macro keypad")]
struct Args {
    #[arg(long, env = "MACROPAD_CONFIG", default_value = "profiles.json")]
    config: PathBuf,
    #[arg(long, default_value = macropad::DEFAULT_PROFILE)]
    profile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List serial ports
    Ports,
    /// List common hotkeys
    Presets,
    /// Print every binding of the profile
    Show,
    Get {
        key_id: String,
    },
    Set {
        key_id: String,
        #[arg(long = "type", default_value = "hotkey")]
        type_: ActionType,
        #[arg(long)]
        value: String,
        /// Defaults to the current color of the key
        #[arg(long)]
        color: Option<String>,
    },
    /// Connect and perform actions until stdin is closed.
    ///
    /// Reads `lock`, `unlock` and `quit` from stdin.
    Run {
        #[arg(long)]
        port: String,
        #[arg(long, default_value_t = macropad_serialport::DEFAULT_BAUD_RATE)]
        baud: u32,
        #[arg(long)]
        lock_encoders: bool,
    },
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();

    let args = Args::parse();

    match args.command {
        Command::Ports => {
            for port_info in macropad_serialport::available_ports()? {
                match port_info.port_type {
                    SerialPortType::UsbPort(usb) => println!(
                        "{}\tUSB {:04x}:{:04x} {}",
                        port_info.port_name,
                        usb.vid,
                        usb.pid,
                        usb.product.unwrap_or_default()
                    ),
                    _ => println!("{}", port_info.port_name),
                }
            }
        }
        Command::Presets => {
            for (name, value) in macropad::PRESETS {
                println!("{value:<16}{name}");
            }
        }
        Command::Show => {
            let store = ProfileStore::load(&args.config);
            let mut bindings = store
                .profiles()
                .remove(&args.profile)
                .unwrap_or_default();
            for key_id in macropad::KEY_LAYOUT {
                let binding = bindings.remove(key_id).unwrap_or_default();
                print_binding(key_id, &binding);
            }
            for (key_id, binding) in &bindings {
                print_binding(key_id, binding);
            }
        }
        Command::Get { key_id } => {
            let store = ProfileStore::load(&args.config);
            print_binding(&key_id, &store.get_binding(&args.profile, &key_id));
        }
        Command::Set {
            key_id,
            type_,
            value,
            color,
        } => {
            let store = ProfileStore::load(&args.config);
            let color =
                color.unwrap_or_else(|| store.get_binding(&args.profile, &key_id).color);
            store.update_binding(&args.profile, &key_id, type_, &value, &color)?;
            print_binding(&key_id, &store.get_binding(&args.profile, &key_id));
        }
        Command::Run {
            port,
            baud,
            lock_encoders,
        } => {
            let store = Arc::new(ProfileStore::load(&args.config).with_current(args.profile));
            let dispatcher = Arc::new(Dispatcher::new(store, injector::EnigoInjector));
            let mut session = Session::new(dispatcher);
            session.set_observer(|line| println!("> {}", macropad::display_name(line)));
            session.set_lock(lock_encoders);
            if !session.connect(&port, baud) {
                anyhow::bail!("could not connect to {port}");
            }

            for line in io::stdin().lock().lines() {
                match line?.trim() {
                    "lock" => session.set_lock(true),
                    "unlock" => session.set_lock(false),
                    "quit" | "exit" => break,
                    "" => {}
                    command => tracing::warn!("unknown command '{command}' (lock, unlock, quit)"),
                }
            }
            session.disconnect();
        }
    }

    Ok(())
}

fn print_binding(key_id: &str, binding: &Binding) {
    println!(
        "{key_id:<12}{:<8}{:<9}{}",
        binding.type_.as_str(),
        binding.color,
        binding.value
    );
}
