use macropad::protocol::LineBuffer;
use macropad::{Dispatcher, Injector};
use std::io::{self, Read, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock};
use std::thread::{self, JoinHandle};
use std::time::Duration;

mod status;

pub use serialport::{SerialPortInfo, SerialPortType};
pub use status::{StatusSource, SystemStatus};

pub const DEFAULT_BAUD_RATE: u32 = 9_600;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] io::Error),
    #[error(transparent)]
    SerialPort(#[from] serialport::Error),

    #[error("already connected")]
    AlreadyConnected,
}

pub fn available_ports() -> Result<Vec<SerialPortInfo>, Error> {
    Ok(serialport::available_ports()?)
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum State {
    Disconnected,
    Connecting,
    Connected,
}

#[derive(Clone, Debug)]
pub struct SessionConfig {
    /// Port read timeout, and the pause after an empty read.
    pub poll_interval: Duration,
    pub heartbeat_interval: Duration,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(10),
            heartbeat_interval: Duration::from_secs(2),
        }
    }
}

/// Called with every line received from the device, after it is dispatched.
pub type Observer = Arc<dyn Fn(&str) + Send + Sync>;

struct Worker {
    running: Arc<AtomicBool>,
    stop: Sender<()>,
    io: JoinHandle<()>,
    heartbeat: JoinHandle<()>,
}

/// A serial connection to the keypad.
///
/// While connected, one thread owns the port: it reads key identifiers,
/// dispatches them and writes heartbeat lines produced by a second thread.
pub struct Session<I> {
    dispatcher: Arc<Dispatcher<I>>,
    config: SessionConfig,
    status: Arc<dyn StatusSource>,
    observer: Arc<RwLock<Option<Observer>>>,
    state: State,
    worker: Option<Worker>,
}

impl<I> Session<I> {
    pub fn state(&self) -> State {
        self.state
    }

    /// Replaces the observer. Takes effect from the next received line, also
    /// while connected.
    pub fn set_observer<F>(&self, observer: F)
    where
        F: Fn(&str) + Send + Sync + 'static,
    {
        let mut slot = self.observer.write().unwrap_or_else(PoisonError::into_inner);
        *slot = Some(Arc::new(observer));
    }

    /// Stops both threads, waits for them and closes the port. Does nothing
    /// when already disconnected.
    pub fn disconnect(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.running.store(false, Ordering::Release);
            let _ = worker.stop.send(());
            if worker.io.join().is_err() {
                tracing::error!("io thread panicked");
            }
            if worker.heartbeat.join().is_err() {
                tracing::error!("heartbeat thread panicked");
            }
            tracing::info!("disconnected");
        }
        self.state = State::Disconnected;
    }
}

impl<I> Session<I>
where
    I: Injector + Send + 'static,
{
    pub fn new(dispatcher: Arc<Dispatcher<I>>) -> Self {
        Self {
            dispatcher,
            config: SessionConfig::default(),
            status: Arc::new(SystemStatus),
            observer: Arc::default(),
            state: State::Disconnected,
            worker: None,
        }
    }

    pub fn with_config(mut self, config: SessionConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_status<S>(mut self, status: S) -> Self
    where
        S: StatusSource + 'static,
    {
        self.status = Arc::new(status);
        self
    }

    pub fn set_lock(&self, locked: bool) {
        self.dispatcher.set_lock(locked);
    }

    /// Opens `port` and starts the session. Failures are logged and reported
    /// as `false`.
    pub fn connect(&mut self, port: &str, baud_rate: u32) -> bool {
        match self.try_connect(port, baud_rate) {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(port, "connection failed: {e}");
                false
            }
        }
    }

    #[tracing::instrument(err, skip(self))]
    pub fn try_connect(&mut self, port: &str, baud_rate: u32) -> Result<(), Error> {
        if self.worker.is_some() {
            return Err(Error::AlreadyConnected);
        }
        self.state = State::Connecting;
        let port = match serialport::new(port, baud_rate)
            .timeout(self.config.poll_interval)
            .open()
        {
            Ok(port) => port,
            Err(e) => {
                self.state = State::Disconnected;
                return Err(e.into());
            }
        };
        self.start(port)?;
        tracing::info!("connected");
        Ok(())
    }

    /// Starts the session over an already opened transport. Reads on `port`
    /// should time out after [`SessionConfig::poll_interval`].
    pub fn start<P>(&mut self, port: P) -> Result<(), Error>
    where
        P: Read + Write + Send + 'static,
    {
        if self.worker.is_some() {
            return Err(Error::AlreadyConnected);
        }

        let running = Arc::new(AtomicBool::new(true));
        let (stop_tx, stop_rx) = mpsc::channel();
        let (line_tx, line_rx) = mpsc::channel();

        let heartbeat = thread::Builder::new()
            .name("macropad-heartbeat".into())
            .spawn({
                let status = Arc::clone(&self.status);
                let interval = self.config.heartbeat_interval;
                move || heartbeat_loop(&*status, interval, &stop_rx, &line_tx)
            });
        let heartbeat = match heartbeat {
            Ok(heartbeat) => heartbeat,
            Err(e) => {
                self.state = State::Disconnected;
                return Err(e.into());
            }
        };

        let io = thread::Builder::new().name("macropad-io".into()).spawn({
            let dispatcher = Arc::clone(&self.dispatcher);
            let observer = Arc::clone(&self.observer);
            let running = Arc::clone(&running);
            let poll_interval = self.config.poll_interval;
            move || {
                io_loop(
                    port,
                    &dispatcher,
                    &observer,
                    &line_rx,
                    &running,
                    poll_interval,
                )
            }
        });
        let io = match io {
            Ok(io) => io,
            Err(e) => {
                let _ = stop_tx.send(());
                let _ = heartbeat.join();
                self.state = State::Disconnected;
                return Err(e.into());
            }
        };

        self.worker = Some(Worker {
            running,
            stop: stop_tx,
            io,
            heartbeat,
        });
        self.state = State::Connected;
        Ok(())
    }
}

impl<I> Drop for Session<I> {
    fn drop(&mut self) {
        self.disconnect();
    }
}

fn io_loop<P, I>(
    mut port: P,
    dispatcher: &Dispatcher<I>,
    observer: &RwLock<Option<Observer>>,
    outbound: &Receiver<String>,
    running: &AtomicBool,
    poll_interval: Duration,
) where
    P: Read + Write,
    I: Injector,
{
    let mut lines = LineBuffer::default();
    let mut buf = [0; 64];
    while running.load(Ordering::Acquire) {
        // A failed write drops that line only; `send` logs the error.
        for line in outbound.try_iter() {
            let _ = send(&mut port, &line);
        }
        match port.read(&mut buf) {
            Ok(0) => thread::sleep(poll_interval),
            Ok(n) => {
                lines.extend(&buf[..n]);
                while let Some(line) = lines.next_line() {
                    tracing::debug!(%line, "received");
                    dispatcher.dispatch(&line);
                    let observer = observer.read().unwrap_or_else(PoisonError::into_inner).clone();
                    if let Some(observer) = observer {
                        observer(&line);
                    }
                }
            }
            Err(e)
                if matches!(
                    e.kind(),
                    io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock | io::ErrorKind::Interrupted
                ) => {}
            Err(e) => {
                tracing::error!("read failed: {e}");
                thread::sleep(poll_interval);
            }
        }
    }
}

fn heartbeat_loop(
    status: &dyn StatusSource,
    interval: Duration,
    stop: &Receiver<()>,
    outbound: &Sender<String>,
) {
    loop {
        if outbound.send(status.sample().encode()).is_err() {
            break;
        }
        match stop.recv_timeout(interval) {
            Err(RecvTimeoutError::Timeout) => {}
            Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
}

#[tracing::instrument(err, skip(port))]
fn send<W>(port: &mut W, line: &str) -> io::Result<()>
where
    W: Write,
{
    port.write_all(line.as_bytes())?;
    port.flush()
}
