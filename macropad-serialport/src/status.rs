use chrono::Timelike;
use macropad::protocol::Status;

/// Source of the periodic host status sent to the device.
pub trait StatusSource: Send + Sync {
    fn sample(&self) -> Status;
}

impl<F> StatusSource for F
where
    F: Fn() -> Status + Send + Sync,
{
    fn sample(&self) -> Status {
        self()
    }
}

/// Local wall clock and system memory utilization.
#[derive(Clone, Copy, Debug, Default)]
pub struct SystemStatus;

impl StatusSource for SystemStatus {
    fn sample(&self) -> Status {
        let now = chrono::Local::now();
        let mut system = sysinfo::System::new();
        system.refresh_memory();
        Status {
            hour: now.hour(),
            minute: now.minute(),
            memory_percent: percent(system.used_memory(), system.total_memory()),
        }
    }
}

fn percent(used: u64, total: u64) -> f32 {
    if total == 0 {
        0.0
    } else {
        (used as f64 / total as f64 * 100.0) as f32
    }
}
