use crate::constants::DEFAULT_CLEANUP_INTERVAL_SECS;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

/// Granularity at which a sleeping scheduler notices `stop()`.
const STOP_POLL: Duration = Duration::from_millis(50);

pub struct SchedulerConfig {
    pub interval_secs: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            interval_secs: DEFAULT_CLEANUP_INTERVAL_SECS,
        }
    }
}

/// Fires a cleanup trigger once at start and then on a fixed interval.
pub struct CleanupScheduler {
    config: SchedulerConfig,
    running: Arc<AtomicBool>,
}

impl CleanupScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            running: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn start<F>(&self, trigger: F) -> thread::JoinHandle<()>
    where
        F: Fn() + Send + 'static,
    {
        self.running.store(true, Ordering::SeqCst);

        let running = Arc::clone(&self.running);
        let interval = Duration::from_secs(self.config.interval_secs.max(1));

        thread::spawn(move || {
            while running.load(Ordering::SeqCst) {
                trigger();

                let next = Instant::now() + interval;
                while running.load(Ordering::SeqCst) && Instant::now() < next {
                    thread::sleep(STOP_POLL.min(next.saturating_duration_since(Instant::now())));
                }
            }
        })
    }

    pub fn stop(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }
}
