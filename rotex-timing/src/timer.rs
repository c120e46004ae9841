use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Millisecond clock driving the experiment's schedule.
pub trait Clock: Clone + Send + Sync {
    /// Milliseconds since the clock's origin.
    fn now(&self) -> u64;

    fn elapsed(&self, since: u64) -> Duration {
        Duration::from_millis(self.now().saturating_sub(since))
    }

    fn sleep(&self, d: Duration);
}

/// Monotonic wall clock with platform-specific sleeping.
#[derive(Debug, Clone)]
pub struct HighPrecisionClock {
    start: Instant,
}

impl Clock for HighPrecisionClock {
    fn now(&self) -> u64 {
        self.start.elapsed().as_millis() as u64
    }

    fn sleep(&self, d: Duration) {
        self.high_precision_sleep(d)
    }
}

impl HighPrecisionClock {
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
        }
    }

    /// Sleeps for `duration`. With `high_precision_timer` enabled the last
    /// millisecond is spun instead of slept.
    pub fn high_precision_sleep(&self, duration: Duration) {
        #[cfg(feature = "high_precision_timer")]
        {
            const SPIN: Duration = Duration::from_millis(1);
            let deadline = Instant::now() + duration;
            if duration > SPIN {
                self.os_sleep(duration - SPIN);
            }
            while Instant::now() < deadline {
                std::hint::spin_loop();
            }
        }
        #[cfg(not(feature = "high_precision_timer"))]
        self.os_sleep(duration);
    }

    #[cfg(target_os = "linux")]
    fn os_sleep(&self, duration: Duration) {
        use libc::{CLOCK_MONOTONIC, clock_nanosleep, timespec};

        let req = timespec {
            tv_sec: duration.as_secs() as libc::time_t,
            tv_nsec: duration.subsec_nanos() as libc::c_long,
        };

        // SAFETY: `req` is a valid timespec and the remainder pointer may be null.
        unsafe {
            clock_nanosleep(CLOCK_MONOTONIC, 0, &req, std::ptr::null_mut());
        }
    }

    #[cfg(not(target_os = "linux"))]
    fn os_sleep(&self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

impl Default for HighPrecisionClock {
    fn default() -> Self {
        Self::new()
    }
}

/// Clock that only moves when told to. Clones share the same time.
#[derive(Debug, Clone, Default)]
pub struct VirtualClock {
    now: Arc<AtomicU64>,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(ms: u64) -> Self {
        Self {
            now: Arc::new(AtomicU64::new(ms)),
        }
    }

    pub fn advance(&self, ms: u64) {
        self.now.fetch_add(ms, Ordering::SeqCst);
    }

    /// Moves the clock to `ms`. Time never goes backwards; earlier values
    /// are ignored.
    pub fn set(&self, ms: u64) {
        self.now.fetch_max(ms, Ordering::SeqCst);
    }
}

impl Clock for VirtualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }

    fn sleep(&self, d: Duration) {
        self.advance(d.as_millis() as u64);
    }
}
