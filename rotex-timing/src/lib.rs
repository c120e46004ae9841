pub mod queue;
pub mod timer;
pub mod timer_set;

pub use queue::{EventQueue, TimerId};
pub use timer::{Clock, HighPrecisionClock, VirtualClock};
pub use timer_set::TimerSet;
