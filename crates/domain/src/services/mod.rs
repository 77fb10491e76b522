//! Domain services.

pub mod clock;
pub mod notification;

pub use clock::{Clock, FixedClock, SystemClock};
pub use notification::{CircleEvent, LogNotifier, Notifier};
