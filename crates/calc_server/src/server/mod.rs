//! Server orchestration: listener setup, admission and drain.

pub mod admission;
pub mod core;
pub mod listener;
pub mod stats;

pub use admission::AdmissionController;
pub use self::core::CalcServer;
pub use listener::bind_listener;
pub use stats::SessionStats;
