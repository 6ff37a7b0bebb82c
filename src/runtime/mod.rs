//! Host adapters and drivers that run a scheduler.

pub mod event_loop;
pub mod host;
#[cfg(feature = "tokio-runtime")]
pub mod tokio_driver;

pub use event_loop::{DrainReport, EventLoop};
pub use host::{IdleMonitor, ManualHost, SystemHost};
#[cfg(feature = "tokio-runtime")]
pub use tokio_driver::TokioDriver;
