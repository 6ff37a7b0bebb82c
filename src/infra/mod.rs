//! Infrastructure adapters for timer storage.

pub mod queue;
pub use queue::TimerQueue;
