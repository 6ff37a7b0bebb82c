//! Time arithmetic, time specifications and telemetry helpers.

pub mod telemetry;
pub mod time;
pub mod timespec;

pub use telemetry::{init_tracing, init_tracing_with_filter};
pub use self::time::{Duration, TimeValue, PICOS_PER_SEC};
pub use timespec::{parse_duration, TimeSpec};
