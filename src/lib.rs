//! # Prometheus Timers
//!
//! Timer scheduling core for the Prometheus editor's event loop.
//!
//! Callers schedule one-shot or repeating actions to run at an absolute
//! wall-clock time, or once the user has been idle for a while. The host
//! event loop repeatedly asks the scheduler what is due and fires it; the
//! scheduler owns the ordering, the repeat arithmetic and the idle
//! bookkeeping.
//!
//! ## Key Features
//!
//! - **Two queues**: active timers ordered by absolute time, idle timers
//!   ordered by delay into the idle period
//! - **Re-entrant callbacks**: a callback gets `&mut Scheduler` and may arm
//!   or cancel anything, including itself
//! - **Drift correction**: a repeating timer that missed many intervals
//!   while the process was suspended fires once, not once per interval
//! - **Integral multiples**: repeats can be pinned to round times (every
//!   minute on the minute)
//! - **Error isolation**: a failing or panicking callback is logged and the
//!   remaining timers still run
//! - **Exact time**: picosecond resolution with normalized comparisons
//!
//! ## Example
//!
//! ```rust
//! use std::cell::Cell;
//! use std::rc::Rc;
//!
//! use prometheus_timers::core::{Callback, Scheduler};
//! use prometheus_timers::runtime::{EventLoop, ManualHost};
//! use prometheus_timers::util::{Duration, TimeSpec, TimeValue};
//!
//! let host = ManualHost::new(TimeValue::from_secs(1_000));
//! let mut scheduler = Scheduler::with_host(host.clone());
//!
//! let ticks = Rc::new(Cell::new(0));
//! let counter = Rc::clone(&ticks);
//! scheduler.schedule_at(
//!     "5 sec".parse::<TimeSpec>()?,
//!     Some(Duration::from_secs(5)),
//!     Callback::named("tick", move |_, _| {
//!         counter.set(counter.get() + 1);
//!         Ok(())
//!     }),
//!     vec![],
//! )?;
//!
//! let mut event_loop = EventLoop::new();
//! host.advance(Duration::from_secs(5));
//! assert_eq!(event_loop.drain(&mut scheduler).fired, 1);
//! assert_eq!(ticks.get(), 1);
//! # Ok::<(), prometheus_timers::core::TimerError>(())
//! ```
//!
//! For complete scenarios, see:
//! - `tests/scheduler_test.rs` - arming, repeats, drift and re-entrancy
//! - `tests/idle_timer_test.rs` - idle timers through the event loop

#![deny(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

/// Timer records, the scheduler and its error types.
pub mod core;
/// Configuration models for the scheduler.
pub mod config;
/// Builders to construct schedulers from configuration.
pub mod builders;
/// Timer queue storage.
pub mod infra;
/// Host adapters, the drain loop and the async driver.
pub mod runtime;
/// Time arithmetic, time specifications and telemetry.
pub mod util;
