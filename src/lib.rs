//! Cancellable, composable Futures
//! ===============================
//!
//! Quick example:
//!
//! ```
//! # use composable_future::Future;
//! # use std::time::Duration;
//! # use std::thread;
//! // A time-consuming process, run on its own thread
//! let fut = Future::spawn(|| { thread::sleep(Duration::from_millis(100)); Ok(123) });
//!
//! // do something when the value is ready
//! let fut = fut.map(|v| v + 1);
//!
//! // Wait for the final result
//! assert_eq!(fut.wait().ok(), Some(124));
//! ```
//!
//! This crate provides three small building blocks:
//!
//! * `Future<T>` - a value which becomes available at most once, asynchronously, produced by an
//!   operation running on some `Scheduler` or by whoever holds its `Promise`;
//! * `Result<T>` - the outcome of a `Future`, a `std::result::Result` with this crate's `Error`,
//!   together with the `ResultExt` combinators for synchronous fallible code;
//! * `Either<L, R>` - a plain two-case union.
//!
//! A `Future` is either in progress, finished with a `Result`, or cancelled. It can be observed
//! with callbacks (`result`, `success`, `failure`), waited on with a timeout (`get`), or
//! transformed into new `Future`s (`map`, `flat_map`, `recover`, `recover_with`, `fallback`,
//! `dispatched`, `dispatched_after`). Several `Future`s can be combined into one with `flatten`.
//!
//! Cancellation
//! ------------
//!
//! `cancel` moves a `Future` straight to the cancelled state; its observers see
//! `Err(Error::Cancelled)`. A derived `Future` then passes the cancellation on to the `Future`(s)
//! it was derived from, but only to those which it is the sole observer of: a parent shared with
//! another consumer keeps running.
//!
//! ```
//! # use composable_future::{future_promise, Error};
//! let (fut, prom) = future_promise::<u32>();
//! let mapped = fut.map(|v| v * 2);
//!
//! mapped.cancel();
//! assert!(fut.is_cancelled());        // `mapped` was its only observer
//! assert!(prom.is_cancelled());
//! assert!(mapped.wait().unwrap_err().is_cancelled());
//! ```
//!
//! Cancellation is cooperative. It never blocks and never waits for the producing operation to
//! stop; operations can check `Promise::is_cancelled`, or register `Promise::on_cancel`.
//!
//! Threads
//! -------
//!
//! Observers run in whichever thread completes the `Future`, or immediately in the registering
//! thread if it is already complete. Use `dispatched` to move delivery onto a particular
//! `Scheduler`. No lock is held while observers or transforms run.

mod error;
mod either;
mod future;
mod inner;
mod join;
mod promise;
mod result;
mod scheduler;
mod timer;

pub use crate::either::Either;
pub use crate::error::{Error, Result};
pub use crate::future::Future;
pub use crate::join::{flatten, FlattenExt};
pub use crate::promise::{future_promise, Promise};
pub use crate::result::{catching, ResultExt};
pub use crate::scheduler::{Scheduler, ThreadScheduler};
