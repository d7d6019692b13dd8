//! Combinators for synchronous `Result`s.
//!
//! `std::result::Result` already provides `map`, `and_then` and `ok`. `ResultExt` adds the
//! remaining combinators used by `Future`: recovery, folding both branches, and "catching"
//! variants which turn a panic in the supplied function into an `Err` rather than letting it
//! unwind into the caller.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use log::warn;

use crate::error::Error;

/// Evaluate a fallible computation, folding a panic into `Err`.
///
/// The panic message is kept in `Error::Panicked` and converted into `E`.
///
/// ```
/// # use composable_future::{catching, Error};
/// let r: Result<u32, Error> = catching(|| panic!("boom"));
/// match r {
///     Err(Error::Panicked(msg)) => assert_eq!(msg, "boom"),
///     _ => panic!("expected a panic"),
/// }
/// ```
pub fn catching<T, E, F>(func: F) -> Result<T, E>
    where F: FnOnce() -> Result<T, E>,
          E: From<Error>
{
    match panic::catch_unwind(AssertUnwindSafe(func)) {
        Ok(res) => res,
        Err(payload) => {
            let msg = panic_message(payload);
            warn!("caught panic: {}", msg);
            Err(E::from(Error::Panicked(msg)))
        },
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    match payload.downcast::<String>() {
        Ok(s) => *s,
        Err(payload) => match payload.downcast::<&'static str>() {
            Ok(s) => String::from(*s),
            Err(_) => String::from("non-string panic payload"),
        },
    }
}

/// Extra combinators for `Result`.
pub trait ResultExt<T, E>: Sized {
    /// Apply `func` to a success value, catching a panic as a failure.
    fn map_catching<U, F>(self, func: F) -> Result<U, E>
        where F: FnOnce(T) -> U, E: From<Error>;

    /// Chain a fallible computation on the success value, catching a panic as a failure.
    /// A failure short-circuits with the original error.
    fn and_then_catching<U, F>(self, func: F) -> Result<U, E>
        where F: FnOnce(T) -> Result<U, E>, E: From<Error>;

    /// Replace a failure with the value computed from its error.
    fn recover<F>(self, func: F) -> Result<T, E>
        where F: FnOnce(E) -> T;

    /// As `recover`, but `func` may itself fail or panic.
    fn recover_catching<F>(self, func: F) -> Result<T, E>
        where F: FnOnce(E) -> Result<T, E>, E: From<Error>;

    /// Reduce both branches to a common type.
    fn fold<U, S, F>(self, success: S, failure: F) -> U
        where S: FnOnce(T) -> U, F: FnOnce(E) -> U;

    /// As `fold`, but a panic in either reducer becomes a failure.
    fn fold_catching<U, S, F>(self, success: S, failure: F) -> Result<U, E>
        where S: FnOnce(T) -> U, F: FnOnce(E) -> U, E: From<Error>;

    /// Map both branches to a new `Result`.
    fn transform<U, E2, S, F>(self, success: S, failure: F) -> Result<U, E2>
        where S: FnOnce(T) -> Result<U, E2>, F: FnOnce(E) -> Result<U, E2>;
}

impl<T, E> ResultExt<T, E> for Result<T, E> {
    fn map_catching<U, F>(self, func: F) -> Result<U, E>
        where F: FnOnce(T) -> U, E: From<Error>
    {
        self.and_then_catching(move |v| Ok(func(v)))
    }

    fn and_then_catching<U, F>(self, func: F) -> Result<U, E>
        where F: FnOnce(T) -> Result<U, E>, E: From<Error>
    {
        match self {
            Ok(v) => catching(move || func(v)),
            Err(e) => Err(e),
        }
    }

    fn recover<F>(self, func: F) -> Result<T, E>
        where F: FnOnce(E) -> T
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => Ok(func(e)),
        }
    }

    fn recover_catching<F>(self, func: F) -> Result<T, E>
        where F: FnOnce(E) -> Result<T, E>, E: From<Error>
    {
        match self {
            Ok(v) => Ok(v),
            Err(e) => catching(move || func(e)),
        }
    }

    fn fold<U, S, F>(self, success: S, failure: F) -> U
        where S: FnOnce(T) -> U, F: FnOnce(E) -> U
    {
        match self {
            Ok(v) => success(v),
            Err(e) => failure(e),
        }
    }

    fn fold_catching<U, S, F>(self, success: S, failure: F) -> Result<U, E>
        where S: FnOnce(T) -> U, F: FnOnce(E) -> U, E: From<Error>
    {
        catching(move || Ok(self.fold(success, failure)))
    }

    fn transform<U, E2, S, F>(self, success: S, failure: F) -> Result<U, E2>
        where S: FnOnce(T) -> Result<U, E2>, F: FnOnce(E) -> Result<U, E2>
    {
        match self {
            Ok(v) => success(v),
            Err(e) => failure(e),
        }
    }
}
