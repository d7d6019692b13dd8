use std::fmt::{self, Debug, Formatter};

use log::debug;

use crate::error::{Error, Result};
use crate::future::Future;
use crate::inner::Link;

/// The write side of a `Future`.
///
/// A `Promise` completes its `Future` exactly once, either by one of the consuming methods
/// (`complete`, `set`, `fail`) or by being dropped, which fails the future with
/// `Error::Abandoned` so that nothing waits on it forever.
///
/// It is created in a pair with its `Future` by `future_promise()`, or handed to the starter
/// closure of `Future::with_completion_handler`.
pub struct Promise<T> where T: Clone + Send + 'static {
    future: Option<Future<T>>,
}

impl<T> Promise<T> where T: Clone + Send + 'static {
    fn new(future: Future<T>) -> Promise<T> {
        Promise { future: Some(future) }
    }

    /// Complete the `Future` with `res`.
    ///
    /// Has no effect if the `Future` was cancelled in the meantime.
    pub fn complete(mut self, res: Result<T>) {
        if let Some(fut) = self.future.take() {
            fut.complete(res);
        }
    }

    /// Complete the `Future` with a value.
    pub fn set(self, v: T) {
        self.complete(Ok(v))
    }

    /// Complete the `Future` with an error.
    pub fn fail(self, err: Error) {
        self.complete(Err(err))
    }

    /// Return true if the `Future` has been cancelled, and so any result would be discarded.
    ///
    /// ```
    /// # use composable_future::future_promise;
    /// # use std::thread;
    /// # struct State; impl State { fn new() -> State { State } fn perform_action(&mut self) -> Option<u32> { None } }
    /// let (fut, prom) = future_promise();
    ///
    /// thread::spawn(move || {
    ///     let mut s = State::new();
    ///     while !prom.is_cancelled() {
    ///         match s.perform_action() {
    ///             None => (),
    ///             Some(res) => { prom.set(res); break },
    ///         }
    ///     }
    /// });
    /// // ...
    /// fut.cancel();
    /// ```
    pub fn is_cancelled(&self) -> bool {
        self.future.as_ref().map_or(true, Future::is_cancelled)
    }

    /// Ask to be told when the `Future` is cancelled.
    ///
    /// `hook` runs at most once, in the thread which cancels the `Future`, and should only
    /// request that the underlying operation stop. It runs immediately if the `Future` is
    /// already cancelled, and never if the `Future` completes normally.
    pub fn on_cancel<F>(&self, hook: F)
        where F: FnOnce() + Send + 'static
    {
        if let Some(fut) = &self.future {
            fut.add_cancel_hook(hook)
        }
    }
}

impl<T> Drop for Promise<T> where T: Clone + Send + 'static {
    fn drop(&mut self) {
        if let Some(fut) = self.future.take() {
            if fut.complete(Err(Error::Abandoned)) {
                debug!("promise dropped without completing; future abandoned");
            }
        }
    }
}

impl<T> Debug for Promise<T> where T: Clone + Send + Debug + 'static {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match &self.future {
            Some(fut) => write!(f, "Promise({:?})", fut),
            None => write!(f, "Promise(completed)"),
        }
    }
}

/// Construct a `Future`/`Promise` pair.
///
/// The `Future` completes when the `Promise` does. Dropping the `Promise` without completing it
/// fails the `Future` with `Error::Abandoned`.
///
/// ```
/// # use composable_future::future_promise;
/// let (fut, prom) = future_promise();
/// prom.set(123);
/// assert_eq!(fut.wait().ok(), Some(123));
/// ```
pub fn future_promise<T>() -> (Future<T>, Promise<T>)
    where T: Clone + Send + 'static
{
    let fut = Future::with_link(Link::Root(Vec::new()));
    let prom = Promise::new(fut.clone());

    (fut, prom)
}
