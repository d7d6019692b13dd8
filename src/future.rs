use std::fmt::{self, Debug, Formatter};
use std::sync::Arc;
use std::time::Duration;

use log::debug;

use crate::error::{Error, Result};
use crate::inner::{cancel_if_sole, Inner, Link, Parent, Upstream};
use crate::promise::{future_promise, Promise};
use crate::result::{catching, ResultExt};
use crate::scheduler::{Scheduler, ThreadScheduler};

/// A value which becomes available at most once, asynchronously.
///
/// A `Future` is a handle to shared state; clones refer to the same future, and cancelling
/// through one handle cancels it for all of them. Use `copy` to get a handle with its own
/// cancellation scope.
///
/// A `Future` starts in progress and makes exactly one transition, either to finished (with a
/// `Result`) or to cancelled. Observers registered with `result`, `success` or `failure` run
/// once that happens, in the thread which completed the future; if it has already happened they
/// run immediately in the calling thread. A cancelled future reports `Err(Error::Cancelled)`.
///
/// Futures derived with the combinators (`map`, `flat_map`, `recover`, `dispatched`, ...) observe
/// their parent. Cancelling a derived future also cancels its parent, but only if the derived
/// future is the parent's only observer.
pub struct Future<T> {
    inner: Arc<Inner<T>>,
}

impl<T> Clone for Future<T> {
    fn clone(&self) -> Future<T> {
        Future { inner: self.inner.clone() }
    }
}

impl<T> Future<T> where T: Clone + Send + 'static {
    pub(crate) fn with_link(link: Link) -> Future<T> {
        Future { inner: Arc::new(Inner::new(link)) }
    }

    pub(crate) fn complete(&self, res: Result<T>) -> bool {
        self.inner.complete(res)
    }

    pub(crate) fn upstream(&self) -> Parent {
        Box::new(self.clone())
    }

    pub(crate) fn add_cancel_hook<F>(&self, hook: F)
        where F: FnOnce() + Send + 'static
    {
        if let Some(hook) = self.inner.add_cancel_hook(Box::new(hook)) {
            if self.is_cancelled() {
                hook()
            }
        }
    }

    /// Construct an already finished `Future`.
    pub fn from_result(res: Result<T>) -> Future<T> {
        Future { inner: Arc::new(Inner::finished(res)) }
    }

    /// Construct a `Future` which has already succeeded with `v`.
    ///
    /// ```
    /// # use composable_future::Future;
    /// let fut = Future::successful(123);
    /// assert_eq!(fut.wait().ok(), Some(123));
    /// ```
    pub fn successful(v: T) -> Future<T> {
        Future::from_result(Ok(v))
    }

    /// Construct a `Future` which has already failed with `err`.
    pub fn failed(err: Error) -> Future<T> {
        Future::from_result(Err(err))
    }

    /// Bridge a callback-style API.
    ///
    /// `starter` is called immediately with the `Promise` for the returned `Future`; whatever
    /// callback the API takes should complete the promise.
    ///
    /// ```
    /// # use composable_future::Future;
    /// # use std::thread;
    /// fn fetch(cb: impl FnOnce(Result<String, std::io::Error>) + Send + 'static) {
    ///     thread::spawn(move || cb(Ok("data".to_string())));
    /// }
    ///
    /// let fut = Future::with_completion_handler(|promise| {
    ///     fetch(move |res| promise.complete(res.map_err(Into::into)))
    /// });
    /// assert_eq!(fut.wait().ok(), Some("data".to_string()));
    /// ```
    pub fn with_completion_handler<F>(starter: F) -> Future<T>
        where F: FnOnce(Promise<T>)
    {
        let (fut, prom) = future_promise();
        starter(prom);
        fut
    }

    /// Run `op` on a new thread.
    #[inline]
    pub fn spawn<F>(op: F) -> Future<T>
        where F: FnOnce() -> Result<T> + Send + 'static
    {
        Future::spawn_with(op, &ThreadScheduler)
    }

    /// Run `op` with `scheduler`. `Ok` completes the future with a value; `Err` or a panic fails
    /// it. If the future is cancelled before the job starts, `op` is not run.
    ///
    /// ```
    /// # use composable_future::{Future, ThreadScheduler};
    /// let fut = Future::spawn_with(|| Ok(6 * 7), &ThreadScheduler);
    /// assert_eq!(fut.wait().ok(), Some(42));
    /// ```
    pub fn spawn_with<F, S>(op: F, scheduler: &S) -> Future<T>
        where F: FnOnce() -> Result<T> + Send + 'static, S: Scheduler
    {
        let (fut, prom) = future_promise();
        scheduler.spawn(move || run_operation(prom, op));
        fut
    }

    /// As `spawn_with`, but the job starts after `delay`. Cancelling the future before then
    /// means `op` never runs.
    ///
    /// The pending job, and `op` with everything it captured, is only released once `delay`
    /// has passed, even if the future was cancelled long before.
    pub fn spawn_after<F, S>(delay: Duration, op: F, scheduler: &S) -> Future<T>
        where F: FnOnce() -> Result<T> + Send + 'static, S: Scheduler
    {
        let (fut, prom) = future_promise();
        scheduler.spawn_after(delay, move || run_operation(prom, op));
        fut
    }

    /// Call `handler` with the result once the future is finished or cancelled.
    pub fn result<F>(&self, handler: F) -> &Self
        where F: FnOnce(Result<T>) + Send + 'static
    {
        self.inner.on_result(Box::new(handler));
        self
    }

    /// Call `handler` with the value if the future succeeds.
    pub fn success<F>(&self, handler: F) -> &Self
        where F: FnOnce(T) + Send + 'static
    {
        self.inner.on_success(Box::new(handler));
        self
    }

    /// Call `handler` with the error if the future fails or is cancelled.
    pub fn failure<F>(&self, handler: F) -> &Self
        where F: FnOnce(Error) + Send + 'static
    {
        self.inner.on_failure(Box::new(handler));
        self
    }

    /// Cancel the future if it is still in progress.
    ///
    /// Observers run with `Err(Error::Cancelled)`. The request is passed upstream to parents
    /// which have no other observer, and finally to the producing operation, without waiting
    /// for any of them to stop.
    pub fn cancel(&self) {
        self.inner.cancel()
    }

    pub fn is_cancelled(&self) -> bool {
        self.inner.is_cancelled()
    }

    /// True once the future has a result (not cancelled).
    pub fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }

    /// The result, if the future is no longer in progress. Never blocks.
    pub fn peek(&self) -> Option<Result<T>> {
        self.inner.outcome()
    }

    /// Block until the future is finished or cancelled, or `timeout` has passed.
    ///
    /// With `None` it waits indefinitely. If the future is still in progress when the timeout
    /// expires this returns `Err(Error::Timeout)`; the future itself carries on and later
    /// observers still see its real result.
    ///
    /// ```
    /// # use composable_future::Future;
    /// # use std::time::Duration;
    /// # use std::thread;
    /// let fut = Future::spawn(|| { thread::sleep(Duration::from_millis(300)); Ok(2) });
    /// assert!(fut.get(Some(Duration::from_millis(10))).unwrap_err().is_timeout());
    /// assert_eq!(fut.get(None).ok(), Some(2));
    /// ```
    pub fn get(&self, timeout: Option<Duration>) -> Result<T> {
        self.inner.wait(timeout)
    }

    /// Block until the future is finished or cancelled.
    #[inline]
    pub fn wait(&self) -> Result<T> {
        self.get(None)
    }

    /// True if more than one observer is waiting on this future.
    ///
    /// Derived futures use this to decide whether cancelling them may cancel this future too.
    pub fn holds_multiple_handlers(&self) -> bool {
        self.inner.handler_count() > 1
    }

    /// Transform the value.
    ///
    /// A failure is forwarded unchanged without calling `func`. A panic in `func` fails the
    /// returned future with `Error::Panicked`.
    ///
    /// ```
    /// # use composable_future::Future;
    /// let fut = Future::successful(1).map(|v| v + 1).map(|v| v * 10);
    /// assert_eq!(fut.wait().ok(), Some(20));
    /// ```
    pub fn map<U, F>(&self, func: F) -> Future<U>
        where F: FnOnce(T) -> U + Send + 'static, U: Clone + Send + 'static
    {
        self.try_map(move |v| Ok(func(v)))
    }

    /// Transform the value with a function which may fail.
    pub fn try_map<U, F>(&self, func: F) -> Future<U>
        where F: FnOnce(T) -> Result<U> + Send + 'static, U: Clone + Send + 'static
    {
        let fut = Future::with_link(Link::Mapped(self.upstream()));
        let target = fut.clone();

        self.result(move |res| { target.complete(res.and_then_catching(func)); });
        fut
    }

    /// Continue with another asynchronous computation.
    ///
    /// On success `func` produces the `Future` whose outcome the returned future takes on. On
    /// failure `func` is not called and the error is forwarded.
    ///
    /// ```
    /// # use composable_future::Future;
    /// let fut = Future::successful(2).flat_map(|v| Future::spawn(move || Ok(v * 21)));
    /// assert_eq!(fut.wait().ok(), Some(42));
    /// ```
    pub fn flat_map<U, F>(&self, func: F) -> Future<U>
        where F: FnOnce(T) -> Future<U> + Send + 'static, U: Clone + Send + 'static
    {
        let fut = Future::with_link(Link::FlatMapped { parent: self.upstream(), next: None });
        let target = fut.clone();

        self.result(move |res| {
            match res.map_catching(func) {
                Ok(next) => target.forward_from(next),
                Err(e) => { target.complete(Err(e)); },
            }
        });
        fut
    }

    /// Replace a failure with a value computed from the error. Success passes through.
    ///
    /// ```
    /// # use composable_future::{Error, Future};
    /// let fut: Future<u32> = Future::failed(Error::new("nope"));
    /// assert_eq!(fut.recover(|_| 7).wait().ok(), Some(7));
    /// ```
    pub fn recover<F>(&self, func: F) -> Future<T>
        where F: FnOnce(Error) -> T + Send + 'static
    {
        self.try_recover(move |e| Ok(func(e)))
    }

    /// Replace a failure with the result of a function which may itself fail.
    pub fn try_recover<F>(&self, func: F) -> Future<T>
        where F: FnOnce(Error) -> Result<T> + Send + 'static
    {
        let fut = Future::with_link(Link::Recovered(self.upstream()));
        let target = fut.clone();

        self.result(move |res| { target.complete(res.recover_catching(func)); });
        fut
    }

    /// Replace a failure with another asynchronous computation. Success passes through.
    pub fn recover_with<F>(&self, func: F) -> Future<T>
        where F: FnOnce(Error) -> Future<T> + Send + 'static
    {
        let fut = Future::with_link(Link::RecoveredWith { parent: self.upstream(), next: None });
        let target = fut.clone();

        self.result(move |res| {
            match res {
                Ok(v) => { target.complete(Ok(v)); },
                Err(e) => match catching(move || Ok(func(e))) {
                    Ok(next) => target.forward_from(next),
                    Err(e) => { target.complete(Err(e)); },
                },
            }
        });
        fut
    }

    /// Replace any failure with `value`.
    pub fn fallback(&self, value: T) -> Future<T> {
        self.recover(move |_| value)
    }

    /// A future with the same outcome, completed from a job run by `scheduler`.
    ///
    /// Observers of the returned future therefore run in the scheduler's context rather than
    /// the thread which produced the original result.
    pub fn dispatched<S>(&self, scheduler: &S) -> Future<T>
        where S: Scheduler
    {
        let fut = Future::with_link(Link::Dispatched(self.upstream()));
        let target = fut.clone();
        let scheduler = scheduler.clone();

        self.result(move |res| scheduler.spawn(move || { target.complete(res); }));
        fut
    }

    /// As `dispatched`, but the result is delivered `delay` after this future completes.
    ///
    /// Cancelling the returned future before then fails it with `Error::Cancelled` at once;
    /// the delayed delivery is then dropped.
    ///
    /// The pending delivery keeps the result and the returned future's state alive until `delay`
    /// has passed, whether or not it was cancelled.
    pub fn dispatched_after<S>(&self, delay: Duration, scheduler: &S) -> Future<T>
        where S: Scheduler
    {
        let fut = Future::with_link(Link::Delayed(self.upstream()));
        let target = fut.clone();
        let scheduler = scheduler.clone();

        self.result(move |res| {
            scheduler.spawn_after(delay, move || {
                if !target.complete(res) {
                    debug!("delayed future already terminal; dropping its result");
                }
            })
        });
        fut
    }

    /// A new observer of this future with its own cancellation scope.
    pub fn copy(&self) -> Future<T> {
        self.map(|v| v)
    }

    // Take on the outcome of `next`, which a flat-map or recover-with has just produced.
    fn forward_from(&self, next: Future<T>) {
        // Observe `next` before linking it, so any cancellation counts us among its handlers.
        let target = self.clone();
        next.result(move |res| { target.complete(res); });

        if let Some(next) = self.inner.attach_next(next.upstream()) {
            if self.is_cancelled() {
                cancel_if_sole(&next)
            }
        }
    }
}

fn run_operation<T, F>(promise: Promise<T>, op: F)
    where T: Clone + Send + 'static, F: FnOnce() -> Result<T>
{
    if promise.is_cancelled() {
        debug!("future cancelled before its operation started; skipping it");
        return;
    }
    promise.complete(catching(op))
}

impl<T> Upstream for Future<T> where T: Clone + Send + 'static {
    fn holds_multiple_handlers(&self) -> bool {
        Future::holds_multiple_handlers(self)
    }

    fn cancel(&self) {
        Future::cancel(self)
    }
}

impl<T: Debug> Debug for Future<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        Debug::fmt(&*self.inner, f)
    }
}
