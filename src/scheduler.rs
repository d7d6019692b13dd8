use std::thread;
use std::time::Duration;

use crate::timer;

/// Something which can run jobs: a thread spawner, a thread pool, a work queue.
///
/// `Future` uses a `Scheduler` to run operations (`Future::spawn_with`) and to deliver
/// completions in a particular execution context (`Future::dispatched`). Schedulers are
/// passed by reference and cloned into the jobs which need them, so they should be cheap
/// handles.
pub trait Scheduler: Clone + Send + 'static {
    /// Run `f`, typically on another thread.
    fn spawn<F>(&self, f: F) where F: FnOnce() + Send + 'static;

    /// Run `f` once `delay` has passed.
    ///
    /// The default waits on the shared timer thread and then hands `f` to `spawn`, so `f`
    /// still runs in this scheduler's context.
    fn spawn_after<F>(&self, delay: Duration, f: F)
        where F: FnOnce() + Send + 'static
    {
        let this = self.clone();
        timer::schedule(delay, move || this.spawn(f))
    }
}

/// A `Scheduler` that creates a new `std::thread` for every job.
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadScheduler;

impl Scheduler for ThreadScheduler {
    fn spawn<F>(&self, f: F)
        where F: FnOnce() + Send + 'static
    {
        let _ = thread::spawn(f);
    }
}

#[cfg(feature = "threadpool")]
impl Scheduler for threadpool::ThreadPool {
    fn spawn<F>(&self, f: F)
        where F: FnOnce() + Send + 'static
    {
        self.execute(f)
    }
}
