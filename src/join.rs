use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::Result;
use crate::future::Future;
use crate::inner::Link;

/// Return a `Future` of all values in an iterator of `Future`s.
///
/// The values are in the same order as the input, whatever order the sources complete in. If
/// any source fails (or is cancelled) the returned `Future` fails once every source has
/// completed; when several fail, the error reported is that of the earliest failing source in
/// the input order. An empty input succeeds at once with an empty `Vec`.
///
/// Cancelling the returned `Future` cancels each source which has no other observer.
///
/// ```
/// # use composable_future::{flatten, Future};
/// let all = flatten(vec![Future::successful(1), Future::spawn(|| Ok(2)), Future::successful(3)]);
/// assert_eq!(all.wait().ok(), Some(vec![1, 2, 3]));
/// ```
pub fn flatten<T, I>(futures: I) -> Future<Vec<T>>
    where T: Clone + Send + 'static,
          I: IntoIterator<Item = Future<T>>
{
    let sources: Arc<Vec<Future<T>>> = Arc::new(futures.into_iter().collect());
    let fut = Future::with_link(Link::Flattened(sources.iter().map(Future::upstream).collect()));

    if sources.is_empty() {
        fut.complete(Ok(Vec::new()));
        return fut;
    }

    let pending = Arc::new(AtomicUsize::new(sources.len()));

    for source in sources.iter() {
        let pending = pending.clone();
        let sources = sources.clone();
        let target = fut.clone();

        source.result(move |_| {
            // The last source to complete gathers everyone's results.
            if pending.fetch_sub(1, Ordering::AcqRel) == 1 {
                target.complete(gather(&sources));
            }
        });
    }

    fut
}

// Every source is terminal, so a zero timeout just reads the stored result.
fn gather<T>(sources: &[Future<T>]) -> Result<Vec<T>>
    where T: Clone + Send + 'static
{
    sources.iter()
        .map(|s| s.get(Some(Duration::from_secs(0))))
        .collect()
}

/// Adds `flattened` to anything which iterates over `Future`s.
pub trait FlattenExt<T> {
    /// See `flatten`.
    fn flattened(self) -> Future<Vec<T>>;
}

impl<T, I> FlattenExt<T> for I
    where T: Clone + Send + 'static,
          I: IntoIterator<Item = Future<T>>
{
    fn flattened(self) -> Future<Vec<T>> {
        flatten(self)
    }
}
