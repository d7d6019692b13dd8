//! Delayed job execution.
//!
//! A single background thread keeps a min-heap of deadlines and runs each job once its deadline
//! has passed. Jobs run on the timer thread itself, so they should only hand work off to a
//! scheduler (as `Scheduler::spawn_after` does) rather than do it inline.
//!
//! Entries cannot be removed early; a job is dropped only after its deadline, when it runs.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use log::{error, trace};
use once_cell::sync::Lazy;
use parking_lot::{Condvar, Mutex, MutexGuard};

type Job = Box<dyn FnOnce() + Send + 'static>;

struct Entry {
    deadline: Instant,
    // Insertion order, so equal deadlines fire first-in first-out.
    seq: u64,
    job: Job,
}

impl PartialEq for Entry {
    fn eq(&self, other: &Self) -> bool {
        self.deadline == other.deadline && self.seq == other.seq
    }
}

impl Eq for Entry {}

impl Ord for Entry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reversed: BinaryHeap is a max-heap, we want the earliest deadline on top.
        other.deadline
            .cmp(&self.deadline)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

impl PartialOrd for Entry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[derive(Default)]
struct Queue {
    heap: BinaryHeap<Entry>,
    next_seq: u64,
}

pub(crate) struct Timer {
    queue: Mutex<Queue>,
    cv: Condvar,
}

impl Timer {
    fn new() -> Timer {
        Timer {
            queue: Mutex::new(Queue::default()),
            cv: Condvar::new(),
        }
    }

    /// Create a timer with its own thread.
    fn start(name: &str) -> std::io::Result<Arc<Timer>> {
        let timer = Arc::new(Timer::new());
        let runner = timer.clone();

        thread::Builder::new()
            .name(name.into())
            .spawn(move || runner.run())?;
        trace!("timer thread '{}' started", name);

        Ok(timer)
    }

    pub(crate) fn schedule<F>(&self, delay: Duration, job: F)
        where F: FnOnce() + Send + 'static
    {
        let now = Instant::now();
        // An unrepresentable deadline is as good as never; park it far out.
        let deadline = now.checked_add(delay)
            .unwrap_or_else(|| now + Duration::from_secs(60 * 60 * 24 * 365));

        let mut q = self.queue.lock();
        let seq = q.next_seq;
        q.next_seq += 1;

        let wake = q.heap.peek().map_or(true, |top| deadline < top.deadline);
        q.heap.push(Entry { deadline, seq, job: Box::new(job) });

        if wake {
            self.cv.notify_one();
        }
    }

    fn run(&self) {
        let mut q = self.queue.lock();

        loop {
            let next = q.heap.peek().map(|e| e.deadline);

            match next {
                None => self.cv.wait(&mut q),
                Some(deadline) if deadline <= Instant::now() => {
                    if let Some(entry) = q.heap.pop() {
                        MutexGuard::unlocked(&mut q, || Self::fire(entry.job));
                    }
                },
                Some(deadline) => { let _ = self.cv.wait_until(&mut q, deadline); },
            }
        }
    }

    fn fire(job: Job) {
        if panic::catch_unwind(AssertUnwindSafe(job)).is_err() {
            error!("timer job panicked");
        }
    }
}

static TIMER: Lazy<Arc<Timer>> = Lazy::new(|| {
    Timer::start("future-timer").expect("failed to start timer thread")
});

/// Run `job` on the shared timer thread once `delay` has passed.
pub(crate) fn schedule<F>(delay: Duration, job: F)
    where F: FnOnce() + Send + 'static
{
    TIMER.schedule(delay, job)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc::channel;

    #[test]
    fn earliest_first() {
        let (tx, rx) = channel();

        for &(ms, tag) in &[(150, 3), (50, 1), (100, 2)] {
            let tx = tx.clone();
            schedule(Duration::from_millis(ms), move || { let _ = tx.send(tag); });
        }

        let got: Vec<u32> = rx.iter().take(3).collect();
        assert_eq!(got, vec![1, 2, 3]);
    }

    #[test]
    fn not_before_deadline() {
        let (tx, rx) = channel();
        let start = Instant::now();

        schedule(Duration::from_millis(100), move || { let _ = tx.send(Instant::now()); });

        let fired = rx.recv().expect("timer job lost");
        assert!(fired.duration_since(start) >= Duration::from_millis(100));
    }

    #[test]
    fn same_deadline_fifo() {
        let (tx, rx) = channel();

        for tag in 0..5 {
            let tx = tx.clone();
            schedule(Duration::from_millis(0), move || { let _ = tx.send(tag); });
        }

        let got: Vec<u32> = rx.iter().take(5).collect();
        assert_eq!(got, vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn survives_panicking_job() {
        let (tx, rx) = channel();

        schedule(Duration::from_millis(0), || panic!("job failure"));
        schedule(Duration::from_millis(10), move || { let _ = tx.send(()); });

        assert!(rx.recv_timeout(Duration::from_secs(5)).is_ok());
    }
}
