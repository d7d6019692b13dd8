// Exercise the public API end to end, the way a client would combine the pieces.
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use composable_future::{catching, flatten, future_promise, Either, Error, FlattenExt, Future,
                        Result, ResultExt, ThreadScheduler};

fn sleep_ms(ms: u64) {
    thread::sleep(Duration::from_millis(ms))
}

fn parse(s: &str) -> Result<u32> {
    s.parse::<u32>().map_err(Error::new)
}

fn lookup(id: u32) -> Future<String> {
    Future::spawn(move || {
        sleep_ms(20);
        match id {
            0 => Err(io::Error::new(io::ErrorKind::NotFound, "no such id").into()),
            n => Ok(format!("user{}", n)),
        }
    })
}

#[test]
fn parse_lookup_chain() {
    let fut = Future::spawn(|| parse("42"))
        .flat_map(lookup)
        .map(|name| name.len());

    assert_eq!(fut.wait().ok(), Some(6));
}

#[test]
fn parse_failure_recovered() {
    let fut = Future::spawn(|| parse("forty-two"))
        .flat_map(lookup)
        .recover_with(|_| Future::successful("guest".to_string()));

    assert_eq!(fut.wait().ok(), Some("guest".to_string()));
}

#[test]
fn lookup_failure_keeps_error() {
    let err = Future::successful(0).flat_map(lookup).wait().unwrap_err();

    let io = err.downcast_ref::<io::Error>().expect("not an io error");
    assert_eq!(io.kind(), io::ErrorKind::NotFound);
}

#[test]
fn either_from_outcome() {
    let outcomes: Vec<Either<Error, String>> = vec![1, 0, 2]
        .into_iter()
        .map(|id| lookup(id).wait().into())
        .collect();

    let names: Vec<_> = outcomes.iter().filter_map(|e| e.as_ref().right().cloned()).collect();
    assert_eq!(names, vec!["user1".to_string(), "user2".to_string()]);
    assert!(outcomes[1].is_left());
}

#[test]
fn fan_out_fan_in() {
    let ids = vec![3, 1, 2];
    let all = ids.into_iter().map(lookup).flattened();

    assert_eq!(all.wait().ok(),
               Some(vec!["user3".to_string(), "user1".to_string(), "user2".to_string()]));

    let all = flatten(vec![lookup(1), lookup(0)]).fallback(vec![]);
    assert_eq!(all.wait().ok(), Some(vec![]));
}

#[test]
fn cancel_stops_producer() {
    let stopped = Arc::new(AtomicBool::new(false));
    let (fut, prom) = future_promise::<u32>();

    let flag = stopped.clone();
    let producer = thread::spawn(move || {
        while !prom.is_cancelled() {
            sleep_ms(5);
        }
        flag.store(true, Ordering::SeqCst);
    });

    let view = fut.map(|v| v * 2).dispatched(&ThreadScheduler);
    sleep_ms(20);
    view.cancel();

    let _ = producer.join();
    assert!(stopped.load(Ordering::SeqCst));
    assert!(fut.wait().unwrap_err().is_cancelled());
}

#[test]
fn sync_helpers() {
    let res: Result<u32> = catching(|| parse("7")).map_catching(|v| v * 6);
    assert_eq!(res.ok(), Some(42));

    let res: Result<u32> = parse("x").recover(|_| 0);
    assert_eq!(res.ok(), Some(0));
}

#[cfg(feature = "threadpool")]
#[test]
fn pooled_delayed_delivery() {
    let pool = threadpool::ThreadPool::new(2);

    let fut = Future::spawn_with(|| parse("5"), &pool)
        .dispatched_after(Duration::from_millis(50), &pool)
        .map(|v| v + 1);

    assert!(fut.get(Some(Duration::from_millis(10))).unwrap_err().is_timeout());
    assert_eq!(fut.get(Some(Duration::from_secs(5))).ok(), Some(6));
}
