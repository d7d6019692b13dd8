use std::fmt::{self, Debug, Formatter};
use std::mem;
use std::time::{Duration, Instant};

use log::trace;
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};

type ResultHandler<T> = Box<dyn FnOnce(Result<T>) + Send + 'static>;
type SuccessHandler<T> = Box<dyn FnOnce(T) + Send + 'static>;
type FailureHandler = Box<dyn FnOnce(Error) + Send + 'static>;

/// Best-effort request to stop whatever is producing a root future's value.
pub(crate) type CancelHook = Box<dyn FnOnce() + Send + 'static>;

pub(crate) enum State<T> {
    InProgress,
    Finished(Result<T>),
    Cancelled,
}

impl<T: Clone> State<T> {
    // Terminal result as observers see it; cancellation is reported as a failure.
    fn outcome(&self) -> Option<Result<T>> {
        match self {
            State::InProgress => None,
            State::Finished(res) => Some(res.clone()),
            State::Cancelled => Some(Err(Error::Cancelled)),
        }
    }
}

impl<T: Debug> Debug for State<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        match self {
            State::InProgress => write!(f, "InProgress"),
            State::Finished(res) => write!(f, "Finished({:?})", res),
            State::Cancelled => write!(f, "Cancelled"),
        }
    }
}

// Observers waiting for the terminal state, one list per channel.
struct Handlers<T> {
    result: Vec<ResultHandler<T>>,
    success: Vec<SuccessHandler<T>>,
    failure: Vec<FailureHandler>,
}

impl<T> Handlers<T> {
    fn new() -> Handlers<T> {
        Handlers { result: Vec::new(), success: Vec::new(), failure: Vec::new() }
    }

    fn len(&self) -> usize {
        self.result.len() + self.success.len() + self.failure.len()
    }
}

impl<T: Clone> Handlers<T> {
    // Result observers first, then whichever branch observers match.
    fn fire(self, res: Result<T>) {
        for h in self.result {
            h(res.clone())
        }
        match res {
            Ok(v) => for h in self.success { h(v.clone()) },
            Err(e) => for h in self.failure { h(e.clone()) },
        }
    }
}

struct Core<T> {
    state: State<T>,
    handlers: Handlers<T>,
}

/// Type-erased view of a parent future, enough to propagate cancellation to it.
pub(crate) trait Upstream: Send + Sync {
    fn holds_multiple_handlers(&self) -> bool;
    fn cancel(&self);
}

pub(crate) type Parent = Box<dyn Upstream>;

/// How a future came to be, and what it must cancel when it is cancelled.
///
/// The link is taken (leaving `Detached`) on the terminal transition. That drops the references
/// to parents once they are no longer needed, breaking the parent -> handler -> child -> parent
/// cycle.
pub(crate) enum Link {
    Detached,
    Root(Vec<CancelHook>),
    Mapped(Parent),
    FlatMapped { parent: Parent, next: Option<Parent> },
    Recovered(Parent),
    RecoveredWith { parent: Parent, next: Option<Parent> },
    Dispatched(Parent),
    Delayed(Parent),
    Flattened(Vec<Parent>),
}

impl Link {
    fn kind(&self) -> &'static str {
        match self {
            Link::Detached => "detached",
            Link::Root(_) => "root",
            Link::Mapped(_) => "mapped",
            Link::FlatMapped { .. } => "flat-mapped",
            Link::Recovered(_) => "recovered",
            Link::RecoveredWith { .. } => "recovered-with",
            Link::Dispatched(_) => "dispatched",
            Link::Delayed(_) => "delayed",
            Link::Flattened(_) => "flattened",
        }
    }

    // Pass a cancellation on to everything upstream which nobody else is observing.
    fn propagate_cancel(self) {
        match self {
            Link::Detached => (),
            Link::Root(hooks) => for hook in hooks { hook() },
            Link::Mapped(parent) |
            Link::Recovered(parent) |
            Link::Dispatched(parent) |
            Link::Delayed(parent) => cancel_if_sole(&parent),
            Link::FlatMapped { parent, next } |
            Link::RecoveredWith { parent, next } => {
                cancel_if_sole(&parent);
                if let Some(next) = next {
                    cancel_if_sole(&next)
                }
            },
            Link::Flattened(sources) => for source in &sources { cancel_if_sole(source) },
        }
    }
}

// A parent with other observers is shared; cancelling it would surprise them.
pub(crate) fn cancel_if_sole(parent: &Parent) {
    if !parent.holds_multiple_handlers() {
        parent.cancel()
    }
}

/// State shared by all handles to one future.
///
/// Lock order: never hold `core` or `link` while calling a handler, a hook, or a method of
/// another future.
pub(crate) struct Inner<T> {
    core: Mutex<Core<T>>,
    cv: Condvar,
    link: Mutex<Link>,
    kind: &'static str,
}

impl<T> Inner<T> {
    pub(crate) fn new(link: Link) -> Inner<T> {
        Inner::with_state(State::InProgress, link)
    }

    pub(crate) fn finished(res: Result<T>) -> Inner<T> {
        Inner::with_state(State::Finished(res), Link::Detached)
    }

    fn with_state(state: State<T>, link: Link) -> Inner<T> {
        Inner {
            core: Mutex::new(Core { state, handlers: Handlers::new() }),
            cv: Condvar::new(),
            kind: link.kind(),
            link: Mutex::new(link),
        }
    }

    pub(crate) fn handler_count(&self) -> usize {
        self.core.lock().handlers.len()
    }

    pub(crate) fn is_cancelled(&self) -> bool {
        matches!(self.core.lock().state, State::Cancelled)
    }

    pub(crate) fn is_finished(&self) -> bool {
        matches!(self.core.lock().state, State::Finished(_))
    }

    fn take_link(&self) -> Link {
        mem::replace(&mut *self.link.lock(), Link::Detached)
    }

    /// Record the future a flat-map or recover-with is now forwarding from.
    ///
    /// Returns `next` back if this future has already left `InProgress`.
    pub(crate) fn attach_next(&self, next: Parent) -> Option<Parent> {
        let mut link = self.link.lock();

        match &mut *link {
            Link::FlatMapped { next: slot, .. } |
            Link::RecoveredWith { next: slot, .. } => {
                *slot = Some(next);
                None
            },
            _ => Some(next),
        }
    }

    /// Register a cancellation hook on a root future.
    ///
    /// Returns the hook back if this future is no longer in progress.
    pub(crate) fn add_cancel_hook(&self, hook: CancelHook) -> Option<CancelHook> {
        let mut link = self.link.lock();

        match &mut *link {
            Link::Root(hooks) => {
                hooks.push(hook);
                None
            },
            _ => Some(hook),
        }
    }
}

impl<T: Clone> Inner<T> {
    pub(crate) fn outcome(&self) -> Option<Result<T>> {
        self.core.lock().state.outcome()
    }

    /// Move to `Finished(res)` and notify observers. Returns false if already terminal.
    pub(crate) fn complete(&self, res: Result<T>) -> bool {
        let handlers = {
            let mut core = self.core.lock();

            if !matches!(core.state, State::InProgress) {
                return false;
            }
            core.state = State::Finished(res.clone());
            self.cv.notify_all();

            mem::replace(&mut core.handlers, Handlers::new())
        };

        trace!("{} future finished ({} handlers)", self.kind, handlers.len());

        // Parents are no longer needed.
        drop(self.take_link());
        handlers.fire(res);
        true
    }

    /// Move to `Cancelled`, notify observers, then cancel upstream. No-op if already terminal.
    pub(crate) fn cancel(&self) {
        let handlers = {
            let mut core = self.core.lock();

            if !matches!(core.state, State::InProgress) {
                return;
            }
            core.state = State::Cancelled;
            self.cv.notify_all();

            mem::replace(&mut core.handlers, Handlers::new())
        };

        trace!("{} future cancelled ({} handlers)", self.kind, handlers.len());

        handlers.fire(Err(Error::Cancelled));
        self.take_link().propagate_cancel();
    }

    pub(crate) fn on_result(&self, handler: ResultHandler<T>) {
        let res = {
            let mut core = self.core.lock();
            match core.state.outcome() {
                Some(res) => res,
                None => return core.handlers.result.push(handler),
            }
        };
        handler(res)
    }

    pub(crate) fn on_success(&self, handler: SuccessHandler<T>) {
        let res = {
            let mut core = self.core.lock();
            match core.state.outcome() {
                Some(res) => res,
                None => return core.handlers.success.push(handler),
            }
        };
        if let Ok(v) = res {
            handler(v)
        }
    }

    pub(crate) fn on_failure(&self, handler: FailureHandler) {
        let res = {
            let mut core = self.core.lock();
            match core.state.outcome() {
                Some(res) => res,
                None => return core.handlers.failure.push(handler),
            }
        };
        if let Err(e) = res {
            handler(e)
        }
    }

    /// Block until terminal or until `timeout` passes; `None` waits forever.
    pub(crate) fn wait(&self, timeout: Option<Duration>) -> Result<T> {
        // A deadline too far out to represent is the same as no deadline.
        let deadline = timeout.and_then(|t| Instant::now().checked_add(t));
        let mut core = self.core.lock();

        loop {
            if let Some(res) = core.state.outcome() {
                return res;
            }

            match deadline {
                None => self.cv.wait(&mut core),
                Some(deadline) => {
                    if self.cv.wait_until(&mut core, deadline).timed_out() {
                        return core.state.outcome().unwrap_or(Err(Error::Timeout));
                    }
                },
            }
        }
    }
}

impl<T: Debug> Debug for Inner<T> {
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        let core = self.core.lock();

        f.debug_struct("Future")
            .field("kind", &self.kind)
            .field("state", &core.state)
            .field("handlers", &core.handlers.len())
            .finish()
    }
}
