//! Composable asynchronous computations with a progress side channel
//!
//! A [`Process`] pairs a stream of progress events with a single terminal
//! outcome. The two are driven independently: the terminal value comes back
//! through a future, while events go to an [`EventSink`] that may or may not
//! have anyone listening. Events are advisory; nothing about the terminal
//! outcome depends on them being observed.
//!
//! Processes are lazy. Nothing runs until the process is awaited (it
//! implements [`IntoFuture`]) or started with [`Process::run`].

use std::fmt;
use std::future::{Future, IntoFuture};

use futures::channel::mpsc::{self, UnboundedReceiver, UnboundedSender};
use futures::future::{self, BoxFuture, FutureExt};
use futures::stream::{Stream, StreamExt};

type Runner<E, T, X> = Box<dyn FnOnce(EventSink<E>) -> BoxFuture<'static, Result<T, X>> + Send>;

/// One link of a [`Process::chain_n`] fold
pub type Continuation<E, T, X> = Box<dyn FnOnce(T) -> Process<E, T, X> + Send>;

/// Write end of a process' event channel.
///
/// Cloning is cheap; all clones feed the same receiver, so events from
/// concurrently running members interleave in arrival order.
pub struct EventSink<E> {
    sender: Option<UnboundedSender<E>>,
}

impl<E> EventSink<E> {
    /// A sink that drops every event
    pub fn disconnected() -> Self {
        Self { sender: None }
    }

    /// Publish an event. Never fails: a closed channel only means nobody
    /// is listening any more.
    pub fn emit(&self, event: E) {
        if let Some(sender) = &self.sender {
            let _ = sender.unbounded_send(event);
        }
    }

    /// Whether a receiver is still attached
    pub fn is_connected(&self) -> bool {
        self.sender
            .as_ref()
            .map(|sender| !sender.is_closed())
            .unwrap_or(false)
    }
}

impl<E> Clone for EventSink<E> {
    fn clone(&self) -> Self {
        Self {
            sender: self.sender.clone(),
        }
    }
}

impl<E> fmt::Debug for EventSink<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EventSink")
            .field("connected", &self.is_connected())
            .finish()
    }
}

/// A lazily started computation emitting events of type `E` and finishing
/// with exactly one `Ok(T)` or `Err(X)`.
pub struct Process<E, T, X> {
    runner: Runner<E, T, X>,
}

impl<E, T, X> Process<E, T, X>
where
    E: Send + 'static,
    T: Send + 'static,
    X: Send + 'static,
{
    /// Build a process from a function of its event sink
    pub fn new<F, Fut>(f: F) -> Self
    where
        F: FnOnce(EventSink<E>) -> Fut + Send + 'static,
        Fut: Future<Output = Result<T, X>> + Send + 'static,
    {
        Self {
            runner: Box::new(move |sink| f(sink).boxed()),
        }
    }

    /// Build a process from an event stream and a terminal computation.
    ///
    /// Both are driven together; the process finishes once the stream is
    /// exhausted and the computation has produced its outcome.
    pub fn of<S, F>(events: S, result: F) -> Self
    where
        S: Stream<Item = E> + Send + 'static,
        F: Future<Output = Result<T, X>> + Send + 'static,
    {
        Self::new(move |sink| async move {
            let forward = events.for_each(move |event| {
                sink.emit(event);
                future::ready(())
            });
            let ((), outcome) = future::join(forward, result).await;
            outcome
        })
    }

    /// A process that succeeds with `value` and emits nothing
    pub fn just(value: T) -> Self {
        Self::new(move |_| future::ready(Ok(value)))
    }

    /// A process that fails with `error` and emits nothing
    pub fn fail(error: X) -> Self {
        Self::new(move |_| future::ready(Err(error)))
    }

    /// Lift a plain future; the resulting process emits nothing
    pub fn from_future<F>(future: F) -> Self
    where
        F: Future<Output = Result<T, X>> + Send + 'static,
    {
        Self::new(move |_| future)
    }

    /// Transform the success value. Events and failures pass through.
    pub fn map<U, F>(self, f: F) -> Process<E, U, X>
    where
        U: Send + 'static,
        F: FnOnce(T) -> U + Send + 'static,
    {
        Process::new(move |sink| async move { self.run_with(sink).await.map(f) })
    }

    /// Transform the failure. Events and success values pass through.
    pub fn map_err<Y, F>(self, f: F) -> Process<E, T, Y>
    where
        Y: Send + 'static,
        F: FnOnce(X) -> Y + Send + 'static,
    {
        Process::new(move |sink| async move { self.run_with(sink).await.map_err(f) })
    }

    /// Sequential composition.
    ///
    /// `f` is only called after this process has succeeded, and the process
    /// it returns only starts then. A failure skips `f` entirely. Events of
    /// both halves go to the same sink, so they appear in temporal order.
    pub fn chain<U, F>(self, f: F) -> Process<E, U, X>
    where
        U: Send + 'static,
        F: FnOnce(T) -> Process<E, U, X> + Send + 'static,
    {
        Process::new(move |sink: EventSink<E>| async move {
            match self.run_with(sink.clone()).await {
                Ok(value) => f(value).run_with(sink).await,
                Err(error) => Err(error),
            }
        })
    }

    /// Turn a failure into a success value chosen by `f`
    pub fn on_error_return<F>(self, f: F) -> Self
    where
        F: FnOnce(X) -> T + Send + 'static,
    {
        Self::new(move |sink| async move {
            let value = self.run_with(sink).await.unwrap_or_else(f);
            Result::<T, X>::Ok(value)
        })
    }

    /// Run every process concurrently and collect their outcomes.
    ///
    /// The merged process never fails on account of its members: the
    /// result holds each member's outcome in input order. It completes once
    /// every member has completed; no member is cancelled early. All members
    /// are polled from the task awaiting the merge, so the merge is a
    /// structured scope owned by its caller rather than a set of spawned
    /// tasks.
    pub fn merge(processes: Vec<Self>) -> Process<E, Vec<Result<T, X>>, X> {
        Process::new(move |sink: EventSink<E>| async move {
            let outcomes = future::join_all(
                processes
                    .into_iter()
                    .map(|process| process.run_with(sink.clone())),
            )
            .await;
            Result::<_, X>::Ok(outcomes)
        })
    }

    /// Left-to-right fold: `initial`, then each continuation fed the
    /// previous success value.
    pub fn chain_n(initial: Self, steps: Vec<Continuation<E, T, X>>) -> Self {
        steps
            .into_iter()
            .fold(initial, |process, step| process.chain(step))
    }

    /// Start the process, returning its event stream and terminal outcome.
    ///
    /// The event stream ends once the outcome future has completed (or been
    /// dropped).
    pub fn run(self) -> (UnboundedReceiver<E>, BoxFuture<'static, Result<T, X>>) {
        let (sender, receiver) = mpsc::unbounded();
        let outcome = self.run_with(EventSink {
            sender: Some(sender),
        });
        (receiver, outcome)
    }

    /// Start the process, publishing its events to `sink`
    pub fn run_with(self, sink: EventSink<E>) -> BoxFuture<'static, Result<T, X>> {
        (self.runner)(sink)
    }
}

impl<E, T, X> IntoFuture for Process<E, T, X>
where
    E: Send + 'static,
    T: Send + 'static,
    X: Send + 'static,
{
    type Output = Result<T, X>;
    type IntoFuture = BoxFuture<'static, Result<T, X>>;

    /// Start the process, discarding its events
    fn into_future(self) -> Self::IntoFuture {
        self.run_with(EventSink::disconnected())
    }
}

impl<E, T, X> fmt::Debug for Process<E, T, X> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process").finish_non_exhaustive()
    }
}
