//! Cold progress/result processes.
//!
//! A [`Process`] is a recipe for an event stream. Every time it is driven the
//! recipe runs from scratch and emits zero or more progress states
//! (`Ok(Either::Left(state))`) followed by exactly one terminal event: the
//! result (`Ok(Either::Right(value))`) or a failure (`Err(error)`).

use std::{fmt, future::Future, sync::Arc};

use futures_util::{
    FutureExt, Stream, StreamExt,
    future::ready,
    stream::{self, BoxStream},
};
use tracing::warn;

use crate::{
    chain::bind,
    either::Either,
    error::{ResultError, Violation},
};

/// A single event emitted by a running process.
pub type Event<S, T, E> = Result<Either<S, T>, E>;

/// The boxed event stream of one run.
pub type EventStream<S, T, E> = BoxStream<'static, Event<S, T, E>>;

/// What a run carries internally: an event, or a broken ordering detected upstream.
#[derive(Debug)]
pub(crate) enum Signal<S, T, E> {
    Event(Event<S, T, E>),
    Violation(Violation),
}

impl<S, T, E> Signal<S, T, E> {
    fn map_event<S2, T2, E2, F>(self, f: F) -> Signal<S2, T2, E2>
    where
        F: FnOnce(Event<S, T, E>) -> Event<S2, T2, E2>,
    {
        match self {
            Signal::Event(event) => Signal::Event(f(event)),
            Signal::Violation(violation) => Signal::Violation(violation),
        }
    }

    /// Classifies a signal that arrived after the run had already terminated.
    pub(crate) fn trailing(&self, had_result: bool) -> Violation {
        match self {
            Signal::Violation(violation) => *violation,
            Signal::Event(Ok(Either::Left(_))) if had_result => Violation::StateAfterResult,
            Signal::Event(Ok(Either::Right(_))) if had_result => Violation::MultipleResults,
            Signal::Event(_) => Violation::EventAfterTerminal,
        }
    }
}

pub(crate) type SignalStream<S, T, E> = BoxStream<'static, Signal<S, T, E>>;

type Source<S, T, E> = Arc<dyn Fn() -> SignalStream<S, T, E> + Send + Sync>;

/// A cold, re-runnable computation that reports progress states of type `S`
/// and finishes with a result of type `T` or a failure of type `E`.
///
/// Nothing runs until the process is driven through [`events`](Self::events),
/// [`states`](Self::states), [`result`](Self::result), [`drive`](Self::drive)
/// or [`spawn`](Self::spawn). Each of those starts an independent run with its
/// own side effects. Cloning a process clones the recipe, not a run.
///
/// ```rust
/// use buckaroo_process::Process;
///
/// # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
/// let install: Process<&str, u32, String> = Process::just_with_states(1, ["resolving"])
///     .chain(|count| Process::just_with_states(count + 1, ["downloading", "installing"]));
///
/// let mut log = Vec::new();
/// let installed = install.drive(|state| log.push(state)).await;
/// assert_eq!(installed, Ok(2));
/// assert_eq!(log, ["resolving", "downloading", "installing"]);
/// # });
/// ```
pub struct Process<S, T, E> {
    source: Source<S, T, E>,
}

impl<S, T, E> Clone for Process<S, T, E> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
        }
    }
}

impl<S, T, E> fmt::Debug for Process<S, T, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Process").finish_non_exhaustive()
    }
}

impl<S, T, E> Process<S, T, E>
where
    S: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Wraps a factory of event streams as a process.
    ///
    /// # Arguments
    /// - `factory`: Called once per run to produce that run's event stream.
    ///
    /// # Returns
    /// A cold process whose every run drives a fresh stream from `factory`.
    ///
    /// # Notes
    /// - The streams must emit states, then one result or one failure, then end.
    /// - [`result`](Self::result) reports any other ordering as an invariant
    ///   violation, and so does a [`chain`] consuming the process.
    pub fn of<F, St>(factory: F) -> Self
    where
        F: Fn() -> St + Send + Sync + 'static,
        St: Stream<Item = Event<S, T, E>> + Send + 'static,
    {
        Self::from_signals(move || factory().map(Signal::Event).boxed())
    }

    pub(crate) fn from_signals<F>(factory: F) -> Self
    where
        F: Fn() -> SignalStream<S, T, E> + Send + Sync + 'static,
    {
        Self {
            source: Arc::new(factory),
        }
    }

    /// A process that terminates with `result` without emitting any state.
    pub fn just(result: T) -> Self
    where
        T: Clone + Sync,
    {
        Self::of(move || stream::once(ready(Ok(Either::Right(result.clone())))))
    }

    /// A process that emits `states` in order, then terminates with `result`.
    pub fn just_with_states<I>(result: T, states: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Clone + Sync,
        T: Clone + Sync,
    {
        let states: Vec<S> = states.into_iter().collect();
        Self::of(move || {
            let prefix: Vec<Event<S, T, E>> = states.iter().cloned().map(|state| Ok(Either::Left(state))).collect();
            stream::iter(prefix).chain(stream::once(ready(Ok(Either::Right(result.clone())))))
        })
    }

    /// A process that fails with `error` without emitting any event before it.
    pub fn error(error: E) -> Self
    where
        E: Clone + Sync,
    {
        Self::of(move || stream::once(ready(Err(error.clone()))))
    }

    /// Wraps an async fallible operation. The operation is started anew on every run.
    pub fn from_future<F, Fut>(operation: F) -> Self
    where
        F: Fn() -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<T, E>> + Send + 'static,
    {
        Self::of(move || operation().map(|outcome| outcome.map(Either::Right)).into_stream())
    }

    /// Lifts an adapter outcome: `Left` becomes a process failure, `Right` the result.
    pub fn from_either(outcome: Either<E, T>) -> Self
    where
        E: Clone + Sync,
        T: Clone + Sync,
    {
        outcome.fold(Self::error, Self::just)
    }

    /// Same as [`from_either`](Self::from_either) for a `Result`.
    pub fn from_result(outcome: Result<T, E>) -> Self
    where
        E: Clone + Sync,
        T: Clone + Sync,
    {
        Self::from_either(Either::from(outcome))
    }

    pub(crate) fn signals(&self) -> SignalStream<S, T, E> {
        (self.source)()
    }

    /// Starts a run and returns its raw event stream.
    ///
    /// When a chained input broke the event ordering the stream ends early;
    /// [`result`](Self::result) reports which ordering was broken.
    pub fn events(&self) -> EventStream<S, T, E> {
        self.signals()
            .scan((), |_, signal| {
                ready(match signal {
                    Signal::Event(event) => Some(event),
                    Signal::Violation(violation) => {
                        warn!(violation = violation.describe(), "ending event stream of a malformed run");
                        None
                    }
                })
            })
            .boxed()
    }

    /// Starts a run and returns its progress states.
    ///
    /// The stream ends right before the result or failure would be delivered,
    /// so a failed run and a successful one look the same here. Use
    /// [`try_states`](Self::try_states) to see the failure as well, or
    /// [`drive`](Self::drive) to observe states and outcome of one run.
    pub fn states(&self) -> BoxStream<'static, S> {
        self.signals()
            .scan((), |_, signal| {
                ready(match signal {
                    Signal::Event(Ok(Either::Left(state))) => Some(state),
                    _ => None,
                })
            })
            .boxed()
    }

    /// Starts a run and returns its progress states, ending with the failure if there is one.
    ///
    /// Yields `Ok(state)` for every progress state. The stream ends quietly on
    /// the result; a failure, a broken ordering or a run that stops without a
    /// result is delivered as a last `Err` item.
    pub fn try_states(&self) -> BoxStream<'static, Result<S, ResultError<E>>> {
        stream::unfold(Some(self.signals()), |signals| async move {
            let mut signals = signals?;
            match signals.next().await {
                Some(Signal::Event(Ok(Either::Left(state)))) => Some((Ok(state), Some(signals))),
                Some(Signal::Event(Ok(Either::Right(_)))) => None,
                Some(Signal::Event(Err(error))) => Some((Err(ResultError::Failed(error)), None)),
                Some(Signal::Violation(violation)) => Some((Err(violated(violation)), None)),
                None => Some((Err(ResultError::NoResult), None)),
            }
        })
        .boxed()
    }

    /// Starts a run, skips its states and waits for its single result.
    pub async fn result(&self) -> Result<T, ResultError<E>> {
        self.drive(|_| {}).await
    }

    /// Starts a run, passes each progress state to `on_state` and waits for the result.
    ///
    /// This observes states and result from one run, whereas calling
    /// [`states`](Self::states) and [`result`](Self::result) separately runs
    /// the process twice.
    pub async fn drive<F>(&self, on_state: F) -> Result<T, ResultError<E>>
    where
        F: FnMut(S),
    {
        settle(self.signals(), on_state).await
    }

    /// Sequences `continuation` after this process. See [`chain`].
    ///
    /// # Panics
    /// A panic inside `continuation` unwinds through whoever drives the run.
    pub fn chain<U, F>(self, continuation: F) -> Process<S, U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> Process<S, U, E> + Send + Sync + 'static,
    {
        bind(self, continuation)
    }

    /// Maps the result, leaving states and failure untouched.
    pub fn map<U, F>(self, f: F) -> Process<S, U, E>
    where
        U: Send + 'static,
        F: Fn(T) -> U + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let source = self.source;
        Process::from_signals(move || {
            let f = Arc::clone(&f);
            source()
                .map(move |signal| signal.map_event(|event| event.map(|step| step.map_right(|value| f(value)))))
                .boxed()
        })
    }

    /// Maps every progress state, leaving result and failure untouched.
    pub fn map_states<S2, F>(self, f: F) -> Process<S2, T, E>
    where
        S2: Send + 'static,
        F: Fn(S) -> S2 + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let source = self.source;
        Process::from_signals(move || {
            let f = Arc::clone(&f);
            source()
                .map(move |signal| signal.map_event(|event| event.map(|step| step.map_left(|state| f(state)))))
                .boxed()
        })
    }

    /// Maps the failure, leaving states and result untouched.
    pub fn map_failure<E2, F>(self, f: F) -> Process<S, T, E2>
    where
        E2: Send + 'static,
        F: Fn(E) -> E2 + Send + Sync + 'static,
    {
        let f = Arc::new(f);
        let source = self.source;
        Process::from_signals(move || {
            let f = Arc::clone(&f);
            source()
                .map(move |signal| signal.map_event(|event| event.map_err(|error| f(error))))
                .boxed()
        })
    }
}

/// Sequences two processes.
///
/// Runs `process`, forwarding its states unchanged. Its result is handed to
/// `continuation`, whose process is then run in place of the first one: its
/// states continue the same stream and its result or failure becomes the
/// outcome. A failure of `process` ends the run and `continuation` is never
/// invoked.
///
/// # Arguments
/// - `process`: The step to run first.
/// - `continuation`: Builds the next step from the result of `process`.
///   Called once per run that reaches a result.
///
/// # Returns
/// A cold process spanning both steps.
///
/// # Notes
/// - `continuation` is only called once `process` has ended after its result.
///   A second result, or any event after the result, fails the composed run
///   with the matching invariant violation instead.
/// - To fail while building the next step, return [`Process::error`].
///
/// # Panics
/// A panic inside `continuation` is not caught; it unwinds through whoever
/// drives the composed run.
pub fn chain<S, T, U, E, F>(process: Process<S, T, E>, continuation: F) -> Process<S, U, E>
where
    S: Send + 'static,
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    F: Fn(T) -> Process<S, U, E> + Send + Sync + 'static,
{
    bind(process, continuation)
}

fn violated<E>(violation: Violation) -> ResultError<E> {
    warn!(violation = violation.describe(), "malformed process event sequence");
    violation.into()
}

/// Consumes a run down to its single result, reporting states on the way.
pub(crate) async fn settle<S, T, E, St, F>(mut signals: St, mut on_state: F) -> Result<T, ResultError<E>>
where
    St: Stream<Item = Signal<S, T, E>> + Unpin,
    F: FnMut(S),
{
    let outcome = loop {
        match signals.next().await {
            Some(Signal::Event(Ok(Either::Left(state)))) => on_state(state),
            Some(Signal::Event(Ok(Either::Right(result)))) => break Ok(result),
            Some(Signal::Event(Err(error))) => break Err(ResultError::Failed(error)),
            Some(Signal::Violation(violation)) => return Err(violated(violation)),
            None => return Err(ResultError::NoResult),
        }
    };
    // Nothing may follow the terminal event.
    match signals.next().await {
        Some(signal) => Err(violated(signal.trailing(outcome.is_ok()))),
        None => outcome,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    type TestProcess<T> = Process<&'static str, T, String>;

    #[tokio::test]
    async fn just_terminates_without_states() {
        let process: TestProcess<u32> = Process::just(7);
        assert!(process.states().collect::<Vec<_>>().await.is_empty());
        assert_eq!(process.result().await, Ok(7));
    }

    #[tokio::test]
    async fn just_with_states_emits_states_in_order() {
        let process: TestProcess<u32> = Process::just_with_states(3, ["a", "b", "c"]);
        assert_eq!(process.states().collect::<Vec<_>>().await, vec!["a", "b", "c"]);
        assert_eq!(process.result().await, Ok(3));

        let events: Vec<_> = process.events().collect().await;
        assert_eq!(
            events,
            vec![
                Ok(Either::Left("a")),
                Ok(Either::Left("b")),
                Ok(Either::Left("c")),
                Ok(Either::Right(3))
            ]
        );
    }

    #[tokio::test]
    async fn error_fails_without_events() {
        let process: TestProcess<u32> = Process::error("boom".to_string());
        assert!(process.states().collect::<Vec<_>>().await.is_empty());
        assert_eq!(process.result().await, Err(ResultError::Failed("boom".to_string())));
        assert_eq!(process.events().collect::<Vec<_>>().await, vec![Err("boom".to_string())]);
    }

    #[tokio::test]
    async fn states_stop_before_the_terminal_event() {
        let process: TestProcess<u32> = Process::of(|| {
            stream::iter(vec![
                Ok(Either::Left("first")),
                Err("broken".to_string()),
                Ok(Either::Left("never")),
            ])
        });
        assert_eq!(process.states().collect::<Vec<_>>().await, vec!["first"]);
    }

    #[tokio::test]
    async fn result_reports_malformed_sequences() {
        let empty: TestProcess<u32> = Process::of(|| stream::iter(vec![Ok(Either::Left("only state"))]));
        assert_eq!(empty.result().await, Err(ResultError::NoResult));

        let twice: TestProcess<u32> = Process::of(|| stream::iter(vec![Ok(Either::Right(1)), Ok(Either::Right(2))]));
        assert_eq!(twice.result().await, Err(ResultError::MultipleResults));

        let late_state: TestProcess<u32> = Process::of(|| stream::iter(vec![Ok(Either::Right(1)), Ok(Either::Left("late"))]));
        let error = late_state.result().await.unwrap_err();
        assert_eq!(error, ResultError::StateAfterResult);
        assert!(error.is_invariant_violation());
    }

    #[tokio::test]
    async fn result_reports_events_after_a_terminal_event() {
        let result_after_failure: TestProcess<u32> =
            Process::of(|| stream::iter(vec![Err("boom".to_string()), Ok(Either::Right(1))]));
        let error = result_after_failure.result().await.unwrap_err();
        assert_eq!(error, ResultError::EventAfterTerminal);
        assert!(error.is_invariant_violation());

        let failure_after_result: TestProcess<u32> =
            Process::of(|| stream::iter(vec![Ok(Either::Right(1)), Err("late".to_string())]));
        assert_eq!(failure_after_result.result().await, Err(ResultError::EventAfterTerminal));

        let state_after_failure: TestProcess<u32> =
            Process::of(|| stream::iter(vec![Err("boom".to_string()), Ok(Either::Left("late"))]));
        assert_eq!(state_after_failure.result().await, Err(ResultError::EventAfterTerminal));
    }

    #[tokio::test]
    async fn try_states_ends_with_the_failure() {
        let failing: TestProcess<u32> = Process::of(|| {
            stream::iter(vec![Ok(Either::Left("download")), Err("checksum mismatch".to_string())])
        });
        let seen: Vec<_> = failing.try_states().collect().await;
        assert_eq!(
            seen,
            vec![Ok("download"), Err(ResultError::Failed("checksum mismatch".to_string()))]
        );

        let succeeding: TestProcess<u32> = Process::just_with_states(1, ["download"]);
        assert_eq!(succeeding.try_states().collect::<Vec<_>>().await, vec![Ok("download")]);

        let unfinished: TestProcess<u32> = Process::of(|| stream::iter(vec![Ok(Either::Left("download"))]));
        assert_eq!(
            unfinished.try_states().collect::<Vec<_>>().await,
            vec![Ok("download"), Err(ResultError::NoResult)]
        );
    }

    #[tokio::test]
    async fn drive_observes_states_and_result_from_one_run() {
        let runs = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&runs);
        let process: TestProcess<u32> = Process::of(move || {
            counter.fetch_add(1, Ordering::SeqCst);
            stream::iter(vec![Ok(Either::Left("fetching")), Ok(Either::Right(9))])
        });

        let mut seen = Vec::new();
        let outcome = process.drive(|state| seen.push(state)).await;

        assert_eq!(outcome, Ok(9));
        assert_eq!(seen, vec!["fetching"]);
        assert_eq!(runs.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn from_future_runs_the_operation_per_drive() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let process: TestProcess<usize> = Process::from_future(move || {
            let call = counter.fetch_add(1, Ordering::SeqCst) + 1;
            async move { Ok(call) }
        });

        assert_eq!(process.result().await, Ok(1));
        assert_eq!(process.result().await, Ok(2));
    }

    #[tokio::test]
    async fn from_either_folds_left_into_failure() {
        let failed: TestProcess<u32> = Process::from_either(Either::Left("not found".to_string()));
        assert_eq!(failed.result().await, Err(ResultError::Failed("not found".to_string())));

        let read: TestProcess<u32> = Process::from_result(Ok(5));
        assert_eq!(read.result().await, Ok(5));
    }

    #[tokio::test]
    async fn maps_touch_only_their_own_channel() {
        let process: TestProcess<u32> = Process::just_with_states(2, ["x"]);
        let mapped = process
            .clone()
            .map(|value| value * 10)
            .map_states(|state| state.len());
        assert_eq!(mapped.states().collect::<Vec<_>>().await, vec![1]);
        assert_eq!(mapped.result().await, Ok(20));

        let failing: TestProcess<u32> = Process::error("io".to_string());
        let wrapped = failing.map_failure(|error| format!("config: {error}"));
        assert_eq!(wrapped.result().await, Err(ResultError::Failed("config: io".to_string())));
    }
}
