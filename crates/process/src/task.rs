//! Running processes as Tokio tasks.
//!
//! [`Process::spawn`] starts a run on an explicitly supplied runtime and
//! streams its events over a bounded channel. The caller owns the returned
//! [`ProcessTask`]; dropping it aborts the run, so a consumer that stops
//! reading progress states also stops the underlying work.

use std::{
    pin::Pin,
    task::{Context, Poll, ready},
};

use futures_util::{Stream, StreamExt, stream};
use tokio::{
    runtime::Handle,
    sync::mpsc::{Receiver, Sender, channel},
    task::JoinHandle,
};
use tracing::{debug, error, trace, warn};

use crate::{
    either::Either,
    error::ResultError,
    options::SpawnOptions,
    process::{Event, Process, Signal, SignalStream, settle},
};

/// Handle to a process run executing on a Tokio runtime.
///
/// Yields the run's events as a [`Stream`]. Dropping the handle, or calling
/// [`cancel`](Self::cancel), aborts the run.
#[derive(Debug)]
pub struct ProcessTask<S, T, E> {
    signals: Receiver<Signal<S, T, E>>,
    handle: JoinHandle<()>,
    ended: bool,
}

impl<S, T, E> Process<S, T, E>
where
    S: Send + 'static,
    T: Send + 'static,
    E: Send + 'static,
{
    /// Starts a run on `runtime` using [`SpawnOptions::from_env`].
    pub fn spawn(&self, runtime: &Handle) -> ProcessTask<S, T, E> {
        self.spawn_with(runtime, SpawnOptions::from_env())
    }

    /// Starts a run on `runtime` with explicit options.
    ///
    /// # Arguments
    /// - `runtime`: The Tokio runtime that executes the run.
    /// - `options`: Channel settings for the events sent back to the caller.
    ///
    /// # Returns
    /// A [`ProcessTask`] owning the run. The run waits for the consumer once
    /// `options.buffer()` events are in flight.
    pub fn spawn_with(&self, runtime: &Handle, options: SpawnOptions) -> ProcessTask<S, T, E> {
        let (signal_tx, signal_rx) = channel(options.buffer());
        let handle = runtime.spawn(forward_signals(self.signals(), signal_tx));
        ProcessTask {
            signals: signal_rx,
            handle,
            ended: false,
        }
    }
}

impl<S, T, E> ProcessTask<S, T, E> {
    /// Waits for the single result of the run, discarding progress states.
    pub async fn result(self) -> Result<T, ResultError<E>> {
        self.drive(|_| {}).await
    }

    /// Passes each progress state to `on_state`, then waits for the result.
    ///
    /// A run that was aborted or panicked before its terminal event resolves
    /// to [`ResultError::NoResult`].
    pub async fn drive<F>(mut self, on_state: F) -> Result<T, ResultError<E>>
    where
        F: FnMut(S),
    {
        let signals = stream::poll_fn(|cx| self.signals.poll_recv(cx));
        let outcome = settle(signals, on_state).await;
        if matches!(outcome, Err(ResultError::NoResult))
            && let Err(join_error) = (&mut self.handle).await
            && join_error.is_panic()
        {
            error!(error = %join_error, "process task panicked before producing a result");
        }
        outcome
    }

    /// Aborts the run. No further events are delivered.
    pub fn cancel(self) {
        debug!("process task cancelled");
        self.handle.abort();
    }

    /// Returns `true` once the underlying task has stopped.
    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl<S, T, E> Stream for ProcessTask<S, T, E> {
    type Item = Event<S, T, E>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let this = self.get_mut();
        if this.ended {
            return Poll::Ready(None);
        }
        match ready!(this.signals.poll_recv(cx)) {
            Some(Signal::Event(event)) => Poll::Ready(Some(event)),
            Some(Signal::Violation(violation)) => {
                warn!(violation = violation.describe(), "ending event stream of a malformed run");
                this.ended = true;
                Poll::Ready(None)
            }
            None => Poll::Ready(None),
        }
    }
}

impl<S, T, E> Drop for ProcessTask<S, T, E> {
    fn drop(&mut self) {
        if !self.handle.is_finished() {
            debug!("process task dropped before completion; aborting run");
        }
        self.handle.abort();
    }
}

async fn forward_signals<S, T, E>(mut signals: SignalStream<S, T, E>, signal_tx: Sender<Signal<S, T, E>>) {
    while let Some(signal) = signals.next().await {
        let terminal = !matches!(signal, Signal::Event(Ok(Either::Left(_))));
        if signal_tx.send(signal).await.is_err() {
            debug!("process receiver dropped; abandoning run");
            return;
        }
        if terminal {
            trace!("process run delivered its terminal event");
        }
    }
}
