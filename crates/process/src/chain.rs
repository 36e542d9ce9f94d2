//! Sequencing of processes.
//!
//! The composed run moves through two stages. While `OnFirst`, events of the
//! input run are forwarded until its result arrives. The input must then end;
//! only after that is the result handed to the continuation and the run
//! switches to `OnSecond`, forwarding everything the continuation's run emits.
//! An input failure is forwarded and the run waits in `Failed` for the input
//! to end. Anything the input emits after its terminal event ends the
//! composed run with a violation.

use std::sync::Arc;

use futures_util::{StreamExt, stream};
use tracing::{debug, trace};

use crate::{
    either::Either,
    error::Violation,
    process::{Process, Signal, SignalStream},
};

type Continuation<S, T, U, E> = Arc<dyn Fn(T) -> Process<S, U, E> + Send + Sync>;

enum ChainState<S, T, U, E> {
    OnFirst(SignalStream<S, T, E>, Continuation<S, T, U, E>),
    Failed(SignalStream<S, T, E>),
    OnSecond(SignalStream<S, U, E>),
    Done,
}

pub(crate) fn bind<S, T, U, E, F>(process: Process<S, T, E>, continuation: F) -> Process<S, U, E>
where
    S: Send + 'static,
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
    F: Fn(T) -> Process<S, U, E> + Send + Sync + 'static,
{
    let continuation: Continuation<S, T, U, E> = Arc::new(continuation);
    Process::from_signals(move || {
        let state = ChainState::OnFirst(process.signals(), Arc::clone(&continuation));
        stream::unfold(state, advance).boxed()
    })
}

async fn advance<S, T, U, E>(state: ChainState<S, T, U, E>) -> Option<(Signal<S, U, E>, ChainState<S, T, U, E>)>
where
    S: Send + 'static,
    T: Send + 'static,
    U: Send + 'static,
    E: Send + 'static,
{
    match state {
        ChainState::OnFirst(mut signals, continuation) => match signals.next().await? {
            Signal::Event(Ok(Either::Left(progress))) => {
                Some((Signal::Event(Ok(Either::Left(progress))), ChainState::OnFirst(signals, continuation)))
            }
            Signal::Event(Ok(Either::Right(value))) => {
                if let Some(violation) = after_terminal(&mut signals, true).await {
                    return Some((Signal::Violation(violation), ChainState::Done));
                }
                drop(signals);
                trace!("first process produced its result; running continuation");
                let next = continuation(value).signals();
                forward(next).await
            }
            Signal::Event(Err(error)) => Some((Signal::Event(Err(error)), ChainState::Failed(signals))),
            Signal::Violation(violation) => Some((Signal::Violation(violation), ChainState::Done)),
        },
        ChainState::Failed(mut signals) => after_terminal(&mut signals, false)
            .await
            .map(|violation| (Signal::Violation(violation), ChainState::Done)),
        ChainState::OnSecond(signals) => forward(signals).await,
        ChainState::Done => None,
    }
}

/// Waits for the input run to end, returning the violation if it does not.
async fn after_terminal<S, T, E>(signals: &mut SignalStream<S, T, E>, had_result: bool) -> Option<Violation> {
    let signal = signals.next().await?;
    let violation = signal.trailing(had_result);
    debug!(violation = violation.describe(), "chained input kept emitting after its terminal event");
    Some(violation)
}

async fn forward<S, T, U, E>(mut signals: SignalStream<S, U, E>) -> Option<(Signal<S, U, E>, ChainState<S, T, U, E>)> {
    let signal = signals.next().await?;
    Some((signal, ChainState::OnSecond(signals)))
}
