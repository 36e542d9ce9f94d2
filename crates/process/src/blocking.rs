//! Awaiting process results from synchronous code.

use std::{error::Error as StdError, future::Future};

use anyhow::{Context, bail};
use tokio::{
    runtime::{Builder, Handle, RuntimeFlavor},
    task,
};

use crate::process::Process;

impl<S, T, E> Process<S, T, E>
where
    S: Send + 'static,
    T: Send + 'static,
    E: StdError + Send + Sync + 'static,
{
    /// Drives a run to its result from synchronous code.
    ///
    /// # Returns
    /// The run's result. A process failure keeps its own message; an
    /// invariant violation, or a runtime that cannot block, becomes an
    /// [`anyhow::Error`] describing it.
    ///
    /// # Notes
    /// - Inside a multi-threaded Tokio runtime the current worker blocks in place.
    /// - Outside any runtime a single-threaded runtime is built for the call.
    /// - Inside a current-thread runtime blocking would deadlock, so an error is returned.
    pub fn result_blocking(&self) -> anyhow::Result<T> {
        let process = self.clone();
        let outcome = block_on(async move { process.result().await })?;
        Ok(outcome?)
    }
}

fn block_on<F: Future>(future: F) -> anyhow::Result<F::Output> {
    match Handle::try_current() {
        Ok(handle) => {
            if matches!(handle.runtime_flavor(), RuntimeFlavor::CurrentThread) {
                bail!("cannot block on a process from inside a current-thread runtime");
            }
            Ok(task::block_in_place(|| handle.block_on(future)))
        }
        Err(_) => {
            let runtime = Builder::new_current_thread()
                .enable_all()
                .build()
                .context("failed to build a runtime for a blocking process")?;
            Ok(runtime.block_on(future))
        }
    }
}
