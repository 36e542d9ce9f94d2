//! Settings for processes spawned onto a runtime.
//!
//! The only knob today is the capacity of the event channel between a spawned
//! run and its [`ProcessTask`](crate::ProcessTask). A full channel makes the
//! run wait for the consumer.

use std::env;

use tracing::warn;

/// Environment variable allowing callers to override the event buffer size.
pub const PROCESS_BUFFER_ENV: &str = "BUCKAROO_PROCESS_BUFFER";

/// Default number of events buffered between a spawned run and its consumer.
pub const DEFAULT_PROCESS_BUFFER: usize = 64;

/// Options applied by [`Process::spawn_with`](crate::Process::spawn_with).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SpawnOptions {
    buffer: usize,
}

impl Default for SpawnOptions {
    fn default() -> Self {
        Self {
            buffer: DEFAULT_PROCESS_BUFFER,
        }
    }
}

impl SpawnOptions {
    /// Options with an explicit event buffer size. Zero is raised to one.
    pub fn with_buffer(buffer: usize) -> Self {
        Self { buffer: buffer.max(1) }
    }

    /// Reads options from the environment, falling back to defaults.
    pub fn from_env() -> Self {
        match env::var(PROCESS_BUFFER_ENV) {
            Ok(raw) => parse_buffer(&raw),
            Err(_) => Self::default(),
        }
    }

    /// Capacity of the event channel.
    pub fn buffer(&self) -> usize {
        self.buffer
    }
}

fn parse_buffer(raw: &str) -> SpawnOptions {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return SpawnOptions::default();
    }
    match trimmed.parse::<usize>() {
        Ok(0) => SpawnOptions::default(),
        Ok(buffer) => SpawnOptions::with_buffer(buffer),
        Err(error) => {
            warn!(
                variable = PROCESS_BUFFER_ENV,
                value = %trimmed,
                error = %error,
                "Invalid process buffer size; using default"
            );
            SpawnOptions::default()
        }
    }
}
