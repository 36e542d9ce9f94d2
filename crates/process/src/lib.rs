//! # Buckaroo Process
//!
//! The execution core shared by every Buckaroo routine. Loading the
//! configuration, resolving dependencies, downloading recipes and installing,
//! upgrading or uninstalling packages are all expressed as a [`Process`]: a
//! cold computation that reports progress states and finishes with one
//! result or a failure.
//!
//! ## Key Features
//!
//! - **Two-armed values**: [`Either`] carries "error or value" from adapters and
//!   tags process events as progress (left) or result (right)
//! - **Cold processes**: nothing runs until a process is driven, and every drive
//!   is an independent run
//! - **Chaining**: [`chain`] splices the states of consecutive steps into one
//!   stream and stops at the first failure
//! - **Explicit execution**: drive on any executor, spawn on a supplied Tokio
//!   [`Handle`](tokio::runtime::Handle), or block from synchronous code
//!
//! ## Usage
//!
//! ```rust
//! use buckaroo_process::{Either, Process, ResultError, chain};
//!
//! #[derive(Debug, Clone, PartialEq)]
//! enum Progress {
//!     Reading(String),
//!     Parsing,
//! }
//!
//! fn read_file(path: &str) -> Process<Progress, String, String> {
//!     let contents: Either<String, String> = Either::Right(r#"{"cookBooks":[]}"#.to_string());
//!     Process::just_with_states(contents, [Progress::Reading(path.to_string())])
//!         .chain(Process::from_either)
//! }
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let load = chain(read_file("/home/x/.buckaroo/config"), |text| {
//!     Process::just_with_states(text.len(), [Progress::Parsing])
//! });
//!
//! let mut progress = Vec::new();
//! let length = load.drive(|state| progress.push(state)).await;
//! assert_eq!(length, Ok(16));
//! assert_eq!(progress, vec![Progress::Reading("/home/x/.buckaroo/config".into()), Progress::Parsing]);
//!
//! let missing: Process<Progress, String, String> = Process::error("not found".into());
//! assert_eq!(missing.result().await, Err(ResultError::Failed("not found".to_string())));
//! # });
//! ```
//!
//! ## Architecture
//!
//! - **`either`**: the [`Either`] value type
//! - **`process`**: [`Process`] construction, projections and mapping
//! - **`chain`**: the sequencing state machine behind [`chain`] and [`Process::chain`]
//! - **`task`**: [`ProcessTask`], a run spawned onto a Tokio runtime
//! - **`blocking`**: [`Process::result_blocking`] for synchronous callers
//! - **`options`**: [`SpawnOptions`] and their environment override

mod blocking;
mod chain;
pub mod either;
pub mod error;
pub mod options;
pub mod process;
pub mod task;

pub use either::Either;
pub use error::ResultError;
pub use options::{DEFAULT_PROCESS_BUFFER, PROCESS_BUFFER_ENV, SpawnOptions};
pub use process::{Event, EventStream, Process, chain};
pub use task::ProcessTask;
