//! Uniform blocking and non-blocking execution of store commands.
//!
//! Every store operation is expressed as a [`Command`]: the remote call plus
//! the transform applied to its reply. An [`Executor`] runs a command either
//! blocking the caller ([`Executor::execute`]), handing the result to a
//! continuation ([`Executor::execute_async`]), or as a plain future
//! ([`Executor::call`]). The three forms share timeout handling and error
//! mapping.
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]

mod command;
mod error;
mod executor;
mod handle;

pub use command::{Command, OK_REPLY, is_ok_reply};
pub use error::{CommandResult, Error, ErrorKind};
pub use executor::{Executor, ExecutorOptions};
pub use handle::CommandHandle;
