use crate::{Command, CommandHandle, CommandResult, Error};

use std::fmt::{Debug, Formatter};
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;

use futures::FutureExt;
use futures::future::BoxFuture;
use tokio::runtime::{Builder, Handle, Runtime};
use tokio::sync::oneshot;
use tracing::{debug, error, warn};

/// Options for configuring an [`Executor`].
#[derive(Clone, Debug)]
pub struct ExecutorOptions {
    /// Deadline applied to every command.
    pub timeout: Duration,

    /// Worker threads of the executor's own runtime. Continuations of
    /// callback-style commands run on these threads.
    pub worker_threads: usize,

    /// Name given to the worker threads.
    pub thread_name: String,
}

impl Default for ExecutorOptions {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(5),
            worker_threads: 2,
            thread_name: "streamq-command".to_string(),
        }
    }
}

/// Runs commands in blocking, callback, or `async` form.
///
/// All three forms share one code path: the command's future (which already
/// carries its reply transform) is raced against the configured timeout, and
/// panics are reported as [`Error::Unknown`].
#[derive(Clone)]
pub struct Executor {
    handle: Handle,
    // Keeps an owned runtime alive for as long as any clone exists.
    runtime: Option<Arc<OwnedRuntime>>,
    timeout: Duration,
}

// Shuts down without blocking, so the last clone may also be dropped on one
// of the runtime's own worker threads.
struct OwnedRuntime(Option<Runtime>);

impl Drop for OwnedRuntime {
    fn drop(&mut self) {
        if let Some(runtime) = self.0.take() {
            debug!("shutting down executor runtime");
            runtime.shutdown_background();
        }
    }
}

impl Executor {
    /// Creates an executor backed by its own multi-threaded runtime.
    ///
    /// Dropping the last clone shuts the runtime down without waiting;
    /// commands still in flight at that point are abandoned.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime could not be built.
    pub fn new(options: ExecutorOptions) -> std::io::Result<Self> {
        let runtime = Builder::new_multi_thread()
            .worker_threads(options.worker_threads.max(1))
            .thread_name(options.thread_name)
            .enable_all()
            .build()?;

        Ok(Self {
            handle: runtime.handle().clone(),
            runtime: Some(Arc::new(OwnedRuntime(Some(runtime)))),
            timeout: options.timeout,
        })
    }

    /// Creates an executor that spawns onto an existing runtime.
    #[must_use]
    pub const fn with_handle(handle: Handle, timeout: Duration) -> Self {
        Self {
            handle,
            runtime: None,
            timeout,
        }
    }

    /// The deadline applied to every command.
    #[must_use]
    pub const fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Runs the command and waits for its result.
    ///
    /// # Panics
    ///
    /// Panics if called from within an async context; use [`Executor::call`]
    /// there instead.
    ///
    /// # Errors
    ///
    /// Returns the command's error, or [`Error::Timeout`] if it did not
    /// complete within the deadline.
    pub fn execute<T>(&self, command: Command<T>) -> CommandResult<T>
    where
        T: Send + 'static,
    {
        let (name, future) = command.into_parts();
        let (sender, receiver) = oneshot::channel();
        let timeout = self.timeout;

        self.handle.spawn(async move {
            let _ = sender.send(run(name, future, timeout).await);
        });

        receiver
            .blocking_recv()
            .unwrap_or_else(|_| Err(Error::Unknown(format!("{name} was dropped by the runtime"))))
    }

    /// Starts the command and returns immediately.
    ///
    /// `on_complete` runs exactly once, on an executor thread, after the
    /// command finished or timed out. It should not block.
    pub fn execute_async<T, C>(&self, command: Command<T>, on_complete: C) -> CommandHandle
    where
        T: Send + 'static,
        C: FnOnce(CommandResult<T>) + Send + 'static,
    {
        let (name, future) = command.into_parts();
        let timeout = self.timeout;

        let task = self.handle.spawn(async move {
            on_complete(run(name, future, timeout).await);
        });

        CommandHandle::new(name, task)
    }

    /// Runs the command from within an async context.
    ///
    /// # Errors
    ///
    /// Same as [`Executor::execute`].
    pub async fn call<T>(&self, command: Command<T>) -> CommandResult<T>
    where
        T: Send + 'static,
    {
        let (name, future) = command.into_parts();
        run(name, future, self.timeout).await
    }
}

impl Debug for Executor {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("owns_runtime", &self.runtime.is_some())
            .field("timeout", &self.timeout)
            .finish_non_exhaustive()
    }
}

async fn run<T>(
    name: &'static str,
    future: BoxFuture<'static, CommandResult<T>>,
    timeout: Duration,
) -> CommandResult<T> {
    match tokio::time::timeout(timeout, AssertUnwindSafe(future).catch_unwind()).await {
        Ok(Ok(result)) => {
            if let Err(e) = &result {
                debug!("{name} failed: {e}");
            }
            result
        }
        Ok(Err(_)) => {
            error!("{name} panicked");
            Err(Error::Unknown(format!("{name} panicked")))
        }
        Err(_) => {
            warn!("{name} timed out after {timeout:?}");
            Err(Error::Timeout {
                command: name,
                elapsed: timeout,
            })
        }
    }
}
