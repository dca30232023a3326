use tokio::task::JoinHandle;
use tracing::error;

/// Handle to a command started with [`crate::Executor::execute_async`].
///
/// Dropping the handle detaches it; the command still runs to completion and
/// its continuation is still invoked.
#[derive(Debug)]
pub struct CommandHandle {
    name: &'static str,
    task: JoinHandle<()>,
}

impl CommandHandle {
    pub(crate) const fn new(name: &'static str, task: JoinHandle<()>) -> Self {
        Self { name, task }
    }

    /// The name of the command this handle tracks.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    /// Whether the command completed and its continuation returned.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.is_finished()
    }

    /// Waits until the continuation has run.
    pub async fn wait(self) {
        if let Err(e) = self.task.await {
            error!("continuation of {} failed: {e}", self.name);
        }
    }
}
