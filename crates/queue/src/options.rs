/// Options for configuring a [`crate::MessageQueue`].
#[derive(Clone, Debug)]
pub struct QueueOptions {
    /// Create a log on first group creation when it does not exist yet.
    /// When disabled, creating a group on a missing log fails with
    /// `NotFound`.
    pub auto_create_log: bool,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self {
            auto_create_log: true,
        }
    }
}
