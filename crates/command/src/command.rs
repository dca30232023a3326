use crate::CommandResult;

use std::fmt::{Debug, Formatter};
use std::future::Future;

use futures::FutureExt;
use futures::future::BoxFuture;

/// Acknowledgment code the store replies with when a command succeeded.
pub const OK_REPLY: &str = "OK";

/// Interprets a store's string acknowledgment code as success.
#[must_use]
pub fn is_ok_reply(reply: &str) -> bool {
    reply.eq_ignore_ascii_case(OK_REPLY)
}

/// A single store operation together with the transform applied to its reply.
///
/// The transform is fused into the command when it is built, so every
/// execution path (blocking, callback, `async`) observes the same result for
/// the same reply.
pub struct Command<T> {
    name: &'static str,
    future: BoxFuture<'static, CommandResult<T>>,
}

impl<T> Command<T>
where
    T: Send + 'static,
{
    /// Creates a command from the remote call `op` and the `transform` to
    /// apply to its reply.
    pub fn new<F, R, M>(name: &'static str, op: F, transform: M) -> Self
    where
        F: Future<Output = CommandResult<R>> + Send + 'static,
        R: Send + 'static,
        M: FnOnce(R) -> CommandResult<T> + Send + 'static,
    {
        Self {
            name,
            future: async move { transform(op.await?) }.boxed(),
        }
    }

    /// Creates a command whose reply is already the result.
    pub fn from_future<F>(name: &'static str, op: F) -> Self
    where
        F: Future<Output = CommandResult<T>> + Send + 'static,
    {
        Self {
            name,
            future: op.boxed(),
        }
    }

    /// Appends a further transform.
    pub fn map<U, M>(self, transform: M) -> Command<U>
    where
        U: Send + 'static,
        M: FnOnce(T) -> CommandResult<U> + Send + 'static,
    {
        Command::new(self.name, self.future, transform)
    }

    /// The command name, used in logs and timeout errors.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn into_parts(self) -> (&'static str, BoxFuture<'static, CommandResult<T>>) {
        (self.name, self.future)
    }
}

impl<T> Debug for Command<T> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Command")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::Error;

    #[test]
    fn test_is_ok_reply() {
        assert!(is_ok_reply("OK"));
        assert!(is_ok_reply("ok"));
        assert!(!is_ok_reply("QUEUED"));
        assert!(!is_ok_reply(""));
    }

    #[tokio::test]
    async fn test_transform_applies_to_reply() {
        let command = Command::new("SET", async { Ok("OK".to_string()) }, |reply| {
            Ok(is_ok_reply(&reply))
        });
        let (name, future) = command.into_parts();

        assert_eq!(name, "SET");
        assert!(future.await.unwrap());
    }

    #[tokio::test]
    async fn test_transform_skipped_on_error() {
        let command: Command<bool> = Command::new(
            "SET",
            async { Err::<String, _>(Error::StoreUnavailable("down".to_string())) },
            |_reply| panic!("transform must not run on failure"),
        );
        let (_, future) = command.into_parts();

        assert!(matches!(future.await, Err(Error::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_map_chains_transforms() {
        let command = Command::from_future("XLEN", async { Ok(3_u64) }).map(|len| Ok(len * 2));
        let (_, future) = command.into_parts();

        assert_eq!(future.await.unwrap(), 6);
    }
}
