mod ops;
mod paths;

pub use ops::*;
pub use paths::*;

use serde::de::DeserializeOwned;
use std::future::Future;
use tracing::warn;

use crate::{traits::DocumentStore, Status};

/// Reads a document that must exist.
pub async fn read_or_not_found<S, D>(store: &S, path: &DocPath) -> Result<Versioned<D>, Status>
where
    S: DocumentStore,
    D: DeserializeOwned + Send,
{
    match store.read(path).await? {
        Some(versioned) => Ok(versioned),
        None => Err(Status::not_found(format!(
            "Document '{path}' was not found"
        ))),
    }
}

/// Runs an optimistic read-modify-write operation, repeating it while its
/// commit is aborted by a concurrent writer.
pub async fn retry_on_abort<T, F, Fut>(label: &str, mut op: F) -> Result<T, Status>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, Status>>,
{
    let mut attempt = 1;
    loop {
        match op().await {
            Err(Status::Aborted(msg)) if attempt < MAX_COMMIT_ATTEMPTS => {
                warn!("{label}: commit attempt {attempt} aborted: {msg}");
                attempt += 1;
            }
            result => return result,
        }
    }
}

pub const MAX_COMMIT_ATTEMPTS: usize = 5;

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test]
    async fn retry_until_commit_succeeds() {
        let calls = AtomicUsize::new(0);
        let result = retry_on_abort("test", || async {
            match calls.fetch_add(1, Ordering::SeqCst) {
                0 | 1 => Err(Status::aborted("lost race")),
                n => Ok(n),
            }
        })
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn retry_gives_up_after_max_attempts() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), Status> = retry_on_abort("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Status::aborted("lost race"))
        })
        .await;

        assert!(matches!(result, Err(Status::Aborted(_))));
        assert_eq!(calls.load(Ordering::SeqCst), MAX_COMMIT_ATTEMPTS);
    }

    #[tokio::test]
    async fn other_errors_are_not_retried() {
        let calls = AtomicUsize::new(0);
        let result: Result<(), Status> = retry_on_abort("test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(Status::not_found("gone"))
        })
        .await;

        assert!(matches!(result, Err(Status::NotFound(_))));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
