//! Remote-then-local mutation helper.
//!
//! Whenever a local change must only happen after a collaborator confirmed it
//! (game tier releasing a seat, registrar dropping an entry), go through
//! [`confirm_then_apply`]. Local state stays untouched when confirmation fails.

use std::future::Future;

/// Await `confirm`; only if it succeeds run `apply` and return its value.
///
/// # Arguments
///
/// * `confirm` - Remote confirmation
/// * `apply` - Local mutation, run at most once and only after success
///
/// # Returns
///
/// * `Result<T, E>` - `apply`'s value, or the confirmation error untouched
pub async fn confirm_then_apply<C, A, F, T, E>(confirm: C, apply: A) -> Result<T, E>
where
    C: Future<Output = Result<(), E>>,
    A: FnOnce() -> F,
    F: Future<Output = T>,
{
    confirm.await?;
    Ok(apply().await)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::{Arc, Mutex};

    #[tokio::test]
    async fn test_apply_runs_after_confirmation() {
        let log = Arc::new(Mutex::new(Vec::new()));

        let confirm_log = log.clone();
        let apply_log = log.clone();
        let result: Result<usize, String> = confirm_then_apply(
            async move {
                confirm_log.lock().unwrap().push("confirm");
                Ok(())
            },
            move || async move {
                apply_log.lock().unwrap().push("apply");
                2
            },
        )
        .await;

        assert_eq!(result, Ok(2));
        assert_eq!(*log.lock().unwrap(), vec!["confirm", "apply"]);
    }

    #[tokio::test]
    async fn test_apply_skipped_on_failure() {
        let applied = Arc::new(Mutex::new(false));
        let flag = applied.clone();

        let result: Result<(), &str> = confirm_then_apply(async { Err("rejected") }, move || async move {
            *flag.lock().unwrap() = true;
        })
        .await;

        assert_eq!(result, Err("rejected"));
        assert!(!*applied.lock().unwrap());
    }
}
