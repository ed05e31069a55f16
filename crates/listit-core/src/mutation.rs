use std::future::Future;

/// Outcome of an optimistic mutation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MutationResult<T, E> {
    /// The backend accepted the change; local state stays as applied.
    Committed(T),
    /// The backend rejected the change; local state has been reverted.
    RolledBack(E),
}

impl<T, E> MutationResult<T, E> {
    pub fn is_committed(&self) -> bool {
        matches!(self, Self::Committed(_))
    }

    pub fn into_result(self) -> Result<T, E> {
        match self {
            Self::Committed(v) => Ok(v),
            Self::RolledBack(e) => Err(e),
        }
    }
}

/// Apply a local change, run the remote call, and undo the change if the call
/// fails.
///
/// `apply` returns whatever `revert` needs to restore the prior state (usually
/// a snapshot of the record it touched). When `apply` returns `None` nothing
/// was changed and the remote call is skipped.
pub async fn optimistic<S, T, E, Fut>(
    apply: impl FnOnce() -> Option<S>,
    remote: impl FnOnce() -> Fut,
    revert: impl FnOnce(S),
) -> Option<MutationResult<T, E>>
where
    Fut: Future<Output = Result<T, E>>,
{
    let snapshot = apply()?;
    match remote().await {
        Ok(v) => Some(MutationResult::Committed(v)),
        Err(e) => {
            revert(snapshot);
            Some(MutationResult::RolledBack(e))
        }
    }
}

/// Run `primary`, then `follow_up` on its value.
///
/// The follow-up is best effort: its error comes back next to the primary
/// value instead of failing the call. A failed `primary` skips it.
pub async fn with_follow_up<T, U, E, E2, P, F, Fut>(
    primary: P,
    follow_up: F,
) -> Result<(T, Result<U, E2>), E>
where
    P: Future<Output = Result<T, E>>,
    F: FnOnce(&T) -> Fut,
    Fut: Future<Output = Result<U, E2>>,
{
    let value = primary.await?;
    let extra = follow_up(&value).await;
    Ok((value, extra))
}

/// Await `remote`, then run `cleanup` whatever it returned.
pub async fn settle_then<T, E, C>(
    remote: impl Future<Output = Result<T, E>>,
    cleanup: impl FnOnce() -> C,
) -> (Result<T, E>, C) {
    let outcome = remote.await;
    (outcome, cleanup())
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;

    use futures::executor::block_on;

    use super::*;

    #[test]
    fn failed_remote_call_reverts_local_state() {
        let state = RefCell::new(false);
        let result = block_on(optimistic(
            || {
                let prior = *state.borrow();
                *state.borrow_mut() = !prior;
                Some(prior)
            },
            || async { Err::<(), _>("network down") },
            |prior| *state.borrow_mut() = prior,
        ));
        assert_eq!(result, Some(MutationResult::RolledBack("network down")));
        assert!(!*state.borrow());
    }

    #[test]
    fn successful_remote_call_keeps_local_state() {
        let state = RefCell::new(false);
        let result = block_on(optimistic(
            || {
                *state.borrow_mut() = true;
                Some(false)
            },
            || async { Ok::<_, String>(7) },
            |prior| *state.borrow_mut() = prior,
        ));
        assert!(result.as_ref().is_some_and(MutationResult::is_committed));
        assert_eq!(result.unwrap().into_result(), Ok(7));
        assert!(*state.borrow());
    }

    #[test]
    fn nothing_applied_skips_remote() {
        let called = RefCell::new(false);
        let result: Option<MutationResult<(), ()>> = block_on(optimistic(
            || None::<()>,
            || {
                *called.borrow_mut() = true;
                async { Ok(()) }
            },
            |_| {},
        ));
        assert!(result.is_none());
        assert!(!*called.borrow());
    }

    #[test]
    fn failed_follow_up_keeps_primary_value() {
        let result = block_on(with_follow_up(
            async { Ok::<_, &str>("list-1".to_string()) },
            |id: &String| {
                let id = id.clone();
                async move { Err::<(), _>(format!("no collection for {id}")) }
            },
        ));
        let (id, general) = result.unwrap();
        assert_eq!(id, "list-1");
        assert_eq!(general, Err("no collection for list-1".to_string()));
    }

    #[test]
    fn failed_primary_skips_follow_up() {
        let called = RefCell::new(false);
        let result = block_on(with_follow_up(
            async { Err::<String, _>("insert refused") },
            |_: &String| {
                *called.borrow_mut() = true;
                async { Ok::<(), ()>(()) }
            },
        ));
        assert_eq!(result, Err("insert refused"));
        assert!(!*called.borrow());
    }

    #[test]
    fn cleanup_runs_after_failed_remote() {
        let cleared = RefCell::new(0);
        let (outcome, removed) = block_on(settle_then(
            async { Err::<(), _>("sign-out endpoint down") },
            || {
                *cleared.borrow_mut() += 1;
                3
            },
        ));
        assert_eq!(outcome, Err("sign-out endpoint down"));
        assert_eq!(removed, 3);
        assert_eq!(*cleared.borrow(), 1);
    }

    #[test]
    fn cleanup_runs_after_successful_remote() {
        let (outcome, removed) = block_on(settle_then(async { Ok::<_, ()>(()) }, || 0));
        assert!(outcome.is_ok());
        assert_eq!(removed, 0);
    }
}
