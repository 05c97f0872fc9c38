//! Transactional boundary around one transition.

use crate::callbacks::Outcome;
use crate::persistence::{Record, TransactionError};

/// Run `block` inside a transaction on `subject`, committing when it
/// succeeds and rolling back otherwise.
///
/// With `enabled == false` the block runs directly and nothing is undone on
/// failure.
pub(crate) fn with_transaction<T, F>(
    subject: &mut T,
    enabled: bool,
    block: F,
) -> Result<Outcome, TransactionError>
where
    T: Record,
    F: FnOnce(&mut T) -> Outcome,
{
    if !enabled {
        return Ok(block(subject));
    }

    subject.begin_transaction()?;
    let outcome = block(subject);

    if outcome.is_success() {
        if let Err(error) = subject.commit_transaction() {
            if let Err(rollback) = subject.rollback_transaction() {
                tracing::warn!(%rollback, "rollback after failed commit also failed");
            }
            return Err(error);
        }
    } else {
        subject.rollback_transaction()?;
        tracing::debug!(outcome = outcome.label(), "transaction rolled back");
    }

    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::callbacks::CallbackError;
    use crate::persistence::{MemoryRecord, MemoryStore};
    use serde_json::json;

    fn record() -> MemoryRecord {
        MemoryRecord::new("vehicles/1", MemoryStore::shared())
    }

    #[test]
    fn success_commits() {
        let mut subject = record();
        let outcome = with_transaction(&mut subject, true, |s| {
            s.store().put("audit/1", json!("ignite"));
            Outcome::Succeeded
        })
        .unwrap();

        assert!(outcome.is_success());
        assert_eq!(subject.store().depth(), 0);
        assert_eq!(subject.store().get("audit/1"), Some(json!("ignite")));
    }

    #[test]
    fn failure_rolls_back() {
        let mut subject = record();
        for failing in [
            Outcome::Halted,
            Outcome::ActionFailed,
            Outcome::Aborted(CallbackError::Rollback),
        ] {
            let outcome = with_transaction(&mut subject, true, |s| {
                s.store().put("audit/1", json!("ignite"));
                failing
            })
            .unwrap();

            assert!(!outcome.is_success());
            assert!(subject.store().is_empty());
            assert_eq!(subject.store().depth(), 0);
        }
    }

    #[test]
    fn disabled_boundary_keeps_partial_writes() {
        let mut subject = record();
        let outcome = with_transaction(&mut subject, false, |s| {
            s.store().put("audit/1", json!("ignite"));
            Outcome::Halted
        })
        .unwrap();

        assert!(matches!(outcome, Outcome::Halted));
        assert_eq!(subject.store().len(), 1);
    }

    #[test]
    fn commit_failures_surface() {
        let mut subject = record();
        let result = with_transaction(&mut subject, true, |s| {
            // Close the boundary early so the commit has nothing to close.
            s.store().commit().unwrap();
            Outcome::Succeeded
        });

        assert_eq!(result.unwrap_err(), TransactionError::NotOpen);
    }
}
