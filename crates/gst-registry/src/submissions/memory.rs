use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;

use super::{StoreError, Submission, SubmissionStore};
use crate::config::StoreBackend;
use crate::gstin::Gstin;

/// Process-local store for tests and throwaway deployments.
#[derive(Debug, Default, Clone)]
pub struct InMemorySubmissionStore {
    records: Arc<Mutex<BTreeMap<Gstin, Submission>>>,
}

impl InMemorySubmissionStore {
    fn records(&self) -> Result<MutexGuard<'_, BTreeMap<Gstin, Submission>>, StoreError> {
        self.records
            .lock()
            .map_err(|_| StoreError::Unavailable("submission map mutex poisoned".to_string()))
    }

    pub fn len(&self) -> usize {
        self.records().map(|records| records.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl SubmissionStore for InMemorySubmissionStore {
    fn backend(&self) -> StoreBackend {
        StoreBackend::Memory
    }

    async fn insert(&self, submission: Submission) -> Result<Gstin, StoreError> {
        let mut records = self.records()?;
        match records.entry(submission.gstn.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => {
                let key = submission.gstn.clone();
                slot.insert(submission);
                Ok(key)
            }
        }
    }

    async fn fetch(&self, gstn: &Gstin) -> Result<Option<Submission>, StoreError> {
        Ok(self.records()?.get(gstn).cloned())
    }

    async fn healthcheck(&self) -> Result<(), StoreError> {
        self.records().map(|_| ())
    }

    async fn migrate(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::submissions::fixtures::submission;

    #[tokio::test]
    async fn rejects_second_insert_for_same_key() {
        let store = InMemorySubmissionStore::default();
        store
            .insert(submission("27AAAAA0000A1Z5", "Jane"))
            .await
            .expect("first insert");

        assert_eq!(
            store.insert(submission("27AAAAA0000A1Z5", "John")).await,
            Err(StoreError::Duplicate)
        );
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn concurrent_inserts_have_one_winner() {
        let store = InMemorySubmissionStore::default();
        let handles: Vec<_> = (0..8)
            .map(|attempt| {
                let store = store.clone();
                tokio::spawn(async move {
                    store
                        .insert(submission("29ABCDE1234F1ZW", &format!("caller-{attempt}")))
                        .await
                })
            })
            .collect();

        let mut winners = 0;
        for handle in handles {
            match handle.await.expect("task joins") {
                Ok(_) => winners += 1,
                Err(StoreError::Duplicate) => {}
                Err(other) => panic!("unexpected store error {other:?}"),
            }
        }
        assert_eq!(winners, 1);
        assert_eq!(store.len(), 1);
    }
}
