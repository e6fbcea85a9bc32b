use std::sync::atomic::{AtomicI64, Ordering};

use async_trait::async_trait;

use super::{IdIssuer, ProductId};
use crate::error::IssuanceError;

/// Process-local counter. Ids are not durable and restart at 1; suitable for
/// dry runs and tests only.
#[derive(Debug, Default)]
pub struct MemoryIdIssuer {
    last: AtomicI64,
}

impl MemoryIdIssuer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of ids handed out so far.
    pub fn issued(&self) -> i64 {
        self.last.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl IdIssuer for MemoryIdIssuer {
    async fn issue(&self, _source_label: &str) -> Result<ProductId, IssuanceError> {
        let value = self.last.fetch_add(1, Ordering::SeqCst) + 1;
        ProductId::new(value).ok_or(IssuanceError::InvalidKey(value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_ids_are_distinct() {
        let issuer = Arc::new(MemoryIdIssuer::new());
        let handles: Vec<_> = (0..64)
            .map(|_| {
                let issuer = issuer.clone();
                tokio::spawn(async move { issuer.issue("jcrew").await.unwrap() })
            })
            .collect();

        let mut ids = HashSet::new();
        for handle in handles {
            assert!(ids.insert(handle.await.unwrap()));
        }
        assert_eq!(ids.len(), 64);
        assert_eq!(issuer.issued(), 64);
    }
}
