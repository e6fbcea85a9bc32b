//! Issuance of durable product ids.
//!
//! Uniqueness comes entirely from the backing store's atomic
//! insert-and-return-key. Implementations must never derive an id from a
//! previously read value.

mod memory;
mod sqlite;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;

pub use memory::MemoryIdIssuer;
pub use sqlite::{IssuerOptions, SqliteIdIssuer};

use crate::error::IssuanceError;

/// A positive id, unique for the lifetime of its backing store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(i64);

impl ProductId {
    pub fn new(value: i64) -> Option<Self> {
        (value > 0).then_some(Self(value))
    }

    pub fn get(self) -> i64 {
        self.0
    }
}

impl fmt::Display for ProductId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[async_trait]
pub trait IdIssuer: Send + Sync {
    /// Mints a new id. `source_label` is stored for auditing only and never
    /// affects uniqueness.
    async fn issue(&self, source_label: &str) -> Result<ProductId, IssuanceError>;
}

#[async_trait]
impl<T: IdIssuer + ?Sized> IdIssuer for Arc<T> {
    async fn issue(&self, source_label: &str) -> Result<ProductId, IssuanceError> {
        (**self).issue(source_label).await
    }
}

#[async_trait]
impl<T: IdIssuer + ?Sized> IdIssuer for &T {
    async fn issue(&self, source_label: &str) -> Result<ProductId, IssuanceError> {
        (**self).issue(source_label).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_positive_values_are_ids() {
        assert_eq!(ProductId::new(1).map(ProductId::get), Some(1));
        assert_eq!(ProductId::new(0), None);
        assert_eq!(ProductId::new(-1), None);
        assert_eq!(ProductId::new(i64::MAX).unwrap().to_string(), i64::MAX.to_string());
    }

    #[tokio::test]
    async fn shared_issuers_delegate() {
        let issuer = Arc::new(MemoryIdIssuer::new());
        let by_ref = &issuer;
        assert_eq!(issuer.issue("jcrew").await.unwrap().get(), 1);
        assert_eq!(by_ref.issue("jcrew").await.unwrap().get(), 2);
    }
}
