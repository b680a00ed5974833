use crate::core::error::UnresolvedCard;
use crate::core::types::CardAttributes;
use async_trait::async_trait;

/// Exact-name card lookup against some card-data service.
#[async_trait]
pub trait CardResolver: Send + Sync + 'static {
    async fn resolve(&self, name: &str) -> Result<CardAttributes, UnresolvedCard>;
}
