//! The catalog metadata collaborator.

use async_trait::async_trait;

use pulse_primitives::EntityId;
use pulse_scoring::EntityMeta;

/// Why a metadata fetch failed. A boost never waits on, or fails because
/// of, the catalog.
#[derive(Debug, thiserror::Error)]
pub enum MetadataError {
    /// The catalog could not serve the entity right now.
    #[error("metadata unavailable for {entity}: {reason}")]
    Unavailable { entity: EntityId, reason: String },
}

/// Source of denormalized entity metadata (name, image, region), consulted
/// once per entity when it is first boosted.
#[async_trait]
pub trait MetadataSource: Send + Sync {
    /// Fetch the metadata snapshot for an entity.
    async fn fetch(&self, entity: EntityId) -> Result<EntityMeta, MetadataError>;
}
