//! Process-wide topic metadata registry.
//!
//! Populated by generated registration code before first use, then only
//! read. Entries are leaked to `&'static` so lookups hand out references
//! without lifetime bookkeeping; metadata lives for the process anyway.

use std::any::TypeId;
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::sync::LazyLock;

use parking_lot::RwLock;
use tracing::debug;

use crate::metadata::{MetadataError, TopicMetadata};

static REGISTRY: LazyLock<RwLock<HashMap<TypeId, &'static TopicMetadata>>> =
    LazyLock::new(|| RwLock::new(HashMap::new()));

/// Register metadata for managed type `M`.
///
/// Registering the same managed type twice is refused; metadata is
/// immutable once published.
pub fn register<M: 'static>(
    metadata: TopicMetadata,
) -> Result<&'static TopicMetadata, MetadataError> {
    let mut map = REGISTRY.write();
    match map.entry(TypeId::of::<M>()) {
        Entry::Occupied(_) => Err(MetadataError::AlreadyRegistered(
            metadata.topic_name().to_string(),
        )),
        Entry::Vacant(slot) => {
            let leaked: &'static TopicMetadata = Box::leak(Box::new(metadata));
            debug!(topic = leaked.topic_name(), "registered topic metadata");
            slot.insert(leaked);
            Ok(leaked)
        }
    }
}

/// Look up the metadata registered for managed type `M`.
pub fn lookup<M: 'static>() -> Option<&'static TopicMetadata> {
    REGISTRY.read().get(&TypeId::of::<M>()).copied()
}
