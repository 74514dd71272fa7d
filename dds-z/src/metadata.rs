//! Topic metadata: the build-time binding between a managed type, its
//! native counterpart, and the descriptor the messaging engine consumes.

use std::any::TypeId;

use dds_z_codegen::extractor::DescriptorData;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum MetadataError {
    #[error("topic name must not be empty")]
    EmptyTopicName,

    #[error("declared type name {declared:?} does not match descriptor type name {descriptor:?}")]
    TypeNameMismatch { declared: String, descriptor: String },

    #[error("metadata already registered for managed type of topic {0:?}")]
    AlreadyRegistered(String),
}

/// Opaque handle to a native topic resource. Zero means unbound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TopicHandle(pub isize);

impl TopicHandle {
    pub const NIL: TopicHandle = TopicHandle(0);

    pub fn is_nil(self) -> bool {
        self.0 == 0
    }
}

/// Immutable identity and layout record for one topic type.
///
/// Constructed once at build time through [`TopicMetadata::builder`] and
/// shared read-only for the process lifetime.
#[derive(Debug, Clone)]
pub struct TopicMetadata {
    topic_name: String,
    type_name: String,
    managed_type: TypeId,
    native_type: TypeId,
    marshaller_type: Option<TypeId>,
    key_field_indices: Vec<usize>,
    descriptor: Option<String>,
    topic_descriptor: Option<DescriptorData>,
    builtin_topic_handle: TopicHandle,
}

impl TopicMetadata {
    /// Start building metadata for managed type `M` with native
    /// counterpart `N`.
    pub fn builder<M: 'static, N: 'static>(
        topic_name: impl Into<String>,
    ) -> TopicMetadataBuilder {
        TopicMetadataBuilder {
            topic_name: topic_name.into(),
            type_name: String::new(),
            managed_type: TypeId::of::<M>(),
            native_type: TypeId::of::<N>(),
            marshaller_type: None,
            key_field_indices: Vec::new(),
            descriptor: None,
            topic_descriptor: None,
            builtin_topic_handle: TopicHandle::NIL,
        }
    }

    pub fn topic_name(&self) -> &str {
        &self.topic_name
    }

    /// Fully qualified type identity as known to the wire protocol.
    /// Empty when unset.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    pub fn managed_type(&self) -> TypeId {
        self.managed_type
    }

    pub fn native_type(&self) -> TypeId {
        self.native_type
    }

    /// Identity of the marshalling strategy, absent when the type has no
    /// native counterpart needing conversion.
    pub fn marshaller_type(&self) -> Option<TypeId> {
        self.marshaller_type
    }

    /// Positions of the fields jointly forming the instance key.
    ///
    /// The order is the one the peer's key hashing expects. Two peers
    /// with different orders for the same type silently disagree about
    /// instance identity; no runtime check can catch that.
    pub fn key_field_indices(&self) -> &[usize] {
        &self.key_field_indices
    }

    /// Raw descriptor text, when the build kept it.
    pub fn descriptor(&self) -> Option<&str> {
        self.descriptor.as_deref()
    }

    /// Parsed native descriptor, when extraction ran for this type.
    pub fn topic_descriptor(&self) -> Option<&DescriptorData> {
        self.topic_descriptor.as_ref()
    }

    pub fn builtin_topic_handle(&self) -> TopicHandle {
        self.builtin_topic_handle
    }
}

/// Builder validating the cross-field invariants of [`TopicMetadata`].
pub struct TopicMetadataBuilder {
    topic_name: String,
    type_name: String,
    managed_type: TypeId,
    native_type: TypeId,
    marshaller_type: Option<TypeId>,
    key_field_indices: Vec<usize>,
    descriptor: Option<String>,
    topic_descriptor: Option<DescriptorData>,
    builtin_topic_handle: TopicHandle,
}

impl TopicMetadataBuilder {
    pub fn type_name(mut self, type_name: impl Into<String>) -> Self {
        self.type_name = type_name.into();
        self
    }

    /// Record the marshalling strategy type for this topic.
    pub fn marshaller<S: 'static>(mut self) -> Self {
        self.marshaller_type = Some(TypeId::of::<S>());
        self
    }

    pub fn key_field_indices(mut self, indices: impl Into<Vec<usize>>) -> Self {
        self.key_field_indices = indices.into();
        self
    }

    pub fn descriptor(mut self, descriptor: impl Into<String>) -> Self {
        self.descriptor = Some(descriptor.into());
        self
    }

    pub fn topic_descriptor(mut self, data: DescriptorData) -> Self {
        self.topic_descriptor = Some(data);
        self
    }

    pub fn builtin_topic_handle(mut self, handle: TopicHandle) -> Self {
        self.builtin_topic_handle = handle;
        self
    }

    /// Validate and freeze the metadata.
    ///
    /// The topic name must be non-empty, and a present parsed descriptor
    /// must agree with a non-empty declared type name.
    pub fn build(self) -> Result<TopicMetadata, MetadataError> {
        if self.topic_name.is_empty() {
            return Err(MetadataError::EmptyTopicName);
        }
        if let Some(desc) = &self.topic_descriptor
            && !self.type_name.is_empty()
            && !desc.type_name.is_empty()
            && desc.type_name != self.type_name
        {
            return Err(MetadataError::TypeNameMismatch {
                declared: self.type_name.clone(),
                descriptor: desc.type_name.clone(),
            });
        }
        Ok(TopicMetadata {
            topic_name: self.topic_name,
            type_name: self.type_name,
            managed_type: self.managed_type,
            native_type: self.native_type,
            marshaller_type: self.marshaller_type,
            key_field_indices: self.key_field_indices,
            descriptor: self.descriptor,
            topic_descriptor: self.topic_descriptor,
            builtin_topic_handle: self.builtin_topic_handle,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Managed;
    struct Native;

    #[test]
    fn builds_minimal_metadata() {
        let meta = TopicMetadata::builder::<Managed, Native>("rt/app_id")
            .type_name("Net::AppId")
            .build()
            .unwrap();
        assert_eq!(meta.topic_name(), "rt/app_id");
        assert_eq!(meta.type_name(), "Net::AppId");
        assert_eq!(meta.managed_type(), TypeId::of::<Managed>());
        assert!(meta.marshaller_type().is_none());
        assert!(meta.key_field_indices().is_empty());
        assert!(meta.builtin_topic_handle().is_nil());
    }

    struct SampleMarshaller;

    #[test]
    fn marshaller_identity_recorded() {
        let meta = TopicMetadata::builder::<Managed, Native>("rt/app_id")
            .marshaller::<SampleMarshaller>()
            .build()
            .unwrap();
        assert_eq!(meta.marshaller_type(), Some(TypeId::of::<SampleMarshaller>()));
    }

    #[test]
    fn empty_topic_name_rejected() {
        let err = TopicMetadata::builder::<Managed, Native>("")
            .build()
            .unwrap_err();
        assert!(matches!(err, MetadataError::EmptyTopicName));
    }

    #[test]
    fn descriptor_type_name_must_match() {
        let desc = DescriptorData {
            type_name: "Net::AppId".to_string(),
            ..DescriptorData::default()
        };
        let err = TopicMetadata::builder::<Managed, Native>("rt/app_id")
            .type_name("Net::Other")
            .topic_descriptor(desc)
            .build()
            .unwrap_err();
        assert!(matches!(err, MetadataError::TypeNameMismatch { .. }));
    }

    #[test]
    fn empty_declared_type_name_accepts_any_descriptor() {
        let desc = DescriptorData {
            type_name: "Net::AppId".to_string(),
            ..DescriptorData::default()
        };
        let meta = TopicMetadata::builder::<Managed, Native>("rt/app_id")
            .topic_descriptor(desc)
            .build()
            .unwrap();
        assert_eq!(meta.topic_descriptor().unwrap().type_name, "Net::AppId");
    }

    #[test]
    fn key_field_order_is_preserved() {
        let meta = TopicMetadata::builder::<Managed, Native>("rt/keyed")
            .key_field_indices(vec![3, 0, 2])
            .build()
            .unwrap();
        assert_eq!(meta.key_field_indices(), &[3, 0, 2]);
    }
}
