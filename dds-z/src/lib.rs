//! Runtime bridge between managed record types and the native DDS
//! messaging engine: topic metadata, native descriptor construction,
//! ABI offset tables, and marshalling strategies. Wire encoding lives
//! in `dds-z-cdr`, descriptor extraction in `dds-z-codegen`.

pub mod abi;
pub mod descriptor;
pub mod marshal;
pub mod metadata;
pub mod registry;

pub use abi::{AbiError, AbiOffsets};
pub use descriptor::NativeDescriptor;
pub use marshal::Marshaller;
pub use metadata::{MetadataError, TopicHandle, TopicMetadata, TopicMetadataBuilder};

pub use dds_z_cdr as cdr;
pub use dds_z_codegen as codegen;
