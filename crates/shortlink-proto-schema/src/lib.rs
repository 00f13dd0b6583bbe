//! Protobuf contract of the shortlink gRPC service.

pub mod shortener {
    pub mod v1 {
        tonic::include_proto!("shortener.v1");
    }
}

pub mod v1 {
    pub use crate::shortener::v1::*;
}

/// Encoded descriptor set of every compiled proto file, served through gRPC
/// reflection.
pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("shortener_descriptor");
