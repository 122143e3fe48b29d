//! Generated protobuf/gRPC types for the control protocol the proxy speaks
//! to this runtime, plus conversions to the in-process types in
//! `statefun-core` and `statefun-any`.

pub mod convert;

pub mod proto {
    tonic::include_proto!("statefun.v1");
    pub const FILE_DESCRIPTOR_SET: &[u8] = tonic::include_file_descriptor_set!("statefun_descriptor");
}
