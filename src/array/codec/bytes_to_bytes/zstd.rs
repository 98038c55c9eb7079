//! The `zstd` bytes to bytes codec.
//!
//! Applies [Zstandard](https://tools.ietf.org/html/rfc8878) compression.
//!
//! See <https://github.com/zarr-developers/zarr-specs/pull/256>.

mod zstd_codec;
mod zstd_configuration;

pub use zstd_codec::ZstdCodec;
pub use zstd_configuration::{
    ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel,
};
