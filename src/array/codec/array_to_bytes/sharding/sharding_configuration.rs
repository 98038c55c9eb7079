use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::{
    array::ChunkShape,
    metadata::{Metadata, MetadataConfiguration},
};

/// A wrapper to handle various versions of `sharding_indexed` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum ShardingCodecConfiguration {
    /// Version 1.0.
    V1(ShardingCodecConfigurationV1),
}

/// Configuration parameters for the `sharding_indexed` codec (version 1.0).
///
/// ### Example: inner chunks of shape `[1, 1]` compressed with gzip, and the default index codecs
/// ```rust
/// # let JSON = r#"
/// {
///     "chunk_shape": [1, 1],
///     "codecs": [
///         { "name": "bytes", "configuration": { "endian": "little" } },
///         { "name": "gzip", "configuration": { "level": 5 } }
///     ],
///     "index_codecs": [
///         { "name": "bytes", "configuration": { "endian": "little" } },
///         { "name": "crc32c" }
///     ],
///     "index_location": "end"
/// }
/// # "#;
/// # use zarrs_fixtures::array::codec::ShardingCodecConfigurationV1;
/// # let configuration: ShardingCodecConfigurationV1 = serde_json::from_str(JSON).unwrap();
/// ```
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ShardingCodecConfigurationV1 {
    /// The shape of the inner chunks in a shard along each dimension of the outer array.
    pub chunk_shape: ChunkShape,
    /// The codecs used to encode and decode inner chunks.
    pub codecs: Vec<Metadata>,
    /// The codecs used to encode and decode the shard index.
    #[serde(default = "default_index_codecs")]
    pub index_codecs: Vec<Metadata>,
    /// Specifies whether the shard index is located at the beginning or end of the file.
    #[serde(default)]
    pub index_location: ShardingIndexLocation,
}

impl ShardingCodecConfigurationV1 {
    /// Create a new `sharding_indexed` codec configuration.
    #[must_use]
    pub fn new(
        chunk_shape: ChunkShape,
        codecs: Vec<Metadata>,
        index_codecs: Vec<Metadata>,
        index_location: ShardingIndexLocation,
    ) -> Self {
        Self {
            chunk_shape,
            codecs,
            index_codecs,
            index_location,
        }
    }
}

/// The index codecs used when `index_codecs` is omitted: little endian `bytes` then `crc32c`.
fn default_index_codecs() -> Vec<Metadata> {
    let mut bytes_configuration = MetadataConfiguration::new();
    bytes_configuration.insert("endian".to_string(), "little".into());
    vec![
        Metadata::new_with_configuration("bytes", bytes_configuration),
        Metadata::new("crc32c"),
    ]
}

/// The location of the index of a shard.
#[derive(Serialize, Deserialize, Copy, Clone, Eq, PartialEq, Debug, Display, Default)]
#[serde(rename_all = "lowercase")]
pub enum ShardingIndexLocation {
    /// The index is at the start of the shard, before the inner chunks.
    #[display("start")]
    Start,
    /// The index is at the end of the shard, after the inner chunks.
    #[default]
    #[display("end")]
    End,
}
