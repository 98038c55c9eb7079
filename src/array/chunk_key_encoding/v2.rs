//! The `v2` chunk key encoding.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
    storage::StoreKey,
};

use super::{
    configuration_metadata, join_indices, ChunkKeyEncoding, ChunkKeyEncodingPlugin,
    ChunkKeyEncodingTraits, ChunkKeySeparator,
};

/// The identifier for the `v2` chunk key encoding.
pub const IDENTIFIER: &str = "v2";

inventory::submit! {
    ChunkKeyEncodingPlugin::new(IDENTIFIER, create_chunk_key_encoding_v2)
}

fn create_chunk_key_encoding_v2(metadata: &Metadata) -> Result<ChunkKeyEncoding, PluginCreateError> {
    let configuration: V2ChunkKeyEncodingConfiguration =
        metadata.to_configuration().map_err(|_| {
            PluginMetadataInvalidError::new(IDENTIFIER, "chunk key encoding", metadata.clone())
        })?;
    Ok(V2ChunkKeyEncoding::new(configuration.separator).into())
}

/// A `v2` chunk key encoding configuration.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct V2ChunkKeyEncodingConfiguration {
    /// The chunk key separator. Defaults to `.`.
    #[serde(default = "v2_separator")]
    pub separator: ChunkKeySeparator,
}

const fn v2_separator() -> ChunkKeySeparator {
    ChunkKeySeparator::Dot
}

/// A `v2` chunk key encoding.
///
/// The key is the decimal chunk index along each dimension joined by the separator.
/// A zero-dimensional array has the single chunk key `0`.
#[derive(Debug, Clone)]
pub struct V2ChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl V2ChunkKeyEncoding {
    /// Create a new `v2` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Create a new `v2` chunk key encoding with separator `.`.
    #[must_use]
    pub const fn new_dot() -> Self {
        Self::new(ChunkKeySeparator::Dot)
    }

    /// Create a new `v2` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn new_slash() -> Self {
        Self::new(ChunkKeySeparator::Slash)
    }
}

impl Default for V2ChunkKeyEncoding {
    fn default() -> Self {
        Self::new(v2_separator())
    }
}

impl ChunkKeyEncodingTraits for V2ChunkKeyEncoding {
    fn create_metadata(&self) -> Metadata {
        configuration_metadata(
            IDENTIFIER,
            &V2ChunkKeyEncodingConfiguration {
                separator: self.separator,
            },
        )
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        let key = if chunk_grid_indices.is_empty() {
            "0".to_string()
        } else {
            join_indices(chunk_grid_indices, self.separator)
        };
        StoreKey::new_unchecked(key)
    }
}
