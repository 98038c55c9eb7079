//! The `default` chunk key encoding.

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

/// The identifier for the `default` chunk key encoding.
pub const IDENTIFIER: &str = "default";

inventory::submit! {
    ChunkKeyEncodingPlugin::new(IDENTIFIER, create_chunk_key_encoding_default)
}

fn create_chunk_key_encoding_default(
    metadata: &Metadata,
) -> Result<ChunkKeyEncoding, PluginCreateError> {
    let configuration: DefaultChunkKeyEncodingConfiguration =
        metadata.to_configuration().map_err(|_| {
            PluginMetadataInvalidError::new(IDENTIFIER, "chunk key encoding", metadata.clone())
        })?;
    Ok(DefaultChunkKeyEncoding::new(configuration.separator).into())
}

/// A `default` chunk key encoding configuration.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct DefaultChunkKeyEncodingConfiguration {
    /// The chunk key separator. Defaults to `/`.
    #[serde(default = "default_separator")]
    pub separator: ChunkKeySeparator,
}

const fn default_separator() -> ChunkKeySeparator {
    ChunkKeySeparator::Slash
}

/// A `default` chunk key encoding.
///
/// The key for a chunk with grid index (k, j, i, ...) is the prefix `c` followed by, for each dimension,
/// the separator and the decimal chunk index along that dimension.
/// A zero-dimensional array has the single chunk key `c`.
#[derive(Debug, Clone)]
pub struct DefaultChunkKeyEncoding {
    separator: ChunkKeySeparator,
}

impl DefaultChunkKeyEncoding {
    /// Create a new `default` chunk key encoding with separator `separator`.
    #[must_use]
    pub const fn new(separator: ChunkKeySeparator) -> Self {
        Self { separator }
    }

    /// Create a new `default` chunk key encoding with separator `.`.
    #[must_use]
    pub const fn new_dot() -> Self {
        Self::new(ChunkKeySeparator::Dot)
    }

    /// Create a new `default` chunk key encoding with separator `/`.
    #[must_use]
    pub const fn new_slash() -> Self {
        Self::new(ChunkKeySeparator::Slash)
    }
}

impl Default for DefaultChunkKeyEncoding {
    fn default() -> Self {
        Self::new(default_separator())
    }
}

impl ChunkKeyEncodingTraits for DefaultChunkKeyEncoding {
    fn create_metadata(&self) -> Metadata {
        configuration_metadata(
            IDENTIFIER,
            &DefaultChunkKeyEncodingConfiguration {
                separator: self.separator,
            },
        )
    }

    fn encode(&self, chunk_grid_indices: &[u64]) -> StoreKey {
        let key = if chunk_grid_indices.is_empty() {
            "c".to_string()
        } else {
            format!(
                "c{}{}",
                self.separator,
                join_indices(chunk_grid_indices, self.separator)
            )
        };
        StoreKey::new_unchecked(key)
    }
}

#[cfg(test)]
mod tests {
    use crate::{node::NodePath, storage::data_key};

    use super::*;

    #[test]
    fn default_slash_nd() {
        let key = data_key(
            &NodePath::root(),
            &[1, 23, 45],
            &DefaultChunkKeyEncoding::new_slash().into(),
        );
        assert_eq!(key, StoreKey::new("c/1/23/45").unwrap());
    }

    #[test]
    fn default_dot_nd() {
        let key = data_key(
            &NodePath::new("/a").unwrap(),
            &[1, 23, 45],
            &DefaultChunkKeyEncoding::new_dot().into(),
        );
        assert_eq!(key, StoreKey::new("a/c.1.23.45").unwrap());
    }

    #[test]
    fn default_scalar() {
        let key = DefaultChunkKeyEncoding::default().encode(&[]);
        assert_eq!(key.as_str(), "c");
    }

    #[test]
    fn default_metadata() {
        let metadata: Metadata = serde_json::from_str(r#"{"name":"default"}"#).unwrap();
        let encoding = ChunkKeyEncoding::from_metadata(&metadata).unwrap();
        assert_eq!(encoding.encode(&[0, 1]).as_str(), "c/0/1");
        assert_eq!(
            serde_json::to_string(&encoding.create_metadata()).unwrap(),
            r#"{"name":"default","configuration":{"separator":"/"}}"#
        );
        let metadata: Metadata =
            serde_json::from_str(r#"{"name":"default","configuration":{"separator":"-"}}"#)
                .unwrap();
        assert!(ChunkKeyEncoding::from_metadata(&metadata).is_err());
    }
}
