//! The regular chunk grid.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#regular-grids>.

use derive_more::Display;
use serde::{Deserialize, Serialize};

use crate::{
    array::{ArrayIndices, ArrayShape, ChunkShape},
    array_subset::IncompatibleDimensionalityError,
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

use super::{ChunkGrid, ChunkGridPlugin, ChunkGridTraits};

/// The identifier for the `regular` chunk grid.
pub const IDENTIFIER: &str = "regular";

inventory::submit! {
    ChunkGridPlugin::new(IDENTIFIER, create_chunk_grid_regular)
}

fn create_chunk_grid_regular(metadata: &Metadata) -> Result<ChunkGrid, PluginCreateError> {
    let configuration: RegularChunkGridConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "chunk grid", metadata.clone()))?;
    Ok(ChunkGrid::new(RegularChunkGrid::new(
        configuration.chunk_shape,
    )))
}

/// Configuration parameters for a `regular` chunk grid.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct RegularChunkGridConfiguration {
    /// The chunk shape. Every dimension is non-zero.
    pub chunk_shape: ChunkShape,
}

/// A `regular` chunk grid: every chunk has the same shape.
#[derive(Debug, Clone)]
pub struct RegularChunkGrid {
    chunk_shape: ChunkShape,
}

impl RegularChunkGrid {
    /// Create a new regular chunk grid with chunk shape `chunk_shape`.
    #[must_use]
    pub fn new(chunk_shape: ChunkShape) -> Self {
        Self { chunk_shape }
    }

    /// Return the chunk shape.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    fn check_dimensionality(&self, indices: &[u64]) -> Result<(), IncompatibleDimensionalityError> {
        if indices.len() == self.chunk_shape.len() {
            Ok(())
        } else {
            Err(IncompatibleDimensionalityError::new(
                indices.len(),
                self.chunk_shape.len(),
            ))
        }
    }
}

impl ChunkGridTraits for RegularChunkGrid {
    fn create_metadata(&self) -> Metadata {
        let mut configuration = serde_json::Map::new();
        configuration.insert(
            "chunk_shape".to_string(),
            serde_json::Value::from(self.chunk_shape.to_array_shape()),
        );
        Metadata::new_with_configuration(IDENTIFIER, configuration)
    }

    fn dimensionality(&self) -> usize {
        self.chunk_shape.len()
    }

    fn grid_shape(&self, array_shape: &[u64]) -> Result<ArrayShape, IncompatibleDimensionalityError> {
        self.check_dimensionality(array_shape)?;
        Ok(std::iter::zip(array_shape, self.chunk_shape.iter())
            .map(|(a, s)| a.div_ceil(s.get()))
            .collect())
    }

    fn chunk_shape(&self, chunk_indices: &[u64]) -> Result<ChunkShape, IncompatibleDimensionalityError> {
        self.check_dimensionality(chunk_indices)?;
        Ok(self.chunk_shape.clone())
    }

    fn chunk_origin(&self, chunk_indices: &[u64]) -> Result<ArrayIndices, IncompatibleDimensionalityError> {
        self.check_dimensionality(chunk_indices)?;
        Ok(std::iter::zip(chunk_indices, self.chunk_shape.iter())
            .map(|(i, s)| i * s.get())
            .collect())
    }

    fn chunk_indices(&self, array_indices: &[u64]) -> Result<ArrayIndices, IncompatibleDimensionalityError> {
        self.check_dimensionality(array_indices)?;
        Ok(std::iter::zip(array_indices, self.chunk_shape.iter())
            .map(|(i, s)| i / s.get())
            .collect())
    }
}
