//! Zarr chunk grids.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#chunk-grids>.
//!
//! A chunk grid partitions an array into chunks and locates each chunk by its grid indices.
//! The only chunk grid is the [`RegularChunkGrid`], registered as a [`ChunkGridPlugin`].
//!
//! A chunk at the end of a dimension is *ragged* if the array shape is not a multiple of the chunk shape.
//! Its [`subset`](ChunkGridTraits::subset) still has the full chunk shape, since a chunk is always encoded with its full shape,
//! while [`subset_bounded`](ChunkGridTraits::subset_bounded) is the region of the chunk within the array.

mod regular;

pub use regular::{RegularChunkGrid, RegularChunkGridConfiguration};

use derive_more::{Deref, From};
use thiserror::Error;

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    metadata::Metadata,
    plugin::{create_from_metadata, Plugin, PluginCreateError},
};

use super::{ArrayIndices, ArrayShape, ChunkShape};

/// A chunk grid.
#[derive(Debug, Clone, Deref, From)]
pub struct ChunkGrid(Box<dyn ChunkGridTraits>);

/// A chunk grid plugin.
pub type ChunkGridPlugin = Plugin<ChunkGrid>;
inventory::collect!(ChunkGridPlugin);

impl ChunkGrid {
    /// Create a chunk grid.
    pub fn new<T: ChunkGridTraits + 'static>(chunk_grid: T) -> Self {
        let chunk_grid: Box<dyn ChunkGridTraits> = Box::new(chunk_grid);
        chunk_grid.into()
    }

    /// Create a chunk grid from metadata.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if the metadata is invalid or not associated with a registered chunk grid plugin.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, PluginCreateError> {
        create_from_metadata("chunk grid", metadata)
    }
}

impl From<ChunkShape> for ChunkGrid {
    /// Create a regular chunk grid from a chunk shape.
    fn from(regular_chunk_shape: ChunkShape) -> Self {
        Self::new(RegularChunkGrid::new(regular_chunk_shape))
    }
}

/// Chunk grid traits.
pub trait ChunkGridTraits: dyn_clone::DynClone + core::fmt::Debug + Send + Sync {
    /// Create metadata.
    fn create_metadata(&self) -> Metadata;

    /// The dimensionality of the grid.
    fn dimensionality(&self) -> usize;

    /// The grid shape (i.e. number of chunks along each dimension) of an array with `array_shape`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `array_shape` does not match the dimensionality of the chunk grid.
    fn grid_shape(&self, array_shape: &[u64]) -> Result<ArrayShape, IncompatibleDimensionalityError>;

    /// The shape of the chunk at `chunk_indices`, which does not account for the array bounds.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `chunk_indices` does not match the dimensionality of the chunk grid.
    fn chunk_shape(&self, chunk_indices: &[u64]) -> Result<ChunkShape, IncompatibleDimensionalityError>;

    /// The origin of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `chunk_indices` does not match the dimensionality of the chunk grid.
    fn chunk_origin(&self, chunk_indices: &[u64]) -> Result<ArrayIndices, IncompatibleDimensionalityError>;

    /// The indices of the chunk holding the element at `array_indices`.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `array_indices` does not match the dimensionality of the chunk grid.
    fn chunk_indices(&self, array_indices: &[u64]) -> Result<ArrayIndices, IncompatibleDimensionalityError>;

    /// Returns true if `chunk_indices` lie within the chunk grid of an array with `array_shape`.
    #[must_use]
    fn validate_chunk_indices(&self, chunk_indices: &[u64], array_shape: &[u64]) -> bool {
        chunk_indices.len() == self.dimensionality()
            && self.grid_shape(array_shape).is_ok_and(|grid_shape| {
                std::iter::zip(chunk_indices, grid_shape).all(|(index, shape)| *index < shape)
            })
    }

    /// Return the [`ArraySubset`] of the chunk at `chunk_indices`, with its full chunk shape.
    ///
    /// # Errors
    /// Returns [`InvalidChunkGridIndicesError`] if `chunk_indices` are not within the chunk grid of an array with `array_shape`.
    fn subset(
        &self,
        chunk_indices: &[u64],
        array_shape: &[u64],
    ) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        let err = || InvalidChunkGridIndicesError(chunk_indices.to_vec(), array_shape.to_vec());
        if !self.validate_chunk_indices(chunk_indices, array_shape) {
            return Err(err());
        }
        let origin = self.chunk_origin(chunk_indices).map_err(|_| err())?;
        let shape = self.chunk_shape(chunk_indices).map_err(|_| err())?;
        ArraySubset::new_with_start_shape(origin, shape.to_array_shape()).map_err(|_| err())
    }

    /// Return the [`ArraySubset`] of the chunk at `chunk_indices` bounded by the array shape.
    ///
    /// This is the logical extent of a ragged chunk.
    ///
    /// # Errors
    /// Returns [`InvalidChunkGridIndicesError`] if `chunk_indices` are not within the chunk grid of an array with `array_shape`.
    fn subset_bounded(
        &self,
        chunk_indices: &[u64],
        array_shape: &[u64],
    ) -> Result<ArraySubset, InvalidChunkGridIndicesError> {
        self.subset(chunk_indices, array_shape)?
            .bound(array_shape)
            .map_err(|_| InvalidChunkGridIndicesError(chunk_indices.to_vec(), array_shape.to_vec()))
    }

    /// Return the grid indices of the chunks overlapping `array_subset`, as an [`ArraySubset`] of the chunk grid.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `array_subset` does not match the chunk grid.
    fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, IncompatibleDimensionalityError> {
        if array_subset.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                array_subset.dimensionality(),
                self.dimensionality(),
            ));
        }
        if array_subset.is_empty() {
            return Ok(ArraySubset::new_with_shape(vec![0; self.dimensionality()]));
        }
        let last: ArrayIndices = array_subset.end_exc().iter().map(|end| end - 1).collect();
        let chunks_start = self.chunk_indices(array_subset.start())?;
        let chunks_end_exc: ArrayIndices = self
            .chunk_indices(&last)?
            .iter()
            .map(|index| index + 1)
            .collect();
        let ranges: Vec<_> = std::iter::zip(chunks_start, chunks_end_exc)
            .map(|(start, end)| start..end)
            .collect();
        Ok(ArraySubset::new_with_ranges(&ranges))
    }
}

dyn_clone::clone_trait_object!(ChunkGridTraits);

/// An invalid chunk indices error.
#[derive(Debug, Error)]
#[error("chunk grid indices {0:?} are invalid for array with shape {1:?}")]
pub struct InvalidChunkGridIndicesError(ArrayIndices, ArrayShape);

impl InvalidChunkGridIndicesError {
    /// Create a new invalid chunk grid indices error.
    #[must_use]
    pub fn new(chunk_indices: ArrayIndices, array_shape: ArrayShape) -> Self {
        Self(chunk_indices, array_shape)
    }
}
