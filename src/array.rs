//! Zarr arrays.
//!
//! An array is a node in a Zarr hierarchy used to hold multidimensional array data and associated metadata.
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#array>.
//!
//! Use [`ArrayBuilder`] to setup a new array, or use [`Array::new`] for an existing array.
//! The documentation for [`Array`] details how to interact with arrays.

mod array_builder;
mod array_errors;
mod array_representation;
mod array_sync_readable;
mod array_sync_readable_writable;
mod array_sync_writable;
pub mod chunk_grid;
pub mod chunk_key_encoding;
mod chunk_shape;
pub mod codec;
pub mod data_type;
mod dimension_name;
mod endianness;
mod fill_value;
mod nan_representations;

use std::sync::Arc;

pub use self::{
    array_builder::ArrayBuilder,
    array_errors::{ArrayCreateError, ArrayError},
    array_representation::{BytesRepresentation, ChunkRepresentation},
    chunk_grid::ChunkGrid,
    chunk_key_encoding::ChunkKeyEncoding,
    chunk_shape::{chunk_shape_to_array_shape, ChunkShape, ZeroChunkShapeError},
    codec::CodecChain,
    data_type::DataType,
    dimension_name::DimensionName,
    endianness::{Endianness, NATIVE_ENDIAN},
    fill_value::FillValue,
    nan_representations::{ZARR_NAN_BF16, ZARR_NAN_F16, ZARR_NAN_F32, ZARR_NAN_F64},
};
pub use crate::metadata::{ArrayMetadataV3, FillValueMetadata};

use crate::{
    array_subset::{ArraySubset, IncompatibleDimensionalityError},
    node::NodePath,
    storage::{data_key, StoreKey},
};

use self::{chunk_grid::InvalidChunkGridIndicesError, codec::ArrayToBytesCodecTraits};

/// An ND index to an element in an array.
pub type ArrayIndices = Vec<u64>;

/// The shape of an array.
pub type ArrayShape = Vec<u64>;

/// A Zarr array.
///
/// See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#array-metadata>.
///
/// ### Metadata
///
/// An array is defined by the following parameters (which are encoded in its JSON metadata):
///  - **shape**: defines the length of the array dimensions,
///  - **data type**: defines the numerical representation array elements,
///  - **chunk grid**: defines how the array is subdivided into chunks (or shards),
///  - **chunk key encoding**: defines how chunk grid cell coordinates are mapped to keys in a store,
///  - **fill value**: an element value to use for uninitialised portions of the array.
///  - **codecs**: used to encode and decode chunks,
///
/// and optional parameters:
///  - **attributes**: user-defined attributes, and
///  - **dimension names**: defines the names of the array dimensions.
///
/// A sharded array is an array with a single `sharding_indexed` codec.
/// Its chunk grid is the grid of shards, and each shard holds a subgrid of inner chunks.
///
/// ### Initialisation
///
/// A *new* array can be initialised with an [`ArrayBuilder`] or [`Array::new_with_metadata`].
/// An *existing* array can be initialised with [`Array::new`], its metadata is read from the store.
///
/// The array metadata is immutable once an array is initialised.
/// It must be written explicitly to the store with [`store_metadata`](Array::store_metadata) if an array is newly created.
///
/// ### Methods
///
/// Array operations are divided into several categories based on the traits implemented for the backing [storage](crate::storage):
///  - [`ReadableStorageTraits`](crate::storage::ReadableStorageTraits): read array data
///    - [`retrieve_chunk`](Array::retrieve_chunk) / [`retrieve_chunk_if_exists`](Array::retrieve_chunk_if_exists)
///    - [`retrieve_chunk_subset`](Array::retrieve_chunk_subset)
///    - [`retrieve_array_subset`](Array::retrieve_array_subset)
///  - [`WritableStorageTraits`](crate::storage::WritableStorageTraits): write array data and metadata
///    - [`store_metadata`](Array::store_metadata)
///    - [`store_chunk`](Array::store_chunk)
///    - [`erase_chunk`](Array::erase_chunk)
///  - [`ReadableWritableStorageTraits`](crate::storage::ReadableWritableStorageTraits): operations requiring both reading and writing
///    - [`store_chunk_subset`](Array::store_chunk_subset)
///    - [`store_array_subset`](Array::store_array_subset)
///
/// The `retrieve` and `store` methods operate on bytes in the native endianness of the data type.
/// Variants with an `_elements` suffix read and write array elements with a known type.
///
/// Chunks (or shards) that do not exist in the store read as the fill value.
///
/// ### Concurrency
///
/// The chunks touched by a single [`store_array_subset`](Array::store_array_subset) or [`retrieve_array_subset`](Array::retrieve_array_subset) call are encoded or decoded in parallel.
/// The concurrency is limited by [`chunk_concurrent_limit`](crate::config::Config::chunk_concurrent_limit).
///
/// Partial chunk writes are read-modify-write and are not atomic against the store.
/// Writes to the same chunk (or shard) from different threads or processes must be serialised by the caller.
#[derive(Debug)]
pub struct Array<TStorage: ?Sized> {
    /// The storage.
    storage: Arc<TStorage>,
    /// The path of the array in a store.
    path: NodePath,
    /// The data type of the Zarr array.
    data_type: DataType,
    /// The chunk grid of the Zarr array.
    chunk_grid: ChunkGrid,
    /// The mapping from chunk grid cell coordinates to keys in the underlying store.
    chunk_key_encoding: ChunkKeyEncoding,
    /// Provides an element value to use for uninitialised portions of the Zarr array.
    fill_value: FillValue,
    /// Specifies a list of codecs to be used for encoding and decoding chunks.
    codecs: CodecChain,
    /// The metadata used to create the array.
    metadata: ArrayMetadataV3,
}

impl<TStorage: ?Sized> Array<TStorage> {
    /// Create an array in `storage` at `path` with `metadata`.
    /// This does **not** write to the store, use [`store_metadata`](Array<WritableStorageTraits>::store_metadata) to write `metadata` to `storage`.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if:
    ///  - any metadata is invalid or,
    ///  - a plugin (e.g. data type/chunk grid/chunk key encoding/codec) is not supported, or
    ///  - the codecs are incompatible with the chunk shape or data type.
    pub fn new_with_metadata(
        storage: Arc<TStorage>,
        path: &str,
        metadata: ArrayMetadataV3,
    ) -> Result<Self, ArrayCreateError> {
        let path = NodePath::new(path)?;
        let dimensionality = metadata.shape.len();

        let data_type = DataType::from_metadata(&metadata.data_type)
            .map_err(ArrayCreateError::DataTypeCreateError)?;
        let chunk_grid = ChunkGrid::from_metadata(&metadata.chunk_grid)
            .map_err(ArrayCreateError::ChunkGridCreateError)?;
        if chunk_grid.dimensionality() != dimensionality {
            return Err(ArrayCreateError::InvalidChunkGridDimensionality(
                chunk_grid.dimensionality(),
                dimensionality,
            ));
        }
        let fill_value = data_type.fill_value_from_metadata(&metadata.fill_value)?;
        let codecs = CodecChain::from_metadata(&metadata.codecs)
            .map_err(ArrayCreateError::CodecsCreateError)?;
        let chunk_key_encoding = ChunkKeyEncoding::from_metadata(&metadata.chunk_key_encoding)
            .map_err(ArrayCreateError::ChunkKeyEncodingCreateError)?;
        if let Some(dimension_names) = &metadata.dimension_names {
            if dimension_names.len() != dimensionality {
                return Err(ArrayCreateError::InvalidDimensionNames(
                    dimension_names.len(),
                    dimensionality,
                ));
            }
        }

        // Every chunk of a regular grid has the same representation
        let chunk_shape = chunk_grid
            .chunk_shape(&vec![0; dimensionality])
            .map_err(|_| {
                ArrayCreateError::InvalidChunkGridDimensionality(
                    chunk_grid.dimensionality(),
                    dimensionality,
                )
            })?;
        let chunk_representation =
            ChunkRepresentation::new(chunk_shape, data_type, fill_value.clone())?;
        codecs
            .compute_encoded_size(&chunk_representation)
            .map_err(ArrayCreateError::IncompatibleCodecs)?;

        Ok(Self {
            storage,
            path,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            codecs,
            metadata,
        })
    }

    /// Get the node path.
    #[must_use]
    pub const fn path(&self) -> &NodePath {
        &self.path
    }

    /// Get the data type.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Get the fill value.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Get the array shape.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.metadata.shape
    }

    /// Get the array dimensionality.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.metadata.shape.len()
    }

    /// Get the codecs.
    #[must_use]
    pub const fn codecs(&self) -> &CodecChain {
        &self.codecs
    }

    /// Get the chunk grid.
    #[must_use]
    pub const fn chunk_grid(&self) -> &ChunkGrid {
        &self.chunk_grid
    }

    /// Get the chunk key encoding.
    #[must_use]
    pub const fn chunk_key_encoding(&self) -> &ChunkKeyEncoding {
        &self.chunk_key_encoding
    }

    /// Get the dimension names.
    #[must_use]
    pub const fn dimension_names(&self) -> &Option<Vec<DimensionName>> {
        &self.metadata.dimension_names
    }

    /// Get the attributes.
    #[must_use]
    pub const fn attributes(&self) -> &serde_json::Map<String, serde_json::Value> {
        &self.metadata.attributes
    }

    /// Get the array metadata.
    #[must_use]
    pub const fn metadata(&self) -> &ArrayMetadataV3 {
        &self.metadata
    }

    /// Return the shape of the chunk grid (i.e., the number of chunks).
    ///
    /// Returns [`None`] if the chunk grid is incompatible with the array shape, which cannot happen for a validated array.
    #[must_use]
    pub fn chunk_grid_shape(&self) -> Option<ArrayShape> {
        self.chunk_grid.grid_shape(self.shape()).ok()
    }

    /// Return the [`StoreKey`] of the chunk at `chunk_indices`.
    #[must_use]
    pub fn chunk_key(&self, chunk_indices: &[u64]) -> StoreKey {
        data_key(self.path(), chunk_indices, &self.chunk_key_encoding)
    }

    /// Return the subset of the chunk at `chunk_indices`.
    ///
    /// The subset has the full chunk shape, and may extend beyond the array if the chunk is on the array boundary.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset(chunk_indices, self.shape())?)
    }

    /// Return the subset of the chunk at `chunk_indices` bounded by the array shape.
    ///
    /// This is the logical extent of a ragged chunk on the array boundary.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_subset_bounded(&self, chunk_indices: &[u64]) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.subset_bounded(chunk_indices, self.shape())?)
    }

    /// Return the grid indices of the chunks overlapping `array_subset`, as an [`ArraySubset`] of the chunk grid.
    ///
    /// # Errors
    /// Returns [`ArrayError::IncompatibleDimensionalityError`] if the dimensionality of `array_subset` does not match the array.
    pub fn chunks_in_array_subset(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<ArraySubset, ArrayError> {
        Ok(self.chunk_grid.chunks_in_array_subset(array_subset)?)
    }

    /// Get the chunk representation of the chunk at `chunk_indices`.
    ///
    /// # Errors
    /// Returns [`ArrayError::InvalidChunkGridIndicesError`] if the `chunk_indices` are incompatible with the chunk grid.
    pub fn chunk_array_representation(
        &self,
        chunk_indices: &[u64],
    ) -> Result<ChunkRepresentation, ArrayError> {
        if !self
            .chunk_grid
            .validate_chunk_indices(chunk_indices, self.shape())
        {
            return Err(InvalidChunkGridIndicesError::new(
                chunk_indices.to_vec(),
                self.shape().to_vec(),
            )
            .into());
        }
        let chunk_shape = self.chunk_grid.chunk_shape(chunk_indices)?;
        Ok(ChunkRepresentation::new(
            chunk_shape,
            self.data_type,
            self.fill_value.clone(),
        )?)
    }

    /// Check that `array_subset` lies within the array.
    fn validate_array_subset(&self, array_subset: &ArraySubset) -> Result<(), ArrayError> {
        if array_subset.dimensionality() != self.dimensionality() {
            Err(IncompatibleDimensionalityError::new(
                array_subset.dimensionality(),
                self.dimensionality(),
            )
            .into())
        } else if array_subset.inbounds(self.shape()) {
            Ok(())
        } else {
            Err(ArrayError::InvalidArraySubset(
                array_subset.clone(),
                self.shape().to_vec(),
            ))
        }
    }

    /// Check that `T` has the element size of the data type.
    fn validate_element_size<T>(&self) -> Result<(), ArrayError> {
        if core::mem::size_of::<T>() == self.data_type.size() {
            Ok(())
        } else {
            Err(ArrayError::IncompatibleElementSize(
                core::mem::size_of::<T>(),
                self.data_type.size(),
            ))
        }
    }
}

/// Convert a vector of bytes to a vector of elements.
///
/// The allocation is reused if its alignment is compatible with `T`, otherwise the bytes are copied.
fn transmute_from_bytes_vec<T: bytemuck::Pod>(from: Vec<u8>) -> Vec<T> {
    bytemuck::allocation::try_cast_vec(from)
        .unwrap_or_else(|(_, from)| bytemuck::allocation::pod_collect_to_vec(&from))
}

/// Unravel a linearised index to ND indices.
#[must_use]
pub fn unravel_index(mut index: u64, shape: &[u64]) -> ArrayIndices {
    let mut indices = vec![0; shape.len()];
    for (indices_i, &dim) in std::iter::zip(indices.iter_mut().rev(), shape.iter().rev()) {
        *indices_i = index % dim;
        index /= dim;
    }
    indices
}

/// Ravel ND indices to a linearised index.
#[must_use]
pub fn ravel_indices(indices: &[u64], shape: &[u64]) -> u64 {
    let mut index: u64 = 0;
    let mut count = 1;
    for (i, s) in std::iter::zip(indices, shape).rev() {
        index += i * count;
        count *= s;
    }
    index
}
