use thiserror::Error;

use crate::{
    array_subset::{
        ArrayExtractBytesError, ArrayStoreBytesError, ArraySubset, IncompatibleDimensionalityError,
        IncompatibleStartError,
    },
    node::NodePathError,
    plugin::PluginCreateError,
    storage::StorageError,
};

use super::{
    chunk_grid::InvalidChunkGridIndicesError,
    codec::CodecError,
    data_type::{IncompatibleFillValueError, IncompatibleFillValueMetadataError, UnsupportedDataTypeError},
    ArrayShape, ChunkShape,
};

/// An error creating or opening an array.
///
/// Apart from [`StorageError`](ArrayCreateError::StorageError), [`MissingMetadata`](ArrayCreateError::MissingMetadata)
/// and [`MetadataDeserializationError`](ArrayCreateError::MetadataDeserializationError),
/// these are raised before anything is read from or written to the store.
#[derive(Debug, Error)]
pub enum ArrayCreateError {
    #[error(transparent)]
    #[allow(missing_docs)]
    NodePathError(#[from] NodePathError),
    /// The data type name is not recognised.
    #[error(transparent)]
    DataTypeCreateError(UnsupportedDataTypeError),
    /// The fill value metadata does not fit the data type.
    #[error(transparent)]
    InvalidFillValueMetadata(#[from] IncompatibleFillValueMetadataError),
    /// The fill value does not fit the data type.
    #[error(transparent)]
    InvalidFillValue(#[from] IncompatibleFillValueError),
    /// A codec is unknown, misconfigured, or out of order.
    #[error("codecs: {0}")]
    CodecsCreateError(PluginCreateError),
    /// The codecs cannot encode chunks of this shape and data type.
    #[error("codecs cannot encode the array chunks: {0}")]
    IncompatibleCodecs(CodecError),
    /// The chunk grid is unknown or misconfigured.
    #[error("chunk grid: {0}")]
    ChunkGridCreateError(PluginCreateError),
    /// The chunk key encoding is unknown or misconfigured.
    #[error("chunk key encoding: {0}")]
    ChunkKeyEncodingCreateError(PluginCreateError),
    /// The chunk grid and array shape have a different number of dimensions.
    #[error("chunk grid has {0} dimensions but the array has {1}")]
    InvalidChunkGridDimensionality(usize, usize),
    /// The shard shape is not a whole multiple of the inner chunk shape.
    #[error("shard shape {0:?} does not divide into inner chunks of shape {1:?}")]
    InvalidShardShape(ChunkShape, ChunkShape),
    /// There is not one dimension name per dimension.
    #[error("{0} dimension names for an array with {1} dimensions")]
    InvalidDimensionNames(usize, usize),
    #[error(transparent)]
    #[allow(missing_docs)]
    StorageError(#[from] StorageError),
    /// The array metadata document is malformed.
    #[error(transparent)]
    MetadataDeserializationError(#[from] serde_json::Error),
    /// There is no array metadata at the path.
    #[error("array metadata is missing")]
    MissingMetadata,
}

/// An error reading or writing array data.
#[derive(Debug, Error)]
pub enum ArrayError {
    #[error(transparent)]
    #[allow(missing_docs)]
    StorageError(#[from] StorageError),
    /// Encoding or decoding a chunk failed, including corrupt stored chunks.
    #[error(transparent)]
    CodecError(#[from] CodecError),
    #[error(transparent)]
    #[allow(missing_docs)]
    InvalidChunkGridIndicesError(#[from] InvalidChunkGridIndicesError),
    #[error(transparent)]
    #[allow(missing_docs)]
    IncompatibleDimensionalityError(#[from] IncompatibleDimensionalityError),
    #[error(transparent)]
    #[allow(missing_docs)]
    IncompatibleStartError(#[from] IncompatibleStartError),
    #[error(transparent)]
    #[allow(missing_docs)]
    ArrayExtractBytesError(#[from] ArrayExtractBytesError),
    #[error(transparent)]
    #[allow(missing_docs)]
    ArrayStoreBytesError(#[from] ArrayStoreBytesError),
    #[error(transparent)]
    #[allow(missing_docs)]
    IncompatibleFillValue(#[from] IncompatibleFillValueError),
    /// The subset lies outside the array or chunk.
    #[error("subset {_0} is out of bounds of shape {_1:?}")]
    InvalidArraySubset(ArraySubset, ArrayShape),
    /// The input bytes do not match the size of the region being written.
    #[error("expected {_1} bytes, got {_0}")]
    InvalidBytesInputSize(usize, u64),
    /// The element type does not have the size of the data type.
    #[error("element size {_0} does not match data type size {_1}")]
    IncompatibleElementSize(usize, usize),
}
