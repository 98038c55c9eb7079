//! Zarr codecs.
//!
//! Array chunks are encoded using a sequence of codecs, each of which specifies a bidirectional transform (an encode transform and a decode transform).
//! A codec can map an array to an array, an array to bytes, or bytes to bytes.
//! A codec may support partial decoding to extract a byte range or array subset without needing to decode the entire input.
//!
//! A [`CodecChain`] represents a codec sequence consisting of any number of array to array and bytes to bytes codecs, and one array to bytes codec.
//! A codec chain is itself an array to bytes codec, which is how the inner codecs of a shard are expressed.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#id18>.

pub mod array_to_array;
pub mod array_to_bytes;
pub mod bytes_to_bytes;

mod array_to_array_partial_decoder_default;
mod byte_interval_partial_decoder;
mod bytes_to_bytes_partial_decoder_default;
pub use array_to_array_partial_decoder_default::ArrayToArrayPartialDecoderDefault;
pub use byte_interval_partial_decoder::ByteIntervalPartialDecoder;
pub use bytes_to_bytes_partial_decoder_default::BytesToBytesPartialDecoderDefault;

// Array to array
#[cfg(feature = "transpose")]
pub use array_to_array::transpose::{
    TransposeCodec, TransposeCodecConfiguration, TransposeCodecConfigurationV1, TransposeOrder,
};

// Array to bytes
#[cfg(feature = "sharding")]
pub use array_to_bytes::sharding::{
    ShardIndex, ShardingCodec, ShardingCodecConfiguration, ShardingCodecConfigurationV1,
    ShardingIndexLocation,
};
pub use array_to_bytes::{
    bytes::{BytesCodec, BytesCodecConfiguration, BytesCodecConfigurationV1},
    codec_chain::CodecChain,
};

// Bytes to bytes
#[cfg(feature = "blosc")]
pub use bytes_to_bytes::blosc::{
    BloscCodec, BloscCodecConfiguration, BloscCodecConfigurationV1, BloscCompressionLevel,
    BloscCompressor, BloscShuffleMode,
};
#[cfg(feature = "crc32c")]
pub use bytes_to_bytes::crc32c::{
    Crc32cCodec, Crc32cCodecConfiguration, Crc32cCodecConfigurationV1,
};
#[cfg(feature = "gzip")]
pub use bytes_to_bytes::gzip::{
    GzipCodec, GzipCodecConfiguration, GzipCodecConfigurationV1, GzipCompressionLevel,
};
#[cfg(feature = "zstd")]
pub use bytes_to_bytes::zstd::{
    ZstdCodec, ZstdCodecConfiguration, ZstdCodecConfigurationV1, ZstdCompressionLevel,
};

use thiserror::Error;

use crate::{
    array_subset::{
        ArrayExtractBytesError, ArrayStoreBytesError, ArraySubset,
        IncompatibleArraySubsetAndShapeError,
    },
    byte_range::{extract_byte_ranges, ByteRange, InvalidByteRangeError},
    metadata::Metadata,
    plugin::{create_from_metadata, Plugin, PluginCreateError},
    storage::{ReadableStorageTraits, StorageError, StoreKey},
};

use super::{BytesRepresentation, ChunkRepresentation, DataType};

/// A codec plugin.
pub type CodecPlugin = Plugin<Codec>;
inventory::collect!(CodecPlugin);

/// A generic array to array, array to bytes, or bytes to bytes codec.
#[derive(Debug)]
pub enum Codec {
    /// An array to array codec.
    ArrayToArray(Box<dyn ArrayToArrayCodecTraits>),
    /// An array to bytes codec.
    ArrayToBytes(Box<dyn ArrayToBytesCodecTraits>),
    /// A bytes to bytes codec.
    BytesToBytes(Box<dyn BytesToBytesCodecTraits>),
}

impl Codec {
    /// Create a codec from metadata.
    ///
    /// # Errors
    /// Returns [`PluginCreateError`] if the metadata is invalid or not associated with a registered codec plugin.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, PluginCreateError> {
        create_from_metadata("codec", metadata)
    }
}

/// Codec traits.
pub trait CodecTraits: Send + Sync {
    /// Create metadata.
    ///
    /// A codec with no metadata representation returns [`None`].
    fn create_metadata(&self) -> Option<Metadata>;
}

/// Traits for both array to array and array to bytes codecs.
pub trait ArrayCodecTraits: CodecTraits {
    /// Encode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `decoded_value` is incompatible with `decoded_representation`.
    fn encode(
        &self,
        decoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Decode a chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the decoded output is incompatible with `decoded_representation`.
    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError>;
}

/// Partial bytes decoder traits.
pub trait BytesPartialDecoderTraits: Send + Sync {
    /// Partially decode bytes.
    ///
    /// Returns [`None`] if the partial decoder input is absent.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or a byte range is invalid.
    fn partial_decode(
        &self,
        decoded_regions: &[ByteRange],
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError>;

    /// Decode all bytes.
    ///
    /// Returns [`None`] if the partial decoder input is absent.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn decode(&self) -> Result<Option<Vec<u8>>, CodecError> {
        Ok(self
            .partial_decode(&[ByteRange::FromStart(0, None)])?
            .and_then(|mut decoded| decoded.pop()))
    }
}

/// Partial array decoder traits.
pub trait ArrayPartialDecoderTraits: Send + Sync {
    /// Partially decode a chunk.
    ///
    /// Each output holds the bytes of an array subset in C order.
    /// Regions of an absent chunk decode to the fill value.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or an array subset is invalid.
    fn partial_decode(&self, array_subsets: &[ArraySubset]) -> Result<Vec<Vec<u8>>, CodecError>;
}

/// A [`ReadableStorageTraits`] partial decoder over the value at a single key.
pub struct StoragePartialDecoder<'a, TStorage: ?Sized + ReadableStorageTraits> {
    storage: &'a TStorage,
    key: StoreKey,
}

impl<'a, TStorage: ?Sized + ReadableStorageTraits> StoragePartialDecoder<'a, TStorage> {
    /// Create a new storage partial decoder.
    pub fn new(storage: &'a TStorage, key: StoreKey) -> Self {
        Self { storage, key }
    }
}

impl<TStorage: ?Sized + ReadableStorageTraits> BytesPartialDecoderTraits
    for StoragePartialDecoder<'_, TStorage>
{
    fn partial_decode(
        &self,
        decoded_regions: &[ByteRange],
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        Ok(self
            .storage
            .get_partial_values_key(&self.key, decoded_regions)?
            .map(|values| values.into_iter().map(|bytes| bytes.to_vec()).collect()))
    }
}

impl BytesPartialDecoderTraits for std::io::Cursor<Vec<u8>> {
    fn partial_decode(
        &self,
        decoded_regions: &[ByteRange],
    ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
        Ok(Some(extract_byte_ranges(self.get_ref(), decoded_regions)?))
    }
}

/// Traits for array to array codecs.
pub trait ArrayToArrayCodecTraits:
    ArrayCodecTraits + dyn_clone::DynClone + core::fmt::Debug
{
    /// Returns the representation of the encoded chunk given the representation of the decoded chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the codec is incompatible with `decoded_representation`.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError>;

    /// Initialise a partial decoder.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if initialisation fails.
    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn ArrayPartialDecoderTraits + 'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Box<dyn ArrayPartialDecoderTraits + 'a>, CodecError>;
}

dyn_clone::clone_trait_object!(ArrayToArrayCodecTraits);

/// Traits for array to bytes codecs.
pub trait ArrayToBytesCodecTraits:
    ArrayCodecTraits + dyn_clone::DynClone + core::fmt::Debug
{
    /// Returns the size of the encoded representation given the representation of the decoded chunk.
    ///
    /// # Errors
    /// Returns [`CodecError`] if the codec is incompatible with `decoded_representation`.
    fn compute_encoded_size(
        &self,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError>;

    /// Initialise a partial decoder.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if initialisation fails.
    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: &ChunkRepresentation,
    ) -> Result<Box<dyn ArrayPartialDecoderTraits + 'a>, CodecError>;

    /// Update `array_subset` of an encoded chunk with `subset_bytes`.
    ///
    /// `encoded_value` is the existing encoded chunk, or [`None`] if the chunk does not exist yet.
    /// Returns [`None`] if every element of the updated chunk is the fill value.
    ///
    /// The default implementation decodes the whole chunk, stores the subset bytes, and encodes the result.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or `array_subset` and `subset_bytes` are incompatible with `decoded_representation`.
    fn partial_encode(
        &self,
        encoded_value: Option<Vec<u8>>,
        decoded_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        subset_bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, CodecError> {
        let mut decoded_value = match encoded_value {
            Some(encoded_value) => self.decode(encoded_value, decoded_representation)?,
            None => decoded_representation.fill_value_bytes(),
        };
        array_subset.store_bytes(
            subset_bytes,
            &mut decoded_value,
            &decoded_representation.shape_u64(),
            decoded_representation.element_size(),
        )?;
        if decoded_representation
            .fill_value()
            .equals_all(&decoded_value)
        {
            Ok(None)
        } else {
            Ok(Some(self.encode(decoded_value, decoded_representation)?))
        }
    }
}

dyn_clone::clone_trait_object!(ArrayToBytesCodecTraits);

/// Traits for bytes to bytes codecs.
pub trait BytesToBytesCodecTraits: CodecTraits + dyn_clone::DynClone + core::fmt::Debug {
    /// Returns the size of the encoded representation given a size of the decoded representation.
    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation;

    /// Encode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails.
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError>;

    /// Decode bytes.
    ///
    /// # Errors
    /// Returns [`CodecError`] if a codec fails or the encoded value is corrupt.
    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError>;

    /// Initialises a partial decoder.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if initialisation fails.
    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Box<dyn BytesPartialDecoderTraits + 'a>, CodecError>;
}

dyn_clone::clone_trait_object!(BytesToBytesCodecTraits);

/// A codec error.
#[derive(Debug, Error)]
pub enum CodecError {
    /// An IO error.
    #[error(transparent)]
    IOError(#[from] std::io::Error),
    /// An invalid byte range was requested.
    #[error(transparent)]
    InvalidByteRangeError(#[from] InvalidByteRangeError),
    /// An invalid array subset was requested.
    #[error(transparent)]
    InvalidArraySubsetError(#[from] IncompatibleArraySubsetAndShapeError),
    /// An array subset could not be extracted from the decoded bytes.
    #[error(transparent)]
    ArrayExtractBytesError(#[from] ArrayExtractBytesError),
    /// An array subset could not be stored into the decoded bytes.
    #[error(transparent)]
    ArrayStoreBytesError(#[from] ArrayStoreBytesError),
    /// The decoded size of a chunk did not match what was expected.
    #[error("the size of a decoded chunk is {_0}, expected {_1}")]
    UnexpectedChunkDecodedSize(usize, u64),
    /// An embedded checksum does not match the decoded value.
    #[error("the checksum is invalid")]
    InvalidChecksum,
    /// The encoded data is corrupt.
    #[error("corrupt data: {_0}")]
    CorruptData(String),
    /// A store error.
    #[error(transparent)]
    StorageError(#[from] StorageError),
    /// Unsupported data type
    #[error("unsupported data type {0} for codec {1}")]
    UnsupportedDataType(DataType, String),
    /// Other
    #[error("{_0}")]
    Other(String),
}

impl From<&str> for CodecError {
    fn from(err: &str) -> Self {
        Self::Other(err.to_string())
    }
}

impl From<String> for CodecError {
    fn from(err: String) -> Self {
        Self::Other(err)
    }
}
