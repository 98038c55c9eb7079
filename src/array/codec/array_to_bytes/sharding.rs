//! The `sharding_indexed` array to bytes codec.
//!
//! Sharding logically splits chunks (shards) into sub-chunks (inner chunks) that can be individually compressed and accessed.
//! This allows to colocate multiple chunks within one storage object, bundling them in shards.
//!
//! A shard holds the encoded inner chunks packed consecutively in row-major order, plus a [`ShardIndex`] of `(offset, nbytes)` pairs.
//! An absent inner chunk has the entry `(u64::MAX, u64::MAX)` and contributes no bytes.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/sharding-indexed/v1.0.html>.
//!
//! This codec requires the `sharding` feature, which is enabled by default.

mod sharding_codec;
mod sharding_configuration;
mod sharding_partial_decoder;

use std::num::NonZeroU64;

pub use sharding_codec::ShardingCodec;
pub use sharding_configuration::{
    ShardingCodecConfiguration, ShardingCodecConfigurationV1, ShardingIndexLocation,
};

use crate::{
    array::{
        codec::{ArrayToBytesCodecTraits, Codec, CodecChain, CodecError, CodecPlugin},
        ravel_indices, unravel_index, ArrayIndices, BytesRepresentation, ChunkRepresentation,
        ChunkShape, DataType, FillValue,
    },
    array_subset::ArraySubset,
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

/// The identifier for the `sharding_indexed` codec.
pub const IDENTIFIER: &str = "sharding_indexed";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, create_codec_sharding)
}


pub(crate) fn create_codec_sharding(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: ShardingCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = ShardingCodec::new_with_configuration(&configuration)?;
    Ok(Codec::ArrayToBytes(Box::new(codec)))
}

/// The index entry value of an absent inner chunk.
const EMPTY_ENTRY: u64 = u64::MAX;

/// The index of a shard.
///
/// Holds one `(offset, nbytes)` pair per inner chunk, in row-major order of the inner chunk indices relative to the shard.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShardIndex {
    chunks_per_shard: ChunkShape,
    entries: Vec<u64>,
}

impl ShardIndex {
    /// Create a shard index with every inner chunk absent.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn new_empty(chunks_per_shard: ChunkShape) -> Self {
        let num_chunks = chunks_per_shard.num_elements() as usize;
        Self {
            chunks_per_shard,
            entries: vec![EMPTY_ENTRY; num_chunks * 2],
        }
    }

    /// Create a shard index from its decoded `entries`.
    ///
    /// # Errors
    /// Returns [`CodecError::CorruptData`] if the number of entries does not match `chunks_per_shard` or an entry overflows.
    pub fn from_entries(chunks_per_shard: ChunkShape, entries: Vec<u64>) -> Result<Self, CodecError> {
        let expected_len = chunks_per_shard.num_elements() * 2;
        if entries.len() as u64 != expected_len {
            return Err(CodecError::CorruptData(format!(
                "shard index has {} entries, expected {expected_len}",
                entries.len()
            )));
        }
        let index = Self {
            chunks_per_shard,
            entries,
        };
        for chunk_index in 0..index.num_chunks() {
            if let Some((offset, nbytes)) = index.lookup_index(chunk_index) {
                if offset.checked_add(nbytes).is_none() {
                    return Err(CodecError::CorruptData(format!(
                        "shard index entry ({offset}, {nbytes}) for inner chunk {chunk_index} overflows"
                    )));
                }
            }
        }
        Ok(index)
    }

    /// The number of inner chunks along each dimension of the shard.
    #[must_use]
    pub fn chunks_per_shard(&self) -> &ChunkShape {
        &self.chunks_per_shard
    }

    /// The number of inner chunks in the shard.
    #[must_use]
    pub fn num_chunks(&self) -> usize {
        self.entries.len() / 2
    }

    /// The flattened `(offset, nbytes)` entries.
    #[must_use]
    pub fn entries(&self) -> &[u64] {
        &self.entries
    }

    /// Returns true if every inner chunk is absent.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.iter().all(|entry| *entry == EMPTY_ENTRY)
    }

    /// Return the `(offset, nbytes)` of the inner chunk with linearised index `chunk_index`, or [`None`] if it is absent.
    #[must_use]
    pub fn lookup_index(&self, chunk_index: usize) -> Option<(u64, u64)> {
        let offset = *self.entries.get(chunk_index * 2)?;
        let nbytes = *self.entries.get(chunk_index * 2 + 1)?;
        if offset == EMPTY_ENTRY && nbytes == EMPTY_ENTRY {
            None
        } else {
            Some((offset, nbytes))
        }
    }

    /// Return the `(offset, nbytes)` of the inner chunk at `chunk_indices`, or [`None`] if it is absent or out of bounds.
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn lookup(&self, chunk_indices: &[u64]) -> Option<(u64, u64)> {
        let chunks_per_shard = self.chunks_per_shard.to_array_shape();
        if chunk_indices.len() != chunks_per_shard.len()
            || std::iter::zip(chunk_indices, &chunks_per_shard).any(|(i, n)| i >= n)
        {
            return None;
        }
        self.lookup_index(ravel_indices(chunk_indices, &chunks_per_shard) as usize)
    }

    /// Set the entry of the inner chunk with linearised index `chunk_index`.
    ///
    /// [`None`] marks the inner chunk as absent.
    ///
    /// # Panics
    /// Panics if `chunk_index` is out of bounds.
    pub fn set(&mut self, chunk_index: usize, entry: Option<(u64, u64)>) {
        let (offset, nbytes) = entry.unwrap_or((EMPTY_ENTRY, EMPTY_ENTRY));
        self.entries[chunk_index * 2] = offset;
        self.entries[chunk_index * 2 + 1] = nbytes;
    }

    /// Return the encoded bytes of the inner chunk at `chunk_indices` within `shard`, or [`None`] if it is absent.
    ///
    /// # Errors
    /// Returns [`CodecError::CorruptData`] if the entry points outside of `shard`.
    pub fn chunk_bytes<'s>(
        &self,
        shard: &'s [u8],
        chunk_indices: &[u64],
    ) -> Result<Option<&'s [u8]>, CodecError> {
        self.lookup(chunk_indices)
            .map(|entry| entry_bytes(shard, entry))
            .transpose()
    }

    /// Check that every present entry lies within a shard of `shard_len` bytes.
    ///
    /// # Errors
    /// Returns [`CodecError::CorruptData`] if an entry points outside of the shard.
    pub fn validate(&self, shard_len: u64) -> Result<(), CodecError> {
        for chunk_index in 0..self.num_chunks() {
            if let Some((offset, nbytes)) = self.lookup_index(chunk_index) {
                if offset.checked_add(nbytes).map_or(true, |end| end > shard_len) {
                    return Err(CodecError::CorruptData(format!(
                        "shard index entry ({offset}, {nbytes}) for inner chunk {chunk_index} is outside a shard of {shard_len} bytes"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[allow(clippy::cast_possible_truncation)]
fn entry_bytes(shard: &[u8], (offset, nbytes): (u64, u64)) -> Result<&[u8], CodecError> {
    offset
        .checked_add(nbytes)
        .filter(|end| *end <= shard.len() as u64)
        .map(|end| &shard[offset as usize..end as usize])
        .ok_or_else(|| {
            CodecError::CorruptData(format!(
                "shard index entry ({offset}, {nbytes}) is outside a shard of {} bytes",
                shard.len()
            ))
        })
}

fn calculate_chunks_per_shard(
    shard_shape: &[NonZeroU64],
    chunk_shape: &[NonZeroU64],
) -> Result<ChunkShape, CodecError> {
    if shard_shape.len() != chunk_shape.len() {
        return Err(CodecError::Other(format!(
            "inner chunk shape {chunk_shape:?} does not match the dimensionality of shard shape {shard_shape:?}"
        )));
    }
    std::iter::zip(shard_shape, chunk_shape)
        .map(|(s, c)| {
            if num::Integer::is_multiple_of(&s.get(), &c.get()) {
                NonZeroU64::new(s.get() / c.get())
            } else {
                None
            }
        })
        .collect::<Option<Vec<_>>>()
        .map(ChunkShape::from)
        .ok_or_else(|| {
            CodecError::Other(format!(
                "inner chunk shape {chunk_shape:?} does not evenly divide shard shape {shard_shape:?}"
            ))
        })
}

/// The decoded representation of a shard index: `chunks_per_shard + [2]` `uint64` elements.
fn sharding_index_decoded_representation(
    chunks_per_shard: &[NonZeroU64],
) -> Result<ChunkRepresentation, CodecError> {
    const TWO: NonZeroU64 = match NonZeroU64::new(2) {
        Some(two) => two,
        None => unreachable!(),
    };
    let mut index_shape = Vec::with_capacity(chunks_per_shard.len() + 1);
    index_shape.extend(chunks_per_shard);
    index_shape.push(TWO);
    ChunkRepresentation::new(
        index_shape.into(),
        DataType::UInt64,
        FillValue::from(EMPTY_ENTRY),
    )
    .map_err(|err| CodecError::Other(err.to_string()))
}

fn compute_index_encoded_size(
    index_codecs: &CodecChain,
    index_representation: &ChunkRepresentation,
) -> Result<u64, CodecError> {
    match index_codecs.compute_encoded_size(index_representation)? {
        BytesRepresentation::FixedSize(size) => Ok(size),
        _ => Err(CodecError::Other(
            "the shard index codecs must produce a fixed size output".to_string(),
        )),
    }
}

/// The subset of the inner chunk with linearised index `chunk_index` within a shard.
fn chunk_index_to_subset(
    chunk_index: u64,
    chunks_per_shard: &[u64],
    chunk_shape: &[NonZeroU64],
) -> ArraySubset {
    let chunk_indices: ArrayIndices = unravel_index(chunk_index, chunks_per_shard);
    let ranges: Vec<_> = std::iter::zip(&chunk_indices, chunk_shape)
        .map(|(i, c)| i * c.get()..(i + 1) * c.get())
        .collect();
    ArraySubset::new_with_ranges(&ranges)
}
