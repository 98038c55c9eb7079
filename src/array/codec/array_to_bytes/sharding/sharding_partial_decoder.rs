use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array::{
        codec::{
            ArrayPartialDecoderTraits, ArrayToBytesCodecTraits, ByteIntervalPartialDecoder,
            BytesPartialDecoderTraits, CodecError,
        },
        ChunkRepresentation,
    },
    array_subset::{ArraySubset, IncompatibleArraySubsetAndShapeError},
    byte_range::ByteRange,
    config::global_config,
    storage::StorageError,
};

use super::{ShardIndex, ShardingCodec, ShardingIndexLocation};

/// Partial decoder for the `sharding_indexed` codec.
///
/// The shard index is read on creation. Only the inner chunks overlapping a requested subset are read afterwards.
pub(super) struct ShardingPartialDecoder<'a> {
    input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
    codec: &'a ShardingCodec,
    shard_representation: ChunkRepresentation,
    chunk_representation: ChunkRepresentation,
    index: Option<ShardIndex>,
}

impl<'a> ShardingPartialDecoder<'a> {
    /// Create a new partial decoder for the `sharding_indexed` codec.
    ///
    /// The index is [`None`] if the shard is absent.
    pub(super) fn new(
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        codec: &'a ShardingCodec,
        shard_representation: ChunkRepresentation,
    ) -> Result<Self, CodecError> {
        let chunks_per_shard = codec.chunks_per_shard(&shard_representation)?;
        let chunk_representation = codec.inner_chunk_representation(&shard_representation)?;
        let (index_representation, index_size) = codec.index_representation(&chunks_per_shard)?;
        let index_byte_range = match codec.index_location() {
            ShardingIndexLocation::Start => ByteRange::FromStart(0, Some(index_size)),
            ShardingIndexLocation::End => ByteRange::FromEnd(0, Some(index_size)),
        };
        let encoded_index = input_handle
            .partial_decode(&[index_byte_range])
            .map_err(out_of_range_to_corrupt)?
            .and_then(|mut encoded_index| encoded_index.pop());
        let index = encoded_index
            .map(|encoded_index| {
                codec.decode_index_bytes(encoded_index, chunks_per_shard, &index_representation)
            })
            .transpose()?;
        Ok(Self {
            input_handle,
            codec,
            shard_representation,
            chunk_representation,
            index,
        })
    }

    /// Decode the part of the inner chunk at `chunk_indices` overlapping `array_subset`.
    ///
    /// Returns [`None`] if the inner chunk is absent.
    fn decode_chunk_overlap(
        &self,
        index: &ShardIndex,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
        array_subset: &ArraySubset,
    ) -> Result<Option<(ArraySubset, Vec<u8>)>, CodecError> {
        let Some((offset, nbytes)) = index.lookup(chunk_indices) else {
            return Ok(None);
        };
        let overlap = array_subset
            .overlap(chunk_subset)
            .map_err(|err| CodecError::Other(err.to_string()))?;
        if overlap.is_empty() {
            return Ok(None);
        }
        let chunk_overlap = overlap
            .relative_to(chunk_subset.start())
            .map_err(|err| CodecError::Other(err.to_string()))?;

        let input_handle = ByteIntervalPartialDecoder::new(&*self.input_handle, offset, nbytes);
        let decoded = self
            .codec
            .inner_codecs()
            .partial_decoder(Box::new(input_handle), &self.chunk_representation)?
            .partial_decode(&[chunk_overlap])
            .map_err(out_of_range_to_corrupt)?
            .pop()
            .unwrap_or_default();
        Ok(Some((overlap, decoded)))
    }

    fn partial_decode_subset(
        &self,
        index: &ShardIndex,
        array_subset: &ArraySubset,
    ) -> Result<Vec<u8>, CodecError> {
        let element_size = self.shard_representation.element_size();
        let chunks: Vec<_> = array_subset
            .chunks(self.codec.chunk_shape())
            .map_err(|err| CodecError::Other(err.to_string()))?
            .collect();
        let chunk_concurrent_limit = global_config().chunk_concurrent_limit().max(1);
        let decoded_chunks = iter_concurrent_limit!(
            chunk_concurrent_limit,
            chunks,
            map,
            |(chunk_indices, chunk_subset): (Vec<u64>, ArraySubset)| {
                self.decode_chunk_overlap(index, &chunk_indices, &chunk_subset, array_subset)
            }
        )
        .collect::<Result<Vec<_>, CodecError>>()?;

        let mut decoded = self
            .shard_representation
            .fill_value()
            .repeat(array_subset.num_elements_usize());
        for (overlap, decoded_chunk) in decoded_chunks.into_iter().flatten() {
            overlap
                .relative_to(array_subset.start())
                .map_err(|err| CodecError::Other(err.to_string()))?
                .store_bytes(
                    &decoded_chunk,
                    &mut decoded,
                    array_subset.shape(),
                    element_size,
                )?;
        }
        Ok(decoded)
    }
}

impl ArrayPartialDecoderTraits for ShardingPartialDecoder<'_> {
    fn partial_decode(&self, array_subsets: &[ArraySubset]) -> Result<Vec<Vec<u8>>, CodecError> {
        let shard_shape = self.shard_representation.shape_u64();
        for array_subset in array_subsets {
            if !array_subset.inbounds(&shard_shape) {
                return Err(IncompatibleArraySubsetAndShapeError::new(
                    array_subset.clone(),
                    shard_shape,
                )
                .into());
            }
        }

        let Some(index) = &self.index else {
            let fill_value = self.shard_representation.fill_value();
            return Ok(array_subsets
                .iter()
                .map(|array_subset| fill_value.repeat(array_subset.num_elements_usize()))
                .collect());
        };
        array_subsets
            .iter()
            .map(|array_subset| self.partial_decode_subset(index, array_subset))
            .collect()
    }
}

/// A byte range outside of a shard means its index is corrupt.
fn out_of_range_to_corrupt(err: CodecError) -> CodecError {
    match err {
        CodecError::InvalidByteRangeError(err)
        | CodecError::StorageError(StorageError::InvalidByteRangeError(err)) => {
            CodecError::CorruptData(format!("shard index entry is outside the shard: {err}"))
        }
        err => err,
    }
}
