use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array::{
        codec::{
            ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToBytesCodecTraits, BytesCodec,
            BytesPartialDecoderTraits, CodecChain, CodecError, CodecTraits, Crc32cCodec,
        },
        BytesRepresentation, ChunkRepresentation, ChunkShape,
    },
    array_subset::{ArrayStoreBytesError, ArraySubset, IncompatibleArraySubsetAndShapeError},
    config::global_config,
    metadata::Metadata,
    plugin::PluginCreateError,
};

use super::{
    calculate_chunks_per_shard, chunk_index_to_subset, compute_index_encoded_size, entry_bytes,
    sharding_index_decoded_representation, sharding_partial_decoder::ShardingPartialDecoder,
    ShardIndex, ShardingCodecConfiguration, ShardingCodecConfigurationV1, ShardingIndexLocation,
    IDENTIFIER,
};

/// A `sharding_indexed` codec implementation.
#[derive(Clone, Debug)]
pub struct ShardingCodec {
    /// The shape of inner chunks.
    chunk_shape: ChunkShape,
    /// The codecs used to encode and decode inner chunks.
    inner_codecs: CodecChain,
    /// The codecs used to encode and decode the shard index.
    index_codecs: CodecChain,
    /// Specifies whether the shard index is located at the beginning or end of the file.
    index_location: ShardingIndexLocation,
}

impl ShardingCodec {
    /// Create a new `sharding_indexed` codec.
    #[must_use]
    pub fn new(
        chunk_shape: ChunkShape,
        inner_codecs: CodecChain,
        index_codecs: CodecChain,
        index_location: ShardingIndexLocation,
    ) -> Self {
        Self {
            chunk_shape,
            inner_codecs,
            index_codecs,
            index_location,
        }
    }

    /// Create a new `sharding_indexed` codec from a configuration.
    ///
    /// # Errors
    /// Returns a [`PluginCreateError`] if the inner or index codecs cannot be created.
    pub fn new_with_configuration(
        configuration: &ShardingCodecConfiguration,
    ) -> Result<Self, PluginCreateError> {
        let ShardingCodecConfiguration::V1(configuration) = configuration;
        let inner_codecs = CodecChain::from_metadata(&configuration.codecs)?;
        let index_codecs = CodecChain::from_metadata(&configuration.index_codecs)?;
        Ok(Self::new(
            configuration.chunk_shape.clone(),
            inner_codecs,
            index_codecs,
            configuration.index_location,
        ))
    }

    /// The default shard index codecs: little endian `bytes` then `crc32c`.
    #[must_use]
    pub fn default_index_codecs() -> CodecChain {
        CodecChain::new(
            vec![],
            Box::new(BytesCodec::little()),
            vec![Box::new(Crc32cCodec::new())],
        )
    }

    /// The shape of inner chunks.
    #[must_use]
    pub fn chunk_shape(&self) -> &ChunkShape {
        &self.chunk_shape
    }

    /// The codecs used to encode and decode inner chunks.
    #[must_use]
    pub fn inner_codecs(&self) -> &CodecChain {
        &self.inner_codecs
    }

    /// The codecs used to encode and decode the shard index.
    #[must_use]
    pub fn index_codecs(&self) -> &CodecChain {
        &self.index_codecs
    }

    /// The location of the shard index.
    #[must_use]
    pub const fn index_location(&self) -> ShardingIndexLocation {
        self.index_location
    }

    pub(super) fn chunks_per_shard(
        &self,
        shard_representation: &ChunkRepresentation,
    ) -> Result<ChunkShape, CodecError> {
        calculate_chunks_per_shard(shard_representation.shape(), &self.chunk_shape)
    }

    pub(super) fn inner_chunk_representation(
        &self,
        shard_representation: &ChunkRepresentation,
    ) -> Result<ChunkRepresentation, CodecError> {
        ChunkRepresentation::new(
            self.chunk_shape.clone(),
            *shard_representation.data_type(),
            shard_representation.fill_value().clone(),
        )
        .map_err(|err| CodecError::Other(err.to_string()))
    }

    /// Return the decoded representation and encoded size of the shard index.
    pub(super) fn index_representation(
        &self,
        chunks_per_shard: &ChunkShape,
    ) -> Result<(ChunkRepresentation, u64), CodecError> {
        let index_representation = sharding_index_decoded_representation(chunks_per_shard)?;
        let index_size = compute_index_encoded_size(&self.index_codecs, &index_representation)?;
        Ok((index_representation, index_size))
    }

    /// Decode the index of an encoded shard and check that its entries lie within the shard.
    ///
    /// # Errors
    /// Returns a [`CodecError`] if the shard is smaller than its index, the index fails to decode, or an entry lies outside the shard.
    #[allow(clippy::cast_possible_truncation)]
    pub fn decode_index(
        &self,
        encoded_shard: &[u8],
        shard_representation: &ChunkRepresentation,
    ) -> Result<ShardIndex, CodecError> {
        let chunks_per_shard = self.chunks_per_shard(shard_representation)?;
        let (index_representation, index_size) = self.index_representation(&chunks_per_shard)?;
        let shard_len = encoded_shard.len() as u64;
        if shard_len < index_size {
            return Err(CodecError::CorruptData(format!(
                "a shard of {shard_len} bytes is smaller than its index of {index_size} bytes"
            )));
        }
        let encoded_index = match self.index_location {
            ShardingIndexLocation::Start => &encoded_shard[..index_size as usize],
            ShardingIndexLocation::End => &encoded_shard[(shard_len - index_size) as usize..],
        };
        let index = self.decode_index_bytes(
            encoded_index.to_vec(),
            chunks_per_shard,
            &index_representation,
        )?;
        index.validate(shard_len)?;
        Ok(index)
    }

    pub(super) fn decode_index_bytes(
        &self,
        encoded_index: Vec<u8>,
        chunks_per_shard: ChunkShape,
        index_representation: &ChunkRepresentation,
    ) -> Result<ShardIndex, CodecError> {
        let decoded_index = self
            .index_codecs
            .decode(encoded_index, index_representation)?;
        let entries: Vec<u64> = bytemuck::pod_collect_to_vec(&decoded_index);
        ShardIndex::from_entries(chunks_per_shard, entries)
    }

    fn encode_index(
        &self,
        index: &ShardIndex,
        index_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        self.index_codecs.encode(
            bytemuck::cast_slice(index.entries()).to_vec(),
            index_representation,
        )
    }

    /// Lay out the encoded inner chunks in order and add the shard index.
    fn pack(
        &self,
        encoded_chunks: Vec<Option<Vec<u8>>>,
        chunks_per_shard: ChunkShape,
    ) -> Result<Vec<u8>, CodecError> {
        let (index_representation, index_size) = self.index_representation(&chunks_per_shard)?;
        let mut index = ShardIndex::new_empty(chunks_per_shard);
        let mut offset = match self.index_location {
            ShardingIndexLocation::Start => index_size,
            ShardingIndexLocation::End => 0,
        };
        for (chunk_index, encoded_chunk) in encoded_chunks.iter().enumerate() {
            if let Some(encoded_chunk) = encoded_chunk {
                let nbytes = encoded_chunk.len() as u64;
                index.set(chunk_index, Some((offset, nbytes)));
                offset += nbytes;
            }
        }

        let encoded_index = self.encode_index(&index, &index_representation)?;
        if encoded_index.len() as u64 != index_size {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                encoded_index.len(),
                index_size,
            ));
        }
        let chunks_size: usize = encoded_chunks.iter().flatten().map(Vec::len).sum();
        let mut shard = Vec::with_capacity(chunks_size + encoded_index.len());
        if self.index_location == ShardingIndexLocation::Start {
            shard.extend_from_slice(&encoded_index);
        }
        for encoded_chunk in encoded_chunks.into_iter().flatten() {
            shard.extend(encoded_chunk);
        }
        if self.index_location == ShardingIndexLocation::End {
            shard.extend(encoded_index);
        }
        Ok(shard)
    }

    /// Encode an inner chunk, or return [`None`] if it is entirely the fill value.
    fn encode_chunk(
        &self,
        chunk_subset: &ArraySubset,
        decoded_shard: &[u8],
        shard_representation: &ChunkRepresentation,
        chunk_representation: &ChunkRepresentation,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        let chunk_bytes = chunk_subset.extract_bytes(
            decoded_shard,
            &shard_representation.shape_u64(),
            shard_representation.element_size(),
        )?;
        if chunk_representation.fill_value().equals_all(&chunk_bytes) {
            Ok(None)
        } else {
            Ok(Some(
                self.inner_codecs.encode(chunk_bytes, chunk_representation)?,
            ))
        }
    }

    /// Decode the inner chunk with linearised index `chunk_index`, or return [`None`] if it is absent.
    fn decode_chunk(
        &self,
        encoded_shard: &[u8],
        index: &ShardIndex,
        chunk_index: usize,
        chunk_representation: &ChunkRepresentation,
    ) -> Result<Option<Vec<u8>>, CodecError> {
        index
            .lookup_index(chunk_index)
            .map(|entry| {
                let encoded_chunk = entry_bytes(encoded_shard, entry)?;
                self.inner_codecs
                    .decode(encoded_chunk.to_vec(), chunk_representation)
            })
            .transpose()
    }

    /// Update the part of an inner chunk overlapping `array_subset`, keeping its encoded bytes if there is no overlap.
    #[allow(clippy::too_many_arguments)]
    fn partial_encode_chunk(
        &self,
        encoded_shard: &[u8],
        index: &ShardIndex,
        chunk_index: usize,
        chunks_per_shard: &[u64],
        chunk_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        subset_bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, CodecError> {
        let encoded_chunk = index
            .lookup_index(chunk_index)
            .map(|entry| entry_bytes(encoded_shard, entry).map(<[u8]>::to_vec))
            .transpose()?;
        let chunk_subset =
            chunk_index_to_subset(chunk_index as u64, chunks_per_shard, &self.chunk_shape);
        let overlap = array_subset
            .overlap(&chunk_subset)
            .map_err(|err| CodecError::Other(err.to_string()))?;
        if overlap.is_empty() {
            return Ok(encoded_chunk);
        }

        let overlap_bytes = overlap
            .relative_to(array_subset.start())
            .map_err(|err| CodecError::Other(err.to_string()))?
            .extract_bytes(
                subset_bytes,
                array_subset.shape(),
                chunk_representation.element_size(),
            )?;
        let chunk_overlap = overlap
            .relative_to(chunk_subset.start())
            .map_err(|err| CodecError::Other(err.to_string()))?;
        self.inner_codecs.partial_encode(
            encoded_chunk,
            chunk_representation,
            &chunk_overlap,
            &overlap_bytes,
        )
    }
}

impl CodecTraits for ShardingCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = ShardingCodecConfigurationV1::new(
            self.chunk_shape.clone(),
            self.inner_codecs.create_metadatas(),
            self.index_codecs.create_metadatas(),
            self.index_location,
        );
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl ArrayCodecTraits for ShardingCodec {
    #[allow(clippy::cast_possible_truncation)]
    fn encode(
        &self,
        decoded_value: Vec<u8>,
        shard_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        if decoded_value.len() as u64 != shard_representation.size() {
            return Err(CodecError::UnexpectedChunkDecodedSize(
                decoded_value.len(),
                shard_representation.size(),
            ));
        }

        let chunks_per_shard = self.chunks_per_shard(shard_representation)?;
        let chunk_representation = self.inner_chunk_representation(shard_representation)?;
        let chunks_per_shard_u64 = chunks_per_shard.to_array_shape();
        let num_chunks = chunks_per_shard.num_elements() as usize;
        let chunk_concurrent_limit = global_config().chunk_concurrent_limit().max(1);

        let encoded_chunks = iter_concurrent_limit!(
            chunk_concurrent_limit,
            0..num_chunks,
            map,
            |chunk_index: usize| {
                let chunk_subset = chunk_index_to_subset(
                    chunk_index as u64,
                    &chunks_per_shard_u64,
                    &self.chunk_shape,
                );
                self.encode_chunk(
                    &chunk_subset,
                    &decoded_value,
                    shard_representation,
                    &chunk_representation,
                )
            }
        )
        .collect::<Result<Vec<_>, CodecError>>()?;

        self.pack(encoded_chunks, chunks_per_shard)
    }

    #[allow(clippy::cast_possible_truncation)]
    fn decode(
        &self,
        encoded_value: Vec<u8>,
        shard_representation: &ChunkRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let index = self.decode_index(&encoded_value, shard_representation)?;
        let chunk_representation = self.inner_chunk_representation(shard_representation)?;
        let chunks_per_shard = index.chunks_per_shard().to_array_shape();
        let chunk_concurrent_limit = global_config().chunk_concurrent_limit().max(1);

        let decoded_chunks = iter_concurrent_limit!(
            chunk_concurrent_limit,
            0..index.num_chunks(),
            map,
            |chunk_index: usize| {
                self.decode_chunk(&encoded_value, &index, chunk_index, &chunk_representation)
            }
        )
        .collect::<Result<Vec<_>, CodecError>>()?;

        // Absent inner chunks keep the fill value
        let shard_shape = shard_representation.shape_u64();
        let mut decoded_value = shard_representation.fill_value_bytes();
        for (chunk_index, decoded_chunk) in decoded_chunks.into_iter().enumerate() {
            if let Some(decoded_chunk) = decoded_chunk {
                let chunk_subset = chunk_index_to_subset(
                    chunk_index as u64,
                    &chunks_per_shard,
                    &self.chunk_shape,
                );
                chunk_subset.store_bytes(
                    &decoded_chunk,
                    &mut decoded_value,
                    &shard_shape,
                    shard_representation.element_size(),
                )?;
            }
        }
        Ok(decoded_value)
    }
}

impl ArrayToBytesCodecTraits for ShardingCodec {
    fn compute_encoded_size(
        &self,
        shard_representation: &ChunkRepresentation,
    ) -> Result<BytesRepresentation, CodecError> {
        let chunks_per_shard = self.chunks_per_shard(shard_representation)?;
        let chunk_representation = self.inner_chunk_representation(shard_representation)?;
        let (_, index_size) = self.index_representation(&chunks_per_shard)?;
        let chunk_size = self
            .inner_codecs
            .compute_encoded_size(&chunk_representation)?;
        Ok(chunk_size
            .size()
            .map_or(BytesRepresentation::UnboundedSize, |chunk_size| {
                BytesRepresentation::BoundedSize(
                    chunks_per_shard.num_elements() * chunk_size + index_size,
                )
            }))
    }

    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        shard_representation: &ChunkRepresentation,
    ) -> Result<Box<dyn ArrayPartialDecoderTraits + 'a>, CodecError> {
        Ok(Box::new(ShardingPartialDecoder::new(
            input_handle,
            self,
            shard_representation.clone(),
        )?))
    }

    /// Only the inner chunks overlapping `array_subset` are re-encoded, the encoded bytes of other inner chunks are kept.
    fn partial_encode(
        &self,
        encoded_value: Option<Vec<u8>>,
        shard_representation: &ChunkRepresentation,
        array_subset: &ArraySubset,
        subset_bytes: &[u8],
    ) -> Result<Option<Vec<u8>>, CodecError> {
        let shard_shape = shard_representation.shape_u64();
        if !array_subset.inbounds(&shard_shape) {
            return Err(
                IncompatibleArraySubsetAndShapeError::new(array_subset.clone(), shard_shape).into(),
            );
        }
        let expected_subset_size =
            array_subset.num_elements() * shard_representation.element_size() as u64;
        if subset_bytes.len() as u64 != expected_subset_size {
            return Err(ArrayStoreBytesError::InvalidSubsetBytes(
                subset_bytes.len(),
                expected_subset_size,
            )
            .into());
        }

        let chunks_per_shard = self.chunks_per_shard(shard_representation)?;
        let chunk_representation = self.inner_chunk_representation(shard_representation)?;
        let index = match &encoded_value {
            Some(encoded_shard) => self.decode_index(encoded_shard, shard_representation)?,
            None => ShardIndex::new_empty(chunks_per_shard.clone()),
        };
        let encoded_shard = encoded_value.unwrap_or_default();
        let chunks_per_shard_u64 = chunks_per_shard.to_array_shape();
        let chunk_concurrent_limit = global_config().chunk_concurrent_limit().max(1);

        let encoded_chunks = iter_concurrent_limit!(
            chunk_concurrent_limit,
            0..index.num_chunks(),
            map,
            |chunk_index: usize| {
                self.partial_encode_chunk(
                    &encoded_shard,
                    &index,
                    chunk_index,
                    &chunks_per_shard_u64,
                    &chunk_representation,
                    array_subset,
                    subset_bytes,
                )
            }
        )
        .collect::<Result<Vec<_>, CodecError>>()?;

        if encoded_chunks.iter().all(Option::is_none) {
            Ok(None)
        } else {
            Ok(Some(self.pack(encoded_chunks, chunks_per_shard)?))
        }
    }
}
