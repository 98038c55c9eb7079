//! The `bytes` array to bytes codec.
//!
//! Encodes arrays of fixed-size numeric data types as little endian or big endian in lexicographical order.
//! The `endian` of the codec may be omitted for single byte data types and raw bits, for which it has no effect.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/bytes/v1.0.html>.

mod bytes_codec;
mod bytes_partial_decoder;

pub use bytes_codec::BytesCodec;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::{
    array::{
        codec::{Codec, CodecPlugin},
        DataType, Endianness,
    },
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

/// The identifier for the `bytes` codec.
pub const IDENTIFIER: &str = "bytes";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, create_codec_bytes)
}


pub(crate) fn create_codec_bytes(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: BytesCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(BytesCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToBytes(codec))
}

/// A wrapper to handle various versions of `bytes` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum BytesCodecConfiguration {
    /// Version 1.0.
    V1(BytesCodecConfigurationV1),
}

/// Configuration parameters for the `bytes` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, Default)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct BytesCodecConfigurationV1 {
    /// The target endianness.
    ///
    /// Required if the data type is larger than one byte.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endian: Option<Endianness>,
}

impl BytesCodecConfigurationV1 {
    /// Create a new `bytes` codec configuration.
    #[must_use]
    pub const fn new(endian: Option<Endianness>) -> Self {
        Self { endian }
    }
}

/// Returns true if the byte order of elements of `data_type` is significant.
const fn has_endianness(data_type: DataType) -> bool {
    !matches!(data_type, DataType::RawBits(_)) && data_type.size() > 1
}

/// Reverse the byte order of each element of `data_type` in `bytes`.
fn reverse_endianness(bytes: &mut [u8], data_type: DataType) {
    if has_endianness(data_type) {
        bytes
            .chunks_exact_mut(data_type.size())
            .for_each(<[u8]>::reverse);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{
        array::{
            codec::{
                ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToBytesCodecTraits, CodecError,
                CodecTraits,
            },
            BytesRepresentation, ChunkRepresentation, FillValue,
        },
        array_subset::ArraySubset,
    };

    use super::*;

    #[test]
    fn codec_bytes_configuration_big() {
        let codec_configuration: BytesCodecConfiguration =
            serde_json::from_str(r#"{"endian":"big"}"#).unwrap();
        let codec = BytesCodec::new_with_configuration(&codec_configuration);
        let metadata = codec.create_metadata().unwrap();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"bytes","configuration":{"endian":"big"}}"#
        );
    }

    #[test]
    fn codec_bytes_configuration_none() {
        let codec_configuration: BytesCodecConfiguration = serde_json::from_str(r"{}").unwrap();
        let codec = BytesCodec::new_with_configuration(&codec_configuration);
        let metadata = codec.create_metadata().unwrap();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"bytes"}"#
        );
        assert!(serde_json::from_str::<BytesCodecConfiguration>(r#"{"endian":"middle"}"#).is_err());
    }

    fn codec_bytes_round_trip_impl(
        endianness: Option<Endianness>,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<(), Box<dyn std::error::Error>> {
        let chunk_representation =
            ChunkRepresentation::new(vec![10, 10].try_into()?, data_type, fill_value)?;
        let bytes: Vec<u8> = (0..chunk_representation.size()).map(|s| s as u8).collect();

        let codec = BytesCodec::new(endianness);

        let encoded = codec.encode(bytes.clone(), &chunk_representation)?;
        let decoded = codec.decode(encoded, &chunk_representation)?;
        assert_eq!(bytes, decoded);
        Ok(())
    }

    #[test]
    fn codec_bytes_round_trip() {
        codec_bytes_round_trip_impl(Some(Endianness::Big), DataType::Float32, 0.0f32.into())
            .unwrap();
        codec_bytes_round_trip_impl(Some(Endianness::Little), DataType::Int64, 0i64.into())
            .unwrap();
        codec_bytes_round_trip_impl(None, DataType::UInt8, 0u8.into()).unwrap();
        codec_bytes_round_trip_impl(None, DataType::RawBits(3), vec![0, 0, 0].into()).unwrap();
        assert!(codec_bytes_round_trip_impl(None, DataType::UInt16, 0u16.into()).is_err());
    }

    #[test]
    fn codec_bytes_big_endian_layout() {
        let chunk_representation = ChunkRepresentation::new(
            vec![2].try_into().unwrap(),
            DataType::Int16,
            0i16.into(),
        )
        .unwrap();
        let elements: Vec<i16> = vec![1, 2];
        let bytes = bytemuck::cast_slice::<i16, u8>(&elements).to_vec();
        let encoded = BytesCodec::big()
            .encode(bytes.clone(), &chunk_representation)
            .unwrap();
        assert_eq!(encoded, vec![0, 1, 0, 2]);
        let encoded = BytesCodec::little()
            .encode(bytes, &chunk_representation)
            .unwrap();
        assert_eq!(encoded, vec![1, 0, 2, 0]);
    }

    #[test]
    fn codec_bytes_encoded_size() {
        let chunk_representation = ChunkRepresentation::new(
            vec![4, 4].try_into().unwrap(),
            DataType::UInt32,
            0u32.into(),
        )
        .unwrap();
        assert_eq!(
            BytesCodec::little()
                .compute_encoded_size(&chunk_representation)
                .unwrap(),
            BytesRepresentation::FixedSize(64)
        );
        assert!(matches!(
            BytesCodec::new(None).compute_encoded_size(&chunk_representation),
            Err(CodecError::Other(_))
        ));
    }

    #[test]
    fn codec_bytes_partial_decode() {
        let chunk_representation = ChunkRepresentation::new(
            vec![4, 4].try_into().unwrap(),
            DataType::UInt8,
            0u8.into(),
        )
        .unwrap();
        let elements: Vec<u8> = (0..chunk_representation.num_elements() as u8).collect();

        let codec = BytesCodec::new(None);
        let encoded = codec.encode(elements, &chunk_representation).unwrap();
        let input_handle = Box::new(Cursor::new(encoded));
        let partial_decoder = codec
            .partial_decoder(input_handle, &chunk_representation)
            .unwrap();
        let decoded_regions = [ArraySubset::new_with_ranges(&[1..3, 0..1])];
        let decoded = partial_decoder.partial_decode(&decoded_regions).unwrap();
        assert_eq!(decoded, vec![vec![4, 8]]);
    }

    #[test]
    fn codec_bytes_partial_decode_size_mismatch() {
        let chunk_representation = ChunkRepresentation::new(
            vec![4].try_into().unwrap(),
            DataType::Int16,
            0i16.into(),
        )
        .unwrap();
        let codec = BytesCodec::little();
        let region = [ArraySubset::new_with_ranges(&[0..2])];
        for encoded in [vec![1, 0, 2], vec![0; 12]] {
            let partial_decoder = codec
                .partial_decoder(Box::new(Cursor::new(encoded)), &chunk_representation)
                .unwrap();
            assert!(matches!(
                partial_decoder.partial_decode(&region),
                Err(CodecError::CorruptData(_))
            ));
        }
    }

    #[test]
    fn codec_bytes_partial_decode_missing() {
        struct Missing;
        impl crate::array::codec::BytesPartialDecoderTraits for Missing {
            fn partial_decode(
                &self,
                _decoded_regions: &[crate::byte_range::ByteRange],
            ) -> Result<Option<Vec<Vec<u8>>>, CodecError> {
                Ok(None)
            }
        }

        let chunk_representation = ChunkRepresentation::new(
            vec![4].try_into().unwrap(),
            DataType::UInt16,
            7u16.into(),
        )
        .unwrap();
        let codec = BytesCodec::little();
        let partial_decoder = codec
            .partial_decoder(Box::new(Missing), &chunk_representation)
            .unwrap();
        let decoded = partial_decoder
            .partial_decode(&[ArraySubset::new_with_ranges(&[1..3])])
            .unwrap();
        assert_eq!(decoded, vec![FillValue::from(7u16).repeat(2)]);
    }
}
