//! The `transpose` array to array codec.
//!
//! Permutes the dimensions of arrays.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/transpose/v1.0.html>.

mod transpose_codec;
mod transpose_configuration;

pub use transpose_codec::TransposeCodec;
pub use transpose_configuration::{
    InvalidPermutationError, TransposeCodecConfiguration, TransposeCodecConfigurationV1,
    TransposeOrder,
};

use crate::{
    array::codec::{Codec, CodecError, CodecPlugin},
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

/// The identifier for the `transpose` codec.
pub const IDENTIFIER: &str = "transpose";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, create_codec_transpose)
}


pub(crate) fn create_codec_transpose(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: TransposeCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(TransposeCodec::new_with_configuration(&configuration));
    Ok(Codec::ArrayToArray(codec))
}

/// The inverse of `permutation`.
fn inverse_permutation(permutation: &[usize]) -> Vec<usize> {
    let mut inverse = vec![0; permutation.len()];
    for (i, axis) in permutation.iter().enumerate() {
        inverse[*axis] = i;
    }
    inverse
}

fn permute<T: Copy>(v: &[T], permutation: &[usize]) -> Vec<T> {
    permutation.iter().map(|axis| v[*axis]).collect()
}

/// Transpose a C order array of elements with `bytes_per_element` bytes.
///
/// The element bytes are treated as a trailing dimension that is never permuted.
fn transpose_array(
    permutation: &[usize],
    untransposed_shape: &[u64],
    bytes_per_element: usize,
    data: &[u8],
) -> Result<Vec<u8>, CodecError> {
    let mut shape = untransposed_shape
        .iter()
        .map(|size| usize::try_from(*size))
        .collect::<Result<Vec<_>, _>>()
        .map_err(|err| CodecError::Other(err.to_string()))?;
    shape.push(bytes_per_element);
    let mut permutation = permutation.to_vec();
    permutation.push(untransposed_shape.len());

    let array = ndarray::ArrayViewD::<u8>::from_shape(shape, data)
        .map_err(|err| CodecError::Other(err.to_string()))?;
    Ok(array.permuted_axes(permutation).iter().copied().collect())
}

#[cfg(test)]
mod tests {
    use crate::{
        array::{
            codec::{
                ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToArrayCodecTraits,
                ArrayToBytesCodecTraits, BytesCodec, CodecTraits,
            },
            ChunkRepresentation, DataType, FillValue,
        },
        array_subset::ArraySubset,
    };

    use super::*;

    fn chunk_representation(data_type: DataType, fill_value: FillValue) -> ChunkRepresentation {
        ChunkRepresentation::new(vec![2, 2, 3].try_into().unwrap(), data_type, fill_value).unwrap()
    }

    fn codec_transpose_round_trip_impl(json: &str, data_type: DataType, fill_value: FillValue) {
        let chunk_representation = chunk_representation(data_type, fill_value);
        let bytes: Vec<u8> = (0..chunk_representation.size()).map(|s| s as u8).collect();

        let configuration: TransposeCodecConfiguration = serde_json::from_str(json).unwrap();
        let codec = TransposeCodec::new_with_configuration(&configuration);

        let encoded = codec.encode(bytes.clone(), &chunk_representation).unwrap();
        let decoded = codec.decode(encoded, &chunk_representation).unwrap();
        assert_eq!(bytes, decoded);
    }

    #[test]
    fn codec_transpose_round_trip_array1() {
        codec_transpose_round_trip_impl(r#"{"order":[0,2,1]}"#, DataType::UInt8, 0u8.into());
    }

    #[test]
    fn codec_transpose_round_trip_array2() {
        codec_transpose_round_trip_impl(r#"{"order":[2,1,0]}"#, DataType::UInt16, 0u16.into());
    }

    #[test]
    fn codec_transpose_round_trip_f() {
        codec_transpose_round_trip_impl(r#"{"order":"F"}"#, DataType::Float64, 0f64.into());
    }

    #[test]
    fn codec_transpose_encoded_layout() {
        // [[0, 1, 2], [3, 4, 5]] transposed is [[0, 3], [1, 4], [2, 5]]
        let chunk_representation =
            ChunkRepresentation::new(vec![2, 3].try_into().unwrap(), DataType::UInt8, 0u8.into())
                .unwrap();
        let codec = TransposeCodec::new(TransposeOrder::F);
        let encoded = codec
            .encode((0..6).collect(), &chunk_representation)
            .unwrap();
        assert_eq!(encoded, vec![0, 3, 1, 4, 2, 5]);
        let encoded_representation = codec.compute_encoded_size(&chunk_representation).unwrap();
        assert_eq!(encoded_representation.shape_u64(), vec![3, 2]);
    }

    #[test]
    fn codec_transpose_rank_mismatch() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[1, 0]).unwrap());
        let chunk_representation = chunk_representation(DataType::UInt8, 0u8.into());
        assert!(codec.compute_encoded_size(&chunk_representation).is_err());
        assert!(codec
            .encode(vec![0; 12], &chunk_representation)
            .is_err());
    }

    #[test]
    fn codec_transpose_metadata() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[2, 1, 0]).unwrap());
        assert_eq!(
            serde_json::to_string(&codec.create_metadata().unwrap()).unwrap(),
            r#"{"name":"transpose","configuration":{"order":[2,1,0]}}"#
        );
    }

    #[test]
    fn codec_transpose_partial_decode() {
        let codec = TransposeCodec::new(TransposeOrder::new(&[1, 0]).unwrap());
        let chunk_representation =
            ChunkRepresentation::new(vec![4, 4].try_into().unwrap(), DataType::UInt8, 0u8.into())
                .unwrap();
        let elements: Vec<u8> = (0..16).collect();
        let encoded = codec.encode(elements, &chunk_representation).unwrap();

        let bytes_codec = BytesCodec::default();
        let encoded_representation = codec.compute_encoded_size(&chunk_representation).unwrap();
        let input_handle = bytes_codec
            .partial_decoder(
                Box::new(std::io::Cursor::new(encoded)),
                &encoded_representation,
            )
            .unwrap();
        let partial_decoder = codec
            .partial_decoder(input_handle, &chunk_representation)
            .unwrap();
        let decoded = partial_decoder
            .partial_decode(&[
                ArraySubset::new_with_ranges(&[0..1, 0..4]),
                ArraySubset::new_with_ranges(&[1..3, 1..2]),
            ])
            .unwrap();
        assert_eq!(decoded, vec![vec![0, 1, 2, 3], vec![5, 9]]);
    }
}
