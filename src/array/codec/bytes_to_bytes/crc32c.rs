//! The `crc32c` (CRC32C checksum) bytes to bytes codec.
//!
//! Appends a little-endian CRC32C checksum of the input bytestream.
//! The checksum is verified on decode if [`validate_checksums`](crate::config::Config#validate-checksums) is enabled.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/codecs/crc32c/v1.0.html>.

mod crc32c_codec;
mod crc32c_partial_decoder;

pub use crc32c_codec::Crc32cCodec;

use derive_more::{Display, From};
use serde::{Deserialize, Serialize};

use crate::{
    array::codec::{Codec, CodecPlugin},
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

/// The identifier for the `crc32c` codec.
pub const IDENTIFIER: &str = "crc32c";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, create_codec_crc32c)
}


pub(crate) fn create_codec_crc32c(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(Crc32cCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

const CHECKSUM_SIZE: usize = core::mem::size_of::<u32>();

/// A wrapper to handle various versions of `crc32c` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum Crc32cCodecConfiguration {
    /// Version 1.0.
    V1(Crc32cCodecConfigurationV1),
}

/// Configuration parameters for the `crc32c` codec (version 1.0). There are none.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, Default)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct Crc32cCodecConfigurationV1 {}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use crate::{
        array::{
            codec::{BytesPartialDecoderTraits, BytesToBytesCodecTraits, CodecError, CodecTraits},
            BytesRepresentation,
        },
        byte_range::ByteRange,
    };

    use super::*;

    const JSON1: &str = r"{}";

    #[test]
    fn codec_crc32c_configuration_none() {
        let codec_configuration: Crc32cCodecConfiguration = serde_json::from_str(JSON1).unwrap();
        let codec = Crc32cCodec::new_with_configuration(&codec_configuration);
        let metadata = codec.create_metadata().unwrap();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"name":"crc32c"}"#
        );
    }

    #[test]
    fn codec_crc32c() {
        let bytes: Vec<u8> = (0..6).collect();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);
        let codec = Crc32cCodec::new();

        let encoded = codec.encode(bytes.clone()).unwrap();
        let decoded = codec
            .decode(encoded.clone(), &bytes_representation)
            .unwrap();
        assert_eq!(bytes, decoded);

        let checksum: &[u8; 4] = &encoded[encoded.len() - CHECKSUM_SIZE..]
            .try_into()
            .unwrap();
        assert_eq!(checksum, &[20, 133, 9, 65]);
    }

    #[test]
    fn codec_crc32c_invalid_checksum() {
        let codec = Crc32cCodec::new();
        let mut encoded = codec.encode(vec![1, 2, 3]).unwrap();
        encoded[0] = 0;
        assert!(matches!(
            codec.decode(encoded, &BytesRepresentation::FixedSize(3)),
            Err(CodecError::InvalidChecksum)
        ));
        assert!(matches!(
            codec.decode(vec![0, 1], &BytesRepresentation::FixedSize(3)),
            Err(CodecError::CorruptData(_))
        ));
    }

    #[test]
    fn codec_crc32c_partial_decode() {
        let bytes: Vec<u8> = (0..32).collect();
        let bytes_representation = BytesRepresentation::FixedSize(bytes.len() as u64);
        let codec = Crc32cCodec::new();

        let encoded = codec.encode(bytes).unwrap();
        let decoded_regions = [
            ByteRange::FromStart(3, Some(2)),
            ByteRange::FromEnd(1, Some(2)),
            ByteRange::FromStart(29, None),
        ];
        let input_handle = Box::new(Cursor::new(encoded));
        let partial_decoder = codec
            .partial_decoder(input_handle, &bytes_representation)
            .unwrap();
        let decoded_partial_chunk = partial_decoder
            .partial_decode(&decoded_regions)
            .unwrap()
            .unwrap();
        assert_eq!(
            decoded_partial_chunk,
            vec![vec![3, 4], vec![29, 30], vec![29, 30, 31]]
        );
    }
}
