use std::io::{Read, Write};

use flate2::{read::GzDecoder, write::GzEncoder, Compression};

use crate::{
    array::{
        codec::{
            BytesPartialDecoderTraits, BytesToBytesCodecTraits,
            BytesToBytesPartialDecoderDefault, Codec, CodecError, CodecPlugin, CodecTraits,
        },
        BytesRepresentation,
    },
    metadata::Metadata,
    plugin::{PluginCreateError, PluginMetadataInvalidError},
};

use super::{
    GzipCodecConfiguration, GzipCodecConfigurationV1, GzipCompressionLevel,
    GzipCompressionLevelError,
};

const IDENTIFIER: &str = "gzip";

inventory::submit! {
    CodecPlugin::new(IDENTIFIER, create_codec_gzip)
}

fn create_codec_gzip(metadata: &Metadata) -> Result<Codec, PluginCreateError> {
    let configuration: GzipCodecConfiguration = metadata
        .to_configuration()
        .map_err(|_| PluginMetadataInvalidError::new(IDENTIFIER, "codec", metadata.clone()))?;
    let codec = Box::new(GzipCodec::new_with_configuration(&configuration));
    Ok(Codec::BytesToBytes(codec))
}

/// A `gzip` codec implementation.
#[derive(Clone, Debug)]
pub struct GzipCodec {
    compression_level: GzipCompressionLevel,
}

impl GzipCodec {
    /// Create a new `gzip` codec.
    ///
    /// # Errors
    /// Returns [`GzipCompressionLevelError`] if `compression_level` is not valid.
    pub fn new(compression_level: u32) -> Result<Self, GzipCompressionLevelError> {
        let compression_level: GzipCompressionLevel = compression_level.try_into()?;
        Ok(Self { compression_level })
    }

    /// Create a new `gzip` codec from configuration.
    #[must_use]
    pub const fn new_with_configuration(configuration: &GzipCodecConfiguration) -> Self {
        let GzipCodecConfiguration::V1(configuration) = configuration;
        Self {
            compression_level: configuration.level,
        }
    }
}

impl CodecTraits for GzipCodec {
    fn create_metadata(&self) -> Option<Metadata> {
        let configuration = GzipCodecConfigurationV1::new(self.compression_level);
        Metadata::new_with_serializable_configuration(IDENTIFIER, &configuration).ok()
    }
}

impl BytesToBytesCodecTraits for GzipCodec {
    fn encode(&self, decoded_value: Vec<u8>) -> Result<Vec<u8>, CodecError> {
        let mut encoder = GzEncoder::new(
            Vec::with_capacity(decoded_value.len() / 2),
            Compression::new(self.compression_level.as_u32()),
        );
        encoder.write_all(&decoded_value)?;
        Ok(encoder.finish()?)
    }

    fn decode(
        &self,
        encoded_value: Vec<u8>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Vec<u8>, CodecError> {
        let capacity = decoded_representation
            .size()
            .and_then(|size| usize::try_from(size).ok())
            .unwrap_or(encoded_value.len());
        let mut decoded_value = Vec::with_capacity(capacity);
        GzDecoder::new(encoded_value.as_slice())
            .read_to_end(&mut decoded_value)
            .map_err(|err| CodecError::CorruptData(format!("gzip: {err}")))?;
        Ok(decoded_value)
    }

    fn partial_decoder<'a>(
        &'a self,
        input_handle: Box<dyn BytesPartialDecoderTraits + 'a>,
        decoded_representation: &BytesRepresentation,
    ) -> Result<Box<dyn BytesPartialDecoderTraits + 'a>, CodecError> {
        Ok(Box::new(BytesToBytesPartialDecoderDefault::new(
            input_handle,
            *decoded_representation,
            self,
        )))
    }

    fn compute_encoded_size(
        &self,
        decoded_representation: &BytesRepresentation,
    ) -> BytesRepresentation {
        match decoded_representation.size() {
            Some(size) => BytesRepresentation::BoundedSize(gzip_max_encoded_size(size)),
            None => BytesRepresentation::UnboundedSize,
        }
    }
}

/// The worst case size of `size` bytes gzip compressed at any level.
///
/// A 10 byte header and 8 byte trailer, plus 5 bytes per stored deflate block of at most 32 KiB.
const fn gzip_max_encoded_size(size: u64) -> u64 {
    size + 18 + 5 * size.div_ceil(32768)
}
