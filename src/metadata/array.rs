use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::{AdditionalFields, FillValueMetadata, Metadata};
use crate::array::{ArrayShape, DimensionName};

/// Zarr array metadata (storage specification v3).
///
/// An example `JSON` document for a Zarr V3 array:
/// ```json
/// {
///     "zarr_format": 3,
///     "node_type": "array",
///     "shape": [4],
///     "data_type": "int16",
///     "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [4]}},
///     "chunk_key_encoding": {"name": "default", "configuration": {"separator": "/"}},
///     "fill_value": 0,
///     "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
///     "attributes": {}
/// }
/// ```
///
/// `dimension_names` is omitted if there are no dimension names. An explicit `null` deserialises the same as an omitted key.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct ArrayMetadataV3 {
    /// An integer defining the version of the storage specification to which the array adheres. Must be `3`.
    pub zarr_format: monostate::MustBe!(3u64),
    /// A string defining the type of hierarchy node element, must be `array` here.
    pub node_type: monostate::MustBe!("array"),
    /// An array of integers providing the length of each dimension of the Zarr array.
    pub shape: ArrayShape,
    /// The data type of the Zarr array.
    pub data_type: Metadata,
    /// The chunk grid of the Zarr array.
    pub chunk_grid: Metadata,
    /// The mapping from chunk grid cell coordinates to keys in the underlying store.
    pub chunk_key_encoding: Metadata,
    /// Provides an element value to use for uninitialised portions of the Zarr array.
    pub fill_value: FillValueMetadata,
    /// Specifies a list of codecs to be used for encoding and decoding chunks.
    pub codecs: Vec<Metadata>,
    /// Optional user defined attributes.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// An optional list of dimension names.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dimension_names: Option<Vec<DimensionName>>,
    /// Additional fields.
    #[serde(flatten)]
    pub additional_fields: AdditionalFields,
}

impl ArrayMetadataV3 {
    /// Create a new array metadata.
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: Metadata,
        chunk_grid: Metadata,
        chunk_key_encoding: Metadata,
        fill_value: FillValueMetadata,
        codecs: Vec<Metadata>,
        attributes: serde_json::Map<String, serde_json::Value>,
        dimension_names: Option<Vec<DimensionName>>,
    ) -> Self {
        Self {
            zarr_format: monostate::MustBe!(3u64),
            node_type: monostate::MustBe!("array"),
            shape,
            data_type,
            chunk_grid,
            chunk_key_encoding,
            fill_value,
            codecs,
            attributes,
            dimension_names,
            additional_fields: AdditionalFields::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const JSON_MINIMAL: &str = r#"{
        "zarr_format": 3,
        "node_type": "array",
        "shape": [4],
        "data_type": "int16",
        "chunk_grid": {"name": "regular", "configuration": {"chunk_shape": [4]}},
        "chunk_key_encoding": {"name": "default"},
        "fill_value": 0,
        "codecs": [{"name": "bytes", "configuration": {"endian": "little"}}],
        "dimension_names": null
    }"#;

    #[test]
    fn array_metadata_minimal() {
        let metadata: ArrayMetadataV3 = serde_json::from_str(JSON_MINIMAL).unwrap();
        assert_eq!(metadata.shape, vec![4]);
        assert_eq!(metadata.data_type.name(), "int16");
        assert!(metadata.dimension_names.is_none());
        let value = serde_json::to_value(&metadata).unwrap();
        assert!(value.get("dimension_names").is_none());
        assert_eq!(value["zarr_format"], 3);
        assert_eq!(value["node_type"], "array");
    }

    #[test]
    fn array_metadata_dimension_names() {
        let json = JSON_MINIMAL.replace(r#""dimension_names": null"#, r#""dimension_names": ["x"]"#);
        let metadata: ArrayMetadataV3 = serde_json::from_str(&json).unwrap();
        assert_eq!(
            metadata.dimension_names,
            Some(vec![DimensionName::new("x")])
        );

        let json = JSON_MINIMAL.replace(r#""dimension_names": null"#, r#""dimension_names": [null]"#);
        let metadata: ArrayMetadataV3 = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata.dimension_names, Some(vec![DimensionName::default()]));
    }

    #[test]
    fn array_metadata_invalid_format() {
        let json = JSON_MINIMAL.replace(r#""zarr_format": 3"#, r#""zarr_format": 2"#);
        assert!(serde_json::from_str::<ArrayMetadataV3>(&json).is_err());
        let json = JSON_MINIMAL.replace(r#""node_type": "array""#, r#""node_type": "group""#);
        assert!(serde_json::from_str::<ArrayMetadataV3>(&json).is_err());
    }

    #[test]
    fn array_metadata_additional_fields() {
        let json = JSON_MINIMAL.replace(
            r#""dimension_names": null"#,
            r#""dimension_names": null, "extension": {"must_understand": false, "a": 1}"#,
        );
        let metadata: ArrayMetadataV3 = serde_json::from_str(&json).unwrap();
        assert_eq!(metadata.additional_fields.len(), 1);

        let json = JSON_MINIMAL.replace(
            r#""dimension_names": null"#,
            r#""dimension_names": null, "extension": {"a": 1}"#,
        );
        assert!(serde_json::from_str::<ArrayMetadataV3>(&json).is_err());
    }
}
