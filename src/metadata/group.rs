use derive_more::Display;
use serde::{Deserialize, Serialize};

use super::AdditionalFields;

/// Zarr group metadata (storage specification v3).
///
/// An example `JSON` document for a Zarr V3 group:
/// ```json
/// {
///     "zarr_format": 3,
///     "node_type": "group",
///     "attributes": {
///         "spam": "ham",
///         "eggs": 42
///     }
/// }
/// ```
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct GroupMetadataV3 {
    /// An integer defining the version of the storage specification to which the group adheres. Must be `3`.
    pub zarr_format: monostate::MustBe!(3u64),
    /// A string defining the type of hierarchy node element, must be `group` here.
    pub node_type: monostate::MustBe!("group"),
    /// Optional user metadata.
    #[serde(default)]
    pub attributes: serde_json::Map<String, serde_json::Value>,
    /// Additional fields.
    #[serde(flatten)]
    pub additional_fields: AdditionalFields,
}

impl Default for GroupMetadataV3 {
    fn default() -> Self {
        Self::new(serde_json::Map::new())
    }
}

impl GroupMetadataV3 {
    /// Create group metadata.
    #[must_use]
    pub fn new(attributes: serde_json::Map<String, serde_json::Value>) -> Self {
        Self {
            zarr_format: monostate::MustBe!(3u64),
            node_type: monostate::MustBe!("group"),
            attributes,
            additional_fields: AdditionalFields::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn group_metadata() {
        let json = r#"{"zarr_format":3,"node_type":"group","attributes":{"spam":"ham"}}"#;
        let metadata: GroupMetadataV3 = serde_json::from_str(json).unwrap();
        assert_eq!(metadata.attributes["spam"], "ham");
        assert_eq!(metadata.to_string(), json);
        assert!(serde_json::from_str::<GroupMetadataV3>(
            r#"{"zarr_format":3,"node_type":"array"}"#
        )
        .is_err());
    }

    #[test]
    fn group_metadata_default() {
        let metadata = GroupMetadataV3::default();
        assert_eq!(
            serde_json::to_string(&metadata).unwrap(),
            r#"{"zarr_format":3,"node_type":"group","attributes":{}}"#
        );
    }
}
