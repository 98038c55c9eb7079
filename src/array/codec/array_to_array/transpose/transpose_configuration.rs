use derive_more::{Display, From};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A wrapper to handle various versions of `transpose` codec configuration parameters.
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display, From)]
#[serde(untagged)]
pub enum TransposeCodecConfiguration {
    /// Version 1.0.
    V1(TransposeCodecConfigurationV1),
}

/// Configuration parameters for the `transpose` codec (version 1.0).
#[derive(Serialize, Deserialize, Clone, Eq, PartialEq, Debug, Display)]
#[serde(deny_unknown_fields)]
#[display("{}", serde_json::to_string(self).unwrap_or_default())]
pub struct TransposeCodecConfigurationV1 {
    /// An array of integers specifying the permutation, `"C"`, or `"F"`.
    pub order: TransposeOrder,
}

impl TransposeCodecConfigurationV1 {
    /// Create a new `transpose` codec configuration given a [`TransposeOrder`].
    #[must_use]
    pub const fn new(order: TransposeOrder) -> Self {
        Self { order }
    }
}

/// An invalid permutation order error.
#[derive(Clone, Debug, Error, From)]
#[error("permutation order {0:?} is invalid. It must be an array of integers specifying a permutation of 0, 1, …, n-1, where n is the number of dimensions")]
pub struct InvalidPermutationError(Vec<usize>);

/// The transpose order defining how to permute the array.
#[derive(Clone, Eq, PartialEq, Debug)]
pub enum TransposeOrder {
    /// The string `"C"`, equivalent to the identity permutation `0`, `1`, …, `n-1`. This makes the codec a no-op.
    C,
    /// The string `"F"`, equivalent to the permutation `n-1`, …, `1`, `0`.
    F,
    /// A permutation of `0`, `1`, …, `n-1`, where `n` is the dimensionality of the decoded chunk.
    Permutation(Vec<usize>),
}

impl TransposeOrder {
    /// Create a new transpose order from a permutation.
    ///
    /// # Errors
    /// Returns [`InvalidPermutationError`] if `order` is not a permutation of `0..order.len()`.
    pub fn new(order: &[usize]) -> Result<Self, InvalidPermutationError> {
        let mut sorted = order.to_vec();
        sorted.sort_unstable();
        if sorted.iter().enumerate().all(|(i, axis)| i == *axis) {
            Ok(Self::Permutation(order.to_vec()))
        } else {
            Err(InvalidPermutationError(order.to_vec()))
        }
    }

    /// Return the permutation for a chunk with `dimensionality` dimensions.
    ///
    /// Returns [`None`] if the order is an explicit permutation of a different dimensionality.
    #[must_use]
    pub fn permutation(&self, dimensionality: usize) -> Option<Vec<usize>> {
        match self {
            Self::C => Some((0..dimensionality).collect()),
            Self::F => Some((0..dimensionality).rev().collect()),
            Self::Permutation(permutation) => {
                (permutation.len() == dimensionality).then(|| permutation.clone())
            }
        }
    }
}

impl Serialize for TransposeOrder {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        match self {
            Self::C => s.serialize_str("C"),
            Self::F => s.serialize_str("F"),
            Self::Permutation(permutation) => permutation.serialize(s),
        }
    }
}

impl<'de> Deserialize<'de> for TransposeOrder {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum TransposeOrderMetadata {
            String(String),
            Permutation(Vec<usize>),
        }

        match TransposeOrderMetadata::deserialize(d)? {
            TransposeOrderMetadata::String(string) if string == "C" => Ok(Self::C),
            TransposeOrderMetadata::String(string) if string == "F" => Ok(Self::F),
            TransposeOrderMetadata::Permutation(permutation) => {
                Self::new(&permutation).map_err(serde::de::Error::custom)
            }
            TransposeOrderMetadata::String(_) => Err(serde::de::Error::custom(
                "transpose order must be C, F, or an array of integers specifying a permutation",
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn order(json: &str) -> Result<TransposeOrder, serde_json::Error> {
        serde_json::from_str::<TransposeCodecConfiguration>(json)
            .map(|TransposeCodecConfiguration::V1(configuration)| configuration.order)
    }

    #[test]
    fn codec_transpose_configuration() {
        assert_eq!(order(r#"{"order":"C"}"#).unwrap(), TransposeOrder::C);
        assert_eq!(order(r#"{"order":"F"}"#).unwrap(), TransposeOrder::F);
        assert_eq!(
            order(r#"{"order":[0,2,1]}"#).unwrap(),
            TransposeOrder::Permutation(vec![0, 2, 1])
        );
        assert_eq!(
            serde_json::to_string(&TransposeOrder::F).unwrap(),
            r#""F""#
        );
    }

    #[test]
    fn codec_transpose_configuration_invalid() {
        assert!(order(r#"{"order":""}"#).is_err());
        assert!(order(r#"{"order":[0,0,1]}"#).is_err());
        assert!(order(r#"{"order":[1,2]}"#).is_err());
        assert!(order(r#"{"order":[-1,0]}"#).is_err());
        assert!(order(r#"{"order":[0,1],"other":1}"#).is_err());
    }

    #[test]
    fn transpose_order_permutation() {
        assert_eq!(TransposeOrder::C.permutation(3), Some(vec![0, 1, 2]));
        assert_eq!(TransposeOrder::F.permutation(3), Some(vec![2, 1, 0]));
        let order = TransposeOrder::new(&[1, 0]).unwrap();
        assert_eq!(order.permutation(2), Some(vec![1, 0]));
        assert_eq!(order.permutation(3), None);
    }
}
