//! Zarr V3 fill value metadata.
//!
//! The interpretation of fill values is data type dependent, so conversion to a [`FillValue`](crate::array::FillValue)
//! is handled by [`DataType::fill_value_from_metadata`](crate::array::DataType::fill_value_from_metadata).

use derive_more::{Display, From};
use half::{bf16, f16};
use num::traits::float::FloatCore;
use serde::{Deserialize, Serialize};

use crate::array::{ZARR_NAN_BF16, ZARR_NAN_F16, ZARR_NAN_F32, ZARR_NAN_F64};

/// Fill value metadata.
#[derive(Serialize, Deserialize, Clone, PartialEq, Debug, Display)]
#[serde(untagged)]
pub enum FillValueMetadata {
    /// A boolean value.
    Bool(bool),
    /// An unsigned integer.
    UInt(u64),
    /// A signed integer.
    Int(i64),
    /// A float.
    Float(FillValueFloat),
    /// An array of integers. Suitable for raw (`r<N>`) data types.
    #[display("{_0:?}")]
    ByteArray(Vec<u8>),
    /// An unsupported fill value.
    Unsupported(serde_json::Value),
}

impl TryFrom<&str> for FillValueMetadata {
    type Error = serde_json::Error;

    fn try_from(s: &str) -> Result<Self, Self::Error> {
        serde_json::from_str(s)
    }
}

/// A float fill value.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, From, Display)]
#[serde(untagged)]
pub enum FillValueFloat {
    /// A float number.
    Float(f64),
    /// A hex string specifying the byte representation of the floating point number as an unsigned integer.
    HexString(HexString),
    /// A string representation of a non finite value.
    NonFinite(FillValueFloatStringNonFinite),
}

/// A hex string.
#[derive(Debug, Clone, Eq, PartialEq, From)]
pub struct HexString(Vec<u8>);

impl HexString {
    /// Create a new [`HexString`]
    #[must_use]
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    /// Return the hex string as a big endian byte slice.
    #[must_use]
    pub fn as_be_bytes(&self) -> &[u8] {
        &self.0
    }
}

impl core::fmt::Display for HexString {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", bytes_to_hex_string(&self.0))
    }
}

fn bytes_to_hex_string(v: &[u8]) -> String {
    let mut string = String::with_capacity(2 + v.len() * 2);
    string.push_str("0x");
    for byte in v {
        string.push_str(&format!("{byte:02x}"));
    }
    string
}

fn hex_string_to_be_bytes(s: &str) -> Option<Vec<u8>> {
    let digits = s.strip_prefix("0x")?;
    if digits.len() % 2 == 0 && digits.is_ascii() {
        (0..digits.len())
            .step_by(2)
            .map(|i| u8::from_str_radix(&digits[i..i + 2], 16))
            .collect::<Result<Vec<_>, _>>()
            .ok()
    } else {
        None
    }
}

impl serde::Serialize for HexString {
    fn serialize<S: serde::Serializer>(&self, s: S) -> Result<S::Ok, S::Error> {
        s.serialize_str(&bytes_to_hex_string(&self.0))
    }
}

impl<'de> serde::Deserialize<'de> for HexString {
    fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
        let s = String::deserialize(d)?;
        Ok(Self(hex_string_to_be_bytes(&s).ok_or_else(|| {
            serde::de::Error::custom("not a valid hex string")
        })?))
    }
}

/// A string representation of a non finite value.
#[derive(Serialize, Deserialize, Debug, Clone, Eq, PartialEq, Display)]
pub enum FillValueFloatStringNonFinite {
    /// Positive infinity.
    #[serde(rename = "Infinity")]
    PosInfinity,
    /// Negative infinity.
    #[serde(rename = "-Infinity")]
    NegInfinity,
    /// NaN (not-a-number).
    #[serde(rename = "NaN")]
    NaN,
}

impl FillValueMetadata {
    /// Convert the fill value to a [`bool`].
    #[must_use]
    pub const fn try_as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(bool) => Some(*bool),
            _ => None,
        }
    }

    /// Convert the fill value to an integer.
    #[must_use]
    pub fn try_as_int<T: TryFrom<i64> + TryFrom<u64>>(&self) -> Option<T> {
        match self {
            Self::Int(int) => T::try_from(*int).ok(),
            Self::UInt(uint) => T::try_from(*uint).ok(),
            _ => None,
        }
    }

    /// Convert the fill value to a 32 or 64-bit float.
    #[must_use]
    pub fn try_as_float<T: FloatCore>(&self) -> Option<T> {
        let is_f32 = core::mem::size_of::<T>() == core::mem::size_of::<f32>();
        match self {
            Self::Int(int) => num::traits::cast(*int),
            Self::UInt(uint) => num::traits::cast(*uint),
            Self::Float(FillValueFloat::Float(float)) => T::from(*float),
            Self::Float(FillValueFloat::HexString(hex_string)) => {
                let bytes = hex_string.as_be_bytes();
                if bytes.len() != core::mem::size_of::<T>() {
                    None
                } else if is_f32 {
                    T::from(f32::from_be_bytes(bytes.try_into().ok()?))
                } else {
                    T::from(f64::from_be_bytes(bytes.try_into().ok()?))
                }
            }
            Self::Float(FillValueFloat::NonFinite(nonfinite)) => match nonfinite {
                FillValueFloatStringNonFinite::PosInfinity => Some(T::infinity()),
                FillValueFloatStringNonFinite::NegInfinity => Some(T::neg_infinity()),
                FillValueFloatStringNonFinite::NaN if is_f32 => T::from(ZARR_NAN_F32),
                FillValueFloatStringNonFinite::NaN => T::from(ZARR_NAN_F64),
            },
            _ => None,
        }
    }

    /// Convert the fill value to a [`struct@f16`].
    #[must_use]
    pub fn try_as_float16(&self) -> Option<f16> {
        self.try_as_half(f16::from_f64, f16::from_be_bytes, ZARR_NAN_F16)
    }

    /// Convert the fill value to a [`bf16`].
    #[must_use]
    pub fn try_as_bfloat16(&self) -> Option<bf16> {
        self.try_as_half(bf16::from_f64, bf16::from_be_bytes, ZARR_NAN_BF16)
    }

    fn try_as_half<T: FloatCore>(
        &self,
        from_f64: fn(f64) -> T,
        from_be_bytes: fn([u8; 2]) -> T,
        nan: T,
    ) -> Option<T> {
        match self {
            #[allow(clippy::cast_precision_loss)]
            Self::Int(int) => Some(from_f64(*int as f64)),
            #[allow(clippy::cast_precision_loss)]
            Self::UInt(uint) => Some(from_f64(*uint as f64)),
            Self::Float(FillValueFloat::Float(float)) => Some(from_f64(*float)),
            Self::Float(FillValueFloat::HexString(hex_string)) => hex_string
                .as_be_bytes()
                .try_into()
                .ok()
                .map(from_be_bytes),
            Self::Float(FillValueFloat::NonFinite(nonfinite)) => Some(match nonfinite {
                FillValueFloatStringNonFinite::PosInfinity => T::infinity(),
                FillValueFloatStringNonFinite::NegInfinity => T::neg_infinity(),
                FillValueFloatStringNonFinite::NaN => nan,
            }),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fill_value_metadata_bool() {
        let metadata: FillValueMetadata = "true".try_into().unwrap();
        assert_eq!(metadata, FillValueMetadata::Bool(true));
        assert_eq!(metadata.try_as_bool(), Some(true));
        assert_eq!(metadata.try_as_int::<i8>(), None);
    }

    #[test]
    fn fill_value_metadata_int() {
        let metadata: FillValueMetadata = "-7".try_into().unwrap();
        assert_eq!(metadata, FillValueMetadata::Int(-7));
        assert_eq!(metadata.try_as_int::<i16>(), Some(-7));
        assert_eq!(metadata.try_as_int::<u16>(), None);

        let metadata: FillValueMetadata = "300".try_into().unwrap();
        assert_eq!(metadata, FillValueMetadata::UInt(300));
        assert_eq!(metadata.try_as_int::<u8>(), None);
        assert_eq!(metadata.try_as_int::<u16>(), Some(300));
    }

    #[test]
    fn fill_value_metadata_float() {
        let metadata: FillValueMetadata = "7.5".try_into().unwrap();
        assert_eq!("7.5", serde_json::to_string(&metadata).unwrap());
        assert_eq!(metadata.try_as_float::<f32>(), Some(7.5));
        assert_eq!(metadata.try_as_float16(), Some(f16::from_f32(7.5)));
    }

    #[test]
    fn fill_value_metadata_non_finite() {
        let metadata: FillValueMetadata = r#""-Infinity""#.try_into().unwrap();
        assert_eq!(r#""-Infinity""#, serde_json::to_string(&metadata).unwrap());
        let neg_inf = metadata.try_as_float::<f64>().unwrap();
        assert!(neg_inf.is_infinite() && neg_inf.is_sign_negative());

        let metadata: FillValueMetadata = r#""NaN""#.try_into().unwrap();
        assert_eq!(
            metadata.try_as_float::<f32>().unwrap().to_bits(),
            ZARR_NAN_F32.to_bits()
        );
    }

    #[test]
    fn fill_value_metadata_hex_string() {
        let json = r#""0x7fc00001""#;
        let metadata: FillValueMetadata = json.try_into().unwrap();
        assert_eq!(json, serde_json::to_string(&metadata).unwrap());
        let value = metadata.try_as_float::<f32>().unwrap();
        assert_eq!(value.to_bits(), 0x7fc0_0001);
        assert_eq!(metadata.try_as_float::<f64>(), None);
        assert!(serde_json::from_str::<HexString>(r#""0x7""#).is_err());
        assert!(serde_json::from_str::<HexString>(r#""7fc00000""#).is_err());
    }

    #[test]
    fn fill_value_metadata_byte_array() {
        let json = "[0,1,2,3]";
        let metadata: FillValueMetadata = json.try_into().unwrap();
        assert_eq!(metadata, FillValueMetadata::ByteArray(vec![0, 1, 2, 3]));
        assert_eq!(json, serde_json::to_string(&metadata).unwrap());
    }

    #[test]
    fn fill_value_metadata_unsupported() {
        let metadata: FillValueMetadata = "null".try_into().unwrap();
        assert!(matches!(metadata, FillValueMetadata::Unsupported(_)));
        let metadata: FillValueMetadata = "[256]".try_into().unwrap();
        assert!(matches!(metadata, FillValueMetadata::Unsupported(_)));
    }
}
