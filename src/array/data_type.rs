//! Zarr data types.
//!
//! See <https://zarr-specs.readthedocs.io/en/latest/v3/core/v3.0.html#data-types>.
//!
//! Every data type has a fixed size.
//! Fixed-length text and opaque bytes are represented by the raw bits data type `r<N>`, where `N` is a multiple of 8.

use half::{bf16, f16};
use thiserror::Error;

use crate::metadata::{
    FillValueFloat, FillValueFloatStringNonFinite, FillValueMetadata, HexString, Metadata,
};

use super::{FillValue, ZARR_NAN_BF16, ZARR_NAN_F16, ZARR_NAN_F32, ZARR_NAN_F64};

/// A data type.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DataType {
    /// `bool` Boolean.
    Bool,
    /// `int8` Integer in `[-2^7, 2^7-1]`.
    Int8,
    /// `int16` Integer in `[-2^15, 2^15-1]`.
    Int16,
    /// `int32` Integer in `[-2^31, 2^31-1]`.
    Int32,
    /// `int64` Integer in `[-2^63, 2^63-1]`.
    Int64,
    /// `uint8` Integer in `[0, 2^8-1]`.
    UInt8,
    /// `uint16` Integer in `[0, 2^16-1]`.
    UInt16,
    /// `uint32` Integer in `[0, 2^32-1]`.
    UInt32,
    /// `uint64` Integer in `[0, 2^64-1]`.
    UInt64,
    /// `float16` IEEE 754 half-precision floating point: sign bit, 5 bits exponent, 10 bits mantissa.
    Float16,
    /// `bfloat16` brain floating point: sign bit, 8 bits exponent, 7 bits mantissa.
    BFloat16,
    /// `float32` IEEE 754 single-precision floating point: sign bit, 8 bits exponent, 23 bits mantissa.
    Float32,
    /// `float64` IEEE 754 double-precision floating point: sign bit, 11 bits exponent, 52 bits mantissa.
    Float64,
    /// `r*` raw bits, variable size given by the contained value in *bytes*.
    RawBits(usize),
}

/// An unsupported data type error.
#[derive(Debug, Error)]
#[error("data type {_0} is unsupported")]
pub struct UnsupportedDataTypeError(String);

/// A fill value metadata incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueMetadataError(String, FillValueMetadata);

/// A fill value incompatibility error.
#[derive(Debug, Error)]
#[error("incompatible fill value {1} for data type {0}")]
pub struct IncompatibleFillValueError(String, FillValue);

impl IncompatibleFillValueError {
    /// Create a new incompatible fill value error.
    #[must_use]
    pub fn new(data_type_name: String, fill_value: FillValue) -> Self {
        Self(data_type_name, fill_value)
    }
}

impl DataType {
    /// Returns the name of the data type.
    #[must_use]
    pub fn name(&self) -> String {
        match self {
            Self::Bool => "bool".to_string(),
            Self::Int8 => "int8".to_string(),
            Self::Int16 => "int16".to_string(),
            Self::Int32 => "int32".to_string(),
            Self::Int64 => "int64".to_string(),
            Self::UInt8 => "uint8".to_string(),
            Self::UInt16 => "uint16".to_string(),
            Self::UInt32 => "uint32".to_string(),
            Self::UInt64 => "uint64".to_string(),
            Self::Float16 => "float16".to_string(),
            Self::BFloat16 => "bfloat16".to_string(),
            Self::Float32 => "float32".to_string(),
            Self::Float64 => "float64".to_string(),
            Self::RawBits(size) => format!("r{}", size * 8),
        }
    }

    /// Returns the metadata.
    #[must_use]
    pub fn metadata(&self) -> Metadata {
        Metadata::new(&self.name())
    }

    /// Returns the size in bytes of an element.
    #[must_use]
    pub const fn size(&self) -> usize {
        match self {
            Self::Bool | Self::Int8 | Self::UInt8 => 1,
            Self::Int16 | Self::UInt16 | Self::Float16 | Self::BFloat16 => 2,
            Self::Int32 | Self::UInt32 | Self::Float32 => 4,
            Self::Int64 | Self::UInt64 | Self::Float64 => 8,
            Self::RawBits(size) => *size,
        }
    }

    /// Create a data type from metadata.
    ///
    /// # Errors
    /// Returns [`UnsupportedDataTypeError`] if the metadata does not name a supported data type or has a configuration.
    pub fn from_metadata(metadata: &Metadata) -> Result<Self, UnsupportedDataTypeError> {
        let name = metadata.name();
        let unsupported = || UnsupportedDataTypeError(metadata.to_string());
        if !metadata.configuration_is_none_or_empty() {
            return Err(unsupported());
        }

        let data_type = match name {
            "bool" => Self::Bool,
            "int8" => Self::Int8,
            "int16" => Self::Int16,
            "int32" => Self::Int32,
            "int64" => Self::Int64,
            "uint8" => Self::UInt8,
            "uint16" => Self::UInt16,
            "uint32" => Self::UInt32,
            "uint64" => Self::UInt64,
            "float16" => Self::Float16,
            "bfloat16" => Self::BFloat16,
            "float32" => Self::Float32,
            "float64" => Self::Float64,
            _ => {
                let size_bits = name
                    .strip_prefix('r')
                    .and_then(|bits| bits.parse::<usize>().ok())
                    .ok_or_else(unsupported)?;
                if size_bits == 0 || size_bits % 8 != 0 {
                    return Err(unsupported());
                }
                Self::RawBits(size_bits / 8)
            }
        };
        Ok(data_type)
    }

    /// Returns the default fill value of the data type: zero, or `false`.
    #[must_use]
    pub fn default_fill_value(&self) -> FillValue {
        FillValue::new(vec![0; self.size()])
    }

    /// Returns true if `fill_value` has the size of an element of this data type.
    #[must_use]
    pub fn is_compatible(&self, fill_value: &FillValue) -> bool {
        fill_value.size() == self.size()
    }

    /// Create a fill value from metadata.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueMetadataError`] if the fill value is incompatible with the data type.
    pub fn fill_value_from_metadata(
        &self,
        fill_value: &FillValueMetadata,
    ) -> Result<FillValue, IncompatibleFillValueMetadataError> {
        use FillValue as FV;
        let err = || IncompatibleFillValueMetadataError(self.name(), fill_value.clone());
        match self {
            Self::Bool => Ok(FV::from(fill_value.try_as_bool().ok_or_else(err)?)),
            Self::Int8 => Ok(FV::from(fill_value.try_as_int::<i8>().ok_or_else(err)?)),
            Self::Int16 => Ok(FV::from(fill_value.try_as_int::<i16>().ok_or_else(err)?)),
            Self::Int32 => Ok(FV::from(fill_value.try_as_int::<i32>().ok_or_else(err)?)),
            Self::Int64 => Ok(FV::from(fill_value.try_as_int::<i64>().ok_or_else(err)?)),
            Self::UInt8 => Ok(FV::from(fill_value.try_as_int::<u8>().ok_or_else(err)?)),
            Self::UInt16 => Ok(FV::from(fill_value.try_as_int::<u16>().ok_or_else(err)?)),
            Self::UInt32 => Ok(FV::from(fill_value.try_as_int::<u32>().ok_or_else(err)?)),
            Self::UInt64 => Ok(FV::from(fill_value.try_as_int::<u64>().ok_or_else(err)?)),
            Self::Float16 => Ok(FV::from(fill_value.try_as_float16().ok_or_else(err)?)),
            Self::BFloat16 => Ok(FV::from(fill_value.try_as_bfloat16().ok_or_else(err)?)),
            Self::Float32 => Ok(FV::from(fill_value.try_as_float::<f32>().ok_or_else(err)?)),
            Self::Float64 => Ok(FV::from(fill_value.try_as_float::<f64>().ok_or_else(err)?)),
            Self::RawBits(size) => match fill_value {
                FillValueMetadata::ByteArray(bytes) if bytes.len() == *size => {
                    Ok(FV::new(bytes.clone()))
                }
                _ => Err(err()),
            },
        }
    }

    /// Create fill value metadata.
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the size of `fill_value` does not match the data type.
    pub fn metadata_fill_value(
        &self,
        fill_value: &FillValue,
    ) -> Result<FillValueMetadata, IncompatibleFillValueError> {
        let err = || IncompatibleFillValueError::new(self.name(), fill_value.clone());
        let bytes = fill_value.as_ne_bytes();
        if bytes.len() != self.size() {
            return Err(err());
        }
        let metadata = match self {
            Self::Bool => FillValueMetadata::Bool(bytes[0] != 0),
            Self::Int8 => FillValueMetadata::Int(i8::from_ne_bytes(ne(bytes).ok_or_else(err)?).into()),
            Self::Int16 => FillValueMetadata::Int(i16::from_ne_bytes(ne(bytes).ok_or_else(err)?).into()),
            Self::Int32 => FillValueMetadata::Int(i32::from_ne_bytes(ne(bytes).ok_or_else(err)?).into()),
            Self::Int64 => FillValueMetadata::Int(i64::from_ne_bytes(ne(bytes).ok_or_else(err)?)),
            Self::UInt8 => FillValueMetadata::UInt(bytes[0].into()),
            Self::UInt16 => FillValueMetadata::UInt(u16::from_ne_bytes(ne(bytes).ok_or_else(err)?).into()),
            Self::UInt32 => FillValueMetadata::UInt(u32::from_ne_bytes(ne(bytes).ok_or_else(err)?).into()),
            Self::UInt64 => FillValueMetadata::UInt(u64::from_ne_bytes(ne(bytes).ok_or_else(err)?)),
            Self::Float16 => {
                let value = f16::from_ne_bytes(ne(bytes).ok_or_else(err)?);
                FillValueMetadata::Float(float_to_fill_value(
                    value.is_infinite(),
                    value.is_sign_negative(),
                    value.is_nan(),
                    value.to_bits() == ZARR_NAN_F16.to_bits(),
                    value.to_be_bytes().to_vec(),
                    f64::from(value),
                ))
            }
            Self::BFloat16 => {
                let value = bf16::from_ne_bytes(ne(bytes).ok_or_else(err)?);
                FillValueMetadata::Float(float_to_fill_value(
                    value.is_infinite(),
                    value.is_sign_negative(),
                    value.is_nan(),
                    value.to_bits() == ZARR_NAN_BF16.to_bits(),
                    value.to_be_bytes().to_vec(),
                    f64::from(value),
                ))
            }
            Self::Float32 => {
                let value = f32::from_ne_bytes(ne(bytes).ok_or_else(err)?);
                FillValueMetadata::Float(float_to_fill_value(
                    value.is_infinite(),
                    value.is_sign_negative(),
                    value.is_nan(),
                    value.to_bits() == ZARR_NAN_F32.to_bits(),
                    value.to_be_bytes().to_vec(),
                    f64::from(value),
                ))
            }
            Self::Float64 => {
                let value = f64::from_ne_bytes(ne(bytes).ok_or_else(err)?);
                FillValueMetadata::Float(float_to_fill_value(
                    value.is_infinite(),
                    value.is_sign_negative(),
                    value.is_nan(),
                    value.to_bits() == ZARR_NAN_F64.to_bits(),
                    value.to_be_bytes().to_vec(),
                    value,
                ))
            }
            Self::RawBits(_) => FillValueMetadata::ByteArray(bytes.to_vec()),
        };
        Ok(metadata)
    }
}

fn ne<const N: usize>(bytes: &[u8]) -> Option<[u8; N]> {
    bytes.try_into().ok()
}

/// Non-finite values are written as strings, and a NaN other than the canonical Zarr NaN as a hex string.
fn float_to_fill_value(
    is_infinite: bool,
    is_sign_negative: bool,
    is_nan: bool,
    is_zarr_nan: bool,
    be_bytes: Vec<u8>,
    value: f64,
) -> FillValueFloat {
    if is_infinite && is_sign_negative {
        FillValueFloatStringNonFinite::NegInfinity.into()
    } else if is_infinite {
        FillValueFloatStringNonFinite::PosInfinity.into()
    } else if is_zarr_nan {
        FillValueFloatStringNonFinite::NaN.into()
    } else if is_nan {
        HexString::new(be_bytes).into()
    } else {
        value.into()
    }
}

impl TryFrom<Metadata> for DataType {
    type Error = UnsupportedDataTypeError;

    fn try_from(metadata: Metadata) -> Result<Self, Self::Error> {
        Self::from_metadata(&metadata)
    }
}

impl core::fmt::Display for DataType {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_type(json: &str) -> Result<DataType, UnsupportedDataTypeError> {
        DataType::from_metadata(&serde_json::from_str::<Metadata>(json).unwrap())
    }

    #[test]
    fn data_type_names() {
        for name in [
            "bool", "int8", "int16", "int32", "int64", "uint8", "uint16", "uint32", "uint64",
            "float16", "bfloat16", "float32", "float64",
        ] {
            let data_type = data_type(&format!(r#""{name}""#)).unwrap();
            assert_eq!(data_type.name(), name);
            assert_eq!(data_type.metadata().name(), name);
        }
        assert_eq!(data_type(r#""int16""#).unwrap().size(), 2);
        assert_eq!(data_type(r#""float64""#).unwrap().size(), 8);
    }

    #[test]
    fn data_type_unknown() {
        assert!(data_type(r#""unknown""#).is_err());
        assert!(data_type(r#""complex64""#).is_err());
        assert!(data_type(r#"{"name":"int8","configuration":{"a":1}}"#).is_err());
    }

    #[test]
    fn data_type_raw_bits() {
        let data_type = data_type(r#""r24""#).unwrap();
        assert_eq!(data_type, DataType::RawBits(3));
        assert_eq!(data_type.name(), "r24");
        assert_eq!(data_type.size(), 3);
        assert!(super::tests::data_type(r#""r5""#).is_err());
        assert!(super::tests::data_type(r#""r0""#).is_err());
        assert!(super::tests::data_type(r#""rx""#).is_err());

        let metadata = FillValueMetadata::ByteArray(vec![1, 2, 3]);
        let fill_value = data_type.fill_value_from_metadata(&metadata).unwrap();
        assert_eq!(fill_value.as_ne_bytes(), &[1, 2, 3]);
        assert_eq!(data_type.metadata_fill_value(&fill_value).unwrap(), metadata);
        assert!(data_type
            .fill_value_from_metadata(&FillValueMetadata::ByteArray(vec![1, 2]))
            .is_err());
    }

    #[test]
    fn data_type_fill_value_int() {
        let metadata: FillValueMetadata = "-1".try_into().unwrap();
        let fill_value = DataType::Int16.fill_value_from_metadata(&metadata).unwrap();
        assert_eq!(fill_value.as_ne_bytes(), (-1i16).to_ne_bytes());
        assert_eq!(
            DataType::Int16.metadata_fill_value(&fill_value).unwrap(),
            metadata
        );
        assert!(DataType::UInt16.fill_value_from_metadata(&metadata).is_err());
        assert!(DataType::Bool.fill_value_from_metadata(&metadata).is_err());
    }

    #[test]
    fn data_type_fill_value_bool() {
        let metadata: FillValueMetadata = "true".try_into().unwrap();
        let fill_value = DataType::Bool.fill_value_from_metadata(&metadata).unwrap();
        assert_eq!(fill_value.as_ne_bytes(), &[1]);
        assert_eq!(DataType::Bool.metadata_fill_value(&fill_value).unwrap(), metadata);
    }

    #[test]
    fn data_type_fill_value_float() {
        let metadata: FillValueMetadata = r#""NaN""#.try_into().unwrap();
        let fill_value = DataType::Float32.fill_value_from_metadata(&metadata).unwrap();
        assert_eq!(fill_value.as_ne_bytes(), ZARR_NAN_F32.to_ne_bytes());
        assert_eq!(
            serde_json::to_string(&DataType::Float32.metadata_fill_value(&fill_value).unwrap())
                .unwrap(),
            r#""NaN""#
        );

        let fill_value = FillValue::from(f32::from_bits(0x7fc0_0001));
        assert_eq!(
            serde_json::to_string(&DataType::Float32.metadata_fill_value(&fill_value).unwrap())
                .unwrap(),
            r#""0x7fc00001""#
        );

        let fill_value = FillValue::from(f64::NEG_INFINITY);
        assert_eq!(
            serde_json::to_string(&DataType::Float64.metadata_fill_value(&fill_value).unwrap())
                .unwrap(),
            r#""-Infinity""#
        );

        let metadata: FillValueMetadata = "0.5".try_into().unwrap();
        let fill_value = DataType::Float16.fill_value_from_metadata(&metadata).unwrap();
        assert_eq!(fill_value.as_ne_bytes(), f16::from_f32(0.5).to_ne_bytes());
        assert_eq!(
            DataType::Float16.metadata_fill_value(&fill_value).unwrap(),
            metadata
        );
        let fill_value = DataType::BFloat16.fill_value_from_metadata(&metadata).unwrap();
        assert_eq!(fill_value.as_ne_bytes(), bf16::from_f32(0.5).to_ne_bytes());
    }

    #[test]
    fn data_type_fill_value_incompatible_size() {
        let fill_value = FillValue::from(0u8);
        assert!(!DataType::Int16.is_compatible(&fill_value));
        assert!(DataType::Int16.metadata_fill_value(&fill_value).is_err());
        assert_eq!(
            DataType::Int16.default_fill_value(),
            FillValue::from(0i16)
        );
    }
}
