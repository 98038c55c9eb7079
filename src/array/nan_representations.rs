use half::{bf16, f16};

/// The Zarr "NaN" fill value for a 64-bit IEEE 754 floating point number.
#[allow(clippy::unusual_byte_groupings)]
pub const ZARR_NAN_F64: f64 =
    f64::from_bits(0b0_11111111111_1000000000000000000000000000000000000000000000000000);

/// The Zarr "NaN" fill value for a 32-bit IEEE 754 floating point number.
#[allow(clippy::unusual_byte_groupings)]
pub const ZARR_NAN_F32: f32 = f32::from_bits(0b0_11111111_10000000000000000000000);

/// The Zarr "NaN" fill value for a 16-bit IEEE 754 floating point number.
pub const ZARR_NAN_F16: f16 = f16::NAN;

/// The Zarr "NaN" fill value for a 16-bit brain floating point number.
pub const ZARR_NAN_BF16: bf16 = bf16::NAN;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn nan_representations_are_quiet() {
        assert_eq!(ZARR_NAN_F64.to_bits(), 0x7ff8_0000_0000_0000);
        assert_eq!(ZARR_NAN_F32.to_bits(), 0x7fc0_0000);
        assert_eq!(ZARR_NAN_F16.to_bits(), 0b0_11111_1000000000);
        assert_eq!(ZARR_NAN_BF16.to_bits(), 0b0_11111111_1000000);
    }
}
