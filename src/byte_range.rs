//! Byte ranges of stored values.
//!
//! A shard index is read with a [`ByteRange`] at the start or end of a shard,
//! and each inner chunk is read with a [`ByteRange::FromStart`] taken from an index entry.

use std::ops::Range;

use thiserror::Error;

/// A byte offset.
pub type ByteOffset = u64;

/// A byte length.
pub type ByteLength = u64;

/// A byte range, anchored at the start or end of a value.
///
/// A [`None`] length extends the range to the other end of the value.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum ByteRange {
    /// `length` bytes after skipping `offset` bytes from the start.
    FromStart(ByteOffset, Option<ByteLength>),
    /// `length` bytes before skipping `offset` bytes from the end.
    FromEnd(ByteOffset, Option<ByteLength>),
}

impl ByteRange {
    /// The inclusive start of the range in a value of `size` bytes.
    #[must_use]
    pub fn start(&self, size: u64) -> u64 {
        match *self {
            Self::FromStart(offset, _) => offset,
            Self::FromEnd(_, None) => 0,
            Self::FromEnd(offset, Some(length)) => size - offset - length,
        }
    }

    /// The exclusive end of the range in a value of `size` bytes.
    #[must_use]
    pub fn end(&self, size: u64) -> u64 {
        match *self {
            Self::FromStart(_, None) => size,
            Self::FromStart(offset, Some(length)) => offset + length,
            Self::FromEnd(offset, _) => size - offset,
        }
    }

    /// The number of bytes in the range in a value of `size` bytes.
    #[must_use]
    pub fn length(&self, size: u64) -> u64 {
        self.end(size) - self.start(size)
    }

    /// The range in a value of `size` bytes.
    #[must_use]
    pub fn to_range(&self, size: u64) -> Range<u64> {
        self.start(size)..self.end(size)
    }

    /// Returns true if the range fits in a value of `size` bytes.
    #[must_use]
    pub fn is_within(&self, size: u64) -> bool {
        let (Self::FromStart(offset, length) | Self::FromEnd(offset, length)) = *self;
        offset
            .checked_add(length.unwrap_or(0))
            .is_some_and(|extent| extent <= size)
    }
}

impl std::fmt::Display for ByteRange {
    /// Python slice notation, e.g. `4..8` or `-16..`.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let bound = |value: Option<u64>, sign: &str| match value {
            Some(0) | None => String::new(),
            Some(value) => format!("{sign}{value}"),
        };
        match *self {
            Self::FromStart(offset, length) => write!(
                f,
                "{}..{}",
                bound(Some(offset), ""),
                length.map_or_else(String::new, |length| (offset + length).to_string())
            ),
            Self::FromEnd(offset, length) => write!(
                f,
                "{}..{}",
                bound(length.map(|length| offset + length), "-"),
                bound(Some(offset), "-")
            ),
        }
    }
}

/// A byte range does not fit in a value.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid byte range {0} for bytes of length {1}")]
pub struct InvalidByteRangeError(ByteRange, u64);

impl InvalidByteRangeError {
    /// Create a new [`InvalidByteRangeError`] for `byte_range` in a value of `size` bytes.
    #[must_use]
    pub fn new(byte_range: ByteRange, size: u64) -> Self {
        Self(byte_range, size)
    }
}

/// Copy each of `byte_ranges` out of `bytes`.
///
/// # Errors
/// Returns [`InvalidByteRangeError`] if a byte range extends past `bytes`.
#[allow(clippy::cast_possible_truncation)]
pub fn extract_byte_ranges(
    bytes: &[u8],
    byte_ranges: &[ByteRange],
) -> Result<Vec<Vec<u8>>, InvalidByteRangeError> {
    let size = bytes.len() as u64;
    byte_ranges
        .iter()
        .map(|byte_range| {
            if !byte_range.is_within(size) {
                return Err(InvalidByteRangeError(*byte_range, size));
            }
            // in range, so within usize
            let Range { start, end } = byte_range.to_range(size);
            Ok(bytes[start as usize..end as usize].to_vec())
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn byte_ranges() {
        let byte_range = ByteRange::FromStart(1, None);
        assert_eq!(byte_range.to_range(10), 1..10);
        assert_eq!(byte_range.length(10), 9);

        let byte_range = ByteRange::FromEnd(1, None);
        assert_eq!(byte_range.to_range(10), 0..9);
        assert_eq!(byte_range.length(10), 9);

        let byte_range = ByteRange::FromEnd(0, Some(4));
        assert_eq!(byte_range.to_range(10), 6..10);

        assert!(ByteRange::FromStart(1, Some(5)).is_within(6));
        assert!(!ByteRange::FromStart(1, Some(5)).is_within(2));
        assert!(ByteRange::FromEnd(1, Some(5)).is_within(6));
        assert!(!ByteRange::FromEnd(1, Some(5)).is_within(2));
        assert!(ByteRange::FromStart(6, None).is_within(6));
        assert!(!ByteRange::FromStart(7, None).is_within(6));
        assert!(!ByteRange::FromStart(u64::MAX, Some(u64::MAX)).is_within(u64::MAX));
    }

    #[test]
    fn byte_ranges_extract() {
        let bytes = [1u8, 2, 3, 4, 5];
        assert_eq!(
            extract_byte_ranges(
                &bytes,
                &[ByteRange::FromStart(1, Some(2)), ByteRange::FromEnd(0, Some(2))]
            )
            .unwrap(),
            vec![vec![2, 3], vec![4, 5]]
        );
        assert_eq!(
            extract_byte_ranges(&bytes, &[ByteRange::FromStart(5, None)]).unwrap(),
            vec![Vec::<u8>::new()]
        );
        let err = extract_byte_ranges(&bytes[..3], &[ByteRange::FromStart(1, Some(4))]);
        assert_eq!(
            err.unwrap_err().to_string(),
            "invalid byte range 1..5 for bytes of length 3"
        );
    }

    #[test]
    fn byte_range_display() {
        assert_eq!(ByteRange::FromStart(0, None).to_string(), "..");
        assert_eq!(ByteRange::FromStart(5, Some(2)).to_string(), "5..7");
        assert_eq!(ByteRange::FromEnd(0, Some(2)).to_string(), "-2..");
        assert_eq!(ByteRange::FromEnd(5, Some(2)).to_string(), "-7..-5");
        assert_eq!(ByteRange::FromEnd(0, None).to_string(), "..");
    }
}
