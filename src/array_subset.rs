//! Array subsets.
//!
//! An [`ArraySubset`] is a hyperrectangular region of an array, with a start and a shape per dimension.
//! It is used to describe the region of an array read or written, the logical extent of a chunk in the chunk grid, and the overlap of the two.
//!
//! This module provides functions for:
//!  - extracting the bytes of a subset from a C-order (row-major) buffer ([`ArraySubset::extract_bytes`]), and
//!  - scattering the bytes of a subset into a C-order buffer ([`ArraySubset::store_bytes`]).

mod iterators;

pub use iterators::{ChunksIterator, ContiguousLinearisedIndicesIterator, IndicesIterator};

use std::{num::NonZeroU64, ops::Range};

use derive_more::Display;
use itertools::izip;
use thiserror::Error;

use crate::{
    array::{ArrayIndices, ArrayShape},
    byte_range::ByteRange,
};

/// An array subset.
#[derive(Clone, Eq, PartialEq, Ord, PartialOrd, Hash, Debug, Display, Default)]
#[display("start {start:?} shape {shape:?}")]
pub struct ArraySubset {
    /// The start of the array subset.
    start: ArrayIndices,
    /// The shape of the array subset.
    shape: ArrayShape,
}

/// An array extract bytes error.
#[derive(Debug, Error)]
#[error("array subset {_0} is incompatible with array of shape {_1:?} and element size {_2}")]
pub struct ArrayExtractBytesError(ArraySubset, ArrayShape, usize);

/// An array store bytes error.
#[derive(Debug, Error)]
pub enum ArrayStoreBytesError {
    /// Invalid array shape.
    #[error(transparent)]
    InvalidArrayShape(#[from] IncompatibleArraySubsetAndShapeError),
    /// Invalid subset bytes.
    #[error("expected subset bytes to have length {_1}, got {_0}")]
    InvalidSubsetBytes(usize, u64),
    /// Invalid array bytes.
    #[error("expected array bytes to have length {_1}, got {_0}")]
    InvalidArrayBytes(usize, u64),
}

impl ArraySubset {
    /// Create a new array subset with `shape` starting at the origin.
    #[must_use]
    pub fn new_with_shape(shape: ArrayShape) -> Self {
        Self {
            start: vec![0; shape.len()],
            shape,
        }
    }

    /// Create a new array subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the size of `start` and `shape` do not match.
    pub fn new_with_start_shape(
        start: ArrayIndices,
        shape: ArrayShape,
    ) -> Result<Self, IncompatibleDimensionalityError> {
        if start.len() == shape.len() {
            Ok(Self { start, shape })
        } else {
            Err(IncompatibleDimensionalityError::new(start.len(), shape.len()))
        }
    }

    /// Create a new array subset from a list of [`Range`]s.
    ///
    /// A range with `end < start` is treated as empty.
    #[must_use]
    pub fn new_with_ranges(ranges: &[Range<u64>]) -> Self {
        let start = ranges.iter().map(|range| range.start).collect();
        let shape = ranges
            .iter()
            .map(|range| range.end.saturating_sub(range.start))
            .collect();
        Self { start, shape }
    }

    /// Create a new array subset from a start and exclusive end.
    ///
    /// # Errors
    /// Returns [`InvalidArraySubsetError`] if the size of `start` and `end` do not match or `end` < `start`.
    pub fn new_with_start_end_exc(
        start: ArrayIndices,
        end: ArrayIndices,
    ) -> Result<Self, InvalidArraySubsetError> {
        if start.len() != end.len() || std::iter::zip(&start, &end).any(|(s, e)| e < s) {
            return Err(InvalidArraySubsetError);
        }
        let shape = std::iter::zip(&start, end).map(|(s, e)| e - s).collect();
        Ok(Self { start, shape })
    }

    /// Return the start of the array subset.
    #[must_use]
    pub fn start(&self) -> &[u64] {
        &self.start
    }

    /// Return the shape of the array subset.
    #[must_use]
    pub fn shape(&self) -> &[u64] {
        &self.shape
    }

    /// Return the dimensionality of the array subset.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.start.len()
    }

    /// Return the exclusive end of the array subset.
    #[must_use]
    pub fn end_exc(&self) -> ArrayIndices {
        std::iter::zip(&self.start, &self.shape)
            .map(|(start, size)| start + size)
            .collect()
    }

    /// Return the ranges of the array subset.
    #[must_use]
    pub fn to_ranges(&self) -> Vec<Range<u64>> {
        std::iter::zip(&self.start, &self.shape)
            .map(|(&start, &size)| start..start + size)
            .collect()
    }

    /// Return the number of elements of the array subset.
    ///
    /// Equal to the product of the components of its shape.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.iter().product()
    }

    /// Return the number of elements of the array subset as a `usize`.
    ///
    /// # Panics
    /// Panics if [`num_elements()`](Self::num_elements()) is greater than [`usize::MAX`].
    #[must_use]
    pub fn num_elements_usize(&self) -> usize {
        usize::try_from(self.num_elements()).expect("num elements exceeds usize::MAX")
    }

    /// Returns true if the array subset has no elements.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.shape.iter().any(|&size| size == 0)
    }

    /// Returns true if the array subset is within the bounds of `array_shape`.
    #[must_use]
    pub fn inbounds(&self, array_shape: &[u64]) -> bool {
        self.dimensionality() == array_shape.len()
            && izip!(&self.start, &self.shape, array_shape)
                .all(|(start, size, shape)| start + size <= *shape)
    }

    /// Return the overlapping subset between this array subset and `subset_other`.
    ///
    /// The result is empty (but positioned) if the subsets do not intersect.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the dimensionality of `subset_other` does not match the dimensionality of this array subset.
    pub fn overlap(&self, subset_other: &Self) -> Result<Self, IncompatibleDimensionalityError> {
        if subset_other.dimensionality() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                subset_other.dimensionality(),
                self.dimensionality(),
            ));
        }
        let (start, shape) = izip!(
            &self.start,
            &self.shape,
            subset_other.start(),
            subset_other.shape()
        )
        .map(|(start, size, other_start, other_size)| {
            let overlap_start = *std::cmp::max(start, other_start);
            let overlap_end = std::cmp::min(start + size, other_start + other_size);
            (overlap_start, overlap_end.saturating_sub(overlap_start))
        })
        .unzip();
        Ok(Self { start, shape })
    }

    /// Return the subset relative to `start`.
    ///
    /// Creates an array subset starting at [`ArraySubset::start()`] - `start`.
    ///
    /// # Errors
    /// Returns [`IncompatibleStartError`] if `start` does not match the dimensionality of the array subset or any component of `start` exceeds the start of the subset.
    pub fn relative_to(&self, start: &[u64]) -> Result<Self, IncompatibleStartError> {
        if start.len() != self.dimensionality()
            || std::iter::zip(&self.start, start).any(|(a, b)| a < b)
        {
            return Err(IncompatibleStartError(start.to_vec(), self.clone()));
        }
        Ok(Self {
            start: std::iter::zip(&self.start, start).map(|(a, b)| a - b).collect(),
            shape: self.shape.clone(),
        })
    }

    /// Bound the array subset to the domain within `end` (exclusive).
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if the length of `end` does not match the array subset dimensionality.
    pub fn bound(&self, end: &[u64]) -> Result<Self, IncompatibleDimensionalityError> {
        if end.len() != self.dimensionality() {
            return Err(IncompatibleDimensionalityError::new(
                end.len(),
                self.dimensionality(),
            ));
        }
        let (start, shape) = izip!(&self.start, &self.shape, end)
            .map(|(&start, &size, &end)| {
                let bounded_start = std::cmp::min(start, end);
                let bounded_end = std::cmp::min(start + size, end);
                (bounded_start, bounded_end - bounded_start)
            })
            .unzip();
        Ok(Self { start, shape })
    }

    /// Return the byte ranges of the array subset in an array with `array_shape` and `element_size`.
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate this array subset.
    pub fn byte_ranges(
        &self,
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<ByteRange>, IncompatibleArraySubsetAndShapeError> {
        let element_size = element_size as u64;
        Ok(self
            .contiguous_linearised_indices(array_shape)?
            .map(|(array_index, contiguous_elements)| {
                ByteRange::FromStart(
                    array_index * element_size,
                    Some(contiguous_elements * element_size),
                )
            })
            .collect())
    }

    /// Return the bytes in this array subset from an array with shape `array_shape` and `element_size`.
    ///
    /// # Errors
    /// Returns [`ArrayExtractBytesError`] if the length of `array_shape` does not match the array subset dimensionality,
    /// the array subset is outside of the bounds of `array_shape`, or `bytes` does not match the size of the array.
    pub fn extract_bytes(
        &self,
        bytes: &[u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<Vec<u8>, ArrayExtractBytesError> {
        let err = || ArrayExtractBytesError(self.clone(), array_shape.to_vec(), element_size);
        if bytes.len() as u64 != array_shape.iter().product::<u64>() * element_size as u64 {
            return Err(err());
        }
        let contiguous_indices = self
            .contiguous_linearised_indices(array_shape)
            .map_err(|_| err())?;
        let mut bytes_subset = Vec::with_capacity(self.num_elements_usize() * element_size);
        for (array_index, contiguous_elements) in contiguous_indices {
            let byte_offset = usize::try_from(array_index).map_err(|_| err())? * element_size;
            let byte_length =
                usize::try_from(contiguous_elements).map_err(|_| err())? * element_size;
            bytes_subset.extend_from_slice(&bytes[byte_offset..byte_offset + byte_length]);
        }
        Ok(bytes_subset)
    }

    /// Return the elements in this array subset from an array with shape `array_shape`.
    ///
    /// # Errors
    /// Returns [`ArrayExtractBytesError`] if the length of `array_shape` does not match the array subset dimensionality,
    /// the array subset is outside of the bounds of `array_shape`, or `elements` does not match the size of the array.
    pub fn extract_elements<T: Copy>(
        &self,
        elements: &[T],
        array_shape: &[u64],
    ) -> Result<Vec<T>, ArrayExtractBytesError> {
        let err = || ArrayExtractBytesError(self.clone(), array_shape.to_vec(), 1);
        if elements.len() as u64 != array_shape.iter().product::<u64>() {
            return Err(err());
        }
        let contiguous_indices = self
            .contiguous_linearised_indices(array_shape)
            .map_err(|_| err())?;
        let mut elements_subset = Vec::with_capacity(self.num_elements_usize());
        for (array_index, contiguous_elements) in contiguous_indices {
            let offset = usize::try_from(array_index).map_err(|_| err())?;
            let length = usize::try_from(contiguous_elements).map_err(|_| err())?;
            elements_subset.extend_from_slice(&elements[offset..offset + length]);
        }
        Ok(elements_subset)
    }

    /// Store `bytes_subset` corresponding to this array subset into the bytes of an array (`bytes_array`) with shape `array_shape` and `element_size`.
    ///
    /// # Errors
    /// Returns [`ArrayStoreBytesError`] if:
    ///  - the length of `array_shape` does not match the array subset dimensionality or the array subset is outside of the bounds of `array_shape`,
    ///  - the length of `bytes_array` is not compatible with the `array_shape` and `element size`, or
    ///  - the length of `bytes_subset` is not compatible with the shape of this subset and `element_size`.
    #[allow(clippy::cast_possible_truncation)]
    pub fn store_bytes(
        &self,
        bytes_subset: &[u8],
        bytes_array: &mut [u8],
        array_shape: &[u64],
        element_size: usize,
    ) -> Result<(), ArrayStoreBytesError> {
        let expected_subset_size = self.num_elements() * element_size as u64;
        let expected_array_size = array_shape.iter().product::<u64>() * element_size as u64;
        if bytes_subset.len() as u64 != expected_subset_size {
            return Err(ArrayStoreBytesError::InvalidSubsetBytes(
                bytes_subset.len(),
                expected_subset_size,
            ));
        }
        if bytes_array.len() as u64 != expected_array_size {
            return Err(ArrayStoreBytesError::InvalidArrayBytes(
                bytes_array.len(),
                expected_array_size,
            ));
        }
        let mut offset = 0;
        for (array_index, contiguous_elements) in self.contiguous_linearised_indices(array_shape)? {
            // Both are bounded by the length of bytes_array
            let byte_index = array_index as usize * element_size;
            let byte_length = contiguous_elements as usize * element_size;
            bytes_array[byte_index..byte_index + byte_length]
                .copy_from_slice(&bytes_subset[offset..offset + byte_length]);
            offset += byte_length;
        }
        Ok(())
    }

    /// Returns an iterator over the indices of elements within the subset, in C (row-major) order.
    #[must_use]
    pub fn indices(&self) -> IndicesIterator {
        IndicesIterator::new(self.clone())
    }

    /// Returns an iterator over chunks with shape `chunk_shape` overlapping the array subset.
    ///
    /// All chunks overlapping the array subset are returned, and they all have the same shape `chunk_shape`.
    /// Thus, the subsets of the chunks may extend out over the subset.
    ///
    /// # Errors
    /// Returns [`IncompatibleDimensionalityError`] if `chunk_shape` does not match the array subset dimensionality.
    pub fn chunks(
        &self,
        chunk_shape: &[NonZeroU64],
    ) -> Result<ChunksIterator, IncompatibleDimensionalityError> {
        ChunksIterator::new(self, chunk_shape)
    }

    /// Returns an iterator over the runs of contiguous elements of the subset within an array of shape `array_shape`.
    ///
    /// The iterator item is a tuple: (linearised index, number of contiguous elements).
    ///
    /// # Errors
    /// Returns [`IncompatibleArraySubsetAndShapeError`] if `array_shape` does not encapsulate this array subset.
    pub fn contiguous_linearised_indices(
        &self,
        array_shape: &[u64],
    ) -> Result<ContiguousLinearisedIndicesIterator, IncompatibleArraySubsetAndShapeError> {
        ContiguousLinearisedIndicesIterator::new(self, array_shape.to_vec())
    }
}

/// An incompatible dimensionality error.
#[derive(Copy, Clone, Debug, Error)]
#[error("incompatible dimensionality {0}, expected {1}")]
pub struct IncompatibleDimensionalityError(usize, usize);

impl IncompatibleDimensionalityError {
    /// Create a new incompatible dimensionality error.
    #[must_use]
    pub const fn new(got: usize, expected: usize) -> Self {
        Self(got, expected)
    }
}

/// An incompatible array and array subset shape error.
#[derive(Clone, Debug, Error)]
#[error("incompatible array subset {0} with array shape {1:?}")]
pub struct IncompatibleArraySubsetAndShapeError(ArraySubset, ArrayShape);

impl IncompatibleArraySubsetAndShapeError {
    /// Create a new incompatible array subset and shape error.
    #[must_use]
    pub fn new(array_subset: ArraySubset, array_shape: ArrayShape) -> Self {
        Self(array_subset, array_shape)
    }
}

/// An incompatible start error.
#[derive(Clone, Debug, Error)]
#[error("start {0:?} is incompatible with {1}")]
pub struct IncompatibleStartError(ArrayIndices, ArraySubset);

/// An invalid array subset error.
#[derive(Copy, Clone, Debug, Error)]
#[error("invalid array subset")]
pub struct InvalidArraySubsetError;
