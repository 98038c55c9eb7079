use std::num::NonZeroU64;

use derive_more::Display;

use super::{data_type::IncompatibleFillValueError, ArrayShape, ChunkShape, DataType, FillValue};

/// The shape, data type, and fill value of a chunk (or shard).
///
/// This is everything a codec needs to know about the decoded form of the bytes it encodes.
#[derive(Clone, Debug, Display)]
#[display("{shape:?} {data_type} {fill_value}")]
pub struct ChunkRepresentation {
    shape: ChunkShape,
    data_type: DataType,
    fill_value: FillValue,
}

impl ChunkRepresentation {
    /// Create a new [`ChunkRepresentation`].
    ///
    /// # Errors
    /// Returns [`IncompatibleFillValueError`] if the `data_type` and `fill_value` are incompatible.
    pub fn new(
        shape: ChunkShape,
        data_type: DataType,
        fill_value: FillValue,
    ) -> Result<Self, IncompatibleFillValueError> {
        if data_type.is_compatible(&fill_value) {
            Ok(Self {
                shape,
                data_type,
                fill_value,
            })
        } else {
            Err(IncompatibleFillValueError::new(data_type.name(), fill_value))
        }
    }

    /// Return the shape of the chunk.
    #[must_use]
    pub fn shape(&self) -> &[NonZeroU64] {
        &self.shape
    }

    /// Return the shape of the chunk as an [`ArrayShape`].
    #[must_use]
    pub fn shape_u64(&self) -> ArrayShape {
        self.shape.to_array_shape()
    }

    /// Return the dimensionality of the chunk.
    #[must_use]
    pub fn dimensionality(&self) -> usize {
        self.shape.len()
    }

    /// Return the data type of the chunk.
    #[must_use]
    pub const fn data_type(&self) -> &DataType {
        &self.data_type
    }

    /// Return the fill value of the chunk.
    #[must_use]
    pub const fn fill_value(&self) -> &FillValue {
        &self.fill_value
    }

    /// Return the element size in bytes.
    #[must_use]
    pub const fn element_size(&self) -> usize {
        self.data_type.size()
    }

    /// Return the number of elements in the chunk.
    #[must_use]
    pub fn num_elements(&self) -> u64 {
        self.shape.num_elements()
    }

    /// Return the size in bytes of the decoded chunk.
    #[must_use]
    pub fn size(&self) -> u64 {
        self.num_elements() * self.element_size() as u64
    }

    /// Return the size in bytes of the decoded chunk as a `usize`.
    ///
    /// # Panics
    /// Panics if the size of the chunk exceeds [`usize::MAX`].
    #[must_use]
    pub fn size_usize(&self) -> usize {
        usize::try_from(self.size()).expect("chunk size exceeds usize::MAX")
    }

    /// Return the decoded bytes of a chunk entirely composed of the fill value.
    #[must_use]
    pub fn fill_value_bytes(&self) -> Vec<u8> {
        self.fill_value
            .repeat(self.size_usize() / self.element_size().max(1))
    }
}

/// The size of encoded bytes.
#[derive(Copy, Clone, Eq, PartialEq, Debug, Display)]
pub enum BytesRepresentation {
    /// The encoded size is known exactly.
    #[display("fixed size: {_0}")]
    FixedSize(u64),
    /// The encoded size has an upper bound.
    #[display("bounded size: {_0}")]
    BoundedSize(u64),
    /// The encoded size is not known until encoding.
    #[display("unbounded size")]
    UnboundedSize,
}

impl BytesRepresentation {
    /// Return the fixed or bounded size, or [`None`] if the size is unbounded.
    #[must_use]
    pub const fn size(&self) -> Option<u64> {
        match self {
            Self::FixedSize(size) | Self::BoundedSize(size) => Some(*size),
            Self::UnboundedSize => None,
        }
    }
}
