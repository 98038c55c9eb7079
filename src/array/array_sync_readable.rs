use std::sync::Arc;

use log::{debug, trace};
use rayon::prelude::*;
use rayon_iter_concurrent_limit::iter_concurrent_limit;

use crate::{
    array_subset::ArraySubset,
    config::global_config,
    metadata::ArrayMetadataV3,
    node::NodePath,
    storage::{meta_key, ReadableStorageTraits},
};

use super::{
    codec::{
        ArrayCodecTraits, ArrayPartialDecoderTraits, ArrayToBytesCodecTraits, CodecError,
        StoragePartialDecoder,
    },
    transmute_from_bytes_vec, Array, ArrayCreateError, ArrayError, ArrayIndices,
};

impl<TStorage: ?Sized + ReadableStorageTraits + 'static> Array<TStorage> {
    /// Open an existing array in `storage` at `path`.
    /// The metadata is read from the store.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError::MissingMetadata`] if there is no metadata at `path`.
    /// Returns [`ArrayCreateError`] if the metadata is malformed or describes an unsupported array.
    pub fn new(storage: Arc<TStorage>, path: &str) -> Result<Self, ArrayCreateError> {
        let key = meta_key(&NodePath::new(path)?);
        let metadata: ArrayMetadataV3 = match storage.get(&key)? {
            Some(metadata) => serde_json::from_slice(&metadata)?,
            None => return Err(ArrayCreateError::MissingMetadata),
        };
        let array = Self::new_with_metadata(storage, path, metadata)?;
        debug!(
            "opened array {}: shape {:?}, data type {}",
            array.path(),
            array.shape(),
            array.data_type()
        );
        Ok(array)
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes if it exists.
    ///
    /// Returns [`None`] if the chunk does not exist.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_if_exists(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Option<Vec<u8>>, ArrayError> {
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        let chunk_encoded = crate::storage::retrieve_chunk(
            &*self.storage,
            self.path(),
            chunk_indices,
            self.chunk_key_encoding(),
        )?;
        trace!(
            "retrieve chunk {chunk_indices:?} of {}: {}",
            self.path(),
            chunk_encoded
                .as_ref()
                .map_or_else(|| "missing".to_string(), |bytes| format!("{} bytes", bytes.len()))
        );
        chunk_encoded
            .map(|chunk_encoded| {
                self.codecs
                    .decode(chunk_encoded.to_vec(), &chunk_representation)
                    .map_err(ArrayError::from)
            })
            .transpose()
    }

    /// Read and decode the chunk at `chunk_indices` into its bytes.
    ///
    /// A chunk that does not exist is filled with the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk(&self, chunk_indices: &[u64]) -> Result<Vec<u8>, ArrayError> {
        match self.retrieve_chunk_if_exists(chunk_indices)? {
            Some(chunk) => Ok(chunk),
            None => {
                let chunk_representation = self.chunk_array_representation(chunk_indices)?;
                Ok(chunk_representation.fill_value_bytes())
            }
        }
    }

    /// Read and decode the chunk at `chunk_indices` into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or a [`retrieve_chunk`](Array::retrieve_chunk) error condition is met.
    pub fn retrieve_chunk_elements<T: bytemuck::Pod>(
        &self,
        chunk_indices: &[u64],
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        Ok(transmute_from_bytes_vec(self.retrieve_chunk(chunk_indices)?))
    }

    /// Read and decode the `chunk_subset` of the chunk at `chunk_indices` into its bytes.
    ///
    /// Only the parts of the encoded chunk needed to decode `chunk_subset` are read if the codecs support partial decoding.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - `chunk_indices` are invalid,
    ///  - `chunk_subset` is out of bounds of the chunk,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_chunk_subset(
        &self,
        chunk_indices: &[u64],
        chunk_subset: &ArraySubset,
    ) -> Result<Vec<u8>, ArrayError> {
        let chunk_representation = self.chunk_array_representation(chunk_indices)?;
        if !chunk_subset.inbounds(&chunk_representation.shape_u64()) {
            return Err(ArrayError::InvalidArraySubset(
                chunk_subset.clone(),
                chunk_representation.shape_u64(),
            ));
        }

        let input_handle = Box::new(StoragePartialDecoder::new(
            &*self.storage,
            self.chunk_key(chunk_indices),
        ));
        let decoded = self
            .codecs
            .partial_decoder(input_handle, &chunk_representation)?
            .partial_decode(&[chunk_subset.clone()])?
            .pop()
            .ok_or_else(|| CodecError::from("the partial decoder returned no output"))?;

        let expected_size = chunk_subset.num_elements() * self.data_type().size() as u64;
        if decoded.len() as u64 == expected_size {
            Ok(decoded)
        } else {
            Err(CodecError::UnexpectedChunkDecodedSize(decoded.len(), expected_size).into())
        }
    }

    /// Read and decode the `array_subset` of the array into its bytes.
    ///
    /// The chunks overlapping `array_subset` are decoded in parallel.
    /// Missing chunks, shards, and inner chunks of shards are filled with the fill value.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if
    ///  - the `array_subset` dimensionality does not match the chunk grid dimensionality,
    ///  - the `array_subset` is out of bounds of the array,
    ///  - there is a codec decoding error, or
    ///  - an underlying store error.
    pub fn retrieve_array_subset(&self, array_subset: &ArraySubset) -> Result<Vec<u8>, ArrayError> {
        self.validate_array_subset(array_subset)?;
        let element_size = self.data_type().size();
        let chunks = self.chunks_in_array_subset(array_subset)?;
        let chunk_concurrent_limit = global_config().chunk_concurrent_limit().max(1);

        let decoded_chunks = iter_concurrent_limit!(
            chunk_concurrent_limit,
            chunks.indices().collect::<Vec<_>>(),
            map,
            |chunk_indices: ArrayIndices| {
                let chunk_subset = self.chunk_subset(&chunk_indices)?;
                let overlap = array_subset.overlap(&chunk_subset)?;
                let overlap_in_chunk = overlap.relative_to(chunk_subset.start())?;
                let decoded = self.retrieve_chunk_subset(&chunk_indices, &overlap_in_chunk)?;
                Ok::<_, ArrayError>((overlap, decoded))
            }
        )
        .collect::<Result<Vec<_>, ArrayError>>()?;

        let mut array_bytes = self.fill_value().repeat(array_subset.num_elements_usize());
        for (overlap, decoded) in decoded_chunks {
            overlap.relative_to(array_subset.start())?.store_bytes(
                &decoded,
                &mut array_bytes,
                array_subset.shape(),
                element_size,
            )?;
        }
        Ok(array_bytes)
    }

    /// Read and decode the `array_subset` of the array into a vector of its elements.
    ///
    /// # Errors
    /// Returns an [`ArrayError`] if the size of `T` does not match the data type size or a [`retrieve_array_subset`](Array::retrieve_array_subset) error condition is met.
    pub fn retrieve_array_subset_elements<T: bytemuck::Pod>(
        &self,
        array_subset: &ArraySubset,
    ) -> Result<Vec<T>, ArrayError> {
        self.validate_element_size::<T>()?;
        Ok(transmute_from_bytes_vec(
            self.retrieve_array_subset(array_subset)?,
        ))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{
        array::{ArrayBuilder, DataType, FillValue},
        storage::{store::MemoryStore, Bytes, WritableStorageTraits},
    };

    use super::*;

    #[test]
    fn array_open_missing_and_malformed() {
        let store = Arc::new(MemoryStore::new());
        assert!(matches!(
            Array::new(store.clone(), "/missing"),
            Err(ArrayCreateError::MissingMetadata)
        ));
        store
            .set(
                &"bad/zarr.json".try_into().unwrap(),
                Bytes::from_static(b"{\"zarr_format\": 3"),
            )
            .unwrap();
        assert!(matches!(
            Array::new(store.clone(), "/bad"),
            Err(ArrayCreateError::MetadataDeserializationError(_))
        ));
        store
            .set(
                &"group/zarr.json".try_into().unwrap(),
                Bytes::from_static(br#"{"zarr_format": 3, "node_type": "group"}"#),
            )
            .unwrap();
        assert!(matches!(
            Array::new(store, "/group"),
            Err(ArrayCreateError::MetadataDeserializationError(_))
        ));
    }

    #[test]
    fn array_retrieve_missing_chunks() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![5],
            DataType::Int16,
            vec![2].try_into().unwrap(),
            FillValue::from(-1i16),
        )
        .build(store, "/array")
        .unwrap();
        assert!(array.retrieve_chunk_if_exists(&[0]).unwrap().is_none());
        assert_eq!(array.retrieve_chunk_elements::<i16>(&[2]).unwrap(), vec![-1, -1]);
        assert_eq!(
            array
                .retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_shape(vec![5]))
                .unwrap(),
            vec![-1; 5]
        );
        assert!(array.retrieve_chunk(&[3]).is_err());
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_ranges(&[4..6])),
            Err(ArrayError::InvalidArraySubset(_, _))
        ));
        assert!(matches!(
            array.retrieve_array_subset_elements::<i32>(&ArraySubset::new_with_shape(vec![5])),
            Err(ArrayError::IncompatibleElementSize(4, 2))
        ));
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_shape(vec![5, 1])),
            Err(ArrayError::IncompatibleDimensionalityError(_))
        ));
    }

    #[test]
    fn array_retrieve_corrupt_chunk() {
        let store = Arc::new(MemoryStore::new());
        let array = ArrayBuilder::new(
            vec![4],
            DataType::Int16,
            vec![4].try_into().unwrap(),
            FillValue::from(0i16),
        )
        .build(store.clone(), "/array")
        .unwrap();
        store
            .set(&array.chunk_key(&[0]), Bytes::from_static(&[0, 1, 2]))
            .unwrap();
        assert!(matches!(
            array.retrieve_chunk(&[0]),
            Err(ArrayError::CodecError(_))
        ));
        assert!(matches!(
            array.retrieve_array_subset(&ArraySubset::new_with_shape(vec![4])),
            Err(ArrayError::CodecError(CodecError::CorruptData(_)))
        ));

        // Trailing bytes past the chunk are corrupt for region reads too
        store
            .set(&array.chunk_key(&[0]), Bytes::from(vec![1, 0, 2, 0, 3, 0, 4, 0, 5, 0, 6, 0]))
            .unwrap();
        assert!(matches!(
            array.retrieve_chunk(&[0]),
            Err(ArrayError::CodecError(CodecError::UnexpectedChunkDecodedSize(12, 8)))
        ));
        assert!(matches!(
            array.retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_shape(vec![4])),
            Err(ArrayError::CodecError(CodecError::CorruptData(_)))
        ));
        assert!(matches!(
            array.retrieve_chunk_subset(&[0], &ArraySubset::new_with_ranges(&[1..2])),
            Err(ArrayError::CodecError(CodecError::CorruptData(_)))
        ));
    }
}
