use std::sync::Arc;

use log::debug;

use crate::metadata::ArrayMetadataV3;

#[cfg(feature = "sharding")]
use super::codec::{ShardingCodec, ShardingIndexLocation};
use super::{
    chunk_key_encoding::DefaultChunkKeyEncoding,
    codec::{
        ArrayToArrayCodecTraits, ArrayToBytesCodecTraits, BytesCodec, BytesToBytesCodecTraits,
        CodecChain,
    },
    Array, ArrayCreateError, ArrayShape, ChunkGrid, ChunkKeyEncoding, ChunkShape, DataType,
    DimensionName, FillValue,
};

/// An [`Array`] builder.
///
/// The array builder is initialised from an array shape, data type, chunk shape, and fill value.
///  - The default array to bytes codec is `bytes` with little endian byte order.
///  - The default chunk key encoding is `default` with the `/` separator.
///  - There are no array to array or bytes to bytes codecs, attributes, or dimension names by default.
///
/// With a [shard shape](ArrayBuilder::shard_shape), the chunk grid of the array is the shard grid.
/// The codecs are wrapped in a single `sharding_indexed` codec with the chunk shape as its inner chunk shape.
///
/// Use the methods in the array builder to change the configuration away from these defaults, and then build the array at a path of some storage with [`ArrayBuilder::build`].
/// Note that [`build`](ArrayBuilder::build) does not modify the store; the array metadata has to be explicitly written with [`Array::store_metadata`].
///
/// For example:
/// ```rust
/// # use std::sync::Arc;
/// use zarrs_fixtures::array::{ArrayBuilder, DataType, FillValue};
/// # let store = Arc::new(zarrs_fixtures::storage::store::MemoryStore::new());
/// let mut array_builder = ArrayBuilder::new(
///     vec![8, 8], // array shape
///     DataType::Int16,
///     vec![2, 2].try_into()?, // chunk shape
///     FillValue::from(0i16),
/// );
/// array_builder.shard_shape(vec![4, 4].try_into()?);
/// array_builder.dimension_names(Some(["y", "x"]));
///
/// let array = array_builder.build(store.clone(), "/group/array")?;
/// array.store_metadata()?;
/// # Ok::<(), Box<dyn std::error::Error>>(())
/// ```
#[derive(Debug)]
pub struct ArrayBuilder {
    shape: ArrayShape,
    data_type: DataType,
    chunk_shape: ChunkShape,
    #[cfg(feature = "sharding")]
    shard_shape: Option<ChunkShape>,
    #[cfg(feature = "sharding")]
    sharding_index_location: ShardingIndexLocation,
    chunk_key_encoding: ChunkKeyEncoding,
    fill_value: FillValue,
    array_to_array_codecs: Vec<Box<dyn ArrayToArrayCodecTraits>>,
    array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    attributes: serde_json::Map<String, serde_json::Value>,
    dimension_names: Option<Vec<DimensionName>>,
}

impl ArrayBuilder {
    /// Create a new array builder.
    ///
    /// See the [`ArrayBuilder`] docs for information on the defaults.
    #[must_use]
    pub fn new(
        shape: ArrayShape,
        data_type: DataType,
        chunk_shape: ChunkShape,
        fill_value: FillValue,
    ) -> Self {
        Self {
            shape,
            data_type,
            chunk_shape,
            #[cfg(feature = "sharding")]
            shard_shape: None,
            #[cfg(feature = "sharding")]
            sharding_index_location: ShardingIndexLocation::default(),
            chunk_key_encoding: DefaultChunkKeyEncoding::default().into(),
            fill_value,
            array_to_array_codecs: Vec::default(),
            array_to_bytes_codec: Box::new(BytesCodec::little()),
            bytes_to_bytes_codecs: Vec::default(),
            attributes: serde_json::Map::default(),
            dimension_names: None,
        }
    }

    /// Set the shape.
    pub fn shape(&mut self, shape: ArrayShape) -> &mut Self {
        self.shape = shape;
        self
    }

    /// Set the data type.
    pub fn data_type(&mut self, data_type: DataType) -> &mut Self {
        self.data_type = data_type;
        self
    }

    /// Set the chunk shape.
    ///
    /// If the array is sharded, this is the shape of the inner chunks of each shard.
    pub fn chunk_shape(&mut self, chunk_shape: ChunkShape) -> &mut Self {
        self.chunk_shape = chunk_shape;
        self
    }

    /// Set the shard shape.
    ///
    /// Each dimension of the shard shape must be a multiple of the chunk shape.
    #[cfg(feature = "sharding")]
    pub fn shard_shape(&mut self, shard_shape: ChunkShape) -> &mut Self {
        self.shard_shape = Some(shard_shape);
        self
    }

    /// Set the location of the shard index.
    ///
    /// Ignored if the array is not sharded.
    #[cfg(feature = "sharding")]
    pub fn sharding_index_location(&mut self, index_location: ShardingIndexLocation) -> &mut Self {
        self.sharding_index_location = index_location;
        self
    }

    /// Set the chunk key encoding.
    pub fn chunk_key_encoding(&mut self, chunk_key_encoding: ChunkKeyEncoding) -> &mut Self {
        self.chunk_key_encoding = chunk_key_encoding;
        self
    }

    /// Set the fill value.
    pub fn fill_value(&mut self, fill_value: FillValue) -> &mut Self {
        self.fill_value = fill_value;
        self
    }

    /// Set the array to array codecs.
    pub fn array_to_array_codecs(
        &mut self,
        array_to_array_codecs: Vec<Box<dyn ArrayToArrayCodecTraits>>,
    ) -> &mut Self {
        self.array_to_array_codecs = array_to_array_codecs;
        self
    }

    /// Set the array to bytes codec.
    pub fn array_to_bytes_codec(
        &mut self,
        array_to_bytes_codec: Box<dyn ArrayToBytesCodecTraits>,
    ) -> &mut Self {
        self.array_to_bytes_codec = array_to_bytes_codec;
        self
    }

    /// Set the bytes to bytes codecs.
    pub fn bytes_to_bytes_codecs(
        &mut self,
        bytes_to_bytes_codecs: Vec<Box<dyn BytesToBytesCodecTraits>>,
    ) -> &mut Self {
        self.bytes_to_bytes_codecs = bytes_to_bytes_codecs;
        self
    }

    /// Set the user defined attributes.
    pub fn attributes(
        &mut self,
        attributes: serde_json::Map<String, serde_json::Value>,
    ) -> &mut Self {
        self.attributes = attributes;
        self
    }

    /// Set the dimension names.
    ///
    /// [`None`] omits the dimension names from the array metadata.
    pub fn dimension_names<I, D>(&mut self, dimension_names: Option<I>) -> &mut Self
    where
        I: IntoIterator<Item = D>,
        D: Into<DimensionName>,
    {
        self.dimension_names =
            dimension_names.map(|names| names.into_iter().map(Into::into).collect());
        self
    }

    /// Returns the shape of the chunk grid cells and the codec chain of the array.
    fn grid_chunk_shape_and_codecs(&self) -> Result<(ChunkShape, CodecChain), ArrayCreateError> {
        let codecs = CodecChain::new(
            self.array_to_array_codecs.clone(),
            self.array_to_bytes_codec.clone(),
            self.bytes_to_bytes_codecs.clone(),
        );

        #[cfg(feature = "sharding")]
        if let Some(shard_shape) = &self.shard_shape {
            let divisible = shard_shape.len() == self.chunk_shape.len()
                && std::iter::zip(shard_shape.iter(), self.chunk_shape.iter())
                    .all(|(shard, chunk)| shard.get() % chunk.get() == 0);
            if !divisible {
                return Err(ArrayCreateError::InvalidShardShape(
                    shard_shape.clone(),
                    self.chunk_shape.clone(),
                ));
            }
            let sharding_codec = ShardingCodec::new(
                self.chunk_shape.clone(),
                codecs,
                ShardingCodec::default_index_codecs(),
                self.sharding_index_location,
            );
            return Ok((
                shard_shape.clone(),
                CodecChain::new(vec![], Box::new(sharding_codec), vec![]),
            ));
        }

        Ok((self.chunk_shape.clone(), codecs))
    }

    /// Create the metadata of the array.
    ///
    /// # Errors
    /// Returns [`ArrayCreateError`] if the shard shape is incompatible with the chunk shape, or the fill value is incompatible with the data type.
    pub fn build_metadata(&self) -> Result<ArrayMetadataV3, ArrayCreateError> {
        let (grid_chunk_shape, codecs) = self.grid_chunk_shape_and_codecs()?;
        Ok(ArrayMetadataV3::new(
            self.shape.clone(),
            self.data_type.metadata(),
            ChunkGrid::from(grid_chunk_shape).create_metadata(),
            self.chunk_key_encoding.create_metadata(),
            self.data_type.metadata_fill_value(&self.fill_value)?,
            codecs.create_metadatas(),
            self.attributes.clone(),
            self.dimension_names.clone(),
        ))
    }

    /// Build into an [`Array`].
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCreateError`] if there is an error creating the array.
    /// This can be due to an invalid path or a problem with the array configuration.
    pub fn build<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Array<TStorage>, ArrayCreateError> {
        let array = Array::new_with_metadata(storage, path, self.build_metadata()?)?;
        debug!(
            "created array {}: shape {:?}, data type {}, chunk grid shape {:?}",
            array.path(),
            array.shape(),
            array.data_type(),
            array.chunk_grid_shape().unwrap_or_default()
        );
        Ok(array)
    }

    /// Build into an [`Arc<Array>`].
    ///
    /// # Errors
    ///
    /// Returns [`ArrayCreateError`] if there is an error creating the array.
    pub fn build_arc<TStorage: ?Sized>(
        &self,
        storage: Arc<TStorage>,
        path: &str,
    ) -> Result<Arc<Array<TStorage>>, ArrayCreateError> {
        Ok(Arc::new(self.build(storage, path)?))
    }
}
