use std::{error::Error, fmt::Debug, path::Path, sync::Arc};

use half::bf16;
use zarrs_fixtures::{
    array::{
        chunk_key_encoding::{DefaultChunkKeyEncoding, V2ChunkKeyEncoding},
        codec::{BytesCodec, GzipCodec, ShardingIndexLocation, TransposeCodec, TransposeOrder},
        ravel_indices, Array, ArrayBuilder, ArrayMetadataV3, ChunkKeyEncoding, DataType,
        FillValue,
    },
    array_subset::ArraySubset,
    group::GroupMetadataV3,
    storage::{
        create_array, create_group, data_key, meta_key,
        store::{FilesystemStore, MemoryStore},
        ListableStorageTraits, ReadableStorageTraits, WritableStorageTraits,
    },
};

const ARRAY_METADATA: &str = r#"{
    "zarr_format": 3,
    "node_type": "array",
    "shape": [4, 4],
    "data_type": "int16",
    "chunk_grid": {
        "name": "regular",
        "configuration": {"chunk_shape": [2, 2]}
    },
    "chunk_key_encoding": {
        "name": "default",
        "configuration": {"separator": "/"}
    },
    "fill_value": 0,
    "codecs": [
        {
            "name": "sharding_indexed",
            "configuration": {
                "chunk_shape": [1, 1],
                "codecs": [
                    {"name": "bytes", "configuration": {"endian": "little"}},
                    {"name": "gzip", "configuration": {"level": 5}}
                ],
                "index_codecs": [
                    {"name": "bytes", "configuration": {"endian": "little"}},
                    "crc32c"
                ],
                "index_location": "end"
            }
        }
    ],
    "attributes": {"spam": "ham"},
    "dimension_names": ["y", null]
}"#;

const GROUP_METADATA: &str = r#"{
    "zarr_format": 3,
    "node_type": "group",
    "attributes": {"eggs": 42}
}"#;

fn to_json(data: &[u8]) -> serde_json::Value {
    serde_json::from_slice(data).unwrap()
}

#[test]
fn array_metadata_round_trip_memory() -> Result<(), Box<dyn Error>> {
    let json: serde_json::Value = serde_json::from_str(ARRAY_METADATA)?;
    let array: ArrayMetadataV3 = serde_json::from_value(json.clone())?;

    let store = MemoryStore::new();
    create_array(&store, &"/array".try_into()?, &array)?;

    let json_cmp = to_json(&store.get(&meta_key(&"/array".try_into()?))?.unwrap());
    assert_eq!(json, json_cmp);
    Ok(())
}

#[test]
fn group_metadata_round_trip_memory() -> Result<(), Box<dyn Error>> {
    let json: serde_json::Value = serde_json::from_str(GROUP_METADATA)?;
    let group: GroupMetadataV3 = serde_json::from_value(json.clone())?;

    let store = MemoryStore::new();
    create_group(&store, &"/group".try_into()?, &group)?;

    let json_cmp = to_json(&store.get(&meta_key(&"/group".try_into()?))?.unwrap());
    assert_eq!(json, json_cmp);
    Ok(())
}

#[test]
fn array_open_from_metadata() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    store.set(
        &meta_key(&"/array".try_into()?),
        ARRAY_METADATA.as_bytes().to_vec().into(),
    )?;
    let array = Array::new(store.clone(), "/array")?;
    assert_eq!(array.shape(), &[4, 4]);
    assert_eq!(array.chunk_grid_shape(), Some(vec![2, 2]));

    let values: Vec<i16> = (1..=16).collect();
    array.store_array_subset_elements(&ArraySubset::new_with_shape(vec![4, 4]), &values)?;
    assert_eq!(
        array.retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_ranges(&[1..3, 1..3]))?,
        vec![6, 7, 10, 11]
    );
    let mut keys = store.list()?;
    keys.sort();
    let keys: Vec<_> = keys.iter().map(|key| key.as_str().to_string()).collect();
    assert_eq!(
        keys,
        vec![
            "array/c/0/0",
            "array/c/0/1",
            "array/c/1/0",
            "array/c/1/1",
            "array/zarr.json"
        ]
    );
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn metadata_round_trip_filesystem() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = FilesystemStore::new(path.path())?;
    let metadata_in = ARRAY_METADATA.as_bytes();
    store.set(
        &meta_key(&"/group/array".try_into()?),
        metadata_in.to_vec().into(),
    )?;
    let metadata_out = store.get(&meta_key(&"/group/array".try_into()?))?.unwrap();
    assert_eq!(metadata_in, metadata_out);
    assert!(path.path().join("group/array/zarr.json").is_file());
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn array_round_trip_filesystem() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?);
    let mut builder = ArrayBuilder::new(
        vec![5, 3],
        DataType::Float32,
        vec![1, 3].try_into()?,
        FillValue::from(f32::NAN),
    );
    builder
        .shard_shape(vec![2, 3].try_into()?)
        .sharding_index_location(ShardingIndexLocation::Start)
        .bytes_to_bytes_codecs(vec![Box::new(GzipCodec::new(1)?)]);
    let array = builder.build(store.clone(), "/ragged")?;
    array.store_metadata()?;

    let values: Vec<f32> = (0..15u8).map(f32::from).collect();
    array.store_array_subset_elements(&ArraySubset::new_with_shape(vec![5, 3]), &values)?;
    assert!(path.path().join("ragged/c/2/0").is_file());

    let array = Array::new(store, "/ragged")?;
    assert_eq!(
        array.retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_shape(vec![5, 3]))?,
        values
    );
    assert_eq!(
        array.retrieve_array_subset_elements::<f32>(&ArraySubset::new_with_ranges(&[4..5, 0..3]))?,
        vec![12.0, 13.0, 14.0]
    );
    Ok(())
}

fn filesystem_chunk_round_trip_impl(
    path: &Path,
    chunk_key_encoding: &ChunkKeyEncoding,
) -> Result<(), Box<dyn Error>> {
    let store = FilesystemStore::new(path)?;
    let data_serialised_in: Vec<u8> = vec![0, 1, 2];
    let key = data_key(&"/group/array".try_into()?, &[0, 0, 0], chunk_key_encoding);
    store.set(&key, data_serialised_in.clone().into())?;
    let data_serialised_out = store.get(&key)?.unwrap().to_vec();
    assert_eq!(data_serialised_in, data_serialised_out);
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn chunk_round_trip_filesystem_key_encoding_default_slash() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let chunk_key_encoding = ChunkKeyEncoding::new(DefaultChunkKeyEncoding::default());
    filesystem_chunk_round_trip_impl(path.path(), &chunk_key_encoding)?;
    assert!(path.path().join("group/array/c/0/0/0").is_file());
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn chunk_round_trip_filesystem_key_encoding_default_dot() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let chunk_key_encoding = ChunkKeyEncoding::new(DefaultChunkKeyEncoding::new_dot());
    filesystem_chunk_round_trip_impl(path.path(), &chunk_key_encoding)?;
    assert!(path.path().join("group/array/c.0.0.0").is_file());
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn chunk_round_trip_filesystem_key_encoding_v2_dot() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let chunk_key_encoding = ChunkKeyEncoding::new(V2ChunkKeyEncoding::default());
    filesystem_chunk_round_trip_impl(path.path(), &chunk_key_encoding)?;
    assert!(path.path().join("group/array/0.0.0").is_file());
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn chunk_round_trip_filesystem_key_encoding_v2_slash() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let chunk_key_encoding = ChunkKeyEncoding::new(V2ChunkKeyEncoding::new_slash());
    filesystem_chunk_round_trip_impl(path.path(), &chunk_key_encoding)?;
    assert!(path.path().join("group/array/0/0/0").is_file());
    Ok(())
}

/// Gather the elements of `subset` from a C order `array` of `shape`.
fn gather<T: Copy>(array: &[T], shape: &[u64], subset: &ArraySubset) -> Vec<T> {
    subset
        .indices()
        .map(|indices| array[usize::try_from(ravel_indices(&indices, shape)).unwrap()])
        .collect()
}

fn sharding_transparency_impl(
    shape: &[u64],
    shard_shape: &[u64],
    chunk_shape: &[u64],
) -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let fill_value = FillValue::from(u16::MAX);
    let plain = ArrayBuilder::new(
        shape.to_vec(),
        DataType::UInt16,
        chunk_shape.to_vec().try_into()?,
        fill_value.clone(),
    )
    .build(store.clone(), "/plain")?;
    let mut builder = ArrayBuilder::new(
        shape.to_vec(),
        DataType::UInt16,
        chunk_shape.to_vec().try_into()?,
        fill_value,
    );
    builder.shard_shape(shard_shape.to_vec().try_into()?);
    let sharded = builder.build(store.clone(), "/sharded")?;

    let full = ArraySubset::new_with_shape(shape.to_vec());
    let initial: Vec<u16> = (0..full.num_elements())
        .map(|i| u16::try_from(i).unwrap())
        .collect();
    let mut expected = initial.clone();
    let overwrite = ArraySubset::new_with_ranges(
        &shape.iter().map(|&size| 1..size.min(4)).collect::<Vec<_>>(),
    );
    let overwrite_values: Vec<u16> = (0..overwrite.num_elements())
        .map(|i| 1000 + u16::try_from(i).unwrap())
        .collect();
    let cleared = ArraySubset::new_with_ranges(
        &shape.iter().map(|&size| 0..size.min(2)).collect::<Vec<_>>(),
    );
    let cleared_values = vec![u16::MAX; cleared.num_elements_usize()];
    for (indices, value) in overwrite.indices().zip(&overwrite_values) {
        expected[usize::try_from(ravel_indices(&indices, shape))?] = *value;
    }
    for indices in cleared.indices() {
        expected[usize::try_from(ravel_indices(&indices, shape))?] = u16::MAX;
    }

    for array in [&plain, &sharded] {
        array.store_array_subset_elements(&full, &initial)?;
        array.store_array_subset_elements(&overwrite, &overwrite_values)?;
        array.store_array_subset_elements(&cleared, &cleared_values)?;
    }

    let plain = Array::new(store.clone(), "/plain")?;
    let sharded = Array::new(store, "/sharded")?;
    let edge = ArraySubset::new_with_ranges(
        &shape.iter().map(|&size| size - 2..size).collect::<Vec<_>>(),
    );
    let last = ArraySubset::new_with_ranges(
        &shape.iter().map(|&size| size - 1..size).collect::<Vec<_>>(),
    );
    for subset in [&full, &overwrite, &cleared, &edge, &last] {
        let plain_elements = plain.retrieve_array_subset_elements::<u16>(subset)?;
        assert_eq!(plain_elements, gather(&expected, shape, subset));
        assert_eq!(
            sharded.retrieve_array_subset_elements::<u16>(subset)?,
            plain_elements
        );
    }
    Ok(())
}

#[test]
fn sharding_transparency_2d_ragged() -> Result<(), Box<dyn Error>> {
    sharding_transparency_impl(&[5, 7], &[2, 4], &[1, 2])
}

#[test]
fn sharding_transparency_3d_ragged() -> Result<(), Box<dyn Error>> {
    sharding_transparency_impl(&[7, 5, 3], &[4, 2, 2], &[2, 1, 1])
}

fn data_type_round_trip_impl<T>(
    data_type: DataType,
    value: impl Fn(u64) -> T,
) -> Result<(), Box<dyn Error>>
where
    T: bytemuck::Pod + PartialEq + Debug,
{
    for (shape, chunk_shape, shard_shape) in [
        (vec![5, 7], vec![2, 3], vec![4, 6]),
        (vec![7, 5, 3], vec![2, 2, 2], vec![4, 4, 2]),
    ] {
        for sharded in [false, true] {
            let store = Arc::new(MemoryStore::new());
            let mut builder = ArrayBuilder::new(
                shape.clone(),
                data_type,
                chunk_shape.clone().try_into()?,
                data_type.default_fill_value(),
            );
            builder.bytes_to_bytes_codecs(vec![Box::new(GzipCodec::new(5)?)]);
            if sharded {
                builder.shard_shape(shard_shape.clone().try_into()?);
            }
            builder.build(store.clone(), "/array")?.store_metadata()?;

            let array = Array::new(store.clone(), "/array")?;
            assert_eq!(array.data_type(), &data_type);
            let full = ArraySubset::new_with_shape(shape.clone());
            let elements: Vec<T> = (0..full.num_elements()).map(&value).collect();
            array.store_array_subset_elements(&full, &elements)?;

            let array = Array::new(store, "/array")?;
            assert_eq!(array.retrieve_array_subset_elements::<T>(&full)?, elements);
            let edge = ArraySubset::new_with_ranges(
                &shape.iter().map(|&size| size / 2..size).collect::<Vec<_>>(),
            );
            assert_eq!(
                array.retrieve_array_subset_elements::<T>(&edge)?,
                gather(&elements, &shape, &edge)
            );
        }
    }
    Ok(())
}

#[test]
fn data_type_round_trip_int8() -> Result<(), Box<dyn Error>> {
    data_type_round_trip_impl(DataType::Int8, |i| i8::try_from(i).unwrap() - 50)
}

#[test]
fn data_type_round_trip_int64() -> Result<(), Box<dyn Error>> {
    data_type_round_trip_impl(DataType::Int64, |i| {
        i64::try_from(i).unwrap() * -1_000_000_007
    })
}

#[test]
fn data_type_round_trip_uint16() -> Result<(), Box<dyn Error>> {
    data_type_round_trip_impl(DataType::UInt16, |i| u16::try_from(i).unwrap() * 300)
}

#[test]
fn data_type_round_trip_uint32() -> Result<(), Box<dyn Error>> {
    data_type_round_trip_impl(DataType::UInt32, |i| u32::MAX - u32::try_from(i).unwrap())
}

#[test]
fn data_type_round_trip_uint64() -> Result<(), Box<dyn Error>> {
    data_type_round_trip_impl(DataType::UInt64, |i| u64::MAX - i * 0x0101_0101)
}

#[test]
fn data_type_round_trip_bfloat16() -> Result<(), Box<dyn Error>> {
    data_type_round_trip_impl(DataType::BFloat16, |i| {
        bf16::from_f32(f32::from(u8::try_from(i).unwrap()) - 50.0)
    })
}

#[test]
fn transpose_big_endian_layout() -> Result<(), Box<dyn Error>> {
    let store = Arc::new(MemoryStore::new());
    let values: Vec<i16> = (0..12).collect();
    let full = ArraySubset::new_with_shape(vec![3, 4]);

    let plain = ArrayBuilder::new(
        vec![3, 4],
        DataType::Int16,
        vec![3, 4].try_into()?,
        FillValue::from(0i16),
    )
    .build(store.clone(), "/plain")?;
    plain.store_metadata()?;
    plain.store_array_subset_elements(&full, &values)?;

    let mut builder = ArrayBuilder::new(
        vec![3, 4],
        DataType::Int16,
        vec![3, 4].try_into()?,
        FillValue::from(0i16),
    );
    builder
        .array_to_array_codecs(vec![Box::new(TransposeCodec::new(TransposeOrder::new(&[
            1, 0,
        ])?))])
        .array_to_bytes_codec(Box::new(BytesCodec::big()));
    let transposed = builder.build(store.clone(), "/transposed")?;
    transposed.store_metadata()?;
    transposed.store_array_subset_elements(&full, &values)?;

    let metadata = to_json(&store.get(&meta_key(&"/transposed".try_into()?))?.unwrap());
    assert_eq!(metadata["codecs"][0]["name"], "transpose");
    assert_eq!(metadata["codecs"][1]["name"], "bytes");
    assert_eq!(metadata["codecs"][1]["configuration"]["endian"], "big");

    let plain_bytes = store.get(&plain.chunk_key(&[0, 0]))?.unwrap().to_vec();
    let transposed_bytes = store.get(&transposed.chunk_key(&[0, 0]))?.unwrap().to_vec();
    let expected: Vec<u8> = (0..4)
        .flat_map(|column| (0..3).map(move |row| row * 4 + column))
        .flat_map(|value: i16| value.to_be_bytes())
        .collect();
    assert_eq!(transposed_bytes, expected);
    assert_eq!(
        plain_bytes,
        values.iter().flat_map(|value| value.to_le_bytes()).collect::<Vec<u8>>()
    );
    assert_ne!(plain_bytes, transposed_bytes);

    let transposed = Array::new(store, "/transposed")?;
    assert_eq!(transposed.retrieve_array_subset_elements::<i16>(&full)?, values);
    assert_eq!(
        transposed.retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_ranges(&[
            1..3,
            2..4
        ]))?,
        vec![6, 7, 10, 11]
    );
    Ok(())
}
