#![cfg(feature = "fixtures")]

use std::{error::Error, sync::Arc};

use zarrs_fixtures::{
    array::{Array, DataType},
    array_subset::ArraySubset,
    fixtures::{catalogue, generate, select, verify, FixtureError},
    group::Group,
    node::NodePath,
    storage::{store::FilesystemStore, ReadableStorageTraits, WritableStorageTraits},
};

fn read_json(path: &std::path::Path) -> serde_json::Value {
    serde_json::from_slice(&std::fs::read(path).unwrap()).unwrap()
}

#[test]
#[cfg_attr(miri, ignore)]
fn fixtures_filesystem() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?.sorted());
    let fixtures = catalogue();
    let reports = generate(&store, &NodePath::root(), &fixtures)?;
    assert_eq!(reports.len(), fixtures.len());
    verify(&store, &NodePath::root(), &fixtures)?;

    // Every fixture is a child of the root group
    let root = Group::new(store.clone(), "/")?;
    assert_eq!(root.child_paths()?.len(), fixtures.len());
    assert_eq!(read_json(&path.path().join("zarr.json"))["node_type"], "group");

    // 3d.chunked.mixed.i2.F has a transpose codec before the serialiser
    let metadata = read_json(&path.path().join("3d.chunked.mixed.i2.F/zarr.json"));
    assert_eq!(metadata["codecs"][0]["name"], "transpose");
    assert_eq!(
        metadata["codecs"][0]["configuration"]["order"],
        serde_json::json!([2, 1, 0])
    );
    assert_eq!(metadata["codecs"][2]["configuration"]["typesize"], 4);

    // Explicit null dimension names
    let metadata = read_json(&path.path().join("1d.chunked.i2/zarr.json"));
    assert!(metadata["dimension_names"].is_null());
    assert!(Array::new(store.clone(), "/1d.chunked.i2")?
        .dimension_names()
        .is_none());

    // Big endian floats on disk
    let chunk = std::fs::read(path.path().join("1d.contiguous.f4.be/c/0"))?;
    assert!(!chunk.is_empty());
    let array = Array::new(store.clone(), "/1d.contiguous.f4.be")?;
    assert_eq!(
        array.retrieve_chunk_elements::<f32>(&[0])?,
        vec![-1000.5, 0.0, 1000.5, 0.0]
    );

    // The raw fixture is little endian i2 with no compression
    let chunk = std::fs::read(path.path().join("1d.contiguous.raw.i2/c/0"))?;
    assert_eq!(chunk, [1, 0, 2, 0, 3, 0, 4, 0]);

    // Single byte data types are serialised without an endianness
    let metadata = read_json(&path.path().join("1d.contiguous.u1/zarr.json"));
    assert_eq!(metadata["codecs"][0], serde_json::json!({"name": "bytes"}));
    let metadata = read_json(&path.path().join("1d.contiguous.compressed.sharded.b1/zarr.json"));
    assert_eq!(
        metadata["codecs"][0]["configuration"]["codecs"][0],
        serde_json::json!({"name": "bytes"})
    );

    // Booleans read back as bytes
    let array = Array::new(store.clone(), "/1d.contiguous.compressed.sharded.b1")?;
    assert_eq!(array.data_type(), &DataType::Bool);
    assert_eq!(
        array.retrieve_array_subset(&ArraySubset::new_with_shape(vec![4]))?,
        vec![1, 0, 1, 0]
    );
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn fixtures_sharded_layout() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?);
    let fixtures = select(catalogue(), "sharded");
    assert_eq!(fixtures.len(), 16);
    generate(&store, &NodePath::root(), &fixtures)?;
    verify(&store, &NodePath::root(), &fixtures)?;

    // The fill valued shard of 1d.chunked.filled.compressed.sharded.i2 is not written
    assert!(path
        .path()
        .join("1d.chunked.filled.compressed.sharded.i2/c/0")
        .is_file());
    assert!(!path
        .path()
        .join("1d.chunked.filled.compressed.sharded.i2/c/1")
        .exists());

    // The ragged edge shard of 1d.chunked.ragged.compressed.sharded.i2 holds one non-empty inner chunk
    let shard = std::fs::read(path.path().join("1d.chunked.ragged.compressed.sharded.i2/c/2"))?;
    // The index is 2 (offset, nbytes) u64 pairs and a crc32c checksum at the end of the shard
    let index = &shard[shard.len() - 36..shard.len() - 4];
    let entries: Vec<u64> = index
        .chunks_exact(8)
        .map(|entry| u64::from_le_bytes(entry.try_into().unwrap()))
        .collect();
    assert_eq!(entries[0], 0);
    assert_eq!(entries[1] + 36, shard.len() as u64);
    assert_eq!(entries[2..], [u64::MAX, u64::MAX]);

    let array = Array::new(store.clone(), "/2d.chunked.ragged.compressed.sharded.i2")?;
    assert_eq!(
        array.retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_ranges(&[1..3, 1..3]))?,
        vec![5, 6, 8, 9]
    );
    assert_eq!(
        array.retrieve_chunk_subset(&[1, 1], &ArraySubset::new_with_ranges(&[0..1, 0..1]))?,
        9i16.to_ne_bytes()
    );

    let array = Array::new(store.clone(), "/3d.chunked.compressed.sharded.i2")?;
    assert_eq!(
        array.retrieve_array_subset_elements::<i16>(&ArraySubset::new_with_ranges(&[
            3..4,
            3..4,
            0..4
        ]))?,
        vec![60, 61, 62, 63]
    );
    Ok(())
}

#[test]
#[cfg_attr(miri, ignore)]
fn fixtures_verify_detects_corruption() -> Result<(), Box<dyn Error>> {
    let path = tempfile::TempDir::new()?;
    let store = Arc::new(FilesystemStore::new(path.path())?);
    let fixtures = select(catalogue(), "2d.chunked.compressed.sharded.i2");
    assert_eq!(fixtures.len(), 1);
    generate(&store, &NodePath::root(), &fixtures)?;

    let key = "2d.chunked.compressed.sharded.i2/c/1/1".try_into()?;
    let mut shard = store.get(&key)?.unwrap().to_vec();
    shard.truncate(shard.len() - 4);
    store.set(&key, shard.into())?;
    assert!(matches!(
        verify(&store, &NodePath::root(), &fixtures),
        Err(FixtureError::ArrayError(_))
    ));

    // Regeneration replaces the corrupt shard
    generate(&store, &NodePath::root(), &fixtures)?;
    verify(&store, &NodePath::root(), &fixtures)?;
    Ok(())
}
