//! Integration tests for the resource cache and raw payload loading.

use std::rc::Rc;

use volumetric_rs::*;

fn payload_fs() -> MemoryFileSystem {
    let samples: Vec<u8> = (0u16..8).flat_map(|v| (v * 100).to_be_bytes()).collect();
    MemoryFileSystem::new()
        .with_file("/b/x.dat", samples)
        .with_file("/a/other.dat", vec![0u8; 4])
}

#[test]
fn test_register_twice_then_dispose_twice() {
    let mut cache = ResourceCache::new();
    let p = Rc::new(String::from("first"));
    let p2 = Rc::new(String::from("second"));
    cache.register(Rc::clone(&p), "f");
    cache.register(Rc::clone(&p2), "f");
    assert_eq!(cache.len(), 1);
    assert_eq!(cache.used_by("f"), Some(2));

    cache.dispose(&p);
    assert_eq!(cache.get("f").as_deref().map(String::as_str), Some("first"));

    cache.dispose(&p2);
    assert!(cache.get("f").is_none());
    assert!(!cache.is_registered(&p));
    assert!(!cache.is_registered(&p2));
}

#[test]
fn test_resolve_through_search_paths() {
    let mut cache: ResourceCache<VolumeRam> = ResourceCache::from_options(
        &CacheOptions::new().with_search_path("/a").with_search_path("/b"),
    )
    .with_file_system(payload_fs());
    assert_eq!(cache.resolve_path("x.dat").unwrap(), std::path::PathBuf::from("/b/x.dat"));
    assert!(matches!(cache.resolve_path("y.dat"), Err(ResourceError::NotFound(_))));
    cache.remove_search_path("/b");
    assert!(cache.resolve_path("x.dat").is_err());
}

#[test]
fn test_load_raw_is_shared() {
    let mut cache = ResourceCache::new().with_file_system(payload_fs());
    cache.add_search_path("/b");
    let info = RawVolumeInfo::new(ElementFormat::UInt16, UVec3::new(2, 2, 2))
        .with_byte_order(ByteOrder::Big);

    let first = load_raw(&mut cache, "x.dat", &info).unwrap();
    let second = load_raw(&mut cache, "x.dat", &info).unwrap();
    assert!(Rc::ptr_eq(&first, &second));
    assert_eq!(cache.used_by("x.dat"), Some(2));
    assert_eq!(first.max_value(), 700.0);

    let mut volume = Volume::new((*first).clone(), Vec3::ONE, Vec3::ZERO).with_origin("x.dat");
    let stats = volume.derived_data::<VolumeMinMax>().unwrap();
    assert_eq!(stats.max, 700.0);
    assert_eq!(volume.origin(), "x.dat");
}

#[test]
fn test_load_raw_rejects_short_payload() {
    let sink = Rc::new(RecordingSink::new());
    let mut cache = ResourceCache::new()
        .with_file_system(payload_fs())
        .with_sink(sink.clone());
    cache.add_search_path("/a");
    let info = RawVolumeInfo::new(ElementFormat::Float, UVec3::splat(2));
    let result = load_raw(&mut cache, "other.dat", &info);
    assert!(matches!(
        result,
        Err(Error::Resource(ResourceError::LoadFailed { .. }))
    ));
    assert!(cache.is_empty());
    assert!(sink.contains("size mismatch"));
}

#[test]
fn test_cache_drop_reports_outstanding_users() {
    let sink = Rc::new(RecordingSink::new());
    {
        let mut cache = ResourceCache::new().with_sink(sink.clone());
        let shared = Rc::new(3u8);
        cache.register(Rc::clone(&shared), "three");
        cache.acquire("three");
    }
    assert!(sink.contains("still used by 2"));
}
