#![allow(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    clippy::cast_precision_loss
)]
//! Demo showing volumes, derived data and the resource cache.
//!
//! Demonstrates:
//! - Building a 16-bit volume from a signed distance field
//! - Cached statistics, intensity histogram and preview
//! - Coordinate transforms between texture, voxel and world space
//! - Sharing a raw payload through the resource cache

use std::rc::Rc;

use volumetric_rs::{
    self as volumetric, ByteOrder, ElementFormat, Mat4, MemoryFileSystem, Options, RawVolumeInfo,
    ResourceCache, Space, UVec3, Vec3, Volume, VolumeHistogramIntensity, VolumeMinMax,
    VolumePreview, VolumeTexture, VoxelBuffer,
};

fn main() -> volumetric::Result<()> {
    volumetric::init_logging();

    // --- Volume 1: sphere SDF stored as u16 ---
    let dims = UVec3::new(32, 32, 24);
    let mut samples = Vec::with_capacity((dims.x * dims.y * dims.z) as usize);
    for k in 0..dims.z {
        for j in 0..dims.y {
            for i in 0..dims.x {
                let p = Vec3::new(i as f32, j as f32, k as f32) / (dims - UVec3::ONE).as_vec3();
                let dist = (p * 2.0 - Vec3::ONE).length();
                samples.push(((1.0 - dist).max(0.0) * 4000.0) as u16);
            }
        }
    }

    let mut volume = Volume::from_buffer(
        VoxelBuffer::from_vec(samples, dims)?,
        Vec3::new(0.8, 0.8, 1.5),
        Vec3::ZERO,
    )
    .with_origin("sphere.raw")
    .with_rescale(1.0, -1024.0)
    .with_options(Options::new().with_histogram_buckets(32).with_preview_size(24));
    volume.center_at_origin();

    let stats = volume.derived_data::<VolumeMinMax>()?;
    println!(
        "{}: {} voxels, raw range [{}, {}], rescaled [{}, {}]",
        volume.origin(),
        volume.num_voxels(),
        stats.min,
        stats.max,
        stats.min_real,
        stats.max_real
    );

    let histogram = volume.derived_data::<VolumeHistogramIntensity>()?;
    for b in 0..histogram.num_buckets() {
        let bar = "#".repeat((histogram.normalized(b) * 40.0).round() as usize);
        println!("{b:>3} {bar}");
    }

    let preview = volume.derived_data::<VolumePreview>()?;
    let png = preview.to_png()?;
    println!("preview: {0}x{0}, {1} png bytes", preview.size(), png.len());

    // --- Transforms ---
    let corner = volume.transform_point(Space::Texture, Space::World, Vec3::ONE);
    let center = volume.transform_point(Space::Texture, Space::World, Vec3::splat(0.5));
    println!("world corner {corner}, world center {center}");
    volume.set_physical_to_world(Mat4::from_rotation_z(std::f32::consts::FRAC_PI_2));
    println!("rotated llf {}, urb {}", volume.llf(), volume.urb());

    // --- Texture staging ---
    let texture = volume.representation_or_convert::<VolumeTexture>()?;
    println!(
        "texture {:?}, {} bytes, transfer scale {}",
        texture.texel_format(),
        texture.data().len(),
        texture.pixel_transfer().scale
    );

    // --- Volume 2: raw payload shared through the cache ---
    let payload: Vec<u8> = (0..64i16).flat_map(|v| (v - 32).to_be_bytes()).collect();
    let mut cache = ResourceCache::new()
        .with_file_system(MemoryFileSystem::new().with_file("/data/ramp.raw", payload));
    cache.add_search_path("/data");

    let info = RawVolumeInfo::new(ElementFormat::Int16, UVec3::new(4, 4, 4))
        .with_byte_order(ByteOrder::Big);
    let first = volumetric::load_raw(&mut cache, "ramp.raw", &info)?;
    let second = volumetric::load_raw(&mut cache, "ramp.raw", &info)?;
    println!(
        "ramp.raw shared: {}, used by {:?}, range [{}, {}]",
        Rc::ptr_eq(&first, &second),
        cache.used_by("ramp.raw"),
        first.min_value(),
        first.max_value()
    );
    cache.dispose(&second);
    cache.dispose(&first);
    println!("cache empty after dispose: {}", cache.is_empty());

    Ok(())
}
