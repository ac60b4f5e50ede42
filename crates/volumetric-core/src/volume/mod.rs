//! The volume: one logical voxel grid with its representations, cached
//! derived data and spatial metadata.

mod transforms;

pub use transforms::{Space, SpatialFrame};

use std::any::{type_name, Any, TypeId};
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use glam::{Mat4, UVec3, Vec3};
use log::Level;

use crate::buffer::VoxelBuffer;
use crate::derived::DerivedData;
use crate::diagnostics::{default_sink, SharedSink};
use crate::element::{ElementFormat, VoxelElement};
use crate::error::{Result, VolumeError};
use crate::options::Options;
use crate::ram::VolumeRam;
use crate::representation::{ConvertibleRepresentation, VolumeRepresentation};
use crate::value_mapping::ValueMapping;

const CATEGORY: &str = "Volume";

/// A voxel grid held in one or more representations.
///
/// Representations are the same grid in different storage forms and all
/// report the volume's dimensions; at most one representation of each
/// concrete type is kept. Derived data (statistics, histograms, previews) is
/// computed lazily and cached per kind until [`Volume::clear_derived_data`]
/// is called. Mutating a representation does not invalidate derived data on
/// its own.
pub struct Volume {
    dimensions: UVec3,
    num_voxels: usize,
    representations: Vec<Box<dyn VolumeRepresentation>>,
    representation_slots: HashMap<TypeId, usize>,
    derived: HashMap<TypeId, Rc<dyn Any>>,

    spacing: Vec3,
    offset: Vec3,
    physical_to_world: Mat4,
    origin: String,
    rescale_intercept: f32,
    rescale_slope: f32,
    window_center: f32,
    window_width: f32,

    options: Options,
    sink: SharedSink,
}

impl Volume {
    /// Creates a volume from its first representation.
    pub fn new<R: VolumeRepresentation>(representation: R, spacing: Vec3, offset: Vec3) -> Self {
        let mut volume = Self {
            dimensions: representation.dimensions(),
            num_voxels: representation.num_voxels(),
            representations: Vec::new(),
            representation_slots: HashMap::new(),
            derived: HashMap::new(),
            spacing,
            offset,
            physical_to_world: Mat4::IDENTITY,
            origin: String::new(),
            rescale_intercept: 0.0,
            rescale_slope: 1.0,
            window_center: 0.0,
            window_width: 0.0,
            options: Options::default(),
            sink: default_sink(),
        };
        volume.add_representation(representation);
        volume
    }

    /// Creates a volume holding `buffer` as its RAM representation.
    pub fn from_buffer<T: VoxelElement>(buffer: VoxelBuffer<T>, spacing: Vec3, offset: Vec3) -> Self {
        Self::new(VolumeRam::from(buffer), spacing, offset)
    }

    /// Sets the physical-to-world transform.
    #[must_use]
    pub fn with_physical_to_world(mut self, matrix: Mat4) -> Self {
        self.physical_to_world = matrix;
        self
    }

    /// Sets the textual provenance (usually the source path).
    #[must_use]
    pub fn with_origin(mut self, origin: impl Into<String>) -> Self {
        self.origin = origin.into();
        self
    }

    /// Sets the rescale mapping `raw * slope + intercept`.
    #[must_use]
    pub fn with_rescale(mut self, slope: f32, intercept: f32) -> Self {
        self.rescale_slope = slope;
        self.rescale_intercept = intercept;
        self
    }

    /// Sets the default display window.
    #[must_use]
    pub fn with_window(mut self, center: f32, width: f32) -> Self {
        self.window_center = center;
        self.window_width = width;
        self
    }

    /// Sets the options used by the built-in derived-data kinds.
    #[must_use]
    pub fn with_options(mut self, options: Options) -> Self {
        self.options = options;
        self
    }

    /// Routes diagnostics to `sink` instead of the log facade.
    #[must_use]
    pub fn with_sink(mut self, sink: SharedSink) -> Self {
        self.sink = sink;
        self
    }

    fn report(&self, level: Level, message: &str) {
        self.sink.report(level, CATEGORY, message);
    }

    // ========================================================================
    // Representations
    // ========================================================================

    /// Adds a representation, replacing any existing one of the same type.
    ///
    /// Typed voxel buffers are stored as [`VolumeRam`], so they are reachable
    /// through [`Volume::ram`] and the built-in derived-data kinds. A volume
    /// without representations adopts the dimensions of the one added.
    ///
    /// # Panics
    ///
    /// Panics if the volume holds representations and the new one's
    /// dimensions differ from the volume's.
    pub fn add_representation<R: VolumeRepresentation>(&mut self, representation: R) {
        match representation.into_volume_ram() {
            Ok(ram) => self.insert_representation(ram),
            Err(other) => self.insert_representation(other),
        }
    }

    fn insert_representation<R: VolumeRepresentation>(&mut self, representation: R) {
        if self.representations.is_empty() {
            self.dimensions = representation.dimensions();
            self.num_voxels = representation.num_voxels();
        }
        assert_eq!(
            representation.dimensions(),
            self.dimensions,
            "representation '{}' does not match volume dimensions",
            representation.kind_name()
        );
        let boxed: Box<dyn VolumeRepresentation> = Box::new(representation);
        match self.representation_slots.get(&TypeId::of::<R>()) {
            Some(&slot) => self.representations[slot] = boxed,
            None => {
                self.representation_slots
                    .insert(TypeId::of::<R>(), self.representations.len());
                self.representations.push(boxed);
            }
        }
    }

    fn slot_of<R: VolumeRepresentation>(&self) -> Result<usize> {
        if let Some(&slot) = self.representation_slots.get(&TypeId::of::<R>()) {
            return Ok(slot);
        }
        let name = type_name::<R>();
        if self.representations.is_empty() {
            self.report(
                Level::Warn,
                &format!("representation '{name}' requested from a volume without representations"),
            );
        } else {
            self.report(Level::Warn, &format!("representation '{name}' not found"));
        }
        Err(VolumeError::RepresentationNotFound(name))
    }

    /// Returns the representation of type `R`.
    pub fn representation<R: VolumeRepresentation>(&self) -> Result<&R> {
        let slot = self.slot_of::<R>()?;
        self.representations[slot]
            .as_any()
            .downcast_ref::<R>()
            .ok_or(VolumeError::RepresentationNotFound(type_name::<R>()))
    }

    /// Mutable variant of [`Volume::representation`].
    ///
    /// Changing voxel content through this handle leaves cached derived data
    /// stale; call [`Volume::clear_derived_data`] afterwards.
    pub fn representation_mut<R: VolumeRepresentation>(&mut self) -> Result<&mut R> {
        let slot = self.slot_of::<R>()?;
        self.representations[slot]
            .as_any_mut()
            .downcast_mut::<R>()
            .ok_or(VolumeError::RepresentationNotFound(type_name::<R>()))
    }

    /// Returns true if a representation of type `R` is held. Never reports.
    pub fn has_representation<R: VolumeRepresentation>(&self) -> bool {
        self.representation_slots.contains_key(&TypeId::of::<R>())
    }

    /// Returns the representation of type `R`, converting it from the held
    /// ones and adding it to the volume if absent.
    pub fn representation_or_convert<R: ConvertibleRepresentation>(&mut self) -> Result<&R> {
        if !self.has_representation::<R>() {
            let converted = R::convert_from(self).map_err(|err| {
                self.report(
                    Level::Error,
                    &format!("conversion to '{}' failed: {err}", type_name::<R>()),
                );
                err
            })?;
            self.add_representation(converted);
        }
        self.representation::<R>()
    }

    /// Removes the representation of type `R`. Returns whether one was held.
    pub fn remove_representation<R: VolumeRepresentation>(&mut self) -> bool {
        let Some(slot) = self.representation_slots.remove(&TypeId::of::<R>()) else {
            return false;
        };
        self.representations.remove(slot);
        for index in self.representation_slots.values_mut() {
            if *index > slot {
                *index -= 1;
            }
        }
        true
    }

    /// Drops every representation. Metadata and dimensions are kept until a
    /// new representation is added.
    pub fn clear_representations(&mut self) {
        self.representations.clear();
        self.representation_slots.clear();
    }

    pub fn num_representations(&self) -> usize {
        self.representations.len()
    }

    /// Kind names of the held representations, in insertion order.
    pub fn representation_kinds(&self) -> Vec<&'static str> {
        self.representations.iter().map(|r| r.kind_name()).collect()
    }

    /// The RAM representation.
    pub fn ram(&self) -> Result<&VolumeRam> {
        self.representation::<VolumeRam>()
    }

    /// Mutable access to the RAM representation.
    pub fn ram_mut(&mut self) -> Result<&mut VolumeRam> {
        self.representation_mut::<VolumeRam>()
    }

    /// The RAM representation viewed as a typed buffer of `T`.
    pub fn buffer<T: VoxelElement>(&self) -> Result<&VoxelBuffer<T>> {
        self.ram()?
            .as_buffer::<T>()
            .ok_or(VolumeError::RepresentationNotFound(type_name::<VoxelBuffer<T>>()))
    }

    /// Mutable variant of [`Volume::buffer`].
    pub fn buffer_mut<T: VoxelElement>(&mut self) -> Result<&mut VoxelBuffer<T>> {
        self.ram_mut()?
            .as_buffer_mut::<T>()
            .ok_or(VolumeError::RepresentationNotFound(type_name::<VoxelBuffer<T>>()))
    }

    // ========================================================================
    // Derived data
    // ========================================================================

    /// Returns the cached value of kind `K`, computing and caching it first
    /// if absent.
    ///
    /// Repeated calls return the same instance until the entry is cleared or
    /// replaced. A failed computation is reported and nothing is cached;
    /// allocation failures are returned as-is, every other failure as
    /// [`VolumeError::DerivedDataUnavailable`].
    pub fn derived_data<K: DerivedData>(&mut self) -> Result<Rc<K>> {
        if let Some(cached) = self.has_derived_data::<K>() {
            return Ok(cached);
        }
        match K::create_from(self) {
            Ok(value) => Ok(self.add_derived_data(value)),
            Err(err) => {
                self.report(
                    Level::Error,
                    &format!("failed to create derived data '{}': {err}", K::NAME),
                );
                match err {
                    VolumeError::AllocationFailed { .. } => Err(err),
                    _ => Err(VolumeError::DerivedDataUnavailable(K::NAME)),
                }
            }
        }
    }

    /// Returns the cached value of kind `K` without computing it.
    pub fn has_derived_data<K: DerivedData>(&self) -> Option<Rc<K>> {
        let entry = self.derived.get(&TypeId::of::<K>())?;
        Rc::clone(entry).downcast::<K>().ok()
    }

    /// Stores `value` as the entry of kind `K`, discarding any previous one.
    pub fn add_derived_data<K: DerivedData>(&mut self, value: K) -> Rc<K> {
        let value = Rc::new(value);
        let entry: Rc<dyn Any> = value.clone();
        self.derived.insert(TypeId::of::<K>(), entry);
        value
    }

    /// Removes the entry of kind `K`, returning it if present.
    pub fn remove_derived_data<K: DerivedData>(&mut self) -> Option<Rc<K>> {
        self.derived
            .remove(&TypeId::of::<K>())
            .and_then(|entry| entry.downcast::<K>().ok())
    }

    /// Drops every cached derived value.
    pub fn clear_derived_data(&mut self) {
        self.derived.clear();
    }

    pub fn num_derived_data(&self) -> usize {
        self.derived.len()
    }

    // ========================================================================
    // Metadata
    // ========================================================================

    pub fn dimensions(&self) -> UVec3 {
        self.dimensions
    }

    pub fn num_voxels(&self) -> usize {
        self.num_voxels
    }

    /// Element format of the RAM representation, if one is held.
    pub fn format(&self) -> Option<ElementFormat> {
        self.ram_if_present().map(VolumeRam::format)
    }

    /// Bytes per voxel of the first representation, or 0 without any.
    pub fn bytes_per_voxel(&self) -> usize {
        self.representations
            .first()
            .map_or(0, |r| r.bytes_per_voxel())
    }

    fn ram_if_present(&self) -> Option<&VolumeRam> {
        let slot = *self.representation_slots.get(&TypeId::of::<VolumeRam>())?;
        self.representations[slot].as_any().downcast_ref()
    }

    pub fn spacing(&self) -> Vec3 {
        self.spacing
    }

    pub fn set_spacing(&mut self, spacing: Vec3) {
        self.spacing = spacing;
    }

    pub fn offset(&self) -> Vec3 {
        self.offset
    }

    pub fn set_offset(&mut self, offset: Vec3) {
        self.offset = offset;
    }

    pub fn physical_to_world(&self) -> Mat4 {
        self.physical_to_world
    }

    pub fn set_physical_to_world(&mut self, matrix: Mat4) {
        self.physical_to_world = matrix;
    }

    pub fn origin(&self) -> &str {
        &self.origin
    }

    pub fn set_origin(&mut self, origin: impl Into<String>) {
        self.origin = origin.into();
    }

    pub fn rescale_intercept(&self) -> f32 {
        self.rescale_intercept
    }

    pub fn set_rescale_intercept(&mut self, value: f32) {
        self.rescale_intercept = value;
    }

    pub fn rescale_slope(&self) -> f32 {
        self.rescale_slope
    }

    pub fn set_rescale_slope(&mut self, value: f32) {
        self.rescale_slope = value;
    }

    /// Mapping from raw sample values to real-world values.
    pub fn rescale_mapping(&self) -> ValueMapping {
        ValueMapping::new(self.rescale_slope, self.rescale_intercept)
    }

    pub fn window_center(&self) -> f32 {
        self.window_center
    }

    pub fn set_window_center(&mut self, value: f32) {
        self.window_center = value;
    }

    pub fn window_width(&self) -> f32 {
        self.window_width
    }

    pub fn set_window_width(&mut self, value: f32) {
        self.window_width = value;
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn set_options(&mut self, options: Options) {
        self.options = options;
    }

    pub fn sink(&self) -> &SharedSink {
        &self.sink
    }

    // ========================================================================
    // Extents and transforms
    // ========================================================================

    /// Snapshot of the spatial metadata.
    pub fn frame(&self) -> SpatialFrame {
        SpatialFrame::new(self.dimensions, self.spacing, self.offset)
            .with_physical_to_world(self.physical_to_world)
    }

    pub fn cube_size(&self) -> Vec3 {
        self.frame().cube_size()
    }

    pub fn llf(&self) -> Vec3 {
        self.frame().llf()
    }

    pub fn urb(&self) -> Vec3 {
        self.frame().urb()
    }

    pub fn cube_vertices(&self) -> [Vec3; 8] {
        self.frame().cube_vertices()
    }

    /// Places the volume's physical extent centered on the world origin.
    pub fn center_at_origin(&mut self) {
        self.physical_to_world = Mat4::from_translation(-0.5 * self.cube_size());
    }

    pub fn voxel_to_world(&self) -> Mat4 {
        self.frame().voxel_to_world()
    }

    pub fn world_to_voxel(&self) -> Mat4 {
        self.frame().world_to_voxel()
    }

    pub fn texture_to_world(&self) -> Mat4 {
        self.frame().texture_to_world()
    }

    pub fn world_to_texture(&self) -> Mat4 {
        self.frame().world_to_texture()
    }

    pub fn voxel_to_physical(&self) -> Mat4 {
        self.frame().voxel_to_physical()
    }

    pub fn physical_to_voxel(&self) -> Mat4 {
        self.frame().physical_to_voxel()
    }

    pub fn texture_to_voxel(&self) -> Mat4 {
        self.frame().texture_to_voxel()
    }

    pub fn voxel_to_texture(&self) -> Mat4 {
        self.frame().voxel_to_texture()
    }

    pub fn texture_to_physical(&self) -> Mat4 {
        self.frame().texture_to_physical()
    }

    pub fn physical_to_texture(&self) -> Mat4 {
        self.frame().physical_to_texture()
    }

    pub fn world_to_physical(&self) -> Mat4 {
        self.frame().world_to_physical()
    }

    /// Maps a point between two of the volume's coordinate spaces.
    pub fn transform_point(&self, from: Space, to: Space, point: Vec3) -> Vec3 {
        self.frame().transform_point(from, to, point)
    }
}

impl fmt::Debug for Volume {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Volume")
            .field("dimensions", &self.dimensions)
            .field("representations", &self.representation_kinds())
            .field("derived", &self.derived.len())
            .field("spacing", &self.spacing)
            .field("offset", &self.offset)
            .field("origin", &self.origin)
            .finish_non_exhaustive()
    }
}
