//! Coordinate spaces of a volume and the affine maps between them.
//!
//! Four spaces are related:
//! - texture: `[0, 1]^3` over the whole grid,
//! - voxel: `[0, dim]^3` in voxel units,
//! - physical: voxel coordinates scaled by spacing and shifted by offset,
//! - world: physical coordinates under the volume's local-to-world matrix.
//!
//! Every map is computed from the metadata on request; nothing is cached.

use glam::{Mat4, UVec3, Vec3};
use serde::{Deserialize, Serialize};

/// One of the coordinate spaces of a volume.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Space {
    Texture,
    Voxel,
    Physical,
    World,
}

/// The spatial metadata of a volume: enough to derive every transform.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpatialFrame {
    pub dimensions: UVec3,
    pub spacing: Vec3,
    pub offset: Vec3,
    pub physical_to_world: Mat4,
}

impl SpatialFrame {
    /// Creates a frame with an identity physical-to-world transform.
    pub fn new(dimensions: UVec3, spacing: Vec3, offset: Vec3) -> Self {
        Self {
            dimensions,
            spacing,
            offset,
            physical_to_world: Mat4::IDENTITY,
        }
    }

    /// Sets the physical-to-world transform.
    #[must_use]
    pub fn with_physical_to_world(mut self, physical_to_world: Mat4) -> Self {
        self.physical_to_world = physical_to_world;
        self
    }

    // Voxel <-> texture

    pub fn texture_to_voxel(&self) -> Mat4 {
        Mat4::from_scale(self.dimensions.as_vec3())
    }

    pub fn voxel_to_texture(&self) -> Mat4 {
        Mat4::from_scale(Vec3::ONE / self.dimensions.as_vec3())
    }

    // Voxel <-> physical

    pub fn voxel_to_physical(&self) -> Mat4 {
        Mat4::from_translation(self.offset) * Mat4::from_scale(self.spacing)
    }

    pub fn physical_to_voxel(&self) -> Mat4 {
        Mat4::from_scale(Vec3::ONE / self.spacing) * Mat4::from_translation(-self.offset)
    }

    // Physical <-> world

    pub fn physical_to_world(&self) -> Mat4 {
        self.physical_to_world
    }

    pub fn world_to_physical(&self) -> Mat4 {
        self.physical_to_world.inverse()
    }

    // Composites

    pub fn voxel_to_world(&self) -> Mat4 {
        self.physical_to_world * self.voxel_to_physical()
    }

    pub fn world_to_voxel(&self) -> Mat4 {
        self.voxel_to_world().inverse()
    }

    pub fn texture_to_physical(&self) -> Mat4 {
        self.voxel_to_physical() * self.texture_to_voxel()
    }

    pub fn physical_to_texture(&self) -> Mat4 {
        self.voxel_to_texture() * self.physical_to_voxel()
    }

    pub fn texture_to_world(&self) -> Mat4 {
        self.voxel_to_world() * self.texture_to_voxel()
    }

    pub fn world_to_texture(&self) -> Mat4 {
        self.texture_to_world().inverse()
    }

    /// Returns the matrix mapping points of space `from` into space `to`.
    pub fn matrix(&self, from: Space, to: Space) -> Mat4 {
        match (from, to) {
            (Space::Texture, Space::Voxel) => self.texture_to_voxel(),
            (Space::Texture, Space::Physical) => self.texture_to_physical(),
            (Space::Texture, Space::World) => self.texture_to_world(),
            (Space::Voxel, Space::Texture) => self.voxel_to_texture(),
            (Space::Voxel, Space::Physical) => self.voxel_to_physical(),
            (Space::Voxel, Space::World) => self.voxel_to_world(),
            (Space::Physical, Space::Texture) => self.physical_to_texture(),
            (Space::Physical, Space::Voxel) => self.physical_to_voxel(),
            (Space::Physical, Space::World) => self.physical_to_world(),
            (Space::World, Space::Texture) => self.world_to_texture(),
            (Space::World, Space::Voxel) => self.world_to_voxel(),
            (Space::World, Space::Physical) => self.world_to_physical(),
            (Space::Texture, Space::Texture)
            | (Space::Voxel, Space::Voxel)
            | (Space::Physical, Space::Physical)
            | (Space::World, Space::World) => Mat4::IDENTITY,
        }
    }

    /// Maps a point from space `from` into space `to`.
    pub fn transform_point(&self, from: Space, to: Space, point: Vec3) -> Vec3 {
        self.matrix(from, to).transform_point3(point)
    }

    /// Extent of the grid in physical units.
    pub fn cube_size(&self) -> Vec3 {
        self.spacing * self.dimensions.as_vec3()
    }

    /// Lower-left-front corner in physical space.
    pub fn llf(&self) -> Vec3 {
        self.offset
    }

    /// Upper-right-back corner in physical space.
    pub fn urb(&self) -> Vec3 {
        self.offset + self.cube_size()
    }

    /// The eight corners of the grid's bounding box in physical space.
    ///
    /// Corners 0..4 lie on the front face (z = llf.z), 4..8 on the back face.
    pub fn cube_vertices(&self) -> [Vec3; 8] {
        let (l, u) = (self.llf(), self.urb());
        [
            Vec3::new(l.x, l.y, l.z),
            Vec3::new(u.x, l.y, l.z),
            Vec3::new(u.x, u.y, l.z),
            Vec3::new(l.x, u.y, l.z),
            Vec3::new(l.x, l.y, u.z),
            Vec3::new(u.x, l.y, u.z),
            Vec3::new(u.x, u.y, u.z),
            Vec3::new(l.x, u.y, u.z),
        ]
    }
}
