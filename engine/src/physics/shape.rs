//! Collision shapes
//!
//! A [`Shape`] is a reference-counted engine shape plus a description of it
//! in game units. The system hands one out per `create_*_shape` call; bodies
//! keep their own reference for as long as they live. Destroying a shape
//! while a body still holds it is a programming error.

use crate::physics::error::{PhysicsError, PhysicsResult};
use crate::physics::units::{point_to_sim, to_sim, vec_to_sim};
use glam::Vec3;
use rapier3d::parry::bounding_volume::Aabb;
use rapier3d::prelude::{Isometry, Real, SharedShape};
use std::sync::Arc;

/// What a [`Shape`] was built from, in game units
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ShapeKind {
    Box { half_extent: Vec3 },
    Sphere { radius: f32 },
    TriangleMesh { triangles: usize },
}

#[derive(Clone)]
pub struct Shape {
    inner: SharedShape,
    kind: ShapeKind,
}

impl Shape {
    pub(crate) fn cuboid(half_extent: Vec3) -> Self {
        debug_assert!(
            half_extent.is_finite() && half_extent.min_element() >= 0.0,
            "box half extent must be finite and non-negative: {half_extent:?}"
        );
        let h = vec_to_sim(half_extent.abs());
        Self {
            inner: SharedShape::cuboid(h.x, h.y, h.z),
            kind: ShapeKind::Box { half_extent },
        }
    }

    pub(crate) fn ball(radius: f32) -> Self {
        debug_assert!(
            radius.is_finite() && radius >= 0.0,
            "sphere radius must be finite and non-negative: {radius}"
        );
        Self {
            inner: SharedShape::ball(to_sim(radius.abs())),
            kind: ShapeKind::Sphere { radius },
        }
    }

    /// Static triangle mesh from a game-unit triangle soup
    pub(crate) fn triangle_mesh(vertices: &[Vec3], indices: &[[u32; 3]]) -> PhysicsResult<Self> {
        if vertices.len() < 3 || indices.is_empty() {
            return Err(PhysicsError::InvalidMesh(format!(
                "need at least one triangle, got {} vertices and {} triangles",
                vertices.len(),
                indices.len()
            )));
        }
        if let Some(bad) = vertices.iter().find(|v| !v.is_finite()) {
            return Err(PhysicsError::InvalidMesh(format!(
                "non-finite vertex {bad:?}"
            )));
        }
        if let Some(tri) = indices
            .iter()
            .find(|tri| tri.iter().any(|&i| i as usize >= vertices.len()))
        {
            return Err(PhysicsError::InvalidMesh(format!(
                "triangle {tri:?} indexes past {} vertices",
                vertices.len()
            )));
        }

        let points = vertices.iter().map(|v| point_to_sim(*v)).collect();
        let inner = SharedShape::trimesh(points, indices.to_vec())
            .map_err(|e| PhysicsError::InvalidMesh(format!("{e:?}")))?;

        Ok(Self {
            inner,
            kind: ShapeKind::TriangleMesh {
                triangles: indices.len(),
            },
        })
    }

    pub fn kind(&self) -> ShapeKind {
        self.kind
    }

    /// Engine-side shape, in simulation units
    pub fn shared(&self) -> &SharedShape {
        &self.inner
    }

    pub(crate) fn compute_aabb(&self, pose: &Isometry<Real>) -> Aabb {
        self.inner.compute_aabb(pose)
    }

    /// Handles to this shape held anywhere, this one included
    pub fn reference_count(&self) -> usize {
        Arc::strong_count(&self.inner.0)
    }
}

impl std::fmt::Debug for Shape {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Shape")
            .field("kind", &self.kind)
            .field("refs", &self.reference_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_is_built_in_sim_units() {
        let shape = Shape::cuboid(Vec3::new(16.0, 16.0, 36.0));
        let cuboid = shape.shared().as_cuboid().unwrap();
        assert!((cuboid.half_extents.x - 0.4064).abs() < 1e-5);
        assert!((cuboid.half_extents.z - 0.9144).abs() < 1e-5);
        assert_eq!(
            shape.kind(),
            ShapeKind::Box {
                half_extent: Vec3::new(16.0, 16.0, 36.0)
            }
        );
    }

    #[test]
    fn test_sphere_radius() {
        let shape = Shape::ball(10.0);
        let ball = shape.shared().as_ball().unwrap();
        assert!((ball.radius - 0.254).abs() < 1e-6);
    }

    #[test]
    fn test_mesh_rejects_bad_index() {
        let verts = [Vec3::ZERO, Vec3::X, Vec3::Y];
        let err = Shape::triangle_mesh(&verts, &[[0, 1, 3]]).unwrap_err();
        assert!(matches!(err, PhysicsError::InvalidMesh(_)));
    }

    #[test]
    fn test_mesh_rejects_empty() {
        assert!(Shape::triangle_mesh(&[], &[]).is_err());
    }

    #[test]
    fn test_mesh_builds() {
        let verts = [Vec3::ZERO, Vec3::new(100.0, 0.0, 0.0), Vec3::new(0.0, 100.0, 0.0)];
        let shape = Shape::triangle_mesh(&verts, &[[0, 1, 2]]).unwrap();
        assert_eq!(shape.kind(), ShapeKind::TriangleMesh { triangles: 1 });
        assert!(shape.shared().as_trimesh().is_some());
    }

    #[test]
    fn test_reference_count_tracks_clones() {
        let shape = Shape::ball(1.0);
        assert_eq!(shape.reference_count(), 1);
        let held = shape.clone();
        assert_eq!(shape.reference_count(), 2);
        drop(held);
        assert_eq!(shape.reference_count(), 1);
    }
}
