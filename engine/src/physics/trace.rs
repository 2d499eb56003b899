//! Swept collision queries with legacy trace semantics
//!
//! A query sweeps either a ray or an axis-aligned box from `start` along
//! `direction` and reports how far it got before touching a shape. The
//! result follows the old trace contract: `fraction` in [0, 1], the impact
//! plane, a contents marker and the `start_solid`/`all_solid` flags.
//!
//! Half extents below [`MIN_CONVEX_RADIUS`] take the ray path; anything
//! larger is swept as a box. Queries never fail: bad input is logged once
//! and reported as a miss.

use crate::physics::diagnostics::LogOnce;
use crate::physics::shape::Shape;
use crate::physics::units::{
    direction_from_sim, point_to_sim, pose_to_sim, vec_to_sim,
};
use glam::Vec3;
use rapier3d::parry::query::{self, PointQuery, Ray, RayCast, ShapeCastOptions};
use rapier3d::parry::shape::{Cuboid, Shape as EngineShape};
use rapier3d::prelude::{Isometry, Real, Vector};
use tracing::warn;

/// Contents marker for solid geometry
pub const CONTENTS_SOLID: u32 = 0x1;

/// Smallest convex radius the engine rounds boxes with, in simulation units.
/// Half extents below this on every axis are traced as rays.
pub const MIN_CONVEX_RADIUS: Real = 0.05;

/// Game units a swept box stops short of the surface it hits
pub const CHARACTER_PADDING: f32 = 0.03125;

/// Initial overlap, in simulation units, before a box counts as stuck
pub const MIN_REQUIRED_PENETRATION: Real = 0.001;

/// Sweeps shorter than this (game units) are treated as overlap tests
const MIN_SWEEP_LENGTH: f32 = 1.0e-6;

static BAD_INPUT: LogOnce = LogOnce::new();
static UNSUPPORTED: LogOnce = LogOnce::new();

/// A ray or box sweep in game units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayCastQuery {
    pub start: Vec3,
    /// Sweep vector; its length is the sweep distance
    pub direction: Vec3,
    pub half_extent: Vec3,
}

impl RayCastQuery {
    pub fn ray(start: Vec3, direction: Vec3) -> Self {
        Self {
            start,
            direction,
            half_extent: Vec3::ZERO,
        }
    }

    pub fn swept_box(start: Vec3, direction: Vec3, half_extent: Vec3) -> Self {
        Self {
            start,
            direction,
            half_extent,
        }
    }

    /// Whether this query takes the ray path
    pub fn is_ray(&self) -> bool {
        vec_to_sim(self.half_extent.abs()).max() < MIN_CONVEX_RADIUS
    }

    pub fn end(&self) -> Vec3 {
        self.start + self.direction
    }

    fn is_finite(&self) -> bool {
        self.start.is_finite() && self.direction.is_finite() && self.half_extent.is_finite()
    }
}

/// Impact plane in game units
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Plane {
    pub normal: Vec3,
    pub dist: f32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TraceResult {
    /// 1.0 when nothing was hit
    pub fraction: f32,
    pub endpos: Vec3,
    pub plane: Plane,
    pub contents: u32,
    /// The query began inside solid geometry
    pub start_solid: bool,
    /// The query never left solid geometry
    pub all_solid: bool,
}

impl TraceResult {
    pub fn miss(query: &RayCastQuery) -> Self {
        Self {
            fraction: 1.0,
            endpos: query.end(),
            plane: Plane::default(),
            contents: CONTENTS_SOLID,
            start_solid: false,
            all_solid: false,
        }
    }

    fn hit(query: &RayCastQuery, fraction: f32, normal: Vec3) -> Self {
        let endpos = query.start + query.direction * fraction;
        Self {
            fraction,
            endpos,
            plane: Plane {
                normal,
                dist: endpos.dot(normal),
            },
            contents: CONTENTS_SOLID,
            start_solid: false,
            all_solid: false,
        }
    }

    fn stuck(query: &RayCastQuery, normal: Vec3) -> Self {
        Self {
            start_solid: true,
            all_solid: true,
            ..Self::hit(query, 0.0, normal)
        }
    }

    pub fn is_hit(&self) -> bool {
        self.fraction < 1.0
    }
}

/// Trace `query` against `shape` placed at `origin` with Euler `angles` (degrees).
pub fn collision_query(
    query: &RayCastQuery,
    shape: &Shape,
    origin: Vec3,
    angles: Vec3,
) -> TraceResult {
    if !origin.is_finite() || !angles.is_finite() {
        if BAD_INPUT.first() {
            warn!(?origin, ?angles, "Non-finite shape pose in trace; reporting a miss");
        }
        return TraceResult::miss(query);
    }
    trace_shape(query, &*shape.shared().0, &pose_to_sim(origin, angles))
}

/// Trace against an engine shape at a simulation-space pose
pub(crate) fn trace_shape(
    query: &RayCastQuery,
    shape: &dyn EngineShape,
    pose: &Isometry<Real>,
) -> TraceResult {
    if !query.is_finite() {
        if BAD_INPUT.first() {
            warn!(?query, "Non-finite trace query; reporting a miss");
        }
        return TraceResult::miss(query);
    }

    if query.is_ray() {
        trace_ray(query, shape, pose)
    } else {
        trace_box(query, shape, pose)
    }
}

/// Fallback normal facing back along the sweep
fn facing_normal(query: &RayCastQuery) -> Vec3 {
    (-query.direction).try_normalize().unwrap_or(Vec3::Z)
}

fn trace_ray(query: &RayCastQuery, shape: &dyn EngineShape, pose: &Isometry<Real>) -> TraceResult {
    let origin = point_to_sim(query.start);
    let sweep = vec_to_sim(query.direction);
    let length = sweep.norm();

    if query.direction.length() < MIN_SWEEP_LENGTH {
        let local = pose.inverse_transform_point(&origin);
        return if shape.contains_local_point(&local) {
            TraceResult::stuck(query, facing_normal(query))
        } else {
            TraceResult::miss(query)
        };
    }

    let ray = Ray::new(origin, sweep / length);
    let local_ray = ray.inverse_transform_by(pose);

    let Some(hit) = shape.cast_local_ray_and_get_normal(&local_ray, length, true) else {
        return TraceResult::miss(query);
    };

    let fraction = (hit.time_of_impact / length).clamp(0.0, 1.0);
    let normal = direction_from_sim(&(pose.rotation * hit.normal))
        .try_normalize()
        .unwrap_or_else(|| facing_normal(query));

    if fraction == 0.0 {
        TraceResult::stuck(query, normal)
    } else {
        TraceResult::hit(query, fraction, normal)
    }
}

fn trace_box(query: &RayCastQuery, shape: &dyn EngineShape, pose: &Isometry<Real>) -> TraceResult {
    let query_shape = Cuboid::new(vec_to_sim(query.half_extent.abs()));
    let start = vec_to_sim(query.start);
    let query_pose = Isometry::translation(start.x, start.y, start.z);
    let length = query.direction.length();

    let (depth, contact_normal) =
        penetration(&query_pose, &query_shape, pose, shape).unwrap_or((0.0, None));
    if depth > MIN_REQUIRED_PENETRATION {
        return TraceResult::stuck(query, contact_normal.unwrap_or_else(|| facing_normal(query)));
    }
    if length < MIN_SWEEP_LENGTH {
        return TraceResult::miss(query);
    }

    // Initial overlaps the sweep is leaving are skipped, so a box resting in
    // one triangle of a mesh still sees the rest of it.
    let options = ShapeCastOptions {
        max_time_of_impact: 1.0,
        target_distance: 0.0,
        stop_at_penetration: false,
        compute_impact_geometry_on_penetration: true,
    };
    let cast = query::cast_shapes(
        &query_pose,
        &vec_to_sim(query.direction),
        &query_shape,
        pose,
        &Vector::zeros(),
        shape,
        options,
    );

    let hit = match cast {
        Ok(Some(hit)) => hit,
        Ok(None) => return TraceResult::miss(query),
        Err(_) => {
            if UNSUPPORTED.first() {
                warn!("Shape pair not supported by box sweep; reporting a miss");
            }
            return TraceResult::miss(query);
        }
    };

    let normal = direction_from_sim(&(pose.rotation * hit.normal2))
        .try_normalize()
        .unwrap_or_else(|| facing_normal(query));

    if hit.time_of_impact <= 0.0 {
        // Grazing start: let the box slide off the surface it is resting on.
        if query.direction.dot(normal) >= 0.0 {
            return TraceResult::miss(query);
        }
        return TraceResult::hit(query, 0.0, normal);
    }

    let fraction = (hit.time_of_impact - CHARACTER_PADDING / length).clamp(0.0, 1.0);
    TraceResult::hit(query, fraction, normal)
}

/// Overlap depth (simulation units) between the query box and the target,
/// with the target's outward normal in game space when known.
fn penetration(
    query_pose: &Isometry<Real>,
    query_shape: &Cuboid,
    pose: &Isometry<Real>,
    shape: &dyn EngineShape,
) -> Option<(Real, Option<Vec3>)> {
    match query::contact(query_pose, query_shape, pose, shape, 0.0) {
        Ok(Some(contact)) => {
            let normal = direction_from_sim(&contact.normal2).try_normalize();
            Some(((-contact.dist).max(0.0), normal))
        }
        Ok(None) => None,
        Err(_) => {
            if UNSUPPORTED.first() {
                warn!("Shape pair not supported by overlap test; treating as clear");
            }
            None
        }
    }
}

/// Half extent, in game units, at which queries switch from ray to box
pub fn ray_path_threshold() -> f32 {
    crate::physics::units::from_sim(MIN_CONVEX_RADIUS)
}
