//! Game-unit <-> simulation-unit conversion
//!
//! The game measures distance in inches and rotation in Euler degrees
//! (pitch, yaw, roll). The rigid-body engine works in meters and unit
//! quaternions. Every value that crosses between the two goes through one
//! of the functions here, exactly once in each direction.
//!
//! Axis convention: Z-up. Roll turns about X, pitch about Y, yaw about Z,
//! composed roll first, then pitch, then yaw (`q = yaw * pitch * roll`).
//!
//! Quaternions double-cover rotations: `q` and `-q` are the same rotation,
//! so `euler_to_quat(quat_to_euler(q))` may come back as `-q`. Compare
//! rotations by the basis vectors they produce, never by raw components.

use glam::{Quat, Vec3};
use rapier3d::na::{Quaternion, Translation3, UnitQuaternion};
use rapier3d::prelude::{Isometry, Point, Real, Vector};

/// Simulation units (meters) per game unit (inch)
pub const METERS_PER_UNIT: f32 = 0.0254;

/// Game units per simulation unit
pub const UNITS_PER_METER: f32 = 1.0 / METERS_PER_UNIT;

/// Scale a game-unit length into simulation units
#[inline]
pub fn to_sim(x: f32) -> f32 {
    x * METERS_PER_UNIT
}

/// Scale a simulation-unit length back into game units
#[inline]
pub fn from_sim(x: f32) -> f32 {
    x / METERS_PER_UNIT
}

/// Convert a game-unit vector (position, velocity, extent) to simulation units
#[inline]
pub fn vec_to_sim(v: Vec3) -> Vector<Real> {
    Vector::new(to_sim(v.x), to_sim(v.y), to_sim(v.z))
}

/// Convert a simulation-unit vector back to game units
#[inline]
pub fn vec_from_sim(v: &Vector<Real>) -> Vec3 {
    Vec3::new(from_sim(v.x), from_sim(v.y), from_sim(v.z))
}

#[inline]
pub fn point_to_sim(p: Vec3) -> Point<Real> {
    Point::from(vec_to_sim(p))
}

#[inline]
pub fn point_from_sim(p: &Point<Real>) -> Vec3 {
    vec_from_sim(&p.coords)
}

/// Carry a unitless direction (e.g. a surface normal) across without scaling
#[inline]
pub fn direction_to_sim(v: Vec3) -> Vector<Real> {
    Vector::new(v.x, v.y, v.z)
}

#[inline]
pub fn direction_from_sim(v: &Vector<Real>) -> Vec3 {
    Vec3::new(v.x, v.y, v.z)
}

/// Euler angles in degrees, packed as `(pitch, yaw, roll)`, to a unit quaternion.
pub fn euler_to_quat(angles: Vec3) -> Quat {
    let (sp, cp) = (angles.x.to_radians() * 0.5).sin_cos();
    let (sy, cy) = (angles.y.to_radians() * 0.5).sin_cos();
    let (sr, cr) = (angles.z.to_radians() * 0.5).sin_cos();

    Quat::from_xyzw(
        sr * cp * cy - cr * sp * sy,
        cr * sp * cy + sr * cp * sy,
        cr * cp * sy - sr * sp * cy,
        cr * cp * cy + sr * sp * sy,
    )
    .normalize()
}

/// Inverse of [`euler_to_quat`]. Pitch is clamped to [-90, 90] degrees.
pub fn quat_to_euler(q: Quat) -> Vec3 {
    let q = q.normalize();

    let sinr_cosp = 2.0 * (q.w * q.x + q.y * q.z);
    let cosr_cosp = 1.0 - 2.0 * (q.x * q.x + q.y * q.y);
    let roll = sinr_cosp.atan2(cosr_cosp);

    let sinp = (2.0 * (q.w * q.y - q.z * q.x)).clamp(-1.0, 1.0);
    let pitch = sinp.asin();

    let siny_cosp = 2.0 * (q.w * q.z + q.x * q.y);
    let cosy_cosp = 1.0 - 2.0 * (q.y * q.y + q.z * q.z);
    let yaw = siny_cosp.atan2(cosy_cosp);

    Vec3::new(pitch.to_degrees(), yaw.to_degrees(), roll.to_degrees())
}

/// Rebuild a glam quaternion as the engine's unit quaternion
#[inline]
pub fn quat_to_sim(q: Quat) -> UnitQuaternion<Real> {
    UnitQuaternion::new_normalize(Quaternion::new(q.w, q.x, q.y, q.z))
}

#[inline]
pub fn quat_from_sim(q: &UnitQuaternion<Real>) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

/// Euler degrees straight to the engine's rotation type
#[inline]
pub fn angles_to_sim(angles: Vec3) -> UnitQuaternion<Real> {
    quat_to_sim(euler_to_quat(angles))
}

#[inline]
pub fn angles_from_sim(q: &UnitQuaternion<Real>) -> Vec3 {
    quat_to_euler(quat_from_sim(q))
}

/// Game-space position and Euler angles to an engine pose
pub fn pose_to_sim(origin: Vec3, angles: Vec3) -> Isometry<Real> {
    Isometry::from_parts(Translation3::from(vec_to_sim(origin)), angles_to_sim(angles))
}

/// Engine pose back to game-space position and Euler angles
pub fn pose_from_sim(pose: &Isometry<Real>) -> (Vec3, Vec3) {
    (
        vec_from_sim(&pose.translation.vector),
        angles_from_sim(&pose.rotation),
    )
}
