//! Round-trip properties of the game/simulation unit conversions

use engine_physics::physics::units::{
    angles_from_sim, angles_to_sim, euler_to_quat, from_sim, point_from_sim, point_to_sim,
    pose_from_sim, pose_to_sim, quat_to_euler, to_sim, METERS_PER_UNIT,
};
use glam::{Quat, Vec3};
use proptest::prelude::*;

fn close(a: f32, b: f32) -> bool {
    (a - b).abs() <= 1e-5 * a.abs().max(b.abs()).max(1.0)
}

/// Rotations are equal when they move the basis vectors to the same place
fn same_rotation(a: Quat, b: Quat, tolerance: f32) -> bool {
    [Vec3::X, Vec3::Y, Vec3::Z]
        .into_iter()
        .all(|axis| (a * axis - b * axis).length() <= tolerance)
}

fn coordinate() -> impl Strategy<Value = f32> {
    -1.0e6f32..1.0e6f32
}

fn angle() -> impl Strategy<Value = f32> {
    -180.0f32..180.0f32
}

proptest! {
    #[test]
    fn scalar_round_trip(x in coordinate()) {
        prop_assert!(close(from_sim(to_sim(x)), x));
    }

    #[test]
    fn position_round_trip(x in coordinate(), y in coordinate(), z in coordinate()) {
        let p = Vec3::new(x, y, z);
        let back = point_from_sim(&point_to_sim(p));
        prop_assert!(close(back.x, p.x) && close(back.y, p.y) && close(back.z, p.z));
    }

    #[test]
    fn euler_round_trip_is_same_rotation(pitch in angle(), yaw in angle(), roll in angle()) {
        let angles = Vec3::new(pitch, yaw, roll);
        let q = euler_to_quat(angles);
        let back = euler_to_quat(quat_to_euler(q));
        prop_assert!(same_rotation(q, back, 1e-2), "{angles:?} -> {:?}", quat_to_euler(q));
    }

    #[test]
    fn quat_round_trip_up_to_sign(pitch in -89.0f32..89.0, yaw in angle(), roll in angle()) {
        let q = euler_to_quat(Vec3::new(pitch, yaw, roll));
        let back = euler_to_quat(quat_to_euler(q));
        // q and -q are the same rotation
        prop_assert!(q.dot(back).abs() > 1.0 - 1e-4);
    }

    #[test]
    fn engine_rotation_round_trip(pitch in angle(), yaw in angle(), roll in angle()) {
        let angles = Vec3::new(pitch, yaw, roll);
        let back = angles_from_sim(&angles_to_sim(angles));
        prop_assert!(same_rotation(euler_to_quat(angles), euler_to_quat(back), 1e-2));
    }
}

#[test]
fn test_scale_constant() {
    assert!((to_sim(1.0) - METERS_PER_UNIT).abs() < 1e-9);
    assert!((from_sim(1.0) - 39.370_08).abs() < 1e-3);
}

#[test]
fn test_angle_axes() {
    // Yaw turns +X toward +Y about the up axis
    let yaw = euler_to_quat(Vec3::new(0.0, 90.0, 0.0));
    assert!((yaw * Vec3::X - Vec3::Y).length() < 1e-5);

    // Pitch rotates about +Y, roll about +X
    let pitch = euler_to_quat(Vec3::new(90.0, 0.0, 0.0));
    assert!((pitch * Vec3::X - Vec3::NEG_Z).length() < 1e-5);
    let roll = euler_to_quat(Vec3::new(0.0, 0.0, 90.0));
    assert!((roll * Vec3::Y - Vec3::Z).length() < 1e-5);
}

#[test]
fn test_pose_round_trip() {
    let origin = Vec3::new(128.0, -64.0, 32.0);
    let angles = Vec3::new(10.0, 20.0, 30.0);
    let (back_origin, back_angles) = pose_from_sim(&pose_to_sim(origin, angles));

    assert!((back_origin - origin).length() < 1e-3);
    assert!((back_angles - angles).length() < 1e-3);
}
