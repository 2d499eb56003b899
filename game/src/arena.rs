//! Level geometry and props for the sandbox

use glam::Vec3;

/// Half the side length of the floor, in game units
pub const FLOOR_HALF_SIZE: f32 = 1024.0;

/// Height of the perimeter walls
pub const WALL_HEIGHT: f32 = 128.0;

/// Triangle soup for a square floor at z = 0 ringed by four inward-facing walls
pub fn level_mesh() -> (Vec<Vec3>, Vec<[u32; 3]>) {
    let s = FLOOR_HALF_SIZE;
    let h = WALL_HEIGHT;
    let corners = [
        Vec3::new(-s, -s, 0.0),
        Vec3::new(s, -s, 0.0),
        Vec3::new(s, s, 0.0),
        Vec3::new(-s, s, 0.0),
    ];

    let mut vertices: Vec<Vec3> = corners.to_vec();
    vertices.extend(corners.iter().map(|c| *c + Vec3::Z * h));

    let mut indices = vec![[0, 1, 2], [0, 2, 3]];
    for i in 0..4u32 {
        let j = (i + 1) % 4;
        indices.push([i, i + 4, j]);
        indices.push([j, i + 4, j + 4]);
    }
    (vertices, indices)
}

/// Starting positions for the dynamic props, stacked in a loose grid
pub fn prop_positions(count: usize) -> impl Iterator<Item = Vec3> {
    (0..count).map(|i| {
        let column = (i % 4) as f32;
        let row = (i / 4) as f32;
        Vec3::new(column * 40.0 - 60.0, row * 40.0 - 40.0, 48.0 + i as f32 * 24.0)
    })
}
