//! Narrow-phase triangle sink.

use glam::DVec3;

/// Receives the triangles a collision shape emits for one query box.
pub trait TriangleCallback {
    /// Called once per triangle. `part_id` and `triangle_index` identify the
    /// triangle within a multi-part shape; shapes that do not track parts pass 0.
    fn process_triangle(&mut self, vertices: &[DVec3; 3], part_id: i32, triangle_index: i32);
}

/// Collects emitted triangles into a list.
#[derive(Clone, Debug, Default)]
pub struct TriangleCollector {
    pub triangles: Vec<[DVec3; 3]>,
}

impl TriangleCollector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Every vertex of every collected triangle.
    pub fn vertices(&self) -> impl Iterator<Item = DVec3> + '_ {
        self.triangles.iter().flatten().copied()
    }
}

impl TriangleCallback for TriangleCollector {
    fn process_triangle(&mut self, vertices: &[DVec3; 3], _part_id: i32, _triangle_index: i32) {
        self.triangles.push(*vertices);
    }
}

impl<F> TriangleCallback for F
where
    F: FnMut(&[DVec3; 3], i32, i32),
{
    fn process_triangle(&mut self, vertices: &[DVec3; 3], part_id: i32, triangle_index: i32) {
        self(vertices, part_id, triangle_index)
    }
}
