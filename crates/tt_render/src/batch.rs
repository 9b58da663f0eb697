//! CPU-side quad mesh. Rebuilt every frame from world state, then streamed to
//! the GPU by `QuadRenderer`. Coordinates are world pixels, y down.

use crate::vertex::QuadVertex;

pub type Color = [f32; 4];

#[derive(Debug, Default, Clone)]
pub struct QuadBatch {
    vertices: Vec<QuadVertex>,
    indices: Vec<u32>,
}

impl QuadBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Axis-aligned rectangle with its top-left corner at `(x, y)`.
    pub fn push_rect(&mut self, x: f32, y: f32, w: f32, h: f32, color: Color) {
        if w <= 0.0 || h <= 0.0 {
            return;
        }
        let base = self.vertices.len() as u32;
        let corners = [[x, y], [x + w, y], [x + w, y + h], [x, y + h]];
        self.vertices.extend(corners.iter().map(|&position| QuadVertex { position, color }));
        self.indices
            .extend_from_slice(&[base, base + 1, base + 2, base, base + 2, base + 3]);
    }

    /// Rectangle outline made of four thin quads.
    pub fn push_outline(&mut self, x: f32, y: f32, w: f32, h: f32, thickness: f32, color: Color) {
        let t = thickness.min(w * 0.5).min(h * 0.5);
        self.push_rect(x, y, w, t, color);
        self.push_rect(x, y + h - t, w, t, color);
        self.push_rect(x, y + t, t, h - 2.0 * t, color);
        self.push_rect(x + w - t, y + t, t, h - 2.0 * t, color);
    }

    pub fn vertices(&self) -> &[QuadVertex] {
        &self.vertices
    }

    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    pub fn quad_count(&self) -> usize {
        self.indices.len() / 6
    }

    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const WHITE: Color = [1.0, 1.0, 1.0, 1.0];

    #[test]
    fn rect_emits_four_vertices_and_two_triangles() {
        let mut batch = QuadBatch::new();
        batch.push_rect(16.0, 32.0, 16.0, 8.0, WHITE);
        assert_eq!(batch.vertices().len(), 4);
        assert_eq!(batch.indices(), &[0, 1, 2, 0, 2, 3]);
        assert_eq!(batch.vertices()[2].position, [32.0, 40.0]);
    }

    #[test]
    fn second_rect_indices_are_offset() {
        let mut batch = QuadBatch::new();
        batch.push_rect(0.0, 0.0, 1.0, 1.0, WHITE);
        batch.push_rect(5.0, 5.0, 1.0, 1.0, WHITE);
        assert_eq!(&batch.indices()[6..], &[4, 5, 6, 4, 6, 7]);
        assert_eq!(batch.quad_count(), 2);
    }

    #[test]
    fn degenerate_rect_is_skipped() {
        let mut batch = QuadBatch::new();
        batch.push_rect(0.0, 0.0, 0.0, 10.0, WHITE);
        assert!(batch.is_empty());
    }

    #[test]
    fn outline_is_four_quads() {
        let mut batch = QuadBatch::new();
        batch.push_outline(0.0, 0.0, 16.0, 16.0, 1.0, WHITE);
        assert_eq!(batch.quad_count(), 4);
    }
}
