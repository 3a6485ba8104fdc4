use super::vertex::{INDICES_PER_QUAD, VERTICES_PER_QUAD};

/// Counts produced by the current scene.
///
/// `draw_calls` and `quad_count` accumulate over every flush of the scene.
/// `texture_count` is the slot occupancy of the most recent flush only, not a
/// running maximum.
#[derive(Debug, Copy, Clone, Default, Eq, PartialEq)]
pub struct Statistics {
    pub draw_calls: usize,
    pub quad_count: usize,
    pub texture_count: usize,
}

impl Statistics {
    #[inline]
    pub fn total_vertex_count(&self) -> usize {
        self.quad_count * VERTICES_PER_QUAD
    }

    #[inline]
    pub fn total_index_count(&self) -> usize {
        self.quad_count * INDICES_PER_QUAD
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_counts() {
        let s = Statistics {
            draw_calls: 2,
            quad_count: 5,
            texture_count: 3,
        };
        assert_eq!(s.total_vertex_count(), 20);
        assert_eq!(s.total_index_count(), 30);
    }
}
