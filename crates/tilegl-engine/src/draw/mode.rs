/// Topology of a primitive's vertex sequence.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Hash)]
pub enum DrawingMode {
    #[default]
    Points,
    /// Independent segments, two vertices each.
    Lines,
    /// Independent triangles, three vertices each.
    Triangles,
    /// Connected strip; vertex `n` forms a triangle with the two before it.
    TriangleStrip,
    /// Independent quads, four vertices each.
    ///
    /// Deprecated: retained so existing callers keep their validity behaviour.
    /// Backends draw each quad as two triangles. Prefer `Triangles`.
    Quads,
}

impl DrawingMode {
    /// Whether `count` vertices form a complete set of primitives.
    ///
    /// Strips need at least one triangle; an empty draw is valid everywhere.
    #[inline]
    pub const fn is_valid_count(self, count: usize) -> bool {
        match self {
            DrawingMode::Points => true,
            DrawingMode::Lines => count % 2 == 0,
            DrawingMode::Triangles => count % 3 == 0,
            DrawingMode::TriangleStrip => count == 0 || count >= 3,
            DrawingMode::Quads => count % 4 == 0,
        }
    }

    /// Number of triangles `count` vertices rasterize to, for filled modes.
    #[inline]
    pub const fn triangle_count(self, count: usize) -> usize {
        match self {
            DrawingMode::Points | DrawingMode::Lines => 0,
            DrawingMode::Triangles => count / 3,
            DrawingMode::TriangleStrip => count.saturating_sub(2),
            DrawingMode::Quads => count / 4 * 2,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DrawingMode; 5] = [
        DrawingMode::Points,
        DrawingMode::Lines,
        DrawingMode::Triangles,
        DrawingMode::TriangleStrip,
        DrawingMode::Quads,
    ];

    #[test]
    fn triangles_need_multiples_of_three() {
        assert!(DrawingMode::Triangles.is_valid_count(6));
        assert!(!DrawingMode::Triangles.is_valid_count(5));
    }

    #[test]
    fn lines_need_pairs() {
        assert!(!DrawingMode::Lines.is_valid_count(7));
        assert!(DrawingMode::Lines.is_valid_count(8));
    }

    #[test]
    fn strip_rejects_one_and_two() {
        assert!(DrawingMode::TriangleStrip.is_valid_count(0));
        assert!(!DrawingMode::TriangleStrip.is_valid_count(1));
        assert!(!DrawingMode::TriangleStrip.is_valid_count(2));
        assert!(DrawingMode::TriangleStrip.is_valid_count(3));
        assert!(DrawingMode::TriangleStrip.is_valid_count(7));
    }

    #[test]
    fn predicate_matches_divisibility_rules() {
        for mode in ALL {
            for count in 0..64usize {
                let expected = match mode {
                    DrawingMode::Points => true,
                    DrawingMode::Lines => count % 2 == 0,
                    DrawingMode::Triangles => count % 3 == 0,
                    DrawingMode::TriangleStrip => count == 0 || count >= 3,
                    DrawingMode::Quads => count % 4 == 0,
                };
                assert_eq!(mode.is_valid_count(count), expected, "{mode:?} x {count}");
            }
        }
    }

    #[test]
    fn quads_split_into_two_triangles() {
        assert_eq!(DrawingMode::Quads.triangle_count(8), 4);
        assert_eq!(DrawingMode::TriangleStrip.triangle_count(5), 3);
        assert_eq!(DrawingMode::TriangleStrip.triangle_count(0), 0);
    }
}
