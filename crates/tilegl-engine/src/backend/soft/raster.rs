//! Scan conversion for the software backend.
//!
//! Rasterizers emit one [`Fragment`] per covered pixel; shading, tests and
//! blending happen in the caller. Coverage samples pixel centres and resolves
//! shared triangle edges with the top-left rule, so adjacent triangles never
//! touch a pixel twice.

/// Vertex after projection: window coordinates in pixels (origin top-left),
/// window depth in `[0, 1]`.
#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct ScreenVertex {
    pub x: f32,
    pub y: f32,
    pub depth: f32,
    pub colour: [f32; 4],
    pub uv: [f32; 2],
}

#[derive(Debug, Copy, Clone, PartialEq)]
pub(crate) struct Fragment {
    pub x: u32,
    pub y: u32,
    pub depth: f32,
    pub colour: [f32; 4],
    pub uv: [f32; 2],
}

pub(crate) fn point(v: &ScreenVertex, width: u32, height: u32, emit: &mut impl FnMut(Fragment)) {
    let (x, y) = (v.x.floor(), v.y.floor());
    if x < 0.0 || y < 0.0 || x >= width as f32 || y >= height as f32 {
        return;
    }
    emit(Fragment { x: x as u32, y: y as u32, depth: v.depth, colour: v.colour, uv: v.uv });
}

/// DDA line; the end pixel is left for the next segment.
///
/// Only the steps inside the target are walked, so work is bounded by the
/// target size rather than the segment length.
pub(crate) fn line(
    a: &ScreenVertex,
    b: &ScreenVertex,
    width: u32,
    height: u32,
    emit: &mut impl FnMut(Fragment),
) {
    if !(a.x.is_finite() && a.y.is_finite() && b.x.is_finite() && b.y.is_finite()) {
        return;
    }
    // f64 keeps per-step positions exact for segments far longer than the target.
    let (ax, ay) = (f64::from(a.x), f64::from(a.y));
    let (dx, dy) = (f64::from(b.x) - ax, f64::from(b.y) - ay);
    let steps = dx.abs().max(dy.abs()).round();
    if steps < 1.0 {
        return;
    }
    let Some((t0, t1)) = clip_segment(ax, ay, dx, dy, f64::from(width), f64::from(height)) else {
        return;
    };

    // One step of slack on each side; `point` drops anything outside.
    let first = (t0 * steps).floor().max(0.0) as u64;
    let last = ((t1 * steps).ceil() + 1.0).min(steps) as u64;
    for i in first..last {
        let t = i as f64 / steps;
        let tf = t as f32;
        let v = ScreenVertex {
            x: (ax + dx * t) as f32,
            y: (ay + dy * t) as f32,
            depth: lerp(a.depth, b.depth, tf),
            colour: std::array::from_fn(|c| lerp(a.colour[c], b.colour[c], tf)),
            uv: std::array::from_fn(|c| lerp(a.uv[c], b.uv[c], tf)),
        };
        point(&v, width, height, emit);
    }
}

/// Liang-Barsky: the parameter interval of `origin + t * delta`, `t` in
/// `[0, 1]`, that lies inside `[0, width] x [0, height]`.
fn clip_segment(x: f64, y: f64, dx: f64, dy: f64, width: f64, height: f64) -> Option<(f64, f64)> {
    let (mut t0, mut t1) = (0.0f64, 1.0f64);
    for (p, q) in [(-dx, x), (dx, width - x), (-dy, y), (dy, height - y)] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }
    Some((t0, t1))
}

pub(crate) fn triangle(
    v0: &ScreenVertex,
    v1: &ScreenVertex,
    v2: &ScreenVertex,
    width: u32,
    height: u32,
    emit: &mut impl FnMut(Fragment),
) {
    let mut area = edge(v0, v1, v2.x, v2.y);
    if area == 0.0 || !area.is_finite() {
        return;
    }
    // Normalize winding so the interior is on the positive side of every edge.
    let (v1, v2) = if area < 0.0 {
        area = -area;
        (v2, v1)
    } else {
        (v1, v2)
    };

    let min_x = v0.x.min(v1.x).min(v2.x).floor().max(0.0) as u32;
    let min_y = v0.y.min(v1.y).min(v2.y).floor().max(0.0) as u32;
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil().max(0.0) as u32).min(width);
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil().max(0.0) as u32).min(height);

    let bias = [top_left(v1, v2), top_left(v2, v0), top_left(v0, v1)];

    for y in min_y..max_y {
        let py = y as f32 + 0.5;
        for x in min_x..max_x {
            let px = x as f32 + 0.5;
            let e = [edge(v1, v2, px, py), edge(v2, v0, px, py), edge(v0, v1, px, py)];
            let inside = e.iter().zip(bias).all(|(&e, tl)| e > 0.0 || (e == 0.0 && tl));
            if !inside {
                continue;
            }

            let w = e.map(|e| e / area);
            emit(Fragment {
                x,
                y,
                depth: w[0] * v0.depth + w[1] * v1.depth + w[2] * v2.depth,
                colour: std::array::from_fn(|c| {
                    w[0] * v0.colour[c] + w[1] * v1.colour[c] + w[2] * v2.colour[c]
                }),
                uv: std::array::from_fn(|c| w[0] * v0.uv[c] + w[1] * v1.uv[c] + w[2] * v2.uv[c]),
            });
        }
    }
}

#[inline]
fn edge(a: &ScreenVertex, b: &ScreenVertex, px: f32, py: f32) -> f32 {
    (b.x - a.x) * (py - a.y) - (b.y - a.y) * (px - a.x)
}

/// Top or left edge for positive-area winding in y-down window space.
#[inline]
fn top_left(a: &ScreenVertex, b: &ScreenVertex) -> bool {
    let (dx, dy) = (b.x - a.x, b.y - a.y);
    (dy == 0.0 && dx > 0.0) || dy < 0.0
}

#[inline]
fn lerp(a: f32, b: f32, t: f32) -> f32 {
    a + (b - a) * t
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn sv(x: f32, y: f32) -> ScreenVertex {
        ScreenVertex { x, y, depth: 0.5, colour: [1.0; 4], uv: [0.0; 2] }
    }

    fn covered(f: impl FnOnce(&mut dyn FnMut(Fragment))) -> Vec<(u32, u32)> {
        let mut out = Vec::new();
        f(&mut |frag: Fragment| out.push((frag.x, frag.y)));
        out
    }

    #[test]
    fn split_square_covers_each_pixel_once() {
        let (a, b, c, d) = (sv(0.0, 0.0), sv(4.0, 0.0), sv(4.0, 4.0), sv(0.0, 4.0));
        let pixels = covered(|emit| {
            let mut emit = |f| emit(f);
            triangle(&a, &b, &c, 8, 8, &mut emit);
            triangle(&a, &c, &d, 8, 8, &mut emit);
        });
        let unique: HashSet<_> = pixels.iter().copied().collect();
        assert_eq!(pixels.len(), 16);
        assert_eq!(unique.len(), 16);
    }

    #[test]
    fn winding_does_not_matter() {
        let (a, b, c) = (sv(0.0, 0.0), sv(6.0, 0.0), sv(0.0, 6.0));
        let cw = covered(|emit| triangle(&a, &b, &c, 8, 8, &mut |f| emit(f)));
        let ccw = covered(|emit| triangle(&a, &c, &b, 8, 8, &mut |f| emit(f)));
        assert_eq!(cw.len(), ccw.len());
        assert!(!cw.is_empty());
    }

    #[test]
    fn degenerate_triangle_emits_nothing() {
        let (a, b) = (sv(0.0, 0.0), sv(4.0, 4.0));
        assert!(covered(|emit| triangle(&a, &b, &b, 8, 8, &mut |f| emit(f))).is_empty());
    }

    #[test]
    fn coverage_is_clipped_to_target() {
        let (a, b, c) = (sv(-10.0, -10.0), sv(20.0, -10.0), sv(-10.0, 20.0));
        let pixels = covered(|emit| triangle(&a, &b, &c, 4, 4, &mut |f| emit(f)));
        assert!(pixels.iter().all(|&(x, y)| x < 4 && y < 4));
    }

    #[test]
    fn horizontal_line_omits_end_pixel() {
        let (a, b) = (sv(0.5, 1.5), sv(4.5, 1.5));
        let pixels = covered(|emit| line(&a, &b, 8, 8, &mut |f| emit(f)));
        assert_eq!(pixels, vec![(0, 1), (1, 1), (2, 1), (3, 1)]);
    }

    #[test]
    fn long_line_only_walks_visible_steps() {
        let (a, b) = (sv(0.5, 4.5), sv(2e8, 4.5));
        let mut visited = 0u32;
        let pixels = covered(|emit| {
            line(&a, &b, 16, 16, &mut |f| {
                visited += 1;
                emit(f)
            })
        });
        assert_eq!(pixels, (0..16).map(|x| (x, 4)).collect::<Vec<_>>());
        assert_eq!(visited, 16);

        // Both ends off-target, crossing it.
        let (c, d) = (sv(-1000.5, 8.5), sv(1000.5, 8.5));
        let crossing = covered(|emit| line(&c, &d, 16, 16, &mut |f| emit(f)));
        assert_eq!(crossing, (0..16).map(|x| (x, 8)).collect::<Vec<_>>());
    }

    #[test]
    fn lines_missing_the_target_or_unbounded_emit_nothing() {
        let (a, b) = (sv(-50.0, -5.0), sv(50.0, -5.0));
        assert!(covered(|emit| line(&a, &b, 16, 16, &mut |f| emit(f))).is_empty());

        let (c, d) = (sv(0.0, 4.5), sv(f32::INFINITY, 4.5));
        assert!(covered(|emit| line(&c, &d, 16, 16, &mut |f| emit(f))).is_empty());
    }

    #[test]
    fn point_outside_target_is_dropped() {
        assert!(covered(|emit| point(&sv(9.0, 1.0), 8, 8, &mut |f| emit(f))).is_empty());
        assert_eq!(covered(|emit| point(&sv(2.7, 3.2), 8, 8, &mut |f| emit(f))), vec![(2, 3)]);
    }
}
