use glam::Vec2;

/// The eight compass directions sampled around a fragment, in unit texel steps.
///
/// Order: N, NE, E, SE, S, SW, W, NW (texture space, +Y down).
pub const COMPASS: [Vec2; 8] = [
    Vec2::new(0.0, -1.0),
    Vec2::new(1.0, -1.0),
    Vec2::new(1.0, 0.0),
    Vec2::new(1.0, 1.0),
    Vec2::new(0.0, 1.0),
    Vec2::new(-1.0, 1.0),
    Vec2::new(-1.0, 0.0),
    Vec2::new(-1.0, -1.0),
];

/// How neighbor alphas are folded into one value.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub enum NeighborReduction {
    /// Largest neighbor alpha, in `[0, 1]`.
    Max,
    /// Number of neighbors with alpha > 0, in `0..=8` (returned as `f32`).
    CountNonZero,
}

/// Samples the 8 neighbors of `center` at `thickness` (per-axis offset in
/// texture space) and reduces their alpha.
///
/// `sample_alpha` is the sampling functor: it receives a texture-space coordinate
/// and returns the alpha visible there. Every outline/border variant goes through
/// this one routine.
pub fn reduce_neighbors<F>(center: Vec2, thickness: Vec2, sample_alpha: F, reduction: NeighborReduction) -> f32
where
    F: Fn(Vec2) -> f32,
{
    let alphas = COMPASS.iter().map(|dir| sample_alpha(center + *dir * thickness));
    match reduction {
        NeighborReduction::Max => alphas.fold(0.0, f32::max),
        NeighborReduction::CountNonZero => alphas.filter(|a| *a > 0.0).count() as f32,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn compass_offsets_are_distinct_and_exclude_center() {
        for (i, a) in COMPASS.iter().enumerate() {
            assert_ne!(*a, Vec2::ZERO);
            for b in &COMPASS[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }

    #[test]
    fn max_picks_largest_neighbor() {
        let east = Vec2::new(0.6, 0.5);
        let m = reduce_neighbors(
            Vec2::splat(0.5),
            Vec2::splat(0.1),
            |p| if (p - east).length() < 1e-6 { 0.7 } else { 0.2 },
            NeighborReduction::Max,
        );
        assert_eq!(m, 0.7);
    }

    #[test]
    fn count_ignores_zero_alpha() {
        // Only the right-hand column (NE, E, SE) is covered.
        let n = reduce_neighbors(
            Vec2::ZERO,
            Vec2::ONE,
            |p| if p.x > 0.0 { 0.01 } else { 0.0 },
            NeighborReduction::CountNonZero,
        );
        assert_eq!(n, 3.0);
    }

    #[test]
    fn center_is_never_sampled() {
        let m = reduce_neighbors(
            Vec2::ZERO,
            Vec2::ONE,
            |p| if p == Vec2::ZERO { 1.0 } else { 0.0 },
            NeighborReduction::Max,
        );
        assert_eq!(m, 0.0);
    }
}
