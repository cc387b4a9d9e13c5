use glam::Vec2;

/// Axis-aligned rectangle (top-left origin).
///
/// Used for pixel rects (atlas placement, source regions in texels, raster
/// bounds) and for normalized texture-space crops.
#[derive(Debug, Copy, Clone, Default, PartialEq)]
pub struct Rect {
    pub origin: Vec2,
    pub size: Vec2,
}

impl Rect {
    #[inline]
    pub const fn new(x: f32, y: f32, w: f32, h: f32) -> Self {
        Self { origin: Vec2::new(x, y), size: Vec2::new(w, h) }
    }

    #[inline]
    pub fn from_min_max(min: Vec2, max: Vec2) -> Self {
        Self { origin: min, size: max - min }
    }

    /// Smallest rect enclosing every point; `None` for an empty iterator.
    pub fn bounding<I: IntoIterator<Item = Vec2>>(points: I) -> Option<Self> {
        let mut it = points.into_iter();
        let first = it.next()?;
        let (min, max) = it.fold((first, first), |(lo, hi), p| (lo.min(p), hi.max(p)));
        Some(Self::from_min_max(min, max))
    }

    #[inline]
    pub fn min(self) -> Vec2 {
        self.origin
    }

    #[inline]
    pub fn max(self) -> Vec2 {
        self.origin + self.size
    }

    #[inline]
    pub fn is_empty(self) -> bool {
        self.size.x <= 0.0 || self.size.y <= 0.0
    }

    /// Half-open containment: `[min, max)`.
    #[inline]
    pub fn contains(self, p: Vec2) -> bool {
        p.cmpge(self.min()).all() && p.cmplt(self.max()).all()
    }

    /// Overlap of two rects, `None` when they only touch or are disjoint.
    pub fn intersect(self, other: Rect) -> Option<Rect> {
        let min = self.min().max(other.min());
        let max = self.max().min(other.max());
        let r = Rect::from_min_max(min, max);
        (!r.is_empty()).then_some(r)
    }

    /// Divides by `extent`, turning a texel rect into a texture-space one.
    #[inline]
    pub fn normalize_to(self, extent: Vec2) -> Rect {
        Rect { origin: self.origin / extent, size: self.size / extent }
    }

    /// Mirrors a crop in place: the origin moves to the opposite edge and the
    /// extent is negated, so `crop.xy + pos * crop.zw` walks it backwards.
    pub fn flipped(self, horizontal: bool, vertical: bool) -> Rect {
        let mut r = self;
        if horizontal {
            r.origin.x += r.size.x;
            r.size.x = -r.size.x;
        }
        if vertical {
            r.origin.y += r.size.y;
            r.size.y = -r.size.y;
        }
        r
    }

    /// `[x, y, w, h]`, the layout of the `crop` instance attribute.
    #[inline]
    pub fn to_array(self) -> [f32; 4] {
        [self.origin.x, self.origin.y, self.size.x, self.size.y]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(x: f32, y: f32, w: f32, h: f32) -> Rect {
        Rect::new(x, y, w, h)
    }

    #[test]
    fn contains_is_half_open() {
        let rect = r(0.0, 0.0, 10.0, 10.0);
        assert!(rect.contains(Vec2::ZERO));
        assert!(rect.contains(Vec2::new(9.9, 5.0)));
        assert!(!rect.contains(Vec2::new(10.0, 5.0)));
        assert!(!rect.contains(Vec2::new(5.0, -0.1)));
    }

    #[test]
    fn intersect_overlap_and_touching() {
        let a = r(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.intersect(r(5.0, 5.0, 10.0, 10.0)), Some(r(5.0, 5.0, 5.0, 5.0)));
        assert_eq!(a.intersect(r(10.0, 0.0, 10.0, 10.0)), None);
    }

    #[test]
    fn bounding_covers_all_points() {
        let b = Rect::bounding([Vec2::new(3.0, -1.0), Vec2::new(-2.0, 4.0), Vec2::new(1.0, 1.0)]).unwrap();
        assert_eq!(b, r(-2.0, -1.0, 5.0, 5.0));
        assert_eq!(Rect::bounding(std::iter::empty()), None);
    }

    #[test]
    fn texel_rect_normalizes_to_layer() {
        let crop = r(256.0, 0.0, 128.0, 512.0).normalize_to(Vec2::splat(1024.0));
        assert_eq!(crop.to_array(), [0.25, 0.0, 0.125, 0.5]);
    }

    #[test]
    fn horizontal_flip_swaps_edges() {
        let crop = r(0.25, 0.0, 0.5, 1.0).flipped(true, false);
        assert_eq!(crop.to_array(), [0.75, 0.0, -0.5, 1.0]);
        assert_eq!(crop.flipped(true, false), r(0.25, 0.0, 0.5, 1.0));
    }
}
