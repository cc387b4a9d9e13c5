use super::ZIndex;

/// Paint-order key of a sprite.
///
/// Field order gives the derived ordering: `z` first (back to front), then
/// `seq`, the push sequence number, so equal layers keep submission order.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct SortKey {
    pub z: ZIndex,
    pub seq: u32,
}

impl SortKey {
    #[inline]
    pub const fn new(z: ZIndex, seq: u32) -> Self {
        Self { z, seq }
    }
}
