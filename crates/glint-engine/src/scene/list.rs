use glam::Vec2;

use crate::shading::{SpriteInstance, SpriteKind};

use super::{SceneError, SortKey, Sprite, ZIndex};

/// A recorded sprite: paint-order key + instance attributes.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SpriteItem {
    pub key: SortKey,
    pub instance: SpriteInstance,
}

/// Sprites for one frame, kept in paint order.
///
/// Items are ordered by [`ZIndex`], then by push order. `push` inserts at the
/// sorted position (binary search), so iteration never re-sorts and works
/// through a shared reference.
///
/// ```ignore
/// list.push_sprite(ZIndex(0), &background, rgba_layer_size)?;
/// list.push_sprite(ZIndex(1), &hero, rgba_layer_size)?;
/// renderer.render(&ctx, &mut target, &list, textures);
/// ```
#[derive(Debug, Default, Clone)]
pub struct SpriteList {
    items: Vec<SpriteItem>,
    next_seq: u32,
}

impl SpriteList {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Removes all sprites, keeping allocated capacity.
    #[inline]
    pub fn clear(&mut self) {
        self.items.clear();
        self.next_seq = 0;
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Items in paint order (back to front).
    #[inline]
    pub fn items(&self) -> &[SpriteItem] {
        &self.items
    }

    /// Instances in paint order, ready for the instance buffer.
    pub fn instances(&self) -> impl Iterator<Item = SpriteInstance> + '_ {
        self.items.iter().map(|item| item.instance)
    }

    /// Records a raw instance.
    ///
    /// Instances whose `kind` is not one of the three known kinds are rejected
    /// here so they never reach a shader.
    pub fn push(&mut self, z: ZIndex, instance: SpriteInstance) -> Result<(), SceneError> {
        if SpriteKind::from_raw(instance.kind).is_none() {
            log::warn!("SpriteList: rejecting instance with unknown kind {}", instance.kind);
            return Err(SceneError::UnknownKind { kind: instance.kind });
        }
        let unknown = instance.effect_flags().unknown_bits();
        if unknown != 0 {
            log::debug!("SpriteList: ignoring unknown effect bits {unknown:#x}");
        }

        let key = SortKey::new(z, self.next_seq);
        self.next_seq = self.next_seq.wrapping_add(1);

        let at = self.items.partition_point(|it| it.key <= key);
        self.items.insert(at, SpriteItem { key, instance });
        Ok(())
    }

    /// Converts and records a [`Sprite`]; see [`Sprite::to_instance`] for
    /// `layer_size`.
    pub fn push_sprite(&mut self, z: ZIndex, sprite: &Sprite, layer_size: Vec2) -> Result<(), SceneError> {
        let instance = sprite.to_instance(layer_size)?;
        self.push(z, instance)
    }
}

impl Extend<SpriteInstance> for SpriteList {
    /// Pushes on the default layer; rejected instances are skipped.
    fn extend<I: IntoIterator<Item = SpriteInstance>>(&mut self, iter: I) {
        for instance in iter {
            let _ = self.push(ZIndex::default(), instance);
        }
    }
}
