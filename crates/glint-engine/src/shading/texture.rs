use glam::Vec2;
use thiserror::Error;

use crate::paint::Rgba;

/// Texel storage format.
///
/// Mirrors the two GPU formats the renderers allocate (`Rgba8Unorm`, `R8Unorm`).
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum TextureFormat {
    Rgba8,
    /// Single channel. Samples come back as `(r, 0, 0, 1)`, like a GPU `R8Unorm` view.
    R8,
}

impl TextureFormat {
    #[inline]
    pub const fn bytes_per_texel(self) -> usize {
        match self {
            TextureFormat::Rgba8 => 4,
            TextureFormat::R8 => 1,
        }
    }

    pub fn to_wgpu(self) -> wgpu::TextureFormat {
        match self {
            TextureFormat::Rgba8 => wgpu::TextureFormat::Rgba8Unorm,
            TextureFormat::R8 => wgpu::TextureFormat::R8Unorm,
        }
    }
}

/// Coordinate wrapping outside `[0, 1)`.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Default)]
pub enum AddressMode {
    #[default]
    ClampToEdge,
    Repeat,
    MirrorRepeat,
}

impl AddressMode {
    /// Maps an integer texel coordinate into `0..len`.
    fn resolve(self, i: i64, len: u32) -> u32 {
        let n = len as i64;
        let r = match self {
            AddressMode::ClampToEdge => i.clamp(0, n - 1),
            AddressMode::Repeat => i.rem_euclid(n),
            AddressMode::MirrorRepeat => {
                let period = i.rem_euclid(2 * n);
                if period < n { period } else { 2 * n - 1 - period }
            }
        };
        r as u32
    }

    pub fn to_wgpu(self) -> wgpu::AddressMode {
        match self {
            AddressMode::ClampToEdge => wgpu::AddressMode::ClampToEdge,
            AddressMode::Repeat => wgpu::AddressMode::Repeat,
            AddressMode::MirrorRepeat => wgpu::AddressMode::MirrorRepeat,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TextureError {
    #[error("texture has zero size ({width}x{height})")]
    ZeroSize { width: u32, height: u32 },

    #[error("expected {expected} bytes of texel data, got {actual}")]
    DataLength { expected: usize, actual: usize },

    #[error("{width}x{height} does not fit in a {max_width}x{max_height} layer")]
    TooLarge { width: u32, height: u32, max_width: u32, max_height: u32 },

    #[error("texture array is full ({capacity} layers)")]
    ArrayFull { capacity: u32 },

    #[error("layer {layer} is not allocated")]
    UnknownLayer { layer: u32 },

    #[error("format mismatch: array holds {expected:?}, got {actual:?}")]
    FormatMismatch { expected: TextureFormat, actual: TextureFormat },
}

/// CPU texture sampled with nearest filtering.
///
/// Texel `(x, y)` covers `[x/w, (x+1)/w) × [y/h, (y+1)/h)` in texture space, so a
/// sample at a texel center always returns that texel exactly.
#[derive(Debug, Clone, PartialEq)]
pub struct Texture {
    width: u32,
    height: u32,
    format: TextureFormat,
    address_mode: AddressMode,
    data: Vec<u8>,
}

impl Texture {
    pub fn new(width: u32, height: u32, format: TextureFormat, data: Vec<u8>) -> Result<Self, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        let expected = width as usize * height as usize * format.bytes_per_texel();
        if data.len() != expected {
            return Err(TextureError::DataLength { expected, actual: data.len() });
        }
        Ok(Self { width, height, format, address_mode: AddressMode::default(), data })
    }

    /// Zero-filled texture (transparent for RGBA, zero coverage for R8).
    pub fn empty(width: u32, height: u32, format: TextureFormat) -> Result<Self, TextureError> {
        let len = width as usize * height as usize * format.bytes_per_texel();
        Self::new(width, height, format, vec![0; len])
    }

    /// Builds an RGBA texture from straight-alpha colors in row-major order.
    pub fn from_colors(width: u32, height: u32, texels: &[Rgba]) -> Result<Self, TextureError> {
        let data = texels.iter().flat_map(|c| c.to_u8()).collect();
        Self::new(width, height, TextureFormat::Rgba8, data)
    }

    #[inline]
    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        self
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    #[inline]
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Reads a texel by integer coordinate. Coordinates must be in range.
    pub fn texel(&self, x: u32, y: u32) -> Rgba {
        let bpp = self.format.bytes_per_texel();
        let i = (y as usize * self.width as usize + x as usize) * bpp;
        match self.format {
            TextureFormat::Rgba8 => {
                Rgba::from_u8(self.data[i], self.data[i + 1], self.data[i + 2], self.data[i + 3])
            }
            TextureFormat::R8 => Rgba::new(self.data[i] as f32 / 255.0, 0.0, 0.0, 1.0),
        }
    }

    /// Nearest-filtered sample at normalized coordinates.
    pub fn sample(&self, uv: Vec2) -> Rgba {
        if !uv.is_finite() {
            return Rgba::TRANSPARENT;
        }
        let x = (uv.x * self.width as f32).floor() as i64;
        let y = (uv.y * self.height as f32).floor() as i64;
        let x = self.address_mode.resolve(x, self.width);
        let y = self.address_mode.resolve(y, self.height);
        self.texel(x, y)
    }

    /// Copies `bytes` into the sub-rectangle at `(x, y)`.
    pub fn write_region(&mut self, x: u32, y: u32, width: u32, height: u32, bytes: &[u8]) -> Result<(), TextureError> {
        let too_large = TextureError::TooLarge {
            width: x.saturating_add(width),
            height: y.saturating_add(height),
            max_width: self.width,
            max_height: self.height,
        };
        match (x.checked_add(width), y.checked_add(height)) {
            (Some(right), Some(bottom)) if right <= self.width && bottom <= self.height => {}
            _ => return Err(too_large),
        }
        let bpp = self.format.bytes_per_texel();
        let row = width as usize * bpp;
        let expected = row * height as usize;
        if bytes.len() != expected {
            return Err(TextureError::DataLength { expected, actual: bytes.len() });
        }
        for r in 0..height as usize {
            let dst = ((y as usize + r) * self.width as usize + x as usize) * bpp;
            self.data[dst..dst + row].copy_from_slice(&bytes[r * row..(r + 1) * row]);
        }
        Ok(())
    }
}

/// Per-layer bookkeeping: the size of the image actually stored in the layer.
#[derive(Debug, Copy, Clone, Eq, PartialEq)]
pub struct LayerStats {
    pub width: u32,
    pub height: u32,
}

/// Stack of equally-sized layers, the CPU counterpart of a GPU 2D-array texture.
///
/// Images smaller than the layer are stored in its top-left corner; sprites crop
/// into that corner using normalized coordinates relative to the full layer.
#[derive(Debug, Clone)]
pub struct TextureArray {
    width: u32,
    height: u32,
    max_layers: u32,
    format: TextureFormat,
    address_mode: AddressMode,
    layers: Vec<Texture>,
    stats: Vec<LayerStats>,
}

impl TextureArray {
    pub fn new(width: u32, height: u32, max_layers: u32, format: TextureFormat) -> Self {
        Self {
            width,
            height,
            max_layers,
            format,
            address_mode: AddressMode::default(),
            layers: Vec::new(),
            stats: Vec::with_capacity(max_layers as usize),
        }
    }

    pub fn with_address_mode(mut self, mode: AddressMode) -> Self {
        self.address_mode = mode;
        for layer in &mut self.layers {
            layer.address_mode = mode;
        }
        self
    }

    #[inline]
    pub fn layer_size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    #[inline]
    pub fn format(&self) -> TextureFormat {
        self.format
    }

    #[inline]
    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    #[inline]
    pub fn max_layers(&self) -> u32 {
        self.max_layers
    }

    #[inline]
    pub fn len(&self) -> u32 {
        self.layers.len() as u32
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.layers.is_empty()
    }

    pub fn layer(&self, layer: u32) -> Option<&Texture> {
        self.layers.get(layer as usize)
    }

    pub fn stats(&self, layer: u32) -> Option<LayerStats> {
        self.stats.get(layer as usize).copied()
    }

    /// Stores `bytes` (a `width × height` image) in the next free layer.
    pub fn add_layer(&mut self, bytes: &[u8], width: u32, height: u32) -> Result<u32, TextureError> {
        self.add_layer_filled(bytes, (width, height), (width, height))
    }

    /// Stores `bytes` covering the whole layer, recording only the top-left
    /// `width × height` as the used image. Lookups that wrap over the layer
    /// still land on data.
    pub fn add_full_layer(&mut self, bytes: &[u8], width: u32, height: u32) -> Result<u32, TextureError> {
        self.add_layer_filled(bytes, (self.width, self.height), (width, height))
    }

    fn add_layer_filled(&mut self, bytes: &[u8], (fill_w, fill_h): (u32, u32), used: (u32, u32)) -> Result<u32, TextureError> {
        let layer = self.add_empty_layer(used.0, used.1)?;
        if let Err(e) = self.update_layer(layer, 0, 0, fill_w, fill_h, bytes) {
            self.layers.pop();
            self.stats.pop();
            return Err(e);
        }
        Ok(layer)
    }

    /// Reserves a zero-filled layer, recording `width × height` as its used size.
    pub fn add_empty_layer(&mut self, width: u32, height: u32) -> Result<u32, TextureError> {
        if width == 0 || height == 0 {
            return Err(TextureError::ZeroSize { width, height });
        }
        if width > self.width || height > self.height {
            return Err(TextureError::TooLarge {
                width,
                height,
                max_width: self.width,
                max_height: self.height,
            });
        }
        if self.len() >= self.max_layers {
            return Err(TextureError::ArrayFull { capacity: self.max_layers });
        }
        let layer = self.len();
        let tex = Texture::empty(self.width, self.height, self.format)?.with_address_mode(self.address_mode);
        self.layers.push(tex);
        self.stats.push(LayerStats { width, height });
        Ok(layer)
    }

    /// Adds a whole [`Texture`] as a new layer.
    pub fn add_texture(&mut self, texture: &Texture) -> Result<u32, TextureError> {
        if texture.format() != self.format {
            return Err(TextureError::FormatMismatch { expected: self.format, actual: texture.format() });
        }
        let (w, h) = texture.size();
        self.add_layer(texture.data(), w, h)
    }

    pub fn update_layer(
        &mut self,
        layer: u32,
        x: u32,
        y: u32,
        width: u32,
        height: u32,
        bytes: &[u8],
    ) -> Result<(), TextureError> {
        let tex = self.layers.get_mut(layer as usize).ok_or(TextureError::UnknownLayer { layer })?;
        tex.write_region(x, y, width, height, bytes)
    }

    /// Samples `layer` at `uv`. Out-of-range layers clamp to the last allocated
    /// layer; an empty array samples as transparent.
    pub fn sample(&self, layer: u32, uv: Vec2) -> Rgba {
        let Some(last) = self.layers.len().checked_sub(1) else {
            return Rgba::TRANSPARENT;
        };
        self.layers[(layer as usize).min(last)].sample(uv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gradient_2x2() -> Texture {
        Texture::from_colors(
            2,
            2,
            &[
                Rgba::new(1.0, 0.0, 0.0, 1.0),
                Rgba::new(0.0, 1.0, 0.0, 1.0),
                Rgba::new(0.0, 0.0, 1.0, 1.0),
                Rgba::WHITE,
            ],
        )
        .unwrap()
    }

    // ── sampling ──────────────────────────────────────────────────────────

    #[test]
    fn sample_at_texel_centers() {
        let t = gradient_2x2();
        assert_eq!(t.sample(Vec2::new(0.25, 0.25)), Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(t.sample(Vec2::new(0.75, 0.25)), Rgba::new(0.0, 1.0, 0.0, 1.0));
        assert_eq!(t.sample(Vec2::new(0.25, 0.75)), Rgba::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(t.sample(Vec2::new(0.75, 0.75)), Rgba::WHITE);
    }

    #[test]
    fn clamp_to_edge_outside_range() {
        let t = gradient_2x2();
        assert_eq!(t.sample(Vec2::new(-3.0, -3.0)), Rgba::new(1.0, 0.0, 0.0, 1.0));
        assert_eq!(t.sample(Vec2::new(7.0, 7.0)), Rgba::WHITE);
    }

    #[test]
    fn repeat_wraps() {
        let t = gradient_2x2().with_address_mode(AddressMode::Repeat);
        assert_eq!(t.sample(Vec2::new(1.25, 0.25)), t.sample(Vec2::new(0.25, 0.25)));
        assert_eq!(t.sample(Vec2::new(-0.25, 0.25)), t.sample(Vec2::new(0.75, 0.25)));
    }

    #[test]
    fn mirror_repeat_reflects() {
        let t = gradient_2x2().with_address_mode(AddressMode::MirrorRepeat);
        // texel -1 mirrors onto texel 0, texel 2 onto texel 1
        assert_eq!(t.sample(Vec2::new(-0.25, 0.25)), t.sample(Vec2::new(0.25, 0.25)));
        assert_eq!(t.sample(Vec2::new(1.25, 0.25)), t.sample(Vec2::new(0.75, 0.25)));
    }

    #[test]
    fn r8_samples_as_red() {
        let t = Texture::new(1, 1, TextureFormat::R8, vec![51]).unwrap();
        assert_eq!(t.sample(Vec2::splat(0.5)), Rgba::new(0.2, 0.0, 0.0, 1.0));
    }

    #[test]
    fn write_region_rejects_overflowing_extent() {
        let mut t = Texture::new(4, 4, TextureFormat::R8, vec![0; 16]).unwrap();
        let err = t.write_region(2, 0, u32::MAX, 1, &[0]).unwrap_err();
        assert!(matches!(err, TextureError::TooLarge { width: u32::MAX, max_width: 4, .. }));
        assert!(t.write_region(0, u32::MAX, 1, 2, &[0, 0]).is_err());
        assert!(t.data().iter().all(|b| *b == 0));
    }

    #[test]
    fn new_rejects_wrong_length() {
        let err = Texture::new(2, 2, TextureFormat::Rgba8, vec![0; 3]).unwrap_err();
        assert_eq!(err, TextureError::DataLength { expected: 16, actual: 3 });
    }

    // ── arrays ────────────────────────────────────────────────────────────

    #[test]
    fn array_layers_are_sequential() {
        let mut a = TextureArray::new(4, 4, 2, TextureFormat::R8);
        assert_eq!(a.add_layer(&[255; 4], 2, 2).unwrap(), 0);
        assert_eq!(a.add_empty_layer(4, 4).unwrap(), 1);
        assert_eq!(a.add_empty_layer(1, 1), Err(TextureError::ArrayFull { capacity: 2 }));
        assert_eq!(a.stats(0), Some(LayerStats { width: 2, height: 2 }));
    }

    #[test]
    fn small_image_lands_in_top_left_corner() {
        let mut a = TextureArray::new(4, 4, 1, TextureFormat::R8);
        a.add_layer(&[255; 4], 2, 2).unwrap();
        assert_eq!(a.sample(0, Vec2::new(0.125, 0.125)).r, 1.0);
        assert_eq!(a.sample(0, Vec2::new(0.875, 0.875)).r, 0.0);
    }

    #[test]
    fn full_layer_keeps_data_past_the_used_extent() {
        let mut a = TextureArray::new(4, 4, 1, TextureFormat::R8);
        a.add_full_layer(&[255; 16], 2, 2).unwrap();
        assert_eq!(a.stats(0), Some(LayerStats { width: 2, height: 2 }));
        assert_eq!(a.sample(0, Vec2::new(0.875, 0.875)).r, 1.0);
        assert!(a.add_full_layer(&[255; 4], 2, 2).is_err());
        assert_eq!(a.len(), 1);
    }

    #[test]
    fn oversized_layer_rejected() {
        let mut a = TextureArray::new(4, 4, 1, TextureFormat::Rgba8);
        assert!(matches!(a.add_empty_layer(5, 1), Err(TextureError::TooLarge { .. })));
        assert!(a.is_empty());
    }

    #[test]
    fn failed_add_layer_does_not_leak_a_slot() {
        let mut a = TextureArray::new(4, 4, 1, TextureFormat::Rgba8);
        assert!(a.add_layer(&[0; 3], 1, 1).is_err());
        assert_eq!(a.len(), 0);
    }

    #[test]
    fn out_of_range_layer_clamps_to_last() {
        let mut a = TextureArray::new(1, 1, 2, TextureFormat::R8);
        a.add_layer(&[0], 1, 1).unwrap();
        a.add_layer(&[255], 1, 1).unwrap();
        assert_eq!(a.sample(9, Vec2::splat(0.5)).r, 1.0);
    }

    #[test]
    fn empty_array_samples_transparent() {
        let a = TextureArray::new(1, 1, 2, TextureFormat::Rgba8);
        assert_eq!(a.sample(0, Vec2::splat(0.5)), Rgba::TRANSPARENT);
    }
}
