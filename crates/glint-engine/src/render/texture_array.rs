use std::sync::atomic::{AtomicU64, Ordering};

use crate::shading::{AddressMode, Texture, TextureArray, TextureFormat, TextureUnits};
use crate::shading::sources::TEXTURE_UNITS;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// GPU mirror of a CPU [`TextureArray`].
///
/// The wgpu texture is allocated once with `max_layers` array layers; layers
/// are uploaded as the CPU array grows. Renderers key their bind groups on
/// [`id`](Self::id).
pub struct GpuTextureArray {
    id: u64,
    texture: wgpu::Texture,
    view: wgpu::TextureView,
    format: TextureFormat,
    size: (u32, u32),
    max_layers: u32,
    uploaded: u32,
}

impl GpuTextureArray {
    pub fn new(device: &wgpu::Device, label: &str, array: &TextureArray) -> Self {
        let (width, height) = array.layer_size();
        let max_layers = array.max_layers().max(1);
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: max_layers },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: array.format().to_wgpu(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        let view = texture.create_view(&wgpu::TextureViewDescriptor {
            label: Some(label),
            dimension: Some(wgpu::TextureViewDimension::D2Array),
            ..Default::default()
        });
        Self {
            id: next_id(),
            texture,
            view,
            format: array.format(),
            size: (width, height),
            max_layers,
            uploaded: 0,
        }
    }

    /// Allocates and uploads every layer of `array`.
    pub fn from_cpu(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, array: &TextureArray) -> Self {
        let mut gpu = Self::new(device, label, array);
        gpu.sync(queue, array);
        gpu
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    /// Layers currently holding CPU data; the shader clamps to this count.
    #[inline]
    pub fn layer_count(&self) -> u32 {
        self.uploaded
    }

    /// Uploads layers added to `array` since the last sync.
    pub fn sync(&mut self, queue: &wgpu::Queue, array: &TextureArray) {
        if array.format() != self.format || array.layer_size() != self.size {
            log::warn!(
                "GpuTextureArray: {:?} {:?} does not match GPU array {:?} {:?}; not uploading",
                array.format(),
                array.layer_size(),
                self.format,
                self.size
            );
            return;
        }
        let target = array.len().min(self.max_layers);
        for layer in self.uploaded..target {
            self.upload_layer(queue, array, layer);
        }
        self.uploaded = self.uploaded.max(target);
    }

    /// Re-uploads one layer, e.g. after `TextureArray::update_layer`.
    pub fn upload_layer(&self, queue: &wgpu::Queue, array: &TextureArray, layer: u32) {
        let Some(texture) = array.layer(layer) else {
            log::debug!("GpuTextureArray: layer {layer} not allocated on the CPU side");
            return;
        };
        if layer >= self.max_layers {
            log::warn!("GpuTextureArray: layer {layer} exceeds capacity {}", self.max_layers);
            return;
        }
        write_texture(queue, &self.texture, texture, layer);
    }
}

/// A single uploaded 2D texture (the post filter `img`, one multi-texture unit).
pub struct GpuTexture {
    id: u64,
    view: wgpu::TextureView,
    address_mode: AddressMode,
    size: (u32, u32),
}

impl GpuTexture {
    pub fn from_cpu(device: &wgpu::Device, queue: &wgpu::Queue, label: &str, tex: &Texture) -> Self {
        let (width, height) = tex.size();
        let texture = device.create_texture(&wgpu::TextureDescriptor {
            label: Some(label),
            size: wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
            mip_level_count: 1,
            sample_count: 1,
            dimension: wgpu::TextureDimension::D2,
            format: tex.format().to_wgpu(),
            usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
            view_formats: &[],
        });
        write_texture(queue, &texture, tex, 0);
        Self {
            id: next_id(),
            view: texture.create_view(&wgpu::TextureViewDescriptor::default()),
            address_mode: tex.address_mode(),
            size: (width, height),
        }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn view(&self) -> &wgpu::TextureView {
        &self.view
    }

    #[inline]
    pub fn address_mode(&self) -> AddressMode {
        self.address_mode
    }

    #[inline]
    pub fn size(&self) -> (u32, u32) {
        self.size
    }
}

/// GPU mirror of [`TextureUnits`]: ten discrete 2D textures plus the uniforms
/// that travel with them.
///
/// Unbound units are backed by a 1×1 transparent texture so every binding is
/// always valid.
pub struct GpuTextureUnits {
    id: u64,
    units: Vec<GpuTexture>,
}

impl GpuTextureUnits {
    pub fn from_cpu(device: &wgpu::Device, queue: &wgpu::Queue, units: &TextureUnits) -> Self {
        let transparent = transparent_texel();
        let units = (0..TEXTURE_UNITS)
            .map(|i| {
                let label = format!("glint texture{i}");
                GpuTexture::from_cpu(device, queue, &label, units.unit(i).unwrap_or(&transparent))
            })
            .collect();
        Self { id: next_id(), units }
    }

    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn views(&self) -> impl Iterator<Item = &wgpu::TextureView> {
        self.units.iter().map(GpuTexture::view)
    }
}

fn transparent_texel() -> Texture {
    Texture::from_colors(1, 1, &[crate::paint::Rgba::TRANSPARENT])
        .expect("a 1x1 texture with one texel is valid by construction")
}

fn write_texture(queue: &wgpu::Queue, dst: &wgpu::Texture, src: &Texture, layer: u32) {
    let (width, height) = src.size();
    let bpp = src.format().bytes_per_texel() as u32;
    queue.write_texture(
        wgpu::TexelCopyTextureInfo {
            texture: dst,
            mip_level: 0,
            origin: wgpu::Origin3d { x: 0, y: 0, z: layer },
            aspect: wgpu::TextureAspect::All,
        },
        src.data(),
        wgpu::TexelCopyBufferLayout {
            offset: 0,
            bytes_per_row: Some(width * bpp),
            rows_per_image: Some(height),
        },
        wgpu::Extent3d { width, height, depth_or_array_layers: 1 },
    );
}
