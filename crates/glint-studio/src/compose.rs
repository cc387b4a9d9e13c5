//! Turns a [`SceneFile`] into engine resources: a [`TextureStore`], a
//! z-ordered [`SpriteList`] and the optional post filter pass.

use std::collections::HashMap;
use std::path::Path;

use anyhow::{Context, Result, anyhow, bail};
use glam::{Vec2, Vec3};

use glint_engine::coords::Rect;
use glint_engine::scene::{Sprite, SpriteList, ZIndex};
use glint_engine::shading::sources::{RGBA_BORDER_THICKNESS, TEXTURE_UNITS};
use glint_engine::shading::{
    OutlinePolicy, PostFilterUniforms, Rgba, SpriteInstance, SpriteKind, Texture, TextureFormat, TextureUnits,
};
use glint_engine::storage::{NoiseConfig, TextureStore};
use glint_engine::text::{FontId, FontSystem, Text};

use crate::scene_file::{PostDef, SceneFile, SpriteDef, TextDef, effect_flags};

/// The single-texture filter pass drawn over the sprites.
#[derive(Debug, Clone)]
pub struct PostPass {
    pub image: Texture,
    /// Logical px.
    pub dest: Rect,
    pub uniforms: PostFilterUniforms,
    pub policy: OutlinePolicy,
}

#[derive(Debug)]
pub struct Composition {
    pub store: TextureStore,
    pub sprites: SpriteList,
    pub post: Option<PostPass>,
    pub size: (u32, u32),
    pub background: Rgba,
    pub zoom: f32,
    pub t: f32,
}

/// Loads every asset the scene names and places its sprites. Relative asset
/// paths resolve against `base_dir`.
pub fn compose(scene: &SceneFile, base_dir: &Path) -> Result<Composition> {
    let [width, height] = scene.size;
    if width == 0 || height == 0 {
        bail!("scene size must be non-zero, got {width}x{height}");
    }

    let mut store = TextureStore::default();
    let mut layers: HashMap<&str, u32> = HashMap::new();

    for image in &scene.images {
        let path = base_dir.join(&image.path);
        let layer = store.load_image_file(&path).with_context(|| format!("image '{}' ({})", image.name, path.display()))?;
        layers.insert(&image.name, layer);
    }
    for noise in &scene.noise {
        let config = NoiseConfig { size: noise.size, cell: noise.cell, seed: noise.seed };
        let layer = store.add_noise_layer(&config).with_context(|| format!("noise '{}'", noise.name))?;
        layers.insert(&noise.name, layer);
    }

    let mut fonts = FontSystem::new();
    let mut font_ids: HashMap<&str, FontId> = HashMap::new();
    for font in &scene.fonts {
        let path = base_dir.join(&font.path);
        let id = fonts.load_font_file(&path).with_context(|| format!("font '{}'", font.name))?;
        font_ids.insert(&font.name, id);
    }

    let lookup = |name: &str| layers.get(name).copied().ok_or_else(|| anyhow!("no image or noise named '{name}'"));

    let mut sprites = SpriteList::new();
    for (i, def) in scene.sprites.iter().enumerate() {
        let sprite = build_sprite(&store, def, &lookup).with_context(|| format!("sprite #{i}"))?;
        store.push(&mut sprites, ZIndex(def.z), &sprite).with_context(|| format!("sprite #{i}"))?;
    }

    if !scene.texts.is_empty() {
        let mut atlas = store.add_glyph_atlas().context("no room for a glyph atlas")?;
        for def in &scene.texts {
            let text = build_text(def, &font_ids, &lookup)?;
            for glyph in atlas.layout_text(&fonts, store.gray_mut(), &text) {
                store.push(&mut sprites, ZIndex(def.z), &glyph)?;
            }
        }
        log::debug!("compose: {} glyphs cached", atlas.cached_glyphs());
    }

    let post = scene
        .post
        .as_ref()
        .map(|def| build_post(&store, def, &lookup, scene.t))
        .transpose()
        .context("post filter")?;

    log::info!("composed {} sprites from {} layers", sprites.len(), store.rgba().len());
    Ok(Composition {
        store,
        sprites,
        post,
        size: (width, height),
        background: Rgba::from(scene.background),
        zoom: scene.zoom,
        t: scene.t,
    })
}

fn build_sprite(store: &TextureStore, def: &SpriteDef, lookup: &impl Fn(&str) -> Result<u32>) -> Result<Sprite> {
    let sprite = match (&def.image, def.size) {
        (Some(name), _) => {
            let layer = lookup(name)?;
            let mut sprite = store.sprite(layer).ok_or_else(|| anyhow!("layer {layer} is empty"))?;
            if let Some([x, y, w, h]) = def.crop {
                sprite = sprite.cropped(Rect::new(x, y, w, h));
            }
            sprite
        }
        (None, Some([w, h])) => Sprite::solid(Vec2::new(w, h), Vec3::from(def.color)),
        (None, None) => bail!("a sprite needs either `image` or `size`"),
    };

    let mut sprite = sprite
        .at(def.position[0], def.position[1])
        .with_origin(def.origin.into())
        .scaled(def.scale)
        .flipped(def.flip.into())
        .with_effect(effect_flags(&def.effects))
        .with_effect_color(Vec3::from(def.color));
    if def.rotation != 0.0 {
        sprite = sprite.rotated(def.rotation, def.rotation_origin.into());
    }
    if let Some(noise) = &def.noise {
        sprite = sprite.with_noise_layer(lookup(noise)?);
    }
    Ok(sprite)
}

fn build_text(
    def: &TextDef,
    fonts: &HashMap<&str, FontId>,
    lookup: &impl Fn(&str) -> Result<u32>,
) -> Result<Text> {
    let font = *fonts.get(def.font.as_str()).ok_or_else(|| anyhow!("no font named '{}'", def.font))?;
    let mut text = Text::new(font, def.text.clone(), def.size).at(def.position[0], def.position[1]);
    text.max_width = def.max_width;
    text.effect = effect_flags(&def.effects);
    text.effect_color = Vec3::from(def.color);
    if let Some(noise) = &def.noise {
        text.secondary_layer = lookup(noise)?;
    }
    Ok(text)
}

fn build_post(store: &TextureStore, def: &PostDef, lookup: &impl Fn(&str) -> Result<u32>, t: f32) -> Result<PostPass> {
    let layer = lookup(&def.image)?;
    let image = layer_texture(store, layer)?;
    let (w, h) = image.size();
    let dest = match def.dest {
        Some([x, y, w, h]) => Rect::new(x, y, w, h),
        None => Rect::new(0.0, 0.0, w as f32, h as f32),
    };
    let uniforms = PostFilterUniforms {
        outline_thickness: Vec2::from(def.outline_thickness),
        outline_color: Rgba::from(def.outline_color),
        background_color: Rgba::from(def.background_color),
        effect_color: Rgba::from(def.effect_color),
        effect: def.effect.into(),
        t,
        is_grayscale: def.grayscale,
    };
    Ok(PostPass { image, dest, uniforms, policy: def.policy.into() })
}

/// Copies the used region of an RGBA layer out as a standalone texture.
pub fn layer_texture(store: &TextureStore, layer: u32) -> Result<Texture> {
    let array = store.rgba();
    let (src, stats) = array
        .layer(layer)
        .zip(array.stats(layer))
        .ok_or_else(|| anyhow!("RGBA layer {layer} is not allocated"))?;

    let (layer_w, _) = array.layer_size();
    let row = stats.width as usize * 4;
    let stride = layer_w as usize * 4;
    let data: Vec<u8> = src
        .data()
        .chunks(stride)
        .take(stats.height as usize)
        .flat_map(|line| &line[..row])
        .copied()
        .collect();
    Ok(Texture::new(stats.width, stats.height, TextureFormat::Rgba8, data)?.with_address_mode(src.address_mode()))
}

/// Binds the first ten RGBA layers to `texture0..texture9`, layer `i` on unit
/// `i`, so sprite layer indices keep their meaning.
///
/// The border matches the array path (black, one RGBA texel) and follows the
/// post pass's outline policy when there is one. Glyph sprites sample
/// grayscale layers the units cannot express; they are dropped with a warning.
pub fn texture_units(comp: &Composition) -> (TextureUnits, Vec<SpriteInstance>) {
    let mut units = TextureUnits::new();
    units.outline_color = Rgba::BLACK;
    units.outline_thickness = Vec2::splat(RGBA_BORDER_THICKNESS);
    if let Some(post) = &comp.post {
        units.outline_policy = post.policy;
    }
    let rgba = comp.store.rgba();
    for layer in 0..rgba.len().min(TEXTURE_UNITS as u32) {
        if let Some(tex) = rgba.layer(layer) {
            units.bind(layer as usize, tex.clone());
        }
    }
    if rgba.len() as usize > TEXTURE_UNITS {
        log::warn!("texture units: {} RGBA layers, only the first {TEXTURE_UNITS} are bound", rgba.len());
    }

    let mut dropped = 0usize;
    let instances = comp
        .sprites
        .instances()
        .filter(|inst| {
            let keep = SpriteKind::from_raw(inst.kind) != Some(SpriteKind::Glyph);
            dropped += usize::from(!keep);
            keep
        })
        .collect();
    if dropped > 0 {
        log::warn!("texture units: skipped {dropped} glyph sprites (no grayscale array)");
    }
    (units, instances)
}
