//! TOML scene description.
//!
//! A scene names its assets (images, procedural noise layers, fonts) and then
//! places sprites and text that refer to them by name. An optional `[post]`
//! table runs one asset through the outline / grayscale filter on top.

use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

use glint_engine::scene::{Flip, Origin};
use glint_engine::shading::{EffectFlags, OutlinePolicy, PostEffect};

fn default_size() -> [u32; 2] {
    [480, 320]
}

fn default_background() -> [f32; 4] {
    [0.08, 0.08, 0.1, 1.0]
}

fn one() -> f32 {
    1.0
}

fn white() -> [f32; 3] {
    [1.0, 1.0, 1.0]
}

fn noise_size() -> u32 {
    256
}

fn noise_cell() -> u32 {
    32
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SceneFile {
    /// Output size in physical pixels.
    #[serde(default = "default_size")]
    pub size: [u32; 2],
    #[serde(default = "default_background")]
    pub background: [f32; 4],
    #[serde(default = "one")]
    pub zoom: f32,
    /// Effect time of the first frame.
    #[serde(default)]
    pub t: f32,

    #[serde(default, rename = "image")]
    pub images: Vec<ImageDef>,
    #[serde(default, rename = "noise")]
    pub noise: Vec<NoiseDef>,
    #[serde(default, rename = "font")]
    pub fonts: Vec<FontDef>,
    #[serde(default, rename = "sprite")]
    pub sprites: Vec<SpriteDef>,
    #[serde(default, rename = "text")]
    pub texts: Vec<TextDef>,
    pub post: Option<PostDef>,
}

impl SceneFile {
    pub fn parse(source: &str) -> Result<Self> {
        toml::from_str(source).context("invalid scene file")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))?;
        Self::parse(&source).with_context(|| format!("in {}", path.display()))
    }

    /// Built-in scene used when no file is given; needs no asset files.
    pub fn demo() -> Result<Self> {
        Self::parse(DEMO_SCENE)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ImageDef {
    pub name: String,
    /// Resolved against the scene file's directory.
    pub path: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NoiseDef {
    pub name: String,
    #[serde(default = "noise_size")]
    pub size: u32,
    #[serde(default = "noise_cell")]
    pub cell: u32,
    #[serde(default)]
    pub seed: u64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FontDef {
    pub name: String,
    pub path: String,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EffectName {
    Glow,
    Noise,
    Border,
}

pub fn effect_flags(names: &[EffectName]) -> EffectFlags {
    names.iter().fold(EffectFlags::NONE, |acc, name| {
        acc | match name {
            EffectName::Glow => EffectFlags::GLOW,
            EffectName::Noise => EffectFlags::NOISE,
            EffectName::Border => EffectFlags::BORDER,
        }
    })
}

/// `origin = "center"` or `origin = [x, y]` (texels from the top-left).
#[derive(Debug, Copy, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OriginDef {
    Named(OriginName),
    Point([f32; 2]),
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OriginName {
    TopLeft,
    Center,
}

impl Default for OriginDef {
    fn default() -> Self {
        OriginDef::Named(OriginName::TopLeft)
    }
}

impl From<OriginDef> for Origin {
    fn from(def: OriginDef) -> Self {
        match def {
            OriginDef::Named(OriginName::TopLeft) => Origin::TopLeft(0.0, 0.0),
            OriginDef::Named(OriginName::Center) => Origin::Center,
            OriginDef::Point([x, y]) => Origin::TopLeft(x, y),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlipName {
    #[default]
    None,
    Horizontal,
    Vertical,
    Both,
}

impl From<FlipName> for Flip {
    fn from(name: FlipName) -> Self {
        match name {
            FlipName::None => Flip::None,
            FlipName::Horizontal => Flip::Horizontal,
            FlipName::Vertical => Flip::Vertical,
            FlipName::Both => Flip::Both,
        }
    }
}

/// A sprite showing an image or noise layer, or a solid rectangle when
/// `image` is absent.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SpriteDef {
    pub image: Option<String>,
    /// Required for solid sprites.
    pub size: Option<[f32; 2]>,
    /// `[x, y, w, h]` in texels.
    pub crop: Option<[f32; 4]>,
    #[serde(default)]
    pub position: [f32; 2],
    #[serde(default)]
    pub origin: OriginDef,
    /// Degrees, clockwise.
    #[serde(default)]
    pub rotation: f32,
    #[serde(default)]
    pub rotation_origin: OriginDef,
    #[serde(default = "one")]
    pub scale: f32,
    #[serde(default)]
    pub flip: FlipName,
    #[serde(default)]
    pub effects: Vec<EffectName>,
    #[serde(default = "white")]
    pub color: [f32; 3],
    /// Noise layer sampled by the noise effect.
    pub noise: Option<String>,
    #[serde(default)]
    pub z: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TextDef {
    pub font: String,
    pub text: String,
    #[serde(default = "text_size")]
    pub size: f32,
    #[serde(default)]
    pub position: [f32; 2],
    pub max_width: Option<f32>,
    #[serde(default)]
    pub effects: Vec<EffectName>,
    #[serde(default = "white")]
    pub color: [f32; 3],
    pub noise: Option<String>,
    #[serde(default)]
    pub z: i32,
}

fn text_size() -> f32 {
    24.0
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostEffectName {
    #[default]
    None,
    Glow,
    Solid,
    WavyTint,
}

impl From<PostEffectName> for PostEffect {
    fn from(name: PostEffectName) -> Self {
        match name {
            PostEffectName::None => PostEffect::None,
            PostEffectName::Glow => PostEffect::Glow,
            PostEffectName::Solid => PostEffect::Solid,
            PostEffectName::WavyTint => PostEffect::WavyTint,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum PolicyName {
    CoverageCount,
    #[default]
    MaxAlpha,
}

impl From<PolicyName> for OutlinePolicy {
    fn from(name: PolicyName) -> Self {
        match name {
            PolicyName::CoverageCount => OutlinePolicy::CoverageCount,
            PolicyName::MaxAlpha => OutlinePolicy::MaxAlpha,
        }
    }
}

/// Post filter pass drawn after all sprites.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PostDef {
    /// Image or noise layer to filter.
    pub image: String,
    /// `[x, y, w, h]` in logical px; defaults to the image at the origin.
    pub dest: Option<[f32; 4]>,
    #[serde(default)]
    pub effect: PostEffectName,
    #[serde(default)]
    pub policy: PolicyName,
    #[serde(default)]
    pub outline_color: [f32; 4],
    #[serde(default)]
    pub outline_thickness: [f32; 2],
    #[serde(default)]
    pub background_color: [f32; 4],
    #[serde(default)]
    pub effect_color: [f32; 4],
    #[serde(default)]
    pub grayscale: bool,
}

pub const DEMO_SCENE: &str = r#"
size = [480, 320]
background = [0.06, 0.06, 0.09, 1.0]

[[noise]]
name = "clouds"
seed = 7

[[noise]]
name = "grain"
size = 128
cell = 8
seed = 42

[[sprite]]
size = [480, 320]
color = [0.12, 0.1, 0.2]
z = -1

[[sprite]]
size = [120, 120]
position = [90, 100]
origin = "center"
effects = ["glow"]

[[sprite]]
image = "clouds"
crop = [0, 0, 128, 128]
position = [240, 100]
origin = "center"
rotation = 20
rotation_origin = "center"
effects = ["noise", "border"]
color = [0.2, 0.5, 0.9]
noise = "grain"

[[sprite]]
image = "grain"
position = [330, 40]
scale = 0.75
flip = "both"
effects = ["border"]

[post]
image = "grain"
dest = [40, 190, 96, 96]
effect = "wavy_tint"
effect_color = [0.9, 0.3, 0.4, 1.0]
outline_color = [1.0, 1.0, 1.0, 1.0]
outline_thickness = [0.02, 0.02]
"#;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_scene_parses() {
        let scene = SceneFile::demo().unwrap();
        assert_eq!(scene.size, [480, 320]);
        assert_eq!(scene.noise.len(), 2);
        assert_eq!(scene.sprites.len(), 4);
        assert_eq!(scene.post.as_ref().unwrap().effect, PostEffectName::WavyTint);
    }

    #[test]
    fn empty_scene_uses_defaults() {
        let scene = SceneFile::parse("").unwrap();
        assert_eq!(scene.size, default_size());
        assert_eq!(scene.zoom, 1.0);
        assert!(scene.sprites.is_empty());
        assert!(scene.post.is_none());
    }

    #[test]
    fn sprite_fields_default() {
        let scene = SceneFile::parse("[[sprite]]\nsize = [4, 4]\n").unwrap();
        let sprite = &scene.sprites[0];
        assert_eq!(sprite.scale, 1.0);
        assert_eq!(sprite.color, [1.0, 1.0, 1.0]);
        assert_eq!(sprite.origin, OriginDef::Named(OriginName::TopLeft));
        assert_eq!(sprite.flip, FlipName::None);
    }

    #[test]
    fn origin_accepts_name_or_point() {
        let scene = SceneFile::parse("[[sprite]]\norigin = \"center\"\n[[sprite]]\norigin = [3, 4]\n").unwrap();
        assert_eq!(Origin::from(scene.sprites[0].origin), Origin::Center);
        assert_eq!(Origin::from(scene.sprites[1].origin), Origin::TopLeft(3.0, 4.0));
    }

    #[test]
    fn effects_combine_into_flags() {
        let flags = effect_flags(&[EffectName::Noise, EffectName::Border]);
        assert_eq!(flags, EffectFlags::NOISE | EffectFlags::BORDER);
        assert_eq!(effect_flags(&[]), EffectFlags::NONE);
    }

    #[test]
    fn unknown_effect_name_is_an_error() {
        assert!(SceneFile::parse("[[sprite]]\neffects = [\"sparkle\"]\n").is_err());
    }

    #[test]
    fn unknown_field_is_an_error() {
        assert!(SceneFile::parse("[[sprite]]\nsizee = [1, 1]\n").is_err());
    }
}
