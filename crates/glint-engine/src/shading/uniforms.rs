//! Binding-point names shared by the WGSL sources and host code.
//!
//! The names and the attribute numbering are fixed; hosts match on them.

use core::fmt;

use super::sources::TEXTURE_UNITS;

#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
pub enum UniformName {
    OutlineThickness,
    OutlineColor,
    BackgroundColor,
    EffectColor,
    Img,
    Image,
    TextureRgba,
    TextureGray,
    /// `texture0` ..= `texture9`.
    TextureUnit(u8),
    Effect,
    T,
    IsGrayscale,
    View,
    Model,
}

impl UniformName {
    pub const ALL_FIXED: [UniformName; 13] = [
        UniformName::OutlineThickness,
        UniformName::OutlineColor,
        UniformName::BackgroundColor,
        UniformName::EffectColor,
        UniformName::Img,
        UniformName::Image,
        UniformName::TextureRgba,
        UniformName::TextureGray,
        UniformName::Effect,
        UniformName::T,
        UniformName::IsGrayscale,
        UniformName::View,
        UniformName::Model,
    ];

    /// `None` for a texture unit past `texture9`.
    pub fn as_str(self) -> Option<&'static str> {
        const UNITS: [&str; TEXTURE_UNITS] = [
            "texture0", "texture1", "texture2", "texture3", "texture4",
            "texture5", "texture6", "texture7", "texture8", "texture9",
        ];
        Some(match self {
            UniformName::OutlineThickness => "outline_thickness",
            UniformName::OutlineColor => "outline_color",
            UniformName::BackgroundColor => "background_color",
            UniformName::EffectColor => "effect_color",
            UniformName::Img => "img",
            UniformName::Image => "image",
            UniformName::TextureRgba => "texture_rgba",
            UniformName::TextureGray => "texture_gray",
            UniformName::TextureUnit(i) => return UNITS.get(i as usize).copied(),
            UniformName::Effect => "effect",
            UniformName::T => "t",
            UniformName::IsGrayscale => "is_grayscale",
            UniformName::View => "view",
            UniformName::Model => "model",
        })
    }

    pub fn parse(name: &str) -> Option<UniformName> {
        if let Some(n) = name.strip_prefix("texture").and_then(|d| d.parse::<u8>().ok()) {
            // Only the spelling `as_str` produces: no sign, no leading zeros.
            let unit = UniformName::TextureUnit(n);
            return (unit.as_str() == Some(name)).then_some(unit);
        }
        UniformName::ALL_FIXED.into_iter().find(|u| u.as_str() == Some(name))
    }
}

impl fmt::Display for UniformName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(s) => f.write_str(s),
            None => write!(f, "<invalid {self:?}>"),
        }
    }
}

/// Sprite vertex attribute locations.
#[derive(Debug, Copy, Clone, Eq, PartialEq, Hash)]
#[repr(u32)]
pub enum AttributeLocation {
    Pos = 0,
    Crop = 1,
    Translation = 2,
    Scale = 3,
    Pivot = 4,
    Rotation = 5,
    Kind = 6,
    Layer = 7,
    SecondaryLayer = 8,
    Effect = 9,
    EffectColor = 10,
}

impl AttributeLocation {
    pub const ALL: [AttributeLocation; 11] = [
        AttributeLocation::Pos,
        AttributeLocation::Crop,
        AttributeLocation::Translation,
        AttributeLocation::Scale,
        AttributeLocation::Pivot,
        AttributeLocation::Rotation,
        AttributeLocation::Kind,
        AttributeLocation::Layer,
        AttributeLocation::SecondaryLayer,
        AttributeLocation::Effect,
        AttributeLocation::EffectColor,
    ];

    #[inline]
    pub const fn location(self) -> u32 {
        self as u32
    }

    pub const fn name(self) -> &'static str {
        match self {
            AttributeLocation::Pos => "pos",
            AttributeLocation::Crop => "crop",
            AttributeLocation::Translation => "translation",
            AttributeLocation::Scale => "scale",
            AttributeLocation::Pivot => "pivot",
            AttributeLocation::Rotation => "rotation",
            AttributeLocation::Kind => "kind",
            AttributeLocation::Layer => "layer",
            AttributeLocation::SecondaryLayer => "secondary_layer",
            AttributeLocation::Effect => "effect",
            AttributeLocation::EffectColor => "effect_color",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shading::vertex::SpriteInstance;

    #[test]
    fn names_round_trip() {
        for u in UniformName::ALL_FIXED {
            assert_eq!(UniformName::parse(u.as_str().unwrap()), Some(u));
        }
        assert_eq!(UniformName::parse("texture7"), Some(UniformName::TextureUnit(7)));
        assert_eq!(UniformName::parse("texture10"), None);
        assert_eq!(UniformName::TextureUnit(10).as_str(), None);
    }

    #[test]
    fn unit_names_must_be_canonical() {
        for name in ["texture07", "texture+7", "texture007", "texture", "texture 7"] {
            assert_eq!(UniformName::parse(name), None, "{name}");
        }
        assert_eq!(UniformName::parse("texture0"), Some(UniformName::TextureUnit(0)));
    }

    #[test]
    fn instance_layout_uses_locations_one_to_ten() {
        let layout = SpriteInstance::layout();
        let locations: Vec<u32> = layout.attributes.iter().map(|a| a.shader_location).collect();
        let expected: Vec<u32> = AttributeLocation::ALL[1..].iter().map(|a| a.location()).collect();
        assert_eq!(locations, expected);
    }

    #[test]
    fn locations_are_dense() {
        for (i, a) in AttributeLocation::ALL.iter().enumerate() {
            assert_eq!(a.location(), i as u32);
        }
    }

    #[test]
    fn wgsl_sources_declare_the_shared_names() {
        let batch = include_str!("../render/sprites/shaders/sprite_batch.wgsl");
        for a in AttributeLocation::ALL {
            assert!(batch.contains(&format!("@location({}) {}", a.location(), a.name())), "{}", a.name());
        }
        for u in [UniformName::TextureRgba, UniformName::TextureGray, UniformName::View, UniformName::T] {
            assert!(batch.contains(u.as_str().unwrap()), "{u}");
        }

        let post = include_str!("../render/sprites/shaders/post_filter.wgsl");
        for u in [
            UniformName::OutlineThickness,
            UniformName::OutlineColor,
            UniformName::BackgroundColor,
            UniformName::EffectColor,
            UniformName::Img,
            UniformName::IsGrayscale,
            UniformName::Model,
        ] {
            assert!(post.contains(u.as_str().unwrap()), "{u}");
        }

        let multi = include_str!("../render/sprites/shaders/multi_texture.wgsl");
        for i in 0..TEXTURE_UNITS as u8 {
            assert!(multi.contains(UniformName::TextureUnit(i).as_str().unwrap()));
        }
    }
}
