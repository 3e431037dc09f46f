//! The resolved theme handed to rendering surfaces, and the compiled-in
//! default that acts as the resolution floor.
//!
//! A [`ResolvedTheme`] is flat and total: every property has a value. It is
//! never persisted and can always be re-derived from its inputs.

use std::sync::OnceLock;

use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_GRADIENT_ANGLE;
use crate::document::SurfaceSection;
use crate::tokens::TokenGroups;

// ---------------------------------------------------------------------------
// Value types shared by tokens and the resolved theme
// ---------------------------------------------------------------------------

/// Linear gradient background.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Gradient {
    #[serde(default = "default_gradient_angle")]
    pub angle: f32,
    /// Color stops, first to last. At least two.
    pub stops: Vec<String>,
}

fn default_gradient_angle() -> f32 {
    DEFAULT_GRADIENT_ANGLE
}

/// Media shown in the hero area.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "url", rename_all = "snake_case")]
pub enum HeroMedia {
    Image(String),
    Video(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavigationStyle {
    Tabs,
    Drawer,
    BottomBar,
}

impl NavigationStyle {
    /// Lenient parse used for legacy settings columns.
    pub fn from_legacy(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().replace(['-', ' '], "_").as_str() {
            "tabs" | "top_tabs" => Some(Self::Tabs),
            "drawer" | "sidebar" => Some(Self::Drawer),
            "bottom_bar" | "bottom" | "bottom_tabs" => Some(Self::BottomBar),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CardStyle {
    Flat,
    Elevated,
    Outlined,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StatusBarStyle {
    Light,
    Dark,
}

/// The tenant background. Exactly one mode is ever active.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum Background {
    Image { url: String },
    Gradient { angle: f32, stops: Vec<String> },
    Pattern { name: String },
    Solid { color: String },
}

/// Feature toggles for the rendered app and storefront.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Features {
    pub schedule: bool,
    pub speakers: bool,
    pub chat: bool,
    pub map: bool,
    pub qr_checkin: bool,
    pub sponsors: bool,
    pub shop: bool,
}

// ---------------------------------------------------------------------------
// Resolved theme
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedTheme {
    pub primary_color: String,
    pub secondary_color: String,
    pub accent_color: String,
    pub background_color: String,
    pub surface_color: String,
    pub text_color: String,
    pub muted_text_color: String,
    pub border_color: String,

    pub heading_font: String,
    pub body_font: String,
    pub base_font_size: f32,
    pub type_scale: f32,
    pub font_weights: Vec<u16>,

    pub spacing_unit: f32,
    pub corner_radius: f32,
    pub card_padding: f32,
    pub section_gap: f32,

    pub background: Background,

    pub hero_media: Option<HeroMedia>,
    pub hero_overlay_opacity: f32,
    pub hero_headline: Option<String>,
    pub logo_url: Option<String>,

    pub navigation: NavigationStyle,
    pub card_style: CardStyle,
    pub section_order: Vec<String>,

    pub features: Features,

    /// Mobile launch screen color.
    pub splash_color: String,
    pub status_bar: StatusBarStyle,
}

impl Default for ResolvedTheme {
    fn default() -> Self {
        Self {
            primary_color: "#4f46e5".into(),
            secondary_color: "#0ea5e9".into(),
            accent_color: "#f59e0b".into(),
            background_color: "#ffffff".into(),
            surface_color: "#f8fafc".into(),
            text_color: "#0f172a".into(),
            muted_text_color: "#64748b".into(),
            border_color: "#e2e8f0".into(),
            heading_font: "Inter".into(),
            body_font: "Inter".into(),
            base_font_size: 16.0,
            type_scale: 1.25,
            font_weights: vec![400, 600, 700],
            spacing_unit: 4.0,
            corner_radius: 8.0,
            card_padding: 16.0,
            section_gap: 24.0,
            background: Background::Solid {
                color: "#ffffff".into(),
            },
            hero_media: None,
            hero_overlay_opacity: 0.4,
            hero_headline: None,
            logo_url: None,
            navigation: NavigationStyle::BottomBar,
            card_style: CardStyle::Elevated,
            section_order: vec![
                "schedule".into(),
                "speakers".into(),
                "sponsors".into(),
            ],
            features: Features {
                schedule: true,
                speakers: true,
                chat: false,
                map: false,
                qr_checkin: false,
                sponsors: true,
                shop: false,
            },
            splash_color: "#4f46e5".into(),
            status_bar: StatusBarStyle::Dark,
        }
    }
}

static DEFAULT_THEME: OnceLock<ResolvedTheme> = OnceLock::new();

/// The compiled-in default theme.
pub fn default_theme() -> &'static ResolvedTheme {
    DEFAULT_THEME.get_or_init(ResolvedTheme::default)
}

impl ResolvedTheme {
    /// Flatten merged tokens onto `defaults`. Every field the tokens leave
    /// unset takes the default's value.
    pub fn from_layers(
        defaults: &ResolvedTheme,
        tokens: TokenGroups,
        surface: &SurfaceSection,
    ) -> Self {
        let TokenGroups {
            colors,
            typography,
            spacing,
            background,
            hero,
            brand,
            layout,
            features,
        } = tokens;

        let background_color = colors
            .background
            .unwrap_or_else(|| defaults.background_color.clone());

        let background = match background.pick() {
            Some(picked) => picked,
            // With no mode named anywhere the default solid follows the
            // resolved background color.
            None => match &defaults.background {
                Background::Solid { .. } => Background::Solid {
                    color: background_color.clone(),
                },
                other => other.clone(),
            },
        };

        Self {
            primary_color: colors.primary.unwrap_or_else(|| defaults.primary_color.clone()),
            secondary_color: colors
                .secondary
                .unwrap_or_else(|| defaults.secondary_color.clone()),
            accent_color: colors.accent.unwrap_or_else(|| defaults.accent_color.clone()),
            background_color,
            surface_color: colors.surface.unwrap_or_else(|| defaults.surface_color.clone()),
            text_color: colors.text.unwrap_or_else(|| defaults.text_color.clone()),
            muted_text_color: colors
                .muted_text
                .unwrap_or_else(|| defaults.muted_text_color.clone()),
            border_color: colors.border.unwrap_or_else(|| defaults.border_color.clone()),

            heading_font: typography
                .heading_font
                .unwrap_or_else(|| defaults.heading_font.clone()),
            body_font: typography
                .body_font
                .unwrap_or_else(|| defaults.body_font.clone()),
            base_font_size: typography.base_size.unwrap_or(defaults.base_font_size),
            type_scale: typography.scale.unwrap_or(defaults.type_scale),
            font_weights: typography
                .weights
                .unwrap_or_else(|| defaults.font_weights.clone()),

            spacing_unit: spacing.unit.unwrap_or(defaults.spacing_unit),
            corner_radius: spacing.radius.unwrap_or(defaults.corner_radius),
            card_padding: spacing.card_padding.unwrap_or(defaults.card_padding),
            section_gap: spacing.section_gap.unwrap_or(defaults.section_gap),

            background,

            hero_media: hero.media.or_else(|| defaults.hero_media.clone()),
            hero_overlay_opacity: hero.overlay_opacity.unwrap_or(defaults.hero_overlay_opacity),
            hero_headline: hero.headline.or_else(|| defaults.hero_headline.clone()),
            logo_url: brand.logo_url.or_else(|| defaults.logo_url.clone()),

            navigation: layout.navigation.unwrap_or(defaults.navigation),
            card_style: layout.card_style.unwrap_or(defaults.card_style),
            section_order: layout
                .section_order
                .unwrap_or_else(|| defaults.section_order.clone()),

            features: Features {
                schedule: features.schedule.unwrap_or(defaults.features.schedule),
                speakers: features.speakers.unwrap_or(defaults.features.speakers),
                chat: features.chat.unwrap_or(defaults.features.chat),
                map: features.map.unwrap_or(defaults.features.map),
                qr_checkin: features.qr_checkin.unwrap_or(defaults.features.qr_checkin),
                sponsors: features.sponsors.unwrap_or(defaults.features.sponsors),
                shop: features.shop.unwrap_or(defaults.features.shop),
            },

            splash_color: surface
                .splash_color
                .clone()
                .unwrap_or_else(|| defaults.splash_color.clone()),
            status_bar: surface.status_bar.unwrap_or(defaults.status_bar),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_theme_is_stable() {
        assert_eq!(default_theme(), &ResolvedTheme::default());
        assert!(std::ptr::eq(default_theme(), default_theme()));
    }

    #[test]
    fn navigation_from_legacy_values() {
        assert_eq!(
            NavigationStyle::from_legacy("Bottom-Bar"),
            Some(NavigationStyle::BottomBar)
        );
        assert_eq!(NavigationStyle::from_legacy("sidebar"), Some(NavigationStyle::Drawer));
        assert_eq!(NavigationStyle::from_legacy("carousel"), None);
    }

    #[test]
    fn background_serializes_with_mode_tag() {
        let bg = Background::Pattern {
            name: "dots".into(),
        };
        let json = serde_json::to_value(&bg).unwrap();
        assert_eq!(json["mode"], "pattern");
        assert_eq!(json["name"], "dots");
    }
}
