//! Flat per-tenant settings that predate token documents.
//!
//! Read-only input to resolution: the lowest tier above the compiled default.

use serde::{Deserialize, Serialize};

use crate::error::Diagnostic;
use crate::theme::{HeroMedia, NavigationStyle};
use crate::tokens::{is_valid_color, TokenGroups};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LegacyFields {
    pub primary_color: Option<String>,
    pub secondary_color: Option<String>,
    pub accent_color: Option<String>,
    pub background_color: Option<String>,
    pub text_color: Option<String>,
    pub font_family: Option<String>,
    pub heading_font: Option<String>,
    pub background_image_url: Option<String>,
    pub background_pattern: Option<String>,
    pub hero_image_url: Option<String>,
    pub hero_video_url: Option<String>,
    pub logo_url: Option<String>,
    pub navigation_style: Option<String>,
    pub enable_chat: Option<bool>,
    pub enable_map: Option<bool>,
    pub enable_qr_checkin: Option<bool>,
}

fn legacy_text(value: &Option<String>) -> Option<String> {
    value
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

fn legacy_color(value: &Option<String>, column: &str, diags: &mut Vec<Diagnostic>) -> Option<String> {
    let raw = legacy_text(value)?;
    if is_valid_color(&raw) {
        Some(raw)
    } else {
        diags.push(Diagnostic::new(
            format!("legacy.{column}"),
            format!("invalid color {raw:?}"),
        ));
        None
    }
}

impl LegacyFields {
    /// Map the flat columns onto token groups.
    ///
    /// `font_family` feeds the body font and, when `heading_font` is unset,
    /// the heading font too. An image background wins over a pattern, and a
    /// hero image wins over a hero video.
    pub fn to_tokens(&self, diags: &mut Vec<Diagnostic>) -> TokenGroups {
        let mut tokens = TokenGroups::default();

        tokens.colors.primary = legacy_color(&self.primary_color, "primary_color", diags);
        tokens.colors.secondary = legacy_color(&self.secondary_color, "secondary_color", diags);
        tokens.colors.accent = legacy_color(&self.accent_color, "accent_color", diags);
        tokens.colors.background =
            legacy_color(&self.background_color, "background_color", diags);
        tokens.colors.text = legacy_color(&self.text_color, "text_color", diags);

        tokens.typography.body_font = legacy_text(&self.font_family);
        tokens.typography.heading_font =
            legacy_text(&self.heading_font).or_else(|| tokens.typography.body_font.clone());

        if let Some(url) = legacy_text(&self.background_image_url) {
            tokens.background.image = Some(url);
        } else if let Some(pattern) = legacy_text(&self.background_pattern) {
            tokens.background.pattern = Some(pattern);
        }

        tokens.hero.media = legacy_text(&self.hero_image_url)
            .map(HeroMedia::Image)
            .or_else(|| legacy_text(&self.hero_video_url).map(HeroMedia::Video));

        tokens.brand.logo_url = legacy_text(&self.logo_url);

        if let Some(raw) = legacy_text(&self.navigation_style) {
            tokens.layout.navigation = NavigationStyle::from_legacy(&raw);
            if tokens.layout.navigation.is_none() {
                diags.push(Diagnostic::new(
                    "legacy.navigation_style",
                    format!("unknown navigation style {raw:?}"),
                ));
            }
        }

        tokens.features.chat = self.enable_chat;
        tokens.features.map = self.enable_map;
        tokens.features.qr_checkin = self.enable_qr_checkin;

        tokens
    }
}
