//! Built-in brand presets offered by the builder.
//!
//! Applying a template overwrites the brand and layout groups of a draft
//! (colors, typography, spacing, background, layout). Overview details,
//! feature toggles, hero media, the logo and surface sections are left
//! alone.

use crate::document::DocumentBody;
use crate::theme::{Background, CardStyle, NavigationStyle};
use crate::tokens::{
    BackgroundTokens, ColorTokens, LayoutTokens, SpacingTokens, TokenGroups, TypographyTokens,
};

#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    pub id: &'static str,
    pub name: &'static str,
    pub tokens: TokenGroups,
}

impl Template {
    pub fn apply(&self, body: &mut DocumentBody) {
        body.tokens.colors = self.tokens.colors.clone();
        body.tokens.typography = self.tokens.typography.clone();
        body.tokens.spacing = self.tokens.spacing.clone();
        body.tokens.background = self.tokens.background.clone();
        body.tokens.layout = self.tokens.layout.clone();
    }
}

fn colors(primary: &str, secondary: &str, accent: &str, background: &str, text: &str) -> ColorTokens {
    ColorTokens {
        primary: Some(primary.into()),
        secondary: Some(secondary.into()),
        accent: Some(accent.into()),
        background: Some(background.into()),
        text: Some(text.into()),
        ..Default::default()
    }
}

fn fonts(heading: &str, body: &str) -> TypographyTokens {
    TypographyTokens {
        heading_font: Some(heading.into()),
        body_font: Some(body.into()),
        ..Default::default()
    }
}

fn background(bg: Background) -> BackgroundTokens {
    let mut tokens = BackgroundTokens::default();
    tokens.set(Some(bg));
    tokens
}

fn layout(navigation: NavigationStyle, card_style: CardStyle) -> LayoutTokens {
    LayoutTokens {
        navigation: Some(navigation),
        card_style: Some(card_style),
        section_order: None,
    }
}

/// All presets, in display order.
pub fn builtin_templates() -> Vec<Template> {
    vec![
        Template {
            id: "midnight",
            name: "Midnight",
            tokens: TokenGroups {
                colors: colors("#818cf8", "#22d3ee", "#f472b6", "#0b1020", "#e2e8f0"),
                typography: fonts("Space Grotesk", "Inter"),
                spacing: SpacingTokens {
                    radius: Some(12.0),
                    ..Default::default()
                },
                background: background(Background::Gradient {
                    angle: 160.0,
                    stops: vec!["#0b1020".into(), "#1e1b4b".into()],
                }),
                layout: layout(NavigationStyle::BottomBar, CardStyle::Elevated),
                ..Default::default()
            },
        },
        Template {
            id: "sunrise",
            name: "Sunrise",
            tokens: TokenGroups {
                colors: colors("#f97316", "#facc15", "#db2777", "#fff7ed", "#431407"),
                typography: fonts("Playfair Display", "Source Sans 3"),
                spacing: SpacingTokens {
                    radius: Some(16.0),
                    ..Default::default()
                },
                background: background(Background::Pattern {
                    name: "waves".into(),
                }),
                layout: layout(NavigationStyle::Tabs, CardStyle::Elevated),
                ..Default::default()
            },
        },
        Template {
            id: "minimal",
            name: "Minimal",
            tokens: TokenGroups {
                colors: colors("#111827", "#6b7280", "#2563eb", "#ffffff", "#111827"),
                typography: fonts("Inter", "Inter"),
                spacing: SpacingTokens {
                    radius: Some(4.0),
                    ..Default::default()
                },
                background: background(Background::Solid {
                    color: "#ffffff".into(),
                }),
                layout: layout(NavigationStyle::Tabs, CardStyle::Outlined),
                ..Default::default()
            },
        },
        Template {
            id: "forest",
            name: "Forest",
            tokens: TokenGroups {
                colors: colors("#15803d", "#a3e635", "#ca8a04", "#f0fdf4", "#052e16"),
                typography: fonts("Merriweather", "Nunito"),
                spacing: SpacingTokens::default(),
                background: background(Background::Pattern {
                    name: "leaves".into(),
                }),
                layout: layout(NavigationStyle::Drawer, CardStyle::Flat),
                ..Default::default()
            },
        },
    ]
}

pub fn template_by_id(id: &str) -> Option<Template> {
    builtin_templates().into_iter().find(|t| t.id == id)
}
