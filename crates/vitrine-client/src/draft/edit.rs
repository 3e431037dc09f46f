//! Field edits a builder session can apply to its draft.

use serde::{Deserialize, Serialize};
use tracing::debug;

use vitrine_shared::tokens::{ColorTokens, FeatureTokens};
use vitrine_shared::{Background, CardStyle, DocumentBody, HeroMedia, NavigationStyle, Surface};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverviewField {
    Name,
    Tagline,
    Description,
    Venue,
    ContactEmail,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ColorRole {
    Primary,
    Secondary,
    Accent,
    Background,
    Surface,
    Text,
    MutedText,
    Border,
}

impl ColorRole {
    fn slot(self, colors: &mut ColorTokens) -> &mut Option<String> {
        match self {
            ColorRole::Primary => &mut colors.primary,
            ColorRole::Secondary => &mut colors.secondary,
            ColorRole::Accent => &mut colors.accent,
            ColorRole::Background => &mut colors.background,
            ColorRole::Surface => &mut colors.surface,
            ColorRole::Text => &mut colors.text,
            ColorRole::MutedText => &mut colors.muted_text,
            ColorRole::Border => &mut colors.border,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FontRole {
    Heading,
    Body,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Feature {
    Schedule,
    Speakers,
    Chat,
    Map,
    QrCheckin,
    Sponsors,
    Shop,
}

impl Feature {
    fn slot(self, features: &mut FeatureTokens) -> &mut Option<bool> {
        match self {
            Feature::Schedule => &mut features.schedule,
            Feature::Speakers => &mut features.speakers,
            Feature::Chat => &mut features.chat,
            Feature::Map => &mut features.map,
            Feature::QrCheckin => &mut features.qr_checkin,
            Feature::Sponsors => &mut features.sponsors,
            Feature::Shop => &mut features.shop,
        }
    }
}

/// A single change to the draft. `None` clears the field so that it falls
/// back to legacy settings or the default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "field", content = "value", rename_all = "snake_case")]
pub enum Edit {
    Overview(OverviewField, Option<String>),
    Color(ColorRole, Option<String>),
    /// Color override for one surface. Storefront has no override section.
    SurfaceColor(Surface, ColorRole, Option<String>),
    SplashColor(Option<String>),
    Font(FontRole, Option<String>),
    /// Selecting a mode clears every other mode.
    Background(Option<Background>),
    HeroMedia(Option<HeroMedia>),
    HeroHeadline(Option<String>),
    Logo(Option<String>),
    Navigation(Option<NavigationStyle>),
    CardStyle(Option<CardStyle>),
    SectionOrder(Option<Vec<String>>),
    Feature(Feature, Option<bool>),
}

impl Edit {
    pub fn apply(self, body: &mut DocumentBody) {
        match self {
            Edit::Overview(field, value) => {
                let overview = &mut body.overview;
                let slot = match field {
                    OverviewField::Name => &mut overview.name,
                    OverviewField::Tagline => &mut overview.tagline,
                    OverviewField::Description => &mut overview.description,
                    OverviewField::Venue => &mut overview.venue,
                    OverviewField::ContactEmail => &mut overview.contact_email,
                };
                *slot = value;
            }
            Edit::Color(role, value) => *role.slot(&mut body.tokens.colors) = value,
            Edit::SurfaceColor(surface, role, value) => match body.section_mut(surface) {
                Some(section) => *role.slot(&mut section.tokens.colors) = value,
                None => debug!(%surface, "Surface has no override section, edit ignored"),
            },
            Edit::SplashColor(value) => body.mobile.splash_color = value,
            Edit::Font(FontRole::Heading, value) => body.tokens.typography.heading_font = value,
            Edit::Font(FontRole::Body, value) => body.tokens.typography.body_font = value,
            Edit::Background(value) => body.tokens.background.set(value),
            Edit::HeroMedia(value) => body.tokens.hero.media = value,
            Edit::HeroHeadline(value) => body.tokens.hero.headline = value,
            Edit::Logo(value) => body.tokens.brand.logo_url = value,
            Edit::Navigation(value) => body.tokens.layout.navigation = value,
            Edit::CardStyle(value) => body.tokens.layout.card_style = value,
            Edit::SectionOrder(value) => body.tokens.layout.section_order = value,
            Edit::Feature(feature, value) => *feature.slot(&mut body.tokens.features) = value,
        }
    }
}
