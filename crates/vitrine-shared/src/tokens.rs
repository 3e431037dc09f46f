//! Design token groups.
//!
//! Every token is optional: a group only carries what one configuration
//! source actually specifies. Sources are layered with [`Overlay`], which is
//! the typed form of a recursive deep merge:
//!
//! - a present value in the higher source wins,
//! - an absent value falls through to the lower source,
//! - arrays are replaced wholesale, never concatenated or merged by index,
//! - the background group is replaced as a unit (its modes are mutually
//!   exclusive).
//!
//! Groups are read from JSON leniently: each leaf is parsed on its own and
//! a leaf with the wrong shape is dropped with a [`Diagnostic`] instead of
//! failing the whole document.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::Diagnostic;
use crate::theme::{Background, CardStyle, Gradient, HeroMedia, NavigationStyle};

pub(crate) type Object = Map<String, Value>;

/// Layering of two partial configurations.
pub trait Overlay: Sized {
    /// Returns `self` with `higher` layered on top.
    fn overlay(self, higher: Self) -> Self;
}

// ---------------------------------------------------------------------------
// Leaf readers
// ---------------------------------------------------------------------------

pub(crate) fn join(path: &str, key: &str) -> String {
    if path.is_empty() {
        key.to_string()
    } else {
        format!("{path}.{key}")
    }
}

fn kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// `null` counts as absent so that a cleared field falls through.
fn present<'v>(obj: &'v Object, key: &str) -> Option<&'v Value> {
    obj.get(key).filter(|v| !v.is_null())
}

/// Accepts `#rgb`, `#rrggbb` and `#rrggbbaa`.
pub fn is_valid_color(value: &str) -> bool {
    let Some(hex) = value.strip_prefix('#') else {
        return false;
    };
    matches!(hex.len(), 3 | 6 | 8) && hex.chars().all(|c| c.is_ascii_hexdigit())
}

pub(crate) fn text(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<String> {
    match present(obj, key)? {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        other => {
            diags.push(Diagnostic::new(
                join(path, key),
                format!("expected string, found {}", kind(other)),
            ));
            None
        }
    }
}

pub(crate) fn color(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<String> {
    let raw = text(obj, key, path, diags)?;
    if is_valid_color(&raw) {
        Some(raw)
    } else {
        diags.push(Diagnostic::new(join(path, key), format!("invalid color {raw:?}")));
        None
    }
}

fn number(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<f32> {
    match present(obj, key)? {
        Value::Number(n) => match n.as_f64().map(|v| v as f32) {
            // Narrowed first: anything beyond f32::MAX becomes infinite.
            Some(v) if v.is_finite() => Some(v),
            _ => {
                diags.push(Diagnostic::new(join(path, key), "number out of range"));
                None
            }
        },
        other => {
            diags.push(Diagnostic::new(
                join(path, key),
                format!("expected number, found {}", kind(other)),
            ));
            None
        }
    }
}

fn bounded(
    obj: &Object,
    key: &str,
    path: &str,
    diags: &mut Vec<Diagnostic>,
    accept: fn(f32) -> bool,
    expectation: &str,
) -> Option<f32> {
    let value = number(obj, key, path, diags)?;
    if accept(value) {
        Some(value)
    } else {
        diags.push(Diagnostic::new(
            join(path, key),
            format!("{value} is not {expectation}"),
        ));
        None
    }
}

/// Strictly positive number (font sizes, scale factors).
fn size(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<f32> {
    bounded(obj, key, path, diags, |v| v > 0.0, "positive")
}

/// Non-negative number (spacing, radii).
fn length(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<f32> {
    bounded(obj, key, path, diags, |v| v >= 0.0, "non-negative")
}

fn opacity(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<f32> {
    bounded(obj, key, path, diags, |v| (0.0..=1.0).contains(&v), "within 0..=1")
}

fn flag(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<bool> {
    match present(obj, key)? {
        Value::Bool(b) => Some(*b),
        other => {
            diags.push(Diagnostic::new(
                join(path, key),
                format!("expected boolean, found {}", kind(other)),
            ));
            None
        }
    }
}

/// Any serde-described value (enums, arrays).
pub(crate) fn value<T: DeserializeOwned>(
    obj: &Object,
    key: &str,
    path: &str,
    diags: &mut Vec<Diagnostic>,
) -> Option<T> {
    let raw = present(obj, key)?;
    match serde_json::from_value(raw.clone()) {
        Ok(v) => Some(v),
        Err(e) => {
            diags.push(Diagnostic::new(join(path, key), e.to_string()));
            None
        }
    }
}

fn gradient(obj: &Object, key: &str, path: &str, diags: &mut Vec<Diagnostic>) -> Option<Gradient> {
    let gradient: Gradient = value(obj, key, path, diags)?;
    if !gradient.angle.is_finite() {
        diags.push(Diagnostic::new(join(path, key), "gradient angle is not finite"));
        return None;
    }
    if gradient.stops.len() < 2 {
        diags.push(Diagnostic::new(join(path, key), "gradient needs at least two stops"));
        return None;
    }
    if let Some(bad) = gradient.stops.iter().find(|s| !is_valid_color(s)) {
        diags.push(Diagnostic::new(
            join(path, key),
            format!("invalid gradient stop {bad:?}"),
        ));
        return None;
    }
    Some(gradient)
}

/// Reads a nested group. A non-object value is dropped as a whole.
pub(crate) fn group<T: Default>(
    obj: &Object,
    key: &str,
    path: &str,
    diags: &mut Vec<Diagnostic>,
    parse: fn(&Object, &str, &mut Vec<Diagnostic>) -> T,
) -> T {
    match present(obj, key) {
        None => T::default(),
        Some(Value::Object(inner)) => parse(inner, &join(path, key), diags),
        Some(other) => {
            diags.push(Diagnostic::new(
                join(path, key),
                format!("expected object, found {}", kind(other)),
            ));
            T::default()
        }
    }
}

// ---------------------------------------------------------------------------
// Groups
// ---------------------------------------------------------------------------

/// Declares a flat token group: every field is `Option<T>`, the overlay is
/// field-wise and each field is read with the named leaf reader.
macro_rules! token_group {
    (
        $(#[$meta:meta])*
        pub struct $name:ident {
            $( $(#[$fmeta:meta])* $field:ident: $ty:ty => $reader:ident, )*
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
        #[serde(default)]
        pub struct $name {
            $( $(#[$fmeta])* pub $field: Option<$ty>, )*
        }

        impl Overlay for $name {
            fn overlay(self, higher: Self) -> Self {
                Self {
                    $( $field: higher.$field.or(self.$field), )*
                }
            }
        }

        impl $name {
            pub(crate) fn parse(obj: &Object, path: &str, diags: &mut Vec<Diagnostic>) -> Self {
                Self {
                    $( $field: $reader(obj, stringify!($field), path, diags), )*
                }
            }

            /// Whether no token of this group is set.
            pub fn is_empty(&self) -> bool {
                true $( && self.$field.is_none() )*
            }
        }
    };
}

pub(crate) use token_group;

token_group! {
    /// Semantic colors.
    pub struct ColorTokens {
        primary: String => color,
        secondary: String => color,
        accent: String => color,
        background: String => color,
        surface: String => color,
        text: String => color,
        muted_text: String => color,
        border: String => color,
    }
}

token_group! {
    pub struct TypographyTokens {
        heading_font: String => text,
        body_font: String => text,
        base_size: f32 => size,
        scale: f32 => size,
        /// Replaced wholesale when overlaid.
        weights: Vec<u16> => value,
    }
}

token_group! {
    pub struct SpacingTokens {
        unit: f32 => length,
        radius: f32 => length,
        card_padding: f32 => length,
        section_gap: f32 => length,
    }
}

token_group! {
    pub struct HeroTokens {
        media: HeroMedia => value,
        overlay_opacity: f32 => opacity,
        headline: String => text,
    }
}

token_group! {
    pub struct BrandTokens {
        logo_url: String => text,
    }
}

token_group! {
    pub struct LayoutTokens {
        navigation: NavigationStyle => value,
        card_style: CardStyle => value,
        /// Replaced wholesale when overlaid.
        section_order: Vec<String> => value,
    }
}

token_group! {
    pub struct FeatureTokens {
        schedule: bool => flag,
        speakers: bool => flag,
        chat: bool => flag,
        map: bool => flag,
        qr_checkin: bool => flag,
        sponsors: bool => flag,
        shop: bool => flag,
    }
}

/// Background modes. Writers keep at most one mode set; readers pick the
/// first set mode in the order image, gradient, pattern, solid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BackgroundTokens {
    pub image: Option<String>,
    pub gradient: Option<Gradient>,
    pub pattern: Option<String>,
    pub solid: Option<String>,
}

impl BackgroundTokens {
    pub(crate) fn parse(obj: &Object, path: &str, diags: &mut Vec<Diagnostic>) -> Self {
        Self {
            image: text(obj, "image", path, diags),
            gradient: gradient(obj, "gradient", path, diags),
            pattern: text(obj, "pattern", path, diags),
            solid: color(obj, "solid", path, diags),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.image.is_none()
            && self.gradient.is_none()
            && self.pattern.is_none()
            && self.solid.is_none()
    }

    /// Set exactly one mode, clearing the others. `None` clears all modes.
    pub fn set(&mut self, background: Option<Background>) {
        *self = Self::default();
        match background {
            Some(Background::Image { url }) => self.image = Some(url),
            Some(Background::Gradient { angle, stops }) => {
                self.gradient = Some(Gradient { angle, stops })
            }
            Some(Background::Pattern { name }) => self.pattern = Some(name),
            Some(Background::Solid { color }) => self.solid = Some(color),
            None => {}
        }
    }

    /// First-match selection.
    pub fn pick(&self) -> Option<Background> {
        if let Some(url) = &self.image {
            return Some(Background::Image { url: url.clone() });
        }
        if let Some(g) = &self.gradient {
            return Some(Background::Gradient {
                angle: g.angle,
                stops: g.stops.clone(),
            });
        }
        if let Some(name) = &self.pattern {
            return Some(Background::Pattern { name: name.clone() });
        }
        self.solid
            .as_ref()
            .map(|color| Background::Solid { color: color.clone() })
    }
}

impl Overlay for BackgroundTokens {
    fn overlay(self, higher: Self) -> Self {
        if higher.is_empty() {
            self
        } else {
            higher
        }
    }
}

/// All token groups of one configuration source.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenGroups {
    pub colors: ColorTokens,
    pub typography: TypographyTokens,
    pub spacing: SpacingTokens,
    pub background: BackgroundTokens,
    pub hero: HeroTokens,
    pub brand: BrandTokens,
    pub layout: LayoutTokens,
    pub features: FeatureTokens,
}

impl TokenGroups {
    /// Lenient read of the groups found directly under `obj`.
    pub fn parse(obj: &Object, path: &str, diags: &mut Vec<Diagnostic>) -> Self {
        Self {
            colors: group(obj, "colors", path, diags, ColorTokens::parse),
            typography: group(obj, "typography", path, diags, TypographyTokens::parse),
            spacing: group(obj, "spacing", path, diags, SpacingTokens::parse),
            background: group(obj, "background", path, diags, BackgroundTokens::parse),
            hero: group(obj, "hero", path, diags, HeroTokens::parse),
            brand: group(obj, "brand", path, diags, BrandTokens::parse),
            layout: group(obj, "layout", path, diags, LayoutTokens::parse),
            features: group(obj, "features", path, diags, FeatureTokens::parse),
        }
    }
}

impl Overlay for TokenGroups {
    fn overlay(self, higher: Self) -> Self {
        Self {
            colors: self.colors.overlay(higher.colors),
            typography: self.typography.overlay(higher.typography),
            spacing: self.spacing.overlay(higher.spacing),
            background: self.background.overlay(higher.background),
            hero: self.hero.overlay(higher.hero),
            brand: self.brand.overlay(higher.brand),
            layout: self.layout.overlay(higher.layout),
            features: self.features.overlay(higher.features),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn parse(value: Value) -> (TokenGroups, Vec<Diagnostic>) {
        let mut diags = Vec::new();
        let obj = value.as_object().cloned().unwrap_or_default();
        let groups = TokenGroups::parse(&obj, "", &mut diags);
        (groups, diags)
    }

    #[test]
    fn color_validation() {
        assert!(is_valid_color("#fff"));
        assert!(is_valid_color("#A1b2C3"));
        assert!(is_valid_color("#11223344"));
        assert!(!is_valid_color("fff"));
        assert!(!is_valid_color("#ggg"));
        assert!(!is_valid_color("#12345"));
    }

    #[test]
    fn overlay_present_wins_absent_falls_through() {
        let lower = ColorTokens {
            primary: Some("#111111".into()),
            accent: Some("#222222".into()),
            ..Default::default()
        };
        let higher = ColorTokens {
            primary: Some("#ff0000".into()),
            ..Default::default()
        };
        let merged = lower.overlay(higher);
        assert_eq!(merged.primary.as_deref(), Some("#ff0000"));
        assert_eq!(merged.accent.as_deref(), Some("#222222"));
        assert_eq!(merged.secondary, None);
    }

    #[test]
    fn overlay_replaces_arrays_wholesale() {
        let lower = TypographyTokens {
            weights: Some(vec![300, 400, 500, 700]),
            ..Default::default()
        };
        let higher = TypographyTokens {
            weights: Some(vec![600]),
            ..Default::default()
        };
        assert_eq!(lower.overlay(higher).weights, Some(vec![600]));
    }

    #[test]
    fn background_overlay_is_atomic() {
        let lower = BackgroundTokens {
            image: Some("https://cdn.example/bg.png".into()),
            ..Default::default()
        };
        let higher = BackgroundTokens {
            pattern: Some("dots".into()),
            ..Default::default()
        };
        let merged = lower.overlay(higher);
        assert_eq!(merged.image, None);
        assert_eq!(
            merged.pick(),
            Some(Background::Pattern {
                name: "dots".into()
            })
        );
    }

    #[test]
    fn background_set_clears_other_modes() {
        let mut bg = BackgroundTokens::default();
        bg.set(Some(Background::Pattern {
            name: "grid".into(),
        }));
        bg.set(Some(Background::Gradient {
            angle: 90.0,
            stops: vec!["#000000".into(), "#ffffff".into()],
        }));
        assert_eq!(bg.pattern, None);
        assert!(bg.gradient.is_some());

        bg.set(None);
        assert!(bg.is_empty());
    }

    #[test]
    fn background_pick_order() {
        let bg = BackgroundTokens {
            image: None,
            gradient: Some(Gradient {
                angle: 45.0,
                stops: vec!["#000".into(), "#fff".into()],
            }),
            pattern: Some("dots".into()),
            solid: Some("#123456".into()),
        };
        assert!(matches!(bg.pick(), Some(Background::Gradient { .. })));
    }

    #[test]
    fn lenient_parse_drops_only_bad_leaves() {
        let (groups, diags) = parse(json!({
            "colors": { "primary": "#ff0000", "secondary": "blue", "accent": 12 },
            "typography": { "base_size": -3, "heading_font": "Lora" },
            "spacing": "wide",
            "features": { "chat": true, "map": "yes" },
        }));

        assert_eq!(groups.colors.primary.as_deref(), Some("#ff0000"));
        assert_eq!(groups.colors.secondary, None);
        assert_eq!(groups.colors.accent, None);
        assert_eq!(groups.typography.heading_font.as_deref(), Some("Lora"));
        assert_eq!(groups.typography.base_size, None);
        assert!(groups.spacing.is_empty());
        assert_eq!(groups.features.chat, Some(true));
        assert_eq!(groups.features.map, None);

        let paths: Vec<_> = diags.iter().map(|d| d.path.as_str()).collect();
        assert!(paths.contains(&"colors.secondary"));
        assert!(paths.contains(&"colors.accent"));
        assert!(paths.contains(&"typography.base_size"));
        assert!(paths.contains(&"spacing"));
        assert!(paths.contains(&"features.map"));
    }

    #[test]
    fn null_and_blank_are_absent() {
        let (groups, diags) = parse(json!({
            "colors": { "primary": null, "text": "   " },
        }));
        assert!(groups.colors.is_empty());
        assert!(diags.is_empty());
    }

    #[test]
    fn gradient_with_one_stop_is_rejected() {
        let (groups, diags) = parse(json!({
            "background": { "gradient": { "angle": 90, "stops": ["#000"] } },
        }));
        assert!(groups.background.is_empty());
        assert_eq!(diags.len(), 1);
    }

    #[test]
    fn serialized_groups_parse_back() {
        let mut groups = TokenGroups::default();
        groups.colors.primary = Some("#ff0000".into());
        groups.layout.navigation = Some(NavigationStyle::Drawer);
        groups.layout.section_order = Some(vec!["map".into(), "schedule".into()]);
        groups.hero.media = Some(HeroMedia::Video("https://cdn.example/v.mp4".into()));

        let (parsed, diags) = parse(serde_json::to_value(&groups).unwrap());
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(parsed, groups);
    }
}
