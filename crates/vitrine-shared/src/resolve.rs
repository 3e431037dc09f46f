//! Precedence resolution.
//!
//! For every field, highest first:
//!
//! 1. the surface override section of the token document,
//! 2. the general groups of the token document,
//! 3. the legacy flat settings,
//! 4. the compiled default.
//!
//! Each field walks the chain on its own, so a tenant can take its primary
//! color from the document while every other color still comes from legacy
//! settings or defaults. The background is the one exception: it is taken
//! whole from the highest tier that names any background mode.
//!
//! Resolution is pure and total. Unusable values are dropped with a
//! [`Diagnostic`] and the field falls through to the next tier.

use std::sync::Arc;

use tracing::warn;

use crate::document::{DocumentBody, SurfaceSection, TokenDocument};
use crate::error::Diagnostic;
use crate::legacy::LegacyFields;
use crate::theme::ResolvedTheme;
use crate::tokens::Overlay;
use crate::types::Surface;

/// Resolve a theme, returning the problems found in the inputs.
pub fn resolve_with_diagnostics(
    defaults: &ResolvedTheme,
    legacy: &LegacyFields,
    document: Option<&TokenDocument>,
    surface: Surface,
) -> (ResolvedTheme, Vec<Diagnostic>) {
    let mut diags = Vec::new();
    let mut tokens = legacy.to_tokens(&mut diags);
    let mut surface_only = SurfaceSection::default();

    if let Some(doc) = document {
        let body = DocumentBody::parse(&doc.body, &mut diags);
        let section = body.section(surface).cloned();
        tokens = tokens.overlay(body.tokens);
        if let Some(section) = section {
            tokens = tokens.overlay(section.tokens.clone());
            surface_only = section;
        }
    }

    let theme = ResolvedTheme::from_layers(defaults, tokens, &surface_only);
    (theme, diags)
}

/// Resolve a theme. Problems in the inputs are logged, never returned.
pub fn resolve(
    defaults: &ResolvedTheme,
    legacy: &LegacyFields,
    document: Option<&TokenDocument>,
    surface: Surface,
) -> ResolvedTheme {
    let (theme, diags) = resolve_with_diagnostics(defaults, legacy, document, surface);
    for diag in &diags {
        warn!(path = %diag.path, problem = %diag.problem, "Ignoring malformed configuration value");
    }
    theme
}

/// Outcome of a memoized resolution.
#[derive(Debug, Clone)]
pub struct Resolution {
    pub theme: Arc<ResolvedTheme>,
    pub diagnostics: Arc<[Diagnostic]>,
    /// `true` when the inputs matched the previous call and the previous
    /// theme was handed back.
    pub reused: bool,
}

/// Single-entry memo of [`resolve_with_diagnostics`].
///
/// Keyed by a BLAKE3 digest of the serialized inputs. Only the document
/// body takes part in the key, so re-fetching an identical document under a
/// new version yields the same `Arc`.
#[derive(Debug, Default)]
pub struct ResolveMemo {
    last: Option<(blake3::Hash, Resolution)>,
}

impl ResolveMemo {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn resolve(
        &mut self,
        defaults: &ResolvedTheme,
        legacy: &LegacyFields,
        document: Option<&TokenDocument>,
        surface: Surface,
    ) -> Resolution {
        let key = input_digest(defaults, legacy, document, surface);

        if let (Some(key), Some((last_key, last))) = (key, &self.last) {
            if key == *last_key {
                return Resolution {
                    reused: true,
                    ..last.clone()
                };
            }
        }

        let (theme, diags) = resolve_with_diagnostics(defaults, legacy, document, surface);
        let resolution = Resolution {
            theme: Arc::new(theme),
            diagnostics: diags.into(),
            reused: false,
        };

        self.last = key.map(|k| (k, resolution.clone()));
        resolution
    }

    pub fn clear(&mut self) {
        self.last = None;
    }
}

fn input_digest(
    defaults: &ResolvedTheme,
    legacy: &LegacyFields,
    document: Option<&TokenDocument>,
    surface: Surface,
) -> Option<blake3::Hash> {
    let mut hasher = blake3::Hasher::new();
    let parts = [
        serde_json::to_vec(defaults).ok()?,
        serde_json::to_vec(legacy).ok()?,
        serde_json::to_vec(&document.map(|d| &d.body)).ok()?,
        serde_json::to_vec(&surface).ok()?,
    ];
    for part in &parts {
        hasher.update(&(part.len() as u64).to_le_bytes());
        hasher.update(part);
    }
    Some(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme::{default_theme, Background, StatusBarStyle};
    use crate::types::TenantId;
    use chrono::Utc;
    use serde_json::{json, Value};
    use uuid::Uuid;

    fn doc(body: Value) -> TokenDocument {
        TokenDocument {
            id: Uuid::new_v4(),
            tenant_id: TenantId::new(),
            version: 1,
            is_active: true,
            updated_at: Utc::now(),
            body,
        }
    }

    fn legacy_primary(color: &str) -> LegacyFields {
        LegacyFields {
            primary_color: Some(color.into()),
            ..Default::default()
        }
    }

    #[test]
    fn resolution_is_deterministic() {
        let legacy = legacy_primary("#111111");
        let document = doc(json!({
            "colors": { "accent": "#00ff00" },
            "typography": { "weights": [300, 500] },
            "mobile": { "colors": { "primary": "#0000ff" } },
        }));

        let first = resolve(default_theme(), &legacy, Some(&document), Surface::Mobile);
        for _ in 0..10 {
            let again = resolve(default_theme(), &legacy, Some(&document), Surface::Mobile);
            assert_eq!(again, first);
        }
    }

    #[test]
    fn each_tier_supplies_the_field_independently() {
        let defaults = default_theme();
        let legacy = legacy_primary("#111111");
        let general = json!({ "colors": { "primary": "#222222" } });
        let with_surface = json!({
            "colors": { "primary": "#222222" },
            "mobile": { "colors": { "primary": "#333333" } },
        });

        // Tier 4: compiled default.
        let theme = resolve(defaults, &LegacyFields::default(), None, Surface::Mobile);
        assert_eq!(theme.primary_color, defaults.primary_color);

        // Tier 3: legacy.
        let theme = resolve(defaults, &legacy, None, Surface::Mobile);
        assert_eq!(theme.primary_color, "#111111");

        // Tier 2: document general section.
        let theme = resolve(defaults, &legacy, Some(&doc(general)), Surface::Mobile);
        assert_eq!(theme.primary_color, "#222222");

        // Tier 1: surface override.
        let d = doc(with_surface);
        let theme = resolve(defaults, &legacy, Some(&d), Surface::Mobile);
        assert_eq!(theme.primary_color, "#333333");

        // The override only applies to its own surface.
        let theme = resolve(defaults, &legacy, Some(&d), Surface::Storefront);
        assert_eq!(theme.primary_color, "#222222");
    }

    #[test]
    fn fields_fall_through_independently() {
        let legacy = LegacyFields {
            primary_color: Some("#111111".into()),
            secondary_color: Some("#121212".into()),
            ..Default::default()
        };
        let document = doc(json!({ "colors": { "primary": "#ff0000" } }));

        let theme = resolve(default_theme(), &legacy, Some(&document), Surface::Storefront);
        assert_eq!(theme.primary_color, "#ff0000");
        assert_eq!(theme.secondary_color, "#121212");
        assert_eq!(theme.accent_color, default_theme().accent_color);
    }

    #[test]
    fn cleared_token_falls_back_to_legacy_not_default() {
        let legacy = legacy_primary("#111111");

        let theme = resolve(default_theme(), &legacy, None, Surface::Mobile);
        assert_eq!(theme.primary_color, "#111111");

        let published = doc(json!({ "colors": { "primary": "#ff0000" } }));
        let theme = resolve(default_theme(), &legacy, Some(&published), Surface::Mobile);
        assert_eq!(theme.primary_color, "#ff0000");

        let cleared = doc(json!({ "colors": { "primary": null } }));
        let theme = resolve(default_theme(), &legacy, Some(&cleared), Surface::Mobile);
        assert_eq!(theme.primary_color, "#111111");
    }

    #[test]
    fn malformed_values_degrade_per_field() {
        let legacy = legacy_primary("#111111");
        let document = doc(json!({
            "colors": { "primary": "not-a-color", "accent": "#abcdef" },
            "spacing": { "radius": "round" },
        }));

        let (theme, diags) =
            resolve_with_diagnostics(default_theme(), &legacy, Some(&document), Surface::Mobile);
        assert_eq!(theme.primary_color, "#111111");
        assert_eq!(theme.accent_color, "#abcdef");
        assert_eq!(theme.corner_radius, default_theme().corner_radius);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn surface_section_overrides_general_section() {
        let document = doc(json!({
            "colors": { "primary": "#222222", "accent": "#444444" },
            "app_preview": { "colors": { "primary": "#333333" }, "splash_color": "#555555" },
        }));
        let (theme, diags) = resolve_with_diagnostics(
            default_theme(),
            &LegacyFields::default(),
            Some(&document),
            Surface::Preview,
        );
        assert!(diags.is_empty(), "{diags:?}");
        assert_eq!(theme.primary_color, "#333333");
        assert_eq!(theme.accent_color, "#444444");
        assert_eq!(theme.splash_color, "#555555");
    }

    #[test]
    fn oversized_numbers_fall_through() {
        let document = doc(json!({
            "typography": { "base_size": 1e300 },
            "spacing": { "radius": 1e39 },
        }));
        let (theme, diags) = resolve_with_diagnostics(
            default_theme(),
            &LegacyFields::default(),
            Some(&document),
            Surface::Storefront,
        );
        assert!(theme.base_font_size.is_finite());
        assert_eq!(theme.base_font_size, default_theme().base_font_size);
        assert_eq!(theme.corner_radius, default_theme().corner_radius);
        assert_eq!(diags.len(), 2);
    }

    #[test]
    fn garbage_body_resolves_like_no_document() {
        let legacy = legacy_primary("#111111");
        let document = doc(Value::String("{ truncated".into()));

        let with_garbage = resolve(default_theme(), &legacy, Some(&document), Surface::Mobile);
        let without = resolve(default_theme(), &legacy, None, Surface::Mobile);
        assert_eq!(with_garbage, without);
    }

    #[test]
    fn document_background_replaces_legacy_background() {
        let legacy = LegacyFields {
            background_image_url: Some("https://cdn.example/old.jpg".into()),
            ..Default::default()
        };
        let document = doc(json!({
            "background": { "gradient": { "angle": 90, "stops": ["#000000", "#ffffff"] } },
        }));

        let theme = resolve(default_theme(), &legacy, Some(&document), Surface::Storefront);
        assert_eq!(
            theme.background,
            Background::Gradient {
                angle: 90.0,
                stops: vec!["#000000".into(), "#ffffff".into()],
            }
        );
    }

    #[test]
    fn default_background_follows_resolved_background_color() {
        let document = doc(json!({ "colors": { "background": "#101010" } }));
        let theme = resolve(
            default_theme(),
            &LegacyFields::default(),
            Some(&document),
            Surface::Storefront,
        );
        assert_eq!(
            theme.background,
            Background::Solid {
                color: "#101010".into()
            }
        );
    }

    #[test]
    fn surface_only_fields() {
        let document = doc(json!({
            "mobile": { "splash_color": "#222222", "status_bar": "light" },
        }));
        let legacy = LegacyFields::default();

        let mobile = resolve(default_theme(), &legacy, Some(&document), Surface::Mobile);
        assert_eq!(mobile.splash_color, "#222222");
        assert_eq!(mobile.status_bar, StatusBarStyle::Light);

        let preview = resolve(default_theme(), &legacy, Some(&document), Surface::Preview);
        assert_eq!(preview.splash_color, default_theme().splash_color);
    }

    #[test]
    fn memo_reuses_theme_for_identical_inputs() {
        let legacy = legacy_primary("#111111");
        let first_doc = doc(json!({ "colors": { "primary": "#ff0000" } }));
        let mut same_body = first_doc.clone();
        same_body.version = 2;

        let mut memo = ResolveMemo::new();
        let a = memo.resolve(default_theme(), &legacy, Some(&first_doc), Surface::Mobile);
        let b = memo.resolve(default_theme(), &legacy, Some(&same_body), Surface::Mobile);
        assert!(!a.reused);
        assert!(b.reused);
        assert!(Arc::ptr_eq(&a.theme, &b.theme));

        let changed = doc(json!({ "colors": { "primary": "#00ff00" } }));
        let c = memo.resolve(default_theme(), &legacy, Some(&changed), Surface::Mobile);
        assert!(!c.reused);
        assert_eq!(c.theme.primary_color, "#00ff00");
    }
}
