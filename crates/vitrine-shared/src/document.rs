//! The token document: the versioned configuration blob a tenant publishes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use crate::error::Diagnostic;
use crate::theme::StatusBarStyle;
use crate::tokens::{color, group, text, token_group, value, Object, Overlay, TokenGroups};
use crate::types::{Surface, TenantId};

/// A persisted configuration document.
///
/// The body is kept as raw JSON so that a document written by a newer or
/// buggy editor can still be read field by field (see [`DocumentBody::parse`]).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TokenDocument {
    pub id: Uuid,
    pub tenant_id: TenantId,
    /// Monotonic per tenant, assigned by the store.
    pub version: u64,
    pub is_active: bool,
    pub updated_at: DateTime<Utc>,
    pub body: Value,
}

impl TokenDocument {
    /// Typed view of the body, with the problems found while reading it.
    pub fn parse_body(&self) -> (DocumentBody, Vec<Diagnostic>) {
        let mut diags = Vec::new();
        let body = DocumentBody::parse(&self.body, &mut diags);
        (body, diags)
    }
}

token_group! {
    /// Event or shop details edited on the first builder step.
    pub struct Overview {
        name: String => text,
        tagline: String => text,
        description: String => text,
        venue: String => text,
        contact_email: String => text,
    }
}

/// Overrides that only apply to one surface.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSection {
    #[serde(flatten)]
    pub tokens: TokenGroups,
    pub splash_color: Option<String>,
    pub status_bar: Option<StatusBarStyle>,
}

impl SurfaceSection {
    fn parse(obj: &Object, path: &str, diags: &mut Vec<Diagnostic>) -> Self {
        Self {
            tokens: TokenGroups::parse(obj, path, diags),
            splash_color: color(obj, "splash_color", path, diags),
            status_bar: value(obj, "status_bar", path, diags),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.tokens == TokenGroups::default()
            && self.splash_color.is_none()
            && self.status_bar.is_none()
    }
}

/// Typed content of a token document.
///
/// Serialized shape: `overview`, the general token groups at top level
/// (`colors`, `typography`, ...), then the `mobile` and `app_preview`
/// override sections.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DocumentBody {
    pub overview: Overview,
    #[serde(flatten)]
    pub tokens: TokenGroups,
    pub mobile: SurfaceSection,
    pub app_preview: SurfaceSection,
}

impl DocumentBody {
    /// Lenient read. Never fails: unusable values are dropped and reported.
    pub fn parse(raw: &Value, diags: &mut Vec<Diagnostic>) -> Self {
        let Value::Object(obj) = raw else {
            diags.push(Diagnostic::new("", "document body is not an object"));
            return Self::default();
        };

        Self {
            overview: group(obj, "overview", "", diags, Overview::parse),
            tokens: TokenGroups::parse(obj, "", diags),
            mobile: group(obj, "mobile", "", diags, SurfaceSection::parse),
            app_preview: group(obj, "app_preview", "", diags, SurfaceSection::parse),
        }
    }

    /// Override section for `surface`, if that surface has one.
    pub fn section(&self, surface: Surface) -> Option<&SurfaceSection> {
        match surface {
            Surface::Mobile => Some(&self.mobile),
            Surface::Preview => Some(&self.app_preview),
            Surface::Storefront => None,
        }
    }

    pub fn section_mut(&mut self, surface: Surface) -> Option<&mut SurfaceSection> {
        match surface {
            Surface::Mobile => Some(&mut self.mobile),
            Surface::Preview => Some(&mut self.app_preview),
            Surface::Storefront => None,
        }
    }

    /// Tokens in effect for `surface`: the general groups with the surface
    /// section layered on top.
    pub fn tokens_for(&self, surface: Surface) -> TokenGroups {
        match self.section(surface) {
            Some(section) => self.tokens.clone().overlay(section.tokens.clone()),
            None => self.tokens.clone(),
        }
    }

    pub fn to_value(&self) -> Value {
        // Plain data with string keys; serialization cannot fail.
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}
