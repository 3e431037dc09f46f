//! Builder wizard steps and their required fields.

use std::fmt;

use serde::{Deserialize, Serialize};

use vitrine_shared::tokens::{is_valid_color, ColorTokens};
use vitrine_shared::DocumentBody;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Step {
    Overview,
    Branding,
    Layout,
    Publish,
}

impl Step {
    pub const ALL: [Step; 4] = [Step::Overview, Step::Branding, Step::Layout, Step::Publish];

    pub fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<Step> {
        Self::ALL.get(self.index() + 1).copied()
    }

    pub fn prev(self) -> Option<Step> {
        self.index().checked_sub(1).map(|i| Self::ALL[i])
    }

    pub fn is_first(self) -> bool {
        self.prev().is_none()
    }

    pub fn is_final(self) -> bool {
        self.next().is_none()
    }

    /// Required fields of this step that `body` does not satisfy.
    pub fn missing_fields(self, body: &DocumentBody) -> Vec<String> {
        let mut missing = Vec::new();
        match self {
            Step::Overview => {
                let named = body
                    .overview
                    .name
                    .as_deref()
                    .is_some_and(|n| !n.trim().is_empty());
                if !named {
                    missing.push("overview.name".into());
                }
            }
            Step::Branding => {
                check_colors(&body.tokens.colors, "colors", &mut missing);
                check_colors(&body.mobile.tokens.colors, "mobile.colors", &mut missing);
                check_colors(&body.app_preview.tokens.colors, "app_preview.colors", &mut missing);
                if body.mobile.splash_color.as_deref().is_some_and(|c| !is_valid_color(c)) {
                    missing.push("mobile.splash_color".into());
                }
            }
            Step::Layout => {
                if body.tokens.layout.section_order.as_ref().is_some_and(Vec::is_empty) {
                    missing.push("layout.section_order".into());
                }
            }
            Step::Publish => {}
        }
        missing
    }
}

/// Every color that is set must be usable.
fn check_colors(colors: &ColorTokens, prefix: &str, missing: &mut Vec<String>) {
    let slots = [
        ("primary", &colors.primary),
        ("secondary", &colors.secondary),
        ("accent", &colors.accent),
        ("background", &colors.background),
        ("surface", &colors.surface),
        ("text", &colors.text),
        ("muted_text", &colors.muted_text),
        ("border", &colors.border),
    ];

    for (role, value) in slots {
        if value.as_deref().is_some_and(|c| !is_valid_color(c)) {
            missing.push(format!("{prefix}.{role}"));
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Overview => write!(f, "overview"),
            Step::Branding => write!(f, "branding"),
            Step::Layout => write!(f, "layout"),
            Step::Publish => write!(f, "publish"),
        }
    }
}
