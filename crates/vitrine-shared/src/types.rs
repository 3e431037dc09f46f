use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Identifier of a tenant (a conference or a shop).
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(transparent)]
pub struct TenantId(pub Uuid);

impl TenantId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s.trim()).map(Self)
    }

    /// Short form used in log lines.
    pub fn short(&self) -> String {
        self.0.simple().to_string()[..8].to_string()
    }
}

impl Default for TenantId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for TenantId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A rendering consumer of the resolved theme. Each surface may carry its
/// own override section inside the token document.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Surface {
    /// The attendee mobile app (`mobile` section).
    Mobile,
    /// The live preview pane inside the builder (`app_preview` section).
    Preview,
    /// The public storefront page. Has no override section.
    Storefront,
}

impl Surface {
    /// Key of the override section inside the token document, if any.
    pub fn section_key(&self) -> Option<&'static str> {
        match self {
            Self::Mobile => Some("mobile"),
            Self::Preview => Some("app_preview"),
            Self::Storefront => None,
        }
    }
}

impl std::fmt::Display for Surface {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Mobile => "mobile",
            Self::Preview => "preview",
            Self::Storefront => "storefront",
        };
        f.write_str(name)
    }
}
