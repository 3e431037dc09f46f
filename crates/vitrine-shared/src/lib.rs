//! # vitrine-shared
//!
//! Types and pure logic shared by every Vitrine crate: tenant identifiers,
//! the token document model, the compiled-in default theme, the precedence
//! resolver that turns layered configuration into a [`ResolvedTheme`],
//! brand templates and public access codes.
//!
//! Nothing in this crate performs I/O.

pub mod access_code;
pub mod constants;
pub mod document;
pub mod error;
pub mod legacy;
pub mod resolve;
pub mod templates;
pub mod theme;
pub mod tokens;
pub mod types;

pub use access_code::AccessCode;
pub use document::{DocumentBody, Overview, SurfaceSection, TokenDocument};
pub use error::{AccessCodeError, Diagnostic};
pub use legacy::LegacyFields;
pub use resolve::{resolve, resolve_with_diagnostics, Resolution, ResolveMemo};
pub use templates::{builtin_templates, template_by_id, Template};
pub use theme::{
    default_theme, Background, CardStyle, Features, Gradient, HeroMedia, NavigationStyle,
    ResolvedTheme, StatusBarStyle,
};
pub use tokens::{Overlay, TokenGroups};
pub use types::{Surface, TenantId};
