//! The legacy flat settings row. Only ever read by the resolution path;
//! [`Database::upsert_legacy_fields`] exists for seeding and migration
//! tooling.

use rusqlite::{params, OptionalExtension};

use vitrine_shared::{LegacyFields, TenantId};

use crate::database::Database;
use crate::error::Result;

impl Database {
    /// The tenant's legacy settings. A tenant without a row reads as all
    /// fields unset.
    pub fn get_legacy_fields(&self, tenant: TenantId) -> Result<LegacyFields> {
        let fields = self
            .conn()
            .query_row(
                "SELECT primary_color, secondary_color, accent_color, background_color,
                        text_color, font_family, heading_font, background_image_url,
                        background_pattern, hero_image_url, hero_video_url, logo_url,
                        navigation_style, enable_chat, enable_map, enable_qr_checkin
                 FROM legacy_fields
                 WHERE tenant_id = ?1",
                params![tenant.to_string()],
                |row| {
                    Ok(LegacyFields {
                        primary_color: row.get(0)?,
                        secondary_color: row.get(1)?,
                        accent_color: row.get(2)?,
                        background_color: row.get(3)?,
                        text_color: row.get(4)?,
                        font_family: row.get(5)?,
                        heading_font: row.get(6)?,
                        background_image_url: row.get(7)?,
                        background_pattern: row.get(8)?,
                        hero_image_url: row.get(9)?,
                        hero_video_url: row.get(10)?,
                        logo_url: row.get(11)?,
                        navigation_style: row.get(12)?,
                        enable_chat: row.get(13)?,
                        enable_map: row.get(14)?,
                        enable_qr_checkin: row.get(15)?,
                    })
                },
            )
            .optional()?;

        Ok(fields.unwrap_or_default())
    }

    pub fn upsert_legacy_fields(&self, tenant: TenantId, fields: &LegacyFields) -> Result<()> {
        self.ensure_tenant(tenant)?;
        self.conn().execute(
            "INSERT OR REPLACE INTO legacy_fields (
                tenant_id, primary_color, secondary_color, accent_color, background_color,
                text_color, font_family, heading_font, background_image_url,
                background_pattern, hero_image_url, hero_video_url, logo_url,
                navigation_style, enable_chat, enable_map, enable_qr_checkin
             ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17)",
            params![
                tenant.to_string(),
                fields.primary_color,
                fields.secondary_color,
                fields.accent_color,
                fields.background_color,
                fields.text_color,
                fields.font_family,
                fields.heading_font,
                fields.background_image_url,
                fields.background_pattern,
                fields.hero_image_url,
                fields.hero_video_url,
                fields.logo_url,
                fields.navigation_style,
                fields.enable_chat,
                fields.enable_map,
                fields.enable_qr_checkin,
            ],
        )?;
        Ok(())
    }
}
