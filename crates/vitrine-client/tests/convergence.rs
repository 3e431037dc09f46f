mod common;

use std::time::Duration;

use common::{walk_to_publish, Harness};
use vitrine_client::{ColorRole, Edit, EngineConfig, SyncError};
use vitrine_shared::{default_theme, DocumentBody, LegacyFields, Surface, TenantId, TokenDocument};

fn primary(color: &str) -> DocumentBody {
    let mut body = DocumentBody::default();
    body.tokens.colors.primary = Some(color.into());
    body
}

#[tokio::test]
async fn every_surface_converges_after_publish() {
    let h = Harness::new();
    let tenant = TenantId::new();

    let mut mobile = h.engine.use_resolved_theme(tenant, Surface::Mobile);
    let mut preview = h.engine.use_resolved_theme(tenant, Surface::Preview);
    let mut storefront = h.engine.use_resolved_theme(tenant, Surface::Storefront);
    mobile.wait_for(|s| !s.is_loading).await.unwrap();

    let builder = h.engine.open_builder(tenant).await.unwrap();
    builder.edit(Edit::Color(ColorRole::Primary, Some("#ff0000".into()))).unwrap();
    builder
        .edit(Edit::SurfaceColor(Surface::Preview, ColorRole::Accent, Some("#00ff00".into())))
        .unwrap();
    walk_to_publish(&builder);
    let code = builder.publish().await.unwrap();

    let version = builder.draft().base_version;
    assert!(version.is_some());
    assert!(builder.is_published());
    assert_eq!(builder.access_code(), Some(code));

    for sub in [&mut mobile, &mut preview, &mut storefront] {
        let state = sub.wait_for(|s| s.version == version).await.unwrap();
        assert_eq!(state.theme.primary_color, "#ff0000");
        assert!(state.error.is_none());
    }
    assert_eq!(preview.theme().accent_color, "#00ff00");
    assert_eq!(mobile.theme().accent_color, default_theme().accent_color);
    assert_eq!(storefront.theme().accent_color, default_theme().accent_color);
}

#[tokio::test]
async fn cleared_token_falls_back_to_legacy() {
    let h = Harness::new();
    let tenant = TenantId::new();
    h.backend().inner.set_legacy_fields(
        tenant,
        LegacyFields {
            primary_color: Some("#111111".into()),
            ..Default::default()
        },
    );

    let mut sub = h.engine.use_resolved_theme(tenant, Surface::Mobile);
    let state = sub.wait_for(|s| !s.is_loading).await.unwrap();
    assert_eq!(state.theme.primary_color, "#111111");

    let builder = h.engine.open_builder(tenant).await.unwrap();
    builder.edit(Edit::Color(ColorRole::Primary, Some("#ff0000".into()))).unwrap();
    builder.save().await.unwrap();
    let state = sub.wait_for(|s| s.version == Some(1)).await.unwrap();
    assert_eq!(state.theme.primary_color, "#ff0000");

    builder.edit(Edit::Color(ColorRole::Primary, None)).unwrap();
    builder.save().await.unwrap();
    let state = sub.wait_for(|s| s.version == Some(2)).await.unwrap();
    assert_eq!(state.theme.primary_color, "#111111");
}

#[tokio::test]
async fn readers_never_see_a_mixed_theme() {
    let h = Harness::new();
    let tenant = TenantId::new();
    let client = h.engine.client().clone();

    let mut sub = h.engine.use_resolved_theme(tenant, Surface::Storefront);
    sub.wait_for(|s| !s.is_loading).await.unwrap();

    let mut observed = sub.watch();
    let observer = tokio::spawn(async move {
        let mut seen = Vec::new();
        while observed.changed().await.is_ok() {
            let state = observed.borrow_and_update().clone();
            seen.push(state.clone());
            if state.version == Some(20) {
                break;
            }
        }
        seen
    });

    for n in 1..=20u8 {
        let color = format!("#0000{n:02x}");
        let mut body = primary(&color);
        body.tokens.colors.accent = Some(color);
        client.write(tenant, &body).await.unwrap();
        tokio::task::yield_now().await;
    }

    let seen = observer.await.unwrap();
    assert!(!seen.is_empty());
    for state in seen.iter().filter(|s| s.version.is_some()) {
        // Primary and accent always come from the same write.
        assert_eq!(state.theme.primary_color, state.theme.accent_color);
    }
    assert_eq!(seen.last().unwrap().theme.primary_color, "#000014");
}

#[tokio::test(start_paused = true)]
async fn failed_fetch_keeps_the_last_good_theme() {
    let h = Harness::new();
    let tenant = TenantId::new();
    let client = h.engine.client().clone();

    client.write(tenant, &primary("#123456")).await.unwrap();
    let mut sub = h.engine.use_resolved_theme(tenant, Surface::Mobile);
    sub.wait_for(|s| s.version == Some(1)).await.unwrap();

    // One attempt plus every configured retry fails.
    let attempts = EngineConfig::default().fetch_retries + 1;
    h.backend().fail_next_fetches(attempts);
    client.write(tenant, &primary("#654321")).await.unwrap();

    let state = sub.wait_for(|s| s.error.is_some()).await.unwrap();
    assert!(matches!(state.error, Some(SyncError::Transient(_))));
    assert_eq!(state.theme.primary_color, "#123456");
    assert_eq!(state.version, Some(1));
    assert!(!state.is_loading);

    // The next change signal recovers.
    client.notifier().publish(tenant);
    let state = sub.wait_for(|s| s.version == Some(2)).await.unwrap();
    assert!(state.error.is_none());
    assert_eq!(state.theme.primary_color, "#654321");
}

#[tokio::test(start_paused = true)]
async fn transient_failures_within_the_retry_budget_are_invisible() {
    let h = Harness::new();
    let tenant = TenantId::new();
    h.backend().fail_next_fetches(2);

    let mut sub = h.engine.use_resolved_theme(tenant, Surface::Storefront);
    let state = sub.wait_for(|s| !s.is_loading).await.unwrap();
    assert!(state.error.is_none());
    assert_eq!(h.backend().fetches(), 3);
}

#[tokio::test(start_paused = true)]
async fn bursts_of_changes_collapse() {
    let h = Harness::new();
    let tenant = TenantId::new();
    let client = h.engine.client().clone();

    let mut sub = h.engine.use_resolved_theme(tenant, Surface::Mobile);
    sub.wait_for(|s| !s.is_loading).await.unwrap();
    assert_eq!(h.backend().fetches(), 1);

    h.backend().set_fetch_delay(Duration::from_millis(100));
    client.notifier().publish(tenant);
    tokio::time::sleep(Duration::from_millis(10)).await;
    for _ in 0..10 {
        client.notifier().publish(tenant);
    }
    tokio::time::sleep(Duration::from_secs(1)).await;

    // The in-flight fetch plus exactly one trailing re-fetch.
    assert_eq!(h.backend().fetches(), 3);
}

#[tokio::test]
async fn tenants_are_isolated() {
    let h = Harness::new();
    let a = TenantId::new();
    let b = TenantId::new();
    let client = h.engine.client().clone();

    let mut sub_a = h.engine.use_resolved_theme(a, Surface::Mobile);
    let mut sub_b = h.engine.use_resolved_theme(b, Surface::Mobile);
    sub_a.wait_for(|s| !s.is_loading).await.unwrap();
    sub_b.wait_for(|s| !s.is_loading).await.unwrap();

    client.write(a, &primary("#ff0000")).await.unwrap();
    sub_a.wait_for(|s| s.version == Some(1)).await.unwrap();

    let quiet = tokio::time::timeout(Duration::from_millis(50), sub_b.changed()).await;
    assert!(quiet.is_err(), "tenant b was notified of tenant a's write");
    assert_eq!(sub_b.snapshot().version, None);
    assert_eq!(sub_b.theme().primary_color, default_theme().primary_color);
    assert_eq!(h.transport.listener_count(a), 1);
    assert_eq!(h.transport.listener_count(b), 1);
}

#[tokio::test]
async fn malformed_document_degrades_per_field() {
    let h = Harness::new();
    let tenant = TenantId::new();
    h.backend().inner.set_legacy_fields(
        tenant,
        LegacyFields {
            primary_color: Some("#111111".into()),
            ..Default::default()
        },
    );
    h.backend().inner.insert_raw(TokenDocument {
        id: uuid::Uuid::new_v4(),
        tenant_id: tenant,
        version: 1,
        is_active: true,
        updated_at: chrono::Utc::now(),
        body: serde_json::json!({
            "colors": { "primary": 42, "accent": "#abcdef" },
        }),
    });

    let mut sub = h.engine.use_resolved_theme(tenant, Surface::Mobile);
    let state = sub.wait_for(|s| !s.is_loading).await.unwrap();

    assert!(state.error.is_none());
    assert_eq!(state.theme.primary_color, "#111111");
    assert_eq!(state.theme.accent_color, "#abcdef");
    assert_eq!(state.diagnostics.len(), 1);
}
