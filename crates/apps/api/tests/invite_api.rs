mod common;

use chrono::{Duration, Utc};
use color_eyre::Result;
use common::{FailingInviteStore, GALLERY_A, GALLERY_B, OWNER_B, TestContext};
use common_services::api::favorites::device_store::MemoryFavoriteStore;
use common_services::api::favorites::interfaces::{
    FavoriteCountsResponse, FavoriteGallery, FavoritePhoto, FavoritePhotographer, FavoriteState,
    ToggleFavoriteResponse,
};
use common_services::api::favorites::reconciler::FavoritesReconciler;
use common_services::api::invite::gateway::VisitContext;
use common_services::api::invite::interfaces::{InviteSummary, OperationContext, ValidInvite};
use common_services::api::invite::status::EffectiveStatus;
use common_services::database::invite::invite::{InviteStatus, InviteType};
use common_services::favorites_client::HttpFavoriteApi;
use reqwest::StatusCode;
use serde_json::{Value, json};
use std::sync::Arc;
use tokio::net::TcpListener;
use url::Url;
use uuid::Uuid;

fn all_permissions() -> Value {
    json!({
        "canView": true,
        "canFavorite": true,
        "canComment": true,
        "canDownload": true,
        "canRequestPurchase": true
    })
}

fn favorite_photo(id: &str) -> FavoritePhoto {
    FavoritePhoto {
        id: id.to_owned(),
        title: format!("Photo {id}"),
        description: None,
        url: format!("https://cdn.example.com/{id}.jpg"),
        thumbnail_url: format!("https://cdn.example.com/{id}_thumb.jpg"),
        price: Some(25.0),
        is_for_sale: true,
        gallery: FavoriteGallery {
            id: GALLERY_A.to_owned(),
            title: "Wedding".to_owned(),
            photographer: FavoritePhotographer {
                id: "1".to_owned(),
                name: "Anna".to_owned(),
            },
        },
    }
}

async fn authorize(
    context: &TestContext,
    code: &str,
    operation: &str,
    visit_key: &str,
    photo_id: Option<&str>,
) -> Result<reqwest::Response> {
    Ok(context
        .http_client
        .post(format!("{}/invite/authorize", context.base_url))
        .json(&json!({
            "code": code,
            "operation": operation,
            "visitKey": visit_key,
            "photoId": photo_id,
        }))
        .send()
        .await?)
}

async fn validate(context: &TestContext, code: &str) -> Result<reqwest::Response> {
    Ok(context
        .http_client
        .post(format!("{}/invite/validate", context.base_url))
        .json(&json!({ "code": code }))
        .send()
        .await?)
}

#[tokio::test]
async fn health_check_reports_ok() -> Result<()> {
    let context = TestContext::new().await?;

    let response = context
        .http_client
        .get(format!("{}/health", context.base_url))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.text().await?, "OK");
    Ok(())
}

#[tokio::test]
async fn openapi_document_lists_invite_paths() -> Result<()> {
    let context = TestContext::new().await?;

    let document: Value = context
        .http_client
        .get(format!("{}/openapi.json", context.base_url))
        .send()
        .await?
        .json()
        .await?;

    let paths = &document["paths"];
    assert!(paths.get("/invite/authorize").is_some());
    assert!(paths.get("/gallery/{gallery_id}/invites").is_some());
    assert!(paths.get("/invites/{invite_id}/revoke").is_some());
    Ok(())
}

#[tokio::test]
async fn owner_routes_require_a_valid_token() -> Result<()> {
    let context = TestContext::new().await?;
    let url = format!("{}/gallery/{GALLERY_A}/invites", context.base_url);

    let missing = context.http_client.get(&url).send().await?;
    let garbage = context
        .http_client
        .get(&url)
        .bearer_auth("not-a-jwt")
        .send()
        .await?;

    assert_eq!(missing.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(garbage.status(), StatusCode::UNAUTHORIZED);
    Ok(())
}

#[tokio::test]
async fn owner_creates_lists_and_reads_invites() -> Result<()> {
    let context = TestContext::new().await?;

    let created = context
        .create_invite(json!({
            "type": "multi_use",
            "maxUsage": 3,
            "clientEmail": "  Client@Example.com ",
        }))
        .await?;

    assert_eq!(created.invite.status, InviteStatus::Pending);
    assert_eq!(created.invite.usage_count, 0);
    assert_eq!(created.invite.max_usage, Some(3));
    assert!(created.invite.permissions.can_view);
    assert!(!created.invite.permissions.can_download);
    assert_eq!(created.effective_status, EffectiveStatus::Valid);

    let listed: Vec<InviteSummary> = context
        .http_client
        .get(format!("{}/gallery/{GALLERY_A}/invites", context.base_url))
        .bearer_auth(context.token_for(common::OWNER_A)?)
        .send()
        .await?
        .json()
        .await?;
    assert!(listed.iter().any(|s| s.invite.id == created.invite.id));

    let fetched = context.get_invite(created.invite.id).await?;
    assert_eq!(fetched.invite.code, created.invite.code);
    Ok(())
}

#[tokio::test]
async fn create_rejects_bounds_that_do_not_fit_the_type() -> Result<()> {
    let context = TestContext::new().await?;

    let response = context
        .http_client
        .post(format!("{}/gallery/{GALLERY_A}/invites", context.base_url))
        .bearer_auth(context.token_for(common::OWNER_A)?)
        .json(&json!({ "type": "multi_use", "maxUsage": 0 }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    Ok(())
}

#[tokio::test]
async fn foreign_owner_sees_not_found() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context.create_invite(json!({ "type": "single_use" })).await?;
    let token_b = context.token_for(OWNER_B)?;

    let read = context
        .http_client
        .get(format!("{}/invites/{}", context.base_url, created.invite.id))
        .bearer_auth(&token_b)
        .send()
        .await?;
    let revoke = context
        .http_client
        .post(format!(
            "{}/invites/{}/revoke",
            context.base_url, created.invite.id
        ))
        .bearer_auth(&token_b)
        .send()
        .await?;
    let create = context
        .http_client
        .post(format!("{}/gallery/{GALLERY_A}/invites", context.base_url))
        .bearer_auth(&token_b)
        .json(&json!({ "type": "single_use" }))
        .send()
        .await?;
    let own_gallery = context
        .http_client
        .get(format!("{}/gallery/{GALLERY_B}/invites", context.base_url))
        .bearer_auth(&token_b)
        .send()
        .await?;

    assert_eq!(read.status(), StatusCode::NOT_FOUND);
    assert_eq!(revoke.status(), StatusCode::NOT_FOUND);
    assert_eq!(create.status(), StatusCode::NOT_FOUND);
    assert_eq!(own_gallery.status(), StatusCode::OK);
    assert_eq!(
        context.get_invite(created.invite.id).await?.invite.status,
        InviteStatus::Pending
    );
    Ok(())
}

#[tokio::test]
async fn single_use_invite_admits_exactly_one_visit() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({ "type": "single_use", "permissions": all_permissions() }))
        .await?;
    let code = created.invite.code.clone();

    // Validation never consumes.
    for _ in 0..3 {
        let response = validate(&context, &code).await?;
        assert_eq!(response.status(), StatusCode::OK);
        let valid: ValidInvite = response.json().await?;
        assert_eq!(valid.gallery.id, GALLERY_A);
    }
    assert_eq!(context.get_invite(created.invite.id).await?.invite.usage_count, 0);

    let entered = authorize(&context, &code, "view", "visit-1", None).await?;
    assert_eq!(entered.status(), StatusCode::OK);
    let entered: OperationContext = entered.json().await?;
    let receipt = entered.usage.ok_or_else(|| color_eyre::eyre::eyre!("no receipt"))?;
    assert_eq!(receipt.usage_count, 1);
    assert_eq!(receipt.status, InviteStatus::Expired);

    // The same visit keeps working inside the gallery.
    let download = authorize(&context, &code, "download", "visit-1", Some("photo-a2")).await?;
    assert_eq!(download.status(), StatusCode::OK);
    let download: OperationContext = download.json().await?;
    assert!(download.usage.is_none());

    let second_visit = authorize(&context, &code, "view", "visit-2", None).await?;
    assert_eq!(second_visit.status(), StatusCode::GONE);
    assert_eq!(validate(&context, &code).await?.status(), StatusCode::GONE);

    let summary = context.get_invite(created.invite.id).await?;
    assert_eq!(summary.invite.usage_count, 1);
    assert_eq!(summary.effective_status, EffectiveStatus::Exhausted);
    Ok(())
}

#[tokio::test]
async fn authorize_checks_permissions_and_photo_gallery() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({ "type": "multi_use", "maxUsage": 10 }))
        .await?;
    let code = created.invite.code.clone();

    let favorite = authorize(&context, &code, "favorite", "visit-1", Some("photo-a1")).await?;
    let foreign_photo = authorize(&context, &code, "view", "visit-1", Some("photo-b1")).await?;
    let unknown_code = authorize(&context, "NoSuchCode12", "view", "visit-1", None).await?;

    assert_eq!(favorite.status(), StatusCode::FORBIDDEN);
    assert_eq!(foreign_photo.status(), StatusCode::NOT_FOUND);
    assert_eq!(unknown_code.status(), StatusCode::GONE);
    assert_eq!(context.get_invite(created.invite.id).await?.invite.usage_count, 0);
    Ok(())
}

#[tokio::test]
async fn revoked_invite_is_gone_for_visitors() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({ "type": "multi_use", "maxUsage": 5 }))
        .await?;
    let code = created.invite.code.clone();
    assert_eq!(
        authorize(&context, &code, "view", "visit-1", None)
            .await?
            .status(),
        StatusCode::OK
    );

    let revoked: InviteSummary = context
        .http_client
        .post(format!(
            "{}/invites/{}/revoke",
            context.base_url, created.invite.id
        ))
        .bearer_auth(context.token_for(common::OWNER_A)?)
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert_eq!(revoked.invite.status, InviteStatus::Revoked);

    // Revocation also ends visits that already entered.
    let same_visit = authorize(&context, &code, "view", "visit-1", None).await?;
    let body: Value = same_visit.json().await?;
    assert_eq!(body["error"], "This invite is no longer valid.");
    assert_eq!(validate(&context, &code).await?.status(), StatusCode::GONE);
    Ok(())
}

#[tokio::test]
async fn update_extends_but_never_revives() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({
            "type": "time_limited",
            "expiresAt": Utc::now() + Duration::hours(2),
        }))
        .await?;
    let url = format!("{}/invites/{}", context.base_url, created.invite.id);
    let token = context.token_for(common::OWNER_A)?;

    let extended: InviteSummary = context
        .http_client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({
            "expiresAt": Utc::now() + Duration::days(30),
            "canDownload": true,
            "clientEmail": null,
        }))
        .send()
        .await?
        .error_for_status()?
        .json()
        .await?;
    assert!(extended.invite.permissions.can_download);
    assert!(extended.invite.client_email.is_none());
    assert_eq!(extended.invite.invite_type, InviteType::TimeLimited);

    context
        .http_client
        .post(format!("{url}/revoke"))
        .bearer_auth(&token)
        .send()
        .await?
        .error_for_status()?;
    let revive = context
        .http_client
        .patch(&url)
        .bearer_auth(&token)
        .json(&json!({ "status": "active" }))
        .send()
        .await?;

    assert_eq!(revive.status(), StatusCode::BAD_REQUEST);
    assert_eq!(
        context.get_invite(created.invite.id).await?.invite.status,
        InviteStatus::Revoked
    );
    Ok(())
}

#[tokio::test]
async fn deleted_invite_stops_working() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context.create_invite(json!({ "type": "single_use" })).await?;
    let url = format!("{}/invites/{}", context.base_url, created.invite.id);
    let token = context.token_for(common::OWNER_A)?;

    let deleted = context
        .http_client
        .delete(&url)
        .bearer_auth(&token)
        .send()
        .await?;
    let read = context
        .http_client
        .get(&url)
        .bearer_auth(&token)
        .send()
        .await?;

    assert_eq!(deleted.status(), StatusCode::NO_CONTENT);
    assert_eq!(read.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        validate(&context, &created.invite.code).await?.status(),
        StatusCode::GONE
    );
    Ok(())
}

#[tokio::test]
async fn favorite_toggle_is_deduplicated_by_toggle_id() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({ "type": "multi_use", "maxUsage": 5, "permissions": all_permissions() }))
        .await?;
    let payload = json!({
        "code": created.invite.code,
        "photoId": "photo-a1",
        "favorited": true,
        "toggleId": Uuid::new_v4(),
        "visitKey": "visit-1",
    });

    let mut responses = Vec::new();
    for _ in 0..2 {
        let response: ToggleFavoriteResponse = context
            .http_client
            .post(format!("{}/invite/favorite", context.base_url))
            .json(&payload)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        responses.push(response);
    }

    assert_eq!(responses[0].favorite_count, 1);
    assert!(!responses[0].replayed);
    assert_eq!(responses[1].favorite_count, 1);
    assert!(responses[1].replayed);
    assert_eq!(context.get_invite(created.invite.id).await?.invite.usage_count, 1);
    Ok(())
}

#[tokio::test]
async fn reconciler_syncs_device_favorites_over_http() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({ "type": "multi_use", "maxUsage": 5, "permissions": all_permissions() }))
        .await?;
    let code = created.invite.code.clone();

    let api = HttpFavoriteApi::new(
        context.http_client.clone(),
        Url::parse(&format!("{}/", context.base_url))?,
    );
    let reconciler = FavoritesReconciler::new(
        Arc::new(MemoryFavoriteStore::new()),
        Arc::new(api),
        VisitContext::new("device-visit"),
    );
    let photo = favorite_photo("photo-a1");

    let favorited = reconciler.toggle(&code, &photo).await?;
    assert_eq!(favorited.state, FavoriteState::Favorited);
    assert_eq!(favorited.favorite_count, 1);
    assert_eq!(reconciler.favorites(&code).await?, vec![photo.clone()]);

    let photo_ids = vec!["photo-a1".to_owned(), "photo-a2".to_owned(), "photo-b1".to_owned()];
    let counts = reconciler.counts(&code, &photo_ids).await?;
    let counted: Vec<(String, i32)> = counts
        .into_iter()
        .map(|c| (c.photo_id, c.favorite_count))
        .collect();
    assert_eq!(
        counted,
        vec![("photo-a1".to_owned(), 1), ("photo-a2".to_owned(), 0)]
    );

    let unfavorited = reconciler.toggle(&code, &photo).await?;
    assert_eq!(unfavorited.state, FavoriteState::NotFavorited);
    assert_eq!(unfavorited.favorite_count, 0);
    assert!(reconciler.favorites(&code).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn reconciler_keeps_device_state_when_server_refuses() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context.create_invite(json!({ "type": "multi_use", "maxUsage": 5 })).await?;
    let code = created.invite.code.clone();

    let reconciler = FavoritesReconciler::new(
        Arc::new(MemoryFavoriteStore::new()),
        Arc::new(HttpFavoriteApi::new(
            context.http_client.clone(),
            Url::parse(&format!("{}/", context.base_url))?,
        )),
        VisitContext::new("device-visit"),
    );

    let result = reconciler.toggle(&code, &favorite_photo("photo-a1")).await;

    assert!(result.is_err());
    assert!(reconciler.favorites(&code).await?.is_empty());
    Ok(())
}

#[tokio::test]
async fn unanswered_toggle_is_resent_once_the_server_is_back() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context
        .create_invite(json!({ "type": "multi_use", "maxUsage": 5, "permissions": all_permissions() }))
        .await?;
    let code = created.invite.code.clone();
    let device = Arc::new(MemoryFavoriteStore::new());

    let closed = TcpListener::bind("127.0.0.1:0").await?;
    let closed_url = Url::parse(&format!("http://{}/", closed.local_addr()?))?;
    drop(closed);
    let offline = FavoritesReconciler::new(
        device.clone(),
        Arc::new(
            HttpFavoriteApi::new(context.http_client.clone(), closed_url).with_max_retries(0),
        ),
        VisitContext::new("device-visit"),
    );
    let online = FavoritesReconciler::new(
        device,
        Arc::new(HttpFavoriteApi::new(
            context.http_client.clone(),
            Url::parse(&format!("{}/", context.base_url))?,
        )),
        VisitContext::new("device-visit"),
    );
    let picture = favorite_photo("photo-a1");

    let unanswered = offline.toggle(&code, &picture).await;
    assert!(unanswered.is_err());
    assert_eq!(online.state(&code, "photo-a1").await?, FavoriteState::NotFavorited);

    let resent = online.toggle(&code, &picture).await?;
    assert_eq!(resent.state, FavoriteState::Favorited);
    assert_eq!(resent.favorite_count, 1);

    let counts = online.counts(&code, &["photo-a1".to_owned()]).await?;
    assert_eq!(counts[0].favorite_count, 1);
    Ok(())
}

#[tokio::test]
async fn storage_fault_is_reported_as_unavailable() -> Result<()> {
    let context = TestContext::with_invite_store(Arc::new(FailingInviteStore)).await?;

    let validated = validate(&context, "AnyCode12345").await?;
    let authorized = authorize(&context, "AnyCode12345", "view", "visit-1", None).await?;
    let health = context
        .http_client
        .get(format!("{}/health", context.base_url))
        .send()
        .await?;

    assert_eq!(validated.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(authorized.status(), StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(health.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = validated.json().await?;
    assert_eq!(body["error"], "The system is temporarily unavailable.");
    Ok(())
}

#[tokio::test]
async fn favorite_counts_reject_oversized_requests() -> Result<()> {
    let context = TestContext::new().await?;
    let created = context.create_invite(json!({ "type": "multi_use", "maxUsage": 5 })).await?;
    let photo_ids: Vec<String> = (0..501).map(|i| format!("photo-{i}")).collect();

    let response = context
        .http_client
        .post(format!("{}/invite/favorite-counts", context.base_url))
        .json(&json!({
            "code": created.invite.code,
            "photoIds": photo_ids,
            "visitKey": "visit-1",
        }))
        .send()
        .await?;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let counts = context
        .http_client
        .post(format!("{}/invite/favorite-counts", context.base_url))
        .json(&json!({
            "code": created.invite.code,
            "photoIds": ["photo-a2"],
            "visitKey": "visit-1",
        }))
        .send()
        .await?;
    let counts: FavoriteCountsResponse = counts.error_for_status()?.json().await?;
    assert_eq!(counts.counts.len(), 1);
    Ok(())
}
