/*
 * Responsibility
 * - Load Config -> build dependencies -> assemble the Router
 * - Layer order: error normalizer (outermost) -> http plumbing -> routes
 * - Start with axum::serve() (with connect info for caller ips)
 */
use std::{net::SocketAddr, panic, process, sync::Arc};

use anyhow::Result;
use axum::{Router, http::StatusCode};
use sqlx::postgres::PgPoolOptions;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    api,
    config::Config,
    error::AppError,
    middleware,
    services::{
        auth::CredentialVerifier,
        entitlement::{EntitlementLookup, PgEntitlementLookup},
    },
    state::AppState,
};

fn init_tracing() {
    // Prefer RUST_LOG if set; otherwise use a sensible default.
    // Ex:
    // RUST_LOG=info,content_gate=debug,tower_http=debug cargo run
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info,tower_http=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn init_panic_hook(abort_on_panic: bool) {
    let default_hook = panic::take_hook();

    panic::set_hook(Box::new(move |info| {
        // Always surface panics via tracing so they don't get lost
        tracing::error!(?info, "panic");

        if abort_on_panic {
            process::abort();
        } else {
            default_hook(info);
        }
    }))
}

pub async fn run() -> Result<()> {
    init_tracing();
    let config = Config::from_env()?;

    init_panic_hook(config.app_env.is_development());

    tracing::info!(
        "starting content gate in {:?} mode on {}",
        config.app_env,
        config.addr
    );

    let state = build_state(&config)?;
    let app = build_router(state);

    let listener = tokio::net::TcpListener::bind(config.addr).await?;
    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .await?;
    Ok(())
}

fn build_state(config: &Config) -> Result<AppState> {
    // Connections are opened on first use so the gate can start before the db.
    let db = PgPoolOptions::new()
        .max_connections(config.database_max_connections)
        .connect_lazy(&config.database_url)?;

    let verifier = Arc::new(CredentialVerifier::new(
        &config.jwt_secret,
        config.token_leeway_seconds,
    ));
    let entitlements: Arc<dyn EntitlementLookup> = Arc::new(PgEntitlementLookup::new(
        db,
        config.entitlement_lookup_timeout,
    ));

    Ok(AppState::new(verifier, entitlements, config.app_env))
}

async fn route_not_found() -> AppError {
    AppError::not_found("route")
}

async fn method_not_allowed() -> AppError {
    AppError::status(StatusCode::METHOD_NOT_ALLOWED, "Method Not Allowed")
}

pub fn build_router(state: AppState) -> Router {
    let app_env = state.app_env;

    let router = Router::new()
        .nest("/api/v1", api::v1::routes(state.clone()))
        .fallback(route_not_found)
        // only reaches routes registered above
        .method_not_allowed_fallback(method_not_allowed)
        .with_state(state);

    let router = middleware::http::apply(router);
    middleware::error_normalizer::apply(router, app_env)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode, header},
    };
    use serde_json::{Value, json};
    use tower::ServiceExt;

    use super::*;
    use crate::config::AppEnv;
    use crate::middleware::auth::entitlement::VIDEO_ACCESS_DENIED;
    use crate::services::auth::Role;
    use crate::services::auth::credentials::testing::{SECRET, mint};
    use crate::services::entitlement::fakes::{FailingLookup, StaticLookup};

    fn router_with(lookup: Arc<dyn EntitlementLookup>, app_env: AppEnv) -> Router {
        let verifier = Arc::new(CredentialVerifier::new(SECRET, 0));
        build_router(AppState::new(verifier, lookup, app_env))
    }

    fn router() -> Router {
        router_with(Arc::new(StaticLookup::denying()), AppEnv::Production)
    }

    fn get(uri: &str, token: Option<&str>) -> Request<Body> {
        let mut builder = Request::builder().uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        builder.body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, token: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn send(app: Router, req: Request<Body>) -> (StatusCode, Value) {
        let res = app.oneshot(req).await.unwrap();
        let status = res.status();
        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes).unwrap()
        };
        (status, body)
    }

    #[tokio::test]
    async fn health_is_public() {
        let (status, body) = send(router(), get("/api/v1/health", None)).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"status": "ok"}));
    }

    #[tokio::test]
    async fn missing_token_is_401() {
        let (status, body) = send(router(), get("/api/v1/me", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthorized");
        assert_eq!(body["path"], "/api/v1/me");
        assert!(body["timestamp"].as_str().unwrap().ends_with('Z'));
        assert!(body.get("stackTrace").is_none());
    }

    #[tokio::test]
    async fn wrong_secret_is_a_plain_401() {
        let token = crate::services::auth::credentials::testing::sign(
            "someone-elses-secret",
            &crate::services::auth::TokenClaims {
                subject_id: "user-1".into(),
                role: Role::Admin,
                issued_at: chrono::Utc::now().timestamp(),
                expires_at: chrono::Utc::now().timestamp() + 600,
            },
        );

        let (status, body) = send(router(), get("/api/v1/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Unauthorized");
    }

    #[tokio::test]
    async fn expired_token_is_401() {
        let token = mint("user-1", Role::Member, -30);
        let (status, _) = send(router(), get("/api/v1/me", Some(&token))).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn member_route_accepts_members_and_admins() {
        for role in [Role::Member, Role::Admin] {
            let token = mint("user-1", role, 600);
            let (status, body) = send(router(), get("/api/v1/me", Some(&token))).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body["subjectId"], "user-1");
            assert_eq!(body["role"], role.as_str());
        }
    }

    #[tokio::test]
    async fn admin_route_rejects_members_with_403() {
        let token = mint("user-1", Role::Member, 600);
        let (status, body) = send(router(), get("/api/v1/admin/overview", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["success"], false);

        let token = mint("root", Role::Admin, 600);
        let (status, body) = send(router(), get("/api/v1/admin/overview", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["environment"], "production");
    }

    #[tokio::test]
    async fn admin_streams_without_entitlement_lookup() {
        let lookup = Arc::new(StaticLookup::denying());
        let app = router_with(lookup.clone(), AppEnv::Production);

        let token = mint("root", Role::Admin, 600);
        let (status, body) = send(app, get("/api/v1/videos/intro/stream", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["access"], "granted");
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn member_without_purchase_gets_domain_denial() {
        let lookup = Arc::new(StaticLookup::denying());
        let app = router_with(lookup.clone(), AppEnv::Production);

        let token = mint("customer-1", Role::Member, 600);
        let (status, body) = send(app, get("/api/v1/videos/intro/stream", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], VIDEO_ACCESS_DENIED);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn member_with_purchase_streams() {
        let lookup = Arc::new(StaticLookup::granting());
        let app = router_with(lookup.clone(), AppEnv::Production);

        let token = mint("customer-1", Role::Member, 600);
        let (status, body) = send(app, get("/api/v1/videos/intro/stream", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["subjectId"], "customer-1");
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn entitlement_store_failure_is_indistinguishable_from_no_purchase() {
        let lookup = Arc::new(FailingLookup::default());
        let app = router_with(lookup.clone(), AppEnv::Production);

        let token = mint("customer-1", Role::Member, 600);
        let (status, body) = send(app, get("/api/v1/videos/intro/stream", Some(&token))).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["message"], VIDEO_ACCESS_DENIED);
        assert_eq!(lookup.calls(), 1);
    }

    #[tokio::test]
    async fn video_routes_authenticate_before_the_gate() {
        let lookup = Arc::new(StaticLookup::granting());
        let app = router_with(lookup.clone(), AppEnv::Production);

        let (status, _) = send(app, get("/api/v1/videos/intro/stream", None)).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(lookup.calls(), 0);
    }

    #[tokio::test]
    async fn optional_auth_never_aborts() {
        let expired = mint("user-1", Role::Member, -30);
        for token in [None, Some("garbage"), Some(expired.as_str())] {
            let (status, body) = send(router(), get("/api/v1/catalog", token)).await;
            assert_eq!(status, StatusCode::OK);
            assert_eq!(body, json!({"personalized": false, "viewer": null}));
        }

        let token = mint("user-1", Role::Member, 600);
        let (status, body) = send(router(), get("/api/v1/catalog", Some(&token))).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!({"personalized": true, "viewer": "user-1"}));
    }

    #[tokio::test]
    async fn progress_validation_reports_fields_in_order() {
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let req = post_json(
            "/api/v1/videos/intro/progress",
            &token,
            r#"{"positionSeconds": -5, "durationSeconds": 0}"#,
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(
            body["details"],
            json!([
                {"field": "positionSeconds", "message": "must be a number >= 0"},
                {"field": "durationSeconds", "message": "must be a number > 0"},
            ])
        );
    }

    #[tokio::test]
    async fn malformed_body_is_a_validation_error() {
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let req = post_json("/api/v1/videos/intro/progress", &token, "{not json");
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["details"][0]["field"], "body");
    }

    #[tokio::test]
    async fn progress_is_accepted() {
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let req = post_json(
            "/api/v1/videos/intro/progress",
            &token,
            r#"{"positionSeconds": 600, "durationSeconds": 600, "playback": {"rate": 1.0}}"#,
        );
        let (status, body) = send(app, req).await;
        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(body["completed"], true);
    }

    #[tokio::test]
    async fn bad_video_id_is_a_validation_failure() {
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let (status, body) = send(app, get("/api/v1/videos/a.b/stream", Some(&token))).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "Invalid video id");
        assert_eq!(body["details"][0]["field"], "videoId");
    }

    #[tokio::test]
    async fn unknown_routes_are_normalized_404s() {
        let (status, body) = send(router(), get("/api/v1/nope", None)).await;
        assert_eq!(status, StatusCode::NOT_FOUND);
        assert_eq!(body["message"], "route not found");
        assert_eq!(body["path"], "/api/v1/nope");
    }

    #[tokio::test]
    async fn development_mode_only_adds_stack_trace() {
        let prod = router_with(Arc::new(StaticLookup::denying()), AppEnv::Production);
        let dev = router_with(Arc::new(StaticLookup::denying()), AppEnv::Development);

        let (_, mut prod_body) = send(prod, get("/api/v1/me", None)).await;
        let (_, mut dev_body) = send(dev, get("/api/v1/me", None)).await;

        assert!(prod_body.get("stackTrace").is_none());
        assert!(dev_body["stackTrace"].as_str().is_some());

        for body in [&mut prod_body, &mut dev_body] {
            let obj = body.as_object_mut().unwrap();
            obj.remove("timestamp");
            obj.remove("stackTrace");
        }
        assert_eq!(prod_body, dev_body);
    }

    #[tokio::test]
    async fn request_id_survives_normalization() {
        let req = Request::builder()
            .uri("/api/v1/me")
            .header("x-request-id", "req-123")
            .body(Body::empty())
            .unwrap();
        let res = router().oneshot(req).await.unwrap();

        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(res.headers().get("x-request-id").unwrap(), "req-123");
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );
    }

    #[tokio::test]
    async fn undecodable_path_param_is_normalized() {
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let res = app
            .oneshot(get("/api/v1/videos/%FF/stream", Some(&token)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Validation error");
        assert_eq!(body["details"][0]["field"], "path");
        assert_eq!(body["path"], "/api/v1/videos/%FF/stream");
    }

    #[tokio::test]
    async fn wrong_method_is_a_normalized_405() {
        let req = Request::builder()
            .method("DELETE")
            .uri("/api/v1/health")
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(router(), req).await;

        assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Method Not Allowed");
        assert_eq!(body["path"], "/api/v1/health");
    }

    fn oversized_progress(token: &str) -> Request<Body> {
        let len = 2 * 1024 * 1024;
        Request::builder()
            .method("POST")
            .uri("/api/v1/videos/intro/progress")
            .header(header::AUTHORIZATION, format!("Bearer {token}"))
            .header(header::CONTENT_TYPE, "application/json")
            .header(header::CONTENT_LENGTH, len)
            .body(Body::from(vec![b' '; len]))
            .unwrap()
    }

    #[tokio::test]
    async fn oversized_body_is_a_normalized_413() {
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let res = app.oneshot(oversized_progress(&token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(
            res.headers().get(header::CONTENT_TYPE).unwrap(),
            "application/json"
        );

        let bytes = axum::body::to_bytes(res.into_body(), usize::MAX)
            .await
            .unwrap();
        let body: Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["message"], "Payload Too Large");
        assert_eq!(body["path"], "/api/v1/videos/intro/progress");
        assert!(body["timestamp"].as_str().is_some());
    }

    #[tokio::test]
    async fn verification_reason_is_logged_but_not_returned() {
        let (logs, _guard) = crate::log_capture::CapturedLogs::install();

        let token = crate::services::auth::credentials::testing::sign(
            "someone-elses-secret",
            &crate::services::auth::TokenClaims {
                subject_id: "user-1".into(),
                role: Role::Member,
                issued_at: chrono::Utc::now().timestamp(),
                expires_at: chrono::Utc::now().timestamp() + 600,
            },
        );
        let mut req = get("/api/v1/me", Some(&token));
        req.headers_mut()
            .insert("x-forwarded-for", "203.0.113.9".parse().unwrap());

        let (status, body) = send(router(), req).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["message"], "Unauthorized");
        assert!(!body.to_string().contains("signature"));

        let reasons = logs.lines_containing("reason=");
        assert_eq!(reasons.len(), 1);
        assert!(reasons[0].contains("signature_mismatch"));

        let records = logs.lines_containing("request rejected:");
        assert_eq!(records.len(), 1);
        let record = &records[0];
        assert!(record.contains("Unauthorized"));
        assert!(record.contains("stack="));
        assert!(record.contains("url=/api/v1/me"));
        assert!(record.contains("method=GET"));
        assert!(record.contains("ip=203.0.113.9"));
    }

    #[tokio::test]
    async fn framework_failures_are_logged_once() {
        let (logs, _guard) = crate::log_capture::CapturedLogs::install();
        let app = router_with(Arc::new(StaticLookup::granting()), AppEnv::Production);
        let token = mint("customer-1", Role::Member, 600);

        let res = app.oneshot(oversized_progress(&token)).await.unwrap();
        assert_eq!(res.status(), StatusCode::PAYLOAD_TOO_LARGE);

        let records = logs.lines_containing("request rejected:");
        assert_eq!(records.len(), 1);
        assert!(records[0].contains("status=413"));
        assert!(records[0].contains("url=/api/v1/videos/intro/progress"));
        assert!(records[0].contains("method=POST"));
        assert!(records[0].contains("ip=unknown"));
    }
}
