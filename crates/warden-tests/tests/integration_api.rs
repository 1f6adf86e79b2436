// SPDX-License-Identifier: PolyForm-Noncommercial-1.0.0
// Copyright (c) 2025 Sylvex. All rights reserved.

//! # API Integration Tests
//!
//! HTTP-level tests through the full router and middleware stack.
//!
//! ## Test Categories
//!
//! - `test_login_*`: Credential exchange
//! - `test_rate_limit_*`: Login and refresh throttling
//! - `test_refresh_*`: Refresh rotation over HTTP
//! - `test_protected_*`: Bearer authentication and RBAC on routes
//! - `test_password_*`: Password change
//! - `test_response_*`: Envelopes, headers and error bodies
//! - `test_health_*`: Liveness endpoint

use std::time::Duration;

use axum::http::Method;
use serde_json::json;

use warden_core::seed::USER_ROLE;
use warden_core::AuditAction;
use warden_tests::prelude::*;

// =============================================================================
// Test Helpers
// =============================================================================

/// Creates `username` with the regular user role and logs it in.
async fn regular_user(app: &TestApp, username: &str) -> IssuedTokens {
    PrincipalBuilder::new(username)
        .role(USER_ROLE)
        .create(app.store.as_ref(), &app.hasher)
        .await;
    app.login_ok(username, USER_PASSWORD).await
}

// =============================================================================
// Login Tests
// =============================================================================

#[tokio::test]
async fn test_login_returns_token_pair() {
    let app = TestApp::new().await;

    let response = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    response.assert_success();

    let data = response.data();
    assert_eq!(data["username"], ADMIN_USERNAME);
    assert_eq!(data["token_type"], "bearer");
    assert_eq!(data["expires_in"], ACCESS_TTL.as_secs());
    assert!(data["access_token"].as_str().is_some_and(|t| t.split('.').count() == 3));
    assert!(data["refresh_token"].as_str().is_some_and(|t| !t.is_empty()));
}

#[tokio::test]
async fn test_login_alias_route() {
    let app = TestApp::new().await;
    let body = json!({ "username": ADMIN_USERNAME, "password": ADMIN_PASSWORD });

    app.post_json(paths::LOGIN, None, body)
        .await
        .assert_success();
}

#[tokio::test]
async fn test_login_failures_are_generic() {
    let app = TestApp::new().await;

    let wrong_password = app.login(ADMIN_USERNAME, "wrong-password").await;
    let unknown_user = app.login("ghost", ADMIN_PASSWORD).await;

    for response in [&wrong_password, &unknown_user] {
        response
            .assert_error(StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS")
            .assert_header("www-authenticate", "Bearer")
            .assert_no_detail();
    }
    assert_eq!(wrong_password.body, unknown_user.body);
    assert!(!unknown_user.body.to_string().contains("ghost"));
}

#[tokio::test]
async fn test_login_inactive_account() {
    let app = TestApp::new().await;
    PrincipalBuilder::new("dormant")
        .inactive()
        .create(app.store.as_ref(), &app.hasher)
        .await;

    app.login("dormant", USER_PASSWORD)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "ACCOUNT_INACTIVE");
}

#[tokio::test]
async fn test_login_request_validation() {
    let app = TestApp::new().await;

    app.post_json(paths::ACCESS_TOKEN, None, json!({ "username": ADMIN_USERNAME }))
        .await
        .assert_error(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");

    app.post_json(
        paths::ACCESS_TOKEN,
        None,
        json!({ "username": "   ", "password": "x" }),
    )
    .await
    .assert_error(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");

    let malformed = axum::http::Request::builder()
        .method(Method::POST)
        .uri(paths::ACCESS_TOKEN)
        .header("content-type", "application/json")
        .body(axum::body::Body::from("{not json"))
        .unwrap();
    app.send(malformed)
        .await
        .assert_error(StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_login_records_audit_without_request_entry() {
    let app = TestApp::new().await;
    app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.audit.assert_action_count(AuditAction::Login, 1);
    let entry = &app.audit.entries_for_action(AuditAction::Login)[0];
    assert_eq!(entry.client_ip, Some(ClientFixtures::default_client().ip()));
    // The login path is excluded from request-level auditing.
    app.audit.assert_action_count(AuditAction::Request, 0);
}

// =============================================================================
// Rate Limit Tests
// =============================================================================

#[tokio::test]
async fn test_rate_limit_login_sixth_attempt_rejected() {
    let app = TestApp::new().await;

    for _ in 0..LOGIN_LIMIT {
        app.login(ADMIN_USERNAME, "wrong-password")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }

    let limited = app.login(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    limited
        .assert_error(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED")
        .assert_header("retry-after", "60");

    // Other clients have their own budget.
    app.login_from(ClientFixtures::client(2), ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .assert_success();

    // The window resets.
    app.advance(Duration::from_secs(60));
    app.login(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .assert_success();
}

#[tokio::test]
async fn test_rate_limit_retry_after_shrinks() {
    let app = TestApp::new().await;
    for _ in 0..LOGIN_LIMIT {
        app.login(ADMIN_USERNAME, "wrong-password").await;
    }

    app.advance(Duration::from_secs(45));
    app.login(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .assert_status(StatusCode::TOO_MANY_REQUESTS)
        .assert_header("retry-after", "15");
}

#[tokio::test]
async fn test_rate_limit_refresh_bucket_is_separate() {
    let app = TestApp::new().await;
    let tokens = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    for _ in 0..REFRESH_LIMIT {
        app.refresh("not-a-token")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
    app.refresh(&tokens.refresh_token)
        .await
        .assert_error(StatusCode::TOO_MANY_REQUESTS, "RATE_LIMITED");

    // Logins are counted separately; one was spent above.
    app.login(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .assert_success();
}

#[tokio::test]
async fn test_rate_limit_disabled() {
    let app = TestApp::with_config(ConfigFixtures::unlimited_api_config()).await;

    for _ in 0..(LOGIN_LIMIT * 2) {
        app.login(ADMIN_USERNAME, "wrong-password")
            .await
            .assert_status(StatusCode::UNAUTHORIZED);
    }
    app.login(ADMIN_USERNAME, ADMIN_PASSWORD)
        .await
        .assert_success();
}

// =============================================================================
// Refresh Tests
// =============================================================================

#[tokio::test]
async fn test_refresh_rotates_and_rejects_reuse() {
    let app = TestApp::new().await;
    let first = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.advance(Duration::from_secs(120));
    let rotated = app.refresh(&first.refresh_token).await;
    rotated.assert_success();
    let second = IssuedTokens::from_body(&rotated.body);
    assert_ne!(second.refresh_token, first.refresh_token);

    app.refresh(&first.refresh_token)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "INVALID_TOKEN")
        .assert_no_detail();

    // Reuse revoked the session, including the token issued from it.
    app.refresh(&second.refresh_token)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_refresh_concurrent_sessions_survive_each_other() {
    let app = TestApp::new().await;
    let laptop = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    app.advance(Duration::from_secs(5));
    let phone = app
        .login_from(ClientFixtures::client(2), ADMIN_USERNAME, ADMIN_PASSWORD)
        .await;
    phone.assert_success();
    let phone = IssuedTokens::from_body(&phone.body);
    app.advance(Duration::from_secs(5));

    let laptop = app.refresh(&laptop.refresh_token).await;
    laptop.assert_success();
    let laptop = IssuedTokens::from_body(&laptop.body);
    app.refresh(&phone.refresh_token).await.assert_success();

    // The phone's spent token is rejected; the laptop is unaffected.
    app.refresh(&phone.refresh_token)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
    app.refresh(&laptop.refresh_token).await.assert_success();
}

#[tokio::test]
async fn test_refresh_rejects_access_token() {
    let app = TestApp::new().await;
    let tokens = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.refresh(&tokens.access_token)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "WRONG_TOKEN_TYPE");
}

#[tokio::test]
async fn test_refresh_expired() {
    let app = TestApp::new().await;
    let tokens = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.advance(REFRESH_TTL + Duration::from_secs(1));
    app.refresh(&tokens.refresh_token)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_refresh_alias_route() {
    let app = TestApp::new().await;
    let tokens = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.post_json(
        paths::REFRESH,
        None,
        json!({ "refresh_token": tokens.refresh_token }),
    )
    .await
    .assert_success();
}

// =============================================================================
// Protected Route Tests
// =============================================================================

#[tokio::test]
async fn test_protected_requires_bearer_token() {
    let app = TestApp::new().await;

    app.get(paths::USERINFO, None)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "MISSING_TOKEN")
        .assert_header("www-authenticate", "Bearer");

    app.get(paths::USER_LIST, Some("garbage"))
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "INVALID_TOKEN");
}

#[tokio::test]
async fn test_protected_rejects_refresh_token_as_bearer() {
    let app = TestApp::new().await;
    let tokens = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.get(paths::USERINFO, Some(&tokens.refresh_token))
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "WRONG_TOKEN_TYPE");
}

#[tokio::test]
async fn test_protected_access_token_expires() {
    let app = TestApp::new().await;
    let tokens = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.advance(ACCESS_TTL - Duration::from_secs(1));
    app.get(paths::USERINFO, Some(&tokens.access_token))
        .await
        .assert_success();

    app.advance(Duration::from_secs(1));
    app.get(paths::USERINFO, Some(&tokens.access_token))
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "TOKEN_EXPIRED");
}

#[tokio::test]
async fn test_protected_userinfo_hides_password_hash() {
    let app = TestApp::new().await;
    let tokens = regular_user(&app, "bob").await;

    let response = app.get(paths::USERINFO, Some(&tokens.access_token)).await;
    response.assert_success();

    let data = response.data();
    assert_eq!(data["username"], "bob");
    assert_eq!(data["email"], "bob@example.com");
    assert_eq!(data["is_superuser"], false);
    assert_eq!(data["role_names"], json!([USER_ROLE]));
    assert!(data.get("password_hash").is_none());
    assert!(!response.body.to_string().contains("argon2"));
}

#[tokio::test]
async fn test_protected_userapi_filters_catalog() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let bob = regular_user(&app, "bob").await;

    let catalog_len = warden_api::api_catalog().len();

    let for_admin = app.get(paths::USERAPI, Some(&admin.access_token)).await;
    for_admin.assert_success();
    assert_eq!(for_admin.data()["total"], catalog_len);

    let for_bob = app.get(paths::USERAPI, Some(&bob.access_token)).await;
    for_bob.assert_success();
    let items = for_bob.data()["items"].as_array().expect("items array");
    assert_eq!(items.len(), catalog_len - 1);
    assert!(items
        .iter()
        .all(|api| api["path"] != paths::USER_DEACTIVATE));
}

#[tokio::test]
async fn test_protected_rbac_denies_and_audits() {
    let app = TestApp::new().await;
    let bob = regular_user(&app, "bob").await;
    let carol = PrincipalBuilder::new("carol")
        .role(USER_ROLE)
        .create(app.store.as_ref(), &app.hasher)
        .await;

    app.get(paths::USER_LIST, Some(&bob.access_token))
        .await
        .assert_success();

    app.post_json(
        paths::USER_DEACTIVATE,
        Some(&bob.access_token),
        json!({ "user_id": carol.id }),
    )
    .await
    .assert_error(StatusCode::FORBIDDEN, "PERMISSION_DENIED");

    app.audit.assert_action_count(AuditAction::AccessDenied, 1);
    let carol = app.store.get_principal(carol.id).await.unwrap().unwrap();
    assert!(carol.is_active);
}

#[tokio::test]
async fn test_protected_superuser_deactivates_principal() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let bob = regular_user(&app, "bob").await;
    let bob_id = app
        .store
        .find_by_username("bob")
        .await
        .unwrap()
        .unwrap()
        .id;

    let response = app
        .post_json(
            paths::USER_DEACTIVATE,
            Some(&admin.access_token),
            json!({ "user_id": bob_id }),
        )
        .await;
    response.assert_success();
    assert_eq!(response.data()["principal"]["is_active"], false);

    app.audit.assert_succeeded(AuditAction::PrincipalDeactivate);

    // Bob's outstanding tokens stop working on the next request.
    app.get(paths::USERINFO, Some(&bob.access_token))
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "ACCOUNT_INACTIVE");
    app.refresh(&bob.refresh_token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_protected_cannot_deactivate_self() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let admin_id = app
        .store
        .find_by_username(ADMIN_USERNAME)
        .await
        .unwrap()
        .unwrap()
        .id;

    app.post_json(
        paths::USER_DEACTIVATE,
        Some(&admin.access_token),
        json!({ "user_id": admin_id }),
    )
    .await
    .assert_error(StatusCode::BAD_REQUEST, "BAD_REQUEST");
}

#[tokio::test]
async fn test_protected_superuser_target_needs_action_grant() {
    let app = TestApp::new().await;
    RoleBuilder::new("User Admin")
        .api("POST", paths::USER_DEACTIVATE)
        .create(app.store.as_ref())
        .await;
    PrincipalBuilder::new("dave")
        .role("User Admin")
        .create(app.store.as_ref(), &app.hasher)
        .await;
    let dave = app.login_ok("dave", USER_PASSWORD).await;
    let admin_id = app
        .store
        .find_by_username(ADMIN_USERNAME)
        .await
        .unwrap()
        .unwrap()
        .id;

    app.post_json(
        paths::USER_DEACTIVATE,
        Some(&dave.access_token),
        json!({ "user_id": admin_id }),
    )
    .await
    .assert_error(StatusCode::FORBIDDEN, "PERMISSION_DENIED");

    // The denial is audited against the real route, naming the action.
    let denied = app.audit.entries_for_action(AuditAction::AccessDenied);
    assert_eq!(denied.len(), 1);
    assert_eq!(denied[0].resource, paths::USER_DEACTIVATE);
    assert_eq!(denied[0].method.as_deref(), Some("POST"));
    assert_eq!(
        denied[0].details["action"],
        warden_api::handlers::DEACTIVATE_SUPERUSER_ACTION
    );
    app.audit.assert_action_count(AuditAction::PrincipalDeactivate, 0);
}

#[tokio::test]
async fn test_protected_superuser_target_detail_names_action() {
    let app = TestApp::builder()
        .config(ConfigFixtures::api_config().with_error_detail(true))
        .build()
        .await;
    RoleBuilder::new("User Admin")
        .api("POST", paths::USER_DEACTIVATE)
        .create(app.store.as_ref())
        .await;
    PrincipalBuilder::new("dave")
        .role("User Admin")
        .create(app.store.as_ref(), &app.hasher)
        .await;
    PrincipalBuilder::new("root2")
        .superuser()
        .create(app.store.as_ref(), &app.hasher)
        .await;
    let dave = app.login_ok("dave", USER_PASSWORD).await;
    let root2 = app.store.find_by_username("root2").await.unwrap().unwrap();

    let response = app
        .post_json(
            paths::USER_DEACTIVATE,
            Some(&dave.access_token),
            json!({ "user_id": root2.id }),
        )
        .await;
    response.assert_error(StatusCode::FORBIDDEN, "PERMISSION_DENIED");
    let detail = response.body["detail"].as_str().unwrap_or_default();
    assert!(detail.contains(warden_api::handlers::DEACTIVATE_SUPERUSER_ACTION));
    assert!(!detail.contains("superuser 2"));

    // Granting the action lets the same caller through.
    RoleBuilder::new("Superuser Admin")
        .action(warden_api::handlers::DEACTIVATE_SUPERUSER_ACTION)
        .create(app.store.as_ref())
        .await;
    PrincipalBuilder::new("erin")
        .role("User Admin")
        .role("Superuser Admin")
        .create(app.store.as_ref(), &app.hasher)
        .await;
    let erin = app.login_ok("erin", USER_PASSWORD).await;
    app.post_json(
        paths::USER_DEACTIVATE,
        Some(&erin.access_token),
        json!({ "user_id": root2.id }),
    )
    .await
    .assert_success();
}

#[tokio::test]
async fn test_protected_list_users_and_roles() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    regular_user(&app, "bob").await;

    let users = app.get(paths::USER_LIST, Some(&admin.access_token)).await;
    users.assert_success();
    assert_eq!(users.data()["total"], 2);
    assert!(!users.body.to_string().contains("password_hash"));

    let roles = app.get(paths::ROLE_LIST, Some(&admin.access_token)).await;
    roles.assert_success();
    let names: Vec<&str> = roles.data()["items"]
        .as_array()
        .expect("items array")
        .iter()
        .filter_map(|r| r["name"].as_str())
        .collect();
    assert!(names.contains(&"Administrator"));
    assert!(names.contains(&USER_ROLE));
}

#[tokio::test]
async fn test_protected_requests_are_audited() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.get(paths::USER_LIST, Some(&admin.access_token)).await;

    let requests = app.audit.entries_for_action(AuditAction::Request);
    assert_eq!(requests.len(), 1);
    assert_eq!(requests[0].method.as_deref(), Some("GET"));
    assert_eq!(requests[0].resource, paths::USER_LIST);
    assert_eq!(requests[0].status, Some(200));
    assert_eq!(requests[0].username.as_deref(), Some(ADMIN_USERNAME));
}

#[tokio::test]
async fn test_protected_audit_disabled() {
    let app = TestApp::with_config(ConfigFixtures::unaudited_api_config()).await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    app.get(paths::USER_LIST, Some(&admin.access_token)).await;
    app.audit.assert_action_count(AuditAction::Request, 0);
}

#[tokio::test]
async fn test_protected_audit_log_query_filters_and_pages() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    let bob = regular_user(&app, "bob").await;
    app.get(paths::USER_LIST, Some(&bob.access_token))
        .await
        .assert_success();

    let list = |query: &str| format!("{}?{query}", paths::AUDITLOG_LIST);

    let by_bob = app.get(&list("username=BOB&method=get"), Some(&admin.access_token)).await;
    by_bob.assert_success();
    assert_eq!(by_bob.data()["total"], 1);
    assert_eq!(by_bob.data()["items"][0]["resource"], paths::USER_LIST);
    assert_eq!(by_bob.data()["items"][0]["status"], 200);

    // Logins are recorded newest first under the session module.
    let logins = app.get(&list("module=session"), Some(&admin.access_token)).await;
    logins.assert_success();
    assert_eq!(logins.data()["total"], 2);
    assert_eq!(logins.data()["items"][0]["username"], "bob");

    let second_page = app
        .get(&list("module=session&page=2&page_size=1"), Some(&admin.access_token))
        .await;
    second_page.assert_success();
    assert_eq!(second_page.data()["total"], 2);
    assert_eq!(second_page.data()["page"], 2);
    let items = second_page.data()["items"].as_array().expect("items array");
    assert_eq!(items.len(), 1);
    assert_eq!(items[0]["username"], ADMIN_USERNAME);

    let future = app
        .get(&list("start_time=2999-01-01T00:00:00Z"), Some(&admin.access_token))
        .await;
    future.assert_success();
    assert_eq!(future.data()["total"], 0);

    let bounded = app
        .get(
            &list("module=session&start_time=2000-01-01T00:00:00Z&end_time=2999-01-01T00:00:00Z"),
            Some(&admin.access_token),
        )
        .await;
    assert_eq!(bounded.data()["total"], 2);
}

#[tokio::test]
async fn test_protected_audit_log_query_requires_permission() {
    let app = TestApp::new().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;
    PrincipalBuilder::new("dave")
        .create(app.store.as_ref(), &app.hasher)
        .await;
    let dave = app.login_ok("dave", USER_PASSWORD).await;

    app.get(paths::AUDITLOG_LIST, Some(&dave.access_token))
        .await
        .assert_error(StatusCode::FORBIDDEN, "PERMISSION_DENIED");

    let denied = app
        .get(
            &format!("{}?status=403&username=dave", paths::AUDITLOG_LIST),
            Some(&admin.access_token),
        )
        .await;
    denied.assert_success();
    let items = denied.data()["items"].as_array().expect("items array");
    assert!(!items.is_empty());
    assert!(items.iter().all(|entry| entry["status"] == 403));

    app.get(
        &format!("{}?page_size=0", paths::AUDITLOG_LIST),
        Some(&admin.access_token),
    )
    .await
    .assert_error(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");

    app.get(paths::AUDITLOG_LIST, None)
        .await
        .assert_error(StatusCode::UNAUTHORIZED, "MISSING_TOKEN");
}

// =============================================================================
// Password Tests
// =============================================================================

#[tokio::test]
async fn test_password_update_flow() {
    let app = TestApp::new().await;
    let bob = regular_user(&app, "bob").await;

    app.post_json(
        paths::UPDATE_PASSWORD,
        Some(&bob.access_token),
        json!({ "old_password": "wrong-old", "new_password": "new-password-9" }),
    )
    .await
    .assert_error(StatusCode::BAD_REQUEST, "BAD_REQUEST");

    app.post_json(
        paths::UPDATE_PASSWORD,
        Some(&bob.access_token),
        json!({ "old_password": USER_PASSWORD, "new_password": USER_PASSWORD }),
    )
    .await
    .assert_error(StatusCode::UNPROCESSABLE_ENTITY, "VALIDATION_ERROR");

    app.post_json(
        paths::UPDATE_PASSWORD,
        Some(&bob.access_token),
        json!({ "old_password": USER_PASSWORD, "new_password": "new-password-9" }),
    )
    .await
    .assert_success();

    app.audit.assert_succeeded(AuditAction::PasswordChange);
    app.refresh(&bob.refresh_token)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.login("bob", USER_PASSWORD)
        .await
        .assert_status(StatusCode::UNAUTHORIZED);
    app.login("bob", "new-password-9").await.assert_success();
}

// =============================================================================
// Response Tests
// =============================================================================

#[tokio::test]
async fn test_response_security_headers() {
    let app = TestApp::new().await;

    for response in [
        app.get(paths::HEALTH, None).await,
        app.get(paths::USERINFO, None).await,
    ] {
        response
            .assert_header("x-content-type-options", "nosniff")
            .assert_header("x-frame-options", "DENY")
            .assert_header("x-xss-protection", "1; mode=block")
            .assert_header("referrer-policy", "strict-origin-when-cross-origin");
    }
}

#[tokio::test]
async fn test_response_unknown_route_is_json_404() {
    let app = TestApp::new().await;

    app.get("/api/v1/does/not/exist", None)
        .await
        .assert_error(StatusCode::NOT_FOUND, "NOT_FOUND");
}

#[tokio::test]
async fn test_response_version() {
    let app = TestApp::new().await;

    let response = app.get(paths::VERSION, None).await;
    response.assert_success();
    assert_eq!(response.data()["version"], warden_api::VERSION);
}

#[tokio::test]
async fn test_response_store_failure_is_opaque() {
    let store = MockCredentialStore::new().shared();
    let app = TestApp::builder().store(store.clone()).seed(true).build().await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    store.set_failing(true);
    let response = app.get(paths::USERINFO, Some(&admin.access_token)).await;
    response
        .assert_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR")
        .assert_no_detail();
    assert!(!response.body.to_string().contains("injected"));
}

#[tokio::test]
async fn test_response_detail_in_development_mode() {
    let store = MockCredentialStore::new().shared();
    let app = TestApp::builder()
        .config(ConfigFixtures::api_config().with_error_detail(true))
        .store(store.clone())
        .seed(true)
        .build()
        .await;
    let admin = app.login_ok(ADMIN_USERNAME, ADMIN_PASSWORD).await;

    store.set_failing(true);
    let response = app.get(paths::USERINFO, Some(&admin.access_token)).await;
    response.assert_error(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR");
    assert!(response.body["detail"]
        .as_str()
        .is_some_and(|d| d.contains("injected store failure")));
}

// =============================================================================
// Health Tests
// =============================================================================

#[tokio::test]
async fn test_health_ok() {
    let app = TestApp::new().await;

    for path in [paths::HEALTH, paths::BASE_HEALTH] {
        let response = app.get(path, None).await;
        response.assert_success();
        assert_eq!(response.data()["status"], "ok");
        assert_eq!(response.data()["store"], true);
    }
}

#[tokio::test]
async fn test_health_reports_store_outage() {
    let store = MockCredentialStore::failing().shared();
    let app = TestApp::builder().store(store.clone()).build().await;

    let response = app.get(paths::HEALTH, None).await;
    response.assert_status(StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(response.body["code"], 503);
    assert_eq!(response.data()["status"], "degraded");
    assert_eq!(response.data()["store"], false);
    assert_eq!(store.call_count(), 0);
}
