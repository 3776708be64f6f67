//! End-to-end tests for the /api/v1 JSON surface: session auth, the
//! response envelope, role gating, and the PDCA follow-up scenario.

use actix_session::{SessionMiddleware, storage::CookieSessionStore};
use actix_web::cookie::{Cookie, Key};
use actix_web::http::StatusCode;
use actix_web::{App, test, web};
use serde_json::{Value, json};

use pdca_tracker::db::DbPool;
use pdca_tracker::handlers;
use pdca_tracker::models::user::Role;

mod common;
use common::{TEST_PASSWORD, create_user, setup_test_db};

const SESSION_KEY: [u8; 64] = [7; 64];

macro_rules! spawn_app {
    ($pool:expr) => {
        test::init_service(
            App::new()
                .wrap(
                    SessionMiddleware::builder(
                        CookieSessionStore::default(),
                        Key::from(&SESSION_KEY),
                    )
                    .cookie_secure(false)
                    .cookie_http_only(true)
                    .build(),
                )
                .app_data(web::Data::new($pool.clone()))
                .service(web::scope("/api/v1").configure(handlers::api_v1::configure)),
        )
        .await
    };
}

macro_rules! login {
    ($app:expr, $email:expr) => {{
        let resp = test::call_service(
            &$app,
            test::TestRequest::post()
                .uri("/api/v1/auth/login")
                .set_json(json!({ "email": $email, "password": TEST_PASSWORD }))
                .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "login should succeed");
        resp.response()
            .cookies()
            .next()
            .expect("session cookie")
            .into_owned()
    }};
}

async fn seed_directory(pool: &DbPool) -> (i64, i64, i64) {
    let a = create_user(pool, "Alice", "alice@test.com", Role::User).await;
    let b = create_user(pool, "Bianca", "bianca@test.com", Role::Reviewer).await;
    let admin = create_user(pool, "Root", "root@test.com", Role::Admin).await;
    (a, b, admin)
}

fn with_cookie(req: test::TestRequest, cookie: &Cookie<'static>) -> test::TestRequest {
    req.cookie(cookie.clone())
}

#[actix_web::test]
async fn test_unauthenticated_requests_are_rejected() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());

    let resp = test::call_service(
        &app,
        test::TestRequest::get().uri("/api/v1/ttfus").to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["error"], "Authentication required");

    // Wrong password is also a 401, not a 400.
    create_user(db.pool(), "Alice", "alice@test.com", Role::User).await;
    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "alice@test.com", "password": "wrong-password" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn test_mutations_require_json_content_type() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    seed_directory(db.pool()).await;
    let cookie = login!(app, "alice@test.com");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &cookie)
            .insert_header(("content-type", "text/plain"))
            .set_payload("title=Standup")
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_login_returns_principal_and_me_matches() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    let (_, b, _) = seed_directory(db.pool()).await;

    let resp = test::call_service(
        &app,
        test::TestRequest::post()
            .uri("/api/v1/auth/login")
            .set_json(json!({ "email": "bianca@test.com", "password": TEST_PASSWORD }))
            .to_request(),
    )
    .await;
    let cookie = resp
        .response()
        .cookies()
        .next()
        .expect("session cookie")
        .into_owned();
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["success"], json!(true));
    assert_eq!(body["data"]["id"], json!(b));
    assert_eq!(body["data"]["role"], "reviewer");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::get().uri("/api/v1/auth/me"), &cookie).to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["email"], "bianca@test.com");
}

/// The full follow-up scenario: meeting with [A:owner, B:reviewer], a TTFU
/// assigned to A and reviewed by B, link evidence from A, approval from B.
/// The TTFU's own status stays `open` until explicitly changed.
#[actix_web::test]
async fn test_pdca_scenario_end_to_end() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    let (a, b, _) = seed_directory(db.pool()).await;
    let alice = login!(app, "alice@test.com");
    let bianca = login!(app, "bianca@test.com");

    // A creates the meeting with the roster.
    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &alice)
            .set_json(json!({
                "title": "Sprint review",
                "date": "2026-09-25",
                "participants": [
                    { "user_id": a, "role": "owner" },
                    { "user_id": b, "role": "reviewer" },
                ],
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let meeting_id = body["data"]["id"].as_i64().expect("meeting id");
    assert_eq!(body["data"]["participants"].as_array().expect("roster").len(), 2);

    // A creates the TTFU with explicit assignment.
    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &alice)
            .set_json(json!({
                "meeting_id": meeting_id,
                "title": "Publish retrospective notes",
                "assignee_id": a,
                "reviewer_id": b,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let ttfu_id = body["data"]["id"].as_i64().expect("ttfu id");
    assert_eq!(body["data"]["status"], "open");

    // Malformed URL is rejected up front.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/ttfus/{ttfu_id}/evidence")),
            &alice,
        )
        .set_json(json!({ "kind": "link", "url": "notes.example.com" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // A submits valid link evidence.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/ttfus/{ttfu_id}/evidence")),
            &alice,
        )
        .set_json(json!({
            "kind": "link",
            "url": "https://example.com/retro-notes",
            "description": "Published notes",
        }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    let evidence_id = body["data"]["id"].as_i64().expect("evidence id");

    // A is not a reviewer: submitting a review fails authorization.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/evidence/{evidence_id}/reviews")),
            &alice,
        )
        .set_json(json!({ "decision": "approved" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // B approves.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/evidence/{evidence_id}/reviews")),
            &bianca,
        )
        .set_json(json!({ "decision": "approved", "comment": "Looks complete" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // B approving again is a conflict.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/evidence/{evidence_id}/reviews")),
            &bianca,
        )
        .set_json(json!({ "decision": "rejected" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);

    // An admin is a different reviewer and may still review.
    let root = login!(app, "root@test.com");
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/evidence/{evidence_id}/reviews")),
            &root,
        )
        .set_json(json!({ "decision": "needs-revision" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    // The TTFU holds the evidence with its reviews and is still open.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::get().uri(&format!("/api/v1/ttfus/{ttfu_id}")),
            &alice,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["status"], "open", "review outcomes never move the status");
    let evidence = body["data"]["evidence"].as_array().expect("evidence list");
    assert_eq!(evidence.len(), 1);
    let reviews = evidence[0]["reviews"].as_array().expect("reviews");
    assert_eq!(reviews.len(), 2);
    assert_eq!(reviews[0]["decision"], "approved");
}

#[actix_web::test]
async fn test_status_updates_accept_enumeration_only() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    let (a, b, _) = seed_directory(db.pool()).await;
    let alice = login!(app, "alice@test.com");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &alice)
            .set_json(json!({ "title": "Sync", "date": "2026-09-26" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let meeting_id = body["data"]["id"].as_i64().expect("meeting id");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &alice)
            .set_json(json!({
                "meeting_id": meeting_id,
                "title": "Task",
                "assignee_id": a,
                "reviewer_id": b,
            }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let ttfu_id = body["data"]["id"].as_i64().expect("ttfu id");

    // Every enumerated value is accepted, in any order.
    for status in ["done", "rejected", "in-progress", "open"] {
        let resp = test::call_service(
            &app,
            with_cookie(
                test::TestRequest::put().uri(&format!("/api/v1/ttfus/{ttfu_id}/status")),
                &alice,
            )
            .set_json(json!({ "status": status }))
            .to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "status '{status}' should be accepted");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["status"], status);
    }

    // Outside the enumeration fails validation.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::put().uri(&format!("/api/v1/ttfus/{ttfu_id}/status")),
            &alice,
        )
        .set_json(json!({ "status": "cancelled" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    // Unknown TTFU id is a 404.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::put().uri("/api/v1/ttfus/424242/status"),
            &alice,
        )
        .set_json(json!({ "status": "done" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_ttfu_auto_assignment_over_http() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    let (a, b, _) = seed_directory(db.pool()).await;
    let alice = login!(app, "alice@test.com");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &alice)
            .set_json(json!({ "title": "Kickoff", "date": "2026-09-27" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let meeting_id = body["data"]["id"].as_i64().expect("meeting id");

    // No assignee/reviewer in the payload: creator (role user) becomes
    // assignee, the directory's reviewer is picked automatically.
    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &alice)
            .set_json(json!({ "meeting_id": meeting_id, "title": "Auto-assigned task" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["assignee_id"], json!(a));
    assert_eq!(body["data"]["reviewer_id"], json!(b));

    // Creating under a missing meeting is a 404.
    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &alice)
            .set_json(json!({ "meeting_id": 999999, "title": "Orphan" }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_explicit_reviewer_with_omitted_assignee() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    // Directory of plain users only: the assignment policy has nobody to
    // pick, but an explicit reviewer must still be honored.
    let alice = create_user(db.pool(), "Alice", "alice@test.com", Role::User).await;
    let bob = create_user(db.pool(), "Bob", "bob@test.com", Role::User).await;
    let cookie = login!(app, "alice@test.com");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &cookie)
            .set_json(json!({ "title": "Handover", "date": "2026-09-29" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let meeting_id = body["data"]["id"].as_i64().expect("meeting id");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &cookie)
            .set_json(json!({
                "meeting_id": meeting_id,
                "title": "Reviewer picked by hand",
                "reviewer_id": bob,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["assignee_id"], json!(alice), "creator fills the omitted side");
    assert_eq!(body["data"]["reviewer_id"], json!(bob));

    // The mirror case still needs the policy and still fails without any
    // reviewer-or-admin account.
    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &cookie)
            .set_json(json!({
                "meeting_id": meeting_id,
                "title": "No reviewer available",
                "assignee_id": bob,
            }))
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
}

#[actix_web::test]
async fn test_delete_authorization_rules() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    let (a, b, _) = seed_directory(db.pool()).await;
    create_user(db.pool(), "Carol", "carol@test.com", Role::User).await;
    let alice = login!(app, "alice@test.com");
    let bianca = login!(app, "bianca@test.com");
    let carol = login!(app, "carol@test.com");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &alice)
            .set_json(json!({ "title": "Board meeting", "date": "2026-09-30" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let meeting_id = body["data"]["id"].as_i64().expect("meeting id");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/ttfus"), &alice)
            .set_json(json!({
                "meeting_id": meeting_id,
                "title": "Minutes",
                "assignee_id": a,
                "reviewer_id": b,
            }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let ttfu_id = body["data"]["id"].as_i64().expect("ttfu id");

    // Carol is neither assignee, designated reviewer, nor admin.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::delete().uri(&format!("/api/v1/ttfus/{ttfu_id}")),
            &carol,
        )
        .set_json(json!({}))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    // The designated reviewer may delete the follow-up.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::delete().uri(&format!("/api/v1/ttfus/{ttfu_id}")),
            &bianca,
        )
        .set_json(json!({}))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    // Meeting deletion is creator-or-admin; the TTFU reviewer does not
    // qualify.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::delete().uri(&format!("/api/v1/meetings/{meeting_id}")),
            &bianca,
        )
        .set_json(json!({}))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::delete().uri(&format!("/api/v1/meetings/{meeting_id}")),
            &alice,
        )
        .set_json(json!({}))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);

    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::get().uri(&format!("/api/v1/meetings/{meeting_id}")),
            &alice,
        )
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
}

#[actix_web::test]
async fn test_huge_page_numbers_are_clamped() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    seed_directory(db.pool()).await;
    let cookie = login!(app, "alice@test.com");

    for uri in [
        "/api/v1/ttfus?page=9223372036854775807&limit=100",
        "/api/v1/users?page=9223372036854775807&limit=100",
        "/api/v1/meetings?page=9223372036854775807",
    ] {
        let resp = test::call_service(
            &app,
            with_cookie(test::TestRequest::get().uri(uri), &cookie).to_request(),
        )
        .await;
        assert_eq!(resp.status(), StatusCode::OK, "{uri}");
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["items"].as_array().expect("items").len(), 0);
    }
}

#[actix_web::test]
async fn test_user_admin_gating() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    seed_directory(db.pool()).await;
    let alice = login!(app, "alice@test.com");
    let root = login!(app, "root@test.com");

    let payload = json!({
        "name": "New Member",
        "email": "member@test.com",
        "password": "Password1!",
        "role": "supervisor",
    });

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/users"), &alice)
            .set_json(payload.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/users"), &root)
            .set_json(payload.clone())
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let body: Value = test::read_body_json(resp).await;
    assert_eq!(body["data"]["role"], "supervisor");
    let member_id = body["data"]["id"].as_i64().expect("user id");

    // Duplicate email is a validation failure.
    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/users"), &root)
            .set_json(payload)
            .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::delete().uri(&format!("/api/v1/users/{member_id}")),
            &root,
        )
        .set_json(json!({}))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::OK);
}

#[actix_web::test]
async fn test_meeting_join_is_once_per_user() {
    let db = setup_test_db().await;
    let app = spawn_app!(db.pool());
    seed_directory(db.pool()).await;
    let alice = login!(app, "alice@test.com");
    let bianca = login!(app, "bianca@test.com");

    let resp = test::call_service(
        &app,
        with_cookie(test::TestRequest::post().uri("/api/v1/meetings"), &alice)
            .set_json(json!({ "title": "Open forum", "date": "2026-09-28" }))
            .to_request(),
    )
    .await;
    let body: Value = test::read_body_json(resp).await;
    let meeting_id = body["data"]["id"].as_i64().expect("meeting id");

    // Self-service join: no user_id in the payload.
    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/meetings/{meeting_id}/participants")),
            &bianca,
        )
        .set_json(json!({ "role": "reviewer" }))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CREATED);

    let resp = test::call_service(
        &app,
        with_cookie(
            test::TestRequest::post().uri(&format!("/api/v1/meetings/{meeting_id}/participants")),
            &bianca,
        )
        .set_json(json!({}))
        .to_request(),
    )
    .await;
    assert_eq!(resp.status(), StatusCode::CONFLICT);
}
