use pdca_tracker::errors::AppError;
use pdca_tracker::models::evidence::{self, EvidenceKind, NewEvidence};
use pdca_tracker::models::review::{self, NewReview, ReviewDecision};
use pdca_tracker::models::ttfu::{self, TtfuStatus};
use pdca_tracker::models::user::Role;

mod common;
use common::{create_meeting, create_ttfu, create_user, setup_test_db};

async fn setup_evidence(pool: &pdca_tracker::db::DbPool) -> (i64, i64, i64) {
    let worker = create_user(pool, "Worker", "worker@test.com", Role::User).await;
    let reviewer = create_user(pool, "Rev", "rev@test.com", Role::Reviewer).await;
    let meeting_id = create_meeting(pool, worker, "Sync", "2026-09-21").await;
    let ttfu_id = create_ttfu(pool, meeting_id, "Task", worker, reviewer).await;
    let evidence_id = evidence::create(
        pool,
        &NewEvidence {
            ttfu_id,
            kind: EvidenceKind::Link,
            url: Some("https://example.com/proof".to_string()),
            file_ref: None,
            description: String::new(),
        },
        worker,
    )
    .await
    .expect("create evidence");
    (ttfu_id, evidence_id, reviewer)
}

#[test]
fn test_decision_parse_round_trip() {
    for decision in [
        ReviewDecision::Approved,
        ReviewDecision::Rejected,
        ReviewDecision::NeedsRevision,
    ] {
        assert_eq!(ReviewDecision::parse(decision.as_str()), Some(decision));
    }
    assert_eq!(ReviewDecision::parse("maybe"), None);
}

#[tokio::test]
async fn test_review_round_trip() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (_ttfu_id, evidence_id, reviewer) = setup_evidence(pool).await;

    let id = review::create(
        pool,
        &NewReview {
            evidence_id,
            decision: ReviewDecision::NeedsRevision,
            comment: Some("Please add the raw data".to_string()),
        },
        reviewer,
    )
    .await
    .expect("create review");

    let record = review::find_by_id(pool, id)
        .await
        .expect("query")
        .expect("review exists");
    assert_eq!(record.decision, ReviewDecision::NeedsRevision);
    assert_eq!(record.comment.as_deref(), Some("Please add the raw data"));
    assert_eq!(record.reviewer_id, reviewer);
    assert_eq!(record.reviewer_name, "Rev");
}

#[tokio::test]
async fn test_duplicate_review_by_same_reviewer_is_conflict() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (_ttfu_id, evidence_id, reviewer) = setup_evidence(pool).await;

    let first = NewReview {
        evidence_id,
        decision: ReviewDecision::Approved,
        comment: None,
    };
    review::create(pool, &first, reviewer).await.expect("first review");

    assert!(review::exists_for(pool, evidence_id, reviewer).await.expect("check"));

    // Second decision, same reviewer: rejected even with a different verdict.
    let second = NewReview {
        evidence_id,
        decision: ReviewDecision::Rejected,
        comment: None,
    };
    let err = review::create(pool, &second, reviewer)
        .await
        .expect_err("duplicate review");
    assert!(
        matches!(err, AppError::Conflict(_)),
        "expected conflict, got {err:?}"
    );
}

#[tokio::test]
async fn test_second_reviewer_may_review_same_evidence() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (_ttfu_id, evidence_id, reviewer) = setup_evidence(pool).await;
    let admin = create_user(pool, "Admin", "admin@test.com", Role::Admin).await;

    review::create(
        pool,
        &NewReview {
            evidence_id,
            decision: ReviewDecision::Approved,
            comment: None,
        },
        reviewer,
    )
    .await
    .expect("first review");

    review::create(
        pool,
        &NewReview {
            evidence_id,
            decision: ReviewDecision::Rejected,
            comment: None,
        },
        admin,
    )
    .await
    .expect("different reviewer");

    let list = review::find_by_evidence(pool, evidence_id).await.expect("list");
    assert_eq!(list.len(), 2);
    assert_eq!(list[0].reviewer_id, reviewer, "oldest first");
    assert_eq!(list[1].reviewer_id, admin);
}

#[tokio::test]
async fn test_approved_review_does_not_move_ttfu_status() {
    let db = setup_test_db().await;
    let pool = db.pool();
    let (ttfu_id, evidence_id, reviewer) = setup_evidence(pool).await;

    review::create(
        pool,
        &NewReview {
            evidence_id,
            decision: ReviewDecision::Approved,
            comment: None,
        },
        reviewer,
    )
    .await
    .expect("review");

    let detail = ttfu::find_by_id(pool, ttfu_id)
        .await
        .expect("query")
        .expect("ttfu exists");
    assert_eq!(
        detail.status,
        TtfuStatus::Open,
        "status and review decisions are independent"
    );
}
