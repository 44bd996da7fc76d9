//! End-to-end tests of the submission pipeline against a local fake of the
//! plant service.
//!
//! Each test starts its own axum server on an ephemeral port, so the real
//! reqwest multipart and JSON encoding is exercised.

mod common;

use assert_matches::assert_matches;
use axum::http::StatusCode;
use guguma_client::{CreateResult, Failure, FailureKind, RecognitionResult};
use guguma_core::draft::PlantDraft;
use guguma_core::image_prep::PrepareError;
use tokio::sync::oneshot;

use common::{complete_draft, leaf_png, spawn_service, unreachable_pipeline, Replies};

// ---------------------------------------------------------------------------
// Recognition
// ---------------------------------------------------------------------------

#[tokio::test]
async fn recognize_uploads_single_jpeg_part_and_trims_name() {
    let (pipeline, recorder) = spawn_service(Replies {
        recognize: (StatusCode::OK, "  Ficus  \n".into()),
        ..Default::default()
    })
    .await;

    let prepared = pipeline.prepare(leaf_png()).await.unwrap();
    let result = pipeline.recognize(&prepared).await;

    assert_eq!(
        result,
        RecognitionResult::Success {
            name: "Ficus".into()
        }
    );

    let parts = recorder.parts();
    assert_eq!(parts.len(), 1);
    assert_eq!(parts[0].name, "image");
    assert_eq!(parts[0].file_name.as_deref(), Some("compressed_image.jpg"));
    assert_eq!(parts[0].content_type.as_deref(), Some("image/jpeg"));
    assert_eq!(parts[0].size, prepared.len());
}

#[tokio::test]
async fn recognize_empty_body_is_advisory_failure() {
    let (pipeline, _recorder) = spawn_service(Replies {
        recognize: (StatusCode::OK, "   ".into()),
        ..Default::default()
    })
    .await;

    let result = pipeline.recognize_bytes(vec![0xFF, 0xD8, 0xFF]).await;

    assert_matches!(
        result,
        RecognitionResult::Failure(Failure { kind: FailureKind::EmptyOrRejected, .. })
    );
}

#[tokio::test]
async fn recognize_error_status_is_advisory_failure() {
    let (pipeline, _recorder) = spawn_service(Replies {
        recognize: (StatusCode::INTERNAL_SERVER_ERROR, "Monstera".into()),
        ..Default::default()
    })
    .await;

    let result = pipeline.recognize_bytes(vec![0xFF, 0xD8, 0xFF]).await;

    assert_eq!(result.name(), None);
    assert_eq!(
        result.failure().map(|f| f.kind),
        Some(FailureKind::EmptyOrRejected)
    );
}

#[tokio::test]
async fn recognize_unreachable_is_transport_failure() {
    let pipeline = unreachable_pipeline();

    let result = pipeline.recognize_bytes(vec![0xFF, 0xD8, 0xFF]).await;

    let failure = result.failure().unwrap();
    assert_eq!(failure.kind, FailureKind::Transport);
    assert!(failure.is_retryable());
}

#[tokio::test]
async fn recognize_empty_image_sends_nothing() {
    let (pipeline, recorder) = spawn_service(Replies::default()).await;

    let result = pipeline.recognize_bytes(Vec::new()).await;

    assert_matches!(
        result,
        RecognitionResult::Failure(Failure { kind: FailureKind::Validation, .. })
    );
    assert_eq!(recorder.recognize_hits(), 0);
}

// ---------------------------------------------------------------------------
// Creation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn create_sends_exact_json_body() {
    let (pipeline, recorder) = spawn_service(Replies::default()).await;

    let result = pipeline.create_record(&complete_draft()).await;

    assert_eq!(result, CreateResult::Success);
    let calls = recorder.create_calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].content_type.as_deref(), Some("application/json"));
    assert_eq!(
        calls[0].body,
        r#"{"name":"Monstera","nickname":"Sunny","waterInterval":7,"imageUri":"file://x.jpg","userUuid":"abc-123"}"#
    );
}

#[tokio::test]
async fn create_rejection_carries_server_message() {
    let (pipeline, _recorder) = spawn_service(Replies {
        create: (
            StatusCode::BAD_REQUEST,
            r#"{"message":"duplicate plant"}"#.into(),
        ),
        ..Default::default()
    })
    .await;

    let result = pipeline.create_record(&complete_draft()).await;

    assert_eq!(
        result,
        CreateResult::Failure(Failure::new(FailureKind::Rejected, "duplicate plant"))
    );
}

#[tokio::test]
async fn create_rejection_with_malformed_body_is_unknown() {
    let (pipeline, _recorder) = spawn_service(Replies {
        create: (StatusCode::BAD_REQUEST, "{not json".into()),
        ..Default::default()
    })
    .await;

    let result = pipeline.create_record(&complete_draft()).await;

    assert_eq!(
        result,
        CreateResult::Failure(Failure::new(FailureKind::Rejected, "unknown"))
    );
}

#[tokio::test]
async fn invalid_drafts_are_rejected_without_a_request() {
    let (pipeline, recorder) = spawn_service(Replies::default()).await;

    let drafts = [
        PlantDraft {
            nickname: String::new(),
            ..complete_draft()
        },
        PlantDraft {
            water_interval_days: 0,
            ..complete_draft()
        },
        PlantDraft {
            water_interval_days: -3,
            ..complete_draft()
        },
        PlantDraft {
            user_id: String::new(),
            ..complete_draft()
        },
    ];

    for draft in &drafts {
        let result = pipeline.create_record(draft).await;
        assert_matches!(
            result,
            CreateResult::Failure(Failure { kind: FailureKind::Validation, .. }),
            "draft should fail validation: {draft:?}"
        );
    }

    assert_eq!(recorder.create_hits(), 0);
}

#[tokio::test]
async fn create_unreachable_is_transport_failure() {
    let pipeline = unreachable_pipeline();

    let result = pipeline.create_record(&complete_draft()).await;

    assert_matches!(
        result,
        CreateResult::Failure(Failure { kind: FailureKind::Transport, .. })
    );
}

// ---------------------------------------------------------------------------
// Continuations and preparation
// ---------------------------------------------------------------------------

#[tokio::test]
async fn dispatch_delivers_outcomes_to_continuations() {
    let (pipeline, recorder) = spawn_service(Replies {
        recognize: (StatusCode::OK, "Pothos\n".into()),
        ..Default::default()
    })
    .await;

    let (recognized_tx, recognized_rx) = oneshot::channel();
    pipeline
        .dispatch_recognize(vec![0xFF, 0xD8, 0xFF], move |result| {
            let _ = recognized_tx.send(result);
        })
        .await
        .unwrap();
    assert_eq!(recognized_rx.await.unwrap().name(), Some("Pothos"));

    let (created_tx, created_rx) = oneshot::channel();
    pipeline
        .dispatch_create(complete_draft(), move |result| {
            let _ = created_tx.send(result);
        })
        .await
        .unwrap();
    assert!(created_rx.await.unwrap().is_success());

    assert_eq!(recorder.recognize_hits(), 1);
    assert_eq!(recorder.create_hits(), 1);
}

#[tokio::test]
async fn prepare_rejects_corrupt_source() {
    let pipeline = unreachable_pipeline();

    let result = pipeline.prepare(b"not an image".to_vec()).await;

    assert_matches!(result, Err(PrepareError::Decode(_)));
}

#[tokio::test]
async fn full_flow_uses_recognized_name() {
    let (pipeline, recorder) = spawn_service(Replies {
        recognize: (StatusCode::OK, "Calathea\n".into()),
        ..Default::default()
    })
    .await;

    let prepared = pipeline.prepare(leaf_png()).await.unwrap();
    assert!(prepared.within_budget);

    let mut draft = PlantDraft::new("file:///photos/leaf.png");
    draft.name = pipeline
        .recognize(&prepared)
        .await
        .name()
        .unwrap()
        .to_string();
    draft.compressed_image = Some(prepared);
    draft.nickname = "Callie".into();
    draft.water_interval_days = 3;
    draft.user_id = "user-1".into();

    assert!(pipeline.create_record(&draft).await.is_success());

    let body: serde_json::Value =
        serde_json::from_str(&recorder.create_calls()[0].body).unwrap();
    assert_eq!(body["name"], "Calathea");
    assert_eq!(body["imageUri"], "file:///photos/leaf.png");
    assert_eq!(body["waterInterval"], 3);
}
