//! Bulk ingestion: background jobs, tracking, and phase gating.

mod common;

use std::time::Duration;

use assert_matches::assert_matches;

use common::{create_input, harness, rows};
use labelkit_core::error::{CoreError, NotAllowedReason};
use labelkit_core::phase::SampleStatus;
use labelkit_db::models::NewSample;
use labelkit_db::DocumentStore;
use labelkit_engine::IngestJobStatus;

/// Poll a job until it finishes. Ingestion jobs are small in tests, so
/// a short budget is plenty.
async fn finished_status(
    h: &common::Harness,
    job_id: uuid::Uuid,
) -> IngestJobStatus {
    for _ in 0..200 {
        if let Some(job) = h.ingest.job(job_id).await {
            if job.status.is_finished() {
                return job.status;
            }
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    panic!("ingestion job {job_id} did not finish in time");
}

// ---------------------------------------------------------------------------
// Test: a background job loads samples and reports completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn background_job_loads_samples() {
    let h = harness();
    let project = h
        .projects
        .create_project(create_input("bulk load", 2))
        .await
        .unwrap();

    let job_id = h.ingest.enqueue(project.id, rows(5)).await.unwrap();
    let status = finished_status(&h, job_id).await;
    assert_eq!(status, IngestJobStatus::Completed { samples_added: 5 });

    let project = h.projects.get_project(project.id).await.unwrap();
    assert_eq!(project.number_of_samples, 5);

    let samples = h.store.list_project_samples(project.id).await.unwrap();
    let numbers: Vec<i64> = samples.iter().map(|s| s.number).collect();
    assert_eq!(numbers, vec![1, 2, 3, 4, 5]);
    assert!(samples.iter().all(|s| s.status == SampleStatus::New));
    assert!(samples.iter().all(|s| s.labelings.is_none()));
    assert!(samples.iter().all(|s| s.comments.is_empty()));
}

// ---------------------------------------------------------------------------
// Test: inline ingestion returns the count synchronously
// ---------------------------------------------------------------------------

#[tokio::test]
async fn inline_ingest_returns_count() {
    let h = harness();
    let project = h
        .projects
        .create_project(create_input("inline", 2))
        .await
        .unwrap();

    let added = h.ingest.ingest(project.id, rows(3)).await.unwrap();
    assert_eq!(added, 3);

    // A second batch continues the numbering.
    h.ingest.ingest(project.id, rows(2)).await.unwrap();
    let project = h.projects.get_project(project.id).await.unwrap();
    assert_eq!(project.number_of_samples, 5);
}

// ---------------------------------------------------------------------------
// Test: ingestion is only legal while setting-up
// ---------------------------------------------------------------------------

#[tokio::test]
async fn ingestion_rejected_after_setting_up() {
    let h = harness();
    let project = h
        .projects
        .create_project(create_input("closed door", 2))
        .await
        .unwrap();
    h.ingest.ingest(project.id, rows(2)).await.unwrap();
    h.projects.turn_to_next_phase(project.id).await.unwrap();

    let err = h.ingest.enqueue(project.id, rows(1)).await.unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::ProjectNotSettingUp)
    );
}

// ---------------------------------------------------------------------------
// Test: malformed batches are rejected before a job is registered
// ---------------------------------------------------------------------------

#[tokio::test]
async fn empty_batch_rejected() {
    let h = harness();
    let project = h
        .projects
        .create_project(create_input("nothing to load", 2))
        .await
        .unwrap();

    let err = h.ingest.enqueue(project.id, vec![]).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[tokio::test]
async fn row_without_texts_rejected() {
    let h = harness();
    let project = h
        .projects
        .create_project(create_input("blank row", 2))
        .await
        .unwrap();

    let batch = vec![NewSample { texts: vec![] }];
    let err = h.ingest.enqueue(project.id, batch).await.unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[tokio::test]
async fn ingest_into_missing_project_is_not_found() {
    let h = harness();
    let err = h.ingest.ingest(404, rows(1)).await.unwrap_err();
    assert_matches!(err, CoreError::NotFound { entity: "project", .. });
}

// ---------------------------------------------------------------------------
// Test: unknown job ids resolve to nothing
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_job_lookup_is_none() {
    let h = harness();
    assert!(h.ingest.job(uuid::Uuid::new_v4()).await.is_none());
}
