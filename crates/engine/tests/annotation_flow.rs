//! Annotator actions through the sample service: schema enforcement,
//! division membership, mistakes, and comments.

mod common;

use assert_matches::assert_matches;

use common::{annotating_project, harness, Harness};
use labelkit_core::annotation::AnnotationPayload;
use labelkit_core::error::{CoreError, NotAllowedReason};
use labelkit_core::phase::SampleStatus;
use labelkit_core::types::DbId;

fn payload_with(label: &str) -> AnnotationPayload {
    AnnotationPayload {
        labelings: Some(vec![vec![label.to_string()]]),
        ..Default::default()
    }
}

async fn first_sample_of(h: &Harness, project_id: DbId, annotator: DbId) -> DbId {
    h.samples
        .list_division_samples(project_id, annotator)
        .await
        .unwrap()
        .first()
        .expect("annotator must have at least one sample")
        .id
}

// ---------------------------------------------------------------------------
// Test: a valid annotation is applied and sets the status
// ---------------------------------------------------------------------------

#[tokio::test]
async fn annotation_applied() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 3, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let sample = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("ham"))
        .await
        .unwrap();

    assert_eq!(sample.status, SampleStatus::Annotated);
    assert_eq!(sample.labelings, Some(vec![vec!["ham".to_string()]]));
    assert!(sample.generated_texts.is_none());
}

// ---------------------------------------------------------------------------
// Test: payloads can come straight from JSON
// ---------------------------------------------------------------------------

#[tokio::test]
async fn annotation_payload_from_json() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let payload: AnnotationPayload =
        serde_json::from_value(serde_json::json!({ "labelings": [["spam"]] })).unwrap();
    let sample = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload)
        .await
        .unwrap();
    assert_eq!(sample.status, SampleStatus::Annotated);
}

// ---------------------------------------------------------------------------
// Test: schema strictness surfaces through the service
// ---------------------------------------------------------------------------

#[tokio::test]
async fn unknown_label_rejected() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let err = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("eggs"))
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));

    let sample = h.samples.get_sample(sample_id).await.unwrap();
    assert_eq!(sample.status, SampleStatus::New);
    assert!(sample.labelings.is_none());
}

#[tokio::test]
async fn multi_label_on_single_select_rejected() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let payload = AnnotationPayload {
        labelings: Some(vec![vec!["spam".to_string(), "ham".to_string()]]),
        ..Default::default()
    };
    let err = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

#[tokio::test]
async fn disabled_field_rejected() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let payload = AnnotationPayload {
        labelings: Some(vec![vec!["spam".to_string()]]),
        generated_texts: Some(vec!["not enabled".to_string()]),
        ..Default::default()
    };
    let err = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload)
        .await
        .unwrap_err();
    assert_matches!(err, CoreError::Validation(_));
}

// ---------------------------------------------------------------------------
// Test: division membership is enforced
// ---------------------------------------------------------------------------

#[tokio::test]
async fn annotating_anothers_sample_rejected() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 4, &[1, 2]).await;

    // Annotator 2 tries to annotate a sample from annotator 1's slice.
    let foreign = first_sample_of(&h, project_id, 1).await;
    let err = h
        .samples
        .validate_and_apply_annotation(foreign, 2, payload_with("spam"))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::SampleNotInDivision)
    );
}

#[tokio::test]
async fn outsider_rejected() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 2, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let err = h
        .samples
        .validate_and_apply_annotation(sample_id, 77, payload_with("spam"))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::SampleNotInDivision)
    );
}

// ---------------------------------------------------------------------------
// Test: re-annotation overwrites, mistakes are terminal
// ---------------------------------------------------------------------------

#[tokio::test]
async fn reannotation_overwrites() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    h.samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("spam"))
        .await
        .unwrap();
    let sample = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("ham"))
        .await
        .unwrap();
    assert_eq!(sample.labelings, Some(vec![vec!["ham".to_string()]]));
}

#[tokio::test]
async fn mistake_requires_annotated_status() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let err = h
        .samples
        .mark_sample_as_a_mistake(sample_id, 1)
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::SampleNotMistakable)
    );
}

#[tokio::test]
async fn mistake_blocks_reannotation() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    h.samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("spam"))
        .await
        .unwrap();
    let sample = h.samples.mark_sample_as_a_mistake(sample_id, 1).await.unwrap();
    assert_eq!(sample.status, SampleStatus::MarkedAsAMistake);

    let err = h
        .samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("ham"))
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::SampleMarkedAsAMistake)
    );
}

// ---------------------------------------------------------------------------
// Test: a mistake blocks project completion
// ---------------------------------------------------------------------------

#[tokio::test]
async fn mistake_blocks_completion() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 3, &[1]).await;

    let samples = h.samples.list_division_samples(project_id, 1).await.unwrap();
    for sample in &samples {
        h.samples
            .validate_and_apply_annotation(sample.id, 1, payload_with("spam"))
            .await
            .unwrap();
    }
    h.samples
        .mark_sample_as_a_mistake(samples[1].id, 1)
        .await
        .unwrap();

    let err = h.projects.turn_to_next_phase(project_id).await.unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::SamplesNotReady)
    );
}

// ---------------------------------------------------------------------------
// Test: comments require a worked-on sample
// ---------------------------------------------------------------------------

#[tokio::test]
async fn comment_on_new_sample_rejected() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    let err = h
        .samples
        .add_comment(sample_id, 1000, "looks off".to_string())
        .await
        .unwrap_err();
    assert_matches!(
        err,
        CoreError::NotAllowed(NotAllowedReason::SampleNotCommentable)
    );
}

#[tokio::test]
async fn comment_appended_after_annotation() {
    let h = harness();
    let (project_id, _) = annotating_project(&h, 1, &[1]).await;
    let sample_id = first_sample_of(&h, project_id, 1).await;

    h.samples
        .validate_and_apply_annotation(sample_id, 1, payload_with("spam"))
        .await
        .unwrap();
    let sample = h
        .samples
        .add_comment(sample_id, 1000, "double-checked".to_string())
        .await
        .unwrap();

    assert_eq!(sample.comments.len(), 1);
    assert_eq!(sample.comments[0].author, 1000);
    assert_eq!(sample.comments[0].body, "double-checked");
}
