//! Shared harness for the engine integration tests.

#![allow(dead_code)]

use std::sync::Arc;

use labelkit_core::schema::{AnnotationConfig, LabelSet, TextConfig};
use labelkit_core::types::DbId;
use labelkit_db::models::{CreateProject, Division, NewSample, User};
use labelkit_db::{DocumentStore, MemoryStore};
use labelkit_engine::{EngineConfig, IngestService, ProjectService, SampleService};

pub struct Harness {
    pub store: Arc<MemoryStore>,
    pub projects: ProjectService,
    pub samples: SampleService,
    pub ingest: IngestService,
}

/// Build a harness over a fresh in-memory store.
pub fn harness() -> Harness {
    harness_with(EngineConfig::default())
}

pub fn harness_with(config: EngineConfig) -> Harness {
    init_tracing();
    let store = Arc::new(MemoryStore::new());
    let as_store: Arc<dyn DocumentStore> = store.clone();
    Harness {
        store,
        projects: ProjectService::new(as_store.clone(), config),
        samples: SampleService::new(as_store.clone(), config),
        ingest: IngestService::new(as_store, config),
    }
}

fn init_tracing() {
    use std::sync::Once;
    static INIT: Once = Once::new();
    INIT.call_once(|| {
        tracing_subscriber::fmt()
            .with_env_filter(
                tracing_subscriber::EnvFilter::try_from_default_env()
                    .unwrap_or_else(|_| "labelkit_engine=debug".into()),
            )
            .with_test_writer()
            .try_init()
            .ok();
    });
}

/// Seed bare user documents for the given annotator ids.
pub async fn seed_users(harness: &Harness, ids: &[DbId]) {
    for &id in ids {
        harness.store.insert_user(User::new(id)).await.unwrap();
    }
}

/// A single single-select project-level label set: spam / ham.
pub fn spam_config() -> AnnotationConfig {
    AnnotationConfig {
        has_label_sets: true,
        label_sets: vec![LabelSet {
            is_multi_selected: false,
            labels: vec!["spam".to_string(), "ham".to_string()],
        }],
        has_generated_texts: false,
        text_configs: vec![],
    }
}

/// A config with one inline-label text config for the first text.
pub fn inline_config(labels: &[&str]) -> AnnotationConfig {
    AnnotationConfig {
        has_label_sets: false,
        label_sets: vec![],
        has_generated_texts: false,
        text_configs: vec![TextConfig {
            has_label_sets: false,
            label_sets: vec![],
            has_inline_labels: true,
            inline_labels: labels.iter().map(|s| s.to_string()).collect(),
        }],
    }
}

pub fn create_input(name: &str, maximum_of_annotators: u32) -> CreateProject {
    CreateProject {
        name: name.to_string(),
        project_type_id: 1,
        manager_id: Some(1000),
        maximum_of_annotators,
        annotation_config: spam_config(),
    }
}

/// One-text rows for ingestion.
pub fn rows(count: usize) -> Vec<NewSample> {
    (1..=count)
        .map(|i| NewSample {
            texts: vec![format!("message number {i}")],
        })
        .collect()
}

/// Create a project with the spam config, load `sample_count` samples,
/// and advance it to `annotating` with the given annotators joined.
/// Returns the project id and the planned divisions in join order.
pub async fn annotating_project(
    harness: &Harness,
    sample_count: usize,
    annotators: &[DbId],
) -> (DbId, Vec<Division>) {
    seed_users(harness, annotators).await;
    let project = harness
        .projects
        .create_project(create_input("integration project", annotators.len() as u32))
        .await
        .unwrap();

    harness.ingest.ingest(project.id, rows(sample_count)).await.unwrap();
    harness.projects.turn_to_next_phase(project.id).await.unwrap();

    for &annotator in annotators {
        harness.projects.join_project(project.id, annotator).await.unwrap();
    }

    let turn = harness.projects.turn_to_next_phase(project.id).await.unwrap();
    (project.id, turn.divisions.unwrap())
}
