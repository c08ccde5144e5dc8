//! The runtime-defined annotation schema (`annotation_config`).
//!
//! A project declares at creation time which annotation capabilities it
//! uses: project-level label sets, free-form generated texts, and a
//! per-text config (label sets and/or inline labels) aligned
//! positionally with each sample's `texts`. The config is a tagged data
//! structure walked by the validator in `annotation`, not a
//! compile-time payload type.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::limits::Limits;

// ---------------------------------------------------------------------------
// Config types
// ---------------------------------------------------------------------------

/// A closed vocabulary of selectable labels.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabelSet {
    /// Whether an annotator may pick more than one label from this set.
    pub is_multi_selected: bool,
    pub labels: Vec<String>,
}

/// Capabilities enabled for one text of a sample.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextConfig {
    pub has_label_sets: bool,
    #[serde(default)]
    pub label_sets: Vec<LabelSet>,
    pub has_inline_labels: bool,
    #[serde(default)]
    pub inline_labels: Vec<String>,
}

impl TextConfig {
    /// Whether this per-text config enables any capability at all.
    pub fn is_enabled(&self) -> bool {
        self.has_label_sets || self.has_inline_labels
    }
}

/// The full, runtime-defined annotation schema of a project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationConfig {
    pub has_label_sets: bool,
    #[serde(default)]
    pub label_sets: Vec<LabelSet>,
    pub has_generated_texts: bool,
    #[serde(default)]
    pub text_configs: Vec<TextConfig>,
}

impl AnnotationConfig {
    /// Iterate the per-text configs that enable at least one capability,
    /// with their original index (the index into `Sample.texts`).
    pub fn enabled_text_configs(&self) -> impl Iterator<Item = (usize, &TextConfig)> {
        self.text_configs
            .iter()
            .enumerate()
            .filter(|(_, tc)| tc.is_enabled())
    }

    /// Number of per-text configs that enable at least one capability.
    pub fn enabled_text_config_count(&self) -> usize {
        self.enabled_text_configs().count()
    }

    /// Whether the config enables any annotation capability at all.
    pub fn enables_anything(&self) -> bool {
        self.has_label_sets || self.has_generated_texts || self.enabled_text_config_count() > 0
    }
}

// ---------------------------------------------------------------------------
// Config validation
// ---------------------------------------------------------------------------

/// Validate a label-set list for one nesting level of the config.
///
/// `context` names the level for error messages ("project" or
/// "text config N").
fn validate_label_sets(
    has_label_sets: bool,
    label_sets: &[LabelSet],
    context: &str,
    limits: &Limits,
) -> Result<(), CoreError> {
    if has_label_sets && label_sets.is_empty() {
        return Err(CoreError::Validation(format!(
            "{context}: has_label_sets is true but label_sets is empty"
        )));
    }
    if !has_label_sets && !label_sets.is_empty() {
        return Err(CoreError::Validation(format!(
            "{context}: label_sets provided but has_label_sets is false"
        )));
    }
    for (i, set) in label_sets.iter().enumerate() {
        if set.labels.is_empty() {
            return Err(CoreError::Validation(format!(
                "{context}: label set {i} has no labels"
            )));
        }
        if set.labels.len() > limits.max_labels_per_set {
            return Err(CoreError::Validation(format!(
                "{context}: label set {i} has {} labels, maximum is {}",
                set.labels.len(),
                limits.max_labels_per_set
            )));
        }
        for label in &set.labels {
            if label.is_empty() {
                return Err(CoreError::Validation(format!(
                    "{context}: label set {i} contains an empty label"
                )));
            }
            if label.chars().count() > limits.max_label_len {
                return Err(CoreError::Validation(format!(
                    "{context}: label set {i} contains a label longer than {} characters",
                    limits.max_label_len
                )));
            }
        }
    }
    Ok(())
}

/// Validate an [`AnnotationConfig`] for internal consistency.
///
/// Rules:
/// - at least one capability must be enabled somewhere (project-level
///   label sets, generated texts, or any per-text config);
/// - at every nesting level, `has_label_sets = true` requires a
///   non-empty `label_sets` (and vice versa: no orphan lists);
/// - `has_inline_labels = true` requires non-empty `inline_labels`.
pub fn validate_config(config: &AnnotationConfig, limits: &Limits) -> Result<(), CoreError> {
    if !config.enables_anything() {
        return Err(CoreError::Validation(
            "annotation config must enable at least one annotation capability".to_string(),
        ));
    }

    validate_label_sets(config.has_label_sets, &config.label_sets, "project", limits)?;

    for (i, tc) in config.text_configs.iter().enumerate() {
        let context = format!("text config {i}");
        validate_label_sets(tc.has_label_sets, &tc.label_sets, &context, limits)?;

        if tc.has_inline_labels && tc.inline_labels.is_empty() {
            return Err(CoreError::Validation(format!(
                "{context}: has_inline_labels is true but inline_labels is empty"
            )));
        }
        if !tc.has_inline_labels && !tc.inline_labels.is_empty() {
            return Err(CoreError::Validation(format!(
                "{context}: inline_labels provided but has_inline_labels is false"
            )));
        }
        for label in &tc.inline_labels {
            if label.is_empty() {
                return Err(CoreError::Validation(format!(
                    "{context}: inline_labels contains an empty label"
                )));
            }
        }
    }

    Ok(())
}
