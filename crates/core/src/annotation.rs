//! The annotation schema validator.
//!
//! A submitted annotation has no fixed shape: the project's
//! [`AnnotationConfig`](crate::schema::AnnotationConfig) decides at
//! validation time which fields must be present and which are
//! forbidden. Validation is strict/closed: a field the config does not
//! enable is rejected, not ignored. The single `gate` combinator
//! encodes the "enabled implies required, disabled implies forbidden"
//! rule applied at every nesting level.

use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::limits::Limits;
use crate::schema::{AnnotationConfig, LabelSet, TextConfig};

// ---------------------------------------------------------------------------
// Payload types
// ---------------------------------------------------------------------------

/// A labeled character span within one text of a sample.
///
/// `start_at..end_at` are character offsets; `end_at` may equal the
/// text's character count (exclusive upper bound).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InlineLabeling {
    pub start_at: usize,
    pub end_at: usize,
    pub label: String,
}

/// The per-text part of a submitted annotation, aligned with the
/// enabled subset of the config's `text_configs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnnotationPayload {
    #[serde(default)]
    pub labelings: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub inline_labelings: Option<Vec<InlineLabeling>>,
}

/// A candidate annotation as submitted by an annotator.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationPayload {
    #[serde(default)]
    pub labelings: Option<Vec<Vec<String>>>,
    #[serde(default)]
    pub generated_texts: Option<Vec<String>>,
    #[serde(default)]
    pub text_annotations: Option<Vec<TextAnnotationPayload>>,
}

/// The per-text annotation as stored on a sample.
///
/// Stored full-length: one entry per `text_configs` entry, so the
/// document stays positionally aligned with the config. Entries for
/// disabled configs carry `None` in both fields.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextAnnotation {
    pub labelings: Option<Vec<Vec<String>>>,
    pub inline_labelings: Option<Vec<InlineLabeling>>,
}

/// A fully validated annotation, ready to be merged into a sample.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedAnnotation {
    pub labelings: Option<Vec<Vec<String>>>,
    pub generated_texts: Option<Vec<String>>,
    pub text_annotations: Vec<TextAnnotation>,
}

// ---------------------------------------------------------------------------
// The gating combinator
// ---------------------------------------------------------------------------

/// Enforce "enabled implies required, disabled implies forbidden" for
/// one field at one nesting level.
fn gate<'a, T>(
    enabled: bool,
    value: Option<&'a T>,
    field: &str,
    context: &str,
) -> Result<Option<&'a T>, CoreError> {
    match (enabled, value) {
        (true, None) => Err(CoreError::Validation(format!(
            "{context}: {field} is required by the project config"
        ))),
        (false, Some(_)) => Err(CoreError::Validation(format!(
            "{context}: {field} is not enabled by the project config"
        ))),
        (_, v) => Ok(v),
    }
}

// ---------------------------------------------------------------------------
// Field validators
// ---------------------------------------------------------------------------

/// Validate a `labelings` list against its label sets.
///
/// Arity must match exactly; every selected label must belong to the
/// corresponding set; single-select sets accept at most one label.
fn validate_labelings(
    labelings: &[Vec<String>],
    sets: &[LabelSet],
    context: &str,
) -> Result<(), CoreError> {
    if labelings.len() != sets.len() {
        return Err(CoreError::Validation(format!(
            "{context}: labelings has {} entries, expected {}",
            labelings.len(),
            sets.len()
        )));
    }
    for (i, (selection, set)) in labelings.iter().zip(sets).enumerate() {
        if !set.is_multi_selected && selection.len() > 1 {
            return Err(CoreError::Validation(format!(
                "{context}: label set {i} is single-select but {} labels were chosen",
                selection.len()
            )));
        }
        for label in selection {
            if !set.labels.contains(label) {
                return Err(CoreError::Validation(format!(
                    "{context}: label '{label}' is not part of label set {i}"
                )));
            }
        }
    }
    Ok(())
}

/// Validate the generated-texts list: non-empty, capped by `limits`.
fn validate_generated_texts(texts: &[String], limits: &Limits) -> Result<(), CoreError> {
    if texts.is_empty() {
        return Err(CoreError::Validation(
            "generated_texts must not be empty".to_string(),
        ));
    }
    if texts.len() > limits.max_generated_texts {
        return Err(CoreError::Validation(format!(
            "generated_texts has {} entries, maximum is {}",
            texts.len(),
            limits.max_generated_texts
        )));
    }
    Ok(())
}

/// Validate inline labelings against the vocabulary and span bounds of
/// one text. `text_len` is the character count of the annotated text.
fn validate_inline_labelings(
    inline: &[InlineLabeling],
    config: &TextConfig,
    text_len: usize,
    context: &str,
) -> Result<(), CoreError> {
    for (i, labeling) in inline.iter().enumerate() {
        if !config.inline_labels.contains(&labeling.label) {
            return Err(CoreError::Validation(format!(
                "{context}: inline labeling {i} uses label '{}' which is not an inline label",
                labeling.label
            )));
        }
        if labeling.start_at > labeling.end_at {
            return Err(CoreError::Validation(format!(
                "{context}: inline labeling {i} has start_at {} after end_at {}",
                labeling.start_at, labeling.end_at
            )));
        }
        if labeling.end_at > text_len {
            return Err(CoreError::Validation(format!(
                "{context}: inline labeling {i} ends at {} but the text has {text_len} characters",
                labeling.end_at
            )));
        }
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// The validator
// ---------------------------------------------------------------------------

/// Validate a candidate annotation against a project's config and a
/// sample's texts.
///
/// On success returns the [`ValidatedAnnotation`] to merge into the
/// sample, with `text_annotations` expanded to full config length.
/// Fails fast with [`CoreError::Validation`] at the first violated
/// rule.
pub fn validate_annotation(
    config: &AnnotationConfig,
    texts: &[String],
    payload: &AnnotationPayload,
    limits: &Limits,
) -> Result<ValidatedAnnotation, CoreError> {
    // Project-level label sets.
    let labelings = gate(
        config.has_label_sets,
        payload.labelings.as_ref(),
        "labelings",
        "annotation",
    )?;
    if let Some(labelings) = labelings {
        validate_labelings(labelings, &config.label_sets, "annotation")?;
    }

    // Generated texts.
    let generated = gate(
        config.has_generated_texts,
        payload.generated_texts.as_ref(),
        "generated_texts",
        "annotation",
    )?;
    if let Some(generated) = generated {
        validate_generated_texts(generated, limits)?;
    }

    // Per-text annotations: the payload carries exactly one entry per
    // *enabled* text config, in config order.
    let enabled: Vec<(usize, &TextConfig)> = config.enabled_text_configs().collect();
    let submitted: &[TextAnnotationPayload] = payload.text_annotations.as_deref().unwrap_or(&[]);
    if submitted.len() != enabled.len() {
        return Err(CoreError::Validation(format!(
            "text_annotations has {} entries, expected {} (one per enabled text config)",
            submitted.len(),
            enabled.len()
        )));
    }

    let mut full: Vec<TextAnnotation> = vec![TextAnnotation::default(); config.text_configs.len()];
    for (entry, &(text_index, tc)) in submitted.iter().zip(&enabled) {
        let context = format!("text annotation for text {text_index}");

        let text = texts.get(text_index).ok_or_else(|| {
            CoreError::Validation(format!(
                "{context}: the sample has no text at index {text_index}"
            ))
        })?;

        let labelings = gate(tc.has_label_sets, entry.labelings.as_ref(), "labelings", &context)?;
        if let Some(labelings) = labelings {
            validate_labelings(labelings, &tc.label_sets, &context)?;
        }

        let inline = gate(
            tc.has_inline_labels,
            entry.inline_labelings.as_ref(),
            "inline_labelings",
            &context,
        )?;
        if let Some(inline) = inline {
            validate_inline_labelings(inline, tc, text.chars().count(), &context)?;
        }

        full[text_index] = TextAnnotation {
            labelings: labelings.cloned(),
            inline_labelings: inline.cloned(),
        };
    }

    Ok(ValidatedAnnotation {
        labelings: labelings.cloned(),
        generated_texts: generated.cloned(),
        text_annotations: full,
    })
}
