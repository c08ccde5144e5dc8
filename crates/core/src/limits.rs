//! Explicit limits threaded into the validators.
//!
//! These were ambient globals in earlier iterations; they now travel as
//! a plain struct so tests and alternative deployments can tighten or
//! relax them without process-wide state.

/// Maximum number of generated texts accepted in a single annotation.
pub const DEFAULT_MAX_GENERATED_TEXTS: usize = 30;

/// Maximum length of a project name.
pub const DEFAULT_MAX_NAME_LEN: usize = 200;

/// Maximum number of labels a single label set may define.
pub const DEFAULT_MAX_LABELS_PER_SET: usize = 200;

/// Maximum length of a single label string.
pub const DEFAULT_MAX_LABEL_LEN: usize = 120;

/// Maximum number of texts a sample may carry.
pub const DEFAULT_MAX_TEXTS_PER_SAMPLE: usize = 64;

/// Maximum length of a sample comment body.
pub const DEFAULT_MAX_COMMENT_LEN: usize = 2000;

/// Tunable caps applied during config and annotation validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    pub max_generated_texts: usize,
    pub max_name_len: usize,
    pub max_labels_per_set: usize,
    pub max_label_len: usize,
    pub max_texts_per_sample: usize,
    pub max_comment_len: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_generated_texts: DEFAULT_MAX_GENERATED_TEXTS,
            max_name_len: DEFAULT_MAX_NAME_LEN,
            max_labels_per_set: DEFAULT_MAX_LABELS_PER_SET,
            max_label_len: DEFAULT_MAX_LABEL_LEN,
            max_texts_per_sample: DEFAULT_MAX_TEXTS_PER_SAMPLE,
            max_comment_len: DEFAULT_MAX_COMMENT_LEN,
        }
    }
}
