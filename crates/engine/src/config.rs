//! Engine configuration, read from the environment once at startup.

use labelkit_core::limits::Limits;

/// Default bound on optimistic-concurrency retries per operation.
pub const DEFAULT_MAX_OCC_RETRIES: u32 = 5;

/// Tunables threaded into the services.
#[derive(Debug, Clone, Copy)]
pub struct EngineConfig {
    /// How many times a read-modify-write cycle is retried after a
    /// revision mismatch before the operation fails with `Conflict`.
    pub max_occ_retries: u32,
    pub limits: Limits,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            max_occ_retries: DEFAULT_MAX_OCC_RETRIES,
            limits: Limits::default(),
        }
    }
}

impl EngineConfig {
    /// Build the config from the environment, falling back to defaults
    /// for anything unset or unparsable. Loads `.env` if present.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let mut config = Self::default();
        config.max_occ_retries =
            env_parse("LABELKIT_MAX_OCC_RETRIES", config.max_occ_retries);
        config.limits.max_generated_texts =
            env_parse("LABELKIT_MAX_GENERATED_TEXTS", config.limits.max_generated_texts);
        config.limits.max_texts_per_sample =
            env_parse("LABELKIT_MAX_TEXTS_PER_SAMPLE", config.limits.max_texts_per_sample);
        config.limits.max_comment_len =
            env_parse("LABELKIT_MAX_COMMENT_LEN", config.limits.max_comment_len);
        config
    }
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
