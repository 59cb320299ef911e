//! Advisory endpoint configuration, read from the environment.

/// Connection settings for the chat completions endpoint.
///
/// | Variable                | Required | Default        |
/// |-------------------------|----------|----------------|
/// | `ADVISORY_API_URL`      | yes      | -              |
/// | `ADVISORY_API_KEY`      | yes      | -              |
/// | `ADVISORY_MODEL`        | no       | `gpt-4o-mini`  |
/// | `ADVISORY_TIMEOUT_SECS` | no       | `30`           |
#[derive(Debug, Clone)]
pub struct AdvisoryConfig {
    pub api_url: String,
    pub api_key: String,
    pub model: String,
    pub timeout_secs: u64,
}

impl AdvisoryConfig {
    /// Load the configuration from environment variables.
    ///
    /// Returns `None` when the required variables are absent, which disables
    /// the advisory features rather than failing startup.
    pub fn from_env() -> Option<Self> {
        let api_url = std::env::var("ADVISORY_API_URL").ok()?;
        let api_key = std::env::var("ADVISORY_API_KEY").ok()?;

        let model =
            std::env::var("ADVISORY_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string());
        let timeout_secs = std::env::var("ADVISORY_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or(30);

        Some(Self {
            api_url,
            api_key,
            model,
            timeout_secs,
        })
    }
}
