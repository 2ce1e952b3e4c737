use {
    dmbridge_mirror::Locale,
    secrecy::{ExposeSecret, Secret},
    serde::{Deserialize, Serialize},
};

/// Settings for one bridge profile.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BridgeConfig {
    /// Discord bot token.
    #[serde(serialize_with = "serialize_secret")]
    pub token: Secret<String>,

    /// Snowflake of the guild channel that receives mirrors.
    pub channel: String,

    /// Language of the notices sent back to users.
    pub locale: Locale,

    /// Re-fetch each mirror after create/edit and log any mismatch.
    pub verify_writes: bool,
}

impl std::fmt::Debug for BridgeConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BridgeConfig")
            .field("token", &"[REDACTED]")
            .field("channel", &self.channel)
            .field("locale", &self.locale)
            .field("verify_writes", &self.verify_writes)
            .finish()
    }
}

fn serialize_secret<S: serde::Serializer>(
    secret: &Secret<String>,
    serializer: S,
) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(secret.expose_secret())
}

impl Default for BridgeConfig {
    fn default() -> Self {
        Self {
            token: Secret::new(String::new()),
            channel: String::new(),
            locale: Locale::default(),
            verify_writes: false,
        }
    }
}

impl BridgeConfig {
    /// Problems that keep the bridge from starting. Empty when usable.
    #[must_use]
    pub fn problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        if self.token.expose_secret().trim().is_empty() {
            problems.push("`token` is not set".to_string());
        }
        let channel = self.channel.trim();
        if channel.is_empty() {
            problems.push("`channel` is not set".to_string());
        } else if !channel.bytes().all(|b| b.is_ascii_digit()) {
            problems.push(format!("`channel` must be a numeric id, got {channel:?}"));
        }
        problems
    }

    /// Fail with every problem listed if the config is not usable.
    pub fn validate(&self) -> anyhow::Result<()> {
        let problems = self.problems();
        if problems.is_empty() {
            return Ok(());
        }
        anyhow::bail!("invalid config: {}", problems.join("; "))
    }
}
