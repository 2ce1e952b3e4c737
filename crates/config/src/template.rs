//! Config template written when a profile has no config file yet.

/// The default `config.toml` with every option documented.
#[must_use]
pub fn default_config_template() -> String {
    r##"# dmbridge profile configuration
# ==============================
# Changes require a restart to take effect.
#
# Environment variable substitution is supported: ${ENV_VAR}
# Example: token = "${DISCORD_TOKEN}"
#
# DMBRIDGE_TOKEN and DMBRIDGE_CHANNEL override the values below.

# Bot token from the Discord developer portal.
token = ""

# Numeric id of the guild channel that receives the mirrored messages.
channel = ""

# Language of the notices sent back to users: "en" or "ja".
locale = "en"

# Re-fetch each mirror after it is posted or edited and log mismatches.
verify_writes = false
"##
    .to_string()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, crate::schema::BridgeConfig, secrecy::ExposeSecret};

    #[test]
    fn template_parses_to_defaults() {
        let cfg: BridgeConfig = toml::from_str(&default_config_template()).unwrap();
        assert!(cfg.token.expose_secret().is_empty());
        assert!(cfg.channel.is_empty());
        assert!(!cfg.verify_writes);
    }
}
