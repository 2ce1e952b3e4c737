use std::path::{Path, PathBuf};

use {
    secrecy::Secret,
    tracing::{debug, info, warn},
};

use crate::{env_subst::expand_env, schema::BridgeConfig, template::default_config_template};

/// Profile used when none is given on the command line.
pub const DEFAULT_PROFILE: &str = "default_profile";

/// Config file names inside a profile directory, checked in order.
const CONFIG_FILENAMES: &[&str] = &["config.toml", "config.yaml", "config.yml", "config.json"];

const DB_FILENAME: &str = "db.sqlite";

/// Platform data directory (`~/.local/share/dmbridge` on Linux).
pub fn default_data_dir() -> Option<PathBuf> {
    directories::ProjectDirs::from("", "", "dmbridge").map(|d| d.data_dir().to_path_buf())
}

/// A named profile: one config file and one database under a shared root.
#[derive(Debug, Clone)]
pub struct Profile {
    name: String,
    dir: PathBuf,
}

impl Profile {
    /// Resolve `<data_dir>/<name>`, falling back to [`default_data_dir`].
    pub fn resolve(data_dir: Option<&Path>, name: &str) -> anyhow::Result<Self> {
        if name.is_empty() || name == "." || name == ".." || name.contains(['/', '\\']) {
            anyhow::bail!("invalid profile name {name:?}");
        }
        let root = match data_dir {
            Some(dir) => dir.to_path_buf(),
            None => default_data_dir().ok_or_else(|| {
                anyhow::anyhow!("cannot determine a data directory, pass --data-dir")
            })?,
        };
        Ok(Self {
            name: name.to_string(),
            dir: root.join(name),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn db_path(&self) -> PathBuf {
        self.dir.join(DB_FILENAME)
    }

    /// SQLite URL for the profile database, created on first connect.
    pub fn db_url(&self) -> String {
        format!("sqlite:{}?mode=rwc", self.db_path().display())
    }

    /// First existing config file in the profile directory.
    pub fn find_config_file(&self) -> Option<PathBuf> {
        CONFIG_FILENAMES
            .iter()
            .map(|name| self.dir.join(name))
            .find(|p| p.exists())
    }

    /// Create the profile directory and a template config if none exists.
    ///
    /// Returns the path of the config file in use.
    pub fn ensure(&self) -> anyhow::Result<PathBuf> {
        std::fs::create_dir_all(&self.dir)
            .map_err(|e| anyhow::anyhow!("failed to create {}: {e}", self.dir.display()))?;
        if let Some(path) = self.find_config_file() {
            return Ok(path);
        }
        let path = self.dir.join(CONFIG_FILENAMES[0]);
        std::fs::write(&path, default_config_template())
            .map_err(|e| anyhow::anyhow!("failed to write {}: {e}", path.display()))?;
        info!(path = %path.display(), "created config template");
        Ok(path)
    }

    /// Load, apply env overrides, and validate the profile's config.
    pub fn load(&self) -> anyhow::Result<BridgeConfig> {
        let path = self.ensure()?;
        debug!(profile = %self.name, path = %path.display(), "loading config");
        let mut config = load_config(&path)?;
        apply_env_overrides(&mut config);
        config
            .validate()
            .map_err(|e| anyhow::anyhow!("{}: {e}", path.display()))?;
        Ok(config)
    }
}

/// Load config from the given path (any supported format).
pub fn load_config(path: &Path) -> anyhow::Result<BridgeConfig> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;
    let expanded = expand_env(&raw);
    if !expanded.is_complete() {
        warn!(
            path = %path.display(),
            vars = ?expanded.unresolved,
            "config references unset environment variables"
        );
    }
    parse_config(&expanded.text, path)
}

/// Apply `DMBRIDGE_TOKEN` and `DMBRIDGE_CHANNEL` from the environment.
pub fn apply_env_overrides(config: &mut BridgeConfig) {
    apply_env_overrides_with(config, |name| std::env::var(name).ok());
}

fn apply_env_overrides_with(config: &mut BridgeConfig, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(token) = lookup("DMBRIDGE_TOKEN").filter(|v| !v.is_empty()) {
        debug!("token overridden from environment");
        config.token = Secret::new(token);
    }
    if let Some(channel) = lookup("DMBRIDGE_CHANNEL").filter(|v| !v.is_empty()) {
        debug!(channel = %channel, "channel overridden from environment");
        config.channel = channel;
    }
}

fn parse_config(raw: &str, path: &Path) -> anyhow::Result<BridgeConfig> {
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match ext {
        "toml" => Ok(toml::from_str(raw)?),
        "yaml" | "yml" => Ok(serde_yaml::from_str(raw)?),
        "json" => Ok(serde_json::from_str(raw)?),
        _ => anyhow::bail!("unsupported config format: .{ext}"),
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, dmbridge_mirror::Locale, rstest::rstest, secrecy::ExposeSecret};

    fn profile_in(root: &Path) -> Profile {
        Profile::resolve(Some(root), DEFAULT_PROFILE).unwrap()
    }

    #[test]
    fn resolve_joins_profile_name() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = Profile::resolve(Some(tmp.path()), "work").unwrap();
        assert_eq!(profile.name(), "work");
        assert_eq!(profile.dir(), tmp.path().join("work"));
        assert_eq!(profile.db_path(), tmp.path().join("work").join("db.sqlite"));
        assert!(profile.db_url().starts_with("sqlite:"));
        assert!(profile.db_url().ends_with("db.sqlite?mode=rwc"));
    }

    #[rstest]
    #[case("")]
    #[case("..")]
    #[case("a/b")]
    #[case("a\\b")]
    fn resolve_rejects_bad_names(#[case] name: &str) {
        let tmp = tempfile::tempdir().unwrap();
        assert!(Profile::resolve(Some(tmp.path()), name).is_err());
    }

    #[test]
    fn ensure_writes_template_once() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = profile_in(tmp.path());

        let path = profile.ensure().unwrap();
        assert_eq!(path, profile.dir().join("config.toml"));
        std::fs::write(&path, "channel = \"7\"\n").unwrap();

        // A second call keeps the user's edits.
        let again = profile.ensure().unwrap();
        assert_eq!(again, path);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "channel = \"7\"\n");
    }

    #[test]
    fn load_fresh_profile_reports_missing_token() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = profile_in(tmp.path());
        let err = profile.load().unwrap_err().to_string();
        assert!(err.contains("token"), "{err}");
        assert!(profile.find_config_file().is_some());
    }

    #[test]
    fn finds_yaml_config() {
        let tmp = tempfile::tempdir().unwrap();
        let profile = profile_in(tmp.path());
        std::fs::create_dir_all(profile.dir()).unwrap();
        std::fs::write(
            profile.dir().join("config.yaml"),
            "token: abc\nchannel: \"99\"\nlocale: ja\n",
        )
        .unwrap();

        let path = profile.ensure().unwrap();
        assert!(path.ends_with("config.yaml"));
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.token.expose_secret(), "abc");
        assert_eq!(cfg.channel, "99");
        assert_eq!(cfg.locale, Locale::Ja);
    }

    #[test]
    fn unset_placeholder_is_kept_literal() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.toml");
        std::fs::write(
            &path,
            "token = \"${DMBRIDGE_LOADER_UNSET_VAR}\"\nchannel = \"5\"\n",
        )
        .unwrap();

        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.token.expose_secret(), "${DMBRIDGE_LOADER_UNSET_VAR}");
        assert_eq!(cfg.channel, "5");
    }

    #[test]
    fn loads_json_config() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.json");
        std::fs::write(&path, r#"{"token":"t","channel":"5","verify_writes":true}"#).unwrap();
        let cfg = load_config(&path).unwrap();
        assert_eq!(cfg.channel, "5");
        assert!(cfg.verify_writes);
    }

    #[test]
    fn rejects_unknown_extension() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("config.ini");
        std::fs::write(&path, "token=x").unwrap();
        assert!(load_config(&path).is_err());
    }

    #[test]
    fn env_overrides_replace_values() {
        let mut cfg = BridgeConfig::default();
        apply_env_overrides_with(&mut cfg, |name| match name {
            "DMBRIDGE_TOKEN" => Some("from-env".into()),
            "DMBRIDGE_CHANNEL" => Some("321".into()),
            _ => None,
        });
        assert_eq!(cfg.token.expose_secret(), "from-env");
        assert_eq!(cfg.channel, "321");
    }

    #[test]
    fn empty_env_values_are_ignored() {
        let mut cfg = BridgeConfig {
            channel: "1".into(),
            ..Default::default()
        };
        apply_env_overrides_with(&mut cfg, |_| Some(String::new()));
        assert_eq!(cfg.channel, "1");
    }
}
