use std::{fmt::Write as _, sync::Arc};

use {
    secrecy::ExposeSecret,
    serenity::http::Http,
    tokio_util::sync::CancellationToken,
    tracing::{info, warn},
};

use {
    dmbridge_config::{Profile, load_config},
    dmbridge_mirror::{ReconcileReport, store_sqlite::SqliteStore},
};

async fn open_store(profile: &Profile) -> anyhow::Result<Arc<SqliteStore>> {
    let store = SqliteStore::new(&profile.db_url()).await?;
    info!(path = %profile.db_path().display(), "opened correlation store");
    Ok(Arc::new(store))
}

/// Run the bridge until Ctrl-C.
pub async fn run(profile: &Profile) -> anyhow::Result<()> {
    let config = profile.load()?;
    let store = open_store(profile).await?;

    let cancel = CancellationToken::new();
    tokio::spawn({
        let cancel = cancel.clone();
        async move {
            match tokio::signal::ctrl_c().await {
                Ok(()) => {
                    info!("ctrl-c received, shutting down");
                    cancel.cancel();
                },
                Err(e) => warn!(error = %e, "failed to listen for ctrl-c"),
            }
        }
    });

    dmbridge_discord::start_bridge(config, store, cancel).await
}

/// Create the profile and report what still needs to be filled in.
pub fn init(profile: &Profile) -> anyhow::Result<()> {
    let path = profile.ensure()?;
    println!("Profile '{}': {}", profile.name(), path.display());

    let mut config = load_config(&path)?;
    dmbridge_config::apply_env_overrides(&mut config);
    let problems = config.problems();
    if problems.is_empty() {
        println!("Config is complete. Start the bridge with `dmbridge run`.");
    } else {
        println!("Edit the config before running:");
        for problem in problems {
            println!("  - {problem}");
        }
    }
    Ok(())
}

/// Check stored records against Discord over REST only.
pub async fn reconcile(
    profile: &Profile,
    limit: usize,
    dry_run: bool,
    json: bool,
) -> anyhow::Result<()> {
    let config = profile.load()?;
    let store = open_store(profile).await?;
    let http = Arc::new(Http::new(config.token.expose_secret()));
    let engine = dmbridge_discord::build_engine(&config, store, http);

    let report = engine.reconcile(limit, dry_run).await?;
    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        print!("{}", format_report(&report, dry_run));
    }
    Ok(())
}

fn format_report(report: &ReconcileReport, dry_run: bool) -> String {
    let verb = if dry_run {
        "would prune"
    } else {
        "pruned"
    };
    let mut out = format!(
        "checked {} record(s), {verb} {}, {} error(s)\n",
        report.checked,
        report.pruned.len(),
        report.errors
    );
    for original_id in &report.pruned {
        let _ = writeln!(out, "  {original_id}");
    }
    out
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use {super::*, tempfile::TempDir};

    #[test]
    fn report_lists_pruned_records() {
        let report = ReconcileReport {
            checked: 3,
            pruned: vec!["m1".into(), "m2".into()],
            errors: 1,
        };
        assert_eq!(
            format_report(&report, false),
            "checked 3 record(s), pruned 2, 1 error(s)\n  m1\n  m2\n"
        );
        assert!(format_report(&report, true).contains("would prune 2"));
    }

    #[test]
    fn init_creates_profile() {
        let temp = TempDir::new().unwrap();
        let profile = Profile::resolve(Some(temp.path()), "test").unwrap();
        init(&profile).unwrap();
        assert!(profile.dir().join("config.toml").exists());
        // Running it again keeps the existing file.
        init(&profile).unwrap();
    }

    #[tokio::test]
    async fn store_is_created_in_profile_dir() {
        let temp = TempDir::new().unwrap();
        let profile = Profile::resolve(Some(temp.path()), "test").unwrap();
        profile.ensure().unwrap();
        let store = open_store(&profile).await.unwrap();
        assert!(profile.db_path().exists());
        drop(store);
    }
}
