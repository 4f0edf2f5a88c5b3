//! CLI runner - executes commands

use super::commands::{Cli, Commands, OutputFormat};
use super::sink::{catalog_entry, SingerSink};
use crate::config::{CollectionSpec, TapConfig};
use crate::engine::{Extractor, SyncStats};
use crate::error::{Error, Result};
use crate::state::StateManager;
use crate::store::FirestoreStore;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        let config = self.load_config()?;
        let extractor = Extractor::new(Arc::new(FirestoreStore::from_config(&config)?));

        match &self.cli.command {
            Commands::Check => self.check(&config, &extractor).await,
            Commands::Discover => self.discover(&config, &extractor).await,
            Commands::Read { streams } => {
                let selected = select_collections(&config, streams.as_deref())?;
                self.read(&selected, &extractor).await
            }
        }
    }

    /// Load and validate configuration. Inline JSON wins over the file.
    fn load_config(&self) -> Result<TapConfig> {
        let config = if let Some(json_str) = &self.cli.config_json {
            TapConfig::from_json_str(json_str)?
        } else if let Some(path) = &self.cli.config {
            TapConfig::from_file(path)?
        } else {
            return Err(Error::missing_field("config"));
        };

        config.validate()?;
        Ok(config)
    }

    /// Load state
    fn load_state(&self) -> Result<StateManager> {
        // Inline state takes precedence
        if let Some(state_json) = &self.cli.state_json {
            StateManager::from_json(state_json)
        } else if let Some(path) = &self.cli.state {
            StateManager::from_file(path)
        } else {
            Ok(StateManager::in_memory())
        }
    }

    /// Check every collection is reachable
    async fn check(&self, config: &TapConfig, extractor: &Extractor) -> Result<()> {
        let mut failures = Vec::new();
        for spec in &config.collections {
            if let Err(e) = extractor.check(spec).await {
                warn!("Check failed: {e}");
                failures.push(e.to_string());
            }
        }

        let status = if failures.is_empty() {
            json!({
                "status": "SUCCEEDED",
                "message": format!("{} collections reachable", config.collections.len())
            })
        } else {
            json!({
                "status": "FAILED",
                "message": failures.join("; ")
            })
        };
        self.output_message(&json!({
            "type": "CONNECTION_STATUS",
            "connectionStatus": status
        }));

        Ok(())
    }

    /// Print the catalog
    async fn discover(&self, config: &TapConfig, extractor: &Extractor) -> Result<()> {
        let mut streams = Vec::with_capacity(config.collections.len());
        for spec in &config.collections {
            let schema = extractor.discover(spec).await;
            streams.push(catalog_entry(&schema));
        }

        self.output_message(&json!({ "streams": streams }));
        Ok(())
    }

    /// Extract the selected collections in order
    async fn read(&self, selected: &[&CollectionSpec], extractor: &Extractor) -> Result<()> {
        let state = self.load_state()?;
        let mut sink = SingerSink::new(std::io::stdout(), state.clone(), self.cli.format);
        let mut totals = SyncStats::new();

        for spec in selected {
            let stats = extractor.run(spec, &state, &mut sink).await?;
            totals.merge(&stats);
        }

        state.save().await?;
        info!(
            "Sync complete: {} records from {} collections ({} empty documents skipped)",
            totals.records_synced, totals.streams_synced, totals.tombstones_skipped
        );
        Ok(())
    }

    /// Output a message
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Collections named in a comma-separated list, in configured order.
///
/// An empty or absent list selects everything; an unknown name is an error.
pub fn select_collections<'a>(
    config: &'a TapConfig,
    streams: Option<&str>,
) -> Result<Vec<&'a CollectionSpec>> {
    let names: Vec<&str> = streams
        .unwrap_or_default()
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    if names.is_empty() {
        return Ok(config.collections.iter().collect());
    }

    if let Some(unknown) = names.iter().find(|n| config.collection(n).is_none()) {
        return Err(Error::invalid_value(
            "streams",
            format!("unknown collection '{unknown}'"),
        ));
    }

    Ok(config
        .collections
        .iter()
        .filter(|c| names.contains(&c.name.as_str()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn config() -> TapConfig {
        TapConfig::from_json_str(
            r#"{"project_id": "p", "collections": [{"name": "users"}, {"name": "orders"}, {"name": "users/u1/carts"}]}"#,
        )
        .unwrap()
    }

    #[test]
    fn test_select_all_by_default() {
        let config = config();
        assert_eq!(select_collections(&config, None).unwrap().len(), 3);
        assert_eq!(select_collections(&config, Some(" , ")).unwrap().len(), 3);
    }

    #[test]
    fn test_select_keeps_configured_order() {
        let config = config();
        let selected = select_collections(&config, Some("users/u1/carts, users")).unwrap();
        let names: Vec<_> = selected.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["users", "users/u1/carts"]);
    }

    #[test]
    fn test_select_unknown_collection() {
        let err = select_collections(&config(), Some("users,missing")).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }

    #[test]
    fn test_parse_read_command() {
        let cli = Cli::parse_from([
            "firestore-tap",
            "--config",
            "tap.yaml",
            "--state",
            "state.json",
            "read",
            "--streams",
            "users",
        ]);
        assert!(matches!(
            cli.command,
            Commands::Read { streams: Some(ref s) } if s == "users"
        ));
        assert_eq!(cli.format, OutputFormat::Json);
        assert!(!cli.verbose);
    }

    #[test]
    fn test_missing_config_is_an_error() {
        let runner = Runner::new(Cli::parse_from(["firestore-tap", "discover"]));
        assert!(matches!(
            runner.load_config(),
            Err(Error::MissingConfigField { .. })
        ));
    }

    #[test]
    fn test_inline_config_is_validated() {
        let runner = Runner::new(Cli::parse_from([
            "firestore-tap",
            "--config-json",
            r#"{"project_id": "p", "collections": []}"#,
            "check",
        ]));
        assert!(runner.load_config().is_err());
    }
}
