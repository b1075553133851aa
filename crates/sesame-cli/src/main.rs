mod cli;
mod config;
mod storage;

use crate::cli::{Command, ConfigCommand, SessionCommand};
use clap::Parser;
use color_eyre::Result;
use serde_json::Value;
use sesame_core::{cipher::SessionCipher, is_valid_json, session::SessionBackend};
use sesame_storage::EncryptedSessionStore;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

fn main() -> Result<()> {
    color_eyre::install()?;
    init_tracing();

    let cli = cli::Cli::parse();
    let mut config = config::load()?;
    config.apply_overrides(cli.prefix, cli.session_dir);

    match cli.command {
        Command::Get { key } => {
            let store = storage::store_from_config(&config)?;
            match read_pretty(&store, &key)? {
                Some(json) => println!("{json}"),
                None => color_eyre::eyre::bail!("no value for key {key:?}"),
            }
        }
        Command::Set { key, value, raw } => {
            let store = storage::store_from_config(&config)?;
            store.set_item(&key, &parse_value(&value, raw))?;
        }
        Command::Remove { key } => {
            storage::store_from_config(&config)?.remove_item(&key)?;
        }
        Command::Keys => {
            for key in storage::store_from_config(&config)?.keys()? {
                println!("{key}");
            }
        }
        Command::Clear => {
            let removed = storage::store_from_config(&config)?.clear()?;
            println!("Removed {removed} entries");
        }
        // Same rule as `EncryptedSessionStore::get_key_name`, without touching the secret.
        Command::KeyName { key } => println!("{}{key}", config.prefix()),
        Command::CheckJson { text } => println!("{}", is_valid_json(&text) == Some(true)),
        Command::Health => run_health_check(&config)?,
        Command::Config(ConfigCommand::Init) => init_config(&config)?,
        Command::Session(SessionCommand::End) => end_session(&config)?,
    }

    Ok(())
}

fn init_tracing() {
    // Respect user-provided filters; stdout carries values, so stay quiet by default.
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);
    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Interprets command-line input as JSON, falling back to a JSON string.
fn parse_value(input: &str, raw: bool) -> Value {
    if !raw && is_valid_json(input) == Some(true) {
        if let Ok(value) = serde_json::from_str(input) {
            return value;
        }
    }
    Value::String(input.to_string())
}

fn read_pretty<B: SessionBackend, C: SessionCipher>(
    store: &EncryptedSessionStore<B, C>,
    key: &str,
) -> Result<Option<String>> {
    match store.get_item(key)? {
        Some(value) => Ok(Some(serde_json::to_string_pretty(&value)?)),
        None => Ok(None),
    }
}

/// Runs a quick health check of the encrypted session path.
fn run_health_check(config: &config::Config) -> Result<()> {
    let store = storage::store_from_config(config)?;
    run_store_health(&store)?;
    println!("Session store: ok ({})", storage::session_dir(config).display());
    Ok(())
}

fn run_store_health<B: SessionBackend, C: SessionCipher>(
    store: &EncryptedSessionStore<B, C>,
) -> Result<()> {
    let probe_key = "health/probe";
    let payload = serde_json::json!({ "ok": true });
    store.set_item(probe_key, &payload)?;
    let round_trip = store.get_item(probe_key)?;
    store.remove_item(probe_key)?;

    if round_trip.as_ref() != Some(&payload) {
        color_eyre::eyre::bail!("session store round-trip failed");
    }
    Ok(())
}

fn init_config(config: &config::Config) -> Result<()> {
    let path = config::write_default_if_missing(config)?;
    println!("Config initialized at {}", path.display());
    Ok(())
}

fn end_session(config: &config::Config) -> Result<()> {
    let backend = storage::session_backend(config);
    backend.destroy()?;
    info!(root = ?backend.root(), "session ended");
    println!("Session ended");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage;
    use serde_json::json;

    #[test]
    fn health_check_with_test_store_succeeds() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = storage::test_store(dir.path());
        run_store_health(&store).expect("health check should succeed");
        assert!(store.keys().expect("keys").is_empty());
    }

    #[test]
    fn parse_value_prefers_json() {
        assert_eq!(parse_value("{\"a\":1}", false), json!({"a": 1}));
        assert_eq!(parse_value("42", false), json!(42));
        assert_eq!(parse_value("hello", false), json!("hello"));
        assert_eq!(parse_value("42", true), json!("42"));
    }

    #[test]
    fn read_pretty_formats_stored_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let store = storage::test_store(dir.path());
        store.set_item("k", &json!({"a": 1})).expect("set");

        let pretty = read_pretty(&store, "k").expect("read").expect("present");
        assert_eq!(pretty, "{\n  \"a\": 1\n}");
        assert_eq!(read_pretty(&store, "missing").expect("read"), None);
    }

    #[test]
    fn end_session_removes_directory() {
        let dir = tempfile::tempdir().expect("tempdir");
        let root = dir.path().join("session");
        let cfg = config::Config {
            session_dir: Some(root.clone()),
            ..config::Config::default()
        };
        storage::test_store(&root)
            .set_item("k", &1)
            .expect("set");

        end_session(&cfg).expect("end session");
        assert!(!root.exists());
    }
}
