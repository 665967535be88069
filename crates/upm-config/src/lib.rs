//! Configuration loading for upm-auth.
//!
//! Values are layered, from lowest to highest precedence:
//!
//! 1. an optional TOML config file,
//! 2. `UPM_AUTH_*` environment variables,
//! 3. `INPUT_*` environment variables, which is how CI runners such as
//!    GitHub Actions hand step inputs to a process,
//! 4. command line flags, applied by [`UpmConfigLayer::layer_config`].
//!
//! Each source is kept as its own layer so a lower one can never shadow a
//! higher one. Key spellings are normalised when a layer is loaded, so
//! `registry-url`, `REGISTRY_URL` and `registry_url` are the same key. Within
//! a layer, `commands.<command>.<key>` is tried before `<key>`.

use std::path::PathBuf;

pub use clap::ArgMatches;
use clap::parser::ValueSource;
use config::{Config, Environment, File, FileFormat, Map, Source, Value, ValueKind};
use miette::Result;

pub use error::UpmConfigError;

mod error;

pub trait UpmConfigLayer {
    fn layer_config(&mut self, _matches: &ArgMatches, _config: &UpmConfig) -> Result<()> {
        Ok(())
    }
}

/// Loaded configuration, one [`Config`] per source, highest precedence first.
#[derive(Debug, Default)]
pub struct UpmConfig {
    layers: Vec<Config>,
}

pub struct UpmConfigOptions {
    env: bool,
    ci_inputs: bool,
    config_file: Option<PathBuf>,
    vars: Option<Map<String, String>>,
}

impl Default for UpmConfigOptions {
    fn default() -> Self {
        UpmConfigOptions {
            env: true,
            ci_inputs: true,
            config_file: None,
            vars: None,
        }
    }
}

impl UpmConfigOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn env(mut self, env: bool) -> Self {
        self.env = env;
        self
    }

    pub fn ci_inputs(mut self, ci_inputs: bool) -> Self {
        self.ci_inputs = ci_inputs;
        self
    }

    pub fn config_file(mut self, file: Option<PathBuf>) -> Self {
        self.config_file = file;
        self
    }

    /// Reads environment variables from `vars` instead of the process
    /// environment.
    pub fn vars<K, V>(mut self, vars: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.vars = Some(
            vars.into_iter()
                .map(|(key, value)| (key.into(), value.into()))
                .collect(),
        );
        self
    }

    pub fn load(self) -> Result<UpmConfig> {
        let mut layers = Vec::new();
        if self.ci_inputs {
            layers.push(layer(CanonicalKeys(
                Environment::with_prefix("input").source(self.vars.clone()),
            ))?);
        }
        if self.env {
            layers.push(layer(CanonicalKeys(
                Environment::with_prefix("upm_auth").source(self.vars.clone()),
            ))?);
        }
        if let Some(file) = self.config_file {
            layers.push(layer(CanonicalKeys(
                File::from(file.as_path())
                    .format(FileFormat::Toml)
                    .required(false),
            ))?);
        }
        Ok(UpmConfig { layers })
    }
}

fn layer(source: impl Source + Send + Sync + 'static) -> Result<Config> {
    Ok(Config::builder()
        .add_source(source)
        .build()
        .map_err(UpmConfigError::ConfigError)?)
}

/// Rewrites every key of the wrapped source to its canonical spelling,
/// including keys of nested tables.
#[derive(Clone, Debug)]
struct CanonicalKeys<S>(S);

impl<S> Source for CanonicalKeys<S>
where
    S: Source + Clone + Send + Sync + 'static,
{
    fn clone_into_box(&self) -> Box<dyn Source + Send + Sync> {
        Box::new(self.clone())
    }

    fn collect(&self) -> Result<Map<String, Value>, config::ConfigError> {
        Ok(canonical_table(self.0.collect()?))
    }
}

fn canonical_table(table: Map<String, Value>) -> Map<String, Value> {
    table
        .into_iter()
        .map(|(key, mut value)| {
            value.kind = match std::mem::replace(&mut value.kind, ValueKind::Nil) {
                ValueKind::Table(inner) => ValueKind::Table(canonical_table(inner)),
                kind => kind,
            };
            (canonical_key(&key), value)
        })
        .collect()
}

fn canonical_key(key: &str) -> String {
    key.to_lowercase().replace('-', "_")
}

/// Finds the first non-empty value for any of `keys`, searching layers from
/// highest to lowest precedence. CI runners export every declared input, so
/// an empty string means "not given" and falls through to the next layer.
pub fn lookup(config: &UpmConfig, command: &str, keys: &[&str]) -> Option<String> {
    config.layers.iter().find_map(|layer| {
        keys.iter()
            .map(|key| canonical_key(key))
            .flat_map(|key| [format!("commands.{command}.{key}"), key])
            .filter_map(|key| layer.get_string(&key).ok())
            .find(|value| !value.is_empty())
    })
}

/// Whether `id` was given explicitly on the command line.
pub fn from_command_line(matches: &ArgMatches, id: &str) -> bool {
    matches.value_source(id) == Some(ValueSource::CommandLine)
}

/// Fills `field` from `config` unless the flag `id` was passed on the command
/// line.
pub fn layer_value(
    field: &mut Option<String>,
    matches: &ArgMatches,
    id: &str,
    config: &UpmConfig,
    command: &str,
    keys: &[&str],
) {
    if from_command_line(matches, id) {
        return;
    }
    if let Some(value) = lookup(config, command, keys) {
        *field = Some(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::fs;
    use std::path::Path;

    use clap::{Arg, Command};
    use miette::{IntoDiagnostic, Result};
    use pretty_assertions::assert_eq;
    use tempfile::tempdir;

    fn login_command() -> Command {
        Command::new("login").arg(Arg::new("registry_url").long("registry-url"))
    }

    fn write_config(dir: &Path, contents: &str) -> Result<PathBuf> {
        let file = dir.join("upm-auth.toml");
        fs::write(&file, contents).into_diagnostic()?;
        Ok(file)
    }

    #[test]
    fn env_configs() -> Result<()> {
        let config = UpmConfigOptions::new()
            .ci_inputs(false)
            .vars([("UPM_AUTH_REGISTRY_URL", "https://registry.example.com")])
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["registry-url"]),
            Some("https://registry.example.com".into())
        );
        Ok(())
    }

    #[test]
    fn ci_inputs() -> Result<()> {
        let config = UpmConfigOptions::new()
            .env(false)
            .vars([("INPUT_ALWAYS-AUTH", "true")])
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["always_auth"]),
            Some("true".into())
        );
        Ok(())
    }

    #[test]
    fn config_file() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = write_config(
            dir.path(),
            "registry-url = \"https://a.example.com\"\n\n[commands.verify]\nregistry-url = \"https://b.example.com\"\n",
        )?;
        let config = UpmConfigOptions::new()
            .env(false)
            .ci_inputs(false)
            .config_file(Some(file))
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["registry_url"]),
            Some("https://a.example.com".into())
        );
        assert_eq!(
            lookup(&config, "verify", &["registry-url"]),
            Some("https://b.example.com".into()),
            "Command-scoped keys win over top-level ones"
        );
        Ok(())
    }

    #[test]
    fn missing_config() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let config = UpmConfigOptions::new()
            .env(false)
            .ci_inputs(false)
            .config_file(Some(dir.path().join("nope.toml")))
            .load()?;
        assert_eq!(lookup(&config, "login", &["registry-url"]), None);
        Ok(())
    }

    #[test]
    fn env_wins_over_file() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = write_config(
            dir.path(),
            "registry-url = \"https://from-file.example.com\"\n",
        )?;
        let config = UpmConfigOptions::new()
            .config_file(Some(file))
            .vars([("UPM_AUTH_REGISTRY_URL", "https://from-env.example.com")])
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["registry-url"]),
            Some("https://from-env.example.com".into())
        );
        Ok(())
    }

    #[test]
    fn ci_input_wins_over_command_scoped_file_key() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = write_config(
            dir.path(),
            "[commands.login]\nregistry-url = \"https://from-file.example.com\"\n",
        )?;
        let config = UpmConfigOptions::new()
            .config_file(Some(file))
            .vars([("INPUT_REGISTRY-URL", "https://from-input.example.com")])
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["registry-url"]),
            Some("https://from-input.example.com".into())
        );
        Ok(())
    }

    #[test]
    fn ci_input_wins_over_env() -> Result<()> {
        let config = UpmConfigOptions::new()
            .vars([
                ("UPM_AUTH_REGISTRY_URL", "https://from-env.example.com"),
                ("INPUT_REGISTRY_URL", "https://from-input.example.com"),
            ])
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["registry_url"]),
            Some("https://from-input.example.com".into())
        );
        Ok(())
    }

    #[test]
    fn lookup_skips_empty_values() -> Result<()> {
        let config = UpmConfigOptions::new()
            .vars([("INPUT_AUTH-TOKEN", ""), ("UPM_AUTH_AUTH_TOKEN", "abc")])
            .load()?;
        assert_eq!(
            lookup(&config, "login", &["auth-token"]),
            Some("abc".into()),
            "An empty CI input falls through to the next layer"
        );
        Ok(())
    }

    #[test]
    fn command_line_wins() -> Result<()> {
        let dir = tempdir().into_diagnostic()?;
        let file = write_config(
            dir.path(),
            "registry-url = \"https://from-file.example.com\"\n",
        )?;
        let config = UpmConfigOptions::new()
            .config_file(Some(file))
            .vars([("INPUT_REGISTRY_URL", "https://from-input.example.com")])
            .load()?;

        let matches = login_command()
            .try_get_matches_from(["login", "--registry-url", "https://cli.example.com"])
            .into_diagnostic()?;
        let mut field = Some("https://cli.example.com".to_owned());
        layer_value(&mut field, &matches, "registry_url", &config, "login", &["registry-url"]);
        assert_eq!(field.as_deref(), Some("https://cli.example.com"));

        let matches = login_command()
            .try_get_matches_from(["login"])
            .into_diagnostic()?;
        let mut field = None;
        layer_value(&mut field, &matches, "registry_url", &config, "login", &["registry-url"]);
        assert_eq!(field.as_deref(), Some("https://from-input.example.com"));
        Ok(())
    }
}
