use std::{
    collections::{BTreeSet, HashMap},
    path::{Path, PathBuf},
};

use config::{Config, Environment, File, FileFormat, Value};
use miette::{Context, IntoDiagnostic};
use serde::Deserialize;

use crate::result::{bail, Result};

/// Prefix of the environment variables read as configuration.
/// Nested keys are separated by `__`, e.g. `SKETCH_CATALOG__ENRICH__API_KEY`
const ENV_PREFIX: &str = "SKETCH_CATALOG";
const ENV_SEPARATOR: &str = "__";

/// Configuration file read when none is given explicitly
pub const DEFAULT_CONFIG_FILE: &str = "sketch-catalog.toml";

pub const DEFAULT_API_URL: &str = "https://www.googleapis.com/youtube/v3";
pub const DEFAULT_EXCLUDED_TAGS: [&str; 3] = ["shorts", "#shorts", "compilation"];

/// Where the filter stage reads and writes, and what it filters out
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FilterConfig {
    pub input: PathBuf,
    pub output: PathBuf,

    /// Replace the default title patterns when set
    #[serde(default)]
    pub patterns: Option<Vec<String>>,
}

/// Everything the enrichment stage needs, credentials included
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnrichConfig {
    pub input: PathBuf,
    pub output: PathBuf,
    pub api_key: String,
    pub api_url: String,

    /// Lowercase tags that remove a video from the catalog
    pub exclude_tags: BTreeSet<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct EnrichSettings {
    input: PathBuf,
    output: PathBuf,
    #[serde(default)]
    api_key: Option<String>,
    api_url: String,
    exclude_tags: Vec<String>,
}

/// All the settings, merged from defaults, the configuration file,
/// the environment and the command line (in increasing priority)
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub filter: FilterConfig,
    enrich: EnrichSettings,
}

impl Settings {
    /// Load the settings.
    ///
    /// If `file` is None, [`DEFAULT_CONFIG_FILE`] is read if it exists.
    /// An explicitly given file must exist.
    pub fn load(file: Option<&Path>, overrides: Vec<(&'static str, Value)>) -> Result<Self> {
        Self::load_from(file, None, overrides)
    }

    /// Same as [`Settings::load`], reading the environment from `env`
    /// instead of the process environment if given
    fn load_from(
        file: Option<&Path>,
        env: Option<HashMap<String, String>>,
        overrides: Vec<(&'static str, Value)>,
    ) -> Result<Self> {
        let (file, required) = match file {
            Some(file) => (file, true),
            None => (Path::new(DEFAULT_CONFIG_FILE), false),
        };

        let mut builder = Config::builder()
            .set_default("filter.input", "all_videos.json")
            .and_then(|b| b.set_default("filter.output", "sketches.json"))
            .and_then(|b| b.set_default("enrich.input", "sketches.json"))
            .and_then(|b| b.set_default("enrich.output", "sketches_enriched.json"))
            .and_then(|b| b.set_default("enrich.api_url", DEFAULT_API_URL))
            .and_then(|b| b.set_default("enrich.exclude_tags", DEFAULT_EXCLUDED_TAGS.to_vec()))
            .into_diagnostic()
            .wrap_err("Could not set default settings")?
            .add_source(
                File::from(file)
                    .format(FileFormat::Toml)
                    .required(required),
            )
            .add_source(
                Environment::with_prefix(ENV_PREFIX)
                    .separator(ENV_SEPARATOR)
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("filter.patterns")
                    .with_list_parse_key("enrich.exclude_tags")
                    .source(env),
            );

        for (key, value) in overrides {
            builder = builder
                .set_override(key, value)
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not override setting '{key}'"))?;
        }

        let settings = builder
            .build()
            .into_diagnostic()
            .wrap_err_with(|| format!("Could not load configuration from {}", file.display()))?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid configuration")?;

        Ok(settings)
    }

    /// The enrichment configuration, failing if no API key was provided
    pub fn enrich_config(&self) -> Result<EnrichConfig> {
        let enrich = &self.enrich;

        let api_key = match enrich.api_key.as_deref().map(str::trim) {
            Some(key) if !key.is_empty() => key.to_owned(),
            _ => {
                return bail(format!(
                    "No API key configured. Set `enrich.api_key`, \
                    {ENV_PREFIX}{ENV_SEPARATOR}ENRICH{ENV_SEPARATOR}API_KEY or --api-key"
                ))
            }
        };

        Ok(EnrichConfig {
            input: enrich.input.clone(),
            output: enrich.output.clone(),
            api_key,
            api_url: enrich.api_url.trim_end_matches('/').to_owned(),
            exclude_tags: enrich
                .exclude_tags
                .iter()
                .map(|tag| tag.to_lowercase())
                .collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn load(
        file: Option<&Path>,
        env: &[(&str, &str)],
        overrides: Vec<(&'static str, Value)>,
    ) -> Result<Settings> {
        let env = env
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Settings::load_from(file, Some(env), overrides)
    }

    #[test]
    fn defaults() {
        let settings = load(None, &[], vec![]).unwrap();

        assert_eq!(settings.filter.input, PathBuf::from("all_videos.json"));
        assert_eq!(settings.filter.output, PathBuf::from("sketches.json"));
        assert_eq!(settings.filter.patterns, None);
        assert!(settings.enrich_config().is_err());
    }

    #[test]
    fn enrich_config_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            r#"
            [enrich]
            input = "in.json"
            api_key = "secret"
            api_url = "http://localhost:8080/v3/"
            exclude_tags = ["Shorts", "Vlog"]
            "#,
        )
        .unwrap();

        let config = load(Some(path.as_path()), &[], vec![])
            .unwrap()
            .enrich_config()
            .unwrap();

        assert_eq!(config.input, PathBuf::from("in.json"));
        assert_eq!(config.output, PathBuf::from("sketches_enriched.json"));
        assert_eq!(config.api_key, "secret");
        assert_eq!(config.api_url, "http://localhost:8080/v3");
        assert_eq!(
            config.exclude_tags,
            BTreeSet::from(["shorts".to_owned(), "vlog".to_owned()])
        );
    }

    #[test]
    fn default_exclude_tags() {
        let config = load(None, &[], vec![("enrich.api_key", "k".into())])
            .unwrap()
            .enrich_config()
            .unwrap();

        assert_eq!(
            config.exclude_tags,
            DEFAULT_EXCLUDED_TAGS
                .iter()
                .map(|t| t.to_string())
                .collect::<BTreeSet<_>>()
        );
        assert_eq!(config.api_url, DEFAULT_API_URL);
    }

    #[test]
    fn environment_beats_file_and_overrides_beat_environment() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("catalog.toml");
        fs::write(
            &path,
            "[filter]\ninput = \"file.json\"\noutput = \"file_out.json\"\n",
        )
        .unwrap();

        let settings = load(
            Some(path.as_path()),
            &[
                ("SKETCH_CATALOG__FILTER__INPUT", "env.json"),
                ("SKETCH_CATALOG__FILTER__OUTPUT", "env_out.json"),
                ("SKETCH_CATALOG__FILTER__PATTERNS", "promo,trailer"),
                ("SKETCH_CATALOG__ENRICH__API_KEY", "from-env"),
            ],
            vec![("filter.output", "cli_out.json".into())],
        )
        .unwrap();

        assert_eq!(settings.filter.input, PathBuf::from("env.json"));
        assert_eq!(settings.filter.output, PathBuf::from("cli_out.json"));
        assert_eq!(
            settings.filter.patterns,
            Some(vec!["promo".to_owned(), "trailer".to_owned()])
        );
        assert_eq!(settings.enrich_config().unwrap().api_key, "from-env");
    }

    #[test]
    fn blank_api_key_is_rejected() {
        let settings = load(None, &[], vec![("enrich.api_key", "  ".into())]).unwrap();

        assert!(settings.enrich_config().is_err());
    }

    #[test]
    fn explicit_config_file_must_exist() {
        let dir = tempfile::tempdir().unwrap();

        assert!(load(Some(dir.path().join("missing.toml").as_path()), &[], vec![]).is_err());
    }
}
