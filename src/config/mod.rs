use std::{
    collections::HashMap,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use indexmap::IndexMap; // IndexMap preserves insertion order, so sources start in file order
use serde::{Deserialize, Serialize};
use snafu::{OptionExt, ResultExt, Snafu};

use crate::{SourceSender, shutdown::ShutdownSignal, sources};

pub mod format;
mod vars;

pub use format::Format;

/// Produces an example configuration for a component.
pub trait GenerateConfig {
    fn generate_config() -> toml::Value;
}

#[macro_export]
macro_rules! impl_generate_config_from_default {
    ($type:ty) => {
        impl $crate::config::GenerateConfig for $type {
            fn generate_config() -> toml::Value {
                toml::Value::try_from(&Self::default()).unwrap()
            }
        }
    };
}

#[async_trait]
#[typetag::serde(tag = "type")]
pub trait SourceConfig: core::fmt::Debug + Send + Sync {
    async fn build(&self, cx: SourceContext) -> crate::Result<sources::Source>;

    fn source_type(&self) -> &'static str;
}

pub struct SourceContext {
    pub key: String,
    pub shutdown: ShutdownSignal,
    pub out: SourceSender,
}

impl SourceContext {
    pub fn new(key: impl Into<String>, shutdown: ShutdownSignal, out: SourceSender) -> Self {
        Self {
            key: key.into(),
            shutdown,
            out,
        }
    }

    #[cfg(test)]
    pub fn new_test(out: SourceSender) -> Self {
        Self::new("default", ShutdownSignal::noop(), out)
    }
}

#[derive(Debug, Snafu)]
pub enum LoadError {
    #[snafu(display("Could not read config file {:?}: {}", path, source))]
    ReadFile {
        path: PathBuf,
        source: std::io::Error,
    },
    #[snafu(display("Could not infer the config format of {:?}, expected .toml, .yaml or .json", path))]
    UnknownFormat { path: PathBuf },
    #[snafu(display("Config interpolation failed: {}", errors.join("; ")))]
    Interpolate { errors: Vec<String> },
    #[snafu(display("Could not parse config: {}", message))]
    Parse { message: String },
}

/// The root configuration: a set of named sources, kept in the order they were declared.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub sources: IndexMap<String, Box<dyn SourceConfig>>,
}

impl Config {
    /// Reads and parses the file at `path`, picking the format from its extension.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let format = Format::from_path(path).context(UnknownFormatSnafu { path })?;
        let content = std::fs::read_to_string(path).context(ReadFileSnafu { path })?;

        Self::load_from_str(&content, format)
    }

    /// Parses `content`, interpolating environment variables first.
    pub fn load_from_str(content: &str, format: Format) -> Result<Self, LoadError> {
        let vars: HashMap<String, String> = std::env::vars().collect();
        Self::load_with_vars(content, format, &vars)
    }

    fn load_with_vars(
        content: &str,
        format: Format,
        vars: &HashMap<String, String>,
    ) -> Result<Self, LoadError> {
        let (interpolated, warnings) =
            vars::interpolate(content, vars).map_err(|errors| LoadError::Interpolate { errors })?;
        for warning in warnings {
            warn!("{}", warning);
        }

        format
            .deserialize(&interpolated)
            .map_err(|message| LoadError::Parse { message })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TOML_CONFIG: &str = r#"
        [sources.rds]
        type = "aws_cloudwatch_metrics"
        region = "us-east-1"
        period = "5m"

        [[sources.rds.metrics]]
        namespace = "AWS/RDS"
        name = "CPUUtilization"
        statistics = ["Average"]

        [sources.elb]
        type = "aws_cloudwatch_metrics"
        region = "${ELB_REGION}"
    "#;

    fn vars() -> HashMap<String, String> {
        [("ELB_REGION".to_string(), "eu-west-1".to_string())]
            .into_iter()
            .collect()
    }

    #[test]
    fn loads_sources_in_declaration_order() {
        let config = Config::load_with_vars(TOML_CONFIG, Format::Toml, &vars()).unwrap();

        let keys: Vec<_> = config.sources.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["rds", "elb"]);
        assert!(
            config
                .sources
                .values()
                .all(|source| source.source_type() == "aws_cloudwatch_metrics")
        );
    }

    #[test]
    fn formats_agree() {
        let yaml = r#"
sources:
  rds:
    type: aws_cloudwatch_metrics
    region: us-east-1
    metrics:
      - namespace: AWS/RDS
        name: CPUUtilization
        statistics: [Average]
"#;
        let json = r#"{"sources": {"rds": {"type": "aws_cloudwatch_metrics", "region": "us-east-1",
            "metrics": [{"namespace": "AWS/RDS", "name": "CPUUtilization", "statistics": ["Average"]}]}}}"#;

        let from_yaml = Config::load_with_vars(yaml, Format::Yaml, &vars()).unwrap();
        let from_json = Config::load_with_vars(json, Format::Json, &vars()).unwrap();

        assert_eq!(
            format!("{:?}", from_yaml.sources["rds"]),
            format!("{:?}", from_json.sources["rds"])
        );
    }

    #[test]
    fn empty_config_has_no_sources() {
        let config = Config::load_with_vars("", Format::Toml, &vars()).unwrap();
        assert!(config.sources.is_empty());
    }

    #[test]
    fn unknown_source_type_is_rejected() {
        let error = Config::load_with_vars(
            r#"
            [sources.in]
            type = "stdin"
            "#,
            Format::Toml,
            &vars(),
        )
        .unwrap_err();

        assert!(matches!(error, LoadError::Parse { .. }));
    }

    #[test]
    fn missing_required_variable_is_rejected() {
        let error = Config::load_with_vars(
            r#"
            [sources.in]
            type = "aws_cloudwatch_metrics"
            region = "${REGION:?region must be set}"
            "#,
            Format::Toml,
            &vars(),
        )
        .unwrap_err();

        assert!(matches!(error, LoadError::Interpolate { .. }));
    }

    #[test]
    fn unknown_extension_is_rejected() {
        assert!(matches!(
            Config::load("/etc/cloudwatch.ini"),
            Err(LoadError::UnknownFormat { .. })
        ));
    }
}
