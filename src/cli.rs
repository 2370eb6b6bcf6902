use std::path::PathBuf;

use clap::{ArgAction, Args, CommandFactory, FromArgMatches, Parser, Subcommand, ValueEnum};

use crate::{
    config::{GenerateConfig, LoadError},
    get_version,
    sources::aws_cloudwatch_metrics::{AwsCloudwatchMetricsConfig, DESCRIPTION},
};

#[derive(Parser, Debug)]
#[command(rename_all = "kebab-case", about = DESCRIPTION)]
pub struct Opts {
    #[command(flatten)]
    pub root: RootOpts,

    #[command(subcommand)]
    pub sub_command: Option<SubCommand>,
}

impl Opts {
    pub fn get_matches() -> Result<Self, clap::Error> {
        let version = get_version();
        let command = Self::command().version(version);
        Self::from_arg_matches(&command.try_get_matches()?)
    }

    pub const fn log_level(&self) -> &'static str {
        // `generate` prints to stdout, keep it one level quieter.
        let (quiet_level, verbose_level) = match self.sub_command {
            Some(SubCommand::Generate(_)) => {
                if self.root.verbose == 0 {
                    (self.root.quiet + 1, self.root.verbose)
                } else {
                    (self.root.quiet, self.root.verbose - 1)
                }
            }
            None => (self.root.quiet, self.root.verbose),
        };
        match quiet_level {
            0 => match verbose_level {
                0 => "info",
                1 => "debug",
                2..=255 => "trace",
            },
            1 => "warn",
            2 => "error",
            3..=255 => "off",
        }
    }
}

#[derive(Args, Debug)]
#[command(rename_all = "kebab-case")]
pub struct RootOpts {
    /// Read configuration from the given file.
    /// File format is detected from the extension: .toml, .yaml, .yml or .json.
    #[arg(
        id = "config",
        short,
        long,
        env = "CLOUDWATCH_METRICS_CONFIG",
        default_value = "/etc/cloudwatch-metrics/cloudwatch-metrics.toml"
    )]
    pub config_path: PathBuf,

    /// Enable more detailed internal logging. Repeat to increase level. Overridden by `--quiet`.
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    /// Reduce detail of internal logging. Repeat to reduce further. Overrides `--verbose`.
    #[arg(short, long, action = ArgAction::Count)]
    pub quiet: u8,

    /// Set the logging format
    #[arg(long, default_value = "text", env = "CLOUDWATCH_METRICS_LOG_FORMAT")]
    pub log_format: LogFormat,

    /// Control when ANSI terminal formatting is used.
    ///
    /// By default the terminal is detected from stdout. `--color always` forces ANSI
    /// formatting on, `--color never` turns it off.
    #[arg(long, default_value = "auto", env = "CLOUDWATCH_METRICS_COLOR")]
    pub color: Color,
}

#[derive(Subcommand, Debug)]
#[command(rename_all = "kebab-case")]
pub enum SubCommand {
    /// Print an example configuration, then exit.
    Generate(GenerateOpts),
}

#[derive(Args, Debug)]
#[command(rename_all = "kebab-case")]
pub struct GenerateOpts {
    /// Name of the source in the generated configuration.
    #[arg(long, default_value = "cloudwatch")]
    pub name: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum Color {
    Auto,
    Always,
    Never,
}

impl Color {
    pub fn use_color(self) -> bool {
        match self {
            Color::Auto => std::io::IsTerminal::is_terminal(&std::io::stdout()),
            Color::Always => true,
            Color::Never => false,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum LogFormat {
    Text,
    Json,
}

/// Renders the example configuration as a `[sources.<name>]` TOML document.
pub fn generate(opts: &GenerateOpts) -> Result<String, toml::ser::Error> {
    let mut source = toml::Table::new();
    source.insert(
        "type".to_owned(),
        toml::Value::String("aws_cloudwatch_metrics".to_owned()),
    );
    if let toml::Value::Table(fields) = AwsCloudwatchMetricsConfig::generate_config() {
        for (key, value) in fields {
            source.insert(key, value);
        }
    }

    let mut sources = toml::Table::new();
    sources.insert(opts.name.clone(), toml::Value::Table(source));
    let mut root = toml::Table::new();
    root.insert("sources".to_owned(), toml::Value::Table(sources));

    toml::to_string(&root)
}

pub fn handle_config_errors(error: LoadError) -> exitcode::ExitCode {
    error!(message = "Configuration error.", %error);

    exitcode::CONFIG
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Config, Format};

    fn parse(args: &[&str]) -> Opts {
        Opts::try_parse_from(std::iter::once("cloudwatch-metrics").chain(args.iter().copied()))
            .unwrap()
    }

    #[test]
    fn log_levels() {
        assert_eq!(parse(&[]).log_level(), "info");
        assert_eq!(parse(&["-v"]).log_level(), "debug");
        assert_eq!(parse(&["-vv"]).log_level(), "trace");
        assert_eq!(parse(&["-q"]).log_level(), "warn");
        assert_eq!(parse(&["-vq"]).log_level(), "warn");
        assert_eq!(parse(&["generate"]).log_level(), "warn");
        assert_eq!(parse(&["-v", "generate"]).log_level(), "info");
    }

    #[test]
    fn log_format_and_config() {
        let opts = parse(&["--log-format", "json", "--config", "/tmp/cw.yaml"]);

        assert_eq!(opts.root.log_format, LogFormat::Json);
        assert_eq!(opts.root.config_path, PathBuf::from("/tmp/cw.yaml"));
    }

    #[test]
    fn generated_config_loads() {
        let generated = generate(&GenerateOpts {
            name: "elb".to_owned(),
        })
        .unwrap();

        let config = Config::load_from_str(&generated, Format::Toml).unwrap();

        assert_eq!(config.sources.len(), 1);
        assert_eq!(
            config.sources["elb"].source_type(),
            "aws_cloudwatch_metrics"
        );
    }
}
