use futures::StreamExt;
use stream_cancel::Tripwire;
use tokio::{
    io::AsyncWriteExt,
    runtime::{self, Runtime},
    sync::mpsc::UnboundedReceiver,
    task::JoinSet,
};

use crate::{
    SourceSender,
    cli::{self, LogFormat, Opts, SubCommand},
    config::{Config, SourceContext},
    event::Record,
    shutdown::ShutdownSignal,
    trace,
};

pub struct Application {
    pub config: Config,
    pub runtime: Runtime,
}

impl Application {
    pub fn prepare() -> Result<Self, exitcode::ExitCode> {
        let opts = match Opts::get_matches() {
            Ok(opts) => opts,
            Err(error) => error.exit(),
        };
        Self::prepare_from_opts(opts)
    }

    pub fn prepare_from_opts(opts: Opts) -> Result<Self, exitcode::ExitCode> {
        let level = std::env::var("CLOUDWATCH_METRICS_LOG").unwrap_or_else(|_| {
            match opts.log_level() {
                "off" => "off".to_owned(),
                level => [
                    format!("cloudwatch_metrics={level}"),
                    format!("aws_config={}", if level == "info" { "warn" } else { level }),
                ]
                .join(","),
            }
        });

        let json = match opts.root.log_format {
            LogFormat::Text => false,
            LogFormat::Json => true,
        };
        trace::init(opts.root.color.use_color(), json, &level);

        if let Some(SubCommand::Generate(generate)) = &opts.sub_command {
            return Err(match cli::generate(generate) {
                Ok(config) => {
                    #[allow(clippy::print_stdout)]
                    {
                        println!("{config}");
                    }
                    exitcode::OK
                }
                Err(error) => {
                    error!(message = "Failed to render example configuration.", %error);
                    exitcode::SOFTWARE
                }
            });
        }

        info!(message = "Log level is enabled.", level = ?level);

        let config = Config::load(&opts.root.config_path).map_err(cli::handle_config_errors)?;

        let runtime = runtime::Builder::new_multi_thread()
            .enable_all()
            .build()
            .map_err(|error| {
                error!(message = "Unable to create async runtime.", %error);
                exitcode::OSERR
            })?;

        Ok(Self { config, runtime })
    }

    pub fn run(self) -> exitcode::ExitCode {
        let Self { config, runtime } = self;
        runtime.block_on(run_sources(config))
    }
}

async fn run_sources(config: Config) -> exitcode::ExitCode {
    let (out, rx) = SourceSender::new();
    let (trigger, tripwire) = Tripwire::new();

    let mut sources = JoinSet::new();
    for (key, source) in config.sources {
        let cx = SourceContext::new(&key, ShutdownSignal::new(tripwire.clone()), out.clone());
        match source.build(cx).await {
            Ok(task) => {
                info!(message = "Source started.", %key, source_type = source.source_type());
                sources.spawn(task);
            }
            Err(error) => {
                error!(message = "Failed to build source.", %key, %error);
                return exitcode::CONFIG;
            }
        }
    }
    drop(out);

    if sources.is_empty() {
        warn!(message = "No sources configured, nothing to do.");
        return exitcode::OK;
    }

    let mut printer = tokio::spawn(print_records(rx));
    let output_closed = tokio::select! {
        result = tokio::signal::ctrl_c() => {
            match result {
                Ok(()) => info!(message = "Signal received, shutting down."),
                Err(error) => error!(message = "Unable to listen for shutdown signal.", %error),
            }
            false
        }
        _ = &mut printer => {
            warn!(message = "Output closed, shutting down.");
            true
        }
    };
    trigger.cancel();

    let mut code = exitcode::OK;
    while let Some(result) = sources.join_next().await {
        if !matches!(result, Ok(Ok(()))) {
            code = exitcode::SOFTWARE;
        }
    }
    // Every sender is gone once the sources stop, so the printer drains and finishes.
    if !output_closed {
        let _ = printer.await;
    }

    code
}

/// Writes every record to stdout as one JSON document per line.
async fn print_records(rx: UnboundedReceiver<Record>) {
    let mut records = SourceSender::into_stream(rx);
    let mut stdout = tokio::io::stdout();

    while let Some(record) = records.next().await {
        let mut line = match serde_json::to_vec(&record) {
            Ok(line) => line,
            Err(error) => {
                error!(message = "Failed to encode record.", %error);
                continue;
            }
        };
        line.push(b'\n');

        if let Err(error) = stdout.write_all(&line).await {
            error!(message = "Failed to write to stdout.", %error);
            return;
        }
        let _ = stdout.flush().await;
    }
}
