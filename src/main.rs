use colored::Colorize;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use druid_smoke::{
    config::{Config, OutputFormat},
    error::InitError,
    k8s::KubeCluster,
    probe::HttpProbe,
    report::{ConsoleReporter, JsonReporter, Reporter},
    SmokeSuite,
};

#[tokio::main]
async fn main() {
    // Diagnostics go to stderr so stdout carries only the report
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let suite = match init().await {
        Ok(suite) => suite,
        Err(e) => {
            tracing::error!(error = %e, "Initialization failed");
            println!("{}", format!("✗ Failed to initialize: {e}").red());
            std::process::exit(1);
        }
    };

    let mut reporter: Box<dyn Reporter> = match suite.config().output {
        OutputFormat::Text => Box::new(ConsoleReporter::stdout(suite.config().color)),
        OutputFormat::Json => Box::new(JsonReporter::stdout()),
    };

    let log = suite.run(reporter.as_mut()).await;
    std::process::exit(log.summary().exit_code());
}

async fn init() -> Result<SmokeSuite<KubeCluster, HttpProbe>, InitError> {
    let config = Config::load()?;
    if !config.color {
        colored::control::set_override(false);
    }
    tracing::debug!(?config, "Configuration loaded");

    let cluster = KubeCluster::new().await?;
    let probe = HttpProbe::new(config.probe_timeout())?;
    Ok(SmokeSuite::new(cluster, probe, config))
}
