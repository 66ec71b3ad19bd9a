use anyhow::Result;
use clap::Parser;
use plant_disease_classifier::{
    config::{Config, DEFAULT_BIND_ADDR, DEFAULT_MODEL_PATH},
    web::serve,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "plant-disease-classifier")]
#[command(about = "Plant disease image classification service")]
struct Args {
    /// Server bind address
    #[arg(long, env = "PLANT_CLASSIFIER_BIND", default_value = DEFAULT_BIND_ADDR)]
    bind: String,

    /// Path to the ONNX checkpoint
    #[arg(long, env = "PLANT_CLASSIFIER_MODEL", default_value = DEFAULT_MODEL_PATH)]
    model: String,

    /// Number of ONNX Runtime intra-op threads
    #[arg(long, env = "PLANT_CLASSIFIER_THREADS")]
    threads: Option<usize>,

    /// Log level
    #[arg(long)]
    log_level: Option<String>,

    /// Enable development mode
    #[arg(long)]
    dev: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let log_level = args
        .log_level
        .clone()
        .unwrap_or_else(|| if args.dev { "debug" } else { "info" }.to_string());

    // 初始化日志系统
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&log_level)),
        )
        .with_target(false)
        .init();

    tracing::info!("Starting plant disease classifier...");
    tracing::info!("Bind address: {}", args.bind);
    tracing::info!("Model path: {}", args.model);
    if args.dev {
        tracing::info!("Development mode enabled");
    }

    let config = Config::new(&args.bind, &args.model, args.threads, args.dev)?;

    serve(config).await?;

    Ok(())
}
