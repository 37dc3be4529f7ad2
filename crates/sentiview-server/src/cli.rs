use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Default)]
#[command(name = "sentiview-server")]
#[command(author, version, about = "Serve sentiment predictions over HTTP", long_about = None)]
pub struct Cli {
    /// Configuration file path
    #[arg(short, long, default_value = "config.yaml", env = "SENTIVIEW_CONFIG")]
    pub config: String,

    /// Listen address
    #[arg(short = 'l', long)]
    pub listen: Option<String>,

    /// Listen port
    #[arg(short = 'P', long)]
    pub port: Option<u16>,

    /// Tracking server hosting the model registry
    #[arg(long, env = "SENTIVIEW_TRACKING_URI")]
    pub tracking_uri: Option<String>,

    /// Registered model name
    #[arg(long)]
    pub model_name: Option<String>,

    /// Load the model from a local file instead of the registry
    #[arg(long)]
    pub model_file: Option<PathBuf>,

    /// Fitted vectorizer file
    #[arg(long)]
    pub vectorizer: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    pub verbose: bool,
}
