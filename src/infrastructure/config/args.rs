use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "rentgate",
    version,
    about = "REST gateway for Rentman listings with CDN-backed images",
    long_about = None
)]
pub struct CliArgs {
    /// Configuration file path.
    #[arg(short, long, value_name = "PATH", env = "RENTGATE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Address to listen on.
    #[arg(long, value_name = "ADDR", env = "RENTGATE_LISTEN")]
    pub listen: Option<String>,

    /// Public base URL of this gateway.
    #[arg(long, value_name = "URL", env = "RENTGATE_PUBLIC_URL")]
    pub public_base_url: Option<String>,

    /// Rentman API base URL.
    #[arg(long, value_name = "URL", env = "RENTMAN_BASE_URL")]
    pub rentman_base_url: Option<String>,

    /// Rentman API token.
    #[arg(long, env = "RENTMAN_TOKEN", hide_env_values = true)]
    pub rentman_token: Option<String>,

    /// Cloudinary cloud name.
    #[arg(long, env = "CLOUDINARY_CLOUD_NAME")]
    pub cloudinary_cloud_name: Option<String>,

    /// Cloudinary API key.
    #[arg(long, env = "CLOUDINARY_API_KEY", hide_env_values = true)]
    pub cloudinary_api_key: Option<String>,

    /// Cloudinary API secret.
    #[arg(long, env = "CLOUDINARY_API_SECRET", hide_env_values = true)]
    pub cloudinary_api_secret: Option<String>,

    /// Cloudinary folder for uploaded images.
    #[arg(long, env = "CLOUDINARY_FOLDER")]
    pub cloudinary_folder: Option<String>,

    /// Maximum entries per cache.
    #[arg(long)]
    pub cache_capacity: Option<usize>,

    /// Lifetime of a resolved image URL in seconds.
    #[arg(long)]
    pub image_ttl_secs: Option<u64>,
}
