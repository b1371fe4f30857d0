use anyhow::{Context, Result};
use clap::Parser;
use serde::Deserialize;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

const DEFAULT_HTTP_BIND: &str = "127.0.0.1:8080";
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;
const DEFAULT_SHUTDOWN_TIMEOUT_SECS: u64 = 20;

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub http_bind_address: SocketAddr,
    /// Base URL of the remote product service.
    pub product_base_url: String,
    /// Base URL of the remote coupon service.
    pub coupon_base_url: String,
    /// Bearer token forwarded on outbound calls to the backing services.
    pub backend_bearer_token: Option<String>,
    pub request_timeout_secs: u64,
    pub graceful_shutdown_timeout_secs: u64,
}

impl ServerConfig {
    pub fn from_args(args: CliArgs) -> Result<Self> {
        let CliArgs {
            config,
            http_bind: cli_http_bind,
            product_url: cli_product_url,
            coupon_url: cli_coupon_url,
            backend_token: cli_backend_token,
            request_timeout_secs: cli_request_timeout,
            shutdown_timeout_secs: cli_shutdown_timeout,
        } = args;

        let file_config = if let Some(path) = config.as_ref() {
            load_config_file(path)?
        } else {
            PartialConfig::default()
        };

        let PartialConfig {
            http_bind: file_http_bind,
            product_url: file_product_url,
            coupon_url: file_coupon_url,
            backend_token: file_backend_token,
            request_timeout_secs: file_request_timeout,
            shutdown_timeout_secs: file_shutdown_timeout,
        } = file_config;

        let http_bind_address = cli_http_bind.or(file_http_bind).unwrap_or_else(|| {
            DEFAULT_HTTP_BIND
                .parse()
                .expect("default bind address valid")
        });

        let product_base_url = cli_product_url
            .or(file_product_url)
            .context("product service base URL must be provided (--product-url)")?;
        let coupon_base_url = cli_coupon_url
            .or(file_coupon_url)
            .context("coupon service base URL must be provided (--coupon-url)")?;

        let backend_bearer_token = cli_backend_token
            .or(file_backend_token)
            .filter(|token| !token.is_empty());

        let request_timeout_secs = cli_request_timeout
            .or(file_request_timeout)
            .unwrap_or(DEFAULT_REQUEST_TIMEOUT_SECS)
            .max(1);

        let graceful_shutdown_timeout_secs = cli_shutdown_timeout
            .or(file_shutdown_timeout)
            .unwrap_or(DEFAULT_SHUTDOWN_TIMEOUT_SECS)
            .max(1);

        Ok(Self {
            http_bind_address,
            product_base_url: normalize_base_url(product_base_url),
            coupon_base_url: normalize_base_url(coupon_base_url),
            backend_bearer_token,
            request_timeout_secs,
            graceful_shutdown_timeout_secs,
        })
    }

    /// Fail-fast validation run before server startup.
    pub fn validate(&self) -> Result<()> {
        ensure_base_url("product service", &self.product_base_url)?;
        ensure_base_url("coupon service", &self.coupon_base_url)?;
        Ok(())
    }
}

fn normalize_base_url(url: String) -> String {
    url.trim().trim_end_matches('/').to_string()
}

fn ensure_base_url(name: &str, url: &str) -> Result<()> {
    anyhow::ensure!(!url.is_empty(), "{name} base URL is empty");
    let parsed =
        reqwest::Url::parse(url).with_context(|| format!("{name} base URL {url:?} is invalid"))?;
    anyhow::ensure!(
        matches!(parsed.scheme(), "http" | "https"),
        "{name} base URL {url:?} must be http or https"
    );
    Ok(())
}

#[derive(Parser, Debug, Default, Clone)]
#[command(name = "cart-api", about = "Shopping-cart API server", version)]
pub struct CliArgs {
    #[arg(
        long,
        value_name = "FILE",
        help = "Path to a configuration file (YAML or JSON)",
        global = true
    )]
    pub config: Option<PathBuf>,

    #[arg(
        long,
        env = "CART_API_HTTP_BIND",
        value_name = "ADDR",
        help = "HTTP bind address"
    )]
    pub http_bind: Option<SocketAddr>,

    #[arg(
        long,
        env = "CART_API_PRODUCT_URL",
        value_name = "URL",
        help = "Base URL of the product service"
    )]
    pub product_url: Option<String>,

    #[arg(
        long,
        env = "CART_API_COUPON_URL",
        value_name = "URL",
        help = "Base URL of the coupon service"
    )]
    pub coupon_url: Option<String>,

    #[arg(
        long,
        env = "CART_API_BACKEND_TOKEN",
        value_name = "TOKEN",
        help = "Bearer token forwarded to the backing services"
    )]
    pub backend_token: Option<String>,

    #[arg(
        long,
        env = "CART_API_REQUEST_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Outbound request timeout in seconds"
    )]
    pub request_timeout_secs: Option<u64>,

    #[arg(
        long,
        env = "CART_API_SHUTDOWN_TIMEOUT_SECS",
        value_name = "SECS",
        help = "Graceful shutdown timeout in seconds"
    )]
    pub shutdown_timeout_secs: Option<u64>,
}

#[derive(Debug, Default, Deserialize)]
struct PartialConfig {
    http_bind: Option<SocketAddr>,
    product_url: Option<String>,
    coupon_url: Option<String>,
    backend_token: Option<String>,
    request_timeout_secs: Option<u64>,
    shutdown_timeout_secs: Option<u64>,
}

fn load_config_file(path: &Path) -> Result<PartialConfig> {
    if !path.exists() {
        anyhow::bail!("config file {:?} does not exist", path);
    }
    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {:?}", path))?;
    let ext = path
        .extension()
        .and_then(|os| os.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    let parsed = match ext.as_str() {
        "yaml" | "yml" => serde_yaml::from_str(&contents)
            .with_context(|| format!("failed to parse YAML config {:?}", path))?,
        "json" => serde_json::from_str(&contents)
            .with_context(|| format!("failed to parse JSON config {:?}", path))?,
        other => anyhow::bail!("unsupported config extension: {other}"),
    };
    Ok(parsed)
}
