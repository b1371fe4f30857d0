//! Configuration layering tests: CLI arguments over file values over
//! built-in defaults.

use std::fs;

use cart_api::config::{CliArgs, ServerConfig};
use tempfile::TempDir;

fn args_with_urls() -> CliArgs {
    CliArgs {
        product_url: Some("http://products.internal".to_string()),
        coupon_url: Some("http://coupons.internal".to_string()),
        ..CliArgs::default()
    }
}

#[test]
fn defaults_fill_in_everything_but_the_urls() {
    let config = ServerConfig::from_args(args_with_urls()).unwrap();

    assert_eq!(config.http_bind_address.to_string(), "127.0.0.1:8080");
    assert_eq!(config.request_timeout_secs, 30);
    assert_eq!(config.graceful_shutdown_timeout_secs, 20);
    assert!(config.backend_bearer_token.is_none());
}

#[test]
fn missing_product_url_is_an_error() {
    let args = CliArgs {
        coupon_url: Some("http://coupons.internal".to_string()),
        ..CliArgs::default()
    };
    let err = ServerConfig::from_args(args).unwrap_err();
    assert!(err.to_string().contains("product service"));
}

#[test]
fn missing_coupon_url_is_an_error() {
    let args = CliArgs {
        product_url: Some("http://products.internal".to_string()),
        ..CliArgs::default()
    };
    let err = ServerConfig::from_args(args).unwrap_err();
    assert!(err.to_string().contains("coupon service"));
}

#[test]
fn trailing_slashes_are_stripped_from_base_urls() {
    let args = CliArgs {
        product_url: Some("http://products.internal/".to_string()),
        coupon_url: Some("http://coupons.internal//".to_string()),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).unwrap();
    assert_eq!(config.product_base_url, "http://products.internal");
    assert_eq!(config.coupon_base_url, "http://coupons.internal");
}

#[test]
fn yaml_file_values_are_applied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "http_bind: 0.0.0.0:9000\n\
         product_url: http://file-products\n\
         coupon_url: http://file-coupons\n\
         request_timeout_secs: 7\n",
    )
    .unwrap();

    let args = CliArgs {
        config: Some(path),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).unwrap();

    assert_eq!(config.http_bind_address.to_string(), "0.0.0.0:9000");
    assert_eq!(config.product_base_url, "http://file-products");
    assert_eq!(config.coupon_base_url, "http://file-coupons");
    assert_eq!(config.request_timeout_secs, 7);
    // unset file keys still fall back to the default
    assert_eq!(config.graceful_shutdown_timeout_secs, 20);
}

#[test]
fn json_file_values_are_applied() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");
    fs::write(
        &path,
        r#"{ "product_url": "http://file-products", "coupon_url": "http://file-coupons", "backend_token": "secret" }"#,
    )
    .unwrap();

    let args = CliArgs {
        config: Some(path),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).unwrap();

    assert_eq!(config.product_base_url, "http://file-products");
    assert_eq!(config.backend_bearer_token.as_deref(), Some("secret"));
}

#[test]
fn cli_values_take_precedence_over_the_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.yaml");
    fs::write(
        &path,
        "product_url: http://file-products\n\
         coupon_url: http://file-coupons\n\
         request_timeout_secs: 7\n",
    )
    .unwrap();

    let args = CliArgs {
        config: Some(path),
        product_url: Some("http://cli-products".to_string()),
        request_timeout_secs: Some(3),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).unwrap();

    assert_eq!(config.product_base_url, "http://cli-products");
    assert_eq!(config.coupon_base_url, "http://file-coupons");
    assert_eq!(config.request_timeout_secs, 3);
}

#[test]
fn unsupported_config_extension_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.toml");
    fs::write(&path, "product_url = \"http://x\"\n").unwrap();

    let args = CliArgs {
        config: Some(path),
        ..CliArgs::default()
    };
    let err = ServerConfig::from_args(args).unwrap_err();
    assert!(err.to_string().contains("unsupported config extension"));
}

#[test]
fn missing_config_file_is_rejected() {
    let args = CliArgs {
        config: Some("/nonexistent/cart-api.yaml".into()),
        ..CliArgs::default()
    };
    assert!(ServerConfig::from_args(args).is_err());
}

#[test]
fn empty_backend_token_is_treated_as_absent() {
    let args = CliArgs {
        backend_token: Some(String::new()),
        ..args_with_urls()
    };
    let config = ServerConfig::from_args(args).unwrap();
    assert!(config.backend_bearer_token.is_none());
}

#[test]
fn validate_rejects_non_http_schemes() {
    let args = CliArgs {
        product_url: Some("ftp://products.internal".to_string()),
        coupon_url: Some("http://coupons.internal".to_string()),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).unwrap();
    let err = config.validate().unwrap_err();
    assert!(err.to_string().contains("must be http or https"));
}

#[test]
fn validate_accepts_https() {
    let args = CliArgs {
        product_url: Some("https://products.internal".to_string()),
        coupon_url: Some("https://coupons.internal".to_string()),
        ..CliArgs::default()
    };
    let config = ServerConfig::from_args(args).unwrap();
    config.validate().unwrap();
}
