//! `relay validate`: check proxy settings without starting.
//!
//! Resolves the same flags and environment variables as `relay run` and
//! reports the result in either human-readable text or machine-readable
//! JSON format.

use crate::cli::{ValidateArgs, ValidateFormat};
use crate::config::ProxyConfig;
use crate::error::RelayError;

pub fn execute(args: &ValidateArgs) -> Result<(), RelayError> {
    let config = match ProxyConfig::resolve(&args.proxy) {
        Ok(config) => config,
        Err(RelayError::ConfigValidation { errors }) => {
            match args.format {
                ValidateFormat::Text => {
                    eprintln!("\u{2717} settings have {} errors\n", errors.len());
                    for error in &errors {
                        eprintln!("{error}");
                    }
                }
                ValidateFormat::Json => {
                    let json_errors: Vec<serde_json::Value> = errors
                        .iter()
                        .map(|e| {
                            serde_json::json!({
                                "field": e.field,
                                "message": e.message,
                                "suggestion": e.suggestion,
                            })
                        })
                        .collect();
                    println!(
                        "{}",
                        serde_json::json!({
                            "valid": false,
                            "errors": json_errors,
                        })
                    );
                }
            }
            return Err(RelayError::ConfigValidation { errors });
        }
        Err(e) => return Err(e),
    };

    match args.format {
        ValidateFormat::Text => println!("\u{2713} {}", format_report(&config)),
        ValidateFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "valid": true,
                    "upstream": config.summary(),
                })
            );
        }
    }

    Ok(())
}

#[must_use]
pub fn format_report(config: &ProxyConfig) -> String {
    let timeout = config
        .timeout
        .map_or_else(|| "none".to_string(), |d| format!("{}ms", d.as_millis()));
    let mut report = format!(
        "settings are valid\n  forwarding:  {}/* -> {}/*\n  timeout:     {timeout}",
        config.prefix, config.upstream
    );
    if config.fallback {
        report.push_str("\n  note:        TARGET_SERVER_URL not set, using the local default");
    }
    report
}
