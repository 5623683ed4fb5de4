//! Command-line interface for the catalog client
//!
//! Parses connection flags (with environment fallbacks) and one subcommand per
//! backend query, then runs the query and renders the result as JSON.

use clap::{Parser, Subcommand};
use serde_json::Value;

use crate::config::{
    parse_base_url, parse_header_name, BackendConfig, ConfigError, DEFAULT_SHARED_SECRET_HEADER,
};
use crate::data::{BackendClient, BackendError};

/// Query the product and pricing backend
#[derive(Parser, Debug)]
#[command(name = "catalog")]
#[command(about = "Query product and pricing data from the catalog backend")]
#[command(version)]
pub struct Cli {
    /// Base URL of the backend, e.g. https://backend.internal/
    #[arg(long, env = "CATALOG_BACKEND_URL", value_name = "URL")]
    pub backend_url: String,

    /// Shared secret for elevated deal validation lookups
    #[arg(long, env = "CATALOG_SHARED_SECRET", hide_env_values = true)]
    pub shared_secret: Option<String>,

    /// Header name that carries the shared secret
    #[arg(long, env = "CATALOG_SHARED_SECRET_HEADER", default_value = DEFAULT_SHARED_SECRET_HEADER)]
    pub shared_secret_header: String,

    /// API key for service-to-service lookups
    #[arg(long, env = "CATALOG_SERVICE_API_KEY", hide_env_values = true)]
    pub service_api_key: Option<String>,

    /// Authorization token forwarded on user-level lookups
    #[arg(long, env = "CATALOG_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

/// Backend queries available from the command line
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Best price guarantee terms for a product
    BestPrice { product_id: u64 },

    /// Deal validation info for a product
    DealValidation {
        product_id: u64,
        /// Look up on behalf of this user with the shared secret
        #[arg(long)]
        user_email: Option<String>,
    },

    /// A product and its cheapest competitor, by SKU
    ProductBySku { sku: String },

    /// A product and its cheapest competitor, by ID
    ProductById { product_id: u64 },

    /// Subcategories for a batch of SKUs
    Subcategories { skus: Vec<String> },
}

impl Cli {
    /// Builds the backend settings from the parsed flags
    ///
    /// # Returns
    /// * `Ok(BackendConfig)` with default cache bounds
    /// * `Err(ConfigError)` if the URL or header name is invalid, or the
    ///   subcommand needs a credential that was not given
    pub fn config(&self) -> Result<BackendConfig, ConfigError> {
        let base_url = parse_base_url(&self.backend_url)?;
        let header = parse_header_name(&self.shared_secret_header)?;

        let needs_secret = matches!(
            &self.command,
            Command::DealValidation { user_email: Some(email), .. } if !email.is_empty()
        );
        let needs_api_key = matches!(self.command, Command::Subcategories { .. });

        let shared_secret = credential(&self.shared_secret, needs_secret, "shared secret")?;
        let service_api_key = credential(&self.service_api_key, needs_api_key, "service API key")?;

        Ok(BackendConfig::new(base_url, shared_secret, service_api_key)
            .with_shared_secret_header(header))
    }
}

/// Picks a credential, failing only when the query will send it
fn credential(
    value: &Option<String>,
    required: bool,
    name: &'static str,
) -> Result<String, ConfigError> {
    match value.as_deref().filter(|value| !value.is_empty()) {
        Some(value) => Ok(value.to_string()),
        None if required => Err(ConfigError::MissingCredential(name)),
        None => Ok(String::new()),
    }
}

/// Runs a single query and returns its result as JSON
///
/// An absent result is rendered as `null`.
pub async fn execute(
    client: &BackendClient,
    command: &Command,
    token: Option<&str>,
) -> Result<Value, BackendError> {
    let value = match command {
        Command::BestPrice { product_id } => {
            serde_json::to_value(client.fetch_best_price_guarantee_info(*product_id, token).await?)?
        }
        Command::DealValidation {
            product_id,
            user_email,
        } => serde_json::to_value(
            client
                .fetch_deal_validation_info(*product_id, user_email.as_deref(), token)
                .await?,
        )?,
        Command::ProductBySku { sku } => {
            serde_json::to_value(client.fetch_product_by_sku(sku, token).await?)?
        }
        Command::ProductById { product_id } => {
            serde_json::to_value(client.fetch_product_by_id(*product_id, token).await?)?
        }
        Command::Subcategories { skus } => {
            serde_json::to_value(client.fetch_subcategories_for_skus(skus).await?)?
        }
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use secrecy::ExposeSecret;

    const URL: &str = "http://backend.local/";

    #[test]
    fn test_cli_parse_best_price() {
        let cli = Cli::parse_from(["catalog", "--backend-url", URL, "best-price", "42"]);

        assert_eq!(cli.backend_url, URL);
        assert_eq!(cli.command, Command::BestPrice { product_id: 42 });
    }

    #[test]
    fn test_cli_parse_deal_validation_with_email() {
        let cli = Cli::parse_from([
            "catalog",
            "--backend-url",
            URL,
            "deal-validation",
            "7",
            "--user-email",
            "buyer@example.com",
        ]);

        assert_eq!(
            cli.command,
            Command::DealValidation {
                product_id: 7,
                user_email: Some("buyer@example.com".to_string()),
            }
        );
    }

    #[test]
    fn test_cli_parse_deal_validation_without_email() {
        let cli = Cli::parse_from(["catalog", "--backend-url", URL, "deal-validation", "7"]);

        assert_eq!(
            cli.command,
            Command::DealValidation {
                product_id: 7,
                user_email: None,
            }
        );
    }

    #[test]
    fn test_cli_parse_subcategories_accepts_no_skus() {
        let cli = Cli::parse_from(["catalog", "--backend-url", URL, "subcategories"]);

        assert_eq!(cli.command, Command::Subcategories { skus: vec![] });
    }

    #[test]
    fn test_cli_parse_subcategories_many_skus() {
        let cli = Cli::parse_from(["catalog", "--backend-url", URL, "subcategories", "A1", "B2"]);

        assert_eq!(
            cli.command,
            Command::Subcategories {
                skus: vec!["A1".to_string(), "B2".to_string()],
            }
        );
    }

    #[test]
    fn test_cli_rejects_non_numeric_product_id() {
        let result = Cli::try_parse_from(["catalog", "--backend-url", URL, "product-by-id", "abc"]);

        assert!(result.is_err());
    }

    #[test]
    fn test_cli_config_from_flags() {
        let cli = Cli::parse_from([
            "catalog",
            "--backend-url",
            URL,
            "--shared-secret",
            "s3cret",
            "--shared-secret-header",
            "secret_key",
            "--service-api-key",
            "svc-key",
            "product-by-sku",
            "ABC123",
        ]);

        let config = cli.config().expect("Config should build");

        assert_eq!(config.base_url.as_str(), URL);
        assert_eq!(config.shared_secret_header.as_str(), "secret_key");
        assert_eq!(config.shared_secret.expose_secret(), "s3cret");
        assert_eq!(config.service_api_key.expose_secret(), "svc-key");
    }

    #[test]
    fn test_cli_config_credentials_optional_for_token_queries() {
        let cli = Cli::parse_from(["catalog", "--backend-url", URL, "deal-validation", "7"]);

        assert!(cli.config().is_ok());
    }

    #[test]
    fn test_cli_config_email_lookup_requires_shared_secret() {
        let cli = Cli::parse_from([
            "catalog",
            "--backend-url",
            URL,
            "deal-validation",
            "7",
            "--user-email",
            "buyer@example.com",
        ]);

        let result = cli.config();

        assert!(matches!(result, Err(ConfigError::MissingCredential("shared secret"))));
    }

    #[test]
    fn test_cli_config_subcategories_requires_api_key() {
        let cli = Cli::parse_from([
            "catalog",
            "--backend-url",
            URL,
            "--service-api-key",
            "",
            "subcategories",
            "A1",
        ]);

        let err = cli.config().unwrap_err();

        assert!(err.to_string().contains("service API key"));
    }

    #[test]
    fn test_cli_config_invalid_url() {
        let cli = Cli::parse_from(["catalog", "--backend-url", "nope", "best-price", "1"]);

        let result = cli.config();

        assert!(matches!(result, Err(ConfigError::InvalidBaseUrl { .. })));
    }
}
