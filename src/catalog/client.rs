use color_eyre::{eyre::eyre, Result};
use std::future::Future;
use std::time::Duration;
use serde_json::Value;
use tracing::{debug, warn};
use url::Url;

use super::types::Product;
use crate::config::CatalogConfig;
use crate::error::FetchError;

/// Anything that can produce the current product list.
pub trait CatalogSource: Clone + Send + Sync + 'static {
  fn fetch_products(&self) -> impl Future<Output = Result<Vec<Product>, FetchError>> + Send;
}

/// HTTP client for the remote catalog endpoint
#[derive(Clone)]
pub struct CatalogClient {
  http: reqwest::Client,
  url: Url,
}

impl CatalogClient {
  pub fn new(config: &CatalogConfig) -> Result<Self> {
    let url = config.url()?;

    let mut builder = reqwest::Client::builder()
      .user_agent(concat!("brewcart/", env!("CARGO_PKG_VERSION")));
    if let Some(secs) = config.timeout_secs {
      builder = builder.timeout(Duration::from_secs(secs));
    }

    let http = builder
      .build()
      .map_err(|e| eyre!("Failed to create HTTP client: {}", e))?;

    Ok(Self { http, url })
  }
}

impl CatalogSource for CatalogClient {
  /// One unauthenticated GET; the body must be a JSON array of products.
  async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
    debug!(url = %self.url, "fetching catalog");

    let response = self.http.get(self.url.clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
      return Err(FetchError::Status(status));
    }

    let body = response.bytes().await?;
    decode_products(&body)
  }
}

/// Decode a catalog body.
///
/// The body must be a JSON array. Elements that are not valid products, or
/// that carry an unusable price, are dropped with a warning and the rest of
/// the list is kept.
pub fn decode_products(body: &[u8]) -> Result<Vec<Product>, FetchError> {
  let raw: Vec<Value> = serde_json::from_slice(body)?;

  Ok(
    raw
      .into_iter()
      .enumerate()
      .filter_map(|(index, value)| {
        let product = match serde_json::from_value::<Product>(value) {
          Ok(product) => product,
          Err(e) => {
            warn!(index, error = %e, "dropping undecodable product");
            return None;
          }
        };
        if !product.has_valid_price() {
          warn!(id = %product.id, price = product.price, "dropping product with invalid price");
          return None;
        }
        Some(product)
      })
      .collect(),
  )
}
