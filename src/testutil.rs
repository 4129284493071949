//! Fixtures shared by the unit tests.

use reqwest::StatusCode;
use serde_json::Map;
use std::sync::{Arc, Mutex};

use crate::cart::CartEntry;
use crate::catalog::{CatalogSource, Product, ProductId};
use crate::error::FetchError;

pub fn product(id: &str, name: &str, price: f64) -> Product {
  Product {
    id: ProductId::new(id),
    name: name.to_string(),
    description: String::new(),
    price,
    image_url: String::new(),
    extra: Map::new(),
  }
}

pub fn entry(id: &str, quantity: u32) -> CartEntry {
  CartEntry {
    quantity,
    ..CartEntry::from_product(&product(id, id, 1.0))
  }
}

/// Catalog source answering with a fixed product list, or with an error
/// status once told to fail.
#[derive(Clone)]
pub struct FakeSource {
  products: Vec<Product>,
  failure: Arc<Mutex<Option<StatusCode>>>,
}

impl FakeSource {
  pub fn serving(products: Vec<Product>) -> Self {
    Self {
      products,
      failure: Arc::new(Mutex::new(None)),
    }
  }

  pub fn failing() -> Self {
    let source = Self::serving(Vec::new());
    source.fail_with(StatusCode::SERVICE_UNAVAILABLE);
    source
  }

  pub fn fail_with(&self, status: StatusCode) {
    *self.failure.lock().unwrap() = Some(status);
  }
}

impl CatalogSource for FakeSource {
  async fn fetch_products(&self) -> Result<Vec<Product>, FetchError> {
    let failure = *self.failure.lock().unwrap();
    match failure {
      Some(status) => Err(FetchError::Status(status)),
      None => Ok(self.products.clone()),
    }
  }
}
