use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Number, Value};
use std::fmt;

use crate::store::{Collection, Record};

/// Product identifier.
///
/// The catalog source sends ids as numbers or strings; both are kept as the
/// string form so cart and cache keys agree.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct ProductId(String);

impl ProductId {
  pub fn new(id: impl Into<String>) -> Self {
    Self(id.into())
  }

  pub fn as_str(&self) -> &str {
    &self.0
  }
}

impl fmt::Display for ProductId {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(&self.0)
  }
}

impl<'de> Deserialize<'de> for ProductId {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: Deserializer<'de>,
  {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
      Text(String),
      Number(Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
      RawId::Text(id) => Self(id),
      RawId::Number(id) => Self(id.to_string()),
    })
  }
}

/// A catalog product
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
  pub id: ProductId,
  pub name: String,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub description: String,
  pub price: f64,
  #[serde(default, deserialize_with = "null_as_empty")]
  pub image_url: String,
  /// Fields the source sends beyond the ones above (region, roast level, ...)
  #[serde(flatten)]
  pub extra: Map<String, Value>,
}

/// The source sends `null` for missing text fields.
fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
  D: Deserializer<'de>,
{
  Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

impl Product {
  /// Prices must be finite and non-negative.
  pub fn has_valid_price(&self) -> bool {
    self.price.is_finite() && self.price >= 0.0
  }

  /// Case-insensitive match on name or description. `needle` must already
  /// be lowercase.
  pub fn matches(&self, needle: &str) -> bool {
    self.name.to_lowercase().contains(needle) || self.description.to_lowercase().contains(needle)
  }
}

impl Record for Product {
  const COLLECTION: Collection = Collection::Products;

  fn key(&self) -> &str {
    self.id.as_str()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_numeric_and_string_ids_normalize() {
    let numeric: Product =
      serde_json::from_str(r#"{"id": 7, "name": "Kona", "price": 12}"#).unwrap();
    let text: Product =
      serde_json::from_str(r#"{"id": "7", "name": "Kona", "price": 12}"#).unwrap();

    assert_eq!(numeric.id, ProductId::new("7"));
    assert_eq!(numeric.id, text.id);
  }

  #[test]
  fn test_unknown_fields_survive_a_round_trip() {
    let raw = r#"{
      "id": 1,
      "name": "Signature Blend",
      "description": "A rich, full-bodied coffee",
      "price": 12.99,
      "region": "Central America",
      "flavor_profile": ["Dark Chocolate", "Black Cherry"],
      "image_url": "https://example.com/blend.jpg"
    }"#;

    let product: Product = serde_json::from_str(raw).unwrap();
    assert_eq!(product.extra["region"], "Central America");

    let again: Product = serde_json::from_slice(&serde_json::to_vec(&product).unwrap()).unwrap();
    assert_eq!(again, product);
  }

  #[test]
  fn test_matches_name_or_description() {
    let product: Product = serde_json::from_str(
      r#"{"id": 1, "name": "Golden Sunset", "description": "Notes of caramel", "price": 9}"#,
    )
    .unwrap();

    assert!(product.matches("sunset"));
    assert!(product.matches("caramel"));
    assert!(!product.matches("espresso"));
  }

  #[test]
  fn test_null_text_fields_read_as_empty() {
    let product: Product = serde_json::from_str(
      r#"{"id": 2, "name": "Golden Sunset", "description": null, "price": 10, "image_url": null}"#,
    )
    .unwrap();

    assert_eq!(product.description, "");
    assert_eq!(product.image_url, "");
  }

  #[test]
  fn test_price_validation() {
    let mut product: Product =
      serde_json::from_str(r#"{"id": 1, "name": "Free Sample", "price": 0}"#).unwrap();
    assert!(product.has_valid_price());

    product.price = -1.0;
    assert!(!product.has_valid_price());

    product.price = f64::NAN;
    assert!(!product.has_valid_price());
  }
}
