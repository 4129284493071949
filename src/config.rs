use color_eyre::{eyre::eyre, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use url::Url;

use crate::cart::AddPolicy;
use crate::present::Layout;

pub const DEFAULT_CATALOG_URL: &str = "https://fake-coffee-api.vercel.app/api";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
  pub catalog: CatalogConfig,
  pub store: StoreConfig,
  pub cart: CartConfig,
  pub display: DisplayConfig,
  pub log: LogConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
  /// Endpoint returning the product list as a JSON array
  pub url: String,
  /// Request timeout; unset leaves it to the transport
  pub timeout_secs: Option<u64>,
}

impl Default for CatalogConfig {
  fn default() -> Self {
    Self {
      url: DEFAULT_CATALOG_URL.to_string(),
      timeout_secs: None,
    }
  }
}

impl CatalogConfig {
  pub fn url(&self) -> Result<Url> {
    let url = Url::parse(&self.url).map_err(|e| eyre!("Invalid catalog url {}: {}", self.url, e))?;
    match url.scheme() {
      "http" | "https" => Ok(url),
      other => Err(eyre!("Unsupported catalog url scheme: {}", other)),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
  /// Database file (default: $XDG_DATA_HOME/brewcart/store.db)
  pub path: Option<PathBuf>,
}

impl StoreConfig {
  pub fn resolve_path(&self) -> Result<PathBuf> {
    match &self.path {
      Some(path) => Ok(path.clone()),
      None => Ok(data_dir()?.join("store.db")),
    }
  }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct CartConfig {
  /// What adding a product already in the cart does: increment or reset
  pub add_policy: AddPolicy,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
  pub layout: Layout,
  /// Label printed after prices
  pub currency: String,
}

impl Default for DisplayConfig {
  fn default() -> Self {
    Self {
      layout: Layout::default(),
      currency: "dh".to_string(),
    }
  }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LogConfig {
  /// Filter used when RUST_LOG is not set
  pub level: String,
  /// Directory for brewcart.log (default: the data directory)
  pub dir: Option<PathBuf>,
}

impl Default for LogConfig {
  fn default() -> Self {
    Self {
      level: "info".to_string(),
      dir: None,
    }
  }
}

impl LogConfig {
  pub fn resolve_dir(&self) -> Result<PathBuf> {
    match &self.dir {
      Some(dir) => Ok(dir.clone()),
      None => data_dir(),
    }
  }
}

/// Per-user data directory for the store and the log.
fn data_dir() -> Result<PathBuf> {
  let data_dir = dirs::data_dir()
    .or_else(|| dirs::home_dir().map(|p| p.join(".local/share")))
    .ok_or_else(|| eyre!("Could not determine data directory"))?;

  Ok(data_dir.join("brewcart"))
}

impl Config {
  /// Load configuration from file.
  ///
  /// Search order:
  /// 1. Explicit path if provided
  /// 2. ./brewcart.yaml (current directory)
  /// 3. $XDG_CONFIG_HOME/brewcart/config.yaml
  ///
  /// Every setting has a default, so finding no file is fine; an explicit
  /// path that does not exist is not.
  pub fn load(explicit_path: Option<&Path>) -> Result<Self> {
    let path = if let Some(p) = explicit_path {
      if p.exists() {
        Some(p.to_path_buf())
      } else {
        return Err(eyre!("Config file not found: {}", p.display()));
      }
    } else {
      Self::find_config_file()
    };

    match path {
      Some(p) => Self::load_from_path(&p),
      None => Ok(Self::default()),
    }
  }

  fn find_config_file() -> Option<PathBuf> {
    // Check current directory
    let local = PathBuf::from("brewcart.yaml");
    if local.exists() {
      return Some(local);
    }

    // Check XDG config directory
    if let Some(config_dir) = dirs::config_dir() {
      let xdg_path = config_dir.join("brewcart").join("config.yaml");
      if xdg_path.exists() {
        return Some(xdg_path);
      }
    }

    None
  }

  fn load_from_path(path: &Path) -> Result<Self> {
    let contents = std::fs::read_to_string(path)
      .map_err(|e| eyre!("Failed to read config file {}: {}", path.display(), e))?;

    Self::parse(&contents).map_err(|e| eyre!("Failed to parse config file {}: {}", path.display(), e))
  }

  fn parse(contents: &str) -> Result<Self> {
    let config: Config = serde_yaml::from_str(contents)?;
    config.catalog.url()?;
    Ok(config)
  }
}
