use chrono::{DateTime, Utc};

/// Truncate a string to a maximum number of characters, adding "..." if
/// truncated
pub fn truncate(s: &str, max_len: usize) -> String {
  if s.chars().count() <= max_len {
    s.to_string()
  } else {
    let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
    format!("{}...", kept)
  }
}

/// Price with two decimals and the configured label
pub fn format_price(price: f64, currency: &str) -> String {
  if currency.is_empty() {
    format!("{:.2}", price)
  } else {
    format!("{:.2} {}", price, currency)
  }
}

/// When the cached catalog was written, for the offline banner
pub fn format_cached_at(cached_at: Option<DateTime<Utc>>) -> String {
  match cached_at {
    Some(at) => format!("cached {}", at.format("%Y-%m-%d %H:%M UTC")),
    None => "never cached".to_string(),
  }
}
