use std::path::PathBuf;
use std::time::Duration;

use derive_setters::Setters;
use ratatui::crossterm::event::KeyEvent;
use thiserror::Error;

use crate::record::{Order, Product, User};
use crate::repo::{OrderStats, ProductStats, Session, UserStats};

/// Storage keys in the persistent state file.
pub const KEY_AUTH_SESSION: &str = "auth_session";
pub const KEY_THEME_MODE: &str = "theme_mode";

pub const DEFAULT_PAGE_SIZE: usize = 10;
pub const DEFAULT_LATENCY_MS: u64 = 500;
pub const DASHBOARD_PAGE_SIZE: usize = 5;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{what} not found")]
    NotFound { what: &'static str },
    #[error("{entity} with this {field} already exists")]
    DuplicateKey {
        entity: &'static str,
        field: &'static str,
    },
    #[error("{field}: {reason}")]
    Validation {
        field: &'static str,
        reason: String,
    },
    #[error("invalid email or password")]
    Unauthorized,
}

impl AppError {
    pub fn validation(field: &'static str, reason: impl Into<String>) -> Self {
        AppError::Validation {
            field,
            reason: reason.into(),
        }
    }
}

#[derive(Debug, Clone, Setters)]
#[setters(prefix = "with_")]
pub struct AppConfig {
    /// How long the controller waits for a key event per tick.
    pub event_poll_ms: u64,
    /// Rows per table page on the list screens.
    pub page_size: usize,
    /// Simulated latency added to every repository call.
    pub latency: Duration,
    /// Path of the JSON key-value state file.
    pub state_file: PathBuf,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            event_poll_ms: 100,
            page_size: DEFAULT_PAGE_SIZE,
            latency: Duration::from_millis(DEFAULT_LATENCY_MS),
            state_file: PathBuf::from("state.json"),
        }
    }
}

/// Where the sidebar can take you.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Nav {
    Dashboard,
    Users,
    Products,
    Orders,
    Settings,
}

/// Results of a repository call, delivered asynchronously by the dispatcher.
/// The u64 on `Message::Fetched` is the generation the request was issued
/// under; stale completions are discarded by the model.
#[derive(Debug)]
pub enum FetchPayload {
    Users(Vec<User>),
    Products(Vec<Product>),
    Orders(Vec<Order>),
    Dashboard {
        users: UserStats,
        orders: OrderStats,
        products: ProductStats,
        recent: Vec<Order>,
    },
    Login(Result<Session, AppError>),
    EditUser(Result<User, AppError>),
    EditProduct(Result<Product, AppError>),
    ProfileSaved(Result<crate::repo::Profile, AppError>),
    Mutated(Result<String, AppError>),
}

#[derive(Debug)]
pub enum Message {
    Quit,
    Help,
    CloseOverlay,
    ToggleTheme,
    Goto(Nav),
    Logout,

    // Table navigation on the list screens.
    MoveUp,
    MoveDown,
    PrevPage,
    NextPage,
    FirstPage,
    LastPage,
    HeaderLeft,
    HeaderRight,
    ToggleSort,

    // List actions.
    EditSearch,
    CycleStatusFilter,
    CycleRowStatus,
    Add,
    Edit,
    Delete,
    Confirm,
    YankRow,
    Refresh,

    RawKey(KeyEvent),
    Resize(u16, u16),
    Fetched(u64, FetchPayload),
}

pub const HELP_TEXT: &str = "\
 opsdash keys

 Global
   1-5        dashboard / users / products / orders / settings
   t          toggle light/dark theme
   ?          this help
   q          quit

 Lists
   j/k  Up/Down     move selection
   h/l  Left/Right  previous / next page
   g / G           first / last page
   [ / ]           pick sort column
   s               sort by picked column (again: flip direction)
   /               search (Esc clears, Enter keeps)
   f               cycle status filter (orders)
   c               cycle status of selected order
   a / e / d       add / edit / delete
   y               copy selected row as CSV
   r               reload from the service

 Forms
   Tab / Shift-Tab  next / previous field
   Left/Right       cycle choice fields
   Enter            save        Esc  cancel

 Press Esc to close.";

/// Formats an amount the way the dashboard shows money.
pub fn format_currency(amount: f64) -> String {
    let cents = (amount * 100.0).round() as i64;
    let (whole, frac) = (cents / 100, (cents % 100).abs());
    let mut grouped = String::new();
    for (i, c) in whole.abs().to_string().chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(c);
    }
    let grouped: String = grouped.chars().rev().collect();
    let sign = if whole < 0 { "-" } else { "" };
    format!("{sign}${grouped}.{frac:02}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn currency_formatting() {
        assert_eq!(format_currency(159.98), "$159.98");
        assert_eq!(format_currency(0.0), "$0.00");
        assert_eq!(format_currency(12543.5), "$12,543.50");
        assert_eq!(format_currency(1000000.0), "$1,000,000.00");
    }

    #[test]
    fn config_setters() {
        let cfg = AppConfig::default()
            .with_page_size(5)
            .with_latency(Duration::ZERO);
        assert_eq!(cfg.page_size, 5);
        assert_eq!(cfg.latency, Duration::ZERO);
        assert_eq!(cfg.event_poll_ms, 100);
    }
}
