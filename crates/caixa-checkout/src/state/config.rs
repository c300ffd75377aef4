//! # Configuration State
//!
//! Checkout configuration loaded at startup.
//!
//! ## Configuration Sources (Priority Order)
//! 1. Environment variables (`CAIXA_*`)
//! 2. Config file (`caixa.toml`)
//! 3. Defaults (this file)
//!
//! ## Example File
//! ```toml
//! store_name = "Mercadinho Boa Vista"
//! store_address = ["Rua das Flores, 10", "Centro"]
//! register_name = "Caixa 02"
//! device_id = "PDV02"
//! operator_id = "op-maria"
//! commission_rate_bps = 150
//! promotion_policy = "largest_discount"
//!
//! [shortcuts]
//! F9 = "price_check"
//! ```

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use chrono::{DateTime, FixedOffset, NaiveDateTime, Utc};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::error::{CheckoutError, CheckoutResult};
use crate::shortcuts::ShortcutTable;
use caixa_core::promotion::SelectionPolicy;
use caixa_core::Percentage;

/// Name of the config file inside the platform config directory.
pub const CONFIG_FILE_NAME: &str = "caixa.toml";

/// Name of the database file inside the platform data directory.
pub const DATABASE_FILE_NAME: &str = "caixa.db";

/// Checkout configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "snake_case")]
pub struct ConfigState {
    /// Store name (displayed on receipts)
    pub store_name: String,

    /// Store address lines (for receipts)
    pub store_address: Vec<String>,

    /// Register id printed in receipt numbers
    pub device_id: String,

    /// Register name used when opening a shift
    pub register_name: String,

    /// Operator logged in at this register
    pub operator_id: String,

    /// Seller credited with the sales, if any
    pub seller_id: Option<String>,

    /// Seller commission on the sale total, in basis points (0 = none)
    pub commission_rate_bps: u32,

    /// Which promotion wins when several match a line
    pub promotion_policy: SelectionPolicy,

    /// Store offset from UTC in minutes; promotion windows use store time
    pub utc_offset_minutes: i32,

    /// Max rows returned by product/customer searches
    pub search_limit: u32,

    /// Database file; defaults to the platform data directory
    pub database_path: Option<PathBuf>,

    /// Shortcut overrides: key → action name ("" unbinds)
    pub shortcuts: HashMap<String, String>,
}

impl Default for ConfigState {
    /// Development defaults: one register, Brasília time, no commission.
    fn default() -> Self {
        ConfigState {
            store_name: "Caixa POS".to_string(),
            store_address: Vec::new(),
            device_id: "PDV01".to_string(),
            register_name: "Caixa 01".to_string(),
            operator_id: "operador".to_string(),
            seller_id: None,
            commission_rate_bps: 0,
            promotion_policy: SelectionPolicy::FirstMatch,
            utc_offset_minutes: -180,
            search_limit: 20,
            database_path: None,
            shortcuts: HashMap::new(),
        }
    }
}

impl ConfigState {
    /// Loads configuration: defaults, then the config file, then `CAIXA_*`
    /// environment variables.
    ///
    /// An explicit `path` must exist; the default config file is optional.
    pub fn load(path: Option<&Path>) -> CheckoutResult<Self> {
        let mut config = match path {
            Some(path) => ConfigState::from_file(path)?,
            None => match default_config_file().filter(|p| p.exists()) {
                Some(path) => ConfigState::from_file(&path)?,
                None => ConfigState::default(),
            },
        };

        config.apply_env(|key| std::env::var(key).ok())?;
        config.shortcut_table()?;

        info!(
            device_id = %config.device_id,
            operator_id = %config.operator_id,
            policy = ?config.promotion_policy,
            "Configuration loaded"
        );
        Ok(config)
    }

    pub fn from_file(path: &Path) -> CheckoutResult<Self> {
        debug!(path = %path.display(), "Reading config file");
        let text = std::fs::read_to_string(path)
            .map_err(|e| CheckoutError::config(format!("cannot read {}: {}", path.display(), e)))?;
        ConfigState::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> CheckoutResult<Self> {
        toml::from_str(text).map_err(|e| CheckoutError::config(format!("invalid config: {}", e)))
    }

    /// Applies `CAIXA_*` overrides read through `lookup`.
    ///
    /// ## Environment Variables
    /// - `CAIXA_DB_PATH`: database file
    /// - `CAIXA_STORE_NAME`, `CAIXA_REGISTER_NAME`, `CAIXA_DEVICE_ID`
    /// - `CAIXA_OPERATOR_ID`, `CAIXA_SELLER_ID`
    /// - `CAIXA_COMMISSION_RATE`: percentage, e.g. "2.5"
    /// - `CAIXA_PROMOTION_POLICY`: "first_match" or "largest_discount"
    /// - `CAIXA_UTC_OFFSET_MINUTES`: e.g. "-180"
    pub fn apply_env<F>(&mut self, lookup: F) -> CheckoutResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(path) = lookup("CAIXA_DB_PATH") {
            self.database_path = Some(PathBuf::from(path));
        }
        if let Some(name) = lookup("CAIXA_STORE_NAME") {
            self.store_name = name;
        }
        if let Some(register) = lookup("CAIXA_REGISTER_NAME") {
            self.register_name = register;
        }
        if let Some(device) = lookup("CAIXA_DEVICE_ID") {
            self.device_id = device;
        }
        if let Some(operator) = lookup("CAIXA_OPERATOR_ID") {
            self.operator_id = operator;
        }
        if let Some(seller) = lookup("CAIXA_SELLER_ID") {
            self.seller_id = Some(seller).filter(|s| !s.trim().is_empty());
        }
        if let Some(rate) = lookup("CAIXA_COMMISSION_RATE") {
            let pct: f64 = rate
                .trim()
                .parse()
                .map_err(|_| CheckoutError::config(format!("CAIXA_COMMISSION_RATE '{}' is not a number", rate)))?;
            self.commission_rate_bps = Percentage::from_percentage(pct).bps();
        }
        if let Some(policy) = lookup("CAIXA_PROMOTION_POLICY") {
            self.promotion_policy = match policy.trim() {
                "first_match" => SelectionPolicy::FirstMatch,
                "largest_discount" => SelectionPolicy::LargestDiscount,
                other => {
                    return Err(CheckoutError::config(format!(
                        "CAIXA_PROMOTION_POLICY '{}' is not a policy",
                        other
                    )))
                }
            };
        }
        if let Some(offset) = lookup("CAIXA_UTC_OFFSET_MINUTES") {
            self.utc_offset_minutes = offset
                .trim()
                .parse()
                .map_err(|_| CheckoutError::config(format!("CAIXA_UTC_OFFSET_MINUTES '{}' is not a number", offset)))?;
        }
        Ok(())
    }

    /// Platform data directory (e.g. `~/.local/share/caixa-pos`).
    pub fn data_dir() -> Option<PathBuf> {
        project_dirs().map(|dirs| dirs.data_dir().to_path_buf())
    }

    /// Configured database path, else `<data dir>/caixa.db`, else `./caixa.db`.
    pub fn database_path(&self) -> PathBuf {
        if let Some(path) = &self.database_path {
            return path.clone();
        }
        ConfigState::data_dir()
            .map(|dir| dir.join(DATABASE_FILE_NAME))
            .unwrap_or_else(|| PathBuf::from(DATABASE_FILE_NAME))
    }

    /// Store name followed by the address lines.
    pub fn receipt_header(&self) -> Vec<String> {
        std::iter::once(self.store_name.clone())
            .chain(self.store_address.iter().cloned())
            .collect()
    }

    pub fn commission_rate(&self) -> Percentage {
        Percentage::from_bps(self.commission_rate_bps)
    }

    /// Store wall-clock time for a UTC instant.
    pub fn local_time(&self, now: DateTime<Utc>) -> NaiveDateTime {
        match FixedOffset::east_opt(self.utc_offset_minutes * 60) {
            Some(offset) => now.with_timezone(&offset).naive_local(),
            None => now.naive_utc(),
        }
    }

    pub fn shortcut_table(&self) -> CheckoutResult<ShortcutTable> {
        ShortcutTable::with_overrides(&self.shortcuts)
    }

    /// Formats cents as Brazilian currency: `R$ 1.234,56`.
    pub fn format_currency(&self, cents: i64) -> String {
        let whole = (cents / 100).abs();
        let frac = (cents % 100).abs();

        let digits = whole.to_string();
        let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
        for (i, ch) in digits.chars().enumerate() {
            if i > 0 && (digits.len() - i) % 3 == 0 {
                grouped.push('.');
            }
            grouped.push(ch);
        }

        format!("{}R$ {},{:02}", if cents < 0 { "-" } else { "" }, grouped, frac)
    }
}

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("br", "Caixa", "caixa-pos")
}

fn default_config_file() -> Option<PathBuf> {
    project_dirs().map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_format_currency() {
        let config = ConfigState::default();
        assert_eq!(config.format_currency(1234), "R$ 12,34");
        assert_eq!(config.format_currency(1), "R$ 0,01");
        assert_eq!(config.format_currency(0), "R$ 0,00");
        assert_eq!(config.format_currency(-1234), "-R$ 12,34");
        assert_eq!(config.format_currency(123456789), "R$ 1.234.567,89");
        assert_eq!(config.format_currency(100000), "R$ 1.000,00");
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ConfigState::from_toml_str(
            r#"
            device_id = "PDV07"
            commission_rate_bps = 150
            promotion_policy = "largest_discount"

            [shortcuts]
            F9 = "price_check"
            "#,
        )
        .unwrap();

        assert_eq!(config.device_id, "PDV07");
        assert_eq!(config.commission_rate(), Percentage::from_bps(150));
        assert_eq!(config.promotion_policy, SelectionPolicy::LargestDiscount);
        assert_eq!(config.register_name, "Caixa 01");
        assert!(config.shortcut_table().unwrap().action_for("F9").is_some());
    }

    #[test]
    fn test_receipt_header_from_store_fields() {
        let config = ConfigState::from_toml_str(
            r#"
            store_name = "Mercadinho Boa Vista"
            store_address = ["Rua das Flores, 10", "Centro"]
            "#,
        )
        .unwrap();

        assert_eq!(
            config.receipt_header(),
            vec!["Mercadinho Boa Vista", "Rua das Flores, 10", "Centro"]
        );
        assert_eq!(ConfigState::default().receipt_header(), vec!["Caixa POS"]);
    }

    #[test]
    fn test_invalid_toml_is_config_error() {
        let err = ConfigState::from_toml_str("search_limit = \"many\"").unwrap_err();
        assert_eq!(err.code, crate::error::ErrorCode::ConfigError);
    }

    #[test]
    fn test_env_overrides() {
        let env = HashMap::from([
            ("CAIXA_OPERATOR_ID", "op-2"),
            ("CAIXA_SELLER_ID", "seller-9"),
            ("CAIXA_COMMISSION_RATE", "2.5"),
            ("CAIXA_PROMOTION_POLICY", "largest_discount"),
            ("CAIXA_DB_PATH", "/tmp/caixa-test.db"),
            ("CAIXA_REGISTER_NAME", "Caixa 03"),
        ]);
        let mut config = ConfigState::default();
        config
            .apply_env(|key| env.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.operator_id, "op-2");
        assert_eq!(config.seller_id.as_deref(), Some("seller-9"));
        assert_eq!(config.commission_rate_bps, 250);
        assert_eq!(config.promotion_policy, SelectionPolicy::LargestDiscount);
        assert_eq!(config.database_path(), PathBuf::from("/tmp/caixa-test.db"));
        assert_eq!(config.register_name, "Caixa 03");

        let mut config = ConfigState::default();
        let err = config
            .apply_env(|key| (key == "CAIXA_PROMOTION_POLICY").then(|| "random".to_string()))
            .unwrap_err();
        assert!(err.message.contains("random"));
    }

    #[test]
    fn test_local_time_uses_store_offset() {
        let config = ConfigState::default();
        let utc = Utc.with_ymd_and_hms(2024, 6, 15, 21, 30, 0).unwrap();
        assert_eq!(config.local_time(utc).format("%H:%M").to_string(), "18:30");
    }
}
