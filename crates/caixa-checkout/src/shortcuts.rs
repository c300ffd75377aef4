//! # Keyboard Shortcuts
//!
//! Function keys mapped to checkout actions, independent of the UI toolkit.
//! The UI forwards the key name; the session dispatches the action.
//!
//! ## Default Bindings
//! ```text
//! F1  new sale          F5  total discount     F11 fullscreen
//! F2  quantity          F6  customer           F12 finalize
//! F3  price check       F7  delete item
//! F4  item discount     F8  cancel sale
//! ```
//!
//! Bindings are overridden from the config file, e.g.
//! ```toml
//! [shortcuts]
//! F9 = "price_check"
//! F3 = ""            # unbind
//! ```

use std::collections::HashMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::error::{CheckoutError, CheckoutResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ShortcutAction {
    NewSale,
    EditQuantity,
    PriceCheck,
    ItemDiscount,
    TotalDiscount,
    SelectCustomer,
    DeleteItem,
    CancelSale,
    Fullscreen,
    Finalize,
}

impl ShortcutAction {
    pub const ALL: [ShortcutAction; 10] = [
        ShortcutAction::NewSale,
        ShortcutAction::EditQuantity,
        ShortcutAction::PriceCheck,
        ShortcutAction::ItemDiscount,
        ShortcutAction::TotalDiscount,
        ShortcutAction::SelectCustomer,
        ShortcutAction::DeleteItem,
        ShortcutAction::CancelSale,
        ShortcutAction::Fullscreen,
        ShortcutAction::Finalize,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ShortcutAction::NewSale => "new_sale",
            ShortcutAction::EditQuantity => "edit_quantity",
            ShortcutAction::PriceCheck => "price_check",
            ShortcutAction::ItemDiscount => "item_discount",
            ShortcutAction::TotalDiscount => "total_discount",
            ShortcutAction::SelectCustomer => "select_customer",
            ShortcutAction::DeleteItem => "delete_item",
            ShortcutAction::CancelSale => "cancel_sale",
            ShortcutAction::Fullscreen => "fullscreen",
            ShortcutAction::Finalize => "finalize",
        }
    }
}

impl FromStr for ShortcutAction {
    type Err = CheckoutError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShortcutAction::ALL
            .into_iter()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| CheckoutError::config(format!("unknown shortcut action '{}'", s)))
    }
}

const DEFAULT_BINDINGS: [(&str, ShortcutAction); 10] = [
    ("F1", ShortcutAction::NewSale),
    ("F2", ShortcutAction::EditQuantity),
    ("F3", ShortcutAction::PriceCheck),
    ("F4", ShortcutAction::ItemDiscount),
    ("F5", ShortcutAction::TotalDiscount),
    ("F6", ShortcutAction::SelectCustomer),
    ("F7", ShortcutAction::DeleteItem),
    ("F8", ShortcutAction::CancelSale),
    ("F11", ShortcutAction::Fullscreen),
    ("F12", ShortcutAction::Finalize),
];

/// Key → action table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ShortcutTable {
    bindings: HashMap<String, ShortcutAction>,
}

impl Default for ShortcutTable {
    fn default() -> Self {
        ShortcutTable {
            bindings: DEFAULT_BINDINGS
                .into_iter()
                .map(|(key, action)| (key.to_string(), action))
                .collect(),
        }
    }
}

impl ShortcutTable {
    /// Default bindings with `overrides` applied (key → action name, empty
    /// name unbinds). Key names are case-insensitive.
    pub fn with_overrides(overrides: &HashMap<String, String>) -> CheckoutResult<Self> {
        let mut table = ShortcutTable::default();
        for (key, action) in overrides {
            let key = normalize_key(key);
            if action.trim().is_empty() {
                table.bindings.remove(&key);
            } else {
                table.bindings.insert(key, action.trim().parse()?);
            }
        }
        Ok(table)
    }

    pub fn action_for(&self, key: &str) -> Option<ShortcutAction> {
        self.bindings.get(&normalize_key(key)).copied()
    }

    /// Keys bound to `action`, sorted.
    pub fn keys_for(&self, action: ShortcutAction) -> Vec<String> {
        let mut keys: Vec<String> = self
            .bindings
            .iter()
            .filter(|(_, a)| **a == action)
            .map(|(k, _)| k.clone())
            .collect();
        keys.sort();
        keys
    }
}

fn normalize_key(key: &str) -> String {
    key.trim().to_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let table = ShortcutTable::default();
        assert_eq!(table.action_for("F1"), Some(ShortcutAction::NewSale));
        assert_eq!(table.action_for("f12"), Some(ShortcutAction::Finalize));
        assert_eq!(table.action_for("F9"), None);
        assert_eq!(table.keys_for(ShortcutAction::DeleteItem), vec!["F7"]);
    }

    #[test]
    fn test_overrides_rebind_and_unbind() {
        let overrides = HashMap::from([
            ("f9".to_string(), "price_check".to_string()),
            ("F3".to_string(), String::new()),
        ]);
        let table = ShortcutTable::with_overrides(&overrides).unwrap();

        assert_eq!(table.action_for("F9"), Some(ShortcutAction::PriceCheck));
        assert_eq!(table.action_for("F3"), None);
        assert_eq!(table.keys_for(ShortcutAction::PriceCheck), vec!["F9"]);
    }

    #[test]
    fn test_unknown_action_rejected() {
        let overrides = HashMap::from([("F9".to_string(), "open_drawer".to_string())]);
        assert!(ShortcutTable::with_overrides(&overrides).is_err());
    }
}
