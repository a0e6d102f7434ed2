// Runtime configuration, read from the environment with sensible defaults.

use std::net::SocketAddr;

use anyhow::Context;

use crate::application::wallet_ledger::WalletConfig;

#[derive(Debug, Clone)]
pub struct Config {
    pub bind_addr: SocketAddr,
    pub wallet: WalletConfig,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let bind_addr = lookup("BIND_ADDR")
            .unwrap_or_else(|| "0.0.0.0:8080".to_string())
            .parse()
            .context("BIND_ADDR is not a valid socket address")?;

        let mut wallet = WalletConfig::default();
        if let Some(value) = lookup("WALLET_MIN_TOPUP") {
            wallet.min_top_up = value.parse().context("WALLET_MIN_TOPUP is not a decimal")?;
        }
        if let Some(value) = lookup("WALLET_MAX_TOPUP") {
            wallet.max_top_up = value.parse().context("WALLET_MAX_TOPUP is not a decimal")?;
        }
        if let Some(value) = lookup("WALLET_CURRENCY") {
            wallet.currency = value;
        }
        anyhow::ensure!(
            wallet.min_top_up <= wallet.max_top_up,
            "WALLET_MIN_TOPUP must not exceed WALLET_MAX_TOPUP"
        );

        Ok(Self { bind_addr, wallet })
    }
}

#[cfg(test)]
mod config_tests {
    use super::*;
    use rust_decimal_macros::dec;
    use std::collections::HashMap;

    fn with(vars: &[(&str, &str)]) -> anyhow::Result<Config> {
        let map: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| map.get(key).cloned())
    }

    #[test]
    fn it_should_default_when_nothing_is_set() {
        let config = with(&[]).unwrap();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.wallet.min_top_up, dec!(5));
        assert_eq!(config.wallet.max_top_up, dec!(500));
        assert_eq!(config.wallet.currency, "USD");
    }

    #[test]
    fn it_should_read_overrides() {
        let config = with(&[
            ("BIND_ADDR", "127.0.0.1:9999"),
            ("WALLET_MIN_TOPUP", "1"),
            ("WALLET_MAX_TOPUP", "250"),
            ("WALLET_CURRENCY", "EUR"),
        ])
        .unwrap();
        assert_eq!(config.bind_addr.port(), 9999);
        assert_eq!(config.wallet.min_top_up, dec!(1));
        assert_eq!(config.wallet.max_top_up, dec!(250));
        assert_eq!(config.wallet.currency, "EUR");
    }

    #[test]
    fn it_should_reject_an_inverted_top_up_range() {
        assert!(with(&[("WALLET_MIN_TOPUP", "100"), ("WALLET_MAX_TOPUP", "10")]).is_err());
    }

    #[test]
    fn it_should_reject_garbage_values() {
        assert!(with(&[("BIND_ADDR", "not-an-addr")]).is_err());
        assert!(with(&[("WALLET_MIN_TOPUP", "lots")]).is_err());
    }
}
