use std::time::Duration;

use log::*;
use mkt_common::Secret;

pub const DEFAULT_PAYSTACK_BASE_URL: &str = "https://api.paystack.co";

#[derive(Debug, Clone)]
pub struct PaystackConfig {
    pub base_url: String,
    pub secret_key: Secret<String>,
    pub timeout: Duration,
}

impl Default for PaystackConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_PAYSTACK_BASE_URL.to_string(),
            secret_key: Secret::default(),
            timeout: Duration::from_secs(30),
        }
    }
}

impl PaystackConfig {
    pub fn new_from_env_or_default() -> Self {
        let base_url = std::env::var("MKT_PAYSTACK_BASE_URL").unwrap_or_else(|_| {
            debug!("MKT_PAYSTACK_BASE_URL not set, using {DEFAULT_PAYSTACK_BASE_URL}");
            DEFAULT_PAYSTACK_BASE_URL.to_string()
        });
        let secret_key = Secret::new(std::env::var("MKT_PAYSTACK_SECRET_KEY").unwrap_or_else(|_| {
            warn!("MKT_PAYSTACK_SECRET_KEY not set, using (probably useless) test key default");
            "sk_test_00000000000000".to_string()
        }));
        let timeout = std::env::var("MKT_PAYSTACK_TIMEOUT_SECS")
            .ok()
            .and_then(|s| {
                s.parse::<u64>()
                    .map_err(|e| warn!("Invalid MKT_PAYSTACK_TIMEOUT_SECS ({s}): {e}. Using the default."))
                    .ok()
            })
            .map(Duration::from_secs)
            .unwrap_or(Duration::from_secs(30));
        Self { base_url, secret_key, timeout }
    }

    /// Paystack test keys are prefixed `sk_test_`. Transfers are not possible with them.
    pub fn is_test_key(&self) -> bool {
        self.secret_key.reveal().contains("test")
    }
}
