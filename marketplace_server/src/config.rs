use std::{env, io::Write, net::IpAddr, time::Duration as StdDuration};

use chrono::Duration;
use log::*;
use mkt_common::{parse_boolean_flag, Secret};
use paystack_tools::PaystackConfig;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use tempfile::NamedTempFile;

use crate::errors::ServerError;

const DEFAULT_MKT_HOST: &str = "127.0.0.1";
const DEFAULT_MKT_PORT: u16 = 8360;
const DEFAULT_DATABASE_URL: &str = "sqlite://data/marketplace.db";
const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_UNPAID_ORDER_TIMEOUT: Duration = Duration::hours(24);
const DEFAULT_UNPAID_ORDER_CHECK_INTERVAL: StdDuration = StdDuration::from_secs(300);
const MIN_JWT_SECRET_LENGTH: usize = 32;
/// The addresses Paystack sends webhooks from
pub const PAYSTACK_WEBHOOK_IPS: [&str; 3] = ["52.31.139.75", "52.49.173.169", "52.214.14.220"];

#[derive(Clone, Debug)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub database_url: String,
    pub auth: AuthConfig,
    /// The storefront URL. Buyers are sent back here after paying, unless the request carried an `Origin` header.
    pub frontend_url: String,
    /// If true, the X-Forwarded-For header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_x_forwarded_for: bool,
    /// If true, the Forwarded header will be used to determine the client's IP address, rather than the
    /// connection's remote address.
    pub use_forwarded: bool,
    /// The time before an unpaid card or transfer order is marked as failed.
    pub unpaid_order_timeout: Duration,
    /// How often to look for unpaid orders to expire.
    pub unpaid_order_check_interval: StdDuration,
    pub paystack: GatewayConfig,
}

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    pub api: PaystackConfig,
    /// In test mode no money moves: transfers and recipient registration are simulated.
    pub test_mode: bool,
    /// If true (the default), webhook calls must carry a valid `x-paystack-signature` header.
    pub hmac_checks: bool,
    /// If supplied, webhook requests are checked against a whitelist of Paystack IP addresses.
    pub whitelist: Option<Vec<IpAddr>>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_MKT_HOST.to_string(),
            port: DEFAULT_MKT_PORT,
            database_url: DEFAULT_DATABASE_URL.to_string(),
            auth: AuthConfig::default(),
            frontend_url: DEFAULT_FRONTEND_URL.to_string(),
            use_x_forwarded_for: false,
            use_forwarded: false,
            unpaid_order_timeout: DEFAULT_UNPAID_ORDER_TIMEOUT,
            unpaid_order_check_interval: DEFAULT_UNPAID_ORDER_CHECK_INTERVAL,
            paystack: GatewayConfig::default(),
        }
    }
}

impl Default for GatewayConfig {
    fn default() -> Self {
        let api = PaystackConfig::default();
        Self { test_mode: true, hmac_checks: true, whitelist: None, api }
    }
}

impl ServerConfig {
    pub fn new(host: &str, port: u16) -> Self {
        Self { host: host.to_string(), port, ..Default::default() }
    }

    pub fn from_env_or_default() -> Self {
        let host = env::var("MKT_HOST").ok().unwrap_or_else(|| DEFAULT_MKT_HOST.into());
        let port = env::var("MKT_PORT")
            .map(|s| {
                s.parse::<u16>().unwrap_or_else(|e| {
                    error!(
                        "🪛️ {s} is not a valid port for MKT_PORT. {e} Using the default, {DEFAULT_MKT_PORT}, instead."
                    );
                    DEFAULT_MKT_PORT
                })
            })
            .ok()
            .unwrap_or(DEFAULT_MKT_PORT);
        let database_url = env::var("MKT_DATABASE_URL").ok().unwrap_or_else(|| {
            warn!("🪛️ MKT_DATABASE_URL is not set. Using the default, {DEFAULT_DATABASE_URL}.");
            DEFAULT_DATABASE_URL.to_string()
        });
        let auth = AuthConfig::try_from_env().unwrap_or_else(|e| {
            warn!(
                "🪛️ Could not load the authentication configuration from environment variables. {e}. Reverting to the \
                 default configuration."
            );
            AuthConfig::default()
        });
        let frontend_url = env::var("MKT_FRONTEND_URL").ok().unwrap_or_else(|| {
            info!("🪛️ MKT_FRONTEND_URL is not set. Using the default, {DEFAULT_FRONTEND_URL}.");
            DEFAULT_FRONTEND_URL.to_string()
        });
        let use_x_forwarded_for = parse_boolean_flag(env::var("MKT_USE_X_FORWARDED_FOR").ok(), false);
        let use_forwarded = parse_boolean_flag(env::var("MKT_USE_FORWARDED").ok(), false);
        let (unpaid_order_timeout, unpaid_order_check_interval) = configure_order_expiry();
        let paystack = GatewayConfig::from_env_or_defaults();
        Self {
            host,
            port,
            database_url,
            auth,
            frontend_url,
            use_x_forwarded_for,
            use_forwarded,
            unpaid_order_timeout,
            unpaid_order_check_interval,
            paystack,
        }
    }
}

impl GatewayConfig {
    pub fn from_env_or_defaults() -> Self {
        let api = PaystackConfig::new_from_env_or_default();
        let test_mode = parse_boolean_flag(env::var("MKT_PAYSTACK_TEST_MODE").ok(), api.is_test_key());
        if test_mode {
            warn!("🪛️ Paystack is running in TEST mode. Seller payouts will be simulated.");
        } else {
            info!("🪛️ Paystack is running in LIVE mode.");
        }
        let hmac_checks = !parse_boolean_flag(env::var("MKT_DISABLE_WEBHOOK_HMAC").ok(), false);
        if !hmac_checks {
            warn!("🚨️ Webhook signature checks are DISABLED. Anyone can mark orders as paid. 🚨️");
        }
        let whitelist = configure_whitelist();
        Self { api, test_mode, hmac_checks, whitelist }
    }
}

fn configure_whitelist() -> Option<Vec<IpAddr>> {
    if parse_boolean_flag(env::var("MKT_PAYSTACK_IP_WHITELIST_DISABLED").ok(), false) {
        info!("🪛️ The Paystack IP whitelist is disabled. Only signature validation will be used for webhooks.");
        return None;
    }
    let addresses = env::var("MKT_PAYSTACK_WHITELIST").ok();
    let whitelist = match addresses {
        Some(s) if ["none", "false", "0"].contains(&s.to_lowercase().as_str()) => {
            info!(
                "🪛️ The Paystack IP whitelist is disabled. If this is not what you want, set MKT_PAYSTACK_WHITELIST \
                 to a comma-separated list of IP addresses to enable it."
            );
            return None;
        },
        Some(s) => parse_ip_list(&s),
        None => {
            info!("🪛️ MKT_PAYSTACK_WHITELIST is not set. Using Paystack's published webhook addresses.");
            parse_ip_list(&PAYSTACK_WEBHOOK_IPS.join(","))
        },
    };
    if whitelist.is_empty() {
        warn!(
            "🚨️ The Paystack IP whitelist was configured, but is empty. The server will run, but won't accept any \
             webhook calls."
        );
    } else {
        let addrs = whitelist.iter().map(|a| a.to_string()).collect::<Vec<_>>().join(", ");
        info!("🪛️ Paystack IP whitelist: {addrs}");
    }
    Some(whitelist)
}

fn parse_ip_list(s: &str) -> Vec<IpAddr> {
    s.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter_map(|s| {
            s.parse()
                .map_err(|e| warn!("🪛️ Ignoring invalid IP address ({s}) in MKT_PAYSTACK_WHITELIST: {e}"))
                .ok()
        })
        .collect()
}

fn configure_order_expiry() -> (Duration, StdDuration) {
    let unpaid_order_timeout = env::var("MKT_UNPAID_ORDER_TIMEOUT")
        .map_err(|_| {
            info!(
                "🪛️ MKT_UNPAID_ORDER_TIMEOUT is not set. Using the default value of {} hrs.",
                DEFAULT_UNPAID_ORDER_TIMEOUT.num_hours()
            )
        })
        .and_then(|s| {
            s.parse::<i64>()
                .map(Duration::hours)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MKT_UNPAID_ORDER_TIMEOUT. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_TIMEOUT);
    let check_interval = env::var("MKT_UNPAID_ORDER_CHECK_INTERVAL")
        .map_err(|_| {
            info!(
                "🪛️ MKT_UNPAID_ORDER_CHECK_INTERVAL is not set. Using the default value of {} s.",
                DEFAULT_UNPAID_ORDER_CHECK_INTERVAL.as_secs()
            )
        })
        .and_then(|s| {
            s.parse::<u64>()
                .map(StdDuration::from_secs)
                .map_err(|e| warn!("🪛️ Invalid configuration value for MKT_UNPAID_ORDER_CHECK_INTERVAL. {e}"))
        })
        .ok()
        .unwrap_or(DEFAULT_UNPAID_ORDER_CHECK_INTERVAL);
    (unpaid_order_timeout, check_interval)
}

//-------------------------------------------------  AuthConfig  -------------------------------------------------------
/// Access tokens are issued by the identity service and signed with HS256. The server only needs the shared secret to
/// validate them.
#[derive(Clone, Debug)]
pub struct AuthConfig {
    pub jwt_secret: Secret<String>,
}

impl Default for AuthConfig {
    fn default() -> Self {
        let mut tmpfile = NamedTempFile::new().ok().and_then(|f| f.keep().ok());
        warn!(
            "🚨️🚨️🚨️ The JWT secret has not been set. I'm using a random value for this session. No access token \
             issued elsewhere will be accepted. 🚨️🚨️🚨️"
        );
        let secret: String = thread_rng().sample_iter(&Alphanumeric).take(64).map(char::from).collect();
        match &mut tmpfile {
            Some((f, p)) => match writeln!(f, "{secret}") {
                Ok(()) => warn!(
                    "🚨️🚨️🚨️ The JWT secret for this session was written to {}. If this is a production instance, \
                     you are doing it wrong! Set the MKT_JWT_SECRET environment variable instead. 🚨️🚨️🚨️",
                    p.to_str().unwrap_or("???")
                ),
                Err(e) => warn!("🪛️ Could not write the JWT secret to the temporary file. {e}"),
            },
            None => {
                warn!("🪛️ Could not create a temporary file to store the JWT secret.");
            },
        }
        Self { jwt_secret: Secret::new(secret) }
    }
}

impl AuthConfig {
    pub fn new(secret: &str) -> Self {
        Self { jwt_secret: Secret::new(secret.to_string()) }
    }

    pub fn try_from_env() -> Result<Self, ServerError> {
        let secret =
            env::var("MKT_JWT_SECRET").map_err(|e| ServerError::ConfigurationError(format!("{e} [MKT_JWT_SECRET]")))?;
        if secret.len() < MIN_JWT_SECRET_LENGTH {
            return Err(ServerError::ConfigurationError(format!(
                "MKT_JWT_SECRET must be at least {MIN_JWT_SECRET_LENGTH} characters long"
            )));
        }
        Ok(Self::new(&secret))
    }
}

//-------------------------------------------------  ServerOptions  ----------------------------------------------------
/// A subset of the server configuration that is used to configure the server's behaviour. Generally we try to keep this
/// as small as possible, and exclude secrets to avoid passing sensitive information around the system.
#[derive(Clone, Debug)]
pub struct ServerOptions {
    pub use_x_forwarded_for: bool,
    pub use_forwarded: bool,
    pub frontend_url: String,
}

impl ServerOptions {
    pub fn from_config(config: &ServerConfig) -> Self {
        Self {
            use_x_forwarded_for: config.use_x_forwarded_for,
            use_forwarded: config.use_forwarded,
            frontend_url: config.frontend_url.clone(),
        }
    }
}

impl Default for ServerOptions {
    fn default() -> Self {
        Self { use_x_forwarded_for: false, use_forwarded: false, frontend_url: DEFAULT_FRONTEND_URL.to_string() }
    }
}
