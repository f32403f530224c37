use std::{net::IpAddr, str::FromStr};

use actix_web::{http::header::ORIGIN, HttpRequest};
use log::{debug, trace, warn};
use regex::Regex;

/// Get the remote IP address from the request. It uses 3 sources to determine the IP address, in decreasing order
/// of preference:
/// 1. The `X-Forwarded-For` header, iif `use_x_forwarded_for` is set.
/// 2. The `Forwarded` header, iif `use_forwarded` is set.
/// 3. The peer address from the connection info.
pub fn get_remote_ip(req: &HttpRequest, use_x_forwarded_for: bool, use_forwarded: bool) -> Option<IpAddr> {
    let mut result = None;
    if use_x_forwarded_for {
        trace!("Checking X-Forwarded-For header");
        // Proxies append to the list, so the first entry is the original client
        result = req
            .headers()
            .get("X-Forwarded-For")
            .and_then(|v| v.to_str().ok())
            .and_then(|s| s.split(',').next())
            .and_then(|s| IpAddr::from_str(s.trim()).ok());
        if let Some(ip) = result {
            debug!("Using X-Forwarded-For header for remote address: {ip}");
        }
    }
    if use_forwarded && result.is_none() {
        trace!("Checking Forwarded header");
        result = req.headers().get("Forwarded").and_then(|v| v.to_str().ok()).and_then(ip_from_forwarded_header);
        if let Some(ip) = result {
            debug!("Using Forwarded header for remote address: {ip}");
        }
    }
    result.or_else(|| {
        let peer_addr = req.connection_info().peer_addr().map(|a| a.to_string());
        trace!("Using Peer address for remote address: {:?}", peer_addr);
        peer_addr.and_then(|s| IpAddr::from_str(&s).ok())
    })
}

fn ip_from_forwarded_header(value: &str) -> Option<IpAddr> {
    let re = match Regex::new(r#"for="?(?P<ip>[^;,"]+)"?"#) {
        Ok(re) => re,
        Err(e) => {
            warn!("Could not compile the Forwarded header pattern. {e}");
            return None;
        },
    };
    re.captures(value).and_then(|caps| caps.name("ip")).and_then(|m| IpAddr::from_str(m.as_str()).ok())
}

/// The base URL that Paystack should send buyers back to. Browser clients send an `Origin` header; otherwise the
/// configured storefront URL is used.
pub fn callback_origin(req: &HttpRequest, default_url: &str) -> String {
    req.headers()
        .get(ORIGIN)
        .and_then(|v| v.to_str().ok())
        .filter(|s| !s.is_empty() && *s != "null")
        .unwrap_or(default_url)
        .trim_end_matches('/')
        .to_string()
}
