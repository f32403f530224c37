use chrono::{DateTime, Utc};

/// The smallest amount the gateway will charge (₦1)
pub const MINIMUM_CHARGE_KOBO: i64 = 100;

/// The gateway reference for an order's charge. The timestamp keeps retries unique.
pub fn payment_reference(order_id: i64, at: DateTime<Utc>) -> String {
    format!("order_{order_id}_{}", at.timestamp_millis())
}

pub fn transfer_reference(order_id: i64, seller_id: i64, at: DateTime<Utc>) -> String {
    format!("transfer_{order_id}_{seller_id}_{}", at.timestamp_millis())
}

/// Where the gateway sends the buyer after checkout.
pub fn payment_callback_url(origin: &str, order_id: i64) -> String {
    format!("{}/payment-verify?orderId={order_id}", origin.trim_end_matches('/'))
}

/// Nigerian (NUBAN) account numbers are exactly ten digits.
pub fn is_valid_account_number(account_number: &str) -> bool {
    account_number.len() == 10 && account_number.bytes().all(|b| b.is_ascii_digit())
}

/// Keeps only the last four characters, e.g. `******7890`.
pub fn mask_account_number(account_number: &str) -> String {
    let n = account_number.chars().count();
    if n <= 4 {
        return "*".repeat(n);
    }
    let visible: String = account_number.chars().skip(n - 4).collect();
    format!("{}{visible}", "*".repeat(n - 4))
}

pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}
