use actix_web::{
    body::MessageBody,
    http::{Method, StatusCode},
    test,
    test::TestRequest,
    web::ServiceConfig,
    App,
};
use chrono::{DateTime, Days, TimeZone, Utc};
use jwt_compact::{
    alg::{Hs256, Hs256Key},
    AlgorithmExt,
    Claims,
    Header,
};
use log::debug;
use marketplace_engine::db_types::{
    Kobo,
    Order,
    OrderItem,
    PaymentMethod,
    PaymentStatus,
    Product,
    Role,
    Seller,
    ShippingInfo,
};
use serde_json::{json, Value};

use crate::{
    auth::{JwtClaims, TokenValidator},
    config::AuthConfig,
    middleware::AuthMiddlewareFactory,
    server::{json_config, query_config},
};

// Only used to sign tokens in these tests. DO NOT re-use this secret anywhere.
pub const TEST_JWT_SECRET: &str = "endpoint-tests-secret-that-nobody-should-use";

pub fn get_auth_config() -> AuthConfig {
    AuthConfig::new(TEST_JWT_SECRET)
}

pub fn issue_token(claims: JwtClaims, expiry: DateTime<Utc>) -> String {
    let header = Header::empty().with_token_type("JWT");
    let key = Hs256Key::new(TEST_JWT_SECRET.as_bytes());
    let mut claims = Claims::new(claims);
    claims.expiration = Some(expiry);
    Hs256.token(&header, &claims, &key).expect("Failed to sign token")
}

pub fn valid_token(account_id: i64, roles: &[Role]) -> String {
    issue_token(JwtClaims::new(account_id, roles), Utc::now() + Days::new(1))
}

pub async fn get_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send_request(Method::GET, token, path, None, configure).await
}

pub async fn post_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send_request(Method::POST, token, path, Some(body), configure).await
}

pub async fn put_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send_request(Method::PUT, token, path, Some(body), configure).await
}

pub async fn patch_request(
    token: &str,
    path: &str,
    body: Value,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send_request(Method::PATCH, token, path, Some(body), configure).await
}

pub async fn delete_request(
    token: &str,
    path: &str,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    send_request(Method::DELETE, token, path, None, configure).await
}

/// Runs a single request through an app with the same auth middleware and extractor config as the server.
/// Errors raised by middleware are rendered the way the server would render them.
pub async fn send_request(
    method: Method,
    token: &str,
    path: &str,
    body: Option<Value>,
    configure: impl FnOnce(&mut ServiceConfig),
) -> (StatusCode, String) {
    let mut req = TestRequest::default().method(method).uri(path);
    if !token.is_empty() {
        req = req.insert_header(("Authorization", format!("Bearer {token}")));
    }
    if let Some(body) = body {
        req = req.set_json(body);
    }
    let validator = TokenValidator::new(&get_auth_config());
    let app = App::new()
        .wrap(AuthMiddlewareFactory::new(validator))
        .app_data(json_config())
        .app_data(query_config())
        .configure(configure);
    let service = test::init_service(app).await;
    debug!("Making request to {path}");
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

pub fn parse(body: &str) -> Value {
    serde_json::from_str(body).expect("Response is not valid JSON")
}

//--------------------------------------       Fixtures       ---------------------------------------------------------

pub fn timestamp() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 3, 1, 9, 30, 0).unwrap()
}

pub fn product(id: i64, seller_id: i64, price: i64, stock: i64) -> Product {
    serde_json::from_value(json!({
        "id": id,
        "seller_id": seller_id,
        "title": format!("Product {id}"),
        "description": "Hand-made in Lagos",
        "price": price,
        "stock": stock,
        "category": "clothing",
        "images": [format!("https://cdn.example.com/{id}.jpg")],
        "views": 0,
        "sales": 0,
        "is_featured": false,
        "created_at": timestamp(),
        "updated_at": timestamp(),
    }))
    .expect("Invalid product fixture")
}

pub fn seller(id: i64, recipient_code: Option<&str>) -> Seller {
    serde_json::from_value(json!({
        "id": id,
        "store_name": format!("Store {id}"),
        "email": format!("store{id}@example.com"),
        "phone_number": "08012345678",
        "address": "12 Marina Road, Lagos",
        "categories": ["clothing"],
        "description": null,
        "recipient_code": recipient_code,
        "bank_code": recipient_code.map(|_| "058"),
        "account_number": recipient_code.map(|_| "******6789"),
        "account_name": recipient_code.map(|_| "ADA OBI"),
        "bank_name": recipient_code.map(|_| "Guaranty Trust Bank"),
        "is_payment_setup": recipient_code.is_some(),
        "created_at": timestamp(),
        "updated_at": timestamp(),
    }))
    .expect("Invalid seller fixture")
}

pub fn shipping_info() -> ShippingInfo {
    ShippingInfo {
        full_name: "Ada Obi".into(),
        email: "ada@example.com".into(),
        phone: "08012345678".into(),
        address: "4 Allen Avenue".into(),
        city: "Ikeja".into(),
        state: "Lagos".into(),
        postal_code: None,
    }
}

/// An order with one line per `(product_id, seller_id, quantity, unit_price)` tuple.
pub fn order(id: i64, user_id: Option<i64>, status: PaymentStatus, lines: &[(i64, i64, i64, i64)]) -> Order {
    let items = lines
        .iter()
        .enumerate()
        .map(|(i, (product_id, seller_id, quantity, price))| OrderItem {
            id: id * 100 + i as i64,
            order_id: id,
            product_id: *product_id,
            seller_id: *seller_id,
            quantity: *quantity,
            unit_price: Kobo::from(*price),
        })
        .collect::<Vec<_>>();
    let total_amount = items.iter().map(|i| i.line_total()).sum();
    Order {
        id,
        user_id,
        session_id: None,
        shipping_info: shipping_info(),
        total_amount,
        payment_status: status,
        payment_method: PaymentMethod::default(),
        payment_reference: Some(format!("ORDER_{id}_1709285400000")),
        authorization_url: None,
        payment_confirmed_at: (status != PaymentStatus::Pending).then(timestamp),
        seller_paid_at: (status == PaymentStatus::Paid).then(timestamp),
        created_at: timestamp(),
        updated_at: timestamp(),
        items,
    }
}
