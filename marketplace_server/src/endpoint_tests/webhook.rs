use actix_web::{body::MessageBody, http::StatusCode, test, test::TestRequest, web, App};
use marketplace_engine::{
    db_types::{Kobo, PaymentStatus},
    events::EventProducers,
    traits::{ChargeVerification, OrderManagementError},
    OrderFlowApi,
};
use mkt_common::Secret;
use paystack_tools::webhook::{calculate_signature, PAYSTACK_SIGNATURE_HEADER};
use serde_json::json;

use super::{
    helpers::order,
    mocks::{MockGateway, MockMarketDb},
};
use crate::{middleware::HmacMiddlewareFactory, paystack_routes::PaystackWebhookRoute};

const SECRET_KEY: &str = "sk_test_endpoint_tests";
const REFERENCE: &str = "ORDER_31_1709285400000";

async fn send_webhook(
    payload: &str,
    signature: Option<String>,
    db: MockMarketDb,
    gateway: MockGateway,
) -> (StatusCode, String) {
    let api = OrderFlowApi::new(db, gateway, EventProducers::default());
    let scope = web::scope("/api/webhook")
        .wrap(HmacMiddlewareFactory::new(Secret::new(SECRET_KEY.to_string()), true))
        .service(PaystackWebhookRoute::<MockMarketDb, MockGateway>::new());
    let app = App::new().app_data(web::Data::new(api)).service(scope);
    let service = test::init_service(app).await;
    let mut req = TestRequest::post()
        .uri("/api/webhook/paystack")
        .insert_header(("Content-Type", "application/json"))
        .set_payload(payload.to_string());
    if let Some(signature) = signature {
        req = req.insert_header((PAYSTACK_SIGNATURE_HEADER, signature));
    }
    let res = match test::try_call_service(&service, req.to_request()).await {
        Ok(res) => res.into_parts().1.map_into_boxed_body(),
        Err(e) => e.error_response(),
    };
    let status = res.status();
    let body = res.into_body().try_into_bytes().map(|b| String::from_utf8_lossy(&b).into_owned()).unwrap_or_default();
    (status, body)
}

fn charge_success() -> String {
    json!({"event": "charge.success", "data": {"reference": REFERENCE, "status": "success", "amount": 500_000}})
        .to_string()
}

fn sign(payload: &str) -> Option<String> {
    Some(calculate_signature(SECRET_KEY, payload.as_bytes()))
}

#[actix_web::test]
async fn unsigned_webhooks_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_reference().never();
    let (status, body) = send_webhook(&charge_success(), None, db, MockGateway::new()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid signature");
}

#[actix_web::test]
async fn forged_webhooks_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_reference().never();
    let forged = Some(calculate_signature("sk_test_someone_else", charge_success().as_bytes()));
    let (status, body) = send_webhook(&charge_success(), forged, db, MockGateway::new()).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, "Invalid signature");
}

#[actix_web::test]
async fn charge_success_confirms_a_pending_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_reference()
        .withf(|r| r == REFERENCE)
        .returning(|_| Ok(Some(order(31, Some(5), PaymentStatus::Pending, &[(7, 3, 2, 250_000)]))));
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, Some(5), PaymentStatus::Pending, &[(7, 3, 2, 250_000)]))));
    db.expect_mark_order_on_hold()
        .times(1)
        .returning(|id, _| Ok(order(id, Some(5), PaymentStatus::Hold, &[(7, 3, 2, 250_000)])));
    db.expect_delete_cart().times(1).returning(|_| Ok(true));
    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().times(1).returning(|r| {
        Ok(ChargeVerification { reference: r.to_string(), status: "success".into(), amount: Kobo::from(500_000) })
    });
    let payload = charge_success();
    let (status, body) = send_webhook(&payload, sign(&payload), db, gateway).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Webhook processed"}"#);
}

#[actix_web::test]
async fn duplicate_notifications_are_ignored() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_reference()
        .returning(|_| Ok(Some(order(31, Some(5), PaymentStatus::Hold, &[(7, 3, 2, 250_000)]))));
    db.expect_mark_order_on_hold().never();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().never();
    let payload = charge_success();
    let (status, body) = send_webhook(&payload, sign(&payload), db, gateway).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Webhook processed"}"#);
}

#[actix_web::test]
async fn other_events_are_acknowledged() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_reference().never();
    let payload = json!({"event": "transfer.success", "data": {"reference": "transfer_40_3_1"}}).to_string();
    let (status, body) = send_webhook(&payload, sign(&payload), db, MockGateway::new()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"message":"Webhook processed"}"#);
}

#[actix_web::test]
async fn malformed_payloads_are_rejected() {
    let _ = env_logger::try_init().ok();
    let payload = "{not json";
    let (status, body) = send_webhook(payload, sign(payload), MockMarketDb::new(), MockGateway::new()).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"message":"Invalid webhook payload"}"#);
}

#[actix_web::test]
async fn storage_failures_ask_paystack_to_retry() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order_by_reference().returning(|_| {
        Err(OrderManagementError::DatabaseError("database is locked".into()))
    });
    let payload = charge_success();
    let (status, body) = send_webhook(&payload, sign(&payload), db, MockGateway::new()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"message":"Webhook processing failed"}"#);
}
