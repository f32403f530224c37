use actix_web::{http::StatusCode, web, web::ServiceConfig};
use marketplace_engine::{
    db_types::{CartOwner, Kobo, NewOrder, Order, OrderItem, PaymentMethod, PaymentStatus, Role, User},
    events::EventProducers,
    traits::{AccountError, ChargeAuthorization, ChargeVerification, GatewayError, GatewayMode, TransferReceipt},
    OrderFlowApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{get_request, order, parse, post_request, product, seller, shipping_info, timestamp, valid_token},
    mocks::{MockGateway, MockMarketDb},
};
use crate::{
    config::ServerOptions,
    routes::{ConfirmDeliveryRoute, CreateOrderRoute, MyOrdersRoute, OrderByIdRoute, VerifyPaymentHandlerRoute},
};

const REFERENCE: &str = "ORDER_31_1709285400000";
const CONFIRM_PATH: &str = "/orders/40/confirm-delivery";

fn configure_with(db: MockMarketDb, gateway: MockGateway) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(CreateOrderRoute::<MockMarketDb, MockGateway>::new())
            .service(VerifyPaymentHandlerRoute::<MockMarketDb, MockGateway>::new())
            .service(MyOrdersRoute::<MockMarketDb, MockGateway>::new())
            .service(OrderByIdRoute::<MockMarketDb, MockGateway>::new())
            .service(ConfirmDeliveryRoute::<MockMarketDb, MockGateway>::new())
            .app_data(web::Data::new(OrderFlowApi::new(db, gateway, EventProducers::default())))
            .app_data(web::Data::new(ServerOptions::default()));
    }
}

/// What storage hands back after inserting `new`
fn placed(id: i64, new: NewOrder) -> Order {
    let items = new
        .items
        .iter()
        .enumerate()
        .map(|(i, item)| OrderItem {
            id: i as i64 + 1,
            order_id: id,
            product_id: item.product_id,
            seller_id: item.seller_id,
            quantity: item.quantity,
            unit_price: item.unit_price,
        })
        .collect();
    Order {
        user_id: new.owner.user_id(),
        session_id: new.owner.session_id().map(String::from),
        shipping_info: new.shipping_info,
        total_amount: new.total_amount,
        payment_method: new.payment_method,
        payment_reference: None,
        payment_confirmed_at: None,
        items,
        ..order(id, None, PaymentStatus::Pending, &[])
    }
}

fn checkout_body(method: &str, session_id: Option<&str>, price: i64) -> Value {
    json!({
        "shipping_info": shipping_info(),
        "items": [{"product_id": 7, "quantity": 2, "price": price}],
        "total_amount": price * 2,
        "payment_method": method,
        "session_id": session_id,
    })
}

/// Order #40 belongs to buyer #5 and holds products from sellers #3 and #4
fn delivered_order(status: PaymentStatus) -> Order {
    order(40, Some(5), status, &[(7, 3, 2, 250_000), (8, 4, 1, 100_000)])
}

//----------------------------------------------   Checkout  ----------------------------------------------------

#[actix_web::test]
async fn guest_checkout_needs_a_session() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_insert_order().never();
    let gateway = MockGateway::new();
    let body = checkout_body("card", None, 250_000);
    let (status, body) = post_request("", "/create-order", body, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Session ID required for guest checkout"}"#);
}

#[actix_web::test]
async fn checkout_rejects_missing_shipping_fields() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_insert_order().never();
    let mut body = checkout_body("card", Some("abc"), 250_000);
    body["shipping_info"]["city"] = json!("");
    body["shipping_info"]["phone"] = json!(" ");
    let (status, body) = post_request("", "/create-order", body, configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Missing required fields: phone, city"}"#);
}

#[actix_web::test]
async fn checkout_rejects_quantities_above_stock() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 1))));
    db.expect_insert_order().never();
    let body = checkout_body("card", Some("abc"), 250_000);
    let (status, body) = post_request("", "/create-order", body, configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Insufficient stock for Product 7. Available: 1"}"#);
}

#[actix_web::test]
async fn pay_on_delivery_goes_straight_to_hold() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_user().returning(|id| {
        Ok(Some(User {
            id,
            username: "ada".into(),
            email: "Ada@Example.com".into(),
            created_at: timestamp(),
            updated_at: timestamp(),
        }))
    });
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 10))));
    db.expect_insert_order()
        .withf(|new| {
            new.owner == CartOwner::User(5)
                && new.total_amount == Kobo::from(500_000)
                && new.payment_method == PaymentMethod::PayOnDelivery
        })
        .times(1)
        .returning(|new| Ok(placed(31, new)));
    db.expect_mark_order_on_hold().times(1).returning(|id, at| {
        let mut order = order(id, Some(5), PaymentStatus::Hold, &[(7, 3, 2, 250_000)]);
        order.payment_confirmed_at = Some(at);
        Ok(order)
    });
    db.expect_delete_cart().withf(|owner| owner == &CartOwner::User(5)).times(1).returning(|_| Ok(true));
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_charge().never();
    let token = valid_token(5, &[Role::User]);
    let body = checkout_body("pay_on_delivery", None, 250_000);
    let (status, body) = post_request(&token, "/create-order", body, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = parse(&body);
    assert_eq!(body["message"], "Order created successfully (Pay on Delivery)");
    assert_eq!(body["payment_required"], false);
    assert_eq!(body["authorization_url"], Value::Null);
    assert_eq!(body["order"]["payment_status"], "hold");
}

#[actix_web::test]
async fn card_checkout_charges_the_live_price() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_user().never();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 10))));
    db.expect_insert_order()
        .withf(|new| new.owner == CartOwner::Guest("abc".into()) && new.total_amount == Kobo::from(500_000))
        .times(1)
        .returning(|new| Ok(placed(31, new)));
    db.expect_set_payment_reference()
        .withf(|id, reference, url| *id == 31 && reference == "order_31_1" && url == "https://checkout.paystack.com/x1")
        .times(1)
        .returning(|id, reference, url| {
            let mut order = order(id, None, PaymentStatus::Pending, &[(7, 3, 2, 250_000)]);
            order.session_id = Some("abc".into());
            order.payment_reference = Some(reference.to_string());
            order.authorization_url = Some(url.to_string());
            Ok(order)
        });
    db.expect_delete_cart().never();
    let mut gateway = MockGateway::new();
    gateway
        .expect_initialize_charge()
        .withf(|req| {
            req.order_id == 31
                && req.amount == Kobo::from(500_000)
                && req.email == "ada@example.com"
                && req.callback_url == "http://localhost:3000/payment-verify?orderId=31"
        })
        .times(1)
        .returning(|_| {
            Ok(ChargeAuthorization {
                reference: "order_31_1".into(),
                authorization_url: "https://checkout.paystack.com/x1".into(),
            })
        });
    // The buyer saw an older, lower price
    let body = checkout_body("card", Some("abc"), 200_000);
    let (status, body) = post_request("", "/create-order", body, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = parse(&body);
    assert_eq!(body["message"], "Order created with updated prices");
    assert_eq!(body["payment_required"], true);
    assert_eq!(body["has_price_changes"], true);
    assert_eq!(body["reference"], "order_31_1");
    assert_eq!(body["authorization_url"], "https://checkout.paystack.com/x1");
    assert_eq!(body["order"]["payment_status"], "pending");
}

#[actix_web::test]
async fn checkout_fails_the_order_when_the_gateway_is_down() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 10))));
    db.expect_insert_order().returning(|new| Ok(placed(31, new)));
    db.expect_mark_order_failed()
        .withf(|id| *id == 31)
        .times(1)
        .returning(|id| Ok(order(id, None, PaymentStatus::Failed, &[(7, 3, 2, 250_000)])));
    db.expect_set_payment_reference().never();
    let mut gateway = MockGateway::new();
    gateway.expect_initialize_charge().returning(|_| Err(GatewayError::Unavailable("connection timed out".into())));
    let body = checkout_body("card", Some("abc"), 250_000);
    let (status, body) = post_request("", "/create-order", body, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body, r#"{"error":"Payment gateway is unavailable: connection timed out"}"#);
}

//----------------------------------------------   Verification  ----------------------------------------------------

#[actix_web::test]
async fn verified_payment_puts_order_on_hold() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|id| {
        let mut order = order(id, None, PaymentStatus::Pending, &[(7, 3, 2, 250_000)]);
        order.session_id = Some("abc".into());
        Ok(Some(order))
    });
    db.expect_mark_order_on_hold().times(1).returning(|id, _| {
        let mut order = order(id, None, PaymentStatus::Hold, &[(7, 3, 2, 250_000)]);
        order.session_id = Some("abc".into());
        Ok(order)
    });
    db.expect_delete_cart().withf(|owner| owner == &CartOwner::Guest("abc".into())).times(1).returning(|_| Ok(true));
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 8))));
    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().withf(|r| r == REFERENCE).times(1).returning(|r| {
        Ok(ChargeVerification { reference: r.to_string(), status: "success".into(), amount: Kobo::from(500_000) })
    });
    let path = format!("/verify-payment-handler?reference={REFERENCE}&orderId=31");
    let (status, body) = get_request("", &path, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["message"], "Payment verified successfully");
    assert_eq!(body["order"]["payment_status"], "hold");
    assert_eq!(body["products"][0]["title"], "Product 7");
}

#[actix_web::test]
async fn verification_needs_the_order_reference() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, None, PaymentStatus::Pending, &[(7, 3, 2, 250_000)]))));
    db.expect_mark_order_on_hold().never();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().never();
    let path = "/verify-payment-handler?reference=ORDER_99_1709285400000&orderId=31";
    let (status, body) = get_request("", path, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Reference mismatch"}"#);
}

#[actix_web::test]
async fn declined_charge_fails_the_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, None, PaymentStatus::Pending, &[(7, 3, 2, 250_000)]))));
    db.expect_mark_order_failed()
        .times(1)
        .returning(|id| Ok(order(id, None, PaymentStatus::Failed, &[(7, 3, 2, 250_000)])));
    db.expect_mark_order_on_hold().never();
    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().returning(|r| {
        Ok(ChargeVerification { reference: r.to_string(), status: "failed".into(), amount: Kobo::from(500_000) })
    });
    let path = format!("/verify-payment-handler?reference={REFERENCE}&orderId=31");
    let (status, body) = get_request("", &path, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Payment verification failed: transaction status is 'failed'"}"#);
}

#[actix_web::test]
async fn verifying_twice_is_harmless() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|id| Ok(Some(order(id, None, PaymentStatus::Hold, &[(7, 3, 2, 250_000)]))));
    db.expect_mark_order_on_hold().never();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 8))));
    let mut gateway = MockGateway::new();
    gateway.expect_verify_charge().never();
    let path = format!("/verify-payment-handler?reference={REFERENCE}&orderId=31");
    let (status, body) = get_request("", &path, configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["order"]["payment_status"], "hold");
}

//----------------------------------------------   Order views  ----------------------------------------------------

#[actix_web::test]
async fn my_orders_needs_a_token() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_orders_for_user().never();
    let (status, body) = get_request("", "/orders", configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn buyers_see_their_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_orders_for_user().withf(|id| *id == 5).times(1).returning(|id| {
        Ok(vec![
            order(40, Some(id), PaymentStatus::Hold, &[(7, 3, 2, 250_000)]),
            order(41, Some(id), PaymentStatus::Paid, &[(8, 4, 1, 100_000)]),
        ])
    });
    let token = valid_token(5, &[Role::User]);
    let (status, body) = get_request(&token, "/orders", configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body.as_array().map(|a| a.len()), Some(2));
    assert_eq!(body[1]["payment_status"], "paid");
}

#[actix_web::test]
async fn sellers_only_see_their_own_lines() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_orders_for_seller()
        .withf(|id, status| *id == 3 && *status == Some(PaymentStatus::Hold))
        .times(1)
        .returning(|_, _| Ok(vec![delivered_order(PaymentStatus::Hold)]));
    let token = valid_token(3, &[Role::Seller]);
    let (status, body) = get_request(&token, "/orders?status=hold", configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body[0]["items"].as_array().map(|a| a.len()), Some(1));
    assert_eq!(body[0]["items"][0]["seller_id"], 3);
}

#[actix_web::test]
async fn buyers_cannot_see_other_buyers_orders() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    db.expect_fetch_product().never();
    let token = valid_token(6, &[Role::User]);
    let (status, body) = get_request(&token, "/orders/40", configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Not authorized"}"#);
}

#[actix_web::test]
async fn admins_see_any_order() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    db.expect_fetch_product().times(2).returning(|id| Ok(Some(product(id, 3, 100_000, 8))));
    let token = valid_token(1, &[Role::Admin]);
    let (status, body) = get_request(&token, "/orders/40", configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["order"]["id"], 40);
    assert_eq!(body["products"].as_array().map(|a| a.len()), Some(2));
}

//----------------------------------------------   Delivery  ----------------------------------------------------

#[actix_web::test]
async fn confirmed_delivery_pays_every_seller() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    db.expect_fetch_seller().returning(|id| Ok(Some(seller(id, Some(&format!("RCP_{id}"))))));
    db.expect_claim_payout().withf(|id, _| *id == 40).times(1).returning(|_, _| Ok(true));
    db.expect_release_payout().never();
    db.expect_mark_order_paid().withf(|id, _| *id == 40).times(1).returning(|_, at| {
        let mut order = delivered_order(PaymentStatus::Paid);
        order.seller_paid_at = Some(at);
        Ok(order)
    });
    let mut gateway = MockGateway::new();
    gateway.expect_mode().return_const(GatewayMode::Test);
    gateway
        .expect_transfer()
        .withf(|req| req.seller_id == 3 && req.amount == Kobo::from(500_000) && req.recipient_code == "RCP_3")
        .times(1)
        .returning(|_| Ok(TransferReceipt { transfer_code: "TRF_3".into() }));
    gateway
        .expect_transfer()
        .withf(|req| req.seller_id == 4 && req.amount == Kobo::from(100_000) && req.recipient_code == "RCP_4")
        .times(1)
        .returning(|_| Ok(TransferReceipt { transfer_code: "TRF_4".into() }));
    let token = valid_token(5, &[Role::User]);
    let (status, body) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["message"], "Order confirmed! (Test Mode - Payments Simulated)");
    assert_eq!(body["all_successful"], true);
    assert_eq!(body["mode"], "test");
    assert_eq!(body["order"]["payment_status"], "paid");
    assert_eq!(body["payments"][0]["transfer_code"], "TRF_3");
    assert_eq!(body["payments"][1]["transfer_code"], "TRF_4");
}

#[actix_web::test]
async fn partial_payouts_leave_the_order_on_hold() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    // Seller #4 never set up their bank account
    db.expect_fetch_seller().returning(|id| Ok(Some(seller(id, (id == 3).then_some("RCP_3")))));
    db.expect_claim_payout().times(1).returning(|_, _| Ok(true));
    // The claim is dropped so that delivery can be confirmed again
    db.expect_release_payout().withf(|id| *id == 40).times(1).returning(|_| Ok(()));
    db.expect_mark_order_paid().never();
    let mut gateway = MockGateway::new();
    gateway.expect_mode().return_const(GatewayMode::Live);
    gateway
        .expect_transfer()
        .withf(|req| req.seller_id == 3)
        .times(1)
        .returning(|_| Ok(TransferReceipt { transfer_code: "TRF_3".into() }));
    let token = valid_token(5, &[Role::User]);
    let (status, body) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let body = parse(&body);
    assert_eq!(body["message"], "1 payment(s) failed");
    assert_eq!(body["all_successful"], false);
    assert_eq!(body["order"]["payment_status"], "hold");
    assert_eq!(body["payments"][1]["success"], false);
    assert_eq!(body["payments"][1]["error"], "Seller payment details not configured");
}

#[actix_web::test]
async fn payouts_in_progress_block_a_second_confirmation() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    db.expect_claim_payout().times(1).returning(|_, _| Ok(false));
    db.expect_fetch_seller().never();
    db.expect_release_payout().never();
    let mut gateway = MockGateway::new();
    gateway.expect_mode().return_const(GatewayMode::Live);
    gateway.expect_transfer().never();
    let token = valid_token(5, &[Role::User]);
    let (status, body) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Sellers already paid"}"#);
}

#[actix_web::test]
async fn seller_lookup_failures_are_reported_per_seller() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    db.expect_claim_payout().times(1).returning(|_, _| Ok(true));
    db.expect_fetch_seller().returning(|id| {
        if id == 3 {
            Ok(Some(seller(id, Some("RCP_3"))))
        } else {
            Err(AccountError::DatabaseError("database is locked".into()))
        }
    });
    db.expect_release_payout().times(1).returning(|_| Ok(()));
    db.expect_mark_order_paid().never();
    let mut gateway = MockGateway::new();
    gateway.expect_mode().return_const(GatewayMode::Live);
    gateway.expect_transfer().times(1).returning(|_| Ok(TransferReceipt { transfer_code: "TRF_3".into() }));
    let token = valid_token(5, &[Role::User]);
    let (status, body) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::MULTI_STATUS);
    let body = parse(&body);
    assert_eq!(body["payments"][0]["success"], true);
    assert_eq!(body["payments"][0]["transfer_code"], "TRF_3");
    assert_eq!(body["payments"][1]["success"], false);
    assert_eq!(body["payments"][1]["seller_id"], 4);
}

#[actix_web::test]
async fn only_the_buyer_confirms_delivery() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Hold))));
    db.expect_fetch_seller().never();
    let mut gateway = MockGateway::new();
    gateway.expect_transfer().never();
    let token = valid_token(6, &[Role::User]);
    let (status, body) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body, r#"{"error":"Not authorized"}"#);
}

#[actix_web::test]
async fn sellers_cannot_confirm_delivery() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().never();
    let token = valid_token(3, &[Role::Seller]);
    let (status, _) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, MockGateway::new())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn pending_orders_cannot_be_confirmed() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_order().returning(|_| Ok(Some(delivered_order(PaymentStatus::Pending))));
    let mut gateway = MockGateway::new();
    gateway.expect_transfer().never();
    let token = valid_token(5, &[Role::User]);
    let (status, body) = post_request(&token, CONFIRM_PATH, json!({}), configure_with(db, gateway)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Order not in hold status"}"#);
}
