use actix_web::{http::StatusCode, web, web::ServiceConfig};
use marketplace_engine::{
    db_types::{Cart, CartItem, CartOwner, Kobo, Role},
    CartApi,
};
use serde_json::json;

use super::{
    helpers::{delete_request, get_request, parse, post_request, product, timestamp, valid_token},
    mocks::MockMarketDb,
};
use crate::routes::{AddToCartRoute, GetCartRoute, RemoveFromCartRoute, SyncCartRoute, UpdateCartRoute};

fn configure_with(db: MockMarketDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(AddToCartRoute::<MockMarketDb>::new())
            .service(UpdateCartRoute::<MockMarketDb>::new())
            .service(RemoveFromCartRoute::<MockMarketDb>::new())
            .service(GetCartRoute::<MockMarketDb>::new())
            .service(SyncCartRoute::<MockMarketDb>::new())
            .app_data(web::Data::new(CartApi::new(db)));
    }
}

fn cart(owner: &CartOwner, items: Vec<CartItem>) -> Cart {
    Cart { id: 1, owner: owner.clone(), items, created_at: timestamp(), updated_at: timestamp() }
}

#[actix_web::test]
async fn guest_without_session_gets_a_new_one() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 10))));
    db.expect_fetch_cart().withf(|owner| matches!(owner, CartOwner::Guest(_))).returning(|_| Ok(None));
    db.expect_save_cart()
        .withf(|owner, items| owner.session_id().is_some() && items == &[CartItem::new(7, 2, Kobo::from(250_000))])
        .times(1)
        .returning(|owner, items| Ok(Some(cart(owner, items))));
    let body = json!({"productId": 7, "quantity": 2});
    let (status, body) = post_request("", "/cart/add", body, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert!(body["session_id"].as_str().is_some_and(|s| !s.is_empty()));
    assert_eq!(body["cart"]["total"], 500_000);
    assert_eq!(body["cart"]["items"][0]["title"], "Product 7");
}

#[actix_web::test]
async fn adding_merges_with_existing_line() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 10))));
    db.expect_fetch_cart()
        .withf(|owner| owner == &CartOwner::User(5))
        .returning(|owner| Ok(Some(cart(owner, vec![CartItem::new(7, 1, Kobo::from(250_000))]))));
    db.expect_save_cart()
        .withf(|_, items| items.len() == 1 && items[0].quantity == 3)
        .times(1)
        .returning(|owner, items| Ok(Some(cart(owner, items))));
    let token = valid_token(5, &[Role::User]);
    let body = json!({"product_id": 7, "quantity": 2});
    let (status, body) = post_request(&token, "/cart/add", body, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["session_id"], serde_json::Value::Null);
    assert_eq!(body["cart"]["items"][0]["quantity"], 3);
}

#[actix_web::test]
async fn cannot_add_more_than_stock() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 2))));
    db.expect_save_cart().never();
    let body = json!({"productId": 7, "quantity": 3, "sessionId": "abc"});
    let (status, body) = post_request("", "/cart/add", body, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Insufficient stock for Product 7. Available: 2"}"#);
}

#[actix_web::test]
async fn zero_quantity_is_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().never();
    let body = json!({"productId": 7, "quantity": 0, "sessionId": "abc"});
    let (status, body) = post_request("", "/cart/add", body, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Quantity must be at least 1"}"#);
}

#[actix_web::test]
async fn reading_a_cart_clamps_to_stock() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_cart().returning(|owner| {
        Ok(Some(cart(owner, vec![CartItem::new(7, 5, Kobo::from(1_000)), CartItem::new(8, 1, Kobo::from(2_000))])))
    });
    // Product 8 has been deleted
    db.expect_fetch_product().returning(|id| Ok((id == 7).then(|| product(id, 3, 1_000, 2))));
    db.expect_save_cart()
        .withf(|_, items| items == &[CartItem::new(7, 2, Kobo::from(1_000))])
        .times(1)
        .returning(|owner, items| Ok(Some(cart(owner, items))));
    let (status, body) = get_request("", "/cart?sessionId=abc", configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["adjusted"], true);
    assert_eq!(body["session_id"], "abc");
    assert_eq!(body["cart"]["total"], 2_000);
    assert_eq!(body["cart"]["items"].as_array().map(|a| a.len()), Some(1));
}

#[actix_web::test]
async fn reading_a_cart_needs_an_owner() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_cart().never();
    let (status, body) = get_request("", "/cart", configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"User ID or session ID required"}"#);
}

#[actix_web::test]
async fn removing_the_last_line_empties_the_cart() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_cart().returning(|owner| Ok(Some(cart(owner, vec![CartItem::new(7, 1, Kobo::from(1_000))]))));
    db.expect_save_cart().withf(|_, items| items.is_empty()).times(1).returning(|_, _| Ok(None));
    db.expect_fetch_product().never();
    let token = valid_token(5, &[Role::User]);
    let (status, body) = delete_request(&token, "/cart/remove/7", configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["cart"]["items"], json!([]));
    assert_eq!(body["cart"]["total"], 0);
}

#[actix_web::test]
async fn removing_a_missing_line() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_cart().returning(|owner| Ok(Some(cart(owner, vec![CartItem::new(7, 1, Kobo::from(1_000))]))));
    db.expect_save_cart().never();
    let (status, body) = delete_request("", "/cart/remove/8?sessionId=abc", configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Item not in cart"}"#);
}

#[actix_web::test]
async fn sync_flags_stale_prices() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 1_200, 10))));
    db.expect_save_cart()
        .withf(|owner, items| owner == &CartOwner::User(5) && items == &[CartItem::new(7, 3, Kobo::from(1_200))])
        .times(1)
        .returning(|owner, items| Ok(Some(cart(owner, items))));
    let token = valid_token(5, &[Role::User]);
    let body = json!({"items": [
        {"product_id": 7, "quantity": 1, "price": 1_000},
        {"product_id": 7, "quantity": 2, "price": 1_200}
    ]});
    let (status, body) = post_request(&token, "/cart/sync", body, configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["has_price_changes"], true);
    assert_eq!(body["adjusted"], false);
    assert_eq!(body["cart"]["total"], 3_600);
}

#[actix_web::test]
async fn sync_needs_items() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_save_cart().never();
    let body = json!({"items": [], "sessionId": "abc"});
    let (status, body) = post_request("", "/cart/sync", body, configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid or empty items"}"#);
}
