use actix_web::{http::StatusCode, web, web::ServiceConfig};
use marketplace_engine::{
    db_types::{Category, Role},
    traits::CatalogError,
    CatalogApi,
};
use serde_json::{json, Value};

use super::{
    helpers::{delete_request, get_request, parse, patch_request, post_request, product, valid_token},
    mocks::MockMarketDb,
};
use crate::routes::{
    CreateProductRoute,
    DeleteProductRoute,
    ProductByIdRoute,
    ProductsByCategoryRoute,
    ProductsRoute,
    SpecialOffersRoute,
    UpdateProductRoute,
};

fn configure_with(db: MockMarketDb) -> impl FnOnce(&mut ServiceConfig) {
    move |cfg: &mut ServiceConfig| {
        cfg.service(ProductsByCategoryRoute::<MockMarketDb>::new())
            .service(SpecialOffersRoute::<MockMarketDb>::new())
            .service(ProductsRoute::<MockMarketDb>::new())
            .service(CreateProductRoute::<MockMarketDb>::new())
            .service(ProductByIdRoute::<MockMarketDb>::new())
            .service(UpdateProductRoute::<MockMarketDb>::new())
            .service(DeleteProductRoute::<MockMarketDb>::new())
            .app_data(web::Data::new(CatalogApi::new(db)));
    }
}

fn new_product(title: &str) -> Value {
    json!({"title": title, "description": "Hand-made", "price": 1_500_000, "stock": 3, "category": "clothing"})
}

#[actix_web::test]
async fn fetch_product_counts_the_view() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|id| Ok(Some(product(id, 3, 250_000, 4))));
    db.expect_increment_product_views().times(1).returning(|_| Ok(()));
    let (status, body) = get_request("", "/products/7", configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    let body = parse(&body);
    assert_eq!(body["id"], 7);
    assert_eq!(body["title"], "Product 7");
    assert_eq!(body["views"], 1);
}

#[actix_web::test]
async fn fetch_missing_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_product().returning(|_| Ok(None));
    db.expect_increment_product_views().never();
    let (status, body) = get_request("", "/products/99", configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Product 99 not found"}"#);
}

#[actix_web::test]
async fn products_filtered_by_category_slug() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_products()
        .withf(|filter| filter.category == Some(Category::BagsAndAccessories))
        .times(1)
        .returning(|_| Ok(vec![product(1, 3, 1_000, 1), product(2, 4, 2_000, 1)]));
    let (status, body) = get_request("", "/products?category=bags-accessories", configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body).as_array().map(|a| a.len()), Some(2));
}

#[actix_web::test]
async fn category_listing_requires_a_category() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_products().never();
    let (status, body) = get_request("", "/products/category", configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Category is required"}"#);
}

#[actix_web::test]
async fn special_offers_are_for_signed_in_shoppers() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_products().never();
    let (status, body) = get_request("", "/products/special-offers", configure_with(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);

    let mut db = MockMarketDb::new();
    db.expect_fetch_products().times(1).returning(|_| Ok(vec![product(1, 3, 1_000, 1)]));
    let token = valid_token(5, &[Role::User]);
    let (status, _) = get_request(&token, "/products/special-offers", configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
}

#[actix_web::test]
async fn guests_cannot_list_products() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_insert_product().never();
    let (status, body) = post_request("", "/products", new_product("Ankara dress"), configure_with(db)).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body, r#"{"error":"Authentication required"}"#);
}

#[actix_web::test]
async fn buyers_cannot_list_products() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_insert_product().never();
    let token = valid_token(5, &[Role::User]);
    let (status, _) = post_request(&token, "/products", new_product("Ankara dress"), configure_with(db)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[actix_web::test]
async fn seller_lists_a_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_insert_product()
        .withf(|seller_id, p| *seller_id == 3 && p.title == "Ankara dress" && p.category == Category::Clothing)
        .times(1)
        .returning(|seller_id, p| {
            let mut listed = product(11, seller_id, p.price.value(), p.stock);
            listed.title = p.title;
            Ok(listed)
        });
    let token = valid_token(3, &[Role::Seller]);
    let (status, body) = post_request(&token, "/products", new_product("Ankara dress"), configure_with(db)).await;
    assert_eq!(status, StatusCode::CREATED);
    let body = parse(&body);
    assert_eq!(body["id"], 11);
    assert_eq!(body["seller_id"], 3);
    assert_eq!(body["title"], "Ankara dress");
}

#[actix_web::test]
async fn invalid_products_are_rejected() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_insert_product().never();
    let token = valid_token(3, &[Role::Seller]);
    let (status, body) = post_request(&token, "/products", new_product("  "), configure_with(db)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body, r#"{"error":"Invalid product: Title is required"}"#);
}

#[actix_web::test]
async fn sellers_only_update_their_own_products() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    // Storage scopes updates to the owner, so another seller's product looks missing
    db.expect_update_product().withf(|seller_id, id, _| *seller_id == 4 && *id == 7).returning(|_, _, _| Ok(None));
    let token = valid_token(4, &[Role::Seller]);
    let (status, body) = patch_request(&token, "/products/7", json!({"price": 90_000}), configure_with(db)).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body, r#"{"error":"Product 7 not found"}"#);
}

#[actix_web::test]
async fn seller_updates_stock() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_update_product()
        .withf(|_, _, update| update.stock == Some(12) && update.price.is_none())
        .times(1)
        .returning(|seller_id, id, _| Ok(Some(product(id, seller_id, 250_000, 12))));
    let token = valid_token(3, &[Role::Seller]);
    let (status, body) = patch_request(&token, "/products/7", json!({"stock": 12}), configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse(&body)["stock"], 12);
}

#[actix_web::test]
async fn seller_deletes_a_product() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_delete_product().withf(|seller_id, id| *seller_id == 3 && *id == 7).times(1).returning(|_, _| Ok(true));
    let token = valid_token(3, &[Role::Seller]);
    let (status, body) = delete_request(&token, "/products/7", configure_with(db)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, r#"{"success":true,"message":"Product deleted"}"#);
}

#[actix_web::test]
async fn storage_failures_are_server_errors() {
    let _ = env_logger::try_init().ok();
    let mut db = MockMarketDb::new();
    db.expect_fetch_products().returning(|_| Err(CatalogError::DatabaseError("disk I/O error".into())));
    let (status, _) = get_request("", "/products", configure_with(db)).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
}
