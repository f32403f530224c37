use chrono::Utc;
use log::*;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{Kobo, NewSeller, NewUser, PaymentStatus, PayoutDetails, Seller, SellerProfileUpdate, SellerStats, User},
    traits::AccountError,
};

pub async fn insert_user(user: NewUser, conn: &mut SqliteConnection) -> Result<User, AccountError> {
    let now = Utc::now();
    let user = sqlx::query_as(
        "INSERT INTO users (username, email, created_at, updated_at) VALUES ($1, $2, $3, $4) RETURNING *",
    )
    .bind(user.username)
    .bind(user.email)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(user)
}

pub async fn fetch_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Option<User>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM users WHERE id = $1").bind(user_id).fetch_optional(conn).await
}

pub async fn insert_seller(seller: NewSeller, conn: &mut SqliteConnection) -> Result<Seller, AccountError> {
    let now = Utc::now();
    let seller = sqlx::query_as(
        r#"
            INSERT INTO sellers (
                store_name,
                email,
                phone_number,
                address,
                categories,
                description,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING *;
        "#,
    )
    .bind(seller.store_name)
    .bind(seller.email)
    .bind(seller.phone_number)
    .bind(seller.address)
    .bind(Json(seller.categories))
    .bind(seller.description)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(seller)
}

pub async fn fetch_seller(seller_id: i64, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sellers WHERE id = $1").bind(seller_id).fetch_optional(conn).await
}

pub async fn fetch_seller_by_email(email: &str, conn: &mut SqliteConnection) -> Result<Option<Seller>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM sellers WHERE email = $1").bind(email).fetch_optional(conn).await
}

pub async fn update_seller_profile(
    seller_id: i64,
    update: SellerProfileUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Seller>, AccountError> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE sellers SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(name) = update.store_name {
        set_clause.push("store_name = ").push_bind_unseparated(name);
    }
    if let Some(email) = update.email {
        set_clause.push("email = ").push_bind_unseparated(email);
    }
    if let Some(phone) = update.phone_number {
        set_clause.push("phone_number = ").push_bind_unseparated(phone);
    }
    if let Some(address) = update.address {
        set_clause.push("address = ").push_bind_unseparated(address);
    }
    if let Some(categories) = update.categories {
        set_clause.push("categories = ").push_bind_unseparated(Json(categories));
    }
    if let Some(description) = update.description {
        set_clause.push("description = ").push_bind_unseparated(description);
    }
    set_clause.push("updated_at = ").push_bind_unseparated(Utc::now());
    builder.push(" WHERE id = ").push_bind(seller_id).push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let seller = builder.build_query_as::<Seller>().fetch_optional(conn).await?;
    Ok(seller)
}

/// Stores payout details, but only for a seller that has none yet.
pub async fn set_payout_details(
    seller_id: i64,
    details: PayoutDetails,
    conn: &mut SqliteConnection,
) -> Result<Seller, AccountError> {
    let seller: Option<Seller> = sqlx::query_as(
        r#"
            UPDATE sellers SET
                recipient_code = $1,
                bank_code = $2,
                account_number = $3,
                account_name = $4,
                bank_name = $5,
                is_payment_setup = 1,
                updated_at = $6
            WHERE id = $7 AND is_payment_setup = 0
            RETURNING *;
        "#,
    )
    .bind(details.recipient_code)
    .bind(details.bank_code)
    .bind(details.masked_account_number)
    .bind(details.account_name)
    .bind(details.bank_name)
    .bind(Utc::now())
    .bind(seller_id)
    .fetch_optional(&mut *conn)
    .await?;
    match seller {
        Some(seller) => Ok(seller),
        None => match fetch_seller(seller_id, conn).await? {
            Some(_) => Err(AccountError::PaymentAlreadySetup),
            None => Err(AccountError::SellerNotFound(seller_id)),
        },
    }
}

/// Order counts and revenue are computed over the seller's own line items only.
pub async fn fetch_seller_stats(seller_id: i64, conn: &mut SqliteConnection) -> Result<SellerStats, sqlx::Error> {
    let total_products: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM products WHERE seller_id = $1")
        .bind(seller_id)
        .fetch_one(&mut *conn)
        .await?;
    let rows: Vec<(PaymentStatus, i64, i64)> = sqlx::query_as(
        r#"
            SELECT o.payment_status, COUNT(DISTINCT o.id), COALESCE(SUM(i.unit_price * i.quantity), 0)
            FROM orders o JOIN order_items i ON i.order_id = o.id
            WHERE i.seller_id = $1
            GROUP BY o.payment_status
        "#,
    )
    .bind(seller_id)
    .fetch_all(&mut *conn)
    .await?;
    let mut stats = SellerStats { total_products, ..Default::default() };
    for (status, orders, revenue) in rows {
        stats.total_orders += orders;
        match status {
            PaymentStatus::Hold => {
                stats.pending_orders = orders;
                stats.pending_revenue = Kobo::from(revenue);
            },
            PaymentStatus::Paid => {
                stats.completed_orders = orders;
                stats.total_revenue = Kobo::from(revenue);
            },
            PaymentStatus::Pending | PaymentStatus::Failed => {},
        }
    }
    Ok(stats)
}
