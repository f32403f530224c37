use chrono::{DateTime, Utc};
use log::*;
use sqlx::{FromRow, SqliteConnection};

use crate::{
    db_types::{Cart, CartItem, CartOwner},
    traits::CartError,
};

#[derive(Debug, FromRow)]
struct CartRow {
    id: i64,
    user_id: Option<i64>,
    session_id: Option<String>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

async fn fetch_cart_row(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<Option<CartRow>, sqlx::Error> {
    match owner {
        CartOwner::User(id) => {
            sqlx::query_as("SELECT * FROM carts WHERE user_id = $1").bind(id).fetch_optional(conn).await
        },
        CartOwner::Guest(session) => {
            sqlx::query_as("SELECT * FROM carts WHERE session_id = $1").bind(session).fetch_optional(conn).await
        },
    }
}

async fn fetch_items(cart_id: i64, conn: &mut SqliteConnection) -> Result<Vec<CartItem>, sqlx::Error> {
    sqlx::query_as("SELECT product_id, quantity, price FROM cart_items WHERE cart_id = $1 ORDER BY rowid")
        .bind(cart_id)
        .fetch_all(conn)
        .await
}

pub async fn fetch_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<Option<Cart>, CartError> {
    let Some(row) = fetch_cart_row(owner, conn).await? else {
        return Ok(None);
    };
    let items = fetch_items(row.id, conn).await?;
    let owner = CartOwner::from_columns(row.user_id, row.session_id).unwrap_or_else(|| owner.clone());
    Ok(Some(Cart { id: row.id, owner, items, created_at: row.created_at, updated_at: row.updated_at }))
}

/// Replaces the items in the owner's cart, creating the cart if needed. This is not atomic on its own; run it inside
/// a transaction.
pub async fn save_cart(
    owner: &CartOwner,
    items: Vec<CartItem>,
    conn: &mut SqliteConnection,
) -> Result<Option<Cart>, CartError> {
    if items.is_empty() {
        delete_cart(owner, conn).await?;
        return Ok(None);
    }
    let now = Utc::now();
    let cart_id = match fetch_cart_row(owner, conn).await? {
        Some(row) => {
            sqlx::query("UPDATE carts SET updated_at = $1 WHERE id = $2")
                .bind(now)
                .bind(row.id)
                .execute(&mut *conn)
                .await?;
            sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(row.id).execute(&mut *conn).await?;
            row.id
        },
        None => {
            let id: i64 = sqlx::query_scalar(
                "INSERT INTO carts (user_id, session_id, created_at, updated_at) VALUES ($1, $2, $3, $4) RETURNING id",
            )
            .bind(owner.user_id())
            .bind(owner.session_id())
            .bind(now)
            .bind(now)
            .fetch_one(&mut *conn)
            .await?;
            debug!("🗃️ New cart #{id} created for {owner}");
            id
        },
    };
    for item in items {
        sqlx::query(
            r#"
            INSERT INTO cart_items (cart_id, product_id, quantity, price) VALUES ($1, $2, $3, $4)
            ON CONFLICT (cart_id, product_id) DO UPDATE SET quantity = cart_items.quantity + excluded.quantity
            "#,
        )
        .bind(cart_id)
        .bind(item.product_id)
        .bind(item.quantity)
        .bind(item.price)
        .execute(&mut *conn)
        .await?;
    }
    fetch_cart(owner, conn).await
}

pub async fn delete_cart(owner: &CartOwner, conn: &mut SqliteConnection) -> Result<bool, CartError> {
    let Some(row) = fetch_cart_row(owner, conn).await? else {
        return Ok(false);
    };
    sqlx::query("DELETE FROM cart_items WHERE cart_id = $1").bind(row.id).execute(&mut *conn).await?;
    sqlx::query("DELETE FROM carts WHERE id = $1").bind(row.id).execute(&mut *conn).await?;
    trace!("🗃️ Cart #{} deleted", row.id);
    Ok(true)
}
