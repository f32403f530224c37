use chrono::{DateTime, Utc};
use log::*;
use sqlx::{QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewOrder, Order, OrderItem, PaymentMethod, PaymentStatus},
    traits::OrderManagementError,
};

/// Inserts the order and its line items. This is not atomic; call it inside a transaction.
pub async fn insert_order(order: NewOrder, conn: &mut SqliteConnection) -> Result<Order, OrderManagementError> {
    let info = order.shipping_info;
    let mut inserted: Order = sqlx::query_as(
        r#"
            INSERT INTO orders (
                user_id,
                session_id,
                full_name,
                email,
                phone,
                address,
                city,
                state,
                postal_code,
                total_amount,
                payment_status,
                payment_method,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
            RETURNING *;
        "#,
    )
    .bind(order.owner.user_id())
    .bind(order.owner.session_id())
    .bind(info.full_name)
    .bind(info.email)
    .bind(info.phone)
    .bind(info.address)
    .bind(info.city)
    .bind(info.state)
    .bind(info.postal_code)
    .bind(order.total_amount)
    .bind(PaymentStatus::Pending)
    .bind(order.payment_method)
    .bind(order.created_at)
    .bind(order.created_at)
    .fetch_one(&mut *conn)
    .await?;
    for item in order.items {
        sqlx::query(
            "INSERT INTO order_items (order_id, product_id, seller_id, quantity, unit_price) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(inserted.id)
        .bind(item.product_id)
        .bind(item.seller_id)
        .bind(item.quantity)
        .bind(item.unit_price)
        .execute(&mut *conn)
        .await?;
    }
    inserted.items = fetch_order_items(inserted.id, conn).await?;
    debug!("🗃️ Order #{} saved with {} line item(s)", inserted.id, inserted.items.len());
    Ok(inserted)
}

pub async fn fetch_order_items(order_id: i64, conn: &mut SqliteConnection) -> Result<Vec<OrderItem>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM order_items WHERE order_id = $1 ORDER BY id").bind(order_id).fetch_all(conn).await
}

async fn with_items(order: Option<Order>, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    match order {
        Some(mut order) => {
            order.items = fetch_order_items(order.id, conn).await?;
            Ok(Some(order))
        },
        None => Ok(None),
    }
}

async fn all_with_items(orders: Vec<Order>, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let mut result = Vec::with_capacity(orders.len());
    for mut order in orders {
        order.items = fetch_order_items(order.id, conn).await?;
        result.push(order);
    }
    Ok(result)
}

pub async fn fetch_order(order_id: i64, conn: &mut SqliteConnection) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE id = $1").bind(order_id).fetch_optional(&mut *conn).await?;
    with_items(order, conn).await
}

pub async fn fetch_order_by_reference(
    reference: &str,
    conn: &mut SqliteConnection,
) -> Result<Option<Order>, sqlx::Error> {
    let order = sqlx::query_as("SELECT * FROM orders WHERE payment_reference = $1")
        .bind(reference)
        .fetch_optional(&mut *conn)
        .await?;
    with_items(order, conn).await
}

/// Explains why a conditional update on an order matched nothing.
async fn missed_update(
    order_id: i64,
    to: PaymentStatus,
    conn: &mut SqliteConnection,
) -> Result<OrderManagementError, sqlx::Error> {
    let err = match fetch_order(order_id, conn).await? {
        None => OrderManagementError::OrderNotFound(order_id),
        Some(order) if to == PaymentStatus::Paid && order.seller_paid_at.is_some() => {
            OrderManagementError::SellersAlreadyPaid(order_id)
        },
        Some(order) => OrderManagementError::IllegalTransition { id: order_id, from: order.payment_status, to },
    };
    Ok(err)
}

pub async fn set_payment_reference(
    order_id: i64,
    reference: &str,
    authorization_url: &str,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    let order: Option<Order> = sqlx::query_as(
        r#"
            UPDATE orders SET payment_reference = $1, authorization_url = $2, updated_at = $3
            WHERE id = $4 AND payment_status = 'pending'
            RETURNING *;
        "#,
    )
    .bind(reference)
    .bind(authorization_url)
    .bind(Utc::now())
    .bind(order_id)
    .fetch_optional(&mut *conn)
    .await?;
    match with_items(order, conn).await? {
        Some(order) => Ok(order),
        None => Err(missed_update(order_id, PaymentStatus::Pending, conn).await?),
    }
}

/// Moves the order from `from` to `to`, optionally stamping a timestamp column, but only if the order is currently in
/// `from`. Moving to `paid` additionally requires that sellers have not been paid before.
pub async fn update_status(
    order_id: i64,
    from: PaymentStatus,
    to: PaymentStatus,
    stamp: Option<(&'static str, DateTime<Utc>)>,
    conn: &mut SqliteConnection,
) -> Result<Order, OrderManagementError> {
    if !from.can_transition_to(to) {
        return Err(OrderManagementError::IllegalTransition { id: order_id, from, to });
    }
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE orders SET payment_status = ");
    builder.push_bind(to);
    builder.push(", updated_at = ").push_bind(Utc::now());
    if let Some((column, at)) = stamp {
        builder.push(format!(", {column} = ")).push_bind(at);
    }
    builder.push(" WHERE id = ").push_bind(order_id);
    builder.push(" AND payment_status = ").push_bind(from);
    if to == PaymentStatus::Paid {
        builder.push(" AND seller_paid_at IS NULL");
    }
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    let order = builder.build_query_as::<Order>().fetch_optional(&mut *conn).await?;
    match with_items(order, conn).await? {
        Some(order) => {
            debug!("🗃️ Order #{order_id} moved from {from} to {to}");
            Ok(order)
        },
        None => Err(missed_update(order_id, to, conn).await?),
    }
}

/// Claims an order on hold for payout. Returns false if the order is not on hold, has been paid, or another
/// confirmation already holds the claim.
pub async fn claim_payout(
    order_id: i64,
    started_at: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<bool, sqlx::Error> {
    let result = sqlx::query(
        r#"
            UPDATE orders SET payout_started_at = $1, updated_at = $2
            WHERE id = $3 AND payment_status = 'hold' AND payout_started_at IS NULL AND seller_paid_at IS NULL;
        "#,
    )
    .bind(started_at)
    .bind(Utc::now())
    .bind(order_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() == 1)
}

/// Drops the payout claim on an order that has not been paid, so that delivery can be confirmed again.
pub async fn release_payout(order_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE orders SET payout_started_at = NULL WHERE id = $1 AND seller_paid_at IS NULL")
        .bind(order_id)
        .execute(conn)
        .await?;
    Ok(())
}

/// Newest first
pub async fn fetch_orders_for_user(user_id: i64, conn: &mut SqliteConnection) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as("SELECT * FROM orders WHERE user_id = $1 ORDER BY created_at DESC, id DESC")
        .bind(user_id)
        .fetch_all(&mut *conn)
        .await?;
    all_with_items(orders, conn).await
}

pub async fn fetch_orders_for_seller(
    seller_id: i64,
    status: Option<PaymentStatus>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new(
        "SELECT * FROM orders WHERE id IN (SELECT DISTINCT order_id FROM order_items WHERE seller_id = ",
    );
    builder.push_bind(seller_id).push(")");
    if let Some(status) = status {
        builder.push(" AND payment_status = ").push_bind(status);
    }
    builder.push(" ORDER BY created_at DESC, id DESC");
    let orders = builder.build_query_as::<Order>().fetch_all(&mut *conn).await?;
    all_with_items(orders, conn).await
}

/// Pending orders created before `cutoff` that are waiting on the gateway. Pay-on-delivery orders never wait on the
/// gateway, so they are excluded.
pub async fn fetch_stale_pending_orders(
    cutoff: DateTime<Utc>,
    conn: &mut SqliteConnection,
) -> Result<Vec<Order>, sqlx::Error> {
    let orders = sqlx::query_as(
        r#"
            SELECT * FROM orders
            WHERE payment_status = $1 AND payment_method != $2 AND created_at < $3
            ORDER BY created_at
        "#,
    )
    .bind(PaymentStatus::Pending)
    .bind(PaymentMethod::PayOnDelivery)
    .bind(cutoff)
    .fetch_all(&mut *conn)
    .await?;
    all_with_items(orders, conn).await
}
