use chrono::Utc;
use log::*;
use sqlx::{types::Json, QueryBuilder, Sqlite, SqliteConnection};

use crate::{
    db_types::{NewProduct, Product, ProductUpdate},
    traits::{CatalogError, ProductOrdering, ProductQueryFilter},
};

pub async fn insert_product(
    seller_id: i64,
    product: NewProduct,
    conn: &mut SqliteConnection,
) -> Result<Product, CatalogError> {
    let now = Utc::now();
    let product = sqlx::query_as(
        r#"
            INSERT INTO products (
                seller_id,
                title,
                description,
                price,
                stock,
                category,
                images,
                is_featured,
                created_at,
                updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            RETURNING *;
        "#,
    )
    .bind(seller_id)
    .bind(product.title)
    .bind(product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.category)
    .bind(Json(product.images))
    .bind(product.is_featured)
    .bind(now)
    .bind(now)
    .fetch_one(conn)
    .await?;
    Ok(product)
}

pub async fn fetch_product(product_id: i64, conn: &mut SqliteConnection) -> Result<Option<Product>, sqlx::Error> {
    sqlx::query_as("SELECT * FROM products WHERE id = $1").bind(product_id).fetch_optional(conn).await
}

/// Applies the fields that are set in `update`. Only the owning seller's product is touched.
pub async fn update_product(
    seller_id: i64,
    product_id: i64,
    update: ProductUpdate,
    conn: &mut SqliteConnection,
) -> Result<Option<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("UPDATE products SET ");
    let mut set_clause = builder.separated(", ");
    if let Some(title) = update.title {
        set_clause.push("title = ").push_bind_unseparated(title);
    }
    if let Some(description) = update.description {
        set_clause.push("description = ").push_bind_unseparated(description);
    }
    if let Some(price) = update.price {
        set_clause.push("price = ").push_bind_unseparated(price);
    }
    if let Some(stock) = update.stock {
        set_clause.push("stock = ").push_bind_unseparated(stock);
    }
    if let Some(category) = update.category {
        set_clause.push("category = ").push_bind_unseparated(category);
    }
    if let Some(images) = update.images {
        set_clause.push("images = ").push_bind_unseparated(Json(images));
    }
    if let Some(featured) = update.is_featured {
        set_clause.push("is_featured = ").push_bind_unseparated(featured);
    }
    set_clause.push("updated_at = ").push_bind_unseparated(Utc::now());
    builder.push(" WHERE id = ").push_bind(product_id);
    builder.push(" AND seller_id = ").push_bind(seller_id);
    builder.push(" RETURNING *");
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Product>().fetch_optional(conn).await
}

pub async fn delete_product(seller_id: i64, product_id: i64, conn: &mut SqliteConnection) -> Result<bool, sqlx::Error> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1 AND seller_id = $2")
        .bind(product_id)
        .bind(seller_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn search_products(
    filter: ProductQueryFilter,
    conn: &mut SqliteConnection,
) -> Result<Vec<Product>, sqlx::Error> {
    let mut builder = QueryBuilder::<Sqlite>::new("SELECT * FROM products ");
    if !filter.is_empty() {
        builder.push("WHERE ");
    }
    let mut where_clause = builder.separated(" AND ");
    if let Some(seller_id) = filter.seller_id {
        where_clause.push("seller_id = ").push_bind_unseparated(seller_id);
    }
    if let Some(category) = filter.category {
        where_clause.push("category = ").push_bind_unseparated(category);
    }
    if let Some(featured) = filter.featured {
        where_clause.push("is_featured = ").push_bind_unseparated(featured);
    }
    if let Some(since) = filter.created_since {
        where_clause.push("created_at >= ").push_bind_unseparated(since);
    }
    match (filter.min_views, filter.min_sales) {
        (Some(views), Some(sales)) => {
            where_clause
                .push("(views >= ")
                .push_bind_unseparated(views)
                .push_unseparated(" OR sales >= ")
                .push_bind_unseparated(sales)
                .push_unseparated(")");
        },
        (Some(views), None) => {
            where_clause.push("views >= ").push_bind_unseparated(views);
        },
        (None, Some(sales)) => {
            where_clause.push("sales >= ").push_bind_unseparated(sales);
        },
        (None, None) => {},
    }
    let ordering = match filter.ordering {
        ProductOrdering::Newest => " ORDER BY created_at DESC, id DESC",
        ProductOrdering::MostViewed => " ORDER BY views DESC, sales DESC, id DESC",
        ProductOrdering::BestSelling => " ORDER BY sales DESC, id DESC",
    };
    builder.push(ordering);
    if let Some(limit) = filter.limit {
        builder.push(" LIMIT ").push_bind(limit);
    }
    trace!("🗃️ Executing query: {}", builder.sql());
    builder.build_query_as::<Product>().fetch_all(conn).await
}

pub async fn increment_views(product_id: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    sqlx::query("UPDATE products SET views = views + 1 WHERE id = $1").bind(product_id).execute(conn).await?;
    Ok(())
}

/// Takes `quantity` units out of stock (never below zero) and counts them as sold. Products that have since been
/// deleted are skipped.
pub async fn record_sale(product_id: i64, quantity: i64, conn: &mut SqliteConnection) -> Result<(), sqlx::Error> {
    let result = sqlx::query(
        "UPDATE products SET stock = MAX(stock - $1, 0), sales = sales + $1, updated_at = $2 WHERE id = $3",
    )
    .bind(quantity)
    .bind(Utc::now())
    .bind(product_id)
    .execute(conn)
    .await?;
    if result.rows_affected() == 0 {
        debug!("🗃️ Product #{product_id} no longer exists. Sale of {quantity} not recorded against stock.");
    }
    Ok(())
}
