//! Shopping carts for signed-in users and guest sessions.
//!
//! Every read re-validates the cart against live stock. Quantities above the available stock are reduced, and lines
//! that drop to zero (or whose product no longer exists) are removed. A cart with no lines left is deleted.
use std::fmt::Debug;

use log::*;
use uuid::Uuid;

use crate::{
    cart_objects::{cart_lines, CartResult, CartView, SyncItem},
    db_types::{Cart, CartItem, CartOwner, Product},
    traits::{CartError, CartManagement, CatalogManagement},
};

pub struct CartApi<B> {
    db: B,
}

impl<B: Debug> Debug for CartApi<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "CartApi ({:?})", self.db)
    }
}

impl<B> CartApi<B>
where B: CartManagement + CatalogManagement
{
    pub fn new(db: B) -> Self {
        Self { db }
    }

    /// Adds `quantity` of a product, merging with an existing line. A guest without a session gets a new one, which
    /// is returned in the result.
    pub async fn add_item(
        &self,
        user_id: Option<i64>,
        session_id: Option<String>,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartResult, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        let product = self.live_product(product_id).await?;
        check_stock(&product, quantity)?;
        let owner = owner_or_new_session(user_id, session_id);
        let mut items = self.db.fetch_cart(&owner).await?.map(|c| c.items).unwrap_or_default();
        match items.iter_mut().find(|i| i.product_id == product_id) {
            Some(item) => {
                let merged = item.quantity + quantity;
                check_stock(&product, merged)?;
                item.quantity = merged;
            },
            None => items.push(CartItem::new(product_id, quantity, product.price)),
        }
        let cart = self.db.save_cart(&owner, items).await?;
        debug!("🛒️ Added {quantity} x product #{product_id} to the cart of {owner}");
        self.view_result(cart, &owner).await
    }

    /// Sets the quantity of a line that is already in the cart.
    pub async fn update_item(
        &self,
        user_id: Option<i64>,
        session_id: Option<String>,
        product_id: i64,
        quantity: i64,
    ) -> Result<CartResult, CartError> {
        if quantity < 1 {
            return Err(CartError::InvalidQuantity);
        }
        let product = self.live_product(product_id).await?;
        check_stock(&product, quantity)?;
        let owner = owner_or_new_session(user_id, session_id);
        let mut cart = self.db.fetch_cart(&owner).await?.ok_or(CartError::CartNotFound)?;
        let item = cart
            .items
            .iter_mut()
            .find(|i| i.product_id == product_id)
            .ok_or(CartError::ItemNotInCart(product_id))?;
        item.quantity = quantity;
        let cart = self.db.save_cart(&owner, cart.items).await?;
        self.view_result(cart, &owner).await
    }

    /// Removes a line. The cart is deleted if it was the last one.
    pub async fn remove_item(
        &self,
        user_id: Option<i64>,
        session_id: Option<String>,
        product_id: i64,
    ) -> Result<CartResult, CartError> {
        let owner = owner_or_new_session(user_id, session_id);
        let mut cart = self.db.fetch_cart(&owner).await?.ok_or(CartError::CartNotFound)?;
        let before = cart.items.len();
        cart.items.retain(|i| i.product_id != product_id);
        if cart.items.len() == before {
            return Err(CartError::ItemNotInCart(product_id));
        }
        let cart = self.db.save_cart(&owner, cart.items).await?;
        if cart.is_none() {
            debug!("🛒️ Cart of {owner} is now empty and was deleted");
        }
        self.view_result(cart, &owner).await
    }

    /// Fetches the cart, bringing it in line with live stock first. Any adjustment is persisted.
    pub async fn get_cart(&self, user_id: Option<i64>, session_id: Option<String>) -> Result<CartResult, CartError> {
        let owner = existing_owner(user_id, session_id)?;
        let Some(cart) = self.db.fetch_cart(&owner).await? else {
            return Ok(CartResult::new(CartView::empty(), owner.session_id().map(String::from)));
        };
        let (cart, products, adjusted) = self.reconcile(&owner, cart.items).await?;
        let view = cart.as_ref().map(|c| CartView::from_lines(cart_lines(c, &products))).unwrap_or_default();
        Ok(CartResult::new(view, owner.session_id().map(String::from)).with_adjusted(adjusted))
    }

    /// Replaces the cart with the client's copy. Every product must exist and have enough stock. Lines are stored
    /// at the live price, and `has_price_changes` reports whether any client price was stale.
    pub async fn sync_cart(
        &self,
        user_id: Option<i64>,
        session_id: Option<String>,
        items: Vec<SyncItem>,
    ) -> Result<CartResult, CartError> {
        if items.is_empty() {
            return Err(CartError::EmptyItems);
        }
        let owner = owner_or_new_session(user_id, session_id);
        let mut has_price_changes = false;
        let mut validated: Vec<CartItem> = Vec::with_capacity(items.len());
        for item in items {
            let product = self.live_product(item.product_id).await?;
            if product.price != item.price {
                warn!("🛒️ Price changed for {}: {} -> {}", product.title, item.price, product.price);
                has_price_changes = true;
            }
            if item.quantity < 1 {
                return Err(CartError::InvalidQuantity);
            }
            check_stock(&product, item.quantity)?;
            match validated.iter_mut().find(|i| i.product_id == item.product_id) {
                Some(existing) => existing.quantity += item.quantity,
                None => validated.push(CartItem::new(product.id, item.quantity, product.price)),
            }
        }
        let (cart, products, adjusted) = self.reconcile(&owner, validated).await?;
        let view = cart.as_ref().map(|c| CartView::from_lines(cart_lines(c, &products))).unwrap_or_default();
        info!("🛒️ Synced cart for {owner} ({} line(s))", view.items.len());
        Ok(CartResult::new(view, owner.session_id().map(String::from))
            .with_adjusted(adjusted)
            .with_price_changes(has_price_changes))
    }

    pub async fn clear_cart(&self, owner: &CartOwner) -> Result<bool, CartError> {
        self.db.delete_cart(owner).await
    }

    async fn live_product(&self, product_id: i64) -> Result<Product, CartError> {
        self.db.fetch_product(product_id).await?.ok_or(CartError::ProductNotFound(product_id))
    }

    async fn products_for(&self, items: &[CartItem]) -> Result<Vec<Product>, CartError> {
        let mut products = Vec::with_capacity(items.len());
        for item in items {
            if let Some(p) = self.db.fetch_product(item.product_id).await? {
                products.push(p);
            }
        }
        Ok(products)
    }

    /// Clamps `items` to live stock and saves the result. Returns the saved cart (`None` if it ended up empty), the
    /// products it references and whether anything was adjusted.
    async fn reconcile(
        &self,
        owner: &CartOwner,
        items: Vec<CartItem>,
    ) -> Result<(Option<Cart>, Vec<Product>, bool), CartError> {
        let products = self.products_for(&items).await?;
        let (items, adjusted) = reconcile_with_stock(items, &products);
        if adjusted {
            info!("🛒️ Cart of {owner} was adjusted to match available stock");
        }
        let cart = self.db.save_cart(owner, items).await?;
        Ok((cart, products, adjusted))
    }

    async fn view_result(&self, cart: Option<Cart>, owner: &CartOwner) -> Result<CartResult, CartError> {
        let view = match cart {
            Some(cart) => {
                let products = self.products_for(&cart.items).await?;
                CartView::from_lines(cart_lines(&cart, &products))
            },
            None => CartView::empty(),
        };
        Ok(CartResult::new(view, owner.session_id().map(String::from)))
    }
}

/// Brings cart lines in line with current stock.
///
/// Quantities above a product's stock are reduced to the stock level. Lines left with zero quantity, and lines whose
/// product is not in `products`, are dropped. Returns the surviving lines and whether anything changed.
pub fn reconcile_with_stock(items: Vec<CartItem>, products: &[Product]) -> (Vec<CartItem>, bool) {
    let mut adjusted = false;
    let items = items
        .into_iter()
        .filter_map(|mut item| {
            let Some(product) = products.iter().find(|p| p.id == item.product_id) else {
                adjusted = true;
                return None;
            };
            let available = product.stock.max(0);
            if item.quantity > available {
                trace!("🛒️ Clamping product #{} from {} to {available}", item.product_id, item.quantity);
                item.quantity = available;
                adjusted = true;
            }
            if item.quantity <= 0 {
                adjusted = true;
                None
            } else {
                Some(item)
            }
        })
        .collect();
    (items, adjusted)
}

fn check_stock(product: &Product, quantity: i64) -> Result<(), CartError> {
    if quantity > product.stock {
        Err(CartError::InsufficientStock { title: product.title.clone(), available: product.stock })
    } else {
        Ok(())
    }
}

fn owner_or_new_session(user_id: Option<i64>, session_id: Option<String>) -> CartOwner {
    CartOwner::from_columns(user_id, session_id).unwrap_or_else(|| {
        let session = Uuid::new_v4().to_string();
        debug!("🛒️ Starting new guest session {session}");
        CartOwner::Guest(session)
    })
}

fn existing_owner(user_id: Option<i64>, session_id: Option<String>) -> Result<CartOwner, CartError> {
    CartOwner::from_columns(user_id, session_id).ok_or(CartError::MissingOwner)
}
