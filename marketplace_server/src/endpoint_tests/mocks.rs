use chrono::{DateTime, Utc};
use marketplace_engine::{
    db_types::{
        Cart,
        CartItem,
        CartOwner,
        NewOrder,
        NewProduct,
        NewSeller,
        NewUser,
        Order,
        PaymentStatus,
        PayoutDetails,
        Product,
        ProductUpdate,
        Seller,
        SellerProfileUpdate,
        SellerStats,
        User,
    },
    traits::{
        AccountError,
        AccountManagement,
        BankInfo,
        CartError,
        CartManagement,
        CatalogError,
        CatalogManagement,
        ChargeAuthorization,
        ChargeRequest,
        ChargeVerification,
        GatewayError,
        GatewayMode,
        MarketplaceDatabase,
        OrderManagement,
        OrderManagementError,
        PaymentGateway,
        ProductQueryFilter,
        RecipientRequest,
        ResolvedAccount,
        TransferReceipt,
        TransferRequest,
    },
};
use mockall::mock;

mock! {
    pub MarketDb {}
    impl Clone for MarketDb {
        fn clone(&self) -> Self;
    }
    impl CatalogManagement for MarketDb {
        async fn insert_product(&self, seller_id: i64, product: NewProduct) -> Result<Product, CatalogError>;
        async fn update_product(&self, seller_id: i64, product_id: i64, update: ProductUpdate) -> Result<Option<Product>, CatalogError>;
        async fn delete_product(&self, seller_id: i64, product_id: i64) -> Result<bool, CatalogError>;
        async fn fetch_product(&self, product_id: i64) -> Result<Option<Product>, CatalogError>;
        async fn fetch_products(&self, filter: ProductQueryFilter) -> Result<Vec<Product>, CatalogError>;
        async fn increment_product_views(&self, product_id: i64) -> Result<(), CatalogError>;
    }
    impl CartManagement for MarketDb {
        async fn fetch_cart(&self, owner: &CartOwner) -> Result<Option<Cart>, CartError>;
        async fn save_cart(&self, owner: &CartOwner, items: Vec<CartItem>) -> Result<Option<Cart>, CartError>;
        async fn delete_cart(&self, owner: &CartOwner) -> Result<bool, CartError>;
    }
    impl OrderManagement for MarketDb {
        async fn insert_order(&self, order: NewOrder) -> Result<Order, OrderManagementError>;
        async fn fetch_order(&self, order_id: i64) -> Result<Option<Order>, OrderManagementError>;
        async fn fetch_order_by_reference(&self, reference: &str) -> Result<Option<Order>, OrderManagementError>;
        async fn set_payment_reference(&self, order_id: i64, reference: &str, authorization_url: &str) -> Result<Order, OrderManagementError>;
        async fn mark_order_on_hold(&self, order_id: i64, confirmed_at: DateTime<Utc>) -> Result<Order, OrderManagementError>;
        async fn mark_order_failed(&self, order_id: i64) -> Result<Order, OrderManagementError>;
        async fn claim_payout(&self, order_id: i64, started_at: DateTime<Utc>) -> Result<bool, OrderManagementError>;
        async fn release_payout(&self, order_id: i64) -> Result<(), OrderManagementError>;
        async fn mark_order_paid(&self, order_id: i64, paid_at: DateTime<Utc>) -> Result<Order, OrderManagementError>;
        async fn fetch_orders_for_user(&self, user_id: i64) -> Result<Vec<Order>, OrderManagementError>;
        async fn fetch_orders_for_seller(&self, seller_id: i64, status: Option<PaymentStatus>) -> Result<Vec<Order>, OrderManagementError>;
        async fn fetch_stale_pending_orders(&self, cutoff: DateTime<Utc>) -> Result<Vec<Order>, OrderManagementError>;
    }
    impl AccountManagement for MarketDb {
        async fn insert_user(&self, user: NewUser) -> Result<User, AccountError>;
        async fn fetch_user(&self, user_id: i64) -> Result<Option<User>, AccountError>;
        async fn insert_seller(&self, seller: NewSeller) -> Result<Seller, AccountError>;
        async fn fetch_seller(&self, seller_id: i64) -> Result<Option<Seller>, AccountError>;
        async fn fetch_seller_by_email(&self, email: &str) -> Result<Option<Seller>, AccountError>;
        async fn update_seller_profile(&self, seller_id: i64, update: SellerProfileUpdate) -> Result<Option<Seller>, AccountError>;
        async fn set_seller_payout_details(&self, seller_id: i64, details: PayoutDetails) -> Result<Seller, AccountError>;
        async fn fetch_seller_stats(&self, seller_id: i64) -> Result<SellerStats, AccountError>;
    }
    impl MarketplaceDatabase for MarketDb {
        fn url(&self) -> &str;
    }
}

mock! {
    pub Gateway {}
    impl PaymentGateway for Gateway {
        fn mode(&self) -> GatewayMode;
        async fn initialize_charge(&self, request: ChargeRequest) -> Result<ChargeAuthorization, GatewayError>;
        async fn verify_charge(&self, reference: &str) -> Result<ChargeVerification, GatewayError>;
        async fn transfer(&self, request: TransferRequest) -> Result<TransferReceipt, GatewayError>;
        async fn list_banks(&self) -> Result<Vec<BankInfo>, GatewayError>;
        async fn resolve_account(&self, account_number: &str, bank_code: &str) -> Result<ResolvedAccount, GatewayError>;
        async fn create_recipient(&self, request: RecipientRequest) -> Result<String, GatewayError>;
    }
}
