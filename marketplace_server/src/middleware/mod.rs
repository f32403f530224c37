mod acl;
mod auth;
mod hmac;

pub use acl::{AclMiddlewareFactory, AclMiddlewareService};
pub use auth::{AuthMiddlewareFactory, AuthMiddlewareService};
pub use hmac::{HmacMiddlewareFactory, HmacMiddlewareService};
