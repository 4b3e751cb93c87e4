//! Business logic services for the storefront.

pub mod auth;
pub mod google;

pub use auth::{AuthError, AuthService, Registration};
pub use google::{GoogleClient, GoogleError, GoogleProfile};
