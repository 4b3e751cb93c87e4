//! Core types for Vegi Shop.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod address;
pub mod email;
pub mod id;
pub mod image;
pub mod price;
pub mod slug;
pub mod status;

pub use address::{NutritionalInfo, ShippingAddress};
pub use email::{Email, EmailError};
pub use id::*;
pub use image::ProductImage;
pub use price::{Price, PriceError};
pub use slug::{Slug, SlugError};
pub use status::*;
