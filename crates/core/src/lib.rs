//! Vegi Shop Core - Shared domain types and logic.
//!
//! This crate provides the types used across all Vegi Shop components:
//! - `storefront` - Public JSON API (catalog, cart, checkout, auth)
//! - `admin` - Back-office JSON API (catalog management, orders)
//! - `cli` - Migrations, seeding, admin user management
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no database access,
//! no HTTP clients. The optional `postgres` feature adds sqlx encode/decode
//! implementations so the same types can be bound directly in queries.
//!
//! # Modules
//!
//! - [`types`] - Typed IDs, emails, prices, slugs, roles, statuses, addresses
//! - [`cart`] - Cart lines and the optimistic cart state machine
//! - [`shop`] - Shop listing parameters, sorting and pagination
//! - [`password`] - Password policy and Argon2id hashing

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod password;
pub mod shop;
pub mod types;

pub use types::*;
