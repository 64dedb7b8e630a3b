//! Yousuf Rice Core - Shared domain library.
//!
//! This crate provides the types and pure logic used by every Yousuf Rice
//! component:
//! - `storefront` - Public shop API (catalog, cart, checkout, tracking)
//! - `admin` - Staff panel API (orders, products, analytics)
//! - `cli` - Command-line tools for migrations, admin users and seeding
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no
//! backend access, no HTTP clients. Every rule that decides money or order
//! state lives here so it can be tested without a network.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, prices, phone numbers and status enums
//! - [`pricing`] - Weight tiers and bulk discount bands
//! - [`cart`] - The cart aggregate
//! - [`checkout`] - Checkout validation, delivery fee and order drafts
//! - [`analytics`] - Event schema and summary reduction
//! - [`models`] - Records for each backend table

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod cart;
pub mod checkout;
pub mod models;
pub mod pricing;
pub mod types;

pub use types::*;
