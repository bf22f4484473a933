//! FreshCart Core - Shared domain types.
//!
//! This crate provides the types used across all FreshCart components:
//! - `storefront` - Backend-for-frontend service for the grocery storefront
//! - `cli` - Command-line tools for probing the grocery backend
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype ids, the composite cart/wishlist key, validated
//!   pincodes, and delivery/payment enums

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
