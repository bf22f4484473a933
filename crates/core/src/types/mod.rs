//! Core types for FreshCart.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod id;
pub mod item_key;
pub mod pincode;
pub mod price;
pub mod status;

pub use id::*;
pub use item_key::ItemKey;
pub use pincode::{Pincode, PincodeError};
pub use price::{MAX_UNIT_PRICE, Money, display_amount, is_valid_unit_price};
pub use status::*;
