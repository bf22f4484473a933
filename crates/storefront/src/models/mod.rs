//! Session-held models for the storefront.
//!
//! Everything the browser-side app used to keep in local storage lives in
//! the visitor's session under the keys in [`session_keys`].

pub mod location;
pub mod session;

pub use location::{Coordinates, LocationState};
pub use session::{CurrentShopper, keys as session_keys};
