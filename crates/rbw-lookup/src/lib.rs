//! rbw-lookup - Retrieve secrets from rbw as structured data
//!
//! Thin adapter around the `rbw` Bitwarden client: check that the vault is
//! unlocked, fetch a record per search term with `rbw get --raw`, and pull a
//! requested field out of each record.

pub mod client;
pub mod error;
pub mod lookup;
pub mod resolve;

pub use client::{Fetched, RbwClient, Vault};
pub use error::LookupError;
pub use lookup::{flatten, lookup};
pub use resolve::{resolve_field, Location};
