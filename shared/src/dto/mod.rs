//! # Data Transfer Objects (DTOs)
//!
//! Values handed from the wallet facade to the rest of the application.
//!
//! ## Module Organization
//!
//! - [`wallet`] - Connection outcomes, transaction outcomes and wallet snapshots
//!
//! ## Serialization Format
//!
//! - **Field naming**: camelCase (`transactionHash`, `canInteract`)
//! - **Optional fields**: Omitted when `None` using `#[serde(skip_serializing_if = "Option::is_none")]`
//! - **Enums**: Serialize to camelCase strings (`hostFrame`, `injected`, `none`)

pub mod wallet;

pub use wallet::*;
