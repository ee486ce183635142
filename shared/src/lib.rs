//! # Shared Wallet DTO Library
//!
//! This library defines the contract between the wallet core and whatever UI layer
//! sits on top of it (web view, Mini App frame, diagnostics tooling). Every value that
//! crosses the facade boundary is one of these plain, serializable structs.
//!
//! ## Structure
//!
//! - **[`dto`]**: Data Transfer Objects returned by the unified wallet connection
//!   - **[`dto::wallet`]**: connect results, transaction results, wallet snapshots
//! - **[`utils`]**: Shared utility functions
//!   - **[`utils::short_address`]**: Format EVM addresses for display
//!
//! ## Wire Format
//!
//! DTOs serialize with **camelCase** field names so they line up with the shape
//! the application's JavaScript consumers already expect:
//!
//! ```text
//! { "success": true, "transactionHash": "0xabc..." }
//! { "success": false, "error": "Please connect your wallet using the Connect button" }
//! ```
//!
//! Optional fields are omitted when `None`.
//!
//! ## Usage
//!
//! ```rust
//! use shared::dto::wallet::TransactionResult;
//!
//! let failed = TransactionResult::failure("Transaction rejected: user denied");
//! assert!(!failed.success);
//! assert_eq!(
//!     serde_json::to_string(&failed).unwrap(),
//!     r#"{"success":false,"error":"Transaction rejected: user denied"}"#
//! );
//! ```

pub mod dto;
pub mod utils;

// Re-export commonly used types for convenience
pub use dto::*;
pub use utils::*;
