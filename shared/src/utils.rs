//! # Shared Utility Functions
//!
//! ## Address Formatting
//!
//! Functions for formatting EVM account addresses for display:
//! - [`format_address`] - Keep the first N and last M characters, join with an ellipsis
//! - [`short_address`] - `0x` plus four hex characters on each side
//!
//! ## Usage
//!
//! ```rust
//! use shared::utils::short_address;
//!
//! let address = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
//! assert_eq!(short_address(address), "0x5aAe...eAed");
//! ```

/// Format an address by showing the first `prefix_len` and last `suffix_len` characters.
///
/// If the address is shorter than `prefix_len + suffix_len`, it is returned as-is.
///
/// # Examples
///
/// ```rust
/// use shared::utils::format_address;
///
/// let addr = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
/// assert_eq!(format_address(addr, 6, 4), "0x5aAe...eAed");
/// assert_eq!(format_address("0x1234", 6, 4), "0x1234");
/// ```
pub fn format_address(address: &str, prefix_len: usize, suffix_len: usize) -> String {
    let address_len = address.len();

    if address_len <= prefix_len + suffix_len || !address.is_ascii() {
        return address.to_string();
    }

    format!("{}...{}", &address[..prefix_len], &address[address_len - suffix_len..])
}

/// Display form used across the UI: `0x1234...abcd`.
pub fn short_address(address: &str) -> String {
    format_address(address, 6, 4)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_address() {
        let addr = "0x5aAeb6053F3E94C9b9A09f33669435E7Ef1BeAed";
        assert_eq!(format_address(addr, 6, 4), "0x5aAe...eAed");
        assert_eq!(format_address(addr, 4, 2), "0x5a...ed");
    }

    #[test]
    fn test_format_address_short() {
        assert_eq!(format_address("0x12", 6, 4), "0x12");
        assert_eq!(short_address(""), "");
    }

    #[test]
    fn test_short_address() {
        let addr = "0xfB6916095ca1df60bB79Ce92cE3Ea74c37c5d359";
        assert_eq!(short_address(addr), "0xfB69...d359");
    }
}
