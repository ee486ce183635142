//! ERC-20 call encoding.
//!
//! Raw calldata only; the host-frame transaction path cannot use a contract SDK.

use alloy_primitives::{Address, Bytes, U256};
use alloy_sol_types::{sol, SolCall};
use lib_core::{Result, WalletError};

use crate::types::TransactionRequest;

sol! {
    interface IERC20 {
        function approve(address spender, uint256 amount) external returns (bool);
        function allowance(address owner, address spender) external view returns (uint256);
    }
}

pub fn encode_approve(spender: Address, amount: U256) -> Bytes {
    IERC20::approveCall { spender, amount }.abi_encode().into()
}

pub fn encode_allowance(owner: Address, spender: Address) -> Bytes {
    IERC20::allowanceCall { owner, spender }.abi_encode().into()
}

/// Decode the raw `eth_call` output of `allowance`.
pub fn decode_allowance(output: &[u8]) -> Result<U256> {
    IERC20::allowanceCall::abi_decode_returns(output)
        .map_err(|e| WalletError::ReadFailure(format!("allowance output: {e}")))
}

/// `approve(spender, amount)` on `token`.
pub fn approve_request(token: Address, spender: Address, amount: U256) -> TransactionRequest {
    TransactionRequest::new(token, encode_approve(spender, amount))
}
