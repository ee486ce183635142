//! # Evermarks Actions
//!
//! Staking, voting and reward flows built purely on the unified facade. Contract
//! semantics are not checked here: calls are encoded and routed, and whatever the
//! contract or wallet says comes back in the [`ActionReport`].
//!
//! Wrapping EMARK into WEMARK may need an allowance first, so [`EvermarkActions::wrap`]
//! plans either `approve + wrap` (fail-fast batch) or a single `wrap`.

use alloy_primitives::{Address, U256};
use alloy_sol_types::{sol, SolCall};
use lib_core::{ContractAddresses, WalletError};
use shared::TransactionResult;
use std::sync::Arc;
use tracing::{info, instrument, warn};

use crate::erc20;
use crate::types::TransactionRequest;
use crate::unified::UnifiedWalletConnection;

sol! {
    interface IWEMARK {
        function wrap(uint256 amount) external;
        function startUnbonding(uint256 amount) external;
        function withdraw() external;
        function cancelUnbonding() external;
    }

    interface IEvermarkVoting {
        function voteForEvermark(uint256 evermarkId, uint256 votes) external;
    }

    interface IEvermarkRewards {
        function claimRewards() external;
    }
}

/// Planned steps and the trace of what actually ran.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionReport {
    pub planned: usize,
    pub results: Vec<TransactionResult>,
}

impl ActionReport {
    fn rejected(err: WalletError) -> Self {
        Self {
            planned: 1,
            results: vec![TransactionResult::failure(err.user_message())],
        }
    }

    /// Every planned step ran and succeeded. A short trace means the batch stopped early.
    pub fn completed(&self) -> bool {
        self.results.len() == self.planned && self.results.iter().all(|r| r.success)
    }

    pub fn error(&self) -> Option<&str> {
        self.results.iter().find_map(|r| r.error.as_deref())
    }

    pub fn transaction_hashes(&self) -> Vec<&str> {
        self.results
            .iter()
            .filter_map(|r| r.transaction_hash.as_deref())
            .collect()
    }
}

pub struct EvermarkActions {
    wallet: Arc<UnifiedWalletConnection>,
    contracts: ContractAddresses,
}

impl EvermarkActions {
    pub fn new(wallet: Arc<UnifiedWalletConnection>) -> Self {
        let contracts = wallet.config().contracts.clone();
        Self { wallet, contracts }
    }

    pub fn with_contracts(wallet: Arc<UnifiedWalletConnection>, contracts: ContractAddresses) -> Self {
        Self { wallet, contracts }
    }

    /// Wrap `amount` EMARK into WEMARK, approving the wrapper first when the
    /// allowance is short.
    #[instrument(skip(self))]
    pub async fn wrap(&self, amount: U256) -> ActionReport {
        let (token, wemark) = match (
            require(self.contracts.emark_token, "EMARK_TOKEN_ADDRESS"),
            require(self.contracts.wemark, "WEMARK_ADDRESS"),
        ) {
            (Ok(token), Ok(wemark)) => (token, wemark),
            (Err(e), _) | (_, Err(e)) => return ActionReport::rejected(e),
        };
        if amount.is_zero() {
            return ActionReport::rejected(WalletError::InvalidInput("Amount must be greater than 0".into()));
        }

        let gate = self.wallet.require_connection().await;
        let owner = match (gate.success, self.wallet.address()) {
            (true, Some(owner)) => owner,
            _ => {
                let message = gate.error.unwrap_or_else(|| WalletError::NotConnected.user_message());
                return ActionReport {
                    planned: 1,
                    results: vec![TransactionResult::failure(message)],
                };
            }
        };

        let wrap = TransactionRequest::new(wemark, IWEMARK::wrapCall { amount }.abi_encode());
        let allowance = self.wallet.check_allowance(token, owner, wemark).await;

        let requests = if allowance < amount {
            info!(%allowance, "Allowance short; approving before wrap");
            vec![erc20::approve_request(token, wemark, amount), wrap]
        } else {
            vec![wrap]
        };

        let report = ActionReport {
            planned: requests.len(),
            results: self.wallet.batch_transactions(&requests).await,
        };
        if !report.completed() {
            warn!(
                ran = report.results.len(),
                planned = report.planned,
                "Wrap did not complete"
            );
        }
        report
    }

    /// Start the unbonding cooldown for `amount` WEMARK.
    pub async fn request_unwrap(&self, amount: U256) -> ActionReport {
        if amount.is_zero() {
            return ActionReport::rejected(WalletError::InvalidInput("Amount must be greater than 0".into()));
        }
        self.single(self.contracts.wemark, "WEMARK_ADDRESS", IWEMARK::startUnbondingCall { amount }.abi_encode())
            .await
    }

    /// Withdraw EMARK once the cooldown has elapsed.
    pub async fn complete_unwrap(&self) -> ActionReport {
        self.single(self.contracts.wemark, "WEMARK_ADDRESS", IWEMARK::withdrawCall {}.abi_encode())
            .await
    }

    pub async fn cancel_unbonding(&self) -> ActionReport {
        self.single(self.contracts.wemark, "WEMARK_ADDRESS", IWEMARK::cancelUnbondingCall {}.abi_encode())
            .await
    }

    #[instrument(skip(self))]
    pub async fn vote(&self, evermark_id: U256, votes: U256) -> ActionReport {
        if votes.is_zero() {
            return ActionReport::rejected(WalletError::InvalidInput("Vote amount must be greater than 0".into()));
        }
        let data = IEvermarkVoting::voteForEvermarkCall {
            evermarkId: evermark_id,
            votes,
        }
        .abi_encode();
        self.single(self.contracts.voting, "EVERMARK_VOTING_ADDRESS", data).await
    }

    pub async fn claim_rewards(&self) -> ActionReport {
        self.single(
            self.contracts.rewards,
            "EVERMARK_REWARDS_ADDRESS",
            IEvermarkRewards::claimRewardsCall {}.abi_encode(),
        )
        .await
    }

    async fn single(&self, target: Option<Address>, name: &'static str, data: Vec<u8>) -> ActionReport {
        let to = match require(target, name) {
            Ok(to) => to,
            Err(e) => return ActionReport::rejected(e),
        };
        ActionReport {
            planned: 1,
            results: vec![self.wallet.send_transaction(&TransactionRequest::new(to, data)).await],
        }
    }
}

fn require(address: Option<Address>, name: &'static str) -> Result<Address, WalletError> {
    address.ok_or_else(|| WalletError::Config(format!("{name} is not configured")))
}
