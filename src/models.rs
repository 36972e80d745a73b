/// Core data types shared across the wallet session modules.

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

// ============================================================================
// SESSION STATUS
// ============================================================================

/// Lifecycle status of the wallet session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    #[default]
    Disconnected,
    Connecting,
    Connected,
}

impl SessionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            SessionStatus::Disconnected => "disconnected",
            SessionStatus::Connecting => "connecting",
            SessionStatus::Connected => "connected",
        }
    }
}

// ============================================================================
// CREDENTIALS
// ============================================================================

/// Which credential scheme a session was opened with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CredentialKind {
    /// Mnemonic-phrase signer, derived locally against a fixed network
    Mnemonic,
    /// Browser-injected signer (requires a user approval prompt)
    Injected,
    /// Email-linked custodial signer
    EmailLink,
}

impl CredentialKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            CredentialKind::Mnemonic => "mnemonic",
            CredentialKind::Injected => "injected",
            CredentialKind::EmailLink => "email-link",
        }
    }
}

/// Credential captured for a single login attempt. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Credential {
    Mnemonic { phrase: String },
    Injected,
    EmailLink { email: String },
}

impl Credential {
    pub fn kind(&self) -> CredentialKind {
        match self {
            Credential::Mnemonic { .. } => CredentialKind::Mnemonic,
            Credential::Injected => CredentialKind::Injected,
            Credential::EmailLink { .. } => CredentialKind::EmailLink,
        }
    }
}

// ============================================================================
// ASSETS
// ============================================================================

/// A fungible token known to the L2 system. The asset set is fetched once
/// per session and treated as immutable for the session's lifetime.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Asset {
    /// Display symbol, e.g. "ETH"
    pub symbol: String,
    /// Human decimal precision (smallest-unit digits)
    pub decimals: u32,
    /// L1 contract reference. Absent for the native asset.
    pub l1_contract: Option<String>,
}

impl Asset {
    pub fn is_native(&self) -> bool {
        self.l1_contract.is_none()
    }
}

// ============================================================================
// ACCOUNT STATE
// ============================================================================

/// Committed L2 account state, as reported by the L2 client.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AccountState {
    /// Committed smallest-unit balances per asset symbol
    pub committed_balances: HashMap<String, u128>,
    /// Whether the on-chain signing key has been registered
    pub signing_key_set: bool,
}

impl AccountState {
    /// True if at least one asset holds a non-zero committed balance.
    /// Provisioning requires paying an L2 fee, so an empty account cannot
    /// register a signing key.
    pub fn has_committed_funds(&self) -> bool {
        self.committed_balances.values().any(|b| *b > 0)
    }
}

// ============================================================================
// OPERATIONS
// ============================================================================

/// Kind of an L2-visible value operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OperationKind {
    Deposit,
    Withdraw,
    Transfer,
    SetSigningKey,
}

impl OperationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            OperationKind::Deposit => "Deposit",
            OperationKind::Withdraw => "Withdraw",
            OperationKind::Transfer => "Transfer",
            OperationKind::SetSigningKey => "SetSigningKey",
        }
    }
}

/// A fully-parameterised operation ready for submission. Amounts and fees
/// are smallest-unit integers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    /// Move value from L1 into the L2 account. Cost is paid as L1 gas,
    /// outside this system's accounting, so there is no fee field.
    Deposit { to: String, symbol: String, amount: u128 },
    /// Move value from the L2 account back to an L1 address
    Withdraw { to: String, symbol: String, amount: u128, fee: u128 },
    /// Move value within L2. The amount must already be packable.
    Transfer { to: String, symbol: String, amount: u128, fee: u128 },
    /// Register the account's L2 signing key
    SetSigningKey,
}

impl Operation {
    pub fn kind(&self) -> OperationKind {
        match self {
            Operation::Deposit { .. } => OperationKind::Deposit,
            Operation::Withdraw { .. } => OperationKind::Withdraw,
            Operation::Transfer { .. } => OperationKind::Transfer,
            Operation::SetSigningKey => OperationKind::SetSigningKey,
        }
    }
}

// ============================================================================
// RECEIPTS
// ============================================================================

/// Confirmation result for a submitted operation, at either depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Receipt {
    /// L2 block the operation was included in, if known
    pub block: Option<u64>,
    /// Whether the operation executed successfully
    pub success: bool,
    /// Failure reason reported by the network
    pub fail_reason: Option<String>,
}

impl Receipt {
    pub fn success(block: u64) -> Self {
        Receipt { block: Some(block), success: true, fail_reason: None }
    }

    pub fn failure(reason: &str) -> Self {
        Receipt { block: None, success: false, fail_reason: Some(reason.to_string()) }
    }
}

// ============================================================================
// TRANSFER DRAFT & OUTCOME
// ============================================================================

/// User-entered draft for the next deposit/withdraw/transfer. Ephemeral:
/// reset to the empty default immediately after submission, independent of
/// whether confirmation has completed. The selected symbol survives a reset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferIntent {
    /// Destination address
    pub to: String,
    /// Decimal amount string, unvalidated until submission
    pub amount: String,
    /// Selected asset symbol
    pub symbol: String,
}

impl TransferIntent {
    pub fn new(symbol: &str) -> Self {
        TransferIntent {
            to: "0x".to_string(),
            amount: "0".to_string(),
            symbol: symbol.to_string(),
        }
    }

    /// Clear destination and amount, keeping the selected asset.
    pub fn reset(&mut self) {
        self.to = "0x".to_string();
        self.amount = "0".to_string();
    }
}

impl Default for TransferIntent {
    fn default() -> Self {
        TransferIntent::new("ETH")
    }
}

/// Result of a completed (submitted and confirmed) operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub kind: OperationKind,
    pub tx_hash: String,
    pub receipt: Receipt,
}

// ============================================================================
// LAYERS
// ============================================================================

/// Which ledger a balance entry belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Layer {
    L1,
    L2,
}

impl Layer {
    pub fn as_str(&self) -> &'static str {
        match self {
            Layer::L1 => "L1",
            Layer::L2 => "L2",
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credential_kind() {
        assert_eq!(Credential::Mnemonic { phrase: "test".into() }.kind(), CredentialKind::Mnemonic);
        assert_eq!(Credential::Injected.kind(), CredentialKind::Injected);
        assert_eq!(
            Credential::EmailLink { email: "a@b.c".into() }.kind(),
            CredentialKind::EmailLink
        );
    }

    #[test]
    fn test_account_state_committed_funds() {
        let mut state = AccountState::default();
        assert!(!state.has_committed_funds());

        state.committed_balances.insert("ETH".into(), 0);
        assert!(!state.has_committed_funds());

        state.committed_balances.insert("DAI".into(), 1);
        assert!(state.has_committed_funds());
    }

    #[test]
    fn test_intent_reset_keeps_symbol() {
        let mut intent = TransferIntent {
            to: "0xabc".into(),
            amount: "1.5".into(),
            symbol: "DAI".into(),
        };
        intent.reset();
        assert_eq!(intent.to, "0x");
        assert_eq!(intent.amount, "0");
        assert_eq!(intent.symbol, "DAI");
    }

    #[test]
    fn test_status_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&SessionStatus::Connected).unwrap(), "\"connected\"");
        assert_eq!(serde_json::to_string(&CredentialKind::EmailLink).unwrap(), "\"emaillink\"");
    }

    #[test]
    fn test_asset_native() {
        let eth = Asset { symbol: "ETH".into(), decimals: 18, l1_contract: None };
        let dai = Asset { symbol: "DAI".into(), decimals: 18, l1_contract: Some("0xdai".into()) };
        assert!(eth.is_native());
        assert!(!dai.is_native());
    }

    #[test]
    fn test_operation_kind() {
        let op = Operation::Withdraw { to: "0x1".into(), symbol: "ETH".into(), amount: 10, fee: 1 };
        assert_eq!(op.kind(), OperationKind::Withdraw);
        assert_eq!(op.kind().as_str(), "Withdraw");
    }
}
