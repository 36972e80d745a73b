/// Error taxonomy for the wallet session core.
///
/// Propagation policy:
/// - `CredentialError` / `BindingError` abort `login` and return the session
///   to `disconnected`.
/// - `ValidationError` aborts a transaction before any network call.
/// - `TransactionError` aborts a transaction after the draft was cleared.
/// - `ProvisioningError` is reported, never propagated to the caller.
/// - `BalanceError` aborts a refresh pass; the prior snapshot is retained.

use serde::{Deserialize, Serialize};

// ============================================================================
// CLIENT ERROR (uniform surface of the external collaborator traits)
// ============================================================================

/// Error returned by the L1/L2 client, signer and custodial-service traits.
/// The core never inspects these beyond wrapping them with context.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ClientError {
    /// The collaborator rejected the request (bad signature scheme,
    /// user declined a prompt, unpackable amount, ...)
    Rejected(String),
    /// The collaborator is not available at all
    Unavailable(String),
    /// Transport or RPC-level failure
    Rpc(String),
    /// Requested entity does not exist
    NotFound(String),
}

impl std::fmt::Display for ClientError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ClientError::Rejected(msg) => write!(f, "rejected: {}", msg),
            ClientError::Unavailable(msg) => write!(f, "unavailable: {}", msg),
            ClientError::Rpc(msg) => write!(f, "rpc error: {}", msg),
            ClientError::NotFound(what) => write!(f, "not found: {}", what),
        }
    }
}

impl std::error::Error for ClientError {}

// ============================================================================
// CREDENTIAL ERROR
// ============================================================================

/// Failure while resolving an L1 signer from a credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum CredentialError {
    /// The required provider (injected signer, custodial service) is absent
    ProviderUnavailable(String),
    /// The user or provider rejected the access request
    Rejected(String),
    /// Mnemonic-based signer derivation failed
    DerivationFailed(String),
    /// The custodial email-link flow failed
    CustodialLogin(String),
}

impl std::fmt::Display for CredentialError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CredentialError::ProviderUnavailable(msg) => write!(f, "signer provider unavailable: {}", msg),
            CredentialError::Rejected(msg) => write!(f, "credential rejected: {}", msg),
            CredentialError::DerivationFailed(msg) => write!(f, "signer derivation failed: {}", msg),
            CredentialError::CustodialLogin(msg) => write!(f, "custodial login failed: {}", msg),
        }
    }
}

impl std::error::Error for CredentialError {}

// ============================================================================
// BINDING ERROR
// ============================================================================

/// Failure while binding the L1 signer into an L2 account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BindingError {
    /// The L2 client rejected the signer (e.g. unsupported signature type)
    Rejected(String),
    /// Fetching the set of known assets failed
    AssetDiscovery(String),
}

impl std::fmt::Display for BindingError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BindingError::Rejected(msg) => write!(f, "account binding rejected: {}", msg),
            BindingError::AssetDiscovery(msg) => write!(f, "asset discovery failed: {}", msg),
        }
    }
}

impl std::error::Error for BindingError {}

// ============================================================================
// SESSION ERROR
// ============================================================================

/// Failure of a session lifecycle operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum SessionError {
    /// `login` called while a session is already connected
    AlreadyConnected,
    /// `login` or `logout` called while another login is in flight
    LoginInProgress,
    /// Operation requires a connected session
    NotConnected,
    Credential(CredentialError),
    Binding(BindingError),
}

impl std::fmt::Display for SessionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SessionError::AlreadyConnected => write!(f, "a session is already connected"),
            SessionError::LoginInProgress => write!(f, "a login attempt is already in progress"),
            SessionError::NotConnected => write!(f, "no session is connected"),
            SessionError::Credential(e) => write!(f, "{}", e),
            SessionError::Binding(e) => write!(f, "{}", e),
        }
    }
}

impl std::error::Error for SessionError {}

impl From<CredentialError> for SessionError {
    fn from(err: CredentialError) -> Self {
        SessionError::Credential(err)
    }
}

impl From<BindingError> for SessionError {
    fn from(err: BindingError) -> Self {
        SessionError::Binding(err)
    }
}

// ============================================================================
// VALIDATION ERROR
// ============================================================================

/// Malformed user input, caught before any network call.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ValidationError {
    /// Amount string is not a decimal number
    InvalidAmount(String),
    /// Amount is negative
    NegativeAmount(String),
    /// Amount does not fit the smallest-unit integer range
    AmountOverflow(String),
    /// Asset precision outside the supported range
    UnsupportedPrecision(u32),
    /// Selected asset is not known to the L2 system
    UnknownAsset(String),
    /// Destination address is empty or malformed
    InvalidDestination(String),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::InvalidAmount(s) => write!(f, "invalid amount: {}", s),
            ValidationError::NegativeAmount(s) => write!(f, "amount must not be negative: {}", s),
            ValidationError::AmountOverflow(s) => write!(f, "amount out of range: {}", s),
            ValidationError::UnsupportedPrecision(p) => write!(f, "unsupported asset precision: {}", p),
            ValidationError::UnknownAsset(sym) => write!(f, "unknown asset: {}", sym),
            ValidationError::InvalidDestination(to) => write!(f, "invalid destination: {}", to),
        }
    }
}

impl std::error::Error for ValidationError {}

// ============================================================================
// TRANSACTION ERROR
// ============================================================================

/// Failure of a deposit, withdraw or transfer operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum TransactionError {
    /// Operation requires a connected session
    NotConnected,
    /// Input rejected before submission
    Validation(ValidationError),
    /// The L1 bridge-allowance approval failed (non-native deposits)
    ApprovalFailed(String),
    /// Just-in-time fee estimation failed; nothing was submitted
    FeeEstimationFailed(String),
    /// The L2 client rejected the submission
    SubmissionFailed(String),
    /// Awaiting the receipt failed, or the receipt reports failure
    ConfirmationFailed(String),
}

impl std::fmt::Display for TransactionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransactionError::NotConnected => write!(f, "no session is connected"),
            TransactionError::Validation(e) => write!(f, "{}", e),
            TransactionError::ApprovalFailed(msg) => write!(f, "bridge allowance approval failed: {}", msg),
            TransactionError::FeeEstimationFailed(msg) => write!(f, "fee estimation failed: {}", msg),
            TransactionError::SubmissionFailed(msg) => write!(f, "submission failed: {}", msg),
            TransactionError::ConfirmationFailed(msg) => write!(f, "confirmation failed: {}", msg),
        }
    }
}

impl std::error::Error for TransactionError {}

impl From<ValidationError> for TransactionError {
    fn from(err: ValidationError) -> Self {
        TransactionError::Validation(err)
    }
}

// ============================================================================
// PROVISIONING ERROR
// ============================================================================

/// Signing-key provisioning failure. Never fatal: callers report it and
/// continue.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProvisioningError {
    /// Reading the L2 account state failed
    StateQuery(String),
    /// Submitting the set-signing-key operation failed
    Submission(String),
    /// Awaiting the receipt failed
    Confirmation(String),
}

impl std::fmt::Display for ProvisioningError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisioningError::StateQuery(msg) => write!(f, "account state query failed: {}", msg),
            ProvisioningError::Submission(msg) => write!(f, "set-signing-key submission failed: {}", msg),
            ProvisioningError::Confirmation(msg) => write!(f, "set-signing-key confirmation failed: {}", msg),
        }
    }
}

impl std::error::Error for ProvisioningError {}

// ============================================================================
// BALANCE ERROR
// ============================================================================

/// A balance refresh pass failed. The prior snapshot stays in place.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BalanceError {
    /// Refresh requested without a connected session
    NotConnected,
    /// Refresh requested for a symbol outside the session's asset set
    UnknownAsset(String),
    /// L1 balance query failed for an asset
    L1Query { symbol: String, reason: String },
    /// L2 balance query failed for an asset
    L2Query { symbol: String, reason: String },
    /// Withdrawal fee estimation failed for an asset
    FeeQuery { symbol: String, reason: String },
}

impl std::fmt::Display for BalanceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BalanceError::NotConnected => write!(f, "no session is connected"),
            BalanceError::UnknownAsset(sym) => write!(f, "unknown asset: {}", sym),
            BalanceError::L1Query { symbol, reason } => {
                write!(f, "L1 balance query failed for {}: {}", symbol, reason)
            }
            BalanceError::L2Query { symbol, reason } => {
                write!(f, "L2 balance query failed for {}: {}", symbol, reason)
            }
            BalanceError::FeeQuery { symbol, reason } => {
                write!(f, "withdrawal fee query failed for {}: {}", symbol, reason)
            }
        }
    }
}

impl std::error::Error for BalanceError {}

// ============================================================================
// TESTS
// ============================================================================
