/// Rollup Wallet Session
/// Dual-ledger (L1 + L2 rollup) wallet session core: credential-based
/// login, L2 account binding, balance caching, signing-key provisioning
/// and deposit/withdraw/transfer orchestration.

pub mod amounts;
pub mod balances;
pub mod clients;
pub mod config;
pub mod errors;
pub mod models;
pub mod provisioner;
pub mod session;
pub mod transactions;

pub use amounts::{
    closest_packable_amount, format_units, is_packable_amount, parse_units,
    AMOUNT_MANTISSA_BITS, MAX_AMOUNT_MANTISSA, MAX_PRECISION,
};
pub use balances::{BalanceCache, BalanceEntry, BalanceSnapshot};
pub use clients::{
    CustodialService, InjectedProvider, L1Client, L1Signer, L2Account, L2Client,
    MnemonicSignerFactory, SignerProviders, TransactionHandle,
};
pub use config::{
    SessionConfig, DEFAULT_NETWORK, DEFAULT_REFRESH_INTERVAL_SECS, DEFAULT_SIGNATURE_SCHEME,
};
pub use errors::{
    BalanceError, BindingError, ClientError, CredentialError, ProvisioningError, SessionError,
    TransactionError, ValidationError,
};
pub use models::{
    AccountState, Asset, Credential, CredentialKind, Layer, Operation, OperationKind, Receipt,
    SessionStatus, TransferIntent, TransferOutcome,
};
pub use provisioner::{ensure_signing_key, ProvisioningOutcome};
pub use session::{SessionManager, SessionView, WalletEvent};
