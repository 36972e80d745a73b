/// External collaborator interfaces.
///
/// The session core never talks to a network itself. Everything it needs
/// from the outside world -- signer resolution, L1 balance queries, the L2
/// rollup client and the custodial identity service -- enters through the
/// traits below, so tests and alternative transports plug in freely.

use async_trait::async_trait;
use std::sync::Arc;

use crate::errors::ClientError;
use crate::models::{AccountState, Asset, Operation, OperationKind, Receipt};

// ============================================================================
// L1 SIGNER
// ============================================================================

/// An authenticated L1 signer, obtainable from any credential variant.
/// Signing is consumed indirectly by the L2 client during account binding.
#[async_trait]
pub trait L1Signer: Send + Sync {
    /// The signer's L1 address
    fn address(&self) -> String;

    /// Sign an opaque message on behalf of the user
    async fn sign_message(&self, message: &[u8]) -> Result<String, ClientError>;
}

// ============================================================================
// SIGNER PROVIDERS
// ============================================================================

/// Derives a signer from a mnemonic phrase against a fixed network
/// identifier. No external approval step is involved.
pub trait MnemonicSignerFactory: Send + Sync {
    fn derive(&self, phrase: &str, network: &str) -> Result<Arc<dyn L1Signer>, ClientError>;
}

/// A browser-injected signer provider. Requesting accounts may prompt the
/// user and suspends until they respond or reject.
#[async_trait]
pub trait InjectedProvider: Send + Sync {
    async fn request_accounts(&self) -> Result<Arc<dyn L1Signer>, ClientError>;
}

/// The custodial identity service backing the email-link credential.
/// `login_with_link` suspends until the user completes the out-of-band
/// action; no timeout is imposed at this layer.
#[async_trait]
pub trait CustodialService: Send + Sync {
    async fn is_logged_in(&self) -> Result<bool, ClientError>;
    async fn login_with_link(&self, email: &str) -> Result<(), ClientError>;
    async fn signer(&self) -> Result<Arc<dyn L1Signer>, ClientError>;
    async fn logout(&self) -> Result<(), ClientError>;
}

/// Bundle of signer providers injected into the session manager. A missing
/// optional provider fails the corresponding credential variant at login.
#[derive(Clone)]
pub struct SignerProviders {
    pub mnemonic: Arc<dyn MnemonicSignerFactory>,
    pub injected: Option<Arc<dyn InjectedProvider>>,
    pub custodial: Option<Arc<dyn CustodialService>>,
}

// ============================================================================
// L1 CLIENT
// ============================================================================

/// Read-side L1 client plus the bridge allowance call needed before a
/// non-native deposit.
#[async_trait]
pub trait L1Client: Send + Sync {
    /// Smallest-unit L1 balance of `address` in `asset`
    async fn get_balance(&self, address: &str, asset: &Asset) -> Result<u128, ClientError>;

    /// Grant the L2 bridge contract allowance over `amount` of the owner's
    /// L1 token balance. Awaited to completion before a deposit is issued;
    /// never called for the native asset.
    async fn approve_bridge_allowance(
        &self,
        owner: &str,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), ClientError>;
}

// ============================================================================
// L2 CLIENT & ACCOUNT
// ============================================================================

/// The rollup client: binds L1 signers into L2 accounts and answers
/// session-wide queries.
#[async_trait]
pub trait L2Client: Send + Sync {
    /// Bind an L1 signer into an L2 account handle using a fixed signature
    /// scheme identifier. Fails if the scheme or signer is unsupported.
    async fn bind_account(
        &self,
        signer: Arc<dyn L1Signer>,
        signature_scheme: &str,
    ) -> Result<Arc<dyn L2Account>, ClientError>;

    /// The set of assets known to the L2 system
    async fn list_assets(&self) -> Result<Vec<Asset>, ClientError>;

    /// Smallest-unit fee for `kind` against `counterparty` in `symbol`
    async fn estimate_fee(
        &self,
        kind: OperationKind,
        counterparty: &str,
        symbol: &str,
    ) -> Result<u128, ClientError>;
}

/// Opaque handle to a bound L2 account. All account-scoped queries and
/// submissions go through it.
#[async_trait]
pub trait L2Account: Send + Sync {
    /// The account's address (equal to the bound L1 address)
    fn address(&self) -> String;

    /// Current committed account state
    async fn state(&self) -> Result<AccountState, ClientError>;

    /// Smallest-unit L2 balance in `symbol`
    async fn balance(&self, symbol: &str) -> Result<u128, ClientError>;

    /// Submit a value operation, returning a handle for confirmation
    async fn submit(&self, op: Operation) -> Result<Box<dyn TransactionHandle>, ClientError>;
}

// ============================================================================
// TRANSACTION HANDLE
// ============================================================================

/// Awaitable confirmation for a submitted L2 operation, at two independent
/// depths: block inclusion, and validity-proof finalization.
#[async_trait]
pub trait TransactionHandle: Send + Sync {
    fn tx_hash(&self) -> String;

    /// Resolves when the operation is accepted into an L2 block
    async fn wait_for_receipt(&self) -> Result<Receipt, ClientError>;

    /// Resolves when the operation's block is additionally proven. The only
    /// depth at which a withdrawal is safe to consider final.
    async fn wait_for_verified_receipt(&self) -> Result<Receipt, ClientError>;
}
