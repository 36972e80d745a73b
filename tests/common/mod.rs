/// Shared mock collaborators for the integration tests
///
/// Deterministic in-process stand-ins for the signer providers and both
/// ledger clients, with call recording and switchable failure modes. No
/// network is involved anywhere.

use async_trait::async_trait;
use rollup_wallet_session::{
    AccountState, Asset, ClientError, CustodialService, InjectedProvider, L1Client, L1Signer,
    L2Account, L2Client, MnemonicSignerFactory, Operation, OperationKind, Receipt, SessionConfig,
    SessionManager, SignerProviders, TransactionHandle,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

// ============================================================================
// TEST ACCOUNT CONSTANTS
// ============================================================================

pub const ALICE_ADDRESS: &str = "0xa11ce00000000000000000000000000000000001";
pub const BOB_ADDRESS: &str = "0xb0b0000000000000000000000000000000000002";
pub const ALICE_EMAIL: &str = "alice@example.com";
pub const TEST_MNEMONIC: &str = "test test test test test test test test test test test junk";

pub const ONE_ETH: u128 = 1_000_000_000_000_000_000;
pub const TEST_FEE: u128 = 100_000_000_000_000;

// ============================================================================
// SIGNERS & PROVIDERS
// ============================================================================

pub struct MockSigner {
    pub address: String,
}

#[async_trait]
impl L1Signer for MockSigner {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn sign_message(&self, message: &[u8]) -> Result<String, ClientError> {
        Ok(format!("sig:{}:{}", self.address, message.len()))
    }
}

pub struct MockMnemonicFactory;

impl MnemonicSignerFactory for MockMnemonicFactory {
    fn derive(&self, phrase: &str, _network: &str) -> Result<Arc<dyn L1Signer>, ClientError> {
        if phrase.split_whitespace().count() < 12 {
            return Err(ClientError::Rejected("phrase too short".to_string()));
        }
        Ok(Arc::new(MockSigner { address: ALICE_ADDRESS.to_string() }))
    }
}

pub struct MockInjectedProvider {
    pub reject: AtomicBool,
}

impl MockInjectedProvider {
    pub fn new() -> Self {
        MockInjectedProvider { reject: AtomicBool::new(false) }
    }
}

#[async_trait]
impl InjectedProvider for MockInjectedProvider {
    async fn request_accounts(&self) -> Result<Arc<dyn L1Signer>, ClientError> {
        if self.reject.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected("user declined the prompt".to_string()));
        }
        Ok(Arc::new(MockSigner { address: ALICE_ADDRESS.to_string() }))
    }
}

pub struct MockCustodial {
    pub logged_in: AtomicBool,
    pub link_logins: AtomicUsize,
    pub logouts: AtomicUsize,
}

impl MockCustodial {
    pub fn new() -> Self {
        MockCustodial {
            logged_in: AtomicBool::new(false),
            link_logins: AtomicUsize::new(0),
            logouts: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl CustodialService for MockCustodial {
    async fn is_logged_in(&self) -> Result<bool, ClientError> {
        Ok(self.logged_in.load(Ordering::SeqCst))
    }

    async fn login_with_link(&self, _email: &str) -> Result<(), ClientError> {
        self.link_logins.fetch_add(1, Ordering::SeqCst);
        self.logged_in.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn signer(&self) -> Result<Arc<dyn L1Signer>, ClientError> {
        if !self.logged_in.load(Ordering::SeqCst) {
            return Err(ClientError::Unavailable("not logged in".to_string()));
        }
        Ok(Arc::new(MockSigner { address: ALICE_ADDRESS.to_string() }))
    }

    async fn logout(&self) -> Result<(), ClientError> {
        self.logouts.fetch_add(1, Ordering::SeqCst);
        self.logged_in.store(false, Ordering::SeqCst);
        Ok(())
    }
}

// ============================================================================
// L1 CLIENT
// ============================================================================

pub struct MockL1Client {
    pub balances: Mutex<HashMap<String, u128>>,
    /// (symbol, amount) of every allowance approval, in call order
    pub approvals: Mutex<Vec<(String, u128)>>,
    pub balance_calls: AtomicUsize,
}

impl MockL1Client {
    pub fn new(balances: HashMap<String, u128>) -> Self {
        MockL1Client {
            balances: Mutex::new(balances),
            approvals: Mutex::new(Vec::new()),
            balance_calls: AtomicUsize::new(0),
        }
    }
}

#[async_trait]
impl L1Client for MockL1Client {
    async fn get_balance(&self, _address: &str, asset: &Asset) -> Result<u128, ClientError> {
        self.balance_calls.fetch_add(1, Ordering::SeqCst);
        Ok(*self.balances.lock().unwrap().get(&asset.symbol).unwrap_or(&0))
    }

    async fn approve_bridge_allowance(
        &self,
        _owner: &str,
        asset: &Asset,
        amount: u128,
    ) -> Result<(), ClientError> {
        self.approvals.lock().unwrap().push((asset.symbol.clone(), amount));
        Ok(())
    }
}

// ============================================================================
// L2 ACCOUNT, HANDLE & CLIENT
// ============================================================================

pub struct MockHandle {
    pub hash: String,
    pub receipt_waits: Arc<AtomicUsize>,
    pub verified_waits: Arc<AtomicUsize>,
}

#[async_trait]
impl TransactionHandle for MockHandle {
    fn tx_hash(&self) -> String {
        self.hash.clone()
    }

    async fn wait_for_receipt(&self) -> Result<Receipt, ClientError> {
        self.receipt_waits.fetch_add(1, Ordering::SeqCst);
        Ok(Receipt::success(42))
    }

    async fn wait_for_verified_receipt(&self) -> Result<Receipt, ClientError> {
        self.verified_waits.fetch_add(1, Ordering::SeqCst);
        Ok(Receipt::success(42))
    }
}

pub struct MockL2Account {
    pub address: String,
    pub state: Mutex<AccountState>,
    pub balances: Mutex<HashMap<String, u128>>,
    /// Every submitted operation, in call order
    pub submissions: Mutex<Vec<Operation>>,
    pub receipt_waits: Arc<AtomicUsize>,
    pub verified_waits: Arc<AtomicUsize>,
    pub fail_submit: AtomicBool,
}

impl MockL2Account {
    pub fn new(state: AccountState, balances: HashMap<String, u128>) -> Self {
        MockL2Account {
            address: ALICE_ADDRESS.to_string(),
            state: Mutex::new(state),
            balances: Mutex::new(balances),
            submissions: Mutex::new(Vec::new()),
            receipt_waits: Arc::new(AtomicUsize::new(0)),
            verified_waits: Arc::new(AtomicUsize::new(0)),
            fail_submit: AtomicBool::new(false),
        }
    }

    pub fn submitted(&self) -> Vec<Operation> {
        self.submissions.lock().unwrap().clone()
    }
}

#[async_trait]
impl L2Account for MockL2Account {
    fn address(&self) -> String {
        self.address.clone()
    }

    async fn state(&self) -> Result<AccountState, ClientError> {
        Ok(self.state.lock().unwrap().clone())
    }

    async fn balance(&self, symbol: &str) -> Result<u128, ClientError> {
        Ok(*self.balances.lock().unwrap().get(symbol).unwrap_or(&0))
    }

    async fn submit(&self, op: Operation) -> Result<Box<dyn TransactionHandle>, ClientError> {
        if self.fail_submit.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected("submission refused".to_string()));
        }
        if op == Operation::SetSigningKey {
            self.state.lock().unwrap().signing_key_set = true;
        }
        let mut submissions = self.submissions.lock().unwrap();
        submissions.push(op);
        Ok(Box::new(MockHandle {
            hash: format!("0xtx{:04}", submissions.len()),
            receipt_waits: self.receipt_waits.clone(),
            verified_waits: self.verified_waits.clone(),
        }))
    }
}

pub struct MockL2Client {
    pub assets: Vec<Asset>,
    pub account: Arc<MockL2Account>,
    pub fee: u128,
    /// (kind, counterparty, symbol) of every fee estimate, in call order
    pub fee_calls: Mutex<Vec<(OperationKind, String, String)>>,
    pub fail_fee: AtomicBool,
    pub bind_rejects: AtomicBool,
}

#[async_trait]
impl L2Client for MockL2Client {
    async fn bind_account(
        &self,
        _signer: Arc<dyn L1Signer>,
        signature_scheme: &str,
    ) -> Result<Arc<dyn L2Account>, ClientError> {
        if self.bind_rejects.load(Ordering::SeqCst) {
            return Err(ClientError::Rejected(format!(
                "unsupported signature scheme: {}",
                signature_scheme
            )));
        }
        Ok(self.account.clone())
    }

    async fn list_assets(&self) -> Result<Vec<Asset>, ClientError> {
        Ok(self.assets.clone())
    }

    async fn estimate_fee(
        &self,
        kind: OperationKind,
        counterparty: &str,
        symbol: &str,
    ) -> Result<u128, ClientError> {
        if self.fail_fee.load(Ordering::SeqCst) {
            return Err(ClientError::Rpc("fee oracle down".to_string()));
        }
        self.fee_calls
            .lock()
            .unwrap()
            .push((kind, counterparty.to_string(), symbol.to_string()));
        Ok(self.fee)
    }
}

// ============================================================================
// HARNESS
// ============================================================================

pub struct HarnessOptions {
    pub config: SessionConfig,
    pub eth_committed: u128,
    pub with_injected: bool,
}

impl Default for HarnessOptions {
    fn default() -> Self {
        // A long refresh interval keeps the periodic task quiet unless a
        // test opts in to a short one.
        let mut config = SessionConfig::default();
        config.refresh_interval = Duration::from_secs(3600);
        HarnessOptions { config, eth_committed: ONE_ETH, with_injected: true }
    }
}

pub struct TestHarness {
    pub manager: SessionManager,
    pub l1: Arc<MockL1Client>,
    pub l2: Arc<MockL2Client>,
    pub account: Arc<MockL2Account>,
    pub injected: Arc<MockInjectedProvider>,
    pub custodial: Arc<MockCustodial>,
}

pub fn test_assets() -> Vec<Asset> {
    vec![
        Asset { symbol: "ETH".to_string(), decimals: 18, l1_contract: None },
        Asset { symbol: "DAI".to_string(), decimals: 18, l1_contract: Some("0xdai".to_string()) },
    ]
}

pub fn harness() -> TestHarness {
    harness_with(HarnessOptions::default())
}

pub fn harness_with(options: HarnessOptions) -> TestHarness {
    let mut state = AccountState::default();
    state.committed_balances.insert("ETH".to_string(), options.eth_committed);

    let mut l2_balances = HashMap::new();
    l2_balances.insert("ETH".to_string(), options.eth_committed);

    let mut l1_balances = HashMap::new();
    l1_balances.insert("ETH".to_string(), 5 * ONE_ETH);
    l1_balances.insert("DAI".to_string(), 100 * ONE_ETH);

    let account = Arc::new(MockL2Account::new(state, l2_balances));
    let l1 = Arc::new(MockL1Client::new(l1_balances));
    let l2 = Arc::new(MockL2Client {
        assets: test_assets(),
        account: account.clone(),
        fee: TEST_FEE,
        fee_calls: Mutex::new(Vec::new()),
        fail_fee: AtomicBool::new(false),
        bind_rejects: AtomicBool::new(false),
    });

    let injected = Arc::new(MockInjectedProvider::new());
    let custodial = Arc::new(MockCustodial::new());

    let providers = SignerProviders {
        mnemonic: Arc::new(MockMnemonicFactory),
        injected: if options.with_injected {
            Some(injected.clone() as Arc<dyn InjectedProvider>)
        } else {
            None
        },
        custodial: Some(custodial.clone() as Arc<dyn CustodialService>),
    };

    let manager = SessionManager::new(l1.clone(), l2.clone(), providers, options.config);
    TestHarness { manager, l1, l2, account, injected, custodial }
}
