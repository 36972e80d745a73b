/// Session manager.
///
/// Owns the single authenticated identity per process and its state
/// machine: resolving an L1 signer from the chosen credential, binding it
/// into an L2 account, discovering assets, provisioning the signing key,
/// and running the periodic balance refresh for the lifetime of the
/// connected session. All session field mutation goes through this module
/// (single-writer discipline), and reads are taken as consistent snapshots
/// so a torn "connected but no account handle" state is never observable.

use serde::{Deserialize, Serialize};
use std::sync::{Arc, Mutex, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::balances::{BalanceCache, BalanceSnapshot, RefreshCtx};
use crate::clients::{L1Client, L1Signer, L2Account, L2Client, SignerProviders};
use crate::config::SessionConfig;
use crate::errors::{BalanceError, BindingError, CredentialError, ProvisioningError, SessionError};
use crate::models::{Asset, Credential, CredentialKind, Layer, OperationKind, SessionStatus, TransferIntent};
use crate::provisioner::{ensure_signing_key, ProvisioningOutcome};

// ============================================================================
// EVENTS
// ============================================================================

/// Observable session and transaction lifecycle events. "Submitted" and
/// "Confirmed" are deliberately distinct phases: the input draft resets on
/// submission, balances refresh on confirmation.
#[derive(Debug, Clone)]
pub enum WalletEvent {
    Connected { l1_address: String },
    Disconnected,
    Submitted { kind: OperationKind, tx_hash: String },
    Confirmed { kind: OperationKind, tx_hash: String },
    BalancesRefreshed,
    SigningKeyProvisioned { tx_hash: String },
    ProvisioningFailed { reason: String },
}

// ============================================================================
// SESSION STATE
// ============================================================================

#[derive(Default)]
struct SessionState {
    status: SessionStatus,
    credential_kind: Option<CredentialKind>,
    l1_address: Option<String>,
    account: Option<Arc<dyn L2Account>>,
    assets: Option<Arc<Vec<Asset>>>,
    connected_at: Option<u64>,
    refresh_task: Option<JoinHandle<()>>,
}

/// Externally visible snapshot of the session. Both addresses are non-null
/// exactly when the status is `connected`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionView {
    pub status: SessionStatus,
    pub credential_kind: Option<CredentialKind>,
    pub l1_address: Option<String>,
    pub l2_account: Option<String>,
    pub connected_at: Option<u64>,
}

impl SessionView {
    fn of(state: &SessionState) -> Self {
        SessionView {
            status: state.status,
            credential_kind: state.credential_kind,
            l1_address: state.l1_address.clone(),
            l2_account: state.account.as_ref().map(|a| a.address()),
            connected_at: state.connected_at,
        }
    }
}

/// Consistent snapshot of everything a connected-session operation needs.
#[derive(Clone)]
pub(crate) struct ActiveSession {
    pub l1_address: String,
    pub account: Arc<dyn L2Account>,
    pub assets: Arc<Vec<Asset>>,
}

impl ActiveSession {
    pub(crate) fn refresh_ctx<'a>(
        &'a self,
        l1: &'a Arc<dyn L1Client>,
        l2: &'a Arc<dyn L2Client>,
    ) -> RefreshCtx<'a> {
        RefreshCtx {
            l1,
            l2,
            account: &self.account,
            l1_address: &self.l1_address,
            assets: &self.assets,
        }
    }
}

// ============================================================================
// SESSION MANAGER
// ============================================================================

pub(crate) struct SessionInner {
    pub(crate) l1: Arc<dyn L1Client>,
    pub(crate) l2: Arc<dyn L2Client>,
    pub(crate) providers: SignerProviders,
    pub(crate) config: SessionConfig,
    state: RwLock<SessionState>,
    pub(crate) cache: BalanceCache,
    pub(crate) draft: Mutex<TransferIntent>,
    pub(crate) events: broadcast::Sender<WalletEvent>,
}

/// Cheaply cloneable handle to the wallet session. One active identity per
/// manager; multi-account support means multiple managers.
#[derive(Clone)]
pub struct SessionManager {
    pub(crate) inner: Arc<SessionInner>,
}

impl SessionManager {
    pub fn new(
        l1: Arc<dyn L1Client>,
        l2: Arc<dyn L2Client>,
        providers: SignerProviders,
        config: SessionConfig,
    ) -> Self {
        let (events, _) = broadcast::channel(64);
        SessionManager {
            inner: Arc::new(SessionInner {
                l1,
                l2,
                providers,
                config,
                state: RwLock::new(SessionState::default()),
                cache: BalanceCache::new(),
                draft: Mutex::new(TransferIntent::default()),
                events,
            }),
        }
    }

    /// Subscribe to session and transaction lifecycle events.
    pub fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.inner.events.subscribe()
    }

    /// Consistent snapshot of the session state.
    pub fn session(&self) -> SessionView {
        let state = self.inner.state.read().unwrap();
        SessionView::of(&state)
    }

    pub fn status(&self) -> SessionStatus {
        self.inner.state.read().unwrap().status
    }

    /// Last-known balance snapshot.
    pub fn balances(&self) -> Arc<BalanceSnapshot> {
        self.inner.cache.snapshot()
    }

    // ========================================================================
    // LOGIN
    // ========================================================================

    /// Authenticate under `credential` and bind the L2 account.
    ///
    /// The transition to `connecting` happens synchronously before any
    /// suspension point, so a second concurrent attempt is rejected. On any
    /// failure the session returns to `disconnected` -- it is never left
    /// stuck in `connecting`.
    ///
    /// No timeout is imposed here: the injected-signer prompt and the
    /// custodial email-link wait suspend until the user acts. Callers that
    /// need a bound wrap the call in `tokio::time::timeout`.
    pub async fn login(&self, credential: Credential) -> Result<SessionView, SessionError> {
        {
            let mut state = self.inner.state.write().unwrap();
            match state.status {
                SessionStatus::Connected => return Err(SessionError::AlreadyConnected),
                SessionStatus::Connecting => return Err(SessionError::LoginInProgress),
                SessionStatus::Disconnected => state.status = SessionStatus::Connecting,
            }
        }

        match self.connect(credential).await {
            Ok(view) => Ok(view),
            Err(e) => {
                self.inner.cache.invalidate();
                let mut state = self.inner.state.write().unwrap();
                *state = SessionState::default();
                Err(e)
            }
        }
    }

    async fn connect(&self, credential: Credential) -> Result<SessionView, SessionError> {
        let kind = credential.kind();
        info!(credential = kind.as_str(), "login started");

        let signer = self.resolve_signer(&credential).await.map_err(SessionError::Credential)?;
        let l1_address = signer.address();

        let account = self
            .inner
            .l2
            .bind_account(signer, &self.inner.config.signature_scheme)
            .await
            .map_err(|e| SessionError::Binding(BindingError::Rejected(e.to_string())))?;

        // Fetched once; the asset set is immutable for the session
        let assets = self
            .inner
            .l2
            .list_assets()
            .await
            .map_err(|e| SessionError::Binding(BindingError::AssetDiscovery(e.to_string())))?;
        let assets = Arc::new(assets);

        // Initial full refresh. A failed pass keeps the empty snapshot and
        // does not fail the login.
        let generation = self.inner.cache.generation();
        let ctx = RefreshCtx {
            l1: &self.inner.l1,
            l2: &self.inner.l2,
            account: &account,
            l1_address: &l1_address,
            assets: &assets,
        };
        if let Err(e) = self.inner.cache.refresh_all(&ctx, generation).await {
            warn!(error = %e, "initial balance refresh failed");
        }

        // Provisioning runs before the session is observably connected;
        // its failure is reported, never fatal to login.
        self.run_provisioning(&account).await;

        let task = self.spawn_refresh_task(account.clone(), assets.clone(), l1_address.clone());

        let view = {
            let mut state = self.inner.state.write().unwrap();
            state.status = SessionStatus::Connected;
            state.credential_kind = Some(kind);
            state.l1_address = Some(l1_address.clone());
            state.account = Some(account);
            state.assets = Some(assets);
            state.connected_at = Some(now());
            state.refresh_task = Some(task);
            SessionView::of(&state)
        };

        let _ = self.inner.events.send(WalletEvent::Connected { l1_address: l1_address.clone() });
        info!(address = %l1_address, "session connected");
        Ok(view)
    }

    /// Resolve an L1 signer according to the credential variant. Adding a
    /// credential kind means adding a variant here and its handler.
    async fn resolve_signer(
        &self,
        credential: &Credential,
    ) -> Result<Arc<dyn L1Signer>, CredentialError> {
        match credential {
            Credential::Mnemonic { phrase } => self
                .inner
                .providers
                .mnemonic
                .derive(phrase, &self.inner.config.network)
                .map_err(|e| CredentialError::DerivationFailed(e.to_string())),

            Credential::Injected => {
                let provider = self.inner.providers.injected.as_ref().ok_or_else(|| {
                    CredentialError::ProviderUnavailable("no injected signer present".to_string())
                })?;
                // May prompt the user; suspends until they respond
                provider
                    .request_accounts()
                    .await
                    .map_err(|e| CredentialError::Rejected(e.to_string()))
            }

            Credential::EmailLink { email } => {
                let custodial = self.inner.providers.custodial.as_ref().ok_or_else(|| {
                    CredentialError::ProviderUnavailable("no custodial service configured".to_string())
                })?;
                let logged_in = custodial
                    .is_logged_in()
                    .await
                    .map_err(|e| CredentialError::CustodialLogin(e.to_string()))?;
                if !logged_in {
                    // Suspends until the user completes the email link; a
                    // bound comes from wrapping `login` in
                    // `tokio::time::timeout`
                    custodial
                        .login_with_link(email)
                        .await
                        .map_err(|e| CredentialError::CustodialLogin(e.to_string()))?;
                }
                custodial
                    .signer()
                    .await
                    .map_err(|e| CredentialError::CustodialLogin(e.to_string()))
            }
        }
    }

    // ========================================================================
    // LOGOUT
    // ========================================================================

    /// Tear the session down. A no-op on an already-disconnected session.
    /// The custodial logout is best-effort: its failure is reported but
    /// never blocks teardown.
    pub async fn logout(&self) -> Result<(), SessionError> {
        let taken = {
            let mut state = self.inner.state.write().unwrap();
            match state.status {
                SessionStatus::Disconnected => return Ok(()),
                SessionStatus::Connecting => return Err(SessionError::LoginInProgress),
                SessionStatus::Connected => {}
            }
            std::mem::take(&mut *state)
        };

        // From here the session is observably disconnected. Invalidate
        // before aborting so a refresh already past its queries discards
        // its result instead of writing into a dead session.
        self.inner.cache.invalidate();
        if let Some(task) = taken.refresh_task {
            task.abort();
        }

        if taken.credential_kind == Some(CredentialKind::EmailLink) {
            if let Some(custodial) = &self.inner.providers.custodial {
                if let Err(e) = custodial.logout().await {
                    warn!(error = %e, "custodial logout failed");
                }
            }
        }

        let _ = self.inner.events.send(WalletEvent::Disconnected);
        info!("session disconnected");
        Ok(())
    }

    // ========================================================================
    // BALANCES
    // ========================================================================

    /// Manually run a full balance refresh pass.
    pub async fn refresh_balances(&self) -> Result<(), BalanceError> {
        let session = self.active().map_err(|_| BalanceError::NotConnected)?;
        let generation = self.inner.cache.generation();
        let ctx = session.refresh_ctx(&self.inner.l1, &self.inner.l2);
        if self.inner.cache.refresh_all(&ctx, generation).await? {
            let _ = self.inner.events.send(WalletEvent::BalancesRefreshed);
        }
        Ok(())
    }

    /// Manually re-query a single (layer, asset) balance. Leaves every
    /// other snapshot entry untouched and does not recompute fees.
    pub async fn refresh_balance(&self, layer: Layer, symbol: &str) -> Result<(), BalanceError> {
        let session = self.active().map_err(|_| BalanceError::NotConnected)?;
        let asset = session
            .assets
            .iter()
            .find(|a| a.symbol == symbol)
            .cloned()
            .ok_or_else(|| BalanceError::UnknownAsset(symbol.to_string()))?;

        let generation = self.inner.cache.generation();
        let ctx = session.refresh_ctx(&self.inner.l1, &self.inner.l2);
        self.inner.cache.refresh_one(&ctx, generation, layer, &asset).await?;
        Ok(())
    }

    // ========================================================================
    // SIGNING KEY
    // ========================================================================

    /// Run the signing-key provisioning check explicitly.
    pub async fn provision_signing_key(&self) -> Result<ProvisioningOutcome, ProvisioningError> {
        let session = self
            .active()
            .map_err(|e| ProvisioningError::StateQuery(e.to_string()))?;
        ensure_signing_key(&session.account).await
    }

    /// Non-fatal provisioning wrapper used after login and after every
    /// confirmed value operation. Failures are logged and broadcast only.
    pub(crate) async fn run_provisioning(&self, account: &Arc<dyn L2Account>) {
        match ensure_signing_key(account).await {
            Ok(ProvisioningOutcome::Provisioned { tx_hash }) => {
                info!(tx_hash = %tx_hash, "signing key provisioned");
                let _ = self.inner.events.send(WalletEvent::SigningKeyProvisioned { tx_hash });
            }
            Ok(outcome) => {
                debug!(?outcome, "signing key check skipped");
            }
            Err(e) => {
                warn!(error = %e, "signing key provisioning failed");
                let _ = self
                    .inner
                    .events
                    .send(WalletEvent::ProvisioningFailed { reason: e.to_string() });
            }
        }
    }

    // ========================================================================
    // INTERNALS
    // ========================================================================

    /// Consistent view of the connected session, or `NotConnected`.
    pub(crate) fn active(&self) -> Result<ActiveSession, SessionError> {
        let state = self.inner.state.read().unwrap();
        if state.status != SessionStatus::Connected {
            return Err(SessionError::NotConnected);
        }
        let l1_address = state.l1_address.clone().ok_or(SessionError::NotConnected)?;
        let account = state.account.clone().ok_or(SessionError::NotConnected)?;
        let assets = state.assets.clone().ok_or(SessionError::NotConnected)?;
        Ok(ActiveSession { l1_address, account, assets })
    }

    fn spawn_refresh_task(
        &self,
        account: Arc<dyn L2Account>,
        assets: Arc<Vec<Asset>>,
        l1_address: String,
    ) -> JoinHandle<()> {
        let inner = self.inner.clone();
        let generation = inner.cache.generation();
        let interval = inner.config.refresh_interval;

        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // The first tick completes immediately and the login already
            // refreshed; consume it so the loop runs on the interval.
            ticker.tick().await;

            loop {
                ticker.tick().await;
                if inner.cache.generation() != generation {
                    break;
                }
                let ctx = RefreshCtx {
                    l1: &inner.l1,
                    l2: &inner.l2,
                    account: &account,
                    l1_address: &l1_address,
                    assets: &assets,
                };
                match inner.cache.refresh_all(&ctx, generation).await {
                    Ok(true) => {
                        let _ = inner.events.send(WalletEvent::BalancesRefreshed);
                    }
                    // Session ended mid-pass; the result was discarded
                    Ok(false) => break,
                    Err(e) => {
                        warn!(error = %e, "periodic balance refresh failed");
                    }
                }
            }
        })
    }
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_secs()
}

// ============================================================================
// TESTS
// ============================================================================
