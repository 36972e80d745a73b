/// Balance ledger cache.
///
/// Holds the last-known per-asset balances for both layers plus the cached
/// withdrawal fee, formatted as decimal strings. A full refresh replaces
/// the snapshot wholesale once every query of the pass has succeeded;
/// partial results from a failed pass are discarded, so readers always see
/// a consistent (possibly stale) snapshot. A generation counter lets a
/// refresh that was in flight when the session ended complete quietly
/// without installing its result.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use crate::amounts::format_units;
use crate::clients::{L1Client, L2Account, L2Client};
use crate::errors::BalanceError;
use crate::models::{Asset, Layer, OperationKind};

// ============================================================================
// SNAPSHOT TYPES
// ============================================================================

/// Balances for one asset across both layers, as decimal strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BalanceEntry {
    /// L1 balance
    pub l1: String,
    /// L2 balance
    pub l2: String,
    /// Cached L2 withdrawal fee, denominated in the asset itself
    pub withdraw_fee: String,
}

impl Default for BalanceEntry {
    fn default() -> Self {
        BalanceEntry {
            l1: "0".to_string(),
            l2: "0".to_string(),
            withdraw_fee: "0".to_string(),
        }
    }
}

/// Immutable view of all per-asset balances at one point in time. Entries
/// are eventually consistent with the ledgers; no cross-asset atomicity is
/// implied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BalanceSnapshot {
    /// Asset symbol -> balances
    pub entries: BTreeMap<String, BalanceEntry>,
    /// Unix timestamp of the last completed full refresh
    pub refreshed_at: u64,
}

// ============================================================================
// REFRESH CONTEXT
// ============================================================================

/// Everything a refresh pass needs from the connected session.
pub(crate) struct RefreshCtx<'a> {
    pub l1: &'a Arc<dyn L1Client>,
    pub l2: &'a Arc<dyn L2Client>,
    pub account: &'a Arc<dyn L2Account>,
    pub l1_address: &'a str,
    pub assets: &'a [Asset],
}

// ============================================================================
// BALANCE CACHE
// ============================================================================

/// Last-known balance snapshot, swapped atomically per refresh pass.
pub struct BalanceCache {
    snapshot: RwLock<Arc<BalanceSnapshot>>,
    /// Bumped on logout; a refresh pass only installs its result if the
    /// generation it started under is still current.
    generation: AtomicU64,
}

impl BalanceCache {
    pub(crate) fn new() -> Self {
        BalanceCache {
            snapshot: RwLock::new(Arc::new(BalanceSnapshot::default())),
            generation: AtomicU64::new(0),
        }
    }

    /// Cheap consistent read of the current snapshot.
    pub fn snapshot(&self) -> Arc<BalanceSnapshot> {
        self.snapshot.read().unwrap().clone()
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation.load(Ordering::SeqCst)
    }

    /// End the current session's snapshot: bump the generation so in-flight
    /// refreshes discard their results, and clear the entries.
    pub(crate) fn invalidate(&self) {
        self.generation.fetch_add(1, Ordering::SeqCst);
        let mut guard = self.snapshot.write().unwrap();
        *guard = Arc::new(BalanceSnapshot::default());
    }

    /// Query every asset on both layers plus its withdrawal fee, then
    /// install the complete snapshot. Any query failure aborts the pass
    /// with the prior snapshot untouched. Returns `Ok(false)` if the pass
    /// completed but the session had ended in the meantime.
    pub(crate) async fn refresh_all(
        &self,
        ctx: &RefreshCtx<'_>,
        generation: u64,
    ) -> Result<bool, BalanceError> {
        let mut entries = BTreeMap::new();

        for asset in ctx.assets {
            let l1_raw = ctx
                .l1
                .get_balance(ctx.l1_address, asset)
                .await
                .map_err(|e| BalanceError::L1Query {
                    symbol: asset.symbol.clone(),
                    reason: e.to_string(),
                })?;

            let l2_raw = ctx
                .account
                .balance(&asset.symbol)
                .await
                .map_err(|e| BalanceError::L2Query {
                    symbol: asset.symbol.clone(),
                    reason: e.to_string(),
                })?;

            // Representative counterparty for the cached fee: the session's
            // own address. The real withdrawal estimates against the true
            // destination just in time.
            let fee_raw = ctx
                .l2
                .estimate_fee(OperationKind::Withdraw, ctx.l1_address, &asset.symbol)
                .await
                .map_err(|e| BalanceError::FeeQuery {
                    symbol: asset.symbol.clone(),
                    reason: e.to_string(),
                })?;

            entries.insert(
                asset.symbol.clone(),
                BalanceEntry {
                    l1: format_units(l1_raw, asset.decimals),
                    l2: format_units(l2_raw, asset.decimals),
                    withdraw_fee: format_units(fee_raw, asset.decimals),
                },
            );
        }

        let snapshot = BalanceSnapshot { entries, refreshed_at: now() };
        Ok(self.install(generation, snapshot))
    }

    /// Re-query a single (layer, asset) pair and merge just that entry into
    /// the snapshot. The fee is left untouched.
    pub(crate) async fn refresh_one(
        &self,
        ctx: &RefreshCtx<'_>,
        generation: u64,
        layer: Layer,
        asset: &Asset,
    ) -> Result<bool, BalanceError> {
        let formatted = match layer {
            Layer::L1 => {
                let raw = ctx
                    .l1
                    .get_balance(ctx.l1_address, asset)
                    .await
                    .map_err(|e| BalanceError::L1Query {
                        symbol: asset.symbol.clone(),
                        reason: e.to_string(),
                    })?;
                format_units(raw, asset.decimals)
            }
            Layer::L2 => {
                let raw = ctx
                    .account
                    .balance(&asset.symbol)
                    .await
                    .map_err(|e| BalanceError::L2Query {
                        symbol: asset.symbol.clone(),
                        reason: e.to_string(),
                    })?;
                format_units(raw, asset.decimals)
            }
        };

        let mut guard = self.snapshot.write().unwrap();
        if self.generation() != generation {
            return Ok(false);
        }

        let mut next = (**guard).clone();
        let entry = next.entries.entry(asset.symbol.clone()).or_default();
        match layer {
            Layer::L1 => entry.l1 = formatted,
            Layer::L2 => entry.l2 = formatted,
        }
        *guard = Arc::new(next);
        Ok(true)
    }

    fn install(&self, generation: u64, snapshot: BalanceSnapshot) -> bool {
        let mut guard = self.snapshot.write().unwrap();
        // Checked under the write lock so a concurrent logout cannot race
        // the swap.
        if self.generation() != generation {
            return false;
        }
        *guard = Arc::new(snapshot);
        true
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
