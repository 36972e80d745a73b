/// Transaction orchestrator.
///
/// Drives deposit, withdraw and transfer from the user's draft through
/// validation, the operation-specific preparation step (bridge allowance
/// approval, just-in-time fee estimation, packable rounding), submission
/// and confirmation. Each operation kind awaits its own confirmation
/// depth: block inclusion for deposits and transfers, proof finality for
/// withdrawals. The draft resets the moment an operation is handed to the
/// network, regardless of how confirmation turns out.

use tracing::{info, warn};

use crate::amounts::{closest_packable_amount, parse_units};
use crate::errors::{TransactionError, ValidationError};
use crate::models::{Asset, Operation, OperationKind, TransferIntent, TransferOutcome};
use crate::session::{ActiveSession, SessionManager, WalletEvent};

impl SessionManager {
    // ========================================================================
    // DRAFT
    // ========================================================================

    /// The current draft, as the user has entered it.
    pub fn draft(&self) -> TransferIntent {
        self.inner.draft.lock().unwrap().clone()
    }

    /// Replace the draft wholesale.
    pub fn set_draft(&self, intent: TransferIntent) {
        *self.inner.draft.lock().unwrap() = intent;
    }

    fn reset_draft(&self) {
        self.inner.draft.lock().unwrap().reset();
    }

    // ========================================================================
    // OPERATIONS
    // ========================================================================

    /// Move the drafted amount from L1 into an L2 account. The drafted
    /// destination is honored; the untouched placeholder means the
    /// session's own account.
    ///
    /// Non-native assets first grant the bridge contract an allowance over
    /// the amount, awaited to completion before the deposit itself. There
    /// is no L2 fee; the cost is L1 gas outside this accounting.
    pub async fn deposit(&self) -> Result<TransferOutcome, TransactionError> {
        let session = self.active().map_err(|_| TransactionError::NotConnected)?;
        let (intent, asset, amount) = self.validate_draft(&session)?;
        let to = deposit_destination(&intent, &session.account.address());

        if !asset.is_native() {
            self.inner
                .l1
                .approve_bridge_allowance(&session.l1_address, &asset, amount)
                .await
                .map_err(|e| TransactionError::ApprovalFailed(e.to_string()))?;
        }

        self.reset_draft();
        let op = Operation::Deposit { to, symbol: asset.symbol.clone(), amount };
        self.execute(&session, op).await
    }

    /// Move the drafted amount from the L2 account back to an L1 address.
    ///
    /// The fee is estimated just in time against the true destination (the
    /// cached per-asset fee in the balance snapshot is display-only), and
    /// confirmation waits for the verified receipt: a withdrawal is only
    /// final once its block is proven.
    pub async fn withdraw(&self) -> Result<TransferOutcome, TransactionError> {
        let session = self.active().map_err(|_| TransactionError::NotConnected)?;
        let (intent, asset, amount) = self.validate_draft(&session)?;
        let to = destination(&intent)?;

        let fee = self
            .inner
            .l2
            .estimate_fee(OperationKind::Withdraw, &to, &asset.symbol)
            .await
            .map_err(|e| TransactionError::FeeEstimationFailed(e.to_string()))?;

        self.reset_draft();
        let op = Operation::Withdraw { to, symbol: asset.symbol.clone(), amount, fee };
        self.execute(&session, op).await
    }

    /// Move the drafted amount to another L2 account.
    ///
    /// The parsed amount is rounded down to the nearest packable value
    /// before submission; the network rejects unpackable amounts.
    pub async fn transfer(&self) -> Result<TransferOutcome, TransactionError> {
        let session = self.active().map_err(|_| TransactionError::NotConnected)?;
        let (intent, asset, amount) = self.validate_draft(&session)?;
        let to = destination(&intent)?;
        let amount = closest_packable_amount(amount);

        let fee = self
            .inner
            .l2
            .estimate_fee(OperationKind::Transfer, &to, &asset.symbol)
            .await
            .map_err(|e| TransactionError::FeeEstimationFailed(e.to_string()))?;

        self.reset_draft();
        let op = Operation::Transfer { to, symbol: asset.symbol.clone(), amount, fee };
        self.execute(&session, op).await
    }

    // ========================================================================
    // SHARED PIPELINE
    // ========================================================================

    /// Resolve the drafted symbol against the session's asset set and parse
    /// the amount. Runs before any network call; the draft is untouched on
    /// failure.
    fn validate_draft(
        &self,
        session: &ActiveSession,
    ) -> Result<(TransferIntent, Asset, u128), TransactionError> {
        let intent = self.draft();
        let asset = session
            .assets
            .iter()
            .find(|a| a.symbol == intent.symbol)
            .cloned()
            .ok_or_else(|| ValidationError::UnknownAsset(intent.symbol.clone()))?;
        let amount = parse_units(&intent.amount, asset.decimals)?;
        Ok((intent, asset, amount))
    }

    /// Submit, await the kind-appropriate confirmation depth, then run the
    /// post-confirmation pass (balance refresh plus provisioning check).
    async fn execute(
        &self,
        session: &ActiveSession,
        op: Operation,
    ) -> Result<TransferOutcome, TransactionError> {
        let kind = op.kind();
        let handle = session
            .account
            .submit(op)
            .await
            .map_err(|e| TransactionError::SubmissionFailed(e.to_string()))?;

        let tx_hash = handle.tx_hash();
        info!(kind = kind.as_str(), tx_hash = %tx_hash, "operation submitted");
        let _ = self
            .inner
            .events
            .send(WalletEvent::Submitted { kind, tx_hash: tx_hash.clone() });

        let receipt = match kind {
            OperationKind::Withdraw => handle.wait_for_verified_receipt().await,
            _ => handle.wait_for_receipt().await,
        }
        .map_err(|e| TransactionError::ConfirmationFailed(e.to_string()))?;

        if !receipt.success {
            return Err(TransactionError::ConfirmationFailed(
                receipt
                    .fail_reason
                    .clone()
                    .unwrap_or_else(|| "operation failed".to_string()),
            ));
        }

        info!(kind = kind.as_str(), tx_hash = %tx_hash, "operation confirmed");
        let _ = self
            .inner
            .events
            .send(WalletEvent::Confirmed { kind, tx_hash: tx_hash.clone() });

        self.after_confirmation(session).await;

        Ok(TransferOutcome { kind, tx_hash, receipt })
    }

    /// Balances moved, so refresh the snapshot, and a deposit may have
    /// given the account its first funds, so re-run the provisioning
    /// check. Both are best-effort.
    async fn after_confirmation(&self, session: &ActiveSession) {
        let generation = self.inner.cache.generation();
        let ctx = session.refresh_ctx(&self.inner.l1, &self.inner.l2);
        match self.inner.cache.refresh_all(&ctx, generation).await {
            Ok(true) => {
                let _ = self.inner.events.send(WalletEvent::BalancesRefreshed);
            }
            // Session ended under us; skip the provisioning check too
            Ok(false) => return,
            Err(e) => {
                warn!(error = %e, "post-confirmation balance refresh failed");
            }
        }
        self.run_provisioning(&session.account).await;
    }
}

/// Deposit destination: the drafted address, or the session's own account
/// when the draft still holds the "0x" placeholder.
fn deposit_destination(intent: &TransferIntent, own: &str) -> String {
    let to = intent.to.trim();
    if to.is_empty() || to == "0x" {
        own.to_string()
    } else {
        to.to_string()
    }
}

/// A destination the user has actually filled in. The draft placeholder
/// "0x" is not a valid address.
fn destination(intent: &TransferIntent) -> Result<String, TransactionError> {
    let to = intent.to.trim();
    if to.is_empty() || to == "0x" {
        return Err(ValidationError::InvalidDestination(intent.to.clone()).into());
    }
    Ok(to.to_string())
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deposit_destination_falls_back_to_own_account() {
        let mut intent = TransferIntent::default();
        assert_eq!(deposit_destination(&intent, "0xme"), "0xme");

        intent.to = " ".to_string();
        assert_eq!(deposit_destination(&intent, "0xme"), "0xme");

        intent.to = "0xf00d".to_string();
        assert_eq!(deposit_destination(&intent, "0xme"), "0xf00d");
    }

    #[test]
    fn test_destination_rejects_placeholder() {
        let mut intent = TransferIntent::default();
        assert!(matches!(
            destination(&intent),
            Err(TransactionError::Validation(ValidationError::InvalidDestination(_)))
        ));

        intent.to = "  ".to_string();
        assert!(destination(&intent).is_err());

        intent.to = "0xf00d".to_string();
        assert_eq!(destination(&intent).unwrap(), "0xf00d");
    }
}
