/// Signing-key provisioner.
///
/// An L2 account cannot originate L2-only transactions until a signing key
/// is registered on chain. Registration itself costs an L2 fee, so it is
/// only attempted once the account holds a non-zero committed balance in
/// at least one asset. The check is idempotent and re-run after every
/// value operation.

use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::clients::L2Account;
use crate::errors::ProvisioningError;
use crate::models::Operation;

// ============================================================================
// OUTCOME
// ============================================================================

/// Result of a provisioning check.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum ProvisioningOutcome {
    /// Account holds no committed funds; registration would fail on fees
    SkippedNoBalance,
    /// The signing key is already registered
    SkippedAlreadySet,
    /// A set-signing-key operation was submitted and included in a block
    Provisioned { tx_hash: String },
}

// ============================================================================
// PROVISIONING
// ============================================================================

/// Ensure the account's signing key is registered. Safe to call any number
/// of times; no network submission is issued unless the balance gate passes
/// and the key is missing. Awaits block inclusion, not proof finality.
pub async fn ensure_signing_key(
    account: &Arc<dyn L2Account>,
) -> Result<ProvisioningOutcome, ProvisioningError> {
    let state = account
        .state()
        .await
        .map_err(|e| ProvisioningError::StateQuery(e.to_string()))?;

    if !state.has_committed_funds() {
        return Ok(ProvisioningOutcome::SkippedNoBalance);
    }
    if state.signing_key_set {
        return Ok(ProvisioningOutcome::SkippedAlreadySet);
    }

    let handle = account
        .submit(Operation::SetSigningKey)
        .await
        .map_err(|e| ProvisioningError::Submission(e.to_string()))?;

    let tx_hash = handle.tx_hash();
    let receipt = handle
        .wait_for_receipt()
        .await
        .map_err(|e| ProvisioningError::Confirmation(e.to_string()))?;

    if !receipt.success {
        return Err(ProvisioningError::Confirmation(
            receipt.fail_reason.unwrap_or_else(|| "operation failed".to_string()),
        ));
    }

    Ok(ProvisioningOutcome::Provisioned { tx_hash })
}

// ============================================================================
// TESTS
// ============================================================================
