//! Deterministic idempotency key derivation.
//!
//! The charge key is derived from the ledger id rather than generated per
//! attempt, so a retried submission for the same ledger always reaches the
//! processor with the same key and is deduplicated provider-side.

use common::LedgerId;
use uuid::Uuid;

/// Namespace UUID under which charge idempotency keys are derived.
pub const CHARGE_KEY_NAMESPACE: Uuid = Uuid::from_bytes([
    0x8f, 0x2c, 0x51, 0xe6, 0x41, 0x7a, 0x4b, 0x0d, 0x9e, 0x3f, 0x6a, 0x58, 0xd2, 0x91, 0x07, 0x44,
]);

/// Derives the charge idempotency key for a ledger.
///
/// UUID v5 of the ledger id under [`CHARGE_KEY_NAMESPACE`]: stable across
/// retries and processes, unique per ledger.
pub fn charge_key(ledger_id: LedgerId) -> Uuid {
    Uuid::new_v5(&CHARGE_KEY_NAMESPACE, ledger_id.as_uuid().as_bytes())
}
