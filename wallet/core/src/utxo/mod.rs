//! The unspent output ledger.
//!
//! This is the single piece of shared mutable state in the engine. A
//! ledger holds, per owning address, the point-in-time set of spendable
//! records last supplied by an external chain data source. Builders read
//! it through snapshot operations that hold the context mutex, so a
//! concurrent `update` is observed either entirely or not at all — never
//! as a partial merge.

use crate::error::InsufficientFunds;
use chainforge_core::tx::UnspentRecord;
use log::{trace, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Default)]
struct Context {
    /// Per-address records, kept sorted ascending by
    /// `(block_height, transaction_id, output_index)`.
    map: HashMap<String, Vec<UnspentRecord>>,
}

struct Inner {
    context: Mutex<Context>,
}

/// A collection of unspent records keyed by owning address.
#[derive(Clone)]
pub struct UtxoLedger {
    inner: Arc<Inner>,
}

/// The outcome of coin selection: the chosen records in selection order
/// and their total value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selection {
    pub records: Vec<UnspentRecord>,
    pub total: u64,
}

impl Default for UtxoLedger {
    fn default() -> Self {
        Self::new()
    }
}

impl UtxoLedger {
    pub fn new() -> Self {
        Self { inner: Arc::new(Inner { context: Mutex::new(Context::default()) }) }
    }

    fn context(&self) -> MutexGuard<'_, Context> {
        self.inner.context.lock().unwrap()
    }

    /// Replaces the ledger's view of `address` with `records`. The new set
    /// is authoritative: records absent from it are dropped, duplicates
    /// (by outpoint) are ignored, and the call is idempotent.
    pub fn update(&self, address: &str, records: Vec<UnspentRecord>) {
        let mut sorted = records;
        sorted.sort();
        let before = sorted.len();
        sorted.dedup_by_key(|record| record.outpoint);
        if sorted.len() != before {
            warn!("utxo ledger: dropped {} duplicate records for {}", before - sorted.len(), address);
        }
        trace!("utxo ledger: {} now holds {} records", address, sorted.len());
        self.context().map.insert(address.to_string(), sorted);
    }

    /// Forgets everything known about `address`.
    pub fn remove(&self, address: &str) {
        self.context().map.remove(address);
    }

    /// Sum of all currently known records for `address`.
    pub fn balance(&self, address: &str) -> u64 {
        self.context().map.get(address).map(|records| records.iter().map(|r| r.amount).sum()).unwrap_or(0)
    }

    /// Chooses the smallest ascending prefix of records whose sum covers
    /// `amount + fee_estimate`. Repeated calls against an unchanged ledger
    /// return the same records in the same order.
    pub fn select(&self, address: &str, amount: u64, fee_estimate: u64) -> Result<Selection, InsufficientFunds> {
        let target = amount.saturating_add(fee_estimate);
        let context = self.context();
        let records = match context.map.get(address) {
            Some(records) if !records.is_empty() => records,
            _ => return Err(InsufficientFunds::NoRecords { address: address.to_string() }),
        };

        let mut total = 0u64;
        let mut selected = Vec::new();
        for record in records.iter() {
            total += record.amount;
            selected.push(record.clone());
            if total >= target {
                return Ok(Selection { records: selected, total });
            }
        }

        Err(InsufficientFunds::NotEnough { address: address.to_string(), available: total, required: target })
    }
}
