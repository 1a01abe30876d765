//! The parameterized UTXO-chain builder.
//!
//! One builder serves every UTXO-style chain; the differences between
//! chains (address prefixes, dust threshold, sighash scheme) live in the
//! injected [`NetworkParams`] value, and the differences between
//! encoders live in the [`UtxoBackend`] tag chosen at construction.

use crate::error::Error;
use crate::result::Result;
use crate::tx::native::{self, PlannedOutput, SignedInput, SIG_HASH_ALL, SIG_HASH_FORK_ID};
use crate::tx::{
    ensure_params, reference, validate_pairing, BuiltTransaction, SignatureResult, SigningContext, SigningDigest,
    SigningPackage, TransactionBuilder,
};
use crate::utxo::{Selection, UtxoLedger};
use chainforge_core::error::CoreError;
use chainforge_core::network::{NetworkParams, SighashScheme};
use chainforge_core::tx::{ScriptVec, TransactionIntent, UnspentRecord};
use chainforge_signature::{encode, PublicKey, Signature, SignatureFormat};
use chainforge_txscript::{classify_script, locking_script, ScriptBuilder, ScriptClass};
use log::debug;

/// Encoding backend, chosen once at construction. Call sites never branch
/// on it again; both tags implement the identical two-phase contract and
/// must agree byte-for-byte.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
pub enum UtxoBackend {
    /// First-party encoder (`tx::native`).
    Native,
    /// Third-party encoder (`tx::reference`). Cannot express fork-id
    /// sighashes.
    Reference,
}

/// Inter-phase state for the UTXO builder: the selected inputs and the
/// settled output plan. `build_for_send` re-derives nothing from the
/// ledger, so a concurrent refresh between phases cannot skew the result.
#[derive(Debug, Clone)]
pub struct UtxoSigningContext {
    selection: Selection,
    outputs: Vec<PlannedOutput>,
    digests: Vec<SigningDigest>,
}

pub struct UtxoTransactionBuilder {
    params: NetworkParams,
    ledger: UtxoLedger,
    backend: UtxoBackend,
}

/// Input kinds the builder can produce unlocking data for.
#[derive(PartialEq, Eq, Clone, Copy, Debug)]
enum InputKind {
    Legacy,
    WitnessV0,
}

impl UtxoTransactionBuilder {
    pub fn new(params: NetworkParams, ledger: UtxoLedger, backend: UtxoBackend) -> Self {
        Self { params, ledger, backend }
    }

    /// Decides how an input will be unlocked from the spent record's
    /// locking script. Script-hash records need a redeem script no signer
    /// collaborator can provide, and fork-id chains never adopted witness
    /// programs.
    fn classify_input(&self, record: &UnspentRecord) -> Result<InputKind> {
        let kind = match classify_script(&record.script_public_key) {
            ScriptClass::PubKeyHash => InputKind::Legacy,
            ScriptClass::WitnessV0PubKeyHash => InputKind::WitnessV0,
            ScriptClass::ScriptHash | ScriptClass::WitnessV0ScriptHash => {
                return Err(Error::UnsupportedFeature(format!(
                    "spending script-hash outputs is not supported (outpoint {})",
                    record.outpoint
                )));
            }
            ScriptClass::NonStandard => {
                return Err(Error::UnsupportedFeature(format!(
                    "non-standard locking script on outpoint {}",
                    record.outpoint
                )));
            }
        };
        if kind == InputKind::WitnessV0 && matches!(self.params.sighash, SighashScheme::ForkId(_)) {
            return Err(Error::UnsupportedFeature(format!(
                "{} does not support witness inputs",
                self.params
            )));
        }
        Ok(kind)
    }

    fn hash_type(&self) -> u32 {
        match self.params.sighash {
            SighashScheme::Legacy => SIG_HASH_ALL,
            SighashScheme::ForkId(fork) => SIG_HASH_ALL | SIG_HASH_FORK_ID | (fork << 8),
        }
    }

    /// Destination output first, then a change output only when the
    /// remainder clears the dust threshold. Sub-dust change is forfeited
    /// to the miners rather than encoded.
    fn plan_outputs(&self, intent: &TransactionIntent, selection: &Selection) -> Result<Vec<PlannedOutput>> {
        let spent = intent
            .amount
            .checked_add(intent.fee.amount)
            .ok_or(Error::Core(CoreError::AmountOverflow))?;
        let change = selection.total - spent;

        let mut outputs = vec![PlannedOutput {
            amount: intent.amount,
            script_public_key: locking_script(&intent.destination_address, &self.params)?,
        }];
        if change > self.params.dust_threshold {
            outputs.push(PlannedOutput {
                amount: change,
                script_public_key: locking_script(&intent.change_address, &self.params)?,
            });
        } else if change > 0 {
            debug!("{}: forfeiting sub-dust change of {} to fee", self.params, change);
        }
        Ok(outputs)
    }

    /// The p2pkh template over the spent record's key hash, as BIP143
    /// `scriptCode` requires for pubkey-hash inputs of either kind.
    fn script_code(record: &UnspentRecord) -> Result<ScriptVec> {
        match classify_script(&record.script_public_key) {
            ScriptClass::PubKeyHash => Ok(record.script_public_key.clone()),
            ScriptClass::WitnessV0PubKeyHash => {
                let mut code = ScriptVec::new();
                code.extend_from_slice(&[0x76, 0xa9, 0x14]);
                code.extend_from_slice(&record.script_public_key[2..22]);
                code.extend_from_slice(&[0x88, 0xac]);
                Ok(code)
            }
            _ => Err(Error::UnsupportedFeature("script code requires a pubkey-hash input".to_string())),
        }
    }

    fn input_digest(&self, selection: &Selection, outputs: &[PlannedOutput], index: usize) -> Result<SigningDigest> {
        let record = &selection.records[index];
        let kind = self.classify_input(record)?;
        let hash_type = self.hash_type();
        match (self.backend, self.params.sighash, kind) {
            (UtxoBackend::Native, SighashScheme::Legacy, InputKind::Legacy) => Ok(native::legacy_sighash(
                self.params.tx_version,
                &selection.records,
                outputs,
                0,
                index,
                hash_type,
            )),
            (UtxoBackend::Native, _, _) => {
                let code = Self::script_code(record)?;
                Ok(native::bip143_sighash(
                    self.params.tx_version,
                    &selection.records,
                    outputs,
                    0,
                    index,
                    &code,
                    hash_type,
                ))
            }
            (UtxoBackend::Reference, SighashScheme::Legacy, InputKind::Legacy) => {
                reference::legacy_sighash(self.params.tx_version, &selection.records, outputs, index, hash_type)
            }
            (UtxoBackend::Reference, SighashScheme::Legacy, InputKind::WitnessV0) => {
                reference::p2wpkh_sighash(self.params.tx_version, &selection.records, outputs, index)
            }
            (UtxoBackend::Reference, SighashScheme::ForkId(_), _) => Err(Error::UnderlyingEncodingFailure(format!(
                "the reference encoder cannot express fork-id sighashes ({})",
                self.params
            ))),
        }
    }

    /// Unlocking data for one input: a `<der+hashtype> <pubkey>` script
    /// for legacy inputs, the equivalent two-element stack for witness
    /// inputs.
    fn unlocking_data(&self, record: &UnspentRecord, signature: &Signature, public_key: &PublicKey) -> Result<SignedInput> {
        let key_bytes = match public_key {
            PublicKey::Secp256k1(_) => public_key.to_bytes(),
            PublicKey::Ed25519(_) => {
                return Err(Error::UnsupportedFeature(format!(
                    "{} transactions require secp256k1 keys",
                    self.params
                )));
            }
        };
        let sig_bytes = encode(signature, SignatureFormat::DerWithHashType((self.hash_type() & 0xff) as u8))?;

        match self.classify_input(record)? {
            InputKind::Legacy => {
                let mut builder = ScriptBuilder::new();
                builder.add_data(&sig_bytes)?.add_data(&key_bytes)?;
                Ok(SignedInput { outpoint: record.outpoint, script_sig: builder.drain(), witness: vec![] })
            }
            InputKind::WitnessV0 => {
                Ok(SignedInput { outpoint: record.outpoint, script_sig: vec![], witness: vec![sig_bytes, key_bytes] })
            }
        }
    }
}

impl TransactionBuilder for UtxoTransactionBuilder {
    fn build_for_sign(&self, intent: &TransactionIntent) -> Result<SigningPackage> {
        ensure_params(self.params.name, self.params.param_shape, intent.params.as_ref())?;
        if !self.params.accepts_fee_params(&intent.fee.params) {
            return Err(Error::UnsupportedFeature(format!(
                "fee parameters {:?} cannot be expressed on {}",
                intent.fee.params, self.params
            )));
        }

        // checked before selection so an overflowing target cannot wrap
        // into a tiny one
        intent.amount.checked_add(intent.fee.amount).ok_or(Error::Core(CoreError::AmountOverflow))?;

        let selection = self.ledger.select(&intent.source_address, intent.amount, intent.fee.amount)?;
        debug!(
            "{}: selected {} inputs totalling {} for amount {} + fee {}",
            self.params,
            selection.records.len(),
            selection.total,
            intent.amount,
            intent.fee.amount
        );

        let outputs = self.plan_outputs(intent, &selection)?;
        let digests = (0..selection.records.len())
            .map(|index| self.input_digest(&selection, &outputs, index))
            .collect::<Result<Vec<_>>>()?;

        Ok(SigningPackage {
            digests: digests.clone(),
            context: SigningContext::Utxo(UtxoSigningContext { selection, outputs, digests }),
        })
    }

    fn build_for_send(
        &self,
        _intent: &TransactionIntent,
        context: SigningContext,
        signatures: &[SignatureResult],
    ) -> Result<BuiltTransaction> {
        let SigningContext::Utxo(context) = context else {
            return Err(Error::UnsupportedFeature(
                "signing context was produced by a different builder family".to_string(),
            ));
        };

        let paired = validate_pairing(&context.digests, signatures)?;
        let inputs = context
            .selection
            .records
            .iter()
            .zip(paired.iter())
            .map(|(record, (signature, public_key))| self.unlocking_data(record, signature, public_key))
            .collect::<Result<Vec<_>>>()?;

        let bytes = match self.backend {
            UtxoBackend::Native => {
                native::serialize_transaction(self.params.tx_version, &inputs, &context.outputs, 0)
            }
            UtxoBackend::Reference => {
                reference::serialize_transaction(self.params.tx_version, &inputs, &context.outputs)
            }
        };
        Ok(BuiltTransaction::Raw(bytes))
    }
}
