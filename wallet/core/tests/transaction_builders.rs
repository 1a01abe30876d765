//! End-to-end builder tests: literal wire-format fixtures, backend
//! equivalence, and the failure taxonomy at the builder surface.

use chainforge_core::fees::{Fee, FeeParams};
use chainforge_core::network::{NetworkParams, BITCOIN, BITCOIN_CASH};
use chainforge_core::params::ChainParams;
use chainforge_core::tx::{TransactionId, TransactionIntent, UnspentRecord};
use chainforge_signature::{PublicKey, Signature};
use chainforge_wallet::error::InsufficientFunds;
use chainforge_wallet::{
    BuiltTransaction, Error, RemoteCallBuilder, RemoteCallParams, SignatureResult, SigningPackage,
    TransactionBuilder, UtxoBackend, UtxoLedger, UtxoTransactionBuilder,
};
use hex_literal::hex;
use std::str::FromStr;
use std::sync::Arc;

const SOURCE_LEGACY: &str = "1BgGZ9tcN4rm9KBzDn7KprQz87SZ26SAMH";
const SOURCE_WITNESS: &str = "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4";
const DESTINATION: &str = "1A1zP1eP5QGefi2DMPTfTL5SLmv7DivfNa";

const SPK_LEGACY: [u8; 25] = hex!("76a914751e76e8199196d454941c45d1b3a323f1433bd688ac");
const SPK_WITNESS: [u8; 22] = hex!("0014751e76e8199196d454941c45d1b3a323f1433bd6");

const TXID_A: &str = "8e40af02265360d59f4ecf9ae9ebf8f00a3118408f5a9cdcbcc9c0f93642f3af";
const TXID_B: &str = "1111111111111111111111111111111111111111111111111111111111111111";

const PUBKEY: [u8; 33] = hex!("0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798");

fn signer_key() -> PublicKey {
    PublicKey::from_secp256k1_bytes(&PUBKEY).unwrap()
}

/// A syntactically valid compact signature with tiny scalars, so the DER
/// form in the fixtures below is short and fully predictable.
fn small_signature(r: u8, s: u8) -> Signature {
    let mut compact = [0u8; 64];
    compact[31] = r;
    compact[63] = s;
    Signature::from_ecdsa_raw(&compact).unwrap()
}

fn respond(package: &SigningPackage, scalars: &[(u8, u8)]) -> Vec<SignatureResult> {
    package
        .digests
        .iter()
        .zip(scalars.iter())
        .map(|(digest, (r, s))| SignatureResult::new(*digest, small_signature(*r, *s), signer_key()))
        .collect()
}

fn record(height: u64, txid: &str, index: u32, amount: u64, script: &[u8]) -> UnspentRecord {
    UnspentRecord::new(height, TransactionId::from_str(txid).unwrap(), index, amount, script)
}

fn builder(params: NetworkParams, backend: UtxoBackend, records: Vec<UnspentRecord>, address: &str) -> UtxoTransactionBuilder {
    let ledger = UtxoLedger::new();
    ledger.update(address, records);
    UtxoTransactionBuilder::new(params, ledger, backend)
}

fn legacy_records() -> Vec<UnspentRecord> {
    vec![record(100, TXID_A, 0, 8_909_297, &SPK_LEGACY), record(200, TXID_B, 1, 5_000_000, &SPK_LEGACY)]
}

fn legacy_intent() -> TransactionIntent {
    // the scenario is quoted in display units: send 0.1, fee 0.00000289
    let amount = chainforge_core::try_display_to_amount("0.1", BITCOIN.decimals).unwrap();
    let fee = chainforge_core::try_display_to_amount("0.00000289", BITCOIN.decimals).unwrap();
    TransactionIntent::new(amount, Fee::fixed(fee), SOURCE_LEGACY, DESTINATION, SOURCE_LEGACY, None)
}

#[test]
fn test_legacy_round_trip_matches_fixture() {
    for backend in [UtxoBackend::Native, UtxoBackend::Reference] {
        let builder = builder(BITCOIN, backend, legacy_records(), SOURCE_LEGACY);
        let intent = legacy_intent();

        let package = builder.build_for_sign(&intent).unwrap();
        assert_eq!(
            package.digests,
            vec![
                hex!("1d2ffe4e0f795bee34965210a89a923dcac5d14cc2fc1f1dd0d80a5abab67fc6"),
                hex!("31190f70b87b2cc078239c1cf2a9acaf78447db9149a46109fc0ec43536c7d99"),
            ],
            "digests for backend {backend:?}"
        );

        let responses = respond(&package, &[(2, 3), (4, 5)]);
        let built = builder.build_for_send(&intent, package.context, &responses).unwrap();
        assert_eq!(
            built.to_hex().unwrap(),
            "0100000002aff34236f9c0c9bcdc9c5a8f4018310af0f8ebe99acf4e9fd560532602af408e000000002c0930060201020201\
             0301210279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ffffffff1111111111111111111\
             111111111111111111111111111111111111111111111010000002c0930060201040201050121\
             0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ffffffff0280969800000000001976a914\
             62e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac90a53b00000000001976a914751e76e8199196d454941c45d1b3a323\
             f1433bd688ac00000000",
            "final bytes for backend {backend:?}"
        );
    }
}

#[test]
fn test_segwit_round_trip_matches_fixture() {
    for backend in [UtxoBackend::Native, UtxoBackend::Reference] {
        let builder = builder(BITCOIN, backend, vec![record(50, TXID_A, 3, 20_000_000, &SPK_WITNESS)], SOURCE_WITNESS);
        let intent =
            TransactionIntent::new(10_000_000, Fee::fixed(1_000), SOURCE_WITNESS, DESTINATION, SOURCE_WITNESS, None);

        let package = builder.build_for_sign(&intent).unwrap();
        assert_eq!(
            package.digests,
            vec![hex!("b30270c57b861f3c77d494a35ef9522b7e1a910e12bd73f89a7b5249a8ef9e15")],
            "digest for backend {backend:?}"
        );

        let responses = respond(&package, &[(2, 3)]);
        let built = builder.build_for_send(&intent, package.context, &responses).unwrap();
        assert_eq!(
            built.to_hex().unwrap(),
            "01000000000101aff34236f9c0c9bcdc9c5a8f4018310af0f8ebe99acf4e9fd560532602af408e0300000000ffffffff0280\
             969800000000001976a91462e907b15cbf27d5425399ebf6f0fb50ebb88f1888ac989298000000000016001475\
             1e76e8199196d454941c45d1b3a323f1433bd60209300602010202010301210279be667ef9dcbbac55a06295ce870b07029b\
             fcdb2dce28d959f2815b16f8179800000000",
            "final bytes for backend {backend:?}"
        );
    }
}

#[test]
fn test_fork_id_sighash_fixture() {
    let builder = builder(
        BITCOIN_CASH,
        UtxoBackend::Native,
        vec![record(100, TXID_A, 0, 8_909_297, &SPK_LEGACY)],
        SOURCE_LEGACY,
    );
    let intent = TransactionIntent::new(5_000_000, Fee::fixed(300), SOURCE_LEGACY, DESTINATION, SOURCE_LEGACY, None);

    let package = builder.build_for_sign(&intent).unwrap();
    assert_eq!(package.digests, vec![hex!("314a47f210e6b991788a74643e90c09e6f74c12e506893a1f306f05699d71ed2")]);

    // the sighash-type byte in the unlocking script carries the fork marker
    let responses = respond(&package, &[(2, 3)]);
    let built = builder.build_for_send(&intent, package.context, &responses).unwrap();
    assert_eq!(
        built.to_hex().unwrap(),
        "0100000001aff34236f9c0c9bcdc9c5a8f4018310af0f8ebe99acf4e9fd560532602af408e000000002c0930060201020201034121\
         0279be667ef9dcbbac55a06295ce870b07029bfcdb2dce28d959f2815b16f81798ffffffff02404b4c00000000001976a91462e907\
         b15cbf27d5425399ebf6f0fb50ebb88f1888ac85a53b00000000001976a914751e76e8199196d454941c45d1b3a323f1433bd688ac\
         00000000"
    );
}

#[test]
fn test_fork_id_rejects_reference_backend() {
    let builder = builder(
        BITCOIN_CASH,
        UtxoBackend::Reference,
        vec![record(100, TXID_A, 0, 8_909_297, &SPK_LEGACY)],
        SOURCE_LEGACY,
    );
    let intent = TransactionIntent::new(5_000_000, Fee::fixed(300), SOURCE_LEGACY, DESTINATION, SOURCE_LEGACY, None);
    assert!(matches!(builder.build_for_sign(&intent).unwrap_err(), Error::UnderlyingEncodingFailure(_)));
}

#[test]
fn test_backend_equivalence_with_mixed_inputs() {
    // one legacy and one witness record behind the same source address:
    // each input's sighash flavor comes from its own spent script
    let records = vec![
        record(10, TXID_A, 0, 6_000_000, &SPK_LEGACY),
        record(20, TXID_B, 2, 6_000_000, &SPK_WITNESS),
    ];
    let intent = TransactionIntent::new(9_000_000, Fee::fixed(500), SOURCE_LEGACY, DESTINATION, SOURCE_LEGACY, None);

    let native = builder(BITCOIN, UtxoBackend::Native, records.clone(), SOURCE_LEGACY);
    let reference = builder(BITCOIN, UtxoBackend::Reference, records, SOURCE_LEGACY);

    let native_package = native.build_for_sign(&intent).unwrap();
    let reference_package = reference.build_for_sign(&intent).unwrap();
    assert_eq!(native_package.digests, reference_package.digests);

    let responses = respond(&native_package, &[(2, 3), (4, 5)]);
    let native_tx = native.build_for_send(&intent, native_package.context, &responses).unwrap();
    let reference_tx = reference.build_for_send(&intent, reference_package.context, &responses).unwrap();
    assert_eq!(native_tx, reference_tx);
}

#[test]
fn test_sub_dust_change_is_forfeited() {
    // change of 546 is exactly at the threshold and must not be encoded
    let builder = builder(BITCOIN, UtxoBackend::Native, vec![record(1, TXID_A, 0, 1_000_546, &SPK_LEGACY)], SOURCE_LEGACY);
    let intent = TransactionIntent::new(1_000_000, Fee::fixed(0), SOURCE_LEGACY, DESTINATION, SOURCE_LEGACY, None);

    let package = builder.build_for_sign(&intent).unwrap();
    let responses = respond(&package, &[(2, 3)]);
    let built = builder.build_for_send(&intent, package.context, &responses).unwrap();
    let tx_hex = built.to_hex().unwrap();
    assert!(!tx_hex.contains(&hex::encode(SPK_LEGACY)), "no change output back to the source");
    assert!(tx_hex.contains("62e907b15cbf27d5425399ebf6f0fb50ebb88f18"));
}

#[test]
fn test_signature_pairing_failures() {
    let builder = builder(BITCOIN, UtxoBackend::Native, legacy_records(), SOURCE_LEGACY);
    let intent = legacy_intent();
    let package = builder.build_for_sign(&intent).unwrap();

    let short = respond(&package, &[(2, 3)])[..1].to_vec();
    assert_eq!(
        builder.build_for_send(&intent, package.context.clone(), &short).unwrap_err(),
        Error::SignatureCountMismatch { expected: 2, actual: 1 }
    );

    let mut swapped = respond(&package, &[(2, 3), (4, 5)]);
    swapped.swap(0, 1);
    assert_eq!(
        builder.build_for_send(&intent, package.context, &swapped).unwrap_err(),
        Error::SignatureMismatch { index: 0 }
    );
}

#[test]
fn test_builder_failure_taxonomy() {
    let builder = builder(BITCOIN, UtxoBackend::Native, legacy_records(), SOURCE_LEGACY);

    // memo on a chain with no parameter support
    let mut with_memo = legacy_intent();
    with_memo.params = Some(ChainParams::Memo("note".to_string()));
    assert!(matches!(builder.build_for_sign(&with_memo).unwrap_err(), Error::UnsupportedFeature(_)));

    // gas-style fee parameters never apply to UTXO chains
    let mut with_gas = legacy_intent();
    with_gas.fee = Fee::new(289, FeeParams::Gas { limit: 21_000, price: 5 });
    assert!(matches!(builder.build_for_sign(&with_gas).unwrap_err(), Error::UnsupportedFeature(_)));

    // the ledger shortfall surfaces unchanged
    let mut too_much = legacy_intent();
    too_much.amount = 50_000_000;
    assert_eq!(
        builder.build_for_sign(&too_much).unwrap_err(),
        Error::InsufficientFunds(InsufficientFunds::NotEnough {
            address: SOURCE_LEGACY.to_string(),
            available: 13_909_297,
            required: 50_000_289,
        })
    );
}

#[test]
fn test_remote_call_digest_fixture() {
    let params = RemoteCallParams {
        name: "internet-computer",
        canister_id: vec![0, 0, 0, 0, 0, 0, 0, 2, 1, 1],
        method_name: "send_pb".to_string(),
        sender_public_key: vec![0x11; 32],
        ingress_window_secs: 120,
    };
    let builder = RemoteCallBuilder::new(params, Arc::new(|| 1_700_000_000_000_000_000));
    let intent = TransactionIntent::new(
        10_000_000,
        Fee::fixed(10_000),
        "source",
        "305a2462d4d399a77ef4b82925c10b4b078784f69b772dd247249f0dbfecc5f9",
        "source",
        Some(ChainParams::Nonce(42)),
    );

    let package = builder.build_for_sign(&intent).unwrap();
    assert_eq!(
        package.digests,
        vec![
            hex!("6726f4cb16d798fad5666bb16e0f1c632d68933cd20f772c67eca8f448b0613f"),
            hex!("a3e3420257f747649ce8e59c40ed235a9a1859f9092a95b870bbe9b8d276442c"),
        ]
    );

    let responses: Vec<_> = package
        .digests
        .iter()
        .map(|digest| {
            SignatureResult::new(*digest, Signature::from_ed25519_raw(&[0x22; 64]).unwrap(), PublicKey::Ed25519([0x11; 32]))
        })
        .collect();
    let built = builder.build_for_send(&intent, package.context, &responses).unwrap();
    assert!(matches!(built, BuiltTransaction::Envelopes { .. }));
    assert_eq!(built.to_hex(), None);
}
