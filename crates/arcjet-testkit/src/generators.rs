//! Proptest generators for property-based testing.

use proptest::prelude::*;
use serde_json::{Map, Number, Value};

use arcjet_core::record::is_reserved_field;
use arcjet_core::{Metadata, PublicKey, Record, RecordBuilder, Sha512Hash, SigningKeyPair};

/// Generate a random key pair.
pub fn keypair() -> impl Strategy<Value = SigningKeyPair> {
    any::<[u8; 32]>()
        .prop_filter("zero scalar", |seed| seed.iter().any(|&b| b != 0))
        .prop_map(|seed| SigningKeyPair::from_secret_bytes(&seed).expect("non-zero seed"))
}

/// Generate a random public key.
pub fn public_key() -> impl Strategy<Value = PublicKey> {
    keypair().prop_map(|kp| kp.public_key())
}

/// Generate a random Sha512Hash.
pub fn sha512_hash() -> impl Strategy<Value = Sha512Hash> {
    prop::collection::vec(any::<u8>(), 64).prop_map(|bytes| {
        let mut out = [0u8; 64];
        out.copy_from_slice(&bytes);
        Sha512Hash(out)
    })
}

/// Generate non-empty content bytes of at most `max_len`.
pub fn content(max_len: usize) -> impl Strategy<Value = Vec<u8>> {
    prop::collection::vec(any::<u8>(), 1..=max_len.max(1))
}

/// Generate a MIME type.
pub fn content_type() -> impl Strategy<Value = String> {
    prop_oneof![
        Just("text/plain".to_string()),
        Just("application/json".to_string()),
        Just("application/octet-stream".to_string()),
        "[a-z]{1,8}/[a-z0-9.+-]{1,12}",
    ]
}

/// Generate a metadata key that is not reserved.
pub fn metadata_key() -> impl Strategy<Value = String> {
    "[a-zA-Z_][a-zA-Z0-9_-]{0,15}".prop_filter("reserved", |k| !is_reserved_field(k))
}

/// Generate a finite JSON number: an integer of either sign or a float.
pub fn json_number() -> impl Strategy<Value = Number> {
    prop_oneof![
        any::<u64>().prop_map(Number::from),
        any::<i64>().prop_map(Number::from),
        (prop::num::f64::NORMAL | prop::num::f64::ZERO)
            .prop_filter_map("non-finite", Number::from_f64),
    ]
}

/// Generate an arbitrary JSON value, nested a few levels deep.
pub fn json_value() -> impl Strategy<Value = Value> {
    let leaf = prop_oneof![
        Just(Value::Null),
        any::<bool>().prop_map(Value::Bool),
        json_number().prop_map(Value::Number),
        "\\PC{0,16}".prop_map(Value::String),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(Value::Array),
            prop::collection::btree_map("\\PC{0,8}", inner, 0..4)
                .prop_map(|m| Value::Object(m.into_iter().collect::<Map<_, _>>())),
        ]
    })
}

/// Generate caller metadata: a small object free of reserved keys.
pub fn metadata() -> impl Strategy<Value = Metadata> {
    prop::collection::btree_map(metadata_key(), json_value(), 0..6)
        .prop_map(|m| m.into_iter().collect::<Metadata>())
}

/// Parameters for generating a record.
#[derive(Debug, Clone)]
pub struct RecordParams {
    pub keypair: SigningKeyPair,
    pub content: Vec<u8>,
    pub content_type: String,
    pub metadata: Metadata,
}

impl Arbitrary for RecordParams {
    type Parameters = ();
    type Strategy = BoxedStrategy<Self>;

    fn arbitrary_with(_: Self::Parameters) -> Self::Strategy {
        (keypair(), content(1024), content_type(), metadata())
            .prop_map(|(keypair, content, content_type, metadata)| RecordParams {
                keypair,
                content,
                content_type,
                metadata,
            })
            .boxed()
    }
}

/// Sign a record from parameters.
pub fn record_from_params(params: &RecordParams) -> Record {
    RecordBuilder::new(params.content.clone(), params.content_type.clone())
        .metadata(params.metadata.clone())
        .sign(&params.keypair)
        .expect("generated params are valid")
}
