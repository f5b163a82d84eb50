//! Record properties and client flows over in-memory services.

use arcjet::core::{
    canonicalize, metadata_hash, CryptoError, DirKeyStore, EncodingError, KeyStore,
    MemoryKeyStore,
};
use arcjet::store::{IndexClient, IndexEntry, MemoryIndex, MemoryStore, StoreClient, StoreError};
use arcjet::{
    Arcjet, ArcjetConfig, ArcjetError, IntegrityError, Metadata, Query, RecordBuilder,
    RejectReason, Sha512Hash,
};
use arcjet_testkit::generators::{content, metadata};
use arcjet_testkit::{multi_party_fixtures, record_from_params, RecordParams, TestFixture};
use bytes::Bytes;
use proptest::prelude::*;
use serde_json::json;

fn client(fixture: TestFixture) -> Arcjet<MemoryStore, MemoryIndex> {
    let TestFixture {
        keypair,
        store,
        index,
    } = fixture;
    Arcjet::new(keypair, store, index, ArcjetConfig::default())
}

// -----------------------------------------------------------------------
// Record properties
// -----------------------------------------------------------------------

proptest! {
    #![proptest_config(ProptestConfig::with_cases(24))]

    #[test]
    fn prop_signed_records_verify(params in any::<RecordParams>()) {
        let record = record_from_params(&params);
        prop_assert!(record.verify(None).is_ok());
        prop_assert!(record.verify(Some(&params.keypair.public_key())).is_ok());
    }

    #[test]
    fn prop_content_flip_is_content_tamper(
        params in any::<RecordParams>(),
        idx in any::<prop::sample::Index>(),
        bit in 0u8..8,
    ) {
        let mut record = record_from_params(&params);
        let mut bytes = record.content.to_vec();
        let i = idx.index(bytes.len());
        bytes[i] ^= 1 << bit;
        record.content = Bytes::from(bytes);
        prop_assert_eq!(record.verify(None), Err(IntegrityError::ContentTamper));
    }

    #[test]
    fn prop_metadata_change_is_metadata_tamper(params in any::<RecordParams>(), value in "[a-z]{1,8}") {
        let mut record = record_from_params(&params);
        let changed = match record.metadata.get("extra") {
            Some(existing) if existing == &json!(value) => format!("{value}!"),
            _ => value,
        };
        record.metadata.insert("extra", changed);
        prop_assert_eq!(record.verify(None), Err(IntegrityError::MetadataTamper));
    }

    #[test]
    fn prop_canonical_encoding_ignores_insertion_order(metadata in metadata()) {
        let mut pairs: Vec<_> = metadata.iter().map(|(k, v)| (k.clone(), v.clone())).collect();
        pairs.reverse();
        let reordered: Metadata = pairs.into_iter().collect();

        prop_assert_eq!(canonicalize(&metadata).unwrap(), canonicalize(&reordered).unwrap());
        prop_assert_eq!(metadata_hash(&metadata).unwrap(), metadata_hash(&reordered).unwrap());
    }

    #[test]
    fn prop_wire_roundtrip(params in any::<RecordParams>()) {
        let record = record_from_params(&params);
        let bytes = record.to_bytes().unwrap();
        let decoded = arcjet::core::Record::from_bytes(
            bytes,
            record.metadata.clone(),
            record.content_type.clone(),
        )
        .unwrap();
        prop_assert_eq!(&decoded, &record);
        prop_assert!(decoded.verify(None).is_ok());
    }

    #[test]
    fn prop_content_hash_matches_store(bytes in content(256)) {
        let runtime = tokio::runtime::Builder::new_current_thread().build().unwrap();
        let store = MemoryStore::new();
        let hash = runtime
            .block_on(StoreClient::put(&store, Bytes::from(bytes.clone()), "application/octet-stream"))
            .unwrap();
        prop_assert_eq!(hash, Sha512Hash::hash(&bytes));
        prop_assert_eq!(runtime.block_on(store.get(&hash)).unwrap().to_vec(), bytes);
    }
}

#[test]
fn test_signature_and_id_tamper() {
    let fixture = TestFixture::new();
    let record = fixture.make_tagged(b"payload", "demo");

    let mut forged = record.clone();
    let last = forged.signature.0.len() - 1;
    forged.signature.0[last] ^= 0x01;
    assert_eq!(forged.verify(None), Err(IntegrityError::SignatureInvalid));

    let mut forged = record.clone();
    forged.id.0[0] ^= 0x01;
    assert_eq!(forged.verify(None), Err(IntegrityError::IdMismatch));
}

#[test]
fn test_signing_is_randomized() {
    let fixture = TestFixture::new();
    let a = fixture.make_tagged(b"same", "demo");
    let b = fixture.make_tagged(b"same", "demo");

    assert_eq!(a.content_hash, b.content_hash);
    assert_eq!(a.metadata_hash, b.metadata_hash);
    assert_ne!(a.signature, b.signature);
    assert_ne!(a.id, b.id);
    assert!(a.verify(None).is_ok());
    assert!(b.verify(None).is_ok());
}

#[test]
fn test_cross_key_rejection() {
    let parties = multi_party_fixtures(2);
    let record = parties[0].make_tagged(b"mine", "demo");
    assert_eq!(
        record.verify(Some(&parties[1].public_key())),
        Err(IntegrityError::SignatureInvalid)
    );
}

#[test]
fn test_empty_content_rejected() {
    let fixture = TestFixture::new();
    let err = RecordBuilder::new(Bytes::new(), "text/plain")
        .sign(&fixture.keypair)
        .unwrap_err();
    assert!(matches!(
        err,
        arcjet::core::RecordError::Encoding(EncodingError::EmptyContent)
    ));
}

// -----------------------------------------------------------------------
// Client flows
// -----------------------------------------------------------------------

#[tokio::test]
async fn test_store_roundtrip_hello() {
    let arcjet = client(TestFixture::new());

    let hash = StoreClient::put(arcjet.store(), Bytes::from_static(b"hello"), "text/plain")
        .await
        .unwrap();
    assert_eq!(arcjet.get(&hash).await.unwrap().as_ref(), b"hello");

    let err = arcjet.get(&Sha512Hash::hash(b"never stored")).await.unwrap_err();
    assert!(matches!(err, ArcjetError::Store(StoreError::NotFound(_))));
}

#[tokio::test]
async fn test_set_then_find() {
    let arcjet = client(TestFixture::new());

    let record = arcjet
        .set(b"hello".to_vec(), "text/plain", Metadata::new().with("tag", "demo"))
        .await
        .unwrap();
    arcjet
        .set(b"other".to_vec(), "text/plain", Metadata::new().with("tag", "other"))
        .await
        .unwrap();

    let report = arcjet.find(&Query::new().with("tag", "demo")).await.unwrap();
    assert!(report.rejected.is_empty());
    assert_eq!(report.verified.len(), 1);
    assert_eq!(report.verified[0], record);

    let report = arcjet.find(&Query::new()).await.unwrap();
    assert_eq!(report.verified.len(), 2);
}

#[tokio::test]
async fn test_set_json_publishes_serialized_value() {
    let arcjet = client(TestFixture::new());
    let value = json!({ "name": "demo", "sizes": [1, 2, 3] });

    let record = arcjet
        .set_json(&value, Metadata::new().with("tag", "json"))
        .await
        .unwrap();
    assert_eq!(record.content_type, arcjet::JSON_CONTENT_TYPE);
    assert_eq!(record.content.as_ref(), serde_json::to_vec(&value).unwrap().as_slice());

    let report = arcjet.find(&Query::new().with("tag", "json")).await.unwrap();
    assert_eq!(report.verified, vec![record.clone()]);
    let decoded: serde_json::Value = serde_json::from_slice(&report.verified[0].content).unwrap();
    assert_eq!(decoded, value);
}

#[tokio::test]
async fn test_set_json_rejects_unserializable_value() {
    let arcjet = client(TestFixture::new());
    // JSON object keys must be strings.
    let value = std::collections::BTreeMap::from([(vec![1u8], 1u8)]);

    let err = arcjet.set_json(&value, Metadata::new()).await.unwrap_err();
    assert!(
        matches!(err, ArcjetError::Encoding(EncodingError::Unsupported(_))),
        "got {err:?}"
    );
    let report = arcjet.find(&Query::new()).await.unwrap();
    assert!(report.verified.is_empty());
}

#[tokio::test]
async fn test_find_rejects_swapped_embedded_key() {
    let fixture = TestFixture::new();
    let record = fixture.make_tagged(b"hello", "demo");
    StoreClient::put(&fixture.store, record.content.clone(), "text/plain")
        .await
        .unwrap();

    let other = TestFixture::new().public_key();
    let mut value = IndexEntry::from_record(&record).into_value();
    value["publicKey"] = other.to_jwk_value().unwrap();
    fixture
        .index
        .insert_raw(IndexEntry::from_value(value).unwrap());

    let arcjet = client(fixture);
    let report = arcjet.find(&Query::new().with("tag", "demo")).await.unwrap();
    assert!(report.verified.is_empty());
    assert_eq!(report.rejected.len(), 1);
    assert!(matches!(
        report.rejected[0].reason,
        RejectReason::Integrity(IntegrityError::SignatureInvalid)
    ));
}

#[tokio::test]
async fn test_set_rejects_reserved_metadata() {
    let arcjet = client(TestFixture::new());
    let err = arcjet
        .set(b"x".to_vec(), "text/plain", Metadata::new().with("id", "mine"))
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ArcjetError::Encoding(EncodingError::ReservedField(ref k)) if k == "id"
    ));
    assert!(arcjet.store().is_empty());
    assert!(arcjet.index().is_empty());
}

#[tokio::test]
async fn test_find_rejects_untrustworthy_entries() {
    let fixture = TestFixture::new();
    let good = fixture.make_tagged(b"good", "demo");
    fixture.publish(&good).await.unwrap();

    // Metadata rewritten after signing.
    let tampered = fixture.make_tagged(b"tampered", "demo");
    StoreClient::put(&fixture.store, tampered.content.clone(), "text/plain")
        .await
        .unwrap();
    let mut value = IndexEntry::from_record(&tampered).into_value();
    value["extra"] = json!("injected");
    fixture
        .index
        .insert_raw(IndexEntry::from_value(value).unwrap());

    // Content never stored.
    let missing = fixture.make_tagged(b"missing", "demo");
    IndexClient::put(&fixture.index, &IndexEntry::from_record(&missing))
        .await
        .unwrap();

    // Store serves other bytes under the hash.
    let swapped = fixture.make_tagged(b"swapped", "demo");
    fixture.store.insert_raw(
        swapped.content_hash,
        Bytes::from_static(b"not it"),
        Some("text/plain".into()),
    );
    IndexClient::put(&fixture.index, &IndexEntry::from_record(&swapped))
        .await
        .unwrap();

    // No derived fields at all.
    fixture
        .index
        .insert_raw(IndexEntry::from_value(json!({"tag": "demo"})).unwrap());

    let arcjet = client(fixture);
    let report = arcjet.find(&Query::new().with("tag", "demo")).await.unwrap();

    assert_eq!(report.verified.len(), 1);
    assert_eq!(report.verified[0].id, good.id);
    assert_eq!(report.rejected.len(), 4);

    let reasons: Vec<_> = report.rejected.iter().map(|r| &r.reason).collect();
    assert!(reasons
        .iter()
        .any(|r| matches!(r, RejectReason::Integrity(IntegrityError::MetadataTamper))));
    assert!(reasons.iter().any(|r| matches!(r, RejectReason::ContentMissing)));
    assert!(reasons.iter().any(|r| matches!(r, RejectReason::HashMismatch)));
    assert!(reasons.iter().any(|r| matches!(r, RejectReason::Malformed(_))));
}

#[tokio::test]
async fn test_find_with_trusted_key() {
    let parties = multi_party_fixtures(2);
    let theirs = parties[1].make_tagged(b"theirs", "demo");
    let ours = parties[0].make_tagged(b"ours", "demo");

    let mut parties = parties.into_iter();
    let fixture = parties.next().unwrap();
    fixture.publish(&ours).await.unwrap();
    fixture.publish(&theirs).await.unwrap();

    let config = ArcjetConfig {
        trusted_key: Some(fixture.public_key()),
        ..Default::default()
    };
    let arcjet = Arcjet::read_only(fixture.store, fixture.index, config);

    let report = arcjet.find(&Query::new().with("tag", "demo")).await.unwrap();
    assert_eq!(report.verified.len(), 1);
    assert_eq!(report.verified[0].id, ours.id);
    assert!(matches!(
        report.rejected[0].reason,
        RejectReason::Integrity(IntegrityError::SignatureInvalid)
    ));
}

#[tokio::test]
async fn test_read_only_cannot_sign() {
    let arcjet = Arcjet::read_only(MemoryStore::new(), MemoryIndex::new(), ArcjetConfig::default());
    assert!(arcjet.public_key().is_none());

    let err = arcjet
        .set(b"x".to_vec(), "text/plain", Metadata::new())
        .await
        .unwrap_err();
    assert!(matches!(err, ArcjetError::Crypto(CryptoError::KeyUnavailable)));
}

#[tokio::test]
async fn test_generate_then_open() {
    let dir = tempfile::tempdir().unwrap();
    let keys = DirKeyStore::new(dir.path());

    let err = Arcjet::open(&keys, MemoryStore::new(), MemoryIndex::new(), ArcjetConfig::default());
    assert!(matches!(err, Err(ArcjetError::Crypto(CryptoError::KeyUnavailable))));

    let first = Arcjet::generate(&keys, MemoryStore::new(), MemoryIndex::new(), ArcjetConfig::default())
        .unwrap();
    let record = first
        .set(b"persisted".to_vec(), "text/plain", Metadata::new())
        .await
        .unwrap();

    let reopened = Arcjet::open(&keys, MemoryStore::new(), MemoryIndex::new(), ArcjetConfig::default())
        .unwrap();
    assert_eq!(reopened.public_key(), first.public_key());
    assert!(record.verify(reopened.public_key().as_ref()).is_ok());
}

#[tokio::test]
async fn test_memory_key_store_session() {
    let keys = MemoryKeyStore::new();
    let generated = keys.generate().unwrap();
    let arcjet = Arcjet::open(&keys, MemoryStore::new(), MemoryIndex::new(), ArcjetConfig::default())
        .unwrap();
    assert_eq!(arcjet.public_key(), Some(generated.public_key()));
}
