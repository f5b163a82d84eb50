//! Golden test vectors for the canonical metadata encoding and signatures.
//!
//! Signing is randomized, so record ids are not reproducible. What must
//! match across implementations is the canonical encoding of metadata, the
//! hashes computed over it, and acceptance of a fixed signature.

use arcjet_core::{
    canonicalize, metadata_hash, Metadata, PublicKey, Sha512Hash, Signature, SigningKeyPair,
};

/// A golden test vector.
#[derive(Debug, Clone)]
pub struct GoldenVector {
    /// Human-readable name for the vector.
    pub name: &'static str,
    /// Metadata as JSON text. Key order in the text is irrelevant.
    pub metadata_json: &'static str,
    /// Expected canonical encoding (hex).
    pub expected_canonical: &'static str,
    /// Expected SHA-512 of the canonical encoding (hex).
    pub expected_metadata_hash: &'static str,
}

/// SHA-512 of `b"hello"`.
pub const HELLO_CONTENT_HASH: &str = "9b71d224bd62f3785d96d46ad3ea3d73319bfbc2890caadae2dff72519673ca72323c3d99ba5c11d7c7acc6e14b8c5da0c4663475c2e5c3adef46f73bcdec043";

/// An ECDSA P-521/SHA-512 signature made outside this implementation.
#[derive(Debug, Clone)]
pub struct SignatureVector {
    /// Secret scalar the key was derived from.
    pub secret: [u8; 32],
    /// Public key as a JWK.
    pub public_jwk: &'static str,
    /// Signed message.
    pub message: &'static [u8],
    /// Fixed-width `r || s` signature (hex).
    pub signature: &'static str,
}

/// Signature vector for the key with secret `[0x42; 32]`.
pub fn signature_vector() -> SignatureVector {
    SignatureVector {
        secret: [0x42; 32],
        public_jwk: r#"{"kty":"EC","crv":"P-521","x":"AaYKjX5kydn6gCE8UV1xj-wF4d6VshOVZ6koBQ2qRhItjoHTHnuqLxe5bGUptR6i9-P5XJ4FubqQ2XR0FZFKHWa5","y":"AOVjunYZ55THny8qyUVD91YTmf2_bsAYWZYBLLUARkF6zH29Sujw2gxNQ-TrcPE-1iHToPSPEPcRKYsrUaEEDXA2"}"#,
        message: b"arcjet signature vector",
        signature: "0011b1b0182ff5bab3772cdaa90a232e48dd24dfb01342ee0379f99533449413d674a2538bcfb2d050609b082276cb5c8e6de9be41e757abc10d71e71fbbdba153c500986b0804fec71a6172e1961a5ed92683b4a80a3f2a4d022c483c0499adf8abdfa18671b0dbca3a34290ef564c5303b2f0006639375d086868538ef6654eaf5b310",
    }
}

/// Check the signature vector: the key derives from the secret and the
/// signature verifies under it.
pub fn verify_signature_vector() -> bool {
    let vector = signature_vector();
    let (Ok(public), Ok(derived), Ok(signature)) = (
        PublicKey::from_jwk_str(vector.public_jwk),
        SigningKeyPair::from_secret_bytes(&vector.secret),
        Signature::from_hex(vector.signature),
    ) else {
        return false;
    };
    derived.public_key() == public && public.verify(vector.message, &signature).is_ok()
}

/// Get all golden test vectors.
pub fn all_vectors() -> Vec<GoldenVector> {
    vec![
        GoldenVector {
            name: "flat object with array",
            metadata_json: r#"{"b":1,"a":[true,null,"x"]}"#,
            expected_canonical: "a2616183f5f66178616201",
            expected_metadata_hash: "f3a94f16f623c19dbc507ae1959753c84069545da36e9f6de1c499d1519b127113e89c0c3a30ac601b70690ee21e91675e2f69aa9ef96dc8e5ad1978a71e66f3",
        },
        GoldenVector {
            name: "keys sorted by encoded bytes",
            metadata_json: r#"{"b":0,"aa":0}"#,
            expected_canonical: "a262616100616200",
            expected_metadata_hash: "b75cc9c1afb0584eb1273fa1df6447b029ef05c6e347ccca38231e52507e8d107e289195a5cfd284abd85c460169d8f205696b7f545a9ad66732b22e33265391",
        },
        GoldenVector {
            name: "integers and floats",
            metadata_json: r#"{"n":-1,"m":-25,"f":1.5,"big":4294967296,"neg":-4294967297}"#,
            expected_canonical: "a5636269671b00000001000000006166fb3ff8000000000000616d3818616e20636e65673b0000000100000000",
            expected_metadata_hash: "930e231df7a4ad836e3f6bec34d52fa4e0415875821af4a7b083fb80d1ea23acf4d26bab2c17e80ed8ff7122929394e0d0844d261778f918be41a154c17bd1bf",
        },
        GoldenVector {
            name: "nested empty containers",
            metadata_json: r#"{"tag":"demo","nested":{"z":{},"y":[]}}"#,
            expected_canonical: "a2666e6573746564a2617980617aa0637461676464656d6f",
            expected_metadata_hash: "73200f38ce218960c9b4ce52f6072581a5d2bcad9952f596e47ff7ab29f78b2adcb58dceb72e63d104aa7c5d55424dbf8c9e3d8f8f1abfe5a427b3437053fd3e",
        },
        GoldenVector {
            name: "empty metadata",
            metadata_json: "{}",
            expected_canonical: "a0",
            expected_metadata_hash: "71d7479e61b530a3dae6acb291a4f9cf7fba6b5ff9a37fbaabac69dd0b04d634d23f8f8496d758511d6825eabe11111ed8df4b62785ca8fab7664e8dac3b004c",
        },
        GoldenVector {
            name: "non-ascii keys sort after ascii",
            metadata_json: r#"{"é":"ü","e":"x"}"#,
            expected_canonical: "a26165617862c3a962c3bc",
            expected_metadata_hash: "29fbe61f952e10999191d3ef187ce327c244e6d18741bd2a26aba34afd4ed372f54e6ce4c94d3bde6224fcd7bd4865da6ecd821f4a61769bbdc5e20fb7a93b38",
        },
    ]
}

/// Parse a vector's metadata.
pub fn vector_metadata(vector: &GoldenVector) -> Metadata {
    let value = serde_json::from_str(vector.metadata_json).expect("vector JSON");
    Metadata::from_value(value).expect("vector is an object")
}

/// Check every vector against this implementation.
///
/// Returns `(name, matches, canonical hex)` per vector.
pub fn verify_all_vectors() -> Vec<(String, bool, String)> {
    all_vectors()
        .iter()
        .map(|v| {
            let metadata = vector_metadata(v);
            let (hex, hash) = match (canonicalize(&metadata), metadata_hash(&metadata)) {
                (Ok(bytes), Ok(hash)) => (hex::encode(bytes), hash.to_hex()),
                (Err(e), _) | (_, Err(e)) => (format!("error: {e}"), String::new()),
            };
            let matches = hex == v.expected_canonical && hash == v.expected_metadata_hash;
            (v.name.to_string(), matches, hex)
        })
        .collect()
}

/// Check the content hash vector.
pub fn verify_content_hash() -> bool {
    Sha512Hash::hash(b"hello").to_hex() == HELLO_CONTENT_HASH
}
