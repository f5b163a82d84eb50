//! Binary wire layout of a signed record.
//!
//! ```text
//! id(64) || sig_len(u16 BE) || signature(sig_len) || contentHash(64) || metadataHash(64) || content
//! ```
//!
//! Metadata and content type travel out of band (through the index), so a
//! decoded [`RecordFrame`] must be joined with them before it can be
//! verified.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::crypto::{Sha512Hash, Signature};
use crate::error::{DecodeError, EncodingError};
use crate::record::Record;
use crate::types::RecordId;

const HASH_LEN: usize = 64;

/// Bytes before the signature: id plus the length prefix.
const PREFIX_LEN: usize = HASH_LEN + 2;

/// The fixed-layout part of a record as read from the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordFrame {
    pub id: RecordId,
    pub signature: Signature,
    pub content_hash: Sha512Hash,
    pub metadata_hash: Sha512Hash,
    pub content: Bytes,
}

/// Encode a record to its wire layout.
///
/// Fails only for a signature longer than the u16 length prefix allows.
pub fn encode_record(record: &Record) -> Result<Bytes, EncodingError> {
    let sig = record.signature.as_bytes();
    let sig_len = u16::try_from(sig.len()).map_err(|_| {
        EncodingError::Unsupported(format!("signature of {} bytes", sig.len()))
    })?;

    let mut buf =
        BytesMut::with_capacity(PREFIX_LEN + sig.len() + 2 * HASH_LEN + record.content.len());
    buf.put_slice(record.id.as_bytes());
    buf.put_u16(sig_len);
    buf.put_slice(sig);
    buf.put_slice(record.content_hash.as_bytes());
    buf.put_slice(record.metadata_hash.as_bytes());
    buf.put_slice(&record.content);
    Ok(buf.freeze())
}

/// Decode the wire layout.
///
/// The content is a zero-copy slice of the input.
pub fn decode_record(bytes: impl Into<Bytes>) -> Result<RecordFrame, DecodeError> {
    let mut buf: Bytes = bytes.into();

    ensure(&buf, PREFIX_LEN)?;
    let id = RecordId(take_hash(&mut buf));
    let sig_len = buf.get_u16() as usize;

    ensure(&buf, sig_len + 2 * HASH_LEN)?;
    let signature = Signature(buf.split_to(sig_len).to_vec());
    let content_hash = Sha512Hash(take_hash(&mut buf));
    let metadata_hash = Sha512Hash(take_hash(&mut buf));

    if buf.is_empty() {
        return Err(DecodeError::EmptyContent);
    }

    Ok(RecordFrame {
        id,
        signature,
        content_hash,
        metadata_hash,
        content: buf,
    })
}

fn ensure(buf: &Bytes, len: usize) -> Result<(), DecodeError> {
    if buf.len() < len {
        return Err(DecodeError::Truncated {
            needed: len - buf.len(),
        });
    }
    Ok(())
}

fn take_hash(buf: &mut Bytes) -> [u8; HASH_LEN] {
    let mut out = [0u8; HASH_LEN];
    buf.copy_to_slice(&mut out);
    out
}
