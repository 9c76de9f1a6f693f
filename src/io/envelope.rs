use std::io::Cursor;

use bincode::config::{self, Config};
use serde::{Deserialize, Serialize};

use crate::constants::{
    ENVELOPE_HEADER_SIZE, ENVELOPE_VERSION, ENVELOPE_ZSTD_LEVEL, FLAG_ZSTD, MAGIC,
    MAX_PAYLOAD_BYTES,
};
use crate::types::{Bookmark, BookmarkId};
use crate::{LinkshelfError, Result};

// Envelope header: [magic: 8][version: u32][flags: u32][len: u64][checksum: 32 bytes]
const VERSION_OFFSET: usize = 8;
const FLAGS_OFFSET: usize = 12;
const LEN_OFFSET: usize = 16;
const CHECKSUM_OFFSET: usize = 24;

/// Everything the datastore file holds.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StorePayload {
    /// Lowest id that has never been handed out.
    pub next_id: BookmarkId,
    /// Bookmarks in insertion order.
    pub bookmarks: Vec<Bookmark>,
}

fn payload_config() -> impl Config {
    config::standard()
        .with_fixed_int_encoding()
        .with_little_endian()
}

/// Encodes and decodes the versioned datastore envelope.
pub struct EnvelopeCodec;

impl EnvelopeCodec {
    pub fn encode(payload: &StorePayload) -> Result<Vec<u8>> {
        let raw = bincode::serde::encode_to_vec(payload, payload_config())?;
        let body = zstd::encode_all(Cursor::new(&raw), ENVELOPE_ZSTD_LEVEL)?;
        let digest = blake3::hash(&body);

        let mut bytes = Vec::with_capacity(ENVELOPE_HEADER_SIZE + body.len());
        bytes.extend_from_slice(&MAGIC);
        bytes.extend_from_slice(&ENVELOPE_VERSION.to_le_bytes());
        bytes.extend_from_slice(&FLAG_ZSTD.to_le_bytes());
        bytes.extend_from_slice(&u64::try_from(body.len()).unwrap_or(u64::MAX).to_le_bytes());
        bytes.extend_from_slice(digest.as_bytes());
        bytes.extend_from_slice(&body);
        tracing::debug!(
            envelope.raw_bytes = raw.len(),
            envelope.stored_bytes = body.len(),
            envelope.bookmarks = payload.bookmarks.len(),
            "encoded datastore envelope"
        );
        Ok(bytes)
    }

    pub fn decode(bytes: &[u8]) -> Result<StorePayload> {
        if bytes.len() < ENVELOPE_HEADER_SIZE {
            return Err(LinkshelfError::corrupt(format!(
                "envelope truncated: {} bytes, header needs {ENVELOPE_HEADER_SIZE}",
                bytes.len()
            )));
        }
        if bytes[..VERSION_OFFSET] != MAGIC {
            return Err(LinkshelfError::corrupt("bad envelope magic"));
        }
        let version = read_u32(bytes, VERSION_OFFSET)?;
        if version != ENVELOPE_VERSION {
            return Err(LinkshelfError::corrupt(format!(
                "unsupported envelope version {version}"
            )));
        }
        let flags = read_u32(bytes, FLAGS_OFFSET)?;
        let length = u64::from_le_bytes(
            bytes[LEN_OFFSET..CHECKSUM_OFFSET]
                .try_into()
                .map_err(|_| LinkshelfError::corrupt("envelope length field truncated"))?,
        );
        if length > MAX_PAYLOAD_BYTES {
            return Err(LinkshelfError::corrupt(format!(
                "envelope payload length {length} exceeds limit"
            )));
        }
        let body = &bytes[ENVELOPE_HEADER_SIZE..];
        let declared = usize::try_from(length)
            .map_err(|_| LinkshelfError::corrupt("envelope length does not fit in memory"))?;
        if body.len() != declared {
            return Err(LinkshelfError::corrupt(format!(
                "envelope payload is {} bytes, header declares {length}",
                body.len()
            )));
        }
        let checksum = &bytes[CHECKSUM_OFFSET..ENVELOPE_HEADER_SIZE];
        if blake3::hash(body).as_bytes() != checksum {
            return Err(LinkshelfError::corrupt("envelope checksum mismatch"));
        }

        let raw = if flags & FLAG_ZSTD != 0 {
            zstd::decode_all(Cursor::new(body))
                .map_err(|err| LinkshelfError::corrupt(format!("payload decompression failed: {err}")))?
        } else {
            body.to_vec()
        };
        let (payload, _): (StorePayload, usize) =
            bincode::serde::decode_from_slice(&raw, payload_config()).map_err(|err| {
                LinkshelfError::corrupt(format!("payload decoding failed: {err}"))
            })?;
        Ok(payload)
    }
}

fn read_u32(bytes: &[u8], offset: usize) -> Result<u32> {
    bytes[offset..offset + 4]
        .try_into()
        .map(u32::from_le_bytes)
        .map_err(|_| LinkshelfError::corrupt("envelope header truncated"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::BookmarkDraft;
    use chrono::{TimeZone, Utc};

    fn sample() -> StorePayload {
        let created = Utc.with_ymd_and_hms(2014, 11, 25, 8, 0, 0).unwrap();
        let draft = BookmarkDraft::builder()
            .url("https://example.com/a")
            .title("A")
            .tags("dev stuff")
            .extra("rank", 3_i64)
            .build();
        StorePayload {
            next_id: 8,
            bookmarks: vec![Bookmark::from_draft(draft, 7, created)],
        }
    }

    #[test]
    fn encode_then_decode_preserves_payload() {
        let payload = sample();
        let bytes = EnvelopeCodec::encode(&payload).unwrap();
        assert_eq!(&bytes[..8], b"LNKSHELF");
        assert_eq!(EnvelopeCodec::decode(&bytes).unwrap(), payload);
    }

    #[test]
    fn flipped_payload_byte_fails_checksum() {
        let mut bytes = EnvelopeCodec::encode(&sample()).unwrap();
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        let err = EnvelopeCodec::decode(&bytes).unwrap_err();
        assert!(matches!(err, LinkshelfError::CorruptStore { .. }));
        assert!(err.to_string().contains("checksum"));
    }

    #[test]
    fn rejects_unknown_version_and_short_input() {
        let mut bytes = EnvelopeCodec::encode(&sample()).unwrap();
        bytes[VERSION_OFFSET..FLAGS_OFFSET].copy_from_slice(&99u32.to_le_bytes());
        assert!(matches!(
            EnvelopeCodec::decode(&bytes),
            Err(LinkshelfError::CorruptStore { .. })
        ));
        assert!(matches!(
            EnvelopeCodec::decode(b"LNKSH"),
            Err(LinkshelfError::CorruptStore { .. })
        ));
    }
}
