use crate::error::{PersistenceError, Result};
use byteorder::{LittleEndian, ReadBytesExt};
use crc64fast::Digest;
use eventdb_kernel::EventRecord;

/// Upper bound on a single frame body. Larger lengths are treated as corruption.
pub const MAX_BODY_LEN: u32 = 16 * 1024 * 1024;

/// Frame header, 20 bytes: event id, body length, CRC64 of id + length + body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameHeader {
    pub event_id: u64,
    pub body_len: u32,
    pub checksum: u64,
}

impl FrameHeader {
    pub const SIZE: usize = 8 + 4 + 8;

    pub fn parse(buf: &[u8; Self::SIZE]) -> Result<Self> {
        let mut cursor = &buf[..];
        Ok(Self {
            event_id: cursor.read_u64::<LittleEndian>()?,
            body_len: cursor.read_u32::<LittleEndian>()?,
            checksum: cursor.read_u64::<LittleEndian>()?,
        })
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        buf[0..8].copy_from_slice(&self.event_id.to_le_bytes());
        buf[8..12].copy_from_slice(&self.body_len.to_le_bytes());
        buf[12..20].copy_from_slice(&self.checksum.to_le_bytes());
        buf
    }

    /// Checks `body` against this header and decodes the record it holds.
    pub fn open_body(&self, body: &[u8]) -> Result<EventRecord> {
        let found = checksum(self.event_id, body);
        if found != self.checksum {
            return Err(PersistenceError::ChecksumMismatch {
                id: self.event_id,
                expected: self.checksum,
                found,
            });
        }

        let (record, _): (EventRecord, _) =
            bincode::serde::decode_from_slice(body, bincode::config::standard())
                .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;

        if record.id.0 != self.event_id {
            return Err(PersistenceError::IdMismatch {
                header: self.event_id,
                body: record.id,
            });
        }
        Ok(record)
    }
}

pub fn checksum(event_id: u64, body: &[u8]) -> u64 {
    let mut digest = Digest::new();
    digest.write(&event_id.to_le_bytes());
    digest.write(&(body.len() as u32).to_le_bytes());
    digest.write(body);
    digest.sum64()
}

/// Encodes a record as one contiguous frame, header first.
pub fn encode_frame(record: &EventRecord) -> Result<Vec<u8>> {
    let body = bincode::serde::encode_to_vec(record, bincode::config::standard())
        .map_err(|e| PersistenceError::InvalidFormat(e.to_string()))?;
    let body_len = u32::try_from(body.len())
        .ok()
        .filter(|len| *len <= MAX_BODY_LEN)
        .ok_or_else(|| PersistenceError::InvalidFormat(format!("record body of {} bytes is too large", body.len())))?;

    let header = FrameHeader {
        event_id: record.id.0,
        body_len,
        checksum: checksum(record.id.0, &body),
    };

    let mut frame = Vec::with_capacity(FrameHeader::SIZE + body.len());
    frame.extend_from_slice(&header.to_bytes());
    frame.extend_from_slice(&body);
    Ok(frame)
}
