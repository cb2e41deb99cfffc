use crate::error::{PersistenceError, Result};
use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use std::io::{Read, Write};

/// File header, 16 bytes: magic, version, reserved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogHeader {
    pub magic: [u8; 4],
    pub version: u32,
    pub reserved: u64,
}

impl LogHeader {
    pub const SIZE: usize = 4 + 4 + 8;
    pub const MAGIC: [u8; 4] = *b"EVDB";
    pub const VERSION: u32 = 1;

    pub fn new() -> Self {
        Self {
            magic: Self::MAGIC,
            version: Self::VERSION,
            reserved: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; Self::SIZE] {
        let mut buf = [0u8; Self::SIZE];
        let mut cursor = &mut buf[..];
        // Writing into a fixed buffer of exactly SIZE bytes cannot fail.
        let _ = cursor.write_all(&self.magic);
        let _ = cursor.write_u32::<LittleEndian>(self.version);
        let _ = cursor.write_u64::<LittleEndian>(self.reserved);
        buf
    }

    pub fn write_to<W: Write>(&self, mut writer: W) -> Result<()> {
        writer.write_all(&self.to_bytes())?;
        Ok(())
    }

    pub fn read_from<R: Read>(mut reader: R) -> Result<Self> {
        let mut magic = [0u8; 4];
        reader.read_exact(&mut magic)?;
        if magic != Self::MAGIC {
            return Err(PersistenceError::InvalidMagic);
        }

        let version = reader.read_u32::<LittleEndian>()?;
        if version != Self::VERSION {
            return Err(PersistenceError::UnsupportedVersion(version));
        }
        let reserved = reader.read_u64::<LittleEndian>()?;

        Ok(Self {
            magic,
            version,
            reserved,
        })
    }
}

impl Default for LogHeader {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_header_layout() {
        let bytes = LogHeader::new().to_bytes();
        assert_eq!(&bytes[0..4], b"EVDB");
        assert_eq!(&bytes[4..8], &1u32.to_le_bytes());
        assert_eq!(&bytes[8..16], &[0u8; 8]);
        assert_eq!(LogHeader::read_from(&bytes[..]).unwrap(), LogHeader::new());
    }

    #[test]
    fn test_header_rejects_foreign_files() {
        let mut bytes = LogHeader::new().to_bytes();
        bytes[0] = b'X';
        assert!(matches!(
            LogHeader::read_from(&bytes[..]),
            Err(PersistenceError::InvalidMagic)
        ));

        let mut bytes = LogHeader::new().to_bytes();
        bytes[4] = 9;
        assert!(matches!(
            LogHeader::read_from(&bytes[..]),
            Err(PersistenceError::UnsupportedVersion(9))
        ));
    }
}
