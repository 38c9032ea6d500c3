pub(crate) mod error;

use crate::read::{Endian, Reader};
use error::{HeaderError, HeaderErrorKind};
use std::io::{Read, Seek};

pub(crate) const FSB5_MAGIC: [u8; 4] = *b"FSB5";

const FSB5_REVISION: u8 = b'5';

/// Outcome of sniffing the first four bytes of a bank.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Signature {
    pub(crate) endian: Endian,
    pub(crate) revision: u8,
}

impl Signature {
    /// Detects the byte order and bank revision from the signature, then
    /// rewinds so the header is parsed from the start of the stream.
    pub(crate) fn parse<R: Read + Seek>(reader: &mut Reader<R>) -> Result<Self, HeaderError> {
        let magic: [u8; 4] = reader
            .take_const()
            .map_err(HeaderError::factory(HeaderErrorKind::Magic))?;

        let signature = if magic[..3] == FSB5_MAGIC[..3] {
            Self {
                endian: Endian::Little,
                revision: magic[3],
            }
        } else if magic[1..] == *b"BSF" {
            Self {
                endian: Endian::Big,
                revision: magic[0],
            }
        } else {
            return Err(HeaderError::new(HeaderErrorKind::Magic));
        };

        if signature.revision != FSB5_REVISION {
            return Err(HeaderError::new(HeaderErrorKind::UnsupportedRevision {
                revision: signature.revision,
            }));
        }

        reader
            .seek_to(0)
            .map_err(HeaderError::factory(HeaderErrorKind::Rewind))?;

        Ok(signature)
    }
}

/// Fixed-size bank header: 60 bytes, or 64 when the version 0 `extra` field
/// is present. Multi-byte integers honor the detected byte order; the
/// trailing `zero`/`hash`/`dummy` blocks are opaque and never swapped.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct BankHeader {
    pub(crate) endian: Endian,
    pub(crate) version: u32,
    pub(crate) sample_count: u32,
    pub(crate) directory_size: u32,
    pub(crate) name_table_size: u32,
    pub(crate) payload_size: u32,
    pub(crate) mode: u32,
    pub(crate) extra: Option<[u8; 4]>,
    pub(crate) zero: [u8; 8],
    pub(crate) hash: [u8; 16],
    pub(crate) dummy: [u8; 8],
}

impl BankHeader {
    pub(crate) fn parse<R: Read>(
        reader: &mut Reader<R>,
        endian: Endian,
    ) -> Result<Self, HeaderError> {
        // id bytes were validated during signature detection
        reader
            .take_const::<4>()
            .map_err(HeaderError::factory(HeaderErrorKind::Magic))?;

        let version = reader
            .u32(endian)
            .map_err(HeaderError::factory(HeaderErrorKind::Version))?;

        let sample_count = reader
            .u32(endian)
            .map_err(HeaderError::factory(HeaderErrorKind::SampleCount))?;

        let directory_size = reader
            .u32(endian)
            .map_err(HeaderError::factory(HeaderErrorKind::DirectorySize))?;

        let name_table_size = reader
            .u32(endian)
            .map_err(HeaderError::factory(HeaderErrorKind::NameTableSize))?;

        let payload_size = reader
            .u32(endian)
            .map_err(HeaderError::factory(HeaderErrorKind::PayloadSize))?;

        let mode = reader
            .u32(endian)
            .map_err(HeaderError::factory(HeaderErrorKind::Mode))?;

        let extra = if version == 0 {
            Some(
                reader
                    .take_const()
                    .map_err(HeaderError::factory(HeaderErrorKind::Extra))?,
            )
        } else {
            None
        };

        let zero = reader
            .take_const()
            .map_err(HeaderError::factory(HeaderErrorKind::Metadata))?;

        let hash = reader
            .take_const()
            .map_err(HeaderError::factory(HeaderErrorKind::Metadata))?;

        let dummy = reader
            .take_const()
            .map_err(HeaderError::factory(HeaderErrorKind::Metadata))?;

        Ok(Self {
            endian,
            version,
            sample_count,
            directory_size,
            name_table_size,
            payload_size,
            mode,
            extra,
            zero,
            hash,
            dummy,
        })
    }

    pub(crate) fn byte_len(&self) -> u64 {
        if self.extra.is_some() {
            64
        } else {
            60
        }
    }

    pub(crate) fn directory_offset(&self) -> u64 {
        self.byte_len()
    }

    pub(crate) fn name_table_offset(&self) -> u64 {
        self.directory_offset() + u64::from(self.directory_size)
    }

    pub(crate) fn payload_offset(&self) -> u64 {
        self.name_table_offset() + u64::from(self.name_table_size)
    }
}
