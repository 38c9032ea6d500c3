use crate::{
    directory::SampleEntry,
    header::{BankHeader, FSB5_MAGIC},
    read::{ReadError, Reader},
};
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Error as IoError, Read, Seek, Write},
};

/// Writes one sample out as a complete single-sample bank.
///
/// The output reuses the source bank's header fields, carries the sample's
/// re-encoded directory entry, and holds a fresh one-entry name table. Every
/// header and directory word is written little-endian regardless of the
/// source bank's byte order. Returns the number of payload bytes copied,
/// which falls short of the directory's figure when the source bank is
/// truncated.
pub(crate) fn write_sample<R: Read + Seek, W: Write>(
    header: &BankHeader,
    entry: &SampleEntry,
    source: &mut Reader<R>,
    mut sink: W,
) -> Result<u64, SplitError> {
    let name_block = build_name_block(entry.name.as_deref().unwrap_or(""));

    let mut head = Vec::with_capacity(header.byte_len() as usize);
    head.extend_from_slice(&FSB5_MAGIC);
    head.extend_from_slice(&header.version.to_le_bytes());
    head.extend_from_slice(&1u32.to_le_bytes());
    head.extend_from_slice(&(entry.image.len() as u32).to_le_bytes());
    head.extend_from_slice(&(name_block.len() as u32).to_le_bytes());
    head.extend_from_slice(&entry.size.to_le_bytes());
    head.extend_from_slice(&header.mode.to_le_bytes());

    if let Some(extra) = header.extra {
        head.extend_from_slice(&extra);
    }

    head.extend_from_slice(&header.zero);
    head.extend_from_slice(&header.hash);
    head.extend_from_slice(&header.dummy);

    sink.write_all(&head)
        .map_err(SplitError::from_io(SplitErrorKind::Header))?;

    sink.write_all(&entry.image)
        .map_err(SplitError::from_io(SplitErrorKind::Directory))?;

    sink.write_all(&name_block)
        .map_err(SplitError::from_io(SplitErrorKind::NameTable))?;

    source
        .seek_to(header.payload_offset() + u64::from(entry.data_offset))
        .map_err(SplitError::from_read(SplitErrorKind::Payload))?;

    source
        .copy_to(u64::from(entry.size), &mut sink)
        .map_err(SplitError::from_io(SplitErrorKind::Payload))
}

// The name table of a split bank holds a single offset entry pointing just
// past itself, the name as a null-terminated Latin-1 string, and zero padding
// up to the next 16-byte boundary.
fn build_name_block(name: &str) -> Vec<u8> {
    let len = (name.chars().count() + 5).next_multiple_of(16);

    let mut block = Vec::with_capacity(len);
    block.extend_from_slice(&4u32.to_le_bytes());
    // names are Latin-1, so every char fits in one byte
    block.extend(name.chars().map(|c| c as u8));
    block.resize(len, 0);

    block
}

/// The error type returned when writing out a single-sample bank fails.
#[derive(Debug)]
pub struct SplitError {
    kind: SplitErrorKind,
    source: SplitErrorSource,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SplitErrorKind {
    Header,
    Directory,
    NameTable,
    Payload,
}

#[derive(Debug)]
enum SplitErrorSource {
    Read(ReadError),
    Io(IoError),
}

impl SplitError {
    fn from_read(kind: SplitErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self {
            kind,
            source: SplitErrorSource::Read(source),
        }
    }

    fn from_io(kind: SplitErrorKind) -> impl FnOnce(IoError) -> Self {
        move |source| Self {
            kind,
            source: SplitErrorSource::Io(source),
        }
    }
}

impl Display for SplitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(match self.kind {
            SplitErrorKind::Header => "failed to write bank header",
            SplitErrorKind::Directory => "failed to write sample directory",
            SplitErrorKind::NameTable => "failed to write name table",
            SplitErrorKind::Payload => "failed to copy sample payload",
        })
    }
}

impl Error for SplitError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            SplitErrorSource::Read(e) => Some(e),
            SplitErrorSource::Io(e) => Some(e),
        }
    }
}
