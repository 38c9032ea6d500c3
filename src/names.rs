use crate::{
    header::BankHeader,
    read::{ReadError, Reader},
};
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{Read, Seek},
};

/// Reads the bank's name table and returns one name per sample.
///
/// The table has two parts: one table-relative offset per sample, then the
/// names themselves as null-terminated strings. The offsets are not required
/// to be sorted, so each name is located through its own offset instead of by
/// walking the string region linearly. Name bytes are decoded as Latin-1,
/// which maps every byte value to the code point of the same value.
pub(crate) fn read_names<R: Read + Seek>(
    reader: &mut Reader<R>,
    header: &BankHeader,
) -> Result<Vec<Box<str>>, NameError> {
    let base = header.name_table_offset();
    let endian = header.endian;

    reader
        .seek_to(base)
        .map_err(NameError::factory(0, NameErrorKind::Offset))?;

    // one 32-bit offset per sample; the table size caps the reservation
    let capacity = header.sample_count.min(header.name_table_size / 4);
    let mut offsets = Vec::with_capacity(capacity as usize);

    for index in 0..header.sample_count {
        let offset = reader
            .u32(endian)
            .map_err(NameError::factory(index, NameErrorKind::Offset))?;

        offsets.push(offset);
    }

    let mut names = Vec::with_capacity(offsets.len());

    for (index, offset) in (0u32..).zip(offsets) {
        reader
            .seek_to(base + u64::from(offset))
            .map_err(NameError::factory(index, NameErrorKind::Name))?;

        names.push(read_name(reader, index)?);
    }

    Ok(names)
}

fn read_name<R: Read>(reader: &mut Reader<R>, index: u32) -> Result<Box<str>, NameError> {
    let mut name = String::new();

    loop {
        let byte = reader
            .u8()
            .map_err(NameError::factory(index, NameErrorKind::Name))?;

        if byte == 0 {
            return Ok(name.into_boxed_str());
        }

        name.push(char::from(byte));
    }
}

#[derive(Debug)]
pub(crate) struct NameError {
    index: u32,
    kind: NameErrorKind,
    source: ReadError,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum NameErrorKind {
    Offset,
    Name,
}

impl NameError {
    fn factory(index: u32, kind: NameErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self {
            index,
            kind,
            source,
        }
    }

    pub(crate) fn kind(&self) -> NameErrorKind {
        self.kind
    }
}

impl Display for NameError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self.kind {
            NameErrorKind::Offset => f.write_str("failed to read sample name offset")?,
            NameErrorKind::Name => f.write_str("failed to read sample name")?,
        }

        write!(f, " - name at index {}", self.index)
    }
}

impl Error for NameError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        Some(&self.source)
    }
}
