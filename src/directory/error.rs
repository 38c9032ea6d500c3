use crate::read::ReadError;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[derive(Debug)]
pub(crate) struct EntryError {
    index: u32,
    kind: EntryErrorKind,
    source: Option<EntryErrorSource>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum EntryErrorKind {
    Descriptor,
    Chunk,
    PayloadBounds { start: u64, end: u64 },
    PayloadTooLarge { size: u64 },
}

#[derive(Debug)]
enum EntryErrorSource {
    Read(ReadError),
    Chunk(ChunkError),
}

impl EntryError {
    pub(crate) fn new(index: u32, kind: EntryErrorKind) -> Self {
        Self {
            index,
            kind,
            source: None,
        }
    }

    pub(crate) fn new_with_source(index: u32, kind: EntryErrorKind, source: ReadError) -> Self {
        Self {
            index,
            kind,
            source: Some(EntryErrorSource::Read(source)),
        }
    }

    pub(crate) fn factory(index: u32, kind: EntryErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self::new_with_source(index, kind, source)
    }

    pub(crate) fn kind(&self) -> EntryErrorKind {
        self.kind
    }

    #[cfg(test)]
    pub(crate) fn is_chunk_kind(&self, kind: ChunkErrorKind) -> bool {
        match &self.source {
            Some(EntryErrorSource::Chunk(e)) => e.kind == kind,
            _ => false,
        }
    }
}

impl Display for EntryError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use EntryErrorKind::*;

        match self.kind {
            Descriptor => f.write_str("failed to read sample descriptor"),
            Chunk => f.write_str("failed to parse sample extension chunk"),
            PayloadBounds { start, end } => f.write_str(&format!(
                "sample payload ends before it starts (bytes 0x{start:x}..0x{end:x})"
            )),
            PayloadTooLarge { size } => f.write_str(&format!(
                "sample payload ({size} bytes) does not fit in a 32-bit size field"
            )),
        }?;

        f.write_str(&format!(" - directory entry at index {}", self.index))
    }
}

impl Error for EntryError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(source) => match source {
                EntryErrorSource::Read(e) => Some(e),
                EntryErrorSource::Chunk(e) => Some(e),
            },
            None => None,
        }
    }
}

#[derive(Debug)]
pub(crate) struct ChunkError {
    index: u32,
    kind: ChunkErrorKind,
    source: Option<ReadError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChunkErrorKind {
    Flags,
    Data,
    Overrun,
}

impl ChunkError {
    pub(crate) fn new(index: u32, kind: ChunkErrorKind) -> Self {
        Self {
            index,
            kind,
            source: None,
        }
    }

    pub(crate) fn new_with_source(index: u32, kind: ChunkErrorKind, source: ReadError) -> Self {
        Self {
            index,
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn factory(index: u32, kind: ChunkErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self::new_with_source(index, kind, source)
    }

    pub(crate) fn into_entry_err(self, entry_index: u32) -> EntryError {
        EntryError {
            index: entry_index,
            kind: EntryErrorKind::Chunk,
            source: Some(EntryErrorSource::Chunk(self)),
        }
    }
}

impl Display for ChunkError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use ChunkErrorKind::*;

        match self.kind {
            Flags => f.write_str("failed to read extension chunk flags"),
            Data => f.write_str("failed to read extension chunk data"),
            Overrun => {
                f.write_str("extension chunk chain runs past the end of the sample directory")
            }
        }?;

        f.write_str(&format!(" - extension chunk at index {}", self.index))
    }
}

impl Error for ChunkError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(source) => Some(source),
            None => None,
        }
    }
}
