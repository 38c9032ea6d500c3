use crate::read::ReadError;
use std::{
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
};

#[derive(Debug)]
pub(crate) struct HeaderError {
    kind: HeaderErrorKind,
    source: Option<ReadError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum HeaderErrorKind {
    Magic,
    UnsupportedRevision { revision: u8 },
    Rewind,
    Version,
    SampleCount,
    DirectorySize,
    NameTableSize,
    PayloadSize,
    Mode,
    Extra,
    Metadata,
}

impl HeaderError {
    pub(crate) fn new(kind: HeaderErrorKind) -> Self {
        Self { kind, source: None }
    }

    pub(crate) fn new_with_source(kind: HeaderErrorKind, source: ReadError) -> Self {
        Self {
            kind,
            source: Some(source),
        }
    }

    pub(crate) fn factory(kind: HeaderErrorKind) -> impl FnOnce(ReadError) -> Self {
        move |source| Self::new_with_source(kind, source)
    }

    pub(crate) fn kind(&self) -> HeaderErrorKind {
        self.kind
    }
}

impl Display for HeaderError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        #[allow(clippy::enum_glob_use)]
        use HeaderErrorKind::*;

        match self.kind {
            Magic => f.write_str("no bank signature found"),
            UnsupportedRevision { revision } => f.write_str(&format!(
                "bank revision '{}' is not FSB5",
                revision.escape_ascii()
            )),
            Rewind => f.write_str("failed to rewind to the start of the bank"),
            Version => f.write_str("failed to read bank format version"),
            SampleCount => f.write_str("failed to read number of samples"),
            DirectorySize => f.write_str("failed to read size of sample directory"),
            NameTableSize => f.write_str("failed to read size of name table"),
            PayloadSize => f.write_str("failed to read declared size of sample data"),
            Mode => f.write_str("failed to read bank mode flags"),
            Extra => f.write_str("failed to read legacy extra bytes"),
            Metadata => f.write_str("failed to read reserved metadata bytes"),
        }
    }
}

impl Error for HeaderError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(e) => Some(e),
            None => None,
        }
    }
}
