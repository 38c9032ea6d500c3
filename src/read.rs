use std::{
    cmp::min,
    error::Error,
    fmt::{Display, Formatter, Result as FmtResult},
    io::{copy, Error as IoError, ErrorKind, Read, Seek, SeekFrom, Write},
    num::NonZeroUsize,
};

/// Byte order of the multi-byte integer fields in a bank.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Endian {
    /// Least significant byte first; banks whose signature starts with `FSB`.
    Little,
    /// Most significant byte first; banks with a reversed signature.
    Big,
}

impl Endian {
    pub(crate) fn u32(self, bytes: [u8; 4]) -> u32 {
        match self {
            Self::Little => u32::from_le_bytes(bytes),
            Self::Big => u32::from_be_bytes(bytes),
        }
    }

    pub(crate) fn u64(self, bytes: [u8; 8]) -> u64 {
        match self {
            Self::Little => u64::from_le_bytes(bytes),
            Self::Big => u64::from_be_bytes(bytes),
        }
    }
}

pub(crate) struct Reader<R: Read> {
    inner: R,
    position: u64,
}

impl<R: Read> Reader<R> {
    pub(crate) fn new(reader: R) -> Self {
        Self {
            inner: reader,
            position: 0,
        }
    }

    fn read_to_slice(&mut self, buf: &mut [u8]) -> ReadResult<()> {
        let mut filled = 0;

        // Sources like `BufReader` may return fewer bytes than requested at
        // buffer boundaries, so short reads are resumed until the slice is
        // full or the source ends.
        while filled < buf.len() {
            match self.inner.read(&mut buf[filled..]) {
                Ok(0) => {
                    return Err(self.to_error(ReadErrorKind::Incomplete(Needed::Size(
                        NonZeroUsize::new(buf.len() - filled)
                            .expect("filled is less than the buffer length"),
                    ))))
                }
                Ok(n) => {
                    filled += n;
                    self.position += n as u64;
                }
                Err(e) => match e.kind() {
                    // this I/O error is non-fatal, so reading is retried
                    ErrorKind::Interrupted => {}
                    ErrorKind::UnexpectedEof => {
                        return Err(self.to_error(ReadErrorKind::Incomplete(Needed::Unknown)))
                    }
                    _ => return Err(self.to_error_with_source(ReadErrorKind::Failure, e)),
                },
            }
        }

        Ok(())
    }

    pub(crate) fn position(&self) -> u64 {
        self.position
    }

    pub(crate) fn take_const<const LEN: usize>(&mut self) -> ReadResult<[u8; LEN]> {
        let mut buf = [0; LEN];
        self.read_to_slice(&mut buf)?;
        Ok(buf)
    }

    pub(crate) fn take(&mut self, len: usize) -> ReadResult<Vec<u8>> {
        let mut buf = vec![0; len];
        self.read_to_slice(buf.as_mut_slice())?;
        Ok(buf)
    }

    pub(crate) fn u8(&mut self) -> ReadResult<u8> {
        let mut buf = [0; 1];
        self.read_to_slice(&mut buf)?;
        Ok(buf[0])
    }

    pub(crate) fn u32(&mut self, endian: Endian) -> ReadResult<u32> {
        let mut buf = [0; 4];
        self.read_to_slice(&mut buf)?;
        Ok(endian.u32(buf))
    }

    pub(crate) fn u64(&mut self, endian: Endian) -> ReadResult<u64> {
        let mut buf = [0; 8];
        self.read_to_slice(&mut buf)?;
        Ok(endian.u64(buf))
    }
}

impl<R: Read + Seek> Reader<R> {
    pub(crate) fn seek_to(&mut self, position: u64) -> ReadResult<()> {
        match self.inner.seek(SeekFrom::Start(position)) {
            Ok(reached) => {
                self.position = reached;
                Ok(())
            }
            Err(e) => Err(self.to_error_with_source(ReadErrorKind::Seek, e)),
        }
    }

    pub(crate) fn stream_len(&mut self) -> ReadResult<u64> {
        let len = self
            .inner
            .seek(SeekFrom::End(0))
            .map_err(|e| self.to_error_with_source(ReadErrorKind::Seek, e))?;

        self.inner
            .seek(SeekFrom::Start(self.position))
            .map_err(|e| self.to_error_with_source(ReadErrorKind::Seek, e))?;

        Ok(len)
    }
}

impl<R: Read> Reader<R> {
    /// Streams up to `len` bytes from the current position into `sink`,
    /// stopping early if the source ends first. Returns the copied count.
    pub(crate) fn copy_to<W: Write>(&mut self, len: u64, sink: &mut W) -> Result<u64, IoError> {
        let mut capped = CappedReader {
            inner: &mut self.inner,
            limit: len,
        };
        let copied = copy(&mut capped, sink)?;
        self.position += copied;
        Ok(copied)
    }
}

// essentially `std::io::Take` but with a mutable reference to a reader instead of owning it
struct CappedReader<'reader, R: Read> {
    inner: &'reader mut R,
    limit: u64,
}

impl<'reader, R: Read> Read for CappedReader<'reader, R> {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, IoError> {
        if self.limit == 0 {
            return Ok(0);
        }

        let max = min(buf.len(), usize::try_from(self.limit).unwrap_or(usize::MAX));
        let n = self.inner.read(&mut buf[..max])?;
        self.limit -= n as u64;
        Ok(n)
    }
}

pub(crate) type ReadResult<T> = Result<T, ReadError>;

#[derive(Debug)]
pub(crate) struct ReadError {
    position: u64,
    kind: ReadErrorKind,
    source: Option<IoError>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ReadErrorKind {
    Failure,
    Incomplete(Needed),
    Seek,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Needed {
    Size(NonZeroUsize),
    Unknown,
}

impl<R: Read> Reader<R> {
    fn to_error(&self, kind: ReadErrorKind) -> ReadError {
        ReadError {
            position: self.position,
            kind,
            source: None,
        }
    }

    fn to_error_with_source(&self, kind: ReadErrorKind, source: IoError) -> ReadError {
        ReadError {
            position: self.position,
            kind,
            source: Some(source),
        }
    }
}

#[cfg(test)]
impl ReadError {
    fn is_kind(&self, kind: ReadErrorKind) -> bool {
        self.kind == kind
    }
}

impl Display for ReadError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ReadErrorKind::Failure => f.write_str("failed to read data due to I/O error"),
            ReadErrorKind::Incomplete(needed) => match needed {
                Needed::Size(size) => {
                    f.write_str(&format!("incomplete data: needed {size} more bytes to read"))
                }
                Needed::Unknown => f.write_str("incomplete data"),
            },
            ReadErrorKind::Seek => f.write_str("failed to seek due to I/O error"),
        }?;

        f.write_str(&format!(" - byte position {}", self.position))
    }
}

impl Error for ReadError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.source {
            Some(e) => Some(e),
            None => None,
        }
    }
}
