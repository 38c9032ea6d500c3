use crate::{
    directory::{error::EntryError, parse_directory, DescriptorWidth, SampleEntry},
    header::{error::HeaderError, BankHeader, Signature},
    names::{read_names, NameError},
    read::{Endian, ReadError, Reader},
    split::{write_sample, SplitError},
};
use std::{
    error::Error,
    fmt::{Debug, Display, Formatter, Result as FmtResult},
    io::{Read, Seek, Write},
};

/// A parsed FSB5 sound bank.
///
/// Parsing reads the header, the sample directory, and the name table up
/// front. Sample payloads stay in the source stream until they are written
/// out through [`process_samples`](Self::process_samples).
pub struct Bank<R: Read> {
    header: BankHeader,
    samples: Box<[SampleEntry]>,
    reader: Reader<R>,
}

impl<R: Read + Seek> Bank<R> {
    /// Parses a bank from `source`, assuming 64-bit directory descriptors.
    ///
    /// # Errors
    ///
    /// Fails when the source is not an FSB5 bank, when the header, sample
    /// directory, or name table cannot be read, or when the directory
    /// describes payloads with impossible bounds.
    pub fn new(source: R) -> Result<Self, ParseError> {
        Self::with_descriptor_width(source, DescriptorWidth::default())
    }

    /// Parses a bank whose directory uses the given descriptor width.
    ///
    /// # Errors
    ///
    /// Same failure conditions as [`new`](Self::new).
    pub fn with_descriptor_width(source: R, width: DescriptorWidth) -> Result<Self, ParseError> {
        let mut reader = Reader::new(source);

        let file_len = reader.stream_len()?;
        let signature = Signature::parse(&mut reader)?;
        let header = BankHeader::parse(&mut reader, signature.endian)?;

        let mut samples = parse_directory(&mut reader, &header, width, file_len)?;

        if header.name_table_size != 0 {
            let names = read_names(&mut reader, &header)?;

            for (sample, name) in samples.iter_mut().zip(names) {
                sample.name = Some(name);
            }
        }

        Ok(Self {
            header,
            samples: samples.into_boxed_slice(),
            reader,
        })
    }

    /// Visits every sample in directory order.
    ///
    /// Processing stops at the first callback error, which is returned
    /// together with the index of the failing sample.
    ///
    /// # Errors
    ///
    /// Returns whatever error the callback produced.
    pub fn process_samples<F, E>(mut self, mut f: F) -> Result<(), (E, u32)>
    where
        F: FnMut(Sample<'_, R>) -> Result<(), E>,
    {
        for (entry, index) in self.samples.iter().zip(0..) {
            f(Sample {
                index,
                header: &self.header,
                entry,
                reader: &mut self.reader,
            })
            .map_err(|e| (e, index))?;
        }

        Ok(())
    }
}

impl<R: Read> Bank<R> {
    /// Number of samples in the bank.
    pub fn sample_count(&self) -> u32 {
        self.header.sample_count
    }

    /// Byte order of the source bank.
    pub fn endian(&self) -> Endian {
        self.header.endian
    }

    /// Format version recorded in the bank header.
    pub fn version(&self) -> u32 {
        self.header.version
    }
}

impl<R: Read> Debug for Bank<R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Bank")
            .field("header", &self.header)
            .field("samples", &self.samples)
            .finish_non_exhaustive()
    }
}

/// A single sample of a parsed bank, ready to be written out.
pub struct Sample<'bank, R: Read> {
    index: u32,
    header: &'bank BankHeader,
    entry: &'bank SampleEntry,
    reader: &'bank mut Reader<R>,
}

impl<R: Read + Seek> Sample<'_, R> {
    /// Writes the sample out as a standalone single-sample bank.
    ///
    /// Returns the number of payload bytes copied, which falls short of
    /// [`size`](Self::size) when the source bank is truncated.
    ///
    /// # Errors
    ///
    /// Fails when reading the payload or writing to the sink fails.
    pub fn write<W: Write>(self, sink: W) -> Result<u64, SplitError> {
        write_sample(self.header, self.entry, self.reader, sink)
    }
}

impl<R: Read> Sample<'_, R> {
    /// Position of the sample in the bank's directory.
    pub fn index(&self) -> u32 {
        self.index
    }

    /// Name from the bank's name table, if one was present.
    pub fn name(&self) -> Option<&str> {
        self.entry.name.as_deref()
    }

    /// Payload size in bytes, as recorded in the rebuilt directory entry.
    pub fn size(&self) -> u32 {
        self.entry.size
    }
}

impl<R: Read> Debug for Sample<'_, R> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("Sample")
            .field("index", &self.index)
            .field("entry", &self.entry)
            .finish_non_exhaustive()
    }
}

/// The error type returned when parsing a bank fails.
#[derive(Debug)]
pub struct ParseError {
    source: Box<ParseErrorSource>,
}

#[derive(Debug)]
enum ParseErrorSource {
    Read(ReadError),
    Header(HeaderError),
    Entry(EntryError),
    Name(NameError),
}

impl From<ReadError> for ParseError {
    fn from(value: ReadError) -> Self {
        Self {
            source: Box::new(ParseErrorSource::Read(value)),
        }
    }
}

impl From<HeaderError> for ParseError {
    fn from(value: HeaderError) -> Self {
        Self {
            source: Box::new(ParseErrorSource::Header(value)),
        }
    }
}

impl From<EntryError> for ParseError {
    fn from(value: EntryError) -> Self {
        Self {
            source: Box::new(ParseErrorSource::Entry(value)),
        }
    }
}

impl From<NameError> for ParseError {
    fn from(value: NameError) -> Self {
        Self {
            source: Box::new(ParseErrorSource::Name(value)),
        }
    }
}

impl Display for ParseError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &*self.source {
            ParseErrorSource::Read(e) => Display::fmt(e, f),
            ParseErrorSource::Header(e) => Display::fmt(e, f),
            ParseErrorSource::Entry(e) => Display::fmt(e, f),
            ParseErrorSource::Name(e) => Display::fmt(e, f),
        }
    }
}

impl Error for ParseError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &*self.source {
            ParseErrorSource::Read(e) => e.source(),
            ParseErrorSource::Header(e) => e.source(),
            ParseErrorSource::Entry(e) => e.source(),
            ParseErrorSource::Name(e) => e.source(),
        }
    }
}
