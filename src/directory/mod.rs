pub(crate) mod error;

use crate::{
    header::BankHeader,
    read::{Endian, Reader},
};
use bilge::prelude::*;
use error::{ChunkError, ChunkErrorKind, EntryError, EntryErrorKind};
use std::{
    io::{Read, Seek},
    iter::zip,
};
use tap::Pipe;

/// Width of the primary descriptor word of each directory entry.
///
/// Current banks pack the descriptor into 64 bits. Some early FSB5 revisions
/// used 32-bit descriptors with the same low-bit layout, so the width is a
/// caller decision rather than something inferred from the bank.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum DescriptorWidth {
    /// 32-bit primary words.
    U32,
    /// 64-bit primary words.
    #[default]
    U64,
}

/// One decoded directory entry.
///
/// `image` holds the entry exactly as a split bank will carry it: every word
/// re-encoded little-endian, the payload-offset sub-field of the primary word
/// cleared to zero, extension chunk payloads byte-for-byte.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(crate) struct SampleEntry {
    pub(crate) image: Box<[u8]>,
    pub(crate) data_offset: u32,
    pub(crate) size: u32,
    pub(crate) name: Option<Box<str>>,
}

// Descriptors pack a chunk-chain flag, opaque mode bits, the payload offset
// in units of 32 bytes, and the sample count. 32-bit descriptors are widened
// before decoding, leaving the upper fields zero.
#[bitsize(64)]
#[derive(FromBits)]
struct RawDescriptor {
    has_chunks: bool,
    mode: u6,
    data_offset: u27,
    num_samples: u30,
}

#[bitsize(32)]
#[derive(FromBits)]
struct RawChunk {
    more_chunks: bool,
    size: u23,
    kind: u8,
}

// bits 7..34 of a primary word hold the offset field
const DESCRIPTOR_OFFSET_MASK: u64 = 0x7FF_FFFF << 7;

struct DecodedEntry {
    image: Vec<u8>,
    data_offset: u32,
    word: u64,
    start: u64,
}

/// Walks the sample directory from the reader's current position and returns
/// one entry per sample, with payload sizes resolved by adjacent difference.
pub(crate) fn parse_directory<R: Read + Seek>(
    reader: &mut Reader<R>,
    header: &BankHeader,
    width: DescriptorWidth,
    file_len: u64,
) -> Result<Vec<SampleEntry>, EntryError> {
    let endian = header.endian;
    let directory_end = header.name_table_offset();

    // a descriptor is at least one 32-bit word, so the directory region caps
    // how many entries the declared sample count can actually hold
    let capacity = header.sample_count.min(header.directory_size / 4);
    let mut decoded = Vec::with_capacity(capacity as usize);

    for index in 0..header.sample_count {
        let start = reader.position();

        let word = match width {
            DescriptorWidth::U32 => reader.u32(endian).map(u64::from),
            DescriptorWidth::U64 => reader.u64(endian),
        }
        .map_err(EntryError::factory(index, EntryErrorKind::Descriptor))?;

        let descriptor = word.pipe(RawDescriptor::from);

        let mut image = Vec::new();
        push_cleared_descriptor(&mut image, word, width);

        if descriptor.has_chunks() {
            read_chunks(reader, endian, directory_end, &mut image)
                .map_err(|e| e.into_entry_err(index))?;
        }

        decoded.push(DecodedEntry {
            image,
            data_offset: descriptor.data_offset().value() * 32,
            word,
            start,
        });
    }

    resolve_sizes(decoded, header.payload_offset(), directory_end, file_len)
}

fn push_cleared_descriptor(image: &mut Vec<u8>, word: u64, width: DescriptorWidth) {
    let cleared = word & !DESCRIPTOR_OFFSET_MASK;

    match width {
        DescriptorWidth::U32 => image.extend_from_slice(
            &u32::try_from(cleared)
                .expect("the upper bits of a widened 32-bit descriptor are zero")
                .to_le_bytes(),
        ),
        DescriptorWidth::U64 => image.extend_from_slice(&cleared.to_le_bytes()),
    }
}

fn read_chunks<R: Read>(
    reader: &mut Reader<R>,
    endian: Endian,
    directory_end: u64,
    image: &mut Vec<u8>,
) -> Result<(), ChunkError> {
    for index in 0.. {
        // a chain that claims more chunks than the directory region can hold
        // is malformed; stop before walking into the name table
        if reader.position() >= directory_end {
            return Err(ChunkError::new(index, ChunkErrorKind::Overrun));
        }

        let word = reader
            .u32(endian)
            .map_err(ChunkError::factory(index, ChunkErrorKind::Flags))?;

        let chunk = word.pipe(RawChunk::from);

        image.extend_from_slice(&word.to_le_bytes());

        let data = reader
            .take(chunk.size().value() as usize)
            .map_err(ChunkError::factory(index, ChunkErrorKind::Data))?;

        image.extend_from_slice(&data);

        if !chunk.more_chunks() {
            break;
        }
    }

    Ok(())
}

fn resolve_sizes(
    decoded: Vec<DecodedEntry>,
    payload_offset: u64,
    directory_end: u64,
    file_len: u64,
) -> Result<Vec<SampleEntry>, EntryError> {
    let mut sizes = Vec::with_capacity(decoded.len());

    for (index, entry) in (0u32..).zip(&decoded) {
        let start = payload_offset + u64::from(entry.data_offset);

        // The next entry's offset bounds this sample. The bound falls back to
        // the physical end of the file when no next entry exists, when the
        // next primary word is all zeros (trailing directory padding), or
        // when that word was read from beyond the directory region.
        let end = match decoded.get(index as usize + 1) {
            Some(next) if next.word != 0 && next.start < directory_end => {
                payload_offset + u64::from(next.data_offset)
            }
            _ => file_len,
        };

        let Some(size) = end.checked_sub(start) else {
            return Err(EntryError::new(
                index,
                EntryErrorKind::PayloadBounds { start, end },
            ));
        };

        let size = u32::try_from(size)
            .map_err(|_| EntryError::new(index, EntryErrorKind::PayloadTooLarge { size }))?;

        sizes.push(size);
    }

    Ok(zip(decoded, sizes)
        .map(|(entry, size)| SampleEntry {
            image: entry.image.into_boxed_slice(),
            data_offset: entry.data_offset,
            size,
            name: None,
        })
        .collect())
}

#[cfg(test)]
mod test {
    use super::{
        error::{ChunkErrorKind, EntryErrorKind},
        parse_directory, DescriptorWidth, RawChunk, RawDescriptor, SampleEntry,
    };
    use crate::{
        header::BankHeader,
        read::{Endian, Reader},
    };
    use std::io::Cursor;

    fn descriptor_word(has_chunks: bool, data_offset: u32, num_samples: u32) -> u64 {
        assert_eq!(data_offset % 32, 0);
        u64::from(has_chunks)
            | (u64::from(data_offset >> 5) << 7)
            | (u64::from(num_samples) << 34)
    }

    fn chunk_word(more_chunks: bool, len: u32, kind: u8) -> u32 {
        u32::from(more_chunks) | (len << 1) | (u32::from(kind) << 24)
    }

    fn test_header(sample_count: u32, directory_size: u32) -> BankHeader {
        BankHeader {
            endian: Endian::Little,
            version: 1,
            sample_count,
            directory_size,
            name_table_size: 0,
            payload_size: 0,
            mode: 0,
            extra: None,
            zero: [0; 8],
            hash: [0; 16],
            dummy: [0; 8],
        }
    }

    /// Lays out 60 filler bytes, the given directory words, and a payload
    /// region, then parses the directory starting at offset 60.
    fn parse(
        header: &BankHeader,
        directory: &[u8],
        payload_len: u64,
        width: DescriptorWidth,
    ) -> Result<Vec<SampleEntry>, super::error::EntryError> {
        assert_eq!(u64::from(header.directory_size), directory.len() as u64);

        let mut data = vec![0u8; 60];
        data.extend_from_slice(directory);
        data.resize(data.len() + usize::try_from(payload_len).unwrap(), 0xEE);

        let file_len = data.len() as u64;
        let mut reader = Reader::new(Cursor::new(data));
        reader.seek_to(header.directory_offset()).unwrap();

        parse_directory(&mut reader, header, width, file_len)
    }

    #[test]
    fn descriptor_bit_extraction() {
        let word = 1 | (21 << 1) | (0x0123_456 << 7) | (0x2BCD_E00 << 34);
        let descriptor = RawDescriptor::from(word);

        assert!(descriptor.has_chunks());
        assert_eq!(descriptor.mode().value(), 21);
        assert_eq!(descriptor.data_offset().value(), 0x0123_456);
        assert_eq!(descriptor.num_samples().value(), 0x2BCD_E00);
    }

    #[test]
    fn chunk_bit_extraction() {
        let chunk = RawChunk::from(chunk_word(true, 0x1234, 0x56));

        assert!(chunk.more_chunks());
        assert_eq!(chunk.size().value(), 0x1234);
        assert_eq!(chunk.kind(), 0x56);
    }

    #[test]
    fn sizes_from_adjacent_offsets() {
        let mut directory = Vec::new();
        directory.extend_from_slice(&descriptor_word(false, 0, 10).to_le_bytes());
        directory.extend_from_slice(&descriptor_word(false, 64, 10).to_le_bytes());
        directory.extend_from_slice(&descriptor_word(false, 96, 10).to_le_bytes());

        let header = test_header(3, 24);
        let entries = parse(&header, &directory, 120, DescriptorWidth::U64).unwrap();

        assert_eq!(entries[0].data_offset, 0);
        assert_eq!(entries[0].size, 64);
        assert_eq!(entries[1].data_offset, 64);
        assert_eq!(entries[1].size, 32);
        // the last sample runs to the end of the file
        assert_eq!(entries[2].data_offset, 96);
        assert_eq!(entries[2].size, 24);
    }

    #[test]
    fn offset_field_is_cleared_in_the_image() {
        let word = descriptor_word(false, 0x40, 7);
        let header = test_header(1, 8);
        let entries = parse(&header, &word.to_le_bytes(), 0x60, DescriptorWidth::U64).unwrap();

        let image = u64::from_le_bytes(entries[0].image[..8].try_into().unwrap());
        let reparsed = RawDescriptor::from(image);

        assert_eq!(entries[0].data_offset, 0x40);
        assert_eq!(reparsed.data_offset().value(), 0);
        assert_eq!(reparsed.num_samples().value(), 7);
        assert!(!reparsed.has_chunks());
    }

    #[test]
    fn chunk_chain_is_preserved_verbatim() {
        let mut directory = Vec::new();
        directory.extend_from_slice(&descriptor_word(true, 0, 1).to_le_bytes());
        directory.extend_from_slice(&chunk_word(true, 3, 5).to_le_bytes());
        directory.extend_from_slice(b"abc");
        directory.extend_from_slice(&chunk_word(false, 4, 9).to_le_bytes());
        directory.extend_from_slice(b"wxyz");

        let len = u32::try_from(directory.len()).unwrap();
        let header = test_header(1, len);
        let entries = parse(&header, &directory, 32, DescriptorWidth::U64).unwrap();

        let mut expected = Vec::new();
        expected.extend_from_slice(&descriptor_word(true, 0, 1).to_le_bytes());
        expected.extend_from_slice(&chunk_word(true, 3, 5).to_le_bytes());
        expected.extend_from_slice(b"abc");
        expected.extend_from_slice(&chunk_word(false, 4, 9).to_le_bytes());
        expected.extend_from_slice(b"wxyz");

        assert_eq!(*entries[0].image, expected[..]);
    }

    #[test]
    fn narrow_descriptors_decode_the_same_fields() {
        let word = 1u32 << 7; // offset field 1 = 32 bytes, no chunks
        let mut directory = Vec::new();
        directory.extend_from_slice(&word.to_le_bytes());
        directory.extend_from_slice(&(2u32 << 7).to_le_bytes());

        let header = test_header(2, 8);
        let entries = parse(&header, &directory, 96, DescriptorWidth::U32).unwrap();

        assert_eq!(entries[0].data_offset, 32);
        assert_eq!(entries[0].size, 32);
        assert_eq!(entries[0].image.len(), 4);
        assert_eq!(entries[1].data_offset, 64);
        assert_eq!(entries[1].size, 32);
    }

    #[test]
    fn big_endian_words_decode_identically() {
        let mut directory = Vec::new();
        directory.extend_from_slice(&descriptor_word(true, 0, 3).to_be_bytes());
        directory.extend_from_slice(&chunk_word(false, 2, 1).to_be_bytes());
        directory.extend_from_slice(b"hi");
        directory.extend_from_slice(&descriptor_word(false, 32, 3).to_be_bytes());

        let len = u32::try_from(directory.len()).unwrap();
        let header = BankHeader {
            endian: Endian::Big,
            ..test_header(2, len)
        };
        let entries = parse(&header, &directory, 64, DescriptorWidth::U64).unwrap();

        assert_eq!(entries[0].data_offset, 0);
        assert_eq!(entries[0].size, 32);
        // images are normalized to little-endian
        assert_eq!(
            entries[0].image[8..12],
            chunk_word(false, 2, 1).to_le_bytes()
        );
        assert_eq!(entries[1].data_offset, 32);
    }

    #[test]
    fn zero_lookahead_word_falls_back_to_file_end() {
        let mut directory = Vec::new();
        directory.extend_from_slice(&descriptor_word(false, 0, 5).to_le_bytes());
        directory.extend_from_slice(&0u64.to_le_bytes());

        let header = test_header(2, 16);
        let entries = parse(&header, &directory, 100, DescriptorWidth::U64).unwrap();

        // 60-byte filler + 16-byte directory + 100-byte payload
        assert_eq!(entries[0].size, 100);
        assert_eq!(entries[1].size, 100);
    }

    #[test]
    fn chunk_chain_overrun_is_rejected() {
        let mut directory = Vec::new();
        directory.extend_from_slice(&descriptor_word(true, 0, 1).to_le_bytes());
        directory.extend_from_slice(&chunk_word(true, 0, 1).to_le_bytes());

        let header = test_header(1, 12);
        let err = parse(&header, &directory[..12], 64, DescriptorWidth::U64).unwrap_err();

        assert_eq!(err.kind(), EntryErrorKind::Chunk);
        assert!(err.is_chunk_kind(ChunkErrorKind::Overrun));
    }

    #[test]
    fn inverted_offsets_are_rejected() {
        let mut directory = Vec::new();
        directory.extend_from_slice(&descriptor_word(false, 64, 1).to_le_bytes());
        directory.extend_from_slice(&descriptor_word(false, 0, 1).to_le_bytes());

        let header = test_header(2, 16);
        let err = parse(&header, &directory, 80, DescriptorWidth::U64).unwrap_err();

        assert!(matches!(
            err.kind(),
            EntryErrorKind::PayloadBounds { .. }
        ));
    }

    #[test]
    fn oversized_payload_is_rejected() {
        let word = descriptor_word(false, 0, 1);
        let header = test_header(1, 8);

        let mut data = vec![0u8; 60];
        data.extend_from_slice(&word.to_le_bytes());

        let mut reader = Reader::new(Cursor::new(data));
        reader.seek_to(60).unwrap();

        // pretend the payload region is 4 GiB or longer
        let file_len = 68 + (u64::from(u32::MAX) + 1);
        let err = parse_directory(&mut reader, &header, DescriptorWidth::U64, file_len)
            .unwrap_err();

        assert!(matches!(
            err.kind(),
            EntryErrorKind::PayloadTooLarge { .. }
        ));
    }

    #[test]
    fn truncated_descriptor_is_reported() {
        let word = descriptor_word(false, 0, 1);
        let header = test_header(2, 16);

        let mut data = vec![0u8; 60];
        data.extend_from_slice(&word.to_le_bytes());
        data.extend_from_slice(&[0; 4]); // half of the second descriptor

        let file_len = data.len() as u64;
        let mut reader = Reader::new(Cursor::new(data));
        reader.seek_to(60).unwrap();

        let err =
            parse_directory(&mut reader, &header, DescriptorWidth::U64, file_len).unwrap_err();

        assert_eq!(err.kind(), EntryErrorKind::Descriptor);
    }

    #[test]
    fn overstated_sample_count_is_rejected() {
        let header = test_header(u32::MAX, 0);
        let err = parse(&header, &[], 0, DescriptorWidth::U64).unwrap_err();

        assert_eq!(err.kind(), EntryErrorKind::Descriptor);
    }
}
