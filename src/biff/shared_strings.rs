//! Shared string table (SST) with string deduplication

use super::{record_id, write_record_header, BiffString, MAX_RECORD_DATA, MAX_SST_STRING};
use byteorder::{LittleEndian, WriteBytesExt};
use indexmap::IndexSet;
use std::io::{self, Write};

/// Shared strings table that deduplicates strings across the workbook
#[derive(Debug, Clone, Default)]
pub struct SharedStrings {
    strings: IndexSet<String>,
}

impl SharedStrings {
    pub fn new() -> Self {
        SharedStrings {
            strings: IndexSet::new(),
        }
    }

    /// Add a string and get its index
    pub fn add_string(&mut self, s: &str) -> u32 {
        if let Some(index) = self.strings.get_index_of(s) {
            return index as u32;
        }
        let (index, _) = self.strings.insert_full(s.to_string());
        index as u32
    }

    /// Get number of unique strings
    pub fn count(&self) -> usize {
        self.strings.len()
    }

    pub fn get(&self, index: u32) -> Option<&str> {
        self.strings.get_index(index as usize).map(String::as_str)
    }

    pub fn clear(&mut self) {
        self.strings.clear();
    }

    /// Write the SST record followed by as many CONTINUE records as needed.
    ///
    /// A string header (length + flags) never straddles two records. When the
    /// characters of a string do, the continuation starts with a fresh flags byte and a
    /// UTF-16 character is never split.
    pub fn write_sst<W: Write>(&self, writer: &mut W, total: u32) -> io::Result<()> {
        let mut chunk = SstChunk::new();
        chunk.buf.write_u32::<LittleEndian>(total)?;
        chunk.buf.write_u32::<LittleEndian>(self.strings.len() as u32)?;

        for s in &self.strings {
            let s = BiffString::new(s, MAX_SST_STRING, "Shared string");

            if chunk.available() < 3 {
                chunk.flush(writer)?;
            }
            chunk.buf.write_u16::<LittleEndian>(s.len() as u16)?;
            chunk.buf.write_u8(s.flags())?;

            let mut written = 0;
            while written < s.len() {
                let room = chunk.available() / s.char_size();
                if room == 0 {
                    chunk.flush(writer)?;
                    chunk.buf.write_u8(s.flags())?;
                    continue;
                }
                let end = s.len().min(written + room);
                s.write_chars(&mut chunk.buf, written, end)?;
                written = end;
            }
        }

        chunk.flush(writer)
    }
}

/// Payload of the record currently being filled: SST first, CONTINUE afterwards
struct SstChunk {
    buf: Vec<u8>,
    first: bool,
}

impl SstChunk {
    fn new() -> Self {
        SstChunk {
            buf: Vec::with_capacity(MAX_RECORD_DATA),
            first: true,
        }
    }

    fn available(&self) -> usize {
        MAX_RECORD_DATA - self.buf.len()
    }

    fn flush<W: Write>(&mut self, writer: &mut W) -> io::Result<()> {
        let id = if self.first {
            record_id::SST
        } else {
            record_id::CONTINUE
        };
        write_record_header(writer, id, self.buf.len())?;
        writer.write_all(&self.buf)?;
        self.buf.clear();
        self.first = false;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Split a record stream into (id, payload) pairs
    fn records(mut data: &[u8]) -> Vec<(u16, Vec<u8>)> {
        let mut out = Vec::new();
        while data.len() >= 4 {
            let id = u16::from_le_bytes([data[0], data[1]]);
            let len = u16::from_le_bytes([data[2], data[3]]) as usize;
            out.push((id, data[4..4 + len].to_vec()));
            data = &data[4 + len..];
        }
        out
    }

    #[test]
    fn test_shared_strings() {
        let mut ss = SharedStrings::new();

        let idx1 = ss.add_string("Hello");
        let idx2 = ss.add_string("World");
        let idx3 = ss.add_string("Hello"); // Duplicate

        assert_eq!(idx1, 0);
        assert_eq!(idx2, 1);
        assert_eq!(idx3, 0); // Should return same index
        assert_eq!(ss.count(), 2);
        assert_eq!(ss.get(1), Some("World"));
    }

    #[test]
    fn test_small_sst_layout() {
        let mut ss = SharedStrings::new();
        ss.add_string("Total");

        let mut buf = Vec::new();
        ss.write_sst(&mut buf, 2).unwrap();
        let recs = records(&buf);
        assert_eq!(recs.len(), 1);
        assert_eq!(recs[0].0, record_id::SST);
        assert_eq!(
            recs[0].1,
            vec![2, 0, 0, 0, 1, 0, 0, 0, 5, 0, 0, b'T', b'o', b't', b'a', b'l']
        );
    }

    #[test]
    fn test_continue_restarts_with_flags() {
        let mut ss = SharedStrings::new();
        let long = "x".repeat(MAX_RECORD_DATA);
        ss.add_string(&long);

        let mut buf = Vec::new();
        ss.write_sst(&mut buf, 1).unwrap();
        let recs = records(&buf);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].1.len(), MAX_RECORD_DATA);
        assert_eq!(recs[1].0, record_id::CONTINUE);
        // 8 bytes of counts and 3 bytes of string header precede the characters
        let spilled = MAX_RECORD_DATA - (MAX_RECORD_DATA - 11);
        assert_eq!(recs[1].1.len(), 1 + spilled);
        assert_eq!(recs[1].1[0], 0x00);
    }

    #[test]
    fn test_utf16_chars_never_split() {
        let mut ss = SharedStrings::new();
        // 11 bytes of header leave an odd number of bytes for two-byte characters
        ss.add_string(&"Σ".repeat(5000));

        let mut buf = Vec::new();
        ss.write_sst(&mut buf, 1).unwrap();
        let recs = records(&buf);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].1.len(), MAX_RECORD_DATA - 1);
        assert_eq!(recs[1].1[0], 0x01);
        assert_eq!((recs[0].1.len() - 11) / 2 + (recs[1].1.len() - 1) / 2, 5000);
    }

    #[test]
    fn test_header_not_split() {
        let mut ss = SharedStrings::new();
        // Fill the first record so that exactly two bytes remain
        ss.add_string(&"a".repeat(MAX_RECORD_DATA - 8 - 3 - 2));
        ss.add_string("b");

        let mut buf = Vec::new();
        ss.write_sst(&mut buf, 2).unwrap();
        let recs = records(&buf);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0].1.len(), MAX_RECORD_DATA - 2);
        assert_eq!(recs[1].1, vec![1, 0, 0, b'b']);
    }
}
