use super::{
    SectorId, SectorLayout, DIR_ENTRY_SIZE, HEADER_SAT_SLOTS, HEADER_SIZE, IDS_PER_MSAT_SECTOR,
    IDS_PER_SAT_SECTOR, MAX_DIR_NAME, MINI_STREAM_CUTOFF, SECTOR_SIZE,
};
use crate::error::Result;
use byteorder::{ByteOrder, LittleEndian};
use std::io::Write;

const MAGIC: [u8; 8] = [0xD0, 0xCF, 0x11, 0xE0, 0xA1, 0xB1, 0x1A, 0xE1];
const MINOR_VERSION: u16 = 0x003E;
const MAJOR_VERSION: u16 = 0x0003;
const BYTE_ORDER_MARK: u16 = 0xFFFE;
const SECTOR_SHIFT: u16 = 9;
const MINI_SECTOR_SHIFT: u16 = 6;

const NO_STREAM: u32 = 0xFFFF_FFFF;
const ENTRY_STORAGE_ROOT: u8 = 5;
const ENTRY_STREAM: u8 = 2;
const COLOR_BLACK: u8 = 1;
const ROOT_ENTRY_NAME: &str = "Root Entry";
/// {00020820-0000-0000-C000-000000000046}, Excel workbook
const WORKBOOK_CLSID: [u32; 4] = [0x0002_0820, 0x0000_0000, 0x0000_00C0, 0x4600_0000];

/// Pad with zeros to a sector boundary, then up to the mini stream cutoff
pub fn pad_stream(stream: &mut Vec<u8>) {
    let padded = (stream.len().div_ceil(SECTOR_SIZE) * SECTOR_SIZE).max(MINI_STREAM_CUTOFF);
    stream.resize(padded, 0);
}

/// 512-byte file header
pub fn format_header(layout: &SectorLayout) -> Vec<u8> {
    let mut header = vec![0u8; HEADER_SIZE];
    header[..8].copy_from_slice(&MAGIC);
    LittleEndian::write_u16(&mut header[24..26], MINOR_VERSION);
    LittleEndian::write_u16(&mut header[26..28], MAJOR_VERSION);
    LittleEndian::write_u16(&mut header[28..30], BYTE_ORDER_MARK);
    LittleEndian::write_u16(&mut header[30..32], SECTOR_SHIFT);
    LittleEndian::write_u16(&mut header[32..34], MINI_SECTOR_SHIFT);
    LittleEndian::write_u32(&mut header[44..48], layout.sat_sectors);
    LittleEndian::write_u32(&mut header[48..52], layout.directory_sector());
    LittleEndian::write_u32(&mut header[56..60], MINI_STREAM_CUTOFF as u32);
    LittleEndian::write_u32(&mut header[60..64], SectorId::EndOfChain.raw());
    LittleEndian::write_u32(&mut header[64..68], 0);
    LittleEndian::write_u32(&mut header[68..72], layout.first_msat_sector().raw());
    LittleEndian::write_u32(&mut header[72..76], layout.msat_sectors);

    let mut sat_ids = layout.sat_sector_ids();
    for slot in header[76..].chunks_exact_mut(4) {
        let id = sat_ids.next().map_or(SectorId::Free, SectorId::Regular);
        LittleEndian::write_u32(slot, id.raw());
    }
    header
}

/// MSAT sectors: SAT sector IDs that do not fit in the header
pub fn format_msat(layout: &SectorLayout) -> Vec<u8> {
    let overflow: Vec<u32> = layout
        .sat_sector_ids()
        .skip(HEADER_SAT_SLOTS as usize)
        .collect();
    let mut block = Vec::with_capacity(layout.msat_sectors as usize * SECTOR_SIZE);

    for index in 0..layout.msat_sectors {
        let mut sector = [0u8; SECTOR_SIZE];
        let start = (index * IDS_PER_MSAT_SECTOR) as usize;
        let mut ids = overflow.iter().skip(start).take(IDS_PER_MSAT_SECTOR as usize);

        for slot in sector.chunks_exact_mut(4).take(IDS_PER_MSAT_SECTOR as usize) {
            let id = ids.next().map_or(SectorId::Free, |&id| SectorId::Regular(id));
            LittleEndian::write_u32(slot, id.raw());
        }
        let next = if index + 1 < layout.msat_sectors {
            SectorId::Regular(layout.data_sectors + index + 1)
        } else {
            SectorId::EndOfChain
        };
        LittleEndian::write_u32(&mut sector[SECTOR_SIZE - 4..], next.raw());
        block.extend_from_slice(&sector);
    }
    block
}

/// Directory sector: root entry, the workbook stream and two unused entries
pub fn format_directory(stream_name: &str, stream_len: u32) -> Vec<u8> {
    let mut sector = vec![0u8; SECTOR_SIZE];
    let (root, rest) = sector.split_at_mut(DIR_ENTRY_SIZE);
    let (stream, unused) = rest.split_at_mut(DIR_ENTRY_SIZE);

    let root_name: Vec<u16> = ROOT_ENTRY_NAME.encode_utf16().collect();
    write_entry_name(root, &root_name);
    root[66] = ENTRY_STORAGE_ROOT;
    root[67] = COLOR_BLACK;
    LittleEndian::write_u32(&mut root[68..72], NO_STREAM);
    LittleEndian::write_u32(&mut root[72..76], NO_STREAM);
    LittleEndian::write_u32(&mut root[76..80], 1);
    LittleEndian::write_u32_into(&WORKBOOK_CLSID, &mut root[80..96]);
    LittleEndian::write_u32(&mut root[116..120], SectorId::EndOfChain.raw());
    LittleEndian::write_u32(&mut root[120..124], 0);

    let mut name: Vec<u16> = stream_name.encode_utf16().collect();
    if name.len() > MAX_DIR_NAME {
        log::warn!(
            "Stream name of {} characters truncated to {}",
            name.len(),
            MAX_DIR_NAME
        );
        name.truncate(MAX_DIR_NAME);
    }
    write_entry_name(stream, &name);
    stream[66] = ENTRY_STREAM;
    stream[67] = COLOR_BLACK;
    LittleEndian::write_u32(&mut stream[68..72], NO_STREAM);
    LittleEndian::write_u32(&mut stream[72..76], NO_STREAM);
    LittleEndian::write_u32(&mut stream[76..80], NO_STREAM);
    LittleEndian::write_u32(&mut stream[116..120], 0);
    LittleEndian::write_u32(&mut stream[120..124], stream_len);

    for entry in unused.chunks_exact_mut(DIR_ENTRY_SIZE) {
        LittleEndian::write_u32(&mut entry[68..72], NO_STREAM);
        LittleEndian::write_u32(&mut entry[72..76], NO_STREAM);
        LittleEndian::write_u32(&mut entry[76..80], NO_STREAM);
    }
    sector
}

/// Name buffer (64 bytes, zero terminated) and its byte length including the terminator
fn write_entry_name(entry: &mut [u8], name: &[u16]) {
    LittleEndian::write_u16_into(name, &mut entry[..name.len() * 2]);
    LittleEndian::write_u16(&mut entry[64..66], ((name.len() + 1) * 2) as u16);
}

/// SAT sectors: the data chain plus markers for the MSAT, directory and SAT sectors
pub fn format_sat(layout: &SectorLayout) -> Vec<u8> {
    if layout.short_stream {
        return Vec::new();
    }
    let entries = (layout.sat_sectors * IDS_PER_SAT_SECTOR) as usize;
    let mut table = vec![SectorId::Free; entries];

    for sector in 0..layout.data_sectors {
        table[sector as usize] = if sector + 1 < layout.data_sectors {
            SectorId::Regular(sector + 1)
        } else {
            SectorId::EndOfChain
        };
    }
    let msat_start = layout.data_sectors as usize;
    for entry in &mut table[msat_start..msat_start + layout.msat_sectors as usize] {
        *entry = SectorId::Msat;
    }
    table[layout.directory_sector() as usize] = SectorId::EndOfChain;
    for sector in layout.sat_sector_ids() {
        table[sector as usize] = SectorId::Sat;
    }

    let mut block = vec![0u8; entries * 4];
    for (slot, id) in block.chunks_exact_mut(4).zip(&table) {
        LittleEndian::write_u32(slot, id.raw());
    }
    block
}

/// Write a compound file holding `stream` under `stream_name`
///
/// The stream is padded first, so the file always uses the regular (non-mini) stream
/// layout. Output order is header, stream data, MSAT, directory, SAT.
pub fn write_compound_file<W: Write>(
    mut out: W,
    mut stream: Vec<u8>,
    stream_name: &str,
) -> Result<SectorLayout> {
    pad_stream(&mut stream);
    let layout = SectorLayout::compute(stream.len());
    log::debug!(
        "Compound file layout for {} bytes: {} data, {} MSAT, {} SAT sectors",
        stream.len(),
        layout.data_sectors,
        layout.msat_sectors,
        layout.sat_sectors
    );

    out.write_all(&format_header(&layout))?;
    out.write_all(&stream)?;
    out.write_all(&format_msat(&layout))?;
    out.write_all(&format_directory(stream_name, stream.len() as u32))?;
    out.write_all(&format_sat(&layout))?;
    out.flush()?;
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn u32_at(buf: &[u8], offset: usize) -> u32 {
        LittleEndian::read_u32(&buf[offset..offset + 4])
    }

    #[test]
    fn test_pad_stream() {
        let mut stream = vec![1u8; 10];
        pad_stream(&mut stream);
        assert_eq!(stream.len(), MINI_STREAM_CUTOFF);

        let mut stream = vec![1u8; 5000];
        pad_stream(&mut stream);
        assert_eq!(stream.len(), 5120);
        assert!(stream[5000..].iter().all(|&b| b == 0));

        pad_stream(&mut stream);
        assert_eq!(stream.len(), 5120);
    }

    #[test]
    fn test_header_fields() {
        let layout = SectorLayout::compute(4096);
        let header = format_header(&layout);
        assert_eq!(header.len(), HEADER_SIZE);
        assert_eq!(&header[..8], &MAGIC);
        assert_eq!(&header[24..34], &[0x3E, 0, 3, 0, 0xFE, 0xFF, 9, 0, 6, 0]);
        assert_eq!(u32_at(&header, 44), 1);
        assert_eq!(u32_at(&header, 48), 8);
        assert_eq!(u32_at(&header, 56), 4096);
        assert_eq!(u32_at(&header, 60), SectorId::EndOfChain.raw());
        assert_eq!(u32_at(&header, 68), SectorId::EndOfChain.raw());
        assert_eq!(u32_at(&header, 72), 0);
        assert_eq!(u32_at(&header, 76), 9);
        assert_eq!(u32_at(&header, 80), SectorId::Free.raw());
    }

    #[test]
    fn test_sat_chain() {
        let layout = SectorLayout::compute(4096);
        let sat = format_sat(&layout);
        assert_eq!(sat.len(), SECTOR_SIZE);
        for sector in 0..7 {
            assert_eq!(u32_at(&sat, sector * 4), sector as u32 + 1);
        }
        assert_eq!(u32_at(&sat, 7 * 4), SectorId::EndOfChain.raw());
        assert_eq!(u32_at(&sat, 8 * 4), SectorId::EndOfChain.raw());
        assert_eq!(u32_at(&sat, 9 * 4), SectorId::Sat.raw());
        assert_eq!(u32_at(&sat, 10 * 4), SectorId::Free.raw());
    }

    #[test]
    fn test_msat_chain() {
        // enough SAT sectors to need two MSAT sectors
        let data_sectors = (HEADER_SAT_SLOTS + IDS_PER_MSAT_SECTOR + 5) * IDS_PER_SAT_SECTOR;
        let layout = SectorLayout::compute(data_sectors as usize * SECTOR_SIZE);
        assert_eq!(layout.msat_sectors, 2);

        let header = format_header(&layout);
        assert_eq!(u32_at(&header, 68), layout.data_sectors);
        assert_eq!(u32_at(&header, 72), 2);
        assert_eq!(u32_at(&header, 76), layout.first_sat_sector());

        let msat = format_msat(&layout);
        assert_eq!(msat.len(), 2 * SECTOR_SIZE);
        assert_eq!(u32_at(&msat, 0), layout.first_sat_sector() + HEADER_SAT_SLOTS);
        assert_eq!(u32_at(&msat, SECTOR_SIZE - 4), layout.data_sectors + 1);
        assert_eq!(u32_at(&msat, 2 * SECTOR_SIZE - 4), SectorId::EndOfChain.raw());
        let last_id = layout.first_free_sector() - 1;
        let used = (layout.sat_sectors - HEADER_SAT_SLOTS - IDS_PER_MSAT_SECTOR) as usize;
        assert_eq!(u32_at(&msat, SECTOR_SIZE + (used - 1) * 4), last_id);
        assert_eq!(u32_at(&msat, SECTOR_SIZE + used * 4), SectorId::Free.raw());

        let sat = format_sat(&layout);
        assert_eq!(u32_at(&sat, layout.data_sectors as usize * 4), SectorId::Msat.raw());
        assert_eq!(u32_at(&sat, (layout.data_sectors as usize + 1) * 4), SectorId::Msat.raw());
    }

    #[test]
    fn test_directory_entries() {
        let dir = format_directory("Workbook", 4096);
        assert_eq!(dir.len(), SECTOR_SIZE);

        assert_eq!(&dir[..4], &[b'R', 0, b'o', 0]);
        assert_eq!(LittleEndian::read_u16(&dir[64..66]), 22);
        assert_eq!(dir[66], ENTRY_STORAGE_ROOT);
        assert_eq!(u32_at(&dir, 76), 1);
        assert_eq!(&dir[80..84], &[0x20, 0x08, 0x02, 0x00]);
        assert_eq!(&dir[88..96], &[0xC0, 0, 0, 0, 0, 0, 0, 0x46]);
        assert_eq!(u32_at(&dir, 116), SectorId::EndOfChain.raw());

        let stream = &dir[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE];
        assert_eq!(LittleEndian::read_u16(&stream[64..66]), 18);
        assert_eq!(stream[66], ENTRY_STREAM);
        assert_eq!(u32_at(stream, 116), 0);
        assert_eq!(u32_at(stream, 120), 4096);

        let unused = &dir[2 * DIR_ENTRY_SIZE..];
        assert_eq!(unused[66], 0);
        assert_eq!(u32_at(unused, 68), NO_STREAM);
        assert_eq!(u32_at(unused, DIR_ENTRY_SIZE + 76), NO_STREAM);
    }

    #[test]
    fn test_directory_name_truncated() {
        let dir = format_directory(&"W".repeat(40), 4096);
        let stream = &dir[DIR_ENTRY_SIZE..2 * DIR_ENTRY_SIZE];
        assert_eq!(LittleEndian::read_u16(&stream[64..66]), 64);
        // terminator stays in place
        assert_eq!(&stream[62..64], &[0, 0]);
        assert_eq!(&stream[60..62], &[b'W', 0]);
    }

    #[test]
    fn test_write_compound_file_size() {
        let mut out = Vec::new();
        let layout = write_compound_file(&mut out, vec![7u8; 100], "Workbook").unwrap();
        assert_eq!(layout.data_sectors, 8);
        // header + 8 data sectors + directory + SAT
        assert_eq!(out.len(), HEADER_SIZE + 10 * SECTOR_SIZE);
    }
}
