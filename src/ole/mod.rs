//! OLE2 compound file container
//!
//! The workbook stream is stored in a minimal compound file: one root entry and one
//! user stream, laid out as header, stream data, master allocation table (MSAT),
//! one directory sector and the sector allocation table (SAT).

mod container;
mod layout;

pub use container::{
    format_directory, format_header, format_msat, format_sat, pad_stream, write_compound_file,
};
pub use layout::SectorLayout;

/// Sector size in bytes
pub const SECTOR_SIZE: usize = 512;

/// Header size in bytes
pub const HEADER_SIZE: usize = 512;

/// Sector IDs per SAT sector
pub const IDS_PER_SAT_SECTOR: u32 = (SECTOR_SIZE / 4) as u32;

/// SAT sector IDs stored directly in the header
pub const HEADER_SAT_SLOTS: u32 = 109;

/// SAT sector IDs per MSAT sector; the last slot chains to the next MSAT sector
pub const IDS_PER_MSAT_SECTOR: u32 = IDS_PER_SAT_SECTOR - 1;

/// Streams shorter than this would live in the mini stream
pub const MINI_STREAM_CUTOFF: usize = 4096;

/// Directory entry size in bytes
pub const DIR_ENTRY_SIZE: usize = 128;

/// UTF-16 units of a directory entry name, leaving room for the terminator
pub const MAX_DIR_NAME: usize = 31;

/// Entry in an allocation table chain
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SectorId {
    Regular(u32),
    Free,
    EndOfChain,
    /// Sector holds part of the SAT
    Sat,
    /// Sector holds part of the MSAT
    Msat,
}

impl SectorId {
    /// On-disk value
    pub fn raw(self) -> u32 {
        match self {
            SectorId::Regular(id) => id,
            SectorId::Free => 0xFFFF_FFFF,
            SectorId::EndOfChain => 0xFFFF_FFFE,
            SectorId::Sat => 0xFFFF_FFFD,
            SectorId::Msat => 0xFFFF_FFFC,
        }
    }
}

impl From<u32> for SectorId {
    fn from(id: u32) -> Self {
        SectorId::Regular(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinels() {
        assert_eq!(SectorId::Regular(7).raw(), 7);
        assert_eq!(SectorId::Free.raw(), u32::MAX);
        assert_eq!(SectorId::EndOfChain.raw(), u32::MAX - 1);
        assert_eq!(SectorId::Sat.raw(), u32::MAX - 2);
        assert_eq!(SectorId::Msat.raw(), u32::MAX - 3);
    }
}
