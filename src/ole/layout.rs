use super::{
    SectorId, HEADER_SAT_SLOTS, IDS_PER_MSAT_SECTOR, IDS_PER_SAT_SECTOR, MINI_STREAM_CUTOFF,
    SECTOR_SIZE,
};

/// Sector counts for one compound file
///
/// Sectors are numbered in file order: data from 0, then the MSAT sectors, then the
/// single directory sector, then the SAT sectors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SectorLayout {
    pub data_sectors: u32,
    pub sat_sectors: u32,
    pub msat_sectors: u32,
    /// Stream below the mini stream cutoff, no SAT
    pub short_stream: bool,
}

impl SectorLayout {
    /// Compute the layout for a stream of `data_len` bytes
    ///
    /// The SAT must hold an entry for every sector in the file, including the
    /// directory, the MSAT and the SAT sectors themselves, so its size is found by
    /// iterating until it covers everything.
    ///
    /// # Examples
    ///
    /// ```
    /// use biffwriter::ole::SectorLayout;
    ///
    /// let layout = SectorLayout::compute(8192);
    /// assert_eq!(layout.data_sectors, 16);
    /// assert_eq!(layout.sat_sectors, 1);
    /// assert_eq!(layout.directory_sector(), 16);
    /// ```
    pub fn compute(data_len: usize) -> Self {
        let data_sectors = data_len.div_ceil(SECTOR_SIZE) as u32;

        if data_len < MINI_STREAM_CUTOFF {
            return SectorLayout {
                data_sectors,
                sat_sectors: 0,
                msat_sectors: 0,
                short_stream: true,
            };
        }

        let mut sat_sectors = data_sectors.div_ceil(IDS_PER_SAT_SECTOR).max(1);
        let mut msat_sectors;
        loop {
            msat_sectors = msat_sectors_for(sat_sectors);
            let covered = data_sectors + msat_sectors + 1 + sat_sectors;
            let needed = covered.div_ceil(IDS_PER_SAT_SECTOR);
            if needed <= sat_sectors {
                break;
            }
            sat_sectors = needed;
        }

        SectorLayout {
            data_sectors,
            sat_sectors,
            msat_sectors,
            short_stream: false,
        }
    }

    /// First MSAT sector, `EndOfChain` when the header holds every SAT sector
    pub fn first_msat_sector(&self) -> SectorId {
        if self.msat_sectors == 0 {
            SectorId::EndOfChain
        } else {
            SectorId::Regular(self.data_sectors)
        }
    }

    pub fn directory_sector(&self) -> u32 {
        self.data_sectors + self.msat_sectors
    }

    pub fn first_sat_sector(&self) -> u32 {
        self.directory_sector() + 1
    }

    /// One past the last allocated sector
    pub fn first_free_sector(&self) -> u32 {
        self.first_sat_sector() + self.sat_sectors
    }

    /// IDs of all SAT sectors in order
    pub fn sat_sector_ids(&self) -> impl Iterator<Item = u32> {
        let first = self.first_sat_sector();
        first..first + self.sat_sectors
    }
}

fn msat_sectors_for(sat_sectors: u32) -> u32 {
    if sat_sectors > HEADER_SAT_SLOTS {
        (sat_sectors - HEADER_SAT_SLOTS).div_ceil(IDS_PER_MSAT_SECTOR)
    } else {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_stream() {
        let layout = SectorLayout::compute(1500);
        assert!(layout.short_stream);
        assert_eq!(layout.data_sectors, 3);
        assert_eq!(layout.sat_sectors, 0);
        assert_eq!(layout.msat_sectors, 0);
    }

    #[test]
    fn test_minimum_stream() {
        let layout = SectorLayout::compute(4096);
        assert!(!layout.short_stream);
        assert_eq!(layout.data_sectors, 8);
        assert_eq!(layout.sat_sectors, 1);
        assert_eq!(layout.first_msat_sector(), SectorId::EndOfChain);
        assert_eq!(layout.directory_sector(), 8);
        assert_eq!(layout.first_sat_sector(), 9);
        assert_eq!(layout.first_free_sector(), 10);
    }

    #[test]
    fn test_sat_covers_its_own_sectors() {
        // 127 data sectors + directory + SAT = 129 entries
        let layout = SectorLayout::compute(127 * SECTOR_SIZE);
        assert_eq!(layout.sat_sectors, 2);
        assert!(layout.first_free_sector() <= layout.sat_sectors * IDS_PER_SAT_SECTOR);
    }

    #[test]
    fn test_msat_needed() {
        let layout = SectorLayout::compute(110 * 128 * SECTOR_SIZE);
        assert!(layout.sat_sectors > HEADER_SAT_SLOTS);
        assert_eq!(layout.msat_sectors, 1);
        assert_eq!(layout.first_msat_sector(), SectorId::Regular(layout.data_sectors));
        assert!(layout.first_free_sector() <= layout.sat_sectors * IDS_PER_SAT_SECTOR);
    }

    #[test]
    fn test_monotonic() {
        let mut previous = SectorLayout::compute(0);
        for len in (0..2_000_000).step_by(4093) {
            let layout = SectorLayout::compute(len);
            assert!(layout.data_sectors >= previous.data_sectors);
            assert!(layout.data_sectors as usize * SECTOR_SIZE >= len);
            previous = layout;
        }
    }
}
