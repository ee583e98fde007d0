//! Piece completion map.

/// Packed bit-per-piece completion map, most significant bit first.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bitfield {
    bytes: Vec<u8>,
    pieces: u32,
}

impl Bitfield {
    /// Empty map for `pieces` pieces.
    #[must_use]
    pub fn new(pieces: u32) -> Self {
        let len = usize::try_from(pieces.div_ceil(8)).unwrap_or(usize::MAX);
        Self {
            bytes: vec![0; len],
            pieces,
        }
    }

    /// Number of pieces tracked.
    #[must_use]
    pub const fn len(&self) -> u32 {
        self.pieces
    }

    /// Whether the map tracks no pieces.
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.pieces == 0
    }

    /// Whether `piece` is complete. Out-of-range pieces report `false`.
    #[must_use]
    pub fn has(&self, piece: u32) -> bool {
        if piece >= self.pieces {
            return false;
        }
        let (byte, mask) = Self::locate(piece);
        self.bytes.get(byte).is_some_and(|value| value & mask != 0)
    }

    /// Mark `piece` complete. Returns `false` if the piece is out of range.
    pub fn set(&mut self, piece: u32) -> bool {
        if piece >= self.pieces {
            return false;
        }
        let (byte, mask) = Self::locate(piece);
        match self.bytes.get_mut(byte) {
            Some(value) => {
                *value |= mask;
                true
            }
            None => false,
        }
    }

    /// Count of completed pieces.
    #[must_use]
    pub fn count_ones(&self) -> u32 {
        let count = (0..self.pieces).filter(|piece| self.has(*piece)).count();
        u32::try_from(count).unwrap_or(u32::MAX)
    }

    /// Percentage of completed pieces in `0.0..=100.0`.
    #[must_use]
    pub fn percent_complete(&self) -> f64 {
        if self.is_empty() {
            0.0
        } else {
            (f64::from(self.count_ones()) / f64::from(self.len())) * 100.0
        }
    }

    fn locate(piece: u32) -> (usize, u8) {
        let byte = usize::try_from(piece / 8).unwrap_or(usize::MAX);
        let mask = 0x80_u8 >> (piece % 8);
        (byte, mask)
    }
}
