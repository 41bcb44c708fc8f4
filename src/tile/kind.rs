/// Highest level the art distinguishes.  Anything above renders as this.
pub const MAX_LEVEL: u8 = 5;

/// Clamp a raw on-chain level to the rendered range `0..=MAX_LEVEL`.
#[inline]
pub fn clamp_level(level: u8) -> u8 {
    level.min(MAX_LEVEL)
}

/// How many grid cells a kind occupies.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Footprint {
    /// One cell, 16×16 art.
    Single,
    /// 2×2 cells anchored at the top-left, 32×32 art.
    Double,
}

/// Canonical building enumeration (the `kind` byte of a packed tile).
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum TileKind {
    Empty,
    House,
    Farm,
    Workshop,
    Park,
    Road,
    Monument,
    HighRiseCommercial,
    Residential,
    LuxuryHouseWithPool,
    LargePark,
    AmusementPark,
    /// A kind byte this client has no art for.
    Unknown(u8),
}

impl TileKind {
    /// Every known kind, in numeric order.
    pub const ALL: [TileKind; 12] = [
        TileKind::Empty,
        TileKind::House,
        TileKind::Farm,
        TileKind::Workshop,
        TileKind::Park,
        TileKind::Road,
        TileKind::Monument,
        TileKind::HighRiseCommercial,
        TileKind::Residential,
        TileKind::LuxuryHouseWithPool,
        TileKind::LargePark,
        TileKind::AmusementPark,
    ];

    pub fn from_u8(v: u8) -> Self {
        match v {
            0 => TileKind::Empty,
            1 => TileKind::House,
            2 => TileKind::Farm,
            3 => TileKind::Workshop,
            4 => TileKind::Park,
            5 => TileKind::Road,
            6 => TileKind::Monument,
            7 => TileKind::HighRiseCommercial,
            8 => TileKind::Residential,
            9 => TileKind::LuxuryHouseWithPool,
            10 => TileKind::LargePark,
            11 => TileKind::AmusementPark,
            n => TileKind::Unknown(n),
        }
    }

    pub fn as_u8(self) -> u8 {
        match self {
            TileKind::Empty => 0,
            TileKind::House => 1,
            TileKind::Farm => 2,
            TileKind::Workshop => 3,
            TileKind::Park => 4,
            TileKind::Road => 5,
            TileKind::Monument => 6,
            TileKind::HighRiseCommercial => 7,
            TileKind::Residential => 8,
            TileKind::LuxuryHouseWithPool => 9,
            TileKind::LargePark => 10,
            TileKind::AmusementPark => 11,
            TileKind::Unknown(n) => n,
        }
    }

    /// Road is the only single-cell structure; empty ground is also one cell.
    pub fn footprint(self) -> Footprint {
        match self {
            TileKind::Empty | TileKind::Road => Footprint::Single,
            _ => Footprint::Double,
        }
    }

    pub fn is_building(self) -> bool {
        self.footprint() == Footprint::Double
    }

    pub fn name(self) -> &'static str {
        match self {
            TileKind::Empty => "Empty",
            TileKind::House => "House",
            TileKind::Farm => "Farm",
            TileKind::Workshop => "Workshop",
            TileKind::Park => "Park",
            TileKind::Road => "Road",
            TileKind::Monument => "Monument",
            TileKind::HighRiseCommercial => "HighRiseCommercial",
            TileKind::Residential => "Residential",
            TileKind::LuxuryHouseWithPool => "LuxuryHouseWithPool",
            TileKind::LargePark => "LargePark",
            TileKind::AmusementPark => "AmusementPark",
            TileKind::Unknown(_) => "Unknown",
        }
    }
}

impl From<u8> for TileKind {
    fn from(v: u8) -> Self {
        TileKind::from_u8(v)
    }
}

// ── Tests ──────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_byte_round_trips() {
        for b in 0..=u8::MAX {
            assert_eq!(TileKind::from_u8(b).as_u8(), b);
        }
    }

    #[test]
    fn all_is_in_numeric_order() {
        for (i, k) in TileKind::ALL.iter().enumerate() {
            assert_eq!(k.as_u8() as usize, i);
        }
    }

    #[test]
    fn road_is_single_and_buildings_double() {
        assert_eq!(TileKind::Road.footprint(), Footprint::Single);
        assert_eq!(TileKind::House.footprint(), Footprint::Double);
        assert!(TileKind::Unknown(42).is_building());
        assert!(!TileKind::Empty.is_building());
    }

    #[test]
    fn levels_clamp_to_five() {
        assert_eq!(clamp_level(0), 0);
        assert_eq!(clamp_level(5), 5);
        assert_eq!(clamp_level(200), 5);
    }
}
