//! Hierarchy levels and the URL template band each one uses

use serde::Deserialize;
use std::fmt;

/// Which half of the hierarchy a crawl walks
///
/// Only the area listings (depths 0-3) differ between the two; precinct and
/// record lookups share one endpoint each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegionKind {
    #[default]
    Local,
    Overseas,
}

impl RegionKind {
    pub fn is_overseas(&self) -> bool {
        matches!(self, Self::Overseas)
    }
}

impl fmt::Display for RegionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Local => write!(f, "local"),
            Self::Overseas => write!(f, "overseas"),
        }
    }
}

/// Named level of the administrative hierarchy for a given crawl depth
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Level {
    /// The national listing keyed by the start code
    Root,
    Region,
    ProvinceDistrict,
    CityMunicipality,
    Barangay,
    /// Precinct-level election return
    Precinct,
}

impl Level {
    /// Maps a crawl depth to its level. Anything past depth 5 stays `Precinct`.
    pub fn from_depth(depth: u32) -> Self {
        match depth {
            0 => Self::Root,
            1 => Self::Region,
            2 => Self::ProvinceDistrict,
            3 => Self::CityMunicipality,
            4 => Self::Barangay,
            _ => Self::Precinct,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Root => "Root",
            Self::Region => "Region",
            Self::ProvinceDistrict => "Province/District",
            Self::CityMunicipality => "City/Municipality",
            Self::Barangay => "Barangay",
            Self::Precinct => "Precinct",
        }
    }

    /// The URL template family used to fetch a node at this level
    pub fn band(&self) -> Band {
        match self {
            Self::Root | Self::Region | Self::ProvinceDistrict | Self::CityMunicipality => {
                Band::Area
            }
            Self::Barangay => Band::Precinct,
            Self::Precinct => Band::Record,
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// URL template families exposed by the remote service
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Band {
    /// `<area>/<code>.json`, local or overseas
    Area,
    /// `<precinct>/<code[..2]>/<code>.json`
    Precinct,
    /// `<record>/<code[..3]>/<code>.json`
    Record,
}

impl Band {
    /// Number of leading code characters used as a directory prefix
    pub fn prefix_len(&self) -> Option<usize> {
        match self {
            Self::Area => None,
            Self::Precinct => Some(2),
            Self::Record => Some(3),
        }
    }
}
