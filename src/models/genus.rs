use serde::{Deserialize, Serialize};

use crate::error::ProjectionError;

/// The sixteen species groups (SP0 genera) a polygon layer is reported in.
///
/// The declaration order is the species-group order: `AC` is group 1, `PL`
/// is group 16.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Genus {
    Ac,
    B,
    C,
    D,
    E,
    F,
    Pw,
    H,
    Py,
    L,
    Pa,
    At,
    S,
    Mb,
    Y,
    Pl,
}

impl Genus {
    pub const ALL: [Genus; 16] = [
        Genus::Ac,
        Genus::B,
        Genus::C,
        Genus::D,
        Genus::E,
        Genus::F,
        Genus::Pw,
        Genus::H,
        Genus::Py,
        Genus::L,
        Genus::Pa,
        Genus::At,
        Genus::S,
        Genus::Mb,
        Genus::Y,
        Genus::Pl,
    ];

    /// The one- or two-letter alias used in input files.
    pub fn alias(self) -> &'static str {
        match self {
            Genus::Ac => "AC",
            Genus::B => "B",
            Genus::C => "C",
            Genus::D => "D",
            Genus::E => "E",
            Genus::F => "F",
            Genus::Pw => "PW",
            Genus::H => "H",
            Genus::Py => "PY",
            Genus::L => "L",
            Genus::Pa => "PA",
            Genus::At => "AT",
            Genus::S => "S",
            Genus::Mb => "MB",
            Genus::Y => "Y",
            Genus::Pl => "PL",
        }
    }

    pub fn common_name(self) -> &'static str {
        match self {
            Genus::Ac => "Cottonwood",
            Genus::B => "Balsam fir",
            Genus::C => "Western redcedar",
            Genus::D => "Red alder",
            Genus::E => "Birch",
            Genus::F => "Douglas-fir",
            Genus::Pw => "Western white pine",
            Genus::H => "Hemlock",
            Genus::Py => "Ponderosa pine",
            Genus::L => "Larch",
            Genus::Pa => "Whitebark pine",
            Genus::At => "Trembling aspen",
            Genus::S => "Spruce",
            Genus::Mb => "Bigleaf maple",
            Genus::Y => "Yellow cedar",
            Genus::Pl => "Lodgepole pine",
        }
    }

    /// Species-group index, 1-based.
    pub fn index(self) -> u32 {
        Genus::ALL
            .iter()
            .position(|g| *g == self)
            .map(|p| p as u32 + 1)
            .unwrap_or(0)
    }

    pub fn is_hardwood(self) -> bool {
        matches!(
            self,
            Genus::Ac | Genus::At | Genus::D | Genus::E | Genus::Mb
        )
    }
}

impl std::fmt::Display for Genus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.alias())
    }
}

impl std::str::FromStr for Genus {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let upper = s.trim().to_uppercase();
        Genus::ALL
            .iter()
            .copied()
            .find(|g| g.alias() == upper)
            .ok_or_else(|| ProjectionError::UnrecognizedGenus(s.to_string()))
    }
}

impl TryFrom<String> for Genus {
    type Error = ProjectionError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Genus> for String {
    fn from(genus: Genus) -> Self {
        genus.alias().to_string()
    }
}

/// Biogeoclimatic region of a polygon.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Region {
    Coastal,
    Interior,
}

impl std::fmt::Display for Region {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Region::Coastal => write!(f, "coastal"),
            Region::Interior => write!(f, "interior"),
        }
    }
}

impl std::str::FromStr for Region {
    type Err = ProjectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "coastal" | "c" => Ok(Region::Coastal),
            "interior" | "i" => Ok(Region::Interior),
            _ => Err(ProjectionError::ParseError(format!("Unknown region: '{s}'"))),
        }
    }
}
