use std::collections::HashMap;

use crate::error::ProjectionError;
use crate::models::{Genus, Region};
use crate::site_index::{default_curve, SiteCurve};

/// Explicit genus/region to site-curve assignments, consulted before the
/// built-in defaults.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SiteCurveMap {
    entries: HashMap<(Genus, Region), SiteCurve>,
}

impl SiteCurveMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, genus: Genus, region: Region, curve: SiteCurve) -> Option<SiteCurve> {
        self.entries.insert((genus, region), curve)
    }

    pub fn get(&self, genus: Genus, region: Region) -> Option<SiteCurve> {
        self.entries.get(&(genus, region)).copied()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The curve for a genus in a region: the explicit entry if there is one,
    /// otherwise the built-in default.
    pub fn resolve(&self, genus: Genus, region: Region) -> Result<SiteCurve, ProjectionError> {
        self.get(genus, region)
            .or_else(|| default_curve(genus, region))
            .ok_or_else(|| ProjectionError::NoCurveAvailable {
                genus: genus.to_string(),
                region,
            })
    }
}

impl FromIterator<(Genus, Region, SiteCurve)> for SiteCurveMap {
    fn from_iter<I: IntoIterator<Item = (Genus, Region, SiteCurve)>>(iter: I) -> Self {
        let mut map = SiteCurveMap::new();
        for (genus, region, curve) in iter {
            map.insert(genus, region, curve);
        }
        map
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_entry_wins() {
        let map: SiteCurveMap = [(Genus::H, Region::Coastal, SiteCurve::HwcWiley)]
            .into_iter()
            .collect();
        assert_eq!(map.resolve(Genus::H, Region::Coastal).unwrap(), SiteCurve::HwcWiley);
        assert_eq!(map.resolve(Genus::H, Region::Interior).unwrap(), SiteCurve::HwiNigh);
    }

    #[test]
    fn test_empty_map_uses_defaults() {
        let map = SiteCurveMap::new();
        assert!(map.is_empty());
        assert_eq!(map.resolve(Genus::B, Region::Coastal).unwrap(), SiteCurve::BaNigh);
        assert_eq!(map.resolve(Genus::C, Region::Coastal).unwrap(), SiteCurve::CwcNigh);
        assert_eq!(map.resolve(Genus::D, Region::Coastal).unwrap(), SiteCurve::DrNigh);
        assert_eq!(map.resolve(Genus::H, Region::Coastal).unwrap(), SiteCurve::HwcWileyAc);
        assert_eq!(map.resolve(Genus::S, Region::Coastal).unwrap(), SiteCurve::SsNigh);
    }

    #[test]
    fn test_no_curve_available() {
        let err = SiteCurveMap::new().resolve(Genus::Pa, Region::Coastal).unwrap_err();
        assert!(matches!(
            err,
            ProjectionError::NoCurveAvailable { ref genus, region: Region::Coastal } if genus == "PA"
        ));
    }

    #[test]
    fn test_explicit_entry_fills_missing_default() {
        let mut map = SiteCurveMap::new();
        map.insert(Genus::Pa, Region::Coastal, SiteCurve::PliGoudieWet);
        assert_eq!(map.len(), 1);
        assert_eq!(map.resolve(Genus::Pa, Region::Coastal).unwrap(), SiteCurve::PliGoudieWet);
    }
}
