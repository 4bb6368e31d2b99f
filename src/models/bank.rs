use std::ops::RangeInclusive;

use serde::{Deserialize, Serialize};

use super::{Genus, LayerSpecies, Polygon, PolygonDescription, Region, UtilizationVector};
use crate::site_index::SiteCurve;

/// Working values for one species of the polygon layer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpeciesSlot {
    pub genus: Genus,
    pub basal_area: UtilizationVector,
    pub trees_per_hectare: UtilizationVector,
    pub site_index: Option<f64>,
    pub site_curve: Option<SiteCurve>,
    pub age_total: Option<f64>,
    pub years_at_breast_height: Option<f64>,
    pub years_to_breast_height: Option<f64>,
    /// Percentage of forested land covered by this species
    pub percent_forested: Option<f64>,
}

impl From<&LayerSpecies> for SpeciesSlot {
    fn from(sp: &LayerSpecies) -> Self {
        Self {
            genus: sp.genus,
            basal_area: sp.basal_area,
            trees_per_hectare: sp.trees_per_hectare,
            site_index: sp.site_index,
            site_curve: sp.site_curve,
            age_total: sp.age_total,
            years_at_breast_height: sp.years_at_breast_height,
            years_to_breast_height: sp.years_to_breast_height,
            percent_forested: None,
        }
    }
}

/// The polygon-level aggregate, slot 0 of the bank.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BankTotals {
    pub basal_area: UtilizationVector,
    pub trees_per_hectare: UtilizationVector,
    pub site_index: Option<f64>,
}

/// Primary/secondary species of a bank and its inventory type group.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesRankingDetails {
    pub primary_index: usize,
    pub secondary_index: Option<usize>,
    pub inventory_type_group: u32,
    /// Combined percentage of the primary species
    pub primary_percentage: f64,
}

/// Mutable working set for one polygon layer.
///
/// Species are addressed by slot index `1..=n_species()`; slot 0 is the
/// aggregate held in [`PolygonBank::totals`]. Every per-species value lives
/// in one [`SpeciesSlot`], so removing a slot removes all of its values at
/// once and keeps the remaining slots aligned.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PolygonBank {
    pub description: PolygonDescription,
    pub region: Region,
    pub totals: BankTotals,
    species: Vec<SpeciesSlot>,
    ranking: Option<SpeciesRankingDetails>,
}

impl PolygonBank {
    /// Build the bank for a polygon's primary layer.
    pub fn from_polygon(polygon: &Polygon) -> Self {
        let species: Vec<SpeciesSlot> = polygon.species.iter().map(SpeciesSlot::from).collect();
        let basal_area = polygon
            .basal_area
            .unwrap_or_else(|| species.iter().map(|s| s.basal_area).sum());
        let trees_per_hectare = polygon
            .trees_per_hectare
            .unwrap_or_else(|| species.iter().map(|s| s.trees_per_hectare).sum());

        Self {
            description: polygon.description.clone(),
            region: polygon.region,
            totals: BankTotals {
                basal_area,
                trees_per_hectare,
                site_index: None,
            },
            species,
            ranking: None,
        }
    }

    pub fn n_species(&self) -> usize {
        self.species.len()
    }

    /// Slot indices of the species, `1..=n_species()`.
    pub fn indices(&self) -> RangeInclusive<usize> {
        1..=self.species.len()
    }

    /// The species in slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or greater than `n_species()`.
    pub fn species(&self, index: usize) -> &SpeciesSlot {
        assert!(index >= 1, "slot 0 is the polygon aggregate, not a species");
        &self.species[index - 1]
    }

    /// Mutable access to the species in slot `index`.
    ///
    /// # Panics
    ///
    /// Panics if `index` is 0 or greater than `n_species()`.
    pub fn species_mut(&mut self, index: usize) -> &mut SpeciesSlot {
        assert!(index >= 1, "slot 0 is the polygon aggregate, not a species");
        &mut self.species[index - 1]
    }

    /// All species slots in slot order.
    pub fn species_slots(&self) -> &[SpeciesSlot] {
        &self.species
    }

    /// Slot index of the species with the given genus.
    pub fn index_of(&self, genus: Genus) -> Option<usize> {
        self.species.iter().position(|s| s.genus == genus).map(|p| p + 1)
    }

    /// Remove the species in slot `index`; later slots shift down by one.
    ///
    /// Any ranking is discarded since its slot indices no longer apply.
    pub fn remove(&mut self, index: usize) -> SpeciesSlot {
        assert!(index >= 1, "slot 0 is the polygon aggregate, not a species");
        self.ranking = None;
        self.species.remove(index - 1)
    }

    /// Remove every species matching `predicate`, returning how many were removed.
    pub fn remove_species<F>(&mut self, mut predicate: F) -> usize
    where
        F: FnMut(&SpeciesSlot) -> bool,
    {
        let before = self.species.len();
        self.species.retain(|s| !predicate(s));
        let removed = before - self.species.len();
        if removed > 0 {
            self.ranking = None;
        }
        removed
    }

    pub fn ranking(&self) -> Option<&SpeciesRankingDetails> {
        self.ranking.as_ref()
    }

    pub(crate) fn set_ranking(&mut self, details: SpeciesRankingDetails) {
        self.ranking = Some(details);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_bank() -> PolygonBank {
        let mut polygon = Polygon::new("bank test", 1970, Region::Coastal);
        let mut b = LayerSpecies::new(Genus::B, 0.40292);
        b.site_index = Some(12.5);
        polygon.species.push(b);
        polygon.species.push(LayerSpecies::new(Genus::C, 5.04597));
        polygon.species.push(LayerSpecies::new(Genus::D, 29.30249));
        PolygonBank::from_polygon(&polygon)
    }

    #[test]
    fn test_totals_derived_from_species() {
        let bank = sample_bank();
        let expected = 0.40292 + 5.04597 + 29.30249;
        assert!((bank.totals.basal_area.all() - expected).abs() < 1e-9);
    }

    #[test]
    fn test_supplied_totals_are_kept() {
        let mut polygon = Polygon::new("p", 1970, Region::Interior);
        polygon.basal_area = Some(UtilizationVector::from_all(44.93259));
        polygon.species.push(LayerSpecies::new(Genus::S, 4.37115));
        let bank = PolygonBank::from_polygon(&polygon);
        assert_eq!(bank.totals.basal_area.all(), 44.93259);
    }

    #[test]
    fn test_slot_indices_are_one_based() {
        let bank = sample_bank();
        assert_eq!(bank.indices().collect::<Vec<_>>(), vec![1, 2, 3]);
        assert_eq!(bank.species(1).genus, Genus::B);
        assert_eq!(bank.species(3).genus, Genus::D);
        assert_eq!(bank.index_of(Genus::C), Some(2));
        assert_eq!(bank.index_of(Genus::H), None);
    }

    #[test]
    #[should_panic(expected = "slot 0")]
    fn test_slot_zero_is_not_a_species() {
        let bank = sample_bank();
        let _ = bank.species(0);
    }

    #[test]
    fn test_remove_keeps_fields_aligned() {
        let mut bank = sample_bank();
        let removed = bank.remove(1);
        assert_eq!(removed.genus, Genus::B);
        assert_eq!(removed.site_index, Some(12.5));
        assert_eq!(bank.n_species(), 2);
        assert_eq!(bank.species(1).genus, Genus::C);
        assert_eq!(bank.species(1).site_index, None);
        assert_eq!(bank.species(2).basal_area.all(), 29.30249);
    }

    #[test]
    fn test_remove_discards_ranking() {
        let mut bank = sample_bank();
        bank.set_ranking(SpeciesRankingDetails {
            primary_index: 3,
            secondary_index: Some(2),
            inventory_type_group: 37,
            primary_percentage: 83.0,
        });
        assert_eq!(bank.remove_species(|s| s.basal_area.all() < 1.0), 1);
        assert!(bank.ranking().is_none());
    }

    #[test]
    fn test_remove_species_none_matching_keeps_ranking() {
        let mut bank = sample_bank();
        bank.set_ranking(SpeciesRankingDetails {
            primary_index: 3,
            secondary_index: None,
            inventory_type_group: 37,
            primary_percentage: 83.0,
        });
        assert_eq!(bank.remove_species(|s| s.basal_area.all() < 0.001), 0);
        assert!(bank.ranking().is_some());
    }
}
