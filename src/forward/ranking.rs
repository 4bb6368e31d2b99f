use tracing::debug;

use crate::error::ProjectionError;
use crate::models::{Genus, PolygonBank, SpeciesRankingDetails};

/// Primary percentages above this classify the polygon as a pure stand.
pub const PURE_STAND_PERCENTAGE: f64 = 79.999;

/// Merge the percentages of a two-genus combination group in place.
///
/// When both genera of `group` occur in `genera`, the member with the larger
/// percentage absorbs the other's and the other drops to exactly zero; on a
/// tie the later slot absorbs. When fewer than two occur nothing changes.
pub fn combine_percentages(
    genera: &[Genus],
    group: &[Genus],
    percentages: &mut [f64],
) -> Result<(), ProjectionError> {
    if group.len() != 2 {
        return Err(ProjectionError::InvalidArgument(format!(
            "combination group must have size 2; it has size {}",
            group.len()
        )));
    }
    if genera.len() != percentages.len() {
        return Err(ProjectionError::InvalidArgument(format!(
            "the number of genera ({}) must match the number of percentages ({})",
            genera.len(),
            percentages.len()
        )));
    }

    let members: Vec<usize> = genera
        .iter()
        .enumerate()
        .filter(|(_, g)| group.contains(g))
        .map(|(i, _)| i)
        .collect();

    if members.len() > 2 {
        return Err(ProjectionError::InvalidArgument(format!(
            "{} species match a combination group of size 2",
            members.len()
        )));
    }
    if let [first, second] = members[..] {
        let (higher, lower) = if percentages[first] > percentages[second] {
            (first, second)
        } else {
            (second, first)
        };
        percentages[higher] += percentages[lower];
        percentages[lower] = 0.0;
    }
    Ok(())
}

/// Inventory type group of a stand made up (almost) entirely of `genus`.
pub fn pure_inventory_type_group(genus: Genus) -> u32 {
    match genus {
        Genus::Ac => 36,
        Genus::B => 18,
        Genus::C => 9,
        Genus::D => 37,
        Genus::E => 40,
        Genus::F => 1,
        Genus::Pw => 27,
        Genus::H => 12,
        Genus::Py => 32,
        Genus::L => 33,
        Genus::Pa => 28,
        Genus::At => 42,
        Genus::S => 21,
        Genus::Mb => 39,
        Genus::Y => 9,
        Genus::Pl => 28,
    }
}

/// Classify a polygon by its primary and secondary genera.
///
/// A primary covering more than [`PURE_STAND_PERCENTAGE`] percent uses the
/// pure-stand table regardless of the secondary. Otherwise a secondary equal
/// to the primary cannot be classified.
pub fn find_inventory_type_group(
    primary: Genus,
    secondary: Option<Genus>,
    primary_percentage: f64,
) -> Result<u32, ProjectionError> {
    use Genus::*;

    if primary_percentage > PURE_STAND_PERCENTAGE {
        return Ok(pure_inventory_type_group(primary));
    }

    if secondary == Some(primary) {
        return Err(ProjectionError::UnrecognizedGenus(format!(
            "primary and secondary genera are both {primary}"
        )));
    }

    let hardwood = secondary.is_some_and(Genus::is_hardwood);

    let group = match (primary, secondary) {
        (F, Some(C | Y)) => 2,
        (F, Some(B | H)) => 3,
        (F, Some(S)) => 4,
        (F, Some(Pl | Pa)) => 5,
        (F, Some(Py)) => 6,
        (F, Some(L | Pw)) => 7,
        (F, _) => 8,

        (C | Y, Some(H | B | S)) => 11,
        (C | Y, _) => 10,

        (H, Some(C | Y)) => 14,
        (H, Some(B)) => 15,
        (H, Some(S)) => 16,
        (H, _) => 13,

        (B, Some(C | Y | H)) => 19,
        (B, _) => 20,

        (S, Some(C | Y | H)) => 23,
        (S, Some(B)) => 24,
        (S, Some(Pl)) => 25,
        (S, _) if hardwood => 26,
        (S, _) => 22,

        (Pw, _) => 27,

        (Pl | Pa, Some(Pl | Pa)) => 28,
        (Pl | Pa, Some(F | Pw | L | Py)) => 29,
        (Pl | Pa, _) if hardwood => 31,
        (Pl | Pa, _) => 30,

        (Py, _) => 32,

        (L, Some(F)) => 33,
        (L, _) => 34,

        (Ac, _) if hardwood => 36,
        (Ac, _) => 35,

        (D, _) if hardwood => 38,
        (D, _) => 37,

        (Mb, _) => 39,
        (E, _) => 40,

        (At, _) if hardwood => 42,
        (At, _) => 41,
    };
    Ok(group)
}

/// Rank the species of a bank by forested-land coverage.
///
/// Coverage percentages are copied, the configured combination groups are
/// merged into the copy, and the two largest shares become primary and
/// secondary. Ties go to the earlier slot. The result is stored on the bank
/// and returned.
pub fn determine_polygon_rankings(
    bank: &mut PolygonBank,
    species_to_combine: &[Vec<Genus>],
) -> Result<SpeciesRankingDetails, ProjectionError> {
    if bank.n_species() == 0 {
        return Err(ProjectionError::InvalidArgument(
            "cannot find a primary species as there are no species".to_string(),
        ));
    }

    let genera: Vec<Genus> = bank.species_slots().iter().map(|s| s.genus).collect();
    let mut percentages: Vec<f64> = bank
        .species_slots()
        .iter()
        .map(|s| s.percent_forested.unwrap_or(0.0))
        .collect();

    for group in species_to_combine {
        combine_percentages(&genera, group, &mut percentages)?;
    }

    let mut highest: Option<(usize, f64)> = None;
    let mut second: Option<(usize, f64)> = None;
    for (i, &pct) in percentages.iter().enumerate() {
        if pct > highest.map_or(0.0, |(_, p)| p) {
            second = highest;
            highest = Some((i, pct));
        } else if pct > second.map_or(0.0, |(_, p)| p) {
            second = Some((i, pct));
        }
    }

    let (primary, primary_percentage) = highest.ok_or_else(|| {
        ProjectionError::InvalidArgument(format!(
            "polygon {} has no species with a covering percentage above 0",
            bank.description
        ))
    })?;

    let inventory_type_group = find_inventory_type_group(
        genera[primary],
        second.map(|(i, _)| genera[i]),
        primary_percentage,
    )?;

    let details = SpeciesRankingDetails {
        primary_index: primary + 1,
        secondary_index: second.map(|(i, _)| i + 1),
        inventory_type_group,
        primary_percentage,
    };
    debug!(
        polygon = %bank.description,
        primary = %genera[primary],
        secondary = ?second.map(|(i, _)| genera[i]),
        inventory_type_group,
        "ranked species"
    );
    bank.set_ranking(details);
    Ok(details)
}
