use assert_approx_eq::assert_approx_eq;

use stand_projection::{
    error::ProjectionError,
    forward::{
        calculate_coverages, calculate_missing_site_curves, determine_polygon_rankings,
        execute_forward_algorithm, remove_small_species, ExecutionStep, ForwardContext,
        ForwardEngine, SiteCurveMap,
    },
    io,
    models::{Genus, LayerSpecies, Polygon, PolygonBank, Region, UtilizationVector},
    site_index::{convert, SiteCurve},
    ProjectionConfig,
};

fn create_test_polygon(name: &str) -> Polygon {
    let mut polygon = Polygon::new(name, 1970, Region::Coastal);
    for (genus, ba) in [
        (Genus::B, 0.40292),
        (Genus::C, 5.04597),
        (Genus::D, 29.30249),
        (Genus::H, 5.81006),
        (Genus::S, 4.37115),
    ] {
        polygon.species.push(LayerSpecies::new(genus, ba));
    }
    polygon
}

#[test]
fn test_small_species_removed_and_slots_stay_aligned() {
    let mut polygon = create_test_polygon("small species");
    polygon.species[1].basal_area = UtilizationVector::from_all(0.0004);
    polygon.species[1].site_index = Some(40.0);
    polygon.species[3].site_index = Some(24.0);
    polygon.species[3].site_curve = Some(SiteCurve::HwcWiley);

    let mut bank = PolygonBank::from_polygon(&polygon);
    execute_forward_algorithm(
        &mut bank,
        &ForwardContext::default(),
        ExecutionStep::RemoveSmallSpecies,
    )
    .unwrap();

    assert_eq!(bank.n_species(), 4);
    let genera: Vec<Genus> = bank.species_slots().iter().map(|s| s.genus).collect();
    assert_eq!(genera, vec![Genus::B, Genus::D, Genus::H, Genus::S]);
    // The hemlock's values moved down with it.
    assert_eq!(bank.species(3).site_index, Some(24.0));
    assert_eq!(bank.species(3).site_curve, Some(SiteCurve::HwcWiley));
    assert!(bank.species_slots().iter().all(|s| s.site_index != Some(40.0)));

    execute_forward_algorithm(&mut bank, &ForwardContext::default(), ExecutionStep::All).unwrap();
    let ranking = bank.ranking().unwrap();
    assert_eq!(ranking.primary_index, 2);
    assert_eq!(bank.species(ranking.primary_index).genus, Genus::D);
    assert!(ranking.primary_index <= bank.n_species());
    assert!(ranking.secondary_index.unwrap() <= bank.n_species());
}

#[test]
fn test_stages_invoked_individually() {
    let mut bank = PolygonBank::from_polygon(&create_test_polygon("stages"));

    assert_eq!(remove_small_species(&mut bank).unwrap(), 0);
    calculate_missing_site_curves(&mut bank, &SiteCurveMap::new()).unwrap();
    calculate_coverages(&mut bank);
    let details = determine_polygon_rankings(&mut bank, &[]).unwrap();

    assert_eq!(details.primary_index, 3);
    assert_eq!(details.secondary_index, Some(4));
    assert_eq!(details.inventory_type_group, 37);
    assert_eq!(bank.ranking(), Some(&details));
}

#[test]
fn test_full_pipeline_estimates_from_a_single_measurement() {
    let mut polygon = create_test_polygon("one measurement");
    polygon.species[1].site_index = Some(13.4);
    polygon.species[1].site_curve = Some(SiteCurve::CwcKurucz);
    polygon.species[2].site_curve = Some(SiteCurve::HwcWileyAc);
    polygon.species[4].age_total = Some(55.0);
    polygon.species[4].years_at_breast_height = Some(54.0);

    let bank = ForwardEngine::default().process_polygon(&polygon).unwrap();

    let expected = convert(SiteCurve::CwcKurucz, 13.4, SiteCurve::HwcWileyAc).unwrap();
    assert_approx_eq!(bank.species(3).site_index.unwrap(), expected, 1e-9);
    assert_approx_eq!(bank.species(4).site_index.unwrap(), expected, 1e-9);
    assert_eq!(bank.totals.site_index, bank.species(3).site_index);
    assert_eq!(bank.species(5).years_to_breast_height, Some(1.0));
    assert!(bank.species(3).years_to_breast_height.is_some());
}

#[test]
fn test_batch_failures_stay_with_their_polygon() {
    let mut empty = create_test_polygon("all tiny");
    for sp in &mut empty.species {
        sp.basal_area = UtilizationVector::from_all(0.0001);
    }
    let mut whitebark = Polygon::new("whitebark", 1990, Region::Coastal);
    whitebark.species.push(LayerSpecies::new(Genus::Pa, 12.0));

    let polygons = vec![create_test_polygon("ok"), empty, whitebark];
    let results = ForwardEngine::default().process_polygons(&polygons);

    assert!(results[0].is_ok());
    assert!(matches!(results[1], Err(ProjectionError::NoSpeciesRemaining { .. })));
    assert!(matches!(results[2], Err(ProjectionError::NoCurveAvailable { .. })));
}

#[test]
fn test_config_supplies_missing_curve() {
    let config = ProjectionConfig::from_toml_str(
        r#"
        [[site_curves]]
        genus = "PA"
        region = "coastal"
        curve = "pli_goudie_wet"
        "#,
    )
    .unwrap();
    let mut whitebark = Polygon::new("whitebark", 1990, Region::Coastal);
    whitebark.species.push(LayerSpecies::new(Genus::Pa, 12.0));

    let bank = ForwardEngine::from_config(&config).process_polygon(&whitebark).unwrap();

    assert_eq!(bank.species(1).site_curve, Some(SiteCurve::PliGoudieWet));
    let ranking = bank.ranking().unwrap();
    assert_eq!(ranking.inventory_type_group, 28);
    assert_eq!(ranking.secondary_index, None);
}

#[test]
fn test_combined_pair_ranks_together() {
    let mut polygon = Polygon::new("pines", 1995, Region::Interior);
    polygon.species.push(LayerSpecies::new(Genus::Pl, 10.0));
    polygon.species.push(LayerSpecies::new(Genus::S, 14.0));
    polygon.species.push(LayerSpecies::new(Genus::Pa, 6.0));

    let engine = ForwardEngine::default();
    let bank = engine
        .process_polygon_through(&polygon, ExecutionStep::DeterminePolygonRankings)
        .unwrap();

    // PL absorbs PA and overtakes S.
    let ranking = bank.ranking().unwrap();
    assert_eq!(bank.species(ranking.primary_index).genus, Genus::Pl);
    assert_eq!(bank.species(ranking.secondary_index.unwrap()).genus, Genus::S);
    assert_eq!(ranking.inventory_type_group, 30);
    // Coverages on the bank itself are not merged.
    assert_approx_eq!(bank.species(3).percent_forested.unwrap(), 20.0, 1e-9);
}

#[test]
fn test_csv_file_through_engine() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("layer.csv");
    io::write_csv(&[create_test_polygon("from csv")], &path).unwrap();

    let polygons = io::read_csv(&path).unwrap();
    let bank = ForwardEngine::default().process_polygon(&polygons[0]).unwrap();

    assert_eq!(bank.description.name, "from csv");
    assert_eq!(bank.ranking().unwrap().inventory_type_group, 37);
}
