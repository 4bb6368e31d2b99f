use colored::Colorize;
use comfy_table::{modifiers::UTF8_ROUND_CORNERS, presets::UTF8_FULL, Cell, ContentArrangement, Table};

use crate::models::PolygonBank;
use crate::site_index::EquationSpec;

fn new_table(header: Vec<&str>) -> Table {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(header);
    table
}

fn opt(value: Option<f64>, precision: usize) -> String {
    value.map_or_else(|| "-".to_string(), |v| format!("{v:.precision$}"))
}

/// Format the species slots of a processed bank as a string.
pub fn format_bank_table(bank: &PolygonBank) -> String {
    let mut output = String::new();
    output.push_str(&format!(
        "\n{}\n",
        format!("Polygon {} ({})", bank.description, bank.region).bold().green()
    ));
    output.push_str(&format!("{}\n", "=".repeat(70)));

    let mut table = new_table(vec![
        "Slot",
        "Genus",
        "BA (m²/ha)",
        "% Forested",
        "Site Curve",
        "Site Index",
        "Age",
        "YABH",
        "Y2BH",
    ]);

    let ranking = bank.ranking();
    for i in bank.indices() {
        let slot = bank.species(i);
        let marker = match ranking {
            Some(r) if r.primary_index == i => " *",
            Some(r) if r.secondary_index == Some(i) => " +",
            _ => "",
        };
        table.add_row(vec![
            Cell::new(i),
            Cell::new(format!("{}{marker}", slot.genus)),
            Cell::new(format!("{:.5}", slot.basal_area.all())),
            Cell::new(opt(slot.percent_forested, 1)),
            Cell::new(slot.site_curve.map_or_else(|| "-".to_string(), |c| c.name().to_string())),
            Cell::new(opt(slot.site_index, 2)),
            Cell::new(opt(slot.age_total, 1)),
            Cell::new(opt(slot.years_at_breast_height, 1)),
            Cell::new(opt(slot.years_to_breast_height, 2)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the species slots of a processed bank.
pub fn print_bank_table(bank: &PolygonBank) {
    println!("{}", format_bank_table(bank));
}

/// Format one summary row per bank: primary, secondary and inventory type group.
pub fn format_ranking_summary(banks: &[PolygonBank]) -> String {
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Species Rankings".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    let mut table = new_table(vec![
        "Polygon",
        "Year",
        "Primary",
        "% Primary",
        "Secondary",
        "ITG",
        "Site Index",
    ]);

    for bank in banks {
        let (primary, percent, secondary, itg) = match bank.ranking() {
            Some(r) => (
                bank.species(r.primary_index).genus.to_string(),
                format!("{:.1}", r.primary_percentage),
                r.secondary_index
                    .map_or_else(|| "-".to_string(), |s| bank.species(s).genus.to_string()),
                r.inventory_type_group.to_string(),
            ),
            None => ("-".into(), "-".into(), "-".into(), "-".into()),
        };
        table.add_row(vec![
            Cell::new(&bank.description.name),
            Cell::new(bank.description.year),
            Cell::new(primary),
            Cell::new(percent),
            Cell::new(secondary),
            Cell::new(itg),
            Cell::new(opt(bank.totals.site_index, 2)),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print one summary row per bank.
pub fn print_ranking_summary(banks: &[PolygonBank]) {
    println!("{}", format_ranking_summary(banks));
}

/// Format the site-curve catalogue as a string.
pub fn format_curve_catalogue<I>(specs: I) -> String
where
    I: IntoIterator<Item = EquationSpec>,
{
    let mut output = String::new();
    output.push_str(&format!("\n{}\n", "Site Curves".bold().green()));
    output.push_str(&format!("{}\n", "=".repeat(60)));

    let mut table = new_table(vec![
        "Index",
        "Name",
        "Species",
        "Solver",
        "Coefficients",
        "Description",
    ]);
    for spec in specs {
        let coefficients = spec
            .form
            .coefficients()
            .iter()
            .map(|c| c.to_string())
            .collect::<Vec<_>>()
            .join(", ");
        table.add_row(vec![
            Cell::new(spec.index),
            Cell::new(spec.name),
            Cell::new(spec.species),
            Cell::new(spec.strategy()),
            Cell::new(coefficients),
            Cell::new(spec.description),
        ]);
    }

    output.push_str(&format!("{table}"));
    output
}

/// Print the site-curve catalogue.
pub fn print_curve_catalogue<I>(specs: I)
where
    I: IntoIterator<Item = EquationSpec>,
{
    println!("{}", format_curve_catalogue(specs));
}
