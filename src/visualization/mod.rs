mod tables;

pub use tables::{
    format_bank_table, print_bank_table,
    format_ranking_summary, print_ranking_summary,
    format_curve_catalogue, print_curve_catalogue,
};
