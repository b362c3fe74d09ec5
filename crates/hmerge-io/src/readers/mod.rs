pub mod csv;

/// Tokens read as a missing cell (compared after trimming whitespace).
pub const NA_TOKENS: &[&str] = &[
    "NA", "N/A", "n/a", "NaN", "nan", "-NaN", "-nan", "NULL", "null", "None", "<NA>", "#N/A",
    "#NA",
];

pub fn is_missing(cell: &str) -> bool {
    let t = cell.trim();
    t.is_empty() || NA_TOKENS.contains(&t)
}
