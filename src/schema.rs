//! Fixed positional schema of the indicator workbook.
//!
//! The `data` sheet carries an integer `id` followed by 126 indicator columns;
//! the `about` sheet carries one `(id, var_name, var_description)` triple per
//! indicator. Column positions are part of the on-disk contract shared by the
//! scraper, the relational loader and the training workflow.

/// Name of the wide indicator sheet.
pub const DATA_SHEET: &str = "data";
/// Name of the indicator metadata sheet.
pub const INFO_SHEET: &str = "about";
/// Name of the sheet mapping ids back to entity display names.
pub const ENTITIES_SHEET: &str = "entities";

/// Relational table holding the wide indicator rows.
pub const DATA_TABLE: &str = "data";
/// Relational table holding the metadata triples.
pub const INFO_TABLE: &str = "info";

/// Column names of the `data` sheet, in positional order.
pub const DATA_COLUMNS: [&str; 127] = [
    "id",
    "edu_index",
    "science_index",
    "inter_index",
    "fin_index",
    "wage",
    "add",
    "exam_1",
    "exam_2",
    "exam_3",
    "avg_exam_1",
    "stud_num_1",
    "stud_num_2",
    "stud_num_3",
    "w_1",
    "w_2",
    "w_3",
    "w_4",
    "w_5",
    "asp_num",
    "w_6",
    "w_7",
    "citation_1",
    "citation_2",
    "citation_3",
    "pub_num_1",
    "pub_num_2",
    "pub_num_3",
    "research_num",
    "w_8",
    "w_9",
    "research_incom",
    "license_num",
    "w_10",
    "w_11",
    "w_12",
    "journal_num",
    "grants_num",
    "w_13",
    "w_14",
    "w_15",
    "w_16",
    "w_17",
    "w_18",
    "stud_num_4",
    "w_19",
    "prof_num",
    "w_20",
    "w_21",
    "money_1",
    "money_2",
    "income_per_npr",
    "w_22",
    "avg_wage_1",
    "total_income",
    "total_square_1",
    "square_1",
    "square_2",
    "square_3",
    "square_4",
    "computer_number",
    "w_23",
    "books",
    "w_24",
    "w_25",
    "w_26",
    "npr_num",
    "w_27",
    "total_stud_num_1",
    "stud_num_5",
    "stud_num_6",
    "stud_num_7",
    "avg_exam_2",
    "w_28",
    "w_29",
    "w_30",
    "stud_num_8",
    "stud_num_9",
    "company_num_1",
    "company_num_2",
    "money_3",
    "money_4",
    "total_pub_num",
    "bi_num",
    "tp_num",
    "ccus_num",
    "sb_num",
    "total_asp_num",
    "w_31",
    "total_doc_num",
    "diss_sov_num",
    "total_work_num",
    "total_pps_num",
    "total_sci_num",
    "w_32",
    "w_33",
    "w_34",
    "w_35",
    "avg_wage_2",
    "avg_wage_3",
    "for_stud_num",
    "w_36",
    "total_prog_num",
    "total_stud_num_2",
    "total_for_asp_num",
    "citation_4",
    "for_income_1",
    "for_income_2",
    "results_num",
    "total_square_2",
    "lab_square",
    "research_square",
    "living_square",
    "sport_square",
    "w_37",
    "comp_num",
    "w_38",
    "library",
    "income",
    "non_budget_income",
    "w_39",
    "w_40",
    "w_41",
    "w_42",
    "w_43",
    "w_44",
    "w_45",
];

/// Column names of the `about` sheet.
pub const INFO_COLUMNS: [&str; 3] = ["id", "var_name", "var_description"];

/// Number of indicator columns in a complete entity record (excludes `id`).
pub const INDICATOR_COUNT: usize = DATA_COLUMNS.len() - 1;

/// Indicator names without the leading `id` column.
pub fn indicator_names() -> &'static [&'static str] {
    &DATA_COLUMNS[1..]
}

/// Positional index of a data column.
pub fn position(name: &str) -> Option<usize> {
    DATA_COLUMNS.iter().position(|&c| c == name)
}
