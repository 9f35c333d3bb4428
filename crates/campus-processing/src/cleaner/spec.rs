//! Fixed cleaning policy for the five raw datasets.
//!
//! One canonical policy per table: the three school-level tables are
//! deduplicated, lowercased, and presence-flagged; the two long-format
//! tables (`historical_tuition`, `tuition_income`) pass through unchanged.
//! Duplicate diversity rows are not pre-aggregated before joining.

use once_cell::sync::Lazy;

/// Cleaning policy for one raw table.
#[derive(Debug, Clone)]
pub struct CleaningSpec {
    /// Table name, also the raw file stem and the store artifact name.
    pub table: &'static str,
    /// Whether exact-duplicate rows are removed.
    pub dedup: bool,
    /// Nullable columns (cleaned names) that get a `has_<col>_data` flag.
    pub presence_flags: Vec<String>,
}

impl CleaningSpec {
    /// A passthrough spec copies the table unchanged.
    pub fn is_passthrough(&self) -> bool {
        !self.dedup && self.presence_flags.is_empty()
    }
}

fn flags(names: &[&str]) -> Vec<String> {
    names.iter().map(|s| s.to_string()).collect()
}

static SPECS: Lazy<Vec<CleaningSpec>> = Lazy::new(|| {
    vec![
        CleaningSpec {
            table: "tuition_cost",
            dedup: true,
            presence_flags: flags(&["room_and_board", "in_state_tuition", "in_state_total"]),
        },
        CleaningSpec {
            table: "salary_potential",
            dedup: true,
            presence_flags: flags(&["make_world_better_percent", "stem_percent"]),
        },
        CleaningSpec {
            table: "diversity_school",
            dedup: true,
            presence_flags: flags(&["total_enrollment"]),
        },
        CleaningSpec {
            table: "historical_tuition",
            dedup: false,
            presence_flags: Vec::new(),
        },
        CleaningSpec {
            table: "tuition_income",
            dedup: false,
            presence_flags: Vec::new(),
        },
    ]
});

/// The full fixed registry, in cleaning order.
pub fn dataset_specs() -> &'static [CleaningSpec] {
    &SPECS
}

/// Look up the cleaning spec for a table name.
pub fn spec_for(table: &str) -> Option<&'static CleaningSpec> {
    SPECS.iter().find(|s| s.table == table)
}
