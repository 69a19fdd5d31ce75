use omop_map::{normalize_table_name, same_table};
use proptest::prelude::*;

#[test]
fn admission_variants_are_the_same_table() {
    assert_eq!(
        normalize_table_name("Admission - Discharge"),
        normalize_table_name("Admission / Discharge")
    );
    assert!(same_table("Admission-Discharge", "ADMISSION / DISCHARGE"));
}

proptest! {
    #[test]
    fn normalization_is_idempotent(name in "\\PC*") {
        let once = normalize_table_name(&name);
        prop_assert_eq!(normalize_table_name(&once), once);
    }

    #[test]
    fn separators_are_interchangeable(
        words in prop::collection::vec("[A-Za-z]{1,8}", 1..4),
        separator in prop::sample::select(vec![" ", " - ", "/", " / ", "-", "   "]),
    ) {
        let spaced = words.join(" ");
        let separated = words.join(separator);
        prop_assert!(same_table(&spaced, &separated));
    }

    #[test]
    fn normalized_names_have_no_outer_or_double_spaces(name in "[ a-zA-Z/\\-]{0,24}") {
        let normalized = normalize_table_name(&name);
        prop_assert!(!normalized.starts_with(' '));
        prop_assert!(!normalized.ends_with(' '));
        prop_assert!(!normalized.contains("  "));
    }
}
