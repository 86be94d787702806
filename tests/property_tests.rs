/// Property-based tests using proptest
/// Tests invariants of phone normalization that should hold for all inputs
use proptest::prelude::*;
use servavto_leads::phone::{digits, mask, normalize, PhoneError};
use servavto_leads::models::FieldMap;
use servavto_leads::validation::{clean_input, validate};

// Property: valid 11-digit numbers normalize and format positionally
proptest! {
    #[test]
    fn eleven_digits_with_country_code_format_positionally(
        lead in prop::sample::select(vec!['7', '8']),
        rest in "[0-9]{10}"
    ) {
        let raw = format!("{}{}", lead, rest);
        let phone = normalize(&raw).unwrap();

        prop_assert_eq!(phone.as_digits(), format!("7{}", rest));
        prop_assert_eq!(
            phone.format(),
            format!("+7 ({}) {}-{}-{}", &rest[0..3], &rest[3..6], &rest[6..8], &rest[8..10])
        );
    }

    #[test]
    fn normalize_is_idempotent_through_format(
        lead in prop::sample::select(vec!['7', '8']),
        rest in "[0-9]{10}"
    ) {
        let first = normalize(&format!("{}{}", lead, rest)).unwrap();
        let second = normalize(&first.format()).unwrap();
        prop_assert_eq!(first, second);
    }

    #[test]
    fn separators_do_not_affect_normalization(
        rest in "[0-9]{10}",
        sep in prop::sample::select(vec![" ", "-", "(", ")", ".", " - "])
    ) {
        let spaced: String = rest.chars().map(|c| format!("{}{}", c, sep)).collect();
        let raw = format!("+7{}{}", sep, spaced);
        let phone = normalize(&raw).unwrap();
        prop_assert_eq!(phone.as_digits(), format!("7{}", rest));
    }
}

// Property: anything else is rejected
proptest! {
    #[test]
    fn wrong_digit_count_is_rejected(raw in "[0-9]{0,10}|[0-9]{12,20}") {
        prop_assert_eq!(normalize(&raw), Err(PhoneError::InvalidPhone));
    }

    #[test]
    fn other_leading_digit_is_rejected(
        lead in prop::sample::select(vec!['0', '1', '2', '3', '4', '5', '6', '9']),
        rest in "[0-9]{10}"
    ) {
        let raw = format!("{}{}", lead, rest);
        prop_assert_eq!(normalize(&raw), Err(PhoneError::InvalidPhone));
    }

    #[test]
    fn normalization_never_panics(raw in "\\PC*") {
        let _ = normalize(&raw);
        let _ = mask(&raw);
    }
}

// Property: the lenient mask agrees with strict formatting on complete input
proptest! {
    #[test]
    fn mask_of_complete_number_matches_format(
        lead in prop::sample::select(vec!['7', '8']),
        rest in "[0-9]{10}"
    ) {
        let raw = format!("{}{}", lead, rest);
        prop_assert_eq!(mask(&raw), normalize(&raw).unwrap().format());
    }

    #[test]
    fn mask_of_partial_number_is_prefix_of_format(
        lead in prop::sample::select(vec!['7', '8']),
        rest in "[0-9]{10}",
        typed in 1usize..=11
    ) {
        let raw = format!("{}{}", lead, rest);
        let full = normalize(&raw).unwrap().format();
        let partial = mask(&raw[..typed]);
        prop_assert!(full.starts_with(&partial), "{} is not a prefix of {}", partial, full);
    }

    #[test]
    fn mask_ignores_digits_past_eleven(raw in "[78][0-9]{10}", extra in "[0-9]{1,9}") {
        prop_assert_eq!(mask(&format!("{}{}", raw, extra)), mask(&raw));
        prop_assert_eq!(digits(&mask(&raw)).len(), 11);
    }
}

// Property: cleaned values carry no raw markup characters
proptest! {
    #[test]
    fn cleaned_input_has_no_markup(raw in "\\PC*") {
        let cleaned = clean_input(&raw);
        prop_assert!(!cleaned.contains('<'));
        prop_assert!(!cleaned.contains('>'));
        prop_assert!(!cleaned.contains('"'));
        prop_assert!(!cleaned.contains('\''));
    }
}

// Property: markup characters around the phone never count as digits
proptest! {
    #[test]
    fn phone_digit_count_survives_markup(
        typed in "[0-9]{1,14}",
        sep in prop::sample::select(vec!["'", "&", "<", ">", "\"", " ", "-"])
    ) {
        let raw: String = typed.chars().map(|c| format!("{}{}", sep, c)).collect();
        let fields: FieldMap = [
            ("form_type", "calculator"),
            ("problem", "Стук"),
            ("brand", "Kia"),
            ("model", "Rio"),
            ("phone", raw.as_str()),
        ]
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

        let expected = normalize(&typed);
        match validate(&fields) {
            Ok(lead) => {
                let phone = expected.unwrap();
                prop_assert_eq!(lead.phone(), &phone);
            }
            Err(_) => prop_assert!(expected.is_err()),
        }
    }
}
