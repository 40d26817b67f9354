//! Identifier normalization.
//!
//! Every value stored in the identifier index, and every value used to
//! query it, goes through the same transform: non-ASCII characters are
//! dropped, surrounding whitespace is trimmed, and the result is
//! uppercased. The transform is idempotent.

/// Normalize a DICOM identifier value for indexing or lookup.
///
/// Non-ASCII characters are dropped before trimming; the other order
/// would let a dropped character expose fresh edge whitespace and break
/// idempotence. Interior characters are kept as-is apart from casing.
pub fn normalize_identifier(value: &str) -> String {
    value
        .chars()
        .filter(char::is_ascii)
        .collect::<String>()
        .trim()
        .to_ascii_uppercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_and_uppercases() {
        assert_eq!(normalize_identifier("  1.2.3 "), "1.2.3");
        assert_eq!(normalize_identifier("doe^john"), "DOE^JOHN");
    }

    #[test]
    fn drops_non_ascii() {
        assert_eq!(normalize_identifier("Sjögren"), "SJGREN");
        assert_eq!(normalize_identifier("山田"), "");
    }

    #[test]
    fn only_surrounding_whitespace_is_stripped() {
        assert_eq!(normalize_identifier("\t a\tb \n"), "A\tB");
        assert_eq!(normalize_identifier("a b"), "A B");
    }

    #[test]
    fn idempotent() {
        let once = normalize_identifier(" Ärzte 1.2.3 ");
        assert_eq!(normalize_identifier(&once), once);

        let with_tab = normalize_identifier("é a\tb");
        assert_eq!(normalize_identifier(&with_tab), with_tab);
    }
}
