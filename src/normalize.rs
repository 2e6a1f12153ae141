use unicode_normalization::UnicodeNormalization;
use unicode_normalization::char::is_combining_mark;

/// Fold accented letters to their base form: "Kärkkäinen" → "Karkkainen".
///
/// Decomposes to NFD and drops the combining marks. Characters without an
/// ASCII base are kept as they are.
pub fn normalize(text: &str) -> String {
    text.nfd().filter(|c| !is_combining_mark(*c)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_diacritics() {
        assert_eq!(normalize("Kärkkäinen"), "Karkkainen");
        assert_eq!(normalize("Šmíd, Çelik, Núñez"), "Smid, Celik, Nunez");
    }

    #[test]
    fn ascii_is_unchanged() {
        let text = "(Rasku, Musliu & Karkkainen 2013, p. 4--12)";
        assert_eq!(normalize(text), text);
    }
}
