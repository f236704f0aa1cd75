//! Languages accepted by the Google Translate speech endpoint.

/// `(code, name)` pairs, sorted by code.
pub const SUPPORTED_LANGUAGES: &[(&str, &str)] = &[
    ("af", "Afrikaans"),
    ("am", "Amharic"),
    ("ar", "Arabic"),
    ("bg", "Bulgarian"),
    ("bn", "Bengali"),
    ("bs", "Bosnian"),
    ("ca", "Catalan"),
    ("cs", "Czech"),
    ("cy", "Welsh"),
    ("da", "Danish"),
    ("de", "German"),
    ("el", "Greek"),
    ("en", "English"),
    ("es", "Spanish"),
    ("et", "Estonian"),
    ("eu", "Basque"),
    ("fi", "Finnish"),
    ("fr", "French"),
    ("fr-ca", "French (Canada)"),
    ("gl", "Galician"),
    ("gu", "Gujarati"),
    ("ha", "Hausa"),
    ("hi", "Hindi"),
    ("hr", "Croatian"),
    ("hu", "Hungarian"),
    ("id", "Indonesian"),
    ("is", "Icelandic"),
    ("it", "Italian"),
    ("iw", "Hebrew"),
    ("ja", "Japanese"),
    ("jw", "Javanese"),
    ("km", "Khmer"),
    ("kn", "Kannada"),
    ("ko", "Korean"),
    ("la", "Latin"),
    ("lt", "Lithuanian"),
    ("lv", "Latvian"),
    ("ml", "Malayalam"),
    ("mr", "Marathi"),
    ("ms", "Malay"),
    ("my", "Myanmar (Burmese)"),
    ("ne", "Nepali"),
    ("nl", "Dutch"),
    ("no", "Norwegian"),
    ("pa", "Punjabi (Gurmukhi)"),
    ("pl", "Polish"),
    ("pt", "Portuguese (Brazil)"),
    ("pt-pt", "Portuguese (Portugal)"),
    ("ro", "Romanian"),
    ("ru", "Russian"),
    ("si", "Sinhala"),
    ("sk", "Slovak"),
    ("sq", "Albanian"),
    ("sr", "Serbian"),
    ("su", "Sundanese"),
    ("sv", "Swedish"),
    ("sw", "Swahili"),
    ("ta", "Tamil"),
    ("te", "Telugu"),
    ("th", "Thai"),
    ("tl", "Filipino"),
    ("tr", "Turkish"),
    ("uk", "Ukrainian"),
    ("ur", "Urdu"),
    ("vi", "Vietnamese"),
    ("yue", "Cantonese"),
    ("zh-cn", "Chinese (Simplified)"),
    ("zh-tw", "Chinese (Traditional)"),
];

/// Aliases for codes the endpoint knows under another name.
const ALIASES: &[(&str, &str)] = &[
    ("he", "iw"),
    ("jv", "jw"),
    ("zh", "zh-cn"),
    ("zh-hans", "zh-cn"),
    ("zh-hant", "zh-tw"),
    ("fil", "tl"),
    ("nb", "no"),
    ("pt-br", "pt"),
];

/// Maps a language tag to its canonical supported code.
///
/// Matching is case-insensitive and accepts `_` as a separator. A regional
/// tag falls back to its primary subtag (`en-GB` → `en`).
pub fn normalize_language(code: &str) -> Option<&'static str> {
    let code = code.trim().to_lowercase().replace('_', "-");
    if code.is_empty() {
        return None;
    }

    exact(&code).or_else(|| {
        let primary = code.split('-').next()?;
        exact(primary)
    })
}

/// Returns whether the endpoint speaks `code`.
#[inline]
pub fn is_supported(code: &str) -> bool {
    normalize_language(code).is_some()
}

/// Human-readable name for a canonical code.
pub fn language_name(code: &str) -> Option<&'static str> {
    SUPPORTED_LANGUAGES
        .binary_search_by(|(c, _)| c.cmp(&code))
        .ok()
        .map(|i| SUPPORTED_LANGUAGES[i].1)
}

fn exact(code: &str) -> Option<&'static str> {
    if let Ok(i) = SUPPORTED_LANGUAGES.binary_search_by(|(c, _)| (*c).cmp(code)) {
        return Some(SUPPORTED_LANGUAGES[i].0);
    }
    ALIASES
        .iter()
        .find(|(alias, _)| *alias == code)
        .map(|(_, target)| *target)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_is_sorted() {
        assert!(SUPPORTED_LANGUAGES.windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_normalize_language() {
        assert_eq!(normalize_language("en"), Some("en"));
        assert_eq!(normalize_language("EN"), Some("en"));
        assert_eq!(normalize_language("en_US"), Some("en"));
        assert_eq!(normalize_language(" en-GB "), Some("en"));
        assert_eq!(normalize_language("zh-TW"), Some("zh-tw"));
        assert_eq!(normalize_language("zh"), Some("zh-cn"));
        assert_eq!(normalize_language("he"), Some("iw"));
        assert_eq!(normalize_language("pt-PT"), Some("pt-pt"));
        assert_eq!(normalize_language("xx"), None);
        assert_eq!(normalize_language(""), None);
    }

    #[test]
    fn test_language_name() {
        assert_eq!(language_name("fr"), Some("French"));
        assert_eq!(language_name("qq"), None);
        assert!(is_supported("de-AT"));
    }
}
