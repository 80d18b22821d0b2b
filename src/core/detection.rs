//! Language tag helpers
//!
//! Provider tags arrive in many shapes ("en", "EN", "en-US", "eng"); the
//! pipeline compares languages on their ISO 639-1 code where one exists.

use isolang::Language;

/// Normalize a language tag to its ISO 639-1 code (or 639-3 when the
/// language has no two-letter code). Returns `None` for unknown tags.
pub fn normalize_language_tag(tag: &str) -> Option<String> {
    let primary = tag
        .trim()
        .split(|c| c == '-' || c == '_')
        .next()
        .unwrap_or("")
        .to_ascii_lowercase();

    let language = match primary.len() {
        2 => Language::from_639_1(&primary),
        3 => Language::from_639_3(&primary),
        _ => None,
    }?;

    Some(
        language
            .to_639_1()
            .map(|c| c.to_string())
            .unwrap_or_else(|| language.to_639_3().to_string()),
    )
}

/// Whether two tags name the same language.
///
/// Unknown tags fall back to a case-insensitive comparison of the primary
/// subtag so that "xx" still matches "XX-YY".
pub fn same_language(a: &str, b: &str) -> bool {
    match (normalize_language_tag(a), normalize_language_tag(b)) {
        (Some(a), Some(b)) => a == b,
        _ => primary_subtag(a).eq_ignore_ascii_case(primary_subtag(b)),
    }
}

fn primary_subtag(tag: &str) -> &str {
    tag.trim().split(|c| c == '-' || c == '_').next().unwrap_or("")
}

/// Guess a language from the Unicode blocks present in the text.
///
/// Used only when a provider answers without a detected language. Latin
/// script defaults to English; text with no letters yields `None`.
pub fn detect_script_language(text: &str) -> Option<&'static str> {
    if !text.chars().any(char::is_alphabetic) {
        return None;
    }

    let has_chinese = text.chars().any(|c| {
        ('\u{4E00}'..='\u{9FFF}').contains(&c) || // CJK Unified Ideographs
        ('\u{3400}'..='\u{4DBF}').contains(&c) // CJK Extension A
    });

    let has_japanese = text.chars().any(|c| {
        ('\u{3040}'..='\u{309F}').contains(&c) || // Hiragana
        ('\u{30A0}'..='\u{30FF}').contains(&c) // Katakana
    });

    let has_korean = text.chars().any(|c| ('\u{AC00}'..='\u{D7AF}').contains(&c));

    let has_arabic = text.chars().any(|c| {
        ('\u{0600}'..='\u{06FF}').contains(&c) || // Arabic
        ('\u{0750}'..='\u{077F}').contains(&c) // Arabic Supplement
    });

    let has_cyrillic = text.chars().any(|c| ('\u{0400}'..='\u{04FF}').contains(&c));

    let lang = if has_japanese {
        "ja"
    } else if has_chinese {
        "zh"
    } else if has_korean {
        "ko"
    } else if has_arabic {
        "ar"
    } else if has_cyrillic {
        "ru"
    } else {
        "en"
    };
    Some(lang)
}
