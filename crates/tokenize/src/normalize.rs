use std::borrow::Cow;

use unicode_normalization::UnicodeNormalization;

/// Runs the optional NFKC + lowercase pass shared by every tokenizer.
/// Borrows when both steps are disabled.
pub(crate) fn prepare(text: &str, normalize_unicode: bool, lowercase: bool) -> Cow<'_, str> {
    let normalized: Cow<str> = if normalize_unicode {
        Cow::Owned(text.nfkc().collect::<String>())
    } else {
        Cow::Borrowed(text)
    };

    if lowercase {
        Cow::Owned(normalized.to_lowercase())
    } else {
        normalized
    }
}
