use std::borrow::Cow;

/// Text as it lands in a control after typing or pasting.
///
/// Single-line controls drop line breaks; multi-line controls store `\n` only.
///
/// ```
/// use input_core::typed_text;
///
/// assert_eq!(typed_text("a\r\nb", false), "ab");
/// assert_eq!(typed_text("a\r\nb\rc", true), "a\nb\nc");
/// ```
pub fn typed_text(s: &str, multiline: bool) -> Cow<'_, str> {
    if !s.contains(['\r', '\n']) {
        return Cow::Borrowed(s);
    }
    if !multiline {
        return Cow::Owned(s.replace(['\r', '\n'], ""));
    }
    Cow::Owned(s.replace("\r\n", "\n").replace('\r', "\n"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn untouched_text_is_borrowed() {
        assert!(matches!(typed_text("Jane", false), Cow::Borrowed("Jane")));
        assert!(matches!(typed_text("a\nb", true), Cow::Borrowed(_)));
    }

    #[test]
    fn line_breaks_follow_the_control() {
        assert_eq!(typed_text("\n\r", false), "");
        assert_eq!(typed_text("a\r\n\r\nb", true), "a\n\nb");
    }
}
