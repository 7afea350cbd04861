use once_cell::sync::OnceCell;
use regex::Regex;

fn cdata_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"(?s)<!\[CDATA\[(.*?)\]\]>").expect("cdata regex"))
}

fn tag_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"<[^>]+>").expect("tag regex"))
}

fn disallowed_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| {
        Regex::new(r"[^\w\s\x{2600}-\x{26FF}\x{2700}-\x{27BF}\x{1F300}-\x{1F9FF}]")
            .expect("disallowed-char regex")
    })
}

fn ws_re() -> &'static Regex {
    static RE: OnceCell<Regex> = OnceCell::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("whitespace regex"))
}

/// Reduce feed text to words, whitespace and a small pictographic range.
///
/// CDATA wrappers are unwrapped, markup tags removed, every other character outside the
/// whitelist becomes a space, and whitespace runs collapse to one space. The result is trimmed.
pub fn sanitize_text(text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    let s = cdata_re().replace_all(text, "$1");
    let s = tag_re().replace_all(&s, "");
    let s = disallowed_re().replace_all(&s, " ");
    let s = ws_re().replace_all(&s, " ");
    s.trim().to_string()
}

#[cfg(test)]
#[path = "../../tests/unit/collect/sanitize.rs"]
mod tests;
