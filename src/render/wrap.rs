//! Greedy, measurement-driven word wrap.

/// Anything that can report the rendered pixel width of a single-line string.
pub trait TextMeasure {
    fn text_width(&mut self, text: &str) -> f32;
}

/// Wrap `text` so that no produced line measures wider than `max_width`.
///
/// Embedded newlines are hard breaks: each segment is wrapped on its own and the results are
/// joined with `\n`. Words are packed greedily. A word wider than `max_width` on its own is cut
/// into the longest fitting prefixes, each emitted as a separate line; a character that cannot
/// fit even alone still gets a line so the loop always makes progress.
pub fn wrap_text(text: &str, measure: &mut dyn TextMeasure, max_width: f32) -> String {
    text.split('\n')
        .map(|segment| wrap_segment(segment, measure, max_width).join("\n"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Number of lines `wrap_text` output occupies.
pub fn line_count(wrapped: &str) -> usize {
    wrapped.split('\n').count()
}

fn wrap_segment(segment: &str, measure: &mut dyn TextMeasure, max_width: f32) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in segment.split_whitespace() {
        let candidate = if current.is_empty() {
            word.to_string()
        } else {
            format!("{current} {word}")
        };
        if measure.text_width(&candidate) <= max_width {
            current = candidate;
            continue;
        }

        if !current.is_empty() {
            lines.push(std::mem::take(&mut current));
            if measure.text_width(word) <= max_width {
                current = word.to_string();
                continue;
            }
        }
        split_word(word, measure, max_width, &mut lines);
    }

    if !current.is_empty() {
        lines.push(current);
    }
    if lines.is_empty() {
        lines.push(String::new());
    }
    lines
}

fn split_word(word: &str, measure: &mut dyn TextMeasure, max_width: f32, out: &mut Vec<String>) {
    let mut rest = word;
    while !rest.is_empty() {
        let boundaries: Vec<usize> = rest
            .char_indices()
            .map(|(i, c)| i + c.len_utf8())
            .collect();
        let cut = boundaries
            .iter()
            .rev()
            .copied()
            .find(|&end| measure.text_width(&rest[..end]) <= max_width)
            .unwrap_or(boundaries[0]);
        out.push(rest[..cut].to_string());
        rest = &rest[cut..];
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/wrap.rs"]
mod tests;
