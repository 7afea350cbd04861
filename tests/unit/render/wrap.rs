use super::*;

/// Every char advances by `per_char`; `wide` chars advance by `wide_advance`.
struct FixedAdvance {
    per_char: f32,
    wide: char,
    wide_advance: f32,
}

impl FixedAdvance {
    fn new(per_char: f32) -> Self {
        Self {
            per_char,
            wide: '\u{0}',
            wide_advance: per_char,
        }
    }
}

impl TextMeasure for FixedAdvance {
    fn text_width(&mut self, text: &str) -> f32 {
        text.chars()
            .map(|c| {
                if c == self.wide {
                    self.wide_advance
                } else {
                    self.per_char
                }
            })
            .sum()
    }
}

#[test]
fn greedy_packing() {
    let mut m = FixedAdvance::new(10.0);
    assert_eq!(
        wrap_text("aaa bbb ccc dddd", &mut m, 70.0),
        "aaa bbb\nccc\ndddd"
    );
}

#[test]
fn no_line_exceeds_width() {
    let mut m = FixedAdvance::new(10.0);
    let text = "손흥민 시즌 10호골 폭발 토트넘 역전승 이끌어 supercalifragilistic 끝";
    let wrapped = wrap_text(text, &mut m, 80.0);
    for line in wrapped.lines() {
        assert!(m.text_width(line) <= 80.0, "line too wide: {line:?}");
    }
}

#[test]
fn long_word_is_split_into_fitting_prefixes() {
    let mut m = FixedAdvance::new(10.0);
    assert_eq!(wrap_text("ab abcdefghij", &mut m, 40.0), "ab\nabcd\nefgh\nij");
}

#[test]
fn unfittable_char_gets_its_own_line() {
    let mut m = FixedAdvance {
        per_char: 10.0,
        wide: 'W',
        wide_advance: 100.0,
    };
    assert_eq!(wrap_text("aWb", &mut m, 30.0), "a\nW\nb");
}

#[test]
fn hard_breaks_are_preserved() {
    let mut m = FixedAdvance::new(10.0);
    assert_eq!(wrap_text("ab\ncd ef", &mut m, 100.0), "ab\ncd ef");
    assert_eq!(line_count("ab\ncd ef"), 2);
}

#[test]
fn wrapping_is_idempotent() {
    let mut m = FixedAdvance::new(10.0);
    for text in [
        "the quick brown fox jumps over the lazy dog",
        "가나다라마바사아자차카타파하 가나",
        "x\n\ny yy yyy yyyy",
    ] {
        let once = wrap_text(text, &mut m, 50.0);
        let twice = wrap_text(&once, &mut m, 50.0);
        assert_eq!(once, twice);
    }
}

#[test]
fn empty_text_is_single_empty_line() {
    let mut m = FixedAdvance::new(10.0);
    assert_eq!(wrap_text("", &mut m, 10.0), "");
}
