use std::collections::BTreeSet;

use chrono::{DateTime, Local};

/// Total characters allowed across all tags, one separator counted per tag.
pub const TAG_BUDGET_CHARS: usize = 450;

const CORE_TAGS: [&str; 4] = ["뉴스", "뉴스요약", "오늘의뉴스", "뉴스브리핑"];
const CORE_HASHTAGS: [&str; 3] = ["#뉴스", "#뉴스요약", "#오늘의뉴스"];
const TREND_TAGS: [&str; 2] = ["실시간뉴스", "주요뉴스"];

const CATEGORY_PAIRS: [(&str, &str); 4] = [
    ("스포츠", "Sports"),
    ("연예", "Entertainment"),
    ("경제", "Economy"),
    ("정치", "Politics"),
];

/// English label for a category; known English labels and unknown labels map to themselves.
pub fn english_label(category: &str) -> &str {
    CATEGORY_PAIRS
        .iter()
        .find(|(local, _)| *local == category)
        .map_or(category, |(_, english)| english)
}

/// Localized label for a category; unknown labels map to themselves.
pub fn localized_label(category: &str) -> &str {
    CATEGORY_PAIRS
        .iter()
        .find(|(_, english)| *english == category)
        .map_or(category, |(local, _)| local)
}

/// Deduplicated, sorted candidate tags for the given categories and run date.
pub fn candidate_tags(categories: &[String], date: DateTime<Local>) -> BTreeSet<String> {
    let mut tags: BTreeSet<String> = CORE_TAGS.iter().map(|t| t.to_string()).collect();

    tags.insert(date.format("%Y년%m월%d일").to_string());
    tags.insert(date.format("%m월%d일").to_string());
    tags.insert("오늘의뉴스".to_string());

    for category in categories {
        let local = localized_label(category);
        tags.insert(format!("{local}뉴스"));
        tags.insert(format!("{local}뉴스요약"));
        tags.insert(format!("{} News", english_label(category)));
    }

    tags.extend(CORE_HASHTAGS.iter().map(|t| t.to_string()));
    for category in categories {
        tags.insert(format!("#{}뉴스", localized_label(category)));
    }
    tags.extend(TREND_TAGS.iter().map(|t| t.to_string()));
    tags
}

/// Take tags in order while the running cost stays within `budget`; stop at the first that
/// would exceed it.
pub fn cap_tags(tags: impl IntoIterator<Item = String>, budget: usize) -> Vec<String> {
    let mut used = 0;
    let mut out = Vec::new();
    for tag in tags {
        let cost = tag.chars().count() + 1;
        if used + cost > budget {
            break;
        }
        used += cost;
        out.push(tag);
    }
    out
}

/// Candidate tags capped to [`TAG_BUDGET_CHARS`].
pub fn build_tags(categories: &[String], date: DateTime<Local>) -> Vec<String> {
    cap_tags(candidate_tags(categories, date), TAG_BUDGET_CHARS)
}

#[cfg(test)]
#[path = "../../tests/unit/metadata/tags.rs"]
mod tests;
