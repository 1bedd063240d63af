use crate::formats::{RawRecord, Record};

/// Number formatting used by the listing, e.g. `12,345`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NumberFormat {
    pub thousands_separator: char,
}

impl Default for NumberFormat {
    fn default() -> Self {
        Self {
            thousands_separator: ',',
        }
    }
}

impl NumberFormat {
    /// Parses a grouped integer such as `1,234`. Separators may appear
    /// anywhere between digits; anything else fails.
    pub fn parse_grouped(&self, input: &str) -> Option<u64> {
        let digits: String = input
            .trim()
            .chars()
            .filter(|ch| *ch != self.thousands_separator)
            .collect();
        if digits.is_empty() || !digits.chars().all(|ch| ch.is_ascii_digit()) {
            return None;
        }
        digits.parse().ok()
    }

    /// Word counts and stat counters: 0 when the listing omits the value
    /// or renders something that is not a number.
    pub fn count_or_zero(&self, raw: Option<&str>) -> u64 {
        raw.and_then(|raw| self.parse_grouped(raw)).unwrap_or(0)
    }
}

/// Splits `cur/total`; either side that is not a number (such as `?`)
/// becomes `None`.
pub fn split_chapters(raw: Option<&str>) -> (Option<u32>, Option<u32>) {
    let Some(raw) = raw else {
        return (None, None);
    };
    let mut parts = raw.split('/').map(|part| part.trim().parse::<u32>().ok());
    let current = parts.next().flatten();
    let total = parts.next().flatten();
    (current, total)
}

pub fn normalize(raw: RawRecord, format: &NumberFormat) -> Record {
    let (chapter_current, chapter_total) = split_chapters(raw.stats.chapters.as_deref());

    Record {
        id: raw.id,
        title: raw.title,
        date: raw.date,
        rating: raw.badges.rating,
        category: raw.badges.category,
        warnings: raw.badges.warnings,
        is_work_in_progress: raw.badges.iswip,
        description: raw.description,
        language: raw.stats.language,
        word_count: format.count_or_zero(raw.stats.words.as_deref()),
        chapter_current,
        chapter_total,
        comments: format.count_or_zero(raw.stats.comments.as_deref()),
        kudos: format.count_or_zero(raw.stats.kudos.as_deref()),
        bookmarks: format.count_or_zero(raw.stats.bookmarks.as_deref()),
        hits: format.count_or_zero(raw.stats.hits.as_deref()),
        relations: raw.relations,
    }
}
