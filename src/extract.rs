use scraper::{ElementRef, Selector};

use crate::formats::{Badges, RawRecord, Relations, Stats};

/// Prefix of the `id` attribute on a work node, e.g. `work_123456`.
pub const WORK_ID_PREFIX: &str = "work_";

#[derive(Debug, thiserror::Error)]
pub enum ExtractError {
    #[error("malformed record at position {position}{}: {reason}", format_id(.id))]
    MalformedRecord {
        position: usize,
        id: Option<u64>,
        reason: String,
    },
}

fn format_id(id: &Option<u64>) -> String {
    match id {
        Some(id) => format!(" (id {id})"),
        None => String::new(),
    }
}

/// Compiled selectors for the parts of a work blurb. Build once per crawl.
#[derive(Debug)]
pub struct WorkSelectors {
    title: Selector,
    authors: Selector,
    date: Selector,
    badges: Selector,
    fandoms: Selector,
    warning_tags: Selector,
    pairings: Selector,
    characters: Selector,
    freeform_tags: Selector,
    summary: Selector,
    stats: Selector,
}

impl WorkSelectors {
    pub fn new() -> Self {
        Self {
            title: parse_selector("h4.heading > a:first-child"),
            authors: parse_selector(r#"h4.heading > a[rel="author"]"#),
            date: parse_selector("p.datetime"),
            badges: parse_selector("ul.required-tags > li > a > span"),
            fandoms: parse_selector(".fandoms > a.tag"),
            warning_tags: parse_selector("li.warnings a.tag"),
            pairings: parse_selector("li.relationships > a"),
            characters: parse_selector("li.characters > a"),
            freeform_tags: parse_selector("li.freeforms > a"),
            summary: parse_selector(".summary > p"),
            stats: parse_selector("dl.stats > dd"),
        }
    }
}

impl Default for WorkSelectors {
    fn default() -> Self {
        Self::new()
    }
}

pub(crate) fn parse_selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|err| panic!("invalid built-in selector {css:?}: {err}"))
}

/// Pulls the raw fields out of one work node. `position` is the node's
/// index on its page and only feeds error reports.
pub fn extract_work(
    node: ElementRef<'_>,
    position: usize,
    selectors: &WorkSelectors,
) -> Result<RawRecord, ExtractError> {
    let id = parse_work_id(node).map_err(|reason| ExtractError::MalformedRecord {
        position,
        id: None,
        reason,
    })?;
    let malformed = |reason: &str| ExtractError::MalformedRecord {
        position,
        id: Some(id),
        reason: reason.to_owned(),
    };

    let title = node
        .select(&selectors.title)
        .next()
        .map(element_text)
        .ok_or_else(|| malformed("missing heading link"))?;
    let date = node
        .select(&selectors.date)
        .next()
        .map(element_text)
        .ok_or_else(|| malformed("missing date element"))?;

    let mut badges = Badges::default();
    for badge in node.select(&selectors.badges) {
        let Some(key) = class_token(badge, 1) else {
            continue;
        };
        if !badges.set(key, element_text(badge)) {
            tracing::debug!(id, key, "ignoring unknown badge");
        }
    }

    let mut stats = Stats::default();
    for stat in node.select(&selectors.stats) {
        let Some(key) = class_token(stat, 0) else {
            continue;
        };
        if !stats.set(key, element_text(stat)) {
            tracing::debug!(id, key, "ignoring unknown stat");
        }
    }

    let relations = Relations {
        authors: texts(node, &selectors.authors),
        fandoms: texts(node, &selectors.fandoms),
        warning_tags: texts(node, &selectors.warning_tags),
        pairings: texts(node, &selectors.pairings),
        characters: texts(node, &selectors.characters),
        freeform_tags: texts(node, &selectors.freeform_tags),
    };

    let description = node
        .select(&selectors.summary)
        .next()
        .map(element_text)
        .filter(|text| !text.is_empty());

    Ok(RawRecord {
        id,
        title,
        date,
        description,
        badges,
        stats,
        relations,
    })
}

fn parse_work_id(node: ElementRef<'_>) -> Result<u64, String> {
    let raw = node
        .value()
        .attr("id")
        .ok_or_else(|| "missing id attribute".to_owned())?;
    let digits = raw
        .strip_prefix(WORK_ID_PREFIX)
        .ok_or_else(|| format!("id attribute {raw:?} lacks prefix {WORK_ID_PREFIX:?}"))?;
    digits
        .parse()
        .map_err(|err| format!("id attribute {raw:?} is not numeric: {err}"))
}

fn class_token(element: ElementRef<'_>, index: usize) -> Option<&str> {
    element.value().attr("class")?.split_whitespace().nth(index)
}

fn texts(node: ElementRef<'_>, selector: &Selector) -> Vec<String> {
    node.select(selector).map(element_text).collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_owned()
}
