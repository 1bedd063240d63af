use serde::Serialize;

/// Name of the table keyed by work id.
pub const MAIN_TABLE: &str = "main";

pub const MAIN_HEADER: [&str; 16] = [
    "id",
    "title",
    "date",
    "rating",
    "category",
    "warnings",
    "iswip",
    "description",
    "language",
    "words",
    "chap_cur",
    "chap_total",
    "comments",
    "kudos",
    "bookmarks",
    "hits",
];

/// A multi-valued attribute of a work, stored in its own `id;<name>` table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, clap::ValueEnum)]
pub enum Relation {
    #[value(name = "authors")]
    Authors,
    #[value(name = "fandoms")]
    Fandoms,
    #[value(name = "warning_tags", alias = "warnings")]
    WarningTags,
    #[value(name = "pairings")]
    Pairings,
    #[value(name = "characters")]
    Characters,
    #[value(name = "freeform_tags", aliases = ["freeform", "tags"])]
    FreeformTags,
}

impl Relation {
    pub const ALL: [Relation; 6] = [
        Relation::Authors,
        Relation::Fandoms,
        Relation::WarningTags,
        Relation::Pairings,
        Relation::Characters,
        Relation::FreeformTags,
    ];

    pub fn table_name(self) -> &'static str {
        match self {
            Relation::Authors => "authors",
            Relation::Fandoms => "fandoms",
            Relation::WarningTags => "warning_tags",
            Relation::Pairings => "pairings",
            Relation::Characters => "characters",
            Relation::FreeformTags => "freeform_tags",
        }
    }

    pub fn header(self) -> [&'static str; 2] {
        ["id", self.table_name()]
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Relations {
    pub authors: Vec<String>,
    pub fandoms: Vec<String>,
    pub warning_tags: Vec<String>,
    pub pairings: Vec<String>,
    pub characters: Vec<String>,
    pub freeform_tags: Vec<String>,
}

impl Relations {
    pub fn get(&self, relation: Relation) -> &[String] {
        match relation {
            Relation::Authors => &self.authors,
            Relation::Fandoms => &self.fandoms,
            Relation::WarningTags => &self.warning_tags,
            Relation::Pairings => &self.pairings,
            Relation::Characters => &self.characters,
            Relation::FreeformTags => &self.freeform_tags,
        }
    }
}

/// The square of badges in the corner of a work blurb. Which of them are
/// rendered varies, so every one is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Badges {
    pub rating: Option<String>,
    pub category: Option<String>,
    pub warnings: Option<String>,
    pub iswip: Option<String>,
}

impl Badges {
    /// Stores `value` under the badge named by `key`. Returns `false` for
    /// keys outside the known vocabulary.
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "rating" => &mut self.rating,
            "category" => &mut self.category,
            "warnings" => &mut self.warnings,
            "iswip" => &mut self.iswip,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Raw `dl.stats` values, still in display form.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Stats {
    pub language: Option<String>,
    pub words: Option<String>,
    pub chapters: Option<String>,
    pub comments: Option<String>,
    pub kudos: Option<String>,
    pub bookmarks: Option<String>,
    pub hits: Option<String>,
}

impl Stats {
    pub fn set(&mut self, key: &str, value: String) -> bool {
        let slot = match key {
            "language" => &mut self.language,
            "words" => &mut self.words,
            "chapters" => &mut self.chapters,
            "comments" => &mut self.comments,
            "kudos" => &mut self.kudos,
            "bookmarks" => &mut self.bookmarks,
            "hits" => &mut self.hits,
            _ => return false,
        };
        *slot = Some(value);
        true
    }
}

/// Everything pulled out of one work node, before any type coercion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawRecord {
    pub id: u64,
    pub title: String,
    pub date: String,
    pub description: Option<String>,
    pub badges: Badges,
    pub stats: Stats,
    pub relations: Relations,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    pub id: u64,
    pub title: String,
    pub date: String,
    pub rating: Option<String>,
    pub category: Option<String>,
    pub warnings: Option<String>,
    pub is_work_in_progress: Option<String>,
    pub description: Option<String>,
    pub language: Option<String>,
    pub word_count: u64,
    pub chapter_current: Option<u32>,
    pub chapter_total: Option<u32>,
    pub comments: u64,
    pub kudos: u64,
    pub bookmarks: u64,
    pub hits: u64,
    pub relations: Relations,
}

impl Record {
    pub fn main_row(&self) -> MainRow<'_> {
        MainRow {
            id: self.id,
            title: &self.title,
            date: &self.date,
            rating: self.rating.as_deref(),
            category: self.category.as_deref(),
            warnings: self.warnings.as_deref(),
            iswip: self.is_work_in_progress.as_deref(),
            description: self.description.as_deref(),
            language: self.language.as_deref(),
            words: self.word_count,
            chap_cur: self.chapter_current,
            chap_total: self.chapter_total,
            comments: self.comments,
            kudos: self.kudos,
            bookmarks: self.bookmarks,
            hits: self.hits,
        }
    }

    pub fn relation_rows(&self, relation: Relation) -> impl Iterator<Item = RelationRow<'_>> {
        self.relations
            .get(relation)
            .iter()
            .map(|value| RelationRow { id: self.id, value })
    }
}

/// One line of `main.csv`. Field order matches [`MAIN_HEADER`].
#[derive(Debug, Serialize)]
pub struct MainRow<'a> {
    pub id: u64,
    pub title: &'a str,
    pub date: &'a str,
    pub rating: Option<&'a str>,
    pub category: Option<&'a str>,
    pub warnings: Option<&'a str>,
    pub iswip: Option<&'a str>,
    pub description: Option<&'a str>,
    pub language: Option<&'a str>,
    pub words: u64,
    pub chap_cur: Option<u32>,
    pub chap_total: Option<u32>,
    pub comments: u64,
    pub kudos: u64,
    pub bookmarks: u64,
    pub hits: u64,
}

#[derive(Debug, Serialize)]
pub struct RelationRow<'a> {
    pub id: u64,
    pub value: &'a str,
}
