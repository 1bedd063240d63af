use std::path::PathBuf;

use clap::Parser;

use crate::formats::Relation;

/// Crawl a paginated works listing into `;`-separated tables.
#[derive(Debug, Parser)]
#[command(author, version, about)]
pub struct Cli {
    /// First listing page (must be http/https).
    pub url: String,

    /// Output directory for the tables (default: current directory).
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Maximum number of listing pages to fetch.
    #[arg(
        short = 'p',
        long,
        default_value_t = 5001,
        value_parser = clap::value_parser!(u32).range(1..)
    )]
    pub pages: u32,

    /// Delay between page requests (politeness).
    #[arg(long, default_value_t = 5000)]
    pub delay_ms: u64,

    /// Relation tables to write, comma separated.
    #[arg(
        long,
        value_enum,
        value_delimiter = ',',
        default_values_t = Relation::ALL.to_vec()
    )]
    pub relations: Vec<Relation>,

    /// Origin that next-page links are resolved against (default: origin of the start URL).
    #[arg(long)]
    pub base_url: Option<String>,

    /// Retries for requests that fail without a response.
    #[arg(long, default_value_t = 3)]
    pub retries: u32,

    /// Per-request timeout.
    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Thousands separator used in word counts and stats.
    #[arg(long, default_value_t = ',')]
    pub thousands_separator: char,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_cover_every_relation() {
        let cli = Cli::parse_from(["ao3-tables", "https://archiveofourown.org/works"]);

        assert_eq!(cli.pages, 5001);
        assert_eq!(cli.delay_ms, 5000);
        assert_eq!(cli.relations, Relation::ALL.to_vec());
        assert_eq!(cli.output, None);
    }

    #[test]
    fn short_flags_and_legacy_relation_names() {
        let cli = Cli::parse_from([
            "ao3-tables",
            "https://archiveofourown.org/works",
            "-o",
            "out",
            "-p",
            "2",
            "--relations",
            "authors,tags,warnings",
        ]);

        assert_eq!(cli.output, Some(PathBuf::from("out")));
        assert_eq!(cli.pages, 2);
        assert_eq!(
            cli.relations,
            vec![
                Relation::Authors,
                Relation::FreeformTags,
                Relation::WarningTags
            ]
        );
    }

    #[test]
    fn zero_pages_is_rejected() {
        let err = Cli::try_parse_from(["ao3-tables", "https://example.com/", "--pages", "0"])
            .unwrap_err();
        assert_eq!(err.kind(), clap::error::ErrorKind::ValueValidation);
    }
}
