use std::collections::HashMap;
use std::fs::File;
use std::path::PathBuf;

use anyhow::Context as _;
use serde::Serialize;

pub const DELIMITER: u8 = b';';

/// Append-only `;`-separated tables, one `<name>.csv` per table in `dir`.
pub struct CsvTableSink {
    dir: PathBuf,
    tables: HashMap<String, csv::Writer<File>>,
}

impl CsvTableSink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            tables: HashMap::new(),
        }
    }

    pub fn table_path(&self, table: &str) -> PathBuf {
        self.dir.join(format!("{table}.csv"))
    }

    /// Truncates (or creates) the table file and writes its header row.
    pub fn create(&mut self, table: &str, header: &[&str]) -> anyhow::Result<()> {
        self.tables.remove(table);

        let path = self.table_path(table);
        let file =
            File::create(&path).with_context(|| format!("create table: {}", path.display()))?;
        let mut writer = csv::WriterBuilder::new()
            .delimiter(DELIMITER)
            .has_headers(false)
            .from_writer(file);
        writer
            .write_record(header)
            .with_context(|| format!("write header: {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flush header: {}", path.display()))?;

        self.tables.insert(table.to_owned(), writer);
        Ok(())
    }

    /// Appends `rows` in order and flushes. Returns the number of rows written.
    pub fn append<R, I>(&mut self, table: &str, rows: I) -> anyhow::Result<usize>
    where
        R: Serialize,
        I: IntoIterator<Item = R>,
    {
        let writer = self
            .tables
            .get_mut(table)
            .ok_or_else(|| anyhow::anyhow!("table was never created: {table}"))?;

        let mut written = 0_usize;
        for row in rows {
            writer
                .serialize(row)
                .with_context(|| format!("write row to table {table}"))?;
            written += 1;
        }
        writer
            .flush()
            .with_context(|| format!("flush table {table}"))?;

        Ok(written)
    }
}
