use tabled::{settings::Style, Table, Tabled};

use crate::regdata::{self, RegDataSet};

#[derive(Tabled)]
pub struct TableRow {
    #[tabled(rename = "Metric")]
    pub metric: String,
    #[tabled(rename = "Value")]
    pub value: String,
}

#[derive(Tabled)]
pub struct RecordRow {
    #[tabled(rename = "Resource")]
    pub url: String,
    #[tabled(rename = "Fingerprint")]
    pub hash: String,
}

#[derive(Default)]
pub struct TableBuilder {
    rows: Vec<TableRow>,
}

impl TableBuilder {
    pub fn new() -> Self {
        Self { rows: Vec::new() }
    }

    pub fn add_row(&mut self, label: &str, value: &str) {
        self.rows.push(TableRow {
            metric: label.to_string(),
            value: value.to_string(),
        });
    }

    pub fn build(&self) -> String {
        if self.rows.is_empty() {
            return String::new();
        }

        Table::new(&self.rows).with(Style::rounded()).to_string()
    }
}

pub fn stats_table(stats: &[(&str, &str)]) -> String {
    let mut builder = TableBuilder::new();
    for (label, value) in stats {
        builder.add_row(label, value);
    }
    builder.build()
}

/// Dependency set as a two-column table, sorted by resource.
pub fn record_table(records: &RegDataSet) -> String {
    let rows: Vec<RecordRow> = regdata::sorted(records)
        .into_iter()
        .map(|r| RecordRow {
            url: r.url().to_string(),
            hash: r.hash().to_string(),
        })
        .collect();
    if rows.is_empty() {
        return String::new();
    }
    Table::new(rows).with(Style::rounded()).to_string()
}
