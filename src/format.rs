//! Output formatting for collected records (table, JSON, CSV).

use crate::record::ProductRecord;
use serde::{Deserialize, Serialize};

/// Output format for the export command and run summaries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Table,
    Json,
    Csv,
}

impl std::str::FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "table" => Ok(OutputFormat::Table),
            "json" => Ok(OutputFormat::Json),
            "csv" => Ok(OutputFormat::Csv),
            _ => Err(format!("Unknown format: {}. Use: table, json, csv", s)),
        }
    }
}

impl std::fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputFormat::Table => write!(f, "table"),
            OutputFormat::Json => write!(f, "json"),
            OutputFormat::Csv => write!(f, "csv"),
        }
    }
}

/// Formats records for output.
pub struct Formatter {
    format: OutputFormat,
}

impl Formatter {
    pub fn new(format: OutputFormat) -> Self {
        Self { format }
    }

    /// Formats the full record list.
    pub fn format_records(&self, records: &[ProductRecord]) -> String {
        if records.is_empty() {
            return match self.format {
                OutputFormat::Json => "[]".to_string(),
                OutputFormat::Csv => self.csv_header(),
                OutputFormat::Table => "No records collected.".to_string(),
            };
        }

        match self.format {
            OutputFormat::Json => self.json_records(records),
            OutputFormat::Table => self.table_records(records),
            OutputFormat::Csv => self.csv_records(records),
        }
    }

    fn json_records(&self, records: &[ProductRecord]) -> String {
        serde_json::to_string_pretty(records).unwrap_or_else(|_| "[]".to_string())
    }

    fn table_records(&self, records: &[ProductRecord]) -> String {
        let store_width = 12;
        let kind_width = 12;
        let name_width = 40;
        let price_width = 10;
        let date_width = 12;

        let mut lines = Vec::new();
        lines.push(format!(
            "{:<store_width$} {:<kind_width$} {:<name_width$} {:>price_width$} {:>date_width$}  URL",
            "Store", "Type", "Name", "Price", "Date"
        ));
        lines.push(format!(
            "{:-<store_width$} {:-<kind_width$} {:-<name_width$} {:->price_width$} {:->date_width$}  {:-<20}",
            "", "", "", "", "", ""
        ));

        for record in records {
            let name = truncate(&record.name, name_width);
            lines.push(format!(
                "{:<store_width$} {:<kind_width$} {:<name_width$} {:>price_width$} {:>date_width$}  {}",
                truncate(&record.store, store_width),
                truncate(&record.kind, kind_width),
                name,
                record.price,
                record.date,
                record.url
            ));
        }

        lines.push(String::new());
        lines.push(format!("{} record(s)", records.len()));
        lines.join("\n")
    }

    fn csv_header(&self) -> String {
        "store,type,name,price,url,date".to_string()
    }

    fn csv_records(&self, records: &[ProductRecord]) -> String {
        let mut lines = vec![self.csv_header()];
        for record in records {
            lines.push(format!(
                "{},{},{},{},{},{}",
                csv_escape(&record.store),
                csv_escape(&record.kind),
                csv_escape(&record.name),
                csv_escape(&record.price),
                csv_escape(&record.url),
                record.date
            ));
        }
        lines.join("\n")
    }
}

fn truncate(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max.saturating_sub(3)).collect();
        format!("{}...", cut)
    }
}

fn csv_escape(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_record(name: &str, price: &str) -> ProductRecord {
        ProductRecord {
            store: "acme".to_string(),
            kind: "sneakers".to_string(),
            name: name.to_string(),
            price: price.to_string(),
            url: "/p/1".to_string(),
            date: 1700000000,
        }
    }

    #[test]
    fn test_output_format_parsing() {
        assert_eq!("table".parse::<OutputFormat>().unwrap(), OutputFormat::Table);
        assert_eq!("JSON".parse::<OutputFormat>().unwrap(), OutputFormat::Json);
        assert_eq!("csv".parse::<OutputFormat>().unwrap(), OutputFormat::Csv);

        let err = "invalid".parse::<OutputFormat>().unwrap_err();
        assert!(err.contains("Unknown format"));
    }

    #[test]
    fn test_output_format_display_roundtrip() {
        for format in [OutputFormat::Table, OutputFormat::Json, OutputFormat::Csv] {
            assert_eq!(format.to_string().parse::<OutputFormat>().unwrap(), format);
        }
    }

    #[test]
    fn test_empty_records() {
        assert_eq!(Formatter::new(OutputFormat::Json).format_records(&[]), "[]");
        assert_eq!(
            Formatter::new(OutputFormat::Csv).format_records(&[]),
            "store,type,name,price,url,date"
        );
        assert!(Formatter::new(OutputFormat::Table)
            .format_records(&[])
            .contains("No records"));
    }

    #[test]
    fn test_json_output() {
        let records = vec![make_record("Runner", "999")];
        let output = Formatter::new(OutputFormat::Json).format_records(&records);
        assert!(output.starts_with('['));
        assert!(output.contains("\"type\": \"sneakers\""));

        let parsed: Vec<ProductRecord> = serde_json::from_str(&output).unwrap();
        assert_eq!(parsed, records);
    }

    #[test]
    fn test_table_output() {
        let records = vec![make_record("Runner", "999"), make_record("Loafer", "499")];
        let output = Formatter::new(OutputFormat::Table).format_records(&records);
        assert!(output.contains("Runner"));
        assert!(output.contains("Loafer"));
        assert!(output.contains("2 record(s)"));
    }

    #[test]
    fn test_csv_escapes_fields() {
        let records = vec![make_record("Say \"hi\"", "999")];
        let output = Formatter::new(OutputFormat::Csv).format_records(&records);
        assert!(output.contains("\"Say \"\"hi\"\"\""));
    }

    #[test]
    fn test_truncate_long_names() {
        assert_eq!(truncate("short", 10), "short");
        let long = "a".repeat(50);
        let cut = truncate(&long, 10);
        assert_eq!(cut.chars().count(), 10);
        assert!(cut.ends_with("..."));
    }
}
