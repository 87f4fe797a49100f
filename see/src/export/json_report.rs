use serde::Serialize;
use std::io::Write;

use crate::domain::ExportError;
use crate::report::Table;

/// JSON container written by [`JsonReportExporter`]
#[derive(Debug, Serialize)]
struct ReportFile<'a> {
    reports: &'a [Table],
}

/// Writes every rendered report of a run as one JSON document
pub struct JsonReportExporter {
    reports: Vec<Table>,
}

impl JsonReportExporter {
    pub fn new(reports: Vec<Table>) -> Self {
        Self { reports }
    }

    /// Number of reports that will be written
    pub fn len(&self) -> usize {
        self.reports.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reports.is_empty()
    }

    /// Serialize to `writer` as pretty-printed JSON
    pub fn export<W: Write>(&self, mut writer: W) -> Result<(), ExportError> {
        serde_json::to_writer_pretty(&mut writer, &ReportFile { reports: &self.reports })?;
        writeln!(writer)?;
        writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(rows: &[[&str; 3]]) -> Table {
        Table {
            header: vec!["Function".into(), "Total CPU Cycles".into(), "Total Calls".into()],
            rows: rows.iter().map(|r| r.iter().map(ToString::to_string).collect()).collect(),
        }
    }

    #[test]
    fn test_export_structure() {
        let exporter = JsonReportExporter::new(vec![
            table(&[["malloc", "900", "3"]]),
            table(&[]),
        ]);
        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        let reports = parsed["reports"].as_array().unwrap();
        assert_eq!(reports.len(), 2);
        assert_eq!(reports[0]["header"][0], "Function");
        assert_eq!(reports[0]["rows"][0][0], "malloc");
        assert_eq!(reports[0]["rows"][0][2], "3");
        assert!(reports[1]["rows"].as_array().unwrap().is_empty());
    }

    #[test]
    fn test_export_without_reports() {
        let exporter = JsonReportExporter::new(Vec::new());
        assert!(exporter.is_empty());
        let mut buffer = Vec::new();
        exporter.export(&mut buffer).unwrap();

        let parsed: serde_json::Value = serde_json::from_slice(&buffer).unwrap();
        assert_eq!(parsed["reports"], serde_json::json!([]));
    }
}
