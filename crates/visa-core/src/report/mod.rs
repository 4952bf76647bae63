//! Assessment report export.

pub mod layout;
pub mod pdf;

use chrono::NaiveDate;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::application::ApplicationData;
use crate::result::EligibilityResult;

#[derive(Error, Debug)]
pub enum ReportError {
    #[error("No assessment result to export")]
    NoResult,

    #[error("Failed to write report to {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Renders a report document for one result.
pub trait ReportRenderer {
    fn render(
        &self,
        data: &ApplicationData,
        result: &EligibilityResult,
        generated: NaiveDate,
    ) -> Result<Vec<u8>, ReportError>;
}

/// A4 PDF report.
#[derive(Debug, Default, Clone, Copy)]
pub struct PdfReport;

impl ReportRenderer for PdfReport {
    fn render(
        &self,
        data: &ApplicationData,
        result: &EligibilityResult,
        generated: NaiveDate,
    ) -> Result<Vec<u8>, ReportError> {
        let pages = layout::layout_report(data, result, generated);
        tracing::debug!(pages = pages.len(), "Report laid out");
        Ok(pdf::encode(&pages))
    }
}

/// `UK_Visa_Assessment_<familyName>_<YYYY-MM-DD>.pdf`
///
/// Path separators in the family name are replaced so the name stays a
/// single file name.
pub fn report_filename(data: &ApplicationData, generated: NaiveDate) -> String {
    let family: String = data
        .personal_info
        .family_name
        .chars()
        .map(|c| if matches!(c, '/' | '\\') { '_' } else { c })
        .collect();
    format!("UK_Visa_Assessment_{}_{}.pdf", family, generated.format("%Y-%m-%d"))
}

/// Render and write the report into `dir`. Returns the written path.
pub fn export_report(
    renderer: &dyn ReportRenderer,
    dir: &Path,
    data: &ApplicationData,
    result: Option<&EligibilityResult>,
    generated: NaiveDate,
) -> Result<PathBuf, ReportError> {
    let result = result.ok_or(ReportError::NoResult)?;
    let bytes = renderer.render(data, result, generated)?;

    let path = dir.join(report_filename(data, generated));
    std::fs::write(&path, bytes).map_err(|source| ReportError::Io {
        path: path.clone(),
        source,
    })?;

    tracing::info!(path = %path.display(), "Report exported");
    Ok(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::RiskLevel;

    fn result() -> EligibilityResult {
        EligibilityResult {
            score: 82.0,
            risk_level: RiskLevel::Low,
            summary: "Strong profile.".to_string(),
            strengths: vec!["Owns property".to_string()],
            weaknesses: vec![],
            recommendations: vec!["Bring payslips".to_string()],
            guidance_references: vec!["V 4.2".to_string()],
            scenario_delta_explanation: None,
        }
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 7, 4).unwrap()
    }

    #[test]
    fn test_filename() {
        let mut data = ApplicationData::default();
        data.personal_info.family_name = "O'Neil".to_string();
        assert_eq!(
            report_filename(&data, date()),
            "UK_Visa_Assessment_O'Neil_2025-07-04.pdf"
        );

        data.personal_info.family_name = "a/b".to_string();
        assert_eq!(report_filename(&data, date()), "UK_Visa_Assessment_a_b_2025-07-04.pdf");
    }

    #[test]
    fn test_export_writes_pdf() {
        let dir = std::env::temp_dir().join(format!("visa-report-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();

        let mut data = ApplicationData::default();
        data.personal_info.family_name = "Lovelace".to_string();
        let path = export_report(&PdfReport, &dir, &data, Some(&result()), date()).unwrap();

        assert!(path.ends_with("UK_Visa_Assessment_Lovelace_2025-07-04.pdf"));
        let bytes = std::fs::read(&path).unwrap();
        assert!(bytes.starts_with(b"%PDF-1.4"));

        std::fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_export_without_result() {
        let err = export_report(&PdfReport, Path::new("."), &ApplicationData::default(), None, date());
        assert!(matches!(err, Err(ReportError::NoResult)));
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let dir = Path::new("/nonexistent/visa-sim/reports");
        let err = export_report(&PdfReport, dir, &ApplicationData::default(), Some(&result()), date());
        assert!(matches!(err, Err(ReportError::Io { .. })));
    }
}
