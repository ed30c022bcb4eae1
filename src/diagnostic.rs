/// Diagnostic reporting for rejected verse payloads, rendered with ariadne
use crate::error::LoadError;
use ariadne::{Color, Label, Report, ReportKind, Source};
use std::ops::Range;

/// Character offset of a 1-based line/column position
fn position_to_offset(source: &str, line: usize, column: usize) -> usize {
    let preceding: usize = source
        .split_inclusive('\n')
        .take(line.saturating_sub(1))
        .map(|l| l.chars().count())
        .sum();
    preceding + column.saturating_sub(1)
}

/// Span covering the offending character, clamped to the source
fn error_range(source: &str, line: usize, column: usize) -> Range<usize> {
    let len = source.chars().count();
    let start = position_to_offset(source, line, column).min(len.saturating_sub(1));
    start..(start + 1).min(len)
}

/// Report why a verse payload was rejected
///
/// Payload problems are labelled in the source text. Errors that have no
/// position (a missing file, an IO failure) are returned as a single line.
pub fn report_load_error(source_name: &str, source: &str, error: &LoadError) -> String {
    let report = match error {
        LoadError::InvalidPayload {
            message,
            line,
            column,
        } => {
            let range = error_range(source, *line, *column);
            Report::build(ReportKind::Error, source_name, range.start)
                .with_message("Invalid verse payload")
                .with_label(
                    Label::new((source_name, range))
                        .with_message(message)
                        .with_color(Color::Red),
                )
                .with_help(
                    "The payload must be a JSON array of objects with string fields \
                     \"text\", \"reference\" and \"reflection\"",
                )
                .finish()
        }
        LoadError::EmptyPayload => {
            let len = source.chars().count();
            Report::build(ReportKind::Error, source_name, 0)
                .with_message("Verse payload is empty")
                .with_label(
                    Label::new((source_name, 0..len))
                        .with_message("this array has no verses")
                        .with_color(Color::Red),
                )
                .with_help("Add at least one verse to the array")
                .finish()
        }
        other => return format!("Error: {}\n", other),
    };

    let mut output = Vec::new();
    if report
        .write((source_name, Source::from(source)), &mut output)
        .is_err()
    {
        return format!("Error: {}\n", error);
    }
    String::from_utf8(output).unwrap_or_else(|_| format!("Error: {}\n", error))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::verse::VerseCollection;

    #[test]
    fn test_position_to_offset() {
        let source = "ab\ncd\nef";
        assert_eq!(position_to_offset(source, 1, 1), 0);
        assert_eq!(position_to_offset(source, 2, 2), 4);
        assert_eq!(position_to_offset(source, 3, 1), 6);
    }

    #[test]
    fn test_invalid_payload_diagnostic() {
        let source = "[\n  {\"text\": }\n]";
        let error = VerseCollection::from_json(source).unwrap_err();
        let diagnostic = report_load_error("verses.json", source, &error);
        assert!(diagnostic.contains("Invalid verse payload"));
    }

    #[test]
    fn test_empty_payload_diagnostic() {
        let diagnostic = report_load_error("verses.json", "[]", &LoadError::EmptyPayload);
        assert!(diagnostic.contains("Verse payload is empty"));
    }

    #[test]
    fn test_positionless_error_is_plain() {
        let diagnostic = report_load_error(
            "verses.json",
            "",
            &LoadError::NotFound("verses.json".to_string()),
        );
        assert_eq!(diagnostic, "Error: verse source not found: verses.json\n");
    }

    #[test]
    fn test_error_at_end_of_input_is_clamped() {
        let source = "[";
        let error = VerseCollection::from_json(source).unwrap_err();
        let diagnostic = report_load_error("verses.json", source, &error);
        assert!(!diagnostic.is_empty());
    }
}
