//! Cut raw import text into records.
//!
//! A record starts where a line (leading blanks aside) begins with a tag
//! keyword followed by `;`. Everything up to the next such line belongs to
//! the record, so a record may continue over several lines. Tag words
//! inside fields never start a record.

use std::sync::OnceLock;

use regex::Regex;

use crate::error::{ImportError, RecordError};
use crate::model::{RawRecord, RecordTag};

fn tag_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(?im)^[ \t]*(BALSA|TANQUE|CALIBRA(?:CAO|ÇÃO)|MEDI(?:CAO|ÇÃO))[ \t]*;")
            .expect("tag pattern is valid")
    })
}

/// Records found in the text, plus errors for stray text before the first tag.
#[derive(Debug, Default)]
pub struct Split {
    pub records: Vec<RawRecord>,
    pub errors: Vec<RecordError>,
}

pub fn split_records(text: &str) -> Result<Split, ImportError> {
    if text.trim().is_empty() {
        return Err(ImportError::EmptyInput);
    }

    // (tag start, body start, tag)
    let mut starts: Vec<(usize, usize, RecordTag)> = Vec::new();
    for caps in tag_pattern().captures_iter(text) {
        let (Some(keyword), Some(whole)) = (caps.get(1), caps.get(0)) else {
            continue;
        };
        if let Some(tag) = RecordTag::from_keyword(keyword.as_str()) {
            starts.push((keyword.start(), whole.end(), tag));
        }
    }

    if starts.is_empty() {
        return Err(ImportError::NoRecords);
    }

    let mut split = Split::default();

    let leading = text[..starts[0].0].trim();
    if !leading.is_empty() {
        split.errors.push(RecordError::Validation {
            line: 1,
            tag: None,
            message: format!("unrecognized content before first record: '{}'", truncate(leading, 40)),
        });
    }

    for (i, &(tag_start, body_start, tag)) in starts.iter().enumerate() {
        let body_end = starts.get(i + 1).map(|s| s.0).unwrap_or(text.len());
        let body = text[body_start..body_end]
            .lines()
            .map(str::trim)
            .filter(|l| !l.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        split.records.push(RawRecord {
            line: line_of(text, tag_start),
            tag,
            body,
        });
    }

    log::debug!("split {} record(s) from {} byte(s)", split.records.len(), text.len());
    Ok(split)
}

fn line_of(text: &str, offset: usize) -> usize {
    text[..offset].matches('\n').count() + 1
}

fn truncate(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let cut: String = s.chars().take(max_chars).collect();
        format!("{cut}…")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn one_record_per_line() {
        let text = "BALSA;B1;Balsa 1\nTANQUE;B1;T1;Tanque 1;300;500\nCALIBRACAO;T1;0;10;100\n";
        let split = split_records(text).unwrap();
        assert!(split.errors.is_empty());
        let tags: Vec<RecordTag> = split.records.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![RecordTag::Balsa, RecordTag::Tanque, RecordTag::Calibracao]);
        assert_eq!(split.records[1].body, "B1;T1;Tanque 1;300;500");
        assert_eq!(split.records[2].line, 3);
    }

    #[test]
    fn records_may_continue_over_lines() {
        let text = "BALSA;B1;Balsa 1;Exec;;;;obs part one\n  part two\nTANQUE;B1;T1";
        let split = split_records(text).unwrap();
        assert_eq!(split.records.len(), 2);
        assert_eq!(split.records[0].body, "B1;Balsa 1;Exec;;;;obs part one part two");
        assert_eq!(split.records[1].line, 3);
    }

    #[test]
    fn padded_fields_named_like_tags() {
        let text = "BALSA; B1; Balsa; Hidrovias\n  TANQUE; B1; T1; Tanque; 100; 500\n";
        let split = split_records(text).unwrap();
        assert!(split.errors.is_empty());
        assert_eq!(split.records.len(), 2);
        assert_eq!(split.records[0].body, "B1; Balsa; Hidrovias");
        assert_eq!(split.records[1].tag, RecordTag::Tanque);
        assert_eq!(split.records[1].line, 2);
        assert_eq!(split.records[1].body, "B1; T1; Tanque; 100; 500");
    }

    #[test]
    fn notes_mentioning_a_tag_stay_in_the_record() {
        let text = "BALSA;B1;X;;;;;observação tanque;limpo\nTANQUE;B1;T1";
        let split = split_records(text).unwrap();
        assert_eq!(split.records.len(), 2);
        assert_eq!(split.records[0].body, "B1;X;;;;;observação tanque;limpo");
    }

    #[test]
    fn tags_are_case_and_accent_tolerant() {
        let text = "balsa;B1;X\nCalibração;T1;0;1;1\nMEDIÇÃO ;B1;T1";
        let split = split_records(text).unwrap();
        let tags: Vec<RecordTag> = split.records.iter().map(|r| r.tag).collect();
        assert_eq!(tags, vec![RecordTag::Balsa, RecordTag::Calibracao, RecordTag::Medicao]);
    }

    #[test]
    fn tag_inside_a_field_does_not_split() {
        let text = "BALSA;B1;SUPERTANQUE;x";
        let split = split_records(text).unwrap();
        assert_eq!(split.records.len(), 1);
    }

    #[test]
    fn leading_garbage_is_reported() {
        let split = split_records("header junk\nBALSA;B1;X").unwrap();
        assert_eq!(split.records.len(), 1);
        assert_eq!(split.errors.len(), 1);
        assert!(split.errors[0].to_string().contains("header junk"));
    }

    #[test]
    fn empty_and_tagless_inputs_fail() {
        assert_eq!(split_records("   \n ").unwrap_err(), ImportError::EmptyInput);
        assert_eq!(split_records("just;some;text").unwrap_err(), ImportError::NoRecords);
    }
}
