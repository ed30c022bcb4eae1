//! Verse records and the session's read-only verse collection

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::ops::Index;

/// A single verse as delivered by the verse source
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerseRecord {
    pub text: String,
    pub reference: String,
    pub reflection: String,
}

impl VerseRecord {
    pub fn new(
        text: impl Into<String>,
        reference: impl Into<String>,
        reflection: impl Into<String>,
    ) -> Self {
        VerseRecord {
            text: text.into(),
            reference: reference.into(),
            reflection: reflection.into(),
        }
    }
}

/// Ordered, non-empty list of verses for one session
///
/// Insertion order is source order. The only way to build one is through
/// [`VerseCollection::new`] or [`VerseCollection::from_json`], both of which
/// reject empty input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerseCollection {
    verses: Vec<VerseRecord>,
}

impl VerseCollection {
    /// Wrap a list of verses, returning `None` if it is empty
    pub fn new(verses: Vec<VerseRecord>) -> Option<Self> {
        if verses.is_empty() {
            None
        } else {
            Some(VerseCollection { verses })
        }
    }

    /// Parse a JSON payload
    ///
    /// The payload must be a non-empty array of objects carrying string
    /// `text`, `reference` and `reflection` fields.
    ///
    /// # Example
    /// ```
    /// use daily_verse::VerseCollection;
    ///
    /// let json = r#"[{"text": "t", "reference": "A 1:1", "reflection": "r"}]"#;
    /// let verses = VerseCollection::from_json(json).unwrap();
    /// assert_eq!(verses.len(), 1);
    /// ```
    pub fn from_json(payload: &str) -> Result<Self, LoadError> {
        let verses: Vec<VerseRecord> =
            serde_json::from_str(payload).map_err(|e| LoadError::from_json(&e))?;
        VerseCollection::new(verses).ok_or(LoadError::EmptyPayload)
    }

    pub fn len(&self) -> usize {
        self.verses.len()
    }

    /// Whether the collection holds no verses
    pub fn is_empty(&self) -> bool {
        self.verses.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&VerseRecord> {
        self.verses.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, VerseRecord> {
        self.verses.iter()
    }

    /// Position of the first verse carrying `reference`
    pub fn position_of(&self, reference: &str) -> Option<usize> {
        self.verses.iter().position(|v| v.reference == reference)
    }

    /// All references in source order
    pub fn references(&self) -> Vec<String> {
        self.verses.iter().map(|v| v.reference.clone()).collect()
    }
}

impl Index<usize> for VerseCollection {
    type Output = VerseRecord;

    fn index(&self, index: usize) -> &VerseRecord {
        &self.verses[index]
    }
}

impl<'a> IntoIterator for &'a VerseCollection {
    type Item = &'a VerseRecord;
    type IntoIter = std::slice::Iter<'a, VerseRecord>;

    fn into_iter(self) -> Self::IntoIter {
        self.verses.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_json_valid() {
        let json = r#"[
            {"text": "In the beginning", "reference": "Gen 1:1", "reflection": "Start"},
            {"text": "Love is patient", "reference": "1 Cor 13:4", "reflection": "Wait"}
        ]"#;
        let verses = VerseCollection::from_json(json).unwrap();
        assert_eq!(verses.len(), 2);
        assert!(!verses.is_empty());
        assert_eq!(verses[1].reference, "1 Cor 13:4");
        assert_eq!(verses.position_of("Gen 1:1"), Some(0));
        assert_eq!(verses.position_of("missing"), None);
    }

    #[test]
    fn test_from_json_empty_array() {
        assert_eq!(
            VerseCollection::from_json("[]"),
            Err(LoadError::EmptyPayload)
        );
    }

    #[test]
    fn test_from_json_not_an_array() {
        let result = VerseCollection::from_json(r#"{"text": "x"}"#);
        assert!(matches!(result, Err(LoadError::InvalidPayload { .. })));
    }

    #[test]
    fn test_from_json_reports_position() {
        let result = VerseCollection::from_json("[\n  {\"text\": }\n]");
        match result {
            Err(LoadError::InvalidPayload { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected invalid payload, got {:?}", other),
        }
    }

    #[test]
    fn test_new_rejects_empty() {
        assert!(VerseCollection::new(Vec::new()).is_none());
    }
}
