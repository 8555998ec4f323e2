//! Verse records and canon helpers.
//!
//! The bundled verse files are JSON arrays of objects with PascalCase keys:
//!
//! ```json
//! { "Book": "John", "Chapter": 3, "Verse": 16, "Text": "For God so loved...",
//!   "Translation": "WEB", "Reference": "John 3:16",
//!   "FullText": "John 3:16: For God so loved...", "Testament": "New", "BookNumber": 43 }
//! ```
//!
//! Only the first five keys are required; the rest are derived when missing.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Books of the 66-book canon in order. `BookNumber` is the 1-based position.
pub const BOOK_ORDER: [&str; 66] = [
    "Genesis",
    "Exodus",
    "Leviticus",
    "Numbers",
    "Deuteronomy",
    "Joshua",
    "Judges",
    "Ruth",
    "1 Samuel",
    "2 Samuel",
    "1 Kings",
    "2 Kings",
    "1 Chronicles",
    "2 Chronicles",
    "Ezra",
    "Nehemiah",
    "Esther",
    "Job",
    "Psalms",
    "Proverbs",
    "Ecclesiastes",
    "Song of Solomon",
    "Isaiah",
    "Jeremiah",
    "Lamentations",
    "Ezekiel",
    "Daniel",
    "Hosea",
    "Joel",
    "Amos",
    "Obadiah",
    "Jonah",
    "Micah",
    "Nahum",
    "Habakkuk",
    "Zephaniah",
    "Haggai",
    "Zechariah",
    "Malachi",
    "Matthew",
    "Mark",
    "Luke",
    "John",
    "Acts",
    "Romans",
    "1 Corinthians",
    "2 Corinthians",
    "Galatians",
    "Ephesians",
    "Philippians",
    "Colossians",
    "1 Thessalonians",
    "2 Thessalonians",
    "1 Timothy",
    "2 Timothy",
    "Titus",
    "Philemon",
    "Hebrews",
    "James",
    "1 Peter",
    "2 Peter",
    "1 John",
    "2 John",
    "3 John",
    "Jude",
    "Revelation",
];

/// Number of Old Testament books at the head of [`BOOK_ORDER`].
const OLD_TESTAMENT_LEN: usize = 39;

/// Which half of the canon a book belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Testament {
    /// Genesis through Malachi.
    Old,
    /// Matthew through Revelation.
    New,
}

/// Canonical 1-based book number, or `None` for books outside the canon.
pub fn book_number(book: &str) -> Option<u32> {
    BOOK_ORDER.iter().position(|b| b.eq_ignore_ascii_case(book)).map(|i| i as u32 + 1)
}

/// Testament of a canonical book, or `None` for books outside the canon.
pub fn testament_of(book: &str) -> Option<Testament> {
    let number = book_number(book)? as usize;
    Some(if number <= OLD_TESTAMENT_LEN { Testament::Old } else { Testament::New })
}

/// A single verse as loaded from the bundled data.
///
/// Identity is `(book, chapter, verse, translation)`; see [`VerseKey`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct Verse {
    /// Book name, e.g. `"1 Corinthians"`.
    pub book: String,
    /// 1-based chapter number.
    pub chapter: u32,
    /// 1-based verse number.
    pub verse: u32,
    /// Verse text.
    pub text: String,
    /// Translation code, e.g. `"WEB"` or `"Darby"`.
    pub translation: String,
    /// Display reference such as `"John 3:16"`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    /// Reference followed by the text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_text: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub testament: Option<Testament>,
    /// Canonical book number; 0 when the source did not know it.
    #[serde(default)]
    pub book_number: u32,
}

impl Verse {
    /// Create a verse, deriving reference, full text, testament and book number.
    pub fn new(
        book: impl Into<String>,
        chapter: u32,
        verse: u32,
        text: impl Into<String>,
        translation: impl Into<String>,
    ) -> Self {
        let book = book.into();
        let text = text.into();
        let reference = format!("{book} {chapter}:{verse}");
        Self {
            full_text: Some(format!("{reference}: {text}")),
            reference: Some(reference),
            testament: testament_of(&book),
            book_number: book_number(&book).unwrap_or(0),
            book,
            chapter,
            verse,
            text,
            translation: translation.into(),
        }
    }

    /// The identity of this verse.
    pub fn key(&self) -> VerseKey {
        VerseKey {
            book: self.book.clone(),
            chapter: self.chapter,
            verse: self.verse,
            translation: self.translation.clone(),
        }
    }

    /// Display reference, derived when the source did not provide one.
    pub fn reference(&self) -> String {
        self.reference
            .clone()
            .unwrap_or_else(|| format!("{} {}:{}", self.book, self.chapter, self.verse))
    }

    /// Fill in derived fields the source left empty.
    pub(crate) fn normalize(mut self) -> Self {
        if self.reference.is_none() {
            self.reference = Some(self.reference());
        }
        if self.full_text.is_none() {
            self.full_text = Some(format!("{}: {}", self.reference(), self.text));
        }
        if self.testament.is_none() {
            self.testament = testament_of(&self.book);
        }
        if self.book_number == 0 {
            self.book_number = book_number(&self.book).unwrap_or(0);
        }
        self
    }
}

/// Identity of a verse: `(book, chapter, verse, translation)`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VerseKey {
    pub book: String,
    pub chapter: u32,
    pub verse: u32,
    pub translation: String,
}

impl fmt::Display for VerseKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {}:{} ({})", self.book, self.chapter, self.verse, self.translation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canon_lookup() {
        assert_eq!(book_number("Genesis"), Some(1));
        assert_eq!(book_number("malachi"), Some(39));
        assert_eq!(book_number("Revelation"), Some(66));
        assert_eq!(book_number("Tobit"), None);
        assert_eq!(testament_of("Malachi"), Some(Testament::Old));
        assert_eq!(testament_of("Matthew"), Some(Testament::New));
    }

    #[test]
    fn new_derives_reference_fields() {
        let verse = Verse::new("John", 3, 16, "For God so loved the world", "WEB");
        assert_eq!(verse.reference.as_deref(), Some("John 3:16"));
        assert_eq!(verse.full_text.as_deref(), Some("John 3:16: For God so loved the world"));
        assert_eq!(verse.testament, Some(Testament::New));
        assert_eq!(verse.book_number, 43);
    }

    #[test]
    fn deserializes_bundled_format() {
        let json = r#"{"Book":"Genesis","Chapter":1,"Verse":1,
            "Text":"In the beginning, God created the heavens and the earth.",
            "Translation":"WEB","Reference":"Genesis 1:1",
            "FullText":"Genesis 1:1: In the beginning, God created the heavens and the earth.",
            "Testament":"Old","BookNumber":0}"#;
        let verse: Verse = serde_json::from_str(json).unwrap();
        assert_eq!(verse.book, "Genesis");
        assert_eq!(verse.chapter, 1);
        assert_eq!(verse.testament, Some(Testament::Old));

        let verse = verse.normalize();
        assert_eq!(verse.book_number, 1);
    }

    #[test]
    fn minimal_record_round_trips_identity_fields() {
        let json = r#"{"Book":"Ruth","Chapter":1,"Verse":16,"Text":"Where you go, I will go","Translation":"WEB"}"#;
        let verse: Verse = serde_json::from_str(json).unwrap();
        let back: Verse = serde_json::from_str(&serde_json::to_string(&verse).unwrap()).unwrap();
        assert_eq!(verse.key(), back.key());
        assert_eq!(back.text, "Where you go, I will go");
        assert_eq!(verse.reference(), "Ruth 1:16");
    }
}
