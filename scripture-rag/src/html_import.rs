//! Import verses from eBible-style chapter HTML files.
//!
//! The bundled JSON data is generated from one HTML file per chapter, named
//! `<BOOK CODE><CHAPTER>.htm` (`GEN01.htm`, `1SA17.htm`, `JHN03.htm`), where
//! each verse starts with a marker such as
//! `<span class="verse" id="V16">16&#160;</span>`.
//!
//! # Example
//!
//! ```rust,ignore
//! use scripture_rag::html_import::HtmlImporter;
//!
//! let importer = HtmlImporter::new("WEB")?;
//! let verses = importer.import_directory("bible/web").await?;
//! std::fs::write("web.json", serde_json::to_string_pretty(&verses)?)?;
//! ```

use std::path::Path;

use regex::Regex;
use tracing::{info, warn};

use crate::error::{RagError, Result};
use crate::verse::Verse;

/// USFM book codes and the book names used in the bundled data.
const BOOK_CODES: [(&str, &str); 66] = [
    ("GEN", "Genesis"),
    ("EXO", "Exodus"),
    ("LEV", "Leviticus"),
    ("NUM", "Numbers"),
    ("DEU", "Deuteronomy"),
    ("JOS", "Joshua"),
    ("JDG", "Judges"),
    ("RUT", "Ruth"),
    ("1SA", "1 Samuel"),
    ("2SA", "2 Samuel"),
    ("1KI", "1 Kings"),
    ("2KI", "2 Kings"),
    ("1CH", "1 Chronicles"),
    ("2CH", "2 Chronicles"),
    ("EZR", "Ezra"),
    ("NEH", "Nehemiah"),
    ("EST", "Esther"),
    ("JOB", "Job"),
    ("PSA", "Psalms"),
    ("PRO", "Proverbs"),
    ("ECC", "Ecclesiastes"),
    ("SNG", "Song of Solomon"),
    ("ISA", "Isaiah"),
    ("JER", "Jeremiah"),
    ("LAM", "Lamentations"),
    ("EZK", "Ezekiel"),
    ("DAN", "Daniel"),
    ("HOS", "Hosea"),
    ("JOL", "Joel"),
    ("AMO", "Amos"),
    ("OBA", "Obadiah"),
    ("JON", "Jonah"),
    ("MIC", "Micah"),
    ("NAM", "Nahum"),
    ("HAB", "Habakkuk"),
    ("ZEP", "Zephaniah"),
    ("HAG", "Haggai"),
    ("ZEC", "Zechariah"),
    ("MAL", "Malachi"),
    ("MAT", "Matthew"),
    ("MRK", "Mark"),
    ("LUK", "Luke"),
    ("JHN", "John"),
    ("ACT", "Acts"),
    ("ROM", "Romans"),
    ("1CO", "1 Corinthians"),
    ("2CO", "2 Corinthians"),
    ("GAL", "Galatians"),
    ("EPH", "Ephesians"),
    ("PHP", "Philippians"),
    ("COL", "Colossians"),
    ("1TH", "1 Thessalonians"),
    ("2TH", "2 Thessalonians"),
    ("1TI", "1 Timothy"),
    ("2TI", "2 Timothy"),
    ("TIT", "Titus"),
    ("PHM", "Philemon"),
    ("HEB", "Hebrews"),
    ("JAS", "James"),
    ("1PE", "1 Peter"),
    ("2PE", "2 Peter"),
    ("1JN", "1 John"),
    ("2JN", "2 John"),
    ("3JN", "3 John"),
    ("JUD", "Jude"),
    ("REV", "Revelation"),
];

/// Book name for a USFM book code, e.g. `"JHN"` → `"John"`.
pub fn book_name_for_code(code: &str) -> Option<&'static str> {
    BOOK_CODES.iter().find(|(c, _)| c.eq_ignore_ascii_case(code)).map(|(_, name)| *name)
}

const ENTITIES: [(&str, &str); 7] = [
    ("&#160;", " "),
    ("&nbsp;", " "),
    ("&lt;", "<"),
    ("&gt;", ">"),
    ("&quot;", "\""),
    ("&apos;", "'"),
    // last, so "&amp;lt;" decodes to "&lt;" rather than "<"
    ("&amp;", "&"),
];

/// Converts chapter HTML files into [`Verse`] records for one translation.
#[derive(Debug, Clone)]
pub struct HtmlImporter {
    translation: String,
    strip_brackets: bool,
    file_name: Regex,
    verse_marker: Regex,
    popup: Regex,
    tag: Regex,
    footnote_mark: Regex,
    whitespace: Regex,
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| RagError::Import(format!("invalid pattern {pattern:?}: {e}")))
}

impl HtmlImporter {
    /// Create an importer that tags every verse with `translation`.
    ///
    /// Square brackets are stripped by default for Darby, which uses them to
    /// mark words supplied by the translator.
    pub fn new(translation: impl Into<String>) -> Result<Self> {
        let translation = translation.into();
        Ok(Self {
            strip_brackets: translation.eq_ignore_ascii_case("darby"),
            translation,
            file_name: compile(r"^([A-Z0-9]{3})(\d+)\.htm$")?,
            verse_marker: compile(r#"id="V(\d+)">\d+&#160;</span>"#)?,
            popup: compile(r#"(?s)<span class="popup">.*?</span>"#)?,
            tag: compile(r"<[^>]+>")?,
            footnote_mark: compile(r"[†‡§¶]")?,
            whitespace: compile(r"\s+")?,
        })
    }

    /// Translation code applied to imported verses.
    pub fn translation(&self) -> &str {
        &self.translation
    }

    /// Remove (or keep) the `[` `]` supplied-word markers in verse text.
    pub fn with_strip_brackets(mut self, strip: bool) -> Self {
        self.strip_brackets = strip;
        self
    }

    /// Split a chapter file name into book code and chapter number.
    ///
    /// `"JHN03.htm"` → `Some(("JHN", 3))`. Index pages and other files
    /// return `None`.
    pub fn parse_chapter_file_name<'a>(&self, file_name: &'a str) -> Option<(&'a str, u32)> {
        let caps = self.file_name.captures(file_name)?;
        let code = caps.get(1)?.as_str();
        let chapter = caps.get(2)?.as_str().parse().ok()?;
        Some((code, chapter))
    }

    /// Extract `(verse number, cleaned text)` pairs from chapter HTML.
    ///
    /// A verse's text runs from its marker to the next verse marker or the
    /// end of the enclosing `<div>`. Verses whose cleaned text is empty are
    /// dropped.
    pub fn extract_verses(&self, html: &str) -> Vec<(u32, String)> {
        let stripped = self.popup.replace_all(html, "");
        let html: &str = &stripped;
        let mut verses = Vec::new();

        for caps in self.verse_marker.captures_iter(html) {
            let (Some(marker), Some(number)) = (caps.get(0), caps.get(1)) else {
                continue;
            };
            let Ok(number) = number.as_str().parse::<u32>() else {
                continue;
            };

            let rest = &html[marker.end()..];
            let end = [rest.find(r#"<span class="verse""#), rest.find("</div>")]
                .into_iter()
                .flatten()
                .min();
            let Some(end) = end else {
                continue;
            };

            let text = self.clean_text(&rest[..end]);
            if !text.is_empty() {
                verses.push((number, text));
            }
        }

        verses
    }

    fn clean_text(&self, fragment: &str) -> String {
        let mut text = self.tag.replace_all(fragment, " ").into_owned();
        for (entity, replacement) in ENTITIES {
            text = text.replace(entity, replacement);
        }
        if self.strip_brackets {
            text.retain(|c| c != '[' && c != ']');
        }
        let text = self.footnote_mark.replace_all(&text, "");
        self.whitespace.replace_all(&text, " ").trim().to_string()
    }

    /// Import one chapter file. Unknown book codes yield an error.
    pub fn import_chapter(&self, file_name: &str, html: &str) -> Result<Vec<Verse>> {
        let (code, chapter) = self
            .parse_chapter_file_name(file_name)
            .ok_or_else(|| RagError::Import(format!("not a chapter file: {file_name}")))?;
        let book = book_name_for_code(code)
            .ok_or_else(|| RagError::Import(format!("unknown book code '{code}' in {file_name}")))?;

        Ok(self
            .extract_verses(html)
            .into_iter()
            .map(|(number, text)| Verse::new(book, chapter, number, text, &self.translation))
            .collect())
    }

    /// Import every chapter file in `dir`, in file-name order.
    ///
    /// Files that are not chapter files, carry unknown book codes, or contain
    /// no verses are skipped with a warning.
    pub async fn import_directory(&self, dir: impl AsRef<Path>) -> Result<Vec<Verse>> {
        let dir = dir.as_ref();
        let mut entries = tokio::fs::read_dir(dir)
            .await
            .map_err(|e| RagError::Import(format!("failed to read {}: {e}", dir.display())))?;

        let mut names = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| RagError::Import(format!("failed to list {}: {e}", dir.display())))?
        {
            if let Some(name) = entry.file_name().to_str() {
                if self.parse_chapter_file_name(name).is_some() {
                    names.push(name.to_string());
                }
            }
        }
        names.sort();

        let mut verses = Vec::new();
        for name in &names {
            let html = tokio::fs::read_to_string(dir.join(name))
                .await
                .map_err(|e| RagError::Import(format!("failed to read {name}: {e}")))?;
            match self.import_chapter(name, &html) {
                Ok(chapter) if chapter.is_empty() => {
                    warn!(file = %name, "no verses found in chapter file");
                }
                Ok(chapter) => verses.extend(chapter),
                Err(e) => warn!(file = %name, error = %e, "skipping chapter file"),
            }
        }

        info!(
            translation = %self.translation,
            chapter_files = names.len(),
            verse_count = verses.len(),
            "imported chapter html"
        );
        Ok(verses)
    }
}
