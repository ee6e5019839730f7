//! The editable document the model acts on.
//!
//! Positions are flat character indices (Unicode scalar values). A line is
//! the text up to and including a `\n`, or the unterminated text at the end.

use crate::format::{BlockStyle, FormatValue, InlineStyle, Place};
use std::collections::BTreeMap;

/// Formats applied to a character.
pub type InlineFormats = BTreeMap<InlineStyle, FormatValue>;

/// Formats applied to a line.
pub type BlockFormats = BTreeMap<BlockStyle, FormatValue>;

/// A selected range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Selection {
    pub start: usize,
    pub length: usize,
}

/// Operations the editor exposes to tool handlers.
///
/// Everything is synchronous and acts on a single document. Search and
/// position helpers are derived from [`text`](Self::text).
pub trait EditorSurface: Send {
    /// The plain text content.
    fn text(&self) -> String;

    fn insert_text(&mut self, text: &str, index: usize);

    fn delete_text(&mut self, index: usize, length: usize);

    /// Replace `length` characters at `index` with `replacement`.
    fn rewrite_text(&mut self, replacement: &str, index: usize, length: usize);

    fn format_inline(&mut self, style: InlineStyle, index: usize, length: usize, value: &FormatValue);

    /// Format every line overlapping the range.
    fn format_block(&mut self, style: BlockStyle, index: usize, length: usize, value: &FormatValue);

    /// The current user selection, if any.
    fn selection(&self) -> Option<Selection>;

    /// Length in characters.
    fn len(&self) -> usize {
        self.text().chars().count()
    }

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Index of the `occurrence`-th match of `text` (1-based).
    ///
    /// Each search resumes one character after the previous match, so
    /// overlapping matches count. Returns `None` for an empty needle, an
    /// occurrence of zero, or fewer matches than requested.
    fn locate_text(&self, text: &str, occurrence: usize) -> Option<usize> {
        if text.is_empty() || occurrence == 0 {
            return None;
        }
        let haystack: Vec<char> = self.text().chars().collect();
        let needle: Vec<char> = text.chars().collect();

        let mut from = 0;
        let mut found = None;
        for _ in 0..occurrence {
            let index = find_from(&haystack, &needle, from)?;
            found = Some(index);
            from = index + 1;
        }
        found
    }

    fn locate_place(&self, place: Place) -> usize {
        let len = self.len();
        match place {
            Place::Beginning => 0,
            Place::Middle => len / 2,
            Place::End => len,
        }
    }
}

fn find_from(haystack: &[char], needle: &[char], from: usize) -> Option<usize> {
    haystack
        .get(from..)?
        .windows(needle.len())
        .position(|window| window == needle)
        .map(|offset| from + offset)
}

#[derive(Debug, Clone, PartialEq)]
struct Glyph {
    ch: char,
    inline: InlineFormats,
    /// Line formats, only meaningful on `\n`.
    block: BlockFormats,
}

impl Glyph {
    fn plain(ch: char) -> Self {
        Self {
            ch,
            inline: InlineFormats::new(),
            block: BlockFormats::new(),
        }
    }
}

/// A run of equally formatted characters.
#[derive(Debug, Clone, PartialEq)]
pub struct Run {
    pub start: usize,
    pub text: String,
    pub formats: InlineFormats,
}

/// In-memory rich-text document.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Document {
    glyphs: Vec<Glyph>,
    /// Line formats of the unterminated last line.
    tail: BlockFormats,
    selection: Option<Selection>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    /// Select a range, clamped to the document.
    pub fn select(&mut self, start: usize, length: usize) {
        let (start, end) = self.clamp(start, length);
        self.selection = Some(Selection {
            start,
            length: end - start,
        });
    }

    pub fn clear_selection(&mut self) {
        self.selection = None;
    }

    /// Inline formats of the character at `index`.
    pub fn inline_formats(&self, index: usize) -> Option<&InlineFormats> {
        self.glyphs.get(index).map(|g| &g.inline)
    }

    /// Formats of the line containing `index`.
    pub fn line_formats(&self, index: usize) -> &BlockFormats {
        match self.next_newline(index) {
            Some(p) => &self.glyphs[p].block,
            None => &self.tail,
        }
    }

    /// Maximal runs of characters sharing the same inline formats.
    pub fn runs(&self) -> Vec<Run> {
        let mut runs: Vec<Run> = Vec::new();
        for (index, glyph) in self.glyphs.iter().enumerate() {
            match runs.last_mut() {
                Some(run) if run.formats == glyph.inline => run.text.push(glyph.ch),
                _ => runs.push(Run {
                    start: index,
                    text: glyph.ch.to_string(),
                    formats: glyph.inline.clone(),
                }),
            }
        }
        runs
    }

    /// Text and formats of every line.
    pub fn lines(&self) -> Vec<(String, &BlockFormats)> {
        let mut lines = Vec::new();
        let mut current = String::new();
        for glyph in &self.glyphs {
            if glyph.ch == '\n' {
                lines.push((std::mem::take(&mut current), &glyph.block));
            } else {
                current.push(glyph.ch);
            }
        }
        if !current.is_empty() || !self.tail.is_empty() {
            lines.push((current, &self.tail));
        }
        lines
    }

    fn clamp(&self, index: usize, length: usize) -> (usize, usize) {
        let start = index.min(self.glyphs.len());
        let end = start.saturating_add(length).min(self.glyphs.len());
        (start, end)
    }

    fn next_newline(&self, from: usize) -> Option<usize> {
        self.glyphs
            .get(from..)?
            .iter()
            .position(|g| g.ch == '\n')
            .map(|offset| from + offset)
    }

    /// Keep the selection on the same characters after `start..end` was removed.
    fn shift_selection(&mut self, start: usize, end: usize) {
        if let Some(selection) = &mut self.selection {
            let sel_start = selection.start;
            let sel_end = sel_start + selection.length;
            let before = end.min(sel_start).saturating_sub(start.min(sel_start));
            let inside = end.min(sel_end).saturating_sub(start.max(sel_start));
            selection.start = sel_start - before;
            selection.length -= inside;
        }
    }
}

impl From<&str> for Document {
    fn from(text: &str) -> Self {
        Self {
            glyphs: text.chars().map(Glyph::plain).collect(),
            ..Self::default()
        }
    }
}

fn apply<K: Ord + Copy>(formats: &mut BTreeMap<K, FormatValue>, key: K, value: &FormatValue) {
    if value.is_removal() {
        formats.remove(&key);
    } else {
        formats.insert(key, value.clone());
    }
}

impl EditorSurface for Document {
    fn text(&self) -> String {
        self.glyphs.iter().map(|g| g.ch).collect()
    }

    fn len(&self) -> usize {
        self.glyphs.len()
    }

    fn insert_text(&mut self, text: &str, index: usize) {
        let index = index.min(self.glyphs.len());
        let inserted: Vec<Glyph> = text.chars().map(Glyph::plain).collect();
        let length = inserted.len();
        self.glyphs.splice(index..index, inserted);
        self.selection = Some(Selection {
            start: index,
            length,
        });
    }

    fn delete_text(&mut self, index: usize, length: usize) {
        let (start, end) = self.clamp(index, length);
        self.glyphs.drain(start..end);
        self.shift_selection(start, end);
    }

    fn rewrite_text(&mut self, replacement: &str, index: usize, length: usize) {
        let (start, end) = self.clamp(index, length);
        self.glyphs.drain(start..end);
        self.insert_text(replacement, start);
    }

    fn format_inline(&mut self, style: InlineStyle, index: usize, length: usize, value: &FormatValue) {
        let (start, end) = self.clamp(index, length);
        for glyph in &mut self.glyphs[start..end] {
            apply(&mut glyph.inline, style, value);
        }
        self.select(start, end - start);
    }

    fn format_block(&mut self, style: BlockStyle, index: usize, length: usize, value: &FormatValue) {
        let (start, end) = self.clamp(index, length);
        let mut from = start;
        loop {
            match self.next_newline(from) {
                Some(p) => {
                    apply(&mut self.glyphs[p].block, style, value);
                    if p + 1 >= end {
                        break;
                    }
                    from = p + 1;
                }
                None => {
                    apply(&mut self.tail, style, value);
                    break;
                }
            }
        }
        self.select(start, end - start);
    }

    fn selection(&self) -> Option<Selection> {
        self.selection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bold() -> FormatValue {
        FormatValue::Bool(true)
    }

    #[test]
    fn locate_text_counts_occurrences() {
        let doc = Document::from("ab ab ab");
        assert_eq!(doc.locate_text("ab", 1), Some(0));
        assert_eq!(doc.locate_text("ab", 2), Some(3));
        assert_eq!(doc.locate_text("ab", 3), Some(6));
        assert_eq!(doc.locate_text("ab", 4), None);
    }

    #[test]
    fn locate_text_edge_cases() {
        let doc = Document::from("aaa");
        assert_eq!(doc.locate_text("aa", 2), Some(1));
        assert_eq!(doc.locate_text("a", 0), None);
        assert_eq!(doc.locate_text("", 1), None);
        assert_eq!(Document::new().locate_text("a", 1), None);
    }

    #[test]
    fn locate_text_uses_character_indices() {
        let doc = Document::from("héllo wörld");
        assert_eq!(doc.locate_text("wörld", 1), Some(6));
    }

    #[test]
    fn locate_place_positions() {
        let doc = Document::from("0123456789");
        assert_eq!(doc.locate_place(Place::Beginning), 0);
        assert_eq!(doc.locate_place(Place::Middle), 5);
        assert_eq!(doc.locate_place(Place::End), 10);

        let odd = Document::from("abcde");
        assert_eq!(odd.locate_place(Place::Middle), 2);
    }

    #[test]
    fn insert_selects_inserted_text() {
        let mut doc = Document::from("Hello world");
        doc.insert_text("big ", 6);
        assert_eq!(doc.text(), "Hello big world");
        assert_eq!(doc.selection(), Some(Selection { start: 6, length: 4 }));
    }

    #[test]
    fn insert_past_end_appends() {
        let mut doc = Document::from("abc");
        doc.insert_text("!", 99);
        assert_eq!(doc.text(), "abc!");
    }

    #[test]
    fn delete_clamps_range_and_selection() {
        let mut doc = Document::from("abcdef");
        doc.select(4, 2);
        doc.delete_text(2, 100);
        assert_eq!(doc.text(), "ab");
        assert_eq!(doc.selection(), Some(Selection { start: 2, length: 0 }));
    }

    #[test]
    fn delete_before_selection_moves_it() {
        let mut doc = Document::from("Hello big world");
        doc.select(10, 5);
        doc.delete_text(0, 6);

        let selection = doc.selection().unwrap();
        assert_eq!(selection, Selection { start: 4, length: 5 });
        let selected: String = doc.text().chars().skip(selection.start).take(selection.length).collect();
        assert_eq!(selected, "world");
    }

    #[test]
    fn delete_inside_selection_shrinks_it() {
        let mut doc = Document::from("one two three");
        doc.select(4, 9);
        doc.delete_text(2, 4);
        assert_eq!(doc.text(), "ono three");
        assert_eq!(doc.selection(), Some(Selection { start: 2, length: 7 }));

        doc.delete_text(8, 1);
        assert_eq!(doc.selection(), Some(Selection { start: 2, length: 6 }));
    }

    #[test]
    fn delete_after_selection_keeps_it() {
        let mut doc = Document::from("keep this, drop that");
        doc.select(0, 9);
        doc.delete_text(10, 10);
        assert_eq!(doc.selection(), Some(Selection { start: 0, length: 9 }));
    }

    #[test]
    fn insert_keeps_leading_newline() {
        let mut doc = Document::from("Title");
        doc.insert_text("\nBody", 5);
        assert_eq!(doc.text(), "Title\nBody");
        assert_eq!(doc.selection(), Some(Selection { start: 5, length: 5 }));
        assert_eq!(doc.lines().len(), 2);
    }

    #[test]
    fn rewrite_replaces_range() {
        let mut doc = Document::from("The cat sat.");
        doc.rewrite_text("dog", 4, 3);
        assert_eq!(doc.text(), "The dog sat.");
        assert_eq!(doc.selection(), Some(Selection { start: 4, length: 3 }));
    }

    #[test]
    fn inline_format_applies_and_removes() {
        let mut doc = Document::from("make me bold");
        doc.format_inline(InlineStyle::Bold, 8, 4, &bold());
        doc.format_inline(InlineStyle::Color, 8, 2, &FormatValue::parse("red"));

        assert!(doc.inline_formats(7).unwrap().is_empty());
        assert_eq!(doc.inline_formats(8).unwrap().len(), 2);
        assert_eq!(
            doc.inline_formats(11).unwrap().get(&InlineStyle::Bold),
            Some(&FormatValue::Bool(true))
        );

        doc.format_inline(InlineStyle::Bold, 0, 12, &FormatValue::Bool(false));
        assert!(doc.inline_formats(11).unwrap().is_empty());
        assert_eq!(doc.selection(), Some(Selection { start: 0, length: 12 }));
    }

    #[test]
    fn formats_move_with_edits() {
        let mut doc = Document::from("word");
        doc.format_inline(InlineStyle::Italic, 0, 4, &bold());
        doc.insert_text("a ", 0);
        assert!(doc.inline_formats(0).unwrap().is_empty());
        assert!(doc.inline_formats(2).unwrap().contains_key(&InlineStyle::Italic));
    }

    #[test]
    fn runs_group_equal_formats() {
        let mut doc = Document::from("plain bold");
        doc.format_inline(InlineStyle::Bold, 6, 4, &bold());
        let runs = doc.runs();
        assert_eq!(runs.len(), 2);
        assert_eq!(runs[1].start, 6);
        assert_eq!(runs[1].text, "bold");
    }

    #[test]
    fn block_format_covers_overlapping_lines() {
        let mut doc = Document::from("title\nbody one\nbody two");
        let h1 = FormatValue::parse("h1");
        doc.format_block(BlockStyle::Header, 0, 5, &h1);
        assert_eq!(doc.line_formats(2).get(&BlockStyle::Header), Some(&h1));
        assert!(doc.line_formats(8).is_empty());

        let quote = bold();
        doc.format_block(BlockStyle::Blockquote, 8, 10, &quote);
        assert!(doc.line_formats(8).contains_key(&BlockStyle::Blockquote));
        assert!(doc.line_formats(20).contains_key(&BlockStyle::Blockquote));
        assert!(!doc.line_formats(0).contains_key(&BlockStyle::Blockquote));

        let lines = doc.lines();
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[2].0, "body two");
    }

    #[test]
    fn block_format_range_ending_at_newline_stays_on_its_line() {
        let mut doc = Document::from("one\ntwo");
        doc.format_block(BlockStyle::Align, 0, 4, &FormatValue::parse("center"));
        assert!(doc.line_formats(0).contains_key(&BlockStyle::Align));
        assert!(doc.line_formats(5).is_empty());
    }
}
