//! Tool host exposing an editor surface to the model.

use crate::action::{
    self, DeleteText, EditorAction, FormatText, InsertText, LocatePlace, LocateText, RewriteText,
    as_index,
};
use crate::document::EditorSurface;
use crate::format::{BlockStyle, FormatValue, InlineStyle, Place};
use runtime::{ToolCall, ToolError, ToolHost, ToolSpec};
use serde_json::json;
use tracing::debug;

/// Tool host that applies editor actions to an [`EditorSurface`].
///
/// Every handler returns the text the model sees. Invalid or missing
/// arguments produce a failure message rather than an error so the model
/// can retry with corrected values.
pub struct EditorTools<E> {
    surface: E,
    specs: Vec<ToolSpec>,
}

impl<E: EditorSurface> EditorTools<E> {
    pub fn new(surface: E) -> Self {
        Self {
            surface,
            specs: editor_specs(),
        }
    }

    pub fn surface(&self) -> &E {
        &self.surface
    }

    pub fn surface_mut(&mut self) -> &mut E {
        &mut self.surface
    }

    pub fn into_surface(self) -> E {
        self.surface
    }

    /// Apply a decoded action and describe the outcome.
    pub fn apply(&mut self, action: EditorAction) -> String {
        match action {
            EditorAction::InsertText(args) => self.insert_text(args),
            EditorAction::FormatText(args) => self.format_text(args),
            EditorAction::BlockFormatting(args) => self.format_block(args),
            EditorAction::RewriteText(args) => self.rewrite_text(args),
            EditorAction::DeleteText(args) => self.delete_text(args),
            EditorAction::LocateText(args) => self.locate_text(args),
            EditorAction::GetSelection => self.selection(),
            EditorAction::LocatePlace(args) => self.locate_place(args),
        }
    }

    /// Failure message when `[index, index + length)` is not inside the document.
    fn out_of_range(&self, operation: &str, index: usize, length: usize) -> Option<String> {
        let len = self.surface.len();
        (index > len || length > len - index).then(|| {
            format!(
                "{operation} failed. The range at index {index} with length {length} \
                 is outside the editor's content, which has length {len}."
            )
        })
    }

    fn insert_text(&mut self, args: InsertText) -> String {
        let (Some(text), Some(index)) = (args.inserting_text, as_index(args.start_index)) else {
            return "Insert text failed. Please provide a valid inserting_text and start_index."
                .to_string();
        };
        if let Some(failure) = self.out_of_range("Insert text", index, 0) {
            return failure;
        }
        self.surface.insert_text(&text, index);
        format!(
            "Inserted \"{text}\" at index {index} with length {}",
            text.chars().count()
        )
    }

    fn format_text(&mut self, args: FormatText) -> String {
        let Some((style, index, length, value)) = format_arguments(&args) else {
            return "Format text failed. Please provide a valid format_style, start_index, length and value."
                .to_string();
        };
        let style = match style.parse::<InlineStyle>() {
            Ok(style) => style,
            Err(e) => return format!("Format text failed: {e}."),
        };
        if let Some(failure) = self.out_of_range("Format text", index, length) {
            return failure;
        }
        self.surface.format_inline(style, index, length, &value);
        format!("Formatted in \"{style}\" at index {index} with length {length}")
    }

    fn format_block(&mut self, args: FormatText) -> String {
        let Some((style, index, length, value)) = format_arguments(&args) else {
            return "Block format text failed. Please provide a valid format_style, start_index, length and value."
                .to_string();
        };
        let style = match style.parse::<BlockStyle>() {
            Ok(style) => style,
            Err(e) => return format!("Block format text failed: {e}."),
        };
        if let Some(failure) = self.out_of_range("Block format text", index, length) {
            return failure;
        }
        self.surface.format_block(style, index, length, &value);
        format!("Block formatted in \"{style}\" at index {index} with length {length}")
    }

    fn rewrite_text(&mut self, args: RewriteText) -> String {
        let (Some(replacement), Some(index), Some(length)) = (
            args.replacement_text,
            as_index(args.start_index),
            as_index(args.length),
        ) else {
            return "Rewrite text failed. Please provide a valid replacement_text, start_index and length."
                .to_string();
        };
        if let Some(failure) = self.out_of_range("Rewrite text", index, length) {
            return failure;
        }
        self.surface.rewrite_text(&replacement, index, length);
        format!(
            "Rewrote text at index {index} with length {length}; the new text has length {}",
            replacement.chars().count()
        )
    }

    fn delete_text(&mut self, args: DeleteText) -> String {
        let (Some(index), Some(length)) = (as_index(args.start_index), as_index(args.length)) else {
            return "Delete text failed. Please provide a valid start_index and length.".to_string();
        };
        if let Some(failure) = self.out_of_range("Delete text", index, length) {
            return failure;
        }
        self.surface.delete_text(index, length);
        format!("Deleted text at index {index} with length {length}")
    }

    fn locate_text(&self, args: LocateText) -> String {
        let (Some(text), Some(occurrence)) = (args.text_to_be_found, as_index(args.occurrence_number))
        else {
            return "Getting text position and length failed. Please provide a valid text_to_be_found and occurrence_number."
                .to_string();
        };
        if text.is_empty() || occurrence == 0 {
            return "Getting text position and length failed. text_to_be_found must not be empty and occurrence_number starts at 1."
                .to_string();
        }
        match self.surface.locate_text(&text, occurrence) {
            Some(index) => format!(
                "The text {text} is found at index {index} and length is {}.",
                text.chars().count()
            ),
            None => format!("Text not found: occurrence {occurrence} of \"{text}\" does not exist."),
        }
    }

    fn selection(&self) -> String {
        match self.surface.selection() {
            Some(selection) => format!(
                "User selected {} characters starting at index {}.",
                selection.length, selection.start
            ),
            None => "User has not selected any text.".to_string(),
        }
    }

    fn locate_place(&self, args: LocatePlace) -> String {
        let Some(place) = args.specific_editor_place else {
            return "Getting a position in the editor failed. Please provide specific_editor_place."
                .to_string();
        };
        match place.parse::<Place>() {
            Ok(place) => format!(
                "The {place} of the editor's content is at index {}",
                self.surface.locate_place(place)
            ),
            Err(_) => format!(
                "Not a valid place in the editor: \"{place}\". Use beginning, middle or end."
            ),
        }
    }
}

fn format_arguments(args: &FormatText) -> Option<(&str, usize, usize, FormatValue)> {
    Some((
        args.format_style.as_deref()?,
        as_index(args.start_index)?,
        as_index(args.length)?,
        FormatValue::parse(args.value.as_deref()?),
    ))
}

impl<E: EditorSurface> ToolHost for EditorTools<E> {
    fn specs(&self) -> &[ToolSpec] {
        &self.specs
    }

    async fn execute(&mut self, call: &ToolCall) -> Result<String, ToolError> {
        let action = EditorAction::decode(call)?;
        debug!(action = action.name(), "applying editor action");
        Ok(self.apply(action))
    }
}

fn names<T: ToString>(values: &[T]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}

/// Declarations of every editor function.
pub fn editor_specs() -> Vec<ToolSpec> {
    vec![
        ToolSpec::new(
            action::INSERT_TEXT,
            "Insert a short text in the editor at a given index.",
            json!({
                "type": "object",
                "properties": {
                    "inserting_text": {"type": "string", "description": "The text to insert."},
                    "start_index": {"type": "number", "description": "The index to insert the text at."}
                },
                "required": ["inserting_text", "start_index"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::FORMAT_TEXT,
            "Apply a character-level format to the text at the given index and length.",
            json!({
                "type": "object",
                "properties": {
                    "format_style": {"type": "string", "enum": names(InlineStyle::ALL)},
                    "start_index": {"type": "number"},
                    "length": {"type": "number"},
                    "value": {
                        "type": "string",
                        "description": "The format value. Colors and backgrounds take a color name or rgb(r, g, b). \
                            bold, italic, underline, strike and code take true or false. \
                            size takes small, normal, large or huge. script takes sub or super. link takes a URL."
                    }
                },
                "required": ["format_style", "start_index", "length", "value"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::BLOCK_FORMATTING,
            "Apply a line-level format (alignment, code block, blockquote, header, list) to the lines covering the given index and length.",
            json!({
                "type": "object",
                "properties": {
                    "format_style": {"type": "string", "enum": names(BlockStyle::ALL)},
                    "start_index": {"type": "number"},
                    "length": {"type": "number"},
                    "value": {
                        "type": "string",
                        "description": "The format value. align takes left, right, center or justify. \
                            code-block and blockquote take true or false. header takes 1 to 6. \
                            list takes ordered, bullet, checked or unchecked."
                    }
                },
                "required": ["format_style", "start_index", "length", "value"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::REWRITE_TEXT,
            "Replace the text at the given index and length, e.g. to summarize, expand or change its tone.",
            json!({
                "type": "object",
                "properties": {
                    "replacement_text": {"type": "string", "description": "The text that replaces the original."},
                    "start_index": {"type": "number", "description": "Start index of the text to replace."},
                    "length": {"type": "number", "description": "Length of the text to replace."}
                },
                "required": ["replacement_text", "start_index", "length"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::DELETE_TEXT,
            "Delete the text at the given index and length.",
            json!({
                "type": "object",
                "properties": {
                    "start_index": {"type": "number", "description": "Start index of the text to delete."},
                    "length": {"type": "number", "description": "Length of the text to delete."}
                },
                "required": ["start_index", "length"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::LOCATE_TEXT,
            "Get the start index and length of a text in the editor. Use it before every format, rewrite or delete.",
            json!({
                "type": "object",
                "properties": {
                    "text_to_be_found": {"type": "string", "description": "The text to look for."},
                    "occurrence_number": {
                        "type": "number",
                        "description": "Which occurrence to find, starting at 1. For the second 'hello' in 'hello world, hello' use 2."
                    }
                },
                "required": ["text_to_be_found", "occurrence_number"],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::GET_SELECTION,
            "Get the index and length of the text the user selected.",
            json!({
                "type": "object",
                "properties": {},
                "required": [],
                "additionalProperties": false
            }),
        ),
        ToolSpec::new(
            action::LOCATE_PLACE,
            "Get the index of the beginning, middle or end of the editor's content. \
             New text goes at the beginning of an empty editor and at the end otherwise.",
            json!({
                "type": "object",
                "properties": {
                    "specific_editor_place": {"type": "string", "enum": names(Place::ALL)}
                },
                "required": ["specific_editor_place"],
                "additionalProperties": false
            }),
        ),
    ]
}
