//! Typed editor operations decoded from tool calls.
//!
//! Required arguments are optional here on purpose: a call that omits one
//! still decodes, and the handler answers the model with a failure message
//! it can correct. Only malformed JSON or wrongly typed values are decode
//! errors.

use runtime::{ToolCall, ToolError, decode_arguments};
use serde::Deserialize;

pub const INSERT_TEXT: &str = "insert_text";
pub const FORMAT_TEXT: &str = "format_text";
pub const BLOCK_FORMATTING: &str = "block_formatting";
pub const REWRITE_TEXT: &str = "rewrite_text";
pub const DELETE_TEXT: &str = "delete_text";
pub const LOCATE_TEXT: &str = "get_text_position_and_length";
pub const GET_SELECTION: &str = "get_selection";
pub const LOCATE_PLACE: &str = "get_specific_position_in_editor";

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct InsertText {
    pub inserting_text: Option<String>,
    pub start_index: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FormatText {
    pub format_style: Option<String>,
    pub start_index: Option<f64>,
    pub length: Option<f64>,
    pub value: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct RewriteText {
    pub replacement_text: Option<String>,
    pub start_index: Option<f64>,
    pub length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct DeleteText {
    pub start_index: Option<f64>,
    pub length: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocateText {
    pub text_to_be_found: Option<String>,
    pub occurrence_number: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct LocatePlace {
    pub specific_editor_place: Option<String>,
}

/// One editor operation requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum EditorAction {
    InsertText(InsertText),
    FormatText(FormatText),
    BlockFormatting(FormatText),
    RewriteText(RewriteText),
    DeleteText(DeleteText),
    LocateText(LocateText),
    GetSelection,
    LocatePlace(LocatePlace),
}

impl EditorAction {
    /// Decode a tool call by function name.
    pub fn decode(call: &ToolCall) -> Result<Self, ToolError> {
        let raw = call.arguments.as_str();
        match call.name.as_str() {
            INSERT_TEXT => decode_arguments(raw).map(Self::InsertText),
            FORMAT_TEXT => decode_arguments(raw).map(Self::FormatText),
            BLOCK_FORMATTING => decode_arguments(raw).map(Self::BlockFormatting),
            REWRITE_TEXT => decode_arguments(raw).map(Self::RewriteText),
            DELETE_TEXT => decode_arguments(raw).map(Self::DeleteText),
            LOCATE_TEXT => decode_arguments(raw).map(Self::LocateText),
            GET_SELECTION => Ok(Self::GetSelection),
            LOCATE_PLACE => decode_arguments(raw).map(Self::LocatePlace),
            other => Err(ToolError::NotFound(other.to_string())),
        }
    }

    /// The function name this action is advertised under.
    pub fn name(&self) -> &'static str {
        match self {
            Self::InsertText(_) => INSERT_TEXT,
            Self::FormatText(_) => FORMAT_TEXT,
            Self::BlockFormatting(_) => BLOCK_FORMATTING,
            Self::RewriteText(_) => REWRITE_TEXT,
            Self::DeleteText(_) => DELETE_TEXT,
            Self::LocateText(_) => LOCATE_TEXT,
            Self::GetSelection => GET_SELECTION,
            Self::LocatePlace(_) => LOCATE_PLACE,
        }
    }
}

/// A JSON number usable as a character index or count.
///
/// Models sometimes send `3.0` for `3`; negative, fractional and
/// non-finite values are rejected.
pub fn as_index(value: Option<f64>) -> Option<usize> {
    value
        .filter(|v| v.is_finite() && *v >= 0.0 && v.fract() == 0.0)
        .map(|v| v as usize)
}
