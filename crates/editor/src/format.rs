//! Formatting vocabulary shared by the document and the tool declarations.

use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A name that is not part of a fixed vocabulary.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unsupported {kind} '{value}'")]
pub struct ParseError {
    pub kind: &'static str,
    pub value: String,
}

macro_rules! vocabulary {
    ($(#[$meta:meta])* $name:ident, $kind:literal { $($variant:ident => $text:literal),+ $(,)? }) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub const ALL: &'static [$name] = &[$($name::$variant),+];

            pub fn as_str(self) -> &'static str {
                match self {
                    $($name::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $name {
            type Err = ParseError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s.trim() {
                    $($text => Ok($name::$variant),)+
                    other => Err(ParseError {
                        kind: $kind,
                        value: other.to_string(),
                    }),
                }
            }
        }
    };
}

vocabulary! {
    /// Character-level formats.
    InlineStyle, "format style" {
        Bold => "bold",
        Italic => "italic",
        Underline => "underline",
        Strike => "strike",
        Color => "color",
        Background => "background",
        Size => "size",
        Script => "script",
        Code => "code",
        Link => "link",
    }
}

vocabulary! {
    /// Line-level formats.
    BlockStyle, "block format style" {
        Align => "align",
        CodeBlock => "code-block",
        Blockquote => "blockquote",
        Header => "header",
        List => "list",
    }
}

vocabulary! {
    /// Symbolic positions in the document.
    Place, "place in the editor" {
        Beginning => "beginning",
        Middle => "middle",
        End => "end",
    }
}

/// The value a format is set to.
///
/// `"true"` and `"false"` are booleans, anything else is kept as text
/// (a color, a size, a header level, a URL...).
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatValue {
    Bool(bool),
    Text(String),
}

impl FormatValue {
    pub fn parse(value: &str) -> Self {
        match value.trim() {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            other => Self::Text(other.to_string()),
        }
    }

    /// Whether applying this value clears the format instead of setting it.
    pub fn is_removal(&self) -> bool {
        matches!(self, Self::Bool(false))
    }
}

impl fmt::Display for FormatValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_style_uses_kebab_names() {
        assert_eq!("code-block".parse::<BlockStyle>(), Ok(BlockStyle::CodeBlock));
        assert_eq!(BlockStyle::CodeBlock.to_string(), "code-block");
    }

    #[test]
    fn unknown_name_reports_kind() {
        let err = "sparkle".parse::<InlineStyle>().unwrap_err();
        assert_eq!(err.to_string(), "unsupported format style 'sparkle'");
        assert!("top".parse::<Place>().is_err());
    }

    #[test]
    fn format_value_parsing() {
        assert_eq!(FormatValue::parse("true"), FormatValue::Bool(true));
        assert!(FormatValue::parse("false").is_removal());
        assert_eq!(
            FormatValue::parse("rgb(255, 120, 250)"),
            FormatValue::Text("rgb(255, 120, 250)".into())
        );
    }
}
