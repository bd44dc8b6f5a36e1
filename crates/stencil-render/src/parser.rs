//! Parser contract and the built-in content parsers.
//!
//! Parsers turn the raw bytes of a content file into a JSON value that is
//! merged into the template's content object. JSON files never go through a
//! parser; the content fetcher reads them directly.

use pulldown_cmark::{Options, html};
use serde_json::Value;

use crate::error::ParseError;

/// A content-file parser.
pub trait Parser: Send {
    /// Parse raw file bytes into a structured value.
    fn parse(&self, raw: &[u8]) -> Result<Value, ParseError>;
}

/// Renders markdown to an HTML string.
#[derive(Debug, Default)]
pub struct MarkdownParser;

impl MarkdownParser {
    fn options() -> Options {
        Options::ENABLE_TABLES
            | Options::ENABLE_STRIKETHROUGH
            | Options::ENABLE_TASKLISTS
            | Options::ENABLE_GFM
    }
}

impl Parser for MarkdownParser {
    fn parse(&self, raw: &[u8]) -> Result<Value, ParseError> {
        let markdown = std::str::from_utf8(raw)?;
        let mut out = String::with_capacity(markdown.len() * 3 / 2);
        html::push_html(
            &mut out,
            pulldown_cmark::Parser::new_ext(markdown, Self::options()),
        );
        Ok(Value::String(out))
    }
}

/// Parses a YAML document.
#[derive(Debug, Default)]
pub struct YamlParser;

impl Parser for YamlParser {
    fn parse(&self, raw: &[u8]) -> Result<Value, ParseError> {
        Ok(serde_yaml::from_slice(raw)?)
    }
}

/// Parses a TOML document into an object.
#[derive(Debug, Default)]
pub struct TomlParser;

impl Parser for TomlParser {
    fn parse(&self, raw: &[u8]) -> Result<Value, ParseError> {
        let text = std::str::from_utf8(raw)?;
        Ok(toml::from_str(text)?)
    }
}
