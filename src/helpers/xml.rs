//! XML reading utilities for the workbook container format.
//! Wraps quick-xml with a reusable buffer and helper traits for attributes and text.

use crate::error::FixtureSheetError;
use quick_xml::escape::resolve_xml_entity;
use quick_xml::events::attributes::Attribute;
use quick_xml::events::BytesRef;
use quick_xml::events::BytesStart;
use quick_xml::events::Event;
use quick_xml::Reader;
use std::borrow::Cow;
use std::io::BufRead;
use std::str::FromStr;
use thiserror::Error;

/// Errors specific to XML parsing operations
#[derive(Error, Debug)]
pub enum XmlError {
    #[error("Unresolvable entity reference '{0}'")]
    EntityError(String),

    #[error("Parse attribute value '{0}' failed")]
    AttributeValueError(String),
}

/// XML event reader with a reusable internal buffer.
pub(crate) struct XmlReader<R: BufRead> {
    reader: Reader<R>,
    buffer: Vec<u8>,
}

impl<R: BufRead> XmlReader<R> {
    pub(crate) fn new(buf_reader: R) -> XmlReader<R> {
        let mut reader = Reader::from_reader(buf_reader);
        let config = reader.config_mut();
        config.check_comments = false;
        config.check_end_names = false;
        config.expand_empty_elements = true;
        config.trim_text(false);

        XmlReader {
            reader,
            buffer: Vec::with_capacity(1024),
        }
    }

    /// Reads the next event, returning None at end of input.
    pub(crate) fn next(&'_ mut self) -> Result<Option<Event<'_>>, FixtureSheetError> {
        self.buffer.clear();
        match self.reader.read_event_into(&mut self.buffer) {
            Ok(Event::Eof) => Ok(None),
            Ok(event) => Ok(Some(event)),
            Err(error) => Err(FixtureSheetError::XmlError(error)),
        }
    }
}

/// Attribute access on start tags.
pub(crate) trait XmlStartHelper<'a> {
    /// Gets an unescaped attribute value by name.
    fn attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, FixtureSheetError>;

    /// Parses an attribute value into the requested type.
    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, FixtureSheetError>;
}

impl<'a> XmlStartHelper<'a> for BytesStart<'a> {
    fn attribute_value(&'a self, name: &str) -> Result<Option<Cow<'a, str>>, FixtureSheetError> {
        self.try_get_attribute(name)?
            .map(unescaped)
            .transpose()
    }

    fn parse_attribute<T: FromStr>(&self, name: &str) -> Result<Option<T>, FixtureSheetError> {
        self.try_get_attribute(name)?
            .map(|attribute| {
                let value = unescaped(attribute)?;
                value
                    .parse()
                    .map_err(|_| XmlError::AttributeValueError(value.to_string()).into())
            })
            .transpose()
    }
}

fn unescaped(attribute: Attribute<'_>) -> Result<Cow<'_, str>, FixtureSheetError> {
    Ok(attribute.unescape_value()?)
}

/// Text accumulation across mixed text, CDATA and entity-reference events.
pub(crate) trait XmlTextHelper {
    /// Appends a resolved entity or character reference.
    fn push_entity_ref(&mut self, bytes: &BytesRef) -> Result<(), FixtureSheetError>;
}

impl XmlTextHelper for String {
    fn push_entity_ref(&mut self, bytes: &BytesRef) -> Result<(), FixtureSheetError> {
        let raw = bytes.xml_content()?;
        if let Some(number) = raw.strip_prefix('#') {
            let code = match number.strip_prefix('x') {
                Some(hex) => u32::from_str_radix(hex, 16)?,
                None => number.parse::<u32>()?,
            };
            if let Some(character) = std::char::from_u32(code) {
                self.push(character);
            }
        } else if let Some(entity) = resolve_xml_entity(&raw) {
            self.push_str(entity);
        } else {
            Err(XmlError::EntityError(raw.to_string()))?;
        }
        Ok(())
    }
}

#[macro_export]
macro_rules! match_xml_events {
    ($reader:expr => { $($arms:tt)* }) => {
        while let Some(result) = $reader.next()? {
            match result {
                Event::Eof => break,
                $($arms)*
                _ => (),
            }
        }
    };
}
