//! Parsing of the xlsx container structure: workbook inventory, styles,
//! shared strings, and per-sheet cell streams.

use crate::error::FixtureSheetError;
use crate::helpers::xml::XmlReader;
use crate::helpers::xml::XmlStartHelper;
use crate::helpers::xml::XmlTextHelper;
use crate::helpers::zip::ZipHelper;
use crate::match_xml_events;
use crate::workbook::cell::reference_to_index;
use crate::workbook::cell::Cell;
use crate::workbook::cell::CellKind;
use crate::workbook::cell::DateSystem;
use crate::workbook::cell::NumberFormat;
use crate::workbook::sheet::SheetGrid;
use crate::workbook::WorkbookError;
use quick_xml::events::Event;
use quick_xml::name::QName;
use std::borrow::Cow;
use std::collections::HashMap;
use std::io::BufRead;
use std::io::Read;
use std::io::Seek;
use zip::ZipArchive;

// XML tag names used by the container format
const TAG_RELATIONSHIP: &[u8] = b"Relationship";
const TAG_WORKBOOK_PROPERTIES: QName = QName(b"workbookPr");
const TAG_SHEET: QName = QName(b"sheet");
const TAG_CUSTOM_FORMATS: QName = QName(b"numFmts");
const TAG_CUSTOM_FORMAT: QName = QName(b"numFmt");
const TAG_FORMAT_INDEXES: QName = QName(b"cellXfs");
const TAG_FORMAT_INDEX: QName = QName(b"xf");
const TAG_SHARED_STRING_ITEM: QName = QName(b"si");
const TAG_PHONETIC_TEXT: QName = QName(b"rPh");
const TAG_TEXT: QName = QName(b"t");
const TAG_ROW: QName = QName(b"row");
const TAG_CELL: QName = QName(b"c");
const TAG_FORMULA: QName = QName(b"f");
const TAG_INLINE_STRING: QName = QName(b"is");
const TAG_VALUE: QName = QName(b"v");

/// Reads the ordered sheet inventory and the workbook's date system.
pub(super) fn load_workbook<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<(Vec<(String, String)>, DateSystem), FixtureSheetError> {
    let relationships = load_relationships(zip, "xl/_rels/workbook.xml.rels")?;
    let mut reader = zip
        .xml_reader("xl/workbook.xml")?
        .ok_or_else(|| WorkbookError::MissingPart("xl/workbook.xml".to_owned()))?;
    let mut sheets: Vec<(String, String)> = Vec::new();
    let mut date_system = DateSystem::Date1900;
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHEET => {
            let mut name = None::<Cow<str>>;
            let mut id = None::<Cow<str>>;
            for result in event.attributes() {
                let attribute = result?;
                let key = attribute.key.local_name();
                if key.as_ref() == b"name" {
                    name = Some(attribute.unescape_value()?);
                } else if key.as_ref() == b"id" {
                    id = Some(attribute.unescape_value()?);
                }
            }
            if let Some((name, id)) = name.zip(id) {
                if let Some(path) = relationships.get(id.as_ref()) {
                    sheets.push((name.to_string(), path.to_owned()));
                }
            }
        }
        Event::Start(event) if event.name() == TAG_WORKBOOK_PROPERTIES => {
            let is_1904 = event.attribute_value("date1904")?
                .map(|value| value.eq("1") || value.eq("true"))
                .unwrap_or(false);
            if is_1904 {
                date_system = DateSystem::Date1904;
            }
        }
    });
    Ok((sheets, date_system))
}

/// Reads worksheet relationships, mapping relationship ids to archive paths.
fn load_relationships<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    path: &str,
) -> Result<HashMap<String, String>, FixtureSheetError> {
    let mut reader = zip
        .xml_reader(path)?
        .ok_or_else(|| WorkbookError::MissingPart(path.to_owned()))?;
    let mut relationships: HashMap<String, String> = HashMap::new();
    match_xml_events!(reader => {
        Event::Start(event) if event.local_name().as_ref() == TAG_RELATIONSHIP => {
            let id = event.attribute_value("Id")?;
            let kind = event.attribute_value("Type")?;
            let target = event.attribute_value("Target")?;
            if kind.map(|it| it.ends_with("/worksheet")).unwrap_or(true) {
                if let Some((id, target)) = id.zip(target) {
                    relationships.insert(id.to_string(), to_zip_path(target));
                }
            }
        }
    });
    Ok(relationships)
}

/// Normalizes a relationship target to an archive path under xl/.
fn to_zip_path(path: Cow<'_, str>) -> String {
    if let Some(stripped) = path.strip_prefix("/xl/") {
        format!("xl/{stripped}")
    } else if path.starts_with("xl/") {
        path.to_string()
    } else {
        format!("xl/{path}")
    }
}

/// Reads the style table: custom numFmts, then the cellXfs index list that
/// cell `s` attributes point into.
pub(super) fn load_number_formats<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<Vec<NumberFormat>, FixtureSheetError> {
    let mut reader = match zip.xml_reader("xl/styles.xml")? {
        Some(reader) => reader,
        None => return Ok(Vec::new()),
    };

    let mut in_custom_formats = false;
    let mut custom_formats = HashMap::<String, NumberFormat>::new();
    let mut in_format_indexes = false;
    let mut format_indexes = Vec::<String>::new();

    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = true,
        Event::End(event) if event.name() == TAG_CUSTOM_FORMATS => in_custom_formats = false,
        Event::Start(event) if in_custom_formats && event.name() == TAG_CUSTOM_FORMAT => {
            let id = event.attribute_value("numFmtId")?;
            let code = event.attribute_value("formatCode")?;
            if let Some((id, code)) = id.zip(code) {
                custom_formats.insert(id.to_string(), NumberFormat::from_custom_code(&code));
            }
        }

        Event::Start(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = true,
        Event::End(event) if event.name() == TAG_FORMAT_INDEXES => in_format_indexes = false,
        Event::Start(event) if in_format_indexes && event.name() == TAG_FORMAT_INDEX => {
            if let Some(id) = event.attribute_value("numFmtId")? {
                format_indexes.push(id.to_string());
            }
        }
    });

    let formats = format_indexes
        .iter()
        .map(|id| {
            custom_formats
                .get(id)
                .cloned()
                .or_else(|| NumberFormat::from_builtin_id(id))
                .unwrap_or_default()
        })
        .collect();
    Ok(formats)
}

/// Reads the shared string table, if present.
pub(super) fn load_shared_strings<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
) -> Result<Vec<String>, FixtureSheetError> {
    let mut strings = Vec::<String>::new();
    let mut reader = match zip.xml_reader("xl/sharedStrings.xml")? {
        Some(reader) => reader,
        None => return Ok(strings),
    };
    match_xml_events!(reader => {
        Event::Start(event) if event.name() == TAG_SHARED_STRING_ITEM => {
            strings.push(read_string_value(&mut reader, TAG_SHARED_STRING_ITEM, false)?);
        }
    });
    Ok(strings)
}

/// Reads one worksheet's cell stream into a sparse grid. Formula and error
/// cells are stored as-is; coercion decides their fate later, so a bad cell
/// in a filtered-out row never fails a load.
pub(super) fn read_sheet<RS: Read + Seek>(
    zip: &mut ZipArchive<RS>,
    sheet_name: &str,
    zip_path: &str,
    shared_strings: &[String],
    number_formats: &[NumberFormat],
    date_system: DateSystem,
) -> Result<SheetGrid, FixtureSheetError> {
    let mut reader = zip
        .xml_reader(zip_path)?
        .ok_or_else(|| WorkbookError::MissingPart(zip_path.to_owned()))?;

    let mut grid = SheetGrid::new(sheet_name, date_system);
    let mut row_count = 0usize;
    let mut col_count = 0usize;
    let mut row = 0usize;
    let mut col = 0usize;
    let mut cell_open = false;
    let mut type_attr = String::new();
    let mut format: Option<NumberFormat> = None;
    let mut has_formula = false;
    let mut value: Option<String> = None;
    match_xml_events!(reader => {
        Event::End(event) if event.name() == TAG_ROW => {
            row_count += 1;
            col_count = 0;
        }
        Event::Start(event) if event.name() == TAG_CELL => {
            (row, col) = event.attribute_value("r")?
                .and_then(|reference| reference_to_index(&reference))
                .unwrap_or((row_count, col_count));
            col_count += 1;
            cell_open = true;
            type_attr = event.attribute_value("t")?.map(Cow::into_owned).unwrap_or_default();
            format = event.parse_attribute::<usize>("s")?
                .and_then(|index| number_formats.get(index).cloned());
            has_formula = false;
            value = None;
        }
        Event::Start(event) if cell_open && event.name() == TAG_FORMULA => {
            has_formula = true;
        }
        Event::Start(event) if cell_open && event.name() == TAG_INLINE_STRING => {
            value = Some(read_string_value(&mut reader, TAG_INLINE_STRING, false)?);
        }
        Event::Start(event) if cell_open && event.name() == TAG_VALUE => {
            value = Some(read_string_value(&mut reader, TAG_VALUE, true)?);
        }
        Event::End(event) if cell_open && event.name() == TAG_CELL => {
            cell_open = false;
            if let Some(cell) = finish_cell(
                row, col, &type_attr, has_formula, value.take(), format.take(), shared_strings,
            )? {
                grid.push(cell);
            }
        }
    });
    Ok(grid)
}

/// Builds a raw cell from the parsed attributes and value, resolving shared
/// strings. Returns None for blank cells.
fn finish_cell(
    row: usize,
    col: usize,
    type_attr: &str,
    has_formula: bool,
    value: Option<String>,
    format: Option<NumberFormat>,
    shared_strings: &[String],
) -> Result<Option<Cell>, FixtureSheetError> {
    // "str" cells are cached formula results; both spellings are formulas.
    let kind = if has_formula || type_attr == "str" {
        CellKind::Formula
    } else {
        match type_attr {
            "e" => CellKind::Error,
            "b" => CellKind::Boolean,
            "inlineStr" | "s" | "d" => CellKind::Text,
            _ => CellKind::Number,
        }
    };

    let value = match value {
        Some(value) => value,
        None if kind == CellKind::Formula || kind == CellKind::Error => String::new(),
        None => return Ok(None),
    };
    let value = if kind == CellKind::Text && type_attr == "s" {
        let index = value.trim().parse::<usize>()?;
        shared_strings
            .get(index)
            .ok_or(WorkbookError::SharedStringIndex(index))?
            .to_owned()
    } else {
        value
    };
    Ok(Some(Cell {
        row,
        col,
        kind,
        value,
        format: format.filter(|_| kind == CellKind::Number),
    }))
}

/// Reads text content up to the given end tag, skipping phonetic
/// annotations and handling CDATA and entity references.
fn read_string_value<R: BufRead>(
    reader: &mut XmlReader<R>,
    end_tag: QName,
    is_text_content: bool,
) -> Result<String, FixtureSheetError> {
    let mut is_phonetic_text = false;
    let mut is_text = is_text_content;
    let mut text = String::new();
    match_xml_events!(reader => {
        Event::End(event) if event.name() == end_tag => break,
        Event::Start(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = true,
        Event::End(event) if event.name() == TAG_PHONETIC_TEXT => is_phonetic_text = false,
        Event::Start(event) if !is_phonetic_text && event.name() == TAG_TEXT => is_text = true,
        Event::End(event) if is_text && event.name() == TAG_TEXT => is_text = false,
        Event::Text(event) if is_text => text.push_str(&event.xml_content()?),
        Event::CData(event) if is_text => text.push_str(&event.xml_content()?),
        Event::GeneralRef(event) if is_text => text.push_entity_ref(&event)?,
    });
    Ok(text)
}
