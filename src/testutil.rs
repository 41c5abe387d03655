//! Test-only helper that synthesizes minimal in-memory workbook archives.

use std::io::Cursor;
use std::io::Write;
use zip::write::SimpleFileOptions;
use zip::ZipWriter;

/// Builder for a minimal xlsx archive held in memory.
pub(crate) struct WorkbookArchive {
    sheets: Vec<(String, String)>,
    shared_strings: Vec<String>,
    custom_formats: Vec<(String, String)>,
    format_indexes: Vec<String>,
    date1904: bool,
}

impl WorkbookArchive {
    pub(crate) fn new() -> WorkbookArchive {
        WorkbookArchive {
            sheets: Vec::new(),
            shared_strings: Vec::new(),
            custom_formats: Vec::new(),
            format_indexes: Vec::new(),
            date1904: false,
        }
    }

    /// Adds a sheet with the given name and raw sheetData inner XML.
    pub(crate) fn sheet(mut self, name: &str, rows_xml: &str) -> Self {
        self.sheets.push((name.to_owned(), rows_xml.to_owned()));
        self
    }

    pub(crate) fn shared_strings(mut self, strings: &[&str]) -> Self {
        self.shared_strings = strings.iter().map(|s| (*s).to_owned()).collect();
        self
    }

    /// Declares custom numFmt entries and the cellXfs numFmtId list that
    /// cell `s` attributes index into.
    pub(crate) fn styles(mut self, custom: &[(&str, &str)], xf_ids: &[&str]) -> Self {
        self.custom_formats = custom
            .iter()
            .map(|(id, code)| ((*id).to_owned(), (*code).to_owned()))
            .collect();
        self.format_indexes = xf_ids.iter().map(|id| (*id).to_owned()).collect();
        self
    }

    pub(crate) fn date1904(mut self, date1904: bool) -> Self {
        self.date1904 = date1904;
        self
    }

    pub(crate) fn build(&self) -> Cursor<Vec<u8>> {
        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let options = SimpleFileOptions::default();

        let mut workbook = String::from("<workbook>");
        if self.date1904 {
            workbook.push_str("<workbookPr date1904=\"true\"/>");
        }
        workbook.push_str("<sheets>");
        let mut relationships = String::from("<Relationships>");
        for (index, (name, _)) in self.sheets.iter().enumerate() {
            let id = index + 1;
            workbook.push_str(&format!(
                "<sheet name=\"{name}\" sheetId=\"{id}\" r:id=\"rId{id}\"/>"
            ));
            relationships.push_str(&format!(
                "<Relationship Id=\"rId{id}\" \
                 Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet\" \
                 Target=\"worksheets/sheet{id}.xml\"/>"
            ));
        }
        workbook.push_str("</sheets></workbook>");
        relationships.push_str("</Relationships>");

        zip.start_file("xl/workbook.xml", options).unwrap();
        zip.write_all(workbook.as_bytes()).unwrap();
        zip.start_file("xl/_rels/workbook.xml.rels", options).unwrap();
        zip.write_all(relationships.as_bytes()).unwrap();

        if !self.shared_strings.is_empty() {
            let mut sst = String::from("<sst>");
            for string in &self.shared_strings {
                sst.push_str(&format!("<si><t>{string}</t></si>"));
            }
            sst.push_str("</sst>");
            zip.start_file("xl/sharedStrings.xml", options).unwrap();
            zip.write_all(sst.as_bytes()).unwrap();
        }

        if !self.format_indexes.is_empty() {
            let mut styles = String::from("<styleSheet><numFmts>");
            for (id, code) in &self.custom_formats {
                styles.push_str(&format!("<numFmt numFmtId=\"{id}\" formatCode=\"{code}\"/>"));
            }
            styles.push_str("</numFmts><cellXfs>");
            for id in &self.format_indexes {
                styles.push_str(&format!("<xf numFmtId=\"{id}\"/>"));
            }
            styles.push_str("</cellXfs></styleSheet>");
            zip.start_file("xl/styles.xml", options).unwrap();
            zip.write_all(styles.as_bytes()).unwrap();
        }

        for (index, (_, rows_xml)) in self.sheets.iter().enumerate() {
            let path = format!("xl/worksheets/sheet{}.xml", index + 1);
            zip.start_file(&path, options).unwrap();
            zip.write_all(
                format!("<worksheet><sheetData>{rows_xml}</sheetData></worksheet>").as_bytes(),
            )
            .unwrap();
        }

        zip.finish().unwrap()
    }
}
