//! Spreadsheet persistence.
//!
//! Writes the result table as a single-sheet Office Open XML workbook:
//! a zip container holding a handful of XML parts. Text cells go through a
//! shared-strings table, counts are stored as plain numbers.

use crate::file_utils::output_file_path;
use crate::schema::{DocumentSummary, REPORT_COLUMNS, ResultTable, ScanError};
use quick_xml::Writer;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use std::collections::HashMap;
use std::fs::{self, File};
use std::io::{BufWriter, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

const SPREADSHEET_NS: &str = "http://schemas.openxmlformats.org/spreadsheetml/2006/main";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/xl/workbook.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sheet.main+xml"/><Override PartName="/xl/worksheets/sheet1.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.worksheet+xml"/><Override PartName="/xl/sharedStrings.xml" ContentType="application/vnd.openxmlformats-officedocument.spreadsheetml.sharedStrings+xml"/></Types>"#;

const ROOT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="xl/workbook.xml"/></Relationships>"#;

const WORKBOOK: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<workbook xmlns="http://schemas.openxmlformats.org/spreadsheetml/2006/main" xmlns:r="http://schemas.openxmlformats.org/officeDocument/2006/relationships"><sheets><sheet name="Sheet1" sheetId="1" r:id="rId1"/></sheets></workbook>"#;

const WORKBOOK_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/worksheet" Target="worksheets/sheet1.xml"/><Relationship Id="rId2" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/sharedStrings" Target="sharedStrings.xml"/></Relationships>"#;

/// Persists a finished result table somewhere and reports where.
pub trait ReportWriter {
    fn write(&self, table: &ResultTable) -> Result<PathBuf, ScanError>;
}

/// Writes `pdf_page_count_<timestamp>.xlsx` files into a directory,
/// creating the directory on first use.
pub struct XlsxReportWriter {
    output_dir: PathBuf,
}

impl XlsxReportWriter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }
}

impl ReportWriter for XlsxReportWriter {
    fn write(&self, table: &ResultTable) -> Result<PathBuf, ScanError> {
        fs::create_dir_all(&self.output_dir).map_err(|source| ScanError::Persist {
            path: self.output_dir.clone(),
            source,
        })?;
        let path = output_file_path(&self.output_dir, chrono::Local::now().naive_local());
        write_report_file(&path, table)?;
        tracing::info!("report with {} rows written to {}", table.len(), path.display());
        Ok(path)
    }
}

/// Writes the workbook to `path`, replacing any existing file.
pub fn write_report_file(path: &Path, table: &ResultTable) -> Result<(), ScanError> {
    let persist_err = |source| ScanError::Persist {
        path: path.to_path_buf(),
        source,
    };
    let file = File::create(path).map_err(persist_err)?;
    let mut out = write_workbook(BufWriter::new(file), table)?;
    out.flush().map_err(persist_err)
}

/// Encodes the workbook into any seekable sink and hands the sink back.
pub fn write_workbook<W: Write + Seek>(sink: W, table: &ResultTable) -> Result<W, ScanError> {
    let mut strings = SharedStrings::default();
    let sheet = sheet_xml(table, &mut strings)?;
    let shared = strings.to_xml()?;

    let mut zip = ZipWriter::new(sink);
    let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
    let parts: [(&str, &[u8]); 6] = [
        ("[Content_Types].xml", CONTENT_TYPES.as_bytes()),
        ("_rels/.rels", ROOT_RELS.as_bytes()),
        ("xl/workbook.xml", WORKBOOK.as_bytes()),
        ("xl/_rels/workbook.xml.rels", WORKBOOK_RELS.as_bytes()),
        ("xl/worksheets/sheet1.xml", &sheet),
        ("xl/sharedStrings.xml", &shared),
    ];
    for (name, body) in parts {
        zip.start_file(name, options).map_err(spreadsheet_err)?;
        zip.write_all(body).map_err(spreadsheet_err)?;
    }
    zip.finish().map_err(spreadsheet_err)
}

enum Cell<'a> {
    Text(&'a str),
    Number(u64),
}

fn row_cells<'a>(summary: &'a DocumentSummary, colored: &'a str) -> Vec<Cell<'a>> {
    vec![
        Cell::Text(&summary.file_name),
        Cell::Number(summary.page_count as u64),
        Cell::Number(summary.a4 as u64),
        Cell::Number(summary.a3 as u64),
        Cell::Number(summary.a2 as u64),
        Cell::Number(summary.a1 as u64),
        Cell::Number(summary.printed_pages),
        Cell::Number(summary.monochrome_pages),
        Cell::Number(summary.colored_pages),
        Cell::Text(colored),
    ]
}

fn sheet_xml(table: &ResultTable, strings: &mut SharedStrings) -> Result<Vec<u8>, ScanError> {
    let mut w = Writer::new(Vec::new());
    write_decl(&mut w)?;
    write_start(&mut w, BytesStart::new("worksheet").with_attributes([("xmlns", SPREADSHEET_NS)]))?;
    write_start(&mut w, BytesStart::new("sheetData"))?;

    let header: Vec<Cell<'_>> = REPORT_COLUMNS.iter().map(|c| Cell::Text(*c)).collect();
    write_row(&mut w, 1, &header, strings)?;

    for (i, summary) in table.iter().enumerate() {
        let colored = summary.colored_page_list();
        write_row(&mut w, i + 2, &row_cells(summary, &colored), strings)?;
    }

    write_end(&mut w, "sheetData")?;
    write_end(&mut w, "worksheet")?;
    Ok(w.into_inner())
}

fn write_row(
    w: &mut Writer<Vec<u8>>,
    row: usize,
    cells: &[Cell<'_>],
    strings: &mut SharedStrings,
) -> Result<(), ScanError> {
    let row_ref = row.to_string();
    write_start(w, BytesStart::new("row").with_attributes([("r", row_ref.as_str())]))?;
    for (col, cell) in cells.iter().enumerate() {
        let cell_ref = format!("{}{}", column_name(col), row);
        let (value, is_text) = match *cell {
            // empty text leaves the cell out entirely
            Cell::Text("") => continue,
            Cell::Text(text) => (strings.index_of(text).to_string(), true),
            Cell::Number(n) => (n.to_string(), false),
        };
        let start = BytesStart::new("c").with_attributes([("r", cell_ref.as_str())]);
        let start = if is_text {
            start.with_attributes([("t", "s")])
        } else {
            start
        };
        write_start(w, start)?;
        write_start(w, BytesStart::new("v"))?;
        w.write_event(Event::Text(BytesText::new(&value)))
            .map_err(spreadsheet_err)?;
        write_end(w, "v")?;
        write_end(w, "c")?;
    }
    write_end(w, "row")
}

/// Spreadsheet column letters: 0 -> A, 25 -> Z, 26 -> AA.
fn column_name(mut index: usize) -> String {
    let mut name = Vec::new();
    loop {
        name.push(b'A' + (index % 26) as u8);
        if index < 26 {
            break;
        }
        index = index / 26 - 1;
    }
    name.reverse();
    String::from_utf8_lossy(&name).into_owned()
}

#[derive(Default)]
struct SharedStrings {
    index: HashMap<String, usize>,
    values: Vec<String>,
    references: usize,
}

impl SharedStrings {
    fn index_of(&mut self, text: &str) -> usize {
        self.references += 1;
        if let Some(i) = self.index.get(text) {
            return *i;
        }
        let i = self.values.len();
        self.values.push(text.to_owned());
        self.index.insert(text.to_owned(), i);
        i
    }

    fn to_xml(&self) -> Result<Vec<u8>, ScanError> {
        let mut w = Writer::new(Vec::new());
        write_decl(&mut w)?;
        let count = self.references.to_string();
        let unique = self.values.len().to_string();
        write_start(
            &mut w,
            BytesStart::new("sst").with_attributes([
                ("xmlns", SPREADSHEET_NS),
                ("count", count.as_str()),
                ("uniqueCount", unique.as_str()),
            ]),
        )?;
        for value in &self.values {
            write_start(&mut w, BytesStart::new("si"))?;
            write_start(
                &mut w,
                BytesStart::new("t").with_attributes([("xml:space", "preserve")]),
            )?;
            w.write_event(Event::Text(BytesText::new(value)))
                .map_err(spreadsheet_err)?;
            write_end(&mut w, "t")?;
            write_end(&mut w, "si")?;
        }
        write_end(&mut w, "sst")?;
        Ok(w.into_inner())
    }
}

fn write_decl(w: &mut Writer<Vec<u8>>) -> Result<(), ScanError> {
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))
        .map_err(spreadsheet_err)
}

fn write_start(w: &mut Writer<Vec<u8>>, start: BytesStart<'_>) -> Result<(), ScanError> {
    w.write_event(Event::Start(start)).map_err(spreadsheet_err)
}

fn write_end(w: &mut Writer<Vec<u8>>, name: &str) -> Result<(), ScanError> {
    w.write_event(Event::End(BytesEnd::new(name)))
        .map_err(spreadsheet_err)
}

fn spreadsheet_err(e: impl std::fmt::Display) -> ScanError {
    ScanError::Spreadsheet(e.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    #[test]
    fn column_names_follow_spreadsheet_convention() {
        assert_eq!(column_name(0), "A");
        assert_eq!(column_name(9), "J");
        assert_eq!(column_name(25), "Z");
        assert_eq!(column_name(26), "AA");
        assert_eq!(column_name(27), "AB");
        assert_eq!(column_name(701), "ZZ");
        assert_eq!(column_name(702), "AAA");
    }

    #[test]
    fn shared_strings_are_deduplicated() {
        let mut strings = SharedStrings::default();
        assert_eq!(strings.index_of("A4"), 0);
        assert_eq!(strings.index_of("a.pdf"), 1);
        assert_eq!(strings.index_of("A4"), 0);
        let xml = String::from_utf8(strings.to_xml().unwrap()).unwrap();
        assert!(xml.contains(r#"count="3""#));
        assert!(xml.contains(r#"uniqueCount="2""#));
    }

    #[test]
    fn text_is_escaped() {
        let mut strings = SharedStrings::default();
        strings.index_of("R&D <draft>.pdf");
        let xml = String::from_utf8(strings.to_xml().unwrap()).unwrap();
        assert!(xml.contains("R&amp;D &lt;draft&gt;.pdf"));
    }

    #[test]
    fn workbook_is_a_zip_with_all_parts() {
        let out = write_workbook(Cursor::new(Vec::new()), &Vec::new()).unwrap();
        let bytes = out.into_inner();
        assert_eq!(&bytes[..2], b"PK");
        let archive = zip::ZipArchive::new(Cursor::new(bytes)).unwrap();
        let mut names: Vec<&str> = archive.file_names().collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "[Content_Types].xml",
                "_rels/.rels",
                "xl/_rels/workbook.xml.rels",
                "xl/sharedStrings.xml",
                "xl/workbook.xml",
                "xl/worksheets/sheet1.xml",
            ]
        );
    }
}
