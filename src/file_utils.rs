use crate::schema::ScanError;
use chrono::NaiveDateTime;
use std::fs;
use std::path::{Path, PathBuf};

/// Checks whether a file name carries a `.pdf` extension (case-insensitive).
///
/// # Arguments
///
/// * `name` - A bare file name such as `"Drawing.PDF"`
///
/// # Returns
///
/// `true` for names ending in `.pdf` in any letter case, `false` otherwise.
/// The content of the file is not inspected; a mislabelled file is only
/// discovered when the scanner tries to open it.
pub fn is_pdf_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".pdf")
}

/// Lists the PDF files directly inside `folder`.
///
/// # Arguments
///
/// * `folder` - The directory to scan (not recursive)
///
/// # Returns
///
/// The file names, in the order the filesystem lists them. The order is
/// not sorted and callers must not assume it is. Directories and entries
/// whose names are not valid UTF-8 are skipped.
///
/// # Errors
///
/// Returns `ScanError::FolderRead` if the folder cannot be listed.
pub fn list_pdf_files(folder: &Path) -> Result<Vec<String>, ScanError> {
    let read_err = |source| ScanError::FolderRead {
        path: folder.to_path_buf(),
        source,
    };

    let mut names = Vec::new();
    for entry in fs::read_dir(folder).map_err(read_err)? {
        let entry = entry.map_err(read_err)?;
        if entry.file_type().map(|t| t.is_dir()).unwrap_or(false) {
            continue;
        }
        let Some(name) = entry.file_name().to_str().map(str::to_owned) else {
            tracing::warn!("skipping non UTF-8 file name {:?}", entry.file_name());
            continue;
        };
        if is_pdf_name(&name) {
            names.push(name);
        }
    }
    Ok(names)
}

/// Builds the report path `<dir>/pdf_page_count_<YYYYMMDD_HHMMSS>.xlsx`.
pub fn output_file_path(dir: &Path, now: NaiveDateTime) -> PathBuf {
    dir.join(format!("pdf_page_count_{}.xlsx", now.format("%Y%m%d_%H%M%S")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    #[test]
    fn pdf_extension_is_case_insensitive() {
        assert!(is_pdf_name("a.pdf"));
        assert!(is_pdf_name("Plans.PDF"));
        assert!(is_pdf_name("x.Pdf"));
        assert!(!is_pdf_name("notes.txt"));
        assert!(!is_pdf_name("pdf"));
        assert!(!is_pdf_name("archive.pdf.zip"));
    }

    #[test]
    fn lists_only_pdf_files() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("one.pdf"), b"%PDF").unwrap();
        fs::write(dir.path().join("TWO.PDF"), b"%PDF").unwrap();
        fs::write(dir.path().join("readme.txt"), b"hi").unwrap();
        fs::create_dir(dir.path().join("nested.pdf")).unwrap();

        let mut names = list_pdf_files(dir.path()).unwrap();
        names.sort();
        assert_eq!(names, vec!["TWO.PDF".to_string(), "one.pdf".to_string()]);
    }

    #[test]
    fn missing_folder_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = list_pdf_files(&dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, ScanError::FolderRead { .. }));
    }

    #[test]
    fn output_name_carries_timestamp() {
        let now = NaiveDate::from_ymd_opt(2024, 3, 9)
            .unwrap()
            .and_hms_opt(7, 5, 42)
            .unwrap();
        let path = output_file_path(Path::new("/tmp/output"), now);
        assert_eq!(
            path,
            PathBuf::from("/tmp/output/pdf_page_count_20240309_070542.xlsx")
        );
    }
}
