use crate::exceptions::ChatError;
use std::fs;
use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;

/// Atomically write pretty-printed JSON using a temporary file + rename strategy.
pub fn atomic_write_json<T: serde::Serialize>(path: &Path, data: &T) -> Result<(), ChatError> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    // Create temp file in the same directory to ensure atomic rename works across filesystems
    let mut temp_file = NamedTempFile::new_in(dir)?;

    {
        let mut writer = std::io::BufWriter::new(&mut temp_file);
        serde_json::to_writer_pretty(&mut writer, data)?;
        writer.flush()?;
    }

    temp_file.persist(path).map_err(|e| ChatError::Io(e.error))?;
    Ok(())
}

pub fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T, ChatError> {
    let file = fs::File::open(path)?;
    let reader = std::io::BufReader::new(file);
    Ok(serde_json::from_reader(reader)?)
}

/// Replaces every character rejected by `keep` with `_`.
pub fn sanitize_component(raw: &str, keep: impl Fn(char) -> bool) -> String {
    raw.chars().map(|c| if keep(c) { c } else { '_' }).collect()
}

/// A document is usable when it is an existing regular file with a `.pdf` extension.
pub fn is_readable_pdf(path: &Path) -> bool {
    let is_pdf = path
        .extension()
        .and_then(|e| e.to_str())
        .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
    is_pdf && path.is_file() && fs::File::open(path).is_ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_is_readable_pdf_checks_extension_and_existence() {
        let dir = tempfile::tempdir().unwrap();
        let pdf = dir.path().join("doc1.PDF");
        let txt = dir.path().join("notes.txt");
        fs::write(&pdf, b"%PDF-1.4").unwrap();
        fs::write(&txt, b"text").unwrap();

        assert!(is_readable_pdf(&pdf));
        assert!(!is_readable_pdf(&txt));
        assert!(!is_readable_pdf(&dir.path().join("missing.pdf")));
        assert!(!is_readable_pdf(dir.path()));
    }

    proptest! {
        #[test]
        fn sanitized_components_never_contain_separators(raw in ".*") {
            let out = sanitize_component(&raw, |c| c.is_alphanumeric() || c == ' ' || c == '-');
            prop_assert!(!out.contains('/'));
            prop_assert!(!out.contains('\\'));
            prop_assert!(!out.contains('.'));
            prop_assert_eq!(out.chars().count(), raw.chars().count());
        }
    }
}
