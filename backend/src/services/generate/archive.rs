use std::collections::HashSet;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Incrementally builds the downloadable bundle of certificate documents.
///
/// Entry names come from the row's display name; when a display name repeats
/// within one job, the row index is appended to keep entries unique.
pub struct ArchiveBuilder {
    writer: ZipWriter<File>,
    used_names: HashSet<String>,
}

impl ArchiveBuilder {
    pub fn create(path: &Path) -> Result<Self, String> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| e.to_string())?;
        }
        let file = File::create(path).map_err(|e| e.to_string())?;
        Ok(Self {
            writer: ZipWriter::new(file),
            used_names: HashSet::new(),
        })
    }

    /// Adds the document at `source` under `<display_name>.pdf`, or
    /// `<display_name>_<row+1>.pdf` when that entry name is already taken.
    pub fn add_certificate(
        &mut self,
        display_name: &str,
        row_index: usize,
        source: &Path,
    ) -> Result<String, String> {
        let mut entry = format!("{display_name}.pdf");
        if !self.used_names.insert(entry.clone()) {
            entry = format!("{display_name}_{}.pdf", row_index + 1);
            self.used_names.insert(entry.clone());
        }

        let options = SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.writer
            .start_file(entry.as_str(), options)
            .map_err(|e| e.to_string())?;
        let bytes = std::fs::read(source).map_err(|e| e.to_string())?;
        self.writer.write_all(&bytes).map_err(|e| e.to_string())?;
        Ok(entry)
    }

    pub fn entry_count(&self) -> usize {
        self.used_names.len()
    }

    /// Finalizes the central directory. Without this the archive is invalid.
    pub fn finish(self) -> Result<(), String> {
        self.writer.finish().map_err(|e| e.to_string())?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source_file(dir: &tempfile::TempDir, name: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        std::fs::write(&path, b"%PDF-1.4 test").unwrap();
        path
    }

    #[test]
    fn duplicate_display_names_get_row_suffixes() {
        let dir = tempfile::tempdir().unwrap();
        let source = source_file(&dir, "doc.pdf");
        let zip_path = dir.path().join("bundle.zip");

        let mut builder = ArchiveBuilder::create(&zip_path).unwrap();
        assert_eq!(
            builder.add_certificate("Jane Doe", 0, &source).unwrap(),
            "Jane Doe.pdf"
        );
        assert_eq!(
            builder.add_certificate("Jane Doe", 1, &source).unwrap(),
            "Jane Doe_2.pdf"
        );
        assert_eq!(builder.entry_count(), 2);
        builder.finish().unwrap();

        let archive = zip::ZipArchive::new(File::open(&zip_path).unwrap()).unwrap();
        assert_eq!(archive.len(), 2);
    }
}
