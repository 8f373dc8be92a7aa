use bincode::{deserialize_from, serialize_into};
use flate2::Compression;
use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use std::fs::File;
use std::io::Write;
use std::path::Path;

use crate::store::SheetRange;

/// Writes a range to `path` as gzip-compressed bincode.
///
/// The range is written to a sibling temporary file first and then renamed
/// over `path`, so a crash mid-write leaves the previous file intact.
pub fn save_range(range: &SheetRange, path: &Path) -> std::io::Result<()> {
    let staging = path.with_extension("tmp");
    {
        let file = File::create(&staging)?;
        let encoder = GzEncoder::new(file, Compression::default());
        let mut writer = std::io::BufWriter::new(encoder);

        serialize_into(&mut writer, range)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::Other, e))?;

        let encoder = writer.into_inner().map_err(|e| e.into_error())?;
        encoder.finish()?.flush()?;
    }
    std::fs::rename(&staging, path)
}

pub fn load_range(path: &Path) -> std::io::Result<SheetRange> {
    let file = File::open(path)?;
    let decoder = GzDecoder::new(file);
    let mut reader = std::io::BufReader::new(decoder);

    let range: SheetRange = deserialize_from(&mut reader)
        .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;

    Ok(range)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn garbage_file_is_invalid_data() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.bin.gz");
        std::fs::write(&path, b"not a gzip stream").unwrap();

        let err = load_range(&path).unwrap_err();
        assert_eq!(err.kind(), std::io::ErrorKind::InvalidData);
    }

    #[test]
    fn save_replaces_the_previous_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("range.bin.gz");
        let mut range = SheetRange::with_header();
        save_range(&range, &path).unwrap();

        range.write_from(2, vec![vec!["client".to_string(), "Aldar".to_string()]]);
        save_range(&range, &path).unwrap();

        assert_eq!(load_range(&path).unwrap(), range);
        assert!(!path.with_extension("tmp").exists());
    }
}
