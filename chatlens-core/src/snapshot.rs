//! On-disk snapshot of the extracted flat table
//!
//! The snapshot is the boundary between extraction and analysis: the
//! extractor writes it once per run and everything downstream reads only
//! this file, never the raw store. The format is a versioned bincode blob;
//! the version is decoded first so an incompatible file fails loudly
//! instead of misparsing.

use crate::error::{Error, Result};
use crate::types::Record;
use serde::Serialize;
use std::path::Path;

/// Bumped whenever [`Record`] or the container layout changes shape.
pub const SNAPSHOT_VERSION: u32 = 1;

// bincode is not self-describing; the read side peels the same layout off
// field by field, version first.
#[derive(Serialize)]
struct SnapshotRef<'a> {
    version: u32,
    records: &'a [Record],
}

/// Write `records` to `path`, replacing any previous snapshot atomically.
pub fn write(path: &Path, records: &[Record]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let bytes = bincode::serialize(&SnapshotRef {
        version: SNAPSHOT_VERSION,
        records,
    })?;

    let tmp = path.with_extension("bin.tmp");
    std::fs::write(&tmp, &bytes)?;
    std::fs::rename(&tmp, path)?;

    tracing::info!(
        path = %path.display(),
        records = records.len(),
        bytes = bytes.len(),
        "Wrote snapshot"
    );
    Ok(())
}

/// Read a snapshot back, byte-for-byte as written.
///
/// A missing file is [`Error::DataNotFound`]; a corrupt file or one written
/// by a different format version is [`Error::Snapshot`]. The version is
/// checked before any record decoding, so a mismatched file always reports
/// its version even when its record layout no longer decodes.
pub fn read(path: &Path) -> Result<Vec<Record>> {
    if !path.is_file() {
        return Err(Error::DataNotFound(path.to_path_buf()));
    }

    let file = std::fs::File::open(path)?;
    let mut reader = std::io::BufReader::new(file);

    let version: u32 = bincode::deserialize_from(&mut reader)?;
    if version != SNAPSHOT_VERSION {
        return Err(Error::Snapshot(Box::new(bincode::ErrorKind::Custom(
            format!(
                "{} has format version {} (supported: {}); run the extractor again",
                path.display(),
                version,
                SNAPSHOT_VERSION
            ),
        ))));
    }

    let records: Vec<Record> = bincode::deserialize_from(&mut reader)?;

    tracing::debug!(path = %path.display(), records = records.len(), "Read snapshot");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::Service;
    use chrono::{TimeZone, Utc};
    use tempfile::TempDir;

    fn sample_records() -> Vec<Record> {
        vec![
            Record {
                rowid: 1,
                chat_id: "7".to_string(),
                text: "hello there".to_string(),
                sent_at: Utc.with_ymd_and_hms(2023, 1, 1, 0, 0, 0).unwrap(),
                is_from_me: false,
                service: Service::IMessage,
            },
            Record {
                rowid: 2,
                chat_id: "7".to_string(),
                text: "señal 🎉".to_string(),
                sent_at: Utc.timestamp_opt(1672531200, 123_456_789).unwrap(),
                is_from_me: true,
                service: Service::Sms,
            },
        ]
    }

    #[test]
    fn test_round_trip_is_exact() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.bin");
        let records = sample_records();

        write(&path, &records).unwrap();
        let restored = read(&path).unwrap();
        assert_eq!(restored, records);
    }

    #[test]
    fn test_write_replaces_previous() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.bin");

        write(&path, &sample_records()).unwrap();
        write(&path, &sample_records()[..1]).unwrap();
        assert_eq!(read(&path).unwrap().len(), 1);
        assert!(!path.with_extension("bin.tmp").exists());
    }

    #[test]
    fn test_missing_snapshot() {
        let dir = TempDir::new().unwrap();
        let err = read(&dir.path().join("messages.bin")).unwrap_err();
        assert!(matches!(err, Error::DataNotFound(_)));
    }

    #[test]
    fn test_corrupt_snapshot() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.bin");
        std::fs::write(&path, [0xff, 0x00, 0x13]).unwrap();
        let err = read(&path).unwrap_err();
        assert!(matches!(err, Error::Snapshot(_)));
    }

    #[test]
    fn test_version_mismatch() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.bin");
        let bytes = bincode::serialize(&SnapshotRef {
            version: SNAPSHOT_VERSION + 1,
            records: &[],
        })
        .unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = read(&path).unwrap_err();
        match err {
            Error::Snapshot(e) => assert!(e.to_string().contains("format version")),
            other => panic!("expected snapshot error, got {other:?}"),
        }
    }

    #[test]
    fn test_version_checked_before_records() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("messages.bin");
        // A future format: bumped version, record layout reshaped so the
        // payload no longer decodes as today's records.
        let bytes = bincode::serialize(&(SNAPSHOT_VERSION + 1, vec![1u64, 2, 3])).unwrap();
        std::fs::write(&path, bytes).unwrap();

        let err = read(&path).unwrap_err();
        match err {
            Error::Snapshot(e) => {
                let msg = e.to_string();
                assert!(msg.contains("format version 2"));
                assert!(msg.contains("run the extractor again"));
            }
            other => panic!("expected snapshot error, got {other:?}"),
        }
    }
}
