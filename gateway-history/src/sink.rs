use std::path::Path;

use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

use crate::error::HistoryError;
use crate::record::HistoryRecord;

/// Append-only JSONL sink. Opaque local store: layout, rotation and
/// retention are left to whoever operates the file (spec §6). One `File`
/// handle, serialized by a mutex, so concurrent requests don't interleave
/// partial lines.
pub struct HistoryLog {
    file: Mutex<tokio::fs::File>,
}

impl HistoryLog {
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, HistoryError> {
        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)
            .await
            .map_err(HistoryError::Open)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    pub async fn append(&self, record: &HistoryRecord) -> Result<(), HistoryError> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');

        let mut file = self.file.lock().await;
        file.write_all(&line).await.map_err(HistoryError::Write)?;
        file.flush().await.map_err(HistoryError::Write)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Source;

    #[tokio::test]
    async fn appended_records_round_trip_as_jsonl() {
        let dir = std::env::temp_dir().join(format!("gateway-history-test-{}", std::process::id()));
        tokio::fs::create_dir_all(&dir).await.unwrap();
        let path = dir.join("history.jsonl");

        let log = HistoryLog::open(&path).await.unwrap();
        log.append(&HistoryRecord::new(
            "req-1",
            "blog",
            "SELECT 1",
            Some(1),
            Some(5),
            true,
            None,
            Source::Manual,
        ))
        .await
        .unwrap();
        log.append(&HistoryRecord::new(
            "req-2",
            "blog",
            "SELECT * FROM posts",
            None,
            None,
            false,
            Some("unsafe_sql".to_owned()),
            Source::Nl,
        ))
        .await
        .unwrap();

        let contents = tokio::fs::read_to_string(&path).await.unwrap();
        let lines: Vec<&str> = contents.lines().collect();
        assert_eq!(lines.len(), 2);

        let first: HistoryRecord = serde_json::from_str(lines[0]).unwrap();
        assert_eq!(first.request_id, "req-1");
        assert!(first.success);

        let second: HistoryRecord = serde_json::from_str(lines[1]).unwrap();
        assert_eq!(second.source, Source::Nl);
        assert_eq!(second.error_kind.as_deref(), Some("unsafe_sql"));

        tokio::fs::remove_dir_all(&dir).await.unwrap();
    }
}
