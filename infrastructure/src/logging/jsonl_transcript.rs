//! JSONL room transcript.
//!
//! One line per [`TranscriptEntry`], stamped with the time it was written:
//!
//! ```text
//! {"at":"2025-03-01T10:00:00.120Z","kind":"applied","event":"argument-added","debateId":"d1","phase":"active","arguments":3}
//! ```

use chrono::{DateTime, SecondsFormat, Utc};
use debate_application::{SessionLogger, TranscriptEntry};
use debate_domain::DebateId;
use serde::Serialize;
use std::fs::{File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing::warn;

#[derive(Serialize)]
struct TranscriptLine<'a> {
    #[serde(serialize_with = "millis")]
    at: DateTime<Utc>,
    #[serde(flatten)]
    entry: &'a TranscriptEntry,
}

fn millis<S: serde::Serializer>(at: &DateTime<Utc>, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true))
}

/// Appends transcript entries to a file.
///
/// Entries without a debate are dropped when the transcript is scoped to
/// one debate with [`JsonlSessionLogger::for_debate`].
pub struct JsonlSessionLogger {
    writer: Mutex<BufWriter<File>>,
    path: PathBuf,
    debate: Option<DebateId>,
}

impl JsonlSessionLogger {
    /// Open the transcript, appending to an existing file and creating
    /// parent directories. Returns `None` (after a warning) when the file
    /// cannot be opened.
    pub fn open(path: impl AsRef<Path>) -> Option<Self> {
        let path = path.as_ref();
        match Self::open_file(path) {
            Ok(file) => Some(Self {
                writer: Mutex::new(BufWriter::new(file)),
                path: path.to_path_buf(),
                debate: None,
            }),
            Err(e) => {
                warn!("Could not open transcript {}: {}", path.display(), e);
                None
            }
        }
    }

    fn open_file(path: &Path) -> io::Result<File> {
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }
        OpenOptions::new().create(true).append(true).open(path)
    }

    /// Keep only entries about `debate_id`.
    pub fn for_debate(mut self, debate_id: DebateId) -> Self {
        self.debate = Some(debate_id);
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn write(&self, entry: &TranscriptEntry) -> io::Result<()> {
        let line = serde_json::to_string(&TranscriptLine {
            at: Utc::now(),
            entry,
        })?;
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| io::Error::other("transcript writer poisoned"))?;
        writeln!(writer, "{}", line)?;
        writer.flush()
    }
}

impl SessionLogger for JsonlSessionLogger {
    fn log(&self, entry: TranscriptEntry) {
        if let Some(debate) = &self.debate
            && entry.debate_id() != Some(debate)
        {
            return;
        }
        if let Err(e) = self.write(&entry) {
            warn!("Failed to write transcript entry: {}", e);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use debate_domain::{ResultsAggregator, RoomPhase};
    use std::fs;

    fn read_lines(path: &Path) -> Vec<serde_json::Value> {
        fs::read_to_string(path)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    fn applied(event: &'static str, debate_id: Option<&str>) -> TranscriptEntry {
        TranscriptEntry::Applied {
            event,
            debate_id: debate_id.map(DebateId::new),
            phase: RoomPhase::Active,
            arguments: 2,
        }
    }

    #[test]
    fn test_writes_one_stamped_line_per_entry() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("room.jsonl");
        let logger = JsonlSessionLogger::open(&path).unwrap();

        logger.log(applied("argument-added", Some("d1")));
        logger.log(TranscriptEntry::Effect {
            effect: "post-finalize",
            debate_id: DebateId::new("d1"),
        });

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["kind"], "applied");
        assert_eq!(records[0]["event"], "argument-added");
        assert_eq!(records[0]["debateId"], "d1");
        assert_eq!(records[0]["phase"], "active");
        assert!(records[0]["at"].as_str().unwrap().ends_with('Z'));
        assert_eq!(records[1]["kind"], "effect");
        assert_eq!(records[1]["effect"], "post-finalize");
    }

    #[test]
    fn test_scoped_transcript_keeps_one_debate() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("d1.jsonl");
        let logger = JsonlSessionLogger::open(&path)
            .unwrap()
            .for_debate(DebateId::new("d1"));

        logger.log(applied("reconnected", None));
        logger.log(applied("argument-added", Some("d2")));
        logger.log(applied("argument-added", Some("d1")));
        let session = debate_domain::DebateSession::new("d1", "AI vs Humans");
        let results = ResultsAggregator::default().aggregate(&session, &[]);
        logger.log(TranscriptEntry::results(Some(DebateId::new("d1")), &results));

        let records = read_lines(&path);
        assert_eq!(records.len(), 2);
        assert_eq!(records[0]["debateId"], "d1");
        assert_eq!(records[1]["kind"], "results");
        assert_eq!(records[1]["totals"]["B"], 10.0);
    }

    #[test]
    fn test_reopening_appends() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("append.jsonl");

        for _ in 0..2 {
            let logger = JsonlSessionLogger::open(&path).unwrap();
            logger.log(applied("join-requested", Some("d1")));
        }

        assert_eq!(read_lines(&path).len(), 2);
    }
}
