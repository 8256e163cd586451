use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

use esprobe_core::{CellEdit, Document, EsprobeError, QuestionTable, Record, Result};

/// State of one user's interaction: the uploaded entry sheet and the
/// question table generated from it.
#[derive(Debug)]
pub struct Session {
    id: Uuid,
    created_at: DateTime<Utc>,
    document: Option<Document>,
    table: Option<QuestionTable>,
    generating: Arc<AtomicBool>,
    last_active: Mutex<Instant>,
}

/// Serializable overview for listings and status endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSummary {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub document: Option<String>,
    pub rows: Option<usize>,
    pub generating: bool,
}

impl Session {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            document: None,
            table: None,
            generating: Arc::new(AtomicBool::new(false)),
            last_active: Mutex::new(Instant::now()),
        }
    }

    /// Record that a request used this session.
    pub fn touch(&self) {
        *self.last_active.lock().unwrap_or_else(|e| e.into_inner()) = Instant::now();
    }

    /// Time since the last request used this session.
    pub fn idle_for(&self) -> Duration {
        self.last_active
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .elapsed()
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Attach a new upload. An existing table stays until the next generation.
    pub fn attach_document(&mut self, document: Document) {
        info!(session = %self.id, file = %document.file_name(), bytes = document.len(), "Document attached");
        self.document = Some(document);
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    /// Mark a generation as running. Fails if one already is.
    ///
    /// The flag is cleared when the returned guard drops, whatever the outcome.
    pub fn begin_generation(&self) -> Result<GenerationGuard> {
        if self
            .generating
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(EsprobeError::SessionBusy);
        }
        debug!(session = %self.id, "Generation started");
        Ok(GenerationGuard {
            flag: Arc::clone(&self.generating),
        })
    }

    pub fn is_generating(&self) -> bool {
        self.generating.load(Ordering::Acquire)
    }

    /// Replace the table wholesale with a freshly generated one.
    pub fn install_table(&mut self, table: QuestionTable) {
        info!(session = %self.id, rows = table.len(), "Question table installed");
        self.table = Some(table);
        self.touch();
    }

    pub fn table(&self) -> Option<&QuestionTable> {
        self.table.as_ref()
    }

    pub fn require_table(&self) -> Result<&QuestionTable> {
        self.table.as_ref().ok_or(EsprobeError::NoTable)
    }

    pub fn apply_edit(&mut self, row: usize, edit: CellEdit) -> Result<&Record> {
        let table = self.table.as_mut().ok_or(EsprobeError::NoTable)?;
        table.apply_edit(row, edit)
    }

    /// Drop the document and table, as when a user starts over.
    pub fn clear(&mut self) {
        self.document = None;
        self.table = None;
    }

    pub fn summary(&self) -> SessionSummary {
        SessionSummary {
            id: self.id,
            created_at: self.created_at,
            document: self.document.as_ref().map(|d| d.file_name().to_string()),
            rows: self.table.as_ref().map(QuestionTable::len),
            generating: self.is_generating(),
        }
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Clears the session's busy flag on drop.
#[derive(Debug)]
pub struct GenerationGuard {
    flag: Arc<AtomicBool>,
}

impl Drop for GenerationGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table(n: usize) -> QuestionTable {
        QuestionTable::from_records(
            (0..n)
                .map(|i| Record::generated("志望動機", format!("Q{i}"), "P", "C"))
                .collect(),
        )
    }

    #[test]
    fn second_generation_is_rejected_while_first_runs() {
        let session = Session::new();
        let guard = session.begin_generation().unwrap();
        assert!(session.is_generating());
        assert!(matches!(
            session.begin_generation().unwrap_err(),
            EsprobeError::SessionBusy
        ));

        drop(guard);
        assert!(!session.is_generating());
        assert!(session.begin_generation().is_ok());
    }

    #[test]
    fn install_replaces_wholesale() {
        let mut session = Session::new();
        session.install_table(table(3));
        session.apply_edit(0, CellEdit::Rating("5".into())).unwrap();

        session.install_table(table(2));
        let t = session.table().unwrap();
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0).unwrap().rating, "");
    }

    #[test]
    fn edit_without_table_fails() {
        let mut session = Session::new();
        let err = session
            .apply_edit(0, CellEdit::ResponseNotes("x".into()))
            .unwrap_err();
        assert!(matches!(err, EsprobeError::NoTable));
    }

    #[test]
    fn touch_resets_idle_time() {
        let session = Session::new();
        std::thread::sleep(Duration::from_millis(20));
        assert!(session.idle_for() >= Duration::from_millis(20));

        session.touch();
        assert!(session.idle_for() < Duration::from_millis(20));
    }

    #[test]
    fn summary_reflects_state() {
        let mut session = Session::new();
        session.attach_document(Document::from_bytes("es.pdf", b"%PDF-".to_vec()).unwrap());
        session.install_table(table(15));

        let summary = session.summary();
        assert_eq!(summary.document.as_deref(), Some("es.pdf"));
        assert_eq!(summary.rows, Some(15));
        assert!(!summary.generating);

        session.clear();
        assert!(session.table().is_none());
        assert!(session.document().is_none());
    }
}
