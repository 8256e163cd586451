//! The Generate action for one session.

use tracing::{info, warn};

use esprobe_core::{EsprobeError, Result};
use esprobe_planner::QuestionGenerator;

use crate::registry::SessionHandle;

/// Run a generation against the session's uploaded document.
///
/// The session lock is not held while the model is working, so the current
/// table can still be read and exported. The new table is installed only on
/// success; on failure the previous table, if any, is left as it was.
/// Returns the number of rows in the new table.
pub async fn generate_for_session(
    handle: &SessionHandle,
    generator: &QuestionGenerator,
) -> Result<usize> {
    let (session_id, document, _guard) = {
        let session = handle.read().await;
        let document = session.document().cloned().ok_or(EsprobeError::NoDocument)?;
        let guard = session.begin_generation()?;
        (session.id(), document, guard)
    };

    match generator.generate(&document).await {
        Ok(table) => {
            let rows = table.len();
            handle.write().await.install_table(table);
            info!(session = %session_id, rows, "Generate completed");
            Ok(rows)
        }
        Err(e) => {
            warn!(session = %session_id, error = %e, "Generate failed; table unchanged");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use anyhow::Result as AnyResult;
    use async_trait::async_trait;
    use esprobe_core::{
        CellEdit, Document, LlmProvider, LlmRequest, LlmResponse, QuestionTable, Record,
    };
    use esprobe_planner::providers::MockProvider;
    use tokio::sync::{Notify, RwLock};

    use crate::session::Session;

    const ONE_ROW: &str =
        r#"[{"セクション":"志望動機","メイン質問":"Q1","深掘り質問":"Q2","評価の着眼点":"C1"}]"#;

    fn handle_with_document() -> SessionHandle {
        let mut session = Session::new();
        session.attach_document(Document::from_bytes("es.pdf", b"%PDF-1.4".to_vec()).unwrap());
        Arc::new(RwLock::new(session))
    }

    fn generator(provider: impl LlmProvider + 'static) -> QuestionGenerator {
        QuestionGenerator::new(Arc::new(provider), "mock-model")
    }

    #[tokio::test]
    async fn success_installs_table() {
        let handle = handle_with_document();
        let rows = generate_for_session(&handle, &generator(MockProvider::new("mock").with_response(ONE_ROW)))
            .await
            .unwrap();
        assert_eq!(rows, 1);

        let session = handle.read().await;
        let record = session.table().unwrap().get(0).unwrap();
        assert_eq!(record.section, "志望動機");
        assert!(!session.is_generating());
    }

    #[tokio::test]
    async fn requires_document() {
        let handle: SessionHandle = Arc::new(RwLock::new(Session::new()));
        let err = generate_for_session(&handle, &generator(MockProvider::new("mock")))
            .await
            .unwrap_err();
        assert!(matches!(err, EsprobeError::NoDocument));
    }

    #[tokio::test]
    async fn failures_leave_previous_table() {
        let handle = handle_with_document();
        {
            let mut session = handle.write().await;
            session.install_table(QuestionTable::from_records(vec![Record::generated(
                "5年後の姿", "old", "P", "C",
            )]));
            session
                .apply_edit(0, CellEdit::ResponseNotes("keep me".into()))
                .unwrap();
        }
        let before = handle.read().await.table().cloned();

        let parse_fail = generator(MockProvider::new("mock").with_response("not json"));
        assert!(matches!(
            generate_for_session(&handle, &parse_fail).await.unwrap_err(),
            EsprobeError::Parse(_)
        ));

        let transport_fail = generator(MockProvider::new("mock").failing("timeout"));
        assert!(matches!(
            generate_for_session(&handle, &transport_fail).await.unwrap_err(),
            EsprobeError::Generation { .. }
        ));

        let session = handle.read().await;
        assert_eq!(session.table().cloned(), before);
        assert!(!session.is_generating());
    }

    /// Holds every call until released.
    struct GatedProvider {
        gate: Arc<Notify>,
        entered: Arc<Notify>,
    }

    #[async_trait]
    impl LlmProvider for GatedProvider {
        fn name(&self) -> &str {
            "gated"
        }

        async fn generate(&self, req: &LlmRequest) -> AnyResult<LlmResponse> {
            self.entered.notify_one();
            self.gate.notified().await;
            Ok(LlmResponse {
                content: ONE_ROW.to_string(),
                provider: "gated".into(),
                model: req.model.clone(),
                tokens_used: 0,
                latency_ms: 0,
            })
        }
    }

    #[tokio::test]
    async fn overlapping_generate_is_rejected() {
        let handle = handle_with_document();
        let gate = Arc::new(Notify::new());
        let entered = Arc::new(Notify::new());
        let gen = Arc::new(generator(GatedProvider {
            gate: Arc::clone(&gate),
            entered: Arc::clone(&entered),
        }));

        let first = {
            let handle = Arc::clone(&handle);
            let gen = Arc::clone(&gen);
            tokio::spawn(async move { generate_for_session(&handle, &gen).await })
        };
        entered.notified().await;

        // The table is still readable while the model works.
        assert!(handle.read().await.table().is_none());
        assert!(matches!(
            generate_for_session(&handle, &gen).await.unwrap_err(),
            EsprobeError::SessionBusy
        ));

        gate.notify_one();
        assert_eq!(first.await.unwrap().unwrap(), 1);
        assert!(!handle.read().await.is_generating());
    }
}
