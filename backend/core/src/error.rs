use thiserror::Error;

/// Top-level error type for the esprobe pipeline.
#[derive(Debug, Error)]
pub enum EsprobeError {
    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("generation failed ({provider}): {message}")]
    Generation { provider: String, message: String },

    #[error("could not parse model response: {0}")]
    Parse(String),

    #[error("spreadsheet export unavailable: {0}")]
    ExportCapability(String),

    #[error("export failed: {0}")]
    Export(String),

    #[error("invalid document: {0}")]
    InvalidDocument(String),

    #[error("invalid edit: {0}")]
    InvalidEdit(String),

    #[error("row {row} out of range (table has {len} rows)")]
    RowOutOfRange { row: usize, len: usize },

    #[error("no document has been uploaded")]
    NoDocument,

    #[error("no question table has been generated")]
    NoTable,

    #[error("a generation is already running for this session")]
    SessionBusy,

    #[error("session not found: {0}")]
    SessionNotFound(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl EsprobeError {
    pub fn generation(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Generation {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Message shown inline to the user at the point of the failed action.
    ///
    /// Service and parser details stay in `Display` (for logs); users get a
    /// generic sentence.
    pub fn user_message(&self) -> String {
        match self {
            Self::Configuration(_) => "APIキーが設定されていません。".to_string(),
            Self::Generation { .. } => {
                "質問リストの生成中にエラーが発生しました。時間をおいて再度お試しください。"
                    .to_string()
            }
            Self::Parse(_) => {
                "AIの応答を質問リストとして読み取れませんでした。再度生成してください。"
                    .to_string()
            }
            Self::ExportCapability(_) => "Excel出力は現在の環境では利用できません。".to_string(),
            Self::NoDocument => "PDFをアップロードしてください。".to_string(),
            Self::NoTable => "質問リストがまだ生成されていません。".to_string(),
            Self::SessionBusy => "質問リストを生成中です。完了までお待ちください。".to_string(),
            other => other.to_string(),
        }
    }

    /// Whether the failure should be surfaced as a warning rather than an error.
    pub fn is_warning(&self) -> bool {
        matches!(self, Self::ExportCapability(_))
    }
}

pub type Result<T, E = EsprobeError> = std::result::Result<T, E>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generation_user_message_hides_detail() {
        let err = EsprobeError::generation("gemini", "403 API key not valid: AIzaSecret");
        assert!(err.to_string().contains("403"));
        assert!(!err.user_message().contains("AIza"));
    }

    #[test]
    fn only_capability_errors_are_warnings() {
        assert!(EsprobeError::ExportCapability("missing".into()).is_warning());
        assert!(!EsprobeError::Parse("bad".into()).is_warning());
    }
}
