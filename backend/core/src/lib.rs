pub mod document;
pub mod error;
pub mod record;
pub mod table;
pub mod traits;

pub use document::{Document, PDF_MIME};
pub use error::{EsprobeError, Result};
pub use record::{Record, Section, COLUMN_LABELS, QUESTIONS_PER_SECTION};
pub use table::{normalize_rating, CellEdit, QuestionTable};
pub use traits::{GenerationConfig, LlmProvider, LlmRequest, LlmResponse};
