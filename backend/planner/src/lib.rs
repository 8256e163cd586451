pub mod generator;
pub mod parser;
pub mod prompt;
pub mod providers;

pub use generator::{LayoutPolicy, QuestionGenerator};
pub use parser::{check_layout, parse_response};
pub use prompt::QUESTION_PROMPT;
