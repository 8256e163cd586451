//! The instruction sent with every entry sheet.

/// Asks for 15 questions (5 sections x 3) as a JSON array using the sheet's
/// column labels as keys.
pub const QUESTION_PROMPT: &str = r#"添付されたエントリーシートを読み取り、面接官用の質問リストを作成してください。
出力は必ず以下のJSON形式のリストで返してください。

[
  {
    "セクション": "学業・ゼミ・研究",
    "メイン質問": "...",
    "深掘り質問": "...",
    "評価の着眼点": "..."
  },
  ...
]

【制約事項】
1. セクションは必ず以下の5つに分類し、各3問ずつ作成してください：
   「学業・ゼミ・研究」「学業以外（インターン）」「周囲を巻き込んだ経験」「志望動機」「5年後の姿」
2. 評価の着眼点は、具体的かつ客観的な指標を提示してください。
"#;

#[cfg(test)]
mod tests {
    use super::*;
    use esprobe_core::record::{
        EVALUATION_CRITERIA_LABEL, MAIN_QUESTION_LABEL, PROBE_QUESTION_LABEL, SECTION_LABEL,
    };
    use esprobe_core::Section;

    #[test]
    fn prompt_names_every_key_and_section() {
        for key in [
            SECTION_LABEL,
            MAIN_QUESTION_LABEL,
            PROBE_QUESTION_LABEL,
            EVALUATION_CRITERIA_LABEL,
        ] {
            assert!(QUESTION_PROMPT.contains(key), "missing key {key}");
        }
        for section in Section::ALL {
            assert!(QUESTION_PROMPT.contains(section.label()), "missing {section}");
        }
    }
}
