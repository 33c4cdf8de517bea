//! Narration summary extraction.
//!
//! The model is asked (see [`crate::prompt`]) to end its answer with a section
//! headed by [`SUMMARY_KEYWORD`]. Extraction is a line scan over the raw text,
//! tolerant of numbering and markdown noise, that always yields something
//! speakable.

use std::sync::LazyLock;

use labelvoice_common::SummaryPolicy;
use regex::Regex;

/// Heading of the narration section. Shared with the prompt.
pub const SUMMARY_KEYWORD: &str = "總結說明";

/// Spoken when nothing usable can be extracted.
pub const FALLBACK_SUMMARY: &str = "這是一項含有多種成分的產品，請依照個人狀況酌量使用。";

/// Shorter results (ignoring whitespace) are treated as noise.
pub const MIN_SUMMARY_CHARS: usize = 10;

/// Upper bound on lines collected into one summary.
pub const MAX_SUMMARY_LINES: usize = 20;

// Enumeration ("4." "4、" "(4)" "4)"), bullets, heading hashes, quote marks
// and emphasis runs at the start of a line.
static LEADING_MARKERS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(?:\s*(?:#{1,6}|[-*•>_]|\d{1,3}[.、)）]|[(（]\d{1,3}[)）]))+\s*").unwrap()
});

// Markdown emphasis runs ("**", "__", "*__*"). Single characters are left alone.
static EMPHASIS: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[*_]{2,}").unwrap());

/// Extract the narration summary from raw interpretation text.
///
/// Never returns an empty string.
pub fn extract_summary(raw: &str, policy: SummaryPolicy) -> String {
    let candidate = match policy {
        SummaryPolicy::KeywordSection => keyword_section(raw),
        SummaryPolicy::LastParagraph => last_paragraph(raw),
    };

    candidate
        .filter(|text| meaningful_chars(text) >= MIN_SUMMARY_CHARS)
        .unwrap_or_else(|| FALLBACK_SUMMARY.to_string())
}

/// The first keyword line plus the non-blank lines directly after it.
fn keyword_section(raw: &str) -> Option<String> {
    let mut lines = raw.lines();
    let heading = lines.by_ref().find(|line| line.contains(SUMMARY_KEYWORD))?;

    let mut collected = vec![clean_heading(heading)];
    collected.extend(
        lines
            .map(str::trim)
            .take_while(|line| !line.is_empty())
            .take(MAX_SUMMARY_LINES - 1)
            .map(strip_emphasis),
    );

    Some(join_nonempty(collected))
}

/// The last block of consecutive non-blank lines.
fn last_paragraph(raw: &str) -> Option<String> {
    let mut paragraphs: Vec<Vec<&str>> = Vec::new();
    let mut current: Vec<&str> = Vec::new();

    for line in raw.lines().map(str::trim) {
        if line.is_empty() {
            if !current.is_empty() {
                paragraphs.push(std::mem::take(&mut current));
            }
        } else {
            current.push(line);
        }
    }
    if !current.is_empty() {
        paragraphs.push(current);
    }

    let last = paragraphs.pop()?;
    let mut lines = last.into_iter().take(MAX_SUMMARY_LINES);
    let mut collected = vec![clean_heading(lines.next()?)];
    collected.extend(lines.map(strip_emphasis));

    Some(join_nonempty(collected))
}

/// Strip leading list/heading markers and emphasis runs from a line.
fn clean_heading(line: &str) -> String {
    let plain = EMPHASIS.replace_all(line, "");
    LEADING_MARKERS.replace(&plain, "").trim().to_string()
}

fn strip_emphasis(line: &str) -> String {
    EMPHASIS.replace_all(line, "").trim().to_string()
}

fn join_nonempty(lines: Vec<String>) -> String {
    lines
        .into_iter()
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

fn meaningful_chars(text: &str) -> usize {
    text.chars().filter(|c| !c.is_whitespace()).count()
}

#[cfg(test)]
mod tests {
    use super::*;

    const KEYWORD: SummaryPolicy = SummaryPolicy::KeywordSection;
    const LAST: SummaryPolicy = SummaryPolicy::LastParagraph;

    #[test]
    fn numbered_keyword_line_and_following_line() {
        let raw = "1. 類型：食品\n2. 主要成分：糖\n\n4. 總結說明：這是測試。\n請注意過敏原。\n\n以上。";
        assert_eq!(
            extract_summary(raw, KEYWORD),
            "總結說明：這是測試。\n請注意過敏原。"
        );
    }

    #[test]
    fn no_keyword_returns_fallback() {
        let raw = "類型：藥品\n主要成分：乙醯胺酚，用於止痛退燒。";
        assert_eq!(extract_summary(raw, KEYWORD), FALLBACK_SUMMARY);
    }

    #[test]
    fn empty_input_returns_fallback() {
        assert_eq!(extract_summary("", KEYWORD), FALLBACK_SUMMARY);
        assert_eq!(extract_summary("   \n\n", LAST), FALLBACK_SUMMARY);
    }

    #[test]
    fn short_result_returns_fallback() {
        assert_eq!(extract_summary("## 總結說明\n\n好。", KEYWORD), FALLBACK_SUMMARY);
    }

    #[test]
    fn only_first_keyword_occurrence_starts_accumulation() {
        let raw = "總結說明：第一段的重點內容在這裡。\n補充說明一。\n\n總結說明：第二段不應出現。";
        let summary = extract_summary(raw, KEYWORD);
        assert_eq!(summary, "總結說明：第一段的重點內容在這裡。\n補充說明一。");
    }

    #[test]
    fn keyword_line_alone_yields_its_content() {
        let raw = "前言\n**總結說明：本產品含咖啡因，孕婦請避免。**\n\n後記";
        assert_eq!(
            extract_summary(raw, KEYWORD),
            "總結說明：本產品含咖啡因，孕婦請避免。"
        );
    }

    #[test]
    fn heading_noise_is_stripped() {
        for heading in [
            "### 4. **總結說明**",
            "- 總結說明",
            "（4）總結說明",
            "4、總結說明",
            "> **總結說明**",
        ] {
            let raw = format!("{heading}\n這項產品適合一般成人，過敏者請先詢問醫師。\n");
            let summary = extract_summary(&raw, KEYWORD);
            assert!(
                summary.starts_with("總結說明"),
                "{heading:?} gave {summary:?}"
            );
        }
    }

    #[test]
    fn following_lines_are_trimmed_and_lose_emphasis() {
        let raw = "4. 總結說明\n   這是一款**零食**，   \n  熱量偏高。  ";
        assert_eq!(
            extract_summary(raw, KEYWORD),
            "總結說明\n這是一款零食，\n熱量偏高。"
        );
    }

    #[test]
    fn accumulation_is_bounded() {
        let mut raw = String::from("總結說明：很長的段落開始了。\n");
        for i in 0..50 {
            raw.push_str(&format!("第{i}行內容\n"));
        }
        let summary = extract_summary(&raw, KEYWORD);
        assert_eq!(summary.lines().count(), MAX_SUMMARY_LINES);
    }

    #[test]
    fn mixed_emphasis_is_removed_in_one_pass() {
        assert_eq!(
            extract_summary("4. 總結說明：*__*本產品含防腐劑，過敏者請小心。", KEYWORD),
            "總結說明：本產品含防腐劑，過敏者請小心。"
        );
    }

    #[test]
    fn keyword_extraction_is_idempotent() {
        let raws = [
            "4. 總結說明：這是測試。\n請注意過敏原。\n",
            "沒有關鍵字的內容，只是一般敘述而已。",
            "### **總結說明**\n本產品含有阿斯巴甜，苯酮尿症患者不可食用。",
            "4. 總結說明：*__*本產品含防腐劑，過敏者請小心。",
            "**4. 總結說明**：請放陰涼處。\n__每日__不超過兩次。",
        ];
        for raw in raws {
            let once = extract_summary(raw, KEYWORD);
            assert_eq!(extract_summary(&once, KEYWORD), once);
            assert!(!once.contains("**") && !once.contains("__"), "{once}");
        }
    }

    #[test]
    fn last_paragraph_policy() {
        let raw = "類型：食品\n\n成分：糖、鹽\n\n- 這是一項含糖量高的零食，糖尿病患者請少吃。\n請存放於陰涼處。\n";
        assert_eq!(
            extract_summary(raw, LAST),
            "這是一項含糖量高的零食，糖尿病患者請少吃。\n請存放於陰涼處。"
        );
    }

    #[test]
    fn policies_disagree_on_trailing_text() {
        let raw = "4. 總結說明：本產品為止痛藥，請依照指示服用。\n\n如有疑問請洽藥師或醫師詢問相關問題。";
        assert_eq!(
            extract_summary(raw, KEYWORD),
            "總結說明：本產品為止痛藥，請依照指示服用。"
        );
        assert_eq!(extract_summary(raw, LAST), "如有疑問請洽藥師或醫師詢問相關問題。");
    }

    #[test]
    fn last_paragraph_extraction_is_idempotent() {
        let text = "這是一段已經整理好的摘要文字，長度足夠。";
        assert_eq!(extract_summary(text, LAST), text);
        assert_eq!(extract_summary("太短了", LAST), FALLBACK_SUMMARY);
        assert_eq!(extract_summary(FALLBACK_SUMMARY, LAST), FALLBACK_SUMMARY);
    }
}
