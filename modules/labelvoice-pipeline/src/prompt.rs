//! Instruction text sent with every label image.
//!
//! The trailing section heading must stay in sync with
//! [`crate::summary::SUMMARY_KEYWORD`]; `prompt_requests_keyword_section`
//! guards that coupling.

use crate::summary::SUMMARY_KEYWORD;

/// Bump whenever the wording below changes.
pub const PROMPT_VERSION: &str = "2024-06-zh-TW-v1";

pub fn build_prompt() -> String {
    format!(
        "這是一張商品標籤的圖片，請協助我判讀以下資訊，並在最後加上一段「{kw}」，適合以語音形式朗讀：

1. 判斷這是食品或藥品。
2. 清楚列出以下項目：
   - 類型（食品 / 藥品）
   - 中文名稱（如果有）
   - 主要成分：每項成分的功能（例如防腐、調味、營養）以及可能注意事項（例如過敏原、對特定族群不建議）
3. 使用不超過國中程度的中文描述，適合長者與一般民眾閱讀
4. **在最後加入一段「{kw}」**，用簡短白話總結這項產品的核心資訊（例如用途、成分關鍵點、誰應避免）

只輸出清楚段落文字，無需任何多餘說明。",
        kw = SUMMARY_KEYWORD
    )
}
