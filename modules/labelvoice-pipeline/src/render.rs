//! HTML report rendering.
//!
//! One card per outcome: display text with ingredient highlights, an
//! expandable entry per matched ingredient, the narration (or a notice when
//! it is unavailable) and the error with its raw payload. Everything shown
//! comes straight from the outcome fields.

use base64::Engine;

use labelvoice_common::{
    HighlightSpan, IngredientAnnotation, PipelineError, PipelineOptions, PipelineOutcome,
    SynthesisResult,
};

/// Render a full report page for a batch.
pub fn render_report(outcomes: &[PipelineOutcome], options: &PipelineOptions) -> String {
    let mut cards = String::new();

    if outcomes.is_empty() {
        cards.push_str(r#"<p class="empty">尚未上傳任何圖片。</p>"#);
    }

    for outcome in outcomes {
        cards.push_str(&render_card(outcome, options));
    }

    build_page("標籤解讀結果", options.font_size.css_px(), &cards)
}

/// Render one outcome as its own page, for sharing a single label.
pub fn render_card_page(outcome: &PipelineOutcome, options: &PipelineOptions) -> String {
    build_page(
        &outcome.image_name,
        options.font_size.css_px(),
        &render_card(outcome, options),
    )
}

/// Render one outcome as a standalone card fragment.
pub fn render_card(outcome: &PipelineOutcome, options: &PipelineOptions) -> String {
    let body = if outcome.has_text() {
        let text = if options.highlight_ingredients {
            highlight_html(&outcome.display_text, &outcome.highlights, &outcome.annotations)
        } else {
            html_escape(&outcome.display_text)
        };
        format!(
            r#"<h3>📝 成分說明</h3>
    <div class="display-text">{text}</div>
    {details}
    <h3>🔈 總結語音</h3>
    <p class="summary">{summary}</p>
    {audio}"#,
            details = render_details(&outcome.annotations),
            summary = html_escape(&outcome.summary_text),
            audio = render_audio(outcome.audio.as_ref()),
        )
    } else {
        String::new()
    };

    let error = outcome
        .error
        .as_ref()
        .filter(|e| !matches!(e, PipelineError::SynthesisFailure { .. }))
        .map(render_error)
        .unwrap_or_default();

    format!(
        r#"<div class="label-card">
    <h2>{number}. {name}</h2>
    {error}{body}
</div>"#,
        number = outcome.index + 1,
        name = html_escape(&outcome.image_name),
    )
}

/// Wrap highlighted ranges in `<mark>` with the ingredient notes as a tooltip.
///
/// Overlapping spans: the earliest (then longest) wins; spans starting inside
/// an already-marked range are skipped.
pub fn highlight_html(
    text: &str,
    highlights: &[HighlightSpan],
    annotations: &[IngredientAnnotation],
) -> String {
    let mut spans: Vec<&HighlightSpan> = highlights.iter().collect();
    spans.sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));

    let mut out = String::with_capacity(text.len() + spans.len() * 48);
    let mut cursor = 0;

    for span in spans {
        let Some(annotation) = annotations.get(span.annotation) else {
            continue;
        };
        if span.start < cursor || span.end > text.len() {
            continue;
        }
        let (Some(before), Some(marked)) =
            (text.get(cursor..span.start), text.get(span.start..span.end))
        else {
            continue;
        };

        out.push_str(&html_escape(before));
        out.push_str(&format!(
            r#"<mark class="ingredient" title="{usage}｜{risk}">{marked}</mark>"#,
            usage = html_escape(&annotation.usage),
            risk = html_escape(&annotation.risk),
            marked = html_escape(marked),
        ));
        cursor = span.end;
    }

    out.push_str(&html_escape(&text[cursor..]));
    out
}

fn render_details(annotations: &[IngredientAnnotation]) -> String {
    if annotations.is_empty() {
        return String::new();
    }

    let entries: String = annotations
        .iter()
        .map(|a| {
            format!(
                r#"<details><summary>{name}</summary><p>用途：{usage}</p><p>注意：{risk}</p></details>"#,
                name = html_escape(&a.name),
                usage = html_escape(&a.usage),
                risk = html_escape(&a.risk),
            )
        })
        .collect();

    format!(r#"<div class="ingredients"><h4>成分小百科</h4>{entries}</div>"#)
}

fn render_audio(audio: Option<&SynthesisResult>) -> String {
    match audio {
        Some(SynthesisResult::Audio { bytes, mime_type }) => format!(
            r#"<audio controls src="data:{mime};base64,{data}"></audio>"#,
            mime = html_escape(mime_type),
            data = base64::engine::general_purpose::STANDARD.encode(bytes),
        ),
        Some(SynthesisResult::SynthesisFailure { .. }) => format!(
            r#"<p class="notice">{}</p>"#,
            html_escape(
                &PipelineError::SynthesisFailure {
                    cause: String::new()
                }
                .user_message()
            )
        ),
        None => String::new(),
    }
}

fn render_error(error: &PipelineError) -> String {
    let diagnostic = error
        .diagnostic()
        .map(|payload| {
            let pretty =
                serde_json::to_string_pretty(payload).unwrap_or_else(|_| payload.to_string());
            format!(
                r#"<h4>🔍 API 回傳內容</h4><pre class="diagnostic">{}</pre>"#,
                html_escape(&pretty)
            )
        })
        .unwrap_or_default();

    format!(
        r#"<div class="error">❌ {message}{diagnostic}</div>"#,
        message = html_escape(&error.user_message()),
    )
}

fn build_page(title: &str, font_px: u32, content: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="zh-Hant-TW">
<head>
<meta charset="utf-8">
<meta name="viewport" content="width=device-width, initial-scale=1">
<title>{title} | 長者友善標籤小幫手</title>
<style>
*{{margin:0;padding:0;box-sizing:border-box;}}
body{{font-family:"Noto Sans TC","PingFang TC","Microsoft JhengHei",sans-serif;font-size:{font_px}px;line-height:1.7;color:#1a1a1a;background:#fafafa;}}
.header{{background:#1a1a1a;color:#fff;padding:12px 24px;}}
.container{{max-width:860px;margin:0 auto;padding:24px;}}
.label-card{{background:#fff;border:1px solid #e0e0e0;border-radius:8px;padding:20px;margin-bottom:20px;}}
.label-card h2{{font-size:1.1em;margin-bottom:12px;}}
.label-card h3{{font-size:1em;margin:16px 0 8px;}}
.display-text{{white-space:pre-wrap;}}
mark.ingredient{{background:#fff3c4;border-bottom:2px dotted #e65100;cursor:help;}}
.ingredients{{margin-top:12px;padding-top:12px;border-top:1px solid #eee;}}
.ingredients h4{{font-size:0.9em;color:#666;margin-bottom:6px;}}
details{{margin-bottom:6px;}}
details summary{{cursor:pointer;font-weight:600;}}
.summary{{background:#e8f5e9;padding:12px;border-radius:6px;white-space:pre-wrap;}}
audio{{width:100%;margin-top:8px;}}
.notice{{color:#795548;background:#fff8e1;padding:8px 12px;border-radius:4px;margin-top:8px;}}
.error{{color:#c62828;background:#fce4ec;padding:12px;border-radius:6px;}}
.diagnostic{{font-size:0.7em;white-space:pre-wrap;margin-top:8px;color:#333;}}
.empty{{color:#888;text-align:center;padding:40px;}}
</style>
</head>
<body>
<div class="header"><h1>👵 長者友善標籤小幫手</h1></div>
<div class="container">{content}</div>
</body>
</html>"#,
        title = html_escape(title),
    )
}

fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}
