//! Ingredient matching against the reference table.

use labelvoice_common::{HighlightSpan, IngredientAnnotation, IngredientTable};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Annotations {
    /// One entry per matched table record, in table order.
    pub entries: Vec<IngredientAnnotation>,
    /// Every occurrence of every matched name, ordered by position
    /// (longer match first on ties). Spans may overlap.
    pub highlights: Vec<HighlightSpan>,
}

/// Case-sensitive substring match of every table name against `text`.
///
/// Names contained in other names are matched independently, so "糖" and
/// "焦糖色素" can both annotate the same region.
pub fn annotate(text: &str, table: &IngredientTable) -> Annotations {
    let mut annotations = Annotations::default();

    for record in table.iter() {
        if !text.contains(record.name.as_str()) {
            continue;
        }

        let annotation = annotations.entries.len();
        annotations.entries.push(IngredientAnnotation {
            name: record.name.clone(),
            usage: record.usage.clone(),
            risk: record.risk.clone(),
        });
        annotations.highlights.extend(
            text.match_indices(record.name.as_str())
                .map(|(start, name)| HighlightSpan {
                    start,
                    end: start + name.len(),
                    annotation,
                }),
        );
    }

    annotations
        .highlights
        .sort_by(|a, b| a.start.cmp(&b.start).then(b.end.cmp(&a.end)));
    annotations
}

#[cfg(test)]
mod tests {
    use super::*;
    use labelvoice_common::IngredientRecord;

    fn table(names: &[&str]) -> IngredientTable {
        IngredientTable::new(
            names
                .iter()
                .map(|name| IngredientRecord {
                    name: name.to_string(),
                    usage: format!("{name}的用途"),
                    risk: format!("{name}的注意事項"),
                })
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn single_match_reproduces_table_fields() {
        let builtin = IngredientTable::builtin();
        let text = "主要成分：麵粉、糖、苯甲酸鈉（防腐劑）。";
        let result = annotate(text, &builtin);

        let matches: Vec<_> = result
            .entries
            .iter()
            .filter(|e| e.name == "苯甲酸鈉")
            .collect();
        assert_eq!(matches.len(), 1);

        let record = builtin.get("苯甲酸鈉").unwrap();
        assert_eq!(matches[0].usage, record.usage);
        assert_eq!(matches[0].risk, record.risk);
    }

    #[test]
    fn repeated_name_is_one_entry_with_many_spans() {
        let text = "苯甲酸鈉是防腐劑。再次提醒：苯甲酸鈉。";
        let result = annotate(text, &table(&["苯甲酸鈉"]));

        assert_eq!(result.entries.len(), 1);
        assert_eq!(result.highlights.len(), 2);
        for span in &result.highlights {
            assert_eq!(&text[span.start..span.end], "苯甲酸鈉");
            assert_eq!(span.annotation, 0);
        }
    }

    #[test]
    fn entries_follow_table_order() {
        let text = "咖啡因、阿斯巴甜";
        let result = annotate(text, &table(&["阿斯巴甜", "咖啡因"]));
        let names: Vec<_> = result.entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["阿斯巴甜", "咖啡因"]);

        // Spans are positional regardless of table order.
        assert_eq!(result.highlights[0].annotation, 1);
        assert_eq!(result.highlights[1].annotation, 0);
    }

    #[test]
    fn overlapping_names_both_annotate() {
        let text = "含焦糖色素";
        let result = annotate(text, &table(&["糖", "焦糖色素"]));

        assert_eq!(result.entries.len(), 2);
        assert_eq!(result.highlights.len(), 2);
        // The longer span sorts first at equal or earlier start.
        assert_eq!(&text[result.highlights[0].start..result.highlights[0].end], "焦糖色素");
    }

    #[test]
    fn matching_is_case_sensitive() {
        let result = annotate("contains msg", &table(&["MSG"]));
        assert!(result.entries.is_empty());
        assert!(result.highlights.is_empty());
    }

    #[test]
    fn no_matches_yield_empty_annotations() {
        assert_eq!(annotate("純水", &IngredientTable::builtin()), Annotations::default());
    }
}
