//! Ingredient reference table.
//!
//! Read-only at run time. Declaration order is significant: annotations are
//! produced in table order.

use std::collections::HashSet;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::LabelError;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngredientRecord {
    pub name: String,
    pub usage: String,
    pub risk: String,
}

/// Compiled-in table used when no override file is configured.
const BUILTIN: &[(&str, &str, &str)] = &[
    (
        "苯甲酸鈉",
        "防腐劑，抑制黴菌與細菌生長，延長保存期限。",
        "少數人可能過敏；與維生素C同時存在時可能產生微量苯。",
    ),
    (
        "己二烯酸鉀",
        "防腐劑，常見於醬料、果醬與乳酪。",
        "一般用量安全，極少數人皮膚或腸胃敏感。",
    ),
    (
        "阿斯巴甜",
        "人工甜味劑，甜度高、熱量低。",
        "苯酮尿症患者不可食用。",
    ),
    (
        "麩胺酸鈉",
        "調味劑（味精），增加鮮味。",
        "大量攝取可能口渴、頭暈；需限鈉者請留意。",
    ),
    (
        "亞硝酸鈉",
        "保色劑與防腐劑，常見於香腸、火腿等加工肉品。",
        "不宜大量攝取；嬰幼兒及孕婦應減少食用。",
    ),
    (
        "焦糖色素",
        "著色劑，讓食品呈現褐色。",
        "一般用量安全，部分種類含微量副產物。",
    ),
    (
        "乙醯胺酚",
        "止痛、退燒。",
        "肝功能不佳或每日飲酒者請小心使用，勿超過建議劑量。",
    ),
    (
        "咖啡因",
        "提神，有些止痛藥也會添加。",
        "心悸、失眠、孕婦及高血壓患者應限制攝取。",
    ),
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IngredientTable {
    records: Vec<IngredientRecord>,
}

impl IngredientTable {
    pub fn builtin() -> Self {
        Self {
            records: BUILTIN
                .iter()
                .map(|(name, usage, risk)| IngredientRecord {
                    name: name.to_string(),
                    usage: usage.to_string(),
                    risk: risk.to_string(),
                })
                .collect(),
        }
    }

    /// Build a table, rejecting blank or duplicate names.
    pub fn new(records: Vec<IngredientRecord>) -> Result<Self, LabelError> {
        let mut seen = HashSet::new();
        for record in &records {
            if record.name.trim().is_empty() {
                return Err(LabelError::IngredientTable(
                    "ingredient name must not be empty".to_string(),
                ));
            }
            if !seen.insert(record.name.as_str()) {
                return Err(LabelError::IngredientTable(format!(
                    "duplicate ingredient '{}'",
                    record.name
                )));
            }
        }
        Ok(Self { records })
    }

    /// Parse a JSON array of `{name, usage, risk}` records.
    pub fn from_json(json: &str) -> Result<Self, LabelError> {
        let records: Vec<IngredientRecord> = serde_json::from_str(json)
            .map_err(|e| LabelError::IngredientTable(format!("invalid JSON: {e}")))?;
        Self::new(records)
    }

    pub fn load(path: &Path) -> Result<Self, LabelError> {
        let json = std::fs::read_to_string(path).map_err(|e| {
            LabelError::IngredientTable(format!("failed to read {}: {e}", path.display()))
        })?;
        let table = Self::from_json(&json)?;
        info!(path = %path.display(), entries = table.len(), "Loaded ingredient table");
        Ok(table)
    }

    /// Load from `path` when given, otherwise the compiled-in table.
    pub fn load_or_builtin(path: Option<&Path>) -> Result<Self, LabelError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::builtin()),
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &IngredientRecord> {
        self.records.iter()
    }

    pub fn get(&self, name: &str) -> Option<&IngredientRecord> {
        self.records.iter().find(|r| r.name == name)
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn builtin_table_is_valid() {
        let builtin = IngredientTable::builtin();
        assert!(IngredientTable::new(builtin.records.clone()).is_ok());
        assert!(builtin.get("苯甲酸鈉").is_some());
    }

    #[test]
    fn from_json_keeps_declaration_order() {
        let table = IngredientTable::from_json(
            r#"[{"name":"乙","usage":"u2","risk":"r2"},{"name":"甲","usage":"u1","risk":"r1"}]"#,
        )
        .unwrap();
        let names: Vec<_> = table.iter().map(|r| r.name.as_str()).collect();
        assert_eq!(names, vec!["乙", "甲"]);
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let result = IngredientTable::from_json(
            r#"[{"name":"甲","usage":"","risk":""},{"name":"甲","usage":"","risk":""}]"#,
        );
        assert!(matches!(result, Err(LabelError::IngredientTable(_))));
    }

    #[test]
    fn blank_names_are_rejected() {
        let result = IngredientTable::from_json(r#"[{"name":"  ","usage":"","risk":""}]"#);
        assert!(result.is_err());
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"[{{"name":"檸檬酸","usage":"酸味劑","risk":"少量無虞"}}]"#).unwrap();

        let table = IngredientTable::load_or_builtin(Some(file.path())).unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table.get("檸檬酸").unwrap().usage, "酸味劑");
    }

    #[test]
    fn missing_file_is_an_error() {
        let result = IngredientTable::load(Path::new("/nonexistent/ingredients.json"));
        assert!(matches!(result, Err(LabelError::IngredientTable(_))));
    }
}
