//! 上游原始表格模型
//!
//! 不同数据源返回的列名各不相同（中文、英文、缩写），
//! 因此行数据保持为 列名 -> 原始值 的有序映射，由归一化层负责解析

use serde::Serialize;
use serde_json::{Map, Value};

/// 原始单行数据
///
/// 列顺序与上游返回顺序一致（依赖 serde_json 的 preserve_order）
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct RawRow(Map<String, Value>);

impl RawRow {
    pub fn new() -> Self {
        Self(Map::new())
    }

    /// 追加一列（同名列会覆盖原值，但保留原位置）
    pub fn insert(&mut self, column: impl Into<String>, value: impl Into<Value>) {
        self.0.insert(column.into(), value.into());
    }

    /// 构造器风格的 insert
    pub fn with(mut self, column: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(column, value);
        self
    }

    pub fn get(&self, column: &str) -> Option<&Value> {
        self.0.get(column)
    }

    /// 按列顺序遍历
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    pub fn columns(&self) -> impl Iterator<Item = &String> {
        self.0.keys()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl From<Map<String, Value>> for RawRow {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

/// 原始表格
///
/// 列清单取自首次出现的顺序，各行的列集合不要求一致
#[derive(Debug, Clone, Default, Serialize)]
pub struct RawTable {
    columns: Vec<String>,
    rows: Vec<RawRow>,
}

impl RawTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// 追加一行，并登记此前未见过的列名
    pub fn push(&mut self, row: RawRow) {
        for column in row.columns() {
            if !self.columns.iter().any(|c| c == column) {
                self.columns.push(column.clone());
            }
        }
        self.rows.push(row);
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[RawRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl FromIterator<RawRow> for RawTable {
    fn from_iter<I: IntoIterator<Item = RawRow>>(iter: I) -> Self {
        let mut table = RawTable::new();
        for row in iter {
            table.push(row);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_row_keeps_insertion_order() {
        let row = RawRow::new()
            .with("最新价", "3500")
            .with("合约代码", "RB2501")
            .with("volume", 12);

        let columns: Vec<&String> = row.columns().collect();
        assert_eq!(columns, vec!["最新价", "合约代码", "volume"]);
        assert_eq!(row.get("volume"), Some(&json!(12)));
    }

    #[test]
    fn test_table_collects_columns_across_rows() {
        let table: RawTable = vec![
            RawRow::new().with("symbol", "CU2501").with("trade", "75000"),
            RawRow::new().with("symbol", "AL2501").with("position", "1000"),
        ]
        .into_iter()
        .collect();

        assert_eq!(table.len(), 2);
        assert_eq!(table.columns(), &["symbol", "trade", "position"]);
        assert!(!table.is_empty());
        assert!(RawTable::new().is_empty());
    }
}
