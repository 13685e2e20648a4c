use std::collections::HashMap;

use crate::domain::entity::table::TableError;
use crate::domain::entity::value::Value;

/// 1行のデータを表現する
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    /// カラム名と値のマッピング
    pub values: HashMap<String, Value>,
}

impl Row {
    /// 新しい空の行を作成する
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// カラム名と値のペアから新しい行を作成する
    pub fn from_values(values: HashMap<String, Value>) -> Self {
        Self { values }
    }

    /// 特定のカラムの値を取得する
    pub fn get(&self, column_name: &str) -> Option<&Value> {
        self.values.get(column_name)
    }

    /// 大文字小文字を区別せずにカラムの値を取得する
    pub fn get_ignore_case(&self, column_name: &str) -> Option<&Value> {
        self.values
            .iter()
            .find(|(name, _)| name.eq_ignore_ascii_case(column_name))
            .map(|(_, value)| value)
    }

    /// 特定のカラムの値を設定する
    pub fn set(&mut self, column_name: impl Into<String>, value: Value) {
        self.values.insert(column_name.into(), value);
    }

    /// 指定したカラム順の値のリストを返す（存在しないカラムはNULL）
    pub fn values_in(&self, columns: &[String]) -> Vec<Value> {
        columns
            .iter()
            .map(|c| self.values.get(c).cloned().unwrap_or(Value::Null))
            .collect()
    }
}

impl Default for Row {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Row {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
        }
    }
}

/// 1つのソース（テーブル）から取得した行の集合
#[derive(Debug, Clone, PartialEq)]
pub struct RowSet {
    /// 取得元のソース識別子
    pub source: String,

    /// ソースが返したカラム名（出現順）
    pub columns: Vec<String>,

    pub rows: Vec<Row>,
}

impl RowSet {
    pub fn new(source: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            source: source.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// JSONオブジェクトのリストから行セットを作成する
    ///
    /// カラムは最初に現れた順に並ぶ。オブジェクト以外の要素はエラーになる。
    pub fn from_json_rows(
        source: impl Into<String>,
        rows: &[serde_json::Value],
    ) -> Result<Self, TableError> {
        let mut row_set = RowSet::new(source, Vec::new());

        for (index, item) in rows.iter().enumerate() {
            let object = item.as_object().ok_or_else(|| TableError::MalformedRow {
                table: row_set.source.clone(),
                index,
            })?;

            let mut row = Row::new();
            for (key, value) in object {
                if !row_set.columns.contains(key) {
                    row_set.columns.push(key.clone());
                }
                row.set(key.clone(), Value::from_json(value));
            }
            row_set.add_row(row);
        }

        Ok(row_set)
    }

    /// 行を追加する
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// カラム名を小文字に正規化する
    pub fn normalize_columns(&mut self) {
        let rows = std::mem::take(&mut self.rows);
        let (columns, rows) = normalize_columns(&self.columns, rows);
        self.columns = columns;
        self.rows = rows;
    }

    /// すべての行にソース識別子のカラムを付与する
    pub fn tag_source(&mut self, column: &str) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        let source = Value::Text(self.source.clone());
        for row in &mut self.rows {
            row.set(column, source.clone());
        }
    }

    /// カラム順を保ったJSONオブジェクトのリストに変換する
    pub fn to_json_rows(&self) -> Vec<serde_json::Value> {
        self.rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for column in &self.columns {
                    let value = row.get(column).map_or(serde_json::Value::Null, Value::to_json);
                    obj.insert(column.clone(), value);
                }
                serde_json::Value::Object(obj)
            })
            .collect()
    }
}

/// カラム名を小文字化し、衝突したカラムを1つにまとめる
///
/// まとめたカラムは最初の位置に置かれ、各行では最初のNULLでない値が残る。
pub(crate) fn normalize_columns(columns: &[String], rows: Vec<Row>) -> (Vec<String>, Vec<Row>) {
    let mut normalized: Vec<String> = Vec::with_capacity(columns.len());
    for column in columns {
        let lower = column.to_lowercase();
        if !normalized.contains(&lower) {
            normalized.push(lower);
        }
    }

    let rows = rows
        .into_iter()
        .map(|row| {
            let mut values: HashMap<String, Value> = HashMap::with_capacity(row.values.len());
            // 元のカラム順で処理し、衝突時の優先順位を決定的にする
            let ordered = columns
                .iter()
                .filter_map(|c| row.values.get(c).map(|v| (c, v)))
                .chain(row.values.iter().filter(|(c, _)| !columns.contains(*c)));
            for (column, value) in ordered {
                let slot = values.entry(column.to_lowercase()).or_insert(Value::Null);
                if slot.is_null() {
                    *slot = value.clone();
                }
            }
            Row::from_values(values)
        })
        .collect();

    (normalized, rows)
}
