use std::collections::HashSet;
use std::hash::{Hash, Hasher};
use std::mem;

use itertools::Itertools;
use serde::Serialize;
use thiserror::Error;

use crate::domain::entity::row_set::{self, Row, RowSet};
use crate::domain::entity::value::Value;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TableError {
    #[error("Required columns not found: {}", .0.join(", "))]
    MissingColumns(Vec<String>),

    #[error("Row {index} from {table} is not an object")]
    MalformedRow { table: String, index: usize },
}

/// 複数のソースの行を連結した結果テーブル
#[derive(Debug, Clone, PartialEq)]
pub struct UnifiedTable {
    pub columns: Vec<String>,

    /// すべての行がすべてのカラムを持つ（欠けているセルはNULL）
    pub rows: Vec<Row>,
}

impl UnifiedTable {
    /// 空でない行セットを連結する
    ///
    /// 空でない行セットが1つもなければ `None` を返す。
    pub fn concat<I>(row_sets: I) -> Option<Self>
    where
        I: IntoIterator<Item = RowSet>,
    {
        let non_empty: Vec<RowSet> = row_sets.into_iter().filter(|rs| !rs.is_empty()).collect();
        if non_empty.is_empty() {
            return None;
        }

        let columns: Vec<String> = non_empty
            .iter()
            .flat_map(|rs| rs.columns.iter().cloned())
            .unique()
            .collect();

        let rows = non_empty
            .into_iter()
            .flat_map(|rs| rs.rows)
            .map(|mut row| {
                for column in &columns {
                    row.values.entry(column.clone()).or_insert(Value::Null);
                }
                row
            })
            .collect();

        Some(Self { columns, rows })
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
        let (columns, rows) = row_set::normalize_columns(&self.columns, rows);
        self.columns = columns;
        self.rows = rows;
    }

    /// 全行の指定カラムに同じ値を設定する
    pub fn fill_column(&mut self, column: &str, value: &Value) {
        if !self.columns.iter().any(|c| c == column) {
            self.columns.push(column.to_string());
        }
        for row in &mut self.rows {
            row.set(column, value.clone());
        }
    }

    /// 完全に一致する行を取り除く（最初の出現を残す）
    pub fn dedup(&mut self) {
        let mut seen = HashSet::with_capacity(self.rows.len());
        let keep: Vec<bool> = self
            .rows
            .iter()
            .map(|row| {
                let key: Vec<CellKey<'_>> = self
                    .columns
                    .iter()
                    .map(|c| CellKey(row.get(c).unwrap_or(&NULL)))
                    .collect();
                seen.insert(key)
            })
            .collect();
        drop(seen);

        let mut keep = keep.into_iter();
        self.rows.retain(|_| keep.next().unwrap_or(true));
    }

    /// 指定したカラムだけを指定順に残す
    ///
    /// カラム名は大文字小文字を区別せずに照合する。1つでも欠けていれば
    /// 部分的なテーブルは返さず、欠けているカラムを列挙したエラーを返す。
    pub fn project(&self, wanted: &[&str]) -> Result<Self, TableError> {
        let mut resolved = Vec::with_capacity(wanted.len());
        let mut missing = Vec::new();

        for name in wanted {
            match self.columns.iter().find(|c| c.eq_ignore_ascii_case(name)) {
                Some(column) => resolved.push(column.clone()),
                None => missing.push(name.to_string()),
            }
        }

        if !missing.is_empty() {
            return Err(TableError::MissingColumns(missing));
        }

        let rows = self
            .rows
            .iter()
            .map(|row| {
                wanted
                    .iter()
                    .zip(&resolved)
                    .map(|(name, column)| {
                        (name.to_string(), row.get(column).cloned().unwrap_or(Value::Null))
                    })
                    .collect::<Row>()
            })
            .collect();

        Ok(Self {
            columns: wanted.iter().map(|c| c.to_string()).collect(),
            rows,
        })
    }

    /// 表示用のビューに変換する
    pub fn to_view(&self) -> TableView {
        TableView {
            columns: self.columns.clone(),
            rows: self
                .rows
                .iter()
                .map(|row| row.values_in(&self.columns).iter().map(Value::to_json).collect())
                .collect(),
        }
    }
}

static NULL: Value = Value::Null;

/// 重複判定に使うセルのキー
///
/// 型が異なる値は等しくない。浮動小数点はビット列で比較するので NaN 同士は等しい。
#[derive(Debug, Clone, Copy)]
struct CellKey<'a>(&'a Value);

impl PartialEq for CellKey<'_> {
    fn eq(&self, other: &Self) -> bool {
        match (self.0, other.0) {
            (Value::Float(a), Value::Float(b)) => a.to_bits() == b.to_bits(),
            (a, b) => a == b,
        }
    }
}

impl Eq for CellKey<'_> {}

impl Hash for CellKey<'_> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        mem::discriminant(self.0).hash(state);
        match self.0 {
            Value::Integer(i) => i.hash(state),
            Value::Float(f) => f.to_bits().hash(state),
            Value::Text(s) => s.hash(state),
            Value::Boolean(b) => b.hash(state),
            Value::Timestamp(dt) => dt.hash(state),
            Value::Null => {}
        }
    }
}

/// 表示用のテーブル（列名と行ごとのセル配列）
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TableView {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn order_set(source: &str, columns: &[&str], rows: &[&[&str]]) -> RowSet {
        let mut rs = RowSet::new(source, columns.iter().map(|c| c.to_string()).collect());
        for values in rows {
            rs.add_row(columns.iter().copied().zip(values.iter().copied()).collect());
        }
        rs
    }

    #[test]
    fn concat_of_only_empty_sets_is_none() {
        let empty = RowSet::new("Order1", vec!["email".into()]);
        assert!(UnifiedTable::concat(vec![empty]).is_none());
        assert!(UnifiedTable::concat(Vec::<RowSet>::new()).is_none());
    }

    #[test]
    fn concat_unions_columns_and_fills_nulls() {
        let a = order_set("Order1", &["ordernumber", "email"], &[&["A-1", "x@example.com"]]);
        let b = order_set("Order2", &["ordernumber", "description"], &[&["B-1", "Desk"]]);

        let table = UnifiedTable::concat(vec![a, b]).unwrap();

        assert_eq!(table.columns, vec!["ordernumber", "email", "description"]);
        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[0].get("description"), Some(&Value::Null));
        assert_eq!(table.rows[1].get("email"), Some(&Value::Null));
    }

    #[test]
    fn project_matches_case_insensitively_in_requested_order() {
        let rs = order_set(
            "Order1",
            &["OrderDate", "SourceTable", "OrderNumber", "Description", "Email"],
            &[&["2024-01-02", "Order1", "A-1", "Chair", "x@example.com"]],
        );
        let table = UnifiedTable::concat(vec![rs]).unwrap();

        let projected = table
            .project(&["sourcetable", "ordernumber", "description", "orderdate"])
            .unwrap();

        assert_eq!(
            projected.columns,
            vec!["sourcetable", "ordernumber", "description", "orderdate"]
        );
        assert_eq!(
            projected.rows[0].values_in(&projected.columns),
            vec![
                Value::from("Order1"),
                Value::from("A-1"),
                Value::from("Chair"),
                Value::from("2024-01-02"),
            ]
        );
    }

    #[test]
    fn project_names_every_missing_column() {
        let rs = order_set("Order1", &["sourcetable", "ordernumber"], &[&["Order1", "A-1"]]);
        let table = UnifiedTable::concat(vec![rs]).unwrap();

        let err = table
            .project(&["sourcetable", "ordernumber", "description", "orderdate"])
            .unwrap_err();

        assert_eq!(
            err,
            TableError::MissingColumns(vec!["description".into(), "orderdate".into()])
        );
        assert_eq!(err.to_string(), "Required columns not found: description, orderdate");
    }

    #[test]
    fn dedup_keeps_rows_that_differ_in_any_field() {
        let rs = order_set(
            "Table1",
            &["firstname", "lastname"],
            &[&["Ada", "Lovelace"], &["Ada", "Lovelace"], &["Ada", "Byron"]],
        );
        let mut table = UnifiedTable::concat(vec![rs]).unwrap();

        table.dedup();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("lastname"), Some(&Value::from("Byron")));
    }

    #[test]
    fn dedup_distinguishes_integer_from_float() {
        let mut rs = RowSet::new("Order1", vec!["qty".into()]);
        rs.add_row(Row::from_iter([("qty", 1i64)]));
        rs.add_row(Row::from_iter([("qty", 1.0f64)]));
        let mut table = UnifiedTable::concat(vec![rs]).unwrap();

        table.dedup();

        assert_eq!(table.len(), 2);
    }

    #[test]
    fn dedup_treats_nan_and_missing_cells_consistently() {
        let mut a = RowSet::new("Order1", vec!["price".into(), "note".into()]);
        a.add_row(Row::from_iter([("price", Value::Float(f64::NAN)), ("note", Value::Null)]));
        a.add_row(Row::from_iter([("price", Value::Float(f64::NAN))]));
        a.add_row(Row::from_iter([("price", Value::Float(2.5)), ("note", Value::from(""))]));
        let mut table = UnifiedTable::concat(vec![a]).unwrap();

        table.dedup();

        assert_eq!(table.len(), 2);
        assert_eq!(table.rows[1].get("note"), Some(&Value::from("")));
    }

    #[test]
    fn dedup_keeps_text_distinct_from_same_looking_number() {
        let mut rs = RowSet::new("Table1", vec!["unified_id".into()]);
        rs.add_row(Row::from_iter([("unified_id", Value::Integer(42))]));
        rs.add_row(Row::from_iter([("unified_id", Value::from("42"))]));
        rs.add_row(Row::from_iter([("unified_id", Value::Integer(42))]));
        let mut table = UnifiedTable::concat(vec![rs]).unwrap();

        table.dedup();

        assert_eq!(
            table.rows.iter().map(|r| r.get("unified_id").cloned().unwrap()).collect::<Vec<_>>(),
            vec![Value::Integer(42), Value::from("42")]
        );
    }

    #[test]
    fn fill_column_sets_value_on_every_row() {
        let rs = order_set("Table2", &["firstname"], &[&["Ada"], &["Grace"]]);
        let mut table = UnifiedTable::concat(vec![rs]).unwrap();

        table.fill_column("unified_id", &Value::Integer(7));

        assert_eq!(table.columns, vec!["firstname", "unified_id"]);
        assert!(table.rows.iter().all(|r| r.get("unified_id") == Some(&Value::Integer(7))));
    }

    #[test]
    fn view_renders_rows_as_cell_arrays() {
        let rs = order_set("Order1", &["ordernumber"], &[&["A-1"]]);
        let view = UnifiedTable::concat(vec![rs]).unwrap().to_view();

        assert_eq!(
            serde_json::to_value(&view).unwrap(),
            serde_json::json!({"columns": ["ordernumber"], "rows": [["A-1"]]})
        );
    }

    proptest! {
        #[test]
        fn dedup_output_has_no_duplicates_and_loses_no_distinct_row(
            names in proptest::collection::vec("[ab]{1,2}", 0..24)
        ) {
            let mut rs = RowSet::new("Table1", vec!["firstname".into()]);
            for name in &names {
                rs.add_row(Row::from_iter([("firstname", name.as_str())]));
            }
            prop_assume!(!names.is_empty());
            let mut table = UnifiedTable::concat(vec![rs]).unwrap();

            table.dedup();

            let kept: Vec<Value> = table.rows.iter().map(|r| r.get("firstname").cloned().unwrap()).collect();
            let distinct: Vec<Value> = names.iter().unique().map(|n| Value::from(n.as_str())).collect();
            prop_assert_eq!(kept, distinct);
        }

        #[test]
        fn normalized_columns_are_lowercase_and_unique(
            columns in proptest::collection::vec("[A-Za-z]{1,3}", 1..8)
        ) {
            let mut rs = RowSet::new("Order1", columns.clone());
            rs.add_row(columns.iter().map(|c| (c.clone(), Value::from(c.as_str()))).collect());
            let mut table = UnifiedTable::concat(vec![rs]).unwrap();

            table.normalize_columns();

            prop_assert!(table.columns.iter().all(|c| *c == c.to_lowercase()));
            prop_assert_eq!(table.columns.len(), table.columns.iter().unique().count());
            prop_assert!(table.rows[0].values.keys().all(|k| table.columns.contains(k)));
        }
    }
}
