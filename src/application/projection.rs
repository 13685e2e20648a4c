use itertools::Itertools;

/// 注文一覧で表示するカラム
pub const ORDER_COLUMNS: [&str; 4] = ["sourcetable", "ordernumber", "description", "orderdate"];

/// 注文行の取得元テーブルを示すカラム
pub const ORDER_SOURCE_COLUMN: &str = "sourcetable";

/// 利用者レコードの取得元テーブルを示すカラム
pub const RECORD_SOURCE_COLUMN: &str = "source_table";

pub const FIRST_NAME_COLUMN: &str = "firstname";
pub const LAST_NAME_COLUMN: &str = "lastname";

/// `A, B, or C` 形式で列挙する
pub fn or_list(items: &[String]) -> String {
    match items {
        [] => String::new(),
        [only] => only.clone(),
        [first, second] => format!("{} or {}", first, second),
        [init @ .., last] => format!("{}, or {}", init.iter().join(", "), last),
    }
}
