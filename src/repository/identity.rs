// ==========================================
// 学校入驻数据加载器 - 自然键实体写入接口
// ==========================================
// 职责: 定义"按自然键插入或更新并返回标识符"的接口（不包含实现）
// 实现者: 各实体记录（见 organization_repo / enrollment_repo）
// ==========================================

use crate::domain::types::{EntityKind, Identifier};
use crate::domain::value::CellValue;
use crate::repository::error::RepositoryResult;
use rusqlite::types::Value;
use rusqlite::{Params, Transaction};

// ==========================================
// IdentityUpsert Trait
// ==========================================
// 用途: 自然键解析器的持久化接缝
pub trait IdentityUpsert {
    /// 实体种类
    const KIND: EntityKind;

    /// 自然键（用于日志）
    fn natural_key(&self) -> String;

    /// 插入或更新（仅更新身份列）,返回标识符
    ///
    /// # 返回
    /// - Ok(Identifier): 新建或已存在记录的主键
    /// - Err: 约束违反、表不存在等
    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier>;
}

/// 执行 "SELECT id, name ..." 回读,过滤 NULL 键
///
/// 键列按自然键规则转为文本（整数 5 与文本 "5" 视为同一键）
pub(crate) fn query_key_pairs<P: Params>(
    tx: &Transaction,
    sql: &str,
    params: P,
) -> RepositoryResult<Vec<(String, Identifier)>> {
    let mut stmt = tx.prepare(sql)?;
    let rows = stmt.query_map(params, |row| {
        Ok((row.get::<_, Identifier>(0)?, row.get::<_, Value>(1)?))
    })?;

    let mut pairs = Vec::new();
    for row in rows {
        let (id, raw_key) = row?;
        if let Some(key) = sql_value_to_key(raw_key) {
            pairs.push((key, id));
        }
    }
    Ok(pairs)
}

fn sql_value_to_key(value: Value) -> Option<String> {
    let cell = match value {
        Value::Null | Value::Blob(_) => CellValue::Null,
        Value::Integer(i) => CellValue::Int(i),
        Value::Real(f) => CellValue::Float(f),
        Value::Text(s) => CellValue::Text(s),
    };
    cell.as_key()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rusqlite::Connection;

    #[test]
    fn test_query_key_pairs_normalizes_and_skips_null() {
        let mut conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(
            "CREATE TABLE g (id INTEGER PRIMARY KEY, name);
             INSERT INTO g (id, name) VALUES (1, '5'), (2, 6), (3, 7.0), (4, NULL), (5, '  ');",
        )
        .unwrap();

        let tx = conn.transaction().unwrap();
        let mut pairs = query_key_pairs(&tx, "SELECT id, name FROM g", []).unwrap();
        pairs.sort();

        assert_eq!(
            pairs,
            vec![
                ("5".to_string(), 1),
                ("6".to_string(), 2),
                ("7".to_string(), 3),
            ]
        );
    }
}
