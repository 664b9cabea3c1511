// ==========================================
// 学校入驻数据加载器 - SQLite 连接初始化
// ==========================================
// 目标:
// - 统一 Connection::open 的 PRAGMA 行为（外键约束每个连接单独开启）
// - 统一 busy_timeout
// - 加载前检查目标表是否齐全（本工具不做 DDL）
// ==========================================

use crate::config::DatabaseTarget;
use rusqlite::{Connection, OptionalExtension};
use std::time::Duration;

/// 默认 busy_timeout（毫秒）
pub const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;

/// 配置 SQLite 连接的统一 PRAGMA
pub fn configure_sqlite_connection(conn: &Connection, busy_timeout_ms: u64) -> rusqlite::Result<()> {
    conn.execute_batch("PRAGMA foreign_keys = ON;")?;
    conn.busy_timeout(Duration::from_millis(busy_timeout_ms))?;
    Ok(())
}

/// 打开 SQLite 连接并应用统一配置
pub fn open_sqlite_connection(db_path: &str) -> rusqlite::Result<Connection> {
    let conn = Connection::open(db_path)?;
    configure_sqlite_connection(&conn, DEFAULT_BUSY_TIMEOUT_MS)?;
    Ok(conn)
}

/// 按目标打开连接
pub fn open_target(target: &DatabaseTarget, busy_timeout_ms: u64) -> rusqlite::Result<Connection> {
    let conn = match target {
        DatabaseTarget::Memory => Connection::open_in_memory()?,
        DatabaseTarget::File(path) => Connection::open(path)?,
    };
    configure_sqlite_connection(&conn, busy_timeout_ms)?;
    Ok(conn)
}

/// 返回目标库中不存在的表（保持入参顺序）
pub fn missing_tables(conn: &Connection, tables: &[&str]) -> rusqlite::Result<Vec<String>> {
    let mut missing = Vec::new();
    for table in tables {
        let exists = conn
            .query_row(
                "SELECT 1 FROM sqlite_master WHERE type='table' AND name=?1 LIMIT 1",
                [table],
                |_row| Ok(true),
            )
            .optional()?
            .unwrap_or(false);

        if !exists {
            missing.push((*table).to_string());
        }
    }
    Ok(missing)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_foreign_keys_enabled() {
        let conn = open_target(&DatabaseTarget::Memory, 1_000).unwrap();
        let enabled: i64 = conn
            .query_row("PRAGMA foreign_keys", [], |row| row.get(0))
            .unwrap();
        assert_eq!(enabled, 1);
    }

    #[test]
    fn test_missing_tables_keeps_order() {
        let conn = open_target(&DatabaseTarget::Memory, 1_000).unwrap();
        conn.execute_batch("CREATE TABLE ss_t_grades (grade_id INTEGER PRIMARY KEY);")
            .unwrap();

        let missing =
            missing_tables(&conn, &["ss_t_schools", "ss_t_grades", "ss_t_sections"]).unwrap();
        assert_eq!(missing, vec!["ss_t_schools".to_string(), "ss_t_sections".to_string()]);
    }
}
