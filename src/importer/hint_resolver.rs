// ==========================================
// 学校入驻数据加载器 - 提示号解析器
// ==========================================
// 职责: 构建 提示号 → 标识符 映射
// - 自提示: 同一工作表内 提示号 → 自然键,再经自然键映射得到标识符（教师、科目）
// - 跨表提示: 本次接受的行 提示号 + 邮箱,与库中回读的 邮箱 → 标识符 连接（学生）
// 红线: 提示号只在本次加载内有效,从不写库
// ==========================================

use crate::domain::mappings::{HintMap, NaturalKeyMap};
use crate::domain::types::{EntityKind, Hint};
use crate::domain::value::FieldMap;

pub struct HintResolver;

impl HintResolver {
    /// 自提示映射
    ///
    /// 提示号缺失、自然键缺失或自然键未落库的行不进入映射
    pub fn build_self_hint_map(
        kind: EntityKind,
        rows: &[FieldMap],
        hint_field: &str,
        key_field: &str,
        names: &NaturalKeyMap,
    ) -> HintMap {
        let entries = rows.iter().filter_map(|row| {
            let hint = row.int(hint_field)?;
            let key = row.key(key_field)?;
            names.get(key.as_str()).map(|id| (hint, id))
        });
        HintMap::from_entries(kind, entries)
    }

    /// 跨表提示映射
    ///
    /// # 参数
    /// - accepted: 本次接受的 (提示号, 自然键)
    /// - persisted: 回读的 自然键 → 标识符
    pub fn build_cross_sheet_hint_map(
        kind: EntityKind,
        accepted: &[(Hint, String)],
        persisted: &NaturalKeyMap,
    ) -> HintMap {
        let entries = accepted
            .iter()
            .filter_map(|(hint, key)| persisted.get(key.as_str()).map(|id| (*hint, id)));
        HintMap::from_entries(kind, entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::{make_row, CellValue};
    use crate::importer::row_normalizer::normalize;

    fn teacher_row(hint: CellValue, email: &str) -> FieldMap {
        normalize(
            &make_row([("teacher_id_hint", hint), ("email", CellValue::from(email))]),
            &["teacher_id_hint", "email"],
        )
    }

    #[test]
    fn test_self_hint_map_joins_through_names() {
        let names = NaturalKeyMap::from_entries(
            EntityKind::Teacher,
            [("t1@x.org".to_string(), 11), ("t2@x.org".to_string(), 12)],
        );
        let rows = vec![
            teacher_row(CellValue::Int(1), "t1@x.org"),
            teacher_row(CellValue::Float(2.0), "t2@x.org"),
            teacher_row(CellValue::Null, "t1@x.org"),
            teacher_row(CellValue::Int(4), "ghost@x.org"),
        ];

        let hints = HintResolver::build_self_hint_map(
            EntityKind::Teacher,
            &rows,
            "teacher_id_hint",
            "email",
            &names,
        );

        assert_eq!(hints.kind(), EntityKind::Teacher);
        assert_eq!(hints.get(&1), Some(11));
        assert_eq!(hints.get(&2), Some(12));
        assert_eq!(hints.get(&4), None);
        assert_eq!(hints.len(), 2);
    }

    #[test]
    fn test_cross_sheet_hint_map_only_uses_accepted_rows() {
        let persisted = NaturalKeyMap::from_entries(
            EntityKind::Student,
            [("a@x.org".to_string(), 100), ("old@x.org".to_string(), 99)],
        );
        let accepted = vec![(1, "a@x.org".to_string()), (2, "missing@x.org".to_string())];

        let hints =
            HintResolver::build_cross_sheet_hint_map(EntityKind::Student, &accepted, &persisted);

        assert_eq!(hints.get(&1), Some(100));
        assert_eq!(hints.get(&2), None);
        assert_eq!(hints.len(), 1);
    }
}
