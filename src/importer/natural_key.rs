// ==========================================
// 学校入驻数据加载器 - 自然键解析器
// ==========================================
// 职责:
// 1. resolve_or_create: 按自然键插入或更新,返回标识符
// 2. read_back: 阶段结束后按作用域回读完整 名称 → 标识符 映射
// ==========================================

use crate::domain::mappings::{NaturalKeyMap, ScopedKeyMap};
use crate::domain::types::{EntityKind, Identifier};
use crate::importer::error::{LoadError, LoadResult};
use crate::repository::{EnrollmentRepository, IdentityUpsert, OrganizationRepository};
use rusqlite::Transaction;
use tracing::trace;

pub struct NaturalKeyResolver;

impl NaturalKeyResolver {
    /// 插入或更新一条自然键实体
    ///
    /// 已存在时只刷新身份列,返回原标识符; 不存在时新建
    pub fn resolve_or_create<R: IdentityUpsert>(tx: &Transaction, record: &R) -> LoadResult<Identifier> {
        let id = record.upsert_returning_id(tx)?;
        trace!(kind = %R::KIND, key = %record.natural_key(), id, "自然键写入");
        Ok(id)
    }

    /// 回读某种实体的 自然键 → 标识符 映射
    ///
    /// # 参数
    /// - scope: 学校作用域（年级/科目/教师需要; 学校/学生忽略）
    pub fn read_back(
        tx: &Transaction,
        kind: EntityKind,
        scope: Option<Identifier>,
    ) -> LoadResult<NaturalKeyMap> {
        let pairs = match kind {
            EntityKind::School => OrganizationRepository::list_schools_tx(tx)?,
            EntityKind::Student => EnrollmentRepository::list_student_emails_tx(tx)?,
            EntityKind::Grade => OrganizationRepository::list_grades_tx(tx, require_scope(kind, scope)?)?,
            EntityKind::Subject => {
                OrganizationRepository::list_subjects_tx(tx, require_scope(kind, scope)?)?
            }
            EntityKind::Teacher => {
                OrganizationRepository::list_teachers_tx(tx, require_scope(kind, scope)?)?
            }
            other => {
                return Err(LoadError::InternalError(format!(
                    "{} 没有自然键映射",
                    other
                )))
            }
        };
        Ok(NaturalKeyMap::from_entries(kind, pairs))
    }

    /// 回读班级映射: 年级名 → (班级名 → section_id)
    pub fn read_back_sections(tx: &Transaction, grades: &NaturalKeyMap) -> LoadResult<ScopedKeyMap> {
        let mut scopes = Vec::with_capacity(grades.len());
        for (grade_name, grade_id) in grades.iter() {
            let pairs = OrganizationRepository::list_sections_tx(tx, *grade_id)?;
            scopes.push((
                grade_name.clone(),
                NaturalKeyMap::from_entries(EntityKind::Section, pairs),
            ));
        }
        Ok(ScopedKeyMap::from_scopes(EntityKind::Section, scopes))
    }
}

fn require_scope(kind: EntityKind, scope: Option<Identifier>) -> LoadResult<Identifier> {
    scope.ok_or_else(|| LoadError::InternalError(format!("{} 回读缺少学校作用域", kind)))
}
