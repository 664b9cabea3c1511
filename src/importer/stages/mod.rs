// ==========================================
// 学校入驻数据加载器 - 实体阶段
// ==========================================
// 职责: 单一实体种类的 行 → 记录 → 写入 → 回读发布
// 流程（每行）:
// 1. 标准化必填字段
// 2. 解析引用（自然键 / 提示号 / 实时查询）
// 3. 任一必填缺失或引用无法解析 → 跳过
// 4. 写入
// 阶段末: 回读并产出需要发布的映射
// ==========================================

pub mod enrollment;
pub mod organization;
pub mod payroll;
pub mod schedule;

use crate::domain::mappings::{Publication, PublishedMaps};
use crate::domain::types::{EntityKind, Hint, Identifier};
use crate::domain::value::{FieldMap, SheetRow};
use crate::importer::error::LoadError;
use crate::importer::error::LoadResult;
use crate::importer::row_normalizer::RowNormalizer;
use crate::importer::skip::{SkipReason, StageSummary};
use crate::repository::error::RepositoryError;
use rusqlite::Transaction;

// ==========================================
// StageContext - 阶段上下文（只读）
// ==========================================
pub struct StageContext<'a> {
    pub tx: &'a Transaction<'a>,
    pub maps: &'a PublishedMaps,
    pub normalizer: &'a RowNormalizer,
}

/// 阶段产出
#[derive(Debug)]
pub struct StageOutput {
    pub summary: StageSummary,
    pub publications: Vec<Publication>,
}

impl StageOutput {
    pub fn new(summary: StageSummary) -> Self {
        Self {
            summary,
            publications: Vec::new(),
        }
    }

    pub fn publish(mut self, publication: Publication) -> Self {
        self.publications.push(publication);
        self
    }
}

/// 按实体种类分派到对应阶段
pub fn run_stage(kind: EntityKind, ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    match kind {
        EntityKind::School => organization::load_schools(ctx, rows),
        EntityKind::Grade => organization::load_grades(ctx, rows),
        EntityKind::Section => organization::load_sections(ctx, rows),
        EntityKind::Subject => organization::load_subjects(ctx, rows),
        EntityKind::Teacher => organization::load_teachers(ctx, rows),
        EntityKind::Student => enrollment::load_students(ctx, rows),
        EntityKind::AttendanceRecord => enrollment::load_attendance(ctx, rows),
        EntityKind::FeeSummary => enrollment::load_fee_summaries(ctx, rows),
        EntityKind::Installment => enrollment::load_installments(ctx, rows),
        EntityKind::TeacherSubject => schedule::load_teacher_subjects(ctx, rows),
        EntityKind::TeacherGradeSection => schedule::load_teacher_grade_sections(ctx, rows),
        EntityKind::Timeslot => schedule::load_timeslots(ctx, rows),
        EntityKind::TimetableEntry => schedule::load_timetable(ctx, rows),
        EntityKind::HomeworkAssignment => schedule::load_homework(ctx, rows),
        EntityKind::ClassDiaryEntry => schedule::load_class_diary(ctx, rows),
        EntityKind::SalaryStructure => payroll::load_salary_structures(ctx, rows),
        EntityKind::SalaryPayslip => payroll::load_payslips(ctx, rows),
    }
}

// ==========================================
// 行处理
// ==========================================

/// 单行处理失败: 跳过该行,或中止整个阶段
#[derive(Debug)]
pub(crate) enum RowError {
    Skip(SkipReason),
    Fatal(LoadError),
}

impl From<SkipReason> for RowError {
    fn from(reason: SkipReason) -> Self {
        RowError::Skip(reason)
    }
}

impl From<LoadError> for RowError {
    fn from(err: LoadError) -> Self {
        RowError::Fatal(err)
    }
}

impl From<RepositoryError> for RowError {
    fn from(err: RepositoryError) -> Self {
        RowError::Fatal(LoadError::Repository(err))
    }
}

/// 逐行标准化并处理,汇总写入/跳过
///
/// # 返回
/// (阶段汇总, 全部行的标准化结果)
pub(crate) fn process_rows<F>(
    kind: EntityKind,
    ctx: &StageContext<'_>,
    rows: &[SheetRow],
    required: &[&str],
    mut apply: F,
) -> LoadResult<(StageSummary, Vec<FieldMap>)>
where
    F: FnMut(&FieldMap) -> Result<(), RowError>,
{
    let mut summary = StageSummary::new(kind);
    let mut normalized = Vec::with_capacity(rows.len());

    for row in rows {
        summary.rows_seen += 1;
        let fields = ctx.normalizer.normalize(&row.cells, required);
        match apply(&fields) {
            Ok(()) => summary.record_upsert(),
            Err(RowError::Skip(reason)) => summary.record_skip(row.line, &reason),
            Err(RowError::Fatal(err)) => return Err(err),
        }
        normalized.push(fields);
    }

    Ok((summary, normalized))
}

// ==========================================
// 字段与引用解析（失败即跳过原因）
// ==========================================

pub(crate) fn require_key(fields: &FieldMap, field: &'static str) -> Result<String, SkipReason> {
    fields.key(field).ok_or(SkipReason::MissingField(field))
}

pub(crate) fn require_int(fields: &FieldMap, field: &'static str) -> Result<i64, SkipReason> {
    if fields.get(field).is_null() {
        return Err(SkipReason::MissingField(field));
    }
    fields.int(field).ok_or(SkipReason::InvalidInteger(field))
}

pub(crate) fn primary_school(maps: &PublishedMaps) -> Result<Identifier, SkipReason> {
    maps.primary_school().ok_or(SkipReason::NoPrimarySchool)
}

pub(crate) fn resolve_grade(maps: &PublishedMaps, grade_name: &str) -> Result<Identifier, SkipReason> {
    maps.resolve_name(EntityKind::Grade, grade_name)
        .ok_or_else(|| SkipReason::UnknownGrade(grade_name.to_string()))
}

/// 年级 + 班级 → (grade_id, section_id)
pub(crate) fn resolve_grade_section(
    maps: &PublishedMaps,
    grade_name: &str,
    section_name: &str,
) -> Result<(Identifier, Identifier), SkipReason> {
    let grade_id = resolve_grade(maps, grade_name)?;
    let section_id = maps
        .resolve_scoped(EntityKind::Section, grade_name, section_name)
        .ok_or_else(|| SkipReason::UnknownSection {
            grade: grade_name.to_string(),
            section: section_name.to_string(),
        })?;
    Ok((grade_id, section_id))
}

pub(crate) fn resolve_subject(maps: &PublishedMaps, subject_name: &str) -> Result<Identifier, SkipReason> {
    maps.resolve_name(EntityKind::Subject, subject_name)
        .ok_or_else(|| SkipReason::UnknownSubject(subject_name.to_string()))
}

pub(crate) fn resolve_teacher(maps: &PublishedMaps, email: &str) -> Result<Identifier, SkipReason> {
    maps.resolve_name(EntityKind::Teacher, email)
        .ok_or_else(|| SkipReason::UnknownTeacher(email.to_string()))
}

pub(crate) fn resolve_hint(
    maps: &PublishedMaps,
    kind: EntityKind,
    hint: Hint,
) -> Result<Identifier, SkipReason> {
    maps.resolve_hint(kind, hint)
        .ok_or(SkipReason::UnknownHint { kind, hint })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mappings::{HintMap, NaturalKeyMap, ScopedKeyMap};
    use crate::domain::value::{make_row, CellValue};
    use crate::importer::row_normalizer::normalize;

    fn maps_with_grade_five() -> PublishedMaps {
        let grades = NaturalKeyMap::from_entries(EntityKind::Grade, [("5".to_string(), 1)]);
        let sections = ScopedKeyMap::from_scopes(
            EntityKind::Section,
            [(
                "5".to_string(),
                NaturalKeyMap::from_entries(EntityKind::Section, [("A".to_string(), 10)]),
            )],
        );
        PublishedMaps::new()
            .publish(Publication::Natural(grades))
            .unwrap()
            .publish(Publication::Scoped(sections))
            .unwrap()
    }

    #[test]
    fn test_require_int_distinguishes_missing_and_invalid() {
        let fields = normalize(
            &make_row([("year", CellValue::from("2024")), ("month", CellValue::from("May"))]),
            &["year", "month", "day"],
        );
        assert_eq!(require_int(&fields, "year"), Ok(2024));
        assert_eq!(require_int(&fields, "month"), Err(SkipReason::InvalidInteger("month")));
        assert_eq!(require_int(&fields, "day"), Err(SkipReason::MissingField("day")));
    }

    #[test]
    fn test_resolve_grade_section() {
        let maps = maps_with_grade_five();
        assert_eq!(resolve_grade_section(&maps, "5", "A"), Ok((1, 10)));
        assert_eq!(
            resolve_grade_section(&maps, "5", "B"),
            Err(SkipReason::UnknownSection {
                grade: "5".into(),
                section: "B".into()
            })
        );
        assert_eq!(
            resolve_grade_section(&maps, "9", "A"),
            Err(SkipReason::UnknownGrade("9".into()))
        );
    }

    #[test]
    fn test_resolve_hint_uses_kind() {
        let maps = PublishedMaps::new()
            .publish(Publication::Hint(HintMap::from_entries(EntityKind::Teacher, [(1, 42)])))
            .unwrap();
        assert_eq!(resolve_hint(&maps, EntityKind::Teacher, 1), Ok(42));
        assert_eq!(
            resolve_hint(&maps, EntityKind::Subject, 1),
            Err(SkipReason::UnknownHint {
                kind: EntityKind::Subject,
                hint: 1
            })
        );
    }
}
