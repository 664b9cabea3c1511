// ==========================================
// 学校入驻数据加载器 - 教学安排阶段
// ==========================================
// 覆盖: TeacherSubject / TeacherGradeSection / Timeslot /
//       TimetableEntry / HomeworkAssignment / ClassDiaryEntry
// 发布: 无
// ==========================================

use super::{
    process_rows, require_int, require_key, resolve_grade_section, resolve_hint, resolve_subject,
    resolve_teacher, RowError, StageContext, StageOutput,
};
use crate::domain::mappings::PublishedMaps;
use crate::domain::records::{
    ClassDiaryRecord, HomeworkRecord, TeacherGradeSectionLink, TeacherSubjectLink,
    TimeslotRecord, TimetableRecord,
};
use crate::domain::types::{EntityKind, Identifier};
use crate::domain::value::{FieldMap, SheetRow};
use crate::importer::error::LoadResult;
use crate::importer::skip::SkipReason;
use crate::repository::ScheduleRepository;
use rusqlite::Transaction;

const TEACHER_SUBJECT_REQUIRED: &[&str] = &["teacher_id_hint", "subject_id_hint"];
const TEACHER_GRADE_SECTION_REQUIRED: &[&str] = &["teacher_id_hint", "grade_name", "section_name"];
const TIMESLOT_REQUIRED: &[&str] = &["day_of_week", "period_number"];
const TIMETABLE_REQUIRED: &[&str] = &[
    "grade_name",
    "section_name",
    "day_of_week",
    "period_number",
    "subject_name",
    "teacher_email",
];
const HOMEWORK_REQUIRED: &[&str] = &[
    "teacher_email",
    "grade_name",
    "section_name",
    "subject_name",
    "title",
    "assigned_date",
];
const CLASS_DIARY_REQUIRED: &[&str] = &[
    "teacher_email",
    "grade_name",
    "section_name",
    "subject_name",
    "date",
    "title",
];

/// 教学活动的四个引用: 教师、年级、班级、科目
struct TeachingRefs {
    teacher_id: Identifier,
    grade_id: Identifier,
    section_id: Identifier,
    subject_id: Identifier,
}

fn resolve_teaching_refs(fields: &FieldMap, maps: &PublishedMaps) -> Result<TeachingRefs, SkipReason> {
    let teacher_email = require_key(fields, "teacher_email")?;
    let grade_name = require_key(fields, "grade_name")?;
    let section_name = require_key(fields, "section_name")?;
    let subject_name = require_key(fields, "subject_name")?;

    let teacher_id = resolve_teacher(maps, &teacher_email)?;
    let (grade_id, section_id) = resolve_grade_section(maps, &grade_name, &section_name)?;
    let subject_id = resolve_subject(maps, &subject_name)?;
    Ok(TeachingRefs {
        teacher_id,
        grade_id,
        section_id,
        subject_id,
    })
}

// ==========================================
// 任课关系
// ==========================================

pub fn load_teacher_subjects(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::TeacherSubject,
        ctx,
        rows,
        TEACHER_SUBJECT_REQUIRED,
        |fields| {
            let link = build_teacher_subject(fields, ctx.maps)?;
            ScheduleRepository::link_teacher_subject_tx(ctx.tx, &link)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_teacher_subject(
    fields: &FieldMap,
    maps: &PublishedMaps,
) -> Result<TeacherSubjectLink, SkipReason> {
    let teacher_hint = require_int(fields, "teacher_id_hint")?;
    let subject_hint = require_int(fields, "subject_id_hint")?;
    Ok(TeacherSubjectLink {
        teacher_id: resolve_hint(maps, EntityKind::Teacher, teacher_hint)?,
        subject_id: resolve_hint(maps, EntityKind::Subject, subject_hint)?,
    })
}

pub fn load_teacher_grade_sections(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::TeacherGradeSection,
        ctx,
        rows,
        TEACHER_GRADE_SECTION_REQUIRED,
        |fields| {
            let link = build_teacher_grade_section(fields, ctx.maps)?;
            ScheduleRepository::link_teacher_grade_section_tx(ctx.tx, &link)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_teacher_grade_section(
    fields: &FieldMap,
    maps: &PublishedMaps,
) -> Result<TeacherGradeSectionLink, SkipReason> {
    let teacher_hint = require_int(fields, "teacher_id_hint")?;
    let grade_name = require_key(fields, "grade_name")?;
    let section_name = require_key(fields, "section_name")?;
    let (grade_id, section_id) = resolve_grade_section(maps, &grade_name, &section_name)?;
    let teacher_id = resolve_hint(maps, EntityKind::Teacher, teacher_hint)?;
    Ok(TeacherGradeSectionLink {
        teacher_id,
        grade_id,
        section_id,
    })
}

// ==========================================
// 课时与课表
// ==========================================

pub fn load_timeslots(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(EntityKind::Timeslot, ctx, rows, TIMESLOT_REQUIRED, |fields| {
        let slot = build_timeslot(fields)?;
        ScheduleRepository::upsert_timeslot_tx(ctx.tx, &slot)?;
        Ok(())
    })?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_timeslot(fields: &FieldMap) -> Result<TimeslotRecord, SkipReason> {
    Ok(TimeslotRecord {
        day_of_week: require_key(fields, "day_of_week")?,
        period_number: require_int(fields, "period_number")?,
        start_time: fields.value("start_time"),
        end_time: fields.value("end_time"),
    })
}

pub fn load_timetable(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::TimetableEntry,
        ctx,
        rows,
        TIMETABLE_REQUIRED,
        |fields| {
            let entry = build_timetable(fields, ctx.maps, ctx.tx)?;
            ScheduleRepository::upsert_timetable_tx(ctx.tx, &entry)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

/// 课时按 (星期, 节次) 实时查询
fn build_timetable(
    fields: &FieldMap,
    maps: &PublishedMaps,
    tx: &Transaction,
) -> Result<TimetableRecord, RowError> {
    let grade_name = require_key(fields, "grade_name")?;
    let section_name = require_key(fields, "section_name")?;
    let day_of_week = require_key(fields, "day_of_week")?;
    let period_number = require_int(fields, "period_number")?;
    let (grade_id, section_id) = resolve_grade_section(maps, &grade_name, &section_name)?;

    let timeslot_id = ScheduleRepository::find_timeslot_tx(tx, &day_of_week, period_number)?
        .ok_or(SkipReason::UnknownTimeslot {
            day_of_week,
            period_number,
        })?;

    let subject_id = resolve_subject(maps, &require_key(fields, "subject_name")?)?;
    let teacher_id = resolve_teacher(maps, &require_key(fields, "teacher_email")?)?;

    Ok(TimetableRecord {
        grade_id,
        section_id,
        timeslot_id,
        subject_id,
        teacher_id,
        room_number: fields.value("room_number"),
    })
}

// ==========================================
// 作业与班级日志
// ==========================================

pub fn load_homework(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::HomeworkAssignment,
        ctx,
        rows,
        HOMEWORK_REQUIRED,
        |fields| {
            let homework = build_homework(fields, ctx.maps)?;
            ScheduleRepository::upsert_homework_tx(ctx.tx, &homework)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_homework(fields: &FieldMap, maps: &PublishedMaps) -> Result<HomeworkRecord, SkipReason> {
    let title = require_key(fields, "title")?;
    require_key(fields, "assigned_date")?;
    let refs = resolve_teaching_refs(fields, maps)?;

    Ok(HomeworkRecord {
        teacher_id: refs.teacher_id,
        grade_id: refs.grade_id,
        section_id: refs.section_id,
        subject_id: refs.subject_id,
        title,
        assigned_date: fields.value("assigned_date"),
        more_details: fields.value("more_details"),
        due_date: fields.value("due_date"),
        status: fields.value("status"),
    })
}

pub fn load_class_diary(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::ClassDiaryEntry,
        ctx,
        rows,
        CLASS_DIARY_REQUIRED,
        |fields| {
            let entry = build_class_diary(fields, ctx.maps)?;
            ScheduleRepository::upsert_class_diary_tx(ctx.tx, &entry)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_class_diary(
    fields: &FieldMap,
    maps: &PublishedMaps,
) -> Result<ClassDiaryRecord, SkipReason> {
    let title = require_key(fields, "title")?;
    require_key(fields, "date")?;
    let refs = resolve_teaching_refs(fields, maps)?;

    Ok(ClassDiaryRecord {
        teacher_id: refs.teacher_id,
        grade_id: refs.grade_id,
        section_id: refs.section_id,
        subject_id: refs.subject_id,
        entry_date: fields.value("date"),
        title,
        description: fields.value("description"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mappings::{HintMap, Publication};
    use crate::domain::value::{make_row, CellValue};
    use crate::importer::row_normalizer::normalize;

    #[test]
    fn test_teacher_subject_hints_do_not_cross_kinds() {
        // 教师提示 1 存在,科目提示 1 不存在
        let maps = PublishedMaps::new()
            .publish(Publication::Hint(HintMap::from_entries(EntityKind::Teacher, [(1, 10)])))
            .unwrap()
            .publish(Publication::Hint(HintMap::from_entries(EntityKind::Subject, [(2, 20)])))
            .unwrap();

        let fields = normalize(
            &make_row([
                ("teacher_id_hint", CellValue::Int(1)),
                ("subject_id_hint", CellValue::Int(1)),
            ]),
            TEACHER_SUBJECT_REQUIRED,
        );
        assert_eq!(
            build_teacher_subject(&fields, &maps),
            Err(SkipReason::UnknownHint {
                kind: EntityKind::Subject,
                hint: 1
            })
        );
    }

    #[test]
    fn test_timeslot_period_must_be_integer() {
        let fields = normalize(
            &make_row([
                ("day_of_week", CellValue::from("Monday")),
                ("period_number", CellValue::from("first")),
            ]),
            TIMESLOT_REQUIRED,
        );
        assert_eq!(
            build_timeslot(&fields),
            Err(SkipReason::InvalidInteger("period_number"))
        );

        let fields = normalize(
            &make_row([
                ("day_of_week", CellValue::from("Monday")),
                ("period_number", CellValue::Float(1.0)),
            ]),
            TIMESLOT_REQUIRED,
        );
        let slot = build_timeslot(&fields).unwrap();
        assert_eq!((slot.day_of_week.as_str(), slot.period_number), ("Monday", 1));
    }

    #[test]
    fn test_homework_requires_assigned_date() {
        let fields = normalize(
            &make_row([
                ("teacher_email", CellValue::from("t@x.org")),
                ("title", CellValue::from("Fractions")),
            ]),
            HOMEWORK_REQUIRED,
        );
        assert_eq!(
            build_homework(&fields, &PublishedMaps::new()),
            Err(SkipReason::MissingField("assigned_date"))
        );
    }
}
