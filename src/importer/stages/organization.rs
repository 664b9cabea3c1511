// ==========================================
// 学校入驻数据加载器 - 组织结构阶段
// ==========================================
// 覆盖: School → Grade → Section → Subject → Teacher
// 发布:
// - School: 学校映射 + 主学校
// - Grade: 年级映射（主学校作用域）
// - Section: 年级内班级映射
// - Subject / Teacher: 自然键映射 + 自提示映射
// ==========================================

use super::{
    primary_school, process_rows, require_key, resolve_grade, StageContext, StageOutput,
};
use crate::domain::mappings::{NaturalKeyMap, Publication, ScopedKeyMap};
use crate::domain::records::{GradeRecord, SchoolRecord, SectionRecord, SubjectRecord, TeacherRecord};
use crate::domain::types::EntityKind;
use crate::domain::value::{FieldMap, SheetRow};
use crate::domain::PublishedMaps;
use crate::importer::error::LoadResult;
use crate::importer::hint_resolver::HintResolver;
use crate::importer::natural_key::NaturalKeyResolver;
use crate::importer::skip::SkipReason;
use rusqlite::Transaction;
use tracing::{info, warn};

const SCHOOL_REQUIRED: &[&str] = &["school_name"];
const GRADE_REQUIRED: &[&str] = &["grade_name"];
const SECTION_REQUIRED: &[&str] = &["grade_name", "section_name"];
const SUBJECT_REQUIRED: &[&str] = &["subject_name", "subject_id_hint"];
const TEACHER_REQUIRED: &[&str] = &["email", "teacher_id_hint"];

// ==========================================
// School
// ==========================================

pub fn load_schools(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, normalized) =
        process_rows(EntityKind::School, ctx, rows, SCHOOL_REQUIRED, |fields| {
            let record = build_school(fields)?;
            NaturalKeyResolver::resolve_or_create(ctx.tx, &record)?;
            Ok(())
        })?;

    let schools = NaturalKeyResolver::read_back(ctx.tx, EntityKind::School, None)?;

    // 主学校 = schools 工作表首行
    let primary = normalized
        .first()
        .and_then(|fields| fields.key("school_name"))
        .and_then(|name| schools.get(name.as_str()));

    let mut output = StageOutput::new(summary);
    match primary {
        Some(school_id) => {
            info!(school_id, "主学校已确定");
            output = output.publish(Publication::PrimarySchool(school_id));
        }
        None => warn!("schools 工作表首行没有有效学校,学校作用域的实体将全部跳过"),
    }
    Ok(output.publish(Publication::Natural(schools)))
}

pub(crate) fn build_school(fields: &FieldMap) -> Result<SchoolRecord, SkipReason> {
    Ok(SchoolRecord {
        school_name: require_key(fields, "school_name")?,
        profile_pic_location: fields.value("profile_pic_location"),
        address: fields.value("address"),
        primary_phone_number: fields.value("primary_phone_number"),
        secondary_phone_number: fields.value("secondary_phone_number"),
        email: fields.value("email"),
        established_year: fields.value("established_year"),
        medium_of_instruction: fields.value("medium_of_instruction"),
        principal_head_name: fields.value("principal_head_name"),
        administrative_contact: fields.value("administrative_contact"),
        number_of_staff: fields.value("number_of_staff"),
        is_active: fields.value("is_active"),
    })
}

// ==========================================
// Grade
// ==========================================

pub fn load_grades(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(EntityKind::Grade, ctx, rows, GRADE_REQUIRED, |fields| {
        let record = build_grade(fields, ctx.maps)?;
        NaturalKeyResolver::resolve_or_create(ctx.tx, &record)?;
        Ok(())
    })?;

    let grades = read_back_scoped(ctx.tx, EntityKind::Grade, ctx.maps)?;
    Ok(StageOutput::new(summary).publish(Publication::Natural(grades)))
}

pub(crate) fn build_grade(fields: &FieldMap, maps: &PublishedMaps) -> Result<GradeRecord, SkipReason> {
    let grade_name = require_key(fields, "grade_name")?;
    let school_id = primary_school(maps)?;
    Ok(GradeRecord {
        school_id,
        grade_name,
        description: fields.value("description"),
        tuition_fee: fields.value("tuition_fee"),
        admission_fee: fields.value("admission_fee"),
        development_fee: fields.value("development_fee"),
        activity_fee: fields.value("activity_fee"),
        lab_fee: fields.value("lab_fee"),
        transportation_fee: fields.value("transportation_fee"),
        late_fee_penalty: fields.value("late_fee_penalty"),
        annual_event_fee: fields.value("annual_event_fee"),
        examination_fee: fields.value("examination_fee"),
        other_fee: fields.value("other_fee"),
        payment_methods_accepted: fields.value("payment_methods_accepted"),
    })
}

// ==========================================
// Section
// ==========================================

pub fn load_sections(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(EntityKind::Section, ctx, rows, SECTION_REQUIRED, |fields| {
        let record = build_section(fields, ctx.maps)?;
        NaturalKeyResolver::resolve_or_create(ctx.tx, &record)?;
        Ok(())
    })?;

    let sections = match ctx.maps.natural(EntityKind::Grade) {
        Some(grades) => NaturalKeyResolver::read_back_sections(ctx.tx, grades)?,
        None => ScopedKeyMap::empty(EntityKind::Section),
    };
    Ok(StageOutput::new(summary).publish(Publication::Scoped(sections)))
}

pub(crate) fn build_section(fields: &FieldMap, maps: &PublishedMaps) -> Result<SectionRecord, SkipReason> {
    let grade_name = require_key(fields, "grade_name")?;
    let section_name = require_key(fields, "section_name")?;
    let grade_id = resolve_grade(maps, &grade_name)?;
    Ok(SectionRecord {
        grade_id,
        section_name,
        capacity: fields.value("capacity"),
    })
}

// ==========================================
// Subject
// ==========================================

pub fn load_subjects(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, normalized) =
        process_rows(EntityKind::Subject, ctx, rows, SUBJECT_REQUIRED, |fields| {
            let record = build_subject(fields, ctx.maps)?;
            NaturalKeyResolver::resolve_or_create(ctx.tx, &record)?;
            Ok(())
        })?;

    let subjects = read_back_scoped(ctx.tx, EntityKind::Subject, ctx.maps)?;
    let hints = HintResolver::build_self_hint_map(
        EntityKind::Subject,
        &normalized,
        "subject_id_hint",
        "subject_name",
        &subjects,
    );

    Ok(StageOutput::new(summary)
        .publish(Publication::Natural(subjects))
        .publish(Publication::Hint(hints)))
}

pub(crate) fn build_subject(fields: &FieldMap, maps: &PublishedMaps) -> Result<SubjectRecord, SkipReason> {
    let subject_name = require_key(fields, "subject_name")?;
    let school_id = primary_school(maps)?;
    Ok(SubjectRecord {
        school_id,
        subject_name,
    })
}

// ==========================================
// Teacher
// ==========================================

pub fn load_teachers(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, normalized) =
        process_rows(EntityKind::Teacher, ctx, rows, TEACHER_REQUIRED, |fields| {
            let record = build_teacher(fields, ctx.maps)?;
            NaturalKeyResolver::resolve_or_create(ctx.tx, &record)?;
            Ok(())
        })?;

    let teachers = read_back_scoped(ctx.tx, EntityKind::Teacher, ctx.maps)?;
    let hints = HintResolver::build_self_hint_map(
        EntityKind::Teacher,
        &normalized,
        "teacher_id_hint",
        "email",
        &teachers,
    );

    Ok(StageOutput::new(summary)
        .publish(Publication::Natural(teachers))
        .publish(Publication::Hint(hints)))
}

pub(crate) fn build_teacher(fields: &FieldMap, maps: &PublishedMaps) -> Result<TeacherRecord, SkipReason> {
    let email = require_key(fields, "email")?;
    let school_id = primary_school(maps)?;
    Ok(TeacherRecord {
        school_id,
        email,
        first_name: fields.value("first_name"),
        middle_name: fields.value("middle_name"),
        last_name: fields.value("last_name"),
        profile_pic_location: fields.value("profile_pic_location"),
        gender: fields.value("gender"),
        date_of_birth: fields.value("date_of_birth"),
        mobile_number: fields.value("mobile_number"),
        communication_address: fields.value("communication_address"),
        languages_known: fields.value("languages_known"),
    })
}

/// 主学校作用域内回读; 无主学校时为空映射
fn read_back_scoped(
    tx: &Transaction,
    kind: EntityKind,
    maps: &PublishedMaps,
) -> LoadResult<NaturalKeyMap> {
    match maps.primary_school() {
        Some(school_id) => NaturalKeyResolver::read_back(tx, kind, Some(school_id)),
        None => Ok(NaturalKeyMap::empty(kind)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::value::{make_row, CellValue};
    use crate::importer::row_normalizer::normalize;

    fn with_primary_school(id: i64) -> PublishedMaps {
        PublishedMaps::new()
            .publish(Publication::PrimarySchool(id))
            .unwrap()
    }

    #[test]
    fn test_grade_requires_primary_school() {
        let fields = normalize(&make_row([("grade_name", CellValue::Float(5.0))]), GRADE_REQUIRED);

        assert_eq!(
            build_grade(&fields, &PublishedMaps::new()),
            Err(SkipReason::NoPrimarySchool)
        );

        let record = build_grade(&fields, &with_primary_school(3)).unwrap();
        assert_eq!(record.school_id, 3);
        assert_eq!(record.grade_name, "5");
        assert!(record.tuition_fee.is_null());
    }

    #[test]
    fn test_missing_field_is_checked_before_school() {
        let fields = normalize(&make_row([("email", CellValue::from("#N/A"))]), TEACHER_REQUIRED);
        assert_eq!(
            build_teacher(&fields, &PublishedMaps::new()),
            Err(SkipReason::MissingField("email"))
        );
    }

    #[test]
    fn test_section_skips_unknown_grade() {
        let fields = normalize(
            &make_row([
                ("grade_name", CellValue::from("9")),
                ("section_name", CellValue::from("A")),
            ]),
            SECTION_REQUIRED,
        );
        assert_eq!(
            build_section(&fields, &PublishedMaps::new()),
            Err(SkipReason::UnknownGrade("9".into()))
        );
    }

    #[test]
    fn test_school_keeps_optional_columns() {
        let fields = normalize(
            &make_row([
                ("school_name", CellValue::from(" Green Valley ")),
                ("number_of_staff", CellValue::Int(40)),
            ]),
            SCHOOL_REQUIRED,
        );
        let record = build_school(&fields).unwrap();
        assert_eq!(record.school_name, "Green Valley");
        assert_eq!(record.number_of_staff, CellValue::Int(40));
        assert!(record.address.is_null());
    }
}
