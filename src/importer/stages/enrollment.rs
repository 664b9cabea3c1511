// ==========================================
// 学校入驻数据加载器 - 学生业务阶段
// ==========================================
// 覆盖: Student / AttendanceRecord / FeeSummary / Installment
// 发布:
// - Student: 学生提示映射（仅本次接受的行）
// - FeeSummary: student_id → fee_id
// ==========================================

use super::{
    primary_school, process_rows, require_int, require_key, resolve_grade_section, resolve_hint,
    StageContext, StageOutput,
};
use crate::domain::mappings::{OwnerMap, Publication, PublishedMaps};
use crate::domain::records::{AttendanceEntry, FeeSummaryRecord, InstallmentRecord, StudentRecord};
use crate::domain::types::{EntityKind, Hint};
use crate::domain::value::{FieldMap, SheetRow};
use crate::importer::error::LoadResult;
use crate::importer::hint_resolver::HintResolver;
use crate::importer::natural_key::NaturalKeyResolver;
use crate::importer::skip::SkipReason;
use crate::repository::EnrollmentRepository;

const STUDENT_REQUIRED: &[&str] = &["grade_name", "section_name", "email", "student_id_hint"];
const ATTENDANCE_REQUIRED: &[&str] = &["student_id_hint", "date", "status"];
const FEE_SUMMARY_REQUIRED: &[&str] = &["student_id_hint"];
const INSTALLMENT_REQUIRED: &[&str] = &["student_id_hint", "installment_no"];

// ==========================================
// Student
// ==========================================

pub fn load_students(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let mut accepted: Vec<(Hint, String)> = Vec::new();

    let (summary, _) = process_rows(EntityKind::Student, ctx, rows, STUDENT_REQUIRED, |fields| {
        let record = build_student(fields, ctx.maps)?;
        NaturalKeyResolver::resolve_or_create(ctx.tx, &record)?;
        if let Some(hint) = fields.int("student_id_hint") {
            accepted.push((hint, record.email));
        }
        Ok(())
    })?;

    // 跨表提示: 接受的行 × 库中全部学生邮箱
    let persisted = NaturalKeyResolver::read_back(ctx.tx, EntityKind::Student, None)?;
    let hints = HintResolver::build_cross_sheet_hint_map(EntityKind::Student, &accepted, &persisted);

    Ok(StageOutput::new(summary).publish(Publication::Hint(hints)))
}

pub(crate) fn build_student(fields: &FieldMap, maps: &PublishedMaps) -> Result<StudentRecord, SkipReason> {
    let grade_name = require_key(fields, "grade_name")?;
    let section_name = require_key(fields, "section_name")?;
    let email = require_key(fields, "email")?;
    let school_id = primary_school(maps)?;
    let (grade_id, section_id) = resolve_grade_section(maps, &grade_name, &section_name)?;

    Ok(StudentRecord {
        school_id,
        grade_id,
        section_id,
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
        guardian_name: fields.value("guardian_name"),
        guardian_mobile: fields.value("guardian_mobile"),
    })
}

// ==========================================
// AttendanceRecord
// ==========================================

pub fn load_attendance(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::AttendanceRecord,
        ctx,
        rows,
        ATTENDANCE_REQUIRED,
        |fields| {
            let entry = build_attendance(fields, ctx.maps)?;
            EnrollmentRepository::upsert_attendance_tx(ctx.tx, &entry)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_attendance(fields: &FieldMap, maps: &PublishedMaps) -> Result<AttendanceEntry, SkipReason> {
    let hint = require_int(fields, "student_id_hint")?;
    require_key(fields, "date")?;
    require_key(fields, "status")?;
    let student_id = resolve_hint(maps, EntityKind::Student, hint)?;

    Ok(AttendanceEntry {
        student_id,
        attendance_date: fields.value("date"),
        status: fields.value("status"),
    })
}

// ==========================================
// FeeSummary
// ==========================================

pub fn load_fee_summaries(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::FeeSummary,
        ctx,
        rows,
        FEE_SUMMARY_REQUIRED,
        |fields| {
            let fee = build_fee_summary(fields, ctx.maps)?;
            EnrollmentRepository::upsert_fee_summary_tx(ctx.tx, &fee)?;
            Ok(())
        },
    )?;

    let owners = OwnerMap::from_entries(
        EntityKind::FeeSummary,
        EnrollmentRepository::list_fee_owners_tx(ctx.tx)?,
    );
    Ok(StageOutput::new(summary).publish(Publication::Owner(owners)))
}

pub(crate) fn build_fee_summary(
    fields: &FieldMap,
    maps: &PublishedMaps,
) -> Result<FeeSummaryRecord, SkipReason> {
    let hint = require_int(fields, "student_id_hint")?;
    let student_id = resolve_hint(maps, EntityKind::Student, hint)?;

    Ok(FeeSummaryRecord {
        student_id,
        total_fee: fields.value("total_fee"),
        concession: fields.value("concession"),
        net_payable: fields.value("net_payable"),
        amount_paid: fields.value("amount_paid"),
    })
}

// ==========================================
// Installment
// ==========================================

pub fn load_installments(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::Installment,
        ctx,
        rows,
        INSTALLMENT_REQUIRED,
        |fields| {
            let installment = build_installment(fields, ctx.maps)?;
            EnrollmentRepository::upsert_installment_tx(ctx.tx, &installment)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_installment(
    fields: &FieldMap,
    maps: &PublishedMaps,
) -> Result<InstallmentRecord, SkipReason> {
    let hint = require_int(fields, "student_id_hint")?;
    let installment_no = require_int(fields, "installment_no")?;
    let student_id = resolve_hint(maps, EntityKind::Student, hint)?;
    let fee_id = maps
        .resolve_owner(EntityKind::FeeSummary, student_id)
        .ok_or(SkipReason::UnknownFeeSummary { student_id })?;

    Ok(InstallmentRecord {
        fee_id,
        installment_no,
        amount: fields.value("amount"),
        due_date: fields.value("due_date"),
        paid_date: fields.value("paid_date"),
        paid_status: fields.value("paid_status"),
    })
}
