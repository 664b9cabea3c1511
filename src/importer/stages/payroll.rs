// ==========================================
// 学校入驻数据加载器 - 教师薪资阶段
// ==========================================
// 覆盖: SalaryStructure / SalaryPayslip
// 引用: 教师映射（teacher_email）
// ==========================================

use super::{process_rows, require_int, require_key, resolve_teacher, StageContext, StageOutput};
use crate::domain::mappings::PublishedMaps;
use crate::domain::records::{PayslipRecord, SalaryStructureRecord};
use crate::domain::types::EntityKind;
use crate::domain::value::{FieldMap, SheetRow};
use crate::importer::error::LoadResult;
use crate::importer::skip::SkipReason;
use crate::repository::PayrollRepository;

const SALARY_STRUCTURE_REQUIRED: &[&str] = &["teacher_email"];
const PAYSLIP_REQUIRED: &[&str] = &["teacher_email", "year", "month"];

pub fn load_salary_structures(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(
        EntityKind::SalaryStructure,
        ctx,
        rows,
        SALARY_STRUCTURE_REQUIRED,
        |fields| {
            let salary = build_salary_structure(fields, ctx.maps)?;
            PayrollRepository::upsert_salary_structure_tx(ctx.tx, &salary)?;
            Ok(())
        },
    )?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_salary_structure(
    fields: &FieldMap,
    maps: &PublishedMaps,
) -> Result<SalaryStructureRecord, SkipReason> {
    let email = require_key(fields, "teacher_email")?;
    Ok(SalaryStructureRecord {
        teacher_id: resolve_teacher(maps, &email)?,
        basic_pay: fields.value("basic_pay"),
        allowances: fields.value("allowances"),
        deductions: fields.value("deductions"),
    })
}

pub fn load_payslips(ctx: &StageContext<'_>, rows: &[SheetRow]) -> LoadResult<StageOutput> {
    let (summary, _) = process_rows(EntityKind::SalaryPayslip, ctx, rows, PAYSLIP_REQUIRED, |fields| {
        let payslip = build_payslip(fields, ctx.maps)?;
        PayrollRepository::upsert_payslip_tx(ctx.tx, &payslip)?;
        Ok(())
    })?;
    Ok(StageOutput::new(summary))
}

pub(crate) fn build_payslip(fields: &FieldMap, maps: &PublishedMaps) -> Result<PayslipRecord, SkipReason> {
    let email = require_key(fields, "teacher_email")?;
    let year = require_int(fields, "year")?;
    let month = require_int(fields, "month")?;
    Ok(PayslipRecord {
        teacher_id: resolve_teacher(maps, &email)?,
        year,
        month,
        basic_pay: fields.value("basic_pay"),
        allowances: fields.value("allowances"),
        deductions: fields.value("deductions"),
        net_pay: fields.value("net_pay"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::mappings::{NaturalKeyMap, Publication};
    use crate::domain::value::{make_row, CellValue};
    use crate::importer::row_normalizer::normalize;

    fn teacher_maps() -> PublishedMaps {
        PublishedMaps::new()
            .publish(Publication::Natural(NaturalKeyMap::from_entries(
                EntityKind::Teacher,
                [("t@x.org".to_string(), 7)],
            )))
            .unwrap()
    }

    #[test]
    fn test_payslip_truncates_float_year_and_month() {
        let fields = normalize(
            &make_row([
                ("teacher_email", CellValue::from("t@x.org")),
                ("year", CellValue::Float(2024.0)),
                ("month", CellValue::Float(5.0)),
                ("net_pay", CellValue::Float(41000.0)),
            ]),
            PAYSLIP_REQUIRED,
        );
        let payslip = build_payslip(&fields, &teacher_maps()).unwrap();
        assert_eq!((payslip.teacher_id, payslip.year, payslip.month), (7, 2024, 5));
        assert_eq!(payslip.net_pay, CellValue::Float(41000.0));
    }

    #[test]
    fn test_salary_structure_skips_unknown_teacher() {
        let fields = normalize(
            &make_row([("teacher_email", CellValue::from("ghost@x.org"))]),
            SALARY_STRUCTURE_REQUIRED,
        );
        assert_eq!(
            build_salary_structure(&fields, &teacher_maps()),
            Err(SkipReason::UnknownTeacher("ghost@x.org".into()))
        );
    }
}
