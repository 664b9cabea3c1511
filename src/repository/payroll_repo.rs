// ==========================================
// 学校入驻数据加载器 - 教师薪资仓储
// ==========================================
// 策略: 财务快照,冲突时覆盖全部金额列
// ==========================================

use crate::domain::records::{PayslipRecord, SalaryStructureRecord};
use crate::repository::error::RepositoryResult;
use rusqlite::{params, Transaction};

pub struct PayrollRepository;

impl PayrollRepository {
    /// 薪资结构（每位教师一条）
    pub fn upsert_salary_structure_tx(
        tx: &Transaction,
        salary: &SalaryStructureRecord,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_teacher_salary_structure (teacher_id, basic_pay, allowances, deductions)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(teacher_id) DO UPDATE SET
                basic_pay = excluded.basic_pay,
                allowances = excluded.allowances,
                deductions = excluded.deductions
            "#,
            params![
                salary.teacher_id,
                salary.basic_pay,
                salary.allowances,
                salary.deductions,
            ],
        )?;
        Ok(())
    }

    /// 工资单（每位教师每月一条）
    pub fn upsert_payslip_tx(tx: &Transaction, payslip: &PayslipRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_teacher_salary_payslip (
                teacher_id, year, month, basic_pay, allowances, deductions, net_pay
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ON CONFLICT(teacher_id, year, month) DO UPDATE SET
                basic_pay = excluded.basic_pay,
                allowances = excluded.allowances,
                deductions = excluded.deductions,
                net_pay = excluded.net_pay
            "#,
            params![
                payslip.teacher_id,
                payslip.year,
                payslip.month,
                payslip.basic_pay,
                payslip.allowances,
                payslip.deductions,
                payslip.net_pay,
            ],
        )?;
        Ok(())
    }
}
