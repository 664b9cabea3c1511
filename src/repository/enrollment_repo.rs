// ==========================================
// 学校入驻数据加载器 - 学生业务仓储
// ==========================================
// 职责: 学生 / 考勤 / 学费汇总 / 分期 的写入与回读
// 策略:
// - 学生冲突时只同步姓名与监护人列
// - 学费与分期属于财务快照,冲突时覆盖全部非键列
// ==========================================

use crate::domain::records::{AttendanceEntry, FeeSummaryRecord, InstallmentRecord, StudentRecord};
use crate::domain::types::{EntityKind, Identifier};
use crate::repository::error::RepositoryResult;
use crate::repository::identity::{query_key_pairs, IdentityUpsert};
use rusqlite::{params, Transaction};

impl IdentityUpsert for StudentRecord {
    const KIND: EntityKind = EntityKind::Student;

    fn natural_key(&self) -> String {
        self.email.clone()
    }

    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier> {
        let id = tx.query_row(
            r#"
            INSERT INTO ss_t_students (
                school_id, grade_id, section_id, first_name, middle_name, last_name,
                profile_pic_location, gender, date_of_birth, mobile_number, email,
                communication_address, languages_known, guardian_name, guardian_mobile
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15)
            ON CONFLICT(email) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                guardian_name = excluded.guardian_name,
                guardian_mobile = excluded.guardian_mobile
            RETURNING student_id
            "#,
            params![
                self.school_id,
                self.grade_id,
                self.section_id,
                self.first_name,
                self.middle_name,
                self.last_name,
                self.profile_pic_location,
                self.gender,
                self.date_of_birth,
                self.mobile_number,
                self.email,
                self.communication_address,
                self.languages_known,
                self.guardian_name,
                self.guardian_mobile,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

// ==========================================
// EnrollmentRepository
// ==========================================
pub struct EnrollmentRepository;

impl EnrollmentRepository {
    /// 全部学生: email → student_id（email 为 NULL 的记录不参与）
    pub fn list_student_emails_tx(tx: &Transaction) -> RepositoryResult<Vec<(String, Identifier)>> {
        query_key_pairs(
            tx,
            "SELECT student_id, email FROM ss_t_students WHERE email IS NOT NULL",
            [],
        )
    }

    /// 考勤: 冲突时更新 status
    pub fn upsert_attendance_tx(tx: &Transaction, entry: &AttendanceEntry) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_attendance (student_id, attendance_date, status)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(student_id, attendance_date) DO UPDATE SET
                status = excluded.status
            "#,
            params![entry.student_id, entry.attendance_date, entry.status],
        )?;
        Ok(())
    }

    /// 学费汇总: 冲突时覆盖全部金额列
    pub fn upsert_fee_summary_tx(tx: &Transaction, fee: &FeeSummaryRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_fees_summary (student_id, total_fee, concession, net_payable, amount_paid)
            VALUES (?1, ?2, ?3, ?4, ?5)
            ON CONFLICT(student_id) DO UPDATE SET
                total_fee = excluded.total_fee,
                concession = excluded.concession,
                net_payable = excluded.net_payable,
                amount_paid = excluded.amount_paid
            "#,
            params![
                fee.student_id,
                fee.total_fee,
                fee.concession,
                fee.net_payable,
                fee.amount_paid,
            ],
        )?;
        Ok(())
    }

    /// 全部学费汇总: student_id → fee_id
    pub fn list_fee_owners_tx(tx: &Transaction) -> RepositoryResult<Vec<(Identifier, Identifier)>> {
        let mut stmt = tx.prepare("SELECT student_id, fee_id FROM ss_t_fees_summary")?;
        let rows = stmt.query_map([], |row| {
            Ok((row.get::<_, Identifier>(0)?, row.get::<_, Identifier>(1)?))
        })?;

        let mut owners = Vec::new();
        for row in rows {
            owners.push(row?);
        }
        Ok(owners)
    }

    /// 分期: 冲突时覆盖金额、日期与支付状态
    pub fn upsert_installment_tx(
        tx: &Transaction,
        installment: &InstallmentRecord,
    ) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_installments (fee_id, installment_no, amount, due_date, paid_date, paid_status)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            ON CONFLICT(fee_id, installment_no) DO UPDATE SET
                amount = excluded.amount,
                due_date = excluded.due_date,
                paid_date = excluded.paid_date,
                paid_status = excluded.paid_status
            "#,
            params![
                installment.fee_id,
                installment.installment_no,
                installment.amount,
                installment.due_date,
                installment.paid_date,
                installment.paid_status,
            ],
        )?;
        Ok(())
    }
}
