// ==========================================
// 学校入驻数据加载器 - 组织结构仓储
// ==========================================
// 职责: 学校 / 年级 / 班级 / 科目 / 教师 的写入与回读
// 红线: Repository 不含解析规则,只做参数化 SQL
// 策略: 冲突时只更新身份列,不覆盖费用/状态列
// ==========================================

use crate::domain::records::{GradeRecord, SchoolRecord, SectionRecord, SubjectRecord, TeacherRecord};
use crate::domain::types::{EntityKind, Identifier};
use crate::repository::error::RepositoryResult;
use crate::repository::identity::{query_key_pairs, IdentityUpsert};
use rusqlite::{params, Transaction};

// ==========================================
// 自然键写入
// ==========================================

impl IdentityUpsert for SchoolRecord {
    const KIND: EntityKind = EntityKind::School;

    fn natural_key(&self) -> String {
        self.school_name.clone()
    }

    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier> {
        let id = tx.query_row(
            r#"
            INSERT INTO ss_t_schools (
                school_name, profile_pic_location, address, primary_phone_number,
                secondary_phone_number, email, established_year, medium_of_instruction,
                principal_head_name, administrative_contact, number_of_staff, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)
            ON CONFLICT(school_name) DO UPDATE SET
                school_name = excluded.school_name
            RETURNING school_id
            "#,
            params![
                self.school_name,
                self.profile_pic_location,
                self.address,
                self.primary_phone_number,
                self.secondary_phone_number,
                self.email,
                self.established_year,
                self.medium_of_instruction,
                self.principal_head_name,
                self.administrative_contact,
                self.number_of_staff,
                self.is_active,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

impl IdentityUpsert for GradeRecord {
    const KIND: EntityKind = EntityKind::Grade;

    fn natural_key(&self) -> String {
        self.grade_name.clone()
    }

    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier> {
        let id = tx.query_row(
            r#"
            INSERT INTO ss_t_grades (
                school_id, grade_name, description, tuition_fee, admission_fee,
                development_fee, activity_fee, lab_fee, transportation_fee,
                late_fee_penalty, annual_event_fee, examination_fee, other_fee,
                payment_methods_accepted
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)
            ON CONFLICT(school_id, grade_name) DO UPDATE SET
                description = excluded.description
            RETURNING grade_id
            "#,
            params![
                self.school_id,
                self.grade_name,
                self.description,
                self.tuition_fee,
                self.admission_fee,
                self.development_fee,
                self.activity_fee,
                self.lab_fee,
                self.transportation_fee,
                self.late_fee_penalty,
                self.annual_event_fee,
                self.examination_fee,
                self.other_fee,
                self.payment_methods_accepted,
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

impl IdentityUpsert for SectionRecord {
    const KIND: EntityKind = EntityKind::Section;

    fn natural_key(&self) -> String {
        format!("{}/{}", self.grade_id, self.section_name)
    }

    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier> {
        let id = tx.query_row(
            r#"
            INSERT INTO ss_t_sections (grade_id, section_name, capacity)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(grade_id, section_name) DO UPDATE SET
                capacity = excluded.capacity
            RETURNING section_id
            "#,
            params![self.grade_id, self.section_name, self.capacity],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

impl IdentityUpsert for SubjectRecord {
    const KIND: EntityKind = EntityKind::Subject;

    fn natural_key(&self) -> String {
        self.subject_name.clone()
    }

    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier> {
        let id = tx.query_row(
            r#"
            INSERT INTO ss_t_subjects (school_id, subject_name)
            VALUES (?1, ?2)
            ON CONFLICT(school_id, subject_name) DO UPDATE SET
                subject_name = excluded.subject_name
            RETURNING subject_id
            "#,
            params![self.school_id, self.subject_name],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

impl IdentityUpsert for TeacherRecord {
    const KIND: EntityKind = EntityKind::Teacher;

    fn natural_key(&self) -> String {
        self.email.clone()
    }

    fn upsert_returning_id(&self, tx: &Transaction) -> RepositoryResult<Identifier> {
        let id = tx.query_row(
            r#"
            INSERT INTO ss_t_teachers (
                school_id, first_name, middle_name, last_name, profile_pic_location,
                gender, date_of_birth, mobile_number, email, communication_address,
                languages_known, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, 1)
            ON CONFLICT(school_id, email) DO UPDATE SET
                first_name = excluded.first_name,
                last_name = excluded.last_name,
                is_active = 1
            RETURNING teacher_id
            "#,
            params![
                self.school_id,
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
            ],
            |row| row.get(0),
        )?;
        Ok(id)
    }
}

// ==========================================
// OrganizationRepository - 回读查询
// ==========================================
pub struct OrganizationRepository;

impl OrganizationRepository {
    /// 全部学校: school_name → school_id
    pub fn list_schools_tx(tx: &Transaction) -> RepositoryResult<Vec<(String, Identifier)>> {
        query_key_pairs(tx, "SELECT school_id, school_name FROM ss_t_schools", [])
    }

    /// 学校内年级: grade_name → grade_id
    pub fn list_grades_tx(
        tx: &Transaction,
        school_id: Identifier,
    ) -> RepositoryResult<Vec<(String, Identifier)>> {
        query_key_pairs(
            tx,
            "SELECT grade_id, grade_name FROM ss_t_grades WHERE school_id = ?1",
            params![school_id],
        )
    }

    /// 年级内班级: section_name → section_id
    pub fn list_sections_tx(
        tx: &Transaction,
        grade_id: Identifier,
    ) -> RepositoryResult<Vec<(String, Identifier)>> {
        query_key_pairs(
            tx,
            "SELECT section_id, section_name FROM ss_t_sections WHERE grade_id = ?1",
            params![grade_id],
        )
    }

    /// 学校内科目: subject_name → subject_id
    pub fn list_subjects_tx(
        tx: &Transaction,
        school_id: Identifier,
    ) -> RepositoryResult<Vec<(String, Identifier)>> {
        query_key_pairs(
            tx,
            "SELECT subject_id, subject_name FROM ss_t_subjects WHERE school_id = ?1",
            params![school_id],
        )
    }

    /// 学校内教师: email → teacher_id
    pub fn list_teachers_tx(
        tx: &Transaction,
        school_id: Identifier,
    ) -> RepositoryResult<Vec<(String, Identifier)>> {
        query_key_pairs(
            tx,
            "SELECT teacher_id, email FROM ss_t_teachers WHERE school_id = ?1",
            params![school_id],
        )
    }
}
