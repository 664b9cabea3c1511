// ==========================================
// 学校入驻数据加载器 - 实体记录
// ==========================================
// 职责: 每种实体一条已解析记录（外键已替换为真实标识符）
// 约定: 键列为强类型,其余列保持 CellValue（可为 NULL）
// 对齐: ss_t_* 目标表
// ==========================================

use crate::domain::types::Identifier;
use crate::domain::value::CellValue;

// ==========================================
// 组织结构: 学校 / 年级 / 班级 / 科目 / 教师
// ==========================================

/// ss_t_schools
#[derive(Debug, Clone, PartialEq)]
pub struct SchoolRecord {
    pub school_name: String, // 唯一键
    pub profile_pic_location: CellValue,
    pub address: CellValue,
    pub primary_phone_number: CellValue,
    pub secondary_phone_number: CellValue,
    pub email: CellValue,
    pub established_year: CellValue,
    pub medium_of_instruction: CellValue,
    pub principal_head_name: CellValue,
    pub administrative_contact: CellValue,
    pub number_of_staff: CellValue,
    pub is_active: CellValue,
}

/// ss_t_grades（唯一键: school_id + grade_name）
#[derive(Debug, Clone, PartialEq)]
pub struct GradeRecord {
    pub school_id: Identifier,
    pub grade_name: String,
    pub description: CellValue,
    pub tuition_fee: CellValue,
    pub admission_fee: CellValue,
    pub development_fee: CellValue,
    pub activity_fee: CellValue,
    pub lab_fee: CellValue,
    pub transportation_fee: CellValue,
    pub late_fee_penalty: CellValue,
    pub annual_event_fee: CellValue,
    pub examination_fee: CellValue,
    pub other_fee: CellValue,
    pub payment_methods_accepted: CellValue,
}

/// ss_t_sections（唯一键: grade_id + section_name）
#[derive(Debug, Clone, PartialEq)]
pub struct SectionRecord {
    pub grade_id: Identifier,
    pub section_name: String,
    pub capacity: CellValue,
}

/// ss_t_subjects（唯一键: school_id + subject_name）
#[derive(Debug, Clone, PartialEq)]
pub struct SubjectRecord {
    pub school_id: Identifier,
    pub subject_name: String,
}

/// ss_t_teachers（唯一键: school_id + email）
#[derive(Debug, Clone, PartialEq)]
pub struct TeacherRecord {
    pub school_id: Identifier,
    pub email: String,
    pub first_name: CellValue,
    pub middle_name: CellValue,
    pub last_name: CellValue,
    pub profile_pic_location: CellValue,
    pub gender: CellValue,
    pub date_of_birth: CellValue,
    pub mobile_number: CellValue,
    pub communication_address: CellValue,
    pub languages_known: CellValue,
}

// ==========================================
// 学生与学生业务: 学生 / 考勤 / 学费 / 分期
// ==========================================

/// ss_t_students（唯一键: email,全局）
#[derive(Debug, Clone, PartialEq)]
pub struct StudentRecord {
    pub school_id: Identifier,
    pub grade_id: Identifier,
    pub section_id: Identifier,
    pub email: String,
    pub first_name: CellValue,
    pub middle_name: CellValue,
    pub last_name: CellValue,
    pub profile_pic_location: CellValue,
    pub gender: CellValue,
    pub date_of_birth: CellValue,
    pub mobile_number: CellValue,
    pub communication_address: CellValue,
    pub languages_known: CellValue,
    pub guardian_name: CellValue,
    pub guardian_mobile: CellValue,
}

/// ss_t_attendance（唯一键: student_id + attendance_date）
#[derive(Debug, Clone, PartialEq)]
pub struct AttendanceEntry {
    pub student_id: Identifier,
    pub attendance_date: CellValue,
    pub status: CellValue,
}

/// ss_t_fees_summary（唯一键: student_id）
#[derive(Debug, Clone, PartialEq)]
pub struct FeeSummaryRecord {
    pub student_id: Identifier,
    pub total_fee: CellValue,
    pub concession: CellValue,
    pub net_payable: CellValue,
    pub amount_paid: CellValue,
}

/// ss_t_installments（唯一键: fee_id + installment_no）
#[derive(Debug, Clone, PartialEq)]
pub struct InstallmentRecord {
    pub fee_id: Identifier,
    pub installment_no: i64,
    pub amount: CellValue,
    pub due_date: CellValue,
    pub paid_date: CellValue,
    pub paid_status: CellValue,
}

// ==========================================
// 教学安排: 任课 / 课时 / 课表 / 作业 / 班级日志
// ==========================================

/// ss_t_teacher_subject
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeacherSubjectLink {
    pub teacher_id: Identifier,
    pub subject_id: Identifier,
}

/// ss_t_teacher_grade_section
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TeacherGradeSectionLink {
    pub teacher_id: Identifier,
    pub grade_id: Identifier,
    pub section_id: Identifier,
}

/// ss_t_timeslots（唯一键: day_of_week + period_number）
#[derive(Debug, Clone, PartialEq)]
pub struct TimeslotRecord {
    pub day_of_week: String,
    pub period_number: i64,
    pub start_time: CellValue,
    pub end_time: CellValue,
}

/// ss_t_timetable（唯一键: grade_id + section_id + timeslot_id）
#[derive(Debug, Clone, PartialEq)]
pub struct TimetableRecord {
    pub grade_id: Identifier,
    pub section_id: Identifier,
    pub timeslot_id: Identifier,
    pub subject_id: Identifier,
    pub teacher_id: Identifier,
    pub room_number: CellValue,
}

/// ss_t_homework_details（自增主键,按内容键查重）
#[derive(Debug, Clone, PartialEq)]
pub struct HomeworkRecord {
    pub teacher_id: Identifier,
    pub grade_id: Identifier,
    pub section_id: Identifier,
    pub subject_id: Identifier,
    pub title: String,
    pub assigned_date: CellValue,
    pub more_details: CellValue,
    pub due_date: CellValue,
    pub status: CellValue,
}

/// ss_t_class_diary（自增主键,按内容键查重）
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDiaryRecord {
    pub teacher_id: Identifier,
    pub grade_id: Identifier,
    pub section_id: Identifier,
    pub subject_id: Identifier,
    pub entry_date: CellValue,
    pub title: String,
    pub description: CellValue,
}

// ==========================================
// 薪资: 薪资结构 / 工资单
// ==========================================

/// ss_t_teacher_salary_structure（唯一键: teacher_id）
#[derive(Debug, Clone, PartialEq)]
pub struct SalaryStructureRecord {
    pub teacher_id: Identifier,
    pub basic_pay: CellValue,
    pub allowances: CellValue,
    pub deductions: CellValue,
}

/// ss_t_teacher_salary_payslip（唯一键: teacher_id + year + month）
#[derive(Debug, Clone, PartialEq)]
pub struct PayslipRecord {
    pub teacher_id: Identifier,
    pub year: i64,
    pub month: i64,
    pub basic_pay: CellValue,
    pub allowances: CellValue,
    pub deductions: CellValue,
    pub net_pay: CellValue,
}
