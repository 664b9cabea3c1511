// ==========================================
// 学校入驻数据加载器 - 领域类型定义
// ==========================================
// 职责: 实体种类、标识符、批次提示号
// 红线: 提示号 (hint) 仅在单次加载内有效,不落库
// ==========================================

use serde::{Deserialize, Serialize};
use std::fmt;

/// 目标库自增主键
pub type Identifier = i64;

/// 批次内提示号（teacher_id_hint / subject_id_hint / student_id_hint）
pub type Hint = i64;

// ==========================================
// 实体种类 (Entity Kind)
// ==========================================
// 声明顺序 = 拓扑排序并列时的优先顺序
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    School,
    Grade,
    Section,
    Subject,
    Teacher,
    Student,
    TeacherSubject,
    TeacherGradeSection,
    Timeslot,
    TimetableEntry,
    AttendanceRecord,
    HomeworkAssignment,
    ClassDiaryEntry,
    FeeSummary,
    Installment,
    SalaryStructure,
    SalaryPayslip,
}

impl EntityKind {
    /// 全部实体种类（声明顺序）
    pub const ALL: [EntityKind; 17] = [
        EntityKind::School,
        EntityKind::Grade,
        EntityKind::Section,
        EntityKind::Subject,
        EntityKind::Teacher,
        EntityKind::Student,
        EntityKind::TeacherSubject,
        EntityKind::TeacherGradeSection,
        EntityKind::Timeslot,
        EntityKind::TimetableEntry,
        EntityKind::AttendanceRecord,
        EntityKind::HomeworkAssignment,
        EntityKind::ClassDiaryEntry,
        EntityKind::FeeSummary,
        EntityKind::Installment,
        EntityKind::SalaryStructure,
        EntityKind::SalaryPayslip,
    ];

    /// 工作簿中的默认工作表名
    pub fn default_sheet_name(self) -> &'static str {
        match self {
            EntityKind::School => "schools",
            EntityKind::Grade => "grades",
            EntityKind::Section => "sections",
            EntityKind::Subject => "subjects",
            EntityKind::Teacher => "teachers",
            EntityKind::Student => "students",
            EntityKind::TeacherSubject => "teacher_subjects",
            EntityKind::TeacherGradeSection => "teacher_grade_section",
            EntityKind::Timeslot => "timeslots",
            EntityKind::TimetableEntry => "timetable",
            EntityKind::AttendanceRecord => "attendance",
            EntityKind::HomeworkAssignment => "homework",
            EntityKind::ClassDiaryEntry => "class_diary",
            EntityKind::FeeSummary => "fees_summary",
            EntityKind::Installment => "installments",
            EntityKind::SalaryStructure => "salary_structure",
            EntityKind::SalaryPayslip => "salary_payslips",
        }
    }

    /// 目标库表名
    pub fn table_name(self) -> &'static str {
        match self {
            EntityKind::School => "ss_t_schools",
            EntityKind::Grade => "ss_t_grades",
            EntityKind::Section => "ss_t_sections",
            EntityKind::Subject => "ss_t_subjects",
            EntityKind::Teacher => "ss_t_teachers",
            EntityKind::Student => "ss_t_students",
            EntityKind::TeacherSubject => "ss_t_teacher_subject",
            EntityKind::TeacherGradeSection => "ss_t_teacher_grade_section",
            EntityKind::Timeslot => "ss_t_timeslots",
            EntityKind::TimetableEntry => "ss_t_timetable",
            EntityKind::AttendanceRecord => "ss_t_attendance",
            EntityKind::HomeworkAssignment => "ss_t_homework_details",
            EntityKind::ClassDiaryEntry => "ss_t_class_diary",
            EntityKind::FeeSummary => "ss_t_fees_summary",
            EntityKind::Installment => "ss_t_installments",
            EntityKind::SalaryStructure => "ss_t_teacher_salary_structure",
            EntityKind::SalaryPayslip => "ss_t_teacher_salary_payslip",
        }
    }

    /// 外键依赖（本种类开始前必须完成的种类）
    pub fn dependencies(self) -> &'static [EntityKind] {
        use EntityKind::*;
        match self {
            School | Timeslot => &[],
            Grade | Subject | Teacher => &[School],
            Section => &[Grade],
            Student => &[School, Grade, Section],
            TeacherSubject => &[Teacher, Subject],
            TeacherGradeSection => &[Teacher, Grade, Section],
            TimetableEntry => &[Grade, Section, Timeslot, Subject, Teacher],
            AttendanceRecord | FeeSummary => &[Student],
            HomeworkAssignment | ClassDiaryEntry => &[Teacher, Grade, Section, Subject],
            Installment => &[Student, FeeSummary],
            SalaryStructure | SalaryPayslip => &[Teacher],
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::School => "School",
            EntityKind::Grade => "Grade",
            EntityKind::Section => "Section",
            EntityKind::Subject => "Subject",
            EntityKind::Teacher => "Teacher",
            EntityKind::Student => "Student",
            EntityKind::TeacherSubject => "TeacherSubject",
            EntityKind::TeacherGradeSection => "TeacherGradeSection",
            EntityKind::Timeslot => "Timeslot",
            EntityKind::TimetableEntry => "TimetableEntry",
            EntityKind::AttendanceRecord => "AttendanceRecord",
            EntityKind::HomeworkAssignment => "HomeworkAssignment",
            EntityKind::ClassDiaryEntry => "ClassDiaryEntry",
            EntityKind::FeeSummary => "FeeSummary",
            EntityKind::Installment => "Installment",
            EntityKind::SalaryStructure => "SalaryStructure",
            EntityKind::SalaryPayslip => "SalaryPayslip",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_all_kinds_have_distinct_sheets_and_tables() {
        let sheets: HashSet<_> = EntityKind::ALL.iter().map(|k| k.default_sheet_name()).collect();
        let tables: HashSet<_> = EntityKind::ALL.iter().map(|k| k.table_name()).collect();
        assert_eq!(sheets.len(), 17);
        assert_eq!(tables.len(), 17);
    }

    #[test]
    fn test_dependencies_precede_in_declaration_order() {
        for kind in EntityKind::ALL {
            for dep in kind.dependencies() {
                assert!(dep < &kind, "{} 依赖 {} 但声明在其之后", kind, dep);
            }
        }
    }
}
