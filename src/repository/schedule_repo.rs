// ==========================================
// 学校入驻数据加载器 - 教学安排仓储
// ==========================================
// 职责: 任课关系 / 课时 / 课表 / 作业 / 班级日志
// 策略:
// - 任课关系冲突时不做任何更新 (DO NOTHING)
// - 课时按 (day_of_week, period_number) 实时查询,不走内存映射
// - 作业与班级日志无唯一约束,按内容键查重后更新或插入
// ==========================================

use crate::domain::records::{
    ClassDiaryRecord, HomeworkRecord, TeacherGradeSectionLink, TeacherSubjectLink,
    TimeslotRecord, TimetableRecord,
};
use crate::domain::types::Identifier;
use crate::repository::error::RepositoryResult;
use rusqlite::{params, OptionalExtension, Transaction};

pub struct ScheduleRepository;

impl ScheduleRepository {
    // ==========================================
    // 任课关系
    // ==========================================

    /// 教师-科目关系; 已存在时不变
    ///
    /// # 返回
    /// 实际新增行数（0 或 1）
    pub fn link_teacher_subject_tx(
        tx: &Transaction,
        link: &TeacherSubjectLink,
    ) -> RepositoryResult<usize> {
        let inserted = tx.execute(
            r#"
            INSERT INTO ss_t_teacher_subject (teacher_id, subject_id)
            VALUES (?1, ?2)
            ON CONFLICT(teacher_id, subject_id) DO NOTHING
            "#,
            params![link.teacher_id, link.subject_id],
        )?;
        Ok(inserted)
    }

    /// 教师-年级-班级关系; 已存在时不变
    pub fn link_teacher_grade_section_tx(
        tx: &Transaction,
        link: &TeacherGradeSectionLink,
    ) -> RepositoryResult<usize> {
        let inserted = tx.execute(
            r#"
            INSERT INTO ss_t_teacher_grade_section (teacher_id, grade_id, section_id)
            VALUES (?1, ?2, ?3)
            ON CONFLICT(teacher_id, grade_id, section_id) DO NOTHING
            "#,
            params![link.teacher_id, link.grade_id, link.section_id],
        )?;
        Ok(inserted)
    }

    // ==========================================
    // 课时与课表
    // ==========================================

    pub fn upsert_timeslot_tx(tx: &Transaction, slot: &TimeslotRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_timeslots (day_of_week, period_number, start_time, end_time)
            VALUES (?1, ?2, ?3, ?4)
            ON CONFLICT(day_of_week, period_number) DO UPDATE SET
                start_time = excluded.start_time,
                end_time = excluded.end_time
            "#,
            params![slot.day_of_week, slot.period_number, slot.start_time, slot.end_time],
        )?;
        Ok(())
    }

    /// 按 (星期, 节次) 查询课时标识符
    pub fn find_timeslot_tx(
        tx: &Transaction,
        day_of_week: &str,
        period_number: i64,
    ) -> RepositoryResult<Option<Identifier>> {
        let id = tx
            .query_row(
                "SELECT timeslot_id FROM ss_t_timeslots WHERE day_of_week = ?1 AND period_number = ?2",
                params![day_of_week, period_number],
                |row| row.get(0),
            )
            .optional()?;
        Ok(id)
    }

    /// 课表: 新建时 is_active = 1; 冲突时更新科目、教师、教室
    pub fn upsert_timetable_tx(tx: &Transaction, entry: &TimetableRecord) -> RepositoryResult<()> {
        tx.execute(
            r#"
            INSERT INTO ss_t_timetable (
                grade_id, section_id, timeslot_id, subject_id, teacher_id, room_number, is_active
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1)
            ON CONFLICT(grade_id, section_id, timeslot_id) DO UPDATE SET
                subject_id = excluded.subject_id,
                teacher_id = excluded.teacher_id,
                room_number = excluded.room_number
            "#,
            params![
                entry.grade_id,
                entry.section_id,
                entry.timeslot_id,
                entry.subject_id,
                entry.teacher_id,
                entry.room_number,
            ],
        )?;
        Ok(())
    }

    // ==========================================
    // 作业与班级日志（内容键查重）
    // ==========================================

    /// 作业: 内容键 (教师, 年级, 班级, 科目, 标题, 布置日期)
    pub fn upsert_homework_tx(tx: &Transaction, homework: &HomeworkRecord) -> RepositoryResult<()> {
        let existing: Option<Identifier> = tx
            .query_row(
                r#"
                SELECT homework_id FROM ss_t_homework_details
                WHERE teacher_id = ?1 AND grade_id = ?2 AND section_id = ?3
                  AND subject_id = ?4 AND title = ?5 AND assigned_date IS ?6
                ORDER BY homework_id
                LIMIT 1
                "#,
                params![
                    homework.teacher_id,
                    homework.grade_id,
                    homework.section_id,
                    homework.subject_id,
                    homework.title,
                    homework.assigned_date,
                ],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(homework_id) => {
                tx.execute(
                    r#"
                    UPDATE ss_t_homework_details
                    SET more_details = ?1, due_date = ?2, status = ?3
                    WHERE homework_id = ?4
                    "#,
                    params![
                        homework.more_details,
                        homework.due_date,
                        homework.status,
                        homework_id,
                    ],
                )?;
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO ss_t_homework_details (
                        teacher_id, grade_id, section_id, subject_id, title,
                        more_details, assigned_date, due_date, status
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
                    "#,
                    params![
                        homework.teacher_id,
                        homework.grade_id,
                        homework.section_id,
                        homework.subject_id,
                        homework.title,
                        homework.more_details,
                        homework.assigned_date,
                        homework.due_date,
                        homework.status,
                    ],
                )?;
            }
        }
        Ok(())
    }

    /// 班级日志: 内容键 (教师, 年级, 班级, 科目, 日期, 标题)
    pub fn upsert_class_diary_tx(tx: &Transaction, entry: &ClassDiaryRecord) -> RepositoryResult<()> {
        let existing: Option<Identifier> = tx
            .query_row(
                r#"
                SELECT diary_id FROM ss_t_class_diary
                WHERE teacher_id = ?1 AND grade_id = ?2 AND section_id = ?3
                  AND subject_id = ?4 AND entry_date IS ?5 AND title = ?6
                ORDER BY diary_id
                LIMIT 1
                "#,
                params![
                    entry.teacher_id,
                    entry.grade_id,
                    entry.section_id,
                    entry.subject_id,
                    entry.entry_date,
                    entry.title,
                ],
                |row| row.get(0),
            )
            .optional()?;

        match existing {
            Some(diary_id) => {
                tx.execute(
                    "UPDATE ss_t_class_diary SET description = ?1 WHERE diary_id = ?2",
                    params![entry.description, diary_id],
                )?;
            }
            None => {
                tx.execute(
                    r#"
                    INSERT INTO ss_t_class_diary (
                        teacher_id, grade_id, section_id, subject_id, entry_date, title, description
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    "#,
                    params![
                        entry.teacher_id,
                        entry.grade_id,
                        entry.section_id,
                        entry.subject_id,
                        entry.entry_date,
                        entry.title,
                        entry.description,
                    ],
                )?;
            }
        }
        Ok(())
    }
}
