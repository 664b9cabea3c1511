// ==========================================
// 学校入驻数据加载器 - 跳过原因与阶段汇总
// ==========================================
// 策略: 引用无法解析 / 必填缺失 → 跳过该行（不报错）
//       每次跳过记 debug 日志,并按原因计数
// ==========================================

use crate::domain::types::{EntityKind, Hint, Identifier};
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// 行被跳过的原因
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    /// 必填字段缺失
    MissingField(&'static str),
    /// 字段存在但不是整数
    InvalidInteger(&'static str),
    /// schools 表为空,无主学校
    NoPrimarySchool,
    UnknownGrade(String),
    UnknownSection { grade: String, section: String },
    UnknownSubject(String),
    UnknownTeacher(String),
    UnknownHint { kind: EntityKind, hint: Hint },
    UnknownTimeslot { day_of_week: String, period_number: i64 },
    /// 学生尚无学费汇总
    UnknownFeeSummary { student_id: Identifier },
}

impl SkipReason {
    /// 计数分类
    pub fn category(&self) -> &'static str {
        match self {
            SkipReason::MissingField(_) => "missing_field",
            SkipReason::InvalidInteger(_) => "invalid_integer",
            SkipReason::NoPrimarySchool => "no_primary_school",
            SkipReason::UnknownGrade(_) => "unknown_grade",
            SkipReason::UnknownSection { .. } => "unknown_section",
            SkipReason::UnknownSubject(_) => "unknown_subject",
            SkipReason::UnknownTeacher(_) => "unknown_teacher",
            SkipReason::UnknownHint { .. } => "unknown_hint",
            SkipReason::UnknownTimeslot { .. } => "unknown_timeslot",
            SkipReason::UnknownFeeSummary { .. } => "unknown_fee_summary",
        }
    }
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField(field) => write!(f, "必填字段缺失: {}", field),
            SkipReason::InvalidInteger(field) => write!(f, "字段不是整数: {}", field),
            SkipReason::NoPrimarySchool => write!(f, "无主学校"),
            SkipReason::UnknownGrade(grade) => write!(f, "未知年级: {}", grade),
            SkipReason::UnknownSection { grade, section } => {
                write!(f, "未知班级: {}/{}", grade, section)
            }
            SkipReason::UnknownSubject(subject) => write!(f, "未知科目: {}", subject),
            SkipReason::UnknownTeacher(email) => write!(f, "未知教师: {}", email),
            SkipReason::UnknownHint { kind, hint } => write!(f, "未知提示号: {} #{}", kind, hint),
            SkipReason::UnknownTimeslot {
                day_of_week,
                period_number,
            } => write!(f, "未知课时: {} 第{}节", day_of_week, period_number),
            SkipReason::UnknownFeeSummary { student_id } => {
                write!(f, "学生无学费汇总: student_id={}", student_id)
            }
        }
    }
}

// ==========================================
// StageSummary - 单阶段汇总
// ==========================================
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StageSummary {
    pub kind: EntityKind,
    pub rows_seen: usize,
    pub upserted: usize,
    /// 跳过原因分类 → 行数
    pub skipped: BTreeMap<String, usize>,
}

impl StageSummary {
    pub fn new(kind: EntityKind) -> Self {
        Self {
            kind,
            rows_seen: 0,
            upserted: 0,
            skipped: BTreeMap::new(),
        }
    }

    pub fn record_upsert(&mut self) {
        self.upserted += 1;
    }

    /// 记录一次跳过
    ///
    /// # 参数
    /// - sheet_row: 该行在工作表中的行号
    pub fn record_skip(&mut self, sheet_row: usize, reason: &SkipReason) {
        debug!(
            kind = %self.kind,
            sheet_row,
            reason = %reason,
            "跳过行"
        );
        *self.skipped.entry(reason.category().to_string()).or_insert(0) += 1;
    }

    pub fn skipped_total(&self) -> usize {
        self.skipped.values().sum()
    }

    pub fn skipped_for(&self, category: &str) -> usize {
        self.skipped.get(category).copied().unwrap_or(0)
    }
}
