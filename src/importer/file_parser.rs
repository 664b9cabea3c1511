// ==========================================
// 学校入驻数据加载器 - 数据源读取
// ==========================================
// 支持:
// - 工作簿 (.xlsx/.xlsm/.xls/.xlsb/.ods): 每个实体一个工作表
// - CSV 目录: 每个实体一个 <sheet>.csv
// 约定: 首行为表头; 完全空白的行跳过（保留原始行号）; 错误单元格视为 Null
// ==========================================

use crate::config::LoadConfig;
use crate::domain::types::EntityKind;
use crate::domain::value::{number_rows, CellValue, Row, SheetRow};
use crate::importer::error::{LoadError, LoadResult};
use calamine::{open_workbook_auto, Data, Reader, Sheets};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use csv::ReaderBuilder;
use std::collections::HashMap;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use tracing::debug;

// ==========================================
// SheetSource Trait
// ==========================================
pub trait SheetSource {
    /// 数据源中全部工作表名
    fn sheet_names(&self) -> Vec<String>;

    /// 读取一个工作表为行列表（附工作表行号）
    fn read_sheet(&mut self, sheet: &str) -> LoadResult<Vec<SheetRow>>;
}

// ==========================================
// 工作簿数据源
// ==========================================
pub struct WorkbookSource {
    workbook: Sheets<BufReader<File>>,
}

impl WorkbookSource {
    pub fn open(path: &Path) -> LoadResult<Self> {
        let workbook = open_workbook_auto(path)?;
        Ok(Self { workbook })
    }
}

impl SheetSource for WorkbookSource {
    fn sheet_names(&self) -> Vec<String> {
        self.workbook.sheet_names().to_vec()
    }

    fn read_sheet(&mut self, sheet: &str) -> LoadResult<Vec<SheetRow>> {
        let range = self
            .workbook
            .worksheet_range(sheet)
            .map_err(|e| LoadError::ExcelParseError(format!("{}: {}", sheet, e)))?;

        let mut rows = range.rows();
        let headers: Vec<String> = match rows.next() {
            Some(header_row) => header_row.iter().map(header_text).collect(),
            None => return Ok(Vec::new()),
        };

        // 使用区域可能不从 A1 开始
        let header_line = range.start().map(|(row, _)| row as usize + 1).unwrap_or(1);

        let records = rows
            .enumerate()
            .map(|(idx, data_row)| {
                let cells = headers
                    .iter()
                    .zip(data_row.iter())
                    .filter(|(header, _)| !header.is_empty())
                    .map(|(header, cell)| (header.clone(), cell_value(cell)))
                    .collect::<Row>();
                SheetRow::new(header_line + 1 + idx, cells)
            })
            .filter(|row| !is_blank(&row.cells))
            .collect();

        Ok(records)
    }
}

fn header_text(cell: &Data) -> String {
    match cell {
        Data::String(s) => s.trim().to_string(),
        Data::Empty => String::new(),
        other => other.to_string().trim().to_string(),
    }
}

/// calamine 单元格 → CellValue
///
/// 日期序列号 < 1 视为时间; 零点视为日期; 其余为日期时间
pub(crate) fn cell_value(cell: &Data) -> CellValue {
    match cell {
        Data::Empty | Data::Error(_) => CellValue::Null,
        Data::String(s) => CellValue::Text(s.clone()),
        Data::Int(i) => CellValue::Int(*i),
        Data::Float(f) => CellValue::Float(*f),
        Data::Bool(b) => CellValue::Bool(*b),
        Data::DateTime(dt) => {
            let serial = dt.as_f64();
            match dt.as_datetime() {
                Some(value) if serial < 1.0 => CellValue::Time(value.time()),
                Some(value) if value.num_seconds_from_midnight() == 0 && value.nanosecond() == 0 => {
                    CellValue::Date(value.date())
                }
                Some(value) => CellValue::DateTime(value),
                None => CellValue::Float(serial),
            }
        }
        Data::DateTimeIso(s) => parse_iso(s),
        Data::DurationIso(s) => CellValue::Text(s.clone()),
    }
}

fn parse_iso(text: &str) -> CellValue {
    if let Ok(value) = NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S%.f") {
        return CellValue::DateTime(value);
    }
    if let Ok(value) = NaiveDate::parse_from_str(text, "%Y-%m-%d") {
        return CellValue::Date(value);
    }
    if let Ok(value) = NaiveTime::parse_from_str(text, "%H:%M:%S%.f") {
        return CellValue::Time(value);
    }
    CellValue::Text(text.to_string())
}

// ==========================================
// CSV 目录数据源
// ==========================================
pub struct CsvDirectorySource {
    dir: PathBuf,
}

impl CsvDirectorySource {
    pub fn open(dir: &Path) -> LoadResult<Self> {
        if !dir.is_dir() {
            return Err(LoadError::SourceNotFound(dir.display().to_string()));
        }
        Ok(Self {
            dir: dir.to_path_buf(),
        })
    }

    fn sheet_path(&self, sheet: &str) -> PathBuf {
        self.dir.join(format!("{}.csv", sheet))
    }
}

impl SheetSource for CsvDirectorySource {
    fn sheet_names(&self) -> Vec<String> {
        let Ok(entries) = std::fs::read_dir(&self.dir) else {
            return Vec::new();
        };

        let mut names: Vec<String> = entries
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.extension().and_then(|e| e.to_str()) == Some("csv"))
            .filter_map(|path| path.file_stem().and_then(|s| s.to_str()).map(str::to_string))
            .collect();
        names.sort();
        names
    }

    fn read_sheet(&mut self, sheet: &str) -> LoadResult<Vec<SheetRow>> {
        let path = self.sheet_path(sheet);
        if !path.exists() {
            return Err(LoadError::SheetNotFound {
                sheet: sheet.to_string(),
            });
        }

        let file = File::open(&path)?;
        let mut reader = ReaderBuilder::new()
            .has_headers(true)
            .flexible(true) // 允许行长度不一致
            .from_reader(file);

        let headers: Vec<String> = reader
            .headers()?
            .iter()
            .map(|h| h.trim_start_matches('\u{feff}').trim().to_string())
            .collect();

        let mut records = Vec::new();
        for (idx, result) in reader.records().enumerate() {
            let record = result?;
            let line = record
                .position()
                .map(|pos| pos.line() as usize)
                .unwrap_or(idx + 2);
            let row: Row = headers
                .iter()
                .zip(record.iter())
                .filter(|(header, _)| !header.is_empty())
                .map(|(header, value)| {
                    let cell = if value.is_empty() {
                        CellValue::Null
                    } else {
                        CellValue::Text(value.to_string())
                    };
                    (header.clone(), cell)
                })
                .collect();

            // 跳过完全空白的行
            if is_blank(&row) {
                continue;
            }
            records.push(SheetRow::new(line, row));
        }

        Ok(records)
    }
}

fn is_blank(row: &Row) -> bool {
    row.values().all(|value| match value {
        CellValue::Null => true,
        CellValue::Text(s) => s.trim().is_empty(),
        _ => false,
    })
}

// ==========================================
// 数据源选择（目录 → CSV; 扩展名 → 工作簿）
// ==========================================
pub fn open_source(path: &Path) -> LoadResult<Box<dyn SheetSource>> {
    if !path.exists() {
        return Err(LoadError::SourceNotFound(path.display().to_string()));
    }

    if path.is_dir() {
        return Ok(Box::new(CsvDirectorySource::open(path)?));
    }

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_lowercase();

    match ext.as_str() {
        "xlsx" | "xlsm" | "xls" | "xlsb" | "ods" => Ok(Box::new(WorkbookSource::open(path)?)),
        _ => Err(LoadError::UnsupportedFormat(ext)),
    }
}

// ==========================================
// Dataset - 按实体种类分组的全部行
// ==========================================
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Dataset {
    sheets: HashMap<EntityKind, Vec<SheetRow>>,
}

impl Dataset {
    pub fn new() -> Self {
        Self::default()
    }

    /// 按顺序编号后加入（行号从 2 开始）
    pub fn with_sheet(mut self, kind: EntityKind, rows: Vec<Row>) -> Self {
        self.insert_sheet(kind, number_rows(rows));
        self
    }

    pub fn insert_sheet(&mut self, kind: EntityKind, rows: Vec<SheetRow>) {
        self.sheets.insert(kind, rows);
    }

    /// 某实体种类的行; 未提供时为空
    pub fn rows(&self, kind: EntityKind) -> &[SheetRow] {
        self.sheets.get(&kind).map(Vec::as_slice).unwrap_or(&[])
    }

    pub fn total_rows(&self) -> usize {
        self.sheets.values().map(Vec::len).sum()
    }
}

/// 读取全部实体工作表
///
/// 任一工作表缺失即失败（在任何写入之前）
pub fn read_dataset(source: &mut dyn SheetSource, config: &LoadConfig) -> LoadResult<Dataset> {
    let available = source.sheet_names();
    let mut dataset = Dataset::new();

    for kind in EntityKind::ALL {
        let sheet = config.sheet_name(kind);
        if !available.iter().any(|name| name == sheet) {
            return Err(LoadError::SheetNotFound {
                sheet: sheet.to_string(),
            });
        }

        let rows = source.read_sheet(sheet)?;
        debug!(kind = %kind, sheet, rows = rows.len(), "工作表已读取");
        dataset.insert_sheet(kind, rows);
    }

    Ok(dataset)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DatabaseTarget;
    use calamine::CellErrorType;
    use std::fs;
    use tempfile::tempdir;

    fn write_all_sheets(dir: &Path) {
        for kind in EntityKind::ALL {
            fs::write(dir.join(format!("{}.csv", kind.default_sheet_name())), "placeholder\n").unwrap();
        }
    }

    #[test]
    fn test_csv_sheet_rows_and_blank_skipping() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("grades.csv"),
            "grade_name,description,tuition_fee\n5,Fifth,1200\n,,\n6,,1300\n",
        )
        .unwrap();

        let mut source = CsvDirectorySource::open(dir.path()).unwrap();
        let rows = source.read_sheet("grades").unwrap();

        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].cells.get("grade_name"), Some(&CellValue::from("5")));
        assert_eq!(rows[1].cells.get("description"), Some(&CellValue::Null));
        // 空白行被跳过,行号仍指向工作表中的原始位置
        assert_eq!(rows[0].line, 2);
        assert_eq!(rows[1].line, 4);
    }

    #[test]
    fn test_csv_missing_sheet() {
        let dir = tempdir().unwrap();
        let mut source = CsvDirectorySource::open(dir.path()).unwrap();
        let err = source.read_sheet("sections").unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound { sheet } if sheet == "sections"));
    }

    #[test]
    fn test_read_dataset_requires_every_sheet() {
        let dir = tempdir().unwrap();
        write_all_sheets(dir.path());
        fs::remove_file(dir.path().join("class_diary.csv")).unwrap();

        let config = LoadConfig::new(DatabaseTarget::Memory, dir.path());
        let mut source = open_source(dir.path()).unwrap();
        let err = read_dataset(source.as_mut(), &config).unwrap_err();
        assert!(matches!(err, LoadError::SheetNotFound { sheet } if sheet == "class_diary"));
    }

    #[test]
    fn test_read_dataset_honors_sheet_overrides() {
        let dir = tempdir().unwrap();
        write_all_sheets(dir.path());
        fs::write(dir.path().join("payslips.csv"), "teacher_email,year\nt@x.org,2024\n").unwrap();

        let config = LoadConfig::new(DatabaseTarget::Memory, dir.path())
            .with_sheet_name(EntityKind::SalaryPayslip, "payslips");
        let mut source = open_source(dir.path()).unwrap();
        let dataset = read_dataset(source.as_mut(), &config).unwrap();

        assert_eq!(dataset.rows(EntityKind::SalaryPayslip).len(), 1);
        assert!(dataset.rows(EntityKind::School).is_empty());
    }

    #[test]
    fn test_open_source_rejects_unknown_extension() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("onboarding.txt");
        fs::write(&path, "x").unwrap();

        let err = open_source(&path).err().unwrap();
        assert!(matches!(err, LoadError::UnsupportedFormat(ext) if ext == "txt"));

        let err = open_source(&dir.path().join("absent.xlsx")).err().unwrap();
        assert!(matches!(err, LoadError::SourceNotFound(_)));
    }

    #[test]
    fn test_cell_value_conversion() {
        assert_eq!(cell_value(&Data::Empty), CellValue::Null);
        assert_eq!(cell_value(&Data::Error(CellErrorType::NA)), CellValue::Null);
        assert_eq!(cell_value(&Data::Float(5.0)), CellValue::Float(5.0));
        assert_eq!(cell_value(&Data::String("A".into())), CellValue::from("A"));
        assert_eq!(
            cell_value(&Data::DateTimeIso("2024-06-03".into())),
            CellValue::Date(NaiveDate::from_ymd_opt(2024, 6, 3).unwrap())
        );
    }
}
