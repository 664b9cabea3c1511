// ==========================================
// 学校入驻数据加载器 - 命令行入口
// ==========================================
// 用法: school-loader --database <CONN> --workbook <PATH>
//       [--null-token <TEXT>]... [--busy-timeout-ms <MS>]
// 成功时输出 "Load complete.",失败时非零退出并打印错误链
// ==========================================

use anyhow::{Context, Result};
use clap::Parser;
use school_loader::config::LoadConfig;
use school_loader::db::DEFAULT_BUSY_TIMEOUT_MS;
use school_loader::engine::run_load;
use school_loader::logging;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "school-loader")]
#[command(version)]
#[command(about = "Load a school onboarding workbook into the target database")]
#[command(long_about = None)]
struct Cli {
    /// Target database: file path, :memory:, sqlite:// or file: URL
    #[arg(long, alias = "db", value_name = "CONN")]
    database: String,

    /// Onboarding workbook (.xlsx/.xls/.ods) or a directory of <sheet>.csv files
    #[arg(long, alias = "excel", value_name = "PATH")]
    workbook: PathBuf,

    /// Cell text treated as empty; repeat to list several (replaces the default list)
    #[arg(long = "null-token", value_name = "TEXT")]
    null_tokens: Vec<String>,

    /// SQLite busy timeout in milliseconds
    #[arg(long, value_name = "MS", default_value_t = DEFAULT_BUSY_TIMEOUT_MS)]
    busy_timeout_ms: u64,
}

impl Cli {
    fn load_config(&self) -> Result<LoadConfig> {
        let mut config = LoadConfig::from_args(&self.database, self.workbook.clone())
            .context("无效的命令行参数")?
            .with_busy_timeout_ms(self.busy_timeout_ms);
        if !self.null_tokens.is_empty() {
            config = config.with_null_tokens(self.null_tokens.iter().cloned());
        }
        Ok(config)
    }
}

fn main() -> Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = cli.load_config()?;

    let report = run_load(&config)
        .with_context(|| format!("加载失败: {}", cli.workbook.display()))?;

    tracing::info!(
        run_id = %report.run_id,
        upserted = report.total_upserted(),
        skipped = report.total_skipped(),
        "运行结束"
    );
    println!("Load complete.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use school_loader::importer::DEFAULT_NULL_TOKENS;

    #[test]
    fn test_defaults_keep_standard_tokens_and_timeout() {
        let cli = Cli::try_parse_from(["school-loader", "--db", "school.db", "--excel", "onboarding.xlsx"])
            .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.busy_timeout_ms, DEFAULT_BUSY_TIMEOUT_MS);
        assert_eq!(config.null_tokens.len(), DEFAULT_NULL_TOKENS.len());
    }

    #[test]
    fn test_null_tokens_and_timeout_flow_into_config() {
        let cli = Cli::try_parse_from([
            "school-loader",
            "--database",
            "sqlite://school.db",
            "--workbook",
            "onboarding.xlsx",
            "--null-token",
            "-",
            "--null-token",
            "TBD",
            "--busy-timeout-ms",
            "250",
        ])
        .unwrap();
        let config = cli.load_config().unwrap();

        assert_eq!(config.null_tokens, vec!["-".to_string(), "TBD".to_string()]);
        assert_eq!(config.busy_timeout_ms, 250);
    }

    #[test]
    fn test_unsupported_connection_is_an_error() {
        let cli = Cli::try_parse_from([
            "school-loader",
            "--db",
            "mysql://localhost/school",
            "--excel",
            "onboarding.xlsx",
        ])
        .unwrap();
        assert!(cli.load_config().is_err());
    }
}
