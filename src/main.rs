// ==========================================
// 排放数据导入 - 命令行入口
// ==========================================
// 用法: emissions-import <csv-或-xlsx-路径> [db_path]
// 输出: ImportStats（JSON，camelCase）
// ==========================================

use anyhow::{bail, Context, Result};
use emissions_import::app::{get_default_db_path, AppState};
use emissions_import::config::ImportSettings;
use emissions_import::logging;

#[tokio::main]
async fn main() -> Result<()> {
    logging::init();

    let mut args = std::env::args().skip(1);
    let file_path = match args.next() {
        Some(path) => path,
        None => bail!("用法: {} <csv-or-xlsx-path> [db_path]", emissions_import::APP_NAME),
    };
    let db_path = args.next().unwrap_or_else(get_default_db_path);

    tracing::info!("==================================================");
    tracing::info!("排放数据导入 v{}", emissions_import::VERSION);
    tracing::info!("导入文件: {}", file_path);
    tracing::info!("使用数据库: {}", db_path);
    tracing::info!("==================================================");

    let settings = ImportSettings::from_env();
    let state = AppState::with_stored_settings(db_path.clone(), settings)
        .await
        .with_context(|| format!("无法初始化数据库: {}", db_path))?;

    let stats = state
        .import_file(&file_path)
        .await
        .with_context(|| format!("导入失败: {}", file_path))?;

    println!("{}", serde_json::to_string_pretty(&stats)?);
    Ok(())
}
