use launcher_core::config::AppConfig;
use launcher_core::constants::{config, logging};
use launcher_core::error::Result;
use std::path::Path;
use tracing::{info, warn};

/// 运行独立的初始化流程
pub async fn run_init(force: bool) -> Result<()> {
    info!("⚡ Spark Launcher 初始化");
    info!("========================");

    // 检查是否已经初始化过
    if !force && Path::new(config::CONFIG_FILE_NAME).exists() {
        warn!("⚠️  检测到已存在的配置文件: {}", config::CONFIG_FILE_NAME);
        info!("如果您要重新初始化，请使用 --force 参数");
        info!("示例: spark-cli init --force");
        return Ok(());
    }

    info!("📋 步骤 1: 创建服务配置文件");

    AppConfig::write_template(config::CONFIG_FILE_NAME)?;
    info!("   ✅ 创建配置文件: {}", config::CONFIG_FILE_NAME);

    info!("📋 步骤 2: 创建目录结构");

    let log_dir = logging::get_log_dir();
    let run_dir = config::get_run_dir();
    std::fs::create_dir_all(&log_dir)?;
    std::fs::create_dir_all(&run_dir)?;
    std::fs::create_dir_all(config::DEFAULT_TOOLS_DIR)?;
    info!("   ✅ 创建目录结构:");
    info!("      - {}    (进程服务日志目录)", log_dir.display());
    info!("      - {}     (pid 文件目录)", run_dir.display());
    info!("      - {}/              (工具清单目录)", config::DEFAULT_TOOLS_DIR);

    info!("🎉 初始化完成！");
    info!("");
    info!("📝 接下来的步骤:");
    info!("   1️⃣  编辑 {} 配置您的服务", config::CONFIG_FILE_NAME);
    info!("   2️⃣  运行 'spark-cli start <服务id>' 启动服务");
    info!("   3️⃣  运行 'spark-cli status' 查看服务状态");
    info!("");
    info!("💡 提示:");
    info!("   - 受限模型需要设置 HF_TOKEN，NGC 容器需要 NGC_API_KEY");
    info!("   - 使用 'spark-cli --help' 查看所有可用命令");

    Ok(())
}
