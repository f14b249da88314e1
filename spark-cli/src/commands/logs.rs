use crate::app::CliApp;
use crate::launcher::log_file_path;
use launcher_core::Result;
use launcher_core::container::ContainerRuntime;
use tracing::{info, warn};

/// 查看服务日志尾部
pub async fn run_logs(app: &CliApp, service: &str, tail: u32) -> Result<()> {
    let spec = app.config.launch_spec(service)?;

    let content = match spec.container_name.as_deref() {
        Some(container_name) => {
            app.docker_manager.check_docker_status().await?;
            app.docker_manager.logs_tail(container_name, tail).await?
        }
        None => {
            // 进程服务的输出在启动时被重定向到日志文件
            let path = log_file_path(&spec.name);
            match std::fs::read_to_string(&path) {
                Ok(content) => {
                    let lines: Vec<&str> = content.lines().collect();
                    let start = lines.len().saturating_sub(tail as usize);
                    lines[start..].join("\n")
                }
                Err(_) => {
                    warn!("日志文件不存在: {} (服务从未以后台模式启动过?)", path.display());
                    return Ok(());
                }
            }
        }
    };

    if content.trim().is_empty() {
        info!("服务 {} 暂无日志输出", service);
        return Ok(());
    }

    info!("=== 服务 {} 日志 (最后 {} 行) ===", service, tail);
    for line in content.lines() {
        println!("{line}");
    }

    Ok(())
}
