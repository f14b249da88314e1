use crate::app::CliApp;
use crate::launcher::collect_status;
use crate::project_info::{metadata, version_info};
use launcher_core::Result;
use tracing::{info, warn};

/// 显示全部服务状态
pub async fn run_status(app: &CliApp) -> Result<()> {
    info!(
        "⚡ {} v{}",
        metadata::display::FRIENDLY_NAME,
        version_info::CLI_VERSION
    );

    let specs = app.config.launch_specs()?;
    if specs.is_empty() {
        warn!("没有配置任何服务，请编辑 services.toml");
        return Ok(());
    }

    let report = collect_status(&app.docker_manager, &specs).await;

    info!("=== 服务状态概览 ===");
    info!("运行中服务: {}/{}", report.running_count, report.total_count);

    for service in &report.services {
        let slot = match &service.container_name {
            Some(container_name) => format!("容器 {container_name}"),
            None => "本地进程".to_string(),
        };
        info!(
            "  • {} - {} (端口 {}, {})",
            service.name,
            service.state.display_name(),
            service.port,
            slot
        );
    }

    if !report.errors.is_empty() {
        warn!("错误信息:");
        for error in &report.errors {
            warn!("  • {}", error);
        }
    }

    // 显示访问信息
    if report.running_count > 0 {
        info!("=== 服务访问信息 ===");
        for service in report.services.iter().filter(|s| s.state.is_healthy()) {
            info!("  • {}: http://localhost:{}", service.name, service.port);
        }
    }

    Ok(())
}
