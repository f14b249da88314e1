use crate::app::CliApp;
use crate::launcher::{LaunchEngine, LaunchError, LaunchOptions, LaunchOutcome, StopOutcome};
use launcher_core::Result;
use launcher_core::spec::LaunchSpec;
use tracing::{error, info, warn};

/// 启动服务
pub async fn run_start(app: &CliApp, service: &str, rebuild: bool) -> Result<()> {
    let spec = app.config.launch_spec(service)?;

    // 容器服务需要可用的 Docker 环境，进程服务不需要
    if spec.is_container() {
        app.docker_manager.check_docker_status().await?;
    }

    let engine = LaunchEngine::new(&app.docker_manager, &app.credentials);
    let options = LaunchOptions { rebuild };

    match engine.launch(&spec, &options).await {
        Ok(LaunchOutcome::AlreadyRunning) => {
            info!("✅ 服务 {} 已在运行 (端口 {})", service, spec.port);
            Ok(())
        }
        Ok(LaunchOutcome::Started { handle }) => {
            info!("✅ 服务 {} 启动成功", service);
            info!("   • 端口: {}", spec.port);
            info!("   • 句柄: {}", handle);
            Ok(())
        }
        Ok(LaunchOutcome::Finished { exit_code }) => {
            if exit_code == 0 {
                info!("✅ 服务 {} 运行结束", service);
                Ok(())
            } else {
                // 前台模式下启动器的退出码与服务一致
                error!("❌ 服务 {} 退出，状态码 {}", service, exit_code);
                std::process::exit(exit_code);
            }
        }
        Err(e) => {
            print_launch_failure(service, &spec, &e);
            Err(e.into())
        }
    }
}

/// 停止服务
pub async fn run_stop(app: &CliApp, service: &str) -> Result<()> {
    let spec = app.config.launch_spec(service)?;

    if spec.is_container() {
        app.docker_manager.check_docker_status().await?;
    }

    let engine = LaunchEngine::new(&app.docker_manager, &app.credentials);

    match engine.stop(&spec).await {
        Ok(StopOutcome::Stopped) => {
            info!("✅ 服务 {} 已停止", service);
            Ok(())
        }
        Ok(StopOutcome::NotRunning) => {
            info!("ℹ️  服务 {} 没有在运行", service);
            Ok(())
        }
        Err(e) => {
            error!("❌ 服务 {} 停止失败: {}", service, e);
            Err(e.into())
        }
    }
}

/// 重启服务（先停止再走完整的启动流程）
pub async fn run_restart(app: &CliApp, service: &str, rebuild: bool) -> Result<()> {
    info!("🔄 重启服务 {} ...", service);
    run_stop(app, service).await?;
    run_start(app, service, rebuild).await
}

/// 按错误类别打印针对性的修复建议
fn print_launch_failure(service: &str, spec: &LaunchSpec, error: &LaunchError) {
    error!("❌ 服务 {} 启动失败: {}", service, error);

    match error {
        LaunchError::PortInUseByOther { port } => {
            warn!("💡 解决建议:");
            warn!("  - 停止占用端口的进程后重试");
            warn!("  - 查看端口占用情况: lsof -i :{}", port);
        }
        LaunchError::MissingCredential { name, hint } => {
            warn!("💡 解决建议:");
            warn!("  - {}", hint);
            warn!("  - 也可以在 services.toml 的 env 表中配置 {}", name);
        }
        LaunchError::BuildFailed { .. } => {
            warn!("💡 解决建议:");
            warn!("  - 检查构建上下文 / 依赖清单是否完整");
            warn!("  - 使用 --rebuild 可强制重建产物");
        }
        LaunchError::FailedToStart { log_tail, .. } => {
            if !log_tail.is_empty() {
                error!("📄 服务日志尾部:");
                for line in log_tail.lines() {
                    error!("   {}", line);
                }
            }
            warn!("💡 解决建议:");
            warn!("  - 查看完整日志: spark-cli logs {}", service);
            if spec.is_container() {
                warn!("  - 大模型容器首次启动需要下载权重，可调大 start_timeout_secs");
            }
        }
        _ => {}
    }
}
