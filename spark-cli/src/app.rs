use launcher_core::{
    config::AppConfig,
    container::DockerManager,
    credentials::CredentialStore,
    error::{LauncherError, Result},
};
use std::path::Path;

use crate::cli::{Commands, ToolsCommand};
use crate::commands;

/// CLI 应用上下文
///
/// 配置、运行时包装与凭证快照在启动时装配一次，
/// 之后按值传给各命令，命令自身不再读取环境
#[derive(Clone)]
pub struct CliApp {
    pub config: AppConfig,
    pub docker_manager: DockerManager,
    pub credentials: CredentialStore,
}

impl CliApp {
    /// 初始化CLI应用
    ///
    /// 显式指定的配置文件优先加载，文件不存在时直接报错而不是
    /// 悄悄回退到其他文件；未指定时走智能查找链
    pub async fn new_with_auto_config(config_path: Option<&Path>) -> Result<Self> {
        let config = match config_path {
            Some(path) => {
                if !path.exists() {
                    return Err(LauncherError::ConfigNotFound);
                }
                tracing::info!("使用指定配置文件: {}", path.display());
                AppConfig::load_from_file(path)?
            }
            None => AppConfig::find_and_load_config()?,
        };
        let docker_manager = DockerManager::new();
        let credentials = CredentialStore::from_process_env();

        Ok(Self {
            config,
            docker_manager,
            credentials,
        })
    }

    /// 运行应用命令
    pub async fn run(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Init { .. } => unreachable!(), // 已经在 main.rs 中处理
            Commands::Start { service, rebuild } => {
                commands::run_start(self, &service, rebuild).await
            }
            Commands::Stop { service } => commands::run_stop(self, &service).await,
            Commands::Restart { service, rebuild } => {
                commands::run_restart(self, &service, rebuild).await
            }
            Commands::Status => commands::run_status(self).await,
            Commands::Logs { service, tail } => commands::run_logs(self, &service, tail).await,
            Commands::Gpu => commands::run_gpu().await.map_err(|e| {
                launcher_core::error::LauncherError::custom(format!("GPU 查询失败: {e}"))
            }),
            Commands::Tools(tools_command) => match tools_command {
                ToolsCommand::List => commands::run_tools_list(self).await,
                ToolsCommand::Show { name } => commands::run_tools_show(self, &name).await,
            },
        }
    }
}
