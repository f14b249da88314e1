use thiserror::Error;

/// 启动引擎的错误类型
///
/// 每类错误都对应一个环境性前置条件，在失败的外部调用处就地
/// 检出并立即上报，不做自动重试
#[derive(Error, Debug)]
pub enum LaunchError {
    #[error("端口 {port} 已被其他进程占用，请先停止冲突的进程")]
    PortInUseByOther { port: u16 },

    #[error("构建失败 ({target}): {output}")]
    BuildFailed { target: String, output: String },

    #[error("启动失败 ({service}): {output}")]
    LaunchFailed { service: String, output: String },

    #[error("服务 {service} 在 {timeout_seconds} 秒内未就绪")]
    FailedToStart {
        service: String,
        timeout_seconds: u64,
        log_tail: String,
    },

    #[error("缺少凭证 {name}: {hint}")]
    MissingCredential { name: String, hint: String },

    #[error("停止服务失败 ({service}): {output}")]
    StopFailed { service: String, output: String },

    #[error("配置错误: {0}")]
    Configuration(String),

    #[error("运行时错误: {0}")]
    Runtime(String),

    #[error("文件系统错误: {0}")]
    FileSystem(String),
}

/// 启动引擎操作的结果类型
pub type LaunchResult<T> = Result<T, LaunchError>;

impl From<std::io::Error> for LaunchError {
    fn from(err: std::io::Error) -> Self {
        LaunchError::FileSystem(err.to_string())
    }
}

impl From<launcher_core::LauncherError> for LaunchError {
    fn from(err: launcher_core::LauncherError) -> Self {
        match err {
            launcher_core::LauncherError::MissingCredential { name, hint } => {
                LaunchError::MissingCredential { name, hint }
            }
            launcher_core::LauncherError::Docker(msg) => LaunchError::Runtime(msg),
            launcher_core::LauncherError::Io(err) => LaunchError::FileSystem(err.to_string()),
            launcher_core::LauncherError::UnknownService(id) => {
                LaunchError::Configuration(format!("未知服务: {id}"))
            }
            _ => LaunchError::Runtime(err.to_string()),
        }
    }
}

impl From<LaunchError> for launcher_core::LauncherError {
    fn from(err: LaunchError) -> Self {
        launcher_core::LauncherError::Launcher(err.to_string())
    }
}
