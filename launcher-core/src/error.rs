use thiserror::Error;

pub type Result<T> = std::result::Result<T, LauncherError>;

#[derive(Error, Debug)]
pub enum LauncherError {
    #[error("配置错误: {0}")]
    Config(#[from] toml::de::Error),

    #[error("IO 错误: {0}")]
    Io(#[from] std::io::Error),

    #[error("序列化错误: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("Docker 命令执行失败: {0}")]
    Docker(String),

    #[error("缺少凭证 {name}: {hint}")]
    MissingCredential { name: String, hint: String },

    #[error("工具清单解析失败: {0}")]
    Manifest(String),

    #[error("配置文件未找到")]
    ConfigNotFound,

    #[error("未知服务: {0}")]
    UnknownService(String),

    #[error("启动器错误: {0}")]
    Launcher(String),

    #[error("自定义错误: {0}")]
    Custom(String),
}

impl LauncherError {
    pub fn custom(msg: impl Into<String>) -> Self {
        Self::Custom(msg.into())
    }

    pub fn docker(msg: impl Into<String>) -> Self {
        Self::Docker(msg.into())
    }

    pub fn manifest(msg: impl Into<String>) -> Self {
        Self::Manifest(msg.into())
    }

    pub fn launcher(msg: impl Into<String>) -> Self {
        Self::Launcher(msg.into())
    }
}
