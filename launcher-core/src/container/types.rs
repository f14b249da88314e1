/// 容器状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerState {
    /// 运行中
    Running,
    /// 已退出
    Exited,
    /// 已创建（从未启动）
    Created,
    /// 正在重启
    Restarting,
    /// 已暂停
    Paused,
    /// 已死亡
    Dead,
    /// 不存在
    NotFound,
    /// 未知状态
    Unknown,
}

impl ContainerState {
    /// 从 docker inspect 的状态字符串解析
    pub fn parse(s: &str) -> Self {
        match s.trim().to_lowercase().as_str() {
            "running" | "up" => ContainerState::Running,
            "exited" | "stopped" => ContainerState::Exited,
            "created" => ContainerState::Created,
            "restarting" => ContainerState::Restarting,
            "paused" => ContainerState::Paused,
            "dead" => ContainerState::Dead,
            _ => ContainerState::Unknown,
        }
    }

    /// 获取状态的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ContainerState::Running => "运行中",
            ContainerState::Exited => "已退出",
            ContainerState::Created => "已创建",
            ContainerState::Restarting => "重启中",
            ContainerState::Paused => "已暂停",
            ContainerState::Dead => "已死亡",
            ContainerState::NotFound => "未创建",
            ContainerState::Unknown => "未知",
        }
    }

    /// 判断容器是否在运行
    pub fn is_running(&self) -> bool {
        matches!(self, ContainerState::Running)
    }

    /// 判断容器是否存在（任意状态）
    pub fn exists(&self) -> bool {
        !matches!(self, ContainerState::NotFound)
    }

    /// 判断是否为终止态残留（需要在重新启动前清理）
    pub fn is_stale(&self) -> bool {
        matches!(
            self,
            ContainerState::Exited | ContainerState::Created | ContainerState::Dead
        )
    }
}

/// 容器概要信息（docker ps 一行）
#[derive(Debug, Clone)]
pub struct ContainerSummary {
    pub name: String,
    pub state: ContainerState,
    pub image: String,
    pub ports: Vec<String>,
}

/// Docker 运行时管理器
///
/// 通过 docker CLI 与容器运行时交互
#[derive(Debug, Clone, Default)]
pub struct DockerManager;

impl DockerManager {
    pub fn new() -> Self {
        Self
    }
}
