use std::path::PathBuf;

/// 就绪探测策略
///
/// 决定"服务是否已经在运行"的判定方式，启动器的幂等性完全依赖它
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReadinessProbe {
    /// 端口绑定探测：只要目标端口有进程监听即视为已运行
    PortBound,
    /// 容器状态查询：按容器名查询运行时状态
    Container,
    /// HTTP 健康检查：GET http://127.0.0.1:{port}{path} 返回 2xx 即就绪
    Http { path: String },
}

/// 构建步骤（幂等，产物已存在时跳过）
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BuildStep {
    /// 构建容器镜像：docker build -t {tag} {context}
    Image { tag: String, context: PathBuf },
    /// 创建 Python 虚拟环境并安装依赖
    Venv {
        dir: PathBuf,
        requirements: Option<PathBuf>,
    },
}

impl BuildStep {
    /// 产物的显示名称（用于日志和错误信息）
    pub fn target_name(&self) -> String {
        match self {
            BuildStep::Image { tag, .. } => format!("镜像 {tag}"),
            BuildStep::Venv { dir, .. } => format!("虚拟环境 {}", dir.display()),
        }
    }
}

/// 进程服务的启动模式
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LaunchMode {
    /// 前台运行：启动器阻塞并转发输出，退出码与服务一致
    Foreground,
    /// 后台运行：输出重定向到日志文件，启动器在就绪验证后返回
    Detached,
}

/// 容器运行参数
///
/// 字段对应 docker run 的关键开关，容器服务总是以分离模式
/// （-d + 重启策略）启动
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRunSpec {
    /// 镜像引用
    pub image: String,
    /// 容器内部端口（映射到 LaunchSpec.port）
    pub container_port: u16,
    /// 卷挂载（主机路径, 容器路径）
    pub volumes: Vec<(String, String)>,
    /// 是否挂载全部 GPU（--gpus all）
    pub gpus: bool,
    /// 是否共享主机 IPC 命名空间（--ipc=host，vLLM 需要）
    pub ipc_host: bool,
    /// ulimit 设置，如 "memlock=-1"
    pub ulimits: Vec<String>,
    /// 镜像后的引擎命令与参数，如 ["vllm", "serve", ...]
    pub args: Vec<String>,
    /// 重启策略
    pub restart_policy: String,
}

/// 启动命令
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StartCommand {
    /// 容器方式启动（docker run -d）
    Container(ContainerRunSpec),
    /// 直接进程方式启动
    Process {
        argv: Vec<String>,
        work_dir: Option<PathBuf>,
        mode: LaunchMode,
    },
}

/// 必需凭证要求
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CredentialRequirement {
    /// 环境变量名
    pub name: String,
    /// 回退文件路径（相对 $HOME），环境变量缺失时尝试读取
    pub fallback_file: Option<PathBuf>,
    /// 缺失时给用户的修复提示
    pub hint: String,
}

/// 一个可启动服务的静态描述
///
/// 每次启动器运行时由配置装配而成，不被修改，启动尝试结束后即丢弃。
/// 同一端口同一时刻最多允许一个 LaunchSpec 处于运行状态。
#[derive(Debug, Clone)]
pub struct LaunchSpec {
    /// 服务标识（容器/进程命名与日志用）
    pub name: String,
    /// 容器名（进程服务为 None）
    pub container_name: Option<String>,
    /// 服务必须绑定的主机端口
    pub port: u16,
    /// 就绪探测策略
    pub readiness: ReadinessProbe,
    /// 注入的环境变量（覆盖继承的环境）
    pub environment: Vec<(String, String)>,
    /// 必需凭证（缺失则在任何运行时操作之前中止）
    pub required_credentials: Vec<CredentialRequirement>,
    /// 可选构建步骤
    pub build: Option<BuildStep>,
    /// 启动命令
    pub start: StartCommand,
    /// 启动后就绪验证超时时间（秒）
    pub start_timeout_secs: u64,
}

impl LaunchSpec {
    /// 判断是否为容器服务
    pub fn is_container(&self) -> bool {
        matches!(self.start, StartCommand::Container(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_build_step_target_name() {
        let image = BuildStep::Image {
            tag: "web-gui:latest".to_string(),
            context: PathBuf::from("web-gui"),
        };
        assert!(image.target_name().contains("web-gui:latest"));

        let venv = BuildStep::Venv {
            dir: PathBuf::from(".venv"),
            requirements: None,
        };
        assert!(venv.target_name().contains(".venv"));
    }

    #[test]
    fn test_is_container() {
        let spec = LaunchSpec {
            name: "test".to_string(),
            container_name: None,
            port: 5175,
            readiness: ReadinessProbe::PortBound,
            environment: Vec::new(),
            required_credentials: Vec::new(),
            build: None,
            start: StartCommand::Process {
                argv: vec!["uvicorn".to_string()],
                work_dir: None,
                mode: LaunchMode::Foreground,
            },
            start_timeout_secs: 60,
        };
        assert!(!spec.is_container());
    }
}
