/// Docker相关常量
pub mod docker {
    /// Docker socket路径（跨平台支持）
    /// Unix/Linux/macOS: /var/run/docker.sock
    /// Windows: \\.\pipe\docker_engine
    #[cfg(unix)]
    pub const DOCKER_SOCKET_PATH: &str = "/var/run/docker.sock";

    #[cfg(windows)]
    pub const DOCKER_SOCKET_PATH: &str = r"\\.\pipe\docker_engine";

    /// 默认重启策略（分离模式容器）
    pub const DEFAULT_RESTART_POLICY: &str = "unless-stopped";

    /// 容器日志尾部默认行数（启动失败时展示）
    pub const LOG_TAIL_ON_FAILURE: u32 = 50;
}

/// 应用配置相关常量
pub mod config {
    use std::path::{Path, PathBuf};

    /// 数据目录名
    pub const DATA_DIR_NAME: &str = "data";

    /// 配置文件名
    pub const CONFIG_FILE_NAME: &str = "services.toml";

    /// 运行时文件目录名（pid文件）
    pub const RUN_DIR_NAME: &str = "run";

    /// 工具清单默认目录
    pub const DEFAULT_TOOLS_DIR: &str = "tools";

    /// 工具清单文件名
    pub const TOOL_MANIFEST_FILE_NAME: &str = "TOOL.md";

    /// 获取pid文件保存目录（跨平台）
    pub fn get_run_dir() -> PathBuf {
        Path::new(".").join(DATA_DIR_NAME).join(RUN_DIR_NAME)
    }
}

/// 凭证相关常量
pub mod credentials {
    /// HuggingFace 受限模型下载令牌
    pub const HF_TOKEN: &str = "HF_TOKEN";

    /// NGC 授权容器仓库令牌
    pub const NGC_API_KEY: &str = "NGC_API_KEY";

    /// HuggingFace 令牌回退文件（相对 $HOME）
    pub const HF_TOKEN_FALLBACK_FILE: &str = ".cache/huggingface/token";

    /// NGC 令牌回退文件（相对 $HOME）
    pub const NGC_FALLBACK_FILE: &str = ".ngc/config";
}

/// 超时时间常量（秒）
pub mod timeout {
    /// 分离模式启动后的稳定等待时间
    pub const SETTLE_WAIT: u64 = 2;

    /// 启动后就绪验证默认超时时间
    pub const VERIFY_TIMEOUT: u64 = 60;

    /// 就绪验证检查间隔时间
    pub const VERIFY_INTERVAL: u64 = 2;

    /// 容器优雅停止宽限时间
    pub const STOP_GRACE: u64 = 30;

    /// 进程优雅停止宽限时间
    pub const PROCESS_STOP_GRACE: u64 = 10;

    /// HTTP 健康检查单次请求超时时间
    pub const HTTP_PROBE_TIMEOUT: u64 = 2;

    /// docker 命令默认执行超时时间
    pub const DOCKER_COMMAND_TIMEOUT: u64 = 30;
}

/// 网络相关常量
pub mod network {
    /// 本地回环地址
    pub const LOCALHOST_IPV4: &str = "127.0.0.1";

    /// 所有网络接口地址
    pub const ALL_INTERFACES: &str = "0.0.0.0";
}

/// 日志和输出相关常量
pub mod logging {
    use std::path::{Path, PathBuf};

    /// 默认日志级别
    pub const DEFAULT_LOG_LEVEL: &str = "info";

    /// 数据目录名
    pub const DATA_DIR_NAME: &str = "data";

    /// 日志目录名
    pub const LOG_DIR_NAME: &str = "logs";

    /// 获取服务日志保存目录（分离模式进程服务的输出重定向）
    pub fn get_log_dir() -> PathBuf {
        Path::new(".").join(DATA_DIR_NAME).join(LOG_DIR_NAME)
    }
}

/// GPU 监控相关常量
pub mod gpu {
    /// nvidia-smi 可执行文件名
    pub const NVIDIA_SMI: &str = "nvidia-smi";

    /// 显存查询参数
    pub const MEMORY_QUERY: &str = "--query-gpu=memory.total,memory.used,memory.free";

    /// 计算进程查询参数
    pub const PROCESS_QUERY: &str = "--query-compute-apps=pid,name,used_memory";

    /// CSV输出格式参数
    pub const CSV_FORMAT: &str = "--format=csv,noheader,nounits";
}

/// 技术版本信息常量
pub mod version {
    /// 版本信息（仅技术版本，项目信息在 spark-cli 中定义）
    pub mod version_info {
        /// 核心库版本（自动同步）
        pub const CORE_VERSION: &str = env!("CARGO_PKG_VERSION");

        /// 最小支持的 Docker 版本
        pub const MIN_DOCKER_VERSION: &str = "20.10.0";

        /// 配置格式版本
        pub const CONFIG_FORMAT_VERSION: &str = "1.0";
    }
}
