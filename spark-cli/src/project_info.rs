/// Spark CLI 项目信息模块
///
/// spark-cli 是面向用户的主程序，项目元数据统一在这里定义，
/// launcher-core 作为内部库只提供技术性常量

/// 项目元数据（自动从 spark-cli 的 Cargo.toml 同步）
pub mod metadata {
    /// 项目名称（自动从 Cargo.toml 同步）
    pub const PROJECT_NAME: &str = env!("CARGO_PKG_NAME");

    /// 项目描述（自动从 Cargo.toml 同步）
    pub const PROJECT_DESCRIPTION: &str = env!("CARGO_PKG_DESCRIPTION");

    /// 项目作者（自动从 Cargo.toml 同步）
    pub const PROJECT_AUTHORS: &str = env!("CARGO_PKG_AUTHORS");

    /// 项目许可证（自动从 Cargo.toml 同步）
    pub const PROJECT_LICENSE: &str = env!("CARGO_PKG_LICENSE");

    /// 用户友好的显示名称（手动维护，用于 UI 显示）
    pub mod display {
        /// 用户友好的项目名称
        pub const FRIENDLY_NAME: &str = "Spark Launcher";

        /// 项目详细描述（比 Cargo.toml 中的描述更详细）
        pub const DESCRIPTION_LONG: &str = "单机 GPU 推理设备的服务启动与管理工具，统一管理 vLLM/NIM 推理容器、管理面板等本地服务：就绪检测、按需构建、幂等启动、状态巡检";
    }
}

/// 版本信息
pub mod version_info {
    /// CLI 版本（自动从 Cargo.toml 同步）
    pub const CLI_VERSION: &str = env!("CARGO_PKG_VERSION");

    /// 核心库版本（从 launcher-core 获取）
    pub const CORE_VERSION: &str =
        launcher_core::constants::version::version_info::CORE_VERSION;
}
