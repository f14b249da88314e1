use crate::project_info::{metadata, version_info};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// 工具清单相关命令
#[derive(Subcommand, Debug)]
pub enum ToolsCommand {
    /// 列出全部已启用的工具
    List,
    /// 显示指定工具的完整定义（含 OpenAI function calling 格式）
    Show {
        /// 工具名称
        name: String,
    },
}

/// Spark Launcher CLI - 单机 GPU 推理设备的服务启动与管理工具
#[derive(Parser)]
#[command(name = "spark-cli")]
#[command(about = metadata::PROJECT_DESCRIPTION)]
#[command(version = version_info::CLI_VERSION)]
#[command(long_about = metadata::display::DESCRIPTION_LONG)]
#[command(author = metadata::PROJECT_AUTHORS)]
pub struct Cli {
    /// 配置文件路径（缺省时按 services.toml -> spark-launcher.toml -> .spark-launcher.toml 查找）
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// 详细输出
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 首次使用时初始化，创建服务配置文件和目录结构
    Init {
        /// 如果配置文件已存在，强制覆盖
        #[arg(long)]
        force: bool,
    },
    /// 启动服务（已在运行时直接返回，不会重复启动）
    Start {
        /// 服务id（services.toml 中的表名）
        service: String,
        /// 强制重建构建产物（镜像/虚拟环境）
        #[arg(long)]
        rebuild: bool,
    },
    /// 停止服务（优雅停止，宽限期后强制）
    Stop {
        /// 服务id
        service: String,
    },
    /// 重启服务
    Restart {
        /// 服务id
        service: String,
        /// 强制重建构建产物
        #[arg(long)]
        rebuild: bool,
    },
    /// 显示全部服务状态
    Status,
    /// 查看服务日志
    Logs {
        /// 服务id
        service: String,
        /// 显示的日志行数
        #[arg(long, default_value = "100")]
        tail: u32,
    },
    /// 显示 GPU 显存使用情况
    Gpu,
    /// 工具清单管理
    #[command(subcommand)]
    Tools(ToolsCommand),
}
