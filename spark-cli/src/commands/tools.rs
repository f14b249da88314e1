use crate::app::CliApp;
use launcher_core::manifest::ManifestLoader;
use launcher_core::{LauncherError, Result};
use tracing::{info, warn};

/// 列出全部已启用的工具
pub async fn run_tools_list(app: &CliApp) -> Result<()> {
    let loader = ManifestLoader::new(&app.config.launcher.tools_dir);
    let tools = loader.load_all();

    if tools.is_empty() {
        warn!(
            "工具目录 {} 下没有发现已启用的工具清单",
            app.config.launcher.tools_dir
        );
        return Ok(());
    }

    info!("=== 工具清单 ({} 个) ===", tools.len());
    for tool in tools.values() {
        info!("  • {} (v{})", tool.name, tool.version);
        if !tool.description.is_empty() {
            info!("    {}", tool.description);
        }
        info!(
            "    沙箱: 超时 {}s, 内存 {}, 网络 {}, 文件系统{}",
            tool.sandbox.timeout,
            tool.sandbox.memory,
            if tool.sandbox.network { "开" } else { "关" },
            if tool.sandbox.read_only { "只读" } else { "可写" },
        );
    }

    Ok(())
}

/// 显示指定工具的完整定义
pub async fn run_tools_show(app: &CliApp, name: &str) -> Result<()> {
    let loader = ManifestLoader::new(&app.config.launcher.tools_dir);
    let tools = loader.load_all();

    let tool = tools
        .get(name)
        .ok_or_else(|| LauncherError::custom(format!("未找到工具: {name}")))?;

    info!("工具: {} (v{})", tool.name, tool.version);
    info!("清单文件: {}", tool.path.display());
    if !tool.parameters.is_empty() {
        info!("参数:");
        for param in &tool.parameters {
            info!(
                "  • {} ({}{}) - {}",
                param.name,
                param.param_type,
                if param.required { ", 必填" } else { "" },
                param.description
            );
        }
    }

    // OpenAI function calling 格式走标准输出，便于重定向给调用方
    println!("{}", serde_json::to_string_pretty(&tool.to_openai_tool())?);

    Ok(())
}
