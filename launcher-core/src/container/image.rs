use super::types::DockerManager;
use crate::{LauncherError, Result};
use std::path::Path;
use tracing::info;

impl DockerManager {
    /// 检查镜像是否已存在于本地
    pub async fn image_exists(&self, tag: &str) -> Result<bool> {
        let output = self
            .run_docker_command(&["image", "inspect", tag])
            .await?;
        Ok(output.status.success())
    }

    /// 构建镜像
    ///
    /// 失败时返回 docker build 的完整 stderr，供上层原样展示
    pub async fn build_image(&self, tag: &str, context: &Path) -> Result<()> {
        if !context.exists() {
            return Err(LauncherError::Docker(format!(
                "构建上下文目录不存在: {}",
                context.display()
            )));
        }

        info!("开始构建镜像: {} (上下文: {})", tag, context.display());

        let context_str = context.to_string_lossy().to_string();
        let output = self
            .run_docker_command(&["build", "-t", tag, &context_str])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LauncherError::Docker(format!(
                "镜像 {tag} 构建失败: {}",
                stderr.trim()
            )));
        }

        info!("镜像 {} 构建完成", tag);
        Ok(())
    }
}
