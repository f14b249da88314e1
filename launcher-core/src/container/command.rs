use super::types::DockerManager;
use crate::{LauncherError, Result};
use std::process::Stdio;
use tokio::process::Command;

impl DockerManager {
    /// 检查 Docker 状态
    pub async fn check_docker_status(&self) -> Result<()> {
        // 检查 docker 命令
        if which::which("docker").is_err() {
            return Err(LauncherError::Docker(
                "Docker 未安装或不在 PATH 中".to_string(),
            ));
        }

        // 检查 Docker 服务是否运行
        let output = self.run_docker_command(&["info"]).await?;
        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LauncherError::Docker(format!(
                "Docker 服务未运行: {}",
                stderr
            )));
        }

        Ok(())
    }

    /// 执行 docker 命令
    pub(crate) async fn run_docker_command(&self, args: &[&str]) -> Result<std::process::Output> {
        let output = Command::new("docker")
            .args(args)
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(output)
    }

    /// 执行 docker 命令并要求成功，失败时返回 stderr
    pub(crate) async fn run_docker_command_checked(&self, args: &[&str]) -> Result<String> {
        let output = self.run_docker_command(args).await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(LauncherError::Docker(format!(
                "docker {} 失败: {}",
                args.first().unwrap_or(&""),
                stderr.trim()
            )));
        }

        Ok(String::from_utf8_lossy(&output.stdout).to_string())
    }
}
