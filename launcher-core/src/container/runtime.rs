use super::types::{ContainerState, ContainerSummary, DockerManager};
use crate::spec::ContainerRunSpec;
use crate::{LauncherError, Result};
use std::path::Path;
use tracing::{info, warn};

/// 容器运行时接口
///
/// 启动引擎对该 trait 泛型化，检测策略与幂等性属性可以用
/// 记录调用次数的 mock 实现来验证
#[allow(async_fn_in_trait)]
pub trait ContainerRuntime {
    /// 查询指定名称容器的状态
    async fn container_state(&self, name: &str) -> Result<ContainerState>;

    /// 删除容器
    async fn remove_container(&self, name: &str, force: bool) -> Result<()>;

    /// 检查镜像是否存在
    async fn image_exists(&self, tag: &str) -> Result<bool>;

    /// 构建镜像
    async fn build_image(&self, tag: &str, context: &Path) -> Result<()>;

    /// 以分离模式启动容器，返回容器ID
    async fn run_container(
        &self,
        name: &str,
        host_port: u16,
        run: &ContainerRunSpec,
        env: &[(String, String)],
    ) -> Result<String>;

    /// 优雅停止容器
    async fn stop_container(&self, name: &str, grace_secs: u64) -> Result<()>;

    /// 获取容器日志尾部
    async fn logs_tail(&self, name: &str, lines: u32) -> Result<String>;

    /// 列出所有容器（包括已停止的）
    async fn list_containers(&self) -> Result<Vec<ContainerSummary>>;
}

impl DockerManager {
    /// 查询容器状态（docker inspect）
    pub async fn inspect_container_state(&self, name: &str) -> Result<ContainerState> {
        let output = self
            .run_docker_command(&["inspect", "-f", "{{.State.Status}}", name])
            .await?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            if stderr.contains("No such object") || stderr.contains("No such container") {
                return Ok(ContainerState::NotFound);
            }
            return Err(LauncherError::Docker(format!(
                "查询容器 {name} 状态失败: {}",
                stderr.trim()
            )));
        }

        let state = String::from_utf8_lossy(&output.stdout);
        Ok(ContainerState::parse(&state))
    }

    /// 构造 docker run 参数并启动容器
    async fn docker_run(
        &self,
        name: &str,
        host_port: u16,
        run: &ContainerRunSpec,
        env: &[(String, String)],
    ) -> Result<String> {
        let port_mapping = format!("{}:{}", host_port, run.container_port);
        let restart = format!("--restart={}", run.restart_policy);

        let mut args: Vec<String> = vec![
            "run".to_string(),
            "-d".to_string(),
            "--name".to_string(),
            name.to_string(),
        ];

        if run.gpus {
            args.push("--gpus".to_string());
            args.push("all".to_string());
        }
        if run.ipc_host {
            args.push("--ipc=host".to_string());
        }
        for ulimit in &run.ulimits {
            args.push("--ulimit".to_string());
            args.push(ulimit.clone());
        }

        args.push("-p".to_string());
        args.push(port_mapping);

        for (host_path, container_path) in &run.volumes {
            args.push("-v".to_string());
            args.push(format!("{host_path}:{container_path}"));
        }
        for (key, value) in env {
            args.push("-e".to_string());
            args.push(format!("{key}={value}"));
        }

        args.push(restart);
        args.push(run.image.clone());
        args.extend(run.args.iter().cloned());

        info!("启动容器: {} (镜像: {})", name, run.image);

        let arg_refs: Vec<&str> = args.iter().map(|s| s.as_str()).collect();
        let stdout = self.run_docker_command_checked(&arg_refs).await?;

        Ok(stdout.trim().to_string())
    }

    /// 解析 docker ps 的 JSON 行输出
    pub(crate) fn parse_container_summaries(&self, json_output: &str) -> Result<Vec<ContainerSummary>> {
        let mut containers = Vec::new();

        // 如果输出为空，返回空列表
        if json_output.trim().is_empty() {
            return Ok(containers);
        }

        // 按行解析 JSON
        for line in json_output.lines() {
            if line.trim().is_empty() {
                continue;
            }

            match serde_json::from_str::<serde_json::Value>(line) {
                Ok(container_json) => {
                    let name = container_json["Names"]
                        .as_str()
                        .unwrap_or("unknown")
                        .to_string();

                    let state = container_json["State"].as_str().unwrap_or("unknown");

                    let image = container_json["Image"]
                        .as_str()
                        .unwrap_or("unknown")
                        .to_string();

                    let ports = container_json["Ports"]
                        .as_str()
                        .unwrap_or("")
                        .split(',')
                        .map(|s| s.trim().to_string())
                        .filter(|s| !s.is_empty())
                        .collect();

                    containers.push(ContainerSummary {
                        name,
                        state: ContainerState::parse(state),
                        image,
                        ports,
                    });
                }
                Err(e) => {
                    warn!("解析容器 JSON 失败: {}, 内容: {}", e, line);
                }
            }
        }

        Ok(containers)
    }
}

impl ContainerRuntime for DockerManager {
    async fn container_state(&self, name: &str) -> Result<ContainerState> {
        self.inspect_container_state(name).await
    }

    async fn remove_container(&self, name: &str, force: bool) -> Result<()> {
        let args: &[&str] = if force {
            &["rm", "-f", name]
        } else {
            &["rm", name]
        };
        self.run_docker_command_checked(args).await?;
        Ok(())
    }

    async fn image_exists(&self, tag: &str) -> Result<bool> {
        DockerManager::image_exists(self, tag).await
    }

    async fn build_image(&self, tag: &str, context: &Path) -> Result<()> {
        DockerManager::build_image(self, tag, context).await
    }

    async fn run_container(
        &self,
        name: &str,
        host_port: u16,
        run: &ContainerRunSpec,
        env: &[(String, String)],
    ) -> Result<String> {
        self.docker_run(name, host_port, run, env).await
    }

    async fn stop_container(&self, name: &str, grace_secs: u64) -> Result<()> {
        let grace = grace_secs.to_string();
        self.run_docker_command_checked(&["stop", "-t", &grace, name])
            .await?;
        Ok(())
    }

    async fn logs_tail(&self, name: &str, lines: u32) -> Result<String> {
        let lines_str = lines.to_string();
        let output = self
            .run_docker_command(&["logs", "--tail", &lines_str, name])
            .await?;

        // docker logs 把服务输出写到 stdout 和 stderr 两路
        let mut combined = String::from_utf8_lossy(&output.stdout).to_string();
        combined.push_str(&String::from_utf8_lossy(&output.stderr));
        Ok(combined)
    }

    async fn list_containers(&self) -> Result<Vec<ContainerSummary>> {
        let stdout = self
            .run_docker_command_checked(&["ps", "-a", "--format", "{{json .}}"])
            .await?;
        self.parse_container_summaries(&stdout)
    }
}
