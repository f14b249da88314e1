use crate::constants::{credentials, timeout};
use crate::error::{LauncherError, Result};
use crate::spec::{
    BuildStep, ContainerRunSpec, CredentialRequirement, LaunchMode, LaunchSpec, ReadinessProbe,
    StartCommand,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use toml;

/// 服务类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ServiceKind {
    /// 容器服务（docker run -d + 重启策略）
    Container,
    /// 进程服务（直接执行命令）
    Process,
}

/// 就绪探测策略（配置表示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessKind {
    Port,
    Container,
    Http,
}

/// 进程服务的启动模式（配置表示）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessMode {
    Foreground,
    Detached,
}

fn default_container_port() -> u16 {
    8000
}

fn default_health_path() -> String {
    "/health".to_string()
}

fn default_start_timeout() -> u64 {
    timeout::VERIFY_TIMEOUT
}

fn default_restart_policy() -> String {
    crate::constants::docker::DEFAULT_RESTART_POLICY.to_string()
}

fn default_tools_dir() -> String {
    crate::constants::config::DEFAULT_TOOLS_DIR.to_string()
}

/// 单个服务的静态配置（services.toml 的 [services.<id>] 表）
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceDefinition {
    /// 显示名称（缺省时使用服务id）
    #[serde(default)]
    pub name: Option<String>,
    /// 服务类型
    pub kind: ServiceKind,
    /// 服务必须绑定的主机端口
    pub port: u16,
    /// 容器名（缺省时使用服务id）
    #[serde(default)]
    pub container_name: Option<String>,
    /// 镜像引用（容器服务必填）
    #[serde(default)]
    pub image: Option<String>,
    /// 容器内部端口
    #[serde(default = "default_container_port")]
    pub container_port: u16,
    /// 就绪探测策略（缺省：容器服务查容器，进程服务探端口）
    #[serde(default)]
    pub readiness: Option<ReadinessKind>,
    /// HTTP 健康检查路径
    #[serde(default = "default_health_path")]
    pub health_path: String,
    /// 是否挂载全部 GPU
    #[serde(default)]
    pub gpus: bool,
    /// 是否共享主机 IPC 命名空间
    #[serde(default)]
    pub ipc_host: bool,
    /// ulimit 设置
    #[serde(default)]
    pub ulimits: Vec<String>,
    /// 卷挂载，格式 "主机路径:容器路径"，主机路径支持 ~ 展开
    #[serde(default)]
    pub volumes: Vec<String>,
    /// 注入的环境变量
    #[serde(default)]
    pub env: BTreeMap<String, String>,
    /// 必需凭证的环境变量名
    #[serde(default)]
    pub requires: Vec<String>,
    /// 镜像后的引擎命令与参数（容器服务）
    #[serde(default)]
    pub args: Vec<String>,
    /// 启动命令（进程服务必填）
    #[serde(default)]
    pub command: Vec<String>,
    /// 工作目录（进程服务）
    #[serde(default)]
    pub work_dir: Option<PathBuf>,
    /// 进程服务启动模式（缺省 detached）
    #[serde(default)]
    pub mode: Option<ProcessMode>,
    /// 虚拟环境目录（存在则跳过构建）
    #[serde(default)]
    pub venv_dir: Option<PathBuf>,
    /// 依赖清单文件（配合 venv_dir）
    #[serde(default)]
    pub requirements: Option<PathBuf>,
    /// 镜像构建上下文目录（存在镜像则跳过构建）
    #[serde(default)]
    pub build_context: Option<PathBuf>,
    /// 重启策略（容器服务）
    #[serde(default = "default_restart_policy")]
    pub restart_policy: String,
    /// 启动后就绪验证超时时间（秒）
    #[serde(default = "default_start_timeout")]
    pub start_timeout_secs: u64,
}

/// 启动器全局配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LauncherConfig {
    /// 主机主目录透传（容器内运行时卷挂载需要主机侧路径）
    #[serde(default)]
    pub host_home: Option<String>,
    /// 工具清单目录
    #[serde(default = "default_tools_dir")]
    pub tools_dir: String,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        Self {
            host_home: None,
            tools_dir: default_tools_dir(),
        }
    }
}

/// 应用配置结构
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub launcher: LauncherConfig,
    #[serde(default)]
    pub services: BTreeMap<String, ServiceDefinition>,
}

impl AppConfig {
    /// 智能查找并加载配置文件
    /// 按优先级查找：services.toml -> spark-launcher.toml -> .spark-launcher.toml
    pub fn find_and_load_config() -> Result<Self> {
        let config_files = [
            "services.toml",
            "spark-launcher.toml",
            ".spark-launcher.toml",
        ];

        for config_file in &config_files {
            if Path::new(config_file).exists() {
                tracing::info!("找到配置文件: {}", config_file);
                return Self::load_from_file(config_file);
            }
        }

        Err(LauncherError::ConfigNotFound)
    }

    /// 从指定文件加载配置
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path)?;
        let config: AppConfig = toml::from_str(&content)?;

        Ok(config)
    }

    /// 写出带注释的默认配置模板
    pub fn write_template<P: AsRef<Path>>(path: P) -> Result<()> {
        const TEMPLATE: &str = include_str!("../templates/services.toml.template");
        fs::write(&path, TEMPLATE)?;
        Ok(())
    }

    /// 查找服务定义
    pub fn get_service(&self, id: &str) -> Result<&ServiceDefinition> {
        self.services
            .get(id)
            .ok_or_else(|| LauncherError::UnknownService(id.to_string()))
    }

    /// 装配指定服务的 LaunchSpec
    pub fn launch_spec(&self, id: &str) -> Result<LaunchSpec> {
        let definition = self.get_service(id)?;
        definition.to_launch_spec(id, &self.launcher)
    }

    /// 装配全部服务的 LaunchSpec（按id排序，status 等遍历型命令用）
    pub fn launch_specs(&self) -> Result<Vec<LaunchSpec>> {
        self.services
            .iter()
            .map(|(id, definition)| definition.to_launch_spec(id, &self.launcher))
            .collect()
    }
}

impl ServiceDefinition {
    /// 将静态配置装配成一份显式的 LaunchSpec
    ///
    /// 所有主目录展开、缺省补齐都在这里完成，启动引擎拿到的
    /// 是一个不再依赖环境的完整描述
    pub fn to_launch_spec(&self, id: &str, launcher: &LauncherConfig) -> Result<LaunchSpec> {
        let readiness = self.resolve_readiness();
        let container_name = match self.kind {
            ServiceKind::Container => {
                Some(self.container_name.clone().unwrap_or_else(|| id.to_string()))
            }
            ServiceKind::Process => None,
        };

        let build = self.resolve_build_step(id)?;
        let start = self.resolve_start_command(id, launcher)?;

        let environment: Vec<(String, String)> = self
            .env
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();

        let required_credentials = self
            .requires
            .iter()
            .map(|name| credential_requirement(name))
            .collect();

        Ok(LaunchSpec {
            name: id.to_string(),
            container_name,
            port: self.port,
            readiness,
            environment,
            required_credentials,
            build,
            start,
            start_timeout_secs: self.start_timeout_secs,
        })
    }

    fn resolve_readiness(&self) -> ReadinessProbe {
        let kind = self.readiness.unwrap_or(match self.kind {
            ServiceKind::Container => ReadinessKind::Container,
            ServiceKind::Process => ReadinessKind::Port,
        });

        match kind {
            ReadinessKind::Port => ReadinessProbe::PortBound,
            ReadinessKind::Container => ReadinessProbe::Container,
            ReadinessKind::Http => ReadinessProbe::Http {
                path: self.health_path.clone(),
            },
        }
    }

    fn resolve_build_step(&self, id: &str) -> Result<Option<BuildStep>> {
        if let Some(context) = &self.build_context {
            if self.kind != ServiceKind::Container {
                return Err(LauncherError::custom(format!(
                    "服务 {id}: build_context 仅对容器服务有效"
                )));
            }
            let image = self.image.as_ref().ok_or_else(|| {
                LauncherError::custom(format!("服务 {id}: 容器服务缺少 image 配置"))
            })?;
            return Ok(Some(BuildStep::Image {
                tag: image.clone(),
                context: context.clone(),
            }));
        }

        if let Some(dir) = &self.venv_dir {
            return Ok(Some(BuildStep::Venv {
                dir: dir.clone(),
                requirements: self.requirements.clone(),
            }));
        }

        Ok(None)
    }

    fn resolve_start_command(&self, id: &str, launcher: &LauncherConfig) -> Result<StartCommand> {
        match self.kind {
            ServiceKind::Container => {
                let image = self.image.as_ref().ok_or_else(|| {
                    LauncherError::custom(format!("服务 {id}: 容器服务缺少 image 配置"))
                })?;

                let volumes = self
                    .volumes
                    .iter()
                    .map(|mapping| parse_volume(id, mapping, launcher))
                    .collect::<Result<Vec<_>>>()?;

                Ok(StartCommand::Container(ContainerRunSpec {
                    image: image.clone(),
                    container_port: self.container_port,
                    volumes,
                    gpus: self.gpus,
                    ipc_host: self.ipc_host,
                    ulimits: self.ulimits.clone(),
                    args: self.args.clone(),
                    restart_policy: self.restart_policy.clone(),
                }))
            }
            ServiceKind::Process => {
                if self.command.is_empty() {
                    return Err(LauncherError::custom(format!(
                        "服务 {id}: 进程服务缺少 command 配置"
                    )));
                }
                let mode = match self.mode.unwrap_or(ProcessMode::Detached) {
                    ProcessMode::Foreground => LaunchMode::Foreground,
                    ProcessMode::Detached => LaunchMode::Detached,
                };
                Ok(StartCommand::Process {
                    argv: self.command.clone(),
                    work_dir: self.work_dir.clone(),
                    mode,
                })
            }
        }
    }
}

/// 解析 "主机路径:容器路径" 卷映射，主机侧支持 ~ 展开
fn parse_volume(id: &str, mapping: &str, launcher: &LauncherConfig) -> Result<(String, String)> {
    let (host_path, container_path) = mapping.split_once(':').ok_or_else(|| {
        LauncherError::custom(format!("服务 {id}: 无效的卷映射: {mapping}"))
    })?;

    Ok((
        expand_home(host_path, launcher),
        container_path.to_string(),
    ))
}

/// 将主机路径开头的 ~ 展开为主机主目录
///
/// 优先使用配置的 host_home（启动器自身跑在容器里时，挂载
/// 必须用主机侧的真实路径），否则取当前用户主目录
fn expand_home(path: &str, launcher: &LauncherConfig) -> String {
    if let Some(rest) = path.strip_prefix("~") {
        let home = launcher
            .host_home
            .clone()
            .or_else(|| dirs::home_dir().map(|p| p.to_string_lossy().to_string()))
            .unwrap_or_else(|| ".".to_string());
        return format!("{}{}", home, rest);
    }
    path.to_string()
}

/// 已知凭证的回退文件与修复提示
fn credential_requirement(name: &str) -> CredentialRequirement {
    match name {
        n if n == credentials::HF_TOKEN => CredentialRequirement {
            name: name.to_string(),
            fallback_file: Some(PathBuf::from(credentials::HF_TOKEN_FALLBACK_FILE)),
            hint: "设置 HF_TOKEN 环境变量，或执行 huggingface-cli login".to_string(),
        },
        n if n == credentials::NGC_API_KEY => CredentialRequirement {
            name: name.to_string(),
            fallback_file: Some(PathBuf::from(credentials::NGC_FALLBACK_FILE)),
            hint: "设置 NGC_API_KEY 环境变量，或执行 ngc config set".to_string(),
        },
        _ => CredentialRequirement {
            name: name.to_string(),
            fallback_file: None,
            hint: format!("设置 {name} 环境变量"),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
[launcher]
host_home = "/home/operator"

[services.qwen3-coder-30b]
kind = "container"
port = 8001
image = "vllm/vllm-openai:v0.8.3"
readiness = "http"
gpus = true
ipc_host = true
ulimits = ["memlock=-1", "stack=67108864"]
volumes = ["~/.cache/huggingface:/root/.cache/huggingface"]
requires = ["HF_TOKEN"]
args = ["vllm", "serve", "Qwen/Qwen3-Coder-30B-A3B-Instruct"]
start_timeout_secs = 300

[services.web-gui]
kind = "process"
port = 5175
command = ["uvicorn", "server:app", "--host", "0.0.0.0", "--port", "5175"]
work_dir = "web-gui"
venv_dir = "web-gui/.venv"
requirements = "web-gui/requirements.txt"
"#;

    #[test]
    fn test_parse_sample_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_eq!(config.services.len(), 2);
        assert_eq!(config.launcher.host_home.as_deref(), Some("/home/operator"));
    }

    #[test]
    fn test_container_launch_spec() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let spec = config.launch_spec("qwen3-coder-30b").unwrap();

        assert_eq!(spec.port, 8001);
        assert_eq!(spec.container_name.as_deref(), Some("qwen3-coder-30b"));
        assert_eq!(
            spec.readiness,
            ReadinessProbe::Http {
                path: "/health".to_string()
            }
        );
        assert_eq!(spec.start_timeout_secs, 300);
        assert_eq!(spec.required_credentials.len(), 1);
        assert_eq!(spec.required_credentials[0].name, "HF_TOKEN");

        // ~ 展开使用配置的 host_home
        match &spec.start {
            StartCommand::Container(run) => {
                assert_eq!(run.container_port, 8000);
                assert_eq!(
                    run.volumes[0].0,
                    "/home/operator/.cache/huggingface".to_string()
                );
                assert_eq!(run.restart_policy, "unless-stopped");
            }
            _ => panic!("应为容器启动命令"),
        }
    }

    #[test]
    fn test_process_launch_spec_defaults() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let spec = config.launch_spec("web-gui").unwrap();

        assert_eq!(spec.container_name, None);
        assert_eq!(spec.readiness, ReadinessProbe::PortBound);
        assert!(matches!(
            spec.start,
            StartCommand::Process {
                mode: LaunchMode::Detached,
                ..
            }
        ));
        assert!(matches!(spec.build, Some(BuildStep::Venv { .. })));
    }

    #[test]
    fn test_unknown_service() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        let result = config.launch_spec("nonexistent");
        assert!(matches!(result, Err(LauncherError::UnknownService(_))));
    }

    #[test]
    fn test_container_without_image_rejected() {
        let broken = r#"
[services.bad]
kind = "container"
port = 8000
"#;
        let config: AppConfig = toml::from_str(broken).unwrap();
        assert!(config.launch_spec("bad").is_err());
    }

    #[test]
    fn test_process_without_command_rejected() {
        let broken = r#"
[services.bad]
kind = "process"
port = 8000
"#;
        let config: AppConfig = toml::from_str(broken).unwrap();
        assert!(config.launch_spec("bad").is_err());
    }
}
