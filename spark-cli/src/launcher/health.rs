use super::port;
use launcher_core::container::{ContainerRuntime, ContainerState};
use launcher_core::spec::LaunchSpec;
use serde::{Deserialize, Serialize};
use tracing::error;

/// 服务的检测状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ServiceState {
    /// 运行中
    Running,
    /// 已停止（容器存在或进程曾经运行过）
    Stopped,
    /// 从未创建
    NotCreated,
    /// 未知状态
    Unknown,
}

impl ServiceState {
    /// 获取状态的显示名称
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceState::Running => "运行中",
            ServiceState::Stopped => "已停止",
            ServiceState::NotCreated => "未创建",
            ServiceState::Unknown => "未知",
        }
    }

    /// 判断状态是否健康
    pub fn is_healthy(&self) -> bool {
        matches!(self, ServiceState::Running)
    }
}

impl From<ContainerState> for ServiceState {
    fn from(state: ContainerState) -> Self {
        match state {
            ContainerState::Running => ServiceState::Running,
            ContainerState::Exited
            | ContainerState::Created
            | ContainerState::Paused
            | ContainerState::Dead => ServiceState::Stopped,
            ContainerState::Restarting => ServiceState::Unknown,
            ContainerState::NotFound => ServiceState::NotCreated,
            ContainerState::Unknown => ServiceState::Unknown,
        }
    }
}

/// 单个服务的状态条目
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServiceReport {
    /// 服务id
    pub name: String,
    /// 端口
    pub port: u16,
    /// 检测状态
    pub state: ServiceState,
    /// 容器名（进程服务为 None）
    pub container_name: Option<String>,
}

/// 全部服务的状态报告
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusReport {
    /// 服务详情
    pub services: Vec<ServiceReport>,
    /// 运行中服务数量
    pub running_count: usize,
    /// 服务总数量
    pub total_count: usize,
    /// 检查时间
    pub check_time: chrono::DateTime<chrono::Utc>,
    /// 错误信息
    pub errors: Vec<String>,
}

impl StatusReport {
    pub fn new() -> Self {
        Self {
            services: Vec::new(),
            running_count: 0,
            total_count: 0,
            check_time: chrono::Utc::now(),
            errors: Vec::new(),
        }
    }

    /// 添加服务条目
    pub fn add_service(&mut self, report: ServiceReport) {
        if report.state.is_healthy() {
            self.running_count += 1;
        }
        self.total_count += 1;
        self.services.push(report);
    }

    /// 添加错误信息
    pub fn add_error(&mut self, error: String) {
        self.errors.push(error);
    }
}

impl Default for StatusReport {
    fn default() -> Self {
        Self::new()
    }
}

/// 收集全部服务的检测状态
///
/// 容器服务的状态用一次 docker ps 批量获取（N 个服务不做 N 次
/// 运行时调用），进程服务探端口，与原始脚本的判定一致
pub async fn collect_status<R: ContainerRuntime>(
    runtime: &R,
    specs: &[LaunchSpec],
) -> StatusReport {
    let mut report = StatusReport::new();

    let has_containers = specs.iter().any(|spec| spec.container_name.is_some());
    let summaries = if has_containers {
        match runtime.list_containers().await {
            Ok(summaries) => Some(summaries),
            Err(e) => {
                let message = format!("获取容器列表失败: {}", e);
                error!("{}", message);
                report.add_error(message);
                None
            }
        }
    } else {
        Some(Vec::new())
    };

    for spec in specs {
        let state = match spec.container_name.as_deref() {
            Some(container_name) => match &summaries {
                Some(summaries) => summaries
                    .iter()
                    .find(|summary| summary.name == container_name)
                    .map(|summary| ServiceState::from(summary.state))
                    .unwrap_or(ServiceState::NotCreated),
                None => ServiceState::Unknown,
            },
            None => {
                if port::is_port_bound(spec.port) {
                    ServiceState::Running
                } else {
                    ServiceState::Stopped
                }
            }
        };

        report.add_service(ServiceReport {
            name: spec.name.clone(),
            port: spec.port,
            state,
            container_name: spec.container_name.clone(),
        });
    }

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::launcher::engine::tests::MockRuntime;
    use launcher_core::spec::{LaunchMode, ReadinessProbe, StartCommand};

    fn process_spec(name: &str, port: u16) -> LaunchSpec {
        LaunchSpec {
            name: name.to_string(),
            container_name: None,
            port,
            readiness: ReadinessProbe::PortBound,
            environment: Vec::new(),
            required_credentials: Vec::new(),
            build: None,
            start: StartCommand::Process {
                argv: vec!["sleep".to_string(), "1".to_string()],
                work_dir: None,
                mode: LaunchMode::Detached,
            },
            start_timeout_secs: 60,
        }
    }

    #[test]
    fn test_service_state_from_container_state() {
        assert_eq!(
            ServiceState::from(ContainerState::Running),
            ServiceState::Running
        );
        assert_eq!(
            ServiceState::from(ContainerState::Exited),
            ServiceState::Stopped
        );
        assert_eq!(
            ServiceState::from(ContainerState::NotFound),
            ServiceState::NotCreated
        );
    }

    #[test]
    fn test_status_report_counting() {
        let mut report = StatusReport::new();
        report.add_service(ServiceReport {
            name: "a".to_string(),
            port: 8001,
            state: ServiceState::Running,
            container_name: None,
        });
        report.add_service(ServiceReport {
            name: "b".to_string(),
            port: 8002,
            state: ServiceState::Stopped,
            container_name: None,
        });

        assert_eq!(report.running_count, 1);
        assert_eq!(report.total_count, 2);
    }

    #[tokio::test]
    async fn test_collect_status_containers() {
        use launcher_core::container::ContainerSummary;
        use launcher_core::spec::ContainerRunSpec;

        let container_spec = |name: &str, port: u16| LaunchSpec {
            name: name.to_string(),
            container_name: Some(name.to_string()),
            port,
            readiness: ReadinessProbe::Container,
            environment: Vec::new(),
            required_credentials: Vec::new(),
            build: None,
            start: StartCommand::Container(ContainerRunSpec {
                image: "test:latest".to_string(),
                container_port: 8000,
                volumes: Vec::new(),
                gpus: false,
                ipc_host: false,
                ulimits: Vec::new(),
                args: Vec::new(),
                restart_policy: "unless-stopped".to_string(),
            }),
            start_timeout_secs: 60,
        };

        // 运行中的容器在列表里，从未创建的不在
        let runtime = MockRuntime::new().with_containers(vec![ContainerSummary {
            name: "vllm-qwen".to_string(),
            state: ContainerState::Running,
            image: "vllm/vllm-openai:v0.8.3".to_string(),
            ports: vec!["0.0.0.0:8001->8000/tcp".to_string()],
        }]);

        let specs = vec![
            container_spec("vllm-qwen", 8001),
            container_spec("nim-llama", 8002),
        ];

        let report = collect_status(&runtime, &specs).await;
        assert_eq!(report.running_count, 1);
        assert_eq!(report.services[0].state, ServiceState::Running);
        assert_eq!(report.services[1].state, ServiceState::NotCreated);
    }

    #[tokio::test]
    async fn test_collect_status_port_probe() {
        // 绑定的端口报运行中，空闲端口报已停止
        let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let bound_port = listener.local_addr().unwrap().port();

        let free = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
        let free_port = free.local_addr().unwrap().port();
        drop(free);

        let runtime = MockRuntime::new();
        let specs = vec![
            process_spec("bound", bound_port),
            process_spec("free", free_port),
        ];

        let report = collect_status(&runtime, &specs).await;
        assert_eq!(report.total_count, 2);
        assert_eq!(report.running_count, 1);
        assert_eq!(report.services[0].state, ServiceState::Running);
        assert_eq!(report.services[1].state, ServiceState::Stopped);
        drop(listener);
    }
}
