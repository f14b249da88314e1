use super::error::{LaunchError, LaunchResult};
use super::port;
use launcher_core::constants::{network, timeout};
use launcher_core::container::{ContainerRuntime, ContainerState};
use launcher_core::spec::{LaunchSpec, ReadinessProbe};
use std::time::Duration;

/// 服务注册表
///
/// 把"服务是否在运行"的判定收拢到一个接口后面，检测策略
/// （端口探测 / 容器查询 / HTTP 健康检查）按 LaunchSpec 的声明切换
pub struct ServiceRegistry<'a, R> {
    runtime: &'a R,
}

impl<'a, R: ContainerRuntime> ServiceRegistry<'a, R> {
    pub fn new(runtime: &'a R) -> Self {
        Self { runtime }
    }

    /// 评估就绪谓词：服务是否已经处于活动状态
    pub async fn is_active(&self, spec: &LaunchSpec) -> LaunchResult<bool> {
        match &spec.readiness {
            ReadinessProbe::PortBound => Ok(port::is_port_bound(spec.port)),
            ReadinessProbe::Container => {
                let name = self.container_name(spec)?;
                let state = self.runtime.container_state(name).await?;
                Ok(state.is_running())
            }
            ReadinessProbe::Http { path } => Ok(self.http_probe(spec.port, path).await),
        }
    }

    /// 按容器名查找现有容器的状态
    pub async fn find(&self, container_name: &str) -> LaunchResult<ContainerState> {
        Ok(self.runtime.container_state(container_name).await?)
    }

    /// 判断端口是否被非本服务的进程占用
    ///
    /// 只在就绪谓词已返回 false 之后调用。纯端口探测没有服务签名，
    /// 无从区分"自己"和"别人"，端口被占在上层直接按已运行处理；
    /// 容器/HTTP 探测则带有签名：谓词为假而端口仍被占用，说明
    /// 占用者不是期望的服务
    pub fn port_held_by_other(&self, spec: &LaunchSpec) -> bool {
        match &spec.readiness {
            ReadinessProbe::PortBound => false,
            ReadinessProbe::Container | ReadinessProbe::Http { .. } => {
                port::is_port_bound(spec.port)
            }
        }
    }

    fn container_name<'s>(&self, spec: &'s LaunchSpec) -> LaunchResult<&'s str> {
        spec.container_name.as_deref().ok_or_else(|| {
            LaunchError::Configuration(format!(
                "服务 {} 使用容器探测但未配置容器名",
                spec.name
            ))
        })
    }

    async fn http_probe(&self, port: u16, path: &str) -> bool {
        let url = format!("http://{}:{}{}", network::LOCALHOST_IPV4, port, path);

        let client = match reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout::HTTP_PROBE_TIMEOUT))
            .build()
        {
            Ok(client) => client,
            Err(_) => return false,
        };

        match client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }
}
