use super::artifact::ensure_artifact;
use super::error::{LaunchError, LaunchResult};
use super::port;
use super::registry::ServiceRegistry;
use launcher_core::constants::{config as config_paths, docker, logging, timeout};
use launcher_core::container::ContainerRuntime;
use launcher_core::credentials::CredentialStore;
use launcher_core::spec::{LaunchMode, LaunchSpec, StartCommand};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};
use tokio::process::Command;
use tokio::time::sleep;
use tracing::{info, warn};

/// 启动选项
#[derive(Debug, Clone, Copy, Default)]
pub struct LaunchOptions {
    /// 强制重建构建产物
    pub rebuild: bool,
}

/// 启动结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchOutcome {
    /// 服务已在运行（信息性终态，不是错误）
    AlreadyRunning,
    /// 分离模式启动成功，携带容器ID或进程PID
    Started { handle: String },
    /// 前台模式运行结束，携带服务的退出码
    Finished { exit_code: i32 },
}

/// 停止结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopOutcome {
    /// 服务已停止
    Stopped,
    /// 服务本来就没有运行
    NotRunning,
}

/// 启动引擎
///
/// 对一份 LaunchSpec 执行严格顺序的启动流程：
/// 就绪检测 -> 凭证检查 -> 残留清理 -> 按需构建 -> 启动 -> 就绪验证。
/// 顺序不可调换：检测之前构建或启动都可能在同一端口上制造出
/// 第二个冲突的服务实例
pub struct LaunchEngine<'a, R: ContainerRuntime> {
    runtime: &'a R,
    credentials: &'a CredentialStore,
    settle_wait: Duration,
    verify_interval: Duration,
}

impl<'a, R: ContainerRuntime> LaunchEngine<'a, R> {
    pub fn new(runtime: &'a R, credentials: &'a CredentialStore) -> Self {
        Self {
            runtime,
            credentials,
            settle_wait: Duration::from_secs(timeout::SETTLE_WAIT),
            verify_interval: Duration::from_secs(timeout::VERIFY_INTERVAL),
        }
    }

    /// 覆盖等待节奏（测试用）
    pub fn with_timing(mut self, settle_wait: Duration, verify_interval: Duration) -> Self {
        self.settle_wait = settle_wait;
        self.verify_interval = verify_interval;
        self
    }

    fn registry(&self) -> ServiceRegistry<'a, R> {
        ServiceRegistry::new(self.runtime)
    }

    /// 把 spec 描述的服务拉起到运行状态（恰好一次）
    pub async fn launch(
        &self,
        spec: &LaunchSpec,
        options: &LaunchOptions,
    ) -> LaunchResult<LaunchOutcome> {
        let registry = self.registry();

        // 1. 幂等检测：必须是第一个动作，双重启动是这里防住的
        if registry.is_active(spec).await? {
            info!("服务 {} 已在运行 (端口 {})", spec.name, spec.port);
            return Ok(LaunchOutcome::AlreadyRunning);
        }

        // 端口被占但签名不符：占用者不是期望的服务，拒绝接管
        if registry.port_held_by_other(spec) {
            return Err(LaunchError::PortInUseByOther { port: spec.port });
        }

        // 2. 凭证检查：注定失败的启动不应触碰任何容器/镜像操作
        let credential_env = self.resolve_credentials(spec)?;

        // 3. 残留清理：同名容器停在终止态会让启动撞名
        self.cleanup_stale_container(spec).await?;

        // 4. 按需构建（幂等，产物已存在时跳过）
        if let Some(build) = &spec.build {
            ensure_artifact(self.runtime, build, options.rebuild).await?;
        }

        // 5. 启动 + 就绪验证
        match &spec.start {
            StartCommand::Container(run) => {
                let name = spec
                    .container_name
                    .as_deref()
                    .ok_or_else(|| {
                        LaunchError::Configuration(format!("服务 {} 缺少容器名", spec.name))
                    })?;

                let mut env = spec.environment.clone();
                env.extend(credential_env);

                let handle = self
                    .runtime
                    .run_container(name, spec.port, run, &env)
                    .await
                    .map_err(|e| LaunchError::LaunchFailed {
                        service: spec.name.to_string(),
                        output: e.to_string(),
                    })?;

                self.verify_detached(spec).await?;
                info!("服务 {} 启动成功 (容器 {})", spec.name, &handle[..12.min(handle.len())]);
                Ok(LaunchOutcome::Started { handle })
            }
            StartCommand::Process {
                argv,
                work_dir,
                mode,
            } => {
                let mut env = spec.environment.clone();
                env.extend(credential_env);

                match mode {
                    LaunchMode::Foreground => {
                        self.run_foreground(spec, argv, work_dir.as_deref(), &env)
                            .await
                    }
                    LaunchMode::Detached => {
                        let pid = self
                            .spawn_detached(spec, argv, work_dir.as_deref(), &env)
                            .await?;
                        self.verify_detached(spec).await?;
                        info!("服务 {} 启动成功 (PID {})", spec.name, pid);
                        Ok(LaunchOutcome::Started {
                            handle: pid.to_string(),
                        })
                    }
                }
            }
        }
    }

    /// 停止一个服务（launch 的逆操作，显式调用）
    ///
    /// 容器：优雅停止、等待宽限期、无响应则强制删除；
    /// 进程：按 pid 文件定位，SIGTERM 后等待，仍存活则 SIGKILL
    pub async fn stop(&self, spec: &LaunchSpec) -> LaunchResult<StopOutcome> {
        match &spec.start {
            StartCommand::Container(_) => self.stop_container_service(spec).await,
            StartCommand::Process { .. } => self.stop_process_service(spec).await,
        }
    }

    /// 解析全部必需凭证，返回要注入子进程/容器的键值对
    fn resolve_credentials(&self, spec: &LaunchSpec) -> LaunchResult<Vec<(String, String)>> {
        let mut resolved = Vec::new();

        for requirement in &spec.required_credentials {
            let value = self
                .credentials
                .require(&spec.environment, requirement)
                .map_err(LaunchError::from)?;

            // 凭证可能来自回退文件，显式注入保证服务侧拿得到
            let already_set = spec
                .environment
                .iter()
                .any(|(key, existing)| key == &requirement.name && !existing.trim().is_empty());
            if !already_set {
                resolved.push((requirement.name.clone(), value));
            }
        }

        Ok(resolved)
    }

    /// 清理同名的终止态残留容器
    async fn cleanup_stale_container(&self, spec: &LaunchSpec) -> LaunchResult<()> {
        let Some(name) = spec.container_name.as_deref() else {
            return Ok(());
        };

        let state = self.runtime.container_state(name).await?;

        if state.is_stale() {
            info!("清理残留容器: {} ({})", name, state.display_name());
            self.runtime.remove_container(name, false).await?;
            return Ok(());
        }

        // 容器存在且不在终止态，但就绪谓词没认出它：这个名字的槽位
        // 被一个状态异常的实例占着，启动必然撞名，直接报告
        if state.exists() && !state.is_running() {
            return Err(LaunchError::LaunchFailed {
                service: spec.name.to_string(),
                output: format!("容器 {name} 处于 {} 状态，请先手动处理", state.display_name()),
            });
        }

        Ok(())
    }

    /// 前台运行：阻塞转发输出，退出码与服务一致，中断传播给子进程
    async fn run_foreground(
        &self,
        spec: &LaunchSpec,
        argv: &[String],
        work_dir: Option<&std::path::Path>,
        env: &[(String, String)],
    ) -> LaunchResult<LaunchOutcome> {
        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .envs(env.iter().map(|(k, v)| (k.clone(), v.clone())))
            .stdin(Stdio::inherit())
            .stdout(Stdio::inherit())
            .stderr(Stdio::inherit());
        if let Some(dir) = work_dir {
            command.current_dir(dir);
        }

        info!("前台启动服务 {} : {}", spec.name, argv.join(" "));

        let mut child = command.spawn().map_err(|e| LaunchError::LaunchFailed {
            service: spec.name.to_string(),
            output: format!("无法执行 {}: {e}", argv[0]),
        })?;

        tokio::select! {
            status = child.wait() => {
                let status = status.map_err(|e| LaunchError::LaunchFailed {
                    service: spec.name.to_string(),
                    output: e.to_string(),
                })?;
                let exit_code = status.code().unwrap_or(1);
                if exit_code == 0 {
                    info!("服务 {} 正常退出", spec.name);
                } else {
                    warn!("服务 {} 退出，状态码 {}", spec.name, exit_code);
                }
                Ok(LaunchOutcome::Finished { exit_code })
            }
            _ = tokio::signal::ctrl_c() => {
                info!("收到中断信号，正在停止服务 {} ...", spec.name);
                terminate_child(&mut child);
                let _ = child.wait().await;
                Ok(LaunchOutcome::Finished { exit_code: 130 })
            }
        }
    }

    /// 后台启动进程服务：输出重定向到日志文件，pid 落盘供 stop 使用
    async fn spawn_detached(
        &self,
        spec: &LaunchSpec,
        argv: &[String],
        work_dir: Option<&std::path::Path>,
        env: &[(String, String)],
    ) -> LaunchResult<u32> {
        let log_dir = logging::get_log_dir();
        std::fs::create_dir_all(&log_dir)?;
        let run_dir = config_paths::get_run_dir();
        std::fs::create_dir_all(&run_dir)?;

        let log_path = log_file_path(&spec.name);
        let log_file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&log_path)?;
        let log_stderr = log_file.try_clone()?;

        let mut command = Command::new(&argv[0]);
        command
            .args(&argv[1..])
            .envs(env.iter().map(|(k, v)| (k.clone(), v.clone())))
            .stdin(Stdio::null())
            .stdout(Stdio::from(log_file))
            .stderr(Stdio::from(log_stderr));
        if let Some(dir) = work_dir {
            command.current_dir(dir);
        }

        info!(
            "后台启动服务 {} : {} (日志: {})",
            spec.name,
            argv.join(" "),
            log_path.display()
        );

        let child = command.spawn().map_err(|e| LaunchError::LaunchFailed {
            service: spec.name.to_string(),
            output: format!("无法执行 {}: {e}", argv[0]),
        })?;

        let pid = child.id().ok_or_else(|| LaunchError::LaunchFailed {
            service: spec.name.to_string(),
            output: "进程启动后立即退出".to_string(),
        })?;

        std::fs::write(pid_file_path(&spec.name), pid.to_string())?;
        Ok(pid)
    }

    /// 分离模式的启动后验证：稳定等待后轮询就绪谓词，
    /// 有界超时，失败时带出日志尾部
    async fn verify_detached(&self, spec: &LaunchSpec) -> LaunchResult<()> {
        let registry = self.registry();
        let deadline = Duration::from_secs(spec.start_timeout_secs);
        let started_at = Instant::now();

        sleep(self.settle_wait).await;

        loop {
            if registry.is_active(spec).await? {
                return Ok(());
            }

            let elapsed = started_at.elapsed();
            if elapsed >= deadline {
                warn!(
                    "服务 {} 在 {:?} 后仍未就绪，放弃等待",
                    spec.name, elapsed
                );
                let log_tail = self.collect_log_tail(spec).await;
                return Err(LaunchError::FailedToStart {
                    service: spec.name.to_string(),
                    timeout_seconds: spec.start_timeout_secs,
                    log_tail,
                });
            }

            info!(
                "等待服务 {} 就绪... ({:?}/{:?})",
                spec.name, elapsed, deadline
            );
            sleep(self.verify_interval).await;
        }
    }

    /// 获取启动失败诊断用的日志尾部
    async fn collect_log_tail(&self, spec: &LaunchSpec) -> String {
        if let Some(name) = spec.container_name.as_deref() {
            match self
                .runtime
                .logs_tail(name, docker::LOG_TAIL_ON_FAILURE)
                .await
            {
                Ok(tail) => return tail,
                Err(e) => return format!("(获取容器日志失败: {e})"),
            }
        }

        match std::fs::read_to_string(log_file_path(&spec.name)) {
            Ok(content) => tail_lines(&content, docker::LOG_TAIL_ON_FAILURE as usize),
            Err(e) => format!("(读取日志文件失败: {e})"),
        }
    }

    async fn stop_container_service(&self, spec: &LaunchSpec) -> LaunchResult<StopOutcome> {
        let name = spec.container_name.as_deref().ok_or_else(|| {
            LaunchError::Configuration(format!("服务 {} 缺少容器名", spec.name))
        })?;

        let state = self.runtime.container_state(name).await?;
        if !state.exists() {
            info!("服务 {} 未创建", spec.name);
            return Ok(StopOutcome::NotRunning);
        }
        if !state.is_running() {
            info!("服务 {} 没有在运行 ({})", spec.name, state.display_name());
            // 顺手清掉终止态残留，让下次启动少一步
            self.runtime.remove_container(name, false).await?;
            return Ok(StopOutcome::NotRunning);
        }

        info!("停止服务 {} (宽限 {} 秒)...", spec.name, timeout::STOP_GRACE);
        if let Err(e) = self.runtime.stop_container(name, timeout::STOP_GRACE).await {
            warn!("优雅停止失败: {}，强制删除容器", e);
            self.runtime
                .remove_container(name, true)
                .await
                .map_err(|e| LaunchError::StopFailed {
                    service: spec.name.to_string(),
                    output: e.to_string(),
                })?;
            return Ok(StopOutcome::Stopped);
        }

        self.runtime.remove_container(name, false).await?;
        info!("服务 {} 已停止", spec.name);
        Ok(StopOutcome::Stopped)
    }

    #[cfg(unix)]
    async fn stop_process_service(&self, spec: &LaunchSpec) -> LaunchResult<StopOutcome> {
        use nix::sys::signal::{Signal, kill};
        use nix::unistd::Pid;

        let pid_path = pid_file_path(&spec.name);
        let pid = match std::fs::read_to_string(&pid_path) {
            Ok(content) => content.trim().parse::<i32>().map_err(|_| {
                LaunchError::FileSystem(format!("pid 文件内容无效: {}", pid_path.display()))
            })?,
            Err(_) => {
                if port::is_port_bound(spec.port) {
                    return Err(LaunchError::StopFailed {
                        service: spec.name.to_string(),
                        output: format!(
                            "端口 {} 有进程监听但没有 pid 记录，请手动停止",
                            spec.port
                        ),
                    });
                }
                info!("服务 {} 没有在运行", spec.name);
                return Ok(StopOutcome::NotRunning);
            }
        };

        let target = Pid::from_raw(pid);

        if kill(target, None).is_err() {
            // 进程已不存在，清掉过期的 pid 文件
            let _ = std::fs::remove_file(&pid_path);
            info!("服务 {} 没有在运行", spec.name);
            return Ok(StopOutcome::NotRunning);
        }

        info!("停止服务 {} (PID {})...", spec.name, pid);
        kill(target, Signal::SIGTERM).map_err(|e| LaunchError::StopFailed {
            service: spec.name.to_string(),
            output: format!("发送 SIGTERM 失败: {e}"),
        })?;

        // 宽限期内等待进程自行退出
        let grace = Duration::from_secs(timeout::PROCESS_STOP_GRACE);
        let started_at = Instant::now();
        while started_at.elapsed() < grace {
            if kill(target, None).is_err() {
                let _ = std::fs::remove_file(&pid_path);
                info!("服务 {} 已停止", spec.name);
                return Ok(StopOutcome::Stopped);
            }
            sleep(Duration::from_millis(500)).await;
        }

        warn!("服务 {} 在宽限期内未退出，发送 SIGKILL", spec.name);
        let _ = kill(target, Signal::SIGKILL);
        let _ = std::fs::remove_file(&pid_path);
        Ok(StopOutcome::Stopped)
    }

    #[cfg(not(unix))]
    async fn stop_process_service(&self, spec: &LaunchSpec) -> LaunchResult<StopOutcome> {
        Err(LaunchError::Runtime(format!(
            "服务 {}: 进程服务的停止操作仅支持 Unix 平台",
            spec.name
        )))
    }
}

/// 向前台子进程传播终止信号
#[cfg(unix)]
fn terminate_child(child: &mut tokio::process::Child) {
    use nix::sys::signal::{Signal, kill};
    use nix::unistd::Pid;

    if let Some(pid) = child.id() {
        let _ = kill(Pid::from_raw(pid as i32), Signal::SIGTERM);
    }
}

#[cfg(not(unix))]
fn terminate_child(child: &mut tokio::process::Child) {
    // Windows 上没有 SIGTERM 等价物，直接终止
    let _ = child.start_kill();
}

/// 进程服务的 pid 文件路径
pub(crate) fn pid_file_path(name: &str) -> PathBuf {
    config_paths::get_run_dir().join(format!("{name}.pid"))
}

/// 进程服务的日志文件路径
pub(crate) fn log_file_path(name: &str) -> PathBuf {
    logging::get_log_dir().join(format!("{name}.log"))
}

/// 取文本的最后 n 行
fn tail_lines(content: &str, n: usize) -> String {
    let lines: Vec<&str> = content.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use launcher_core::container::{ContainerState, ContainerSummary};
    use launcher_core::spec::{
        BuildStep, ContainerRunSpec, CredentialRequirement, ReadinessProbe,
    };
    use launcher_core::{LauncherError, Result as CoreResult};
    use std::collections::{HashMap, HashSet};
    use std::net::TcpListener;
    use std::path::Path;
    use std::sync::Mutex;

    /// 各运行时调用的次数统计
    #[derive(Debug, Clone, Copy, Default)]
    pub(crate) struct CallCounts {
        pub container_state: usize,
        pub remove_container: usize,
        pub image_exists: usize,
        pub build_image: usize,
        pub run_container: usize,
        pub stop_container: usize,
        pub logs_tail: usize,
    }

    /// 记录调用次数的 mock 运行时
    pub(crate) struct MockRuntime {
        state: Mutex<ContainerState>,
        state_after_run: ContainerState,
        existing_images: HashSet<String>,
        build_failure: Option<String>,
        run_failure: Option<String>,
        containers: Vec<ContainerSummary>,
        calls: Mutex<CallCounts>,
    }

    impl MockRuntime {
        pub(crate) fn new() -> Self {
            Self {
                state: Mutex::new(ContainerState::NotFound),
                state_after_run: ContainerState::Running,
                existing_images: HashSet::new(),
                build_failure: None,
                run_failure: None,
                containers: Vec::new(),
                calls: Mutex::new(CallCounts::default()),
            }
        }

        pub(crate) fn with_containers(mut self, containers: Vec<ContainerSummary>) -> Self {
            self.containers = containers;
            self
        }

        pub(crate) fn with_container_state(self, state: ContainerState) -> Self {
            *self.state.lock().unwrap() = state;
            self
        }

        pub(crate) fn with_state_after_run(mut self, state: ContainerState) -> Self {
            self.state_after_run = state;
            self
        }

        pub(crate) fn with_existing_image(mut self, tag: &str) -> Self {
            self.existing_images.insert(tag.to_string());
            self
        }

        pub(crate) fn with_build_failure(mut self, message: &str) -> Self {
            self.build_failure = Some(message.to_string());
            self
        }

        pub(crate) fn with_run_failure(mut self, message: &str) -> Self {
            self.run_failure = Some(message.to_string());
            self
        }

        pub(crate) fn calls(&self) -> CallCounts {
            *self.calls.lock().unwrap()
        }
    }

    impl ContainerRuntime for MockRuntime {
        async fn container_state(&self, _name: &str) -> CoreResult<ContainerState> {
            self.calls.lock().unwrap().container_state += 1;
            Ok(*self.state.lock().unwrap())
        }

        async fn remove_container(&self, _name: &str, _force: bool) -> CoreResult<()> {
            self.calls.lock().unwrap().remove_container += 1;
            *self.state.lock().unwrap() = ContainerState::NotFound;
            Ok(())
        }

        async fn image_exists(&self, tag: &str) -> CoreResult<bool> {
            self.calls.lock().unwrap().image_exists += 1;
            Ok(self.existing_images.contains(tag))
        }

        async fn build_image(&self, _tag: &str, _context: &Path) -> CoreResult<()> {
            self.calls.lock().unwrap().build_image += 1;
            match &self.build_failure {
                Some(message) => Err(LauncherError::Docker(message.clone())),
                None => Ok(()),
            }
        }

        async fn run_container(
            &self,
            _name: &str,
            _host_port: u16,
            _run: &ContainerRunSpec,
            _env: &[(String, String)],
        ) -> CoreResult<String> {
            self.calls.lock().unwrap().run_container += 1;
            match &self.run_failure {
                Some(message) => Err(LauncherError::Docker(message.clone())),
                None => {
                    *self.state.lock().unwrap() = self.state_after_run;
                    Ok("mockc0ntainer1d".to_string())
                }
            }
        }

        async fn stop_container(&self, _name: &str, _grace_secs: u64) -> CoreResult<()> {
            self.calls.lock().unwrap().stop_container += 1;
            *self.state.lock().unwrap() = ContainerState::Exited;
            Ok(())
        }

        async fn logs_tail(&self, _name: &str, _lines: u32) -> CoreResult<String> {
            self.calls.lock().unwrap().logs_tail += 1;
            Ok("mock 日志尾部".to_string())
        }

        async fn list_containers(&self) -> CoreResult<Vec<ContainerSummary>> {
            Ok(self.containers.clone())
        }
    }

    fn empty_credentials() -> CredentialStore {
        CredentialStore::new(HashMap::new(), None)
    }

    fn free_port() -> u16 {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);
        port
    }

    fn container_spec(port: u16) -> LaunchSpec {
        LaunchSpec {
            name: "qwen-test".to_string(),
            container_name: Some("qwen-test".to_string()),
            port,
            readiness: ReadinessProbe::Container,
            environment: Vec::new(),
            required_credentials: Vec::new(),
            build: Some(BuildStep::Image {
                tag: "qwen-test:latest".to_string(),
                context: PathBuf::from("."),
            }),
            start: StartCommand::Container(ContainerRunSpec {
                image: "qwen-test:latest".to_string(),
                container_port: 8000,
                volumes: Vec::new(),
                gpus: false,
                ipc_host: false,
                ulimits: Vec::new(),
                args: Vec::new(),
                restart_policy: "unless-stopped".to_string(),
            }),
            start_timeout_secs: 0,
        }
    }

    fn fast_engine<'a>(
        runtime: &'a MockRuntime,
        credentials: &'a CredentialStore,
    ) -> LaunchEngine<'a, MockRuntime> {
        LaunchEngine::new(runtime, credentials)
            .with_timing(Duration::ZERO, Duration::from_millis(10))
    }

    #[tokio::test]
    async fn test_already_running_short_circuits() {
        // 端口已被占用 + 端口探测策略：立即返回 AlreadyRunning，
        // 不允许任何构建或启动调用
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut spec = container_spec(port);
        spec.readiness = ReadinessProbe::PortBound;

        let runtime = MockRuntime::new();
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.launch(&spec, &LaunchOptions::default()).await.unwrap();
        assert_eq!(outcome, LaunchOutcome::AlreadyRunning);

        let calls = runtime.calls();
        assert_eq!(calls.build_image, 0);
        assert_eq!(calls.run_container, 0);
        assert_eq!(calls.remove_container, 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_already_running_container_probe() {
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new().with_container_state(ContainerState::Running);
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.launch(&spec, &LaunchOptions::default()).await.unwrap();
        assert_eq!(outcome, LaunchOutcome::AlreadyRunning);
        assert_eq!(runtime.calls().run_container, 0);
    }

    #[tokio::test]
    async fn test_missing_credential_blocks_runtime() {
        // 凭证缺失必须在任何容器/镜像操作之前中止
        let mut spec = container_spec(free_port());
        spec.readiness = ReadinessProbe::PortBound;
        spec.environment = vec![("REQUIRED_TOKEN".to_string(), String::new())];
        spec.required_credentials = vec![CredentialRequirement {
            name: "REQUIRED_TOKEN".to_string(),
            fallback_file: None,
            hint: "设置 REQUIRED_TOKEN 环境变量".to_string(),
        }];

        let runtime = MockRuntime::new();
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let result = engine.launch(&spec, &LaunchOptions::default()).await;
        assert!(matches!(
            result,
            Err(LaunchError::MissingCredential { name, .. }) if name == "REQUIRED_TOKEN"
        ));

        let calls = runtime.calls();
        assert_eq!(calls.container_state, 0);
        assert_eq!(calls.remove_container, 0);
        assert_eq!(calls.image_exists, 0);
        assert_eq!(calls.build_image, 0);
        assert_eq!(calls.run_container, 0);
    }

    #[tokio::test]
    async fn test_full_launch_flow() {
        // 镜像缺失：构建一次，启动一次，验证通过
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new();
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.launch(&spec, &LaunchOptions::default()).await.unwrap();
        assert!(matches!(outcome, LaunchOutcome::Started { .. }));

        let calls = runtime.calls();
        assert_eq!(calls.build_image, 1);
        assert_eq!(calls.run_container, 1);
    }

    #[tokio::test]
    async fn test_existing_artifact_skips_build() {
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new().with_existing_image("qwen-test:latest");
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.launch(&spec, &LaunchOptions::default()).await.unwrap();
        assert!(matches!(outcome, LaunchOutcome::Started { .. }));

        let calls = runtime.calls();
        assert_eq!(calls.build_image, 0);
        assert_eq!(calls.run_container, 1);
    }

    #[tokio::test]
    async fn test_stale_container_removed_before_start() {
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new().with_container_state(ContainerState::Exited);
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.launch(&spec, &LaunchOptions::default()).await.unwrap();
        assert!(matches!(outcome, LaunchOutcome::Started { .. }));
        assert_eq!(runtime.calls().remove_container, 1);
    }

    #[tokio::test]
    async fn test_failed_to_start_is_bounded() {
        // 容器拉起后始终不就绪：有界等待后返回 FailedToStart，
        // 并带出日志尾部
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new().with_state_after_run(ContainerState::Exited);
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let result = engine.launch(&spec, &LaunchOptions::default()).await;
        match result {
            Err(LaunchError::FailedToStart { log_tail, .. }) => {
                assert!(log_tail.contains("mock"));
            }
            other => panic!("期望 FailedToStart，得到 {other:?}"),
        }
        assert!(runtime.calls().logs_tail >= 1);
    }

    #[tokio::test]
    async fn test_port_in_use_by_other() {
        // 端口被占但容器签名不符：拒绝接管
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let port = listener.local_addr().unwrap().port();

        let spec = container_spec(port);
        let runtime = MockRuntime::new();
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let result = engine.launch(&spec, &LaunchOptions::default()).await;
        assert!(matches!(
            result,
            Err(LaunchError::PortInUseByOther { port: p }) if p == port
        ));

        let calls = runtime.calls();
        assert_eq!(calls.build_image, 0);
        assert_eq!(calls.run_container, 0);
        drop(listener);
    }

    #[tokio::test]
    async fn test_launch_failure_surfaces_output() {
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new().with_run_failure("docker: Error response from daemon");
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let result = engine.launch(&spec, &LaunchOptions::default()).await;
        match result {
            Err(LaunchError::LaunchFailed { output, .. }) => {
                assert!(output.contains("Error response"));
            }
            other => panic!("期望 LaunchFailed，得到 {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_stop_running_container() {
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new().with_container_state(ContainerState::Running);
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.stop(&spec).await.unwrap();
        assert_eq!(outcome, StopOutcome::Stopped);

        let calls = runtime.calls();
        assert_eq!(calls.stop_container, 1);
        assert_eq!(calls.remove_container, 1);
    }

    #[tokio::test]
    async fn test_stop_not_created_container() {
        let spec = container_spec(free_port());
        let runtime = MockRuntime::new();
        let credentials = empty_credentials();
        let engine = fast_engine(&runtime, &credentials);

        let outcome = engine.stop(&spec).await.unwrap();
        assert_eq!(outcome, StopOutcome::NotRunning);
        assert_eq!(runtime.calls().stop_container, 0);
    }

    #[test]
    fn test_tail_lines() {
        let content = "a\nb\nc\nd\n";
        assert_eq!(tail_lines(content, 2), "c\nd");
        assert_eq!(tail_lines(content, 10), "a\nb\nc\nd");
    }
}
