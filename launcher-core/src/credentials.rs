use crate::spec::CredentialRequirement;
use crate::{LauncherError, Result};
use std::collections::HashMap;
use std::path::PathBuf;

/// 凭证仓库
///
/// 启动时对进程环境做一次快照，之后的解析不再读取环境变量，
/// 行为只由输入决定，测试时可以注入任意环境
#[derive(Debug, Clone)]
pub struct CredentialStore {
    env: HashMap<String, String>,
    home_dir: Option<PathBuf>,
}

impl CredentialStore {
    /// 从当前进程环境创建凭证仓库
    pub fn from_process_env() -> Self {
        Self {
            env: std::env::vars().collect(),
            home_dir: dirs::home_dir(),
        }
    }

    /// 用显式环境和主目录创建（测试用）
    pub fn new(env: HashMap<String, String>, home_dir: Option<PathBuf>) -> Self {
        Self { env, home_dir }
    }

    /// 按优先级解析凭证值
    ///
    /// 1. 服务配置里显式注入的环境变量
    /// 2. 进程环境快照
    /// 3. 回退凭证文件（相对 $HOME，取首个非空行）
    ///
    /// 空白字符串视为缺失
    pub fn resolve(
        &self,
        explicit_env: &[(String, String)],
        req: &CredentialRequirement,
    ) -> Option<String> {
        if let Some((_, value)) = explicit_env.iter().find(|(key, _)| key == &req.name) {
            if !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
            // 显式配置为空串：按缺失处理，继续向后查找
        }

        if let Some(value) = self.env.get(&req.name) {
            if !value.trim().is_empty() {
                return Some(value.trim().to_string());
            }
        }

        self.read_fallback_file(req)
    }

    /// 要求凭证必须存在，否则返回 MissingCredential
    pub fn require(
        &self,
        explicit_env: &[(String, String)],
        req: &CredentialRequirement,
    ) -> Result<String> {
        self.resolve(explicit_env, req)
            .ok_or_else(|| LauncherError::MissingCredential {
                name: req.name.clone(),
                hint: req.hint.clone(),
            })
    }

    fn read_fallback_file(&self, req: &CredentialRequirement) -> Option<String> {
        let relative = req.fallback_file.as_ref()?;
        let path = self.home_dir.as_ref()?.join(relative);

        let content = std::fs::read_to_string(path).ok()?;
        content
            .lines()
            .map(str::trim)
            .find(|line| !line.is_empty())
            .map(str::to_string)
    }
}
