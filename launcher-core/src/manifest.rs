use crate::constants::config::TOOL_MANIFEST_FILE_NAME;
use crate::{LauncherError, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use walkdir::WalkDir;

/// 工具参数定义
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolParameter {
    pub name: String,
    #[serde(rename = "type", default = "default_param_type")]
    pub param_type: String,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub default: Option<serde_yaml::Value>,
    #[serde(rename = "enum", default)]
    pub enum_values: Option<Vec<String>>,
}

fn default_param_type() -> String {
    "string".to_string()
}

/// 沙箱执行资源限制
///
/// 只是声明性元数据，由外部工具调用宿主消费，本仓库不执行任何工具
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SandboxLimits {
    #[serde(default = "default_sandbox_image")]
    pub image: String,
    /// 执行超时（秒）
    #[serde(default = "default_sandbox_timeout")]
    pub timeout: u64,
    /// 内存上限，如 "256m"
    #[serde(default = "default_sandbox_memory")]
    pub memory: String,
    /// CPU 配额（百分比）
    #[serde(default = "default_sandbox_cpu")]
    pub cpu_percent: u32,
    /// 是否允许网络访问
    #[serde(default)]
    pub network: bool,
    /// 文件系统是否只读
    #[serde(default = "default_true")]
    pub read_only: bool,
    /// 是否挂载工作区
    #[serde(default)]
    pub mount_workspace: bool,
}

fn default_sandbox_image() -> String {
    "sandbox-executor:latest".to_string()
}

fn default_sandbox_timeout() -> u64 {
    30
}

fn default_sandbox_memory() -> String {
    "256m".to_string()
}

fn default_sandbox_cpu() -> u32 {
    50
}

fn default_true() -> bool {
    true
}

impl Default for SandboxLimits {
    fn default() -> Self {
        Self {
            image: default_sandbox_image(),
            timeout: default_sandbox_timeout(),
            memory: default_sandbox_memory(),
            cpu_percent: default_sandbox_cpu(),
            network: false,
            read_only: true,
            mount_workspace: false,
        }
    }
}

/// TOOL.md 的 YAML frontmatter
#[derive(Debug, Clone, Deserialize)]
struct ManifestFrontmatter {
    name: String,
    #[serde(default)]
    description: String,
    #[serde(default = "default_version")]
    version: String,
    #[serde(default = "default_true")]
    enabled: bool,
    #[serde(default)]
    parameters: Vec<ToolParameter>,
    #[serde(default)]
    sandbox: SandboxLimits,
}

fn default_version() -> String {
    "1.0.0".to_string()
}

/// 完整的工具定义（frontmatter + markdown 正文）
#[derive(Debug, Clone)]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub version: String,
    pub enabled: bool,
    pub parameters: Vec<ToolParameter>,
    pub sandbox: SandboxLimits,
    /// frontmatter 之后的 markdown 使用说明
    pub instructions: String,
    /// TOOL.md 文件路径
    pub path: PathBuf,
}

impl ToolDefinition {
    /// 转换为 OpenAI function calling 格式
    pub fn to_openai_tool(&self) -> serde_json::Value {
        let mut properties = serde_json::Map::new();
        let mut required = Vec::new();

        for param in &self.parameters {
            let mut prop = serde_json::Map::new();
            prop.insert("type".to_string(), json!(param.param_type));
            prop.insert("description".to_string(), json!(param.description));

            if let Some(values) = &param.enum_values {
                prop.insert("enum".to_string(), json!(values));
            }
            if let Some(default) = &param.default {
                if let Ok(value) = serde_json::to_value(default) {
                    prop.insert("default".to_string(), value);
                }
            }

            properties.insert(param.name.clone(), serde_json::Value::Object(prop));
            if param.required {
                required.push(param.name.clone());
            }
        }

        json!({
            "type": "function",
            "function": {
                "name": self.name,
                "description": self.description,
                "parameters": {
                    "type": "object",
                    "properties": properties,
                    "required": required,
                }
            }
        })
    }
}

/// 工具清单加载器
///
/// 在工具目录下发现 TOOL.md 文件并解析为类型化定义
pub struct ManifestLoader {
    tools_dir: PathBuf,
    frontmatter_pattern: Regex,
}

impl ManifestLoader {
    pub fn new<P: AsRef<Path>>(tools_dir: P) -> Self {
        Self {
            tools_dir: tools_dir.as_ref().to_path_buf(),
            // frontmatter 以 --- 包围，正文在第二个 --- 之后
            frontmatter_pattern: Regex::new(r"(?s)^---\s*\n(.*?)\n---\s*\n?(.*)$")
                .expect("frontmatter 正则无效"),
        }
    }

    /// 发现工具目录下的所有 TOOL.md 文件
    pub fn discover(&self) -> Vec<PathBuf> {
        if !self.tools_dir.exists() {
            return Vec::new();
        }

        WalkDir::new(&self.tools_dir)
            .min_depth(2)
            .max_depth(2)
            .into_iter()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.file_name() == TOOL_MANIFEST_FILE_NAME)
            .map(|entry| entry.path().to_path_buf())
            .collect()
    }

    /// 解析单个 TOOL.md 文件
    pub fn parse_file(&self, path: &Path) -> Result<ToolDefinition> {
        let content = std::fs::read_to_string(path)?;

        let captures = self.frontmatter_pattern.captures(&content).ok_or_else(|| {
            LauncherError::manifest(format!("{} 缺少 YAML frontmatter", path.display()))
        })?;

        let frontmatter: ManifestFrontmatter = serde_yaml::from_str(&captures[1])
            .map_err(|e| LauncherError::manifest(format!("{} 解析失败: {e}", path.display())))?;

        if frontmatter.name.trim().is_empty() {
            return Err(LauncherError::manifest(format!(
                "{} 缺少工具名称",
                path.display()
            )));
        }

        Ok(ToolDefinition {
            name: frontmatter.name,
            description: frontmatter.description,
            version: frontmatter.version,
            enabled: frontmatter.enabled,
            parameters: frontmatter.parameters,
            sandbox: frontmatter.sandbox,
            instructions: captures[2].trim().to_string(),
            path: path.to_path_buf(),
        })
    }

    /// 加载全部启用的工具
    pub fn load_all(&self) -> BTreeMap<String, ToolDefinition> {
        let mut tools = BTreeMap::new();

        for path in self.discover() {
            match self.parse_file(&path) {
                Ok(tool) => {
                    if !tool.enabled {
                        info!("跳过禁用的工具: {}", tool.name);
                        continue;
                    }
                    info!("加载工具: {} (v{})", tool.name, tool.version);
                    tools.insert(tool.name.clone(), tool);
                }
                Err(e) => {
                    warn!("工具清单解析失败: {}", e);
                }
            }
        }

        tools
    }
}
