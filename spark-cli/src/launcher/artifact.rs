use super::error::{LaunchError, LaunchResult};
use launcher_core::container::ContainerRuntime;
use launcher_core::spec::BuildStep;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::info;

/// 构建产物引用
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArtifactRef {
    /// 本地镜像标签
    Image(String),
    /// 虚拟环境目录
    Venv(PathBuf),
}

/// 确保构建产物存在（幂等）
///
/// 后置条件：产物存在且可用。产物已存在时不执行构建，
/// 保证重启路径保持快速；`rebuild` 为真时强制重建
pub async fn ensure_artifact<R: ContainerRuntime>(
    runtime: &R,
    step: &BuildStep,
    rebuild: bool,
) -> LaunchResult<ArtifactRef> {
    match step {
        BuildStep::Image { tag, context } => {
            if !rebuild && runtime.image_exists(tag).await? {
                info!("镜像 {} 已存在，跳过构建", tag);
                return Ok(ArtifactRef::Image(tag.clone()));
            }

            runtime
                .build_image(tag, context)
                .await
                .map_err(|e| LaunchError::BuildFailed {
                    target: step.target_name(),
                    output: e.to_string(),
                })?;

            Ok(ArtifactRef::Image(tag.clone()))
        }
        BuildStep::Venv { dir, requirements } => {
            if !rebuild && dir.exists() {
                info!("虚拟环境 {} 已存在，跳过构建", dir.display());
                return Ok(ArtifactRef::Venv(dir.clone()));
            }

            create_venv(dir, requirements.as_deref(), step).await?;
            Ok(ArtifactRef::Venv(dir.clone()))
        }
    }
}

/// 创建虚拟环境并安装依赖
async fn create_venv(
    dir: &Path,
    requirements: Option<&Path>,
    step: &BuildStep,
) -> LaunchResult<()> {
    info!("创建虚拟环境: {}", dir.display());

    let dir_str = dir.to_string_lossy().to_string();
    run_build_command("python3", &["-m", "venv", &dir_str], step).await?;

    if let Some(requirements) = requirements {
        if !requirements.exists() {
            return Err(LaunchError::BuildFailed {
                target: step.target_name(),
                output: format!("依赖清单不存在: {}", requirements.display()),
            });
        }

        info!("安装依赖: {}", requirements.display());
        let pip = dir.join("bin").join("pip").to_string_lossy().to_string();
        let requirements_str = requirements.to_string_lossy().to_string();
        run_build_command(&pip, &["install", "-r", &requirements_str], step).await?;
    }

    Ok(())
}

/// 执行构建命令，失败时带上完整输出返回 BuildFailed
async fn run_build_command(program: &str, args: &[&str], step: &BuildStep) -> LaunchResult<()> {
    let output = Command::new(program)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|e| LaunchError::BuildFailed {
            target: step.target_name(),
            output: format!("无法执行 {program}: {e}"),
        })?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(LaunchError::BuildFailed {
            target: step.target_name(),
            output: stderr.trim().to_string(),
        });
    }

    Ok(())
}
