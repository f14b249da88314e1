use anyhow::{Context, Result, anyhow};
use launcher_core::constants::gpu;
use std::process::Stdio;
use tokio::process::Command;
use tracing::{info, warn};

/// GPU 显存概况
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuMemory {
    pub total_mb: u64,
    pub used_mb: u64,
    pub free_mb: u64,
}

/// 占用显存的计算进程
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GpuProcess {
    pub pid: String,
    pub name: String,
    pub memory_mb: u64,
}

/// 显示 GPU 显存使用情况
pub async fn run_gpu() -> Result<()> {
    if which::which(gpu::NVIDIA_SMI).is_err() {
        return Err(anyhow!("nvidia-smi 未安装或不在 PATH 中"));
    }

    let memory_output = run_nvidia_smi(&[gpu::MEMORY_QUERY, gpu::CSV_FORMAT]).await?;
    let process_output = run_nvidia_smi(&[gpu::PROCESS_QUERY, gpu::CSV_FORMAT]).await?;

    let memory =
        parse_memory(&memory_output).ok_or_else(|| anyhow!("无法解析 nvidia-smi 显存输出"))?;
    let processes = parse_processes(&process_output);

    info!("=== GPU 显存使用情况 ===");
    info!("总计: {} MiB", memory.total_mb);
    info!(
        "已用: {} MiB ({:.1}%)",
        memory.used_mb,
        memory.used_mb as f64 / memory.total_mb.max(1) as f64 * 100.0
    );
    info!("可用: {} MiB", memory.free_mb);

    if processes.is_empty() {
        info!("当前没有占用显存的计算进程");
    } else {
        info!("计算进程:");
        for process in &processes {
            info!(
                "  • PID {} - {} ({} MiB)",
                process.pid, process.name, process.memory_mb
            );
        }
    }

    Ok(())
}

async fn run_nvidia_smi(args: &[&str]) -> Result<String> {
    let output = Command::new(gpu::NVIDIA_SMI)
        .args(args)
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await
        .context("执行 nvidia-smi 失败")?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(anyhow!("nvidia-smi 执行失败: {}", stderr.trim()));
    }

    Ok(String::from_utf8_lossy(&output.stdout).to_string())
}

/// 解析 "total, used, free" 格式的显存行
fn parse_memory(output: &str) -> Option<GpuMemory> {
    let line = output.lines().find(|line| !line.trim().is_empty())?;
    let parts: Vec<&str> = line.split(',').collect();
    if parts.len() < 3 {
        return None;
    }

    Some(GpuMemory {
        total_mb: parts[0].trim().parse().ok()?,
        used_mb: parts[1].trim().parse().ok()?,
        free_mb: parts[2].trim().parse().ok()?,
    })
}

/// 解析 "pid, name, used_memory" 格式的进程列表
fn parse_processes(output: &str) -> Vec<GpuProcess> {
    let mut processes = Vec::new();

    for line in output.lines() {
        if line.trim().is_empty() {
            continue;
        }
        let parts: Vec<&str> = line.split(',').collect();
        if parts.len() < 3 {
            continue;
        }

        let memory = parts[2].trim();
        // 部分驱动对非计算进程报 N/A
        let memory_mb = if memory.chars().all(|c| c.is_ascii_digit()) {
            memory.parse().unwrap_or(0)
        } else {
            warn!("进程 {} 显存值无法解析: {}", parts[0].trim(), memory);
            0
        };

        processes.push(GpuProcess {
            pid: parts[0].trim().to_string(),
            name: parts[1].trim().to_string(),
            memory_mb,
        });
    }

    processes
}
