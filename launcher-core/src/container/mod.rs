// 模块声明
mod command;
mod image;
mod runtime;
mod types;

// 重新导出公共API
pub use runtime::ContainerRuntime;
pub use types::{ContainerState, ContainerSummary, DockerManager};

// 导入测试模块
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_container_state_parse() {
        assert_eq!(ContainerState::parse("running"), ContainerState::Running);
        assert_eq!(ContainerState::parse("Running\n"), ContainerState::Running);
        assert_eq!(ContainerState::parse("exited"), ContainerState::Exited);
        assert_eq!(ContainerState::parse("created"), ContainerState::Created);
        assert_eq!(ContainerState::parse("weird"), ContainerState::Unknown);
    }

    #[test]
    fn test_container_state_predicates() {
        assert!(ContainerState::Running.is_running());
        assert!(!ContainerState::Exited.is_running());
        assert!(ContainerState::Exited.is_stale());
        assert!(ContainerState::Created.is_stale());
        assert!(!ContainerState::Running.is_stale());
        assert!(!ContainerState::NotFound.exists());
        assert!(ContainerState::Paused.exists());
    }

    #[test]
    fn test_container_summary_parsing() {
        let manager = DockerManager::new();

        let json_output = r#"{"Names":"vllm-qwen3-coder","State":"running","Image":"vllm/vllm-openai:v0.8.3","Ports":"0.0.0.0:8001->8000/tcp"}
{"Names":"model-manager","State":"exited","Image":"model-manager:latest","Ports":""}"#;

        let containers = manager.parse_container_summaries(json_output).unwrap();
        assert_eq!(containers.len(), 2);
        assert_eq!(containers[0].name, "vllm-qwen3-coder");
        assert_eq!(containers[0].state, ContainerState::Running);
        assert_eq!(containers[0].ports, vec!["0.0.0.0:8001->8000/tcp"]);
        assert_eq!(containers[1].state, ContainerState::Exited);
        assert!(containers[1].ports.is_empty());
    }

    #[test]
    fn test_container_summary_parsing_empty() {
        let manager = DockerManager::new();
        let containers = manager.parse_container_summaries("").unwrap();
        assert!(containers.is_empty());
    }
}
