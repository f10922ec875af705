use super::ToolError;
use async_trait::async_trait;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::process::Command;

#[async_trait]
pub trait GraphQuery: Send + Sync {
    /// Evaluates a query expression and returns the labels it yields, one per output line.
    async fn query(&self, expression: &str) -> Result<Vec<String>, ToolError>;
}

/// Runs `bazel query '<expr>' --output label` in the project root.
#[derive(Debug, Clone)]
pub struct BazelQuery {
    tool: String,
    root: PathBuf,
}

impl BazelQuery {
    pub fn new(tool: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            tool: tool.into(),
            root: root.into(),
        }
    }
}

#[async_trait]
impl GraphQuery for BazelQuery {
    async fn query(&self, expression: &str) -> Result<Vec<String>, ToolError> {
        tracing::debug!(tool = %self.tool, expression, "graph query");

        let output = Command::new(&self.tool)
            .arg("query")
            .arg(expression)
            .args(["--output", "label"])
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await
            .map_err(|e| {
                ToolError::spawn(&self.tool, format!("install {} or add it to PATH", self.tool), e)
            })?;

        if !output.status.success() {
            return Err(ToolError::Failed {
                tool: self.tool.clone(),
                status: output.status.to_string(),
                detail: format!("query '{}'", expression),
            });
        }

        Ok(parse_labels(&String::from_utf8_lossy(&output.stdout)))
    }
}

fn parse_labels(stdout: &str) -> Vec<String> {
    stdout
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_labels_skips_blank_lines() {
        let labels = parse_labels("//src/workerd/api:http\n\n  @ssl//:crypto  \n");
        assert_eq!(labels, vec!["//src/workerd/api:http", "@ssl//:crypto"]);
    }

    #[tokio::test]
    async fn test_missing_tool_is_unavailable() {
        let query = BazelQuery::new("declmap-no-such-build-tool", std::env::temp_dir());
        let err = query.query("//...").await.unwrap_err();
        assert!(matches!(err, ToolError::Unavailable { .. }));
    }
}
