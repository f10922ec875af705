use super::ToolError;
use crate::config::SchemaSettings;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;

#[async_trait]
pub trait SchemaCompiler: Send + Sync {
    /// Compiles a schema file and returns its canonical structural text.
    async fn compile(&self, file: &Path) -> Result<String, ToolError>;
}

/// Drives the schema compiler with the text-emitting plugin, building both
/// with the build tool first when they are missing.
#[derive(Debug, Clone)]
pub struct CapnpCompiler {
    root: PathBuf,
    build_tool: String,
    settings: SchemaSettings,
}

impl CapnpCompiler {
    pub fn new(root: impl Into<PathBuf>, build_tool: impl Into<String>, settings: SchemaSettings) -> Self {
        Self {
            root: root.into(),
            build_tool: build_tool.into(),
            settings,
        }
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }

    fn build_hint(&self) -> String {
        format!("{} build {}", self.build_tool, self.settings.build_targets.join(" "))
    }

    async fn ensure_built(&self, compiler: &Path, plugin: &Path) -> Result<(), ToolError> {
        if compiler.exists() && plugin.exists() {
            return Ok(());
        }

        tracing::debug!(targets = ?self.settings.build_targets, "building schema compiler");
        let status = Command::new(&self.build_tool)
            .arg("build")
            .args(&self.settings.build_targets)
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await;

        match status {
            Ok(s) if s.success() => Ok(()),
            Ok(s) => {
                tracing::warn!(status = %s, "schema compiler build failed");
                Err(self.unavailable())
            }
            Err(e) => {
                tracing::warn!(error = %e, "could not run build tool");
                Err(self.unavailable())
            }
        }
    }

    fn unavailable(&self) -> ToolError {
        ToolError::Unavailable {
            tool: "capnp".to_string(),
            hint: self.build_hint(),
        }
    }
}

#[async_trait]
impl SchemaCompiler for CapnpCompiler {
    async fn compile(&self, file: &Path) -> Result<String, ToolError> {
        let compiler = self.resolve(&self.settings.compiler);
        let plugin = self.resolve(&self.settings.plugin);
        self.ensure_built(&compiler, &plugin).await?;

        let file = self.resolve(file);
        let mut cmd = Command::new(&compiler);
        cmd.arg("compile").arg("--no-standard-import");
        for import in &self.settings.import_paths {
            cmd.arg(format!("-I{}", self.resolve(import).display()));
        }
        if let Some(dir) = file.parent() {
            cmd.arg(format!("-I{}", dir.display()));
        }
        cmd.arg(format!("-o{}", plugin.display())).arg(&file);

        tracing::debug!(file = %file.display(), "compiling schema");
        let output = cmd
            .current_dir(&self.root)
            .stdin(Stdio::null())
            .output()
            .await
            .map_err(|e| ToolError::spawn("capnp", self.build_hint(), e))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            tracing::warn!(stderr = %stderr, "schema compilation failed");
            return Err(ToolError::Failed {
                tool: "capnp".to_string(),
                status: output.status.to_string(),
                detail: stderr.trim().to_string(),
            });
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_tools_report_build_hint() {
        let dir = tempfile::tempdir().unwrap();
        let compiler = CapnpCompiler::new(
            dir.path(),
            "declmap-no-such-build-tool",
            SchemaSettings::default(),
        );

        let err = compiler
            .compile(Path::new("src/workerd/io/worker.capnp"))
            .await
            .unwrap_err();
        match err {
            ToolError::Unavailable { hint, .. } => {
                assert!(hint.starts_with("declmap-no-such-build-tool build "));
                assert!(hint.contains("@capnp-cpp//src/capnp:capnp_tool"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
