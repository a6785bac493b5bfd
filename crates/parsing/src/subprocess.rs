use async_trait::async_trait;
use tokio::process::Command;

use crate::error::SubprocessError;

/// Runs an external tool and captures its stdout, the same shape the
/// gateway's own `Subprocess` trait uses for its document/control-plane
/// tooling. Giving `Command` the trait directly (rather than a bespoke
/// wrapper struct) keeps call sites reading like ordinary
/// `Command::new(...).arg(...).execute()`.
#[async_trait]
pub trait Subprocess {
    async fn execute(&mut self) -> Result<String, SubprocessError>;
}

#[async_trait]
impl Subprocess for Command {
    async fn execute(&mut self) -> Result<String, SubprocessError> {
        let output = self.output().await?;
        let status = output.status;

        if status.success() {
            Ok(String::from_utf8(output.stdout)?)
        } else {
            let stdout = String::from_utf8_lossy(&output.stdout);
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(SubprocessError::Failure { status, stdout: stdout.into(), stderr: stderr.into() })
        }
    }
}
