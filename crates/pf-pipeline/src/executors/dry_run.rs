use async_trait::async_trait;
use pf_rules::Operations;

use crate::context::FileContext;
use crate::operation::{OperationExecutor, OperationOutput};

/// Logs each phase's operations and reports success without modifying
/// anything.
#[derive(Debug, Clone, Copy, Default)]
pub struct DryRunExecutor;

#[async_trait]
impl OperationExecutor for DryRunExecutor {
    fn name(&self) -> &'static str {
        "dry-run"
    }

    async fn execute(
        &self,
        phase: &str,
        operations: &Operations,
        ctx: &FileContext,
    ) -> pf_core::Result<OperationOutput> {
        let keys = operations.keys();
        tracing::info!(
            phase = %phase,
            file = %ctx.path().display(),
            operations = ?keys,
            "[DRY RUN] Would run operations"
        );

        let summary = if keys.is_empty() {
            "nothing to run".to_string()
        } else {
            format!("would run: {}", keys.join(", "))
        };
        Ok(OperationOutput::unchanged().with_summary(summary))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pf_probe::MediaInfo;
    use serde_json::json;

    #[tokio::test]
    async fn reports_unchanged_with_summary() {
        let ctx = FileContext::from_media_info(MediaInfo::new("/media/a.mkv"));
        let ops = Operations::new()
            .with("transcode", json!({"video": "hevc"}))
            .with("remux", json!({}));

        let out = DryRunExecutor.execute("encode", &ops, &ctx).await.unwrap();
        assert!(!out.file_modified);
        assert_eq!(out.summary.as_deref(), Some("would run: remux, transcode"));
    }

    #[tokio::test]
    async fn empty_payload() {
        let ctx = FileContext::from_media_info(MediaInfo::new("/media/a.mkv"));
        let out = DryRunExecutor
            .execute("noop", &Operations::new(), &ctx)
            .await
            .unwrap();
        assert_eq!(out.summary.as_deref(), Some("nothing to run"));
    }
}
