use crate::domain::model::{AssignmentSet, Roster};
use crate::domain::ports::Pipeline;
use crate::utils::error::Result;

#[derive(Debug, Clone)]
pub struct RunSummary {
    pub roster: Roster,
    pub assignments: AssignmentSet,
    pub artifacts: Vec<String>,
}

pub struct SantaEngine<P: Pipeline> {
    pipeline: P,
}

impl<P: Pipeline> SantaEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self { pipeline }
    }

    pub fn pipeline(&self) -> &P {
        &self.pipeline
    }

    /// Validate the roster without contacting the assignment service.
    pub async fn check(&self) -> Result<Roster> {
        tracing::info!("Validating roster (dry run)...");
        let roster = self.pipeline.extract().await?;
        tracing::info!("Roster is valid: {} employees", roster.len());
        Ok(roster)
    }

    pub async fn run(&self) -> Result<RunSummary> {
        tracing::info!("Starting Secret Santa run...");

        tracing::info!("Uploading roster...");
        let roster = self.pipeline.extract().await?;
        tracing::info!("Accepted {} employees", roster.len());

        tracing::info!("Generating assignments...");
        let assignments = self.pipeline.transform().await?;
        tracing::info!("Generated {} assignments", assignments.len());

        tracing::info!("Exporting assignments...");
        let artifacts = self.pipeline.load().await?;
        for artifact in &artifacts {
            tracing::info!("📁 Output saved to: {}", artifact);
        }

        Ok(RunSummary {
            roster,
            assignments,
            artifacts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::{Assignment, Employee};
    use crate::utils::error::SantaError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingPipeline {
        stages: AtomicUsize,
        fail_transform: bool,
    }

    #[async_trait]
    impl Pipeline for CountingPipeline {
        async fn extract(&self) -> Result<Roster> {
            self.stages.fetch_add(1, Ordering::SeqCst);
            Ok(vec![
                Employee::new("Alice", "alice@x.com"),
                Employee::new("Bob", "bob@x.com"),
            ])
        }

        async fn transform(&self) -> Result<AssignmentSet> {
            self.stages.fetch_add(1, Ordering::SeqCst);
            if self.fail_transform {
                return Err(SantaError::RemoteCallError {
                    status: Some(502),
                    message: "bad gateway".to_string(),
                });
            }
            Ok(vec![Assignment {
                giver_name: "Alice".to_string(),
                giver_email: "alice@x.com".to_string(),
                receiver_name: "Bob".to_string(),
                receiver_email: "bob@x.com".to_string(),
            }])
        }

        async fn load(&self) -> Result<Vec<String>> {
            self.stages.fetch_add(1, Ordering::SeqCst);
            Ok(vec!["out/secret_santa_assignments_2024.csv".to_string()])
        }
    }

    #[tokio::test]
    async fn test_run_executes_all_stages() {
        let engine = SantaEngine::new(CountingPipeline::default());
        let summary = engine.run().await.unwrap();

        assert_eq!(engine.pipeline().stages.load(Ordering::SeqCst), 3);
        assert_eq!(summary.roster.len(), 2);
        assert_eq!(summary.assignments.len(), 1);
        assert_eq!(summary.artifacts.len(), 1);
    }

    #[tokio::test]
    async fn test_run_stops_at_failing_stage() {
        let engine = SantaEngine::new(CountingPipeline {
            fail_transform: true,
            ..Default::default()
        });

        let err = engine.run().await.unwrap_err();
        assert!(matches!(err, SantaError::RemoteCallError { .. }));
        assert_eq!(engine.pipeline().stages.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_check_only_extracts() {
        let engine = SantaEngine::new(CountingPipeline::default());
        let roster = engine.check().await.unwrap();

        assert_eq!(roster.len(), 2);
        assert_eq!(engine.pipeline().stages.load(Ordering::SeqCst), 1);
    }
}
