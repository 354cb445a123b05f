use crate::core::session::Session;
use crate::domain::model::{AssignmentSet, Roster};
use crate::domain::ports::{AssignmentService, ConfigProvider, Notifier, Pipeline, Storage};
use crate::utils::error::Result;
use std::path::Path;

/// Reads the roster through `input`, generates through the session's
/// assignment service and writes each configured export through `output`.
pub struct RosterPipeline<S, C, A, N>
where
    S: Storage,
    C: ConfigProvider,
    A: AssignmentService,
    N: Notifier,
{
    input: S,
    output: S,
    config: C,
    session: Session<A, N>,
}

impl<S, C, A, N> RosterPipeline<S, C, A, N>
where
    S: Storage,
    C: ConfigProvider,
    A: AssignmentService,
    N: Notifier,
{
    pub fn new(input: S, output: S, config: C, service: A, notifier: N) -> Self {
        let session = Session::new(service, notifier, config.year());
        Self {
            input,
            output,
            config,
            session,
        }
    }

    pub fn session(&self) -> &Session<A, N> {
        &self.session
    }

    fn upload_name(&self) -> String {
        let roster_file = self.config.roster_file();
        Path::new(roster_file)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(roster_file)
            .to_string()
    }
}

#[async_trait::async_trait]
impl<S, C, A, N> Pipeline for RosterPipeline<S, C, A, N>
where
    S: Storage,
    C: ConfigProvider,
    A: AssignmentService,
    N: Notifier,
{
    async fn extract(&self) -> Result<Roster> {
        tracing::debug!("Reading roster from {}", self.config.roster_file());
        let contents = self.input.read_file(self.config.roster_file()).await?;
        tracing::debug!("Read {} bytes", contents.len());

        self.session.upload(&self.upload_name(), &contents).await
    }

    async fn transform(&self) -> Result<AssignmentSet> {
        self.session.generate().await
    }

    async fn load(&self) -> Result<Vec<String>> {
        let mut written = Vec::new();
        for encoding in self.config.export_formats() {
            let artifact = self.session.export(*encoding).await?;

            tracing::debug!(
                "Writing {} ({} bytes) to storage",
                artifact.file_name,
                artifact.bytes.len()
            );
            self.output
                .write_file(&artifact.file_name, &artifact.bytes)
                .await?;
            written.push(format!("{}/{}", self.config.output_path(), artifact.file_name));
        }
        Ok(written)
    }
}
