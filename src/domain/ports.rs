use crate::domain::model::{Assignment, AssignmentSet, Employee, Encoding, NotifyLevel, Roster};
use crate::utils::error::Result;
use async_trait::async_trait;
use std::time::Duration;

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn api_endpoint(&self) -> &str;
    fn output_path(&self) -> &str;
    fn roster_file(&self) -> &str;
    fn export_formats(&self) -> &[Encoding];
    fn request_timeout(&self) -> Duration;
    fn year(&self) -> i32;
}

/// The external service that pairs givers with receivers.
#[async_trait]
pub trait AssignmentService: Send + Sync {
    async fn generate(&self, year: i32, employees: &[Employee]) -> Result<Vec<Assignment>>;
}

/// Fire-and-forget user notification side channel.
pub trait Notifier: Send + Sync {
    fn notify(&self, level: NotifyLevel, message: &str);
}

/// Upload, generate and export stages. The session behind a pipeline owns the
/// roster and assignment set, so later stages read them from there.
#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<Roster>;
    async fn transform(&self) -> Result<AssignmentSet>;
    async fn load(&self) -> Result<Vec<String>>;
}
