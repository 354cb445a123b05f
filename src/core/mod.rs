pub mod engine;
pub mod export;
pub mod format;
pub mod orchestrator;
pub mod parser;
pub mod session;
pub mod validator;
pub mod xlsx;

pub use crate::domain::model::{Artifact, Assignment, AssignmentSet, Employee, Encoding, RawRow, Roster};
pub use crate::domain::ports::{AssignmentService, ConfigProvider, Notifier, Pipeline, Storage};
pub use crate::utils::error::Result;
