use crate::core::export::ExportSerializer;
use crate::core::orchestrator::{lock, AssignmentOrchestrator, GenerationState};
use crate::core::validator::RosterValidator;
use crate::core::{format, parser};
use crate::domain::model::{Artifact, AssignmentSet, Encoding, NotifyLevel, Roster};
use crate::domain::ports::{AssignmentService, Notifier};
use crate::utils::error::{Result, SantaError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;

/// Gate for one class of user action. Held for the duration of the action.
struct BusyFlag {
    action: &'static str,
    busy: AtomicBool,
}

struct BusyToken<'a>(&'a AtomicBool);

impl Drop for BusyToken<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}

impl BusyFlag {
    const fn new(action: &'static str) -> Self {
        Self {
            action,
            busy: AtomicBool::new(false),
        }
    }

    fn acquire(&self) -> Result<BusyToken<'_>> {
        self.busy
            .compare_exchange(false, true, Ordering::Acquire, Ordering::Relaxed)
            .map(|_| BusyToken(&self.busy))
            .map_err(|_| SantaError::Busy {
                action: self.action,
            })
    }
}

#[derive(Debug, Default)]
struct RosterState {
    employees: Roster,
    revision: u64,
    file_name: Option<String>,
}

/// Owns the roster and assignment set for one user session and runs the
/// upload, generate and export actions against them. Every failure leaves
/// the previous state in place and is reported through the notifier.
pub struct Session<A: AssignmentService, N: Notifier> {
    orchestrator: AssignmentOrchestrator<A>,
    notifier: N,
    roster: Mutex<RosterState>,
    upload: BusyFlag,
    export: BusyFlag,
    year: i32,
}

impl<A: AssignmentService, N: Notifier> Session<A, N> {
    pub fn new(service: A, notifier: N, year: i32) -> Self {
        Self {
            orchestrator: AssignmentOrchestrator::new(service),
            notifier,
            roster: Mutex::new(RosterState::default()),
            upload: BusyFlag::new("upload"),
            export: BusyFlag::new("export"),
            year,
        }
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn roster(&self) -> Roster {
        lock(&self.roster).employees.clone()
    }

    pub fn file_name(&self) -> Option<String> {
        lock(&self.roster).file_name.clone()
    }

    /// Generation needs a roster of at least two employees and no call in flight.
    pub fn can_generate(&self) -> bool {
        lock(&self.roster).employees.len() >= crate::core::validator::MIN_ROSTER_SIZE
            && self.orchestrator.state() == GenerationState::Idle
    }

    pub fn generation_state(&self) -> GenerationState {
        self.orchestrator.state()
    }

    /// Most recent successful assignment set, possibly generated from an
    /// earlier roster; check [`Session::assignments_are_current`].
    pub fn assignments(&self) -> AssignmentSet {
        self.orchestrator
            .current()
            .map(|generated| generated.assignments)
            .unwrap_or_default()
    }

    /// False once a new roster has been uploaded after the last generation.
    pub fn assignments_are_current(&self) -> bool {
        match self.orchestrator.current() {
            Some(generated) => generated.roster_revision == lock(&self.roster).revision,
            None => false,
        }
    }

    fn report<T>(&self, result: Result<T>, success: impl FnOnce(&T) -> String) -> Result<T> {
        match &result {
            Ok(value) => self.notifier.notify(NotifyLevel::Success, &success(value)),
            Err(e) => self.notifier.notify(NotifyLevel::Error, &e.user_friendly_message()),
        }
        result
    }

    /// Detect, parse and validate an uploaded file. On success the roster is
    /// replaced wholesale.
    pub async fn upload(&self, file_name: &str, contents: &[u8]) -> Result<Roster> {
        let result = self.try_upload(file_name, contents);
        self.report(result, |roster| {
            format!("Loaded {} employees from {}", roster.len(), file_name)
        })
    }

    fn try_upload(&self, file_name: &str, contents: &[u8]) -> Result<Roster> {
        let _token = self.upload.acquire()?;

        let encoding = format::detect(file_name)?;
        let rows = parser::parse(encoding, contents)?;
        let roster = RosterValidator::validate(&rows)?;

        let mut state = lock(&self.roster);
        state.employees = roster.clone();
        state.revision += 1;
        state.file_name = Some(file_name.to_string());
        tracing::info!(
            "📋 Roster replaced from {} ({} employees, revision {})",
            file_name,
            roster.len(),
            state.revision
        );
        Ok(roster)
    }

    pub async fn generate(&self) -> Result<AssignmentSet> {
        let (roster, revision) = {
            let state = lock(&self.roster);
            (state.employees.clone(), state.revision)
        };

        let result = self.orchestrator.generate(&roster, revision, self.year).await;
        self.report(result, |_| {
            "Secret Santa assignments generated successfully!".to_string()
        })
    }

    /// Serialize the current assignment set. Only one export runs at a time.
    /// Assignments generated before the latest upload are still exported,
    /// but the notification says they belong to the previous roster.
    pub async fn export(&self, encoding: Encoding) -> Result<Artifact> {
        match self.try_export(encoding) {
            Ok((artifact, false)) => {
                tracing::warn!("Exported assignments generated from a previous roster upload");
                self.notifier.notify(
                    NotifyLevel::Warning,
                    &format!(
                        "{} downloaded ({}), but these assignments were generated for a previous roster. Generate again to match the current roster.",
                        encoding.label(),
                        artifact.file_name
                    ),
                );
                Ok(artifact)
            }
            result => self.report(result.map(|(artifact, _)| artifact), |artifact| {
                format!("{} downloaded successfully! ({})", encoding.label(), artifact.file_name)
            }),
        }
    }

    /// Returns the artifact and whether it matches the current roster.
    fn try_export(&self, encoding: Encoding) -> Result<(Artifact, bool)> {
        let _token = self.export.acquire()?;

        let assignments = self.assignments();
        if assignments.is_empty() {
            return Err(SantaError::NoAssignments);
        }
        let current = self.assignments_are_current();
        let artifact = ExportSerializer::serialize(encoding, &assignments, self.year)?;
        Ok((artifact, current))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::validator::read_assignments;
    use crate::domain::model::{Assignment, Employee};
    use async_trait::async_trait;
    use std::sync::atomic::AtomicUsize;
    use std::sync::Arc;

    #[derive(Clone, Default)]
    struct RecordingNotifier {
        messages: Arc<Mutex<Vec<(NotifyLevel, String)>>>,
    }

    impl RecordingNotifier {
        fn last(&self) -> Option<(NotifyLevel, String)> {
            lock(&self.messages).last().cloned()
        }
    }

    impl Notifier for RecordingNotifier {
        fn notify(&self, level: NotifyLevel, message: &str) {
            lock(&self.messages).push((level, message.to_string()));
        }
    }

    #[derive(Clone, Default)]
    struct RotatingService {
        fail: Arc<AtomicBool>,
        calls: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl AssignmentService for RotatingService {
        async fn generate(&self, _year: i32, employees: &[Employee]) -> Result<Vec<Assignment>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail.load(Ordering::SeqCst) {
                return Err(SantaError::RemoteCallError {
                    status: None,
                    message: "connection refused".to_string(),
                });
            }
            Ok(employees
                .iter()
                .enumerate()
                .map(|(i, giver)| {
                    let receiver = &employees[(i + 1) % employees.len()];
                    Assignment {
                        giver_name: giver.name.clone(),
                        giver_email: giver.email.clone(),
                        receiver_name: receiver.name.clone(),
                        receiver_email: receiver.email.clone(),
                    }
                })
                .collect())
        }
    }

    const TWO_EMPLOYEES: &str = "Employee_Name,Employee_EmailID\nAlice,alice@x.com\nBob,bob@x.com\n";
    const THREE_EMPLOYEES: &str =
        "Employee_Name,Employee_EmailID\nAlice,alice@x.com\nBob,bob@x.com\nCarol,carol@x.com\n";

    fn session() -> (Session<RotatingService, RecordingNotifier>, RotatingService, RecordingNotifier) {
        let service = RotatingService::default();
        let notifier = RecordingNotifier::default();
        (
            Session::new(service.clone(), notifier.clone(), 2024),
            service,
            notifier,
        )
    }

    #[tokio::test]
    async fn test_upload_replaces_roster() {
        let (session, _, notifier) = session();

        session.upload("team.csv", TWO_EMPLOYEES.as_bytes()).await.unwrap();
        assert_eq!(session.roster().len(), 2);

        session.upload("team.csv", THREE_EMPLOYEES.as_bytes()).await.unwrap();
        assert_eq!(
            session.roster(),
            vec![
                Employee::new("Alice", "alice@x.com"),
                Employee::new("Bob", "bob@x.com"),
                Employee::new("Carol", "carol@x.com"),
            ]
        );
        assert_eq!(session.file_name().as_deref(), Some("team.csv"));
        assert_eq!(notifier.last().unwrap().0, NotifyLevel::Success);
    }

    #[tokio::test]
    async fn test_failed_uploads_leave_roster_unchanged() {
        let (session, _, notifier) = session();
        session.upload("team.csv", TWO_EMPLOYEES.as_bytes()).await.unwrap();
        let before = session.roster();

        let err = session.upload("team.txt", TWO_EMPLOYEES.as_bytes()).await.unwrap_err();
        assert!(matches!(err, SantaError::UnsupportedFormat { .. }));
        assert_eq!(
            notifier.last(),
            Some((
                NotifyLevel::Error,
                "Please upload either a CSV or XLSX file".to_string()
            ))
        );

        let err = session
            .upload("team.csv", b"Name,Email\nAlice,alice@x.com\n")
            .await
            .unwrap_err();
        assert!(matches!(err, SantaError::SchemaError { .. }));

        let err = session
            .upload("team.csv", b"Employee_Name,Employee_EmailID\nAlice,alice@x.com\n")
            .await
            .unwrap_err();
        assert!(matches!(err, SantaError::CardinalityError { .. }));

        assert_eq!(session.roster(), before);
        assert_eq!(session.file_name().as_deref(), Some("team.csv"));
    }

    #[tokio::test]
    async fn test_generate_requires_roster() {
        let (session, service, notifier) = session();
        assert!(!session.can_generate());

        let err = session.generate().await.unwrap_err();
        assert!(matches!(err, SantaError::CardinalityError { found: 0, .. }));
        assert_eq!(service.calls.load(Ordering::SeqCst), 0);
        assert_eq!(notifier.last().unwrap().0, NotifyLevel::Error);
    }

    #[tokio::test]
    async fn test_generate_then_export() {
        let (session, _, notifier) = session();
        session.upload("team.csv", THREE_EMPLOYEES.as_bytes()).await.unwrap();
        assert!(session.can_generate());

        let set = session.generate().await.unwrap();
        assert_eq!(
            notifier.last(),
            Some((
                NotifyLevel::Success,
                "Secret Santa assignments generated successfully!".to_string()
            ))
        );
        assert!(session.assignments_are_current());

        let artifact = session.export(Encoding::Csv).await.unwrap();
        assert_eq!(artifact.file_name, "secret_santa_assignments_2024.csv");
        let rows = parser::parse(Encoding::Csv, &artifact.bytes).unwrap();
        assert_eq!(read_assignments(&rows).unwrap(), set);

        // 匯出結束後旗標已釋放，可以再次匯出
        assert!(session.export(Encoding::Xlsx).await.is_ok());
    }

    #[tokio::test]
    async fn test_failed_generation_keeps_previous_assignments() {
        let (session, service, notifier) = session();
        session.upload("team.csv", THREE_EMPLOYEES.as_bytes()).await.unwrap();
        let first = session.generate().await.unwrap();

        service.fail.store(true, Ordering::SeqCst);
        let err = session.generate().await.unwrap_err();
        assert!(matches!(err, SantaError::RemoteCallError { .. }));
        assert_eq!(
            notifier.last(),
            Some((NotifyLevel::Error, "Error: connection refused".to_string()))
        );
        assert_eq!(session.assignments(), first);
        assert_eq!(session.generation_state(), GenerationState::Idle);
    }

    #[tokio::test]
    async fn test_new_upload_marks_assignments_stale() {
        let (session, _, notifier) = session();
        session.upload("team.csv", THREE_EMPLOYEES.as_bytes()).await.unwrap();
        session.generate().await.unwrap();
        assert!(session.assignments_are_current());

        session.upload("other.csv", TWO_EMPLOYEES.as_bytes()).await.unwrap();
        assert!(!session.assignments_are_current());
        assert_eq!(session.assignments().len(), 3);

        let artifact = session.export(Encoding::Csv).await.unwrap();
        let rows = parser::parse(Encoding::Csv, &artifact.bytes).unwrap();
        assert_eq!(read_assignments(&rows).unwrap().len(), 3);
        let (level, message) = notifier.last().unwrap();
        assert_eq!(level, NotifyLevel::Warning);
        assert!(message.contains("previous roster"), "{}", message);
        assert!(!message.contains("successfully"), "{}", message);

        session.generate().await.unwrap();
        assert!(session.assignments_are_current());
        assert_eq!(session.assignments().len(), 2);

        session.export(Encoding::Csv).await.unwrap();
        assert_eq!(
            notifier.last(),
            Some((
                NotifyLevel::Success,
                "CSV downloaded successfully! (secret_santa_assignments_2024.csv)".to_string()
            ))
        );
    }

    #[tokio::test]
    async fn test_export_without_assignments() {
        let (session, _, notifier) = session();
        session.upload("team.csv", TWO_EMPLOYEES.as_bytes()).await.unwrap();

        let err = session.export(Encoding::Xlsx).await.unwrap_err();
        assert!(matches!(err, SantaError::NoAssignments));
        assert_eq!(notifier.last().unwrap().0, NotifyLevel::Error);

        let err = session.export(Encoding::Xlsx).await.unwrap_err();
        assert!(matches!(err, SantaError::NoAssignments));
    }

    #[test]
    fn test_busy_flag_is_exclusive_until_token_dropped() {
        let flag = BusyFlag::new("export");
        let token = flag.acquire().unwrap();
        assert!(matches!(flag.acquire(), Err(SantaError::Busy { action: "export" })));

        drop(token);
        assert!(flag.acquire().is_ok());
    }
}
