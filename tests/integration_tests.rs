use httpmock::prelude::*;
use santa_etl::core::ConfigProvider;
use santa_etl::core::parser::parse;
use santa_etl::core::validator::read_assignments;
use santa_etl::core::Encoding;
use santa_etl::{
    ConsoleNotifier, HttpAssignmentClient, LocalStorage, RosterPipeline, SantaEngine, SantaError,
    Settings,
};
use tempfile::TempDir;

fn assignments_body() -> serde_json::Value {
    serde_json::json!([
        {"giverName": "Alice", "giverEmail": "alice@x.com", "receiverName": "Bob", "receiverEmail": "bob@x.com"},
        {"giverName": "Bob", "giverEmail": "bob@x.com", "receiverName": "Carol", "receiverEmail": "carol@x.com"},
        {"giverName": "Carol", "giverEmail": "carol@x.com", "receiverName": "Alice", "receiverEmail": "alice@x.com"}
    ])
}

fn settings(server: &MockServer, roster_file: String, output_path: String) -> Settings {
    let mut settings = Settings::new(roster_file);
    settings.api_endpoint = server.base_url();
    settings.output_path = output_path;
    settings.year = 2024;
    settings
}

fn engine(
    settings: Settings,
) -> SantaEngine<RosterPipeline<LocalStorage, Settings, HttpAssignmentClient, ConsoleNotifier>> {
    let service =
        HttpAssignmentClient::new(settings.api_endpoint(), settings.request_timeout()).unwrap();
    let input = LocalStorage::new(".");
    let output = LocalStorage::new(settings.output_path());
    SantaEngine::new(RosterPipeline::new(
        input,
        output,
        settings,
        service,
        ConsoleNotifier::quiet(),
    ))
}

#[tokio::test]
async fn test_end_to_end_csv_roster() {
    let temp_dir = TempDir::new().unwrap();
    let roster_path = temp_dir.path().join("employees.csv");
    std::fs::write(
        &roster_path,
        "Employee_Name,Employee_EmailID,Department\n\
         Alice,alice@x.com,Ops\n\
         Bob,bob@x.com,Sales\n\
         ,nobody@x.com,Ops\n\
         Carol,carol@x.com,HR\n\
         Dave,dave-at-x,HR\n",
    )
    .unwrap();
    let output_dir = temp_dir.path().join("out");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST)
            .path("/assign-secret-santa/generate/2024")
            .json_body(serde_json::json!({
                "employees": [
                    {"name": "Alice", "email": "alice@x.com"},
                    {"name": "Bob", "email": "bob@x.com"},
                    {"name": "Carol", "email": "carol@x.com"}
                ]
            }));
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(assignments_body());
    });

    let engine = engine(settings(
        &server,
        roster_path.to_str().unwrap().to_string(),
        output_dir.to_str().unwrap().to_string(),
    ));
    let summary = engine.run().await.unwrap();

    api_mock.assert();
    assert_eq!(summary.roster.len(), 3);
    assert_eq!(summary.assignments.len(), 3);
    assert_eq!(summary.artifacts.len(), 2);

    let csv = std::fs::read_to_string(output_dir.join("secret_santa_assignments_2024.csv")).unwrap();
    let lines: Vec<&str> = csv.lines().collect();
    assert_eq!(
        lines[0],
        "Employee_Name,Employee_EmailID,Secret_Child_Name,Secret_Child_EmailID"
    );
    assert_eq!(lines[1], "Alice,alice@x.com,Bob,bob@x.com");
    assert_eq!(lines.len(), 4);

    let xlsx = std::fs::read(output_dir.join("secret_santa_assignments_2024.xlsx")).unwrap();
    let rows = parse(Encoding::Xlsx, &xlsx).unwrap();
    assert_eq!(read_assignments(&rows).unwrap(), summary.assignments);
}

#[tokio::test]
async fn test_end_to_end_xlsx_roster() {
    use santa_etl::core::export::ExportSerializer;
    use santa_etl::core::Employee;

    let temp_dir = TempDir::new().unwrap();
    let roster = vec![
        Employee::new("Alice", "alice@x.com"),
        Employee::new("Bob", "bob@x.com"),
        Employee::new("Carol", "carol@x.com"),
    ];
    let artifact = ExportSerializer::serialize_roster(Encoding::Xlsx, &roster, 2024).unwrap();
    let roster_path = temp_dir.path().join("Employees.XLSX");
    std::fs::write(&roster_path, &artifact.bytes).unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/assign-secret-santa/generate/2024");
        then.status(200)
            .header("Content-Type", "application/json")
            .json_body(assignments_body());
    });

    let mut settings = settings(
        &server,
        roster_path.to_str().unwrap().to_string(),
        temp_dir.path().join("out").to_str().unwrap().to_string(),
    );
    settings.formats = vec![Encoding::Csv];
    let engine = engine(settings);

    let summary = engine.run().await.unwrap();
    api_mock.assert();
    assert_eq!(summary.roster, roster);
    assert_eq!(summary.artifacts.len(), 1);
    assert!(summary.artifacts[0].ends_with("secret_santa_assignments_2024.csv"));
}

#[tokio::test]
async fn test_remote_failure_writes_nothing() {
    let temp_dir = TempDir::new().unwrap();
    let roster_path = temp_dir.path().join("employees.csv");
    std::fs::write(
        &roster_path,
        "Employee_Name,Employee_EmailID\nAlice,alice@x.com\nBob,bob@x.com\n",
    )
    .unwrap();
    let output_dir = temp_dir.path().join("out");

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST).path("/assign-secret-santa/generate/2024");
        then.status(500)
            .header("Content-Type", "application/json")
            .json_body(serde_json::json!({"message": "assignment failed"}));
    });

    let engine = engine(settings(
        &server,
        roster_path.to_str().unwrap().to_string(),
        output_dir.to_str().unwrap().to_string(),
    ));
    let err = engine.run().await.unwrap_err();

    api_mock.assert();
    match err {
        SantaError::RemoteCallError { status, message } => {
            assert_eq!(status, Some(500));
            assert_eq!(message, "assignment failed");
        }
        other => panic!("expected RemoteCallError, got {:?}", other),
    }
    assert!(!output_dir.exists());
    assert!(engine.pipeline().session().assignments().is_empty());
    assert_eq!(engine.pipeline().session().roster().len(), 2);
}

#[tokio::test]
async fn test_dry_run_never_calls_service() {
    let temp_dir = TempDir::new().unwrap();
    let roster_path = temp_dir.path().join("employees.csv");
    std::fs::write(
        &roster_path,
        "Employee_Name,Employee_EmailID\nAlice,alice@x.com\nBob,bob@x.com\n",
    )
    .unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(assignments_body());
    });

    let engine = engine(settings(
        &server,
        roster_path.to_str().unwrap().to_string(),
        temp_dir.path().join("out").to_str().unwrap().to_string(),
    ));
    let roster = engine.check().await.unwrap();

    assert_eq!(roster.len(), 2);
    api_mock.assert_hits(0);
}

#[tokio::test]
async fn test_unsupported_roster_stops_before_service() {
    let temp_dir = TempDir::new().unwrap();
    let roster_path = temp_dir.path().join("employees.json");
    std::fs::write(&roster_path, "[]").unwrap();

    let server = MockServer::start();
    let api_mock = server.mock(|when, then| {
        when.method(POST);
        then.status(200).json_body(assignments_body());
    });

    let engine = engine(settings(
        &server,
        roster_path.to_str().unwrap().to_string(),
        temp_dir.path().join("out").to_str().unwrap().to_string(),
    ));
    let err = engine.run().await.unwrap_err();

    assert!(matches!(err, SantaError::UnsupportedFormat { .. }));
    api_mock.assert_hits(0);
    assert!(engine.pipeline().session().roster().is_empty());
}
