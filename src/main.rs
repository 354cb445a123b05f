use anyhow::Context;
use clap::Parser;
use santa_etl::core::ConfigProvider;
use santa_etl::utils::error::{ErrorCategory, ErrorSeverity};
use santa_etl::utils::{logger, validation::Validate};
use santa_etl::{
    CliConfig, ConsoleNotifier, HttpAssignmentClient, LocalStorage, RosterPipeline, SantaEngine,
    SantaError, Settings, TomlConfig,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = CliConfig::parse();

    // 初始化日誌
    if cli.json_logs {
        logger::init_json_logger(cli.verbose);
    } else {
        logger::init_cli_logger(cli.verbose);
    }

    tracing::info!("Starting santa-etl");
    if cli.verbose {
        tracing::debug!("CLI config: {:?}", cli);
    }

    let toml = match &cli.config {
        Some(path) => {
            tracing::info!("📁 Loading configuration from: {}", path);
            Some(
                TomlConfig::from_file(path)
                    .with_context(|| format!("failed to load config file '{}'", path))?,
            )
        }
        None => None,
    };
    let settings = Settings::resolve(&cli, toml.as_ref());

    // 驗證配置
    if let Err(e) = settings.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(exit_code(&e));
    }
    print_settings(&settings);

    let service = HttpAssignmentClient::new(settings.api_endpoint(), settings.request_timeout())
        .context("failed to build HTTP client")?;
    let input = LocalStorage::new(".");
    let output = LocalStorage::new(settings.output_path());
    let pipeline = RosterPipeline::new(input, output, settings.clone(), service, ConsoleNotifier::new());
    let engine = SantaEngine::new(pipeline);

    if cli.dry_run {
        tracing::info!("🔍 DRY RUN MODE - roster validation only");
        match engine.check().await {
            Ok(roster) => {
                println!("👥 Employees ({}):", roster.len());
                for employee in &roster {
                    println!("  {} - {}", employee.name, employee.email);
                }
                return Ok(());
            }
            Err(e) => fail(&e),
        }
    }

    match engine.run().await {
        Ok(summary) => {
            println!("👥 Employees: {}", summary.roster.len());
            println!("🎁 Assignments:");
            for assignment in &summary.assignments {
                println!("  {} → {}", assignment.giver_email, assignment.receiver_email);
            }
            for artifact in &summary.artifacts {
                println!("📁 Output saved to: {}", artifact);
            }
            Ok(())
        }
        Err(e) => fail(&e),
    }
}

fn print_settings(settings: &Settings) {
    println!("📋 Configuration Summary:");
    println!("  Roster: {}", settings.roster_file());
    println!("  Service: {}", settings.api_endpoint());
    println!("  Output: {}", settings.output_path());
    let formats: Vec<&str> = settings.export_formats().iter().map(|f| f.label()).collect();
    println!("  Formats: {}", formats.join(", "));
    println!("  Year: {}", settings.year());
    println!();
}

/// 根據錯誤嚴重程度決定退出碼
fn exit_code(e: &SantaError) -> i32 {
    match e.severity() {
        ErrorSeverity::Low => 4,
        ErrorSeverity::Medium => 2,
        ErrorSeverity::High => 1,
        ErrorSeverity::Critical => 3,
    }
}

fn fail(e: &SantaError) -> ! {
    tracing::error!(
        "❌ Secret Santa run failed: {} (Category: {:?}, Severity: {:?})",
        e,
        e.category(),
        e.severity()
    );
    tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

    // 管線內的錯誤已經由 ConsoleNotifier 印出，檔案系統錯誤則否
    if e.category() == ErrorCategory::System {
        eprintln!("❌ {}", e.user_friendly_message());
    }
    eprintln!("💡 Suggestion: {}", e.recovery_suggestion());
    std::process::exit(exit_code(e));
}
