use crate::domain::model::NotifyLevel;
use crate::domain::ports::Notifier;

/// Prints notifications for a terminal user and mirrors them into the log.
#[derive(Debug, Clone, Default)]
pub struct ConsoleNotifier {
    quiet: bool,
}

impl ConsoleNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Log only, nothing on stdout/stderr.
    pub fn quiet() -> Self {
        Self { quiet: true }
    }
}

impl Notifier for ConsoleNotifier {
    fn notify(&self, level: NotifyLevel, message: &str) {
        match level {
            NotifyLevel::Success => {
                tracing::info!("✅ {}", message);
                if !self.quiet {
                    println!("✅ {}", message);
                }
            }
            NotifyLevel::Warning => {
                tracing::warn!("⚠️ {}", message);
                if !self.quiet {
                    eprintln!("⚠️ {}", message);
                }
            }
            NotifyLevel::Error => {
                tracing::error!("❌ {}", message);
                if !self.quiet {
                    eprintln!("❌ {}", message);
                }
            }
        }
    }
}
