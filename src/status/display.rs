//! Display resolver
//!
//! Maps the current tracker state to the one status line the UI shows.
//! Priority is fixed: extraction, then downloads, then the cloud provider,
//! then the local status.

use std::collections::{BTreeSet, HashMap};
use std::fmt;

use super::progress::DownloadProgressEntry;
use super::state::{LocalState, TranscriptionState};
use crate::models::ModelCatalog;

/// Everything the resolver reads. Borrowed so resolving never copies state.
pub struct DisplayContext<'a> {
    pub state: &'a TranscriptionState,
    pub current_model_id: Option<&'a str>,
    pub catalog: &'a ModelCatalog,
    pub downloads: &'a HashMap<String, DownloadProgressEntry>,
    pub extracting: &'a BTreeSet<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum StatusDisplay {
    Extracting { model: String },
    ExtractingMany { count: usize },
    Downloading { percent: u8 },
    DownloadingMany { count: usize },
    Cloud { provider: String },
    ActiveModel { name: String },
    NoModelSelected,
    Loading { model: Option<String> },
    Preparing { model: Option<String> },
    Error { message: String },
    GenericError,
    NoModelNeeded,
    DownloadingGeneric,
}

impl fmt::Display for StatusDisplay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StatusDisplay::Extracting { model } => write!(f, "Extracting {}...", model),
            StatusDisplay::ExtractingMany { count } => write!(f, "Extracting {} models...", count),
            StatusDisplay::Downloading { percent } => write!(f, "Downloading {}%", percent),
            StatusDisplay::DownloadingMany { count } => {
                write!(f, "Downloading {} models...", count)
            }
            StatusDisplay::Cloud { provider } => write!(f, "{} (Cloud)", provider),
            StatusDisplay::ActiveModel { name } => f.write_str(name),
            StatusDisplay::NoModelSelected => f.write_str("Select a model"),
            StatusDisplay::Loading { model: Some(model) } => write!(f, "Loading {}...", model),
            StatusDisplay::Loading { model: None } => f.write_str("Loading model..."),
            StatusDisplay::Preparing { model: Some(model) } => write!(f, "Preparing {}...", model),
            StatusDisplay::Preparing { model: None } => f.write_str("Preparing model..."),
            StatusDisplay::Error { message } => write!(f, "Error: {}", message),
            StatusDisplay::GenericError => f.write_str("Model error"),
            StatusDisplay::NoModelNeeded => f.write_str("No model needed"),
            StatusDisplay::DownloadingGeneric => f.write_str("Downloading..."),
        }
    }
}

pub fn resolve_display(ctx: &DisplayContext<'_>) -> StatusDisplay {
    match ctx.extracting.len() {
        0 => {}
        1 => {
            let id = ctx.extracting.iter().next().map(String::as_str).unwrap_or_default();
            return StatusDisplay::Extracting {
                model: ctx.catalog.display_name_or_id(id).to_string(),
            };
        }
        count => return StatusDisplay::ExtractingMany { count },
    }

    match ctx.downloads.len() {
        0 => {}
        1 => {
            let percent = ctx
                .downloads
                .values()
                .next()
                .map(|entry| entry.clamped_percentage().round() as u8)
                .unwrap_or(0);
            return StatusDisplay::Downloading { percent };
        }
        count => return StatusDisplay::DownloadingMany { count },
    }

    let local = match ctx.state {
        TranscriptionState::Cloud { provider_name } => {
            return StatusDisplay::Cloud {
                provider: provider_name.to_string(),
            }
        }
        TranscriptionState::Local(local) => local,
    };

    let current_name = ctx
        .current_model_id
        .filter(|id| !id.is_empty())
        .map(|id| ctx.catalog.display_name_or_id(id).to_string());

    match local {
        LocalState::Ready | LocalState::Unloaded => match current_name {
            Some(name) => StatusDisplay::ActiveModel { name },
            None => StatusDisplay::NoModelSelected,
        },
        LocalState::Loading => StatusDisplay::Loading {
            model: current_name,
        },
        LocalState::Extracting => StatusDisplay::Preparing {
            model: current_name,
        },
        LocalState::Error(message) if !message.trim().is_empty() => StatusDisplay::Error {
            message: message.clone(),
        },
        LocalState::Error(_) => StatusDisplay::GenericError,
        LocalState::NoModel => StatusDisplay::NoModelNeeded,
        LocalState::Downloading => StatusDisplay::DownloadingGeneric,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ModelDescriptor;

    struct Fixture {
        state: TranscriptionState,
        current: Option<String>,
        catalog: ModelCatalog,
        downloads: HashMap<String, DownloadProgressEntry>,
        extracting: BTreeSet<String>,
    }

    impl Fixture {
        fn new(state: TranscriptionState) -> Self {
            let mut catalog = ModelCatalog::new();
            catalog.replace(vec![
                ModelDescriptor::new("base.en", "Base (English)", 142, true),
                ModelDescriptor::new("large-v3-turbo", "Large v3 Turbo", 1536, false),
            ]);
            Self {
                state,
                current: None,
                catalog,
                downloads: HashMap::new(),
                extracting: BTreeSet::new(),
            }
        }

        fn download(mut self, id: &str, percentage: f64) -> Self {
            self.downloads.insert(
                id.to_string(),
                DownloadProgressEntry {
                    downloaded: 0,
                    total: 100,
                    percentage,
                },
            );
            self
        }

        fn extracting(mut self, id: &str) -> Self {
            self.extracting.insert(id.to_string());
            self
        }

        fn current(mut self, id: &str) -> Self {
            self.current = Some(id.to_string());
            self
        }

        fn resolve(&self) -> StatusDisplay {
            resolve_display(&DisplayContext {
                state: &self.state,
                current_model_id: self.current.as_deref(),
                catalog: &self.catalog,
                downloads: &self.downloads,
                extracting: &self.extracting,
            })
        }
    }

    fn local(state: LocalState) -> Fixture {
        Fixture::new(TranscriptionState::Local(state))
    }

    #[test]
    fn test_extraction_wins_over_everything() {
        let display = Fixture::new(TranscriptionState::cloud("OpenAI").unwrap())
            .download("large-v3-turbo", 50.0)
            .extracting("base.en")
            .resolve();
        assert_eq!(
            display,
            StatusDisplay::Extracting {
                model: "Base (English)".to_string()
            }
        );
    }

    #[test]
    fn test_multiple_extractions_report_count() {
        let display = local(LocalState::Extracting)
            .extracting("a")
            .extracting("b")
            .resolve();
        assert_eq!(display, StatusDisplay::ExtractingMany { count: 2 });
        assert!(display.to_string().contains("2 models"));
    }

    #[test]
    fn test_download_percentage_is_clamped() {
        assert_eq!(
            local(LocalState::Downloading).download("m1", 140.0).resolve(),
            StatusDisplay::Downloading { percent: 100 }
        );
        assert_eq!(
            local(LocalState::Downloading).download("m1", -3.0).resolve(),
            StatusDisplay::Downloading { percent: 0 }
        );
        assert_eq!(
            local(LocalState::Downloading).download("m1", 42.4).resolve().to_string(),
            "Downloading 42%"
        );
    }

    #[test]
    fn test_multiple_downloads_report_count() {
        let display = local(LocalState::Downloading)
            .download("a", 10.0)
            .download("b", 90.0)
            .resolve();
        assert_eq!(display, StatusDisplay::DownloadingMany { count: 2 });
    }

    #[test]
    fn test_download_wins_over_cloud() {
        let display = Fixture::new(TranscriptionState::cloud("Groq").unwrap())
            .download("base.en", 10.0)
            .resolve();
        assert_eq!(display, StatusDisplay::Downloading { percent: 10 });
    }

    #[test]
    fn test_cloud_uses_provider_name() {
        let display = Fixture::new(TranscriptionState::cloud("OpenAI").unwrap())
            .current("base.en")
            .resolve();
        assert_eq!(display.to_string(), "OpenAI (Cloud)");
    }

    #[test]
    fn test_ready_and_unloaded_show_model_name() {
        for state in [LocalState::Ready, LocalState::Unloaded] {
            let display = local(state).current("base.en").resolve();
            assert_eq!(display.to_string(), "Base (English)");
        }
        assert_eq!(local(LocalState::Ready).resolve(), StatusDisplay::NoModelSelected);
    }

    #[test]
    fn test_unknown_current_model_falls_back_to_id() {
        let display = local(LocalState::Ready).current("custom-model").resolve();
        assert_eq!(display.to_string(), "custom-model");
    }

    #[test]
    fn test_loading_and_extracting_name_the_model() {
        assert_eq!(
            local(LocalState::Loading).current("base.en").resolve().to_string(),
            "Loading Base (English)..."
        );
        assert_eq!(
            local(LocalState::Extracting).current("base.en").resolve().to_string(),
            "Preparing Base (English)..."
        );
        assert_eq!(local(LocalState::Loading).resolve().to_string(), "Loading model...");
    }

    #[test]
    fn test_error_display() {
        assert_eq!(
            local(LocalState::Error("out of memory".to_string())).resolve().to_string(),
            "Error: out of memory"
        );
        assert_eq!(
            local(LocalState::Error(String::new())).resolve(),
            StatusDisplay::GenericError
        );
    }

    #[test]
    fn test_none_and_degenerate_downloading() {
        assert_eq!(local(LocalState::NoModel).resolve(), StatusDisplay::NoModelNeeded);
        assert_eq!(
            local(LocalState::Downloading).resolve(),
            StatusDisplay::DownloadingGeneric
        );
    }
}
