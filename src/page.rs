// src/page.rs
use std::time::Duration;

use chrono::{DateTime, Local};
use tracing::{debug, error, info, instrument};

use crate::data_types::Table;
use crate::secrets::SecretStore;
use crate::sheet_client::{SheetClient, SheetError};

pub const PAGE_TITLE: &str = "Calgary Lab Manager";
pub const REFERENCE_WORKSHEET: &str = "Reference";
pub const FRESH: Duration = Duration::ZERO;

pub const MISSING_SECRETS_TEXT: &str = "Secrets configuration is missing";
pub const READY_TEXT: &str = "Connection succeeded; sheet data loaded.";
pub const FETCH_FAILED_TEXT: &str = "Security-key (Secrets) format error";
pub const PRIVATE_KEY_HINT: &str = "Collapse the private_key value to a single line and write \\n \
     at every place the original key had a line break.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layout {
    Centered,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PageConfig {
    pub title: &'static str,
    pub layout: Layout,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            title: PAGE_TITLE,
            layout: Layout::Centered,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerKind {
    Success,
    Error,
    Info,
    Exception,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Banner {
    pub kind: BannerKind,
    pub text: String,
}

impl Banner {
    fn new(kind: BannerKind, text: impl Into<String>) -> Self {
        Banner {
            kind,
            text: text.into(),
        }
    }

    /// Success and error banners are top-level; info and exception panels accompany them.
    pub fn is_top_level(&self) -> bool {
        matches!(self.kind, BannerKind::Success | BannerKind::Error)
    }
}

/// Terminal state of one render.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Ready { default: Table, reference: Table },
    MissingSecrets,
    FetchFailed(SheetError),
}

impl Outcome {
    pub fn banners(&self) -> Vec<Banner> {
        match self {
            Outcome::Ready { .. } => vec![Banner::new(BannerKind::Success, READY_TEXT)],
            Outcome::MissingSecrets => vec![Banner::new(BannerKind::Error, MISSING_SECRETS_TEXT)],
            Outcome::FetchFailed(err) => vec![
                Banner::new(BannerKind::Error, FETCH_FAILED_TEXT),
                Banner::new(BannerKind::Info, PRIVATE_KEY_HINT),
                Banner::new(BannerKind::Exception, trace(err)),
            ],
        }
    }
}

fn trace(err: &SheetError) -> String {
    format!("{}: {}\n\n{:?}", err.kind(), err.diagnostic(), err)
}

#[derive(Debug, Clone)]
pub struct Page {
    pub config: PageConfig,
    pub outcome: Outcome,
    pub rendered_at: DateTime<Local>,
}

impl Page {
    pub fn banners(&self) -> Vec<Banner> {
        self.outcome.banners()
    }
}

/// Runs one page render: check secrets, then fetch the default and reference worksheets.
#[instrument(skip_all)]
pub async fn render<C: SheetClient>(secrets: &SecretStore, client: &C) -> Page {
    let config = PageConfig::default();

    debug!("checking secrets");
    let outcome = if !secrets.has_gsheets_secrets() {
        error!("no [connections.gsheets] section in secrets");
        Outcome::MissingSecrets
    } else {
        debug!("fetching worksheets");
        match fetch(client).await {
            Ok((default, reference)) => {
                info!(
                    default_rows = default.len(),
                    reference_rows = reference.len(),
                    "sheet data loaded"
                );
                Outcome::Ready { default, reference }
            }
            Err(err) => {
                error!(kind = err.kind(), diagnostic = err.diagnostic(), "fetch failed");
                Outcome::FetchFailed(err)
            }
        }
    };

    Page {
        config,
        outcome,
        rendered_at: Local::now(),
    }
}

async fn fetch<C: SheetClient>(client: &C) -> Result<(Table, Table), SheetError> {
    let conn = client.open().await?;
    let default = client.read(&conn, None, FRESH).await?;
    let reference = client.read(&conn, Some(REFERENCE_WORKSHEET), FRESH).await?;
    Ok((default, reference))
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use serde_json::json;
    use std::collections::VecDeque;
    use std::sync::Mutex;

    #[derive(Debug, Clone, PartialEq)]
    enum Call {
        Open,
        Read {
            worksheet: Option<String>,
            ttl: Duration,
        },
    }

    /// Replays scripted results and records every call it receives.
    #[derive(Default)]
    struct ScriptedClient {
        open_error: Option<SheetError>,
        reads: Mutex<VecDeque<Result<Table, SheetError>>>,
        calls: Mutex<Vec<Call>>,
    }

    impl ScriptedClient {
        fn with_reads(reads: Vec<Result<Table, SheetError>>) -> Self {
            ScriptedClient {
                reads: Mutex::new(reads.into()),
                ..Default::default()
            }
        }

        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl SheetClient for ScriptedClient {
        type Connection = ();

        async fn open(&self) -> Result<(), SheetError> {
            self.calls.lock().unwrap().push(Call::Open);
            match &self.open_error {
                Some(err) => Err(err.clone()),
                None => Ok(()),
            }
        }

        async fn read(
            &self,
            _conn: &(),
            worksheet: Option<&str>,
            ttl: Duration,
        ) -> Result<Table, SheetError> {
            self.calls.lock().unwrap().push(Call::Read {
                worksheet: worksheet.map(str::to_string),
                ttl,
            });
            self.reads
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(SheetError::FetchFailure("unscripted read".to_string())))
        }
    }

    fn present_secrets() -> SecretStore {
        SecretStore::from_toml("[connections.gsheets]\nspreadsheet = \"abc123\"\n").unwrap()
    }

    fn default_table() -> Table {
        Table::from_grid(vec![
            vec![json!("id"), json!("name")],
            vec![json!(1), json!("A")],
        ])
    }

    fn reference_table() -> Table {
        Table::from_grid(vec![vec![json!("k")], vec![json!("v")]])
    }

    fn top_level(page: &Page) -> Vec<Banner> {
        page.banners().into_iter().filter(Banner::is_top_level).collect()
    }

    #[tokio::test]
    async fn test_missing_secrets_makes_no_client_calls() {
        let client = ScriptedClient::default();
        let page = render(&SecretStore::empty(), &client).await;

        assert_eq!(page.outcome, Outcome::MissingSecrets);
        assert_eq!(
            page.banners(),
            vec![Banner::new(BannerKind::Error, MISSING_SECRETS_TEXT)]
        );
        assert!(client.calls().is_empty());
    }

    #[tokio::test]
    async fn test_both_reads_ok_is_ready() {
        let client = ScriptedClient::with_reads(vec![Ok(default_table()), Ok(reference_table())]);
        let page = render(&present_secrets(), &client).await;

        match &page.outcome {
            Outcome::Ready { default, reference } => {
                assert_eq!(default.get(0, "id"), Some(&json!(1)));
                assert_eq!(default.get(0, "name"), Some(&json!("A")));
                assert_eq!(reference.get(0, "k"), Some(&json!("v")));
            }
            other => panic!("expected Ready, got {other:?}"),
        }
        assert_eq!(
            page.banners(),
            vec![Banner::new(BannerKind::Success, READY_TEXT)]
        );
    }

    #[tokio::test]
    async fn test_reads_default_then_reference_fresh() {
        let client = ScriptedClient::with_reads(vec![Ok(default_table()), Ok(reference_table())]);
        render(&present_secrets(), &client).await;

        assert_eq!(
            client.calls(),
            vec![
                Call::Open,
                Call::Read {
                    worksheet: None,
                    ttl: Duration::ZERO,
                },
                Call::Read {
                    worksheet: Some(REFERENCE_WORKSHEET.to_string()),
                    ttl: Duration::ZERO,
                },
            ]
        );
    }

    #[tokio::test]
    async fn test_open_failure_shows_hint_and_trace() {
        let client = ScriptedClient {
            open_error: Some(SheetError::CredentialMalformed("bad PEM".to_string())),
            ..Default::default()
        };
        let page = render(&present_secrets(), &client).await;

        assert!(matches!(page.outcome, Outcome::FetchFailed(_)));
        let banners = page.banners();
        assert_eq!(banners[0], Banner::new(BannerKind::Error, FETCH_FAILED_TEXT));
        assert_eq!(banners[1], Banner::new(BannerKind::Info, PRIVATE_KEY_HINT));
        assert_eq!(banners[2].kind, BannerKind::Exception);
        assert!(banners[2].text.contains("bad PEM"));
        assert_eq!(client.calls(), vec![Call::Open]);
    }

    #[tokio::test]
    async fn test_reference_failure_hides_success() {
        let client = ScriptedClient::with_reads(vec![
            Ok(default_table()),
            Err(SheetError::FetchFailure("404".to_string())),
        ]);
        let page = render(&present_secrets(), &client).await;

        assert_eq!(
            page.outcome,
            Outcome::FetchFailed(SheetError::FetchFailure("404".to_string()))
        );
        let banners = page.banners();
        assert!(banners.iter().all(|b| b.kind != BannerKind::Success));
        assert!(banners
            .iter()
            .any(|b| b.kind == BannerKind::Exception && b.text.contains("404")));
        assert_eq!(client.calls().len(), 3);
    }

    #[tokio::test]
    async fn test_default_failure_skips_reference_read() {
        let client =
            ScriptedClient::with_reads(vec![Err(SheetError::FetchFailure("quota".to_string()))]);
        let page = render(&present_secrets(), &client).await;

        assert!(matches!(page.outcome, Outcome::FetchFailed(_)));
        assert_eq!(client.calls().len(), 2);
    }

    #[tokio::test]
    async fn test_every_outcome_has_one_top_level_banner() {
        let outcomes = [
            render(&SecretStore::empty(), &ScriptedClient::default()).await,
            render(
                &present_secrets(),
                &ScriptedClient::with_reads(vec![Ok(default_table()), Ok(reference_table())]),
            )
            .await,
            render(&present_secrets(), &ScriptedClient::default()).await,
        ];

        for page in &outcomes {
            assert_eq!(top_level(page).len(), 1, "{:?}", page.outcome);
            assert_eq!(page.config.title, PAGE_TITLE);
            assert_eq!(page.config.layout, Layout::Centered);
        }
    }
}
