use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand, ValueEnum};
use serde::Serialize;
use sherpath::analysis::{read_completeness, AnalyzerOptions, CompletenessBadge, RealtimeAnalyzer};
use sherpath::backend::{HttpBackend, SearchParams, SimilarCasesQuery, SortOrder};
use sherpath::config::Config;
use sherpath::documents::read_upload;
use sherpath::draft;
use sherpath::storage::{FileStore, KeyValueStore};
use sherpath::teams::{TeamsClient, TeamsSendRequest};
use std::io::Read;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Parser)]
#[command(name = "sherpath")]
#[command(about = "Consultation intake: realtime completeness checks, submission and Teams hand-off")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (defaults to the platform config dir)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a consultation text, optionally with .docx/.xlsx attachments
    Analyze(AnalyzeArgs),
    /// Submit a consultation for full analysis
    Submit(TextArgs),
    /// Show the last completeness level and submission handed off by `analyze`/`submit`
    Status {
        /// Re-fetch the last submission from the backend
        #[arg(long)]
        refresh: bool,
    },
    /// Similar past consultations
    Similar {
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        limit: Option<u32>,
    },
    /// Search past consultations
    Search(SearchArgs),
    /// Industry category and alcohol type lookups
    Categories,
    /// Compare traditional and hybrid retrieval for a query
    CompareRag {
        query: String,
    },
    /// Microsoft Teams hand-off
    Teams {
        #[command(subcommand)]
        command: TeamsCommands,
    },
    /// Print the effective configuration (secrets redacted)
    Config,
}

#[derive(Args)]
struct TextArgs {
    /// Consultation text; read from stdin when omitted
    text: Option<String>,
}

#[derive(Args)]
struct AnalyzeArgs {
    #[command(flatten)]
    text: TextArgs,

    /// Attachment to extract text from (repeatable)
    #[arg(short, long = "file")]
    files: Vec<PathBuf>,
}

#[derive(Args)]
struct SearchArgs {
    query: Option<String>,
    #[arg(long = "industry", value_delimiter = ',')]
    industry_categories: Vec<String>,
    #[arg(long = "alcohol", value_delimiter = ',')]
    alcohol_types: Vec<String>,
    #[arg(long, value_enum, default_value_t = Sort::Newest)]
    sort: Sort,
    #[arg(long, default_value_t = 50)]
    limit: u32,
    #[arg(long, default_value_t = 0)]
    offset: u32,
}

#[derive(Clone, Copy, ValueEnum)]
enum Sort {
    Newest,
    Oldest,
}

impl From<Sort> for SortOrder {
    fn from(sort: Sort) -> Self {
        match sort {
            Sort::Newest => SortOrder::Newest,
            Sort::Oldest => SortOrder::Oldest,
        }
    }
}

#[derive(Subcommand)]
enum TeamsCommands {
    /// Exchange the refresh token for an access token
    Token,
    /// Post a consultation summary to the advisor channel
    Send {
        #[arg(long)]
        message: String,
        #[arg(long)]
        consultant_name: String,
        #[arg(long)]
        consultant_department: String,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        mention: Option<String>,
    },
}

#[derive(Serialize)]
struct AnalyzeReport {
    badge: CompletenessBadge,
    suggestions: Vec<String>,
    confidence: Option<f64>,
    attachments: Vec<sherpath::documents::UploadOutcome>,
}

fn init_logging(verbose: bool) {
    let default = if verbose { "sherpath=debug" } else { "sherpath=info" };
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn read_text(args: TextArgs) -> Result<String> {
    match args.text {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("Failed to read consultation text from stdin")?;
            Ok(buf)
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let config = Config::load(cli.config.as_deref())?;
    let store: Arc<dyn KeyValueStore> = Arc::new(
        FileStore::open(&config.storage.path)
            .with_context(|| format!("Failed to open state store {}", config.storage.path))?,
    );
    let backend = HttpBackend::from_config(&config.api)?.with_token_store(store.clone());

    match cli.command {
        Commands::Analyze(args) => {
            let text = read_text(args.text)?;
            let analyzer = RealtimeAnalyzer::new(
                Arc::new(backend),
                store.clone(),
                AnalyzerOptions::from(&config.analysis),
            );
            analyzer.on_input(&text);
            analyzer.cancel_pending();

            let mut attachments = Vec::new();
            if !args.files.is_empty() {
                let mut uploads = Vec::with_capacity(args.files.len());
                for path in &args.files {
                    uploads.push(read_upload(path).await?);
                }
                attachments.push(analyzer.upload_files(uploads).await);
            }
            let snapshot = analyzer.snapshot();
            let result = analyzer
                .analyze_now(&snapshot.input_text, &snapshot.doc_text)
                .await;
            print_json(&AnalyzeReport {
                badge: CompletenessBadge::for_level(result.completeness),
                suggestions: result.suggestions,
                confidence: result.confidence,
                attachments,
            })?;
        }
        Commands::Submit(args) => {
            let text = read_text(args)?;
            let level = read_completeness(store.as_ref()).map(|(level, _)| level);
            let submission = backend.submit_and_record(store.as_ref(), &text, level).await?;
            print_json(&submission.payload)?;
        }
        Commands::Status { refresh } => {
            let completeness = read_completeness(store.as_ref()).map(|(level, color)| {
                serde_json::json!({
                    "level": level,
                    "color": color,
                    "label": sherpath::analysis::level_label(level.into()),
                })
            });
            let submission = if refresh {
                backend.refresh_last_submission(store.as_ref()).await?
            } else {
                draft::last_submission(store.as_ref()).map(|(_, data)| data)
            };
            print_json(&serde_json::json!({
                "completeness": completeness,
                "draft": draft::load_draft(store.as_ref()),
                "submission": submission,
            }))?;
        }
        Commands::Similar {
            category,
            title,
            limit,
        } => {
            let response = backend
                .similar_cases(&SimilarCasesQuery {
                    industry_category_id: category,
                    summary_title: title,
                    limit,
                })
                .await?;
            print_json(&response)?;
        }
        Commands::Search(args) => {
            let params = SearchParams {
                query: args.query.unwrap_or_default(),
                industry_categories: args.industry_categories,
                alcohol_types: args.alcohol_types,
                sort_order: args.sort.into(),
                limit: args.limit,
                offset: args.offset,
            };
            print_json(&backend.search(&params).await?)?;
        }
        Commands::Categories => {
            print_json(&backend.category_mappings().await)?;
        }
        Commands::CompareRag { query } => {
            print_json(&backend.compare_rag(&query).await?)?;
        }
        Commands::Teams { command } => {
            let client = TeamsClient::new(
                config.teams.clone(),
                Duration::from_secs(config.api.timeout_secs),
            )?;
            match command {
                TeamsCommands::Token => {
                    let token = client.refresh_token().await?;
                    print_json(&serde_json::json!({ "expires_in": token.expires_in }))?;
                }
                TeamsCommands::Send {
                    message,
                    consultant_name,
                    consultant_department,
                    channel,
                    mention,
                } => {
                    let request = TeamsSendRequest {
                        message,
                        consultant_name,
                        consultant_department,
                        channel_id: channel,
                        mention_user_id: mention,
                    };
                    match client.send(&request).await {
                        Ok(receipt) => print_json(&receipt)?,
                        Err(e) => {
                            print_json(&serde_json::json!({
                                "success": false,
                                "error": e.kind(),
                                "message": e.to_string(),
                            }))?;
                            std::process::exit(1);
                        }
                    }
                }
            }
        }
        Commands::Config => {
            print_json(&serde_json::json!({
                "api": config.api,
                "analysis": config.analysis,
                "storage": config.storage,
                "teams": config.teams.report(),
            }))?;
        }
    }
    Ok(())
}
