mod config;

use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, Subcommand};
use firdesk_ai::{
    FaqMatcher, IncidentClassifier, KeywordRules, OnnxEmbedder, OnnxZeroShot, Triage,
};
use firdesk_core::Corpus;
use firdesk_server::AppState;
use tracing_subscriber::EnvFilter;

use crate::config::{ClassifierArgs, MatcherArgs};

#[derive(Parser)]
#[command(name = "firdesk", version, about = "FIR help-desk chatbot and incident classifier")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Load models and corpus, then serve the HTTP API.
    Serve {
        #[arg(long, env = "FIRDESK_BIND", default_value = "0.0.0.0:8000")]
        bind: std::net::SocketAddr,
        #[command(flatten)]
        matcher: MatcherArgs,
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Answer a single chat message from the FAQ corpus.
    Ask {
        message: String,
        /// Also print the matched question and similarity score.
        #[arg(long)]
        explain: bool,
        #[command(flatten)]
        matcher: MatcherArgs,
    },
    /// Classify an incident description by crime type and lethality.
    Classify {
        description: String,
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Keyword rules first, zero-shot crime classification as fallback.
    Triage {
        description: String,
        #[command(flatten)]
        classifier: ClassifierArgs,
    },
    /// Validate the FAQ corpus without loading any model.
    CheckCorpus {
        #[arg(long, env = "FIRDESK_CORPUS", default_value = "answers.json")]
        corpus: std::path::PathBuf,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
    tracing::info!("firdesk v{}", env!("CARGO_PKG_VERSION"));

    match Cli::parse().command {
        Command::Serve {
            bind,
            matcher,
            classifier,
        } => {
            // Build everything before binding so a broken corpus or model never serves.
            let faq = build_matcher(&matcher)?;
            let incidents = Arc::new(build_incidents(&classifier)?);
            let triage = Triage::new(KeywordRules::default(), incidents.clone());
            let state = Arc::new(AppState::new(faq, incidents, triage));
            firdesk_server::serve(state, bind).await?;
        }
        Command::Ask {
            message,
            explain,
            matcher,
        } => {
            let faq = build_matcher(&matcher)?;
            let reply = faq.reply(&message)?;
            if explain {
                match &reply.matched {
                    Some(m) => eprintln!(
                        "  matched #{} {:?} (score {:.4})",
                        m.index, m.question, m.score
                    ),
                    None => eprintln!("  no match above threshold {}", faq.settings().threshold),
                }
            }
            println!("{}", reply.text);
        }
        Command::Classify {
            description,
            classifier,
        } => {
            let report = build_incidents(&classifier)?.classify(&description)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Command::Triage {
            description,
            classifier,
        } => {
            let incidents = Arc::new(build_incidents(&classifier)?);
            let outcome = Triage::new(KeywordRules::default(), incidents).run(&description)?;
            println!("{}", serde_json::to_string_pretty(&outcome)?);
        }
        Command::CheckCorpus { corpus } => {
            let stats = Corpus::load(&corpus)
                .with_context(|| format!("loading corpus {}", corpus.display()))?
                .stats();
            println!(
                "{}: {} entries, {} question variants",
                corpus.display(),
                stats.entries,
                stats.questions
            );
        }
    }

    Ok(())
}

fn build_matcher(args: &MatcherArgs) -> anyhow::Result<FaqMatcher> {
    let settings = args.settings();
    settings.validate()?;

    let corpus = Corpus::load(&args.corpus)
        .with_context(|| format!("loading corpus {}", args.corpus.display()))?;
    let embedder = OnnxEmbedder::load(&args.embed_model)
        .with_context(|| format!("loading embedding model {}", args.embed_model.display()))?;

    FaqMatcher::build(&corpus, Arc::new(embedder), settings)
}

fn build_incidents(args: &ClassifierArgs) -> anyhow::Result<IncidentClassifier> {
    let (crime, lethality) = args.label_sets()?;
    let model = OnnxZeroShot::load(&args.nli_model, &args.hypothesis_template)
        .with_context(|| format!("loading zero-shot model {}", args.nli_model.display()))?;

    Ok(IncidentClassifier::new(Arc::new(model), crime, lethality))
}
