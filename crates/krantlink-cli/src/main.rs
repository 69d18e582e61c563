//! Link the mentions of one article from the command line.

use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use krantlink_core::linker::LinkerOptions;
use krantlink_core::{EntityLinker, LinkerSettings, Remotes};
use krantlink_lexicon::SchemaCompat;
use krantlink_model::Model;

/// Entity linker for historical newspaper articles
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Link the mentions of an article to knowledge-base descriptions
    Link {
        /// Resolver URL of the article
        url: String,

        /// Link only this mention (exact surface form)
        mention: Option<String>,

        /// Path to the model weight file (overrides MODEL_PATH)
        #[arg(long)]
        model: Option<PathBuf>,

        /// Include the feature snapshot in each record
        #[arg(long)]
        features: bool,

        /// Include the full candidate listing in each record
        #[arg(long)]
        candidates: bool,

        /// Propagate errors instead of returning an error response
        #[arg(long)]
        debug: bool,

        /// Read ambiguous KB type names as two separate entries
        #[arg(long)]
        split_type_names: bool,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    match cli.command {
        Command::Link {
            url,
            mention,
            model,
            features,
            candidates,
            debug,
            split_type_names,
        } => {
            let mut settings = LinkerSettings::load();
            if let Some(path) = model {
                settings.model_path = Some(path);
            }
            let model_path = settings.model_path.clone().ok_or_else(|| {
                anyhow::anyhow!("no model configured; pass --model or set MODEL_PATH")
            })?;
            let model: Arc<dyn Model> = Arc::from(krantlink_model::load_model(&model_path)?);

            let options = LinkerOptions {
                debug,
                include_features: features,
                include_candidates: candidates,
                compat: if split_type_names {
                    SchemaCompat::Split
                } else {
                    SchemaCompat::Fused
                },
            };
            let linker = EntityLinker::new(
                Remotes::from_settings(&settings),
                model,
                &settings,
                options,
            );

            let response = linker.link(&url, mention.as_deref()).await?;
            println!("{}", serde_json::to_string_pretty(&response)?);
            if !response.is_ok() {
                std::process::exit(1);
            }
            Ok(())
        }
    }
}
