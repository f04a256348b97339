use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use pulmo_config::{EnvConfig, ExecutionEnv};
use pulmo_promotion::{ConsolePrompt, PromoteDecision};
use pulmo_registry::{HttpRegistry, PublishOutcome};
use pulmo_store::FsStore;
use pulmo_trainer::pipeline;

#[derive(Parser)]
#[command(name = "pulmo-trainer")]
#[command(about = "Pneumonia classifier training pipeline", long_about = None)]
struct Cli {
    #[command(subcommand)]
    cmd: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train a classifier from the datasource bucket and store the artifact
    Train {
        /// Model config YAML
        #[arg(long, default_value = "config.yaml")]
        config: String,

        /// Register the fresh artifact with the registry in the same run
        #[arg(long, default_value_t = false)]
        register: bool,
    },

    /// Register a stored artifact (latest timestamped key by default)
    Register {
        /// Model config YAML
        #[arg(long, default_value = "config.yaml")]
        config: String,

        /// Explicit artifact key; omit to select the latest one
        #[arg(long)]
        key: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env.local if present (dev convenience). Silent if the file does
    // not exist — production injects env vars directly.
    let _ = dotenvy::from_filename(".env.local");

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()),
        )
        .init();

    let cli = Cli::parse();
    let env = EnvConfig::from_env().context("invalid runtime environment")?;

    let store = FsStore::new(&env.store_root);
    if env.execution_env == ExecutionEnv::Local {
        // Local runs own the models bucket; cloud buckets are provisioned
        // out of band and only waited for.
        store.create_bucket(&env.models_bucket)?;
    }
    let registry = HttpRegistry::new(env.registry_url.clone());
    let prompt = ConsolePrompt;

    match cli.cmd {
        Commands::Train { config, register } => {
            let out =
                pipeline::run_train(&store, &registry, &env, &config, register, &prompt).await?;
            println!("artifact_key={}", out.artifact_key);
            print_summary(&out.summary);
            if let Some(reg) = out.registered {
                print_register(&reg);
            }
        }

        Commands::Register { config, key } => {
            let out =
                pipeline::run_register(&store, &registry, &env, &config, key.as_deref(), &prompt)
                    .await?;
            println!("artifact_key={}", out.artifact_key);
            print_summary(&out.summary);
            print_register(&out);
        }
    }

    Ok(())
}

fn print_summary(summary: &pulmo_model::TrainSummary) {
    println!("accuracy={:.4}", summary.evaluation.accuracy);
    println!("train_size={}", summary.train_size);
    println!("test_size={}", summary.test_size);
    println!("training_secs={:.3}", summary.training_secs);
}

fn print_register(out: &pipeline::RegisterOutcome) {
    let decision = match out.decision {
        PromoteDecision::PromoteToServing => "promote-to-serving",
        PromoteDecision::ExperimentOnly => "experiment-only",
    };
    println!("decision={decision}");
    match out.publish {
        PublishOutcome::Promoted { version } => println!("promoted_version={version}"),
        PublishOutcome::NoVersions => println!("promoted_version=none"),
        PublishOutcome::ExperimentOnly => println!("registered_as=experiment"),
    }
}
