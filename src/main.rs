//! hrt-safety - command-line front end for the safety assessment engine.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use hrt_safety::config::{self, EngineSettings};
use hrt_safety::models::{RiskDomain, Snapshot, TransitionMode};
use hrt_safety::safety::{DefaultSafetyEngine, KnowledgeBase, SafetyAssessor};

#[derive(Parser)]
#[command(name = "hrt-safety")]
#[command(about = "Deterministic HRT safety risk scoring", long_about = None)]
#[command(version = config::APP_VERSION)]
struct Cli {
    /// Knowledge base directory (overrides $HRT_SAFETY_KB_DIR; bundled tables otherwise)
    #[arg(long, global = true)]
    knowledge_base: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score a snapshot and print the report as JSON
    Assess {
        /// Snapshot JSON file (`null` yields the empty report)
        #[arg(long)]
        snapshot: PathBuf,

        /// History JSON file: array of prior snapshots, oldest first
        #[arg(long)]
        history: Option<PathBuf>,

        /// Output language (overrides $HRT_SAFETY_LANG)
        #[arg(long)]
        lang: Option<String>,

        /// Transition mode: mtf or ftm (overrides $HRT_SAFETY_MODE)
        #[arg(long)]
        mode: Option<TransitionMode>,

        /// Pretty-print the report
        #[arg(long)]
        pretty: bool,
    },

    /// Validate the knowledge base and print a summary
    CheckKnowledgeBase,
}

fn main() -> Result<()> {
    hrt_safety::init_tracing();
    let cli = Cli::parse();

    let kb_dir = cli.knowledge_base.or_else(config::knowledge_base_dir);
    let knowledge = load_knowledge_base(kb_dir.as_deref())?;

    match cli.command {
        Commands::Assess {
            snapshot,
            history,
            lang,
            mode,
            pretty,
        } => {
            let env = EngineSettings::from_env().context("Invalid engine settings in environment")?;
            let settings = EngineSettings::new(
                lang.as_deref().unwrap_or(&env.language),
                mode.unwrap_or(env.mode),
            );
            assess(knowledge, settings, &snapshot, history.as_deref(), pretty)
        }
        Commands::CheckKnowledgeBase => {
            check_knowledge_base(&knowledge);
            Ok(())
        }
    }
}

fn load_knowledge_base(dir: Option<&Path>) -> Result<KnowledgeBase> {
    match dir {
        Some(dir) => KnowledgeBase::load(dir)
            .with_context(|| format!("Failed to load knowledge base from {}", dir.display())),
        None => KnowledgeBase::bundled().context("Bundled knowledge base is invalid"),
    }
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("Failed to parse {}", path.display()))
}

fn assess(
    knowledge: KnowledgeBase,
    settings: EngineSettings,
    snapshot_path: &Path,
    history_path: Option<&Path>,
    pretty: bool,
) -> Result<()> {
    let snapshot: Option<Snapshot> = read_json(snapshot_path)?;
    let history: Vec<Snapshot> = match history_path {
        Some(path) => read_json(path)?,
        None => Vec::new(),
    };

    let engine = DefaultSafetyEngine::new(Arc::new(knowledge), settings);
    let report = engine.run_safety_assessment(snapshot.as_ref(), &history);

    let json = if pretty {
        serde_json::to_string_pretty(&report)?
    } else {
        serde_json::to_string(&report)?
    };
    println!("{json}");
    Ok(())
}

fn check_knowledge_base(kb: &KnowledgeBase) {
    println!("Knowledge base {} (default locale {})", kb.manifest.version, kb.default_locale());
    println!("  medications with rules: {}", kb.drug_rules.len());
    println!("  symptoms with weights:  {}", kb.symptom_risks.len());
    println!("  education rules:        {}", kb.education.len());
    for domain in RiskDomain::ALL {
        let (warning, critical) = kb
            .threshold(*domain)
            .map(|t| (t.warning, t.critical))
            .unwrap_or_default();
        println!(
            "  {:<15} warning {:>5} critical {:>5} tests {}",
            domain.as_str(),
            warning,
            critical,
            kb.test_catalog(*domain).len()
        );
    }
    println!("OK");
}
