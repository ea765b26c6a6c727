use anyhow::Context;
use clap::{Parser, Subcommand};
use pheno_core::{
    ConsentConfigurationSource, CoreConfig, FieldSelection, PatientConsentManager,
    PatientSerializer, PatientWritePolicy, StaticConsentSource, YamlConsentSource,
};
use pheno_store::{RecordId, RecordStore};
use pheno_vocabulary::VocabularyManager;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "pheno")]
#[command(about = "Phenotype patient record CLI")]
struct Cli {
    /// Patient data directory (overrides PHENO_DATA_DIR)
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,
    /// Vocabulary YAML file (overrides PHENO_VOCABULARY_FILE)
    #[arg(long, global = true)]
    vocabulary: Option<PathBuf>,
    /// Consent configuration YAML file (overrides PHENO_CONSENT_FILE)
    #[arg(long, global = true)]
    consents: Option<PathBuf>,
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create an empty patient record
    Create {
        /// Patient JSON to apply to the new record (optional)
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// List all patient records
    List,
    /// Print a patient record as JSON
    Export {
        /// Record id
        id: String,
        /// Facets, JSON keys or fields to include (comma-separated)
        #[arg(long)]
        fields: Option<String>,
    },
    /// Apply a patient JSON file to a record
    Import {
        /// Record id
        id: String,
        /// Patient JSON file
        file: PathBuf,
        /// Write policy: update, merge or replace
        #[arg(long, default_value = "update")]
        policy: PatientWritePolicy,
    },
    /// Delete a patient record
    Delete {
        /// Record id
        id: String,
    },
    /// List the system consents and the patient's answers
    Consents {
        /// Record id
        id: String,
    },
    /// Grant a consent
    Grant {
        /// Record id
        id: String,
        /// Consent id
        consent: String,
    },
    /// Revoke a consent
    Revoke {
        /// Record id
        id: String,
        /// Consent id
        consent: String,
    },
}

/// Services shared by every command, built once from the resolved configuration.
struct App {
    store: RecordStore,
    consents: Arc<PatientConsentManager>,
    serializer: PatientSerializer,
}

impl App {
    fn new(config: &CoreConfig) -> anyhow::Result<Self> {
        let vocabulary = match config.vocabulary_file() {
            Some(path) => VocabularyManager::from_yaml_file(path)
                .with_context(|| format!("loading vocabularies from {}", path.display()))?,
            None => VocabularyManager::new(),
        };
        let source: Box<dyn ConsentConfigurationSource> = match config.consent_file() {
            Some(path) => Box::new(YamlConsentSource::new(path)),
            None => Box::new(StaticConsentSource::default()),
        };
        let consents = Arc::new(PatientConsentManager::from_source(source));
        let serializer = PatientSerializer::new(Arc::new(vocabulary), Arc::clone(&consents));

        Ok(Self {
            store: RecordStore::new(config.patient_data_dir()),
            consents,
            serializer,
        })
    }
}

fn parse_id(id: &str) -> anyhow::Result<RecordId> {
    RecordId::parse(id).with_context(|| format!("invalid record id '{id}'"))
}

fn read_json(path: &Path) -> anyhow::Result<serde_json::Value> {
    let contents = std::fs::read_to_string(path)
        .with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&contents).with_context(|| format!("parsing {}", path.display()))
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("pheno=info".parse()?),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let Some(command) = cli.command else {
        println!("Use 'pheno --help' for commands");
        return Ok(());
    };

    let env = |name: &str| std::env::var(name).ok();
    let config = CoreConfig::from_env_values(
        cli.data_dir
            .map(|p| p.display().to_string())
            .or_else(|| env("PHENO_DATA_DIR")),
        cli.vocabulary
            .map(|p| p.display().to_string())
            .or_else(|| env("PHENO_VOCABULARY_FILE")),
        cli.consents
            .map(|p| p.display().to_string())
            .or_else(|| env("PHENO_CONSENT_FILE")),
    )?;
    let app = App::new(&config)?;

    match command {
        Commands::Create { from } => {
            let mut record = app.store.create()?;
            if let Some(path) = from {
                let json = read_json(&path)?;
                app.serializer
                    .update_from_json(&mut record, &json, PatientWritePolicy::Update)?;
                app.store.save(&mut record)?;
            }
            tracing::info!("created record {}", record.id());
            println!("{}", record.id());
        }
        Commands::List => {
            let ids = app.store.list();
            if ids.is_empty() {
                println!("No patients found.");
            }
            for id in ids {
                println!("{id}");
            }
        }
        Commands::Export { id, fields } => {
            let record = app.store.load(&parse_id(&id)?)?;
            let selection = fields.as_deref().map(FieldSelection::parse);
            let json = app.serializer.to_json(&record, selection.as_ref());
            println!("{}", serde_json::to_string_pretty(&json)?);
        }
        Commands::Import { id, file, policy } => {
            let mut record = app.store.load(&parse_id(&id)?)?;
            let json = read_json(&file)?;
            app.serializer.update_from_json(&mut record, &json, policy)?;
            app.store.save(&mut record)?;
            tracing::info!("updated record {} ({})", record.id(), policy);
        }
        Commands::Delete { id } => {
            app.store.delete(&parse_id(&id)?)?;
            tracing::info!("deleted record {id}");
        }
        Commands::Consents { id } => {
            let record = app.store.load(&parse_id(&id)?)?;
            for consent in app.consents.patient_consents(&record)? {
                let required = if consent.definition.required { " (required)" } else { "" };
                println!(
                    "{}: {}{} - {}",
                    consent.id(),
                    consent.status,
                    required,
                    consent.definition.label
                );
            }
        }
        Commands::Grant { id, consent } => {
            let mut record = app.store.load(&parse_id(&id)?)?;
            if !app.consents.grant_consent(&mut record, &consent)? {
                anyhow::bail!("unknown consent '{consent}'");
            }
            app.store.save(&mut record)?;
        }
        Commands::Revoke { id, consent } => {
            let mut record = app.store.load(&parse_id(&id)?)?;
            if !app.consents.revoke_consent(&mut record, &consent)? {
                anyhow::bail!("unknown consent '{consent}'");
            }
            app.store.save(&mut record)?;
        }
    }

    Ok(())
}
