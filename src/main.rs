use anyhow::Context;
use clap::Parser;
use gym_enrollment::config::{Command, NotifierKind};
use gym_enrollment::domain::ports::Notifier;
use gym_enrollment::utils::{logger, validation::Validate};
use gym_enrollment::{
    AppConfig, CliArgs, DocumentRepository, EnrollmentError, EnrollmentService, LocalStorage,
    LogNotifier, OutboxNotifier, QueuedNotifier, SystemClock,
};
use std::sync::Arc;

type Repository = DocumentRepository<LocalStorage>;

#[tokio::main]
async fn main() {
    let args = CliArgs::parse();

    let config = match AppConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(3);
        }
    };

    let verbose = args.verbose || config.verbose();
    if args.json_logs || config.json_logs() {
        logger::init_json_logger(verbose);
    } else {
        logger::init_cli_logger(verbose);
    }
    tracing::debug!("CLI args: {:?}", args);

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(3);
    }

    match run(&args.command, &config).await {
        Ok(output) => println!("{}", output),
        Err(e) => {
            let Some(err) = e.downcast_ref::<EnrollmentError>() else {
                tracing::error!("❌ {:#}", e);
                eprintln!("❌ {:#}", e);
                std::process::exit(1);
            };

            tracing::error!(
                "❌ {} (Category: {:?}, Severity: {:?})",
                err,
                err.category(),
                err.severity()
            );
            eprintln!("❌ {}", err.user_friendly_message());
            eprintln!("💡 {}", err.recovery_suggestion());

            std::process::exit(err.exit_code());
        }
    }
}

async fn run(command: &Command, config: &AppConfig) -> anyhow::Result<String> {
    let storage = LocalStorage::new(config.data_dir().to_string());
    let repository = Arc::new(
        DocumentRepository::open(storage.clone(), config.store_file_name())
            .await
            .with_context(|| format!("opening store in {}", storage.base_path()))?,
    );
    repository
        .upsert_catalog(&config.catalog.students, &config.catalog.plans)
        .await?;

    match config.notifier_kind() {
        NotifierKind::Log => execute(command, repository, LogNotifier, config).await,
        NotifierKind::Outbox => {
            let outbox = OutboxNotifier::new(storage, config.outbox_dir());
            execute(command, repository, outbox, config).await
        }
    }
}

async fn execute<N>(
    command: &Command,
    repository: Arc<Repository>,
    notifier: N,
    config: &AppConfig,
) -> anyhow::Result<String>
where
    N: Notifier + 'static,
{
    let (queue, worker) = QueuedNotifier::spawn(notifier, config.queue_capacity());
    let service = EnrollmentService::new(repository.clone(), Arc::new(queue), Arc::new(SystemClock));

    let output = match command {
        Command::Create(args) => serde_json::to_string_pretty(&service.create(&args.into()).await?)?,
        Command::Update(args) => serde_json::to_string_pretty(&service.update(&args.into()).await?)?,
        Command::Delete { student } => {
            serde_json::to_string_pretty(&service.delete((*student).into()).await?)?
        }
        Command::List => serde_json::to_string_pretty(&service.list().await?)?,
        Command::Catalog => serde_json::to_string_pretty(&serde_json::json!({
            "students": repository.students().await?,
            "plans": repository.plans().await?,
        }))?,
    };

    // Closing the queue lets the worker finish what is pending.
    drop(service);
    let stats = worker.await.context("notification worker crashed")?;
    if stats.failed > 0 {
        tracing::warn!("⚠️ {} confirmation(s) could not be delivered", stats.failed);
    }

    Ok(output)
}
