// src/main.rs
use auto_ecole_client::core::{FilterChange, ListQuery};
use auto_ecole_client::models::{
    ExamCategory, LicenseCategory, LoginCredentials, PricingCategory, StudentStatus,
};
use auto_ecole_client::services::{TracingNavigator, TracingNotifier};
use auto_ecole_client::utils::config::ClientConfig;
use auto_ecole_client::utils::error::{ApiError, Result};
use auto_ecole_client::{AppState, NAME, VERSION};
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug, Parser)]
#[command(name = "auto-ecole", version, about = "Console Auto-École Manager en ligne de commande")]
struct Cli {
    /// URL de l'API (remplace API_URL)
    #[arg(long, global = true)]
    api_url: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Ouvrir une session
    Login {
        #[arg(long, env = "AUTO_ECOLE_EMAIL")]
        email: String,
        #[arg(long, env = "AUTO_ECOLE_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// Fermer la session
    Logout,
    /// Afficher la session courante
    Whoami,
    /// Lister les candidats
    Candidates {
        #[arg(long)]
        first_name: Option<String>,
        #[arg(long)]
        last_name: Option<String>,
        #[arg(long)]
        phone: Option<String>,
        #[arg(long, value_parser = parse_status)]
        status: Option<StudentStatus>,
        #[arg(long, value_parser = parse_license)]
        license: Option<LicenseCategory>,
        #[arg(long, default_value_t = 0)]
        page: u32,
        #[arg(long)]
        size: Option<u32>,
    },
    /// Lister les créneaux d'examen
    Slots {
        /// Mois au format AAAA-MM
        #[arg(long)]
        month: Option<String>,
        #[arg(long, conflicts_with = "month")]
        active: bool,
    },
    /// Candidats inscrits et éligibles pour un créneau
    Roster {
        slot_id: i64,
        #[arg(long, default_value = "")]
        search: String,
    },
    /// Inscrire un candidat à un créneau
    Assign {
        slot_id: i64,
        student_id: i64,
        #[arg(long, value_parser = parse_exam_category)]
        category: Option<ExamCategory>,
    },
    /// Retirer une participation
    Unassign { exam_student_id: i64 },
    /// Grilles tarifaires
    Pricing {
        /// Créer la grille d'une catégorie (A, B, C, D)
        #[arg(long, value_parser = parse_pricing_category)]
        create: Option<PricingCategory>,
    },
}

fn parse_status(raw: &str) -> std::result::Result<StudentStatus, String> {
    StudentStatus::parse(raw).ok_or_else(|| format!("statut inconnu: {}", raw))
}

fn parse_license(raw: &str) -> std::result::Result<LicenseCategory, String> {
    LicenseCategory::parse(raw).ok_or_else(|| format!("catégorie de permis inconnue: {}", raw))
}

fn parse_exam_category(raw: &str) -> std::result::Result<ExamCategory, String> {
    ExamCategory::parse(raw).ok_or_else(|| format!("épreuve inconnue: {}", raw))
}

fn parse_pricing_category(raw: &str) -> std::result::Result<PricingCategory, String> {
    PricingCategory::parse(raw).ok_or_else(|| format!("catégorie tarifaire inconnue: {}", raw))
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let mut config = match ClientConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Configuration invalide: {}", e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(api_url) = &cli.api_url {
        config = config.with_api_url(api_url.clone());
    }

    setup_tracing(&config);
    info!(name = NAME, version = VERSION, api_url = %config.api_url, "Démarrage");

    match run(cli.command, config).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            let message = e.to_error_message();
            error!(error = %e, code = ?message.code, "{}", message.title);
            eprintln!("{}: {}", message.title, message.message);
            ExitCode::FAILURE
        }
    }
}

async fn run(command: Command, config: ClientConfig) -> Result<()> {
    let store = AppState::credential_store(&config);
    let state = AppState::new(
        config,
        store,
        Arc::new(TracingNavigator::new("/")),
        Arc::new(TracingNotifier),
    )?;

    match command {
        Command::Login { email, password } => {
            let session = state.auth.login(&LoginCredentials { email, password }).await?;
            print_json(&session)
        }
        Command::Logout => {
            state.auth.logout().await;
            print_json(&state.auth.state())
        }
        Command::Whoami => print_json(&state.auth.state()),
        Command::Candidates {
            first_name,
            last_name,
            phone,
            status,
            license,
            page,
            size,
        } => {
            let query = candidate_query(
                state.config.default_page_size,
                first_name,
                last_name,
                phone,
                status,
                license,
                page,
                size,
            );
            print_json(&state.candidats.list(&query).await?)
        }
        Command::Slots { month, active } => {
            let slots = if active {
                state.exam_slots.list_active().await?
            } else {
                state.exam_slots.list(month.as_deref()).await?
            };
            print_json(&slots)
        }
        Command::Roster { slot_id, search } => {
            let slot = state.exam_slots.get(slot_id).await?;
            print_json(&state.assignments.roster(&slot, &search).await?)
        }
        Command::Assign {
            slot_id,
            student_id,
            category,
        } => {
            let slot = state.exam_slots.get(slot_id).await?;
            print_json(&state.assignments.assign(&slot, student_id, category).await?)
        }
        Command::Unassign { exam_student_id } => {
            state.assignments.unassign(exam_student_id).await?;
            print_json(&serde_json::json!({ "removed": exam_student_id }))
        }
        Command::Pricing { create } => match create {
            Some(category) => print_json(&state.pricing.create(category).await?),
            None => print_json(&state.pricing.list().await?),
        },
    }
}

/// Requête de liste construite par le même réducteur que la console
#[allow(clippy::too_many_arguments)]
fn candidate_query(
    default_page_size: u32,
    first_name: Option<String>,
    last_name: Option<String>,
    phone: Option<String>,
    status: Option<StudentStatus>,
    license: Option<LicenseCategory>,
    page: u32,
    size: Option<u32>,
) -> ListQuery {
    use auto_ecole_client::core::{reduce, TextField};

    let mut changes = vec![FilterChange::Status(status), FilterChange::RequestedLicense(license)];
    for (field, value) in [
        (TextField::FirstName, first_name),
        (TextField::LastName, last_name),
        (TextField::PhoneNumber, phone),
    ] {
        if let Some(value) = value {
            changes.push(FilterChange::Text(field, value));
        }
    }
    if let Some(size) = size {
        changes.push(FilterChange::PageSize(size));
    }
    changes.push(FilterChange::Page(page));

    changes.into_iter().fold(ListQuery::new(default_page_size), |query, change| {
        reduce(&query, change).unwrap_or(query)
    })
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let rendered = serde_json::to_string_pretty(value).map_err(|e| ApiError::Parse(e.to_string()))?;
    println!("{}", rendered);
    Ok(())
}

/// Configure le tracing pour le logging structuré (sur stderr, stdout reste du JSON)
fn setup_tracing(config: &ClientConfig) {
    let log_level = config.log_level.parse().unwrap_or(tracing::Level::INFO);

    let subscriber = tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::from_default_env().add_directive(log_level.into()))
        .with(if config.log_format == "json" {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .json()
                    .flatten_event(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_writer(std::io::stderr),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        } else {
            Box::new(
                tracing_subscriber::fmt::layer()
                    .compact()
                    .with_line_number(true)
                    .with_file(true)
                    .with_writer(std::io::stderr),
            ) as Box<dyn tracing_subscriber::Layer<_> + Send + Sync>
        });

    subscriber.init();
}
