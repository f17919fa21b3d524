// bin/clinic_admin.rs
// Outil d'administration en ligne de commande
use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::sync::Arc;

use dental_clinic::core::{CatalogService, CompanyService, TreatmentService, UserService};
use dental_clinic::models::UserRole;
use dental_clinic::services::Database;
use dental_clinic::utils::{normalize_rut, Config};
use dental_clinic::setup_tracing;

#[derive(Parser)]
#[command(name = "clinic-admin", version, about = "Administration du backend de clinique dentaire")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Applique les migrations en attente
    Migrate,
    /// Crée un superutilisateur, ou promeut un compte existant
    CreateSuperuser {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ADMIN_PASSWORD")]
        password: String,
        #[arg(long, default_value = "Admin")]
        first_name: String,
        #[arg(long, default_value = "Sistema")]
        last_name: String,
    },
    /// Réinitialise un mot de passe; en génère un si absent
    ResetPassword {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: Option<String>,
    },
    /// Charge les moyens de paiement, assureurs et spécialités par défaut
    Seed,
    /// Rattache un utilisateur à une entreprise (par RUT)
    AssignCompany {
        #[arg(long)]
        email: String,
        #[arg(long)]
        company_rut: String,
        #[arg(long, value_enum, default_value_t = RoleArg::CompanyAdmin)]
        role: RoleArg,
    },
    /// Recalcule l'état des traitements selon les paiements
    SyncTreatmentStatuses,
    /// Vérifie la configuration et la connexion à la base
    Check,
}

#[derive(Clone, Copy, ValueEnum)]
enum RoleArg {
    CompanyAdmin,
    BranchAdmin,
    Professional,
    Reception,
    Assistant,
}

impl From<RoleArg> for UserRole {
    fn from(role: RoleArg) -> Self {
        match role {
            RoleArg::CompanyAdmin => UserRole::CompanyAdmin,
            RoleArg::BranchAdmin => UserRole::BranchAdmin,
            RoleArg::Professional => UserRole::Professional,
            RoleArg::Reception => UserRole::Reception,
            RoleArg::Assistant => UserRole::Assistant,
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::from_env().context("Configuration invalide")?;
    setup_tracing(&config.log_level, "compact");

    let db = Arc::new(
        Database::new(&config)
            .await
            .context("Connexion à la base de données impossible")?,
    );

    match cli.command {
        Command::Migrate => {
            db.run_migrations().await?;
            println!("✅ Migrations appliquées");
        }
        Command::CreateSuperuser {
            email,
            password,
            first_name,
            last_name,
        } => {
            let users = user_service(&db, &config);
            let user = users
                .create_superuser(&email, &password, &first_name, &last_name)
                .await?;
            println!("👑 Superutilisateur: {} ({})", user.email, user.id);
        }
        Command::ResetPassword { email, password } => {
            let generated = password.is_none();
            let users = user_service(&db, &config);
            let password = users.reset_password(&email, password).await?;
            if generated {
                println!("🔑 Nouveau mot de passe pour {}: {}", email, password);
            } else {
                println!("🔑 Mot de passe mis à jour pour {}", email);
            }
        }
        Command::Seed => {
            let report = CatalogService::new(db.clone()).seed_defaults().await?;
            println!(
                "🌱 Ajoutés: {} moyen(s) de paiement, {} assureur(s), {} spécialité(s)",
                report.payment_methods, report.insurers, report.specialties
            );
        }
        Command::AssignCompany {
            email,
            company_rut,
            role,
        } => {
            let user = user_service(&db, &config).find_by_email(&email).await?;
            let rut = normalize_rut(&company_rut)?;
            let Some(company) = db.find_company_by_rut(&rut).await? else {
                bail!("Aucune entreprise avec le RUT {}", rut);
            };
            let membership = CompanyService::new(db.clone())
                .assign_company(user.id, company.id, role.into())
                .await?;
            println!(
                "🏢 {} rattaché à {} (rattachement {})",
                user.email, company.legal_name, membership.id
            );
        }
        Command::SyncTreatmentStatuses => {
            let changed = TreatmentService::new(db.clone()).sync_all_statuses().await?;
            println!("🔄 {} traitement(s) mis à jour", changed);
        }
        Command::Check => {
            db.ping().await?;
            println!("✅ Configuration valide, base de données joignable ({})", config.run_mode);
        }
    }

    Ok(())
}

fn user_service(db: &Arc<Database>, config: &Config) -> UserService {
    UserService::new(
        db.clone(),
        Arc::new(CompanyService::new(db.clone())),
        config.jwt_secret.clone(),
        config.jwt_access_token_expiry_hours,
    )
}
