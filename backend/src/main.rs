use actix_cors::Cors;
use actix_web::{middleware, web, App, HttpServer};
use std::sync::Arc;
use tracing::{error, info, warn};

use dental_clinic::core::{
    AppointmentService, CashRegisterService, CatalogService, CompanyService, LabService,
    PatientService, PaymentService, ProfessionalService, ReportService, TreatmentService,
    UserService,
};
use dental_clinic::services::Database;
use dental_clinic::utils::Config;
use dental_clinic::{api, setup_tracing, NAME};

#[actix_web::main]
async fn main() -> std::io::Result<()> {
    // Chargement de la configuration
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Impossible de charger la configuration: {}", e);
            std::process::exit(1);
        }
    };

    setup_tracing(&config.log_level, &config.logging_format);
    info!("🚀 Démarrage de {} v{}", NAME, dental_clinic::VERSION);
    info!("🔧 Mode: {}", config.run_mode);
    if config.is_development() {
        warn!("🛠️  Mode développement: ne pas exposer publiquement");
    }

    let db = match Database::new(&config).await {
        Ok(db) => Arc::new(db),
        Err(e) => {
            error!("❌ Impossible de se connecter à la base de données: {}", e);
            std::process::exit(1);
        }
    };
    info!("✅ Connexion PostgreSQL établie");

    if config.run_migrations_on_startup {
        if let Err(e) = db.run_migrations().await {
            error!("❌ Échec des migrations: {}", e);
            std::process::exit(1);
        }
        info!("✅ Migrations appliquées");
    }

    // Initialisation des services
    let companies = Arc::new(CompanyService::new(db.clone()));
    let users = UserService::new(
        db.clone(),
        companies.clone(),
        config.jwt_secret.clone(),
        config.jwt_access_token_expiry_hours,
    );

    bootstrap_admin(&config, &users).await;

    let companies = web::Data::from(companies);
    let users = web::Data::new(users);
    let catalog = web::Data::new(CatalogService::new(db.clone()));
    let patients = web::Data::new(PatientService::new(db.clone()));
    let professionals = web::Data::new(ProfessionalService::new(db.clone()));
    let appointments = web::Data::new(AppointmentService::new(db.clone()));
    let treatments = web::Data::new(TreatmentService::new(db.clone()));
    let payments = web::Data::new(PaymentService::new(db.clone()));
    let registers = web::Data::new(CashRegisterService::new(db.clone()));
    let lab = web::Data::new(LabService::new(db.clone()));
    let reports = web::Data::new(ReportService::new(db.clone(), config.report_default_days));

    if config.is_production() && config.cors_allowed_origin.is_none() {
        warn!("⚠️  CORS_ALLOWED_ORIGIN absent: toutes les origines sont acceptées");
    }

    let bind_addr = (config.server_host.clone(), config.server_port);
    let workers = config.workers;
    let allowed_origin = config.cors_allowed_origin.clone();
    let app_config = web::Data::new(config);

    // Configuration du serveur Actix-Web
    let server = HttpServer::new(move || {
        let cors = match allowed_origin.as_deref() {
            Some(origin) => Cors::default()
                .allowed_origin(origin)
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
            None => Cors::default()
                .allow_any_origin()
                .allow_any_method()
                .allow_any_header()
                .max_age(3600),
        };

        App::new()
            .wrap(cors)
            .wrap(middleware::Logger::default())
            .wrap(middleware::Compress::default())
            .app_data(app_config.clone())
            .app_data(companies.clone())
            .app_data(users.clone())
            .app_data(catalog.clone())
            .app_data(patients.clone())
            .app_data(professionals.clone())
            .app_data(appointments.clone())
            .app_data(treatments.clone())
            .app_data(payments.clone())
            .app_data(registers.clone())
            .app_data(lab.clone())
            .app_data(reports.clone())
            .configure(api::config)
    })
    .bind((bind_addr.0.as_str(), bind_addr.1))?
    .workers(workers)
    .shutdown_timeout(10);

    info!("✅ Backend démarré avec succès!");
    info!("🔗 API disponible sur http://{}:{}", bind_addr.0, bind_addr.1);

    server.run().await
}

/// Crée le superutilisateur initial si ADMIN_EMAIL et ADMIN_PASSWORD sont fournis
async fn bootstrap_admin(config: &Config, users: &UserService) {
    let (Some(email), Some(password)) = (&config.admin_email, &config.admin_password) else {
        return;
    };

    match users.create_superuser(email, password, "Admin", "Sistema").await {
        Ok(user) => info!("👑 Superutilisateur prêt: {}", user.email),
        Err(e) => warn!("⚠️  Superutilisateur initial non créé: {}", e),
    }
}
