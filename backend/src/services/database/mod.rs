// services/database/mod.rs
use crate::utils::config::Config;
use crate::utils::error::Result;
use sqlx::{postgres::PgPoolOptions, PgPool, Postgres, Transaction};
use std::time::Duration;

mod appointments;
mod cash_register;
mod catalog;
mod companies;
mod lab;
mod patients;
mod payments;
mod professionals;
mod reports;
mod treatments;
mod users;

pub use cash_register::ClosingFigures;
pub use treatments::{NewTreatment, NewTreatmentItem};

/// Accès PostgreSQL; les requêtes sont réparties par domaine dans les sous-modules
pub struct Database {
    pool: PgPool,
}

impl Database {
    /// Créer une nouvelle instance de base de données
    pub async fn new(config: &Config) -> Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .min_connections(config.database_min_connections)
            .acquire_timeout(Duration::from_secs(config.database_connection_timeout))
            .connect(&config.database_url)
            .await?;

        Ok(Self { pool })
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Exécuter les migrations
    pub async fn run_migrations(&self) -> Result<()> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }

    /// Démarrer une transaction pour les écritures en plusieurs étapes
    pub async fn begin(&self) -> Result<Transaction<'static, Postgres>> {
        Ok(self.pool.begin().await?)
    }

    /// Vérifier la connectivité
    pub async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}
