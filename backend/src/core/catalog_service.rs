// core/catalog_service.rs
use crate::models::{
    Insurer, InsurerRequest, PaymentMethod, PaymentMethodKind, PaymentMethodRequest, Procedure,
    ProcedureRequest, Specialty, SpecialtyRequest,
};
use crate::services::database::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::helpers::uppercase_trimmed;
use crate::utils::validation::validate_money;
use std::sync::Arc;
use tracing::info;
use uuid::Uuid;
use validator::Validate;

/// Moyens de paiement créés par l'amorçage
pub const DEFAULT_PAYMENT_METHODS: [(&str, PaymentMethodKind); 3] = [
    ("EFECTIVO", PaymentMethodKind::Cash),
    ("TARJETA", PaymentMethodKind::Card),
    ("TRANSFERENCIA", PaymentMethodKind::Transfer),
];

pub const DEFAULT_INSURERS: [&str; 3] = ["FONASA", "ISAPRE", "PARTICULAR"];

pub const DEFAULT_SPECIALTIES: [&str; 6] = [
    "ODONTOLOGÍA GENERAL",
    "ORTODONCIA",
    "ENDODONCIA",
    "PERIODONCIA",
    "IMPLANTOLOGÍA",
    "ODONTOPEDIATRÍA",
];

/// Nombre d'entrées créées par l'amorçage
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct SeedReport {
    pub payment_methods: usize,
    pub insurers: usize,
    pub specialties: usize,
}

/// Référentiels partagés par toutes les entreprises
pub struct CatalogService {
    db: Arc<Database>,
}

impl CatalogService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    // === SPÉCIALITÉS ===

    pub async fn list_specialties(&self, include_inactive: bool) -> Result<Vec<Specialty>> {
        self.db.list_specialties(include_inactive).await
    }

    pub async fn get_specialty(&self, id: Uuid) -> Result<Specialty> {
        self.db.get_specialty(id).await
    }

    pub async fn create_specialty(&self, mut req: SpecialtyRequest) -> Result<Specialty> {
        req.validate()?;
        req.name = uppercase_trimmed(&req.name);

        let specialty = self.db.create_specialty(&req).await.map_err(duplicate_name)?;
        info!("Spécialité créée: {} ({})", specialty.name, specialty.id);
        Ok(specialty)
    }

    pub async fn update_specialty(&self, id: Uuid, mut req: SpecialtyRequest) -> Result<Specialty> {
        req.validate()?;
        req.name = uppercase_trimmed(&req.name);
        self.db.update_specialty(id, &req).await.map_err(duplicate_name)
    }

    /// Suppression refusée tant que des actes ou des professionnels la référencent
    pub async fn delete_specialty(&self, id: Uuid) -> Result<()> {
        let references = self.db.count_specialty_references(id).await?;
        if references > 0 {
            return Err(AppError::Conflict(format!(
                "Specialty is used by {} procedure(s) or professional(s)",
                references
            )));
        }

        self.db.delete_specialty(id).await?;
        info!("Spécialité supprimée: {}", id);
        Ok(())
    }

    // === ACTES ===

    pub async fn list_procedures(
        &self,
        include_inactive: bool,
        specialty_id: Option<Uuid>,
    ) -> Result<Vec<Procedure>> {
        self.db.list_procedures(include_inactive, specialty_id).await
    }

    pub async fn get_procedure(&self, id: Uuid) -> Result<Procedure> {
        self.db.get_procedure(id).await
    }

    pub async fn create_procedure(&self, mut req: ProcedureRequest) -> Result<Procedure> {
        self.check_procedure(&mut req).await?;
        let procedure = self.db.create_procedure(&req).await?;
        info!("Acte créé: {} ({})", procedure.name, procedure.id);
        Ok(procedure)
    }

    pub async fn update_procedure(&self, id: Uuid, mut req: ProcedureRequest) -> Result<Procedure> {
        self.check_procedure(&mut req).await?;
        self.db.update_procedure(id, &req).await
    }

    pub async fn deactivate_procedure(&self, id: Uuid) -> Result<()> {
        self.db.set_procedure_active(id, false).await?;
        info!("Acte désactivé: {}", id);
        Ok(())
    }

    async fn check_procedure(&self, req: &mut ProcedureRequest) -> Result<()> {
        req.validate()?;
        validate_money(req.price, "price")?;
        req.name = uppercase_trimmed(&req.name);
        if let Some(specialty_id) = req.specialty_id {
            self.db.get_specialty(specialty_id).await?;
        }
        Ok(())
    }

    // === MOYENS DE PAIEMENT ===

    pub async fn list_payment_methods(&self, include_inactive: bool) -> Result<Vec<PaymentMethod>> {
        self.db.list_payment_methods(include_inactive).await
    }

    pub async fn create_payment_method(&self, mut req: PaymentMethodRequest) -> Result<PaymentMethod> {
        req.validate()?;
        req.name = uppercase_trimmed(&req.name);

        let method = self.db.create_payment_method(&req).await.map_err(duplicate_name)?;
        info!("Moyen de paiement créé: {} ({:?})", method.name, method.kind);
        Ok(method)
    }

    pub async fn update_payment_method(
        &self,
        id: Uuid,
        mut req: PaymentMethodRequest,
    ) -> Result<PaymentMethod> {
        req.validate()?;
        req.name = uppercase_trimmed(&req.name);
        self.db.update_payment_method(id, &req).await.map_err(duplicate_name)
    }

    // === PRÉVISIONS ===

    pub async fn list_insurers(&self, include_inactive: bool) -> Result<Vec<Insurer>> {
        self.db.list_insurers(include_inactive).await
    }

    pub async fn create_insurer(&self, mut req: InsurerRequest) -> Result<Insurer> {
        req.validate()?;
        req.name = uppercase_trimmed(&req.name);

        let insurer = self.db.create_insurer(&req).await.map_err(duplicate_name)?;
        info!("Prévision créée: {} ({})", insurer.name, insurer.id);
        Ok(insurer)
    }

    pub async fn update_insurer(&self, id: Uuid, mut req: InsurerRequest) -> Result<Insurer> {
        req.validate()?;
        req.name = uppercase_trimmed(&req.name);
        self.db.update_insurer(id, &req).await.map_err(duplicate_name)
    }

    /// Référentiels par défaut; sans effet sur les entrées existantes
    pub async fn seed_defaults(&self) -> Result<SeedReport> {
        let mut report = SeedReport::default();

        for (name, kind) in DEFAULT_PAYMENT_METHODS {
            if self.db.ensure_payment_method(name, kind).await? {
                report.payment_methods += 1;
            }
        }
        for name in DEFAULT_INSURERS {
            if self.db.ensure_insurer(name).await? {
                report.insurers += 1;
            }
        }
        for name in DEFAULT_SPECIALTIES {
            if self.db.ensure_specialty(name).await? {
                report.specialties += 1;
            }
        }

        info!("🌱 Amorçage terminé: {:?}", report);
        Ok(report)
    }
}

fn duplicate_name(err: AppError) -> AppError {
    match err {
        AppError::Conflict(_) => AppError::Conflict("An entry with this name already exists".to_string()),
        other => other,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_payment_methods_cover_register_kinds() {
        let kinds: Vec<_> = DEFAULT_PAYMENT_METHODS.iter().map(|(_, k)| *k).collect();
        assert!(kinds.contains(&PaymentMethodKind::Cash));
        assert!(kinds.contains(&PaymentMethodKind::Card));
        assert!(kinds.contains(&PaymentMethodKind::Transfer));
    }

    #[test]
    fn test_seed_names_are_uppercase() {
        for name in DEFAULT_INSURERS.iter().chain(DEFAULT_SPECIALTIES.iter()) {
            assert_eq!(*name, uppercase_trimmed(name));
        }
    }
}
