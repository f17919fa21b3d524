// core/appointment_service.rs
use crate::models::{
    find_overlap, status_change_conflict, Appointment, AppointmentDetail, AppointmentFilter,
    AppointmentRequest, AppointmentStatus, CalendarEvent, Slot,
};
use crate::services::database::Database;
use crate::utils::error::{AppError, Result};
use crate::utils::validation::{
    validate_appointment_date, validate_appointment_duration, validate_appointment_time,
};
use chrono::{NaiveDate, Utc};
use sqlx::PgConnection;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;
use validator::Validate;

pub struct AppointmentService {
    db: Arc<Database>,
}

impl AppointmentService {
    pub fn new(db: Arc<Database>) -> Self {
        Self { db }
    }

    pub async fn create_appointment(
        &self,
        company_id: Uuid,
        mut req: AppointmentRequest,
    ) -> Result<AppointmentDetail> {
        check_schedule(&mut req, Utc::now().date_naive(), true)?;
        self.check_patient(company_id, req.patient_id).await?;

        let status = req.status.unwrap_or(AppointmentStatus::Pending);
        let mut tx = self.db.begin().await?;
        ensure_free_slot(&mut *tx, company_id, &req, status, None).await?;
        let appointment = Database::insert_appointment(&mut *tx, company_id, &req, status).await?;
        tx.commit().await?;

        info!(
            "📅 Rendez-vous créé: {} le {} à {}",
            appointment.id, appointment.appointment_date, appointment.start_time
        );
        self.db.get_appointment_detail(company_id, appointment.id).await
    }

    pub async fn update_appointment(
        &self,
        company_id: Uuid,
        id: Uuid,
        mut req: AppointmentRequest,
    ) -> Result<AppointmentDetail> {
        let current = self.db.get_appointment(company_id, id).await?;
        // Un rendez-vous passé reste modifiable tant que sa date ne change pas
        let date_changed = current.appointment_date != req.appointment_date;
        check_schedule(&mut req, Utc::now().date_naive(), date_changed)?;
        self.check_patient(company_id, req.patient_id).await?;

        let status = req.status.unwrap_or(current.status);
        let mut tx = self.db.begin().await?;
        ensure_free_slot(&mut *tx, company_id, &req, status, Some(id)).await?;
        let appointment = Database::update_appointment(&mut *tx, company_id, id, &req, status).await?;
        tx.commit().await?;

        info!("Rendez-vous mis à jour: {}", appointment.id);
        self.db.get_appointment_detail(company_id, appointment.id).await
    }

    pub async fn get_appointment(&self, company_id: Uuid, id: Uuid) -> Result<AppointmentDetail> {
        self.db.get_appointment_detail(company_id, id).await
    }

    pub async fn list_appointments(
        &self,
        company_id: Uuid,
        filter: &AppointmentFilter,
    ) -> Result<Vec<AppointmentDetail>> {
        self.db.list_appointment_details(company_id, filter).await
    }

    /// Flux de l'agenda
    pub async fn calendar_events(
        &self,
        company_id: Uuid,
        filter: &AppointmentFilter,
    ) -> Result<Vec<CalendarEvent>> {
        let details = self.db.list_appointment_details(company_id, filter).await?;
        Ok(details.iter().map(CalendarEvent::from).collect())
    }

    pub async fn change_status(
        &self,
        company_id: Uuid,
        id: Uuid,
        status: AppointmentStatus,
    ) -> Result<Appointment> {
        let current = self.db.get_appointment(company_id, id).await?;

        // Vérification et écriture sous le même verrou du professionnel
        let mut tx = self.db.begin().await?;
        Database::lock_professional(&mut *tx, company_id, current.professional_id).await?;
        let slots = Database::day_slots(&mut *tx, current.professional_id, current.appointment_date).await?;
        let own = slots
            .iter()
            .find(|slot| slot.id == id)
            .copied()
            .unwrap_or_else(|| Slot::from(&current));
        if let Some(conflict) = status_change_conflict(&own, status, &slots) {
            warn!("Réactivation refusée: {} chevauche {}", id, conflict);
            return Err(AppError::AppointmentOverlap);
        }
        let appointment = Database::set_appointment_status(&mut *tx, company_id, id, status).await?;
        tx.commit().await?;

        info!("Rendez-vous {} -> {:?}", appointment.id, appointment.status);
        Ok(appointment)
    }

    pub async fn delete_appointment(&self, company_id: Uuid, id: Uuid) -> Result<()> {
        self.db.delete_appointment(company_id, id).await?;
        info!("Rendez-vous supprimé: {}", id);
        Ok(())
    }

    async fn check_patient(&self, company_id: Uuid, patient_id: Uuid) -> Result<()> {
        let patient = self.db.get_patient(company_id, patient_id).await?;
        if !patient.is_active {
            return Err(AppError::Validation("patient_id: patient is inactive".to_string()));
        }
        Ok(())
    }
}

/// Règles d'horaire; l'heure est ramenée à la minute
fn check_schedule(req: &mut AppointmentRequest, today: NaiveDate, check_date: bool) -> Result<()> {
    req.validate()?;
    if check_date {
        validate_appointment_date(req.appointment_date, today)?;
    }
    req.start_time = validate_appointment_time(req.start_time)?;
    validate_appointment_duration(req.duration_minutes)?;
    Ok(())
}

/// Verrouille le professionnel puis vérifie le chevauchement sur la journée
async fn ensure_free_slot(
    conn: &mut PgConnection,
    company_id: Uuid,
    req: &AppointmentRequest,
    status: AppointmentStatus,
    exclude: Option<Uuid>,
) -> Result<()> {
    let professional = Database::lock_professional(&mut *conn, company_id, req.professional_id).await?;
    if !professional.is_active {
        return Err(AppError::Validation("professional_id: professional is inactive".to_string()));
    }

    if status == AppointmentStatus::Cancelled {
        return Ok(());
    }

    let slots = Database::day_slots(&mut *conn, req.professional_id, req.appointment_date).await?;
    if let Some(conflict) = find_overlap(&slots, req.start_time, req.duration_minutes, exclude) {
        warn!(
            "Chevauchement: professionnel={} date={} avec {}",
            req.professional_id, req.appointment_date, conflict
        );
        return Err(AppError::AppointmentOverlap);
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveTime;

    fn request(time: NaiveTime, date: NaiveDate) -> AppointmentRequest {
        AppointmentRequest {
            patient_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            appointment_date: date,
            start_time: time,
            duration_minutes: 30,
            status: None,
            reason: Some("Control".into()),
        }
    }

    #[test]
    fn test_check_schedule_drops_seconds() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut req = request(NaiveTime::from_hms_opt(9, 30, 42).unwrap(), today);
        check_schedule(&mut req, today, true).unwrap();
        assert_eq!(req.start_time, NaiveTime::from_hms_opt(9, 30, 0).unwrap());
    }

    #[test]
    fn test_check_schedule_past_date() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let yesterday = today.pred_opt().unwrap();
        let time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();

        assert!(check_schedule(&mut request(time, yesterday), today, true).is_err());
        // Date inchangée lors d'une modification: pas de contrôle
        assert!(check_schedule(&mut request(time, yesterday), today, false).is_ok());
    }

    #[test]
    fn test_check_schedule_rejects_off_grid_time() {
        let today = NaiveDate::from_ymd_opt(2025, 3, 10).unwrap();
        let mut req = request(NaiveTime::from_hms_opt(10, 10, 0).unwrap(), today);
        assert!(check_schedule(&mut req, today, true).is_err());

        let mut late = request(NaiveTime::from_hms_opt(20, 15, 0).unwrap(), today);
        assert!(check_schedule(&mut late, today, true).is_err());
    }
}
