use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// État d'un rendez-vous
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "appointment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    Pending,    // En attente
    Confirmed,  // Confirmé
    Completed,  // Réalisé
    Cancelled,  // Annulé
}

impl AppointmentStatus {
    /// Couleur de fond dans l'agenda
    pub fn calendar_color(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "#FFD700",
            AppointmentStatus::Confirmed => "#90EE90",
            AppointmentStatus::Completed => "#87CEEB",
            AppointmentStatus::Cancelled => "#FFB6C1",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Pending => "pending",
            AppointmentStatus::Confirmed => "confirmed",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Appointment {
    pub id: Uuid,
    pub company_id: Uuid,
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Créneau occupé d'un professionnel sur une journée
#[derive(Debug, Clone, Copy, PartialEq, FromRow)]
pub struct Slot {
    pub id: Uuid,
    pub start: NaiveTime,
    pub duration_minutes: i32,
    pub status: AppointmentStatus,
}

impl Slot {
    /// Intervalle semi-ouvert [début, fin) en minutes depuis minuit
    fn interval(&self) -> (i64, i64) {
        interval(self.start, self.duration_minutes)
    }
}

fn interval(start: NaiveTime, duration_minutes: i32) -> (i64, i64) {
    let begin = i64::from(start.num_seconds_from_midnight() / 60);
    (begin, begin + i64::from(duration_minutes))
}

/// Cherche un rendez-vous non annulé qui chevauche le créneau demandé.
/// `exclude` écarte le rendez-vous en cours de modification.
pub fn find_overlap(
    existing: &[Slot],
    start: NaiveTime,
    duration_minutes: i32,
    exclude: Option<Uuid>,
) -> Option<Uuid> {
    let (begin, end) = interval(start, duration_minutes);

    existing
        .iter()
        .filter(|slot| slot.status != AppointmentStatus::Cancelled)
        .filter(|slot| Some(slot.id) != exclude)
        .find(|slot| {
            let (other_begin, other_end) = slot.interval();
            begin < other_end && other_begin < end
        })
        .map(|slot| slot.id)
}

/// Conflit provoqué par un changement d'état. Seul un rendez-vous annulé
/// qui redevient actif reprend son créneau.
pub fn status_change_conflict(
    current: &Slot,
    next: AppointmentStatus,
    day: &[Slot],
) -> Option<Uuid> {
    if current.status != AppointmentStatus::Cancelled || next == AppointmentStatus::Cancelled {
        return None;
    }
    find_overlap(day, current.start, current.duration_minutes, Some(current.id))
}

impl From<&Appointment> for Slot {
    fn from(a: &Appointment) -> Self {
        Slot {
            id: a.id,
            start: a.start_time,
            duration_minutes: a.duration_minutes,
            status: a.status,
        }
    }
}

impl Appointment {
    pub fn starts_at(&self) -> NaiveDateTime {
        self.appointment_date.and_time(self.start_time)
    }

    pub fn ends_at(&self) -> NaiveDateTime {
        self.starts_at() + Duration::minutes(i64::from(self.duration_minutes))
    }
}

/// Rendez-vous enrichi des noms pour les listes et l'agenda
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct AppointmentDetail {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub appointment: Appointment,
    pub patient_name: String,
    pub patient_phone: Option<String>,
    pub professional_name: String,
}

/// Événement au format attendu par le calendrier web
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CalendarEvent {
    pub id: Uuid,
    pub title: String,
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
    pub background_color: &'static str,
    pub border_color: &'static str,
    pub class_name: String,
    pub extended_props: CalendarEventProps,
}

#[derive(Debug, Clone, Serialize)]
pub struct CalendarEventProps {
    pub status: AppointmentStatus,
    pub patient_id: Uuid,
    pub patient_phone: Option<String>,
    pub professional_id: Uuid,
    pub professional_name: String,
    pub reason: Option<String>,
    pub duration_minutes: i32,
}

impl From<&AppointmentDetail> for CalendarEvent {
    fn from(detail: &AppointmentDetail) -> Self {
        let a = &detail.appointment;
        let color = a.status.calendar_color();
        CalendarEvent {
            id: a.id,
            title: format!("{} - {}", detail.patient_name, detail.professional_name),
            start: a.starts_at(),
            end: a.ends_at(),
            background_color: color,
            border_color: color,
            class_name: format!("status-{}", a.status.as_str()),
            extended_props: CalendarEventProps {
                status: a.status,
                patient_id: a.patient_id,
                patient_phone: detail.patient_phone.clone(),
                professional_id: a.professional_id,
                professional_name: detail.professional_name.clone(),
                reason: a.reason.clone(),
                duration_minutes: a.duration_minutes,
            },
        }
    }
}

#[derive(Debug, Clone, Deserialize, Validate)]
pub struct AppointmentRequest {
    pub patient_id: Uuid,
    pub professional_id: Uuid,
    pub appointment_date: NaiveDate,
    pub start_time: NaiveTime,
    #[validate(range(min = 15, max = 120, message = "La durée doit être comprise entre 15 et 120 minutes"))]
    pub duration_minutes: i32,
    pub status: Option<AppointmentStatus>,
    #[validate(length(max = 2000))]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppointmentStatusRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppointmentFilter {
    pub professional_id: Option<Uuid>,
    pub patient_id: Option<Uuid>,
    pub status: Option<AppointmentStatus>,
    pub date_from: Option<NaiveDate>,
    pub date_to: Option<NaiveDate>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn t(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    fn slot(start: NaiveTime, minutes: i32, status: AppointmentStatus) -> Slot {
        Slot {
            id: Uuid::new_v4(),
            start,
            duration_minutes: minutes,
            status,
        }
    }

    #[test]
    fn test_touching_intervals_do_not_overlap() {
        let day = vec![slot(t(9, 0), 30, AppointmentStatus::Confirmed)];
        assert_eq!(find_overlap(&day, t(9, 30), 30, None), None);
        assert_eq!(find_overlap(&day, t(8, 30), 30, None), None);
    }

    #[test]
    fn test_same_start_and_containment_overlap() {
        let existing = slot(t(10, 0), 60, AppointmentStatus::Pending);
        let day = vec![existing];

        assert_eq!(find_overlap(&day, t(10, 0), 15, None), Some(existing.id));
        assert_eq!(find_overlap(&day, t(10, 15), 15, None), Some(existing.id));
        assert_eq!(find_overlap(&day, t(9, 30), 120, None), Some(existing.id));
        assert_eq!(find_overlap(&day, t(9, 45), 30, None), Some(existing.id));
    }

    #[test]
    fn test_cancelled_and_self_are_ignored() {
        let cancelled = slot(t(11, 0), 30, AppointmentStatus::Cancelled);
        let editing = slot(t(12, 0), 30, AppointmentStatus::Confirmed);
        let day = vec![cancelled, editing];

        assert_eq!(find_overlap(&day, t(11, 0), 30, None), None);
        assert_eq!(find_overlap(&day, t(12, 0), 45, Some(editing.id)), None);
        assert_eq!(find_overlap(&day, t(12, 0), 45, None), Some(editing.id));
    }

    #[test]
    fn test_reactivation_checks_the_slot() {
        let cancelled = slot(t(9, 0), 30, AppointmentStatus::Cancelled);
        let booked = slot(t(9, 15), 30, AppointmentStatus::Pending);
        let day = vec![cancelled, booked];

        assert_eq!(
            status_change_conflict(&cancelled, AppointmentStatus::Confirmed, &day),
            Some(booked.id)
        );
        assert_eq!(
            status_change_conflict(&cancelled, AppointmentStatus::Pending, &day),
            Some(booked.id)
        );
        assert_eq!(
            status_change_conflict(&cancelled, AppointmentStatus::Cancelled, &day),
            None
        );
    }

    #[test]
    fn test_status_change_without_reactivation_is_free() {
        let active = slot(t(9, 0), 30, AppointmentStatus::Pending);
        let other = slot(t(9, 0), 30, AppointmentStatus::Confirmed);
        let day = vec![active, other];

        assert_eq!(
            status_change_conflict(&active, AppointmentStatus::Confirmed, &day),
            None
        );
        assert_eq!(
            status_change_conflict(&active, AppointmentStatus::Cancelled, &day),
            None
        );
    }

    #[test]
    fn test_reactivation_ignores_itself_and_cancelled_slots() {
        let cancelled = slot(t(14, 0), 45, AppointmentStatus::Cancelled);
        let also_cancelled = slot(t(14, 0), 45, AppointmentStatus::Cancelled);
        let after = slot(t(14, 45), 15, AppointmentStatus::Confirmed);
        let day = vec![cancelled, also_cancelled, after];

        assert_eq!(
            status_change_conflict(&cancelled, AppointmentStatus::Confirmed, &day),
            None
        );
    }

    #[test]
    fn test_calendar_event_shape() {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            patient_id: Uuid::new_v4(),
            professional_id: Uuid::new_v4(),
            appointment_date: NaiveDate::from_ymd_opt(2025, 7, 1).unwrap(),
            start_time: t(9, 45),
            duration_minutes: 30,
            status: AppointmentStatus::Confirmed,
            reason: Some("Control".into()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        let detail = AppointmentDetail {
            appointment,
            patient_name: "JUAN PÉREZ".into(),
            patient_phone: None,
            professional_name: "ANA ROJAS".into(),
        };

        let json = serde_json::to_value(CalendarEvent::from(&detail)).unwrap();
        assert_eq!(json["title"], "JUAN PÉREZ - ANA ROJAS");
        assert_eq!(json["start"], "2025-07-01T09:45:00");
        assert_eq!(json["end"], "2025-07-01T10:15:00");
        assert_eq!(json["backgroundColor"], "#90EE90");
        assert_eq!(json["className"], "status-confirmed");
        assert_eq!(json["extendedProps"]["status"], "confirmed");
    }
}
