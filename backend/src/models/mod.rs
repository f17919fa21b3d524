// Modèle: company.rs (entreprises, succursales, rôles)
pub mod company;
pub use company::{
    can, pick_company, AddMembershipRequest, AppModule, Branch, Company, CompanyAccess,
    CreateBranchRequest, CreateCompanyRequest, Membership, ModulePermission,
    PermissionAction, SelectCompanyRequest, SetPermissionRequest, TenantContext,
    UpdateBranchRequest, UpdateCompanyRequest, UpdateMembershipRequest, UserRole,
};

// Modèle: user.rs
pub mod user;
pub use user::{
    AuthResponse, ChangePasswordRequest, LoginRequest, RegisterUserRequest,
    User, UserProfile,
};

// Modèle: catalog.rs
pub mod catalog;
pub use catalog::{
    Insurer, InsurerRequest, PaymentMethod, PaymentMethodKind, PaymentMethodRequest,
    Procedure, ProcedureRequest, Specialty, SpecialtyRequest,
};

// Modèle: patient.rs
pub mod patient;
pub use patient::{
    ClinicalRecord, ClinicalRecordKind, ClinicalRecordRequest, Gender, Patient,
    PatientFilter, PatientRequest, PatientView,
};

// Modèle: professional.rs
pub mod professional;
pub use professional::{Professional, ProfessionalFilter, ProfessionalRequest, ProfessionalView};

// Modèle: appointment.rs
pub mod appointment;
pub use appointment::{
    find_overlap, status_change_conflict, Appointment, AppointmentDetail, AppointmentFilter,
    AppointmentRequest, AppointmentStatus, AppointmentStatusRequest, CalendarEvent, Slot,
};

// Modèle: treatment.rs
pub mod treatment;
pub use treatment::{
    line_amounts, resolve_professional, status_after_payments, treatment_total,
    CreateTreatmentRequest, Treatment, TreatmentDetail, TreatmentFilter, TreatmentItem,
    TreatmentItemRequest, TreatmentItemView, TreatmentStatus, TreatmentStatusRequest,
    TreatmentSummary, UpdateTreatmentRequest,
};

// Modèle: payment.rs
pub mod payment;
pub use payment::{
    check_amount_against_balance, outstanding_balance, CreatePaymentRequest, NewPaymentHistory, Payment, PaymentAction, PaymentDetail, PaymentFilter,
    PaymentHistory, PaymentStatus, PaymentWithHistory, TreatmentPaymentSummary,
    UpdatePaymentRequest, VoidPaymentRequest,
};

// Modèle: cash_register.rs
pub mod cash_register;
pub use cash_register::{
    CashClosing, CashClosingDetail, CashClosingFilter, CashClosingList, CashClosingStatus,
    reconcile, CashClosingView, CloseCashRegisterRequest, KindTotals, OpenCashRegisterRequest,
};

// Modèle: lab.rs
pub mod lab;
pub use lab::{
    CreateLabJobRequest, LabJob, LabJobDetail, LabJobEvent, LabJobFilter, LabJobKind,
    LabJobStatus, LabJobStatusRequest, LabJobSummary, Laboratory, LaboratoryRequest,
    UpdateLabJobRequest,
};

// Modèle: report.rs
pub mod report;
pub use report::{
    DailyAmount, DailyCount, DashboardReport, KindBreakdown, PaymentsByKindReport,
    ProfessionalBreakdown, ReportQuery, StatusBreakdown, TreatmentReport,
};

use serde::{Deserialize, Serialize};

/// Réponse de succès standard
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessResponse<T> {
    pub success: bool,
    pub data: T,
    pub message: Option<String>,
}

impl<T> SuccessResponse<T> {
    pub fn new(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
        }
    }

    pub fn with_message(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            data,
            message: Some(message.into()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_json_diff::assert_json_include;

    #[test]
    fn test_success_response_shape() {
        let json = serde_json::to_value(SuccessResponse::with_message(vec![1, 2], "ok")).unwrap();
        assert_json_include!(
            actual: json,
            expected: serde_json::json!({ "success": true, "data": [1, 2], "message": "ok" })
        );

        let json = serde_json::to_value(SuccessResponse::new("x")).unwrap();
        assert!(json["message"].is_null());
    }
}
