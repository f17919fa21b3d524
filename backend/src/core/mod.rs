// core/mod.rs
pub mod appointment_service;
pub mod cash_register_service;
pub mod catalog_service;
pub mod company_service;
pub mod lab_service;
pub mod patient_service;
pub mod payment_service;
pub mod professional_service;
pub mod report_service;
pub mod treatment_service;
pub mod user_service;

// Ré-exports pour faciliter l'import
pub use appointment_service::AppointmentService;
pub use cash_register_service::CashRegisterService;
pub use catalog_service::{CatalogService, SeedReport};
pub use company_service::CompanyService;
pub use lab_service::LabService;
pub use patient_service::PatientService;
pub use payment_service::PaymentService;
pub use professional_service::ProfessionalService;
pub use report_service::ReportService;
pub use treatment_service::TreatmentService;
pub use user_service::UserService;
