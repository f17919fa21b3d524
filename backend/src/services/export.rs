// services/export.rs
use chrono::NaiveDate;
use rust_decimal::prelude::ToPrimitive;
use rust_xlsxwriter::{Color, Format, FormatAlign, Workbook, Worksheet};

use crate::models::{PatientView, PaymentDetail};
use crate::utils::error::Result;
use crate::utils::helpers::format_date;

pub const XLSX_CONTENT_TYPE: &str =
    "application/vnd.openxmlformats-officedocument.spreadsheetml.sheet";

const HEADER_COLOR: u32 = 0x1A5276;

const PAYMENT_HEADERS: [&str; 9] = [
    "ID",
    "Fecha",
    "Paciente",
    "Tratamiento",
    "Monto",
    "Método de Pago",
    "Estado",
    "Comprobante",
    "Notas",
];

const PATIENT_HEADERS: [&str; 10] = [
    "ID",
    "Nombres",
    "Apellidos",
    "Documento",
    "Fecha de Nacimiento",
    "Edad",
    "Teléfono",
    "Email",
    "Comuna",
    "Ciudad",
];

/// Génération des classeurs Excel téléchargeables
pub struct ExportService;

impl ExportService {
    /// Classeur des paiements, une ligne par paiement
    pub fn payments_workbook(payments: &[PaymentDetail]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Pagos")?;
        write_headers(sheet, &PAYMENT_HEADERS)?;

        for (index, detail) in payments.iter().enumerate() {
            let row = index as u32 + 1;
            let payment = &detail.payment;
            sheet.write_string(row, 0, payment.id.to_string())?;
            sheet.write_string(row, 1, payment.paid_at.format("%d/%m/%Y %H:%M").to_string())?;
            sheet.write_string(row, 2, &detail.patient_name)?;
            sheet.write_string(row, 3, detail.treatment_status.label())?;
            sheet.write_number(row, 4, payment.amount.to_f64().unwrap_or_default())?;
            sheet.write_string(row, 5, &detail.payment_method_name)?;
            sheet.write_string(row, 6, payment.status.label())?;
            sheet.write_string(row, 7, payment.receipt_number.as_deref().unwrap_or(""))?;
            sheet.write_string(row, 8, payment.notes.as_deref().unwrap_or(""))?;
        }

        sheet.autofit();
        Ok(workbook.save_to_buffer()?)
    }

    /// Classeur des patients de l'entreprise
    pub fn patients_workbook(patients: &[PatientView]) -> Result<Vec<u8>> {
        let mut workbook = Workbook::new();
        let sheet = workbook.add_worksheet();
        sheet.set_name("Pacientes")?;
        write_headers(sheet, &PATIENT_HEADERS)?;

        for (index, view) in patients.iter().enumerate() {
            let row = index as u32 + 1;
            let patient = &view.patient;
            sheet.write_string(row, 0, patient.id.to_string())?;
            sheet.write_string(row, 1, &patient.first_name)?;
            sheet.write_string(row, 2, &patient.last_name)?;
            sheet.write_string(row, 3, patient.document.as_deref().unwrap_or(""))?;
            sheet.write_string(row, 4, optional_date(patient.birth_date))?;
            if let Some(age) = view.age {
                sheet.write_number(row, 5, f64::from(age))?;
            }
            sheet.write_string(row, 6, patient.phone.as_deref().unwrap_or(""))?;
            sheet.write_string(row, 7, patient.email.as_deref().unwrap_or(""))?;
            sheet.write_string(row, 8, patient.commune.as_deref().unwrap_or(""))?;
            sheet.write_string(row, 9, patient.city.as_deref().unwrap_or(""))?;
        }

        sheet.autofit();
        Ok(workbook.save_to_buffer()?)
    }
}

fn write_headers(sheet: &mut Worksheet, headers: &[&str]) -> Result<()> {
    let format = Format::new()
        .set_bold()
        .set_font_color(Color::White)
        .set_background_color(Color::RGB(HEADER_COLOR))
        .set_align(FormatAlign::Center);

    for (col, header) in headers.iter().enumerate() {
        sheet.write_string_with_format(0, col as u16, *header, &format)?;
    }
    Ok(())
}

fn optional_date(date: Option<NaiveDate>) -> String {
    date.map(format_date).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Patient, Payment, PaymentMethodKind, PaymentStatus, TreatmentStatus};
    use chrono::Utc;
    use rust_decimal::Decimal;
    use uuid::Uuid;

    fn patient() -> Patient {
        Patient {
            id: Uuid::new_v4(),
            company_id: Uuid::new_v4(),
            first_name: "JUAN".into(),
            last_name: "PÉREZ SOTO".into(),
            document: Some("12.345.678-5".into()),
            gender: None,
            birth_date: NaiveDate::from_ymd_opt(1990, 5, 17),
            phone: Some("+56912345678".into()),
            email: None,
            address: None,
            commune: Some("ÑUÑOA".into()),
            city: Some("SANTIAGO".into()),
            insurer_id: None,
            is_active: true,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn payment_detail() -> PaymentDetail {
        PaymentDetail {
            payment: Payment {
                id: Uuid::new_v4(),
                company_id: Uuid::new_v4(),
                treatment_id: Uuid::new_v4(),
                payment_method_id: Uuid::new_v4(),
                amount: Decimal::new(4500050, 2),
                paid_at: Utc::now(),
                receipt_number: Some("B-1001".into()),
                status: PaymentStatus::Completed,
                notes: None,
                created_by: None,
                created_at: Utc::now(),
                updated_at: Utc::now(),
            },
            patient_id: Uuid::new_v4(),
            patient_name: "JUAN PÉREZ SOTO".into(),
            treatment_status: TreatmentStatus::InProgress,
            payment_method_name: "EFECTIVO".into(),
            payment_method_kind: PaymentMethodKind::Cash,
        }
    }

    fn is_zip(bytes: &[u8]) -> bool {
        bytes.starts_with(b"PK")
    }

    #[test]
    fn test_payments_workbook_is_xlsx() {
        let bytes = ExportService::payments_workbook(&[payment_detail(), payment_detail()]).unwrap();
        assert!(is_zip(&bytes));
    }

    #[test]
    fn test_empty_exports_still_produce_a_sheet() {
        assert!(is_zip(&ExportService::payments_workbook(&[]).unwrap()));
        assert!(is_zip(&ExportService::patients_workbook(&[]).unwrap()));
    }

    #[test]
    fn test_patients_workbook() {
        let today = NaiveDate::from_ymd_opt(2025, 6, 1).unwrap();
        let views = vec![PatientView::new(patient(), today)];
        let bytes = ExportService::patients_workbook(&views).unwrap();
        assert!(is_zip(&bytes));
    }

    #[test]
    fn test_optional_date() {
        assert_eq!(optional_date(None), "");
        assert_eq!(optional_date(NaiveDate::from_ymd_opt(2024, 1, 9)), "09/01/2024");
    }
}
