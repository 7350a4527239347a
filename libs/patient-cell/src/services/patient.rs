use std::sync::LazyLock;

use chrono::{Local, NaiveDate};
use regex::Regex;
use tracing::{debug, info, warn};
use uuid::Uuid;

use shared_models::auth::User;
use shared_utils::validation::{is_valid_email, missing_fields_message, normalize_email, required};

use crate::models::{CreatePatientRequest, NewPatient, Patient, PatientError, UpdatePatientRequest};
use crate::services::store::PatientStore;

static CPF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3})\.?(\d{3})\.?(\d{3})-?(\d{2})$").expect("static regex")
});

/// Canonical `000.000.000-00` form, or `None` if `raw` is not CPF-shaped.
pub fn normalize_cpf(raw: &str) -> Option<String> {
    CPF.captures(raw.trim())
        .map(|c| format!("{}.{}.{}-{}", &c[1], &c[2], &c[3], &c[4]))
}

pub async fn list_patients(
    store: &dyn PatientStore,
    search: Option<&str>,
) -> Result<Vec<Patient>, PatientError> {
    match search.map(str::trim).filter(|term| !term.is_empty()) {
        Some(term) => Ok(store.search(term).await?),
        None => Ok(store.list().await?),
    }
}

pub async fn get_patient(store: &dyn PatientStore, id: Uuid) -> Result<Patient, PatientError> {
    debug!("Fetching patient {}", id);
    store.find_by_id(id).await?.ok_or(PatientError::NotFound)
}

pub async fn create_patient(
    store: &dyn PatientStore,
    request: CreatePatientRequest,
    user: &User,
) -> Result<Patient, PatientError> {
    let new_patient = validate_new_patient(request, Local::now().date_naive())?;

    let patient = store.insert(new_patient).await.map_err(|e| {
        warn!("Failed to create patient: {}", e);
        PatientError::from(e)
    })?;

    info!("Patient {} created by {}", patient.id, user.actor());
    Ok(patient)
}

pub async fn update_patient(
    store: &dyn PatientStore,
    id: Uuid,
    mut request: UpdatePatientRequest,
    user: &User,
) -> Result<Patient, PatientError> {
    let current = get_patient(store, id).await?;

    normalize_update(&mut request, Local::now().date_naive())?;
    if request.is_empty() {
        return Ok(current);
    }

    let patient = store.update(id, request).await?.ok_or(PatientError::NotFound)?;

    info!("Patient {} updated by {}", id, user.actor());
    Ok(patient)
}

pub async fn delete_patient(store: &dyn PatientStore, id: Uuid, user: &User) -> Result<(), PatientError> {
    store.delete(id).await?.ok_or(PatientError::NotFound)?;
    info!("Patient {} deleted by {}", id, user.actor());
    Ok(())
}

fn validate_new_patient(request: CreatePatientRequest, today: NaiveDate) -> Result<NewPatient, PatientError> {
    let fields = (
        required(request.name),
        request.birth_date,
        required(request.national_id),
        required(request.email),
        required(request.phone),
        required(request.address),
    );

    let (name, birth_date, national_id, email, phone, address) = match fields {
        (Some(name), Some(birth_date), Some(national_id), Some(email), Some(phone), Some(address)) => {
            (name, birth_date, national_id, email, phone, address)
        }
        (name, birth_date, national_id, email, phone, address) => {
            let message = missing_fields_message(&[
                ("name", name.is_some()),
                ("birth_date", birth_date.is_some()),
                ("national_id", national_id.is_some()),
                ("email", email.is_some()),
                ("phone", phone.is_some()),
                ("address", address.is_some()),
            ]);
            return Err(PatientError::Validation(message.unwrap_or_default()));
        }
    };

    Ok(NewPatient {
        name,
        birth_date: check_birth_date(birth_date, today)?,
        national_id: check_cpf(&national_id)?,
        email: check_email(email)?,
        phone,
        address,
    })
}

fn normalize_update(request: &mut UpdatePatientRequest, today: NaiveDate) -> Result<(), PatientError> {
    for (field, value) in [
        ("name", &mut request.name),
        ("national_id", &mut request.national_id),
        ("email", &mut request.email),
        ("phone", &mut request.phone),
        ("address", &mut request.address),
    ] {
        if let Some(raw) = value.take() {
            let trimmed = required(Some(raw))
                .ok_or_else(|| PatientError::Validation(format!("{} cannot be empty", field)))?;
            *value = Some(trimmed);
        }
    }

    if let Some(national_id) = request.national_id.take() {
        request.national_id = Some(check_cpf(&national_id)?);
    }
    if let Some(email) = request.email.take() {
        request.email = Some(check_email(email)?);
    }
    if let Some(birth_date) = request.birth_date {
        check_birth_date(birth_date, today)?;
    }

    Ok(())
}

fn check_cpf(raw: &str) -> Result<String, PatientError> {
    normalize_cpf(raw).ok_or_else(|| PatientError::Validation(format!("Invalid CPF: {}", raw)))
}

fn check_email(email: String) -> Result<String, PatientError> {
    if is_valid_email(&email) {
        Ok(normalize_email(&email))
    } else {
        Err(PatientError::Validation(format!("Invalid email: {}", email)))
    }
}

fn check_birth_date(birth_date: NaiveDate, today: NaiveDate) -> Result<NaiveDate, PatientError> {
    if birth_date > today {
        return Err(PatientError::Validation("birth_date cannot be in the future".to_string()));
    }
    Ok(birth_date)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, 3).unwrap()
    }

    fn request() -> CreatePatientRequest {
        CreatePatientRequest {
            name: Some("Carlos Lima".into()),
            birth_date: NaiveDate::from_ymd_opt(1985, 4, 12),
            national_id: Some("52998224725".into()),
            email: Some("carlos@mail.com".into()),
            phone: Some("11977776666".into()),
            address: Some("Rua das Flores, 100".into()),
        }
    }

    #[test]
    fn cpf_punctuation_is_optional() {
        assert_eq!(normalize_cpf("52998224725").as_deref(), Some("529.982.247-25"));
        assert_eq!(normalize_cpf("529.982.247-25").as_deref(), Some("529.982.247-25"));
        assert_eq!(normalize_cpf("5299822472"), None);
        assert_eq!(normalize_cpf("529-982-247.25"), None);
    }

    #[test]
    fn stores_canonical_cpf() {
        let patient = validate_new_patient(request(), today()).unwrap();
        assert_eq!(patient.national_id, "529.982.247-25");
    }

    #[test]
    fn future_birth_date_is_rejected() {
        let future = CreatePatientRequest {
            birth_date: NaiveDate::from_ymd_opt(2030, 1, 1),
            ..request()
        };
        assert!(matches!(validate_new_patient(future, today()), Err(PatientError::Validation(_))));
    }

    #[test]
    fn missing_fields_are_listed() {
        let error = validate_new_patient(CreatePatientRequest::default(), today()).unwrap_err();
        assert_eq!(
            error.to_string(),
            "Missing required fields: name, birth_date, national_id, email, phone, address"
        );
    }

    #[test]
    fn update_rejects_blank_and_invalid_values() {
        let mut blank = UpdatePatientRequest { name: Some("  ".into()), ..Default::default() };
        assert!(normalize_update(&mut blank, today()).is_err());

        let mut bad_cpf = UpdatePatientRequest { national_id: Some("123".into()), ..Default::default() };
        assert!(normalize_update(&mut bad_cpf, today()).is_err());

        let mut ok = UpdatePatientRequest { national_id: Some("529.982.247-25".into()), ..Default::default() };
        normalize_update(&mut ok, today()).unwrap();
        assert_eq!(ok.national_id.as_deref(), Some("529.982.247-25"));
    }
}
