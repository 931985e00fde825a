use super::{ApiError, Gateway};
use crate::models::{
    Appointment, AppointmentUpdate, AuthResponse, Clinic, ClinicForm, Credentials,
    NewAppointment, Registration, User, UserUpdate,
};
use crate::storage::Storage;
use reqwest::blocking::{Client, RequestBuilder};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

/// Blocking HTTP client for the clinic backend.
///
/// The bearer token is read from local storage on every request, so a login
/// or logout takes effect on the next call without rebuilding the gateway.
pub struct HttpGateway {
    base_url: String,
    client: Client,
    storage: Storage,
}

impl HttpGateway {
    /// Creates a gateway for the backend at `base_url`.
    pub fn new(base_url: &str, storage: Storage) -> Result<Self, ApiError> {
        Url::parse(base_url).map_err(|e| ApiError::InvalidBaseUrl {
            url: base_url.to_string(),
            reason: e.to_string(),
        })?;
        let client = Client::builder().build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client,
            storage,
        })
    }

    fn url(&self, endpoint: &str) -> String {
        format!("{}{}", self.base_url, endpoint)
    }

    fn builder(&self, method: Method, endpoint: &str) -> RequestBuilder {
        let mut builder = self
            .client
            .request(method, self.url(endpoint))
            .header(CONTENT_TYPE, "application/json");

        match self.storage.token() {
            Ok(Some(token)) => builder = builder.bearer_auth(token),
            Ok(None) => {}
            Err(e) => warn!(error = %e, "could not read token from local storage"),
        }
        builder
    }

    fn get<T: DeserializeOwned>(&self, endpoint: &str) -> Result<T, ApiError> {
        self.execute(Method::GET, endpoint, self.builder(Method::GET, endpoint))
    }

    fn send<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let builder = self.builder(method.clone(), endpoint).json(body);
        self.execute(method, endpoint, builder)
    }

    fn delete(&self, endpoint: &str) -> Result<(), ApiError> {
        self.execute::<Value>(Method::DELETE, endpoint, self.builder(Method::DELETE, endpoint))?;
        Ok(())
    }

    fn execute<T: DeserializeOwned>(
        &self,
        method: Method,
        endpoint: &str,
        builder: RequestBuilder,
    ) -> Result<T, ApiError> {
        debug!(%method, endpoint, "backend request");
        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;

        if !status.is_success() {
            let message = error_message(status, &body);
            warn!(%method, endpoint, status = status.as_u16(), %message, "backend call failed");
            return Err(ApiError::Status {
                status: status.as_u16(),
                message,
            });
        }

        decode(&body)
    }
}

/// The message to surface for a failed call: the backend's `message` field
/// when present, otherwise a generic line naming the status.
fn error_message(status: StatusCode, body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(Value::as_str).map(str::to_owned))
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| format!("API call failed with status {}", status.as_u16()))
}

/// Decodes a success body. An empty body (e.g. `204 No Content`) is `null`.
fn decode<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    if body.trim().is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_str(body)?)
}

impl Gateway for HttpGateway {
    fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.send(Method::POST, "/login", credentials)
    }

    fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.send(Method::POST, "/register", registration)
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        // the backend answers `null` instead of `[]` on an empty table
        Ok(self.get::<Option<Vec<User>>>("/users")?.unwrap_or_default())
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<(), ApiError> {
        self.send::<_, Value>(Method::PUT, &format!("/users/{id}"), update)?;
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/users/{id}"))
    }

    fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        Ok(self
            .get::<Option<Vec<Appointment>>>("/appointments")?
            .unwrap_or_default())
    }

    fn create_appointment(&self, booking: &NewAppointment) -> Result<(), ApiError> {
        self.send::<_, Value>(Method::POST, "/appointments", booking)?;
        Ok(())
    }

    fn update_appointment(&self, id: i64, update: &AppointmentUpdate) -> Result<(), ApiError> {
        self.send::<_, Value>(Method::PUT, &format!("/appointments/{id}"), update)?;
        Ok(())
    }

    fn delete_appointment(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/appointments/{id}"))
    }

    fn list_clinics(&self) -> Result<Vec<Clinic>, ApiError> {
        Ok(self.get::<Option<Vec<Clinic>>>("/clinics")?.unwrap_or_default())
    }

    fn create_clinic(&self, clinic: &ClinicForm) -> Result<(), ApiError> {
        self.send::<_, Value>(Method::POST, "/clinics", clinic)?;
        Ok(())
    }

    fn update_clinic(&self, id: i64, clinic: &ClinicForm) -> Result<(), ApiError> {
        self.send::<_, Value>(Method::PUT, &format!("/clinics/{id}"), clinic)?;
        Ok(())
    }

    fn delete_clinic(&self, id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/clinics/{id}"))
    }

    fn add_doctor(&self, clinic_id: i64, doctor_id: i64) -> Result<(), ApiError> {
        let endpoint = format!("/clinics/{clinic_id}/doctors/{doctor_id}");
        self.execute::<Value>(Method::POST, &endpoint, self.builder(Method::POST, &endpoint))?;
        Ok(())
    }

    fn remove_doctor(&self, clinic_id: i64, doctor_id: i64) -> Result<(), ApiError> {
        self.delete(&format!("/clinics/{clinic_id}/doctors/{doctor_id}"))
    }
}
