//! Gateway to the clinic backend.
//!
//! Views talk to the backend exclusively through the [`Gateway`] trait,
//! grouped the same way the backend groups its routes: auth, users,
//! appointments and clinics. [`HttpGateway`] is the real implementation.

use crate::models::{
    Appointment, AppointmentUpdate, AuthResponse, Clinic, ClinicForm, Credentials,
    NewAppointment, Registration, User, UserUpdate,
};
use thiserror::Error;

pub mod http;
#[cfg(test)]
pub mod mock;

pub use http::HttpGateway;

/// Failure of a single backend call.
#[derive(Error, Debug)]
pub enum ApiError {
    /// The backend answered with a non-success status. `message` is the
    /// backend's own `message` field when it sent one.
    #[error("{message}")]
    Status { status: u16, message: String },

    #[error("Network error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("Malformed response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("Invalid API URL {url}: {reason}")]
    InvalidBaseUrl { url: String, reason: String },
}

/// Every backend operation the client uses.
///
/// Mutations return `()` because callers always re-fetch afterwards rather
/// than merging the response into local state.
pub trait Gateway {
    // auth
    fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError>;
    fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError>;

    // users
    fn list_users(&self) -> Result<Vec<User>, ApiError>;
    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<(), ApiError>;
    fn delete_user(&self, id: i64) -> Result<(), ApiError>;

    // appointments
    fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError>;
    fn create_appointment(&self, booking: &NewAppointment) -> Result<(), ApiError>;
    fn update_appointment(&self, id: i64, update: &AppointmentUpdate) -> Result<(), ApiError>;
    fn delete_appointment(&self, id: i64) -> Result<(), ApiError>;

    // clinics
    fn list_clinics(&self) -> Result<Vec<Clinic>, ApiError>;
    fn create_clinic(&self, clinic: &ClinicForm) -> Result<(), ApiError>;
    fn update_clinic(&self, id: i64, clinic: &ClinicForm) -> Result<(), ApiError>;
    fn delete_clinic(&self, id: i64) -> Result<(), ApiError>;
    fn add_doctor(&self, clinic_id: i64, doctor_id: i64) -> Result<(), ApiError>;
    fn remove_doctor(&self, clinic_id: i64, doctor_id: i64) -> Result<(), ApiError>;
}
