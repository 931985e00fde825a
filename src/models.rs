//! Data models for Clinica.
//!
//! These mirror the JSON documents exchanged with the clinic backend. Names
//! carried on an [`Appointment`] are denormalized copies supplied by the
//! backend and are displayed as-is.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The role attached to every account.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Books appointments and manages their own bookings.
    Patient,
    /// Sees and resolves appointments assigned to them.
    Doctor,
    /// Full system overview.
    Admin,
    /// Manages clinics and their doctors.
    ClinicAdmin,
}

impl Role {
    /// Every role, in the order the registration form offers them.
    pub const ALL: [Role; 4] = [Role::Patient, Role::Doctor, Role::Admin, Role::ClinicAdmin];

    /// The wire name of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Patient => "patient",
            Role::Doctor => "doctor",
            Role::Admin => "admin",
            Role::ClinicAdmin => "clinic_admin",
        }
    }

    /// Human readable label.
    pub fn label(&self) -> &'static str {
        match self {
            Role::Patient => "Patient",
            Role::Doctor => "Doctor",
            Role::Admin => "Admin",
            Role::ClinicAdmin => "Clinic Admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A user account as returned by `/users`, `/login` and `/register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub role: Role,
}

/// The authenticated caller. Lives in the session for as long as the user
/// is logged in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub token: String,
}

impl Identity {
    /// Builds an identity from the backend's user record and bearer token.
    pub fn new(user: User, token: String) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            role: user.role,
            token,
        }
    }
}

/// Lifecycle of an appointment. `Completed` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }

    /// Whether the status can no longer change.
    pub fn is_terminal(&self) -> bool {
        !matches!(self, AppointmentStatus::Scheduled)
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An appointment between a patient and a doctor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    #[serde(default)]
    pub clinic_id: Option<i64>,
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM` or `HH:MM:SS`
    pub time: String,
    pub status: AppointmentStatus,
    #[serde(default)]
    pub notes: Option<String>,
    #[serde(default)]
    pub patient_name: Option<String>,
    #[serde(default)]
    pub doctor_name: Option<String>,
    #[serde(default)]
    pub clinic_name: Option<String>,
}

fn doctor_role() -> Role {
    Role::Doctor
}

/// A doctor as embedded inside a [`Clinic`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    #[serde(default = "doctor_role")]
    pub role: Role,
}

/// A clinic and the doctors practising there, in backend order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Clinic {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub doctors: Vec<Doctor>,
}

/// Body of `POST /login`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

/// Body of `POST /register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub name: String,
    pub email: String,
    pub password: String,
    pub role: Role,
}

/// Response of `/login` and `/register`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct AuthResponse {
    pub user: User,
    pub token: String,
}

/// Body of `POST /appointments`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewAppointment {
    pub doctor_id: i64,
    pub clinic_id: i64,
    pub date: String,
    pub time: String,
    pub notes: String,
}

/// Body of `PUT /appointments/:id` as sent by the status actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AppointmentUpdate {
    pub status: AppointmentStatus,
}

/// Body of `PUT /users/:id`. Absent fields are left untouched.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct UserUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

/// Body of `POST /clinics` and `PUT /clinics/:id`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ClinicForm {
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
}
