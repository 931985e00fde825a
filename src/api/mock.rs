//! In-memory [`Gateway`] used by the view tests.
//!
//! Holds a tiny fake backend: mutations are applied to the stored rows so a
//! re-fetch observes them, and every call is recorded by name.

use super::{ApiError, Gateway};
use crate::models::{
    Appointment, AppointmentStatus, AppointmentUpdate, AuthResponse, Clinic, ClinicForm,
    Credentials, Doctor, NewAppointment, Registration, Role, User, UserUpdate,
};
use std::cell::{Cell, RefCell};

#[derive(Default)]
pub struct MockGateway {
    pub appointments: RefCell<Vec<Appointment>>,
    pub clinics: RefCell<Vec<Clinic>>,
    pub users: RefCell<Vec<User>>,
    calls: RefCell<Vec<&'static str>>,
    failure: RefCell<Option<(u16, String)>>,
    next_id: Cell<i64>,
}

impl MockGateway {
    pub fn new() -> Self {
        Self {
            next_id: Cell::new(1000),
            ..Default::default()
        }
    }

    pub fn with_appointments(self, appointments: Vec<Appointment>) -> Self {
        *self.appointments.borrow_mut() = appointments;
        self
    }

    pub fn with_clinics(self, clinics: Vec<Clinic>) -> Self {
        *self.clinics.borrow_mut() = clinics;
        self
    }

    pub fn with_users(self, users: Vec<User>) -> Self {
        *self.users.borrow_mut() = users;
        self
    }

    /// Makes every following call fail with `status` and `message`.
    pub fn fail_with(&self, status: u16, message: &str) {
        *self.failure.borrow_mut() = Some((status, message.to_string()));
    }

    /// How many times the named operation was invoked.
    pub fn calls_to(&self, name: &str) -> usize {
        self.calls.borrow().iter().filter(|c| **c == name).count()
    }

    pub fn total_calls(&self) -> usize {
        self.calls.borrow().len()
    }

    fn record(&self, name: &'static str) -> Result<(), ApiError> {
        self.calls.borrow_mut().push(name);
        match self.failure.borrow().as_ref() {
            Some((status, message)) => Err(ApiError::Status {
                status: *status,
                message: message.clone(),
            }),
            None => Ok(()),
        }
    }

    fn allocate_id(&self) -> i64 {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        id
    }

    fn not_found(what: &str) -> ApiError {
        ApiError::Status {
            status: 404,
            message: format!("{what} not found"),
        }
    }
}

/// Appointment fixture with the fields the views care about.
pub fn appointment(
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    status: AppointmentStatus,
) -> Appointment {
    Appointment {
        id,
        patient_id,
        doctor_id,
        clinic_id: Some(1),
        date: "2025-03-05".to_string(),
        time: "09:00".to_string(),
        status,
        notes: None,
        patient_name: Some(format!("Patient {patient_id}")),
        doctor_name: Some(format!("Doctor {doctor_id}")),
        clinic_name: Some("Central".to_string()),
    }
}

pub fn user(id: i64, name: &str, role: Role) -> User {
    User {
        id,
        name: name.to_string(),
        email: format!("{}@clinic.test", name.to_lowercase().replace(' ', ".")),
        role,
    }
}

impl Gateway for MockGateway {
    fn login(&self, credentials: &Credentials) -> Result<AuthResponse, ApiError> {
        self.record("login")?;
        let user = self
            .users
            .borrow()
            .iter()
            .find(|u| u.email == credentials.email)
            .cloned()
            .ok_or(ApiError::Status {
                status: 401,
                message: "Invalid credentials".to_string(),
            })?;
        Ok(AuthResponse {
            token: format!("token-{}", user.id),
            user,
        })
    }

    fn register(&self, registration: &Registration) -> Result<AuthResponse, ApiError> {
        self.record("register")?;
        let user = User {
            id: self.allocate_id(),
            name: registration.name.clone(),
            email: registration.email.clone(),
            role: registration.role,
        };
        self.users.borrow_mut().push(user.clone());
        Ok(AuthResponse {
            token: format!("token-{}", user.id),
            user,
        })
    }

    fn list_users(&self) -> Result<Vec<User>, ApiError> {
        self.record("list_users")?;
        Ok(self.users.borrow().clone())
    }

    fn update_user(&self, id: i64, update: &UserUpdate) -> Result<(), ApiError> {
        self.record("update_user")?;
        let mut users = self.users.borrow_mut();
        let user = users
            .iter_mut()
            .find(|u| u.id == id)
            .ok_or_else(|| Self::not_found("User"))?;
        if let Some(name) = &update.name {
            user.name = name.clone();
        }
        if let Some(email) = &update.email {
            user.email = email.clone();
        }
        if let Some(role) = update.role {
            user.role = role;
        }
        Ok(())
    }

    fn delete_user(&self, id: i64) -> Result<(), ApiError> {
        self.record("delete_user")?;
        self.users.borrow_mut().retain(|u| u.id != id);
        Ok(())
    }

    fn list_appointments(&self) -> Result<Vec<Appointment>, ApiError> {
        self.record("list_appointments")?;
        Ok(self.appointments.borrow().clone())
    }

    fn create_appointment(&self, booking: &NewAppointment) -> Result<(), ApiError> {
        self.record("create_appointment")?;
        let id = self.allocate_id();
        self.appointments.borrow_mut().push(Appointment {
            id,
            patient_id: 0,
            doctor_id: booking.doctor_id,
            clinic_id: Some(booking.clinic_id),
            date: booking.date.clone(),
            time: booking.time.clone(),
            status: AppointmentStatus::Scheduled,
            notes: Some(booking.notes.clone()),
            patient_name: None,
            doctor_name: None,
            clinic_name: None,
        });
        Ok(())
    }

    fn update_appointment(&self, id: i64, update: &AppointmentUpdate) -> Result<(), ApiError> {
        self.record("update_appointment")?;
        let mut appointments = self.appointments.borrow_mut();
        let appt = appointments
            .iter_mut()
            .find(|a| a.id == id)
            .ok_or_else(|| Self::not_found("Appointment"))?;
        appt.status = update.status;
        Ok(())
    }

    fn delete_appointment(&self, id: i64) -> Result<(), ApiError> {
        self.record("delete_appointment")?;
        self.appointments.borrow_mut().retain(|a| a.id != id);
        Ok(())
    }

    fn list_clinics(&self) -> Result<Vec<Clinic>, ApiError> {
        self.record("list_clinics")?;
        Ok(self.clinics.borrow().clone())
    }

    fn create_clinic(&self, clinic: &ClinicForm) -> Result<(), ApiError> {
        self.record("create_clinic")?;
        let id = self.allocate_id();
        self.clinics.borrow_mut().push(Clinic {
            id,
            name: clinic.name.clone(),
            location: clinic.location.clone(),
            doctors: Vec::new(),
        });
        Ok(())
    }

    fn update_clinic(&self, id: i64, form: &ClinicForm) -> Result<(), ApiError> {
        self.record("update_clinic")?;
        let mut clinics = self.clinics.borrow_mut();
        let clinic = clinics
            .iter_mut()
            .find(|c| c.id == id)
            .ok_or_else(|| Self::not_found("Clinic"))?;
        clinic.name = form.name.clone();
        clinic.location = form.location.clone();
        Ok(())
    }

    fn delete_clinic(&self, id: i64) -> Result<(), ApiError> {
        self.record("delete_clinic")?;
        self.clinics.borrow_mut().retain(|c| c.id != id);
        Ok(())
    }

    fn add_doctor(&self, clinic_id: i64, doctor_id: i64) -> Result<(), ApiError> {
        self.record("add_doctor")?;
        let doctor = self
            .users
            .borrow()
            .iter()
            .find(|u| u.id == doctor_id)
            .map(|u| Doctor {
                id: u.id,
                name: u.name.clone(),
                role: u.role,
            })
            .ok_or_else(|| Self::not_found("Doctor"))?;
        let mut clinics = self.clinics.borrow_mut();
        let clinic = clinics
            .iter_mut()
            .find(|c| c.id == clinic_id)
            .ok_or_else(|| Self::not_found("Clinic"))?;
        clinic.doctors.push(doctor);
        Ok(())
    }

    fn remove_doctor(&self, clinic_id: i64, doctor_id: i64) -> Result<(), ApiError> {
        self.record("remove_doctor")?;
        let mut clinics = self.clinics.borrow_mut();
        let clinic = clinics
            .iter_mut()
            .find(|c| c.id == clinic_id)
            .ok_or_else(|| Self::not_found("Clinic"))?;
        clinic.doctors.retain(|d| d.id != doctor_id);
        Ok(())
    }
}
