//! What each role may see and do.
//!
//! Every permission decision in the client is answered here, keyed by
//! [`Role`], so screens and views never branch on roles themselves.

use crate::app::SelectedApp;
use crate::models::{Appointment, AppointmentStatus, Identity, Role, User};

/// Which appointments a role gets to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppointmentScope {
    /// Rows where the caller is the patient.
    AsPatient,
    /// Rows where the caller is the doctor.
    AsDoctor,
    /// Every row the backend returns.
    Everything,
}

impl AppointmentScope {
    pub fn admits(&self, identity: &Identity, appointment: &Appointment) -> bool {
        match self {
            AppointmentScope::AsPatient => appointment.patient_id == identity.id,
            AppointmentScope::AsDoctor => appointment.doctor_id == identity.id,
            AppointmentScope::Everything => true,
        }
    }
}

/// Which user rows a role gets to see in the user directory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserScope {
    /// Only accounts with the patient role.
    PatientsOnly,
    /// Every account.
    Everyone,
}

impl UserScope {
    pub fn admits(&self, user: &User) -> bool {
        match self {
            UserScope::PatientsOnly => user.role == Role::Patient,
            UserScope::Everyone => true,
        }
    }
}

/// One entry of the home screen menu.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MenuEntry {
    pub label: &'static str,
    pub target: SelectedApp,
}

const fn entry(label: &'static str, target: SelectedApp) -> MenuEntry {
    MenuEntry { label, target }
}

const PATIENT_MENU: &[MenuEntry] = &[
    entry("Find a Doctor", SelectedApp::Doctors),
    entry("My Appointments", SelectedApp::Appointments),
];

const DOCTOR_MENU: &[MenuEntry] = &[
    entry("Patient Appointments", SelectedApp::Appointments),
    entry("Patients", SelectedApp::Users),
    entry("Doctors", SelectedApp::Doctors),
];

const ADMIN_MENU: &[MenuEntry] = &[
    entry("Appointments", SelectedApp::Appointments),
    entry("Users", SelectedApp::Users),
    entry("Clinics", SelectedApp::Clinics),
    entry("Doctors", SelectedApp::Doctors),
];

const CLINIC_ADMIN_MENU: &[MenuEntry] = &[
    entry("Manage Appointments", SelectedApp::Appointments),
    entry("Manage Clinics", SelectedApp::Clinics),
    entry("Doctors", SelectedApp::Doctors),
];

impl Role {
    pub fn appointment_scope(&self) -> AppointmentScope {
        match self {
            Role::Patient => AppointmentScope::AsPatient,
            Role::Doctor => AppointmentScope::AsDoctor,
            Role::Admin | Role::ClinicAdmin => AppointmentScope::Everything,
        }
    }

    /// Status changes this role is offered for an appointment currently in
    /// `status`. Empty for terminal statuses.
    pub fn status_actions(&self, status: AppointmentStatus) -> &'static [AppointmentStatus] {
        if status.is_terminal() {
            return &[];
        }
        match self {
            Role::Doctor => &[AppointmentStatus::Completed, AppointmentStatus::Cancelled],
            Role::Patient => &[AppointmentStatus::Cancelled],
            Role::Admin | Role::ClinicAdmin => &[],
        }
    }

    pub fn can_book(&self) -> bool {
        matches!(self, Role::Patient)
    }

    /// `None` means the user directory is off limits.
    pub fn user_scope(&self) -> Option<UserScope> {
        match self {
            Role::Admin => Some(UserScope::Everyone),
            Role::Doctor => Some(UserScope::PatientsOnly),
            Role::Patient | Role::ClinicAdmin => None,
        }
    }

    /// Deleting accounts and changing roles.
    pub fn can_manage_users(&self) -> bool {
        matches!(self, Role::Admin)
    }

    pub fn can_manage_clinics(&self) -> bool {
        matches!(self, Role::Admin | Role::ClinicAdmin)
    }

    pub fn menu(&self) -> &'static [MenuEntry] {
        match self {
            Role::Patient => PATIENT_MENU,
            Role::Doctor => DOCTOR_MENU,
            Role::Admin => ADMIN_MENU,
            Role::ClinicAdmin => CLINIC_ADMIN_MENU,
        }
    }

    pub fn dashboard_subtitle(&self) -> &'static str {
        match self {
            Role::Admin => "System Overview",
            Role::Doctor => "Your Medical Practice",
            Role::Patient => "Your Health Dashboard",
            Role::ClinicAdmin => "Clinic Administration",
        }
    }

    /// Title of the appointment screen.
    pub fn appointments_title(&self) -> &'static str {
        match self {
            Role::Doctor => "PATIENT APPOINTMENTS",
            Role::Patient => "YOUR APPOINTMENTS",
            Role::Admin | Role::ClinicAdmin => "ALL APPOINTMENTS",
        }
    }

    /// Shown when the role's appointment list is empty.
    pub fn empty_appointments_hint(&self) -> &'static str {
        match self {
            Role::Patient => "You haven't booked any appointments yet.",
            Role::Doctor => "No appointments scheduled for you yet.",
            Role::Admin | Role::ClinicAdmin => "No appointments in the system.",
        }
    }

    /// Who the other party of an appointment is, from this role's side.
    pub fn counterpart(&self, appointment: &Appointment) -> String {
        match self {
            Role::Doctor => format!(
                "Patient: {}",
                appointment.patient_name.as_deref().unwrap_or("Unknown")
            ),
            _ => format!(
                "Dr. {}",
                appointment.doctor_name.as_deref().unwrap_or("Unknown")
            ),
        }
    }
}

/// Label of the button that moves an appointment to `target`.
pub fn action_label(role: Role, target: AppointmentStatus) -> &'static str {
    match (role, target) {
        (_, AppointmentStatus::Completed) => "Mark Completed",
        (Role::Patient, AppointmentStatus::Cancelled) => "Cancel Appointment",
        (_, AppointmentStatus::Cancelled) => "Cancel",
        (_, AppointmentStatus::Scheduled) => "Reschedule",
    }
}
