use crate::api::Gateway;
use crate::error::ClientError;
use crate::models::{Clinic, ClinicForm, Doctor, Identity, Role};
use tracing::{info, warn};

/// Clinic management for admins and clinic admins.
#[derive(Debug, Clone)]
pub struct ClinicAdmin {
    clinics: Vec<Clinic>,
    doctors: Vec<Doctor>,
}

impl ClinicAdmin {
    pub fn load(gateway: &dyn Gateway, viewer: Option<&Identity>) -> Result<Self, ClientError> {
        let allowed = viewer.is_some_and(|v| v.role.can_manage_clinics());
        if !allowed {
            return Err(ClientError::forbidden(
                "Access denied: only administrators can manage clinics",
            ));
        }

        let mut admin = Self {
            clinics: Vec::new(),
            doctors: Vec::new(),
        };
        admin.refresh(gateway)?;
        Ok(admin)
    }

    /// Re-fetches clinics and the pool of doctors that can be attached.
    pub fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), ClientError> {
        self.clinics = gateway.list_clinics()?;
        self.doctors = self.doctor_pool(gateway);
        Ok(())
    }

    // Doctor accounts from the user list; when the backend does not let this
    // caller list users, fall back to doctors already attached somewhere.
    fn doctor_pool(&self, gateway: &dyn Gateway) -> Vec<Doctor> {
        match gateway.list_users() {
            Ok(users) => users
                .into_iter()
                .filter(|u| u.role == Role::Doctor)
                .map(|u| Doctor {
                    id: u.id,
                    name: u.name,
                    role: u.role,
                })
                .collect(),
            Err(e) => {
                warn!(error = %e, "user list unavailable, using doctors already attached to clinics");
                let mut pool: Vec<Doctor> = Vec::new();
                for doctor in self.clinics.iter().flat_map(|c| c.doctors.iter()) {
                    if !pool.iter().any(|d| d.id == doctor.id) {
                        pool.push(doctor.clone());
                    }
                }
                pool
            }
        }
    }

    pub fn clinics(&self) -> &[Clinic] {
        &self.clinics
    }

    /// Doctors from the pool not yet attached to `clinic_id`.
    pub fn attachable(&self, clinic_id: i64) -> Vec<&Doctor> {
        let Some(clinic) = self.clinics.iter().find(|c| c.id == clinic_id) else {
            return Vec::new();
        };
        self.doctors
            .iter()
            .filter(|d| !clinic.doctors.iter().any(|cd| cd.id == d.id))
            .collect()
    }

    fn check_form(form: &ClinicForm) -> Result<ClinicForm, ClientError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ClientError::validation("Clinic name is required"));
        }
        Ok(ClinicForm {
            name: name.to_string(),
            location: form
                .location
                .as_deref()
                .map(str::trim)
                .filter(|l| !l.is_empty())
                .map(str::to_string),
        })
    }

    pub fn create(&mut self, gateway: &dyn Gateway, form: &ClinicForm) -> Result<(), ClientError> {
        let form = Self::check_form(form)?;
        gateway.create_clinic(&form)?;
        info!(name = %form.name, "clinic created");
        self.refresh(gateway)
    }

    pub fn update(
        &mut self,
        gateway: &dyn Gateway,
        id: i64,
        form: &ClinicForm,
    ) -> Result<(), ClientError> {
        let form = Self::check_form(form)?;
        gateway.update_clinic(id, &form)?;
        info!(clinic_id = id, "clinic updated");
        self.refresh(gateway)
    }

    pub fn delete(&mut self, gateway: &dyn Gateway, id: i64) -> Result<(), ClientError> {
        gateway.delete_clinic(id)?;
        info!(clinic_id = id, "clinic deleted");
        self.refresh(gateway)
    }

    pub fn attach(
        &mut self,
        gateway: &dyn Gateway,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<(), ClientError> {
        let clinic = self
            .clinics
            .iter()
            .find(|c| c.id == clinic_id)
            .ok_or_else(|| ClientError::validation("Clinic not found"))?;
        if clinic.doctors.iter().any(|d| d.id == doctor_id) {
            return Err(ClientError::validation("Doctor already works at this clinic"));
        }

        gateway.add_doctor(clinic_id, doctor_id)?;
        info!(clinic_id, doctor_id, "doctor attached to clinic");
        self.refresh(gateway)
    }

    pub fn detach(
        &mut self,
        gateway: &dyn Gateway,
        clinic_id: i64,
        doctor_id: i64,
    ) -> Result<(), ClientError> {
        gateway.remove_doctor(clinic_id, doctor_id)?;
        info!(clinic_id, doctor_id, "doctor detached from clinic");
        self.refresh(gateway)
    }
}
