use crate::api::Gateway;
use crate::error::ClientError;
use crate::models::{Clinic, Doctor, Identity, NewAppointment};
use tracing::info;

/// A doctor together with the clinic they were listed under. A doctor
/// working at two clinics appears twice.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryEntry {
    pub doctor: Doctor,
    pub clinic_id: i64,
    pub clinic_name: String,
}

/// Every doctor of every clinic, in clinic order then doctor order.
pub fn flatten(clinics: &[Clinic]) -> Vec<DirectoryEntry> {
    clinics
        .iter()
        .flat_map(|clinic| {
            clinic.doctors.iter().map(|doctor| DirectoryEntry {
                doctor: doctor.clone(),
                clinic_id: clinic.id,
                clinic_name: clinic.name.clone(),
            })
        })
        .collect()
}

/// Refuses anyone who is not a signed-in patient.
fn ensure_can_book(identity: Option<&Identity>) -> Result<&Identity, ClientError> {
    let identity =
        identity.ok_or_else(|| ClientError::forbidden("Please login to book an appointment"))?;
    if !identity.role.can_book() {
        return Err(ClientError::forbidden("Only patients can book appointments"));
    }
    Ok(identity)
}

/// The doctor directory with an optional clinic filter.
#[derive(Debug, Clone, Default)]
pub struct Directory {
    clinics: Vec<Clinic>,
    entries: Vec<DirectoryEntry>,
    clinic_filter: Option<i64>,
}

impl Directory {
    pub fn load(gateway: &dyn Gateway) -> Result<Self, ClientError> {
        let mut directory = Self::default();
        directory.refresh(gateway)?;
        Ok(directory)
    }

    pub fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), ClientError> {
        self.clinics = gateway.list_clinics()?;
        self.entries = flatten(&self.clinics);
        if let Some(id) = self.clinic_filter {
            if !self.clinics.iter().any(|c| c.id == id) {
                self.clinic_filter = None;
            }
        }
        Ok(())
    }

    pub fn clinics(&self) -> &[Clinic] {
        &self.clinics
    }

    pub fn clinic_filter(&self) -> Option<&Clinic> {
        self.clinic_filter
            .and_then(|id| self.clinics.iter().find(|c| c.id == id))
    }

    /// Narrows the list to one clinic, or clears the filter with `None`.
    pub fn set_clinic_filter(&mut self, clinic_id: Option<i64>) {
        self.clinic_filter = clinic_id.filter(|id| self.clinics.iter().any(|c| c.id == *id));
    }

    /// Steps the filter through "all clinics" and then each clinic in turn.
    pub fn cycle_clinic_filter(&mut self) {
        let next = match self.clinic_filter {
            None => self.clinics.first().map(|c| c.id),
            Some(current) => self
                .clinics
                .iter()
                .position(|c| c.id == current)
                .and_then(|i| self.clinics.get(i + 1))
                .map(|c| c.id),
        };
        self.set_clinic_filter(next);
    }

    /// Entries passing the current filter.
    pub fn visible(&self) -> Vec<&DirectoryEntry> {
        self.entries
            .iter()
            .filter(|e| self.clinic_filter.map_or(true, |id| e.clinic_id == id))
            .collect()
    }

    /// Opens the booking form for `entry`.
    ///
    /// Fails without touching the backend when the caller is not a signed-in
    /// patient or the clinic is no longer listed.
    pub fn open_booking(
        &self,
        identity: Option<&Identity>,
        entry: &DirectoryEntry,
    ) -> Result<BookingForm, ClientError> {
        ensure_can_book(identity)?;
        let clinic = self
            .clinics
            .iter()
            .find(|c| c.id == entry.clinic_id)
            .ok_or_else(|| ClientError::validation("Clinic not found"))?;

        Ok(BookingForm {
            doctor_id: entry.doctor.id,
            doctor_name: entry.doctor.name.clone(),
            clinic_id: clinic.id,
            clinic_name: clinic.name.clone(),
            ..Default::default()
        })
    }
}

/// A booking in progress.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingForm {
    pub doctor_id: i64,
    pub doctor_name: String,
    pub clinic_id: i64,
    pub clinic_name: String,
    pub date: String,
    pub time: String,
    pub notes: String,
}

impl BookingForm {
    /// Posts the booking.
    ///
    /// The caller is checked again here, so a form can never be submitted by
    /// anyone but a signed-in patient.
    pub fn submit(
        &self,
        gateway: &dyn Gateway,
        identity: Option<&Identity>,
    ) -> Result<(), ClientError> {
        let patient = ensure_can_book(identity)?;
        if self.date.trim().is_empty() {
            return Err(ClientError::validation("Date is required"));
        }
        if self.time.trim().is_empty() {
            return Err(ClientError::validation("Time is required"));
        }

        gateway.create_appointment(&NewAppointment {
            doctor_id: self.doctor_id,
            clinic_id: self.clinic_id,
            date: self.date.trim().to_string(),
            time: self.time.trim().to_string(),
            notes: self.notes.clone(),
        })?;
        info!(
            patient_id = patient.id,
            doctor_id = self.doctor_id,
            clinic_id = self.clinic_id,
            "appointment booked"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{user, MockGateway};
    use crate::models::Role;

    fn doctor(id: i64, name: &str) -> Doctor {
        Doctor {
            id,
            name: name.to_string(),
            role: Role::Doctor,
        }
    }

    fn clinics() -> Vec<Clinic> {
        vec![
            Clinic {
                id: 1,
                name: "Central".into(),
                location: Some("Main St".into()),
                doctors: vec![doctor(7, "Grace Hopper"), doctor(8, "Alan Turing")],
            },
            Clinic {
                id: 2,
                name: "Northside".into(),
                location: None,
                doctors: vec![doctor(7, "Grace Hopper")],
            },
        ]
    }

    fn identity(id: i64, role: Role) -> Identity {
        Identity::new(user(id, "Caller", role), "tok".to_string())
    }

    fn filled(mut form: BookingForm) -> BookingForm {
        form.date = "2025-04-01".into();
        form.time = "10:30".into();
        form.notes = "Follow-up".into();
        form
    }

    #[test]
    fn flattening_keeps_clinic_then_doctor_order() {
        let entries = flatten(&clinics());
        let pairs: Vec<(i64, i64)> = entries.iter().map(|e| (e.clinic_id, e.doctor.id)).collect();
        assert_eq!(pairs, vec![(1, 7), (1, 8), (2, 7)]);
        assert_eq!(entries[2].clinic_name, "Northside");
    }

    #[test]
    fn clinic_filter_narrows_and_cycles() {
        let gateway = MockGateway::new().with_clinics(clinics());
        let mut directory = Directory::load(&gateway).unwrap();
        assert_eq!(directory.visible().len(), 3);

        directory.set_clinic_filter(Some(2));
        assert_eq!(directory.visible().len(), 1);

        directory.cycle_clinic_filter();
        assert!(directory.clinic_filter().is_none());
        directory.cycle_clinic_filter();
        assert_eq!(directory.clinic_filter().map(|c| c.id), Some(1));

        directory.set_clinic_filter(Some(42));
        assert!(directory.clinic_filter().is_none());
    }

    #[test]
    fn anonymous_booking_is_blocked_without_a_request() {
        let gateway = MockGateway::new().with_clinics(clinics());
        let directory = Directory::load(&gateway).unwrap();
        let entry = directory.visible()[0].clone();

        let err = directory.open_booking(None, &entry).unwrap_err();
        assert_eq!(err.to_string(), "Please login to book an appointment");

        let err = filled(BookingForm::default()).submit(&gateway, None).unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
        assert_eq!(gateway.calls_to("create_appointment"), 0);
    }

    #[test]
    fn non_patients_never_create_appointments() {
        let gateway = MockGateway::new().with_clinics(clinics());
        let directory = Directory::load(&gateway).unwrap();
        let entry = directory.visible()[0].clone();

        for role in [Role::Doctor, Role::Admin, Role::ClinicAdmin] {
            let caller = identity(3, role);
            let err = directory.open_booking(Some(&caller), &entry).unwrap_err();
            assert_eq!(err.to_string(), "Only patients can book appointments");

            let form = filled(BookingForm {
                doctor_id: 7,
                clinic_id: 1,
                ..Default::default()
            });
            assert!(form.submit(&gateway, Some(&caller)).is_err());
        }
        assert_eq!(gateway.calls_to("create_appointment"), 0);
    }

    #[test]
    fn patient_books_with_the_listed_clinic() {
        let gateway = MockGateway::new().with_clinics(clinics());
        let directory = Directory::load(&gateway).unwrap();
        let entry = directory.visible()[2].clone();
        let patient = identity(5, Role::Patient);

        let form = directory.open_booking(Some(&patient), &entry).unwrap();
        assert_eq!((form.doctor_id, form.clinic_id), (7, 2));

        filled(form).submit(&gateway, Some(&patient)).unwrap();
        let booked = gateway.appointments.borrow();
        assert_eq!(booked.len(), 1);
        assert_eq!(booked[0].clinic_id, Some(2));
        assert_eq!(booked[0].date, "2025-04-01");
    }

    #[test]
    fn missing_date_is_caught_before_the_request() {
        let gateway = MockGateway::new();
        let form = BookingForm {
            time: "10:30".into(),
            ..Default::default()
        };
        let err = form
            .submit(&gateway, Some(&identity(5, Role::Patient)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Date is required");
        assert_eq!(gateway.total_calls(), 0);
    }

    #[test]
    fn backend_refusal_is_passed_through() {
        let gateway = MockGateway::new();
        gateway.fail_with(409, "Doctor is not available at that time");
        let form = filled(BookingForm::default());

        let err = form
            .submit(&gateway, Some(&identity(5, Role::Patient)))
            .unwrap_err();
        assert_eq!(err.to_string(), "Doctor is not available at that time");
    }
}
