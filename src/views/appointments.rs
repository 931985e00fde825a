use crate::api::Gateway;
use crate::error::ClientError;
use crate::models::{Appointment, AppointmentStatus, AppointmentUpdate, Identity};
use crate::schedule;
use std::cmp::Reverse;
use tracing::info;

/// Counts shown above every appointment list.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AppointmentStats {
    pub total_appointments: usize,
    pub pending_appointments: usize,
}

/// Keeps only the rows `identity` is allowed to see.
pub fn visible_to(identity: &Identity, appointments: Vec<Appointment>) -> Vec<Appointment> {
    let scope = identity.role.appointment_scope();
    appointments
        .into_iter()
        .filter(|a| scope.admits(identity, a))
        .collect()
}

/// Orders by date and time, latest first. Rows with the same slot keep their
/// relative order; rows whose slot cannot be parsed go last.
pub fn sort_latest_first(appointments: &mut [Appointment]) {
    appointments.sort_by_cached_key(|a| Reverse(schedule::slot(&a.date, &a.time)));
}

/// The `limit` latest appointments.
pub fn recent(appointments: &[Appointment], limit: usize) -> Vec<Appointment> {
    let mut sorted = appointments.to_vec();
    sort_latest_first(&mut sorted);
    sorted.truncate(limit);
    sorted
}

pub fn stats(appointments: &[Appointment]) -> AppointmentStats {
    AppointmentStats {
        total_appointments: appointments.len(),
        pending_appointments: appointments
            .iter()
            .filter(|a| a.status == AppointmentStatus::Scheduled)
            .count(),
    }
}

/// The appointments one caller may see, latest first.
#[derive(Debug, Clone)]
pub struct AppointmentView {
    viewer: Identity,
    appointments: Vec<Appointment>,
}

impl AppointmentView {
    /// Fetches every appointment and keeps the caller's share.
    pub fn load(gateway: &dyn Gateway, viewer: &Identity) -> Result<Self, ClientError> {
        let mut view = Self {
            viewer: viewer.clone(),
            appointments: Vec::new(),
        };
        view.refresh(gateway)?;
        Ok(view)
    }

    pub fn refresh(&mut self, gateway: &dyn Gateway) -> Result<(), ClientError> {
        let mut appointments = visible_to(&self.viewer, gateway.list_appointments()?);
        sort_latest_first(&mut appointments);
        self.appointments = appointments;
        Ok(())
    }

    pub fn viewer(&self) -> &Identity {
        &self.viewer
    }

    pub fn appointments(&self) -> &[Appointment] {
        &self.appointments
    }

    pub fn get(&self, id: i64) -> Option<&Appointment> {
        self.appointments.iter().find(|a| a.id == id)
    }

    pub fn stats(&self) -> AppointmentStats {
        stats(&self.appointments)
    }

    /// Status changes offered to the viewer for `appointment`.
    pub fn actions_for(&self, appointment: &Appointment) -> &'static [AppointmentStatus] {
        self.viewer.role.status_actions(appointment.status)
    }

    /// Moves appointment `id` to `target`, then re-fetches.
    ///
    /// Transitions the viewer is not offered are refused without contacting
    /// the backend.
    pub fn update_status(
        &mut self,
        gateway: &dyn Gateway,
        id: i64,
        target: AppointmentStatus,
    ) -> Result<(), ClientError> {
        let appointment = self
            .get(id)
            .ok_or_else(|| ClientError::forbidden("Appointment not found"))?;
        if !self.actions_for(appointment).contains(&target) {
            return Err(ClientError::forbidden(format!(
                "A {} appointment cannot be marked {} by a {}",
                appointment.status, target, self.viewer.role
            )));
        }

        gateway.update_appointment(id, &AppointmentUpdate { status: target })?;
        info!(appointment_id = id, status = %target, "appointment status updated");
        self.refresh(gateway)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{appointment, user, MockGateway};
    use crate::models::AppointmentStatus::*;
    use crate::models::Role;

    fn identity(id: i64, role: Role) -> Identity {
        Identity::new(user(id, "Caller", role), "tok".to_string())
    }

    fn at(mut appt: Appointment, date: &str, time: &str) -> Appointment {
        appt.date = date.to_string();
        appt.time = time.to_string();
        appt
    }

    fn mixed_rows() -> Vec<Appointment> {
        vec![
            appointment(1, 5, 7, Scheduled),
            appointment(2, 9, 7, Completed),
            appointment(3, 5, 8, Cancelled),
            appointment(4, 9, 8, Scheduled),
            appointment(5, 5, 7, Scheduled),
        ]
    }

    #[test]
    fn patient_sees_only_own_rows() {
        let gateway = MockGateway::new().with_appointments(vec![
            appointment(1, 5, 7, Scheduled),
            appointment(2, 9, 7, Scheduled),
        ]);

        let view = AppointmentView::load(&gateway, &identity(5, Role::Patient)).unwrap();
        let ids: Vec<i64> = view.appointments().iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![1]);
    }

    #[test]
    fn role_filters_hold_for_every_row() {
        let patient = identity(5, Role::Patient);
        assert!(visible_to(&patient, mixed_rows())
            .iter()
            .all(|a| a.patient_id == 5));

        let doctor = identity(8, Role::Doctor);
        let rows = visible_to(&doctor, mixed_rows());
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|a| a.doctor_id == 8));

        assert_eq!(visible_to(&identity(1, Role::Admin), mixed_rows()).len(), 5);
        assert_eq!(visible_to(&identity(1, Role::ClinicAdmin), mixed_rows()).len(), 5);
    }

    #[test]
    fn pending_counts_scheduled_rows() {
        let rows = mixed_rows();
        let s = stats(&rows);
        assert_eq!(s.total_appointments, 5);
        assert_eq!(
            s.pending_appointments,
            rows.iter().filter(|a| a.status == Scheduled).count()
        );
        assert_eq!(s.pending_appointments, 3);
        assert_eq!(stats(&[]), AppointmentStats::default());
    }

    #[test]
    fn latest_first_with_stable_ties_and_unknown_slots_last() {
        let mut rows = vec![
            at(appointment(1, 5, 7, Scheduled), "2025-01-10", "09:00"),
            at(appointment(2, 5, 7, Scheduled), "not a date", "09:00"),
            at(appointment(3, 5, 7, Scheduled), "2025-02-01", "08:30"),
            at(appointment(4, 5, 7, Scheduled), "2025-01-10", "09:00:00"),
            at(appointment(5, 5, 7, Scheduled), "2025-02-01", "17:45"),
        ];
        sort_latest_first(&mut rows);

        let ids: Vec<i64> = rows.iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![5, 3, 1, 4, 2]);
    }

    #[test]
    fn recent_is_capped() {
        let rows: Vec<Appointment> = (1..=8)
            .map(|i| at(appointment(i, 5, 7, Scheduled), &format!("2025-03-0{i}"), "10:00"))
            .collect();
        let latest = recent(&rows, 5);
        assert_eq!(latest.len(), 5);
        assert_eq!(latest[0].id, 8);
        assert_eq!(latest[4].id, 4);
    }

    #[test]
    fn doctor_completes_and_refetch_hides_actions() {
        let gateway = MockGateway::new().with_appointments(vec![appointment(1, 5, 7, Scheduled)]);
        let mut view = AppointmentView::load(&gateway, &identity(7, Role::Doctor)).unwrap();
        assert_eq!(view.actions_for(view.get(1).unwrap()), &[Completed, Cancelled]);

        view.update_status(&gateway, 1, Completed).unwrap();

        let appt = view.get(1).unwrap();
        assert_eq!(appt.status, Completed);
        assert!(view.actions_for(appt).is_empty());
        assert_eq!(gateway.calls_to("list_appointments"), 2);
    }

    #[test]
    fn terminal_appointments_cannot_change() {
        let gateway = MockGateway::new().with_appointments(vec![appointment(1, 5, 7, Cancelled)]);
        let mut view = AppointmentView::load(&gateway, &identity(7, Role::Doctor)).unwrap();

        let err = view.update_status(&gateway, 1, Completed).unwrap_err();
        assert!(matches!(err, ClientError::Forbidden(_)));
        assert_eq!(gateway.calls_to("update_appointment"), 0);
    }

    #[test]
    fn patient_may_only_cancel() {
        let gateway = MockGateway::new().with_appointments(vec![appointment(1, 5, 7, Scheduled)]);
        let mut view = AppointmentView::load(&gateway, &identity(5, Role::Patient)).unwrap();

        assert!(view.update_status(&gateway, 1, Completed).is_err());
        assert_eq!(gateway.calls_to("update_appointment"), 0);

        view.update_status(&gateway, 1, Cancelled).unwrap();
        assert_eq!(view.get(1).unwrap().status, Cancelled);
    }

    #[test]
    fn failed_update_keeps_rows_and_surfaces_message() {
        let gateway = MockGateway::new().with_appointments(vec![appointment(1, 5, 7, Scheduled)]);
        let mut view = AppointmentView::load(&gateway, &identity(7, Role::Doctor)).unwrap();
        gateway.fail_with(500, "Database is locked");

        let err = view.update_status(&gateway, 1, Cancelled).unwrap_err();
        assert_eq!(err.to_string(), "Database is locked");
        assert_eq!(view.get(1).unwrap().status, Scheduled);
    }
}
