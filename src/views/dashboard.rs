use super::appointments::{recent, stats, visible_to};
use crate::api::Gateway;
use crate::error::ClientError;
use crate::models::{Appointment, Identity, Role};
use std::collections::HashSet;

/// How many appointments the dashboard lists.
pub const RECENT_LIMIT: usize = 5;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DashboardStats {
    pub total_appointments: usize,
    pub pending_appointments: usize,
    /// Only computed for roles that see head counts.
    pub total_patients: Option<usize>,
    pub total_doctors: Option<usize>,
}

/// Landing screen data for a signed-in user.
#[derive(Debug, Clone)]
pub struct Dashboard {
    pub stats: DashboardStats,
    pub recent: Vec<Appointment>,
}

impl Dashboard {
    pub fn load(gateway: &dyn Gateway, viewer: &Identity) -> Result<Self, ClientError> {
        let appointments = visible_to(viewer, gateway.list_appointments()?);
        let counts = stats(&appointments);

        let (total_patients, total_doctors) = match viewer.role {
            Role::Admin => {
                let users = gateway.list_users()?;
                let count = |role: Role| users.iter().filter(|u| u.role == role).count();
                (Some(count(Role::Patient)), Some(count(Role::Doctor)))
            }
            Role::Doctor => {
                let patients: HashSet<i64> = appointments.iter().map(|a| a.patient_id).collect();
                let doctors: HashSet<i64> = gateway
                    .list_clinics()?
                    .iter()
                    .flat_map(|c| c.doctors.iter().map(|d| d.id))
                    .collect();
                (Some(patients.len()), Some(doctors.len()))
            }
            Role::Patient | Role::ClinicAdmin => (None, None),
        };

        Ok(Self {
            stats: DashboardStats {
                total_appointments: counts.total_appointments,
                pending_appointments: counts.pending_appointments,
                total_patients,
                total_doctors,
            },
            recent: recent(&appointments, RECENT_LIMIT),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mock::{appointment, user, MockGateway};
    use crate::models::AppointmentStatus::*;
    use crate::models::{Clinic, Doctor};

    fn identity(id: i64, role: Role) -> Identity {
        Identity::new(user(id, "Caller", role), "tok".to_string())
    }

    fn doctor(id: i64) -> Doctor {
        Doctor {
            id,
            name: format!("Doctor {id}"),
            role: Role::Doctor,
        }
    }

    #[test]
    fn admin_counts_users_by_role() {
        let gateway = MockGateway::new()
            .with_appointments(vec![
                appointment(1, 5, 7, Scheduled),
                appointment(2, 6, 7, Completed),
            ])
            .with_users(vec![
                user(5, "P One", Role::Patient),
                user(6, "P Two", Role::Patient),
                user(7, "D One", Role::Doctor),
                user(1, "Root", Role::Admin),
            ]);

        let dashboard = Dashboard::load(&gateway, &identity(1, Role::Admin)).unwrap();
        assert_eq!(
            dashboard.stats,
            DashboardStats {
                total_appointments: 2,
                pending_appointments: 1,
                total_patients: Some(2),
                total_doctors: Some(1),
            }
        );
    }

    #[test]
    fn doctor_counts_distinct_patients_and_clinic_doctors() {
        let gateway = MockGateway::new()
            .with_appointments(vec![
                appointment(1, 5, 7, Scheduled),
                appointment(2, 5, 7, Completed),
                appointment(3, 6, 7, Scheduled),
                appointment(4, 9, 8, Scheduled),
            ])
            .with_clinics(vec![
                Clinic {
                    id: 1,
                    name: "Central".into(),
                    location: None,
                    doctors: vec![doctor(7), doctor(8)],
                },
                Clinic {
                    id: 2,
                    name: "North".into(),
                    location: None,
                    doctors: vec![doctor(7)],
                },
            ]);

        let dashboard = Dashboard::load(&gateway, &identity(7, Role::Doctor)).unwrap();
        assert_eq!(dashboard.stats.total_appointments, 3);
        assert_eq!(dashboard.stats.pending_appointments, 2);
        assert_eq!(dashboard.stats.total_patients, Some(2));
        assert_eq!(dashboard.stats.total_doctors, Some(2));
    }

    #[test]
    fn patient_dashboard_skips_head_counts() {
        let gateway = MockGateway::new().with_appointments(vec![appointment(1, 5, 7, Scheduled)]);

        let dashboard = Dashboard::load(&gateway, &identity(5, Role::Patient)).unwrap();
        assert_eq!(dashboard.stats.total_patients, None);
        assert_eq!(dashboard.recent.len(), 1);
        assert_eq!(gateway.calls_to("list_users"), 0);
        assert_eq!(gateway.calls_to("list_clinics"), 0);
    }
}
