//! Departments and the doctor/patient search filters.

use crate::constants::DEPARTMENTS;
use crate::error::{ConflictReason, HospitalError, HospitalResult};
use crate::identity::{Doctor, Patient};
use crate::ids::DepartmentId;
use crate::store::{Tables, UnitOfWork};
use hms_types::NonEmptyText;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Department {
    pub id: DepartmentId,
    pub name: NonEmptyText,
    pub description: Option<NonEmptyText>,
}

/// Inserts any missing department from the fixed list. Returns how many were added.
pub fn seed_departments(uow: &mut UnitOfWork<'_>) -> HospitalResult<usize> {
    let mut added = 0;
    for (name, description) in DEPARTMENTS {
        let name = NonEmptyText::new(name)?;
        let description = NonEmptyText::optional(description);
        match uow.insert_department(|id| Department {
            id,
            name,
            description,
        }) {
            Ok(_) => added += 1,
            Err(HospitalError::Conflict(ConflictReason::DepartmentExists)) => {}
            Err(e) => return Err(e),
        }
    }

    if added > 0 {
        tracing::info!("seeded {added} departments");
    }
    Ok(added)
}

pub fn list_departments(tables: &Tables) -> Vec<Department> {
    tables.departments().cloned().collect()
}

/// Administrator doctor search: every doctor, active or not, whose name or e-mail contains
/// `term`. A blank term lists all doctors.
pub fn search_doctors(tables: &Tables, term: Option<&str>) -> Vec<Doctor> {
    let term = term.map(str::trim).filter(|t| !t.is_empty());
    tables
        .doctors()
        .filter(|d| {
            term.map_or(true, |t| {
                d.name.contains_ignore_case(t) || contains_ignore_case(d.email.as_str(), t)
            })
        })
        .cloned()
        .collect()
}

/// Patient-facing doctor finder: active doctors only, optionally filtered by a name
/// substring and a department.
pub fn find_doctors(
    tables: &Tables,
    term: Option<&str>,
    department_id: Option<DepartmentId>,
) -> Vec<Doctor> {
    let term = term.map(str::trim).filter(|t| !t.is_empty());
    tables
        .doctors()
        .filter(|d| d.active)
        .filter(|d| term.map_or(true, |t| d.name.contains_ignore_case(t)))
        .filter(|d| department_id.map_or(true, |id| d.department_id == id))
        .cloned()
        .collect()
}

/// Administrator patient search over name, e-mail and phone.
pub fn search_patients(tables: &Tables, term: Option<&str>) -> Vec<Patient> {
    let term = term.map(str::trim).filter(|t| !t.is_empty());
    tables
        .patients()
        .filter(|p| {
            term.map_or(true, |t| {
                p.name.contains_ignore_case(t)
                    || contains_ignore_case(p.email.as_str(), t)
                    || p.phone.as_ref().is_some_and(|ph| ph.contains_ignore_case(t))
            })
        })
        .cloned()
        .collect()
}

fn contains_ignore_case(haystack: &str, needle: &str) -> bool {
    haystack.to_lowercase().contains(&needle.to_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identity::{add_doctor, deactivate_doctor, register_patient, NewDoctor, NewPatient};
    use crate::store::Store;
    use hms_types::EmailAddress;

    fn text(value: &str) -> NonEmptyText {
        NonEmptyText::new(value).unwrap()
    }

    fn doctor(username: &str, name: &str, department: u64) -> NewDoctor {
        NewDoctor {
            username: text(username),
            name: text(name),
            email: EmailAddress::parse(format!("{username}@hospital.com")).unwrap(),
            phone: None,
            department_id: DepartmentId(department),
            experience_years: 5,
            qualification: None,
        }
    }

    fn store_with_doctors() -> Store {
        let store = Store::in_memory();
        store
            .transaction(|uow| {
                seed_departments(uow)?;
                add_doctor(uow, doctor("house", "Gregory House", 7), "pw")?;
                add_doctor(uow, doctor("wilson", "James Wilson", 1), "pw")?;
                let chase = add_doctor(uow, doctor("chase", "Robert Chase", 1), "pw")?;
                deactivate_doctor(uow, chase.id)
            })
            .unwrap();
        store
    }

    #[test]
    fn test_seed_departments_is_idempotent() {
        let store = Store::in_memory();
        assert_eq!(store.transaction(seed_departments).unwrap(), DEPARTMENTS.len());
        assert_eq!(store.transaction(seed_departments).unwrap(), 0);

        let departments = store.read(list_departments).unwrap();
        assert_eq!(departments.len(), 7);
        assert_eq!(departments[0].name.as_str(), "Cardiology");
        assert_eq!(departments[5].name.as_str(), "ENT");
    }

    #[test]
    fn test_search_doctors_matches_name_or_email_including_inactive() {
        let store = store_with_doctors();

        let by_name = store.read(|t| search_doctors(t, Some("house"))).unwrap();
        assert_eq!(by_name.len(), 1);

        let by_email = store.read(|t| search_doctors(t, Some("chase@"))).unwrap();
        assert_eq!(by_email.len(), 1, "inactive doctors are visible to admins");

        let all = store.read(|t| search_doctors(t, Some("  "))).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn test_find_doctors_filters_active_and_department() {
        let store = store_with_doctors();

        let cardiology = store
            .read(|t| find_doctors(t, None, Some(DepartmentId(1))))
            .unwrap();
        let names: Vec<&str> = cardiology.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["James Wilson"]);

        let by_name = store.read(|t| find_doctors(t, Some("gregory"), None)).unwrap();
        assert_eq!(by_name.len(), 1);

        let none = store
            .read(|t| find_doctors(t, Some("gregory"), Some(DepartmentId(1))))
            .unwrap();
        assert!(none.is_empty());
    }

    #[test]
    fn test_search_patients_matches_phone() {
        let store = Store::in_memory();
        store
            .transaction(|uow| {
                register_patient(
                    uow,
                    NewPatient {
                        username: text("alice"),
                        name: text("Alice"),
                        email: EmailAddress::parse("alice@x.com").unwrap(),
                        phone: Some(text("555-1234")),
                        date_of_birth: None,
                        gender: None,
                        address: None,
                        blood_group: None,
                    },
                    "pw",
                )
            })
            .unwrap();

        assert_eq!(store.read(|t| search_patients(t, Some("1234"))).unwrap().len(), 1);
        assert!(store.read(|t| search_patients(t, Some("bob"))).unwrap().is_empty());
    }
}
