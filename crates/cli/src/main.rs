use clap::{Parser, Subcommand};
use hms_core::config::{
    admin_password_from_env_value, admin_username_from_env_value, data_dir_from_env_value,
};
use hms_core::constants::{DATE_FORMAT, TIME_FORMAT};
use hms_core::directory::{list_departments, search_doctors};
use hms_core::identity::{add_doctor, NewDoctor};
use hms_core::ids::DepartmentId;
use hms_core::{appointments, CoreConfig, Store};
use hms_types::{EmailAddress, NonEmptyText};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "hms")]
#[command(about = "Hospital management service operator CLI")]
struct Cli {
    /// Directory holding the store snapshot (defaults to HMS_DATA_DIR, then "hospital_data")
    #[arg(long, global = true)]
    data_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Seed the departments and the administrator account
    Seed,
    /// List departments
    Departments,
    /// List doctors, active or not
    Doctors {
        /// Name or e-mail substring
        #[arg(long)]
        search: Option<String>,
    },
    /// List every appointment, newest date first
    Appointments,
    /// Create a doctor account
    AddDoctor {
        username: String,
        password: String,
        /// Full name
        name: String,
        email: String,
        /// Department id (see `hms departments`)
        department_id: u64,
        #[arg(long, default_value_t = 0)]
        experience_years: u32,
        #[arg(long)]
        qualification: Option<String>,
        #[arg(long)]
        phone: Option<String>,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let data_dir = cli
        .data_dir
        .unwrap_or_else(|| data_dir_from_env_value(std::env::var("HMS_DATA_DIR").ok()));

    match cli.command {
        Some(Commands::Seed) => {
            let cfg = CoreConfig::new(
                data_dir,
                &admin_username_from_env_value(std::env::var("HMS_ADMIN_USERNAME").ok()),
                admin_password_from_env_value(std::env::var("HMS_ADMIN_PASSWORD").ok()),
            )?;
            match hms_core::bootstrap(&cfg) {
                Ok(_) => println!("Seeded store at {}", cfg.data_dir().display()),
                Err(e) => eprintln!("Error seeding store: {}", e),
            }
        }
        Some(Commands::Departments) => {
            let store = Store::open(&data_dir)?;
            let departments = store.read(list_departments)?;
            if departments.is_empty() {
                println!("No departments found. Run 'hms seed' first.");
            }
            for d in departments {
                println!(
                    "ID: {}, Name: {}, Description: {}",
                    d.id,
                    d.name,
                    d.description.as_ref().map_or("-", |t| t.as_str())
                );
            }
        }
        Some(Commands::Doctors { search }) => {
            let store = Store::open(&data_dir)?;
            let rows = store.read(|t| {
                search_doctors(t, search.as_deref())
                    .into_iter()
                    .map(|d| {
                        let department = t
                            .department(d.department_id)
                            .map(|dep| dep.name.to_string())
                            .unwrap_or_default();
                        (d, department)
                    })
                    .collect::<Vec<_>>()
            })?;
            if rows.is_empty() {
                println!("No doctors found.");
            }
            for (d, department) in rows {
                println!(
                    "ID: {}, Username: {}, Name: {}, Department: {}, Active: {}",
                    d.id, d.credential.username, d.name, department, d.active
                );
            }
        }
        Some(Commands::Appointments) => {
            let store = Store::open(&data_dir)?;
            let rows = store.read(|t| {
                appointments::list_all(t)
                    .into_iter()
                    .map(|a| {
                        let patient = t.patient(a.patient_id).map(|p| p.name.to_string());
                        let doctor = t.doctor(a.doctor_id).map(|d| d.name.to_string());
                        (a, patient.unwrap_or_default(), doctor.unwrap_or_default())
                    })
                    .collect::<Vec<_>>()
            })?;
            if rows.is_empty() {
                println!("No appointments found.");
            }
            for (a, patient, doctor) in rows {
                println!(
                    "ID: {}, {} {}, Patient: {}, Doctor: {}, Status: {}",
                    a.id,
                    a.date.format(DATE_FORMAT),
                    a.time.format(TIME_FORMAT),
                    patient,
                    doctor,
                    a.status
                );
            }
        }
        Some(Commands::AddDoctor {
            username,
            password,
            name,
            email,
            department_id,
            experience_years,
            qualification,
            phone,
        }) => {
            let new = NewDoctor {
                username: NonEmptyText::new(&username)?,
                name: NonEmptyText::new(&name)?,
                email: EmailAddress::parse(&email)?,
                phone: phone.as_deref().and_then(NonEmptyText::optional),
                department_id: DepartmentId(department_id),
                experience_years,
                qualification: qualification.as_deref().and_then(NonEmptyText::optional),
            };
            let store = Store::open(&data_dir)?;
            match store.transaction(|uow| add_doctor(uow, new, &password)) {
                Ok(doctor) => println!("Added doctor {} with ID: {}", doctor.name, doctor.id),
                Err(e) => eprintln!("Error adding doctor: {}", e),
            }
        }
        None => {
            println!("Use 'hms --help' for commands");
        }
    }

    Ok(())
}
