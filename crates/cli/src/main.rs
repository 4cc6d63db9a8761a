use bewell_core::config::recent_cases_limit_from_env_value;
use bewell_core::constants::{DEFAULT_DATA_DIR, DEFAULT_PUBLIC_BASE_URL};
use bewell_core::format::{format_date, format_timestamp};
use bewell_core::ids::{CaseId, CentreId, ChildId, UserId};
use bewell_core::records::{ChildProfile, GuidanceUpdate, Role, UserProfile};
use bewell_core::{CoreConfig, LocalBackend};
use bewell_types::EmailAddress;
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bewell")]
#[command(about = "Be Well administration CLI")]
struct Cli {
    /// Data directory shared with the server
    #[arg(long, global = true, env = "BEWELL_DATA_DIR", default_value = DEFAULT_DATA_DIR)]
    data_dir: PathBuf,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create a login and a user profile
    AddUser {
        /// Login email
        email: String,
        /// Login password
        password: String,
        /// Name shown in the app
        #[arg(long)]
        name: Option<String>,
        /// carer or parent
        #[arg(long)]
        role: Option<Role>,
        /// Centre id the user belongs to (repeatable)
        #[arg(long = "centre")]
        centres: Vec<String>,
    },
    /// Create a child profile
    AddChild {
        first_name: String,
        last_name: String,
        /// Centre id the child attends
        #[arg(long)]
        centre: Option<String>,
        /// User id of an assigned carer (repeatable)
        #[arg(long = "carer")]
        carers: Vec<String>,
        /// User id of a parent (repeatable)
        #[arg(long = "parent")]
        parents: Vec<String>,
    },
    /// List every case, newest first
    ListCases,
    /// Attach externally produced guidance to a case
    SetGuidance {
        case_id: String,
        #[arg(long)]
        recommendation: Option<String>,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        guidance: Option<String>,
        /// Red flag to show with the guidance (repeatable, in order)
        #[arg(long = "red-flag")]
        red_flags: Vec<String>,
    },
}

fn open_backend(data_dir: PathBuf) -> Result<LocalBackend, Box<dyn std::error::Error>> {
    let public_base_url = std::env::var("BEWELL_PUBLIC_BASE_URL")
        .unwrap_or_else(|_| DEFAULT_PUBLIC_BASE_URL.into());
    let recent_cases_limit =
        recent_cases_limit_from_env_value(std::env::var("BEWELL_RECENT_CASES_LIMIT").ok())?;

    let cfg = CoreConfig::new(data_dir, public_base_url, recent_cases_limit, true)?;
    Ok(LocalBackend::open(cfg)?)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let Some(command) = cli.command else {
        println!("Use 'bewell --help' for commands");
        return Ok(());
    };

    let backend = open_backend(cli.data_dir)?;

    match command {
        Commands::AddUser {
            email,
            password,
            name,
            role,
            centres,
        } => {
            let email = EmailAddress::parse(&email)?;
            let id = UserId::generate();
            match backend.auth.register(&email, &password, &id) {
                Ok(()) => {
                    backend.records.put_user(&UserProfile {
                        id: id.clone(),
                        display_name: name,
                        role,
                        centre_ids: centres.into_iter().map(CentreId::new).collect(),
                    })?;
                    println!("Created user {} with ID: {}", email, id);
                }
                Err(e) => eprintln!("Error creating user: {}", e),
            }
        }
        Commands::AddChild {
            first_name,
            last_name,
            centre,
            carers,
            parents,
        } => {
            let child = ChildProfile {
                id: ChildId::generate(),
                first_name,
                last_name,
                centre_id: centre.map(CentreId::new),
                carer_ids: carers.into_iter().map(UserId::new).collect(),
                parent_ids: parents.into_iter().map(UserId::new).collect(),
            };
            match backend.records.put_child(&child) {
                Ok(()) => println!("Created child {} with ID: {}", child.full_name(), child.id),
                Err(e) => eprintln!("Error creating child: {}", e),
            }
        }
        Commands::ListCases => {
            let cases = backend.records.all_cases();
            if cases.is_empty() {
                println!("No cases found.");
            } else {
                for case in cases {
                    println!(
                        "ID: {}, Child: {}, Date: {}, Status: {}, Created: {}",
                        case.id,
                        case.child_id,
                        format_date(case.symptom_date),
                        case.status.as_str(),
                        format_timestamp(case.created_at)
                    );
                }
            }
        }
        Commands::SetGuidance {
            case_id,
            recommendation,
            category,
            guidance,
            red_flags,
        } => {
            let update = GuidanceUpdate {
                recommendation,
                category,
                guidance,
                red_flags,
            };
            match backend
                .records
                .attach_guidance(&CaseId::new(&case_id), update)
            {
                Ok(Some(_)) => println!("Updated guidance for case: {}", case_id),
                Ok(None) => eprintln!("No case with ID: {}", case_id),
                Err(e) => eprintln!("Error updating guidance: {}", e),
            }
        }
    }

    Ok(())
}
