use crate::domain::model::{EnrollmentRequest, PlanId, StudentId};
use clap::{Args, Parser, Subcommand};

#[derive(Debug, Clone, Parser)]
#[command(name = "gym-enrollment")]
#[command(about = "Manage student enrollments in gym plans")]
pub struct CliArgs {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "enrollment.toml")]
    pub config: String,

    #[arg(short, long, help = "Enable verbose output")]
    pub verbose: bool,

    /// Emit logs as JSON lines
    #[arg(long)]
    pub json_logs: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Enroll a student in a plan
    Create(EnrollmentArgs),
    /// Move a student's enrollment to another plan or start date
    Update(EnrollmentArgs),
    /// Remove a student's enrollment
    Delete {
        #[arg(long)]
        student: u64,
    },
    /// Show every enrollment with its student and plan
    List,
    /// Show the known students and plans
    Catalog,
}

#[derive(Debug, Clone, Args)]
pub struct EnrollmentArgs {
    #[arg(long)]
    pub student: u64,

    #[arg(long)]
    pub plan: u64,

    /// ISO-8601 start, e.g. 2030-01-10T09:00:00Z
    #[arg(long)]
    pub start: String,
}

impl From<&EnrollmentArgs> for EnrollmentRequest {
    fn from(args: &EnrollmentArgs) -> Self {
        Self {
            student_id: StudentId(args.student),
            plan_id: PlanId(args.plan),
            start_date: args.start.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_command() {
        let args = CliArgs::try_parse_from([
            "gym-enrollment",
            "create",
            "--student",
            "4",
            "--plan",
            "2",
            "--start",
            "2030-01-10T09:00:00Z",
        ])
        .unwrap();

        assert_eq!(args.config, "enrollment.toml");
        let Command::Create(create) = &args.command else {
            panic!("expected create, got {:?}", args.command);
        };
        let request = EnrollmentRequest::from(create);
        assert_eq!(request.student_id, StudentId(4));
        assert_eq!(request.plan_id, PlanId(2));
    }

    #[test]
    fn test_delete_requires_student() {
        assert!(CliArgs::try_parse_from(["gym-enrollment", "delete"]).is_err());
    }
}
