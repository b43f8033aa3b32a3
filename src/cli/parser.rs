use crate::export::{ExportFormat, ExportTarget};
use clap::{ArgGroup, Parser, Subcommand};

/// Command-line interface definition for rollcall
/// Badge-tap class attendance on SQLite
#[derive(Parser)]
#[command(
    name = "rollcall",
    version = env!("CARGO_PKG_VERSION"),
    about = "Badge-tap class attendance: per-subject presence, breaks, lateness and late-to-absence policy",
    long_about = None
)]
pub struct Cli {
    /// Override database path (useful for tests or custom DB)
    #[arg(global = true, long = "db")]
    pub db: Option<String>,

    /// Run in test mode (no config file update)
    #[arg(global = true, long = "test", hide = true)]
    pub test: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize the database and configuration
    Init,

    /// Manage the configuration file (view, check, migrate or edit)
    Config {
        #[arg(long = "print", help = "Print the current configuration")]
        print_config: bool,

        #[arg(long = "check", help = "Check configuration file for missing fields")]
        check: bool,

        #[arg(long = "migrate", help = "Add missing fields with their defaults")]
        migrate: bool,

        #[arg(
            long = "edit",
            help = "Edit the configuration file (default editor: $EDITOR, or nano/notepad)"
        )]
        edit_config: bool,

        #[arg(
            long = "editor",
            help = "Specify the editor to use (vim, nano, or custom path)"
        )]
        editor: Option<String>,
    },

    /// Manage the database (migrations, integrity checks, etc.)
    Db {
        #[arg(long = "migrate", help = "Run pending database migrations")]
        migrate: bool,

        #[arg(long = "check", help = "Check database integrity")]
        check: bool,

        #[arg(long = "vacuum", help = "Optimize the database using VACUUM")]
        vacuum: bool,

        #[arg(long = "info", help = "Show database information")]
        info: bool,
    },

    /// Print the internal log table
    Log {
        #[arg(long = "print", help = "Print rows from the internal log table")]
        print: bool,
    },

    /// Register a badge tap
    Tap {
        /// Badge tag read by the device
        badge: String,

        #[arg(
            long = "at",
            value_name = "INSTANT",
            help = "Instant of the tap (RFC 3339 or 'YYYY-MM-DD HH:MM[:SS]' UTC); defaults to now"
        )]
        at: Option<String>,

        #[arg(long = "json", help = "Print the outcome as JSON")]
        json: bool,
    },

    /// Manage the student directory
    Student {
        #[command(subcommand)]
        action: StudentCmd,
    },

    /// Manage the weekly timetable
    Schedule {
        #[command(subcommand)]
        action: ScheduleCmd,
    },

    /// List attendance records
    #[command(group(ArgGroup::new("when").args(["date", "range"])))]
    Records {
        #[arg(long = "student", value_name = "NO", help = "Filter by student number")]
        student: Option<String>,

        #[arg(long)]
        section: Option<String>,

        #[arg(long, help = "Subject filter (case-insensitive substring)")]
        subject: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,

        #[arg(long, short, help = "Filter by year/month/day or a custom range")]
        range: Option<String>,

        #[arg(long = "json", help = "Print records as JSON")]
        json: bool,

        #[arg(
            long = "recompute",
            help = "Re-derive flags and run the late conversion over stored records"
        )]
        recompute: bool,
    },

    /// Attendance summary per student
    #[command(group(ArgGroup::new("when").args(["date", "range"])))]
    Report {
        #[arg(long)]
        section: Option<String>,

        #[arg(long, help = "Subject filter (case-insensitive substring)")]
        subject: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,

        #[arg(long, short, help = "Filter by year/month/day or a custom range")]
        range: Option<String>,

        #[arg(long = "per-subject", help = "Also print the per-subject rows")]
        per_subject: bool,

        #[arg(
            long = "section-totals",
            requires = "section",
            help = "Raw per-student totals for one section, without folding lates"
        )]
        section_totals: bool,

        #[arg(long = "json", help = "Print the report as JSON")]
        json: bool,
    },

    /// Per-day in/out presence log
    Logs {
        #[arg(long = "student", value_name = "NO")]
        student: Option<String>,

        #[arg(long, value_name = "YYYY-MM-DD")]
        date: Option<String>,
    },

    /// Raw tap attempts, newest first
    Taps {
        #[arg(long, default_value_t = 20)]
        limit: usize,
    },

    /// Export attendance data
    Export {
        #[arg(long, value_enum, default_value = "csv")]
        format: ExportFormat,

        #[arg(long = "what", value_enum, default_value = "records")]
        what: ExportTarget,

        #[arg(long, value_name = "FILE")]
        file: String,

        #[arg(
            long,
            value_name = "RANGE",
            help = "Filter export by year/month/day or a custom range"
        )]
        range: Option<String>,

        #[arg(long)]
        section: Option<String>,

        #[arg(long)]
        subject: Option<String>,

        #[arg(long, short = 'f')]
        force: bool,
    },
}

#[derive(Subcommand)]
pub enum StudentCmd {
    /// Register a student
    Add {
        #[arg(long = "no", value_name = "STUDENT_NO")]
        student_no: Option<String>,

        #[arg(long = "first")]
        first_name: String,

        #[arg(long = "last")]
        last_name: String,

        #[arg(long)]
        section: String,

        #[arg(long)]
        badge: String,
    },

    /// List students
    List {
        #[arg(long)]
        section: Option<String>,
    },

    /// Edit a student (looked up by student number, then by badge)
    #[command(group(ArgGroup::new("activity").args(["active", "inactive"])))]
    Edit {
        key: String,

        #[arg(long = "no", value_name = "STUDENT_NO")]
        student_no: Option<String>,

        #[arg(long = "first")]
        first_name: Option<String>,

        #[arg(long = "last")]
        last_name: Option<String>,

        #[arg(long)]
        section: Option<String>,

        #[arg(long)]
        badge: Option<String>,

        #[arg(long)]
        active: bool,

        #[arg(long)]
        inactive: bool,
    },
}

#[derive(Subcommand)]
pub enum ScheduleCmd {
    /// Add a session definition
    #[command(group(ArgGroup::new("scope").required(true).args(["section", "student"])))]
    Add {
        #[arg(long)]
        section: Option<String>,

        #[arg(long = "student", value_name = "NO")]
        student: Option<String>,

        #[arg(long, help = "Weekday (Mon, Monday, ...)")]
        day: String,

        #[arg(long, help = "Start time (HH:MM[:SS] or a datetime)")]
        start: String,

        #[arg(long, help = "End time; earlier than start means the session ends next day")]
        end: String,

        #[arg(long)]
        subject: String,

        #[arg(long)]
        room: Option<String>,
    },

    /// Import session definitions from CSV
    /// (columns: section,day,start_time,end_time,subject,room)
    Import {
        file: String,

        #[arg(long, help = "Section used for rows with an empty section column")]
        section: Option<String>,
    },

    /// List session definitions
    List {
        #[arg(long)]
        section: Option<String>,

        #[arg(long)]
        day: Option<String>,
    },

    /// Show the session in progress for a section
    Now {
        #[arg(long)]
        section: String,

        #[arg(long = "student", value_name = "NO")]
        student: Option<String>,

        #[arg(long = "at", value_name = "INSTANT")]
        at: Option<String>,
    },
}
