use clap::{Parser, Subcommand};
use frontdesk_domain::{EntityKind, ReferenceCatalog};

#[derive(Parser)]
#[command(name = "frontdesk-console")]
#[command(about = "Front-desk records console for the hospital backend")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// List one page of records
    List {
        /// Collection, e.g. doctors, patients, beds, lab-tests
        entity: EntityKind,
        /// One-based page number
        #[arg(long, default_value_t = 1)]
        page: u32,
        /// Records per page (defaults to the collection's page size)
        #[arg(long)]
        page_size: Option<u32>,
        /// Free-text search
        #[arg(long)]
        search: Option<String>,
        /// Sort column (defaults to newest first)
        #[arg(long)]
        sort: Option<String>,
        /// Sort ascending instead of descending
        #[arg(long, requires = "sort")]
        ascending: bool,
        /// Extra filter as name=value, repeatable
        #[arg(long = "filter", value_parser = parse_assignment)]
        filters: Vec<(String, String)>,
    },
    /// Show one record as its edit form
    Show {
        /// Collection
        entity: EntityKind,
        /// Record id
        id: String,
    },
    /// Create a record, or update one with --id
    Save {
        /// Collection
        entity: EntityKind,
        /// Record to update
        #[arg(long)]
        id: Option<String>,
        /// Field value as path=value, repeatable (e.g. --set ipd.ward=General)
        #[arg(long = "set", value_parser = parse_assignment)]
        values: Vec<(String, String)>,
        /// File attachment as path=local-file, repeatable
        #[arg(long = "file", value_parser = parse_assignment)]
        files: Vec<(String, String)>,
    },
    /// Delete a record after confirmation
    Delete {
        /// Collection
        entity: EntityKind,
        /// Record id
        id: String,
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
    /// Sign in and print the bearer token
    Login {
        /// Account email
        #[arg(long)]
        email: String,
        /// Account password (prompted when omitted)
        #[arg(long)]
        password: Option<String>,
    },
    /// Invalidate the configured bearer token
    Logout,
    /// Request a password reset link
    ForgotPassword {
        /// Account email
        email: String,
    },
    /// Set a new password with a reset token
    ResetPassword {
        /// Token from the reset link
        #[arg(long)]
        token: String,
        /// New password
        #[arg(long)]
        password: String,
        /// New password again
        #[arg(long)]
        confirm: String,
    },
    /// List the options of a select field catalog
    Options {
        /// Catalog: doctor-names, departments, specializations, degrees
        catalog: ReferenceCatalog,
    },
}

fn parse_assignment(raw: &str) -> Result<(String, String), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected name=value, got '{raw}'"))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(format!("missing name in '{raw}'"));
    }

    Ok((name.to_owned(), value.to_owned()))
}
