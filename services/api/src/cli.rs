use crate::server;
use clap::{Args, Parser, Subcommand};
use gst_registry::error::AppError;
use gst_registry::gstin::Gstin;

#[derive(Parser, Debug)]
#[command(
    name = "GST Registration Service",
    about = "Verify GSTINs and capture business registrations",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Start the HTTP service (default command)
    Serve(ServeArgs),
    /// Apply pending database migrations and exit
    Migrate,
    /// Validate a GSTIN locally without contacting the verification service
    CheckGstin {
        /// Candidate GSTIN; surrounding whitespace and case are normalized
        gstin: String,
    },
}

#[derive(Args, Debug, Default)]
pub(crate) struct ServeArgs {
    /// Override the configured host for the HTTP server
    #[arg(long)]
    pub(crate) host: Option<String>,
    /// Override the configured port for the HTTP server
    #[arg(long)]
    pub(crate) port: Option<u16>,
    /// Do not apply migrations before binding; run `migrate` separately instead
    #[arg(long)]
    pub(crate) skip_migrations: bool,
}

pub(crate) async fn run() -> Result<(), AppError> {
    let cli = Cli::parse();
    let command = cli
        .command
        .unwrap_or_else(|| Command::Serve(ServeArgs::default()));

    match command {
        Command::Serve(args) => server::run(args).await,
        Command::Migrate => server::migrate().await,
        Command::CheckGstin { gstin } => {
            check_gstin(&gstin);
            Ok(())
        }
    }
}

fn check_gstin(raw: &str) {
    match Gstin::parse(raw) {
        Ok(gstin) => println!("{gstin}"),
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
