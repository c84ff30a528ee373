use std::{process::ExitCode, time::Duration};

use clap::{Parser, Subcommand};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

use ledger_sync::{
    record::{FinancialRecord, RecordDraft, RecordField, RecordId, RecordPatch, UserId},
    session::{HttpRecordApi, Identity, RecordSession, SessionError},
};

/// Manage your financial records on a ledger sync server.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// The URL of the record store server.
    #[arg(long, default_value = "http://127.0.0.1:3001")]
    base_url: String,

    /// The ID of the signed in user, as issued by the identity provider.
    #[arg(long)]
    user_id: String,

    /// How many seconds to wait for the server before giving up.
    #[arg(long, default_value_t = 10)]
    timeout_secs: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List your records and their total.
    List,
    /// Add a record.
    Add {
        description: String,
        /// The signed amount, negative for money spent.
        #[arg(allow_hyphen_values = true)]
        amount: String,
        /// One of Food, Rent, Salary, Utilities, Entertainment, Other.
        category: String,
        /// One of "Credit Card", Cash, "Bank Transfer".
        payment_method: String,
    },
    /// Change one field of a record.
    Update {
        id: String,
        /// One of description, amount, category, paymentMethod.
        field: String,
        #[arg(allow_hyphen_values = true)]
        value: String,
    },
    /// Delete a record.
    Delete { id: String },
    /// Show the sum of all your records.
    Total,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let args = Args::parse();

    match run(args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(error) => {
            eprintln!("Error: {error}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: Args) -> Result<(), SessionError> {
    let user_id = UserId::new(&args.user_id)?;
    let api = HttpRecordApi::new(&args.base_url)
        .with_timeout(Duration::from_secs(args.timeout_secs));
    let session = RecordSession::new(api);

    session.initialize(&Identity::SignedIn(user_id)).await?;

    match args.command {
        Command::List => {
            for record in session.records() {
                print_record(&record);
            }
            println!("Total: {:.2}", session.total_amount());
        }
        Command::Add {
            description,
            amount,
            category,
            payment_method,
        } => {
            let draft = RecordDraft::parse(&description, &amount, &category, &payment_method)?;
            let record = session.add_record(draft).await?;
            print_record(&record);
        }
        Command::Update { id, field, value } => {
            let field: RecordField = field.parse()?;
            let patch = RecordPatch::from_field(field, &value)?;
            let record = session.update_record(&RecordId::new(id), patch).await?;
            print_record(&record);
        }
        Command::Delete { id } => match session.delete_record(&RecordId::new(id)).await? {
            Some(record) => println!("Deleted {}", record.id),
            None => println!("Already deleted"),
        },
        Command::Total => println!("{:.2}", session.total_amount()),
    }

    Ok(())
}

fn print_record(record: &FinancialRecord) {
    println!(
        "{}  {}  {:<24}  {:>10.2}  {:<13}  {}",
        record.id,
        record.date.date(),
        record.description,
        record.amount,
        record.category,
        record.payment_method
    );
}
