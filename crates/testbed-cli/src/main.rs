//! pay-testbed CLI
//!
//! Command-line front end for the payment harness. Each subcommand maps to
//! one gateway operation and prints the fixed-format text the dashboard
//! server knows how to parse. Logs go to stderr so stdout stays clean.

mod output;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use testbed_core::Config;
use testbed_gateway::{
    confirm_payment, refund_for_payment, CreateCustomer, CreatePayment, PaymentGateway,
    StripeGateway,
};

#[derive(Parser, Debug)]
#[command(name = "pay-testbed")]
#[command(about = "Payment API operations testbed", version)]
struct Cli {
    /// Path to configuration file
    #[arg(long, default_value = "conf/config.json")]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Create and confirm a payment
    Set {
        /// Amount in smallest currency unit (e.g. cents)
        #[arg(long, default_value_t = 1000)]
        amount: i64,

        /// Currency code, e.g. chf, usd
        #[arg(long, default_value = "chf")]
        currency: String,
    },
    /// Retrieve the current balance
    Get,
    /// List recent payment intents
    ListPayments {
        /// Max number of items
        #[arg(long, default_value_t = 5)]
        limit: u32,
    },
    /// Create a new customer
    CreateCustomer {
        #[arg(long)]
        email: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Refund the charge behind a payment intent
    CreateRefund {
        #[arg(long, value_name = "pi_...")]
        payment_id: String,
    },
    /// List available card payment methods
    ListMethods,
    /// Show details for a specific payment
    PaymentDetails {
        #[arg(long, value_name = "pi_...")]
        payment_id: String,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // stdout carries the scraped text contract; keep logging on stderr
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "warn".into()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let config = Config::load(&cli.config)?;
    tracing::debug!(config = %cli.config.display(), "configuration loaded");
    let settings = config.payment_settings.clone();
    let gateway = StripeGateway::from_config(&config);

    match cli.command {
        Commands::Set { amount, currency } => {
            anyhow::ensure!(amount > 0, "amount must be a positive number of minor units");
            println!("Creating a payment of {} {}...", amount, currency);
            let request = CreatePayment::new(amount, currency);
            let outcome = confirm_payment(&gateway, &request, &settings).await?;
            print!("{}", output::render_creation(&outcome));
        }
        Commands::Get => {
            println!("Retrieving current balance...");
            let balance = gateway.balance().await?;
            print!("{}", output::render_balance(&balance));
        }
        Commands::ListPayments { limit } => {
            let payments = gateway.list_payments(limit).await?;
            print!("{}", output::render_payments(&payments));
        }
        Commands::CreateCustomer {
            email,
            name,
            description,
        } => {
            let request = CreateCustomer {
                email,
                name,
                description,
            };
            let customer = gateway.create_customer(&request).await?;
            print!("{}", output::render_customer(&customer));
        }
        Commands::CreateRefund { payment_id } => {
            let refund = refund_for_payment(&gateway, &payment_id).await?;
            print!("{}", output::render_refund(&refund));
        }
        Commands::ListMethods => {
            let methods = gateway.list_payment_methods(10).await?;
            print!("{}", output::render_methods(&methods));
        }
        Commands::PaymentDetails { payment_id } => {
            let intent = gateway.retrieve_payment(&payment_id, true).await?;
            print!("{}", output::render_payment_details(&intent));
        }
    }

    Ok(())
}
