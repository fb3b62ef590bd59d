use agumiya::cli::cart::CartCommand;
use agumiya::core::log::init_logging;
use agumiya::session::{Role, SessionUser};
use anyhow::Result;
use clap::{Args, CommandFactory, Parser, Subcommand};

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Show exchange rates for a base currency
    Rates {
        /// Base currency, defaults to the configured store currency
        #[arg(short, long)]
        base: Option<String>,
    },
    /// Convert and format a price
    Convert {
        amount: f64,
        /// Currency the amount is in
        #[arg(short, long, default_value = "USD")]
        from: String,
        /// Target currency, detected from your location when omitted
        #[arg(short, long)]
        to: Option<String>,
        /// Also show the unconverted price
        #[arg(long)]
        original: bool,
    },
    /// Detect the display currency for this machine
    Detect,
    /// List supported currencies
    Currencies,
    /// Keep rates refreshed and print the display currency's rate until Ctrl-C
    Watch {
        /// Display currency, detected from your location when omitted
        #[arg(short, long)]
        to: Option<String>,
    },
    /// Manage the shopping cart
    Cart {
        /// Cart owner, defaults to the signed-in user or guest
        #[arg(short, long)]
        user: Option<String>,
        #[command(subcommand)]
        action: CartAction,
    },
    /// Sign in and switch to the user's cart
    Login {
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        email: Option<String>,
        #[arg(long)]
        token: String,
        /// Sign in to the admin session instead
        #[arg(long)]
        admin: bool,
    },
    /// Sign out and switch back to the guest cart
    Logout {
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Args)]
struct LineArgs {
    product_id: String,
    /// Product variant, e.g. a size
    #[arg(long)]
    variant: Option<String>,
}

#[derive(Subcommand)]
enum CartAction {
    /// Add a product, merging with an existing line
    Add {
        #[command(flatten)]
        line: LineArgs,
        /// Unit price in the store currency
        #[arg(long)]
        price: f64,
        #[arg(short, long, default_value_t = 1)]
        quantity: u32,
        #[arg(long)]
        name: Option<String>,
    },
    /// Remove a line
    Remove {
        #[command(flatten)]
        line: LineArgs,
    },
    /// Set a line's quantity, removing it at zero
    SetQuantity {
        #[command(flatten)]
        line: LineArgs,
        #[arg(allow_negative_numbers = true)]
        quantity: i64,
    },
    /// Empty the cart
    Clear,
    /// Show the cart
    Show {
        /// Display currency
        #[arg(long)]
        currency: Option<String>,
    },
}

impl From<CartAction> for CartCommand {
    fn from(action: CartAction) -> CartCommand {
        match action {
            CartAction::Add {
                line,
                price,
                quantity,
                name,
            } => CartCommand::Add {
                product_id: line.product_id,
                variant_id: line.variant,
                name,
                price,
                quantity,
            },
            CartAction::Remove { line } => CartCommand::Remove {
                product_id: line.product_id,
                variant_id: line.variant,
            },
            CartAction::SetQuantity { line, quantity } => CartCommand::SetQuantity {
                product_id: line.product_id,
                variant_id: line.variant,
                quantity,
            },
            CartAction::Clear => CartCommand::Clear,
            CartAction::Show { currency } => CartCommand::Show { currency },
        }
    }
}

fn role(admin: bool) -> Role {
    if admin { Role::Admin } else { Role::User }
}

impl From<Commands> for agumiya::AppCommand {
    fn from(cmd: Commands) -> agumiya::AppCommand {
        match cmd {
            Commands::Rates { base } => agumiya::AppCommand::Rates { base },
            Commands::Convert {
                amount,
                from,
                to,
                original,
            } => agumiya::AppCommand::Convert {
                amount,
                from,
                to,
                show_original: original,
            },
            Commands::Detect => agumiya::AppCommand::Detect,
            Commands::Currencies => agumiya::AppCommand::Currencies,
            Commands::Watch { to } => agumiya::AppCommand::Watch { to },
            Commands::Cart { user, action } => agumiya::AppCommand::Cart {
                user,
                command: action.into(),
            },
            Commands::Login {
                id,
                name,
                email,
                token,
                admin,
            } => agumiya::AppCommand::Login {
                role: role(admin),
                user: SessionUser { id, name, email },
                token,
            },
            Commands::Logout { admin } => agumiya::AppCommand::Logout { role: role(admin) },
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => agumiya::cli::setup::setup(),
        Some(cmd) => agumiya::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
