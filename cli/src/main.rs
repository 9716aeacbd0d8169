use clap::{Parser, Subcommand};

mod commands;
mod util;

use commands::chat::ChatCommands;
use commands::generate::GenerateArgs;

#[derive(Parser)]
#[command(name = "giftwise", version, about = "Giftwise CLI: gift recommendations and chat from the terminal")]
struct Cli {
    /// API base URL
    #[arg(long, env = "GIFTWISE_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Print compact JSON instead of pretty-printed
    #[arg(long, global = true)]
    raw: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check API and database health
    Health,
    /// Generate recommendations from a questionnaire
    Generate(GenerateArgs),
    /// Chat with the gift assistant
    Chat {
        #[command(subcommand)]
        command: ChatCommands,
    },
    /// Create an account
    Signup {
        #[arg(long)]
        first_name: String,
        #[arg(long)]
        last_name: String,
        #[arg(long)]
        email: String,
        /// Account password (at least 8 characters)
        #[arg(long, env = "GIFTWISE_PASSWORD")]
        password: String,
    },
    /// Log in and store the access token
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "GIFTWISE_PASSWORD")]
        password: String,
    },
    /// Remove stored credentials
    Logout,
    /// Show the account behind the stored token
    Whoami,
}

#[tokio::main]
async fn main() {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();
    let api_url = cli.api_url.trim_end_matches('/').to_string();
    if api_url.is_empty() {
        util::exit_error("API URL must not be empty", Some("Set --api-url or GIFTWISE_API_URL"));
    }

    let code = match cli.command {
        Commands::Health => commands::health::run(&api_url, cli.raw).await,
        Commands::Generate(args) => commands::generate::run(&api_url, args, cli.raw).await,
        Commands::Chat { command } => commands::chat::run(&api_url, command, cli.raw).await,
        Commands::Signup {
            first_name,
            last_name,
            email,
            password,
        } => {
            commands::auth::signup(&api_url, &first_name, &last_name, &email, &password, cli.raw)
                .await
        }
        Commands::Login { email, password } => {
            commands::auth::login(&api_url, &email, &password, cli.raw).await
        }
        Commands::Logout => commands::auth::logout(cli.raw),
        Commands::Whoami => commands::auth::whoami(&api_url, cli.raw).await,
    };

    std::process::exit(code);
}
