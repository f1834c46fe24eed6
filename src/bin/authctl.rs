use std::io::{self, Write};
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use account_api::auth::responses::{AccountView, RegisterRequest};
use account_api::client::{
    ClientError, DEFAULT_API_URL, FileTokenStorage, HttpAuthApi, SessionHolder, TOKEN_STORAGE_KEY,
};

#[derive(Parser, Debug)]
#[command(name = "authctl", about = "Sign in to the account API from the command line")]
struct Args {
    /// Base URL of the auth API.
    #[arg(long, env = "ACCOUNT_API_URL", default_value = DEFAULT_API_URL)]
    api_url: String,

    /// File the bearer token is kept in between invocations.
    #[arg(long, env = "AUTHCTL_TOKEN_FILE", default_value = TOKEN_STORAGE_KEY)]
    token_file: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create an account and keep its token.
    Register {
        #[arg(long)]
        username: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
        /// Ten digits, no separators.
        #[arg(long)]
        phone_number: String,
        #[arg(long)]
        full_name: String,
    },
    /// Sign in and keep the token.
    Login {
        #[arg(long)]
        email: String,
        #[arg(long)]
        password: String,
    },
    /// Show the signed-in account, refreshed from the server.
    Profile,
    /// Print the signed-in username and email on one line.
    Whoami,
    /// Forget the stored token.
    Logout,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn"))
        .format_timestamp(None)
        .init();

    let args = Args::parse();
    let api = HttpAuthApi::new(args.api_url, reqwest::Client::new());
    let storage = FileTokenStorage::new(args.token_file);
    let mut session = SessionHolder::new(api, storage);

    let outcome = match args.command {
        Command::Register {
            username,
            email,
            password,
            phone_number,
            full_name,
        } => {
            let payload = RegisterRequest {
                username,
                email,
                password,
                phone_number,
                full_name,
            };
            session.register(&payload).await.map(|user| user.clone())
        }
        Command::Login { email, password } => {
            session.login(&email, &password).await.map(|user| user.clone())
        }
        Command::Profile => {
            session.restore().await?;
            session.require_authenticated().map(|user| user.clone())
        }
        Command::Whoami => {
            match session.restore().await?.cloned() {
                Some(user) => println!("{} <{}>", user.username, user.email),
                None => {
                    let message = session.last_error().unwrap_or("not logged in");
                    writeln!(io::stderr(), "{message}")?;
                    std::process::exit(1);
                }
            }
            return Ok(());
        }
        Command::Logout => {
            session.logout()?;
            println!("Logged out");
            return Ok(());
        }
    };

    match outcome {
        Ok(user) => {
            print_user(&user)?;
            Ok(())
        }
        Err(ClientError::NotAuthenticated) => {
            let message = session.last_error().unwrap_or("not logged in");
            writeln!(io::stderr(), "error: {message}")?;
            std::process::exit(1);
        }
        Err(err) => {
            let message = session.last_error().map(str::to_string).unwrap_or_else(|| err.to_string());
            writeln!(io::stderr(), "error: {message}")?;
            std::process::exit(1);
        }
    }
}

fn print_user(user: &AccountView) -> io::Result<()> {
    let rendered = serde_json::to_string_pretty(user).map_err(io::Error::other)?;
    writeln!(io::stdout(), "{rendered}")
}
