//! `storefront-session`: inspect and drive the persisted storefront session
//! from a terminal.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};

use storefront_auth::claims::{self, TokenStatus};
use storefront_client::{
    AccessDecision, AdminAware, ClientConfig, CredentialClient, FileStore, LoginForm, NoticeQueue,
    PromptListener, RegistrationForm, SessionGate, StayOnPage, prompt_channel, register_and_sign_in,
    sign_in,
};
use storefront_core::{Clock, SystemClock};

#[derive(Parser, Debug)]
#[command(
    name = "storefront-session",
    version,
    about = "Inspect and manage the local storefront session",
    propagate_version = true
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Decode a bearer token's claims without verifying it
    Decode {
        token: String,
    },
    #[command(flatten)]
    Session(SessionCommand),
}

/// Commands that operate on the persisted session.
#[derive(Subcommand, Debug)]
enum SessionCommand {
    /// Show the current session state
    Status,
    /// Sign in against the credential service
    Login(LoginArgs),
    /// Create an account and sign in with it
    Register(RegisterArgs),
    /// Clear the persisted session
    Logout,
    /// Check whether a guarded view would be allowed
    Check {
        /// Require an admin or organizer role
        #[arg(long)]
        admin: bool,
    },
}

#[derive(Args, Debug)]
struct LoginArgs {
    #[arg(long)]
    email: String,
    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
    /// Pre-fill this email next time
    #[arg(long)]
    remember: bool,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    name: String,
    #[arg(long)]
    email: String,
    #[arg(long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
    password: String,
}

struct Session {
    gate: SessionGate<FileStore, SystemClock>,
    notices: Arc<NoticeQueue>,
    prompts: PromptListener,
}

impl Session {
    fn open(config: &ClientConfig) -> anyhow::Result<Self> {
        let store = FileStore::open(&config.session_file)?;
        let notices = Arc::new(NoticeQueue::new());
        let (trigger, prompts) = prompt_channel();
        let gate = SessionGate::new(store, SystemClock, notices.clone(), trigger);
        Ok(Self { gate, notices, prompts })
    }

    fn flush(&mut self) {
        for notice in self.notices.drain() {
            println!("{notice}");
        }
        if self.gate.answer_prompt(&self.prompts).is_some() {
            println!("Sign in with `storefront-session login --email <email>` to continue.");
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    storefront_observability::init_pretty();

    let cli = Cli::parse();
    let result = match cli.command {
        Command::Decode { token } => Ok(decode(&token)),
        Command::Session(command) => run(command).await,
    };

    match result {
        Ok(code) => code,
        Err(err) => {
            eprintln!("error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

async fn run(command: SessionCommand) -> anyhow::Result<ExitCode> {
    let config = ClientConfig::from_env()?;
    let mut session = Session::open(&config)?;

    let code = match command {
        SessionCommand::Status => {
            let state = serde_json::to_string_pretty(session.gate.state())?;
            println!("{state}");
            if let Some(email) = session.gate.remembered_email() {
                println!("remembered email: {email}");
            }
            ExitCode::SUCCESS
        }
        SessionCommand::Login(args) => {
            let client = CredentialClient::new(&config).context("failed to build HTTP client")?;
            let form = LoginForm {
                email: args.email,
                password: args.password,
                remember_me: args.remember,
            };
            match sign_in(&client, &mut session.gate, &form).await {
                Ok(outcome) => {
                    println!("signed in; next: {:?}", outcome.destination(&AdminAware));
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    tracing::debug!(error = %err, "sign-in failed");
                    println!("{}", err.inline_message());
                    ExitCode::FAILURE
                }
            }
        }
        SessionCommand::Register(args) => {
            let client = CredentialClient::new(&config).context("failed to build HTTP client")?;
            let form = RegistrationForm {
                full_name: args.name,
                email: args.email,
                password: args.password,
            };
            match register_and_sign_in(&client, &mut session.gate, &form).await {
                Ok(outcome) => {
                    println!("registered; next: {:?}", outcome.destination(&StayOnPage));
                    ExitCode::SUCCESS
                }
                Err(err) => {
                    tracing::debug!(error = %err, "registration failed");
                    println!("{}", err.inline_message());
                    ExitCode::FAILURE
                }
            }
        }
        SessionCommand::Logout => {
            session.gate.logout();
            println!("signed out");
            ExitCode::SUCCESS
        }
        SessionCommand::Check { admin } => match session.gate.can_access(admin) {
            AccessDecision::Allow(principal) => {
                println!("allow ({})", principal.email.as_deref().unwrap_or("unknown user"));
                ExitCode::SUCCESS
            }
            AccessDecision::Deny(reason) => {
                println!("deny: {}", serde_json::to_string(&reason)?.trim_matches('"'));
                ExitCode::from(2)
            }
        },
    };

    session.flush();
    Ok(code)
}

fn decode(token: &str) -> ExitCode {
    let (claims, liveness) = match claims::inspect(token, SystemClock.now()) {
        TokenStatus::Valid(claims) => (claims, "live"),
        TokenStatus::Expired(claims) => (claims, "expired"),
        TokenStatus::Unparseable => {
            let reason = claims::decode(token).err().map(|e| e.to_string()).unwrap_or_default();
            println!("unparseable token: {reason}");
            return ExitCode::FAILURE;
        }
    };

    println!("sub:     {}", claims.sub.as_deref().unwrap_or("-"));
    println!("roles:   {}", claims.roles.as_deref().unwrap_or("-"));
    match claims.expires_at() {
        Some(at) => println!("expires: {at} ({liveness})"),
        None => println!("expires: - ({liveness})"),
    }
    ExitCode::SUCCESS
}
