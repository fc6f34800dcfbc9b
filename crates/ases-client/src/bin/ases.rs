use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context as _;
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use ases_client::api::{HttpAuthApi, ProfileUpdate, RegisterForm};
use ases_client::controller::{Route, SessionController, SessionState};
use ases_client::store::FileSessionStore;
use ases_domain::account::{AccountView, Locale};

// ────────────────────────────────────── CLI Types ──────────────────────────────────────

#[derive(Parser)]
#[command(name = "ases")]
#[command(about = "ASESystem account CLI")]
struct Cli {
    /// Auth service base URL
    #[arg(long, env = "ASES_BASE_URL", default_value = "http://127.0.0.1:3112")]
    base_url: String,

    /// Where the logged-in session is kept
    #[arg(long, env = "ASES_SESSION_FILE", default_value = ".ases-session.json")]
    session_file: PathBuf,

    /// Request timeout in seconds
    #[arg(long, default_value_t = 15)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create an account; a one-time passcode is mailed to the address
    Register {
        #[arg(long)]
        full_name: String,
        #[arg(long)]
        position: String,
        #[arg(long)]
        employee_id: String,
        #[arg(long)]
        email: String,
        #[arg(long, env = "ASES_PASSWORD")]
        password: String,
        /// `en` or `ar`
        #[arg(long)]
        language: Option<Locale>,
    },
    /// Activate an account with the mailed passcode
    Verify {
        #[arg(long)]
        email: String,
        #[arg(long)]
        otp: String,
    },
    /// Mail a fresh passcode
    Resend {
        #[arg(long)]
        email: String,
    },
    /// Log in and store the session
    Login {
        #[arg(long)]
        email: String,
        #[arg(long, env = "ASES_PASSWORD")]
        password: String,
    },
    /// Forget the stored session
    Logout,
    /// Show the logged-in account
    Whoami,
    /// Change profile fields of the logged-in account
    UpdateProfile {
        #[arg(long)]
        full_name: Option<String>,
        #[arg(long)]
        position: Option<String>,
        #[arg(long)]
        language: Option<Locale>,
    },
}

// ────────────────────────────────────── Main ──────────────────────────────────────

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let api = HttpAuthApi::new(&cli.base_url, Duration::from_secs(cli.timeout))
        .context("failed to build HTTP client")?;
    let mut ctl = SessionController::new(api, FileSessionStore::new(cli.session_file));

    match cli.command {
        Command::Register {
            full_name,
            position,
            employee_id,
            email,
            password,
            language,
        } => {
            ctl.register(RegisterForm {
                full_name,
                position,
                employee_id,
                email: email.clone(),
                password,
                language,
            })
            .await?;
            println!("Registered {email}. Check your inbox, then run `ases verify`.");
        }
        Command::Verify { email, otp } => {
            ctl.await_verification(&email);
            ctl.verify_otp(&otp).await?;
            println!("Account verified. You can now log in.");
        }
        Command::Resend { email } => {
            ctl.await_verification(&email);
            ctl.resend_otp().await?;
            println!("A new OTP has been sent to {email}.");
        }
        Command::Login { email, password } => {
            let route = ctl.login(&email, &password).await?;
            if let SessionState::Authenticated { user, .. } = ctl.state() {
                print_user(user);
            }
            println!("-> {}", route_name(route));
        }
        Command::Logout => {
            ctl.logout()?;
            println!("Logged out.");
        }
        Command::Whoami => {
            require_session(&mut ctl)?;
            let user = ctl.refresh_profile().await?;
            print_user(&user);
        }
        Command::UpdateProfile {
            full_name,
            position,
            language,
        } => {
            require_session(&mut ctl)?;
            let user = ctl
                .update_profile(ProfileUpdate {
                    full_name,
                    position,
                    language,
                })
                .await?;
            print_user(&user);
        }
    }
    Ok(())
}

fn require_session(
    ctl: &mut SessionController<HttpAuthApi, FileSessionStore>,
) -> anyhow::Result<()> {
    if ctl.restore() == Route::Login {
        anyhow::bail!("not logged in; run `ases login` first");
    }
    Ok(())
}

fn route_name(route: Route) -> &'static str {
    match route {
        Route::Login => "login",
        Route::VerifyOtp => "verify-otp",
        Route::Dashboard => "dashboard",
        Route::AdminDashboard => "admin dashboard",
    }
}

fn print_user(user: &AccountView) {
    println!("{} <{}>", user.full_name, user.email);
    println!("  position:    {}", user.position);
    println!("  employee id: {}", user.employee_id);
    println!("  role:        {}", user.role);
    println!("  language:    {}", user.language);
}
