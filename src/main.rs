use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::io::{BufRead, Write};

use festival_booking::api::{self, BookingApi, HttpBookingApi};
use festival_booking::booking::FieldUpdate;
use festival_booking::config::Config;
use festival_booking::logging;
use festival_booking::session::{Session, SessionHandle, SessionKind};
use festival_booking::store::FileStore;
use festival_booking::submission::{self, LogoutTiming, SubmissionOutcome};
use festival_booking::wizard::{Transition, Variant, Wizard};

#[derive(Parser)]
#[command(name = "festival-booking")]
#[command(about = "Festival registration for attendees and artists")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long, global = true)]
    config: Option<String>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Use the artist registration instead of the attendee one
    #[arg(short, long, global = true)]
    artist: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Log in with the shared festival password
    Login {
        /// Password (prompted for when omitted)
        #[arg(short, long)]
        password: Option<String>,

        /// Log in to the organiser area instead
        #[arg(long)]
        admin: bool,
    },

    /// Forget the current session
    Logout,

    /// Show the current step, submission status and session
    Status,

    /// List the options offered by the festival
    Content,

    /// Set a booking field, e.g. `set ticket_id 2`
    Set {
        /// Field name as sent to the service (first_name, ticket_id, material_ids, ...)
        field: String,

        /// New value
        value: String,
    },

    /// Validate the current step and move on
    Next,

    /// Go back one step
    Back,

    /// Show what will be booked
    Summary,

    /// Send the booking from the confirmation step
    Submit,

    /// Discard the draft and start over
    Reset,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let config = Config::load(cli.config.as_deref())?;

    let _logging_handle = logging::init_logging(&config, cli.debug)?;

    let variant = if cli.artist {
        Variant::Artist
    } else {
        Variant::Attendee
    };

    match cli.command {
        Commands::Login { password, admin } => {
            let kind = if admin {
                SessionKind::Admin
            } else {
                SessionKind::from(variant)
            };
            cmd_login(&config, kind, password).await?;
        }
        Commands::Logout => cmd_logout(&config, variant)?,
        Commands::Status => cmd_status(&config, variant)?,
        Commands::Content => cmd_content(&config, variant).await?,
        Commands::Set { field, value } => cmd_set(&config, variant, &field, &value).await?,
        Commands::Next => cmd_next(&config, variant).await?,
        Commands::Back => cmd_back(&config, variant)?,
        Commands::Summary => cmd_summary(&config, variant).await?,
        Commands::Submit => cmd_submit(&config, variant).await?,
        Commands::Reset => cmd_reset(&config, variant)?,
    }

    Ok(())
}

fn open_wizard(config: &Config, variant: Variant) -> Result<Wizard> {
    let backend = FileStore::open(config.drafts_path()).context("Failed to open draft store")?;
    Ok(Wizard::open(variant, backend))
}

fn load_session(config: &Config, kind: SessionKind) -> Result<SessionHandle> {
    SessionHandle::load(&config.session_path(), kind).context("Failed to load session")
}

fn save_session(config: &Config, session: &SessionHandle) -> Result<()> {
    session
        .save(&config.session_path())
        .context("Failed to save session")
}

fn client(config: &Config) -> Result<HttpBookingApi> {
    HttpBookingApi::new(&config.api).context("Failed to create booking service client")
}

/// Open the wizard with a fresh catalog; requires a live session
async fn open_with_content(
    config: &Config,
    variant: Variant,
    api: &dyn BookingApi,
) -> Result<(Wizard, SessionHandle)> {
    let session = load_session(config, SessionKind::from(variant))?;
    if !session.is_authenticated() {
        save_session(config, &session)?;
        bail!(
            "Not logged in. Run 'festival-booking {}login' first",
            if variant == Variant::Artist { "--artist " } else { "" }
        );
    }

    let mut wizard = open_wizard(config, variant)?;
    let loaded = api::load_form_content(&mut wizard, &session, api).await;
    save_session(config, &session)?;
    loaded.context("Could not load the festival options, you have been logged out")?;

    Ok((wizard, session))
}

fn read_password() -> Result<String> {
    eprint!("Password: ");
    std::io::stderr().flush()?;
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .context("Failed to read password")?;
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

async fn cmd_login(config: &Config, kind: SessionKind, password: Option<String>) -> Result<()> {
    let password = match password {
        Some(password) => password,
        None => read_password()?,
    };
    if password.is_empty() {
        bail!("Password must not be empty");
    }

    let api = client(config)?;
    let token = match api.login(kind, &password).await {
        Ok(token) => token,
        Err(e) if e.is_auth_error() => bail!("Wrong password"),
        Err(e) => return Err(e).context("Login failed"),
    };

    let session = SessionHandle::new(Session::new(kind));
    session.login(token);
    save_session(config, &session)?;

    println!("Logged in ({})", kind);
    Ok(())
}

fn cmd_logout(config: &Config, variant: Variant) -> Result<()> {
    let session = load_session(config, SessionKind::from(variant))?;
    session.invalidate();
    save_session(config, &session)?;
    println!("Logged out");
    Ok(())
}

fn cmd_status(config: &Config, variant: Variant) -> Result<()> {
    let session = load_session(config, SessionKind::from(variant))?;
    let wizard = open_wizard(config, variant)?;

    let steps = wizard.steps();
    println!(
        "{} registration, step {}/{}: {}",
        variant,
        wizard.active_step() + 1,
        steps.len(),
        wizard.step().title(variant)
    );
    println!("Status:  {}", wizard.status().label());
    println!(
        "Session: {}",
        if session.is_authenticated() {
            match session.snapshot().expires_at() {
                Some(deadline) => format!("logged in until {}", deadline.format("%Y-%m-%d %H:%M:%S UTC")),
                None => "logged in".to_string(),
            }
        } else {
            "logged out".to_string()
        }
    );
    if !wizard.current_error().is_empty() {
        println!("Error:   {}", wizard.current_error());
    }

    save_session(config, &session)?;
    Ok(())
}

async fn cmd_content(config: &Config, variant: Variant) -> Result<()> {
    let api = client(config)?;
    let (wizard, _session) = open_with_content(config, variant, &api).await?;
    let content = wizard.content();

    println!("Tickets (ticket_id)");
    for ticket in &content.ticket_options {
        let sold_out = if ticket.is_sold_out() { " [ausgebucht]" } else { "" };
        println!("  {:>3}  {} - {:.2} €{}", ticket.id, ticket.title, ticket.price, sold_out);
    }
    println!("Getränke (beverage_id)");
    for option in &content.beverage_options {
        println!("  {:>3}  {} - {:.2} €", option.id, option.title, option.price);
    }
    println!("Essen (food_id)");
    for option in &content.food_options {
        println!("  {:>3}  {} - {:.2} €", option.id, option.title, option.price);
    }

    let (label, materials) = match variant {
        Variant::Attendee => ("material_ids", &content.materials),
        Variant::Artist => ("artist_material_ids", &content.artist_materials),
    };
    println!("Material ({})", label);
    for material in materials {
        println!("  {:>3}  {}", material.id, material.title);
    }

    if variant == Variant::Attendee {
        println!("Schichten (timeslot_priority_1..3)");
        for shift in &content.work_shifts {
            for slot in &shift.time_slots {
                println!("  {:>3}  {} ({})", slot.id, shift.title, slot.title);
            }
        }
    }
    Ok(())
}

async fn cmd_set(config: &Config, variant: Variant, field: &str, value: &str) -> Result<()> {
    let update = FieldUpdate::parse(field, value)?;
    let validated = update.field();

    let api = client(config)?;
    let (mut wizard, _session) = open_with_content(config, variant, &api).await?;
    if wizard.is_locked() {
        bail!("The booking has already been submitted");
    }

    wizard.update(update);
    if let Some(field) = validated {
        let message = wizard.validate_field(field);
        if !message.is_empty() {
            println!("{}", message);
        }
    }
    println!("Gesamt: {:.2} €", wizard.booking().total_price());
    Ok(())
}

async fn cmd_next(config: &Config, variant: Variant) -> Result<()> {
    let api = client(config)?;
    let (mut wizard, _session) = open_with_content(config, variant, &api).await?;

    match wizard.next() {
        Transition::Advanced(step) => println!("{}", step.title(variant)),
        Transition::Blocked { error, .. } => println!("{}", error),
        Transition::Unchanged if wizard.is_final_step() => {
            println!("Last step reached, use 'submit' to send the booking")
        }
        _ => println!("Navigation is locked after submitting"),
    }
    Ok(())
}

fn cmd_back(config: &Config, variant: Variant) -> Result<()> {
    let mut wizard = open_wizard(config, variant)?;
    match wizard.back() {
        Transition::Retreated(step) => println!("{}", step.title(variant)),
        _ => println!("Already at the first step"),
    }
    Ok(())
}

async fn cmd_summary(config: &Config, variant: Variant) -> Result<()> {
    let api = client(config)?;
    let (wizard, _session) = open_with_content(config, variant, &api).await?;
    println!("{}", wizard.summary());
    Ok(())
}

async fn cmd_submit(config: &Config, variant: Variant) -> Result<()> {
    let api = client(config)?;
    let (mut wizard, session) = open_with_content(config, variant, &api).await?;
    let timing = LogoutTiming::from(&config.session);

    let outcome = submission::submit(&mut wizard, &session, &api, &timing).await;
    save_session(config, &session)?;

    match outcome {
        SubmissionOutcome::Accepted => println!("Danke! Deine Buchung ist eingegangen."),
        SubmissionOutcome::Failed { message } => bail!("Submission failed: {}", message),
        SubmissionOutcome::Unauthorized => bail!("Your session has expired, please log in again"),
        SubmissionOutcome::NotReady => bail!(
            "Nothing to submit: go to the last step first (status: {})",
            wizard.status().label()
        ),
    }
    Ok(())
}

fn cmd_reset(config: &Config, variant: Variant) -> Result<()> {
    let mut wizard = open_wizard(config, variant)?;
    wizard.reset();
    println!("Draft discarded");
    Ok(())
}
