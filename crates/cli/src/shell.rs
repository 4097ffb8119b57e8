//! Interactive prompt that keeps one session alive in-process
//!
//! Unlike the one-shot commands, the idle timer runs here, so a session that
//! sits unused past its timeout is logged out while the prompt waits.

use anyhow::Result;
use authfront_core::{CredentialTransport, ProfileUpdate, Session, SessionController, Storage};
use std::io::Write;
use std::str::FromStr;
use tokio::io::{AsyncBufReadExt, BufReader};
use tracing::debug;

use crate::commands::{print_logged_in, print_route, print_status, print_user, show_profile};

const HELP: &str = "\
Commands:
  login <email> <password>
  token <access-token>
  google <id-token>
  register <email> <password> <firstname> <lastname>
  profile [--refresh]
  update [email=<v>] [firstname=<v>] [lastname=<v>]
  logout
  status
  route <path>
  help
  quit";

#[derive(Debug, Clone, PartialEq, Eq)]
enum ShellCommand {
    Login { email: String, password: String },
    Token(String),
    Google(String),
    Register {
        email: String,
        password: String,
        firstname: String,
        lastname: String,
    },
    Profile { refresh: bool },
    Update(ProfileUpdate),
    Logout,
    Status,
    Route(String),
    Help,
    Quit,
}

impl FromStr for ShellCommand {
    type Err = String;

    fn from_str(line: &str) -> Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let command = words.next().unwrap_or_default();
        let args: Vec<&str> = words.collect();

        let parsed = match (command, args.as_slice()) {
            ("login", [email, password]) => ShellCommand::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("token", [token]) => ShellCommand::Token(token.to_string()),
            ("google", [id_token]) => ShellCommand::Google(id_token.to_string()),
            ("register", [email, password, firstname, lastname]) => ShellCommand::Register {
                email: email.to_string(),
                password: password.to_string(),
                firstname: firstname.to_string(),
                lastname: lastname.to_string(),
            },
            ("profile", []) => ShellCommand::Profile { refresh: false },
            ("profile", ["--refresh"]) | ("refresh", []) => ShellCommand::Profile { refresh: true },
            ("update", fields) => ShellCommand::Update(parse_update(fields)?),
            ("logout", []) => ShellCommand::Logout,
            ("status", []) => ShellCommand::Status,
            ("route", [path]) => ShellCommand::Route(path.to_string()),
            ("help" | "?", _) => ShellCommand::Help,
            ("quit" | "exit", _) => ShellCommand::Quit,
            (
                "login" | "token" | "google" | "register" | "profile" | "refresh" | "logout"
                | "status" | "route",
                _,
            ) => return Err(format!("wrong arguments for `{command}`; try `help`")),
            _ => return Err(format!("unknown command `{command}`; try `help`")),
        };
        Ok(parsed)
    }
}

fn parse_update(fields: &[&str]) -> Result<ProfileUpdate, String> {
    let mut update = ProfileUpdate::default();
    for field in fields {
        let (key, value) = field
            .split_once('=')
            .ok_or_else(|| format!("expected field=value, got `{field}`"))?;
        let value = Some(value.to_string());
        match key {
            "email" => update.email = value,
            "firstname" => update.firstname = value,
            "lastname" => update.lastname = value,
            _ => return Err(format!("unknown profile field `{key}`")),
        }
    }
    Ok(update)
}

/// Run the prompt until `quit` or end of input
pub async fn run<T, S>(controller: &SessionController<T, S>) -> Result<()>
where
    T: CredentialTransport,
    S: Storage + 'static,
{
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut session_rx = controller.subscribe();

    println!("authfront shell; type `help` for commands");

    loop {
        prompt(&session_rx.borrow())?;

        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match line.parse::<ShellCommand>() {
                    Ok(ShellCommand::Quit) => break,
                    Ok(command) => {
                        if let Err(e) = execute(controller, command).await {
                            println!("error: {e}");
                        }
                    }
                    Err(message) => println!("{message}"),
                }

                // Changes made by the command itself are not expiry notices
                session_rx.borrow_and_update();
            }
            changed = session_rx.changed() => {
                if changed.is_err() {
                    break;
                }
                let authenticated = session_rx.borrow_and_update().is_authenticated();
                if !authenticated {
                    println!();
                    println!("Session expired; you have been logged out");
                }
            }
        }
    }

    debug!("Shell finished");
    Ok(())
}

fn prompt(session: &Session) -> Result<()> {
    let who = match (&session.user, session.is_authenticated()) {
        (Some(user), _) => user.email.as_str(),
        (None, true) => "(loading)",
        (None, false) => "guest",
    };
    print!("{who}> ");
    std::io::stdout().flush()?;
    Ok(())
}

async fn execute<T, S>(controller: &SessionController<T, S>, command: ShellCommand) -> Result<()>
where
    T: CredentialTransport,
    S: Storage + 'static,
{
    match command {
        ShellCommand::Login { email, password } => {
            let user = controller.login(&email, &password).await?;
            print_logged_in(&user, None);
            print_expiry(controller);
        }
        ShellCommand::Token(token) => {
            let user = controller.login_with_token(&token).await?;
            print_logged_in(&user, None);
            print_expiry(controller);
        }
        ShellCommand::Google(id_token) => {
            let user = controller.login_federated(&id_token).await?;
            print_logged_in(&user, None);
            print_expiry(controller);
        }
        ShellCommand::Register {
            email,
            password,
            firstname,
            lastname,
        } => {
            controller
                .register(&email, &password, &firstname, &lastname)
                .await?;
            println!("Registered {email}. Log in to continue.");
        }
        ShellCommand::Profile { refresh } => {
            let user = show_profile(controller, refresh).await?;
            print_user(&user);
        }
        ShellCommand::Update(update) => {
            let user = controller.update_profile(&update).await?;
            println!("Profile updated");
            print_user(&user);
        }
        ShellCommand::Logout => {
            controller.logout();
            println!("Logged out");
        }
        ShellCommand::Status => print_status(controller),
        ShellCommand::Route(path) => print_route(&path, controller.is_authenticated()),
        ShellCommand::Help => println!("{HELP}"),
        ShellCommand::Quit => {}
    }
    Ok(())
}

fn print_expiry<T, S>(controller: &SessionController<T, S>)
where
    T: CredentialTransport,
    S: Storage + 'static,
{
    if let Some(at) = controller.expires_at() {
        let local = at.with_timezone(&chrono::Local);
        println!("Idle timeout at {}", local.format("%H:%M:%S"));
    }
}
