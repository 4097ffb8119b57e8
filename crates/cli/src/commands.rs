//! CLI commands

use anyhow::Result;
use authfront_core::{
    CredentialTransport, GuardDecision, ProfileUpdate, SessionController, SessionError,
    Storage, User, guard, post_login_destination, resolve,
};
use clap::Subcommand;
use tracing::info;

use crate::shell;

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with email and password
    Login {
        #[arg(long)]
        email: String,

        #[arg(long, env = "AUTHFRONT_PASSWORD", hide_env_values = true)]
        password: String,

        /// Protected path that sent you to the login screen
        #[arg(long)]
        from: Option<String>,
    },

    /// Start a session with an access token obtained elsewhere
    LoginToken {
        token: String,
    },

    /// Sign in with a Google ID token
    LoginGoogle {
        id_token: String,
    },

    /// Create an account
    Register {
        #[arg(long)]
        email: String,

        #[arg(long, env = "AUTHFRONT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        firstname: String,

        #[arg(long)]
        lastname: String,

        /// Log in right after the account is created
        #[arg(long)]
        login: bool,
    },

    /// Show the profile of the logged-in user
    Profile {
        /// Fetch the profile from the server instead of using the stored copy
        #[arg(long)]
        refresh: bool,
    },

    /// Update profile fields; omitted fields are left unchanged
    Update {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        firstname: Option<String>,

        #[arg(long)]
        lastname: Option<String>,
    },

    /// End the session and remove it from storage
    Logout,

    /// Show the current session
    Status,

    /// Show where navigating to a path would land
    Route {
        path: String,
    },

    /// Keep a session open in an interactive prompt
    Shell,
}

impl Commands {
    pub async fn execute<T, S>(self, controller: &SessionController<T, S>) -> Result<()>
    where
        T: CredentialTransport,
        S: Storage + 'static,
    {
        match self {
            Commands::Login {
                email,
                password,
                from,
            } => {
                let user = controller.login(&email, &password).await?;
                print_logged_in(&user, from.as_deref());
            }
            Commands::LoginToken { token } => {
                let user = controller.login_with_token(&token).await?;
                print_logged_in(&user, None);
            }
            Commands::LoginGoogle { id_token } => {
                let user = controller.login_federated(&id_token).await?;
                print_logged_in(&user, None);
            }
            Commands::Register {
                email,
                password,
                firstname,
                lastname,
                login,
            } => {
                if login {
                    let user = controller
                        .register_and_login(&email, &password, &firstname, &lastname)
                        .await?;
                    print_logged_in(&user, None);
                } else {
                    controller
                        .register(&email, &password, &firstname, &lastname)
                        .await?;
                    println!("Registered {email}. Log in to continue.");
                }
            }
            Commands::Profile { refresh } => {
                let user = show_profile(controller, refresh).await?;
                print_user(&user);
            }
            Commands::Update {
                email,
                firstname,
                lastname,
            } => {
                let update = ProfileUpdate {
                    email,
                    firstname,
                    lastname,
                };
                let user = controller.update_profile(&update).await?;
                println!("Profile updated");
                print_user(&user);
            }
            Commands::Logout => {
                controller.logout();
                println!("Logged out");
            }
            Commands::Status => print_status(controller),
            Commands::Route { path } => print_route(&path, controller.is_authenticated()),
            Commands::Shell => shell::run(controller).await?,
        }

        Ok(())
    }
}

/// The stored profile, fetched first when missing or when `refresh` is set
pub async fn show_profile<T, S>(
    controller: &SessionController<T, S>,
    refresh: bool,
) -> Result<User, SessionError>
where
    T: CredentialTransport,
    S: Storage + 'static,
{
    match controller.current_user() {
        Some(user) if !refresh => Ok(user),
        _ => {
            info!("Fetching profile from server");
            controller.refresh_profile().await
        }
    }
}

pub fn print_logged_in(user: &User, from: Option<&str>) {
    println!("Logged in as {} <{}>", user.display_name(), user.email);
    println!("Continue to {}", post_login_destination(from));
}

pub fn print_user(user: &User) {
    println!("[{}] {}", user.initials(), user.display_name());
    println!("  email: {}", user.email);
    println!("  role:  {}", user.role);
}

pub fn print_status<T, S>(controller: &SessionController<T, S>)
where
    T: CredentialTransport,
    S: Storage + 'static,
{
    let session = controller.session();
    if !session.is_authenticated() {
        println!("Not logged in");
        return;
    }

    match &session.user {
        Some(user) => println!("Logged in as {} <{}>", user.display_name(), user.email),
        None => println!("Logged in (profile not loaded)"),
    }
    match controller.expires_at() {
        Some(at) => println!("Session expires at {}", at.to_rfc3339()),
        None => println!("No idle timer running in this process"),
    }
}

pub fn print_route(path: &str, is_authenticated: bool) {
    match guard(path, is_authenticated) {
        GuardDecision::Allow(screen) => println!("{path}: show {}", screen.path()),
        GuardDecision::RedirectToProfile => println!("{path}: redirect to /profile"),
        GuardDecision::RedirectToLogin { from: Some(from) } => {
            println!("{path}: redirect to /login (from {from})")
        }
        GuardDecision::RedirectToLogin { from: None } => println!("{path}: redirect to /login"),
    }

    let (screen, from) = resolve(path, is_authenticated);
    match from {
        Some(from) => println!("lands on {} (returns to {from} after login)", screen.path()),
        None => println!("lands on {}", screen.path()),
    }
}
