use clap::Subcommand;
use serde_json::json;

use crate::cli::config::{load_cli_config, save_cli_config};
use crate::cli::utils::{output_item, output_success, prompt_secret};
use crate::cli::{Context, OutputFormat};
use crate::models::RegisterUserInput;

#[derive(Subcommand)]
pub enum AuthCommands {
    #[command(about = "Login to the BFF")]
    Login {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },

    #[command(about = "Logout and clear the local session")]
    Logout,

    #[command(about = "Show current authentication status")]
    Status,

    #[command(about = "Refresh authentication token")]
    Refresh,

    #[command(about = "Show current user information")]
    Whoami,

    #[command(about = "Register new user")]
    Register {
        #[arg(help = "Email")]
        email: String,
        #[arg(long, help = "First name")]
        first_name: String,
        #[arg(long, help = "Last name")]
        last_name: String,
        #[arg(long, help = "Password (will prompt if not provided)")]
        password: Option<String>,
    },
}

pub async fn handle(cmd: AuthCommands, ctx: &Context) -> anyhow::Result<()> {
    let auth = ctx.client.auth();

    match cmd {
        AuthCommands::Login { email, password } => {
            let password = prompt_secret(password, "Password")?;
            let login = auth.login(&email, &password).await?;

            // Later commands talk to the server we logged in to
            let mut saved = load_cli_config()?;
            if saved.server_url.as_deref() != Some(ctx.server_url.as_str()) {
                saved.server_url = Some(ctx.server_url.clone());
                save_cli_config(&saved)?;
            }

            output_success(
                &ctx.output,
                &format!("Logged in as {}", login.user.display_name()),
                Some(json!({ "user": login.user, "server": ctx.server_url })),
            )
        }
        AuthCommands::Logout => {
            let result = auth.logout().await;
            output_success(&ctx.output, "Logged out", None)?;
            if let Err(err) = result {
                tracing::warn!("Server did not acknowledge logout: {}", err);
            }
            Ok(())
        }
        AuthCommands::Status => {
            let session = ctx.client.session();
            let status = json!({
                "authenticated": session.is_authenticated(),
                "server": ctx.server_url,
                "user": session.user(),
                "has_refresh_token": session.refresh_token().is_some(),
            });

            match &ctx.output {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&status)?),
                OutputFormat::Text => match session.user().filter(|_| session.is_authenticated()) {
                    Some(user) => println!("Logged in to {} as {} ({})", ctx.server_url, user.display_name(), user.email),
                    None => println!("Not logged in ({})", ctx.server_url),
                },
            }
            Ok(())
        }
        AuthCommands::Refresh => {
            auth.refresh().await?;
            output_success(&ctx.output, "Token refreshed", None)
        }
        AuthCommands::Whoami => {
            let user = auth
                .profile()
                .await?
                .ok_or_else(|| anyhow::anyhow!("No profile returned"))?;
            output_item(&ctx.output, &user, |user| {
                println!("{} <{}>", user.display_name(), user.email);
                println!("ID: {}", user.id);
                if let Some(roles) = &user.roles {
                    println!("Roles: {}", roles.join(", "));
                }
            })
        }
        AuthCommands::Register {
            email,
            first_name,
            last_name,
            password,
        } => {
            let password = prompt_secret(password, "Password")?;
            let input = RegisterUserInput {
                email: email.clone(),
                password,
                first_name,
                last_name,
            };

            match auth.register(&input).await? {
                Some(login) => output_success(
                    &ctx.output,
                    &format!("Registered and logged in as {}", login.user.display_name()),
                    Some(json!({ "user": login.user })),
                ),
                None => output_success(&ctx.output, &format!("Registered {}", email), None),
            }
        }
    }
}
