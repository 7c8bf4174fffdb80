use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{image_mime, output_item, output_success, resolve_user_id};
use crate::cli::Context;

#[derive(Subcommand)]
pub enum UserCommands {
    #[command(about = "Show a user (defaults to the signed-in user)")]
    Show {
        #[arg(help = "User ID")]
        id: Option<String>,
    },

    #[command(about = "Upload a profile photo")]
    UploadPhoto {
        #[arg(help = "Image file")]
        file: PathBuf,
        #[arg(long, help = "User ID (defaults to the signed-in user)")]
        user: Option<String>,
    },

    #[command(about = "Delete the profile photo (a missing photo counts as success)")]
    DeletePhoto {
        #[arg(long, help = "User ID (defaults to the signed-in user)")]
        user: Option<String>,
    },
}

pub async fn handle(cmd: UserCommands, ctx: &Context) -> anyhow::Result<()> {
    let users = ctx.client.users();

    match cmd {
        UserCommands::Show { id } => {
            let user_id = resolve_user_id(id, ctx.session_user_id())?;
            let user = users
                .user(&user_id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("User '{}' not found", user_id))?;
            output_item(&ctx.output, &user, |user| {
                println!("{} <{}>", user.display_name(), user.email);
                println!("ID: {}", user.id);
                if let Some(active) = user.is_active {
                    println!("Active: {}", active);
                }
                if let Some(photo) = &user.profile_photo_url {
                    println!("Photo: {}", photo);
                }
            })
        }
        UserCommands::UploadPhoto { file, user } => {
            let user_id = resolve_user_id(user, ctx.session_user_id())?;
            let bytes = tokio::fs::read(&file).await?;
            let file_name = file
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or("photo.jpg")
                .to_string();
            let response = users.upload_photo(&user_id, &file_name, bytes, image_mime(&file)).await?;
            output_success(&ctx.output, "Profile photo uploaded", response)
        }
        UserCommands::DeletePhoto { user } => {
            let user_id = resolve_user_id(user, ctx.session_user_id())?;
            users.delete_photo(&user_id).await?;
            output_success(
                &ctx.output,
                "Profile photo deleted",
                Some(json!({ "user_id": user_id })),
            )
        }
    }
}
