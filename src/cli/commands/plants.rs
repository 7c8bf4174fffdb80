use std::path::PathBuf;

use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{image_mime, output_item, output_list, output_success, resolve_user_id};
use crate::cli::Context;
use crate::models::{CreatePlantInput, Device, Plant, UpdatePlantInput};

#[derive(Subcommand)]
pub enum PlantCommands {
    #[command(about = "List a user's plants (defaults to the signed-in user)")]
    List {
        #[arg(long, help = "User ID")]
        user: Option<String>,
    },

    #[command(about = "Show one plant")]
    Show {
        #[arg(help = "Plant ID")]
        id: String,
    },

    #[command(about = "Create a plant")]
    Create {
        #[arg(long, help = "Plant name")]
        name: String,
        #[arg(long, help = "Species")]
        species: String,
        #[arg(long, help = "Description")]
        description: Option<String>,
        #[arg(long, help = "Owner user ID (defaults to the signed-in user)")]
        user: Option<String>,
    },

    #[command(about = "Update a plant")]
    Update {
        #[arg(help = "Plant ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        species: Option<String>,
        #[arg(long)]
        description: Option<String>,
    },

    #[command(about = "Delete a plant")]
    Delete {
        #[arg(help = "Plant ID")]
        id: String,
    },

    #[command(about = "Download a plant photo, or upload one with --upload")]
    Photo {
        #[arg(help = "Plant ID")]
        id: String,
        #[arg(long, short, help = "Write the photo to this file", conflicts_with = "upload")]
        output: Option<PathBuf>,
        #[arg(long, help = "Image file to upload")]
        upload: Option<PathBuf>,
    },

    #[command(about = "List devices assigned to a plant")]
    Devices {
        #[arg(help = "Plant ID")]
        id: String,
    },

    #[command(about = "Assign a device to a plant")]
    Assign {
        #[arg(help = "Plant ID")]
        plant: String,
        #[arg(help = "Device ID")]
        device: String,
    },

    #[command(about = "Remove a device from a plant")]
    Unassign {
        #[arg(help = "Plant ID")]
        plant: String,
        #[arg(help = "Device ID")]
        device: String,
    },
}

fn plant_line(plant: &Plant) -> String {
    format!("{}\t{}\t{}", plant.id, plant.name, plant.species)
}

fn device_line(device: &Device) -> String {
    format!("{}\t{}\t{}", device.id, device.name, device.category)
}

pub async fn handle(cmd: PlantCommands, ctx: &Context) -> anyhow::Result<()> {
    let plants = ctx.client.plants();

    match cmd {
        PlantCommands::List { user } => {
            let user_id = resolve_user_id(user, ctx.session_user_id())?;
            let list = plants.user_plants(&user_id).await?.unwrap_or_default();
            output_list(&ctx.output, "plants", &list, "No plants found", plant_line)
        }
        PlantCommands::Show { id } => {
            let plant = plants
                .plant(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Plant '{}' not found", id))?;
            output_item(&ctx.output, &plant, |plant| {
                println!("{} ({})", plant.name, plant.species);
                println!("ID: {}", plant.id);
                if let Some(description) = &plant.description {
                    println!("Description: {}", description);
                }
            })
        }
        PlantCommands::Create {
            name,
            species,
            description,
            user,
        } => {
            let input = CreatePlantInput {
                name,
                species,
                description,
                user_id: resolve_user_id(user, ctx.session_user_id())?,
                photo_filename: None,
            };
            let plant = plants.create(&input).await?;
            output_success(
                &ctx.output,
                &format!("Plant '{}' created with id {}", plant.name, plant.id),
                Some(json!({ "plant": plant })),
            )
        }
        PlantCommands::Update {
            id,
            name,
            species,
            description,
        } => {
            let input = UpdatePlantInput {
                name,
                species,
                description,
                photo_filename: None,
            };
            if input.is_empty() {
                anyhow::bail!("Nothing to update; pass --name, --species or --description");
            }
            let plant = plants.update(&id, &input).await?;
            output_success(
                &ctx.output,
                &format!("Plant '{}' updated", plant.name),
                Some(json!({ "plant": plant })),
            )
        }
        PlantCommands::Delete { id } => {
            plants.delete(&id).await?;
            output_success(&ctx.output, &format!("Plant '{}' deleted", id), None)
        }
        PlantCommands::Photo { id, output, upload } => {
            if let Some(path) = upload {
                let bytes = tokio::fs::read(&path).await?;
                let file_name = path
                    .file_name()
                    .and_then(|name| name.to_str())
                    .unwrap_or("photo.jpg")
                    .to_string();
                let response = plants.upload_photo(&id, &file_name, bytes, image_mime(&path)).await?;
                return output_success(&ctx.output, "Photo uploaded", response);
            }

            let (bytes, content_type) = plants.photo(&id).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(format!("plant-{}.{}", id, extension_for(&content_type))));
            tokio::fs::write(&path, &bytes).await?;
            output_success(
                &ctx.output,
                &format!("Saved {} bytes to {}", bytes.len(), path.display()),
                Some(json!({ "path": path, "content_type": content_type })),
            )
        }
        PlantCommands::Devices { id } => {
            let devices = ctx.client.plant_devices().by_plant(&id).await?.unwrap_or_default();
            output_list(&ctx.output, "devices", &devices, "No devices assigned", device_line)
        }
        PlantCommands::Assign { plant, device } => {
            ctx.client.plant_devices().assign(&plant, &device).await?;
            output_success(
                &ctx.output,
                &format!("Device '{}' assigned to plant '{}'", device, plant),
                None,
            )
        }
        PlantCommands::Unassign { plant, device } => {
            ctx.client.plant_devices().remove(&plant, &device).await?;
            output_success(
                &ctx.output,
                &format!("Device '{}' removed from plant '{}'", device, plant),
                None,
            )
        }
    }
}

fn extension_for(content_type: &str) -> &'static str {
    match content_type {
        "image/png" => "png",
        "image/gif" => "gif",
        "image/webp" => "webp",
        _ => "jpg",
    }
}
