use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::{output_item, output_list, output_success};
use crate::cli::Context;
use crate::models::{CreateDeviceInput, Device, DeviceCategory, UpdateDeviceInput};

#[derive(Subcommand)]
pub enum DeviceCommands {
    #[command(about = "List devices, optionally for one plant")]
    List {
        #[arg(long, help = "Plant ID")]
        plant: Option<String>,
    },

    #[command(about = "Show one device")]
    Show {
        #[arg(help = "Device ID")]
        id: String,
    },

    #[command(about = "Register a device")]
    Create {
        #[arg(long, help = "Device name")]
        name: String,
        #[arg(long, help = "microcontroller or sensor")]
        category: DeviceCategory,
        #[arg(long)]
        description: Option<String>,
        #[arg(long, help = "Firmware or hardware version")]
        version: Option<String>,
    },

    #[command(about = "Update a device")]
    Update {
        #[arg(help = "Device ID")]
        id: String,
        #[arg(long)]
        name: Option<String>,
        #[arg(long)]
        category: Option<DeviceCategory>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        version: Option<String>,
    },

    #[command(about = "Delete a device (already-deleted devices count as success)")]
    Delete {
        #[arg(help = "Device ID")]
        id: String,
    },
}

fn device_line(device: &Device) -> String {
    format!(
        "{}\t{}\t{}\t{}",
        device.id,
        device.name,
        device.category,
        device.version.as_deref().unwrap_or("-")
    )
}

pub async fn handle(cmd: DeviceCommands, ctx: &Context) -> anyhow::Result<()> {
    let devices = ctx.client.devices();

    match cmd {
        DeviceCommands::List { plant } => {
            let list = match plant {
                Some(plant_id) => devices.for_plant(&plant_id).await?,
                None => devices.list().await?,
            }
            .unwrap_or_default();
            output_list(&ctx.output, "devices", &list, "No devices found", device_line)
        }
        DeviceCommands::Show { id } => {
            let device = devices
                .device(&id)
                .await?
                .ok_or_else(|| anyhow::anyhow!("Device '{}' not found", id))?;
            output_item(&ctx.output, &device, |device| {
                println!("{} ({})", device.name, device.category);
                println!("ID: {}", device.id);
                if let Some(version) = &device.version {
                    println!("Version: {}", version);
                }
                if let Some(description) = &device.description {
                    println!("Description: {}", description);
                }
            })
        }
        DeviceCommands::Create {
            name,
            category,
            description,
            version,
        } => {
            let input = CreateDeviceInput {
                name,
                description,
                version,
                category,
                user_id: ctx.session_user_id(),
            };
            let device = devices.create(&input).await?;
            output_success(
                &ctx.output,
                &format!("Device '{}' created with id {}", device.name, device.id),
                Some(json!({ "device": device })),
            )
        }
        DeviceCommands::Update {
            id,
            name,
            category,
            description,
            version,
        } => {
            let input = UpdateDeviceInput {
                name,
                description,
                version,
                category,
            };
            let device = devices.update(&id, &input).await?;
            output_success(
                &ctx.output,
                &format!("Device '{}' updated", device.name),
                Some(json!({ "device": device })),
            )
        }
        DeviceCommands::Delete { id } => {
            devices.delete(&id).await?;
            output_success(&ctx.output, &format!("Device '{}' deleted", id), None)
        }
    }
}
