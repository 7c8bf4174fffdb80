use std::io::{self, BufRead, Write};

use serde::Serialize;
use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::client::ClientError;

/// Output a success message in the appropriate format
pub fn output_success(output_format: &OutputFormat, message: &str, data: Option<Value>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            match data {
                Some(Value::Object(fields)) => {
                    if let Some(object) = response.as_object_mut() {
                        object.extend(fields);
                    }
                }
                Some(other) => response["data"] = other,
                None => {}
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an error message in the appropriate format
pub fn output_error(output_format: &OutputFormat, message: &str, error_code: Option<&str>) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&error_envelope(message, error_code))?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", message);
        }
    }
    Ok(())
}

fn error_envelope(message: &str, error_code: Option<&str>) -> Value {
    let mut response = json!({
        "success": false,
        "error": message
    });
    if let Some(code) = error_code {
        response["error_code"] = json!(code);
    }
    response
}

/// HTTP status of a failed client call, when there was one.
pub fn error_code(err: &anyhow::Error) -> Option<String> {
    err.downcast_ref::<ClientError>()
        .and_then(ClientError::status)
        .map(|status| status.as_u16().to_string())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(output_format: &OutputFormat, collection_name: &str, message: &str) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: []
                }))?
            );
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Print a value as pretty JSON, or hand it to `text` for the human format.
pub fn output_item<T, F>(output_format: &OutputFormat, item: &T, text: F) -> anyhow::Result<()>
where
    T: Serialize,
    F: FnOnce(&T),
{
    match output_format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(item)?),
        OutputFormat::Text => text(item),
    }
    Ok(())
}

/// Like [`output_item`] for lists; empty lists get `empty_message`.
pub fn output_list<T, F>(
    output_format: &OutputFormat,
    collection_name: &str,
    items: &[T],
    empty_message: &str,
    line: F,
) -> anyhow::Result<()>
where
    T: Serialize,
    F: Fn(&T) -> String,
{
    if items.is_empty() {
        return output_empty_collection(output_format, collection_name, empty_message);
    }

    match output_format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::to_string_pretty(&json!({
                    collection_name: items
                }))?
            );
        }
        OutputFormat::Text => {
            for item in items {
                println!("{}", line(item));
            }
        }
    }
    Ok(())
}

/// Use the given id or fall back to the signed-in user's.
pub fn resolve_user_id(provided: Option<String>, session_user: Option<String>) -> anyhow::Result<String> {
    provided
        .or(session_user)
        .ok_or_else(|| anyhow::anyhow!("Not logged in; pass a user id or run `rootly auth login`"))
}

/// Take a flag value or read one line from stdin.
pub fn prompt_secret(provided: Option<String>, label: &str) -> anyhow::Result<String> {
    if let Some(value) = provided {
        return Ok(value);
    }

    eprint!("{}: ", label);
    io::stderr().flush()?;

    let mut line = String::new();
    io::stdin().lock().read_line(&mut line)?;
    let value = line.trim_end_matches(['\r', '\n']).to_string();
    if value.is_empty() {
        anyhow::bail!("{} is required", label);
    }
    Ok(value)
}

/// Best-effort MIME type for an image path.
pub fn image_mime(path: &std::path::Path) -> &'static str {
    match path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("gif") => "image/gif",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::Path;

    #[test]
    fn user_id_falls_back_to_session() {
        assert_eq!(resolve_user_id(Some("7".into()), Some("3".into())).unwrap(), "7");
        assert_eq!(resolve_user_id(None, Some("3".into())).unwrap(), "3");
        assert!(resolve_user_id(None, None).is_err());
    }

    #[test]
    fn error_envelope_carries_status_code() {
        let err = anyhow::Error::new(ClientError::Http {
            status: reqwest::StatusCode::NOT_FOUND,
            message: "Plant not found".into(),
        });
        let code = error_code(&err);
        assert_eq!(code.as_deref(), Some("404"));
        assert_eq!(
            error_envelope(&err.to_string(), code.as_deref()),
            json!({
                "success": false,
                "error": "HTTP error! status: 404 Not Found, message: Plant not found",
                "error_code": "404"
            })
        );
        assert!(error_code(&anyhow::anyhow!("no session")).is_none());
        assert_eq!(error_envelope("boom", None), json!({ "success": false, "error": "boom" }));
    }

    #[test]
    fn mime_follows_extension() {
        assert_eq!(image_mime(Path::new("leaf.PNG")), "image/png");
        assert_eq!(image_mime(Path::new("leaf")), "image/jpeg");
    }
}
