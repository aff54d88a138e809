use colored::Colorize;

use crate::safe_truncate;

/// Log an outgoing request for debugging (console output)
pub fn log_request(url: &str, body: &serde_json::Value, token: Option<&str>, verbose: bool) {
    if !verbose {
        return;
    }

    println!("\n{}", "═".repeat(80).bright_cyan());
    println!("{}", "🔍 HTTP REQUEST DEBUG".bright_cyan().bold());
    println!("{}", "═".repeat(80).bright_cyan());
    println!("{}: {}", "URL".bright_yellow(), url);

    println!("\n{}", "Headers:".bright_yellow());
    println!("  Content-Type: application/json");
    if let Some(token) = token {
        println!(
            "  Authorization: Bearer {}***",
            token.chars().take(10).collect::<String>()
        );
    }

    println!("\n{}", "Request Body:".bright_yellow());
    match serde_json::to_string_pretty(&redact_images(body)) {
        Ok(json) => {
            if json.chars().count() > 5000 {
                println!("{}", safe_truncate(&json, 5000));
                println!(
                    "\n{}",
                    format!("... (truncated, total {} bytes)", json.len()).bright_black()
                );
            } else {
                println!("{}", json);
            }
        }
        Err(e) => println!("{}", format!("Error serializing request: {}", e).red()),
    }

    println!("{}", "═".repeat(80).bright_cyan());
    println!();
}

/// Log the status line of a response (console output)
pub fn log_response_status(status: u16, verbose: bool) {
    if !verbose {
        return;
    }
    let line = format!("📥 HTTP {}", status);
    if (200..300).contains(&status) {
        println!("{}", line.bright_green());
    } else {
        println!("{}", line.red());
    }
}

/// Log one received stream line (console output)
pub fn log_stream_line(line_num: usize, data: &str, verbose: bool) {
    if !verbose {
        return;
    }

    println!(
        "{}",
        format!(
            "📦 Stream Line #{}: {}",
            line_num,
            if data.chars().count() > 200 {
                format!("{}... ({} bytes)", safe_truncate(data, 200), data.len())
            } else {
                data.to_string()
            }
        )
        .bright_black()
    );
}

// Base64 attachments make the dump unreadable; keep only their sizes.
fn redact_images(body: &serde_json::Value) -> serde_json::Value {
    let mut body = body.clone();
    if let Some(images) = body.get_mut("image_data").and_then(|v| v.as_array_mut()) {
        for image in images.iter_mut() {
            let len = image.as_str().map(str::len).unwrap_or_default();
            *image = serde_json::Value::String(format!("<{} base64 bytes>", len));
        }
    }
    body
}

#[cfg(test)]
mod tests {
    use super::redact_images;
    use serde_json::json;

    #[test]
    fn test_redact_images_keeps_message() {
        let body = json!({"message": "hi", "image_data": ["aGVsbG8="]});
        let redacted = redact_images(&body);
        assert_eq!(redacted["message"], "hi");
        assert_eq!(redacted["image_data"][0], "<8 base64 bytes>");
    }
}
