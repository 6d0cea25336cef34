//! Check that the external tools are installed.

use gridstack_common::config::config_file_path;
use gridstack_common::error::GridstackError;
use gridstack_render_engine::command_exists;

struct Tool {
    binary: &'static str,
    purpose: &'static str,
    required: bool,
}

const TOOLS: &[Tool] = &[
    Tool {
        binary: "ffmpeg",
        purpose: "compositing and encoding",
        required: true,
    },
    Tool {
        binary: "ffprobe",
        purpose: "input geometry and frame rate",
        required: true,
    },
    Tool {
        binary: "identify",
        purpose: "fallback image geometry (ImageMagick)",
        required: false,
    },
];

pub fn run() -> anyhow::Result<()> {
    println!("gridstack system check");
    println!("{}", "=".repeat(50));

    let mut missing = Vec::new();
    for tool in TOOLS {
        let found = command_exists(tool.binary);
        let tag = match (found, tool.required) {
            (true, _) => "OK",
            (false, true) => "MISSING",
            (false, false) => "WARN",
        };
        println!("[{tag}] {:<10} {}", tool.binary, tool.purpose);
        if !found && tool.required {
            missing.push(tool.binary);
        }
    }

    let config_path = config_file_path();
    println!();
    println!(
        "Config: {} ({})",
        config_path.display(),
        if config_path.exists() { "found" } else { "defaults" }
    );

    if missing.is_empty() {
        println!("All required tools are available.");
        Ok(())
    } else {
        Err(GridstackError::unsupported(format!(
            "missing required tools: {}",
            missing.join(", ")
        ))
        .into())
    }
}
