//! Build script for lumen-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates display.toml at compile time

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Bytes in one DMA slot; must match SLOT_BYTES in src/main.rs
const SLOT_BYTES: i64 = 32_000;

const CLOCK_PRESETS_HZ: [i64; 5] = [17_000_000, 24_000_000, 30_000_000, 40_000_000, 48_000_000];

fn main() {
    setup_linker();
    validate_config();
}

/// Set up linker search paths for memory.x
fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    // Copy memory.x to the output directory
    let memory_x = include_bytes!("memory.x");
    let mut f = File::create(out_dir.join("memory.x")).unwrap();
    f.write_all(memory_x).unwrap();

    // Tell rustc where to find memory.x
    println!("cargo:rustc-link-search={}", out_dir.display());

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    #[cfg(feature = "defmt")]
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Validate display.toml configuration at compile time
fn validate_config() {
    println!("cargo:rerun-if-changed=display.toml");

    let config_path = Path::new("display.toml");

    if !config_path.exists() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: display.toml not found!                                  ║\n\
            ║                                                                  ║\n\
            ║  The firmware requires a display.toml configuration file.        ║\n\
            ║  Please create one in the lumen-firmware directory.              ║\n\
            ╚══════════════════════════════════════════════════════════════════╝\n"
        );
    }

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read display.toml                              ║\n\
                ║                                                                  ║\n\
                ║  Error: {:<56} ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                e
            );
        }
    };

    let config: toml::Value = match toml::from_str(&config_content) {
        Ok(value) => value,
        Err(e) => {
            let error_msg = e.to_string();
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Invalid TOML syntax in display.toml                      ║\n\
                ╠══════════════════════════════════════════════════════════════════╣\n\
                ║                                                                  ║\n\
                {}\n\
                ║                                                                  ║\n\
                ╚══════════════════════════════════════════════════════════════════╝\n",
                format_error_lines(&error_msg)
            );
        }
    };

    let mut errors = Vec::new();
    validate_preset(&config, &mut errors);
    validate_bus(&config, &mut errors);
    validate_dma(&config, &mut errors);
    validate_panel(&config, &mut errors);
    validate_render(&config, &mut errors);

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid display configuration                            ║\n\
            ╠══════════════════════════════════════════════════════════════════╣\n\
            {}\n\
            ╚══════════════════════════════════════════════════════════════════╝\n",
            errors
                .iter()
                .map(|e| format!("║  • {:<62} ║", e))
                .collect::<Vec<_>>()
                .join("\n")
        );
    }

    println!("cargo:warning=display.toml validated successfully");
}

/// Format error message lines with box drawing
fn format_error_lines(msg: &str) -> String {
    msg.lines()
        .map(|line| {
            let truncated = if line.len() > 64 {
                format!("{}...", &line[..61])
            } else {
                line.to_string()
            };
            format!("║  {:<64} ║", truncated)
        })
        .collect::<Vec<_>>()
        .join("\n")
}

fn int_in(
    table: Option<&toml::Value>,
    section: &str,
    key: &str,
    min: i64,
    max: i64,
    errors: &mut Vec<String>,
) -> Option<i64> {
    match table.and_then(|t| t.get(key)) {
        Some(toml::Value::Integer(v)) if (min..=max).contains(v) => Some(*v),
        Some(toml::Value::Integer(_)) => {
            errors.push(format!("[{}] {} must be {}-{}", section, key, min, max));
            None
        }
        Some(_) => {
            errors.push(format!("[{}] {} must be an integer", section, key));
            None
        }
        None => None,
    }
}

fn validate_preset(config: &toml::Value, errors: &mut Vec<String>) {
    match config.get("preset") {
        Some(toml::Value::String(p))
            if ["conservative", "balanced", "max_throughput"].contains(&p.as_str()) => {}
        Some(_) => errors.push(
            "preset must be 'conservative', 'balanced' or 'max_throughput'".to_string(),
        ),
        None => {}
    }
}

fn validate_bus(config: &toml::Value, errors: &mut Vec<String>) {
    let bus = config.get("bus");
    if let Some(hz) = int_in(bus, "bus", "clock_hz", 1_000_000, 48_000_000, errors) {
        if !CLOCK_PRESETS_HZ.contains(&hz) {
            println!(
                "cargo:warning=bus clock {} Hz is not one of the tested presets",
                hz
            );
        }
    }
    if let Some(backend) = bus.and_then(|b| b.get("backend")) {
        match backend.as_str() {
            Some("direct" | "gpio" | "accelerated" | "dma") => {}
            _ => errors.push("[bus] backend must be 'direct' or 'accelerated'".to_string()),
        }
    }
}

fn validate_dma(config: &toml::Value, errors: &mut Vec<String>) {
    let dma = config.get("dma");
    let width = config
        .get("panel")
        .and_then(|p| p.get("width"))
        .and_then(|w| w.as_integer())
        .unwrap_or(320);

    if let Some(lines) = int_in(dma, "dma", "transfer_chunk_lines", 1, 200, errors) {
        if lines * width * 2 > SLOT_BYTES {
            errors.push(format!(
                "[dma] {} lines x {} px exceed the {} byte slot",
                lines, width, SLOT_BYTES
            ));
        }
    }
    int_in(dma, "dma", "queue_depth", 1, 2, errors);
    if let Some(unit) = int_in(dma, "dma", "alignment_unit", 1, 64, errors) {
        if unit & (unit - 1) != 0 {
            errors.push("[dma] alignment_unit must be a power of two".to_string());
        }
    }
    let timeout = int_in(dma, "dma", "transfer_timeout_us", 1, u32::MAX as i64, errors);
    let poll = int_in(dma, "dma", "poll_interval_us", 0, u32::MAX as i64, errors);
    if let (Some(timeout), Some(poll)) = (timeout, poll) {
        if poll >= timeout {
            errors.push("[dma] poll_interval_us must be below transfer_timeout_us".to_string());
        }
    }
}

fn validate_panel(config: &toml::Value, errors: &mut Vec<String>) {
    let panel = config.get("panel");
    int_in(panel, "panel", "width", 1, 320, errors);
    int_in(panel, "panel", "height", 1, 320, errors);
    int_in(panel, "panel", "x_offset", 0, 319, errors);
    int_in(panel, "panel", "y_offset", 0, 319, errors);
    if let Some(orientation) = panel.and_then(|p| p.get("orientation")) {
        match orientation.as_str() {
            Some("portrait" | "landscape" | "portrait_flipped" | "landscape_flipped") => {}
            _ => errors.push("[panel] unknown orientation".to_string()),
        }
    }
    if let Some(invert) = panel.and_then(|p| p.get("invert_colors")) {
        if invert.as_bool().is_none() {
            errors.push("[panel] invert_colors must be true or false".to_string());
        }
    }
}

fn validate_render(config: &toml::Value, errors: &mut Vec<String>) {
    let render = config.get("render");
    int_in(render, "render", "dirty_rect_capacity", 1, 16, errors);
    int_in(render, "render", "target_fps", 1, 120, errors);
}
