//! Build script for mixlink-firmware
//!
//! - Sets up linker search paths for memory.x
//! - Validates link.toml and turns it into constants

use std::env;
use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Keys every section must carry, with the smallest value each accepts
const UART_KEYS: &[(&str, i64)] = &[("baud", 1200)];
const LINK_KEYS: &[(&str, i64)] = &[
    ("read_retries", 1),
    ("read_poll_ms", 1),
    ("write_retries", 1),
    ("write_retry_ms", 0),
];
const MONITOR_KEYS: &[(&str, i64)] = &[
    ("link_timeout_ms", 1),
    ("sleep_wait_ms", 1),
    ("ui_wait_ms", 1),
];

fn main() {
    setup_linker();
    let config = load_config();
    generate_constants(&config);
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
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");

    // Re-run if memory.x changes
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");
}

/// Read and validate link.toml
fn load_config() -> toml::Value {
    println!("cargo:rerun-if-changed=link.toml");

    let config_path = Path::new("link.toml");

    let config_content = match fs::read_to_string(config_path) {
        Ok(content) => content,
        Err(e) => {
            panic!(
                "\n\
                ╔══════════════════════════════════════════════════════════════════╗\n\
                ║  ERROR: Failed to read link.toml                                 ║\n\
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
                ║  ERROR: Invalid TOML syntax in link.toml                         ║\n\
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
    validate_section(&config, "uart", UART_KEYS, &mut errors);
    validate_section(&config, "link", LINK_KEYS, &mut errors);
    validate_section(&config, "monitor", MONITOR_KEYS, &mut errors);

    if errors.is_empty() {
        let timeout = integer(&config, "monitor", "link_timeout_ms");
        let wait = integer(&config, "monitor", "ui_wait_ms");
        if timeout <= wait {
            errors.push(format!(
                "[monitor] link_timeout_ms ({}) must exceed ui_wait_ms ({})",
                timeout, wait
            ));
        }
    }

    if !errors.is_empty() {
        panic!(
            "\n\
            ╔══════════════════════════════════════════════════════════════════╗\n\
            ║  ERROR: Invalid link.toml                                        ║\n\
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

    println!("cargo:warning=link.toml validated successfully");
    config
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

/// Check that `[name]` exists and holds each key as an in-range u32
fn validate_section(
    config: &toml::Value,
    name: &str,
    keys: &[(&str, i64)],
    errors: &mut Vec<String>,
) {
    let section = match config.get(name) {
        Some(toml::Value::Table(t)) => t,
        Some(_) => {
            errors.push(format!("[{}] must be a table", name));
            return;
        }
        None => {
            errors.push(format!("Missing [{}] section", name));
            return;
        }
    };

    for &(key, min) in keys {
        match section.get(key) {
            Some(toml::Value::Integer(value)) => {
                if *value < min || *value > i64::from(u32::MAX) {
                    errors.push(format!(
                        "[{}] {} = {} out of range ({}..={})",
                        name,
                        key,
                        value,
                        min,
                        u32::MAX
                    ));
                }
            }
            Some(_) => errors.push(format!("[{}] {} must be an integer", name, key)),
            None => errors.push(format!("[{}] missing '{}'", name, key)),
        }
    }
}

fn integer(config: &toml::Value, section: &str, key: &str) -> i64 {
    config
        .get(section)
        .and_then(|s| s.get(key))
        .and_then(toml::Value::as_integer)
        .unwrap()
}

/// Write link_config.rs into OUT_DIR
fn generate_constants(config: &toml::Value) {
    let get = |section: &str, key: &str| integer(config, section, key);

    let source = format!(
        "/// UART baud rate\n\
         pub const UART_BAUD: u32 = {baud};\n\
         \n\
         /// Transport retry budgets\n\
         pub const LINK_TIMING: LinkTiming = LinkTiming {{\n\
         \x20   read_retries: {read_retries},\n\
         \x20   read_poll_ms: {read_poll_ms},\n\
         \x20   write_retries: {write_retries},\n\
         \x20   write_retry_ms: {write_retry_ms},\n\
         }};\n\
         \n\
         /// Link monitor timing\n\
         pub const MONITOR: MonitorConfig = MonitorConfig {{\n\
         \x20   link_timeout_ms: {link_timeout_ms},\n\
         \x20   sleep_wait_ms: {sleep_wait_ms},\n\
         \x20   ui_wait_ms: {ui_wait_ms},\n\
         }};\n",
        baud = get("uart", "baud"),
        read_retries = get("link", "read_retries"),
        read_poll_ms = get("link", "read_poll_ms"),
        write_retries = get("link", "write_retries"),
        write_retry_ms = get("link", "write_retry_ms"),
        link_timeout_ms = get("monitor", "link_timeout_ms"),
        sleep_wait_ms = get("monitor", "sleep_wait_ms"),
        ui_wait_ms = get("monitor", "ui_wait_ms"),
    );

    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());
    fs::write(out_dir.join("link_config.rs"), source).unwrap();
}
