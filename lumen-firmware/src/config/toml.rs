//! Minimal TOML parser for display.toml
//!
//! Handles only the subset the display configuration uses. It does NOT
//! support the full TOML grammar.
//!
//! Supported features:
//! - Key = value pairs (string, integer, boolean)
//! - Underscore digit separators in integers (24_000_000)
//! - [section] headers
//! - Comments (# ...), including trailing comments
//!
//! NOT supported:
//! - Arrays and inline tables
//! - Multi-line strings
//! - Dotted keys

use lumen_core::config::{BackendKind, ConfigError, DisplayConfig};
use lumen_protocol::Orientation;

/// Parse error
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ParseError {
    /// Unknown or malformed section header
    InvalidSection,
    /// Line is neither a header nor `key = value`
    InvalidLine,
    /// Key not known in its section
    UnknownKey,
    /// Value has the wrong type or does not fit the field
    InvalidValue,
    /// Unknown preset name
    UnknownPreset,
    /// Parsed fine, but the result failed validation
    Config(ConfigError),
}

impl From<ConfigError> for ParseError {
    fn from(e: ConfigError) -> Self {
        ParseError::Config(e)
    }
}

/// Current parsing context
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Root,
    Bus,
    Dma,
    Panel,
    Render,
}

/// Parse display.toml into a validated DisplayConfig
///
/// # Arguments
/// * `input` - File contents
/// * `default_backend` - Backend used when `[bus] backend` is absent
pub fn parse_config(input: &str, default_backend: BackendKind) -> Result<DisplayConfig, ParseError> {
    // The preset sets the baseline, so it has to be known before any field
    let mut config = match find_preset(input)? {
        Some(preset) => preset,
        None => DisplayConfig::new(),
    };
    config.backend = default_backend;

    let mut section = Section::Root;

    for line in input.lines() {
        let line = strip_comment(line).trim();

        if line.is_empty() {
            continue;
        }

        if line.starts_with('[') && line.ends_with(']') {
            section = parse_section_header(&line[1..line.len() - 1])?;
            continue;
        }

        let (key, value) = parse_key_value(line).ok_or(ParseError::InvalidLine)?;
        apply_field(&mut config, section, key, value)?;
    }

    config.validate()?;
    Ok(config)
}

/// Look for a root-level `preset = "..."` line
fn find_preset(input: &str) -> Result<Option<DisplayConfig>, ParseError> {
    for line in input.lines() {
        let line = strip_comment(line).trim();
        if line.starts_with('[') {
            // Root keys end at the first header
            return Ok(None);
        }
        if let Some(("preset", value)) = parse_key_value(line) {
            return preset(parse_string(value)?).map(Some);
        }
    }
    Ok(None)
}

fn preset(name: &str) -> Result<DisplayConfig, ParseError> {
    match name {
        "conservative" => Ok(DisplayConfig::conservative()),
        "balanced" => Ok(DisplayConfig::balanced()),
        "max_throughput" => Ok(DisplayConfig::max_throughput()),
        _ => Err(ParseError::UnknownPreset),
    }
}

fn apply_field(
    config: &mut DisplayConfig,
    section: Section,
    key: &str,
    value: &str,
) -> Result<(), ParseError> {
    match (section, key) {
        (Section::Root, "preset") => {}

        (Section::Bus, "clock_hz") => config.clock_hz = parse_int(value)?,
        (Section::Bus, "backend") => {
            config.backend =
                BackendKind::from_name(parse_string(value)?).map_err(|_| ParseError::InvalidValue)?
        }

        (Section::Dma, "transfer_chunk_lines") => config.transfer_chunk_lines = parse_int(value)?,
        (Section::Dma, "queue_depth") => config.queue_depth = parse_int(value)?,
        (Section::Dma, "alignment_unit") => config.alignment_unit = parse_int(value)?,
        (Section::Dma, "transfer_timeout_us") => config.transfer_timeout_us = parse_int(value)?,
        (Section::Dma, "poll_interval_us") => config.poll_interval_us = parse_int(value)?,

        (Section::Panel, "width") => config.width = parse_int(value)?,
        (Section::Panel, "height") => config.height = parse_int(value)?,
        (Section::Panel, "x_offset") => config.x_offset = parse_int(value)?,
        (Section::Panel, "y_offset") => config.y_offset = parse_int(value)?,
        (Section::Panel, "orientation") => config.orientation = parse_orientation(value)?,
        (Section::Panel, "invert_colors") => config.invert_colors = parse_bool(value)?,

        (Section::Render, "dirty_rect_capacity") => config.dirty_rect_capacity = parse_int(value)?,
        (Section::Render, "target_fps") => config.target_fps = parse_int(value)?,

        _ => return Err(ParseError::UnknownKey),
    }
    Ok(())
}

/// Parse a section header (without brackets)
fn parse_section_header(header: &str) -> Result<Section, ParseError> {
    match header.trim() {
        "bus" => Ok(Section::Bus),
        "dma" => Ok(Section::Dma),
        "panel" => Ok(Section::Panel),
        "render" => Ok(Section::Render),
        _ => Err(ParseError::InvalidSection),
    }
}

/// Drop a trailing comment, unless the `#` sits inside a string
fn strip_comment(line: &str) -> &str {
    let mut in_string = false;
    for (i, c) in line.char_indices() {
        match c {
            '"' => in_string = !in_string,
            '#' if !in_string => return &line[..i],
            _ => {}
        }
    }
    line
}

/// Parse a key = value line
fn parse_key_value(line: &str) -> Option<(&str, &str)> {
    let eq_pos = line.find('=')?;
    let key = line[..eq_pos].trim();
    let value = line[eq_pos + 1..].trim();
    if key.is_empty() || value.is_empty() {
        return None;
    }
    Some((key, value))
}

/// Parse a string value
fn parse_string(value: &str) -> Result<&str, ParseError> {
    if value.starts_with('"') && value.ends_with('"') && value.len() >= 2 {
        Ok(&value[1..value.len() - 1])
    } else {
        // Allow unquoted strings for simple values
        Ok(value)
    }
}

/// Parse an integer value, allowing `_` separators
fn parse_int<T: TryFrom<u64>>(value: &str) -> Result<T, ParseError> {
    let mut acc: u64 = 0;
    let mut digits = 0;
    for c in value.chars() {
        match c {
            '_' if digits > 0 => {}
            '0'..='9' => {
                acc = acc
                    .checked_mul(10)
                    .and_then(|a| a.checked_add(c as u64 - '0' as u64))
                    .ok_or(ParseError::InvalidValue)?;
                digits += 1;
            }
            _ => return Err(ParseError::InvalidValue),
        }
    }
    if digits == 0 {
        return Err(ParseError::InvalidValue);
    }
    T::try_from(acc).map_err(|_| ParseError::InvalidValue)
}

/// Parse a boolean value
fn parse_bool(value: &str) -> Result<bool, ParseError> {
    match value {
        "true" => Ok(true),
        "false" => Ok(false),
        _ => Err(ParseError::InvalidValue),
    }
}

fn parse_orientation(value: &str) -> Result<Orientation, ParseError> {
    match parse_string(value)? {
        "portrait" => Ok(Orientation::Portrait),
        "landscape" => Ok(Orientation::Landscape),
        "portrait_flipped" => Ok(Orientation::PortraitFlipped),
        "landscape_flipped" => Ok(Orientation::LandscapeFlipped),
        _ => Err(ParseError::InvalidValue),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_input_gives_defaults() {
        let cfg = parse_config("", BackendKind::Direct).unwrap();
        assert_eq!(cfg, DisplayConfig::new());
    }

    #[test]
    fn test_default_backend_applies_when_unnamed() {
        let cfg = parse_config("[bus]\nclock_hz = 17_000_000\n", BackendKind::Accelerated).unwrap();
        assert_eq!(cfg.backend, BackendKind::Accelerated);
        assert_eq!(cfg.clock_hz, 17_000_000);
    }

    #[test]
    fn test_preset_then_override() {
        let input = "\
            # tuned for the bench board\n\
            preset = \"balanced\"\n\
            \n\
            [dma]\n\
            transfer_chunk_lines = 40  # smaller bands\n\
            [bus]\n\
            backend = \"direct\"\n";
        let cfg = parse_config(input, BackendKind::Accelerated).unwrap();
        assert_eq!(cfg.clock_hz, 24_000_000);
        assert_eq!(cfg.transfer_chunk_lines, 40);
        assert_eq!(cfg.queue_depth, 2);
        assert_eq!(cfg.backend, BackendKind::Direct);
    }

    #[test]
    fn test_shipped_file_parses() {
        let cfg = parse_config(include_str!("../../display.toml"), BackendKind::Direct).unwrap();
        assert_eq!(cfg.backend, BackendKind::Accelerated);
        assert_eq!(cfg.width, 320);
        assert_eq!(cfg.height, 170);
        assert_eq!(cfg.orientation, Orientation::Landscape);
        assert!(cfg.invert_colors);
    }

    #[test]
    fn test_unknown_names_rejected() {
        assert_eq!(
            parse_config("preset = \"turbo\"", BackendKind::Direct),
            Err(ParseError::UnknownPreset)
        );
        assert_eq!(
            parse_config("[gpio]\n", BackendKind::Direct),
            Err(ParseError::InvalidSection)
        );
        assert_eq!(
            parse_config("[bus]\nspeed = 1\n", BackendKind::Direct),
            Err(ParseError::UnknownKey)
        );
        assert_eq!(
            parse_config("[bus]\nbackend = \"fast\"\n", BackendKind::Direct),
            Err(ParseError::InvalidValue)
        );
    }

    #[test]
    fn test_values_must_fit_field() {
        // queue_depth is a u8
        assert_eq!(
            parse_config("[dma]\nqueue_depth = 300\n", BackendKind::Direct),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[panel]\ninvert_colors = yes\n", BackendKind::Direct),
            Err(ParseError::InvalidValue)
        );
        assert_eq!(
            parse_config("[panel]\nwidth\n", BackendKind::Direct),
            Err(ParseError::InvalidLine)
        );
    }

    #[test]
    fn test_parsed_config_is_validated() {
        assert_eq!(
            parse_config("[dma]\nqueue_depth = 3\n", BackendKind::Direct),
            Err(ParseError::Config(ConfigError::QueueDepth))
        );
        assert_eq!(
            parse_config("[bus]\nclock_hz = 80_000_000\n", BackendKind::Direct),
            Err(ParseError::Config(ConfigError::ClockOutOfRange))
        );
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int::<u32>("24_000_000"), Ok(24_000_000));
        assert_eq!(parse_int::<u8>("255"), Ok(255));
        assert_eq!(parse_int::<u8>("256"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u16>("_1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u16>("-1"), Err(ParseError::InvalidValue));
        assert_eq!(parse_int::<u16>(""), Err(ParseError::InvalidValue));
    }

    #[test]
    fn test_strip_comment_keeps_hash_in_string() {
        assert_eq!(strip_comment("a = \"#1\" # note"), "a = \"#1\" ");
        assert_eq!(strip_comment("# whole line"), "");
    }
}
