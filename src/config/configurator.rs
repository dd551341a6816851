//! Console configurator
//!
//! Text commands for inspecting and editing settings from a serial console:
//!
//! ```text
//! config-get <key>                   value from the live cache
//! config-get <source> <key>          value read directly from a source
//! config-set <source> <key> <value>  write to a source
//! config-load                        rebuild the cache from all sources
//! ```

use super::error::SettingsError;
use super::settings::Settings;
use crate::platform::BlockingContext;
use core::fmt::Write;

/// Parsed console command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    /// Read from the cache
    GetLive { key: &'a str },
    /// Read directly from a source
    Get { source: &'a str, key: &'a str },
    /// Write to a source
    Set {
        source: &'a str,
        key: &'a str,
        value: &'a str,
    },
    /// Reload every source
    Load,
}

impl<'a> Command<'a> {
    /// Parse a command line
    ///
    /// Returns `None` for anything that is not a well-formed `config-*`
    /// command.
    pub fn parse(line: &'a str) -> Option<Self> {
        let mut words = line.split_ascii_whitespace();
        let verb = words.next()?;
        let args: heapless::Vec<&str, 4> = words.take(4).collect();

        match (verb, args.as_slice()) {
            ("config-get", &[key]) => Some(Command::GetLive { key }),
            ("config-get", &[source, key]) => Some(Command::Get { source, key }),
            ("config-set", &[source, key, value]) => Some(Command::Set { source, key, value }),
            ("config-load", &[]) => Some(Command::Load),
            _ => None,
        }
    }
}

/// Run one console line against `settings`, writing the reply to `out`
///
/// Returns `Ok(false)` if the line is not a configurator command. Unknown
/// source names are reported to the console; storage failures are returned.
pub fn execute<W: Write>(
    settings: &mut Settings<'_>,
    line: &str,
    ctx: &BlockingContext,
    out: &mut W,
) -> Result<bool, SettingsError> {
    let Some(command) = Command::parse(line) else {
        return Ok(false);
    };

    let result = match command {
        Command::GetLive { key } => {
            let value = settings.value(key);
            if value.is_found() {
                let _ = writeln!(out, "live: {} is set to {}", key, value.as_string());
            } else {
                let _ = writeln!(out, "live: {} is not set", key);
            }
            Ok(())
        }
        Command::Get { source, key } => settings.get(source, key).map(|value| match value {
            Some(value) => {
                let _ = writeln!(out, "{}: {} is set to {}", source, key, value);
            }
            None => {
                let _ = writeln!(out, "{}: {} is not set", source, key);
            }
        }),
        Command::Set { source, key, value } => {
            settings.set(source, key, value, ctx).map(|written| {
                if written {
                    let _ = writeln!(out, "{}: {} has been set to {}", source, key, value);
                } else {
                    let _ = writeln!(out, "{}: {} could not be set to {}", source, key, value);
                }
            })
        }
        Command::Load => settings.load().map(|count| {
            let _ = writeln!(out, "loaded {} settings", count);
        }),
    };

    match result {
        Ok(()) => Ok(true),
        Err(SettingsError::SourceNotFound(_)) => {
            let _ = writeln!(out, "unknown settings source");
            Ok(true)
        }
        Err(e) => Err(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{FileSource, FirmwareSource, FlashSource};
    use crate::platform::mock::{MockFiles, MockFlash};
    use std::string::String;

    #[test]
    fn test_parse() {
        assert_eq!(Command::parse("config-get speed_rate"), Some(Command::GetLive { key: "speed_rate" }));
        assert_eq!(
            Command::parse("  config-get   sd  speed_rate "),
            Some(Command::Get {
                source: "sd",
                key: "speed_rate"
            })
        );
        assert_eq!(
            Command::parse("config-set flash xsteps 320"),
            Some(Command::Set {
                source: "flash",
                key: "xsteps",
                value: "320"
            })
        );
        assert_eq!(Command::parse("config-load"), Some(Command::Load));

        assert_eq!(Command::parse(""), None);
        assert_eq!(Command::parse("config-get"), None);
        assert_eq!(Command::parse("config-set flash xsteps"), None);
        assert_eq!(Command::parse("config-load now"), None);
        assert_eq!(Command::parse("status"), None);
    }

    #[test]
    fn test_console_session() {
        let mut firm = FirmwareSource::new(b"speed_rate 50\n");
        let mut flash = FlashSource::new(MockFlash::new());
        let ctx = BlockingContext::thread_mode();
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut flash).unwrap();
        settings.load().unwrap();

        let mut out = String::new();
        for line in [
            "config-get speed_rate",
            "config-set flash speed_rate 80",
            "config-get flash speed_rate",
            "config-get speed_rate",
            "config-load",
            "config-get speed_rate",
            "config-get xsteps",
        ] {
            assert!(execute(&mut settings, line, &ctx, &mut out).unwrap());
        }

        assert_eq!(
            out,
            "live: speed_rate is set to 50\n\
             flash: speed_rate has been set to 80\n\
             flash: speed_rate is set to 80\n\
             live: speed_rate is set to 50\n\
             loaded 1 settings\n\
             live: speed_rate is set to 80\n\
             live: xsteps is not set\n"
        );
    }

    #[test]
    fn test_refusals_and_unknown_source() {
        let mut firm = FirmwareSource::new(b"speed_rate 50\n");
        let mut files = MockFiles::new();
        files.insert("/sd/config", b"speed_rate 1\n");
        let mut sd = FileSource::new(files);
        let ctx = BlockingContext::thread_mode();
        let mut settings = Settings::new();
        settings.add_source(&mut firm).unwrap();
        settings.add_source(&mut sd).unwrap();

        let mut out = String::new();
        assert!(execute(&mut settings, "config-set firm speed_rate 10", &ctx, &mut out).unwrap());
        assert!(execute(&mut settings, "config-set sd speed_rate 10", &ctx, &mut out).unwrap());
        assert!(execute(&mut settings, "config-get nvram speed_rate", &ctx, &mut out).unwrap());
        assert!(!execute(&mut settings, "reboot", &ctx, &mut out).unwrap());

        assert_eq!(
            out,
            "firm: speed_rate could not be set to 10\n\
             sd: speed_rate could not be set to 10\n\
             unknown settings source\n"
        );
    }
}
