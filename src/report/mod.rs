//! Rendering resolved flags for the host and for people
//!
//! CDD Principle: Anti-Corruption Layer - Formatters translate FlagsResponse to external formats
//! - JSON follows the completion host's callback contract
//! - Human and shell formats are for inspection and scripting

use crate::domain::flags::{FlagsError, FlagsResponse, FlagsResult};
use std::io::Write;

/// Supported output formats
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    /// Human-readable listing
    Human,
    /// JSON object for the completion host
    Json,
    /// Flags on one shell-quoted line
    Shell,
}

/// Options for customizing output
#[derive(Debug, Clone)]
pub struct ReportOptions {
    /// Whether to use colored output (for human format)
    pub use_colors: bool,
    /// Whether to pretty-print JSON
    pub pretty_json: bool,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self { use_colors: true, pretty_json: false }
    }
}

/// Formats resolved flags
#[derive(Debug, Clone, Default)]
pub struct ReportFormatter {
    options: ReportOptions,
}

impl ReportFormatter {
    /// Create a new formatter with options
    pub fn new(options: ReportOptions) -> Self {
        Self { options }
    }

    /// Format a response in the specified format
    pub fn format_response(
        &self,
        file: &str,
        response: &FlagsResponse,
        format: OutputFormat,
    ) -> FlagsResult<String> {
        match format {
            OutputFormat::Human => Ok(self.format_human(file, response)),
            OutputFormat::Json => self.format_json(response),
            OutputFormat::Shell => Ok(format_shell(&response.flags)),
        }
    }

    /// Write a formatted response to a writer
    pub fn write_response<W: Write>(
        &self,
        file: &str,
        response: &FlagsResponse,
        format: OutputFormat,
        mut writer: W,
    ) -> FlagsResult<()> {
        let formatted = self.format_response(file, response, format)?;
        writeln!(writer, "{formatted}")?;
        Ok(())
    }

    fn format_human(&self, file: &str, response: &FlagsResponse) -> String {
        let mut output = String::new();

        if self.options.use_colors {
            output.push_str(&format!("\x1b[1m{file}\x1b[0m\n"));
        } else {
            output.push_str(&format!("{file}\n"));
        }

        if let Some(dir) = &response.database_dir {
            output.push_str(&format!("  database:    {}\n", dir.display()));
        }
        match &response.override_file {
            Some(path) => output.push_str(&format!("  overrides:   {}\n", path.display())),
            None => output.push_str("  overrides:   (none)\n"),
        }
        output.push_str(&format!("  working dir: {}\n", response.working_directory.display()));
        output.push_str(&format!("  flags ({}):\n", response.flags.len()));

        for flag in &response.flags {
            if self.options.use_colors {
                output.push_str(&format!("    \x1b[36m{flag}\x1b[0m\n"));
            } else {
                output.push_str(&format!("    {flag}\n"));
            }
        }

        output
    }

    fn format_json(&self, response: &FlagsResponse) -> FlagsResult<String> {
        let json = if self.options.pretty_json {
            serde_json::to_string_pretty(response)
        } else {
            serde_json::to_string(response)
        };

        json.map_err(|e| FlagsError::config(format!("Failed to serialize flags: {e}")))
    }
}

/// Join flags into one line, single-quoting any that need it
pub fn format_shell(flags: &[String]) -> String {
    flags.iter().map(|flag| shell_quote(flag)).collect::<Vec<_>>().join(" ")
}

fn shell_quote(flag: &str) -> String {
    let safe = !flag.is_empty()
        && flag.chars().all(|c| c.is_ascii_alphanumeric() || "-_=+/.,:@%".contains(c));

    if safe {
        flag.to_string()
    } else {
        format!("'{}'", flag.replace('\'', r"'\''"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn response() -> FlagsResponse {
        FlagsResponse::new(vec!["-DX".to_string(), "-DNAME=a b".to_string()], "/proj")
            .with_database_dir("/proj/build")
            .with_override_file(Some(PathBuf::from("/proj/ycm_extra_conf.yml")))
    }

    #[test]
    fn test_json_format() {
        let formatter = ReportFormatter::default();
        let json = formatter.format_response("a.cpp", &response(), OutputFormat::Json).unwrap();

        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed["flags"][1], "-DNAME=a b");
        assert_eq!(parsed["do_cache"], true);
        assert_eq!(parsed["include_paths_relative_to_dir"], "/proj");
    }

    #[test]
    fn test_human_format_without_colors() {
        let formatter =
            ReportFormatter::new(ReportOptions { use_colors: false, pretty_json: false });
        let human = formatter.format_response("a.cpp", &response(), OutputFormat::Human).unwrap();

        assert!(human.starts_with("a.cpp\n"));
        assert!(human.contains("overrides:   /proj/ycm_extra_conf.yml"));
        assert!(human.contains("flags (2):"));
        assert!(!human.contains("\x1b["));
    }

    #[test]
    fn test_shell_format_quotes() {
        let flags = vec!["-DX".to_string(), "-DNAME=a b".to_string(), "-DQ='x'".to_string()];
        assert_eq!(format_shell(&flags), r"-DX '-DNAME=a b' '-DQ='\''x'\'''");
    }

    #[test]
    fn test_write_response() {
        let formatter = ReportFormatter::default();
        let mut buffer = Vec::new();
        formatter.write_response("a.cpp", &response(), OutputFormat::Shell, &mut buffer).unwrap();

        assert_eq!(String::from_utf8(buffer).unwrap(), "-DX '-DNAME=a b'\n");
    }

}
