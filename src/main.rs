//! ycm-flags CLI - Command-line front end for flag resolution
//!
//! CDD Principle: Application Layer - CLI plays the part of the completion host callback
//! - Translates user commands to resolver operations
//! - Keeps stdout for results and sends logging to stderr

use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use tracing_subscriber::EnvFilter;
use ycm_flags::{
    FlagResolver, FlagsResult, OutputFormat, OverrideConfig, ReportFormatter, ReportOptions,
    ResolverOptions, OVERRIDE_FILE_NAME,
};

/// ycm-flags - Compiler flags from compilation databases and YAML overrides
#[derive(Parser)]
#[command(name = "ycm-flags")]
#[command(version = "0.1.0")]
#[command(about = "Resolve compiler flags for completion engines")]
#[command(long_about = "ycm-flags looks up a source file in the nearest compile_commands.json, \
then removes and adds flags listed in the nearest ycm_extra_conf.yml. \
Output is suitable for completion engines or shell scripts.")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Use this compilation database directory instead of searching for one
    #[arg(short, long, global = true)]
    database_dir: Option<PathBuf>,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the final flags for source files
    Flags {
        /// Source files to resolve
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "human")]
        format: OutputFormatArg,

        /// Ignore ycm_extra_conf.yml files
        #[arg(long)]
        no_overrides: bool,

        /// Keep relative include paths as written in the database
        #[arg(long)]
        keep_relative: bool,

        /// Do not borrow flags from sibling sources for headers
        #[arg(long)]
        no_header_fallback: bool,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },

    /// Show which database and override file apply to a source file
    Find {
        /// Source file
        file: PathBuf,
    },

    /// Answer one JSON line per source path read from stdin
    Serve,

    /// Validate an override file
    ValidateConfig {
        /// Override file to validate (defaults to ./ycm_extra_conf.yml)
        config_file: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, ValueEnum, PartialEq)]
enum OutputFormatArg {
    Human,
    Json,
    Shell,
}

impl From<OutputFormatArg> for OutputFormat {
    fn from(arg: OutputFormatArg) -> Self {
        match arg {
            OutputFormatArg::Human => OutputFormat::Human,
            OutputFormatArg::Json => OutputFormat::Json,
            OutputFormatArg::Shell => OutputFormat::Shell,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    init_logging(cli.verbose);

    // Run the command and handle the result
    match run_command(cli) {
        Ok(exit_code) => {
            process::exit(exit_code);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            process::exit(1);
        }
    }
}

fn run_command(cli: Cli) -> FlagsResult<i32> {
    let options = ResolverOptions { database_dir: cli.database_dir, ..Default::default() };

    match cli.command {
        Commands::Flags {
            files,
            format,
            no_overrides,
            keep_relative,
            no_header_fallback,
            pretty,
        } => {
            let options = ResolverOptions {
                apply_overrides: !no_overrides,
                absolute_paths: !keep_relative,
                header_fallback: !no_header_fallback,
                ..options
            };
            let report_options = ReportOptions { use_colors: !cli.no_color, pretty_json: pretty };
            run_flags(options, &files, format, report_options, cli.verbose, io::stdout().lock())
        }
        Commands::Find { file } => run_find(options, &file, io::stdout().lock()),
        Commands::Serve => {
            let mut resolver = FlagResolver::with_options(options);
            run_serve(&mut resolver, io::stdin().lock(), io::stdout().lock())
        }
        Commands::ValidateConfig { config_file } => {
            run_validate_config(config_file.unwrap_or_else(|| PathBuf::from(OVERRIDE_FILE_NAME)))
        }
    }
}

fn run_flags<W: Write>(
    options: ResolverOptions,
    files: &[PathBuf],
    format: OutputFormatArg,
    report_options: ReportOptions,
    show_statistics: bool,
    mut out: W,
) -> FlagsResult<i32> {
    let mut resolver = FlagResolver::with_options(options);
    let formatter = ReportFormatter::new(report_options);
    let mut failures = 0;

    for file in files {
        let name = file.display().to_string();
        match resolver.resolve(file) {
            Ok(response) => formatter.write_response(&name, &response, format.into(), &mut out)?,
            Err(e) => {
                eprintln!("❌ {}: {}", name, e);
                failures += 1;
            }
        }
    }

    if show_statistics {
        eprintln!("{}", resolver.cache_statistics().format_display());
    }

    Ok(if failures > 0 { 1 } else { 0 })
}

fn run_find<W: Write>(options: ResolverOptions, file: &Path, mut out: W) -> FlagsResult<i32> {
    let resolver = FlagResolver::with_options(options);
    let files = resolver.discover(file)?;

    match &files.database_dir {
        Some(dir) => writeln!(out, "database:  {}", dir.display())?,
        None => writeln!(out, "database:  (not found)")?,
    }
    match &files.override_file {
        Some(path) => writeln!(out, "overrides: {}", path.display())?,
        None => writeln!(out, "overrides: (none)")?,
    }

    Ok(if files.database_dir.is_some() { 0 } else { 1 })
}

/// Serve requests until stdin closes; one source path per line, one JSON reply per line
fn run_serve<R: BufRead, W: Write>(
    resolver: &mut FlagResolver,
    input: R,
    mut out: W,
) -> FlagsResult<i32> {
    for line in input.lines() {
        let line = line?;
        let file = line.trim();
        if file.is_empty() {
            continue;
        }

        let reply = match resolver.resolve(file) {
            Ok(response) => json!({ "ok": true, "file": file, "response": response }),
            Err(e) => {
                tracing::warn!("{}: {}", file, e);
                json!({ "ok": false, "file": file, "error": e.to_string() })
            }
        };

        writeln!(out, "{reply}")?;
        out.flush()?;
    }

    tracing::debug!("{}", resolver.cache_statistics().format_display());
    Ok(0)
}

fn run_validate_config(config_path: PathBuf) -> FlagsResult<i32> {
    println!("Validating override file: {}", config_path.display());

    match OverrideConfig::load_from_file(&config_path) {
        Ok(config) => {
            println!("✅ Override file is valid");
            println!("📊 Override summary:");
            println!("  Flags added:   {}", config.flags.add.len());
            println!("  Flags removed: {}", config.flags.remove.len());
            Ok(0)
        }
        Err(e) => {
            eprintln!("❌ Override file validation failed: {}", e);
            Ok(1)
        }
    }
}

fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(io::stderr)
        .init();
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;
    use ycm_flags::DATABASE_FILE_NAME;

    fn project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        fs::write(root.join("a.c"), "").unwrap();
        fs::write(
            root.join(DATABASE_FILE_NAME),
            serde_json::json!([{
                "directory": root,
                "file": "a.c",
                "arguments": ["cc", "-DX", "-c", "a.c"],
            }])
            .to_string(),
        )
        .unwrap();
        fs::write(root.join(OVERRIDE_FILE_NAME), "flags:\n  add: [-DY]\n").unwrap();
        temp_dir
    }

    fn no_colors() -> ReportOptions {
        ReportOptions { use_colors: false, pretty_json: false }
    }

    #[test]
    fn test_flags_command_shell_output() {
        let temp_dir = project();
        let mut out = Vec::new();

        let code = run_flags(
            ResolverOptions::default(),
            &[temp_dir.path().join("a.c")],
            OutputFormatArg::Shell,
            no_colors(),
            false,
            &mut out,
        )
        .unwrap();

        assert_eq!(code, 0);
        assert_eq!(String::from_utf8(out).unwrap(), "-DX -DY\n");
    }

    #[test]
    fn test_flags_command_reports_failures() {
        let temp_dir = project();
        let mut out = Vec::new();

        let code = run_flags(
            ResolverOptions::default(),
            &[temp_dir.path().join("a.c"), temp_dir.path().join("missing.c")],
            OutputFormatArg::Json,
            no_colors(),
            false,
            &mut out,
        )
        .unwrap();

        assert_eq!(code, 1);
        let output = String::from_utf8(out).unwrap();
        assert_eq!(output.lines().count(), 1);
    }

    #[test]
    fn test_serve_answers_each_line() {
        let temp_dir = project();
        let input = format!(
            "{}\n\n{}\n",
            temp_dir.path().join("a.c").display(),
            temp_dir.path().join("missing.c").display()
        );
        let mut resolver = FlagResolver::new();
        let mut out = Vec::new();

        let code = run_serve(&mut resolver, input.as_bytes(), &mut out).unwrap();
        assert_eq!(code, 0);

        let output = String::from_utf8(out).unwrap();
        let replies: Vec<serde_json::Value> =
            output.lines().map(|l| serde_json::from_str(l).unwrap()).collect();

        assert_eq!(replies.len(), 2);
        assert_eq!(replies[0]["ok"], true);
        assert_eq!(replies[0]["response"]["flags"], json!(["-DX", "-DY"]));
        assert_eq!(replies[1]["ok"], false);
        assert_eq!(resolver.cache_statistics().cache_hits, 1);
    }

    #[test]
    fn test_find_command() {
        let temp_dir = project();
        let mut out = Vec::new();

        let code =
            run_find(ResolverOptions::default(), &temp_dir.path().join("a.c"), &mut out).unwrap();

        assert_eq!(code, 0);
        let output = String::from_utf8(out).unwrap();
        assert!(output.contains(OVERRIDE_FILE_NAME));
    }

    #[test]
    fn test_validate_config() {
        let temp_dir = project();

        let result = run_validate_config(temp_dir.path().join(OVERRIDE_FILE_NAME));
        assert_eq!(result.unwrap(), 0);

        fs::write(temp_dir.path().join("bad.yml"), "flags: 42").unwrap();
        let result = run_validate_config(temp_dir.path().join("bad.yml"));
        assert_eq!(result.unwrap(), 1);
    }
}
