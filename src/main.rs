use clap::Parser;
use imghint::config::{self, Engine, RewriteConfig, SizeUnit};
use imghint::{output, run};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

fn version_string() -> &'static str {
    let on_tag = env!("ON_RELEASE_TAG");
    if on_tag == "true" {
        env!("CARGO_PKG_VERSION")
    } else {
        let hash = env!("GIT_HASH");
        if hash.is_empty() {
            "dev@unknown"
        } else {
            // Called once at startup; the leak is a few bytes
            Box::leak(format!("dev@{hash}").into_boxed_str())
        }
    }
}

#[derive(Parser)]
#[command(name = "imghint")]
#[command(about = "Inject image size and loading hints into HTML and PHP pages")]
#[command(long_about = "\
Inject image size and loading hints into HTML and PHP pages

Every <img> whose source resolves to a readable PNG, JPEG, or WebP file gets
explicit width/height attributes, an inline width style, and lazy-loading
hints. Attributes the page author already wrote are never overwritten, so the
rewrite is safe to run repeatedly.

Layout:

  project/
  ├── imghint.toml        # Optional defaults (unit, engine, directories)
  ├── input/              # Pages to rewrite (.html and .php)
  ├── images/             # Images referenced by the pages
  └── output/             # Rewritten pages, same filenames

Image references resolve against the page's own directory first, then against
the project root. PHP blocks and HTML comments pass through untouched.

Settings not given as arguments are prompted for; pass --yes to accept
defaults (or imghint.toml values) without prompting.")]
#[command(version = version_string())]
struct Cli {
    /// Width unit for the injected inline style: rem, vw, or none
    unit: Option<String>,

    /// Reference viewport width in pixels, used with vw
    base_width: Option<String>,

    /// Lazy-loading hints: anything but "false" keeps them on
    lazy: Option<String>,

    /// Rewrite engine: scan or tree
    engine: Option<String>,

    /// Directory of pages to rewrite
    #[arg(long)]
    input: Option<PathBuf>,

    /// Directory rewritten pages are written to
    #[arg(long)]
    output: Option<PathBuf>,

    /// Project root: imghint.toml location and image-reference fallback
    #[arg(long, default_value = ".")]
    root: PathBuf,

    /// Write a JSON run report to this path
    #[arg(long)]
    report: Option<PathBuf>,

    /// Accept defaults without prompting
    #[arg(short, long)]
    yes: bool,
}

impl Cli {
    fn no_positionals(&self) -> bool {
        self.unit.is_none()
            && self.base_width.is_none()
            && self.lazy.is_none()
            && self.engine.is_none()
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let mut cli = Cli::parse();

    let file_config = config::load_file_config(&cli.root)?.unwrap_or_default();
    let mut config = RewriteConfig::with_file_defaults(&file_config);

    if cli.no_positionals() && !cli.yes {
        prompt_for_settings(&mut cli, &config)?;
    }
    apply_positionals(&cli, &mut config);

    let input_dir = resolve_dir(&cli.root, cli.input.as_deref(), file_config.input.as_deref(), "input");
    let output_dir = resolve_dir(&cli.root, cli.output.as_deref(), file_config.output.as_deref(), "output");

    bootstrap_input(&cli, &input_dir)?;

    let options = run::RunOptions {
        config,
        input_dir,
        output_dir,
        project_root: cli.root.clone(),
    };
    let summary = match run::run(&options) {
        Ok(summary) => summary,
        // Nothing to do is not a failure
        Err(run::RunError::NoInputFiles(dir)) => {
            println!("No .html or .php files in {}, nothing to rewrite.", dir.display());
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };
    output::print_run_output(&summary);

    if let Some(report_path) = &cli.report {
        let json = serde_json::to_string_pretty(&summary)?;
        std::fs::write(report_path, json)?;
        println!("Report written to {}", report_path.display());
    }

    if summary.failures() > 0 {
        std::process::exit(1);
    }
    Ok(())
}

/// CLI positionals override everything; parsing is lenient throughout.
fn apply_positionals(cli: &Cli, config: &mut RewriteConfig) {
    if let Some(unit) = &cli.unit {
        config.size_unit = SizeUnit::parse_lenient(unit);
    }
    if let Some(base) = &cli.base_width {
        if let Ok(px) = base.trim().parse::<u32>() {
            if px > 0 {
                config.base_width_px = px;
            }
        }
    }
    if let Some(lazy) = &cli.lazy {
        config.apply_lazy_loading = !lazy.trim().eq_ignore_ascii_case("false");
    }
    if let Some(engine) = &cli.engine {
        config.engine = Engine::parse_lenient(engine);
    }
}

/// Ask for each setting, defaulting to the current (file or built-in) value.
/// Answers land back on the `Cli` so `apply_positionals` stays the single
/// place precedence is decided. The base width only matters for `vw`, so it
/// is only asked for then.
fn prompt_for_settings(cli: &mut Cli, config: &RewriteConfig) -> io::Result<()> {
    let unit = prompt("Width unit (rem, vw, none)", config.size_unit.as_str())?;
    if SizeUnit::parse_lenient(&unit) == SizeUnit::Vw {
        cli.base_width = Some(prompt(
            "Base viewport width in px",
            &config.base_width_px.to_string(),
        )?);
    }
    cli.unit = Some(unit);
    cli.lazy = Some(prompt(
        "Lazy-loading hints (true/false)",
        if config.apply_lazy_loading { "true" } else { "false" },
    )?);
    cli.engine = Some(prompt("Engine (scan, tree)", config.engine.as_str())?);
    Ok(())
}

fn prompt(question: &str, default: &str) -> io::Result<String> {
    print!("{question} [{default}]: ");
    io::stdout().flush()?;

    let mut line = String::new();
    io::stdin().read_line(&mut line)?;
    let answer = line.trim();
    Ok(if answer.is_empty() {
        default.to_string()
    } else {
        answer.to_string()
    })
}

/// Precedence for the input/output directories: CLI flag → imghint.toml →
/// `<root>/<name>`. Relative paths resolve against the project root.
fn resolve_dir(root: &Path, flag: Option<&Path>, file: Option<&Path>, name: &str) -> PathBuf {
    let chosen = flag
        .or(file)
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(name));
    if chosen.is_absolute() {
        chosen
    } else {
        root.join(chosen)
    }
}

/// First-run bootstrap: create the expected directories and wait until the
/// user has dropped files in. With `--yes` there is no one to wait for; a
/// still-empty input directory ends the run via its no-input path.
fn bootstrap_input(cli: &Cli, input_dir: &Path) -> io::Result<()> {
    while !run::has_input_files(input_dir) {
        std::fs::create_dir_all(input_dir)?;
        std::fs::create_dir_all(cli.root.join("images"))?;
        if cli.yes {
            return Ok(());
        }
        println!(
            "No .html or .php files in {} — add pages there (and images under {}), then press Enter to continue.",
            input_dir.display(),
            cli.root.join("images").display()
        );
        let mut line = String::new();
        io::stdin().read_line(&mut line)?;
    }
    Ok(())
}
