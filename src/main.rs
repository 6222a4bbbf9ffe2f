use std::path::PathBuf;
use std::sync::OnceLock;

use anyhow::Context;
use clap::{ArgAction, ColorChoice, CommandFactory, Parser, ValueEnum};
use clap_complete::Shell;
use comfy_table::{ContentArrangement, Table};
use is_terminal::IsTerminal;
use serde::{Deserialize, Serialize};

mod html;
mod markdown;
mod report;

static ENABLE_COLOR: OnceLock<bool> = OnceLock::new();

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum OutputFmt { Text, Json }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme { Dark, Light }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogLevel { Error, Warn, Info, Debug, Trace }

#[derive(Clone, Copy, Debug, ValueEnum, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
enum LogFormat { Text, Json }

#[derive(Parser, Debug)]
#[command(
    name = "routechart",
    about = "BGP route convergence chart builder",
    long_about = "Reads the per-scenario route count series (JSON) written by a convergence benchmark run and renders a self-contained HTML line chart page.",
    after_long_help = "Examples:\n  routechart\n  routechart --dir results --out results/chart.html\n  routechart --check --output json\n  routechart --md-path summary.md --csv-path samples.csv",
    color = ColorChoice::Auto
)]
struct Args {
    #[arg(long, short = 'd', default_value = ".", help = "Directory holding the <scenario>.json inputs")]
    dir: PathBuf,
    #[arg(long, short = 'o', help = "Output HTML path (default <dir>/chart.html)")]
    out: Option<PathBuf>,
    #[arg(long, help = "External template file instead of the built-in page")]
    template: Option<PathBuf>,
    #[arg(long, value_enum, default_value = "dark")]
    theme: Theme,
    #[arg(long, value_enum, default_value = "text")]
    output: OutputFmt,
    #[arg(long, default_value_t = false, help = "Validate and summarize without writing any file")]
    check: bool,
    #[arg(long)]
    md_path: Option<String>,
    #[arg(long, short = 'j')]
    json_path: Option<String>,
    #[arg(long)]
    csv_path: Option<String>,
    #[arg(long)]
    config: Option<String>,
    #[arg(short = 'q', long, default_value_t = false)]
    quiet: bool,
    #[arg(short = 'v', long, action = ArgAction::Count)]
    verbose: u8,
    #[arg(long)]
    log_level: Option<LogLevel>,
    #[arg(long, value_enum)]
    log_format: Option<LogFormat>,
    #[arg(long)]
    log_path: Option<String>,
    #[arg(long, short = 'C', default_value_t = false)]
    no_color: bool,
    #[arg(long, default_value_t = false)]
    force_color: bool,
    #[arg(long, value_enum)]
    completions: Option<Shell>,
    #[arg(long)]
    completions_out: Option<String>,
}

impl Default for Args {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("."),
            out: None,
            template: None,
            theme: Theme::Dark,
            output: OutputFmt::Text,
            check: false,
            md_path: None,
            json_path: None,
            csv_path: None,
            config: None,
            quiet: false,
            verbose: 0,
            log_level: None,
            log_format: None,
            log_path: None,
            no_color: false,
            force_color: false,
            completions: None,
            completions_out: None,
        }
    }
}

#[derive(Deserialize)]
struct AppConfig {
    dir: Option<PathBuf>,
    out: Option<PathBuf>,
    template: Option<PathBuf>,
    theme: Option<Theme>,
    output: Option<OutputFmt>,
    md_path: Option<String>,
    json_path: Option<String>,
    csv_path: Option<String>,
    log_format: Option<LogFormat>,
    log_path: Option<String>,
}

fn main() {
    let mut args = Args::parse();
    if let Some(sh) = args.completions {
        let mut cmd = Args::command();
        if let Some(path) = args.completions_out.as_ref() {
            if let Ok(mut f) = std::fs::File::create(path) { clap_complete::generate(sh, &mut cmd, "routechart", &mut f); } else { clap_complete::generate(sh, &mut cmd, "routechart", &mut std::io::stdout()); }
        } else {
            clap_complete::generate(sh, &mut cmd, "routechart", &mut std::io::stdout());
        }
        return;
    }
    if let Some(p) = args.config.as_ref() {
        match std::fs::read_to_string(p) {
            Ok(s) => match toml::from_str::<AppConfig>(&s) {
                Ok(cfg) => apply_config(&mut args, cfg),
                Err(e) => eprintln!("Failed to parse config {}: {}", p, e),
            },
            Err(e) => eprintln!("Failed to read config {}: {}", p, e),
        }
    } else {
        let def = "Routechart.toml";
        if let Ok(s) = std::fs::read_to_string(def)
            && let Ok(cfg) = toml::from_str::<AppConfig>(&s) { apply_config(&mut args, cfg); }
    }
    {
        let mut builder = env_logger::Builder::from_env(env_logger::Env::default());
        if args.quiet {
            builder.filter_level(log::LevelFilter::Error);
        } else if let Some(lvl) = args.log_level {
            let f = match lvl { LogLevel::Error => log::LevelFilter::Error, LogLevel::Warn => log::LevelFilter::Warn, LogLevel::Info => log::LevelFilter::Info, LogLevel::Debug => log::LevelFilter::Debug, LogLevel::Trace => log::LevelFilter::Trace };
            builder.filter_level(f);
        } else if args.verbose > 0 {
            let f = if args.verbose >= 3 { log::LevelFilter::Trace } else if args.verbose == 2 { log::LevelFilter::Debug } else { log::LevelFilter::Info };
            builder.filter_level(f);
        }
        if let Some(fmt) = args.log_format {
            match fmt {
                LogFormat::Json => {
                    builder.format(|buf, record| {
                        use std::io::Write;
                        let ts = chrono::Local::now().to_rfc3339();
                        let obj = serde_json::json!({
                            "ts": ts,
                            "level": record.level().to_string(),
                            "target": record.target(),
                            "msg": record.args().to_string(),
                        });
                        writeln!(buf, "{}", obj)
                    });
                }
                LogFormat::Text => {
                    builder.format(|buf, record| {
                        use std::io::Write;
                        let ts = chrono::Local::now().format("%H:%M:%S");
                        writeln!(buf, "[{:<5} {}] {}", record.level(), ts, record.args())
                    });
                }
            }
        }
        if let Some(path) = args.log_path.as_ref() {
            match std::fs::File::create(path) {
                Ok(f) => {
                    builder.target(env_logger::Target::Pipe(Box::new(f)));
                }
                Err(e) => {
                    eprintln!("Failed to open log file {}: {}", path, e);
                }
            }
        }
        builder.init();
    }
    let term = std::env::var("TERM").unwrap_or_default();
    let no_color_env = std::env::var_os("NO_COLOR").is_some();
    let color_default = std::io::stdout().is_terminal() && !no_color_env && term != "dumb";
    let enable_color = if args.force_color { true } else { color_default && !args.no_color };
    let _ = ENABLE_COLOR.set(enable_color);
    if let Err(e) = run(&args) {
        log::error!("{:#}", e);
        std::process::exit(1);
    }
}

fn apply_config(args: &mut Args, cfg: AppConfig) {
    if args.dir.as_os_str() == "." && let Some(v) = cfg.dir { args.dir = v; }
    if args.out.is_none() && let Some(v) = cfg.out { args.out = Some(v); }
    if args.template.is_none() && let Some(v) = cfg.template { args.template = Some(v); }
    if let Some(v) = cfg.theme { args.theme = v; }
    if let Some(v) = cfg.output { args.output = v; }
    if args.md_path.is_none() && let Some(v) = cfg.md_path { args.md_path = Some(v); }
    if args.json_path.is_none() && let Some(v) = cfg.json_path { args.json_path = Some(v); }
    if args.csv_path.is_none() && let Some(v) = cfg.csv_path { args.csv_path = Some(v); }
    if let Some(v) = cfg.log_format { args.log_format = Some(v); }
    if args.log_path.is_none() && let Some(v) = cfg.log_path { args.log_path = Some(v); }
}

fn output_path(args: &Args) -> PathBuf {
    args.out.clone().unwrap_or_else(|| args.dir.join("chart.html"))
}

fn run(args: &Args) -> anyhow::Result<()> {
    let reports = report::load_reports(&args.dir)?;
    let template = match args.template.as_ref() {
        Some(p) => std::fs::read_to_string(p).with_context(|| format!("reading template {}", p.display()))?,
        None => html::builtin_template(args.theme),
    };
    // Render before any write so a failed run cannot touch existing output.
    let page = html::render_page(&template, &reports)?;
    let summary = report::build_summary(&reports);
    if args.check {
        log::info!("check mode, skipping all writes");
    } else {
        let out = output_path(args);
        report::write_atomic(&out, &page)?;
        if !args.quiet { println!("{}", paint(&format!("HTML generated: {}", out.display()), "1;36")); }
        if let Some(p) = args.csv_path.as_ref() {
            report::write_csv(p, &reports)?;
            if !args.quiet { println!("{}", paint(&format!("CSV written: {}", p), "1;36")); }
        }
        if let Some(p) = args.md_path.as_ref() {
            std::fs::write(p, markdown::render_markdown(&summary)).with_context(|| format!("writing {}", p))?;
            if !args.quiet { println!("{}", paint(&format!("Markdown written: {}", p), "1;36")); }
        }
    }
    match args.output {
        OutputFmt::Text => {
            if !args.quiet { print_summary(&summary); }
        }
        OutputFmt::Json => {
            let body = serde_json::to_string_pretty(&summary)?;
            match args.json_path.as_ref().filter(|_| !args.check) {
                Some(p) => {
                    std::fs::write(p, &body).with_context(|| format!("writing {}", p))?;
                    if !args.quiet { println!("{}", paint(&format!("JSON written: {}", p), "1;36")); }
                }
                None => {
                    if !args.quiet { println!("{}", body); }
                }
            }
        }
    }
    Ok(())
}

fn print_summary(summary: &report::RunSummary) {
    let mut table = Table::new();
    table.set_content_arrangement(ContentArrangement::Dynamic);
    table.set_header(["Report", "Samples", "First", "Last", "Peak Adv", "Peak Rcv", "Final Adv", "Final Rcv"]);
    for r in &summary.reports {
        table.add_row([
            r.name.to_string(),
            r.samples.to_string(),
            r.first_time.clone().unwrap_or_else(|| "-".to_string()),
            r.last_time.clone().unwrap_or_else(|| "-".to_string()),
            r.peak_advertised.to_string(),
            r.peak_received.to_string(),
            r.final_advertised.to_string(),
            r.final_received.to_string(),
        ]);
    }
    println!("{table}");
    println!("{}", paint(&format!("Total samples: {}", summary.total_samples), "1;36"));
}

fn paint(s: &str, code: &str) -> String {
    if *ENABLE_COLOR.get().unwrap_or(&false) { format!("\x1b[{}m{}\x1b[0m", code, s) } else { s.to_string() }
}
