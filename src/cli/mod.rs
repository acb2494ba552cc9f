use std::io;
use std::io::IsTerminal;
use std::io::Write;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Args, CommandFactory, Parser, Subcommand};

use crate::core::Intensity;
use crate::engine::{Engine, EngineOptions};
use crate::ui::UiConfig;

#[derive(Debug, Parser)]
#[command(
    name = "windiet",
    version,
    about = "Windowsのリソース状態を診断し、ローカルLLMの推奨に基づく最適化プランを実行する"
)]
pub struct Cli {
    #[arg(long, global = true)]
    pub json: bool,
    #[arg(long = "no-color", global = true)]
    pub no_color: bool,
    #[arg(long, global = true)]
    pub verbose: bool,
    #[arg(long, global = true)]
    pub quiet: bool,
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,
    #[arg(long, global = true)]
    pub dry_run: bool,
    #[arg(long, global = true)]
    pub yes: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    Report(ReportArgs),
    Optimize(OptimizeArgs),
    Plan(PlanArgs),
    Clean(CleanArgs),
    Startup(StartupArgs),
    Analyze(AnalyzeArgs),
    Config(ConfigArgs),
    Completion(CompletionArgs),
}

#[derive(Debug, Args)]
pub struct ReportArgs {}

#[derive(Debug, Args)]
pub struct OptimizeArgs {}

#[derive(Debug, Args)]
pub struct PlanArgs {
    #[arg(long)]
    pub file: Option<PathBuf>,
    #[arg(long)]
    pub text: Option<String>,
}

#[derive(Debug, Args)]
pub struct CleanArgs {
    #[arg(long)]
    pub intensity: Option<String>,
    #[arg(long)]
    pub browsers: bool,
}

#[derive(Debug, Args)]
pub struct StartupArgs {
    #[arg(long)]
    pub intensity: Option<String>,
}

#[derive(Debug, Args)]
pub struct AnalyzeArgs {
    #[arg(long, default_value_t = 10)]
    pub top: usize,
}

#[derive(Debug, Args)]
pub struct ConfigArgs {
    #[arg(long)]
    pub show: bool,
}

#[derive(Debug, Args)]
pub struct CompletionArgs {
    pub shell: String,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let stdin_is_tty = io::stdin().is_terminal();
    let stdout_is_tty = io::stdout().is_terminal();
    let stderr_is_tty = io::stderr().is_terminal();

    let home_dir = crate::platform::effective_home_dir()?;

    let env_config_path = std::env::var_os("WINDIET_CONFIG").map(PathBuf::from);
    let cfg = crate::config::load(
        cli.config.as_deref().or(env_config_path.as_deref()),
        &home_dir,
    )
    .map_err(crate::exit::invalid_args_err)?;

    let color = stdout_is_tty && cfg.ui.color && !cli.no_color;

    let ui_cfg = UiConfig {
        color,
        stdin_is_tty,
        stdout_is_tty,
        stderr_is_tty,
        max_table_rows: cfg.ui.max_table_rows,
        quiet: cli.quiet,
        verbose: cli.verbose,
    };

    let engine = Engine::new(
        EngineOptions {
            show_progress: stderr_is_tty && !cli.quiet && !cli.json,
        },
        cfg,
    )?;

    match cli.command {
        Commands::Report(_args) => {
            let report = engine.probe();
            if cli.json {
                write_json(&report)?;
            } else {
                crate::ui::print_system_report(&report, &ui_cfg);
            }
        }
        Commands::Analyze(args) => {
            let files = engine
                .analyze_disk()
                .map_err(crate::exit::invalid_args_err)?;
            if cli.json {
                write_json(&files)?;
            } else {
                crate::ui::print_large_files(
                    &files,
                    &ui_cfg,
                    args.top,
                    engine.home_dir(),
                    engine.mask_home(),
                );
            }
        }
        Commands::Clean(args) => {
            let intensity = parse_intensity(args.intensity.as_deref())?;

            if cli.dry_run {
                let paths = engine.cleanup_paths();
                if !ui_cfg.quiet {
                    println!(
                        "dry-run: 強度 {intensity} で以下を走査します（しきい値: {}日）:",
                        crate::cleanup::temp_age_threshold(intensity).as_secs() / 86_400
                    );
                    for root in &paths.temp_roots {
                        println!("- {}", root.display());
                    }
                    if intensity == Intensity::High {
                        for root in &paths.temp_roots_high {
                            println!("- {}", root.display());
                        }
                    }
                    if args.browsers {
                        for dir in &paths.browser_cache_dirs {
                            println!("- {}", dir.display());
                        }
                    }
                }
                return Ok(());
            }

            let temp = engine.clean_temp(intensity);
            let mut freed = temp.freed_bytes;
            let mut removed = temp.removed.len();
            let mut errors = temp.errors;

            if args.browsers {
                let caches = engine.clean_browser_caches(intensity);
                freed = freed.saturating_add(caches.freed_bytes);
                removed += caches.removed.len();
                errors = errors.saturating_add(caches.errors);
            }

            if !ui_cfg.quiet {
                println!(
                    "{} を解放しました（{}件削除）",
                    crate::ui::format_bytes(freed),
                    removed
                );
                if errors > 0 {
                    println!("スキップ: {errors}件（権限不足または走査エラー）");
                }
                if ui_cfg.verbose {
                    for path in temp.removed.iter().take(ui_cfg.max_table_rows) {
                        println!(
                            "- {}",
                            crate::ui::mask_home(path, engine.home_dir(), engine.mask_home())
                        );
                    }
                }
            }
        }
        Commands::Startup(args) => {
            let intensity = parse_intensity(args.intensity.as_deref())?;

            if cli.dry_run {
                let outcome = engine
                    .preview_startup(intensity)
                    .map_err(crate::exit::external_cmd_err)?;
                if !ui_cfg.quiet {
                    println!("dry-run: {}", outcome.summary());
                    for name in &outcome.disabled {
                        println!("- 無効化対象: {name}");
                    }
                }
                return Ok(());
            }

            let outcome = engine
                .prune_startup(intensity)
                .map_err(crate::exit::external_cmd_err)?;
            if !ui_cfg.quiet {
                println!("{}", outcome.summary());
            }
        }
        Commands::Plan(args) => {
            let (text, source) = match (args.text, args.file) {
                (Some(text), None) => (text, "plan-text".to_string()),
                (None, Some(path)) => {
                    let text = std::fs::read_to_string(&path)
                        .with_context(|| {
                            format!("プランファイルの読み取りに失敗しました: {}", path.display())
                        })
                        .map_err(crate::exit::invalid_args_err)?;
                    (text, format!("plan-file:{}", path.display()))
                }
                _ => {
                    return Err(crate::exit::invalid_args(
                        "plan は --file か --text のどちらか一方を指定してください",
                    ));
                }
            };

            let plan = crate::plan::parse_plan(&text).map_err(crate::exit::plan_failed)?;

            if !cli.json {
                crate::ui::print_plan(&plan, &ui_cfg);
            }
            if cli.dry_run {
                return Ok(());
            }

            let started_at = time::OffsetDateTime::now_utc();
            let report = engine.run_plan(&plan);
            let finished_at = time::OffsetDateTime::now_utc();

            let log_path = crate::logs::write_plan_apply_log(
                engine.home_dir(),
                started_at,
                finished_at,
                &source,
                &plan,
                &report,
            )?;

            if cli.json {
                write_json(&report)?;
            } else {
                crate::ui::print_plan_report(&report, &ui_cfg);
                if !ui_cfg.quiet {
                    println!(
                        "ログ: {}",
                        crate::logs::log_hint(&log_path, engine.home_dir())
                    );
                }
            }
        }
        Commands::Optimize(_args) => {
            let client = engine.advisor_client()?;
            if !client.is_available() {
                return Err(crate::exit::external_cmd(format!(
                    "推奨サービスが検出できませんでした（{}）。`ollama serve` を起動してから再試行してください",
                    client.endpoint()
                )));
            }
            if !client.model_installed() {
                return Err(crate::exit::external_cmd(format!(
                    "モデル {} がインストールされていません。`ollama pull {}` を実行してください",
                    client.model(),
                    client.model()
                )));
            }

            let report = engine.probe();
            if !ui_cfg.quiet && !cli.json {
                crate::ui::print_system_report(&report, &ui_cfg);
                println!();
            }

            let text = engine
                .fetch_plan_text(&report)
                .map_err(crate::exit::external_cmd_err)?;
            let plan = crate::plan::parse_plan(&text).map_err(crate::exit::plan_failed)?;

            if !cli.json {
                crate::ui::print_plan(&plan, &ui_cfg);
            }
            if cli.dry_run {
                return Ok(());
            }

            if !cli.yes {
                if !(ui_cfg.stdin_is_tty && ui_cfg.stdout_is_tty) {
                    return Err(crate::exit::invalid_args(
                        "optimize の実行確認には TTY が必要です（--yes で省略できます）",
                    ));
                }
                if !confirm_exact(
                    "プランを実行するには 'run' と入力してください: ",
                    "run",
                )? {
                    if !ui_cfg.quiet {
                        eprintln!("キャンセルしました。");
                    }
                    return Ok(());
                }
            }

            let started_at = time::OffsetDateTime::now_utc();
            let plan_report = engine.run_plan(&plan);
            let finished_at = time::OffsetDateTime::now_utc();

            let log_path = crate::logs::write_plan_apply_log(
                engine.home_dir(),
                started_at,
                finished_at,
                "optimize",
                &plan,
                &plan_report,
            )?;

            if cli.json {
                write_json(&plan_report)?;
            } else {
                crate::ui::print_plan_report(&plan_report, &ui_cfg);
                if !ui_cfg.quiet {
                    println!(
                        "ログ: {}",
                        crate::logs::log_hint(&log_path, engine.home_dir())
                    );
                }
            }
        }
        Commands::Config(args) => {
            if args.show {
                if cli.json {
                    write_json(engine.config())?;
                } else {
                    print!("{}", crate::config::render_effective(engine.config())?);
                }
            } else {
                return Err(crate::exit::invalid_args(
                    "config は --show を指定してください",
                ));
            }
        }
        Commands::Completion(args) => {
            let shell = parse_shell(&args.shell)?;
            let mut cmd = Cli::command();
            let mut out = std::io::stdout().lock();
            clap_complete::generate(shell, &mut cmd, "windiet", &mut out);
        }
    }

    Ok(())
}

fn parse_intensity(value: Option<&str>) -> Result<Intensity> {
    match value {
        None => Ok(Intensity::Medium),
        Some(raw) => raw
            .parse::<Intensity>()
            .map_err(|msg| crate::exit::invalid_args(msg)),
    }
}

fn parse_shell(name: &str) -> Result<clap_complete::Shell> {
    match name.trim().to_ascii_lowercase().as_str() {
        "bash" => Ok(clap_complete::Shell::Bash),
        "zsh" => Ok(clap_complete::Shell::Zsh),
        "fish" => Ok(clap_complete::Shell::Fish),
        "powershell" => Ok(clap_complete::Shell::PowerShell),
        "elvish" => Ok(clap_complete::Shell::Elvish),
        other => Err(crate::exit::invalid_args(format!(
            "未対応のシェルです: {other}（bash|zsh|fish|powershell|elvish）"
        ))),
    }
}

fn confirm_exact(prompt: &str, token: &str) -> Result<bool> {
    let mut out = io::stdout().lock();
    let _ = write!(out, "{prompt}");
    let _ = out.flush();
    drop(out);

    let mut line = String::new();
    io::stdin()
        .read_line(&mut line)
        .context("確認入力の読み取りに失敗しました")?;
    Ok(line.trim() == token)
}

fn write_json<T: serde::Serialize>(value: &T) -> Result<()> {
    let buf = serde_json::to_vec_pretty(value).context("JSON出力に失敗しました")?;

    let mut stdout = io::stdout().lock();
    match stdout.write_all(&buf) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::BrokenPipe => return Ok(()),
        Err(err) => return Err(err.into()),
    }
    let _ = stdout.write_all(b"\n");
    Ok(())
}
