use std::path::PathBuf;

use anyhow::{Context, Result, bail};
use clap::Parser;
use engine::app::{AppConfig, run_game};
use quiz::app::QuizApp;
use quiz::backdrop::{BackdropResolver, FileImageLoader};
use quiz::bank::{ALL_CATEGORIES, QuestionBank};
use quiz::leaderboard::JsonFileStore;
use quiz::machine::GameStateMachine;
use quiz::overlay::TerminalOverlay;
use quiz::question::Difficulty;
use quiz::render::RenderEngine;
use quiz::session::{Session, StartRequest};
use quiz::settings::SettingsStore;
use tracing_subscriber::EnvFilter;
use winit::dpi::LogicalSize;

#[derive(Debug, Parser)]
#[command(name = "quiz")]
#[command(about = "Timed multiple-choice quiz with lifelines and a local leaderboard")]
struct Cli {
    /// Player name shown on the leaderboard.
    #[arg(long, default_value = "")]
    name: String,
    /// easy, normal or hard.
    #[arg(long, default_value = "normal")]
    difficulty: Difficulty,
    #[arg(long, default_value = ALL_CATEGORIES)]
    category: String,
    /// Question bank JSON; overrides the settings file.
    #[arg(long)]
    bank: Option<PathBuf>,
    #[arg(long)]
    settings: Option<PathBuf>,
    #[arg(long)]
    width: Option<u32>,
    #[arg(long)]
    height: Option<u32>,
    /// Print the bank's categories and exit.
    #[arg(long, default_value_t = false)]
    list_categories: bool,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let settings_store = match &cli.settings {
        Some(path) => SettingsStore::new(path),
        None => SettingsStore::from_env(),
    };
    let settings = settings_store.load();

    let bank_path = cli.bank.clone().unwrap_or_else(|| settings.bank_path.clone());
    let bank = QuestionBank::load(&bank_path)
        .with_context(|| format!("loading question bank {}", bank_path.display()))?;

    if cli.list_categories {
        println!("{ALL_CATEGORIES}");
        for name in bank.category_names() {
            println!("{name}");
        }
        return Ok(());
    }
    if bank.questions.is_empty() {
        bail!("question bank {} has no questions", bank_path.display());
    }
    if cli.category != ALL_CATEGORIES && !bank.categories.contains_key(&cli.category) {
        tracing::warn!(category = %cli.category, "unknown category, using the default backdrop");
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("quiz-loader")
        .build()
        .context("starting image loader runtime")?;

    let mut machine = GameStateMachine::new(JsonFileStore::from_env());
    TerminalOverlay::attach(&mut machine);
    let session = Session::new(machine)
        .with_auto_advance(settings.auto_advance())
        .with_question_count(settings.question_count);

    let loader = FileImageLoader::new(settings.assets_dir.clone(), runtime.handle().clone());
    let render = RenderEngine::new(BackdropResolver::new(
        loader,
        settings.default_backdrop.clone(),
    ));
    let start = StartRequest {
        name: cli.name,
        difficulty: cli.difficulty,
        category: cli.category,
    };
    let app = QuizApp::new(session, bank, start, render);

    let config = AppConfig {
        title: "Quiz Rush".to_string(),
        desired_size: LogicalSize::new(
            cli.width.unwrap_or(settings.window.width).max(320),
            cli.height.unwrap_or(settings.window.height).max(240),
        ),
        clamp_to_monitor: true,
        vsync: Some(settings.window.vsync),
    };
    if let Err(err) = run_game(config, app) {
        bail!("window loop failed: {err}");
    }
    Ok(())
}
