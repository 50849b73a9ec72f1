use std::fs;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use zipper_core::{update, AppState, DownloadPhase, Msg};
use zipper_engine::{AtomicFileWriter, EngineHandle};
use zipper_logging::{zipper_info, zipper_warn};

use crate::cli::Cli;
use crate::effects::EffectRunner;
use crate::render::{format_row, Renderer};

/// Drives the core state machine: every message goes through `update`,
/// the view is re-rendered when state changed, and effects are executed.
pub struct App {
    state: AppState,
    runner: EffectRunner,
    renderer: Renderer,
}

impl App {
    pub fn new(runner: EffectRunner, renderer: Renderer) -> Self {
        Self {
            state: AppState::new(),
            runner,
            renderer,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn dispatch(&mut self, msg: Msg) -> Result<()> {
        let state = std::mem::take(&mut self.state);
        let (mut state, effects) = update(state, msg);
        if state.consume_dirty() {
            self.renderer.render(&state.view());
        }
        self.state = state;
        self.runner.run(effects)
    }

    /// Apply `--all`, then toggle each 1-based row in `rows`.
    pub fn select(&mut self, all: bool, rows: &[usize]) -> Result<()> {
        if all {
            self.dispatch(Msg::SelectAllToggled)?;
        }
        let count = self.state.items().len();
        for &row in rows {
            if row == 0 || row > count {
                bail!("row {row} is out of range (list has {count} entries)");
            }
            self.dispatch(Msg::ItemToggled { index: row - 1 })?;
        }
        Ok(())
    }

    /// Run the download for the current selection and return the path of
    /// the saved archive.
    pub fn download(&mut self) -> Result<PathBuf> {
        self.dispatch(Msg::DownloadClicked)?;
        if self.state.phase() == DownloadPhase::Idle {
            bail!("nothing selected; use --all or --select");
        }
        while self.state.phase() == DownloadPhase::Running {
            let msg = self.runner.next_msg()?;
            self.dispatch(msg)?;
        }
        match self.runner.take_saved() {
            Some(path) => Ok(path),
            None => bail!(
                "{}",
                self.state
                    .view()
                    .status
                    .unwrap_or_else(|| "download failed".to_string())
            ),
        }
    }
}

pub fn run(cli: Cli) -> Result<()> {
    let text = fs::read_to_string(&cli.input)
        .with_context(|| format!("failed to read {}", cli.input.display()))?;

    let engine = EngineHandle::new(cli.engine_config()).context("failed to start engine")?;
    let runner = EffectRunner::new(engine, AtomicFileWriter::new(cli.output_dir.clone()));
    let canceller = runner.canceller();
    ctrlc::set_handler(move || {
        zipper_warn!("Interrupted; cancelling download");
        canceller.cancel();
    })
    .context("failed to install Ctrl-C handler")?;

    let mut app = App::new(runner, Renderer::new());
    app.dispatch(Msg::InputLoaded(text))?;
    zipper_info!(
        "Loaded {} locator(s) from {}",
        app.state().items().len(),
        cli.input.display()
    );

    if cli.list {
        for row in &app.state().view().rows {
            println!("{}", format_row(row));
        }
        return Ok(());
    }

    app.select(cli.all, &cli.select)?;
    let path = app.download()?;

    let view = app.state().view();
    if let Some(status) = &view.status {
        println!("{status}");
    }
    if view.failed_count > 0 {
        eprintln!(
            "warning: {} of {} selected item(s) could not be fetched",
            view.failed_count, view.selected_count
        );
        for (ordinal, reason) in app.state().failures() {
            eprintln!("  #{ordinal}: {reason}");
        }
    }
    println!("Wrote {}", path.display());
    Ok(())
}
