use std::io::IsTerminal;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use zipper_core::{AppViewModel, ItemRowView};

fn bar_style() -> ProgressStyle {
    ProgressStyle::with_template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} {msg}")
        .map(|style| style.progress_chars("=> "))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
}

/// Draws the download progress of the view model. Nothing is drawn when
/// stderr is not a terminal.
pub struct Renderer {
    is_tty: bool,
    bar: Option<ProgressBar>,
}

impl Renderer {
    pub fn new() -> Self {
        Self {
            is_tty: std::io::stderr().is_terminal(),
            bar: None,
        }
    }

    #[cfg(test)]
    pub fn hidden() -> Self {
        Self {
            is_tty: false,
            bar: None,
        }
    }

    #[cfg(test)]
    fn is_drawing(&self) -> bool {
        self.bar.is_some()
    }

    pub fn render(&mut self, view: &AppViewModel) {
        match &view.progress {
            Some(progress) => {
                let is_tty = self.is_tty;
                let bar = self.bar.get_or_insert_with(|| {
                    let bar = ProgressBar::with_draw_target(
                        Some(progress.total as u64),
                        if is_tty {
                            ProgressDrawTarget::stderr()
                        } else {
                            ProgressDrawTarget::hidden()
                        },
                    );
                    bar.set_style(bar_style());
                    bar
                });
                bar.set_length(progress.total as u64);
                bar.set_position(progress.completed as u64);
                bar.set_message(progress.label.clone());
            }
            None => {
                if let Some(bar) = self.bar.take() {
                    bar.finish_and_clear();
                }
            }
        }
    }
}

impl Default for Renderer {
    fn default() -> Self {
        Self::new()
    }
}

pub fn format_row(row: &ItemRowView) -> String {
    let mark = if row.selected { 'x' } else { ' ' };
    format!(
        "[{mark}] {:>3}  {:<24} {}",
        row.index + 1,
        row.file_name,
        row.locator
    )
}
