use std::io::{Write, stdout};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{self, DisableMouseCapture, EnableMouseCapture};
use crossterm::execute;
use ratatui::DefaultTerminal;

use crate::app::effects::{default_output_path, document_dir, refresh_preview, write_page};
use crate::app::{App, Message, Model, Toast, ToastLevel, handle_event, update};
use crate::counts::INITIAL_MARKDOWN;
use crate::editor::HostEditor;
use crate::slash::{SlashCommands, TemplateCatalog};
use crate::watcher::{DocumentWatcher, POLL_INTERVAL};

/// Quiet time after the last edit before the preview is rebuilt.
const PUBLISH_DEBOUNCE: Duration = Duration::from_millis(150);
/// How long a toast stays in the status bar.
const TOAST_DURATION: Duration = Duration::from_secs(3);
/// Event poll timeout when nothing is pending.
const IDLE_POLL_MS: u64 = 250;

impl App {
    /// Run the preview pipeline, and keep running while watching or editing.
    ///
    /// # Errors
    ///
    /// Returns an error if the runtime cannot start, the terminal cannot be
    /// initialized, the document or template catalog cannot be read, or the
    /// preview cannot be written.
    pub fn run(&mut self) -> Result<()> {
        let _run_scope = crate::perf::scope("app.run.total");
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_time()
            .build()
            .context("Failed to start async runtime")?;
        let local = tokio::task::LocalSet::new();
        local.block_on(&runtime, self.run_local())
    }

    async fn run_local(&self) -> Result<()> {
        let mut model = self.build_model()?;

        if let Some(name) = &self.export_name {
            let dir = document_dir(&self.file_path);
            let path = crate::export::export_markdown(&dir, name, &model.editor.text())?;
            println!("Exported {}", path.display());
        }
        if self.show_stats {
            println!("{}", model.counts());
        }

        let output = self.output_path();
        if self.interactive {
            return self.run_terminal(model, &output).await;
        }
        self.publish(&mut model, &output).await?;
        if !self.watch_enabled {
            model.preview.teardown();
            return Ok(());
        }

        let mut watcher: Option<DocumentWatcher> = None;
        model.watch_enabled = true;
        self.handle_message_side_effects(&mut model, &mut watcher, &Message::ToggleWatch);
        if let Some(toast) = model.toast() {
            eprintln!("{}", toast.message);
        }

        while !model.should_quit && watcher.is_some() {
            tokio::time::sleep(POLL_INTERVAL).await;
            let changed = watcher
                .as_mut()
                .is_some_and(DocumentWatcher::take_change_ready);
            if !changed {
                continue;
            }
            model = self.dispatch(model, &mut watcher, Message::FileChanged);
            if let Some(toast) = model.toast().filter(|t| t.level != ToastLevel::Info) {
                eprintln!("{}", toast.message);
            }
            model.clear_toast();
            self.publish(&mut model, &output).await?;
        }

        model.preview.teardown();
        Ok(())
    }

    /// Apply a message: pure update, then side effects.
    pub(super) fn step(
        &self,
        model: Model,
        watcher: &mut Option<DocumentWatcher>,
        msg: Message,
    ) -> Model {
        let mut model = update(model, msg.clone());
        self.handle_message_side_effects(&mut model, watcher, &msg);
        model
    }

    /// [`Self::step`], then a frame.
    pub(super) fn dispatch(
        &self,
        model: Model,
        watcher: &mut Option<DocumentWatcher>,
        msg: Message,
    ) -> Model {
        let model = self.step(model, watcher, msg);
        update(model, Message::Frame)
    }

    /// Edit the document in the terminal, republishing the page as it changes.
    async fn run_terminal(&self, model: Model, output: &Path) -> Result<()> {
        let init_scope = crate::perf::scope("app.ratatui_init");
        let mut terminal = ratatui::try_init().context(
            "Failed to initialize terminal - livemark --edit requires an interactive terminal",
        )?;
        drop(init_scope);

        let result = match execute!(stdout(), EnableMouseCapture)
            .and_then(|()| set_mouse_motion_tracking(true))
        {
            Ok(()) => self.terminal_loop(&mut terminal, model, output).await,
            Err(err) => Err(err.into()),
        };

        let _ = set_mouse_motion_tracking(false);
        let _ = execute!(stdout(), DisableMouseCapture);
        ratatui::restore();
        result
    }

    async fn terminal_loop(
        &self,
        terminal: &mut DefaultTerminal,
        model: Model,
        output: &Path,
    ) -> Result<()> {
        let size = terminal.size()?;
        let mut model = update(model, Message::Resize(size.width, size.height));
        let mut watcher: Option<DocumentWatcher> = None;
        if self.watch_enabled {
            model.watch_enabled = true;
            self.handle_message_side_effects(&mut model, &mut watcher, &Message::ToggleWatch);
        }

        let mut preview_lines = Vec::new();
        let mut layout = model.layout;
        let mut seen_revision = model.editor.revision();
        let mut last_edit: Option<Instant> = None;
        let mut shown_toast: Option<(Toast, Instant)> = None;
        let mut frame_idx: u64 = 0;
        let mut needs_render = true;

        loop {
            if model.watch_enabled
                && watcher
                    .as_mut()
                    .is_some_and(DocumentWatcher::take_change_ready)
            {
                model = self.step(model, &mut watcher, Message::FileChanged);
                needs_render = true;
            }

            if model.editor.revision() != seen_revision {
                seen_revision = model.editor.revision();
                last_edit = Some(Instant::now());
            }
            if model.preview_dirty()
                && last_edit.is_none_or(|at| at.elapsed() >= PUBLISH_DEBOUNCE)
            {
                if let Err(err) = self.publish(&mut model, output).await {
                    model.show_toast(ToastLevel::Error, format!("{err:#}"));
                }
                model = fit_preview(model, &mut preview_lines);
                needs_render = true;
            } else if model.layout != layout {
                model = fit_preview(model, &mut preview_lines);
                needs_render = true;
            }
            layout = model.layout;

            if expire_toast(&mut model, &mut shown_toast) {
                needs_render = true;
            }

            let poll_ms = if needs_render {
                0
            } else if model.preview_dirty() {
                10
            } else {
                IDLE_POLL_MS
            };
            if event::poll(Duration::from_millis(poll_ms))? {
                if let Some(msg) = handle_event(event::read()?, &model) {
                    crate::perf::log_event(
                        "event.message",
                        format!("frame={frame_idx} msg={msg:?}"),
                    );
                    model = self.step(model, &mut watcher, msg);
                    needs_render = true;
                }

                // Coalesce key repeat bursts into a single frame.
                while event::poll(Duration::ZERO)? {
                    if let Some(msg) = handle_event(event::read()?, &model) {
                        model = self.step(model, &mut watcher, msg);
                        needs_render = true;
                    }
                }
            }

            if needs_render {
                frame_idx += 1;
                let draw_start = Instant::now();
                terminal.draw(|frame| crate::ui::render(&model, &preview_lines, frame))?;
                crate::perf::log_event(
                    "frame.draw",
                    format!(
                        "frame={} draw_ms={:.3}",
                        frame_idx,
                        draw_start.elapsed().as_secs_f64() * 1000.0
                    ),
                );
                model = update(model, Message::Frame);
                needs_render = false;
            }

            if model.should_quit {
                break;
            }
            tokio::task::yield_now().await;
        }

        model.preview.teardown();
        Ok(())
    }

    /// Rebuild the preview if needed, wait for its islands, write the page.
    async fn publish(&self, model: &mut Model, output: &Path) -> Result<()> {
        if refresh_preview(model).is_none() {
            return Ok(());
        }
        model.preview.settle().await;
        write_page(model, output)
    }

    fn build_model(&self) -> Result<Model> {
        let text = if self.file_path.exists() {
            std::fs::read_to_string(&self.file_path)
                .with_context(|| format!("Failed to read {}", self.file_path.display()))?
        } else {
            tracing::info!(path = %self.file_path.display(), "new document");
            INITIAL_MARKDOWN.to_string()
        };

        let catalog = match &self.templates_path {
            Some(path) => TemplateCatalog::from_json_file(path)
                .with_context(|| format!("Failed to load templates {}", path.display()))?,
            None => TemplateCatalog::builtin(),
        };
        let slash = SlashCommands::new(catalog).with_static_palette(self.static_palette);

        Ok(Model::new(self.file_path.clone(), &text)
            .with_slash_commands(slash)
            .with_settings(self.settings)
            .with_scroll_sync(self.scroll_sync))
    }

    fn output_path(&self) -> PathBuf {
        self.output_path
            .clone()
            .unwrap_or_else(|| default_output_path(&self.file_path))
    }
}

/// Re-wrap the preview text for the current layout and report its height.
pub(super) fn fit_preview(model: Model, lines: &mut Vec<String>) -> Model {
    let Some(layout) = model.layout else {
        return model;
    };
    let text = crate::ui::preview_text(&model.preview.html());
    *lines = crate::ui::wrap_lines(&text, usize::from(layout.preview_text().width));
    let line_height = model.editor.metrics().line_height;
    let line_count = u32::try_from(lines.len()).unwrap_or(u32::MAX);
    update(
        model,
        Message::PreviewResized {
            scroll_height: f64::from(line_count) * line_height,
            client_height: f64::from(layout.preview.height) * line_height,
        },
    )
}

/// Clear the toast once it has been up for [`TOAST_DURATION`]. Returns
/// whether the status bar changed.
pub(super) fn expire_toast(model: &mut Model, shown: &mut Option<(Toast, Instant)>) -> bool {
    let Some(toast) = model.toast() else {
        *shown = None;
        return false;
    };
    match shown.as_ref() {
        Some((seen, since)) if seen == toast => {
            if since.elapsed() < TOAST_DURATION {
                return false;
            }
            model.clear_toast();
            *shown = None;
            true
        }
        _ => {
            *shown = Some((toast.clone(), Instant::now()));
            false
        }
    }
}

fn set_mouse_motion_tracking(enable: bool) -> std::io::Result<()> {
    // Any-event motion reporting (1003) with SGR encoding (1006) for palette hover.
    let mut out = stdout();
    if enable {
        out.write_all(b"\x1b[?1003h\x1b[?1006h")?;
    } else {
        out.write_all(b"\x1b[?1003l\x1b[?1006l")?;
    }
    out.flush()
}
