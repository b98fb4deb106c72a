//! Livemark - a live markdown preview with math and diagram islands.
//!
//! # Usage
//!
//! ```bash
//! livemark README.md
//! livemark --watch --theme dark README.md
//! livemark --output preview.html --stats README.md
//! livemark --edit README.md
//! ```

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use livemark::app::App;
use livemark::config::{
    ConfigFlags, ThemeMode, clear_config_flags, global_config_path, load_config_flags,
    local_override_path, parse_flag_tokens, save_config_flags,
};
use livemark::perf;
use livemark::theme::{PreviewStyle, ThemeSettings};

/// A live markdown preview with math and diagram islands
#[derive(Parser, Debug)]
#[command(name = "livemark", version, about, long_about = None)]
struct Cli {
    /// Markdown file to preview (a starter document is shown if missing)
    #[arg(value_name = "FILE")]
    file: PathBuf,

    /// Where to write the HTML preview (default: FILE with .html extension)
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Watch the file for changes and rewrite the preview
    #[arg(short, long)]
    watch: bool,

    /// Edit the file in the terminal with a live preview pane
    #[arg(short, long)]
    edit: bool,

    /// Preview theme
    #[arg(long, value_enum)]
    theme: Option<ThemeMode>,

    /// Preview typesetting (prose or plain)
    #[arg(long, value_name = "STYLE")]
    preview_style: Option<PreviewStyle>,

    /// Load slash-command templates from a JSON file
    #[arg(long, value_name = "PATH")]
    templates: Option<PathBuf>,

    /// Disable editor/preview scroll synchronization
    #[arg(long)]
    no_scroll_sync: bool,

    /// Close the slash palette on any typed character instead of filtering
    #[arg(long)]
    static_palette: bool,

    /// Also export the document as NAME.md next to FILE
    #[arg(long, value_name = "NAME")]
    export: Option<String>,

    /// Print word, character and line counts
    #[arg(long)]
    stats: bool,

    /// Enable performance logging
    #[arg(long)]
    perf: bool,

    /// Write detailed render debug events to a file
    #[arg(long, value_name = "PATH")]
    render_debug_log: Option<PathBuf>,

    /// Save current command-line flags as defaults
    #[arg(long)]
    save: bool,

    /// Clear saved defaults
    #[arg(long)]
    clear: bool,
}

fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::WARN.into()),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args = std::env::args().collect::<Vec<_>>();
    let cli = Cli::parse();
    let global_path = global_config_path();
    let local_path = local_override_path();
    let cli_flags = parse_flag_tokens(&raw_args);

    if cli.clear {
        clear_config_flags(&global_path)?;
    }
    if cli.save {
        save_config_flags(&global_path, &cli_flags)?;
    }

    let file_flags = if cli.clear {
        ConfigFlags::default()
    } else {
        let global_flags = load_config_flags(&global_path)?;
        let local_flags = load_config_flags(&local_path)?;
        global_flags.union(&local_flags)
    };
    let effective = file_flags.union(&cli_flags);

    perf::set_enabled(effective.perf);
    let debug_log = perf::debug_log_path(effective.render_debug_log.as_deref());
    if let Err(err) = perf::set_debug_log_path(debug_log.as_deref()) {
        tracing::warn!(
            path = %debug_log.as_ref().map_or_else(|| "<unset>".to_string(), |p| p.display().to_string()),
            error = %err,
            "failed to initialize render debug log"
        );
    }

    let settings = ThemeSettings::new(
        effective.theme.unwrap_or(ThemeMode::Auto).resolve(),
        effective.preview_style.unwrap_or_default(),
    );

    let mut app = App::new(cli.file)
        .with_output(cli.output)
        .with_watch(effective.watch)
        .with_settings(settings)
        .with_scroll_sync(!effective.no_scroll_sync)
        .with_static_palette(effective.static_palette)
        .with_templates(effective.templates)
        .with_export(cli.export)
        .with_stats(cli.stats)
        .with_edit(cli.edit);

    app.run().context("Application error")
}
