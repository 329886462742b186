mod command;
mod surface;

use anyhow::{Context, Result, anyhow};
use command::{HELP, Position, ReplCommand};
use crossterm::style::Stylize;
use lesson_highlights_config::{Config, StoreConfig};
use lesson_highlights_engine::highlighting::render_collection;
use lesson_highlights_engine::{
    FileStore, Highlight, HighlightSession, HighlightStore, HtmlSurface, HttpStore, LessonId,
    NavStatus, SyncOutcome, io, lesson_tree,
};
use std::io::{BufRead, Write, stdin, stdout};
use std::path::{Path, PathBuf};
use std::{env, fs, process};
use surface::TerminalSurface;

type Session = HighlightSession<Box<dyn HighlightStore>>;

struct App {
    session: Session,
}

impl App {
    fn new(lesson_path: &Path, lesson: LessonId, store: Box<dyn HighlightStore>) -> Result<Self> {
        let markdown = fs::read_to_string(lesson_path)
            .with_context(|| format!("Failed to read lesson {}", lesson_path.display()))?;
        let mut session = HighlightSession::new(store, lesson, lesson_tree(&markdown));
        match session.load() {
            Ok(count) => log::info!("Loaded {count} highlights for lesson {}", session.lesson()),
            Err(e) => eprintln!("{}", format!("Could not load highlights: {e}").yellow()),
        }
        Ok(Self { session })
    }

    fn show(&self, focused: &[&Highlight]) -> Result<()> {
        let mut surface = TerminalSurface::from_tree(self.session.tree());
        let report = render_collection(&mut surface, self.session.highlights());
        if !report.skipped.is_empty() {
            log::debug!("{} highlights did not fit the lesson text", report.skipped.len());
        }
        let ids: Vec<_> = focused.iter().map(|h| h.id).collect();
        surface.draw(&mut stdout(), &ids)?;
        Ok(())
    }

    fn list(&self) {
        if self.session.highlights().is_empty() {
            println!("No highlights");
            return;
        }
        for (i, h) in self.session.highlights().iter().enumerate() {
            let group = if h.group_id.is_some() { " (grouped)" } else { "" };
            println!(
                "{:>3}. [{}] {}..{} {}{} {}",
                i + 1,
                h.element_id,
                h.start_offset,
                h.end_offset,
                h.color,
                group,
                self.excerpt(h).italic()
            );
        }
    }

    fn excerpt(&self, highlight: &Highlight) -> String {
        let tree = self.session.tree();
        let text = tree
            .paragraph(&highlight.element_id)
            .map(|p| tree.text_content(p))
            .unwrap_or_default();
        let excerpt: String = text
            .chars()
            .skip(highlight.start_offset)
            .take(highlight.range().len())
            .collect();
        format!("\"{excerpt}\"")
    }

    fn nth(&self, n: usize) -> Result<Highlight> {
        self.session
            .highlights()
            .iter()
            .nth(n - 1)
            .cloned()
            .ok_or_else(|| anyhow!("No highlight number {n}, see `list`"))
    }

    fn select(&mut self, from: &Position, to: &Position) -> Result<Option<SyncOutcome>> {
        let tree = self.session.tree();
        let point = |(element_id, offset): &Position| {
            tree.paragraph(element_id)
                .and_then(|p| tree.point_at(p, *offset))
                .ok_or_else(|| anyhow!("No offset {offset} in paragraph {element_id}"))
        };
        let (anchor, focus) = (point(from)?, point(to)?);
        self.session
            .tree_mut()
            .select(anchor.node, anchor.offset, focus.node, focus.offset);
        Ok(self.session.on_selection_end())
    }

    fn export(&self, path: &Path) -> Result<()> {
        let mut surface = HtmlSurface::from_tree(self.session.tree());
        render_collection(&mut surface, self.session.highlights());
        fs::write(path, surface.to_html() + "\n")
            .with_context(|| format!("Failed to write {}", path.display()))?;
        println!("Wrote {}", path.display());
        Ok(())
    }

    fn navigated(&self, status: Option<NavStatus>) -> Result<()> {
        let Some(status) = status else {
            println!("No highlights");
            return Ok(());
        };
        let kind = if status.is_group() { "group" } else { "highlight" };
        println!("{kind} {} of {}", status.current, status.count);
        let members: Vec<&Highlight> = status.entry.highlights.iter().collect();
        self.show(&members)
    }

    /// Run one command. Returns `false` when the user asked to quit.
    fn handle(&mut self, command: ReplCommand) -> Result<bool> {
        let outcome = match command {
            ReplCommand::Quit => return Ok(false),
            ReplCommand::Help => {
                println!("{HELP}");
                None
            }
            ReplCommand::Select { from, to } => {
                let outcome = self.select(&from, &to)?;
                if outcome.is_none() && !self.session.mode().enabled {
                    println!("Highlight mode is off, turn it on with `mode on`");
                }
                outcome
            }
            ReplCommand::Mode(enabled) => {
                let enabled = match enabled {
                    Some(enabled) => {
                        self.session.set_enabled(enabled);
                        enabled
                    }
                    None => self.session.toggle_mode(),
                };
                println!("Highlight mode {}", if enabled { "on" } else { "off" });
                None
            }
            ReplCommand::Color(color) => {
                self.session.set_color(color);
                println!("New highlights will be {color}");
                None
            }
            ReplCommand::List => {
                self.list();
                None
            }
            ReplCommand::Remove(n) => {
                let id = self.nth(n)?.id;
                self.session.remove(id)
            }
            ReplCommand::Recolor(n, color) => {
                let id = self.nth(n)?.id;
                self.session.recolor(id, color)
            }
            ReplCommand::Clear => self.session.clear(),
            ReplCommand::Undo => {
                let outcome = self.session.undo();
                if outcome.is_none() {
                    println!("Nothing to undo");
                }
                outcome
            }
            ReplCommand::Redo => {
                let outcome = self.session.redo();
                if outcome.is_none() {
                    println!("Nothing to redo");
                }
                outcome
            }
            ReplCommand::Next => {
                let status = self.session.next_highlight();
                self.navigated(status)?;
                None
            }
            ReplCommand::Prev => {
                let status = self.session.prev_highlight();
                self.navigated(status)?;
                None
            }
            ReplCommand::Show => {
                self.show(&[])?;
                None
            }
            ReplCommand::Export(path) => {
                self.export(&path)?;
                None
            }
        };

        match outcome {
            Some(SyncOutcome::Saved) => self.show(&[])?,
            Some(SyncOutcome::RolledBack { reason }) => {
                log::warn!("Change rolled back: {reason}");
                self.show(&[])?;
            }
            None => {}
        }
        if let Some(notice) = self.session.take_notice() {
            eprintln!(
                "{}",
                format!("{} ({})", notice.message, notice.at.format("%H:%M:%S")).red()
            );
        }
        Ok(true)
    }
}

fn build_store(config: &Config) -> Result<Box<dyn HighlightStore>> {
    let store: Box<dyn HighlightStore> = match &config.store {
        StoreConfig::File { path } => {
            fs::create_dir_all(path)
                .with_context(|| format!("Failed to create store {}", path.display()))?;
            Box::new(FileStore::new(path.clone(), &config.user_id)?)
        }
        StoreConfig::Http { base_url, .. } => Box::new(HttpStore::new(
            base_url,
            config.store.bearer_token(),
            config.store.timeout(),
        )?),
    };
    Ok(store)
}

fn default_config() -> Config {
    Config {
        user_id: env::var("USER").unwrap_or_else(|_| "local".to_string()),
        default_color: Default::default(),
        store: StoreConfig::File {
            path: Config::default_store_path(),
        },
    }
}

fn main() -> Result<()> {
    env_logger::Builder::new()
        .filter_level(log::LevelFilter::Info)
        .parse_default_env()
        .init();

    // Lesson file from CLI args, lesson id from args or the file name
    let args: Vec<String> = env::args().collect();
    let (lesson_path, lesson_id) = match args.as_slice() {
        [_, path] => {
            let path = PathBuf::from(path);
            let id = path
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            (path, id)
        }
        [_, path, id] => (PathBuf::from(path), id.clone()),
        _ => {
            eprintln!("Usage: {} <lesson.md> [lesson-id]", args[0]);
            process::exit(1);
        }
    };

    let config_path = Config::config_path();
    let config = match Config::load() {
        Ok(Some(config)) => config,
        Ok(None) => {
            log::info!(
                "No config file at {}, storing highlights under {}",
                config_path.display(),
                Config::default_store_path().display()
            );
            default_config()
        }
        Err(e) => {
            eprintln!("Error: Failed to load config file: {e}");
            process::exit(1);
        }
    };

    if let StoreConfig::File { .. } = config.store
        && let Err(e) = io::lesson_document_path(&config.user_id, &lesson_id)
    {
        eprintln!("Error: Lesson id '{lesson_id}' cannot be stored: {e}");
        process::exit(1);
    }

    let store = build_store(&config)?;
    let mut app = App::new(&lesson_path, LessonId::from(lesson_id.as_str()), store)?;
    app.session.set_color(config.default_color);
    app.show(&[])?;
    println!("Type `help` for commands");

    let mut input = stdin().lock();
    let mut line = String::new();
    loop {
        print!("{} ", ">".bold());
        stdout().flush()?;
        line.clear();
        if input.read_line(&mut line)? == 0 {
            return Ok(());
        }
        let command = match ReplCommand::parse(&line) {
            Ok(Some(command)) => command,
            Ok(None) => continue,
            Err(e) => {
                eprintln!("{}", e.to_string().red());
                continue;
            }
        };
        match app.handle(command) {
            Ok(true) => {}
            Ok(false) => return Ok(()),
            Err(e) => eprintln!("{}", format!("{e:#}").red()),
        }
    }
}
