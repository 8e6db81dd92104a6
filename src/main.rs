use anyhow::Context;
use camwall::{
    APP_TITLE_AND_VERSION,
    command::{CommandDispatcher, KEY_BINDINGS, KeyInput},
    config::PlayerConfig,
    deletion::DeletionWorkflow,
    interaction::{Notice, Prompt, UserInteraction},
    media::Camera,
    playback::{
        Decoder, HeadlessDecoder, PlaybackState, SyncPlaybackEngine, format_progress,
        overlay_timestamp,
    },
    session::Session,
    storage::{DirectoryScanner, FsBackend},
};
use env_logger::Env;
use log::{error, info, warn};
use std::{
    io::{self, BufRead, Write},
    path::PathBuf,
    sync::{
        Arc,
        mpsc::{self, TryRecvError},
    },
    thread,
    time::Instant,
};

struct Args {
    root: PathBuf,
    config: Option<PathBuf>,
}

impl Args {
    fn parse() -> anyhow::Result<Self> {
        let mut args = std::env::args_os().skip(1);
        let mut root = None;
        let mut config = None;
        while let Some(arg) = args.next() {
            if arg == "--config" {
                config = Some(PathBuf::from(
                    args.next().context("--config needs a file argument")?,
                ));
            } else if root.is_none() {
                root = Some(PathBuf::from(arg));
            } else {
                anyhow::bail!("unexpected argument \"{}\"", arg.to_string_lossy());
            }
        }
        Ok(Self {
            root: root.context("usage: camwall <root> [--config <file>]")?,
            config,
        })
    }
}

/// Terminal front end: key names and confirmation answers arrive as lines
/// on stdin, read on a separate thread.
struct Console {
    lines: mpsc::Receiver<String>,
}

impl Console {
    fn spawn() -> Self {
        let (sender, lines) = mpsc::channel();
        thread::spawn(move || {
            for line in io::stdin().lock().lines() {
                let Ok(line) = line else {
                    break;
                };
                if sender.send(line).is_err() {
                    break;
                }
            }
        });
        Self { lines }
    }
}

impl UserInteraction for Console {
    fn confirm(&self, prompt: &Prompt) -> bool {
        print!("{prompt} [y/N] ");
        let _ = io::stdout().flush();
        self.lines
            .recv()
            .is_ok_and(|answer| matches!(answer.trim(), "y" | "Y" | "yes"))
    }

    fn notify(&self, notice: &Notice) {
        println!("{notice}");
    }
}

struct MainApp {
    session: Session,
    dispatcher: CommandDispatcher,
    console: Console,
    config: PlayerConfig,
    last_state: Option<(i64, PlaybackState)>,
}

impl MainApp {
    async fn new(args: Args) -> anyhow::Result<Self> {
        info!("starting up!");
        info!("{APP_TITLE_AND_VERSION}");

        let config = match &args.config {
            Some(path) => PlayerConfig::load(path)?,
            None => PlayerConfig::default(),
        };

        let backend = Arc::new(FsBackend::new());
        let entries = DirectoryScanner::new(config.media_extension.clone())
            .scan(&args.root, backend.clone())
            .await
            .with_context(|| format!("failed to scan \"{}\"", args.root.display()))?;
        info!("found {} captures under \"{}\"", entries.len(), args.root.display());

        let fallback = config.fallback_duration_secs;
        let engine = SyncPlaybackEngine::new(
            config.clone(),
            move |camera: Camera| -> Box<dyn Decoder> {
                Box::new(HeadlessDecoder::new(camera, fallback))
            },
        );
        let mut session = Session::new(engine);
        if let Err(err) = session.populate(entries).await {
            warn!("{err}");
        }

        let dispatcher = CommandDispatcher::new(
            config.seek_step_secs,
            DeletionWorkflow::new(backend, config.media_extension.clone()),
        );

        Ok(Self {
            session,
            dispatcher,
            console: Console::spawn(),
            config,
            last_state: None,
        })
    }

    pub async fn run_loop(&mut self) {
        self.print_help();
        let mut interval = tokio::time::interval(self.config.tick_interval());
        loop {
            interval.tick().await;
            self.session.engine.tick(Instant::now());
            for fault in self.session.take_faults() {
                println!("{fault}");
            }

            loop {
                let line = match self.console.lines.try_recv() {
                    Ok(line) => line,
                    Err(TryRecvError::Empty) => break,
                    Err(TryRecvError::Disconnected) => return,
                };
                match line.trim() {
                    "" => {}
                    "q" | "quit" => return,
                    "?" | "help" => self.print_help(),
                    name => self.handle_line(name).await,
                }
                self.print_status(true);
            }
            self.print_status(false);
        }
    }

    async fn handle_line(&mut self, name: &str) {
        let Some(input) = KeyInput::parse(name) else {
            println!("unknown key \"{name}\", type ? for help");
            return;
        };
        match self
            .dispatcher
            .handle_key(&mut self.session, input, &self.console)
            .await
        {
            Ok(Some(_)) => {}
            Ok(None) => println!("\"{name}\" is not bound"),
            Err(err) => {
                error!("{err}");
                println!("error: {err}");
            }
        }
    }

    fn print_help(&self) {
        println!("{APP_TITLE_AND_VERSION}");
        for binding in KEY_BINDINGS {
            println!("  {:<20} {}", binding.keys, binding.description);
        }
        println!("  {:<20} quit", "q");
    }

    /// Prints the transport line when forced or when the entry or the
    /// playback state changed.
    fn print_status(&mut self, force: bool) {
        let Some(current) = self.session.catalog.current() else {
            if self.last_state.take().is_some() || force {
                println!("nothing selected ({} filter)", self.session.catalog.filter());
            }
            return;
        };
        let engine = &self.session.engine;
        let state = (current.time(), engine.state());
        if !force && self.last_state == Some(state) {
            return;
        }
        self.last_state = Some(state);

        let files = current.file_names();
        let shown = engine
            .active_camera()
            .map(|camera| files[camera].to_string())
            .unwrap_or_else(|| String::from("grid"));
        println!(
            "[{}/{}] {} {:?} {} / {} at {} ({}, {}/{})",
            self.session.catalog.selected_index() + 1,
            self.session.catalog.visible_len(),
            current.entry().title,
            engine.state(),
            format_progress(engine.position()),
            format_progress(engine.duration().unwrap_or_default()),
            engine.rate(),
            overlay_timestamp(current.time(), engine.position()),
            current.folder_display(),
            shown,
        );
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(Env::default().default_filter_or("info")).init();

    let args = Args::parse()?;
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_time()
        .build()
        .context("failed to start the tokio runtime")?;

    runtime.block_on(async {
        let mut app = MainApp::new(args).await?;
        app.run_loop().await;
        Ok::<_, anyhow::Error>(())
    })
}
