use clap::Parser;
use color_eyre::Result;
use ratatui::DefaultTerminal;
use salesdash::cli::PrintView;
use salesdash::{App, AppConfig, AppEvent, Args, Dashboard, OpenOptions, Page};
use std::sync::mpsc::channel;
use std::time::Duration;

fn render(terminal: &mut DefaultTerminal, app: &mut App) -> Result<()> {
    terminal.draw(|frame| frame.render_widget(app, frame.area()))?;
    Ok(())
}

fn run(mut terminal: DefaultTerminal, args: &Args, config: &AppConfig) -> Result<()> {
    let Some(path) = args.path.clone() else {
        return Err(color_eyre::eyre::eyre!("No input file given"));
    };
    let (tx, rx) = channel::<AppEvent>();
    let mut app = App::new_with_config(config);
    if args.debug || config.debug.enabled {
        app.enable_debug();
    }
    if let Some(page) = args.page {
        app.set_page(Page::from(page));
    }
    if let Some(metric) = args.metric {
        app.set_metric(metric.into());
    }

    let opts = OpenOptions::from_args_and_config(args, config);
    render(&mut terminal, &mut app)?;
    tx.send(AppEvent::Open(path, opts))?;

    let poll_interval = Duration::from_millis(config.performance.event_poll_interval_ms);
    loop {
        if crossterm::event::poll(poll_interval)? {
            match crossterm::event::read()? {
                crossterm::event::Event::Key(key) => tx.send(AppEvent::Key(key))?,
                crossterm::event::Event::Resize(cols, rows) => {
                    tx.send(AppEvent::Resize(cols, rows))?
                }
                _ => {}
            }
        }

        let updated = match rx.recv_timeout(Duration::from_millis(0)) {
            Ok(event) => {
                match event {
                    AppEvent::Exit => break,
                    AppEvent::Crash(msg) => {
                        return Err(color_eyre::eyre::eyre!(msg));
                    }
                    event => {
                        if let Some(event) = app.event(&event) {
                            tx.send(event)?;
                        }
                    }
                }
                true
            }
            Err(std::sync::mpsc::RecvTimeoutError::Timeout) => false,
            Err(std::sync::mpsc::RecvTimeoutError::Disconnected) => break,
        };

        if updated {
            render(&mut terminal, &mut app)?;
        }
    }
    Ok(())
}

fn handle_early_exit_flags(args: &Args) -> Result<Option<()>> {
    if args.clear_cache {
        match salesdash::CacheManager::new(salesdash::APP_NAME) {
            Ok(cache) => {
                let removed = cache.clear_all()?;
                println!("Cache cleared successfully ({} file(s) removed)", removed);
            }
            Err(_e) => println!("No cache to clear"),
        }
        return Ok(Some(()));
    }

    if args.generate_config {
        let config = salesdash::ConfigManager::new(salesdash::APP_NAME)?;
        let path = config.write_default_config(args.force)?;
        println!("Configuration written to {}", path.display());
        return Ok(Some(()));
    }

    Ok(None)
}

fn print(args: &Args, config: &AppConfig, view: PrintView) -> Result<()> {
    let Some(path) = args.path.as_deref() else {
        return Err(color_eyre::eyre::eyre!("No input file given"));
    };
    let opts = OpenOptions::from_args_and_config(args, config);
    let dashboard = Dashboard::load(path, &opts, &config.columns)?;
    print!("{}", salesdash::report::print_view(&dashboard, view)?);
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();

    if let Some(()) = handle_early_exit_flags(&args)? {
        return Ok(());
    }

    color_eyre::install()?;
    let config = AppConfig::load(salesdash::APP_NAME)?;

    if args.debug || config.debug.enabled {
        let cache = salesdash::CacheManager::new(salesdash::APP_NAME)?;
        salesdash::logging::init(&cache, &config.debug.log_level)?;
    }

    if let Some(view) = args.print {
        return print(&args, &config, view);
    }

    let terminal = ratatui::init();
    let result = run(terminal, &args, &config);
    ratatui::restore();
    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
    Ok(())
}
