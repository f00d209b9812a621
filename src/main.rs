// ============================================================================
// CoinWatch - Watchlist crypto avec graphiques de prix
// ============================================================================
// Programme TUI : watchlist de coins, sparklines et graphique détaillé
// Les historiques viennent de CoinGecko via PriceDataService (cache, file
// de requêtes espacées, rate limit, repli sur cache ou données simulées)
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle qui gère événements et rendering
// 3. Async dans sync : Runtime tokio + guard enter() pour spawner depuis la boucle
// 4. Cleanup : restauration du terminal même en cas d'erreur
// ============================================================================

use std::io;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info};

use coinwatch::api::CoinGeckoClient;
use coinwatch::app::App;
use coinwatch::config::ServiceConfig;
use coinwatch::models::TimeRange;
use coinwatch::service::PriceDataService;
use coinwatch::ui::events::{
    is_down_event, is_next_range_event, is_previous_range_event, is_quit_event, is_retry_event,
    is_theme_event, is_up_event, Event, EventHandler,
};
use coinwatch::ui::render;

// ============================================================================
// Arguments de ligne de commande
// ============================================================================

#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Identifiants CoinGecko, séparés par des virgules
    #[arg(
        long,
        value_delimiter = ',',
        default_value = "bitcoin,ethereum,solana,ripple,dogecoin"
    )]
    coins: Vec<String>,

    /// Fenêtre de temps initiale (1h, 3h, 4h, 12h, 1d, 1w, 1m, 3m, 6m, 1y, all)
    #[arg(long, default_value_t = TimeRange::D1)]
    range: TimeRange,

    /// Démarre en thème sombre
    #[arg(long, default_value_t = false)]
    dark: bool,
}

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place, avec rotation quotidienne
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/coinwatch/logs
/// - macOS : ~/Library/Application Support/coinwatch/logs
/// - Windows : C:\Users\<user>\AppData\Local\coinwatch\logs
/// - Sinon : ./logs
fn log_dir() -> std::path::PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("coinwatch").join("logs"))
        .unwrap_or_else(|| std::path::PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/coinwatch/logs/coinwatch.log.*
/// RUST_LOG=coinwatch=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "coinwatch.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false) // Pas de codes couleur dans le fichier
                .with_target(true)
                .with_thread_ids(true) // Les fetchs tournent sur les workers tokio
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour coinwatch, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "coinwatch=debug,info".into()),
        )
        .try_init()
        .context("Échec de l'initialisation du subscriber tracing")?;

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging().unwrap_or_else(|e| {
        eprintln!("Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!(coins = ?cli.coins, range = %cli.range, dark = cli.dark, "CoinWatch starting up");

    // CONCEPT RUST : Runtime explicite
    // - main() reste synchrone (boucle TUI bloquante)
    // - enter() rend le runtime "courant" : tokio::spawn fonctionne depuis la
    //   boucle, les tâches tournent sur les workers du runtime
    let runtime = tokio::runtime::Runtime::new().context("Échec de la création du runtime tokio")?;
    let _guard = runtime.enter();

    let config = ServiceConfig::from_env();
    info!(api_url = %config.api_url, has_api_key = config.api_key.is_some(), "Service configuration loaded");
    let client = CoinGeckoClient::new(&config)?;
    let service = PriceDataService::new(Arc::new(client), config);

    let coins: Vec<String> = cli
        .coins
        .iter()
        .map(|c| c.trim().to_lowercase())
        .filter(|c| !c.is_empty())
        .collect();
    let mut app = App::new(&coins, cli.range, cli.dark);

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;
    let size = terminal.size()?;
    app.on_resize(size.width, size.height);

    let events = EventHandler::default();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &service, &events);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!(network_calls = service.network_calls(), "Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

// ============================================================================
// Event loop
// ============================================================================
// 1. SYNC   : abonne les coins qui n'ont pas de demande pour la fenêtre courante
// 2. RENDER : dessine l'interface depuis les derniers snapshots
// 3. INPUT  : attend un événement (au plus un tick)
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    service: &PriceDataService,
    events: &EventHandler,
) -> Result<()> {
    while app.is_running() {
        app.sync_subscriptions(service);

        let api = service.rate_limit();
        terminal.draw(|frame| render(frame, app, &api))?;

        let event = events.next()?;
        handle_event(app, event);
    }

    Ok(())
}

/// Traite un événement et met à jour l'état de l'application
///
/// CONCEPT RUST : Pattern matching avec guards
fn handle_event(app: &mut App, event: Event) {
    match event {
        Event::Key(_) if is_quit_event(&event) => {
            // Two-step : première pression = confirmation, deuxième = quit
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
        }

        Event::Key(_) if is_up_event(&event) => {
            app.cancel_quit();
            app.navigate_up();
        }
        Event::Key(_) if is_down_event(&event) => {
            app.cancel_quit();
            app.navigate_down();
        }

        Event::Key(_) if is_next_range_event(&event) => {
            app.cancel_quit();
            app.next_range();
        }
        Event::Key(_) if is_previous_range_event(&event) => {
            app.cancel_quit();
            app.previous_range();
        }

        Event::Key(_) if is_theme_event(&event) => {
            app.cancel_quit();
            app.toggle_theme();
            debug!(dark_mode = app.dark_mode, "Theme toggled");
        }

        Event::Key(_) if is_retry_event(&event) => {
            app.cancel_quit();
            if !app.retry_selected() {
                debug!("Nothing to retry");
            }
        }

        Event::Resize(cols, rows) => {
            // Le prochain draw utilise la nouvelle taille
            app.on_resize(cols, rows);
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation de quit
            app.cancel_quit();
        }

        Event::Tick => {}
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================

/// Configure le terminal en mode TUI (raw mode + alternate screen)
fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode().context("Échec de l'activation du raw mode")?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).context("Échec de la création du terminal")
}

/// Restaure le terminal à son état normal
fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}
