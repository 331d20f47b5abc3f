// ============================================================================
// ZartWallet : session wallet et token ZART dans le terminal
// ============================================================================
// Connecte un wallet Web3, affiche les métadonnées et la balance du token
// ZART (Sepolia), et propose les actions buy/sell et faucet (placeholders).
//
// CONCEPTS RUST CLÉS :
// 1. Terminal raw mode : contrôle total du terminal
// 2. Event loop : boucle infinie qui gère événements et rendering
// 3. Async dans sync : le worker possède le runtime tokio, l'UI reste synchrone
// 4. Channels : App n'est jamais partagée, seuls des messages circulent
// ============================================================================

use std::io;
use std::path::PathBuf;
use std::sync::{mpsc, Arc};

use anyhow::{Context, Result};
use crossterm::{
    event::{DisableMouseCapture, EnableMouseCapture},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{debug, error, info, warn};

use zartwallet::api::{Erc20, JsonRpcClient};
use zartwallet::app::App;
use zartwallet::config::Config;
use zartwallet::ui::events::{
    is_buy_sell_event, is_connect_event, is_escape_event, is_faucet_event, is_quit_event,
    is_refresh_event, Event, EventHandler,
};
use zartwallet::ui::render;
use zartwallet::wallet::{RpcWalletProvider, WalletSessionManager};
use zartwallet::worker::{spawn_background_worker, AppCommand, AppResult};

// ============================================================================
// Initialisation du logging
// ============================================================================
// CONCEPT : Logging dans une app TUI
// - Les println! ne fonctionnent pas une fois le TUI lancé
// - On log vers un fichier à la place
// - Rotation quotidienne automatique des logs
// ============================================================================

/// Répertoire des logs
///
/// - Linux : ~/.local/share/zartwallet/logs
/// - macOS : ~/Library/Application Support/zartwallet/logs
/// - Windows : C:\Users\<user>\AppData\Local\zartwallet\logs
/// - Sinon : ./logs
fn log_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("zartwallet").join("logs"))
        .unwrap_or_else(|| PathBuf::from("./logs"))
}

/// Initialise le système de logging vers fichier
///
/// # Utilisation
/// ```bash
/// tail -f ~/.local/share/zartwallet/logs/zartwallet.log.*
/// RUST_LOG=zartwallet=trace cargo run
/// ```
fn init_logging() -> Result<()> {
    use tracing_appender::rolling::{RollingFileAppender, Rotation};
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let log_dir = log_dir();
    std::fs::create_dir_all(&log_dir).context("Échec de la création du répertoire de logs")?;

    let file_appender = RollingFileAppender::new(Rotation::DAILY, log_dir.clone(), "zartwallet.log");

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(file_appender)
                .with_ansi(false)
                .with_target(true)
                .with_thread_ids(true)
                .with_line_number(true),
        )
        .with(
            // Par défaut : debug pour zartwallet, info pour les dépendances
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "zartwallet=debug,info".into()),
        )
        .init();

    info!(?log_dir, "Logging initialisé");
    Ok(())
}

// ============================================================================
// Point d'entrée du programme
// ============================================================================

fn main() -> Result<()> {
    init_logging().unwrap_or_else(|e| {
        eprintln!("⚠️  Warning: Failed to initialize logging: {}", e);
        eprintln!("   Continuing without logging...");
    });

    info!("ZartWallet starting up");

    let config = Config::load().context("Configuration invalide")?;
    let manager = Arc::new(build_manager(&config)?);
    let provider_available = manager.has_provider();

    let mut app = App::new(&config, provider_available);

    // Channels UI <-> worker
    // - command_tx/rx : commandes vers le worker
    // - result_tx/rx : résultats et événements vers l'UI
    let (command_tx, command_rx) = mpsc::channel::<AppCommand>();
    let (result_tx, result_rx) = mpsc::channel::<AppResult>();

    info!("Spawning background worker thread");
    spawn_background_worker(command_rx, result_tx, manager, config.poll_interval())?;

    // Métadonnées + auto-connexion, avant même le premier rendu
    dispatch(&command_tx, app.startup());

    debug!("Setting up terminal");
    let mut terminal = setup_terminal()?;

    let events = EventHandler::new();

    info!("Starting event loop");
    let result = run(&mut terminal, &mut app, &events, &command_tx, &result_rx);

    // Restaure le terminal (même en cas d'erreur)
    debug!("Restoring terminal");
    restore_terminal(&mut terminal)?;

    match &result {
        Ok(_) => info!("Application exited normally"),
        Err(e) => error!(error = ?e, "Application exited with error"),
    }

    result
}

/// Construit le Wallet Session Manager à partir de la configuration
///
/// - Contrat : connexion read-only sur rpc_url
/// - Wallet : seulement si wallet_url est configuré (sinon "aucun wallet")
fn build_manager(config: &Config) -> Result<WalletSessionManager<RpcWalletProvider, Erc20>> {
    let rpc = Arc::new(JsonRpcClient::new(&config.rpc_url).context("Client RPC invalide")?);
    info!(rpc = %rpc.host(), "Read-only RPC configured");

    let contract = Erc20::read_only(rpc, config.contract_address);

    let provider = match &config.wallet_url {
        Some(url) => match RpcWalletProvider::new(url) {
            Ok(provider) => Some(provider),
            Err(e) => {
                warn!(error = %e, "Wallet provider unavailable");
                None
            }
        },
        None => {
            info!("No wallet provider configured");
            None
        }
    };

    Ok(WalletSessionManager::new(
        provider,
        contract,
        config.expected_chain_id,
    ))
}

/// Envoie des commandes au worker
fn dispatch(command_tx: &mpsc::Sender<AppCommand>, commands: Vec<AppCommand>) {
    for command in commands {
        if command_tx.send(command).is_err() {
            warn!("Worker channel closed, command dropped");
        }
    }
}

// ============================================================================
// Event Loop Principal
// ============================================================================
// CONCEPT : Event Loop Pattern
// - À chaque itération :
//   1. Appliquer les résultats du worker (dans l'ordre d'arrivée)
//   2. Dessiner l'interface
//   3. Traiter les événements clavier
// - App appartient à ce thread : pas de Mutex
// ============================================================================

fn run(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
    events: &EventHandler,
    command_tx: &mpsc::Sender<AppCommand>,
    result_rx: &mpsc::Receiver<AppResult>,
) -> Result<()> {
    while app.is_running() {
        // ========================================
        // 1. RÉSULTATS
        // ========================================
        // CONCEPT : try_recv non bloquant, on vide la file à chaque tour
        while let Ok(result) = result_rx.try_recv() {
            let follow_up = app.apply(result);
            dispatch(command_tx, follow_up);
        }

        // ========================================
        // 2. RENDER
        // ========================================
        terminal.draw(|frame| render(frame, app))?;

        // ========================================
        // 3. INPUT
        // ========================================
        let event = events.next()?;
        let commands = handle_event(app, event);
        dispatch(command_tx, commands);
    }

    Ok(())
}

/// Traite un événement clavier
fn handle_event(app: &mut App, event: Event) -> Vec<AppCommand> {
    match event {
        Event::Key(_) if is_quit_event(&event) => {
            if app.is_awaiting_quit_confirmation() {
                info!("User confirmed quit");
                app.quit();
            } else {
                info!("User requested quit (awaiting confirmation)");
                app.request_quit();
            }
            Vec::new()
        }

        Event::Key(_) if is_escape_event(&event) => {
            app.cancel_quit();
            Vec::new()
        }

        Event::Key(_) if is_connect_event(&event) => {
            app.cancel_quit();
            app.toggle_connect()
        }

        Event::Key(_) if is_refresh_event(&event) => {
            app.cancel_quit();
            debug!("User requested balance refresh");
            app.refresh_balance()
        }

        Event::Key(_) if is_buy_sell_event(&event) => {
            app.cancel_quit();
            app.buy_sell();
            Vec::new()
        }

        Event::Key(_) if is_faucet_event(&event) => {
            app.cancel_quit();
            app.faucet();
            Vec::new()
        }

        Event::Key(_) => {
            // Toute autre touche : annule la confirmation si active
            app.cancel_quit();
            Vec::new()
        }

        Event::Tick => Vec::new(),
    }
}

// ============================================================================
// Setup et restauration du terminal
// ============================================================================
// IMPORTANT : Toujours restaurer le terminal avant de quitter !
// ============================================================================

fn setup_terminal() -> Result<Terminal<CrosstermBackend<io::Stdout>>> {
    enable_raw_mode()?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;

    let backend = CrosstermBackend::new(stdout);
    Terminal::new(backend).map_err(|e| e.into())
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<io::Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;
    Ok(())
}
