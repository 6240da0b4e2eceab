use std::sync::Arc;

use clap::Parser;
use tokio::net::TcpListener;

use sugoroku::application::{router, AppState};
use sugoroku::board::{load_board, QuizBank};
use sugoroku::config::ServerConfig;
use sugoroku::dice::RandomDice;
use sugoroku::hub::ConnectionHub;
use sugoroku::identity::DevIdentityVerifier;
use sugoroku::results::{InMemoryResultsStore, JsonLinesResultsStore, ResultsStore};
use sugoroku::GameManager;

#[tokio::main]
async fn main() {
    // Initialize logger
    if std::env::var("RUST_LOG").is_err() {
        std::env::set_var("RUST_LOG", "info");
    }
    env_logger::init();

    let config = ServerConfig::parse();
    if let Err(e) = config.validate() {
        log::error!("❌ {}", e);
        std::process::exit(1);
    }

    let board = match load_board(&config.board, config.start_tile) {
        Ok(board) => board,
        Err(e) => {
            log::error!("❌ Failed to load board {}: {}", config.board.display(), e);
            std::process::exit(1);
        }
    };
    let quizzes = match QuizBank::load(&config.quizzes) {
        Ok(quizzes) => quizzes,
        Err(e) => {
            log::error!("❌ Failed to load quizzes {}: {}", config.quizzes.display(), e);
            std::process::exit(1);
        }
    };
    log::info!(
        "🗺️ Loaded {} tiles and {} quizzes",
        board.len(),
        quizzes.len()
    );

    let results: Arc<dyn ResultsStore> = match &config.results {
        Some(path) => {
            log::info!("📝 Recording results to {}", path.display());
            Arc::new(JsonLinesResultsStore::new(path))
        }
        None => Arc::new(InMemoryResultsStore::new()),
    };

    let manager = GameManager::new(
        Arc::new(board),
        Arc::new(quizzes),
        Arc::new(ConnectionHub::new()),
        Arc::new(RandomDice),
        results,
        config.game_settings(),
    );
    let state = Arc::new(AppState {
        manager: Arc::new(manager),
        verifier: Arc::new(DevIdentityVerifier),
        session: config.session_settings(),
    });

    let listener = match TcpListener::bind(config.bind).await {
        Ok(listener) => listener,
        Err(e) => {
            log::error!("❌ Could not bind {}: {}", config.bind, e);
            std::process::exit(1);
        }
    };
    log::info!("🚀 Starting sugoroku server on {}", config.bind);

    if let Err(e) = axum::serve(listener, router(state)).await {
        log::error!("❌ Server stopped: {}", e);
        std::process::exit(1);
    }
}
