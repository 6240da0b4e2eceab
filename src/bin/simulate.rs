use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use rand::{Rng, SeedableRng};
use rand_xorshift::XorShiftRng;
use serde_json::Value;
use tokio::sync::mpsc;

use sugoroku::board::{load_board, QuizBank};
use sugoroku::dice::SeededDice;
use sugoroku::effects::{Choice, InputKind, WagerRequest};
use sugoroku::hub::{ConnectionHub, Outbound, SessionHandle};
use sugoroku::results::InMemoryResultsStore;
use sugoroku::{GameManager, GameSettings, SugorokuResult, TurnOutcome};

/// Plays bot-only games against the real turn engine
#[derive(Debug, Parser)]
#[command(name = "simulate", about)]
struct Args {
    /// Number of games to play
    #[arg(short = 'n', long, default_value_t = 1)]
    games: u32,

    /// Bots per game
    #[arg(short, long, default_value_t = 4)]
    bots: usize,

    #[arg(long, default_value = "tiles.json")]
    board: PathBuf,

    #[arg(long, default_value = "quizzes.json")]
    quizzes: PathBuf,

    #[arg(long, default_value_t = 1)]
    start_tile: u32,

    /// Seed for dice and bot decisions; game `i` uses `seed + i`
    #[arg(short, long, default_value_t = 42)]
    seed: u64,

    /// Rounds before a game is abandoned
    #[arg(long, default_value_t = 500)]
    max_rounds: u32,

    #[arg(short, long)]
    verbose: bool,
}

struct Bot {
    id: String,
    outbound: mpsc::Receiver<Outbound>,
}

impl Bot {
    /// Broadcasts pile up between turns; drop them so the queue never fills.
    fn discard_pending(&mut self) {
        while self.outbound.try_recv().is_ok() {}
    }

    /// Latest prompt payload of the given type still sitting in the queue.
    fn latest_prompt(&mut self, event_type: &str) -> Option<Value> {
        let mut prompt = None;
        while let Ok(text) = self.outbound.try_recv() {
            let Ok(event) = serde_json::from_str::<Value>(&text) else {
                continue;
            };
            if event["type"] == event_type {
                prompt = Some(event["payload"].clone());
            }
        }
        prompt
    }

    async fn decide(
        &mut self,
        kind: InputKind,
        manager: &GameManager,
        rng: &mut XorShiftRng,
    ) -> Option<Choice> {
        match kind {
            InputKind::Branch => {
                let payload = self.latest_prompt("BRANCH_CHOICE_REQUIRED")?;
                let first = payload["options"].as_array()?.first()?.as_u64()?;
                Some(Choice::Branch(u32::try_from(first).ok()?))
            }
            InputKind::Quiz => {
                let payload = self.latest_prompt("QUIZ_REQUIRED")?;
                let count = payload["quizData"]["options"].as_array()?.len();
                Some(Choice::Quiz(rng.gen_range(0..count.max(1))))
            }
            InputKind::Gamble => {
                self.latest_prompt("GAMBLE_REQUIRED")?;
                let money = manager.player(&self.id).await?.money();
                Some(Choice::Gamble(WagerRequest {
                    bet: (money / 10).max(1),
                    choice: "High".to_string(),
                }))
            }
        }
    }
}

struct GameReport {
    finish_order: Vec<(String, i64)>,
    rounds: u32,
}

#[tokio::main]
async fn main() {
    env_logger::init();
    let args = Args::parse();

    let board = match load_board(&args.board, args.start_tile) {
        Ok(board) => Arc::new(board),
        Err(e) => {
            eprintln!("❌ Failed to load board: {}", e);
            std::process::exit(1);
        }
    };
    let quizzes = match QuizBank::load(&args.quizzes) {
        Ok(quizzes) => Arc::new(quizzes),
        Err(e) => {
            eprintln!("❌ Failed to load quizzes: {}", e);
            std::process::exit(1);
        }
    };

    println!("🎲 Sugoroku Simulation");
    println!("======================");
    println!("Configuration:");
    println!("  - Board: {} ({} tiles)", args.board.display(), board.len());
    println!("  - Bots: {}", args.bots);
    println!("  - Number of games: {}", args.games);
    println!("  - Seed: {}", args.seed);

    let mut completed = 0;
    let mut total_rounds = 0;
    for game_num in 0..args.games {
        let seed = args.seed.wrapping_add(u64::from(game_num));
        match play_game(&args, Arc::clone(&board), Arc::clone(&quizzes), seed).await {
            Ok(report) => {
                println!("\n🎯 Game {} of {}", game_num + 1, args.games);
                for (place, (bot, money)) in report.finish_order.iter().enumerate() {
                    println!("  {}. {} with {}", place + 1, bot, money);
                }
                if report.finish_order.len() == args.bots {
                    completed += 1;
                    total_rounds += report.rounds;
                    println!("  ✅ All bots finished in {} rounds", report.rounds);
                } else {
                    println!("  ⏱️ Stopped after {} rounds", report.rounds);
                }
            }
            Err(e) => println!("\n❌ Game {} failed: {}", game_num + 1, e),
        }
    }

    println!("\n📊 Completed games: {}/{}", completed, args.games);
    if completed > 0 {
        println!(
            "Average rounds per game: {:.1}",
            f64::from(total_rounds) / f64::from(completed)
        );
    }
}

async fn play_game(
    args: &Args,
    board: Arc<sugoroku::TileGraph>,
    quizzes: Arc<QuizBank>,
    seed: u64,
) -> SugorokuResult<GameReport> {
    let settings = GameSettings {
        start_tile: args.start_tile,
        ..GameSettings::default()
    };
    let manager = GameManager::new(
        board,
        quizzes,
        Arc::new(ConnectionHub::new()),
        Arc::new(SeededDice::new(seed)),
        Arc::new(InMemoryResultsStore::new()),
        settings,
    );
    let mut rng = XorShiftRng::seed_from_u64(seed);

    let mut bots = Vec::with_capacity(args.bots);
    for i in 0..args.bots {
        let (session, outbound) = SessionHandle::new(format!("bot-{}", i + 1), 1024);
        let id = session.player_id().to_string();
        manager.join(session).await;
        bots.push(Bot { id, outbound });
    }

    let mut finish_order = Vec::new();
    let mut rounds = 0;
    while !bots.is_empty() && rounds < args.max_rounds {
        rounds += 1;
        let mut still_playing = Vec::with_capacity(bots.len());
        for mut bot in bots {
            bot.discard_pending();
            let money_before_finish = manager.player(&bot.id).await.map(|p| p.money());
            let mut outcome = manager.roll_and_move(&bot.id).await?;
            while let TurnOutcome::AwaitingInput(kind) = outcome {
                let Some(choice) = bot.decide(kind, &manager, &mut rng).await else {
                    break;
                };
                outcome = manager.submit_choice(&bot.id, choice).await?;
            }

            if outcome == TurnOutcome::Finished {
                let final_money = final_money(&mut bot).or(money_before_finish).unwrap_or_default();
                if args.verbose {
                    println!("  🏆 {} finished in round {}", bot.id, rounds);
                }
                finish_order.push((bot.id, final_money));
            } else {
                still_playing.push(bot);
            }
        }
        bots = still_playing;
    }

    Ok(GameReport {
        finish_order,
        rounds,
    })
}

/// The finish broadcast is the last thing a finished bot's queue holds.
fn final_money(bot: &mut Bot) -> Option<i64> {
    let payload = bot.latest_prompt("PLAYER_FINISHED")?;
    payload["finalMoney"].as_i64()
}
