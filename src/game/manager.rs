use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::events::ServerEvent;
use super::state::GameState;
use crate::actions::ClientRequest;
use crate::board::{QuizBank, TileGraph};
use crate::dice::DiceRoller;
use crate::effects::{Choice, Effect, EffectContext, EffectOptions, InputKind, Resolution, StatusChange, Wager};
use crate::errors::{GameError, NetworkError, SugorokuError, SugorokuResult};
use crate::hub::{ConnectionHub, SessionHandle};
use crate::player::{Player, PlayerSnapshot, TurnPhase};
use crate::results::{FinishRecord, ResultsStore};
use crate::{PlayerId, TileId};

pub const DEFAULT_INITIAL_MONEY: i64 = 1_000_000;
pub const DEFAULT_GAMBLE_REFERENCE: u8 = 3;

/// Rules that vary per deployment.
#[derive(Debug, Clone)]
pub struct GameSettings {
    pub start_tile: TileId,
    pub initial_money: i64,
    pub gamble_reference: u8,
    pub results_timeout: Duration,
}

impl Default for GameSettings {
    fn default() -> Self {
        Self {
            start_tile: 1,
            initial_money: DEFAULT_INITIAL_MONEY,
            gamble_reference: DEFAULT_GAMBLE_REFERENCE,
            results_timeout: Duration::from_secs(5),
        }
    }
}

/// Where a turn ended up once the engine released the game lock.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TurnOutcome {
    Settled,
    AwaitingInput(InputKind),
    Finished,
}

/// Turn engine: roll, move, resolve tile effects and emit the resulting events.
///
/// Every operation holds the game-wide lock for its whole resolution, event
/// enqueueing included, so one turn's events reach each recipient contiguously.
pub struct GameManager {
    board: Arc<TileGraph>,
    quizzes: Arc<QuizBank>,
    settings: GameSettings,
    state: Mutex<GameState>,
    hub: Arc<ConnectionHub>,
    dice: Arc<dyn DiceRoller>,
    results: Arc<dyn ResultsStore>,
}

impl GameManager {
    pub fn new(
        board: Arc<TileGraph>,
        quizzes: Arc<QuizBank>,
        hub: Arc<ConnectionHub>,
        dice: Arc<dyn DiceRoller>,
        results: Arc<dyn ResultsStore>,
        settings: GameSettings,
    ) -> Self {
        let state = GameState::new(settings.start_tile, settings.initial_money);
        Self {
            board,
            quizzes,
            settings,
            state: Mutex::new(state),
            hub,
            dice,
            results,
        }
    }

    pub fn board(&self) -> &TileGraph {
        &self.board
    }

    pub fn hub(&self) -> &Arc<ConnectionHub> {
        &self.hub
    }

    pub fn settings(&self) -> &GameSettings {
        &self.settings
    }

    pub async fn player(&self, player_id: &str) -> Option<Player> {
        self.state.lock().await.player(player_id).ok().cloned()
    }

    pub async fn player_count(&self) -> usize {
        self.state.lock().await.len()
    }

    /// Adds the player if they are new and registers the session. A player
    /// who reconnects keeps their record and gets any open prompt again.
    pub async fn join(&self, session: SessionHandle) -> PlayerSnapshot {
        let mut state = self.state.lock().await;
        let player_id = session.player_id().to_string();
        let player = state.ensure_player(&player_id);
        let snapshot = player.snapshot();
        let pending = player.pending_input();
        if let Some(old) = self.hub.register(session).await {
            log::info!("♻️ {} resumed, closed old session {}", player_id, old);
        }
        log::info!("🎲 {} joined ({} players)", player_id, state.len());

        if let Some(kind) = pending {
            self.resend_prompt(&state, &player_id, kind).await;
        }
        snapshot
    }

    /// Drops the session and the player, unless a newer session took over.
    pub async fn leave(&self, player_id: &str, session_id: Uuid) -> bool {
        let mut state = self.state.lock().await;
        // An evicted session is gone from the hub too; only a live newer one keeps the player
        if !self.hub.unregister(player_id, session_id).await && self.hub.is_connected(player_id).await {
            return false;
        }
        if state.remove_player(player_id).is_none() {
            return false;
        }
        log::info!("🚪 {} left ({} players)", player_id, state.len());
        true
    }

    pub async fn handle_request(&self, player_id: &str, request: ClientRequest) -> SugorokuResult<()> {
        log::debug!("📥 {} from {}", request.name(), player_id);
        let outcome = match request {
            ClientRequest::RollDice => self.roll_and_move(player_id).await?,
            ClientRequest::GetTiles => {
                self.unicast(
                    player_id,
                    &ServerEvent::Tiles {
                        tiles: self.board.records().to_vec(),
                    },
                )
                .await;
                return Ok(());
            }
            submit => match submit.into_choice() {
                Some(choice) => self.submit_choice(player_id, choice).await?,
                None => return Ok(()),
            },
        };
        log::debug!("🏁 Turn of {} ended as {:?}", player_id, outcome);
        Ok(())
    }

    pub async fn roll_and_move(&self, player_id: &str) -> SugorokuResult<TurnOutcome> {
        let mut state = self.state.lock().await;
        let player = state.player(player_id)?;
        if let Some(pending) = player.pending_input() {
            return Err(GameError::ChoicePending {
                player_id: player_id.to_string(),
                pending: pending.to_string(),
            }
            .into());
        }
        let from = player.position();

        let roll = self.dice.roll();
        log::info!("🎲 {} rolled {}", player_id, roll);
        self.unicast(
            player_id,
            &ServerEvent::DiceResult {
                user_id: player_id.to_string(),
                dice_result: roll,
            },
        )
        .await;

        let to = self.walk(from, roll)?;
        if to != from {
            state.player_mut(player_id)?.move_to(to);
            self.broadcast(&ServerEvent::PlayerMoved {
                user_id: player_id.to_string(),
                new_position: to,
            })
            .await;
        }

        self.settle(&mut state, player_id).await
    }

    pub async fn submit_choice(&self, player_id: &str, choice: Choice) -> SugorokuResult<TurnOutcome> {
        let mut state = self.state.lock().await;
        let player = state.player(player_id)?;
        let pending = player.pending_input().ok_or_else(|| GameError::NoPendingChoice {
            player_id: player_id.to_string(),
        })?;
        if choice.kind() != pending {
            return Err(GameError::mismatch(pending.to_string(), choice.kind().to_string()).into());
        }
        let tile = self.board.tile(player.position())?;

        let resolution = self
            .apply_and_emit(&mut state, player_id, tile.effect(), Some(&choice))
            .await?;
        state.player_mut(player_id)?.set_phase(TurnPhase::Idle);

        match resolution {
            Resolution::Settled => Ok(TurnOutcome::Settled),
            Resolution::Moved { .. } => self.settle(&mut state, player_id).await,
            Resolution::Wager(wager) => self.resolve_wager(&mut state, player_id, wager).await,
        }
    }

    /// Steps along single forward edges, stopping early at forks, branch points and goals.
    fn walk(&self, from: TileId, roll: u8) -> SugorokuResult<TileId> {
        let mut tile = self.board.tile(from)?;
        for _ in 0..roll {
            let Some(next) = self.board.single_next(tile) else {
                break;
            };
            tile = next;
            if tile.is_branch_point() || tile.is_goal() {
                break;
            }
        }
        Ok(tile.id())
    }

    /// Resolves the tile the player stands on, following moves until the turn
    /// settles, waits for input, or finishes.
    async fn settle(&self, state: &mut GameState, player_id: &str) -> SugorokuResult<TurnOutcome> {
        loop {
            let player = state.player(player_id)?;
            let tile = self.board.tile(player.position())?;
            if tile.is_goal() {
                return self.finish(state, player_id).await;
            }

            let active = tile.effect().active_for(player);
            if let Some(kind) = active.input_kind() {
                let options = active.options(player, &self.context())?;
                state
                    .player_mut(player_id)?
                    .set_phase(TurnPhase::AwaitingInput(kind));
                self.unicast(player_id, &prompt_event(tile.id(), options)).await;
                log::debug!("⏸️ {} waits for {} input on tile {}", player_id, kind, tile.id());
                return Ok(TurnOutcome::AwaitingInput(kind));
            }

            match self.apply_and_emit(state, player_id, tile.effect(), None).await? {
                Resolution::Settled => return Ok(TurnOutcome::Settled),
                Resolution::Moved { .. } => continue,
                Resolution::Wager(wager) => return self.resolve_wager(state, player_id, wager).await,
            }
        }
    }

    async fn apply_and_emit(
        &self,
        state: &mut GameState,
        player_id: &str,
        effect: &Effect,
        choice: Option<&Choice>,
    ) -> SugorokuResult<Resolution> {
        let before = state.snapshot();
        let resolution = effect.apply(player_id, state, &self.context(), choice)?;
        self.emit_changes(state, player_id, &before).await;
        Ok(resolution)
    }

    async fn resolve_wager(
        &self,
        state: &mut GameState,
        player_id: &str,
        wager: Wager,
    ) -> SugorokuResult<TurnOutcome> {
        let before = state.snapshot();
        let roll = self.dice.roll();
        let won = wager.wins(roll, self.settings.gamble_reference);
        let player = state.player_mut(player_id)?;
        if won {
            player.profit(wager.bet)?;
        } else {
            player.loss(wager.bet)?;
        }
        let new_money = player.money();
        log::info!(
            "🎰 {} bet {} on {} and rolled {}: {}",
            player_id,
            wager.bet,
            wager.call.as_str(),
            roll,
            if won { "won" } else { "lost" }
        );

        self.unicast(
            player_id,
            &ServerEvent::GambleResult {
                user_id: player_id.to_string(),
                dice_result: roll,
                choice: wager.call.as_str().to_string(),
                won,
                amount: wager.bet,
                new_money,
            },
        )
        .await;
        self.emit_changes(state, player_id, &before).await;
        Ok(TurnOutcome::Settled)
    }

    /// Records the result in the background, tells everyone, then lets the
    /// player go. The session queue closes after the finish event is enqueued.
    async fn finish(&self, state: &mut GameState, player_id: &str) -> SugorokuResult<TurnOutcome> {
        let final_money = state.player(player_id)?.money();
        log::info!("🏆 {} reached the goal with {}", player_id, final_money);

        let results = Arc::clone(&self.results);
        let timeout = self.settings.results_timeout;
        let record = FinishRecord::now(player_id, final_money);
        tokio::spawn(async move {
            let player_id = record.player_id.clone();
            match tokio::time::timeout(timeout, results.record_finish(record)).await {
                Ok(Ok(())) => log::debug!("💾 Recorded result for {}", player_id),
                Ok(Err(e)) => log::error!("❌ Failed to record result for {}: {}", player_id, e),
                Err(_) => log::error!("⏱️ Recording result for {} timed out", player_id),
            }
        });

        self.broadcast(&ServerEvent::PlayerFinished {
            user_id: player_id.to_string(),
            final_money,
        })
        .await;
        state.remove_player(player_id);
        self.hub.unregister_player(player_id).await;
        Ok(TurnOutcome::Finished)
    }

    /// Broadcasts one event per changed attribute: the actor first, then
    /// everyone else by id.
    async fn emit_changes(
        &self,
        state: &GameState,
        actor: &str,
        before: &HashMap<PlayerId, PlayerSnapshot>,
    ) {
        let mut order = vec![actor.to_string()];
        order.extend(state.other_ids(actor));

        for player_id in order {
            let (Some(old), Ok(player)) = (before.get(&player_id), state.player(&player_id)) else {
                continue;
            };
            for event in diff_events(&player_id, old, &player.snapshot()) {
                self.broadcast(&event).await;
            }
        }
    }

    async fn resend_prompt(&self, state: &GameState, player_id: &str, kind: InputKind) {
        let prompt = state.player(player_id).map_err(SugorokuError::from).and_then(|player| {
            let tile = self.board.tile(player.position())?;
            let options = tile.effect().options(player, &self.context())?;
            Ok(prompt_event(tile.id(), options))
        });
        match prompt {
            Ok(event) => {
                log::debug!("🔁 Re-sent {} prompt to {}", kind, player_id);
                self.unicast(player_id, &event).await;
            }
            Err(e) => log::warn!("⚠️ Could not rebuild {} prompt for {}: {}", kind, player_id, e),
        }
    }

    fn context(&self) -> EffectContext<'_> {
        EffectContext {
            board: &self.board,
            quizzes: &self.quizzes,
            gamble_reference: self.settings.gamble_reference,
        }
    }

    async fn unicast<T: Serialize>(&self, player_id: &str, message: &T) {
        match self.hub.send_to_player(player_id, message).await {
            Ok(()) => {}
            Err(NetworkError::RecipientNotFound { .. }) => {
                log::debug!("📭 {} has no live session, message dropped", player_id)
            }
            Err(e) => log::warn!("⚠️ Unicast to {} failed: {}", player_id, e),
        }
    }

    async fn broadcast<T: Serialize>(&self, message: &T) {
        if let Err(e) = self.hub.broadcast(message).await {
            log::error!("❌ Broadcast failed: {}", e);
        }
    }
}

fn prompt_event(tile_id: TileId, options: EffectOptions) -> ServerEvent {
    match options {
        EffectOptions::Branch(options) => ServerEvent::BranchChoiceRequired { tile_id, options },
        EffectOptions::Quiz(quiz_data) => ServerEvent::QuizRequired { tile_id, quiz_data },
        EffectOptions::Gamble { reference_value } => ServerEvent::GambleRequired {
            tile_id,
            reference_value,
        },
    }
}

fn diff_events(player_id: &str, old: &PlayerSnapshot, new: &PlayerSnapshot) -> Vec<ServerEvent> {
    let user_id = || player_id.to_string();
    let mut events = Vec::new();
    if old.position != new.position {
        events.push(ServerEvent::PlayerMoved {
            user_id: user_id(),
            new_position: new.position,
        });
    }
    if old.money != new.money {
        events.push(ServerEvent::MoneyChanged {
            user_id: user_id(),
            new_money: new.money,
        });
    }
    let mut status = Vec::new();
    if old.is_married != new.is_married {
        status.push(StatusChange::Married(new.is_married));
    }
    if old.children != new.children {
        status.push(StatusChange::Children(new.children));
    }
    if old.job != new.job {
        status.push(StatusChange::Job(new.job.clone()));
    }
    events.extend(status.into_iter().map(|change| ServerEvent::PlayerStatusChanged {
        user_id: user_id(),
        status: change.key(),
        value: change.value(),
    }));
    events
}
