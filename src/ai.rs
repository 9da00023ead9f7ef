//! Automated opponent: one background move computation at a time.
//!
//! `request_if_applicable` spawns the worker, `poll` consumes its single
//! result without blocking, and the commit always happens back here on the
//! control thread. The handoff is a bounded single-slot channel, so the
//! at-most-one-in-flight invariant is structural: a `Some` receiver is the
//! Running state.

use std::sync::Arc;
use std::sync::mpsc::{Receiver, TryRecvError, sync_channel};
use std::thread;

use log::{debug, info, warn};
use rand::seq::IndexedRandom;
use shakmaty::{Chess, Color};

use crate::engine::{Game, MoveReq};

/// The move-selection collaborator, invoked off the control thread with a
/// position snapshot and the legal set. Returning `None` means "no move
/// produced"; the coordinator treats that as a clean miss.
pub trait MovePicker: Send + Sync {
    fn choose(&self, position: &Chess, legal: &[MoveReq]) -> Option<MoveReq>;
}

/// Uniform random stand-in for a real search.
pub struct RandomPicker;

impl MovePicker for RandomPicker {
    fn choose(&self, _position: &Chess, legal: &[MoveReq]) -> Option<MoveReq> {
        legal.choose(&mut rand::rng()).copied()
    }
}

pub struct AiCoordinator {
    picker: Arc<dyn MovePicker>,
    side: Color,
    pending: Option<Receiver<Option<MoveReq>>>,
}

impl AiCoordinator {
    pub fn new(picker: Arc<dyn MovePicker>, side: Color) -> Self {
        Self {
            picker,
            side,
            pending: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.pending.is_some()
    }

    /// Start a worker iff idle, enabled, and it is the automated side's
    /// turn with at least one legal move. The check-and-set runs entirely on
    /// the control thread, so two workers can never start. Returns whether a
    /// worker was spawned.
    pub fn request_if_applicable(&mut self, game: &Game, enabled: bool) -> bool {
        if self.pending.is_some() || !enabled || game.side_to_move() != self.side {
            return false;
        }
        let legal = game.legal_moves();
        if legal.is_empty() {
            return false; // mate or stalemate; nothing to compute
        }

        let snapshot = game.snapshot();
        let picker = Arc::clone(&self.picker);
        let (tx, rx) = sync_channel(1);
        thread::spawn(move || {
            let chosen = picker.choose(&snapshot, &legal);
            // Receiver may already be gone if the session ended.
            let _ = tx.send(chosen);
        });
        self.pending = Some(rx);
        debug!("opponent move computation started");
        true
    }

    /// Non-blocking: consume the worker's result if it has arrived and
    /// commit it here on the control thread. A worker that produced nothing
    /// or died returns the coordinator to idle with the board unchanged.
    pub fn poll(&mut self, game: &mut Game) -> Option<MoveReq> {
        let rx = self.pending.as_ref()?;
        match rx.try_recv() {
            Ok(Some(req)) => {
                self.pending = None;
                if game.commit(req) {
                    info!("opponent played {:?} -> {:?}", req.from, req.to);
                    Some(req)
                } else {
                    warn!("opponent move {req:?} no longer legal; dropped");
                    None
                }
            }
            Ok(None) => {
                self.pending = None;
                debug!("opponent produced no move");
                None
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.pending = None;
                warn!("opponent worker exited without a result");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;
    use std::sync::mpsc::{Sender, channel};
    use std::time::Duration;

    /// Always plays the first legal move.
    struct FirstMove;

    impl MovePicker for FirstMove {
        fn choose(&self, _position: &Chess, legal: &[MoveReq]) -> Option<MoveReq> {
            legal.first().copied()
        }
    }

    /// Never produces a move.
    struct NoMove;

    impl MovePicker for NoMove {
        fn choose(&self, _position: &Chess, _legal: &[MoveReq]) -> Option<MoveReq> {
            None
        }
    }

    /// Blocks until the test releases it, then plays the first legal move.
    struct Gated {
        release: Mutex<Receiver<()>>,
    }

    impl Gated {
        fn new() -> (Arc<Self>, Sender<()>) {
            let (tx, rx) = channel();
            (
                Arc::new(Self {
                    release: Mutex::new(rx),
                }),
                tx,
            )
        }
    }

    impl MovePicker for Gated {
        fn choose(&self, _position: &Chess, legal: &[MoveReq]) -> Option<MoveReq> {
            let _ = self.release.lock().unwrap().recv();
            legal.first().copied()
        }
    }

    fn black_to_move() -> Game {
        let mut game = Game::new();
        assert!(game.commit(MoveReq {
            from: crate::board::Cell::new(6, 4),
            to: crate::board::Cell::new(4, 4),
        }));
        game
    }

    fn poll_until_applied(ai: &mut AiCoordinator, game: &mut Game) -> MoveReq {
        for _ in 0..500 {
            if let Some(req) = ai.poll(game) {
                return req;
            }
            thread::sleep(Duration::from_millis(2));
        }
        panic!("worker result never arrived");
    }

    #[test]
    fn disabled_mode_never_starts_a_worker() {
        let game = black_to_move();
        let mut ai = AiCoordinator::new(Arc::new(FirstMove), Color::Black);
        assert!(!ai.request_if_applicable(&game, false));
        assert!(!ai.is_running());
    }

    #[test]
    fn wrong_turn_never_starts_a_worker() {
        let game = Game::new(); // white to move
        let mut ai = AiCoordinator::new(Arc::new(FirstMove), Color::Black);
        assert!(!ai.request_if_applicable(&game, true));
        assert!(!ai.is_running());
    }

    #[test]
    fn second_request_while_running_is_a_no_op() {
        let game = black_to_move();
        let (picker, release) = Gated::new();
        let mut ai = AiCoordinator::new(picker, Color::Black);

        assert!(ai.request_if_applicable(&game, true));
        assert!(ai.is_running());
        assert!(!ai.request_if_applicable(&game, true));

        drop(release); // unblock the worker so the test can drain it
        let mut game = game;
        poll_until_applied(&mut ai, &mut game);
    }

    #[test]
    fn poll_applies_the_result_exactly_once_and_goes_idle() {
        let mut game = black_to_move();
        let mut ai = AiCoordinator::new(Arc::new(FirstMove), Color::Black);
        assert!(ai.request_if_applicable(&game, true));

        let req = poll_until_applied(&mut ai, &mut game);
        assert!(!ai.is_running());
        assert!(game.white_to_move());
        assert_eq!(game.piece_at(req.to).map(char::is_lowercase), Some(true));

        // slot already consumed
        assert!(ai.poll(&mut game).is_none());
        assert!(!ai.is_running());
    }

    #[test]
    fn empty_slot_keeps_the_coordinator_running() {
        let game = black_to_move();
        let (picker, release) = Gated::new();
        let mut ai = AiCoordinator::new(picker, Color::Black);
        assert!(ai.request_if_applicable(&game, true));

        let mut game = game;
        assert!(ai.poll(&mut game).is_none());
        assert!(ai.is_running());

        drop(release);
        poll_until_applied(&mut ai, &mut game);
    }

    #[test]
    fn picker_failure_returns_to_idle_with_the_board_unchanged() {
        let mut game = black_to_move();
        let before = game.board();
        let mut ai = AiCoordinator::new(Arc::new(NoMove), Color::Black);
        assert!(ai.request_if_applicable(&game, true));

        for _ in 0..500 {
            ai.poll(&mut game);
            if !ai.is_running() {
                break;
            }
            thread::sleep(Duration::from_millis(2));
        }
        assert!(!ai.is_running());
        assert_eq!(game.board(), before);
        assert!(!game.white_to_move());
    }

    #[test]
    fn poll_when_idle_is_a_no_op() {
        let mut game = black_to_move();
        let mut ai = AiCoordinator::new(Arc::new(FirstMove), Color::Black);
        assert!(ai.poll(&mut game).is_none());
    }
}
