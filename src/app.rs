//! The interactive session: detector frames in, scenes out.
//!
//! Single control thread. Per iteration: read a frame, classify the pinch,
//! synthesize edge events, drive selection, service the opponent, render,
//! then apply control-socket commands and pending signals. Pacing caps the
//! loop at the configured rate; the blocking frame read paces it below that.

use std::io;
use std::path::Path;
use std::sync::{Arc, Mutex};
use std::sync::mpsc::TryRecvError;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use log::{info, warn};
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook::iterator::Signals;

use crate::ai::{AiCoordinator, RandomPicker};
use crate::board::{self, PixelPoint};
use crate::config::Profile;
use crate::detector::{DetectorFrame, HandDetector};
use crate::engine::Game;
use crate::gesture::{PinchEvent, PinchSensor};
use crate::ipc::{Command, CommandListener, SessionStatus};
use crate::render::{self, JsonlSink, NullSink, RenderSink};
use crate::selection::SelectionController;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PinchPhase {
    Start,
    Move,
    End,
}

/// Turns per-frame pinch samples into Start/Move/End edges. A lost hand
/// while pinching counts as a release.
#[derive(Debug, Default)]
pub struct PinchEdges {
    pinching: bool,
}

impl PinchEdges {
    pub fn advance(&mut self, ev: &PinchEvent) -> Option<PinchPhase> {
        let was = self.pinching;
        self.pinching = ev.pinching;
        match (was, ev.pinching) {
            (false, true) => Some(PinchPhase::Start),
            (true, true) => Some(PinchPhase::Move),
            (true, false) => Some(PinchPhase::End),
            (false, false) => None,
        }
    }
}

pub fn run_session(profile: &Profile, start_with_ai: bool, scenes_to_stdout: bool) -> Result<()> {
    let mut signals = Signals::new([SIGINT, SIGTERM])?;

    let mut detector = HandDetector::spawn(&profile.detector.command, Path::new(&profile.detector.script))
        .context("failed to start the hand detector")?;

    let square_size = profile.board.square_size;
    let board_size = profile.board_size();
    let sensor = PinchSensor::new(profile.gesture.pinch_threshold);
    let mut edges = PinchEdges::default();
    let mut selection = SelectionController::new(square_size);
    let mut game = Game::new();
    let mut ai = AiCoordinator::new(Arc::new(RandomPicker), profile.ai_color());
    let mut ai_enabled = start_with_ai || profile.ai.enabled;

    let status = Arc::new(Mutex::new(SessionStatus::default()));
    let (_listener, commands) = CommandListener::spawn(Arc::clone(&status))?;

    let mut sink: Box<dyn RenderSink> = if scenes_to_stdout {
        Box::new(JsonlSink::new(io::stdout().lock()))
    } else {
        Box::new(NullSink)
    };

    let tick = Duration::from_secs(1) / profile.pacing.target_hz;
    let mut iterations: u64 = 0;
    info!(
        "session started ({}x{} board, opponent {})",
        board_size,
        board_size,
        if ai_enabled { "on" } else { "off" }
    );

    'session: loop {
        let started = Instant::now();

        let frame = detector
            .next_frame()
            .context("detector stream failed")?;

        let pinch = sensor.sample(&frame);
        let point = board_point(&pinch, &frame, board_size);

        match edges.advance(&pinch) {
            Some(PinchPhase::Start) => {
                if let Some(p) = point {
                    selection.on_pinch_start(p, &game);
                }
            }
            Some(PinchPhase::Move) => {
                if let Some(p) = point {
                    selection.on_pinch_move(p);
                }
            }
            Some(PinchPhase::End) => selection.on_pinch_end(point, &mut game),
            None => {}
        }

        ai.request_if_applicable(&game, ai_enabled);
        ai.poll(&mut game);

        let scene = render::compose(&game, &selection, point, square_size, ai_enabled, ai.is_running());
        if let Err(e) = sink.present(&scene) {
            warn!("render sink failed: {e}");
        }

        loop {
            match commands.try_recv() {
                Ok(Command::ToggleAi) => {
                    ai_enabled = !ai_enabled;
                    info!("opponent {}", if ai_enabled { "enabled" } else { "disabled" });
                }
                Ok(Command::Stop) => {
                    info!("stop requested over control socket");
                    break 'session;
                }
                Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => break,
            }
        }

        if signals.pending().next().is_some() {
            info!("signal received, ending session");
            break;
        }

        iterations += 1;
        {
            let mut snap = status.lock().unwrap();
            *snap = SessionStatus {
                ai_enabled,
                ai_thinking: ai.is_running(),
                white_to_move: game.white_to_move(),
                in_check: game.in_check(),
                checkmate: game.is_checkmate(),
                stalemate: game.is_stalemate(),
                iterations,
            };
        }

        let elapsed = started.elapsed();
        if elapsed < tick {
            std::thread::sleep(tick - elapsed);
        }
    }

    info!("session ended after {iterations} iterations");
    Ok(())
}

/// Project the pinch midpoint from camera space into board space. Gone when
/// no hand is tracked or the frame carries no dimensions.
fn board_point(pinch: &PinchEvent, frame: &DetectorFrame, board_size: f32) -> Option<PixelPoint> {
    if frame.width <= 0.0 || frame.height <= 0.0 {
        return None;
    }
    pinch.point.map(|p| {
        board::to_board_pixel(p, (frame.width, frame.height), (board_size, board_size))
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(pinching: bool) -> PinchEvent {
        PinchEvent {
            pinching,
            point: pinching.then(|| PixelPoint::new(1.0, 1.0)),
        }
    }

    #[test]
    fn edge_sequence_start_move_end() {
        let mut edges = PinchEdges::default();
        assert_eq!(edges.advance(&sample(false)), None);
        assert_eq!(edges.advance(&sample(true)), Some(PinchPhase::Start));
        assert_eq!(edges.advance(&sample(true)), Some(PinchPhase::Move));
        assert_eq!(edges.advance(&sample(true)), Some(PinchPhase::Move));
        assert_eq!(edges.advance(&sample(false)), Some(PinchPhase::End));
        assert_eq!(edges.advance(&sample(false)), None);
    }

    #[test]
    fn lost_hand_while_pinching_is_a_release() {
        let mut edges = PinchEdges::default();
        edges.advance(&sample(true));
        // hand gone: not pinching, no point
        let ev = PinchEvent::default();
        assert_eq!(edges.advance(&ev), Some(PinchPhase::End));
    }

    #[test]
    fn repinch_after_release_starts_again() {
        let mut edges = PinchEdges::default();
        edges.advance(&sample(true));
        edges.advance(&sample(false));
        assert_eq!(edges.advance(&sample(true)), Some(PinchPhase::Start));
    }

    #[test]
    fn board_point_requires_frame_dimensions() {
        let pinch = PinchEvent {
            pinching: true,
            point: Some(PixelPoint::new(640.0, 360.0)),
        };
        assert_eq!(board_point(&pinch, &DetectorFrame::empty(), 1600.0), None);

        let frame = DetectorFrame {
            width: 1280.0,
            height: 720.0,
            hands: Vec::new(),
            error: None,
        };
        assert_eq!(
            board_point(&pinch, &frame, 1600.0),
            Some(PixelPoint::new(800.0, 800.0))
        );
    }
}
