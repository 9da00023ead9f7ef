use anyhow::{Result, anyhow};
use pico_args::Arguments;
use std::env;

use crate::app;
use crate::config::ConfigState;
use crate::ipc;

pub fn run() -> Result<()> {
    let mut pargs = Arguments::from_env();

    // No args -> general help
    if env::args().len() == 1 {
        print_help();
        return Ok(());
    }

    // Flags-based help (-h/--help)
    if pargs.contains("-h") || pargs.contains("--help") {
        print_help();
        return Ok(());
    }

    // First free arg is the subcommand
    let subcmd: Option<String> = pargs.free_from_str().ok();

    match subcmd.as_deref() {
        Some("help") => {
            let topic: Option<String> = pargs.free_from_str().ok();
            if let Some(t) = topic {
                print_subcmd_help(&t);
            } else {
                print_help();
            }
            Ok(())
        }

        Some("play") => {
            let with_ai = pargs.contains("--ai");
            let scenes = pargs.contains("--scenes");
            let profile: Option<String> = pargs.opt_value_from_str("--profile")?;

            let mut cfg = ConfigState::load_or_install_default()?;
            if let Some(name) = profile {
                cfg.set_active(&name)?;
            }
            app::run_session(&cfg.profile, with_ai, scenes)
        }

        Some("stop") => {
            let r = ipc::client_request(serde_json::json!({"op":"stop"}))?;
            print_response(&r);
            Ok(())
        }

        Some("status") => {
            let r = ipc::client_request(serde_json::json!({"op":"status"}))?;
            print_response(&r);
            Ok(())
        }

        Some("toggle-ai") => {
            let r = ipc::client_request(serde_json::json!({"op":"toggle-ai"}))?;
            print_response(&r);
            Ok(())
        }

        Some("use") => {
            let name: String = pargs
                .free_from_str()
                .map_err(|_| anyhow!("usage: pinchess use <profile_name>"))?;
            let mut cfg = ConfigState::load_or_install_default()?;
            cfg.set_active(&name)?;
            println!("active profile: {}", cfg.active_name);
            Ok(())
        }

        Some("list") => {
            let cfg = ConfigState::load_or_install_default()?;
            for name in cfg.list_profiles() {
                if name == cfg.active_name {
                    println!("* {name}");
                } else {
                    println!("  {name}");
                }
            }
            Ok(())
        }

        Some("doctor") => {
            let cfg = ConfigState::load_or_install_default()?;
            print_response(&cfg.doctor_report());
            Ok(())
        }

        Some(other) => {
            eprintln!("unknown subcommand: {other}\n");
            print_help();
            Ok(())
        }

        None => {
            print_help();
            Ok(())
        }
    }
}

fn print_help() {
    println!(
        r#"pinchess — pinch-gesture chess

USAGE:
  pinchess help [command]             Show general or command-specific help
  pinchess play [--ai] [--profile <name>] [--scenes]
                                      Run an interactive session
  pinchess stop                       Stop the running session
  pinchess status                     Show session state
  pinchess toggle-ai                  Toggle the automated opponent
  pinchess use <name>                 Switch active profile
  pinchess list                       List profiles
  pinchess doctor                     Diagnose detector/profile setup

TIPS:
  - Profiles: ~/.config/pinchess/profiles
  - Active profile pointer: ~/.config/pinchess/active
  - The detector helper needs: pip install mediapipe opencv-python
"#
    );
}

fn print_subcmd_help(cmd: &str) {
    match cmd {
        "play" => println!(
            "usage: pinchess play [--ai] [--profile <name>] [--scenes]\nRuns a session in the foreground. --ai starts with the opponent on,\n--scenes streams one scene JSON line per frame to stdout."
        ),
        "stop" => println!("usage: pinchess stop\nStops the running session over its control socket."),
        "status" => println!(
            "usage: pinchess status\nShows opponent state, side to move, check/mate flags, iteration count."
        ),
        "toggle-ai" => println!(
            "usage: pinchess toggle-ai\nFlips the automated opponent on or off in the running session."
        ),
        "use" => {
            println!("usage: pinchess use <name>\nSwitches the active profile to <name>.")
        }
        "list" => {
            println!("usage: pinchess list\nLists available profiles; marks active with '*'.")
        }
        "doctor" => println!(
            "usage: pinchess doctor\nChecks profile and detector-script setup."
        ),
        _ => {
            eprintln!("unknown command: {cmd}\n");
            print_help();
        }
    }
}

fn print_response(v: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(v).unwrap_or_default());
}
