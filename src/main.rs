mod ai;
mod app;
mod board;
mod cli;
mod config;
mod detector;
mod engine;
mod gesture;
mod ipc;
mod logging;
mod render;
mod selection;

fn main() -> anyhow::Result<()> {
    logging::init();
    cli::run()
}
