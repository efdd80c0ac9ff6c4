use pingcamera::permissions::check_permission_detailed;
use pingcamera::platform::system_controller;
use pingcamera::{ControllerState, PingCameraConfig};
use std::env;
use std::time::Duration;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    pingcamera::init_logging();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        eprintln!("Usage: pingcamera-cli <status|preview> [args]");
        std::process::exit(1);
    }

    let command = &args[1];
    match command.as_str() {
        "status" => cmd_status(&args),
        "preview" => cmd_preview(&args).await,
        _ => {
            eprintln!("Unknown command: {}", command);
            std::process::exit(1);
        }
    }
}

fn cmd_status(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let info = check_permission_detailed();
    if args.contains(&"--json".to_string()) {
        println!("{}", serde_json::to_string(&info)?);
    } else {
        println!("{}: {}", info.status, info.message);
    }
    Ok(())
}

async fn cmd_preview(args: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    // Parse args: preview [--seconds <n>] [--json]
    let mut seconds: u64 = 10;
    let mut json = false;

    let mut i = 2;
    while i < args.len() {
        match args[i].as_str() {
            "--seconds" => {
                i += 1;
                seconds = args.get(i).ok_or("--seconds needs a value")?.parse()?;
            }
            "--json" => json = true,
            other => return Err(format!("Unexpected argument: {}", other).into()),
        }
        i += 1;
    }

    let config = PingCameraConfig::load_or_default();
    let (controller, run_loop) = system_controller(config.session.preset)?;
    tokio::spawn(run_loop.run());

    let (interrupt_tx, mut interrupt_rx) = mpsc::unbounded_channel();
    ctrlc::set_handler(move || {
        let _ = interrupt_tx.send(());
    })?;

    let mut state = controller.subscribe();
    print_state(&state.borrow_and_update(), json)?;
    controller.request_access_if_needed();

    let deadline = tokio::time::sleep(Duration::from_secs(seconds));
    tokio::pin!(deadline);

    loop {
        tokio::select! {
            changed = state.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = state.borrow_and_update().clone();
                print_state(&snapshot, json)?;
            }
            _ = interrupt_rx.recv() => {
                log::info!("Interrupted");
                break;
            }
            _ = &mut deadline => break,
        }
    }

    let still_running = controller.teardown_and_wait().await;
    if json {
        println!("{}", serde_json::json!({ "stopped": !still_running }));
    } else {
        println!("Session stopped: {}", !still_running);
    }
    Ok(())
}

fn print_state(state: &ControllerState, json: bool) -> Result<(), Box<dyn std::error::Error>> {
    if json {
        println!("{}", serde_json::to_string(state)?);
    } else {
        println!(
            "authorization: {}, configured: {}, error: {}",
            state.authorization_state,
            state.configured,
            state.error_message().unwrap_or_else(|| "none".to_string())
        );
    }
    Ok(())
}
