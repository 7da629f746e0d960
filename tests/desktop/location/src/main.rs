//! Desktop demo for geokit-location.
//!
//! Run with: cargo run -p geokit-location-demo -- [once|single|interval <ms>|watch [config.json]]

use std::sync::Arc;

use geokit::display::{Panel, PanelKind, Theme};
use geokit::location::{
    AcquisitionMode, LocationController, LocationSnapshot, PermissionState, SystemProvider, WatchConfig,
};

fn print_panel(snapshot: &LocationSnapshot, theme: &Theme) {
    let panel = Panel::render(snapshot, theme);
    let marker = match panel.kind {
        PanelKind::Error => "✗",
        PanelKind::Location => "✓",
    };
    println!("{marker} [{:?}] {}", snapshot.mode, panel.text);
}

#[tokio::main(flavor = "current_thread")]
async fn main() {
    let args: Vec<String> = std::env::args().skip(1).collect();
    let mode = args.first().map_or("once", String::as_str);
    let theme = Theme::default();

    println!("=== Geokit Location Demo ===\n");

    let controller = LocationController::new(Arc::new(SystemProvider));

    let status = geokit::permission::check().await;
    println!("Current permission status: {status:?}");

    println!("Requesting location permission...");
    let permission = controller.request_permission().await;
    println!("Permission: {permission:?}\n");
    if permission != PermissionState::Granted {
        print_panel(&controller.snapshot(), &theme);
        return;
    }

    let started = match mode {
        "once" => {
            let _ = controller.read_once().await;
            print_panel(&controller.snapshot(), &theme);
            return;
        }
        "single" => controller.start_single(),
        "interval" => {
            let period = args.get(1).and_then(|p| p.parse().ok()).unwrap_or(5000);
            controller.start_interval(period)
        }
        "watch" => {
            let config = match args.get(1).map(std::fs::read_to_string) {
                Some(Ok(json)) => match serde_json::from_str::<WatchConfig>(&json) {
                    Ok(config) => config,
                    Err(e) => {
                        println!("Invalid watch config: {e}");
                        return;
                    }
                },
                Some(Err(e)) => {
                    println!("Failed to read watch config: {e}");
                    return;
                }
                None => WatchConfig::default(),
            };
            controller.start_subscription(&config)
        }
        other => {
            println!("Unknown mode '{other}'; expected once, single, interval or watch");
            return;
        }
    };

    if let Err(e) = started {
        println!("Failed to start {mode}: {e}");
        return;
    }

    println!("Press Ctrl-C to stop.\n");
    let mut updates = controller.subscribe();
    loop {
        tokio::select! {
            changed = updates.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = updates.borrow_and_update().clone();
                print_panel(&snapshot, &theme);
                if mode == "single" && snapshot.mode == AcquisitionMode::Idle {
                    break;
                }
            }
            _ = tokio::signal::ctrl_c() => break,
        }
    }

    controller.stop();
    println!("\nStopped.");
}
