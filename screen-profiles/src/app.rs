use std::io::Write;
use std::sync::mpsc as std_mpsc;

use anyhow::{Context, Result};
use screen_profiles_ipc::{HostEvent, HostReply, WindowKind};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::core::{
    derive_key, sample, Config, LayoutSwitchController, ProfileKey, ProfileRepository,
    SwitchOutcome,
};
use crate::platform::{CommandSettingsHost, JsonConfigStore};
use crate::profile_store::ProfileStore;

pub struct App {}

impl App {
    pub fn run(config: Config) -> Result<()> {
        let host = CommandSettingsHost::new(&config.host_command, config.host_timeout)
            .context("No settings host command given")?;
        let store = ProfileStore::new(
            &config,
            JsonConfigStore::new(config.registry_path.clone()),
            host,
        );

        // Channel: host events (tokio -> main thread)
        let (event_tx, event_rx) = std_mpsc::channel::<HostEvent>();

        // Spawn tokio runtime in separate thread
        std::thread::spawn(move || {
            let rt = match tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
            {
                Ok(rt) => rt,
                Err(e) => {
                    tracing::error!("Failed to start tokio runtime: {}", e);
                    return;
                }
            };
            rt.block_on(Self::read_host_events(event_tx));
        });

        let app = App {};
        app.run_main_loop(event_rx, &store, &mut std::io::stdout())
    }

    async fn read_host_events(event_tx: std_mpsc::Sender<HostEvent>) {
        tracing::info!("Reading host events from stdin");
        let mut lines = BufReader::new(tokio::io::stdin()).lines();

        loop {
            tokio::select! {
                line = lines.next_line() => {
                    match line {
                        Ok(Some(line)) => {
                            if line.trim().is_empty() {
                                continue;
                            }
                            match serde_json::from_str::<HostEvent>(&line) {
                                Ok(event) => {
                                    if event_tx.send(event).is_err() {
                                        break;
                                    }
                                }
                                Err(e) => {
                                    tracing::warn!("Ignoring malformed host event '{}': {}", line.trim(), e);
                                }
                            }
                        }
                        Ok(None) => {
                            tracing::info!("Host closed stdin");
                            break;
                        }
                        Err(e) => {
                            tracing::error!("Failed to read host event: {}", e);
                            break;
                        }
                    }
                }
                _ = tokio::signal::ctrl_c() => {
                    tracing::info!("Interrupted");
                    let _ = event_tx.send(HostEvent::Shutdown);
                    break;
                }
            }
        }
    }

    fn run_main_loop<R: ProfileRepository, W: Write>(
        self,
        event_rx: std_mpsc::Receiver<HostEvent>,
        repository: &R,
        replies: &mut W,
    ) -> Result<()> {
        tracing::info!("Starting main loop");
        let mut controller = LayoutSwitchController::new();

        // Ends when the reader thread drops its sender
        while let Ok(event) = event_rx.recv() {
            if !handle_host_event(&mut controller, repository, event, replies)? {
                break;
            }
        }

        tracing::info!(
            "Main loop exited, last layout: {}",
            controller.last_imported().map_or("none", ProfileKey::as_str)
        );
        Ok(())
    }
}

/// Process one host event. Returns false when the daemon should stop.
pub fn handle_host_event<R: ProfileRepository + ?Sized, W: Write>(
    controller: &mut LayoutSwitchController,
    repository: &R,
    event: HostEvent,
    replies: &mut W,
) -> Result<bool> {
    match event {
        HostEvent::WindowMoved { window, topology } => {
            let key = derive_key(&sample(&topology));
            tracing::debug!("Window moved ({:?}), topology {}", window, key);

            let switching = window == WindowKind::Main && !controller.is_current(&key);
            if switching {
                send_reply(replies, &HostReply::status("Loading screen layout"))?;
            }

            let outcome = controller.handle_window_moved(window, key, repository);
            tracing::debug!("Window move handled: {}", outcome);
            if switching {
                if let Some(text) = switch_status(&outcome) {
                    send_reply(replies, &HostReply::status(text))?;
                }
            }
        }
        HostEvent::SaveLayout { topology } => {
            let key = derive_key(&sample(&topology));
            let outcome = controller.save_layout(key, repository);
            tracing::debug!("Save handled: {}", outcome);
            let text = match outcome {
                SwitchOutcome::ExportFailed { .. } => "Failed to save screen layout",
                _ => "Saved current screen layout",
            };
            send_reply(replies, &HostReply::status(text))?;
        }
        HostEvent::Shutdown => {
            tracing::info!("Shutdown requested");
            return Ok(false);
        }
    }
    Ok(true)
}

fn switch_status(outcome: &SwitchOutcome) -> Option<&'static str> {
    match outcome {
        SwitchOutcome::Imported(_) => Some("Loaded screen layout"),
        SwitchOutcome::ImportFailed { error, .. } if error.is_missing_profile() => {
            Some("No saved screen layout for this display setup")
        }
        SwitchOutcome::ImportFailed { .. } => Some("Failed to load screen layout"),
        _ => None,
    }
}

fn send_reply<W: Write>(replies: &mut W, reply: &HostReply) -> Result<()> {
    serde_json::to_writer(&mut *replies, reply)?;
    writeln!(replies)?;
    replies.flush()?;
    Ok(())
}
