//! Sleep timer picker and commands

use chrono::Utc;

use crate::model::{sleep_timer_options, Overlay, ToastLevel, CUSTOM_SLEEP_TIMER};
use crate::service::EngineCommand;
use super::ScreenController;

impl ScreenController {
    pub fn show_sleep_picker(&mut self) {
        let last_used = match self.deps.config_store.load() {
            Ok(config) => config.last_sleep_timer_seconds,
            Err(e) => {
                tracing::warn!(error = %e, "Could not read last sleep timer duration");
                0
            }
        };
        let options = sleep_timer_options(last_used);
        let selected = options
            .iter()
            .position(|option| option.seconds == last_used)
            .unwrap_or(0);
        self.overlay = Some(Overlay::SleepPicker { options, selected });
    }

    /// A picker entry was chosen
    pub fn choose_sleep_option(&mut self, seconds: i64) {
        if seconds == CUSTOM_SLEEP_TIMER {
            self.overlay = Some(Overlay::CustomSleep {
                input: String::new(),
            });
        } else if seconds > 0 {
            self.overlay = None;
            self.pick_sleep_timer(seconds);
        }
    }

    /// Custom prompt submitted, value in minutes
    pub fn submit_custom_sleep(&mut self, minutes: &str) {
        self.overlay = None;
        match minutes.trim().parse::<i64>() {
            Ok(minutes) if minutes > 0 => {
                // Longest countdown the service can carry
                let seconds = minutes.saturating_mul(60).min(i64::from(u32::MAX));
                self.pick_sleep_timer(seconds);
            }
            _ => tracing::debug!(input = minutes, "Ignoring custom sleep timer value"),
        }
    }

    pub fn pick_sleep_timer(&mut self, seconds: i64) {
        // Picking again while a countdown runs replaces it
        if self.sleep_timer.is_armed() {
            self.stop_sleep_timer();
        }

        match self.sleep_timer.arm(seconds, Utc::now()) {
            Ok(accepted) => {
                if let Err(e) = self
                    .deps
                    .config_store
                    .update(|config| config.last_sleep_timer_seconds = i64::from(accepted))
                {
                    tracing::error!(error = %e, "Failed to persist sleep timer duration");
                }
                tracing::info!(seconds = accepted, "Sleep timer armed");
                self.send_command(EngineCommand::StartSleepTimer { seconds: accepted });
            }
            Err(e) => {
                tracing::warn!(error = %e, "Sleep timer not armed");
                self.show_toast(ToastLevel::Warning, format!("Sleep timer not set: {e}"));
            }
        }
    }

    pub fn stop_sleep_timer(&mut self) {
        match self.sleep_timer.cancel() {
            Ok(()) => {
                tracing::info!("Sleep timer cancelled");
                self.send_command(EngineCommand::StopSleepTimer);
            }
            Err(e) => tracing::debug!(error = %e, "Nothing to cancel"),
        }
    }
}
