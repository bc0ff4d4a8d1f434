//! Text board rendering.
//!
//! Pure projection of the application state into lines; the driver owns
//! writing them. State never flows back out of the rendered text.

use washboard_app::{App, LinkState};
use washboard_core::{PrimaryControl, TimerDisplay};

/// Render the full board, one line per machine plus banner and status.
pub fn board_lines(app: &App) -> Vec<String> {
    let mut lines = Vec::new();
    if let Some(banner) = connection_banner(app.link_state()) {
        lines.push(banner.to_owned());
    }
    let room = if app.room_active() { "room alert: ON" } else { "room alert: off" };
    lines.push(format!("== Laundry Room ({room}) =="));

    for (machine, card) in app.board() {
        let control = control_label(card.control, card.enabled);
        let timer = timer_label(card.timer);
        lines.push(format!("{:>3}  {:<12} {:<16} {}", machine.id, machine.name, timer, control));
    }

    if let Some(message) = app.status_message() {
        lines.push(format!("-- {message}"));
    }
    lines
}

fn connection_banner(state: LinkState) -> Option<&'static str> {
    match state {
        LinkState::Connected => None,
        LinkState::Connecting | LinkState::Disconnected => Some("! connecting to live updates…"),
        LinkState::RetryScheduled => Some("! live updates lost, reconnecting…"),
    }
}

fn control_label(control: PrimaryControl, enabled: bool) -> String {
    let label = match control {
        PrimaryControl::StartCycle => "[start <id>]",
        PrimaryControl::Notify => "[notify <id>]",
        PrimaryControl::CancelNotify => "[notify <id>: cancel]",
        PrimaryControl::RoomHold => "(held for room alert)",
        PrimaryControl::Subscribed => "(subscribed)",
    };
    if enabled { label.to_owned() } else { format!("{label} …") }
}

fn timer_label(timer: TimerDisplay) -> String {
    match timer {
        TimerDisplay::Idle => String::new(),
        TimerDisplay::Running { remaining, total } => format!("{remaining}/{total} min left"),
        TimerDisplay::RunningUnknown => "running".to_owned(),
        TimerDisplay::Finished => "FINISHED".to_owned(),
    }
}

#[cfg(test)]
mod tests {
    use washboard_app::AppEvent;
    use washboard_core::{MachineStatus, MemoryKv};
    use washboard_proto::{MachineKind, MachineSnapshot};

    use super::*;

    fn app() -> App {
        let mut app = App::new(Box::new(MemoryKv::new()));
        let _ = app.handle(AppEvent::SnapshotLoaded {
            machines: vec![
                MachineSnapshot {
                    machine_id: 1,
                    kind: MachineKind::Washer,
                    machine_name: None,
                    status: MachineStatus::Washing,
                    remaining_minutes: Some(12),
                    elapsed_minutes: Some(30),
                    subscribed: Some(false),
                },
                MachineSnapshot {
                    machine_id: 2,
                    kind: MachineKind::Dryer,
                    machine_name: Some("Roof Dryer".into()),
                    status: MachineStatus::Off,
                    remaining_minutes: None,
                    elapsed_minutes: None,
                    subscribed: Some(false),
                },
            ],
        });
        app
    }

    #[test]
    fn board_shows_names_timers_and_controls() {
        let lines = board_lines(&app());
        let washer = lines.iter().find(|l| l.contains("Washer 1")).unwrap();
        assert!(washer.contains("12/42 min left"));
        assert!(washer.contains("[notify <id>]"));

        let dryer = lines.iter().find(|l| l.contains("Roof Dryer")).unwrap();
        assert!(dryer.contains("[start <id>]"));
    }

    #[test]
    fn banner_reflects_a_lost_channel() {
        let mut app = app();
        let _ = app.handle(AppEvent::ChannelClosed);
        assert!(board_lines(&app)[0].contains("reconnecting"));
    }
}
