//! Presentation projection.
//!
//! [`project`] derives what a machine card should render from the machine
//! view-model and the room-subscription flag. It is a pure function of
//! state and can be re-evaluated at any time (e.g. on a room toggle)
//! without a fresh server message. State is never read back out of the
//! rendered presentation.

use washboard_proto::{MachineKind, MachineStatus};

use crate::Machine;

/// The primary action control on a machine card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryControl {
    /// Idle machine: offer the course picker.
    StartCycle,
    /// Operating, not subscribed: offer "notify me on completion".
    Notify,
    /// Operating and subscribed: offer "subscribed (tap to cancel)".
    CancelNotify,
    /// Washer locked by an active room subscription.
    RoomHold,
    /// Washer with an individual subscription while room mode is active:
    /// shown as registered, but not actionable.
    Subscribed,
}

/// Timer presentation derived from the stored timer pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerDisplay {
    /// Not operating, nothing to show.
    Idle,
    /// Operating with a known timer pair.
    Running {
        /// Minutes remaining.
        remaining: u32,
        /// Total cycle minutes (elapsed + remaining).
        total: u32,
    },
    /// Operating but the timer is unknown (absent pair or total of zero).
    RunningUnknown,
    /// Cycle complete, laundry waiting.
    Finished,
}

/// Everything a machine card renders.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CardProjection {
    /// Primary action control.
    pub control: PrimaryControl,
    /// Whether the control responds to input.
    pub enabled: bool,
    /// Timer line.
    pub timer: TimerDisplay,
}

/// Project a machine card from `(machine, room_active)`.
///
/// Dryers bypass the room-active override entirely; washers are locked
/// while room mode is active, except that an individually subscribed
/// washer still shows as registered.
pub fn project(machine: &Machine, room_active: bool) -> CardProjection {
    let operating = machine.is_operating();
    let room_locked = room_active && machine.kind == MachineKind::Washer;

    let (control, enabled) = match (room_locked, operating, machine.locally_subscribed) {
        (true, _, false) | (true, false, true) => (PrimaryControl::RoomHold, false),
        (true, true, true) => (PrimaryControl::Subscribed, false),
        (false, true, true) => (PrimaryControl::CancelNotify, true),
        (false, true, false) => (PrimaryControl::Notify, true),
        (false, false, _) => (PrimaryControl::StartCycle, true),
    };

    CardProjection { control, enabled, timer: timer_display(machine) }
}

fn timer_display(machine: &Machine) -> TimerDisplay {
    if machine.status == MachineStatus::Finished {
        return TimerDisplay::Finished;
    }
    if !machine.is_operating() {
        return TimerDisplay::Idle;
    }
    match (machine.remaining_minutes, machine.timer_total()) {
        (Some(remaining), Some(total)) if total > 0 => TimerDisplay::Running { remaining, total },
        _ => TimerDisplay::RunningUnknown,
    }
}

#[cfg(test)]
mod tests {
    use washboard_proto::MachineId;

    use super::*;

    fn machine(kind: MachineKind, status: MachineStatus, subscribed: bool) -> Machine {
        Machine {
            id: 1 as MachineId,
            kind,
            name: "Test".into(),
            status,
            remaining_minutes: None,
            elapsed_minutes: None,
            locally_subscribed: subscribed,
        }
    }

    #[test]
    fn projection_table_for_washers() {
        use MachineKind::Washer;
        use MachineStatus::{Off, Washing};

        let cases = [
            // (room_active, status, subscribed) -> (control, enabled)
            (true, Off, false, PrimaryControl::RoomHold, false),
            (true, Washing, false, PrimaryControl::RoomHold, false),
            (true, Washing, true, PrimaryControl::Subscribed, false),
            (false, Washing, true, PrimaryControl::CancelNotify, true),
            (false, Washing, false, PrimaryControl::Notify, true),
            (false, Off, false, PrimaryControl::StartCycle, true),
        ];
        for (room, status, subscribed, control, enabled) in cases {
            let card = project(&machine(Washer, status, subscribed), room);
            assert_eq!(card.control, control, "room={room} status={status:?} sub={subscribed}");
            assert_eq!(card.enabled, enabled, "room={room} status={status:?} sub={subscribed}");
        }
    }

    #[test]
    fn dryers_bypass_room_lock() {
        let idle = project(&machine(MachineKind::Dryer, MachineStatus::Off, false), true);
        assert_eq!(idle.control, PrimaryControl::StartCycle);
        assert!(idle.enabled);

        let drying = project(&machine(MachineKind::Dryer, MachineStatus::Drying, false), true);
        assert_eq!(drying.control, PrimaryControl::Notify);
        assert!(drying.enabled);
    }

    #[test]
    fn timer_shows_remaining_and_total_while_operating() {
        let mut m = machine(MachineKind::Washer, MachineStatus::Washing, false);
        m.remaining_minutes = Some(30);
        m.elapsed_minutes = Some(0);
        assert_eq!(
            project(&m, false).timer,
            TimerDisplay::Running { remaining: 30, total: 30 }
        );
    }

    #[test]
    fn zero_total_timer_is_hidden() {
        let mut m = machine(MachineKind::Washer, MachineStatus::Washing, false);
        m.remaining_minutes = Some(0);
        m.elapsed_minutes = Some(0);
        assert_eq!(project(&m, false).timer, TimerDisplay::RunningUnknown);
    }

    #[test]
    fn stale_timer_pair_is_hidden_when_idle() {
        // Stored fields survive; only the presentation hides them.
        let mut m = machine(MachineKind::Washer, MachineStatus::Off, false);
        m.remaining_minutes = Some(12);
        m.elapsed_minutes = Some(30);
        assert_eq!(project(&m, false).timer, TimerDisplay::Idle);
    }

    #[test]
    fn finished_wins_over_timer_fields() {
        let mut m = machine(MachineKind::Washer, MachineStatus::Finished, false);
        m.remaining_minutes = Some(5);
        m.elapsed_minutes = Some(40);
        assert_eq!(project(&m, false).timer, TimerDisplay::Finished);
    }
}
