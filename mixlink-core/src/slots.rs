//! On-screen mixer lines
//!
//! Each line shows one session from the host's volume table. A line keeps two
//! dirty flags so a redraw only touches what changed: a new pid means the icon
//! has to be fetched again, a new volume or mute state means the slider does.

use mixlink_protocol::{MuteFrame, ProgramVolume, VolumeFrame, VolumeTable, MASTER_PID};

/// Volume step for the master channel
pub const MASTER_STEP: i16 = 2;

/// Volume step for application sessions
pub const SESSION_STEP: i16 = 10;

/// Highest volume the host accepts
pub const MAX_VOLUME: i16 = 100;

/// Clamp a requested volume into `0..=100`
pub fn clamp_volume(volume: i16) -> u8 {
    volume.clamp(0, MAX_VOLUME) as u8
}

/// Volume one step up or down from `volume`
///
/// Master moves in finer steps than applications.
pub fn step_volume(pid: i16, volume: u8, up: bool) -> u8 {
    let step = if pid == MASTER_PID {
        MASTER_STEP
    } else {
        SESSION_STEP
    };
    let volume = i16::from(volume);
    clamp_volume(if up { volume + step } else { volume - step })
}

/// One mixer line
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct SessionSlot {
    volume: Option<ProgramVolume>,
    /// Icon must be fetched again
    session_changed: bool,
    /// Slider must be redrawn
    volume_changed: bool,
}

impl Default for SessionSlot {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionSlot {
    /// Empty slot; the first assignment draws everything
    pub const fn new() -> Self {
        Self {
            volume: None,
            session_changed: true,
            volume_changed: true,
        }
    }

    /// Session shown on this line, if any
    pub fn volume(&self) -> Option<&ProgramVolume> {
        self.volume.as_ref()
    }

    pub fn is_empty(&self) -> bool {
        self.volume.is_none()
    }

    /// Show `volume` on this line
    ///
    /// Keeps the icon when the pid is unchanged. Dirty flags accumulate until
    /// taken, so two refreshes between redraws lose nothing.
    pub fn assign(&mut self, volume: &ProgramVolume) {
        match &self.volume {
            Some(current) if current.pid == volume.pid => {
                self.volume_changed |=
                    current.volume != volume.volume || current.muted != volume.muted;
            }
            _ => {
                self.session_changed = true;
                self.volume_changed = true;
            }
        }
        self.volume = Some(volume.clone());
    }

    /// Clear the line
    pub fn reset(&mut self) {
        self.volume = None;
    }

    /// Whether the icon still has to be fetched
    pub fn needs_icon(&self) -> bool {
        self.volume.is_some() && self.session_changed
    }

    /// Record a successful icon fetch
    pub fn icon_loaded(&mut self) {
        self.session_changed = false;
    }

    /// Consume the slider dirty flag
    ///
    /// Returns `false` for an empty slot without clearing the flag.
    pub fn take_volume_change(&mut self) -> bool {
        if self.volume.is_none() {
            return false;
        }
        core::mem::replace(&mut self.volume_changed, false)
    }

    /// Push for a `+` or `-` press
    pub fn step(&self, up: bool) -> Option<VolumeFrame> {
        self.volume.as_ref().map(|v| VolumeFrame {
            pid: v.pid,
            volume: step_volume(v.pid, v.volume, up),
        })
    }

    /// Push for a slider drag to `position`
    pub fn slide(&self, position: i16) -> Option<VolumeFrame> {
        self.volume.as_ref().map(|v| VolumeFrame {
            pid: v.pid,
            volume: clamp_volume(position),
        })
    }

    /// Push for a mute button press
    pub fn toggle_mute(&self) -> Option<MuteFrame> {
        self.volume.as_ref().map(|v| MuteFrame {
            pid: v.pid,
            muted: !v.muted,
        })
    }
}

/// The display's `N` mixer lines
#[derive(Debug, Clone)]
pub struct MixerSlots<const N: usize> {
    slots: [SessionSlot; N],
}

impl<const N: usize> Default for MixerSlots<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> MixerSlots<N> {
    pub fn new() -> Self {
        Self {
            slots: core::array::from_fn(|_| SessionSlot::new()),
        }
    }

    /// Lay out a freshly loaded table
    ///
    /// Present entries fill lines in table order; lines left over are reset.
    /// A table with no first entry is treated as not loaded and leaves every
    /// line untouched, returning `false`.
    pub fn refresh(&mut self, table: &VolumeTable) -> bool {
        if table[0].is_none() {
            return false;
        }

        let mut line = 0;
        for volume in table.iter().flatten() {
            let Some(slot) = self.slots.get_mut(line) else {
                break;
            };
            slot.assign(volume);
            line += 1;
        }
        for slot in &mut self.slots[line..] {
            slot.reset();
        }
        true
    }

    pub fn get(&self, line: usize) -> Option<&SessionSlot> {
        self.slots.get(line)
    }

    pub fn get_mut(&mut self, line: usize) -> Option<&mut SessionSlot> {
        self.slots.get_mut(line)
    }

    pub fn iter(&self) -> impl Iterator<Item = &SessionSlot> {
        self.slots.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut SessionSlot> {
        self.slots.iter_mut()
    }

    /// Lines currently showing a session
    pub fn occupied(&self) -> usize {
        self.slots.iter().filter(|s| !s.is_empty()).count()
    }
}
