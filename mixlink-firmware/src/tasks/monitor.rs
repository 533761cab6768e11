//! Link monitor task
//!
//! One loop iteration: wait for a button press (not at all while drawing),
//! poll the host for changes, carry out the current state's action, then
//! transition. Lines are reported over defmt; drawing them is left to the
//! display driver.

use defmt::*;
use embassy_rp::gpio::Output;
use embassy_time::{with_timeout, Duration};

use mixlink_core::{LinkEvent, LinkState, MixerSlots, MonitorAction};

use crate::channels::{Button, DisplayLink, INPUT_CHANNEL};
use crate::config::MONITOR;

/// Mixer lines on screen
pub const MIXER_LINES: usize = 5;

/// Largest icon the host may send
pub const ICON_SIZE: usize = 5500;

/// Link monitor task - owns the backlight and the mixer lines
#[embassy_executor::task]
pub async fn monitor_task(
    link: &'static DisplayLink,
    mut backlight: Output<'static>,
    icon: &'static mut [u8; ICON_SIZE],
) {
    info!("Monitor task started");

    let mut state = LinkState::default();
    let mut slots = MixerSlots::<MIXER_LINES>::new();
    let mut selected = 0;

    loop {
        let ui_input = match next_button(state.ui_wait_ms(&MONITOR)).await {
            Some(button) => {
                handle_button(link, &slots, &mut selected, button).await;
                true
            }
            None => false,
        };

        let poll = link.changes().await;
        let since_success_ms = link.since_last_success().as_millis();
        let event = LinkEvent::classify(ui_input, poll, since_success_ms, &MONITOR);

        match state.action(&MONITOR) {
            MonitorAction::WakeBacklight => backlight.set_high(),
            MonitorAction::RefreshTable => redraw(link, &mut slots, &mut icon[..]).await,
            MonitorAction::Nothing => {}
            MonitorAction::DimBacklight => backlight.set_low(),
            MonitorAction::SleepWait(ms) => {
                // A press cuts the wait short; the display still only wakes on a change
                let _ = with_timeout(Duration::from_millis(ms.into()), INPUT_CHANNEL.receive()).await;
            }
        }

        let next = state.transition(event);
        if next != state {
            info!("Link monitor: {:?} -> {:?} ({:?})", state, next, event);
        }
        state = next;
    }
}

/// Wait up to `wait_ms` for a press
async fn next_button(wait_ms: u32) -> Option<Button> {
    if wait_ms == 0 {
        return INPUT_CHANNEL.try_receive().ok();
    }
    with_timeout(Duration::from_millis(wait_ms.into()), INPUT_CHANNEL.receive())
        .await
        .ok()
}

async fn handle_button(
    link: &DisplayLink,
    slots: &MixerSlots<MIXER_LINES>,
    selected: &mut usize,
    button: Button,
) {
    let Some(slot) = slots.get(*selected) else {
        return;
    };

    match button {
        Button::Next => {
            *selected = (*selected + 1) % slots.occupied().max(1);
            debug!("Selected line {}", *selected);
        }
        Button::Minus | Button::Plus => {
            if let Some(frame) = slot.step(button == Button::Plus) {
                link.set_volume(frame.pid, frame.volume).await;
            }
        }
        Button::Mute => {
            if let Some(frame) = slot.toggle_mute() {
                link.set_mute(frame.pid, frame.muted).await;
            }
        }
    }
}

/// Reload the table and report what changed on each line
async fn redraw(link: &DisplayLink, slots: &mut MixerSlots<MIXER_LINES>, icon: &mut [u8]) {
    if let Err(e) = link.load_volumes().await {
        warn!("Volume table load failed: {:?}", e);
        return;
    }
    if !slots.refresh(&link.volumes().await) {
        return;
    }

    for (line, slot) in slots.iter_mut().enumerate() {
        let Some(volume) = slot.volume().cloned() else {
            continue;
        };

        if slot.take_volume_change() {
            info!(
                "Line {}: {} {}%{}",
                line,
                volume.name.as_str(),
                volume.volume,
                if volume.muted { " (muted)" } else { "" }
            );
        }

        if slot.needs_icon() {
            match link.load_image(volume.pid, icon).await {
                Ok(len) => {
                    debug!("Line {}: icon {} bytes", line, len);
                    slot.icon_loaded();
                }
                Err(e) => warn!("Icon for pid {} failed: {:?}", volume.pid, e),
            }
        }
    }
}
