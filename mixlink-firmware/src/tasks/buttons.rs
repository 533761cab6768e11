//! Front-panel button task

use defmt::*;
use embassy_futures::select::{select4, Either4};
use embassy_rp::gpio::Input;
use embassy_time::Timer;

use crate::channels::{Button, INPUT_CHANNEL};

/// Ignore edges for this long after a press
const DEBOUNCE_MS: u64 = 30;

/// Active-low buttons
pub struct Buttons {
    pub next: Input<'static>,
    pub minus: Input<'static>,
    pub plus: Input<'static>,
    pub mute: Input<'static>,
}

/// Button task - turns falling edges into [`Button`] presses
#[embassy_executor::task]
pub async fn buttons_task(mut buttons: Buttons) {
    info!("Buttons task started");

    loop {
        let pressed = match select4(
            buttons.next.wait_for_falling_edge(),
            buttons.minus.wait_for_falling_edge(),
            buttons.plus.wait_for_falling_edge(),
            buttons.mute.wait_for_falling_edge(),
        )
        .await
        {
            Either4::First(()) => Button::Next,
            Either4::Second(()) => Button::Minus,
            Either4::Third(()) => Button::Plus,
            Either4::Fourth(()) => Button::Mute,
        };

        debug!("Button: {:?}", pressed);
        if INPUT_CHANNEL.try_send(pressed).is_err() {
            warn!("Input channel full, dropping press");
        }

        Timer::after_millis(DEBOUNCE_MS).await;
    }
}
