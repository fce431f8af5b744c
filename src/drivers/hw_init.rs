//! One-shot peripheral initialization and raw pin helpers.
//!
//! Configures GPIO directions and LEDC timers/channels using raw ESP-IDF
//! sys calls. Called once from the boot sequence, before the main loop
//! starts. On host builds every helper is a no-op.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;
#[cfg(target_os = "espidf")]
use log::info;

use crate::error::InitError;
#[cfg(target_os = "espidf")]
use crate::pins;

pub const LEDC_CH_LED_R: u32 = 0;
pub const LEDC_CH_LED_G: u32 = 1;
pub const LEDC_CH_LED_B: u32 = 2;

// ── GPIO ──────────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
fn config_pins(pins: &[i32], mode: gpio_mode_t, pull_up: bool) -> Result<(), InitError> {
    for &pin in pins {
        let cfg = gpio_config_t {
            pin_bit_mask: 1u64 << pin,
            mode,
            pull_up_en: if pull_up {
                gpio_pullup_t_GPIO_PULLUP_ENABLE
            } else {
                gpio_pullup_t_GPIO_PULLUP_DISABLE
            },
            pull_down_en: gpio_pulldown_t_GPIO_PULLDOWN_DISABLE,
            intr_type: gpio_int_type_t_GPIO_INTR_DISABLE,
        };
        // SAFETY: plain register configuration from the boot path.
        let ret = unsafe { gpio_config(&cfg) };
        if ret != ESP_OK {
            return Err(InitError::Status("gpio_config", ret));
        }
    }
    Ok(())
}

/// Indicator LEDs as push-pull outputs, driven low.
#[cfg(target_os = "espidf")]
pub fn init_indicator_outputs() -> Result<(), InitError> {
    let outputs = [pins::LED_STATUS_GPIO, pins::LED_IDENTIFY_GPIO];
    config_pins(&outputs, gpio_mode_t_GPIO_MODE_OUTPUT, false)?;
    for pin in outputs {
        gpio_write(pin, false);
    }
    info!("hw_init: indicator outputs configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_indicator_outputs() -> Result<(), InitError> {
    log::debug!("hw_init(sim): indicator outputs skipped");
    Ok(())
}

/// Buttons as inputs with pull-up (active low).
#[cfg(target_os = "espidf")]
pub fn init_button_inputs() -> Result<(), InitError> {
    config_pins(
        &[pins::BUTTON_PAIR_GPIO, pins::BUTTON_CALIBRATE_GPIO],
        gpio_mode_t_GPIO_MODE_INPUT,
        true,
    )?;
    info!("hw_init: button inputs configured");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_button_inputs() -> Result<(), InitError> {
    log::debug!("hw_init(sim): button inputs skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn gpio_read(pin: i32) -> bool {
    // SAFETY: read-only register access on a configured input.
    (unsafe { gpio_get_level(pin) }) != 0
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_read(_pin: i32) -> bool {
    true
}

#[cfg(target_os = "espidf")]
pub fn gpio_write(pin: i32, high: bool) {
    // SAFETY: write to a pin configured in `init_indicator_outputs`.
    unsafe {
        gpio_set_level(pin, u32::from(high));
    }
}

#[cfg(not(target_os = "espidf"))]
pub fn gpio_write(_pin: i32, _high: bool) {}

// ── LEDC PWM ─────────────────────────────────────────────────

/// One 8-bit LEDC timer shared by the three colour channels.
#[cfg(target_os = "espidf")]
pub fn init_color_ledc() -> Result<(), InitError> {
    let timer = ledc_timer_config_t {
        speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
        timer_num: ledc_timer_t_LEDC_TIMER_0,
        duty_resolution: ledc_timer_bit_t_LEDC_TIMER_8_BIT,
        freq_hz: pins::LED_PWM_FREQ_HZ,
        clk_cfg: soc_periph_ledc_clk_src_legacy_t_LEDC_AUTO_CLK,
        ..Default::default()
    };
    // SAFETY: single boot-time configuration call.
    let ret = unsafe { ledc_timer_config(&timer) };
    if ret != ESP_OK {
        return Err(InitError::Status("ledc_timer_config", ret));
    }

    let channels = [
        (LEDC_CH_LED_R, pins::LED_R_GPIO),
        (LEDC_CH_LED_G, pins::LED_G_GPIO),
        (LEDC_CH_LED_B, pins::LED_B_GPIO),
    ];
    for (channel, gpio) in channels {
        let cfg = ledc_channel_config_t {
            speed_mode: ledc_mode_t_LEDC_LOW_SPEED_MODE,
            channel,
            timer_sel: ledc_timer_t_LEDC_TIMER_0,
            gpio_num: gpio,
            duty: 0,
            hpoint: 0,
            ..Default::default()
        };
        let ret = unsafe { ledc_channel_config(&cfg) };
        if ret != ESP_OK {
            return Err(InitError::Status("ledc_channel_config", ret));
        }
    }

    info!("hw_init: LEDC configured (led=CH0-2)");
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_color_ledc() -> Result<(), InitError> {
    log::debug!("hw_init(sim): LEDC skipped");
    Ok(())
}

#[cfg(target_os = "espidf")]
pub fn ledc_set(channel: u32, duty: u8) -> Result<(), i32> {
    // SAFETY: channel configured in `init_color_ledc`; only the main loop
    // writes duty registers.
    let ret = unsafe { ledc_set_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel, u32::from(duty)) };
    if ret != ESP_OK {
        return Err(ret);
    }
    let ret = unsafe { ledc_update_duty(ledc_mode_t_LEDC_LOW_SPEED_MODE, channel) };
    if ret != ESP_OK {
        return Err(ret);
    }
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn ledc_set(_channel: u32, _duty: u8) -> Result<(), i32> {
    Ok(())
}
