//! LED制御タスク
//!
//! モーター状態をLEDで表示します。
//! LED1: 動作中点灯、LED2: キャリブレーション中点滅、LED3: エラー点灯

use embassy_stm32::gpio::Output;
use embassy_time::{Duration, Timer};
use foc_drive::MotorState;

use crate::state::MOTOR_STATE;

/// LED制御タスク（250ms周期）
#[embassy_executor::task]
pub async fn led_task(
    mut led1: Output<'static>,
    mut led2: Output<'static>,
    mut led3: Output<'static>,
) {
    info!("LED task started");

    let mut blink = false;
    let mut last_state = MotorState::Idle;

    loop {
        let state = *MOTOR_STATE.lock().await;
        if state != last_state {
            info!("Motor state: {:?} -> {:?}", last_state, state);
            last_state = state;
        }

        blink = !blink;
        led1.set_level((state == MotorState::Running).into());
        led2.set_level((state == MotorState::Calibrating && blink).into());
        led3.set_level((state == MotorState::Error).into());

        Timer::after(Duration::from_millis(250)).await;
    }
}
