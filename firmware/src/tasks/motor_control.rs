//! モーター制御タスク
//!
//! 20kHz周期で `MotorContext::tick` を実行します。
//! コマンドは周期の先頭でまとめて適用し、テレメトリは間引いてSignalへ渡します。

use cortex_m::peripheral::DWT;
use embassy_time::{Duration, Ticker};
use foc_drive::{MotorContext, MotorHardware, TickOutcome};

use crate::config::{telemetry::DECIMATION, CONTROL_PERIOD_US};
use crate::motor_driver::BoardHardware;
use crate::state::{COMMANDS, MOTOR_STATE, TELEMETRY};

/// ログ出力間隔 [制御周期]（1秒ごと）
const LOG_INTERVAL: u32 = (1_000_000 / CONTROL_PERIOD_US) as u32;

/// モーター制御タスク（20kHz FOC制御ループ）
#[embassy_executor::task]
pub async fn motor_control_task(mut hw: BoardHardware, mut motor: MotorContext) {
    info!(
        "Motor control task started: period={}us, Ts={}",
        CONTROL_PERIOD_US,
        hw.max_duty()
    );

    // 起動時はブレーキパターンで待機
    hw.set_pwm_brake();

    let mut ticker = Ticker::every(Duration::from_micros(CONTROL_PERIOD_US));
    let mut telemetry_counter = 0u32;
    let mut log_counter = 0u32;
    let mut max_cycles = 0u32;
    let mut last_outcome = TickOutcome::Calibrating;

    loop {
        ticker.next().await;

        // 1. 保留中のコマンドを適用（d/q電流指令などを周期内で一括反映）
        while let Ok(command) = COMMANDS.try_receive() {
            debug!("Command: {:?}", command);
            motor.apply(command, &mut hw);
        }

        // 2. FOC制御
        let start = DWT::cycle_count();
        let outcome = motor.tick(&mut hw);
        let cycles = DWT::cycle_count().wrapping_sub(start);
        max_cycles = max_cycles.max(cycles);

        if outcome != last_outcome {
            debug!("Tick outcome: {:?} -> {:?}", last_outcome, outcome);
            last_outcome = outcome;
        }

        // 3. テレメトリ（間引き）
        telemetry_counter += 1;
        if telemetry_counter >= DECIMATION {
            telemetry_counter = 0;
            TELEMETRY.signal(motor.telemetry_frame());

            // 状態更新（ロック中ならスキップ）
            if let Ok(mut state) = MOTOR_STATE.try_lock() {
                *state = motor.state();
            }
        }

        // デバッグログ（1秒ごと）
        log_counter += 1;
        if log_counter >= LOG_INTERVAL {
            log_counter = 0;
            let dq = motor.dq_currents();
            info!(
                "[FOC] {:?}/{:?} Speed: {}/{} RPM, Pos: {}rad, Id={}A, Iq={}A, Vbus={}V, enc faults {}, max {} cycles/tick",
                motor.state(),
                motor.mode(),
                motor.actual_rpm(),
                motor.target_rpm(),
                motor.position(),
                dq.d,
                dq.q,
                motor.bus_voltage(),
                motor.encoder_fault_count(),
                max_cycles
            );
            max_cycles = 0;
        }
    }
}
