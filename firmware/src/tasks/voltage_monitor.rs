//! 電圧監視タスク
//!
//! DCバス電圧を監視し、SVPWMのスケーリング用に制御タスクへ渡します。
//! 過電圧/低電圧を検出したら非常停止を要求します。

use embassy_stm32::{
    adc::{Adc, AnyAdcChannel},
    peripherals,
};
use embassy_time::{Duration, Ticker};
use foc_drive::bus_voltage::{BusVoltageConfig, BusVoltageMonitor};
use foc_drive::MotorCommand;

use crate::config::voltage::{LOG_INTERVAL, PERIOD_MS};
use crate::state::COMMANDS;

/// 電圧監視タスク - DCバス電圧を監視し、過電圧/低電圧を検出
#[embassy_executor::task]
pub async fn voltage_monitor_task(
    mut adc: Adc<'static, peripherals::ADC2>,
    mut voltage_pin: AnyAdcChannel<peripherals::ADC2>,
) {
    info!("Voltage monitor task started");

    // 分圧 33.3kΩ / 3.3kΩ、OV=30V、UV=10V
    let config = BusVoltageConfig::default();
    let mut monitor = BusVoltageMonitor::new(config);

    info!(
        "Voltage monitor initialized: OV={}V, UV={}V",
        config.overvoltage_threshold, config.undervoltage_threshold
    );

    // 初回ADC読み取りでフィルタを初期化（起動時のUNDERVOLTAGE誤検出を防ぐ）
    let initial_adc = adc.blocking_read(&mut voltage_pin);
    let state = monitor.initialize_with_adc(initial_adc);
    info!(
        "Initial voltage: {}V (ADC raw: {}), OV={}, UV={}",
        state.voltage, initial_adc, state.overvoltage, state.undervoltage
    );

    let mut ticker = Ticker::every(Duration::from_millis(PERIOD_MS));

    // 非常停止を要求済みか（電圧が戻るまで再要求しない）
    let mut fault_latched = false;

    // デバッグログ用カウンタ
    let mut log_counter = 0u32;

    loop {
        ticker.next().await;

        let adc_raw = adc.blocking_read(&mut voltage_pin);
        let state = monitor.update(adc_raw);

        if state.is_voltage_ok() {
            fault_latched = false;
            // SVPWMのスケーリングを実測値に追従
            let _ = COMMANDS.try_send(MotorCommand::SetBusVoltage(state.voltage));
        } else if !fault_latched {
            error!(
                "Voltage fault detected! Emergency stop. Voltage: {}V, OV: {}, UV: {}",
                state.voltage, state.overvoltage, state.undervoltage
            );
            // 非常停止は必ず届ける
            COMMANDS.send(MotorCommand::EmergencyStop).await;
            fault_latched = true;
        }

        // デバッグログ（1秒ごと）
        log_counter += 1;
        if log_counter >= LOG_INTERVAL {
            log_counter = 0;
            info!(
                "[Voltage] ADC_raw={}, V_bus={}V, OV={}, UV={}",
                adc_raw, state.voltage, state.overvoltage, state.undervoltage
            );
        }
    }
}
