#![no_std]
#![no_main]

// ログマクロはテキスト順に有効になるため最初に宣言
mod fmt;

mod benchmark;
mod config;
mod encoder;
mod hardware;
mod motor_driver;
mod state;
mod tasks;

#[cfg(not(feature = "defmt"))]
use panic_halt as _;
#[cfg(feature = "defmt")]
use {defmt_rtt as _, panic_probe as _};

use embassy_executor::Spawner;
use embassy_stm32::{
    adc::{Adc, AdcChannel, SampleTime},
    gpio::{Level, Output, Speed},
    spi::{self, Spi},
    usart::{Config as UartConfig, UartTx},
};
use embassy_time::{Duration, Timer};
use foc_drive::{ControlMode, MotorCommand, MotorContext};

use encoder::As5047p;
use motor_driver::{BoardHardware, CurrentChannels};
use state::COMMANDS;
use tasks::{
    encoder_task, led_task, motor_control_task, telemetry_task, voltage_monitor_task,
};

#[embassy_executor::main]
async fn main(spawner: Spawner) {
    // ハードウェア初期化
    let clock_config = hardware::create_clock_config();
    let p = embassy_stm32::init(clock_config);

    info!("═══════════════════════════════════════════════════════════════════");
    info!("");
    info!("    ███████╗ ██████╗  ██████╗    ██████╗ ██████╗ ██╗██╗   ██╗███████╗");
    info!("    ██╔════╝██╔═══██╗██╔════╝    ██╔══██╗██╔══██╗██║██║   ██║██╔════╝");
    info!("    █████╗  ██║   ██║██║         ██║  ██║██████╔╝██║██║   ██║█████╗  ");
    info!("    ██╔══╝  ██║   ██║██║         ██║  ██║██╔══██╗██║╚██╗ ██╔╝██╔══╝  ");
    info!("    ██║     ╚██████╔╝╚██████╗    ██████╔╝██║  ██║██║ ╚████╔╝ ███████╗");
    info!("    ╚═╝      ╚═════╝  ╚═════╝    ╚═════╝ ╚═╝  ╚═╝╚═╝  ╚═══╝  ╚══════╝");
    info!("");
    info!("      PMSM FOC Drive • AS5047P Encoder • STM32G431VB @ 170MHz");
    info!("");
    info!("═══════════════════════════════════════════════════════════════════");

    // ベンチマーク実行（DWTは制御タスクの処理時間測定にも使用）
    unsafe {
        benchmark::enable_cycle_counter();
    }
    benchmark::run_cos_sin_benchmark(1000);

    // LED初期化＆タスク起動
    let led1 = Output::new(p.PC13, Level::Low, Speed::Low);
    let led2 = Output::new(p.PC14, Level::Low, Speed::Low);
    let led3 = Output::new(p.PC15, Level::Low, Speed::Low);
    unwrap!(spawner.spawn(led_task(led1, led2, led3)));

    // テレメトリUART初期化（USART2 TX = PA2）
    let mut uart_config = UartConfig::default();
    uart_config.baudrate = config::telemetry::BAUD_RATE;
    let uart_tx = unwrap!(UartTx::new(p.USART2, p.PA2, p.DMA1_CH1, uart_config));
    unwrap!(spawner.spawn(telemetry_task(uart_tx)));

    // 電圧監視タスク起動（PC1 = ADC2_IN7）
    let mut adc2 = Adc::new(p.ADC2);
    adc2.set_sample_time(SampleTime::CYCLES640_5);
    let voltage_pin = p.PC1.degrade_adc();
    unwrap!(spawner.spawn(voltage_monitor_task(adc2, voltage_pin)));
    info!("Voltage monitoring started on PC1 (ADC2_IN7)");

    // 電流ADC初期化（PA0 = ADC1_IN1、PC2 = ADC1_IN8、PC3 = ADC1_IN9）
    let mut adc1 = Adc::new(p.ADC1);
    adc1.set_sample_time(SampleTime::CYCLES2_5);
    let currents = CurrentChannels {
        u: p.PA0.degrade_adc(),
        v: p.PC2.degrade_adc(),
        w: p.PC3.degrade_adc(),
    };

    // エンコーダ初期化（SPI1: SCK = PA5、MISO = PA6、MOSI = PA7、CS = PA4）
    let mut spi_config = spi::Config::default();
    spi_config.mode = spi::MODE_1;
    spi_config.frequency = config::encoder::SPI_FREQUENCY;
    let spi = Spi::new(
        p.SPI1,
        p.PA5,
        p.PA7,
        p.PA6,
        p.DMA1_CH2,
        p.DMA1_CH3,
        spi_config,
    );
    let encoder = As5047p::new(spi, Output::new(p.PA4, Level::High, Speed::VeryHigh));
    unwrap!(spawner.spawn(encoder_task(encoder)));

    // ゲートドライバ有効ピン（PB12）
    let driver_enable = Output::new(p.PB12, Level::Low, Speed::Low);

    // PWM初期化（TIM1、3相相補PWM）
    let pwm = hardware::init_pwm(p.TIM1, p.PE9, p.PE8, p.PE11, p.PE10, p.PE13, p.PE12);

    let hw = BoardHardware::new(pwm, adc1, currents, driver_enable);

    // 制御コンテキスト生成（PWM周期はタイマの実際の値を使う）
    let mut drive_config = config::DRIVE_CONFIG;
    drive_config.pwm_period = hw.max_duty();
    let motor = match MotorContext::new(drive_config) {
        Ok(motor) => motor,
        Err(e) => {
            error!("Invalid drive configuration: {:?}", e);
            loop {
                Timer::after(Duration::from_millis(1000)).await;
            }
        }
    };

    info!(
        "FOC parameters: Pole pairs={}, Ts={}, Speed loop /{}, Position loop /{}",
        drive_config.pole_pairs,
        drive_config.pwm_period,
        drive_config.speed_loop_divider,
        drive_config.position_loop_divider
    );
    info!("Starting FOC motor control...");

    // モーター制御タスクを起動
    unwrap!(spawner.spawn(motor_control_task(hw, motor)));

    // デモ: 電流オフセット取得後に速度モードで起動
    Timer::after(Duration::from_millis(config::demo::START_DELAY_MS)).await;
    COMMANDS.send(MotorCommand::SetMode(ControlMode::Speed)).await;
    COMMANDS
        .send(MotorCommand::SetTargetSpeed(config::demo::TARGET_SPEED_RPM))
        .await;
    COMMANDS.send(MotorCommand::Start).await;
    info!(
        "Demo: speed mode, target {} RPM",
        config::demo::TARGET_SPEED_RPM
    );

    // メインループ（将来の拡張用）
    loop {
        Timer::after(Duration::from_millis(100)).await;
    }
}
