//! ボード固有の設定パラメータ
//!
//! 制御アルゴリズムのパラメータは `foc_drive::DriveConfig` が持ち、
//! ここにはタイマ・通信・タスク周期などハードウェア側の値だけを置きます。

use foc_drive::DriveConfig;

/// 制御周期 [μs]（20kHz = 50μs）
pub const CONTROL_PERIOD_US: u64 = foc_drive::config::DEFAULT_CONTROL_PERIOD_US;

/// 起動時のドライブ設定
///
/// PWM周期は起動時にタイマの実際の最大Duty値で上書きします。
pub const DRIVE_CONFIG: DriveConfig = DriveConfig::default();

/// PWM設定
pub mod pwm {
    use embassy_stm32::time::Hertz;

    /// PWM周波数（20kHz、センターアライン）
    pub const FREQUENCY: Hertz = Hertz(20_000);

    /// デッドタイム [タイマカウント]（170MHzで約1.2μs）
    pub const DEAD_TIME: u16 = 200;
}

/// エンコーダ設定
pub mod encoder {
    use embassy_stm32::time::Hertz;

    /// SPIクロック（AS5047Pの上限10MHz以下）
    pub const SPI_FREQUENCY: Hertz = Hertz(5_000_000);
}

/// テレメトリ設定
pub mod telemetry {
    /// UARTボーレート
    pub const BAUD_RATE: u32 = 921_600;

    /// 何制御周期ごとにフレームを送るか（20kHz / 20 = 1kHz）
    pub const DECIMATION: u32 = 20;
}

/// 電圧監視設定
pub mod voltage {
    /// 監視周期 [ms]
    pub const PERIOD_MS: u64 = 100;

    /// ログ出力間隔 [監視周期]（1秒ごと）
    pub const LOG_INTERVAL: u32 = 10;
}

/// デモ動作設定
pub mod demo {
    /// 起動後、速度指令を出すまでの待ち時間 [ms]
    pub const START_DELAY_MS: u64 = 2_000;

    /// 速度モードの目標回転数 [RPM]
    pub const TARGET_SPEED_RPM: f32 = 300.0;
}

/// コマンドキューの深さ
pub const COMMAND_QUEUE_DEPTH: usize = 8;
