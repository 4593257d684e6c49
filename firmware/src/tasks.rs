//! タスクモジュール
//!
//! 各タスクの実装を分離して管理します。

pub mod encoder;
pub mod led;
pub mod motor_control;
pub mod telemetry;
pub mod voltage_monitor;

// タスク関数を再エクスポート
pub use encoder::encoder_task;
pub use led::led_task;
pub use motor_control::motor_control_task;
pub use telemetry::telemetry_task;
pub use voltage_monitor::voltage_monitor_task;
