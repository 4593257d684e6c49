//! グローバル共有状態管理
//!
//! 制御タスクへのコマンドはChannelで、テレメトリはSignalで受け渡します。
//! エンコーダ転送の要求と結果もSignalで受け渡し、
//! 表示用のモーター状態はMutexで保護して管理します。

use embassy_sync::blocking_mutex::raw::{CriticalSectionRawMutex, ThreadModeRawMutex};
use embassy_sync::channel::Channel;
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use foc_drive::{EncoderFault, MotorCommand, MotorState, TelemetryFrame};

use crate::config::COMMAND_QUEUE_DEPTH;

/// 制御タスクへのコマンドキュー（制御周期の先頭でまとめて適用）
pub static COMMANDS: Channel<CriticalSectionRawMutex, MotorCommand, COMMAND_QUEUE_DEPTH> =
    Channel::new();

/// 最新のテレメトリフレーム（送信が追いつかない場合は上書き）
pub static TELEMETRY: Signal<CriticalSectionRawMutex, TelemetryFrame> = Signal::new();

/// モーター状態（LED表示用）
pub static MOTOR_STATE: Mutex<ThreadModeRawMutex, MotorState> = Mutex::new(MotorState::Idle);

/// エンコーダ読み出し要求（制御タスク → エンコーダタスク）
pub static ENCODER_REQUEST: Signal<CriticalSectionRawMutex, ()> = Signal::new();

/// 完了したエンコーダ応答（エンコーダタスク → 制御タスク）
pub static ENCODER_FRAME: Signal<CriticalSectionRawMutex, Result<u16, EncoderFault>> =
    Signal::new();
