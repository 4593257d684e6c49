//! エンコーダタスク
//!
//! 制御タスクからの要求ごとにAS5047PへDMA転送を1回行い、
//! 結果をSignalへ置きます。

use crate::encoder::As5047p;
use crate::state::{ENCODER_FRAME, ENCODER_REQUEST};

#[embassy_executor::task]
pub async fn encoder_task(mut encoder: As5047p) {
    info!("Encoder task started");

    loop {
        ENCODER_REQUEST.wait().await;
        let frame = encoder.read_frame().await;
        ENCODER_FRAME.signal(frame);
    }
}
