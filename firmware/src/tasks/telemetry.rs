//! テレメトリ送信タスク
//!
//! 制御タスクが出した最新フレームをJustFloat形式でUARTへ送ります。

use embassy_stm32::{mode::Async, usart::UartTx};
use foc_drive::telemetry::FRAME_SIZE;

use crate::state::TELEMETRY;

#[embassy_executor::task]
pub async fn telemetry_task(mut tx: UartTx<'static, Async>) {
    info!("Telemetry task started ({} bytes/frame)", FRAME_SIZE);

    let mut buf = [0u8; FRAME_SIZE];
    let mut error_count = 0u32;

    loop {
        let frame = TELEMETRY.wait().await;

        let len = match frame.encode(&mut buf) {
            Ok(len) => len,
            Err(e) => {
                error!("Telemetry encode failed: {:?}", e);
                continue;
            }
        };

        if let Err(e) = tx.write(&buf[..len]).await {
            // 最初の1回だけ報告
            if error_count == 0 {
                warn!("Telemetry UART write failed: {:?}", e);
            }
            error_count = error_count.wrapping_add(1);
        }
    }
}
