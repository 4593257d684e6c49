//! AS5047P 磁気エンコーダ（SPI1 + DMA）
//!
//! SPIモード1（CPOL=0, CPHA=1）、16bitフレーム。
//! AS5047Pは1つ前のコマンドに対する応答を次のフレームで返すため、
//! ANGLECOM読み出しを毎周期発行すれば、前周期の角度が返ってきます。
//!
//! 転送はエンコーダタスクが所有し、制御タスクとはSignalで受け渡します。
//! 制御周期内では要求を出すだけで、転送完了を待ちません。

use embassy_stm32::{gpio::Output, mode::Async, spi::Spi};
use foc_drive::EncoderFault;

use crate::state::{ENCODER_FRAME, ENCODER_REQUEST};

/// ANGLECOM（0x3FFF）読み出しコマンド（R/W=1、偶数パリティ込み）
const CMD_READ_ANGLECOM: u16 = 0xFFFF;

/// 応答フレームのエラーフラグ（bit14）
const ERROR_FLAG: u16 = 1 << 14;

/// 角度データマスク（14bit）
const DATA_MASK: u16 = 0x3FFF;

/// 応答フレームを検査して角度コードを取り出す
pub fn decode_frame(frame: u16) -> Result<u16, EncoderFault> {
    // bit15は偶数パリティ
    if frame.count_ones() % 2 != 0 {
        return Err(EncoderFault::Parity);
    }
    if frame & ERROR_FLAG != 0 {
        return Err(EncoderFault::ErrorFlag);
    }
    Ok(frame & DATA_MASK)
}

/// SPI1上のAS5047Pドライバ（エンコーダタスク専用）
pub struct As5047p {
    spi: Spi<'static, Async>,
    cs: Output<'static>,
}

impl As5047p {
    pub fn new(spi: Spi<'static, Async>, mut cs: Output<'static>) -> Self {
        cs.set_high();
        Self { spi, cs }
    }

    /// ANGLECOM読み出しを発行し、前のコマンドの応答を返す
    pub async fn read_frame(&mut self) -> Result<u16, EncoderFault> {
        let tx = [CMD_READ_ANGLECOM];
        let mut rx = [0u16; 1];

        self.cs.set_low();
        let result = self.spi.transfer(&mut rx, &tx).await;
        self.cs.set_high();

        match result {
            Ok(()) => decode_frame(rx[0]),
            Err(e) => {
                warn!("Encoder SPI error: {:?}", e);
                Err(EncoderFault::NotReady)
            }
        }
    }
}

/// 制御タスク側のエンコーダ窓口
///
/// `start` は転送を要求するだけで戻り、`result` は完了済みのフレームを
/// 取り出すだけです。未完了なら `NotReady`。
pub struct EncoderLink;

impl EncoderLink {
    pub fn start(&self) {
        ENCODER_REQUEST.signal(());
    }

    pub fn result(&self) -> Result<u16, EncoderFault> {
        ENCODER_FRAME
            .try_take()
            .unwrap_or(Err(EncoderFault::NotReady))
    }
}
